use rayon::prelude::*;
use rustfft::{num_complex::Complex, Fft, FftPlanner};

use super::decode::{decode_audio_bytes, AudioData};
use super::features::AudioFeatures;
use crate::error::ExtractionError;

const FFT_SIZE: usize = 2048;
const HOP_SIZE: usize = 1024;
/// Hops transformed per parallel batch; bounds spectrum memory to
/// `FLUX_CHUNK_HOPS * FFT_SIZE / 2` floats regardless of track length.
const FLUX_CHUNK_HOPS: usize = 256;

/// Hops on each side of the local-mean window (~0.5s at 44.1kHz)
const ONSET_WINDOW_HOPS: usize = 20;
const ONSET_THRESHOLD_FACTOR: f32 = 1.5;
const ONSET_THRESHOLD_FLOOR: f32 = 0.01;
const MIN_BEAT_GAP_SECS: f32 = 0.1;

// 60-200 BPM
const MIN_BEAT_INTERVAL_SECS: f32 = 0.3;
const MAX_BEAT_INTERVAL_SECS: f32 = 1.0;

/// Default width of one energy-curve frame.
pub const DEFAULT_ENERGY_WINDOW_MS: u32 = 100;

/// Fallback tempo when too few beats are found to estimate one.
pub const DEFAULT_TEMPO_BPM: f32 = 120.0;

/// Turns raw audio bytes into [`AudioFeatures`].
///
/// Implementations must report every failure as an [`ExtractionError`] so the
/// analysis pipeline never sees decoder-specific types.
pub trait FeatureExtractor {
    fn extract(&self, audio: &[u8]) -> Result<AudioFeatures, ExtractionError>;
}

/// Symphonia decode followed by RMS windows and spectral-flux onsets.
#[derive(Clone, Debug)]
pub struct SymphoniaExtractor {
    extension_hint: Option<String>,
    energy_window_ms: u32,
}

impl Default for SymphoniaExtractor {
    fn default() -> Self {
        Self {
            extension_hint: None,
            energy_window_ms: DEFAULT_ENERGY_WINDOW_MS,
        }
    }
}

impl SymphoniaExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extension_hint(mut self, ext: impl Into<String>) -> Self {
        self.extension_hint = Some(ext.into());
        self
    }

    pub fn with_energy_window_ms(mut self, ms: u32) -> Self {
        self.energy_window_ms = ms.max(1);
        self
    }

    fn features_from(&self, audio: &AudioData) -> Result<AudioFeatures, ExtractionError> {
        if audio.sample_rate == 0 {
            return Err(ExtractionError::NoSampleRate);
        }
        if audio.samples.is_empty() {
            return Err(ExtractionError::Empty);
        }

        let sr = audio.sample_rate;
        let window_size =
            ((sr as u64 * self.energy_window_ms as u64) / 1000).max(1) as usize;
        let energy_curve = rms_curve(&audio.samples, window_size);

        let flux_values = spectral_flux(&audio.samples, sr);
        let beat_timestamps = detect_beats(&flux_values);
        let tempo_bpm = estimate_tempo(&beat_timestamps);

        log::debug!(
            "Extracted: {} energy frames, {} beats, tempo={:.1} BPM",
            energy_curve.len(),
            beat_timestamps.len(),
            tempo_bpm
        );

        Ok(AudioFeatures {
            duration_seconds: audio.duration(),
            beat_timestamps,
            energy_curve,
            tempo_bpm,
        })
    }
}

impl FeatureExtractor for SymphoniaExtractor {
    fn extract(&self, audio: &[u8]) -> Result<AudioFeatures, ExtractionError> {
        if audio.is_empty() {
            return Err(ExtractionError::Empty);
        }
        let decoded = decode_audio_bytes(audio, self.extension_hint.as_deref())
            .map_err(|e| ExtractionError::Decode(format!("{:#}", e)))?;
        self.features_from(&decoded)
    }
}

/// Sample ranges of `len` samples split into equal-width frames close to
/// `window_size` each. Frame widths differ by at most one sample, so the
/// frames evenly tile the whole signal.
fn frame_bounds(len: usize, window_size: usize) -> Vec<(usize, usize)> {
    if len == 0 {
        return Vec::new();
    }
    let frames = ((len as f64 / window_size.max(1) as f64).round() as usize).max(1);
    (0..frames)
        .map(|k| (k * len / frames, (k + 1) * len / frames))
        .collect()
}

/// RMS per frame over evenly tiled frames.
fn rms_curve(samples: &[f32], window_size: usize) -> Vec<f32> {
    frame_bounds(samples.len(), window_size)
        .into_iter()
        .map(|(start, end)| {
            let chunk = &samples[start..end];
            (chunk.iter().map(|s| s * s).sum::<f32>() / chunk.len() as f32).sqrt()
        })
        .collect()
}

/// Half-wave rectified spectral flux per hop, as `(time, flux)` pairs.
fn spectral_flux(samples: &[f32], sample_rate: u32) -> Vec<(f32, f32)> {
    spectral_flux_chunked(samples, sample_rate, FLUX_CHUNK_HOPS)
}

/// Spectra are computed in parallel `chunk_hops` at a time; only the current
/// chunk and the last spectrum of the previous one are held in memory.
fn spectral_flux_chunked(
    samples: &[f32],
    sample_rate: u32,
    chunk_hops: usize,
) -> Vec<(f32, f32)> {
    if samples.len() < FFT_SIZE {
        return Vec::new();
    }

    let hann = hann_window(FFT_SIZE);
    let hops: Vec<usize> = (0..=samples.len() - FFT_SIZE).step_by(HOP_SIZE).collect();
    let mut flux_values = Vec::with_capacity(hops.len());
    let mut prev = vec![0.0f32; FFT_SIZE / 2];

    for chunk in hops.chunks(chunk_hops.max(1)) {
        let spectra: Vec<Vec<f32>> = chunk
            .par_iter()
            .map_init(
                || FftPlanner::<f32>::new().plan_fft_forward(FFT_SIZE),
                |fft, &pos| magnitude_spectrum(&**fft, &samples[pos..pos + FFT_SIZE], &hann),
            )
            .collect();

        for (&pos, spectrum) in chunk.iter().zip(spectra) {
            let flux: f32 = spectrum
                .iter()
                .zip(prev.iter())
                .map(|(cur, prev)| (cur - prev).max(0.0))
                .sum();
            flux_values.push((pos as f32 / sample_rate as f32, flux));
            prev = spectrum;
        }
    }

    flux_values
}

/// Magnitudes of the lower half of the Hann-windowed spectrum.
fn magnitude_spectrum(fft: &dyn Fft<f32>, window: &[f32], hann: &[f32]) -> Vec<f32> {
    let mut buffer: Vec<Complex<f32>> = window
        .iter()
        .zip(hann.iter())
        .map(|(&s, &w)| Complex::new(s * w, 0.0))
        .collect();
    fft.process(&mut buffer);
    buffer[..FFT_SIZE / 2].iter().map(|c| c.norm()).collect()
}

/// Onsets are local flux peaks above an adaptive threshold
/// (`ONSET_THRESHOLD_FACTOR * local mean + ONSET_THRESHOLD_FLOOR`), at least
/// `MIN_BEAT_GAP_SECS` apart.
fn detect_beats(flux_values: &[(f32, f32)]) -> Vec<f32> {
    let n = flux_values.len();
    if n == 0 {
        return Vec::new();
    }

    // prefix[i] = sum of the first i flux values
    let mut prefix = Vec::with_capacity(n + 1);
    prefix.push(0.0f64);
    for &(_, f) in flux_values {
        let last = prefix[prefix.len() - 1];
        prefix.push(last + f as f64);
    }

    let mut beat_times: Vec<f32> = Vec::new();
    for (i, &(time, flux)) in flux_values.iter().enumerate() {
        let start = i.saturating_sub(ONSET_WINDOW_HOPS);
        let end = (i + ONSET_WINDOW_HOPS + 1).min(n);
        let local_mean = ((prefix[end] - prefix[start]) / (end - start) as f64) as f32;
        if flux <= local_mean * ONSET_THRESHOLD_FACTOR + ONSET_THRESHOLD_FLOOR {
            continue;
        }

        let rising = i == 0 || flux >= flux_values[i - 1].1;
        let falling = i + 1 == n || flux >= flux_values[i + 1].1;
        let clear_of_last = beat_times
            .last()
            .map_or(true, |&last| time - last > MIN_BEAT_GAP_SECS);

        if rising && falling && clear_of_last {
            beat_times.push(time);
        }
    }

    beat_times
}

fn estimate_tempo(beat_times: &[f32]) -> f32 {
    if beat_times.len() < 2 {
        return DEFAULT_TEMPO_BPM;
    }

    let mut reasonable: Vec<f32> = beat_times
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|&i| (MIN_BEAT_INTERVAL_SECS..=MAX_BEAT_INTERVAL_SECS).contains(&i))
        .collect();

    if reasonable.is_empty() {
        return DEFAULT_TEMPO_BPM;
    }

    reasonable.sort_by(|a, b| a.total_cmp(b));
    60.0 / reasonable[reasonable.len() / 2]
}

fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / (size - 1) as f32).cos())
        })
        .collect()
}
