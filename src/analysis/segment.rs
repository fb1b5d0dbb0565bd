use crate::audio::features::AudioFeatures;
use crate::error::ConfigError;

pub const DEFAULT_BLOCK_LENGTH: f32 = 8.0;

/// Nominal scene block length in seconds. Always positive and finite.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlockLength(f32);

impl BlockLength {
    pub fn new(seconds: f32) -> Result<Self, ConfigError> {
        if seconds.is_finite() && seconds > 0.0 {
            Ok(Self(seconds))
        } else {
            Err(ConfigError::InvalidBlockLength(seconds))
        }
    }

    pub fn seconds(self) -> f32 {
        self.0
    }
}

impl Default for BlockLength {
    fn default() -> Self {
        Self(DEFAULT_BLOCK_LENGTH)
    }
}

/// One slice of the timeline with its aggregated features, before classification.
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    /// 1-based position in the track
    pub index: usize,
    pub start_time: f32,
    pub end_time: f32,
    /// Mean RMS of the energy frames intersecting `[start_time, end_time)`
    pub raw_energy: f32,
    /// `raw_energy` over the track's peak frame energy, in [0, 1]
    pub normalized_energy: f32,
    /// Beats with `start_time <= t < end_time`
    pub beat_count: usize,
    /// Beats per second
    pub beat_density: f32,
}

impl Block {
    pub fn duration(&self) -> f32 {
        self.end_time - self.start_time
    }
}

/// Split the track into consecutive blocks of `block_length` seconds.
///
/// The last block is truncated at the track end. A zero-length track yields no
/// blocks. Output depends only on the inputs.
pub fn segment(features: &AudioFeatures, block_length: BlockLength) -> Vec<Block> {
    let duration = track_duration(features);
    if duration <= 0.0 {
        return Vec::new();
    }

    let block_len = block_length.seconds() as f64;
    let block_count = ((duration / block_len).ceil() as usize).max(1);
    let scale = features.energy_scale();
    let fallback_energy = if features.energy_curve.is_empty() {
        0.5
    } else {
        0.5 * features.peak_energy()
    };

    let mut blocks = Vec::with_capacity(block_count);
    for i in 0..block_count {
        let start = i as f64 * block_len;
        let end = ((i + 1) as f64 * block_len).min(duration);
        if end <= start {
            break;
        }

        let raw_energy = mean_energy(features, duration, start, end).unwrap_or(fallback_energy);
        let normalized_energy = (raw_energy / scale).clamp(0.0, 1.0);

        let (start_f, end_f) = (start as f32, end as f32);
        let beat_count = features
            .beat_timestamps
            .iter()
            .filter(|&&t| t >= start_f && t < end_f)
            .count();
        let length = end_f - start_f;
        let beat_density = if length > 0.0 {
            beat_count as f32 / length
        } else {
            0.0
        };

        blocks.push(Block {
            index: i + 1,
            start_time: start_f,
            end_time: end_f,
            raw_energy,
            normalized_energy,
            beat_count,
            beat_density,
        });
    }

    log::debug!(
        "Segmented {:.2}s into {} blocks of {:.2}s",
        duration,
        blocks.len(),
        block_len
    );

    blocks
}

/// Non-negative finite duration, 0.0 otherwise.
fn track_duration(features: &AudioFeatures) -> f64 {
    let d = features.duration_seconds as f64;
    if d.is_finite() && d > 0.0 {
        d
    } else {
        0.0
    }
}

/// Mean of the energy frames whose half-open span intersects `[start, end)`.
///
/// Frame `k` covers `[k * w, (k + 1) * w)` with `w = duration / frames`.
/// Returns `None` when no frame intersects.
fn mean_energy(features: &AudioFeatures, duration: f64, start: f64, end: f64) -> Option<f32> {
    let curve = &features.energy_curve;
    if curve.is_empty() {
        return None;
    }
    let frames = curve.len() as f64;
    let first = ((start * frames / duration).floor().max(0.0) as usize).min(curve.len());
    let last = ((end * frames / duration).ceil().max(0.0) as usize).min(curve.len());
    if first >= last {
        return None;
    }
    let window = &curve[first..last];
    Some(window.iter().sum::<f32>() / window.len() as f32)
}
