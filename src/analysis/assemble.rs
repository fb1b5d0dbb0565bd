use serde::{Deserialize, Serialize};

use super::classify::{classify, Intensity, SectionType};
use super::segment::{segment, Block, BlockLength};
use crate::audio::extract::FeatureExtractor;
use crate::audio::features::AudioFeatures;
use crate::error::ExtractionError;

/// Timeline length substituted when extraction fails.
pub const FALLBACK_DURATION_SECS: f32 = 180.0;
/// Tempo substituted when extraction fails.
pub const FALLBACK_TEMPO_BPM: f32 = 120.0;
/// Leading beats kept in [`AnalysisResult::beat_sample`].
pub const BEAT_SAMPLE_LEN: usize = 20;

const TIME_DECIMALS: i32 = 2;
const ENERGY_DECIMALS: i32 = 3;
const TEMPO_DECIMALS: i32 = 1;

/// A classified scene block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub index: usize,
    pub start_time: f32,
    pub end_time: f32,
    pub raw_energy: f32,
    pub normalized_energy: f32,
    pub beat_count: usize,
    pub beat_density: f32,
    pub intensity: Intensity,
    pub section_type: SectionType,
}

/// Run of consecutive segments sharing a section type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SectionSpan {
    pub section_type: SectionType,
    pub start_time: f32,
    pub end_time: f32,
    /// 1-based index of the first segment in the run
    pub first_segment: usize,
    /// 1-based index of the last segment in the run
    pub last_segment: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub duration: f32,
    pub tempo: f32,
    pub total_beats: usize,
    pub beat_sample: Vec<f32>,
    pub segments: Vec<Segment>,
    pub sections: Vec<SectionSpan>,
    /// Normalized energy per segment, in segment order
    pub energy_profile: Vec<f32>,
    pub average_energy: f32,
    /// Population standard deviation of the raw frame energies
    pub energy_variance: f32,
    pub degraded: bool,
    /// Why the result is degraded. Logged, never serialized.
    #[serde(skip)]
    pub diagnostic: Option<String>,
}

impl AnalysisResult {
    /// Placeholder timeline used when no features could be extracted.
    pub fn degraded(err: &ExtractionError) -> Self {
        Self {
            duration: FALLBACK_DURATION_SECS,
            tempo: FALLBACK_TEMPO_BPM,
            total_beats: 0,
            beat_sample: Vec::new(),
            segments: Vec::new(),
            sections: Vec::new(),
            energy_profile: Vec::new(),
            average_energy: 0.0,
            energy_variance: 0.0,
            degraded: true,
            diagnostic: Some(err.to_string()),
        }
    }
}

/// Build the analysis record from extractor output.
///
/// Never fails: an extraction error produces [`AnalysisResult::degraded`].
pub fn assemble(
    features: Result<AudioFeatures, ExtractionError>,
    block_length: BlockLength,
) -> AnalysisResult {
    match features {
        Ok(features) => assemble_features(&features, block_length),
        Err(err) => {
            log::warn!("Audio feature extraction failed, using fallback timeline: {}", err);
            AnalysisResult::degraded(&err)
        }
    }
}

/// Extract features with `extractor` and assemble the result.
pub fn analyze_bytes<E: FeatureExtractor + ?Sized>(
    extractor: &E,
    audio: &[u8],
    block_length: BlockLength,
) -> AnalysisResult {
    assemble(extractor.extract(audio), block_length)
}

fn assemble_features(features: &AudioFeatures, block_length: BlockLength) -> AnalysisResult {
    let blocks = segment(features, block_length);
    let total = blocks.len();

    // Labels come from unrounded values; rounding below is display only.
    let segments: Vec<Segment> = blocks
        .iter()
        .enumerate()
        .map(|(i, block)| {
            let (intensity, section_type) = classify(block, i, total);
            display_segment(block, intensity, section_type)
        })
        .collect();

    let sections = section_spans(&segments);
    let energy_profile = segments.iter().map(|s| s.normalized_energy).collect();

    let (mean, std_dev) = energy_stats(&features.energy_curve);
    let average_energy = (mean / features.energy_scale()).clamp(0.0, 1.0);

    let result = AnalysisResult {
        duration: round_to(features.duration_seconds.max(0.0), TIME_DECIMALS),
        tempo: round_to(features.tempo_bpm, TEMPO_DECIMALS),
        total_beats: features.beat_timestamps.len(),
        beat_sample: features
            .beat_timestamps
            .iter()
            .take(BEAT_SAMPLE_LEN)
            .map(|&t| round_to(t, TIME_DECIMALS))
            .collect(),
        segments,
        sections,
        energy_profile,
        average_energy: round_to(average_energy, ENERGY_DECIMALS),
        energy_variance: round_to(std_dev, ENERGY_DECIMALS),
        degraded: false,
        diagnostic: None,
    };

    log::info!(
        "Analysis: {:.2}s, {:.1} BPM, {} beats, {} segments, {} sections",
        result.duration,
        result.tempo,
        result.total_beats,
        result.segments.len(),
        result.sections.len()
    );

    result
}

fn display_segment(block: &Block, intensity: Intensity, section_type: SectionType) -> Segment {
    Segment {
        index: block.index,
        start_time: round_to(block.start_time, TIME_DECIMALS),
        end_time: round_to(block.end_time, TIME_DECIMALS),
        raw_energy: round_to(block.raw_energy, ENERGY_DECIMALS),
        normalized_energy: round_to(block.normalized_energy, ENERGY_DECIMALS),
        beat_count: block.beat_count,
        beat_density: round_to(block.beat_density, TIME_DECIMALS),
        intensity,
        section_type,
    }
}

fn section_spans(segments: &[Segment]) -> Vec<SectionSpan> {
    let mut spans: Vec<SectionSpan> = Vec::new();
    for seg in segments {
        match spans.last_mut() {
            Some(span) if span.section_type == seg.section_type => {
                span.end_time = seg.end_time;
                span.last_segment = seg.index;
            }
            _ => spans.push(SectionSpan {
                section_type: seg.section_type,
                start_time: seg.start_time,
                end_time: seg.end_time,
                first_segment: seg.index,
                last_segment: seg.index,
            }),
        }
    }
    spans
}

/// Mean and population standard deviation; zeros for an empty curve.
fn energy_stats(curve: &[f32]) -> (f32, f32) {
    if curve.is_empty() {
        return (0.0, 0.0);
    }
    let n = curve.len() as f64;
    let mean = curve.iter().map(|&v| v as f64).sum::<f64>() / n;
    let var = curve
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    (mean as f32, var.sqrt() as f32)
}

fn round_to(value: f32, decimals: i32) -> f32 {
    let factor = 10f64.powi(decimals);
    ((value as f64 * factor).round() / factor) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingExtractor;

    impl FeatureExtractor for FailingExtractor {
        fn extract(&self, _audio: &[u8]) -> Result<AudioFeatures, ExtractionError> {
            Err(ExtractionError::Decode("unsupported codec".into()))
        }
    }

    fn uniform(duration: f32, frames: usize) -> AudioFeatures {
        AudioFeatures {
            duration_seconds: duration,
            beat_timestamps: (0..(duration * 2.0) as usize).map(|i| i as f32 * 0.5).collect(),
            energy_curve: vec![0.3; frames],
            tempo_bpm: 119.96,
        }
    }

    #[test]
    fn uniform_track_is_all_high_intensity() {
        let result = assemble(Ok(uniform(64.0, 640)), BlockLength::default());
        assert!(!result.degraded);
        assert_eq!(result.segments.len(), 8);
        for (i, seg) in result.segments.iter().enumerate() {
            assert_eq!(seg.index, i + 1);
            assert_eq!(seg.end_time - seg.start_time, 8.0);
            assert_eq!(seg.normalized_energy, 1.0);
            assert_eq!(seg.intensity, Intensity::High);
        }
        assert_eq!(result.tempo, 120.0);
        assert_eq!(result.total_beats, 128);
        assert_eq!(result.beat_sample.len(), BEAT_SAMPLE_LEN);
        assert_eq!(result.average_energy, 1.0);
        assert_eq!(result.energy_variance, 0.0);
    }

    #[test]
    fn uniform_track_sections_follow_position_and_rhythm() {
        // 2 beats/s and full energy: chorus everywhere except the intro
        let result = assemble(Ok(uniform(64.0, 640)), BlockLength::default());
        let labels: Vec<SectionType> = result.segments.iter().map(|s| s.section_type).collect();
        assert_eq!(labels[0], SectionType::Intro);
        assert!(labels[1..].iter().all(|&l| l == SectionType::Chorus));
        assert_eq!(result.sections.len(), 2);
        assert_eq!(result.sections[1].first_segment, 2);
        assert_eq!(result.sections[1].last_segment, 8);
        assert_eq!(result.sections[1].end_time, 64.0);
    }

    #[test]
    fn failed_extraction_degrades() {
        let result = analyze_bytes(&FailingExtractor, b"junk", BlockLength::default());
        assert!(result.degraded);
        assert_eq!(result.duration, 180.0);
        assert_eq!(result.tempo, 120.0);
        assert!(result.segments.is_empty());
        assert!(result.sections.is_empty());
        assert_eq!(result.diagnostic.as_deref(), Some("decode failed: unsupported codec"));
    }

    #[test]
    fn diagnostic_is_not_serialized() {
        let result = assemble(Err(ExtractionError::Empty), BlockLength::default());
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("diagnostic").is_none());
        assert_eq!(json["degraded"], serde_json::Value::Bool(true));
        assert_eq!(json["segments"], serde_json::json!([]));
    }

    #[test]
    fn zero_duration_is_not_degraded() {
        let f = AudioFeatures {
            duration_seconds: 0.0,
            beat_timestamps: Vec::new(),
            energy_curve: Vec::new(),
            tempo_bpm: 120.0,
        };
        let result = assemble(Ok(f), BlockLength::default());
        assert!(!result.degraded);
        assert!(result.segments.is_empty());
        assert_eq!(result.average_energy, 0.0);
    }

    #[test]
    fn energy_statistics_use_raw_frames() {
        let f = AudioFeatures {
            duration_seconds: 16.0,
            beat_timestamps: Vec::new(),
            energy_curve: vec![0.2, 0.4, 0.6, 0.8],
            tempo_bpm: 90.0,
        };
        let result = assemble(Ok(f), BlockLength::default());
        // mean 0.5 over peak 0.8
        assert_eq!(result.average_energy, 0.625);
        // sqrt(0.05)
        assert_eq!(result.energy_variance, 0.224);
        assert_eq!(result.energy_profile, vec![0.375, 0.875]);
    }

    #[test]
    fn classification_uses_unrounded_energy() {
        // 0.70004 rounds to 0.7 for display but is still above the high cut
        let f = AudioFeatures {
            duration_seconds: 16.0,
            beat_timestamps: Vec::new(),
            energy_curve: vec![0.70004, 1.0],
            tempo_bpm: 120.0,
        };
        let result = assemble(Ok(f), BlockLength::default());
        assert_eq!(result.segments[0].normalized_energy, 0.7);
        assert_eq!(result.segments[0].intensity, Intensity::High);
    }

    #[test]
    fn display_values_are_rounded() {
        let f = AudioFeatures {
            duration_seconds: 20.004,
            beat_timestamps: vec![0.123456],
            energy_curve: vec![0.5; 10],
            tempo_bpm: 128.04,
        };
        let result = assemble(Ok(f), BlockLength::default());
        assert_eq!(result.duration, 20.0);
        assert_eq!(result.tempo, 128.0);
        assert_eq!(result.beat_sample, vec![0.12]);
        assert_eq!(result.segments.last().unwrap().end_time, 20.0);
    }

    #[test]
    fn assembly_is_deterministic() {
        let f = uniform(95.5, 955);
        assert_eq!(
            assemble(Ok(f.clone()), BlockLength::default()),
            assemble(Ok(f), BlockLength::default())
        );
    }
}
