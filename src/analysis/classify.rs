// Classifier - heuristic labelling of scene blocks
//
// Intensity is a three-tier cut of normalized energy. Section type is a flat
// decision list evaluated top to bottom, first match wins:
//
// 1. position ratio < INTRO_RATIO                      -> Intro
// 2. position ratio > OUTRO_RATIO                      -> Outro
// 3. energy > CHORUS_ENERGY and density > CHORUS_BEATS -> Chorus
// 4. energy < BRIDGE_ENERGY                            -> Bridge
// 5. otherwise                                         -> Verse
//
// Position ratio is the 0-based block index over the block count, so the last
// block of a multi-block track never reaches 1.0.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::segment::Block;

/// Threshold table for [`classify`]. All comparisons are strict.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Thresholds {
    pub high_energy: f32,
    pub medium_energy: f32,
    pub intro_ratio: f32,
    pub outro_ratio: f32,
    pub chorus_energy: f32,
    pub chorus_beat_density: f32,
    pub bridge_energy: f32,
}

pub const THRESHOLDS: Thresholds = Thresholds {
    high_energy: 0.7,
    medium_energy: 0.4,
    intro_ratio: 0.10,
    outro_ratio: 0.90,
    chorus_energy: 0.6,
    chorus_beat_density: 1.5,
    bridge_energy: 0.3,
};

/// Coarse loudness tier of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Low,
    Medium,
    High,
}

impl Intensity {
    pub fn as_str(self) -> &'static str {
        match self {
            Intensity::Low => "low",
            Intensity::Medium => "medium",
            Intensity::High => "high",
        }
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structural role of a block within the song
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionType {
    Intro,
    Verse,
    Chorus,
    Bridge,
    Outro,
}

impl SectionType {
    pub fn as_str(self) -> &'static str {
        match self {
            SectionType::Intro => "intro",
            SectionType::Verse => "verse",
            SectionType::Chorus => "chorus",
            SectionType::Bridge => "bridge",
            SectionType::Outro => "outro",
        }
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn intensity_for(normalized_energy: f32) -> Intensity {
    if normalized_energy > THRESHOLDS.high_energy {
        Intensity::High
    } else if normalized_energy > THRESHOLDS.medium_energy {
        Intensity::Medium
    } else {
        Intensity::Low
    }
}

/// Section label for the block at 0-based `segment_index` of `total_segments`.
pub fn section_for(
    normalized_energy: f32,
    beat_density: f32,
    segment_index: usize,
    total_segments: usize,
) -> SectionType {
    let position_ratio = if total_segments == 0 {
        0.0
    } else {
        segment_index as f32 / total_segments as f32
    };

    if position_ratio < THRESHOLDS.intro_ratio {
        SectionType::Intro
    } else if position_ratio > THRESHOLDS.outro_ratio {
        SectionType::Outro
    } else if normalized_energy > THRESHOLDS.chorus_energy
        && beat_density > THRESHOLDS.chorus_beat_density
    {
        SectionType::Chorus
    } else if normalized_energy < THRESHOLDS.bridge_energy {
        SectionType::Bridge
    } else {
        SectionType::Verse
    }
}

/// Classify one block. Pure; same inputs always give the same labels.
pub fn classify(
    block: &Block,
    segment_index: usize,
    total_segments: usize,
) -> (Intensity, SectionType) {
    (
        intensity_for(block.normalized_energy),
        section_for(
            block.normalized_energy,
            block.beat_density,
            segment_index,
            total_segments,
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(normalized_energy: f32, beat_density: f32) -> Block {
        Block {
            index: 1,
            start_time: 0.0,
            end_time: 8.0,
            raw_energy: normalized_energy,
            normalized_energy,
            beat_count: (beat_density * 8.0) as usize,
            beat_density,
        }
    }

    #[test]
    fn intensity_boundaries_are_strict() {
        assert_eq!(intensity_for(0.7), Intensity::Medium);
        assert_eq!(intensity_for(0.71), Intensity::High);
        assert_eq!(intensity_for(0.4), Intensity::Low);
        assert_eq!(intensity_for(0.41), Intensity::Medium);
        assert_eq!(intensity_for(0.0), Intensity::Low);
        assert_eq!(intensity_for(1.0), Intensity::High);
    }

    #[test]
    fn first_block_is_intro_regardless_of_energy() {
        assert_eq!(section_for(1.0, 4.0, 0, 10), SectionType::Intro);
        assert_eq!(section_for(0.0, 0.0, 0, 10), SectionType::Intro);
    }

    #[test]
    fn ratio_point_nine_is_not_outro() {
        assert_ne!(section_for(0.5, 1.0, 9, 10), SectionType::Outro);
        assert_eq!(section_for(0.5, 1.0, 9, 10), SectionType::Verse);
        assert_eq!(section_for(0.5, 1.0, 19, 20), SectionType::Outro);
    }

    #[test]
    fn ratio_point_one_is_not_intro() {
        assert_eq!(section_for(0.5, 1.0, 1, 10), SectionType::Verse);
    }

    #[test]
    fn single_block_track_is_intro() {
        assert_eq!(section_for(0.9, 3.0, 0, 1), SectionType::Intro);
    }

    #[test]
    fn chorus_needs_energy_and_beats() {
        assert_eq!(section_for(0.61, 1.6, 5, 10), SectionType::Chorus);
        assert_eq!(section_for(0.6, 1.6, 5, 10), SectionType::Verse);
        assert_eq!(section_for(0.9, 1.5, 5, 10), SectionType::Verse);
    }

    #[test]
    fn quiet_middle_block_is_bridge() {
        assert_eq!(section_for(0.29, 3.0, 5, 10), SectionType::Bridge);
        assert_eq!(section_for(0.3, 0.0, 5, 10), SectionType::Verse);
    }

    #[test]
    fn position_rules_outrank_energy_rules() {
        assert_eq!(section_for(0.0, 0.0, 0, 20), SectionType::Intro);
        assert_eq!(section_for(1.0, 5.0, 19, 20), SectionType::Outro);
    }

    #[test]
    fn classify_combines_both_labels() {
        assert_eq!(
            classify(&block(0.8, 2.0), 4, 10),
            (Intensity::High, SectionType::Chorus)
        );
        assert_eq!(
            classify(&block(0.2, 0.5), 4, 10),
            (Intensity::Low, SectionType::Bridge)
        );
    }

    #[test]
    fn labels_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&SectionType::Chorus).unwrap(), "\"chorus\"");
        assert_eq!(serde_json::to_string(&Intensity::Medium).unwrap(), "\"medium\"");
        assert_eq!(SectionType::Bridge.to_string(), "bridge");
    }
}
