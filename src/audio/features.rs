use serde::{Deserialize, Serialize};

/// Extractor output consumed by the segmenter.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    /// Track length in seconds (>= 0)
    pub duration_seconds: f32,
    /// Beat onsets in seconds, non-decreasing
    pub beat_timestamps: Vec<f32>,
    /// Frame-wise RMS energy; frames evenly span the whole duration
    pub energy_curve: Vec<f32>,
    /// Estimated tempo in BPM
    pub tempo_bpm: f32,
}

impl AudioFeatures {
    /// Largest raw frame energy, or 0.0 for an empty curve.
    pub fn peak_energy(&self) -> f32 {
        self.energy_curve.iter().copied().fold(0.0f32, f32::max)
    }

    /// Divisor used to normalize energies: the peak frame energy, or 1.0 when
    /// the curve is empty or silent.
    pub fn energy_scale(&self) -> f32 {
        let peak = self.peak_energy();
        if peak > 0.0 {
            peak
        } else {
            1.0
        }
    }
}
