//! Song-to-storyboard audio analysis.
//!
//! Decodes a track, extracts beats and an RMS energy curve, and cuts the
//! timeline into fixed-length scene blocks labelled with intensity and
//! section type.

pub mod analysis;
pub mod audio;
pub mod config;
pub mod error;

pub use analysis::{analyze_bytes, AnalysisResult, BlockLength};
pub use audio::extract::{FeatureExtractor, SymphoniaExtractor};
pub use audio::features::AudioFeatures;
pub use error::{ConfigError, ExtractionError};
