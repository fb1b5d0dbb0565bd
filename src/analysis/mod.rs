//! Scene-block analysis: segment the timeline, label each block, assemble the record.

pub mod assemble;
pub mod classify;
pub mod segment;

pub use assemble::{analyze_bytes, assemble, AnalysisResult, SectionSpan, Segment};
pub use classify::{classify, Intensity, SectionType, THRESHOLDS};
pub use segment::{segment, Block, BlockLength, DEFAULT_BLOCK_LENGTH};
