//! Log output of the degraded path. Lives in its own test binary because the
//! logger is process-global.

use log::{Level, LevelFilter, Log, Metadata, Record};
use lyricmotion::analysis::{analyze_bytes, BlockLength};
use lyricmotion::audio::extract::SymphoniaExtractor;
use std::sync::Mutex;

struct Recorder {
    records: Mutex<Vec<(Level, String)>>,
}

impl Log for Recorder {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if let Ok(mut records) = self.records.lock() {
            records.push((record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

static RECORDER: Recorder = Recorder {
    records: Mutex::new(Vec::new()),
};

#[test]
fn degraded_analysis_warns_exactly_once() {
    log::set_logger(&RECORDER).expect("install logger");
    log::set_max_level(LevelFilter::Trace);

    let extractor = SymphoniaExtractor::new().with_extension_hint("mp3");
    let result = analyze_bytes(&extractor, b"not audio", BlockLength::default());
    assert!(result.degraded);

    let records = RECORDER.records.lock().expect("records");
    let warnings: Vec<&String> = records
        .iter()
        .filter(|(level, _)| *level == Level::Warn)
        .map(|(_, msg)| msg)
        .collect();
    assert_eq!(warnings.len(), 1, "warnings: {:?}", warnings);
    assert!(warnings[0].contains("fallback timeline"));
}
