mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use std::path::Path;

use cli::Cli;
use lyricmotion::analysis::{analyze_bytes, AnalysisResult, BlockLength, DEFAULT_BLOCK_LENGTH};
use lyricmotion::audio::decode::supported_extension;
use lyricmotion::audio::extract::{SymphoniaExtractor, DEFAULT_ENERGY_WINDOW_MS};
use lyricmotion::config;
use lyricmotion::error::ConfigError;

#[derive(Serialize)]
struct AnalysisReport {
    source: String,
    analysis: AnalysisResult,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();

    if let Some(ref path) = config::find_config_path(cli.config.as_deref()) {
        if let Some(cfg) = config::load_config(path) {
            log::info!("Loaded config from {}", path.display());
            // Config values apply only when the CLI is at its default
            if cli.block_length == DEFAULT_BLOCK_LENGTH {
                cli.block_length = cfg.analysis.block_length;
            }
            if cli.energy_window_ms == DEFAULT_ENERGY_WINDOW_MS {
                cli.energy_window_ms = cfg.extractor.energy_window_ms;
            }
            if !cli.pretty {
                cli.pretty = cfg.output.pretty;
            }
        } else {
            log::warn!("Failed to load config from {}", path.display());
        }
    }

    let block_length = BlockLength::new(cli.block_length)?;

    // Reject bad inputs before doing any work
    let mut jobs = Vec::with_capacity(cli.inputs.len());
    for input in &cli.inputs {
        if !input.exists() {
            anyhow::bail!("Input file not found: {}", input.display());
        }
        let ext = supported_extension(input).ok_or_else(|| {
            let found = input
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or_default()
                .to_string();
            ConfigError::UnsupportedFormat(found)
        })?;
        jobs.push((input.as_path(), ext));
    }

    log::info!(
        "Analyzing {} file(s), block length {:.2}s",
        jobs.len(),
        block_length.seconds()
    );

    let pb = ProgressBar::new(jobs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} files")
            .context("Invalid progress bar template")?
            .progress_chars("=>-"),
    );

    let reports: Vec<AnalysisReport> = jobs
        .par_iter()
        .map(|(input, ext)| {
            let report = analyze_file(input, ext, block_length, cli.energy_window_ms);
            pb.inc(1);
            report
        })
        .collect::<Result<_>>()?;

    pb.finish_and_clear();

    let degraded: Vec<&str> = reports
        .iter()
        .filter(|r| r.analysis.degraded)
        .map(|r| r.source.as_str())
        .collect();
    if !degraded.is_empty() {
        log::info!(
            "{} of {} file(s) used the fallback timeline: {}",
            degraded.len(),
            reports.len(),
            degraded.join(", ")
        );
    }

    let json = if cli.pretty {
        serde_json::to_string_pretty(&reports)?
    } else {
        serde_json::to_string(&reports)?
    };

    match cli.output {
        Some(ref path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write output: {}", path.display()))?;
            log::info!("Done! Output: {}", path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}

fn analyze_file(
    input: &Path,
    ext: &str,
    block_length: BlockLength,
    energy_window_ms: u32,
) -> Result<AnalysisReport> {
    let bytes = std::fs::read(input)
        .with_context(|| format!("Failed to open audio file: {}", input.display()))?;

    let extractor = SymphoniaExtractor::new()
        .with_extension_hint(ext)
        .with_energy_window_ms(energy_window_ms);
    let analysis = analyze_bytes(&extractor, &bytes, block_length);

    Ok(AnalysisReport {
        source: input.display().to_string(),
        analysis,
    })
}
