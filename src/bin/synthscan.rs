//! synthscan - analyze local media files from the command line.
//!
//! Decodes each input, runs the detection pipeline, and prints one JSON
//! document per file. Exits non-zero if any file fails to analyze.

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use std::path::PathBuf;
use std::time::Instant;

use synthscan::config::{classify_extension, MediaKind};
use synthscan::{Analyzer, DetectorConfig};

#[derive(Parser, Debug)]
#[command(name = "synthscan", about = "Synthetic-media detection for images and videos")]
struct Args {
    /// Media files to analyze (.jpg .jpeg .png .webp .mp4 .mov .avi)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Skip the noise, geometry and motion probes
    #[arg(long)]
    fast: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let cfg = DetectorConfig::load()?;
    let analyzer = Analyzer::new(cfg);

    let mut failures = 0usize;
    for path in &args.files {
        match analyze_file(&analyzer, path, args.fast) {
            Ok(report) => {
                let rendered = if args.pretty {
                    serde_json::to_string_pretty(&report)?
                } else {
                    report.to_string()
                };
                println!("{rendered}");
            }
            Err(err) => {
                log::error!("{}: {:#}", path.display(), err);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn analyze_file(
    analyzer: &Analyzer,
    path: &std::path::Path,
    fast_mode: bool,
) -> Result<serde_json::Value> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    let kind = classify_extension(&filename)
        .with_context(|| format!("unsupported file extension for '{filename}'"))?;
    let bytes =
        std::fs::read(path).with_context(|| format!("read '{}'", path.display()))?;
    let started = Instant::now();

    let mut report = match kind {
        MediaKind::Image => {
            let analysis = analyzer.analyze_image_bytes(&bytes, fast_mode)?;
            let mut value = serde_json::to_value(&analysis.verdict)?;
            value["analysis_details"] = serde_json::to_value(&analysis.details)?;
            value
        }
        MediaKind::Video => {
            let analysis = analyzer.analyze_video_file(path, &bytes, fast_mode)?;
            let mut value = serde_json::to_value(&analysis.verdict)?;
            value["analysis_details"] = serde_json::to_value(&analysis.details)?;
            value["frames_analyzed"] = json!(analysis.frames_analyzed);
            value
        }
    };
    let elapsed_ms = (started.elapsed().as_secs_f64() * 1000.0 * 100.0).round() / 100.0;
    report["processing_time_ms"] = json!(elapsed_ms);
    report["filename"] = json!(filename);
    Ok(report)
}
