//! synthscan_api - the detect HTTP daemon.
//!
//! Loads the detector configuration, binds the API server, and runs until
//! interrupted.

use anyhow::Result;
use clap::Parser;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use synthscan::api::ApiServer;
use synthscan::{Analyzer, DetectorConfig};

#[derive(Parser, Debug)]
#[command(name = "synthscan_api", about = "Synthetic-media detection API server")]
struct Args {
    /// Bind address, e.g. 127.0.0.1:8787 (overrides config and env)
    #[arg(long)]
    addr: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut cfg = DetectorConfig::load()?;
    if let Some(addr) = args.addr {
        cfg.api.addr = addr;
    }

    log::info!(
        "synthscan_api v{} starting on {}",
        env!("CARGO_PKG_VERSION"),
        cfg.api.addr
    );
    log::info!(
        "limits: image {}MB, video {}MB, {} frames max (every {}th)",
        cfg.limits.max_image_bytes / (1024 * 1024),
        cfg.limits.max_video_bytes / (1024 * 1024),
        cfg.limits.max_frames,
        cfg.limits.frame_sample_rate
    );

    let analyzer = Arc::new(Analyzer::new(cfg));
    let handle = ApiServer::new(analyzer).spawn()?;

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = interrupted.clone();
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
    })?;

    while !interrupted.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(200));
    }
    log::info!("shutting down");
    handle.stop()?;
    Ok(())
}
