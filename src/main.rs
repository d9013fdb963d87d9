//! infinity-scanner - Continuous sharpness-gated camera OCR
//!
//! Samples a video feed once per tick, scores each frame for optical
//! sharpness, retains the best frames, and periodically submits a batch to
//! Gemini for text extraction, merging results into a running scan log.

mod capture;
mod config;
mod ocr;
mod pipeline;
mod scanlog;
mod storage;
mod vision;

use anyhow::Result;
use clap::Parser;
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::capture::synthetic::SyntheticSource;
use crate::config::ScanConfig;
use crate::ocr::OcrClient;
use crate::pipeline::{now_ms, ScanPipeline};
use crate::scanlog::{LogStatus, LogStore};

/// Scheduling tick spacing, roughly a 30fps cadence
const TICK_MS: u64 = 33;

/// infinity-scanner - batch OCR over the sharpest frames of a live feed
#[derive(Parser, Debug)]
#[command(name = "infinity-scanner")]
#[command(about = "Continuous sharpness-gated camera OCR with Gemini batch extraction")]
struct Args {
    /// Extraction model identifier
    #[arg(long)]
    model: Option<String>,

    /// Frames per batch (1-20)
    #[arg(long)]
    max_frames: Option<usize>,

    /// Minimum milliseconds between captures (100-2000)
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Sharpness gate threshold
    #[arg(long)]
    threshold: Option<u32>,

    /// System prompt preset name
    #[arg(long)]
    preset: Option<String>,

    /// List available prompt presets and exit
    #[arg(long)]
    list_presets: bool,

    /// Seconds to run the synthetic demo session
    #[arg(long, default_value = "30")]
    duration: u64,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if args.list_presets {
        println!("Available prompt presets:");
        for (name, prompt) in config::PROMPT_PRESETS {
            let first_line = prompt.lines().next().unwrap_or_default();
            println!("  {name:<12} {first_line}");
        }
        return Ok(());
    }

    info!("infinity-scanner starting...");

    let mut scan_config = load_or_create_config();
    apply_overrides(&mut scan_config, &args)?;

    if scan_config.api_key.is_empty() {
        warn!("no API key configured; batches will fail until one is set (config file or GEMINI_API_KEY)");
    }

    run_session(scan_config, args.duration)?;

    info!("infinity-scanner shutdown complete");
    Ok(())
}

/// Load configuration from file or create default
fn load_or_create_config() -> ScanConfig {
    if let Ok(config_dir) = storage::get_config_dir() {
        let config_path = config_dir.join("config.toml");
        if config_path.exists() {
            if let Ok(config) = config::load_config(&config_path) {
                info!("Loaded configuration from {:?}", config_path);
                return config;
            }
        }
    }
    info!("Using default configuration");
    ScanConfig::default()
}

/// Fold CLI flags and the environment credential into the session config
fn apply_overrides(scan_config: &mut ScanConfig, args: &Args) -> Result<()> {
    if scan_config.api_key.is_empty() {
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            scan_config.api_key = key;
        }
    }
    if let Some(model) = &args.model {
        scan_config.model = model.clone();
    }
    if let Some(max_frames) = args.max_frames {
        scan_config.max_frames = max_frames;
    }
    if let Some(interval_ms) = args.interval_ms {
        scan_config.capture_interval_ms = interval_ms;
    }
    if let Some(threshold) = args.threshold {
        scan_config.sharpness_threshold = threshold;
    }
    if let Some(preset) = &args.preset {
        let prompt = config::prompt_preset(preset)
            .ok_or_else(|| anyhow::anyhow!("unknown prompt preset: {preset}"))?;
        scan_config.system_prompt = prompt.to_string();
    }
    *scan_config = scan_config.clone().clamped();
    Ok(())
}

/// Run one scanning session against the synthetic test-pattern source.
///
/// Real camera backends implement `VideoSource` outside this binary; the
/// synthetic source exercises the identical pipeline end to end.
fn run_session(scan_config: ScanConfig, duration_secs: u64) -> Result<()> {
    let source = SyntheticSource::new(1280, 720);
    let client = OcrClient::new(scan_config.api_key.clone());
    let log = LogStore::shared();
    let mut pipeline = ScanPipeline::new(scan_config, source, client, log.clone());

    pipeline.activate();

    let started = now_ms();
    let mut last_report = started;
    while now_ms().saturating_sub(started) < duration_secs * 1000 {
        let now = now_ms();
        pipeline.tick(now);

        if now.saturating_sub(last_report) >= 1000 {
            let t = pipeline.telemetry();
            info!(
                sharpness = t.sharpness,
                buffer_fill = t.buffer_fill,
                max_frames = t.max_frames,
                in_flight = t.dispatch_in_flight,
                "telemetry"
            );
            last_report = now;
        }

        std::thread::sleep(Duration::from_millis(TICK_MS));
    }

    pipeline.deactivate();

    // Give a trailing in-flight call a moment to settle before reporting
    for _ in 0..100 {
        if log.read().entries().iter().all(|e| e.status != LogStatus::Pending) {
            break;
        }
        std::thread::sleep(Duration::from_millis(100));
    }

    let log = log.read();
    info!("session produced {} batch result(s)", log.len());
    for entry in log.entries() {
        match entry.status {
            LogStatus::Success => info!(id = %entry.id, "ok: {}", entry.text),
            LogStatus::Error => warn!(id = %entry.id, "failed: {}", entry.text),
            LogStatus::Pending => warn!(id = %entry.id, "still pending at shutdown"),
        }
    }

    Ok(())
}
