use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use facegate_capture::{EncodeFormat, VideoFrame};
use facegate_core::presets;
use facegate_core::{AlignmentConfig, CaptureOutcome, DetectionFrame, DetectorReadiness, Phase};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

mod config;
mod engine;
mod queue;
mod trace;

use config::Config;
use trace::TraceEvent;

#[derive(Parser)]
#[command(name = "facegate", about = "Face alignment gated photo capture")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a detection trace against a still frame and save the captures
    Replay {
        /// JSONL detection trace
        trace: PathBuf,
        /// Raw frame the captures are cropped from
        #[arg(long)]
        frame: PathBuf,
        /// Output directory (default: FACEGATE_OUTPUT_DIR or ./captures)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Write a preview of the last frame with region and faces drawn
        #[arg(long)]
        overlay: Option<PathBuf>,
        /// Preset name (overrides FACEGATE_PRESET)
        #[arg(long)]
        preset: Option<String>,
        /// Capture encoding: png, jpeg or jpeg:<quality>
        #[arg(long)]
        format: Option<EncodeFormat>,
    },
    /// Print the built-in presets
    Presets,
    /// Parse and validate an alignment config file
    CheckConfig {
        /// TOML file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Replay {
            trace,
            frame,
            out,
            overlay,
            preset,
            format,
        } => {
            let mut config = Config::from_env();
            if let Some(out) = out {
                config.output_dir = out;
            }
            if let Some(preset) = preset {
                config.preset = preset;
                config.config_file = None;
            }
            if let Some(format) = format {
                config.encode_format = format;
            }
            replay(&config, &trace, &frame, overlay).await?;
        }
        Commands::Presets => {
            for preset in presets::list_presets() {
                println!("# {}: {}", preset.preset.name, preset.preset.description);
                println!("[{}]", preset.preset.name);
                print!("{}", toml::to_string_pretty(&preset.alignment)?);
                println!();
            }
        }
        Commands::CheckConfig { file } => {
            let config = AlignmentConfig::from_toml_file(&file)
                .with_context(|| format!("invalid config {}", file.display()))?;
            println!("{}: ok", file.display());
            println!(
                "  stability {}ms, countdown {}ms, cooldown {}ms, manual capture {}",
                config.stability_ms,
                config.countdown_ms,
                config.cooldown_ms,
                if config.allow_manual_capture { "on" } else { "off" }
            );
        }
    }

    Ok(())
}

async fn replay(
    config: &Config,
    trace_path: &std::path::Path,
    frame_path: &std::path::Path,
    overlay: Option<PathBuf>,
) -> Result<()> {
    let alignment = config.alignment()?;
    let events = trace::read_trace(trace_path)?;
    let frame = VideoFrame::open(frame_path)?;

    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .with_context(|| format!("cannot create {}", config.output_dir.display()))?;

    let (capture_tx, capture_rx) = mpsc::unbounded_channel();
    let writer = queue::spawn_writer(config.output_dir.clone(), capture_rx);

    let readiness = DetectorReadiness::ready();
    let engine = engine::spawn_engine(
        alignment,
        config.region(),
        readiness.clone(),
        frame,
        config.encode_format,
        capture_tx,
    )?;

    tracing::info!(
        events = events.len(),
        preset = %config.preset,
        out = %config.output_dir.display(),
        "replaying trace"
    );

    let t0 = Instant::now();
    let mut last_phase = Phase::Idle;
    let mut last_detections = DetectionFrame::default();
    let mut last_aligned = false;

    for event in events {
        let at = t0 + Duration::from_millis(event.t_ms());
        let report = match &event {
            TraceEvent::Frame { .. } => {
                let detections = event.detection_frame().unwrap_or_default();
                let report = engine.frame(detections.clone(), at).await?;
                last_detections = detections;
                last_aligned = report.aligned;
                if let Some(e) = &report.skipped {
                    tracing::debug!(t_ms = event.t_ms(), error = %e, "frame skipped");
                }
                report
            }
            TraceEvent::Tick { .. } => engine.tick(at).await?,
            TraceEvent::Detector { ready, .. } => {
                if *ready {
                    readiness.mark_ready();
                } else {
                    readiness.mark_unavailable();
                }
                tracing::info!(ready, "detector availability changed");
                continue;
            }
            TraceEvent::Manual { .. } => match engine.manual(at).await {
                Ok(report) => report,
                Err(e) => {
                    println!("{:>7}ms  manual capture refused: {e}", event.t_ms());
                    continue;
                }
            },
        };

        match &report.capture {
            Some(CaptureOutcome::Captured(trigger)) => {
                println!("{:>7}ms  captured ({trigger:?})", event.t_ms());
            }
            Some(CaptureOutcome::Failed(e)) => {
                println!("{:>7}ms  capture failed: {e}", event.t_ms());
            }
            None => {}
        }
        if report.phase != last_phase {
            println!(
                "{:>7}ms  {} -> {}: {}",
                event.t_ms(),
                last_phase,
                report.phase,
                report.status
            );
            last_phase = report.phase;
        }
    }

    if let Some(path) = overlay {
        let canvas = engine.overlay(last_detections, last_aligned).await?;
        canvas
            .save(&path)
            .with_context(|| format!("cannot write overlay {}", path.display()))?;
        println!("overlay written to {}", path.display());
    }

    let submitted = engine.stop().await?;
    let written = writer.await??;
    println!(
        "{} capture(s) submitted, {} written to {}",
        submitted,
        written.len(),
        config.output_dir.display()
    );
    Ok(())
}
