//! Scan command: capture a photo, watch the analysis, print the results.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use mom_core::analysis::engine::StubEngine;
use mom_core::analysis::model::AnalysisState;
use mom_core::analysis::AnalysisSimulator;
use mom_core::capture::model::{CaptureOptions, CaptureSource, CropRect};
use mom_core::capture::picker::DevicePicker;
use mom_core::capture::CaptureController;
use mom_core::config::MomConfig;
use mom_core::report::ScanReport;
use mom_core::session::ScanSession;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use crate::output;

#[derive(Args)]
pub struct ScanArgs {
    /// Photo to analyze (the gallery pick)
    pub path: Option<PathBuf>,

    /// Take the photo with the configured camera command instead
    #[arg(long, conflicts_with = "path")]
    pub camera: bool,

    /// Crop rectangle applied before analysis: x,y,width,height
    #[arg(long)]
    pub crop: Option<CropRect>,

    /// JPEG quality for the re-encoded photo (1-100)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: Option<u8>,

    /// Skip the crop step even when --crop is given
    #[arg(long)]
    pub no_edit: bool,

    /// Write the report to this file (.json for JSON, Markdown otherwise)
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: ScanArgs, config: &MomConfig) -> Result<()> {
    let source = if args.camera {
        CaptureSource::Camera
    } else if args.path.is_some() {
        CaptureSource::Gallery
    } else {
        bail!("Pass a photo path or --camera");
    };

    let options = capture_options(&args, config);
    debug!(quality = options.quality, allow_editing = options.allow_editing, "Capture options");

    let mut picker = DevicePicker::new(config.capture.camera_command.clone());
    if let Some(path) = &args.path {
        picker = picker.with_gallery_file(path);
    }

    let session = ScanSession::new(
        CaptureController::new(Arc::new(picker), options),
        AnalysisSimulator::new(Arc::new(StubEngine)),
    );

    info!(source = ?source, "Scan started");
    match session.capture(source).await {
        Ok(notice) => {
            if !args.json {
                output::print_notice(&notice);
            }
        }
        Err(notice) => {
            output::print_notice(&notice);
            bail!("{}", notice.cause.unwrap_or(notice.description));
        }
    }

    follow_progress(&session, args.json).await;

    let result = session
        .analysis()
        .wait_complete()
        .await
        .context("Analysis did not complete")?;
    let image = session.image().context("No photo in session")?;
    let report = ScanReport::new(&image, result);
    info!(
        risk = report.result.risk_level.as_str(),
        confidence = report.result.confidence,
        "Scan analyzed"
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        output::print_results(&report);
    }

    if let Some(path) = &args.report {
        report.save(path)?;
        info!(path = %path.display(), "Report saved");
        if !args.json {
            println!("{} Report saved to {}", "✓".green().bold(), path.display());
        }
    }

    Ok(())
}

/// `[capture]` settings with the command-line overrides applied.
fn capture_options(args: &ScanArgs, config: &MomConfig) -> CaptureOptions {
    let mut options = CaptureOptions::from(&config.capture);
    if let Some(quality) = args.quality {
        options.quality = quality;
    }
    options.allow_editing &= !args.no_edit;
    options.crop = args.crop;
    options
}

/// Mirror the analysis phases on a progress bar until the run is terminal.
async fn follow_progress(session: &ScanSession, quiet: bool) {
    let bar = if quiet {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.magenta} {bar:40.magenta/white} {pos:>3}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.enable_steady_tick(std::time::Duration::from_millis(100));
        bar
    };

    let mut rx = session.analysis().subscribe();
    loop {
        let state = rx.borrow_and_update().clone();
        match &state {
            AnalysisState::Analyzing { label, progress, .. } => {
                bar.set_position(u64::from(*progress));
                bar.set_message(label.clone());
            }
            AnalysisState::Idle => {}
            AnalysisState::Complete(_) | AnalysisState::Failed { .. } => break,
        }
        if rx.changed().await.is_err() {
            break;
        }
    }
    bar.finish_and_clear();
}
