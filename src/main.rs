//! Meshport - Export mesh assets to Wavefront OBJ
//!
//! This is the command-line entry point. It reads JSON dumps of mesh asset
//! objects, exports each mesh to `<out-dir>/<name>.obj` and optionally runs an
//! external converter on every exported file.

mod convert;
mod input;
mod settings;

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use meshport_mesh::{AssetOutcome, MeshBatch, ObjExporter};

use crate::convert::ExternalConverter;
use crate::settings::Settings;

#[derive(Parser, Debug)]
#[command(name = "meshport", version, about = "Export mesh assets to Wavefront OBJ")]
struct Args {
    /// JSON files holding one mesh object or an array of them
    #[arg(required_unless_present = "init_config")]
    inputs: Vec<PathBuf>,

    /// Directory the OBJ files are written to
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Settings file (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Skip the configured external converter
    #[arg(long)]
    no_convert: bool,

    /// Write the default settings file and exit
    #[arg(long)]
    init_config: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");

    if args.init_config {
        return Settings::default().save();
    }

    let settings = match &args.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load(),
    };

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("Failed to create output directory {:?}", args.out_dir))?;

    let mut batch = MeshBatch::new(ObjExporter::new(settings.export.clone()), &args.out_dir);
    if let Some(converter) = settings.converter.as_ref().filter(|_| !args.no_convert) {
        batch = batch.with_hook(ExternalConverter::from_settings(converter));
    }

    let mut unreadable = 0;
    let mut objects = Vec::new();
    for path in &args.inputs {
        match input::load_objects(path) {
            Ok(loaded) => objects.extend(loaded),
            Err(e) => {
                warn!("{:#}", e);
                unreadable += 1;
            }
        }
    }

    let report = batch.run(objects.iter().map(|o| (o.label.clone(), &o.object)));

    for asset in &report.assets {
        match &asset.outcome {
            AssetOutcome::Exported {
                hook_error: Some(e),
                ..
            } => warn!("{}: exported, but conversion failed: {}", asset.name, e),
            AssetOutcome::Exported { .. } => {}
            AssetOutcome::Skipped(reason) => info!("{}: skipped ({:?})", asset.name, reason),
            AssetOutcome::Failed {
                stage,
                kind,
                message,
            } => warn!("{}: {} failed ({}): {}", asset.name, stage, kind, message),
        }
    }

    info!(
        "{} exported, {} skipped, {} failed",
        report.exported(),
        report.skipped(),
        report.failed()
    );

    if report.has_failures() || unreadable > 0 {
        bail!(
            "{} asset(s) failed, {} input file(s) unreadable",
            report.failed(),
            unreadable
        );
    }
    Ok(())
}
