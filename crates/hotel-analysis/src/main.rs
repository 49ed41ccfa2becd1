mod bootstrap;

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use hotel_core::settings::Settings;
use hotel_data::analysis::{analyze_dataset, PipelineOptions};
use hotel_data::reader::DatasetPaths;
use hotel_report::{build_report, render, ReportFormat};

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();
    settings.validate()?;

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("Hotel analysis v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Month: {}, sigma: {}, zero capacity: {}, format: {}",
        settings.month,
        settings.sigma,
        settings.zero_capacity,
        settings.format
    );

    let data_dir = resolve_data_dir(&settings)?;
    let rendered = run(&settings, &data_dir)?;

    match &settings.output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("writing report to {}", path.display()))?;
            tracing::info!("Report written to {}", path.display());
        }
        None => print!("{}", rendered),
    }

    Ok(())
}

fn resolve_data_dir(settings: &Settings) -> Result<PathBuf> {
    match &settings.data_dir {
        Some(dir) => Ok(dir.clone()),
        None => bootstrap::discover_data_path()
            .ok_or_else(|| anyhow!("no data directory found; pass --data-dir")),
    }
}

/// Load, clean, join and report on the exports under `data_dir`.
fn run(settings: &Settings, data_dir: &std::path::Path) -> Result<String> {
    let format: ReportFormat = settings.format.parse()?;
    let options = PipelineOptions {
        sigma: settings.sigma,
        zero_capacity: settings.zero_capacity_policy()?,
    };

    let paths = DatasetPaths::discover(data_dir)?.with_supplementary(settings.supplementary.clone());
    tracing::debug!("Dataset paths: {:?}", paths);

    let output = analyze_dataset(&paths, &options)?;
    let report = build_report(&output, &settings.month);
    Ok(render(&report, format)?)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
