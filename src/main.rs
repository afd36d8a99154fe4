use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn, LevelFilter};
use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode, WriteLogger};
use tokio::runtime::Runtime;

use browser_triage::cli::Args;
use browser_triage::config::RunConfig;
use browser_triage::errors::TriageError;
use browser_triage::models::{ExtractionOutcome, ResultEnvelope};
use browser_triage::plugins;
use browser_triage::profile::chromium::ChromiumProfileFolder;
use browser_triage::profile::{BrowserProfile, ProfileOpener};
use browser_triage::registry::PluginRegistry;
use browser_triage::report::{self, RunSummary};
use browser_triage::runner::ArtifactRunner;

fn main() -> Result<()> {
    let args = Args::parse();

    // List modes only need the catalog; no profile, no logging setup.
    if args.list_plugins || args.table_list_plugins {
        let registry = PluginRegistry::load(&plugins::builtin_modules())?;
        if args.table_list_plugins {
            print_plugin_table(&registry);
        } else {
            print_plugin_list(&registry);
        }
        return Ok(());
    }

    let profile_folder = args
        .profile_folder
        .clone()
        .context("--profile-folder is required")?;
    let output_folder = args
        .output_folder
        .clone()
        .context("--output-folder is required")?;

    // All fatal conditions surface before any side effect on disk.
    validate_run_paths(&profile_folder, &output_folder, args.cache_folder.as_deref())?;
    let registry = Arc::new(PluginRegistry::load(&plugins::builtin_modules())?);

    fs::create_dir_all(&output_folder).context("Failed to create output directory")?;
    initialize_logging(args.verbose, &output_folder)?;

    info!("browser-triage v{} is on the go!", env!("CARGO_PKG_VERSION"));
    info!("Working with profile folder: {}", profile_folder.display());
    log_catalog(&registry);

    let run_config = load_run_config(args.config.as_deref())?;
    let selected = match &args.artifact {
        Some(name) => vec![registry.get(name)?.spec.name.to_string()],
        None => run_config.selected_artifacts(&registry)?,
    };

    let opener = make_profile_opener(&profile_folder, args.cache_folder.clone());
    let runner = ArtifactRunner::new(Arc::clone(&registry), opener, &output_folder);

    info!("Processing starting...");
    let mut summary = RunSummary::new(&profile_folder);

    let runtime = Runtime::new().context("Failed to create Tokio runtime")?;
    runtime.block_on(run_artifacts(
        &runner,
        &selected,
        args.artifact.as_deref(),
        &output_folder,
        &mut summary,
    ))?;

    summary.write(&output_folder)?;
    info!("Processing complete");
    Ok(())
}

/// Check the run's path preconditions before anything is created.
fn validate_run_paths(profile: &Path, output: &Path, cache: Option<&Path>) -> Result<()> {
    if !profile.is_dir() {
        return Err(TriageError::InvalidProfile(profile.to_path_buf()).into());
    }
    if output.exists() {
        return Err(TriageError::OutputAlreadyExists(output.to_path_buf()).into());
    }
    if let Some(cache) = cache {
        if !cache.is_dir() {
            return Err(TriageError::InvalidProfile(cache.to_path_buf()).into());
        }
    }
    Ok(())
}

/// Initialize logging to the terminal and to a timestamped log file in
/// the output folder.
fn initialize_logging(verbose: bool, output_folder: &Path) -> Result<()> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let log_path = output_folder.join(format!(
        "triage_{}.log",
        chrono::Utc::now().format("%Y%m%d_%H%M%S")
    ));
    let log_file = File::create(&log_path)
        .with_context(|| format!("Failed to create log file {}", log_path.display()))?;

    CombinedLogger::init(vec![
        TermLogger::new(
            log_level,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(log_level, Config::default(), log_file),
    ])
    .context("Failed to initialize logger")?;
    Ok(())
}

/// Load the run configuration, defaulting to "run everything".
fn load_run_config(config_path: Option<&Path>) -> Result<RunConfig> {
    match config_path {
        Some(path) => RunConfig::from_yaml_file(path),
        None => Ok(RunConfig::default()),
    }
}

fn make_profile_opener(profile_folder: &Path, cache_folder: Option<PathBuf>) -> ProfileOpener {
    let profile_folder = profile_folder.to_path_buf();
    Arc::new(move || {
        let profile = ChromiumProfileFolder::open(&profile_folder, cache_folder.as_deref())?;
        Ok(Box::new(profile) as Box<dyn BrowserProfile>)
    })
}

fn log_catalog(registry: &PluginRegistry) {
    info!("Plugins loaded:");
    info!("===============");
    for entry in registry.all() {
        info!(
            "{}\tv{} -\t{}",
            entry.spec.name, entry.spec.version, entry.origin
        );
    }
}

/// Drive the invocations and persist their reports as envelopes arrive.
async fn run_artifacts(
    runner: &ArtifactRunner,
    selected: &[String],
    single: Option<&str>,
    output_root: &Path,
    summary: &mut RunSummary,
) -> Result<()> {
    if let Some(name) = single {
        let envelope = runner.run_one(name).await?;
        handle_envelope(output_root, &envelope, summary);
        return Ok(());
    }

    let mut receiver = runner.run_subset(selected)?;
    while let Some(envelope) = receiver.recv().await {
        handle_envelope(output_root, &envelope, summary);
    }
    Ok(())
}

fn handle_envelope(output_root: &Path, envelope: &ResultEnvelope, summary: &mut RunSummary) {
    match &envelope.outcome {
        ExtractionOutcome::Failed(message) => {
            warn!("{} failed: {}", envelope.name, message);
        }
        ExtractionOutcome::Completed(_) => {
            if let Err(e) = report::write_reports(output_root, envelope) {
                warn!("Failed to write report for {}: {:#}", envelope.name, e);
            }
        }
    }
    summary.record(envelope);
}

fn print_plugin_list(registry: &PluginRegistry) {
    for entry in registry.all() {
        println!(
            "- {}\t{}\t{}\tv{}",
            entry.origin, entry.spec.service, entry.spec.name, entry.spec.version
        );
        for line in entry.spec.description.lines() {
            println!("\t{}", line);
        }
    }
}

fn print_plugin_table(registry: &PluginRegistry) {
    println!("| Plugin File | Service | Artifact | Version | Description |");
    println!("| ----------- | ------- | -------- | ------- | ----------- |");
    for entry in registry.all() {
        println!(
            "| {} | {} | {} | {} | {} |",
            entry.origin,
            entry.spec.service,
            entry.spec.name,
            entry.spec.version,
            entry.spec.description.lines().collect::<Vec<_>>().join("<br>")
        );
    }
}
