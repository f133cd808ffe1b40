//! Hand Intent - frame-driven hand gesture intent engine
//!
//! Replays detection recordings through the engine and manages its
//! configuration, intent files and calibration tables.

use hand_intent::app::cli::{Cli, Commands, ConfigAction};
use hand_intent::app::config::EngineConfig;
use hand_intent::engine::IntentEngine;
use hand_intent::intent::IntentRegistry;
use hand_intent::pattern::{CalibrationLevel, CalibrationTable, Finger};
use hand_intent::workflow::{replay, FrameRecording, ReplayOptions};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments first so we can use --verbose to set log level
    let cli = Cli::parse_args();

    // Initialize tracing (--verbose enables debug-level output)
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    // Load config
    let config = if let Some(path) = &cli.config {
        EngineConfig::load(path)?
    } else {
        EngineConfig::load_default()?
    };

    // Execute command
    match cli.command {
        Commands::Replay {
            frames,
            intents,
            json,
            no_finish,
        } => {
            let intents = intents.unwrap_or_else(Cli::default_intents_path);
            run_replay(&frames, &intents, json, !no_finish, config)?;
        }
        Commands::Validate { intents } => {
            run_validate(&intents)?;
        }
        Commands::Calibration { file } => {
            run_calibration(file, &config)?;
        }
        Commands::Config { action } => {
            run_config(action, &config, cli.config)?;
        }
    }

    Ok(())
}

fn run_replay(frames: &Path, intents: &Path, json: bool, finish: bool, config: EngineConfig) -> anyhow::Result<()> {
    let registry = IntentRegistry::load(intents)?;
    let recording = FrameRecording::load(frames)?;
    info!(
        "Replaying {} ({} frames, {} ms) against {} intents",
        recording.metadata.name,
        recording.len(),
        recording.metadata.duration_ms,
        registry.len()
    );

    let mut engine = IntentEngine::new(registry, config)?;
    let report = replay(&recording, &mut engine, ReplayOptions { finish });

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.summary());
        let stats = report.stats;
        println!(
            "\nstarted={} ended={} preempted={} out_of_order_frames={}",
            stats.actions_started, stats.actions_ended, stats.preemptions, stats.out_of_order_frames
        );
    }
    Ok(())
}

fn run_validate(intents: &Path) -> anyhow::Result<()> {
    let registry = IntentRegistry::load(intents)?;
    println!("✓ {} intents valid", registry.len());
    for intent in registry.iter() {
        println!(
            "  {:<20} group={:<12} priority={:<4} specificity={}",
            intent.id,
            intent.group(),
            intent.priority(),
            intent.specificity()
        );
    }
    Ok(())
}

fn run_calibration(file: Option<PathBuf>, config: &EngineConfig) -> anyhow::Result<()> {
    let table = match file.as_ref().or(config.matching.calibration_file.as_ref()) {
        Some(path) => CalibrationTable::load(path)?,
        None => CalibrationTable::builtin().clone(),
    };

    println!("Calibration table v{}\n", table.version);
    println!("{:<8} {:>8} {:>12} {:>8}", "finger", "tight", "recommended", "relaxed");
    for finger in Finger::ALL {
        println!(
            "{:<8} {:>8.3} {:>12.3} {:>8.3}",
            format!("{:?}", finger).to_lowercase(),
            table.threshold(finger, CalibrationLevel::Tight),
            table.threshold(finger, CalibrationLevel::Recommended),
            table.threshold(finger, CalibrationLevel::Relaxed)
        );
    }
    Ok(())
}

fn run_config(action: ConfigAction, config: &EngineConfig, explicit: Option<PathBuf>) -> anyhow::Result<()> {
    let config_path = explicit.unwrap_or_else(EngineConfig::default_path);
    match action {
        ConfigAction::Show => {
            println!("Configuration ({:?}):\n", config_path);
            println!("{}", config.to_toml()?);
        }
        ConfigAction::Init { force } => {
            if config_path.exists() && !force {
                println!("Config exists at {:?}", config_path);
                println!("Use --force to overwrite");
                return Ok(());
            }
            EngineConfig::default().save(&config_path)?;
            println!("✓ Configuration written to {:?}", config_path);
        }
        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
    }
    Ok(())
}
