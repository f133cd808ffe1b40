//! Command-Line Interface

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Hand Intent - Turn hand detection frames into intent lifecycle events
#[derive(Parser, Debug)]
#[command(name = "hand-intent")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a frame recording through the engine
    Replay {
        /// Recording file (JSON)
        #[arg(short, long)]
        frames: PathBuf,

        /// Intent definitions (TOML or JSON); defaults to ~/.hand_intent/intents.toml
        #[arg(short, long)]
        intents: Option<PathBuf>,

        /// Print every event as JSON instead of a summary
        #[arg(long)]
        json: bool,

        /// Leave actions live after the last frame instead of ending them
        #[arg(long)]
        no_finish: bool,
    },

    /// Validate an intent definition file
    Validate {
        /// Intent definitions (TOML or JSON)
        intents: PathBuf,
    },

    /// Print the active calibration table
    Calibration {
        /// Calibration table to check instead of the configured one
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// View or initialize configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write the default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Print the default config path
    Path,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Default intent definitions file
    pub fn default_intents_path() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".hand_intent").join("intents.toml"))
            .unwrap_or_else(|| PathBuf::from("intents.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_default_intents_path() {
        let path = Cli::default_intents_path();
        assert!(path.to_string_lossy().contains("intents.toml"));
    }

    #[test]
    fn test_cli_parse_replay_command() {
        let args = vec![
            "hand-intent",
            "replay",
            "--frames", "/path/to/frames.json",
            "--intents", "/path/to/intents.toml",
            "--json",
        ];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Replay { frames, intents, json, no_finish } => {
                assert_eq!(frames, PathBuf::from("/path/to/frames.json"));
                assert_eq!(intents, Some(PathBuf::from("/path/to/intents.toml")));
                assert!(json);
                assert!(!no_finish);
            }
            _ => panic!("Expected Replay command"),
        }
    }

    #[test]
    fn test_cli_parse_replay_requires_frames() {
        let result = Cli::try_parse_from(vec!["hand-intent", "replay"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_validate_command() {
        let cli = Cli::try_parse_from(vec!["hand-intent", "validate", "intents.json"]).unwrap();
        match cli.command {
            Commands::Validate { intents } => assert_eq!(intents, PathBuf::from("intents.json")),
            _ => panic!("Expected Validate command"),
        }
    }

    #[test]
    fn test_cli_parse_calibration_command() {
        let cli = Cli::try_parse_from(vec!["hand-intent", "calibration", "-f", "table.json"]).unwrap();
        match cli.command {
            Commands::Calibration { file } => assert_eq!(file, Some(PathBuf::from("table.json"))),
            _ => panic!("Expected Calibration command"),
        }
    }

    #[test]
    fn test_cli_parse_config_subcommands() {
        let cli = Cli::try_parse_from(vec!["hand-intent", "config", "init", "--force"]).unwrap();
        assert!(matches!(cli.command, Commands::Config { action: ConfigAction::Init { force: true } }));

        let cli = Cli::try_parse_from(vec!["hand-intent", "config", "path"]).unwrap();
        assert!(matches!(cli.command, Commands::Config { action: ConfigAction::Path }));
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::try_parse_from(vec![
            "hand-intent",
            "validate",
            "intents.toml",
            "--verbose",
            "--config", "/tmp/config.toml",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/config.toml")));
    }

    #[test]
    fn test_cli_verify_structure() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_unknown_command_fails() {
        assert!(Cli::try_parse_from(vec!["hand-intent", "record"]).is_err());
    }
}
