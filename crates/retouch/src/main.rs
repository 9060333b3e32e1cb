//! Retouch CLI - brightness, contrast and rotation edits for JPEG and PNG images.
//!
//! Every command reads one upload from disk, runs it through the same
//! validation and staging path a network front-end would, and writes the
//! encoded result to a file or stdout.
//!
//! # Usage
//!
//! ```bash
//! # Quick low-resolution preview
//! retouch preview photo.jpg -o preview.jpg
//!
//! # Brighten, add contrast and rotate a quarter turn
//! retouch process photo.jpg --brightness 1.5 --contrast 1.2 --rotate 90 -o edited.jpg
//!
//! # View configuration
//! retouch config show
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;
mod logging;

/// Retouch - brightness, contrast and rotation edits for JPEG and PNG images.
#[derive(Parser, Debug)]
#[command(name = "retouch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "RETOUCH_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a low-resolution JPEG preview of an image
    Preview(cli::preview::PreviewArgs),

    /// Apply brightness, contrast and rotation to an image
    Process(cli::process::ProcessArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

impl Cli {
    fn config_path(&self) -> PathBuf {
        match &self.config {
            Some(path) => PathBuf::from(shellexpand::tilde(path).as_ref()),
            None => retouch_core::Config::default_path(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config_path();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config = match load_config(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `retouch config path`."
            );
            retouch_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Retouch v{}", retouch_core::VERSION);

    match cli.command {
        Commands::Preview(args) => cli::preview::execute(args, &config).await,
        Commands::Process(args) => cli::process::execute(args, &config).await,
        Commands::Config(args) => cli::config::execute(args, &config, &config_path).await,
    }
}

/// A missing file means defaults; anything else must parse and validate.
fn load_config(path: &std::path::Path) -> Result<retouch_core::Config, retouch_core::ConfigError> {
    if path.exists() {
        retouch_core::Config::load_from(path)
    } else {
        Ok(retouch_core::Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_process_with_global_flags() {
        let cli = Cli::try_parse_from([
            "retouch",
            "process",
            "in.png",
            "--rotate",
            "-90",
            "--brightness",
            "1.5",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        let Commands::Process(args) = cli.command else {
            panic!("expected process");
        };
        assert_eq!(args.rotate, -90.0);
        assert_eq!(args.brightness, 1.5);
    }

    #[test]
    fn test_parses_preview_and_config() {
        let cli = Cli::try_parse_from(["retouch", "preview", "a.jpg", "-o", "p.jpg"]).unwrap();
        assert!(matches!(cli.command, Commands::Preview(_)));

        let cli = Cli::try_parse_from(["retouch", "--config", "/tmp/r.toml", "config", "path"])
            .unwrap();
        assert_eq!(cli.config_path(), PathBuf::from("/tmp/r.toml"));
    }

    #[test]
    fn test_missing_config_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.preview.max_edge, 300);
    }

    #[test]
    fn test_invalid_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[preview]\nmax_edge = 0\n").unwrap();
        assert!(load_config(&path).is_err());
    }
}
