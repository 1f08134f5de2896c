//! CLI for the ytmirror channel archiver.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use ytmirror_core::config;

use commands::{run_check, run_download, run_status, DownloadArgs};

/// Top-level CLI for the ytmirror channel archiver.
#[derive(Debug, Parser)]
#[command(name = "ytmirror")]
#[command(about = "ytmirror: yt-dlp driven channel/playlist archiver", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download videos, skipping ids already in the archive ledger.
    Download {
        /// Video URLs or bare video ids.
        #[arg(required_unless_present = "batch_file")]
        inputs: Vec<String>,

        /// Download best audio only and extract it.
        #[arg(long)]
        audio_only: bool,

        /// Destination directory (defaults to config `download_dir`, then cwd).
        #[arg(long, value_name = "DIR")]
        dest: Option<PathBuf>,

        /// File with one URL or id per line ('#' starts a comment).
        #[arg(long, value_name = "FILE")]
        batch_file: Option<PathBuf>,

        /// Suppress the interactive bar; print plain work-log lines.
        #[arg(long)]
        no_progress: bool,

        /// Kill the tool and report an error after N seconds per video.
        #[arg(long, value_name = "N")]
        timeout_secs: Option<u64>,

        /// Also write the run summary as JSON to this path.
        #[arg(long, value_name = "PATH")]
        stats_json: Option<PathBuf>,
    },

    /// Show archive ledger entries and whether each file still exists.
    Status,

    /// Check the configured downloader executable is runnable.
    Check,
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Download {
                inputs,
                audio_only,
                dest,
                batch_file,
                no_progress,
                timeout_secs,
                stats_json,
            } => {
                run_download(
                    &cfg,
                    DownloadArgs {
                        inputs,
                        audio_only,
                        dest,
                        batch_file,
                        no_progress,
                        timeout_secs,
                        stats_json,
                    },
                )?;
            }
            CliCommand::Status => run_status()?,
            CliCommand::Check => run_check(&cfg)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
