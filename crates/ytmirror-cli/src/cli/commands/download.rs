//! `ytmirror download` – drive downloads through the archive ledger.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use ytmirror_core::config::{ConsoleMode, MirrorConfig};
use ytmirror_core::downloader::{DownloadStatus, Downloader};
use ytmirror_core::ledger::ArchiveLedger;
use ytmirror_core::stats::RunStats;
use ytmirror_core::video::{SponsorBlock, VideoInfo};

pub struct DownloadArgs {
    pub inputs: Vec<String>,
    pub audio_only: bool,
    pub dest: Option<PathBuf>,
    pub batch_file: Option<PathBuf>,
    pub no_progress: bool,
    pub timeout_secs: Option<u64>,
    pub stats_json: Option<PathBuf>,
}

pub fn run_download(cfg: &MirrorConfig, args: DownloadArgs) -> Result<()> {
    let mut inputs = args.inputs.clone();
    if let Some(batch) = &args.batch_file {
        inputs.extend(read_batch_file(batch)?);
    }
    if inputs.is_empty() {
        anyhow::bail!("nothing to download: no inputs and no --batch-file entries");
    }

    let dest = match args.dest.clone().or_else(|| cfg.download_dir.clone()) {
        Some(dir) => dir,
        None => std::env::current_dir().context("resolve current directory")?,
    };

    let ledger_path = ArchiveLedger::default_path()?;
    let mut ledger = ArchiveLedger::load(&ledger_path)?;

    let mut effective = cfg.clone();
    if args.no_progress {
        effective.console_mode = ConsoleMode::Log;
    }
    let mut downloader = Downloader::from_config(&effective);
    if let Some(secs) = args.timeout_secs {
        downloader = downloader.with_deadline(Duration::from_secs(secs));
    }

    let mut stats = RunStats::default();
    for input in &inputs {
        let video = video_from_input(input, &dest, args.audio_only, cfg);
        if let Some(existing) = ledger.get(&video.id) {
            tracing::info!(video = %video.id, path = %existing.display(), "already archived, skipping");
            println!("  {} already archived ({})", video.id, existing.display());
            stats.skipped += 1;
            continue;
        }

        println!("Downloading {}", video.title);
        let response = downloader.download_video(&video, &mut stats);
        if response.status == DownloadStatus::Success {
            let target = response
                .output_path
                .clone()
                .unwrap_or_else(|| video.target_path.clone());
            ledger.insert(video.id.clone(), target);
            // Persist after every success so an aborted run keeps its gains.
            ledger.save(&ledger_path)?;
        }
    }

    println!("{}", stats.summary());
    if let Some(path) = &args.stats_json {
        stats.write_json(path)?;
    }
    Ok(())
}

fn read_batch_file(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read batch file: {}", path.display()))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Derive the stable video id from a URL or bare id.
fn video_id_from_input(input: &str) -> String {
    let trimmed = input.trim();
    if !trimmed.contains("://") {
        return trimmed.to_string();
    }
    if let Some((_, query)) = trimmed.split_once("watch?v=") {
        let id: String = query
            .chars()
            .take_while(|c| *c != '&' && *c != '#')
            .collect();
        if !id.is_empty() {
            return id;
        }
    }
    for marker in ["youtu.be/", "/shorts/", "/live/"] {
        if let Some((_, rest)) = trimmed.split_once(marker) {
            let id: String = rest
                .chars()
                .take_while(|c| !matches!(c, '?' | '&' | '/' | '#'))
                .collect();
            if !id.is_empty() {
                return id;
            }
        }
    }
    // Last path segment as a fallback for unrecognized URL shapes.
    trimmed
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(trimmed)
        .to_string()
}

fn video_from_input(input: &str, dest: &Path, audio_only: bool, cfg: &MirrorConfig) -> VideoInfo {
    let id = video_id_from_input(input);
    let url = if input.contains("://") {
        input.trim().to_string()
    } else {
        format!("https://www.youtube.com/watch?v={id}")
    };
    let ext = if audio_only { "mp3" } else { "mp4" };
    let target = dest.join(format!("{id}.{ext}"));

    let mut video = VideoInfo::new(id, url, target);
    video.audio_only = audio_only;
    video.sponsor_block = cfg.sponsor_block.as_ref().map(|d| SponsorBlock {
        enabled: d.enabled,
        categories: d.categories.clone(),
    });
    video
}
