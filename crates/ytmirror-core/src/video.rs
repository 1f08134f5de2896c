//! Video records handed to the download driver by the metadata layer.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// SponsorBlock handling for one video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SponsorBlock {
    pub enabled: bool,
    /// Segment categories to cut (e.g. "sponsor", "selfpromo").
    pub categories: Vec<String>,
}

/// One video to download. Immutable input to the driver; the enumeration and
/// per-channel naming layers produce these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoInfo {
    /// Stable video id, also the archive ledger key.
    pub id: String,
    /// URL passed to the downloader.
    pub url: String,
    pub title: String,
    /// Output path template handed to the tool's `-o` flag.
    pub target_path: PathBuf,
    /// Fetch best audio and extract it instead of downloading video.
    #[serde(default)]
    pub audio_only: bool,
    /// Per-video SponsorBlock override; None means no segment removal.
    #[serde(default)]
    pub sponsor_block: Option<SponsorBlock>,
}

impl VideoInfo {
    pub fn new(id: impl Into<String>, url: impl Into<String>, target_path: PathBuf) -> Self {
        let id = id.into();
        Self {
            title: id.clone(),
            id,
            url: url.into(),
            target_path,
            audio_only: false,
            sponsor_block: None,
        }
    }
}
