use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// External downloader executable. The legacy tool accepts a smaller flag set
/// (no SponsorBlock, no browser cookie extraction).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DownloaderKind {
    #[default]
    #[serde(rename = "yt-dlp")]
    YtDlp,
    #[serde(rename = "youtube-dl")]
    YoutubeDl,
}

impl DownloaderKind {
    /// Executable name looked up on PATH.
    pub fn executable(self) -> &'static str {
        match self {
            DownloaderKind::YtDlp => "yt-dlp",
            DownloaderKind::YoutubeDl => "youtube-dl",
        }
    }

    /// Whether the tool understands `--cookies-from-browser`. The legacy tool
    /// does not, which rules out the cookie retry path entirely.
    pub fn supports_cookies_from_browser(self) -> bool {
        matches!(self, DownloaderKind::YtDlp)
    }

    /// Whether the tool understands `--sponsorblock-remove`.
    pub fn supports_sponsorblock(self) -> bool {
        matches!(self, DownloaderKind::YtDlp)
    }
}

/// Console output mode: interactive in-place progress bar, or plain work-log
/// lines (one per terminal state) for non-interactive sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleMode {
    #[default]
    Bar,
    Log,
}

/// Error-message phrase lists used to classify downloader failures.
///
/// The external tool's wording changes between releases, so these are tuning
/// data rather than fixed logic: entries are matched case-insensitively as
/// substrings of the normalized error message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhraseConfig {
    /// Phrases marking an error as non-critical (classified FAILURE, the item
    /// stays eligible for future runs).
    pub non_critical: Vec<String>,
    /// Phrases that trigger the one-shot cookie retry.
    pub retry_triggers: Vec<String>,
}

impl Default for PhraseConfig {
    fn default() -> Self {
        let non_critical = [
            "sign in to",
            "login required",
            "too many requests",
            "http error 429",
            "rate limit",
            "timed out",
            "unable to connect",
            "connection reset",
            "network is unreachable",
            "temporary failure in name resolution",
            "unable to download webpage",
            "requested format is not available",
            "check back later",
            "ffmpeg not found",
        ];
        let retry_triggers = ["sign in"];
        Self {
            non_critical: non_critical.iter().map(|s| s.to_string()).collect(),
            retry_triggers: retry_triggers.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl PhraseConfig {
    /// True when `message` matches a known-benign error phrase.
    pub fn is_non_critical(&self, message: &str) -> bool {
        let lower = message.to_lowercase();
        self.non_critical.iter().any(|p| lower.contains(&p.to_lowercase()))
    }

    /// True when `message` belongs to the needs-sign-in class.
    pub fn is_retry_trigger(&self, message: &str) -> bool {
        let lower = message.to_lowercase();
        self.retry_triggers.iter().any(|p| lower.contains(&p.to_lowercase()))
    }
}

/// Default SponsorBlock handling applied to videos that carry no per-channel
/// override (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SponsorBlockDefaults {
    pub enabled: bool,
    pub categories: Vec<String>,
}

impl Default for SponsorBlockDefaults {
    fn default() -> Self {
        Self {
            enabled: false,
            categories: vec!["sponsor".to_string()],
        }
    }
}

/// Global configuration loaded from `~/.config/ytmirror/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// Which downloader executable to drive.
    #[serde(default)]
    pub downloader: DownloaderKind,
    /// Absolute path to the downloader binary; overrides PATH lookup.
    #[serde(default)]
    pub downloader_path: Option<PathBuf>,
    /// Browser whose cookie store backs the sign-in retry (e.g. "firefox").
    /// None disables the retry path.
    #[serde(default)]
    pub cookie_browser: Option<String>,
    /// Globally disable the cookie retry even when a browser is configured.
    #[serde(default)]
    pub disable_cookie_retry: bool,
    /// Interactive bar vs plain work-log output.
    #[serde(default)]
    pub console_mode: ConsoleMode,
    /// Width of the progress bar glyph region, in characters.
    #[serde(default = "default_bar_width")]
    pub bar_width: usize,
    /// Where downloads land when the CLI is not given `--dest`.
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
    /// Optional SponsorBlock defaults; if missing, segments are kept.
    #[serde(default)]
    pub sponsor_block: Option<SponsorBlockDefaults>,
    /// Error classification phrase lists.
    #[serde(default)]
    pub phrases: PhraseConfig,
}

fn default_bar_width() -> usize {
    30
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            downloader: DownloaderKind::default(),
            downloader_path: None,
            cookie_browser: None,
            disable_cookie_retry: false,
            console_mode: ConsoleMode::default(),
            bar_width: default_bar_width(),
            download_dir: None,
            sponsor_block: None,
            phrases: PhraseConfig::default(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("ytmirror")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<MirrorConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = MirrorConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: MirrorConfig = toml::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = MirrorConfig::default();
        assert_eq!(cfg.downloader, DownloaderKind::YtDlp);
        assert_eq!(cfg.console_mode, ConsoleMode::Bar);
        assert_eq!(cfg.bar_width, 30);
        assert!(cfg.cookie_browser.is_none());
        assert!(!cfg.disable_cookie_retry);
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = MirrorConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: MirrorConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.downloader, cfg.downloader);
        assert_eq!(parsed.console_mode, cfg.console_mode);
        assert_eq!(parsed.bar_width, cfg.bar_width);
        assert_eq!(parsed.phrases.non_critical, cfg.phrases.non_critical);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            downloader = "youtube-dl"
            cookie_browser = "firefox"
            disable_cookie_retry = true
            console_mode = "log"
            bar_width = 40
        "#;
        let cfg: MirrorConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.downloader, DownloaderKind::YoutubeDl);
        assert_eq!(cfg.cookie_browser.as_deref(), Some("firefox"));
        assert!(cfg.disable_cookie_retry);
        assert_eq!(cfg.console_mode, ConsoleMode::Log);
        assert_eq!(cfg.bar_width, 40);
        assert!(cfg.download_dir.is_none());
    }

    #[test]
    fn config_toml_sponsor_block_section() {
        let toml = r#"
            [sponsor_block]
            enabled = true
            categories = ["sponsor", "selfpromo"]
        "#;
        let cfg: MirrorConfig = toml::from_str(toml).unwrap();
        let sb = cfg.sponsor_block.as_ref().unwrap();
        assert!(sb.enabled);
        assert_eq!(sb.categories, vec!["sponsor", "selfpromo"]);
    }

    #[test]
    fn config_toml_phrase_override() {
        let toml = r#"
            [phrases]
            non_critical = ["fresh wording"]
            retry_triggers = ["sign in", "log in"]
        "#;
        let cfg: MirrorConfig = toml::from_str(toml).unwrap();
        assert!(cfg.phrases.is_non_critical("ERROR: Fresh Wording here"));
        assert!(!cfg.phrases.is_non_critical("timed out"));
        assert!(cfg.phrases.is_retry_trigger("please LOG IN first"));
    }

    #[test]
    fn default_phrases_cover_known_families() {
        let phrases = PhraseConfig::default();
        assert!(phrases.is_non_critical("Sign in to confirm your age"));
        assert!(phrases.is_non_critical("HTTP Error 429: Too Many Requests"));
        assert!(phrases.is_non_critical("The uploader has not made this video available; check back later"));
        assert!(phrases.is_non_critical("Requested format is not available"));
        assert!(!phrases.is_non_critical("Video unavailable"));
        assert!(phrases.is_retry_trigger("Sign in to confirm you're not a bot"));
    }
}
