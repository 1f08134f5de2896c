//! Cookie retry decision for sign-in walls.

use crate::config::{DownloaderKind, PhraseConfig};
use crate::downloader::response::{DownloadResponse, DownloadStatus};

/// Retry settings lifted from the run configuration.
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    pub browser: Option<String>,
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    NoRetry,
    /// Re-run the attempt once with `--cookies-from-browser <browser>`.
    RetryWithCookies(String),
}

impl RetryPolicy {
    /// Whether a finished first attempt earns its one cookie retry. Only
    /// sign-in walls qualify, and only when a browser is configured, retries
    /// are not disabled, and the tool can read browser cookies at all.
    pub fn decide(
        &self,
        is_retry: bool,
        response: &DownloadResponse,
        phrases: &PhraseConfig,
        kind: DownloaderKind,
    ) -> RetryDecision {
        if is_retry || self.disabled {
            return RetryDecision::NoRetry;
        }
        if response.status == DownloadStatus::Success {
            return RetryDecision::NoRetry;
        }
        let Some(message) = response.message.as_deref() else {
            return RetryDecision::NoRetry;
        };
        if !phrases.is_retry_trigger(message) {
            return RetryDecision::NoRetry;
        }
        if !kind.supports_cookies_from_browser() {
            return RetryDecision::NoRetry;
        }
        match &self.browser {
            Some(browser) => RetryDecision::RetryWithCookies(browser.clone()),
            None => RetryDecision::NoRetry,
        }
    }
}
