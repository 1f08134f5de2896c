//! Download driver: spawn the tool, classify its output, finalize the bar.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::config::{ConsoleMode, DownloaderKind, MirrorConfig, PhraseConfig};
use crate::downloader::command;
use crate::downloader::monitor::OutputMonitor;
use crate::downloader::response::{self, DownloadResponse, DownloadStatus, ResponseDraft};
use crate::downloader::retry::{RetryDecision, RetryPolicy};
use crate::downloader::stream;
use crate::progress::{ProgressBar, RenderOptions};
use crate::stats::RunStats;
use crate::video::VideoInfo;

/// Drives one external-tool invocation per video, turning its line stream
/// into progress-bar movement and its captured text into a
/// [`DownloadResponse`].
#[derive(Debug, Clone)]
pub struct Downloader {
    kind: DownloaderKind,
    executable: PathBuf,
    retry: RetryPolicy,
    console_mode: ConsoleMode,
    bar_width: usize,
    phrases: PhraseConfig,
    deadline: Option<Duration>,
}

struct Attempt {
    response: DownloadResponse,
    downloaded_kb: f64,
}

impl Downloader {
    pub fn from_config(config: &MirrorConfig) -> Self {
        let kind = config.downloader;
        let executable = config
            .downloader_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(kind.executable()));
        Self {
            kind,
            executable,
            retry: RetryPolicy {
                browser: config.cookie_browser.clone(),
                disabled: config.disable_cookie_retry,
            },
            console_mode: config.console_mode,
            bar_width: config.bar_width,
            phrases: config.phrases.clone(),
            deadline: None,
        }
    }

    /// Kill the tool and report an error response when a single download
    /// runs longer than `deadline`.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn kind(&self) -> DownloaderKind {
        self.kind
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Download one video, retrying once with browser cookies when a
    /// sign-in wall is recognized. Subprocess trouble comes back as an
    /// error-status response, never as a panic or an `Err`.
    pub fn download_video(&self, video: &VideoInfo, stats: &mut RunStats) -> DownloadResponse {
        stats.attempted += 1;
        let mut attempt = self.attempt(video, None);
        stats.downloaded_kb += attempt.downloaded_kb;

        let decision = self
            .retry
            .decide(false, &attempt.response, &self.phrases, self.kind);
        if let RetryDecision::RetryWithCookies(browser) = decision {
            tracing::info!(
                video = %video.id,
                browser = %browser,
                "sign-in wall, retrying with browser cookies"
            );
            stats.retries += 1;
            // The retry response replaces the first one outright.
            attempt = self.attempt(video, Some(&browser));
            stats.downloaded_kb += attempt.downloaded_kb;
        }

        stats.record(&attempt.response);
        let response = attempt.response;
        match response.status {
            DownloadStatus::Success => tracing::info!(
                video = %video.id,
                message = response.message.as_deref().unwrap_or(""),
                "download succeeded"
            ),
            DownloadStatus::Failure => tracing::warn!(
                video = %video.id,
                message = response.message.as_deref().unwrap_or(""),
                "download failed, retryable"
            ),
            DownloadStatus::Error => tracing::error!(
                video = %video.id,
                message = response.message.as_deref().unwrap_or(""),
                "download errored"
            ),
        }
        response
    }

    fn attempt(&self, video: &VideoInfo, cookie_browser: Option<&str>) -> Attempt {
        let bar = ProgressBar::new(self.render_options());
        let draft = Arc::new(Mutex::new(ResponseDraft::default()));
        bar.set_handler(Box::new(OutputMonitor::new(
            video.audio_only,
            Arc::clone(&draft),
        )));

        let cmd = command::build_command(&self.executable, self.kind, video, cookie_browser);
        tracing::debug!(
            video = %video.id,
            tool = %self.executable.display(),
            retry = cookie_browser.is_some(),
            "spawning download tool"
        );

        let mut raw = String::new();
        let outcome = stream::stream_lines(cmd, self.deadline, |line, from_stderr| {
            raw.push_str(line);
            raw.push('\n');
            if !bar.process_log(line, from_stderr) {
                tracing::trace!(line, "unrecognized tool output");
            }
        });

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!(video = %video.id, error = %err, "download tool did not run");
                if !bar.is_terminal() {
                    bar.fail(false, "Unknown Error");
                }
                return finish_attempt(&bar, DownloadResponse::unknown_error(raw));
            }
        };

        if outcome.timed_out {
            tracing::warn!(video = %video.id, "deadline exceeded, download tool killed");
            if !bar.is_terminal() {
                bar.fail(false, "Download timed out");
            }
            let output_path = lock_draft(&draft).output_path.clone();
            let response = DownloadResponse {
                status: DownloadStatus::Error,
                message: Some("Download timed out".to_string()),
                error: None,
                output_path,
                raw_log: raw,
            };
            return finish_attempt(&bar, response);
        }

        let exe = self.kind.executable();
        let response = match response::extract_error_line(&raw, exe) {
            None => {
                let d = lock_draft(&draft);
                DownloadResponse::success(d.message.clone(), d.output_path.clone(), raw)
            }
            Some(line) => {
                let message = response::normalize_error(&line, exe);
                let status = response::classify_error(&message, &self.phrases);
                let output_path = lock_draft(&draft).output_path.clone();
                DownloadResponse {
                    status,
                    message: Some(message),
                    error: Some(line),
                    output_path,
                    raw_log: raw,
                }
            }
        };

        // Exactly one terminal transition per attempt; a merge or
        // extract-audio event may already have completed the bar.
        if !bar.is_terminal() {
            match response.status {
                DownloadStatus::Success => {
                    bar.complete(true, response.message.as_deref().unwrap_or(""));
                }
                _ => bar.fail(false, response.message.as_deref().unwrap_or("Unknown Error")),
            }
        }
        finish_attempt(&bar, response)
    }

    fn render_options(&self) -> RenderOptions {
        RenderOptions {
            bar_width: self.bar_width,
            auto_print: self.console_mode == ConsoleMode::Bar,
            ..RenderOptions::default()
        }
    }
}

fn finish_attempt(bar: &ProgressBar, response: DownloadResponse) -> Attempt {
    if let Some(line) = bar.final_line() {
        tracing::debug!(line = %line, "bar reached terminal state");
    }
    Attempt {
        downloaded_kb: (bar.current() - bar.initial_progress()).max(0.0),
        response,
    }
}

fn lock_draft(draft: &Arc<Mutex<ResponseDraft>>) -> MutexGuard<'_, ResponseDraft> {
    draft.lock().unwrap_or_else(|e| e.into_inner())
}
