//! Download outcome taxonomy and error-text classification.
//!
//! Classification is text-based: the exit code of the external tool is not
//! load-bearing. The driver scans the full captured output for the last
//! error marker and classifies the normalized message against the phrase
//! lists in [`PhraseConfig`].

use std::path::PathBuf;

use crate::config::PhraseConfig;

/// Outcome class for one download request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStatus {
    /// No error marker in the captured output.
    Success,
    /// Recognized non-critical error; the item stays eligible for later runs.
    Failure,
    /// Unrecognized or critical error.
    Error,
}

/// Final outcome of one download request. Read-only once the driver returns.
#[derive(Debug, Clone)]
pub struct DownloadResponse {
    pub status: DownloadStatus,
    pub message: Option<String>,
    /// Normalized error line, when a marker was found.
    pub error: Option<String>,
    /// Output path recorded from destination/merge/extract events; feeds the
    /// archive ledger.
    pub output_path: Option<PathBuf>,
    /// Full captured subprocess output, kept for diagnostics only.
    pub raw_log: String,
}

impl DownloadResponse {
    pub fn success(message: Option<String>, output_path: Option<PathBuf>, raw_log: String) -> Self {
        Self {
            status: DownloadStatus::Success,
            message,
            error: None,
            output_path,
            raw_log,
        }
    }

    /// Response for spawn/I-O failures where no output classification is
    /// possible.
    pub fn unknown_error(raw_log: String) -> Self {
        Self {
            status: DownloadStatus::Error,
            message: Some("Unknown Error".to_string()),
            error: None,
            output_path: None,
            raw_log,
        }
    }
}

/// Working state the output classifier fills in while the subprocess runs;
/// the driver folds it into the final response.
#[derive(Debug, Default)]
pub struct ResponseDraft {
    /// Pending human-readable note (e.g. "Already Downloaded").
    pub message: Option<String>,
    pub output_path: Option<PathBuf>,
}

/// Find the last error marker in the captured output and return the marker's
/// line. `ERROR:` is the primary marker; `<exe>: error:` is the fallback
/// form some tool versions emit.
pub fn extract_error_line(raw: &str, exe: &str) -> Option<String> {
    let idx = match raw.rfind("ERROR:") {
        Some(i) => i,
        None => raw.rfind(&format!("{exe}: error:"))?,
    };
    let line = raw[idx..].lines().next().unwrap_or("");
    Some(line.trim().to_string())
}

/// Strip marker noise from an extracted error line: the leading `ERROR:` or
/// `<exe>: error:` tag, a stray `- ` prefix, bracketed tool tags, and any
/// trailing `(caused by ...)` tail.
pub fn normalize_error(line: &str, exe: &str) -> String {
    let mut msg = line.trim();
    if let Some(rest) = msg.strip_prefix(&format!("{exe}: error:")) {
        msg = rest.trim_start();
    }
    if let Some(rest) = msg.strip_prefix("ERROR:") {
        msg = rest.trim_start();
    }
    if let Some(rest) = msg.strip_prefix("- ") {
        msg = rest.trim_start();
    }
    while msg.starts_with('[') {
        match msg.find(']') {
            Some(end) => msg = msg[end + 1..].trim_start(),
            None => break,
        }
    }
    let msg = match msg.find("(caused by") {
        Some(pos) => msg[..pos].trim_end(),
        None => msg,
    };
    msg.to_string()
}

/// FAILURE for known-benign phrases, ERROR otherwise.
pub fn classify_error(message: &str, phrases: &PhraseConfig) -> DownloadStatus {
    if phrases.is_non_critical(message) {
        DownloadStatus::Failure
    } else {
        DownloadStatus::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_marker_means_no_error() {
        let raw = "[download] Destination: v.mp4\n[download] 100% of 2.16MiB in 00:00\n";
        assert_eq!(extract_error_line(raw, "yt-dlp"), None);
    }

    #[test]
    fn last_marker_wins() {
        let raw = "ERROR: first problem\n[download] retrying\nERROR: second problem\n";
        assert_eq!(
            extract_error_line(raw, "yt-dlp").as_deref(),
            Some("ERROR: second problem")
        );
    }

    #[test]
    fn executable_marker_is_the_fallback() {
        let raw = "usage: yt-dlp [OPTIONS] URL\nyt-dlp: error: no such option: --bogus\n";
        assert_eq!(
            extract_error_line(raw, "yt-dlp").as_deref(),
            Some("yt-dlp: error: no such option: --bogus")
        );
        // The uppercase marker takes precedence even when both appear.
        let raw = "yt-dlp: error: late form\nERROR: early form\n";
        assert_eq!(
            extract_error_line(raw, "yt-dlp").as_deref(),
            Some("ERROR: early form")
        );
    }

    #[test]
    fn marker_text_stops_at_end_of_line() {
        let raw = "ERROR: bad thing happened\n[download] unrelated follow-up\n";
        assert_eq!(
            extract_error_line(raw, "yt-dlp").as_deref(),
            Some("ERROR: bad thing happened")
        );
    }

    #[test]
    fn normalize_strips_marker_and_tool_tag() {
        let msg = normalize_error(
            "ERROR: [youtube] dQw4w9WgXcQ: Sign in to confirm your age",
            "yt-dlp",
        );
        assert_eq!(msg, "dQw4w9WgXcQ: Sign in to confirm your age");
    }

    #[test]
    fn normalize_strips_exe_marker_and_dash() {
        let msg = normalize_error("yt-dlp: error: - no such option", "yt-dlp");
        assert_eq!(msg, "no such option");
    }

    #[test]
    fn normalize_strips_caused_by_tail() {
        let msg = normalize_error(
            "ERROR: unable to download video data: HTTP Error 403: Forbidden (caused by HTTPError())",
            "yt-dlp",
        );
        assert_eq!(msg, "unable to download video data: HTTP Error 403: Forbidden");
    }

    #[test]
    fn classification_against_phrase_lists() {
        let phrases = PhraseConfig::default();
        assert_eq!(
            classify_error("Sign in to confirm your age", &phrases),
            DownloadStatus::Failure
        );
        assert_eq!(
            classify_error("some unseen problem", &phrases),
            DownloadStatus::Error
        );
    }
}
