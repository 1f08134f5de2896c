//! External download tool driving.
//!
//! Builds the yt-dlp / youtube-dl invocation for a video, streams the
//! merged stdout/stderr line-by-line into the progress-bar classifier,
//! then scans the full captured text for an error marker and classifies
//! the run into success / retryable failure / error. A recognized
//! sign-in wall earns exactly one retry with browser cookies.

pub mod command;
pub mod monitor;
pub mod patterns;
pub mod response;
pub mod retry;
pub mod run;
pub mod stream;

pub use command::{build_args, build_command, probe_tool};
pub use monitor::OutputMonitor;
pub use patterns::{match_line, LineEvent};
pub use response::{DownloadResponse, DownloadStatus, ResponseDraft};
pub use retry::{RetryDecision, RetryPolicy};
pub use run::Downloader;
pub use stream::{stream_lines, StreamError, StreamOutcome};
