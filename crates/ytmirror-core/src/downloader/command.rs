//! Invocation builder for the external download tool.

use std::path::Path;
use std::process::Command;

use crate::config::DownloaderKind;
use crate::video::VideoInfo;

/// Argument list for one download attempt. `cookie_browser` is only set on
/// the cookie retry; the first attempt passes `None`.
pub fn build_args(
    kind: DownloaderKind,
    video: &VideoInfo,
    cookie_browser: Option<&str>,
) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "--newline".into(),
        "-o".into(),
        video.target_path.to_string_lossy().into_owned(),
    ];

    if video.audio_only {
        args.extend([
            "-f".into(),
            "bestaudio/best".into(),
            "--extract-audio".into(),
            "--audio-format".into(),
            "mp3".into(),
        ]);
    } else {
        // The legacy tool merges streams unreliably, so it gets the
        // single-file format.
        let format = match kind {
            DownloaderKind::YtDlp => "bestvideo+bestaudio/best",
            DownloaderKind::YoutubeDl => "best",
        };
        args.extend(["-f".into(), format.into()]);
    }

    if let Some(sponsor) = &video.sponsor_block {
        if sponsor.enabled && !sponsor.categories.is_empty() {
            if kind.supports_sponsorblock() {
                args.push("--sponsorblock-remove".into());
                args.push(sponsor.categories.join(","));
            } else {
                tracing::debug!(
                    tool = kind.executable(),
                    "tool has no sponsorblock support, skipping segment removal"
                );
            }
        }
    }

    if let Some(browser) = cookie_browser {
        if kind.supports_cookies_from_browser() {
            args.push("--cookies-from-browser".into());
            args.push(browser.into());
        }
    }

    args.push(video.url.clone());
    args
}

/// Complete `Command` for one attempt, ready for the line streamer.
pub fn build_command(
    executable: &Path,
    kind: DownloaderKind,
    video: &VideoInfo,
    cookie_browser: Option<&str>,
) -> Command {
    let mut cmd = Command::new(executable);
    cmd.args(build_args(kind, video, cookie_browser));
    cmd
}

/// Runs `<exe> --version` to check the tool is present and executable.
/// Returns the reported version line when it is.
pub fn probe_tool(executable: &Path) -> Option<String> {
    let output = Command::new(executable).arg("--version").output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout);
    let version = text.lines().next()?.trim().to_string();
    (!version.is_empty()).then_some(version)
}
