//! Named pattern table for downloader output lines.
//!
//! The external tool's output is a versioned, semi-stable text format; every
//! pattern the engine recognizes lives here so adapting to a new tool release
//! touches one place. Checks are ordered; the first match wins.

use once_cell::sync::Lazy;
use regex::Regex;

/// Semantic event parsed from one output line. Amounts are kilobytes.
#[derive(Debug, Clone, PartialEq)]
pub enum LineEvent {
    /// `[download] Resuming download at byte N`.
    ResumedAt { kb: f64 },
    /// `[download] P% of ~T<unit>B ...` progress report.
    Progress { percent: f64, size_kb: f64 },
    /// `[download] <path> has already been downloaded`.
    AlreadyDownloaded { path: String },
    /// `[download] Destination: <path>`, announcing a new part.
    Destination { path: String },
    /// `[Merger] Merging formats into "<path>"`.
    MergingFormats { path: String },
    /// `[ExtractAudio] Destination: <path>`.
    ExtractingAudio { path: String },
}

static RESUME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[download\]\s+Resuming download at byte (\d+)").unwrap());

static PROGRESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[download\]\s+(\d+(?:\.\d+)?)%\s+of\s+~?\s*(\d+(?:\.\d+)?)([KkMmGgTt])[iI]?[Bb]")
        .unwrap()
});

static ALREADY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[download\]\s+(.+?)\s+has already been downloaded").unwrap());

static DESTINATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[download\]\s+Destination:\s+(.+)").unwrap());

static MERGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\[Merger\]\s+Merging formats into\s+"(.+)""#).unwrap());

static EXTRACT_AUDIO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[ExtractAudio\]\s+Destination:\s+(.+)").unwrap());

/// Scale factor from the size unit letter to kilobytes.
fn unit_to_kb(unit: char) -> f64 {
    match unit.to_ascii_uppercase() {
        'K' => 1.0,
        'M' => 1024.0,
        'G' => 1024.0 * 1024.0,
        'T' => 1024.0 * 1024.0 * 1024.0,
        _ => 1.0,
    }
}

/// Classify one output line, first match wins. Returns None for lines the
/// engine does not interpret.
pub fn match_line(line: &str) -> Option<LineEvent> {
    if let Some(caps) = RESUME.captures(line) {
        let bytes: f64 = caps[1].parse().ok()?;
        return Some(LineEvent::ResumedAt { kb: bytes / 1024.0 });
    }
    if let Some(caps) = PROGRESS.captures(line) {
        let percent: f64 = caps[1].parse().ok()?;
        let size: f64 = caps[2].parse().ok()?;
        let unit = caps[3].chars().next()?;
        return Some(LineEvent::Progress {
            percent,
            size_kb: size * unit_to_kb(unit),
        });
    }
    if let Some(caps) = ALREADY.captures(line) {
        return Some(LineEvent::AlreadyDownloaded {
            path: caps[1].trim().to_string(),
        });
    }
    if let Some(caps) = DESTINATION.captures(line) {
        return Some(LineEvent::Destination {
            path: caps[1].trim().to_string(),
        });
    }
    if let Some(caps) = MERGER.captures(line) {
        return Some(LineEvent::MergingFormats {
            path: caps[1].trim().to_string(),
        });
    }
    if let Some(caps) = EXTRACT_AUDIO.captures(line) {
        return Some(LineEvent::ExtractingAudio {
            path: caps[1].trim().to_string(),
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_progress_with_estimate_marker() {
        let event = match_line("[download]  42.5% of ~12.34MiB at 160.90KiB/s ETA 05:29").unwrap();
        match event {
            LineEvent::Progress { percent, size_kb } => {
                assert!((percent - 42.5).abs() < 1e-9);
                assert!((size_kb - 12.34 * 1024.0).abs() < 1e-6);
            }
            other => panic!("expected Progress, got {other:?}"),
        }
    }

    #[test]
    fn matches_progress_without_decimals_or_tilde() {
        let event = match_line("[download] 100% of 2.16MiB in 00:00").unwrap();
        match event {
            LineEvent::Progress { percent, size_kb } => {
                assert_eq!(percent, 100.0);
                assert!((size_kb - 2.16 * 1024.0).abs() < 1e-6);
            }
            other => panic!("expected Progress, got {other:?}"),
        }
    }

    #[test]
    fn size_units_scale_to_kilobytes() {
        let cases = [
            ("[download] 10.0% of 500KiB", 500.0),
            ("[download] 10.0% of 500kb", 500.0),
            ("[download] 10.0% of 1.5GiB", 1.5 * 1024.0 * 1024.0),
            ("[download] 10.0% of 2TB", 2.0 * 1024.0 * 1024.0 * 1024.0),
        ];
        for (line, expected_kb) in cases {
            match match_line(line) {
                Some(LineEvent::Progress { size_kb, .. }) => {
                    assert!((size_kb - expected_kb).abs() < 1e-6, "line: {line}");
                }
                other => panic!("expected Progress for {line}, got {other:?}"),
            }
        }
    }

    #[test]
    fn matches_resume_at_byte() {
        let event = match_line("[download] Resuming download at byte 1048576").unwrap();
        assert_eq!(event, LineEvent::ResumedAt { kb: 1024.0 });
    }

    #[test]
    fn matches_already_downloaded() {
        let event = match_line("[download] /tmp/v.mp4 has already been downloaded").unwrap();
        assert_eq!(
            event,
            LineEvent::AlreadyDownloaded {
                path: "/tmp/v.mp4".to_string()
            }
        );
    }

    #[test]
    fn matches_destination() {
        let event = match_line("[download] Destination: /tmp/v.f140.m4a").unwrap();
        assert_eq!(
            event,
            LineEvent::Destination {
                path: "/tmp/v.f140.m4a".to_string()
            }
        );
    }

    #[test]
    fn matches_merger_and_extract_audio() {
        let event = match_line(r#"[Merger] Merging formats into "/tmp/v.mp4""#).unwrap();
        assert_eq!(
            event,
            LineEvent::MergingFormats {
                path: "/tmp/v.mp4".to_string()
            }
        );
        let event = match_line("[ExtractAudio] Destination: /tmp/v.mp3").unwrap();
        assert_eq!(
            event,
            LineEvent::ExtractingAudio {
                path: "/tmp/v.mp3".to_string()
            }
        );
    }

    #[test]
    fn unrecognized_lines_return_none() {
        assert_eq!(match_line("[youtube] abc123: Downloading webpage"), None);
        assert_eq!(match_line("Deleting original file v.f140.m4a"), None);
        assert_eq!(match_line(""), None);
    }
}
