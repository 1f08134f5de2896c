//! Progress line rendering: enabled segments in fixed order, ANSI palette.

use std::time::Duration;

use super::tracker::{ProgressTracker, DEFAULT_UPDATE_INTERVAL};

pub const ANSI_RESET: &str = "\x1b[0m";
const ANSI_CYAN: &str = "\x1b[36m";
const ANSI_GREEN: &str = "\x1b[32m";
const ANSI_RED: &str = "\x1b[31m";

/// Three-color palette: neutral while running, good on completion, bad on
/// failure.
#[derive(Debug, Clone)]
pub struct Palette {
    pub neutral: &'static str,
    pub good: &'static str,
    pub bad: &'static str,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            neutral: ANSI_CYAN,
            good: ANSI_GREEN,
            bad: ANSI_RED,
        }
    }
}

/// Display options for one progress bar.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub show_percentage: bool,
    pub show_bar: bool,
    pub show_ratio: bool,
    pub show_speed: bool,
    pub show_eta: bool,
    /// Width of the glyph region between the brackets, in characters.
    pub bar_width: usize,
    /// Unit label appended to amounts (amounts are kilobytes).
    pub unit: String,
    /// Repaint the terminal line on every accepted update.
    pub auto_print: bool,
    /// Minimum spacing between accepted model updates.
    pub min_update_interval: Duration,
    /// Leading indent, in spaces.
    pub indent: usize,
    pub palette: Palette,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            show_percentage: true,
            show_bar: true,
            show_ratio: true,
            show_speed: true,
            show_eta: true,
            bar_width: 30,
            unit: "KB".to_string(),
            auto_print: true,
            min_update_interval: DEFAULT_UPDATE_INTERVAL,
            indent: 2,
            palette: Palette::default(),
        }
    }
}

/// Build the uncolored line for the tracker's state. Segment order is fixed:
/// percentage, bar, ratio, speed, ETA. The speed segment is suppressed once
/// terminal; the ETA segment then shows the terminal state instead.
pub(crate) fn compose_line(tracker: &ProgressTracker, opts: &RenderOptions) -> String {
    let mut segments: Vec<String> = Vec::with_capacity(5);
    if opts.show_percentage {
        segments.push(format!("{:>5.1}%", tracker.ratio() * 100.0));
    }
    if opts.show_bar {
        segments.push(bar_glyphs(tracker.ratio(), opts.bar_width));
    }
    if opts.show_ratio {
        segments.push(format!(
            "{:.1}/{:.1}{}",
            tracker.current(),
            tracker.total(),
            opts.unit
        ));
    }
    if opts.show_speed && !tracker.is_terminal() {
        segments.push(format!(
            "{:.1}{}/s",
            tracker.rolling_average_speed(),
            opts.unit
        ));
    }
    if opts.show_eta {
        segments.push(eta_segment(tracker));
    }
    format!("{}{}", " ".repeat(opts.indent), segments.join(" "))
}

/// Color for the tracker's current state.
pub(crate) fn active_color(tracker: &ProgressTracker, opts: &RenderOptions) -> &'static str {
    if tracker.is_completed() {
        opts.palette.good
    } else if tracker.is_failed() {
        opts.palette.bad
    } else {
        opts.palette.neutral
    }
}

fn bar_glyphs(ratio: f64, width: usize) -> String {
    let filled = ((ratio * width as f64).round() as usize).min(width);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

fn eta_segment(tracker: &ProgressTracker) -> String {
    if tracker.is_completed() {
        return "Complete".to_string();
    }
    if tracker.is_failed() {
        return "Failed".to_string();
    }
    format!("ETA {}", format_eta(tracker.time_remaining()))
}

/// `--:--` when unknown, otherwise `MM:SS`, or `H:MM:SS` from one hour up.
pub fn format_eta(remaining: Duration) -> String {
    if remaining == Duration::MAX {
        return "--:--".to_string();
    }
    let secs = remaining.as_secs();
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

/// Compact elapsed-time text for terminal lines, e.g. "1m 23s".
pub fn format_duration(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs >= 3600 {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    } else if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}s", secs)
    }
}
