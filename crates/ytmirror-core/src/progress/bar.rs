//! Terminal progress bar: in-place repaint, terminal states, log-line hook.

use std::io::{self, Write};
use std::sync::Mutex;
use std::time::Duration;

use super::render::{self, RenderOptions, ANSI_RESET};
use super::tracker::ProgressTracker;

/// Invisible end cap appended after repaint padding so trailing spaces
/// survive sinks that trim line ends.
const END_CAP: char = '\u{200B}';

/// Hook for interpreting subprocess output lines. The bar itself ignores
/// lines; an injected handler turns recognized lines into bar mutations.
pub trait LineHandler: Send {
    /// Returns true when the line was recognized and applied.
    fn on_line(&mut self, bar: &ProgressBar, line: &str, from_stderr: bool) -> bool;
}

struct BarState {
    tracker: ProgressTracker,
    opts: RenderOptions,
    /// Colored line cached until the tracker goes dirty again.
    cached: String,
    /// Visible length of the cached line, excluding color codes.
    cached_len: usize,
    /// Visible length of the last line written to the terminal.
    prev_len: usize,
    /// Plain terminal-state line, set once by complete/fail.
    final_line: Option<String>,
}

/// Progress bar over a [`ProgressTracker`]. Mutation is serialized per
/// instance: the output reader and the driver may both hold a reference.
pub struct ProgressBar {
    state: Mutex<BarState>,
    handler: Mutex<Option<Box<dyn LineHandler>>>,
}

impl ProgressBar {
    pub fn new(opts: RenderOptions) -> Self {
        let tracker = ProgressTracker::with_min_interval(opts.min_update_interval);
        Self {
            state: Mutex::new(BarState {
                tracker,
                opts,
                cached: String::new(),
                cached_len: 0,
                prev_len: 0,
                final_line: None,
            }),
            handler: Mutex::new(None),
        }
    }

    /// Install the line handler consulted by [`Self::process_log`].
    pub fn set_handler(&self, handler: Box<dyn LineHandler>) {
        *self.lock_handler() = Some(handler);
    }

    /// Feed one subprocess output line to the installed handler. Returns
    /// false when no handler is installed or the line was not recognized.
    pub fn process_log(&self, line: &str, from_stderr: bool) -> bool {
        let mut slot = self.lock_handler();
        match slot.as_mut() {
            Some(handler) => handler.on_line(self, line, from_stderr),
            None => false,
        }
    }

    /// Record a new completed amount. Repaints when the model accepted the
    /// update and auto-print is on.
    pub fn update(&self, amount: f64) -> bool {
        let mut st = self.lock_state();
        let updated = st.tracker.update(amount);
        if updated && st.opts.auto_print {
            let painted = printable(&mut st);
            write_stdout(&painted);
        }
        updated
    }

    pub fn current(&self) -> f64 {
        self.lock_state().tracker.current()
    }

    pub fn total(&self) -> f64 {
        self.lock_state().tracker.total()
    }

    pub fn set_total(&self, total: f64) {
        self.lock_state().tracker.set_total(total);
    }

    pub fn initial_progress(&self) -> f64 {
        self.lock_state().tracker.initial_progress()
    }

    pub fn define_initial_progress(&self, amount: f64) -> bool {
        self.lock_state().tracker.define_initial_progress(amount)
    }

    pub fn define_initial_duration(&self, duration: Duration) -> bool {
        self.lock_state().tracker.define_initial_duration(duration)
    }

    pub fn is_completed(&self) -> bool {
        self.lock_state().tracker.is_completed()
    }

    pub fn is_failed(&self) -> bool {
        self.lock_state().tracker.is_failed()
    }

    pub fn is_terminal(&self) -> bool {
        self.lock_state().tracker.is_terminal()
    }

    /// The colored progress line, rebuilt only when the model changed since
    /// the last render.
    pub fn render(&self) -> String {
        let mut st = self.lock_state();
        rendered(&mut st)
    }

    /// The repaint form of [`Self::render`]: leading carriage return plus
    /// padding that erases any longer previous line.
    pub fn render_printable(&self) -> String {
        let mut st = self.lock_state();
        printable(&mut st)
    }

    /// Write the repaint line to stdout without a newline.
    pub fn print(&self) {
        let mut st = self.lock_state();
        let painted = printable(&mut st);
        write_stdout(&painted);
    }

    /// Mark the download complete and write the final line. No-op when
    /// already terminal, so the closing line is printed exactly once.
    pub fn complete(&self, print_duration: bool, extra: &str) {
        self.finish(false, print_duration, extra);
    }

    /// Mark the download failed and write the final line. No-op when already
    /// terminal.
    pub fn fail(&self, print_duration: bool, extra: &str) {
        self.finish(true, print_duration, extra);
    }

    /// The plain terminal-state line written by complete/fail, if any. The
    /// driver echoes this into the log.
    pub fn final_line(&self) -> Option<String> {
        self.lock_state().final_line.clone()
    }

    fn finish(&self, failed: bool, print_duration: bool, extra: &str) {
        let mut st = self.lock_state();
        if st.tracker.is_terminal() {
            return;
        }
        if failed {
            st.tracker.fail();
        } else {
            st.tracker.complete();
        }

        let mut tail = String::new();
        if print_duration {
            tail.push_str(&format!(
                " ({})",
                render::format_duration(st.tracker.total_duration())
            ));
        }
        if !extra.is_empty() {
            tail.push_str(" - ");
            tail.push_str(extra);
        }

        st.tracker.take_dirty();
        let plain = render::compose_line(&st.tracker, &st.opts);
        let color = render::active_color(&st.tracker, &st.opts);
        st.cached_len = plain.chars().count();
        st.cached = format!("{color}{plain}{ANSI_RESET}");
        let final_line = format!("{plain}{tail}");
        st.final_line = Some(final_line.clone());

        // Interactive mode overwrites the last repaint; log sinks get one
        // plain line per terminal state instead.
        let out = if st.opts.auto_print {
            let pad = st.prev_len.saturating_sub(final_line.chars().count());
            st.prev_len = 0;
            format!("\r{}{}{}{}\n", st.cached, tail, " ".repeat(pad), END_CAP)
        } else {
            format!("{final_line}\n")
        };
        write_stdout(&out);
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, BarState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_handler(&self) -> std::sync::MutexGuard<'_, Option<Box<dyn LineHandler>>> {
        self.handler.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn rendered(st: &mut BarState) -> String {
    if st.tracker.take_dirty() || st.cached.is_empty() {
        let plain = render::compose_line(&st.tracker, &st.opts);
        let color = render::active_color(&st.tracker, &st.opts);
        st.cached_len = plain.chars().count();
        st.cached = format!("{color}{plain}{ANSI_RESET}");
    }
    st.cached.clone()
}

fn printable(st: &mut BarState) -> String {
    let line = rendered(st);
    let pad = st.prev_len.saturating_sub(st.cached_len);
    st.prev_len = st.cached_len;
    format!("\r{}{}{}", line, " ".repeat(pad), END_CAP)
}

fn write_stdout(s: &str) {
    let mut out = io::stdout().lock();
    let _ = out.write_all(s.as_bytes());
    let _ = out.flush();
}
