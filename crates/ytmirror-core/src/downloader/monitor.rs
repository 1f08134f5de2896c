//! Stateful output classifier: applies parsed line events to the bar.

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use super::patterns::{match_line, LineEvent};
use super::response::ResponseDraft;
use crate::progress::{LineHandler, ProgressBar};

/// Interprets downloader output for one attempt.
///
/// The tool emits a separate 0-100% stream per format track (video, then
/// audio) before merging. The amount completed when a new part starts is
/// carried forward so the displayed progress never jumps back to zero and
/// rolling-speed math survives the part boundary.
pub struct OutputMonitor {
    audio_only: bool,
    /// Armed by a destination line; the next progress line starts a part.
    new_part: bool,
    /// Amount completed by earlier parts, in KB.
    carried_kb: f64,
    draft: Arc<Mutex<ResponseDraft>>,
}

impl OutputMonitor {
    pub fn new(audio_only: bool, draft: Arc<Mutex<ResponseDraft>>) -> Self {
        Self {
            audio_only,
            new_part: false,
            carried_kb: 0.0,
            draft,
        }
    }

    fn draft(&self) -> MutexGuard<'_, ResponseDraft> {
        self.draft.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl LineHandler for OutputMonitor {
    fn on_line(&mut self, bar: &ProgressBar, line: &str, _from_stderr: bool) -> bool {
        let event = match match_line(line) {
            Some(event) => event,
            None => return false,
        };
        match event {
            LineEvent::ResumedAt { kb } => {
                // Only honored while initial progress is unset.
                if bar.initial_progress() != 0.0 {
                    return false;
                }
                bar.define_initial_progress(kb);
                tracing::debug!("resuming download at {kb:.0} KB");
                true
            }
            LineEvent::Progress { percent, size_kb } => {
                if self.new_part {
                    self.carried_kb = bar.current();
                    self.new_part = false;
                    tracing::debug!(
                        "new part of {size_kb:.0} KB, carrying {:.0} KB",
                        self.carried_kb
                    );
                }
                bar.set_total(self.carried_kb + size_kb);
                bar.update(percent / 100.0 * size_kb + self.carried_kb);
                true
            }
            LineEvent::AlreadyDownloaded { path } => {
                let kb = file_size_kb(&path);
                bar.set_total(kb);
                bar.define_initial_progress(kb);
                bar.update(kb);
                let mut draft = self.draft();
                draft.output_path = Some(PathBuf::from(path));
                draft.message = Some("Already Downloaded".to_string());
                true
            }
            LineEvent::Destination { path } => {
                self.draft().output_path = Some(PathBuf::from(path));
                self.new_part = true;
                true
            }
            LineEvent::MergingFormats { path } => {
                let note = if self.audio_only {
                    "Merging Formats and Extracting Audio"
                } else {
                    "Merging Formats"
                };
                {
                    let mut draft = self.draft();
                    draft.output_path = Some(PathBuf::from(path));
                    // The merge supersedes any pending skip note.
                    draft.message = None;
                }
                if !bar.is_terminal() {
                    bar.complete(true, note);
                }
                true
            }
            LineEvent::ExtractingAudio { path } => {
                self.draft().output_path = Some(PathBuf::from(path));
                if !bar.is_terminal() {
                    bar.complete(true, "Extracting Audio...");
                }
                true
            }
        }
    }
}

/// Size of an existing file in KB; unreadable files read as zero rather than
/// failing the run.
fn file_size_kb(path: &str) -> f64 {
    match fs::metadata(path) {
        Ok(meta) => meta.len() as f64 / 1024.0,
        Err(err) => {
            tracing::debug!("could not stat {path}: {err}");
            0.0
        }
    }
}
