//! Download progress: rate-tracked model and renderable terminal bar.
//!
//! The tracker is a pure numeric state machine over `(timestamp, amount)`
//! samples; the bar wraps it with rendering, in-place repaint, and the
//! log-line hook the downloader's output classifier plugs into.

mod bar;
mod render;
mod tracker;

pub use bar::{LineHandler, ProgressBar};
pub use render::{format_duration, format_eta, Palette, RenderOptions};
pub use tracker::{ProgressTracker, DEFAULT_UPDATE_INTERVAL};
