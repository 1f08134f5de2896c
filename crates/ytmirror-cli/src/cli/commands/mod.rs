//! CLI command handlers. Each command is in its own file for clarity.

mod check;
mod download;
mod status;

pub use check::run_check;
pub use download::{run_download, DownloadArgs};
pub use status::run_status;
