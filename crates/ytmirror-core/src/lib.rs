pub mod config;
pub mod logging;

pub mod downloader;
pub mod ledger;
pub mod progress;
pub mod stats;
pub mod video;
