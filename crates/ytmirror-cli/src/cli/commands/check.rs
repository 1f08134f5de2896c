//! `ytmirror check` – verify the downloader tool and show key paths.

use anyhow::Result;
use ytmirror_core::config::{self, MirrorConfig};
use ytmirror_core::downloader::{probe_tool, Downloader};
use ytmirror_core::logging;

pub fn run_check(cfg: &MirrorConfig) -> Result<()> {
    let downloader = Downloader::from_config(cfg);
    let exe = downloader.executable();
    match probe_tool(exe) {
        Some(version) => println!("{}: {}", exe.display(), version),
        None => println!(
            "{}: not runnable (install it or set `downloader_path`)",
            exe.display()
        ),
    }

    match (&cfg.cookie_browser, cfg.disable_cookie_retry) {
        (Some(browser), false) => {
            if downloader.kind().supports_cookies_from_browser() {
                println!("cookie retry: enabled ({browser})");
            } else {
                println!(
                    "cookie retry: unavailable ({} cannot read browser cookies)",
                    downloader.kind().executable()
                );
            }
        }
        (Some(_), true) => println!("cookie retry: disabled by config"),
        (None, _) => println!("cookie retry: off (no cookie_browser configured)"),
    }

    println!("config: {}", config::config_path()?.display());
    println!("log:    {}", logging::log_path()?.display());
    Ok(())
}
