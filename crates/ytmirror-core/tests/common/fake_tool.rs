//! Fake download tool for integration tests.
//!
//! Installs a small shell script that replays canned yt-dlp-style output and
//! records every invocation's arguments, so driver behavior can be asserted
//! without the real tool or the network.

use std::fs;
use std::path::{Path, PathBuf};

pub struct FakeTool {
    pub executable: PathBuf,
    calls_file: PathBuf,
}

/// Install a fake tool under `dir`. `script_body` is a /bin/sh fragment run
/// after the invocation is recorded; `"$*"` holds the full argument line.
#[cfg(unix)]
pub fn install(dir: &Path, script_body: &str) -> FakeTool {
    use std::os::unix::fs::PermissionsExt;

    let calls_file = dir.join("calls.log");
    let executable = dir.join("fake-yt-dlp");
    let script = format!(
        "#!/bin/sh\necho \"$@\" >> '{calls}'\n{body}\n",
        calls = calls_file.display(),
        body = script_body
    );
    fs::write(&executable, script).expect("write fake tool");
    let mut perms = fs::metadata(&executable)
        .expect("stat fake tool")
        .permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&executable, perms).expect("chmod fake tool");
    FakeTool {
        executable,
        calls_file,
    }
}

impl FakeTool {
    /// One recorded argument line per invocation, oldest first.
    pub fn calls(&self) -> Vec<String> {
        match fs::read_to_string(&self.calls_file) {
            Ok(text) => text.lines().map(str::to_string).collect(),
            Err(_) => Vec::new(),
        }
    }
}
