//! Subprocess output streaming: merged stdout/stderr, ordered line delivery.

use std::io::Read;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("failed to launch {tool}: {source}")]
    Launch {
        tool: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed waiting for {tool}: {source}")]
    Wait {
        tool: String,
        #[source]
        source: std::io::Error,
    },
}

/// How the subprocess ended.
#[derive(Debug)]
pub struct StreamOutcome {
    pub exit: ExitStatus,
    /// True when the deadline expired and the child was killed.
    pub timed_out: bool,
}

const READ_BUF_BYTES: usize = 4096;
const RECV_TICK: Duration = Duration::from_millis(50);

/// Run `cmd`, delivering every output line to `on_line` with a flag marking
/// stderr lines. Lines are delivered in arrival order with no buffering
/// beyond boundary detection; the destination/merge sequencing downstream
/// depends on that. Blocks until the child exits; when a deadline is given
/// and expires, the child is killed and reaped.
pub fn stream_lines<F>(
    mut cmd: Command,
    deadline: Option<Duration>,
    mut on_line: F,
) -> Result<StreamOutcome, StreamError>
where
    F: FnMut(&str, bool),
{
    let tool = cmd.get_program().to_string_lossy().into_owned();
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let mut child = cmd.spawn().map_err(|source| StreamError::Launch {
        tool: tool.clone(),
        source,
    })?;

    let (tx, rx) = mpsc::channel::<(String, bool)>();
    let mut readers = Vec::new();
    if let Some(stdout) = child.stdout.take() {
        readers.push(spawn_line_reader(stdout, false, tx.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(spawn_line_reader(stderr, true, tx.clone()));
    }
    drop(tx);

    let started = Instant::now();
    let mut timed_out = false;
    loop {
        match rx.recv_timeout(RECV_TICK) {
            Ok((line, from_stderr)) => on_line(&line, from_stderr),
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
        if !timed_out {
            if let Some(limit) = deadline {
                if started.elapsed() >= limit {
                    timed_out = true;
                    // Killing closes the pipes; the readers drain and exit.
                    let _ = child.kill();
                }
            }
        }
    }
    for handle in readers {
        let _ = handle.join();
    }
    let exit = child.wait().map_err(|source| StreamError::Wait { tool, source })?;
    Ok(StreamOutcome { exit, timed_out })
}

fn spawn_line_reader<R>(
    mut reader: R,
    from_stderr: bool,
    tx: mpsc::Sender<(String, bool)>,
) -> thread::JoinHandle<()>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buf = [0u8; READ_BUF_BYTES];
        let mut pending: Vec<u8> = Vec::new();
        loop {
            match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    for &byte in &buf[..n] {
                        // The tool repaints progress in place, so carriage
                        // returns are line boundaries too.
                        if byte == b'\n' || byte == b'\r' {
                            flush_line(&mut pending, from_stderr, &tx);
                        } else {
                            pending.push(byte);
                        }
                    }
                }
                Err(_) => break,
            }
        }
        flush_line(&mut pending, from_stderr, &tx);
    })
}

fn flush_line(pending: &mut Vec<u8>, from_stderr: bool, tx: &mpsc::Sender<(String, bool)>) {
    if pending.is_empty() {
        return;
    }
    let line = String::from_utf8_lossy(pending).into_owned();
    pending.clear();
    let _ = tx.send((line, from_stderr));
}
