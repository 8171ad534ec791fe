//! Git subprocess execution.
//!
//! Every higher layer funnels through [`execute`]: spawn `git` in a working
//! directory, capture both streams, enforce a timeout, and kill the child
//! when it expires so nothing is left orphaned. [`execute_stream`] is the
//! incremental variant for outputs too large to buffer.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;
use std::time::Duration;

use wait_timeout::ChildExt;

use crate::error::ExecError;

/// Default per-invocation timeout
pub const GIT_TIMEOUT_MS: u64 = 30_000;

/// Captured result of one git invocation.
///
/// A non-zero exit is not an error by itself; callers that expect success
/// go through [`CommandOutput::checked`].
#[derive(Debug)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    /// Convert a non-zero exit into [`ExecError::CommandFailed`]
    pub fn checked(self) -> Result<CommandOutput, ExecError> {
        if self.exit_code == 0 {
            Ok(self)
        } else {
            Err(ExecError::CommandFailed {
                exit_code: self.exit_code,
                stderr: self.stderr,
            })
        }
    }

    pub fn stdout_utf8(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }
}

fn reader_thread<R: Read + Send + 'static>(mut stream: R) -> JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = stream.read_to_end(&mut buf);
        buf
    })
}

/// Run `git <args>` in `cwd`, capturing both streams fully.
///
/// Both pipes are drained on background threads before waiting, so a diff
/// larger than the pipe buffer cannot deadlock the child.
pub fn execute(args: &[&str], cwd: &Path, timeout_ms: u64) -> Result<CommandOutput, ExecError> {
    let mut child = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let stdout_handle = child
        .stdout
        .take()
        .map(reader_thread)
        .expect("stdout was piped");
    let stderr_handle = child
        .stderr
        .take()
        .map(reader_thread)
        .expect("stderr was piped");

    let status = match child.wait_timeout(Duration::from_millis(timeout_ms))? {
        Some(status) => status,
        None => {
            // timed out: kill and reap, the reader threads finish once the
            // pipes close
            let _ = child.kill();
            let _ = child.wait();
            return Err(ExecError::Timeout { timeout_ms });
        }
    };

    let stdout = stdout_handle.join().unwrap_or_default();
    let stderr = stderr_handle.join().unwrap_or_default();

    Ok(CommandOutput {
        stdout,
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
        exit_code: status.code().unwrap_or(-1),
    })
}

/// Convenience wrapper for commands whose non-zero exit is always an error
pub fn execute_checked(
    args: &[&str],
    cwd: &Path,
    timeout_ms: u64,
) -> Result<CommandOutput, ExecError> {
    execute(args, cwd, timeout_ms)?.checked()
}

/// Incremental stdout of a running git command.
///
/// Iterating yields raw byte chunks as the child produces them. Dropping
/// the stream kills and reaps the child, so a consumer that stops early
/// never leaves it blocked on a full pipe.
pub struct CommandStream {
    child: Child,
    stdout: ChildStdout,
    finished: bool,
}

impl Iterator for CommandStream {
    type Item = std::io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let mut buf = vec![0u8; 64 * 1024];
        match self.stdout.read(&mut buf) {
            Ok(0) => {
                self.finished = true;
                let _ = self.child.wait();
                None
            }
            Ok(n) => {
                buf.truncate(n);
                Some(Ok(buf))
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

impl Drop for CommandStream {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
    }
}

/// Spawn `git <args>` in `cwd` and stream its stdout without buffering.
///
/// stderr is discarded; streaming callers learn about failure from the
/// truncated output and should fall back to [`execute`] for diagnostics.
pub fn execute_stream(args: &[&str], cwd: &Path) -> Result<CommandStream, ExecError> {
    let mut child = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()?;

    let stdout = child.stdout.take().expect("stdout was piped");
    Ok(CommandStream {
        child,
        stdout,
        finished: false,
    })
}

/// Whether `path` is inside a git repository
pub fn is_repository(path: &Path) -> bool {
    execute(&["rev-parse", "--git-dir"], path, GIT_TIMEOUT_MS)
        .map(|out| out.exit_code == 0)
        .unwrap_or(false)
}

/// Resolve the top-level directory of the repository containing `path`
pub fn repo_root(path: &Path) -> Result<PathBuf, ExecError> {
    let out = execute_checked(&["rev-parse", "--show-toplevel"], path, GIT_TIMEOUT_MS)?;
    Ok(PathBuf::from(out.stdout_utf8().trim()))
}
