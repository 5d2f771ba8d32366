//! Text-generation service boundary.
//!
//! The plan engine never talks to a model directly. It hands a prompt to a
//! [`NarrativeService`] and shows whatever text comes back verbatim. Any
//! failure surfaces as [`PlanError::NarrativeUnavailable`] so callers can
//! still present the numeric plan.
//!
//! [`CommandNarrator`] is the bundled implementation: it runs a configured
//! command exec-style (no shell), writes the prompt to the child's stdin and
//! reads the narrative from stdout.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::PlanError;

/// Upper bound on bytes read from each of stdout / stderr (1 MiB).
const MAX_OUTPUT_BYTES: u64 = 1024 * 1024;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Longest stderr excerpt carried in an error message.
const STDERR_EXCERPT_CHARS: usize = 400;

/// Anything that turns a prompt into narrative text.
pub trait NarrativeService {
    fn generate(&self, prompt: &str) -> Result<String, PlanError>;
}

fn unavailable(reason: impl Into<String>) -> PlanError {
    PlanError::NarrativeUnavailable {
        reason: reason.into(),
    }
}

/// Runs an external command per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandNarrator {
    program: PathBuf,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandNarrator {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>, timeout: Option<Duration>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    /// Build from a command line such as `"llm -m gemini-pro"`: first token is
    /// the program (resolved on `PATH`), the rest are arguments.
    pub fn from_command_line(command: &str, timeout: Option<Duration>) -> Result<Self, PlanError> {
        let mut tokens = command.split_ascii_whitespace();
        let program = tokens
            .next()
            .ok_or_else(|| unavailable("narrative command is empty"))?;
        let program = resolve_command(program)?;
        Ok(Self::new(
            program,
            tokens.map(str::to_owned).collect(),
            timeout,
        ))
    }
}

impl NarrativeService for CommandNarrator {
    fn generate(&self, prompt: &str) -> Result<String, PlanError> {
        let started = Instant::now();
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| unavailable(format!("failed to start {}: {e}", self.program.display())))?;

        // Every pipe is serviced on its own thread so neither a chatty child
        // nor one that never reads stdin can stall us outside the timeout.
        let child_stdout = child
            .stdout
            .take()
            .ok_or_else(|| unavailable("child stdout not captured"))?;
        let child_stderr = child
            .stderr
            .take()
            .ok_or_else(|| unavailable("child stderr not captured"))?;
        let stdout_handle = std::thread::spawn(move || read_bounded(child_stdout));
        let stderr_handle = std::thread::spawn(move || read_bounded(child_stderr));

        let mut child_stdin = child
            .stdin
            .take()
            .ok_or_else(|| unavailable("child stdin not captured"))?;
        let request = prompt.as_bytes().to_vec();
        let stdin_handle = std::thread::spawn(move || {
            // The child may exit without reading everything; its exit status
            // decides the outcome. Dropping the handle closes the pipe.
            if let Err(e) = child_stdin.write_all(&request) {
                debug!(err = %e, "narrative command closed stdin early");
            }
        });

        let (timed_out, exit_code) = wait_with_timeout(&mut child, self.timeout)
            .map_err(|e| unavailable(format!("failed to wait for narrative command: {e}")))?;

        stdin_handle
            .join()
            .map_err(|_| unavailable("prompt writer thread panicked"))?;
        let stdout = join_reader(stdout_handle)?;
        let stderr = join_reader(stderr_handle)?;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if timed_out {
            warn!(elapsed_ms, "narrative command timed out");
            let secs = self.timeout.map(|t| t.as_secs()).unwrap_or_default();
            return Err(unavailable(format!("timed out after {secs}s")));
        }
        if exit_code != Some(0) {
            warn!(?exit_code, elapsed_ms, "narrative command failed");
            let excerpt: String = stderr.trim().chars().take(STDERR_EXCERPT_CHARS).collect();
            return Err(unavailable(format!("command exited with code {exit_code:?}: {excerpt}")));
        }

        let text = stdout.trim();
        if text.is_empty() {
            return Err(unavailable("command produced no output"));
        }
        debug!(elapsed_ms, text_len = text.len(), "narrative received");
        Ok(text.to_owned())
    }
}

fn join_reader(
    handle: std::thread::JoinHandle<std::io::Result<String>>,
) -> Result<String, PlanError> {
    handle
        .join()
        .map_err(|_| unavailable("output reader thread panicked"))?
        .map_err(|e| unavailable(format!("failed to read command output: {e}")))
}

/// Wait for the child, killing it once `timeout` elapses.
fn wait_with_timeout(
    child: &mut Child,
    timeout: Option<Duration>,
) -> std::io::Result<(bool, Option<i32>)> {
    let Some(duration) = timeout else {
        let status = child.wait()?;
        return Ok((false, status.code()));
    };
    let deadline = Instant::now() + duration;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok((false, status.code()));
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Ok((true, None));
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

fn read_bounded(reader: impl Read) -> std::io::Result<String> {
    let mut buf = Vec::new();
    reader.take(MAX_OUTPUT_BYTES).read_to_end(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Resolve `cmd` to an executable path. Names containing a path separator
/// are checked directly; bare names are searched on `PATH`.
pub fn resolve_command(cmd: &str) -> Result<PathBuf, PlanError> {
    resolve_command_with(cmd, std::env::var_os("PATH"))
}

fn resolve_command_with(
    cmd: &str,
    path_var: Option<std::ffi::OsString>,
) -> Result<PathBuf, PlanError> {
    if cmd.contains(std::path::MAIN_SEPARATOR) || cmd.contains('/') {
        let p = PathBuf::from(cmd);
        if is_executable(&p) {
            return Ok(p);
        }
    } else if let Some(paths) = path_var {
        for dir in std::env::split_paths(&paths) {
            let candidate = dir.join(cmd);
            if is_executable(&candidate) {
                return Ok(candidate);
            }
            #[cfg(windows)]
            {
                let with_exe = dir.join(format!("{cmd}.exe"));
                if is_executable(&with_exe) {
                    return Ok(with_exe);
                }
            }
        }
    }
    Err(unavailable(format!("narrative command '{cmd}' not found")))
}

fn is_executable(path: &Path) -> bool {
    let Ok(meta) = path.metadata() else {
        return false;
    };
    if !meta.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        meta.permissions().mode() & 0o111 != 0
    }

    #[cfg(not(unix))]
    {
        true
    }
}
