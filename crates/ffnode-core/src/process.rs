//! Shell-based execution of rendered tool command lines.
//!
//! [`ShellExecutor`] implements [`ToolExecutor`] by handing the full command
//! line (`<program> <arguments>`) to a shell, so quoting written into a
//! template behaves exactly as it would at a terminal. The call blocks until
//! the process exits. Standard input is closed so the tool can never stall on
//! an interactive prompt; for pass-through runs the child's stdout is routed
//! to this process's stderr, which keeps stdout free for the JSON records,
//! and its stderr is inherited.

use std::fmt;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::ToolFailure;
use crate::runner::ToolExecutor;

/// Tracing target for tool process operations.
const PROCESS_TARGET: &str = "ffnode_core::process";

/// Interval between exit checks while a timeout is armed.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A rendered command line plus the staged paths it refers to.
///
/// # Example
///
/// ```
/// use ffnode_core::process::ToolCommand;
///
/// let command = ToolCommand::new("ffmpeg", "-i \"/tmp/a.mov\" \"/tmp/b.mp4\"");
/// assert_eq!(command.to_string(), "ffmpeg -i \"/tmp/a.mov\" \"/tmp/b.mp4\"");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: String,
    arguments: String,
    output: Option<PathBuf>,
    staged: Vec<PathBuf>,
}

impl ToolCommand {
    /// Creates a command for `program` with pre-rendered `arguments`.
    #[must_use]
    pub fn new(program: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            arguments: arguments.into(),
            output: None,
            staged: Vec::new(),
        }
    }

    /// Records the output path the command is expected to write.
    #[must_use]
    pub fn with_output(mut self, output: PathBuf) -> Self {
        self.output = Some(output);
        self
    }

    /// Records the staged input and manifest paths the command reads.
    #[must_use]
    pub fn with_staged(mut self, staged: Vec<PathBuf>) -> Self {
        self.staged = staged;
        self
    }

    /// Program name.
    #[must_use]
    pub const fn program(&self) -> &str {
        self.program.as_str()
    }

    /// Rendered arguments.
    #[must_use]
    pub const fn arguments(&self) -> &str {
        self.arguments.as_str()
    }

    /// Output path, when the command produces a file.
    #[must_use]
    pub fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }

    /// Staged paths read by the command.
    #[must_use]
    pub fn staged(&self) -> &[PathBuf] {
        &self.staged
    }

    /// Full command line as handed to the shell.
    #[must_use]
    pub fn command_line(&self) -> String {
        if self.arguments.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.arguments)
        }
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// Runs tool commands through a shell.
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    shell: String,
    timeout: Option<Duration>,
}

impl ShellExecutor {
    /// Creates an executor that runs command lines through `shell`.
    #[must_use]
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
            timeout: None,
        }
    }

    /// Kills invocations that run longer than `timeout`.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Configured timeout, if any.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn shell_command(&self, line: &str) -> Command {
        let mut command = Command::new(&self.shell);
        command.arg(shell_flag(&self.shell)).arg(line);
        command.stdin(Stdio::null());
        command
    }

    fn spawn(&self, mut command: Command, line: &str) -> Result<Child, ToolFailure> {
        debug!(
            target: PROCESS_TARGET,
            shell = %self.shell,
            command = line,
            "spawning tool process"
        );
        command
            .spawn()
            .map_err(|err| ToolFailure::Spawn(Arc::new(err)))
    }
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self::new(if cfg!(windows) { "cmd" } else { "sh" })
    }
}

impl ToolExecutor for ShellExecutor {
    fn run(&self, command: &ToolCommand) -> Result<(), ToolFailure> {
        let line = command.command_line();
        let mut shell = self.shell_command(&line);
        shell.stdout(Stdio::from(io::stderr()));
        shell.stderr(Stdio::inherit());

        let mut child = self.spawn(shell, &line)?;
        let status = wait_for_exit(&mut child, self.timeout)?;
        check_status(status)
    }

    fn capture(&self, command: &ToolCommand) -> Result<String, ToolFailure> {
        let line = command.command_line();
        let mut shell = self.shell_command(&line);
        shell.stdout(Stdio::piped());
        shell.stderr(Stdio::piped());

        let mut child = self.spawn(shell, &line)?;
        let stdout = child.stdout.take().map(collect_stream);
        let stderr = child.stderr.take().map(collect_stream);

        let status = wait_for_exit(&mut child, self.timeout);
        let captured = join_stream(stdout);
        let diagnostics = join_stream(stderr);
        if !diagnostics.trim().is_empty() {
            debug!(
                target: PROCESS_TARGET,
                stderr = %diagnostics.trim(),
                "tool stderr output"
            );
        }

        check_status(status?)?;
        Ok(captured)
    }
}

/// `-c` for POSIX shells, `/C` for `cmd`.
fn shell_flag(shell: &str) -> &'static str {
    let name = Path::new(shell)
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    if name == "cmd" { "/C" } else { "-c" }
}

/// Reads a child stream to completion on a helper thread so a full pipe
/// never blocks the child.
fn collect_stream(mut stream: impl Read + Send + 'static) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        if let Err(err) = stream.read_to_end(&mut buffer) {
            debug!(target: PROCESS_TARGET, error = %err, "failed to read tool stream");
        }
        buffer
    })
}

fn join_stream(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|reader| reader.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

/// Waits for the child to exit, enforcing the timeout when one is set.
fn wait_for_exit(child: &mut Child, timeout: Option<Duration>) -> Result<ExitStatus, ToolFailure> {
    let Some(limit) = timeout else {
        return child.wait().map_err(|err| ToolFailure::Wait(Arc::new(err)));
    };

    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {
                if start.elapsed() > limit {
                    warn!(
                        target: PROCESS_TARGET,
                        timeout_secs = limit.as_secs(),
                        "tool timed out, killing process"
                    );
                    drop(child.kill());
                    drop(child.wait());
                    return Err(ToolFailure::TimedOut(limit.as_secs()));
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(err) => return Err(ToolFailure::Wait(Arc::new(err))),
        }
    }
}

fn check_status(status: ExitStatus) -> Result<(), ToolFailure> {
    debug!(target: PROCESS_TARGET, ?status, "tool process exited");
    if status.success() {
        return Ok(());
    }
    Err(status
        .code()
        .map_or(ToolFailure::Signalled, ToolFailure::ExitStatus))
}
