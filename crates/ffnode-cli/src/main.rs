//! CLI entrypoint for the ffnode media tool.
//!
//! The binary delegates to [`ffnode_cli::run`], which loads configuration,
//! reads the input items, runs the requested operation, and prints the
//! resulting records as JSON.

use std::io::{self, StderrLock, StdinLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdin: StdinLock<'_> = io::stdin().lock();
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    ffnode_cli::run(std::env::args_os(), &mut stdin, &mut stdout, &mut stderr)
}
