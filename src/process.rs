//! Synchronous child processes with captured output.

use anyhow::{Context, Result};
use std::fmt;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// A program plus arguments, printable exactly as it would be typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(|c: char| c.is_whitespace() || c == '"' || c == '\'') {
                write!(f, " \"{}\"", arg.replace('"', "\\\""))?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// What a finished child process left behind.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Run to completion and capture both streams.
/// Only a failure to spawn is an `Err`; a non-zero exit is reported in the output.
pub fn run(command: &CommandLine) -> Result<ProcessOutput> {
    let started = Instant::now();
    let output = Command::new(&command.program)
        .args(&command.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .with_context(|| format!("Cannot execute {}", command.program))?;

    Ok(ProcessOutput {
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        elapsed: started.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_quotes_spaces() {
        let cmd = CommandLine::new("rsync")
            .arg("-vrlptgz")
            .arg("/home/u/My Music")
            .arg("u@h:/srv/");
        assert_eq!(cmd.to_string(), "rsync -vrlptgz \"/home/u/My Music\" u@h:/srv/");
    }

    #[test]
    #[cfg(unix)]
    fn test_run_reports_exit_code() -> Result<()> {
        let ok = run(&CommandLine::new("sh").args(["-c", "echo hi"]))?;
        assert!(ok.success());
        assert_eq!(ok.stdout.trim(), "hi");

        let failed = run(&CommandLine::new("sh").args(["-c", "echo oops >&2; exit 3"]))?;
        assert_eq!(failed.code, Some(3));
        assert_eq!(failed.stderr.trim(), "oops");
        Ok(())
    }

    #[test]
    fn test_run_missing_program_is_err() {
        assert!(run(&CommandLine::new("rbsync-definitely-not-installed")).is_err());
    }
}
