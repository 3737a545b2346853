//! Running external tools and judging whether they succeeded.
//!
//! A tool is launched from one rendered command line through `sh -c`. Its exit
//! code, stdout and stderr are captured in full before any success rule is
//! applied, so a failure can always report what the tool printed.

use falco_types::{InvocationFailure, ParseError, ToolInvocationError};
use log::info;
use shell_escape::escape;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::process::Command;

/// A command line under construction.
///
/// The program prefix and user-supplied extra arguments are inserted verbatim;
/// every other argument is shell-escaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    parts: Vec<String>,
}

impl CommandLine {
    /// Start from a program prefix such as `/mnt/app/STAR/STAR` or
    /// `java8 -jar picard.jar`.
    pub fn new(program: &str) -> Self {
        CommandLine {
            parts: vec![program.trim().to_string()],
        }
    }

    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.parts
            .push(escape(Cow::Borrowed(arg.as_ref())).into_owned());
        self
    }

    pub fn path(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy())
    }

    /// A `KEY=<path>` argument.
    pub fn assign(self, key: &str, path: &Path) -> Self {
        self.arg(format!("{key}={}", path.display()))
    }

    /// Append `extra` unmodified. The caller owns its quoting.
    pub fn raw(mut self, extra: &str) -> Self {
        let extra = extra.trim();
        if !extra.is_empty() {
            self.parts.push(extra.to_string());
        }
        self
    }

    pub fn render(&self) -> String {
        self.parts.join(" ")
    }
}

/// The captured result of one tool run.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    pub tool: &'static str,
    pub command: String,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolInvocation {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    fn fail(self, reason: InvocationFailure) -> ToolInvocationError {
        ToolInvocationError {
            tool: self.tool,
            reason,
            command: self.command,
            exit_code: self.exit_code,
            stdout: self.stdout,
            stderr: self.stderr,
        }
    }
}

/// Run `command` to completion, capturing all of its output.
///
/// Only a failure to start the shell is an error here; judging the outcome is
/// left to [`SuccessRule::check`].
pub fn invoke(tool: &'static str, command: &CommandLine) -> Result<ToolInvocation, ToolInvocationError> {
    let rendered = command.render();
    info!("Command: {rendered}");
    match Command::new("sh").arg("-c").arg(&rendered).output() {
        Ok(output) => Ok(ToolInvocation {
            tool,
            command: rendered,
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }),
        Err(e) => Err(ToolInvocationError {
            tool,
            reason: InvocationFailure::SpawnFailed(e.to_string()),
            command: rendered,
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
        }),
    }
}

/// Text in stderr that marks a failed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorMarker {
    Literal(&'static str),
    /// Matched against the lower-cased stderr; must itself be lower case.
    CaseInsensitive(&'static str),
}

impl ErrorMarker {
    fn found_in(self, stderr: &str) -> bool {
        match self {
            ErrorMarker::Literal(marker) => stderr.contains(marker),
            ErrorMarker::CaseInsensitive(marker) => stderr.to_lowercase().contains(marker),
        }
    }

    fn text(self) -> &'static str {
        match self {
            ErrorMarker::Literal(marker) | ErrorMarker::CaseInsensitive(marker) => marker,
        }
    }
}

/// What a tool run must satisfy to count as successful. Checks are applied
/// in field order and the first violation is reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuccessRule {
    pub check_exit: bool,
    pub empty_stderr: bool,
    pub error_markers: &'static [ErrorMarker],
    pub required_output: Option<PathBuf>,
}

impl SuccessRule {
    pub fn check(&self, invocation: ToolInvocation) -> Result<ToolInvocation, ToolInvocationError> {
        if self.check_exit && !invocation.success() {
            let code = invocation.exit_code;
            return Err(invocation.fail(InvocationFailure::NonZeroExit(code)));
        }
        if self.empty_stderr && !invocation.stderr.trim().is_empty() {
            return Err(invocation.fail(InvocationFailure::UnexpectedStderr));
        }
        let stderr = invocation.stderr.trim();
        if let Some(marker) = self.error_markers.iter().find(|m| m.found_in(stderr)) {
            return Err(invocation.fail(InvocationFailure::ErrorMarker(marker.text().to_string())));
        }
        if let Some(ref path) = self.required_output {
            if !path.is_file() {
                return Err(invocation.fail(InvocationFailure::MissingOutput(path.clone())));
            }
        }
        Ok(invocation)
    }
}

/// Run `command` and hold it to `rule`.
pub fn run_checked(
    tool: &'static str,
    command: &CommandLine,
    rule: &SuccessRule,
) -> Result<ToolInvocation, ToolInvocationError> {
    rule.check(invoke(tool, command)?)
}

/// Read a tool's output file for parsing.
pub fn read_output(tool: &'static str, path: &Path) -> Result<String, ParseError> {
    std::fs::read_to_string(path).map_err(|e| ParseError::Unreadable {
        tool,
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
