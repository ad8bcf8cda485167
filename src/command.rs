use std::ffi::OsString;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use crate::error::{DubError, Result};

/// Abstract external tool invocation
#[derive(Debug, Clone)]
pub struct ToolCommand {
    pub binary_path: String,
    pub args: Vec<OsString>,
    pub envs: Vec<(String, String)>,
    pub description: String,
}

impl ToolCommand {
    /// Create a new command for the given binary
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            envs: Vec::new(),
            description: description.into(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<OsString>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    /// Add a path argument
    pub fn path_arg<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().as_os_str().to_os_string())
    }

    /// Add a flag followed by its value
    pub fn flag<S: Into<OsString>>(self, flag: &str, value: S) -> Self {
        self.arg(flag).arg(value)
    }

    /// Set an environment variable for the child process
    pub fn env<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Name used in errors: the file name of the binary
    pub fn tool_name(&self) -> String {
        Path::new(&self.binary_path)
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.binary_path.clone())
    }

    /// Run to completion and return stdout.
    /// A binary that cannot be started is a `Spawn` error; a non-zero exit is a `Process` error.
    pub async fn execute(&self) -> Result<String> {
        debug!("Executing command: {} {:?}", self.binary_path, self.args);
        debug!("Description: {}", self.description);

        let mut cmd = Command::new(&self.binary_path);
        cmd.args(&self.args).kill_on_drop(true);
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }

        let output = cmd.output().await.map_err(|e| DubError::Spawn {
            tool: self.tool_name(),
            source: e,
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DubError::Process {
                tool: self.tool_name(),
                status: output.status.to_string(),
                stderr: last_lines(&stderr, 20),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Keep the tail of noisy tool output; ffmpeg prints its banner first and the error last
fn last_lines(text: &str, count: usize) -> String {
    let lines: Vec<&str> = text.trim_end().lines().collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].join("\n")
}
