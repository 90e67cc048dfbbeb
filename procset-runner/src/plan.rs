use procset_core::{ProcSetError, ProcessSettings, Result, StdioDisposition};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// How the launched process gets its environment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "mode", content = "variables", rename_all = "lowercase")]
pub enum EnvironmentMode {
    /// Keep the launcher's own environment
    Inherit,
    /// Start from an empty environment holding only these variables
    Replace(HashMap<String, String>),
}

/// What a launcher will do with a [`ProcessSettings`], resolved ahead of time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LaunchPlan {
    pub program: String,
    pub args: Vec<String>,
    pub directory: Option<PathBuf>,
    pub environment: EnvironmentMode,
    pub redirect_error_stream: bool,
    pub stdin: StdioDisposition,
    pub stdout: StdioDisposition,
    pub stderr: StdioDisposition,
}

impl LaunchPlan {
    pub fn from_settings(settings: &ProcessSettings) -> Result<Self> {
        let (program, args) = settings.command().split_first().ok_or_else(|| {
            ProcSetError::invalid_argument("Command must name a program to run")
        })?;

        let environment = match settings.environment() {
            Some(vars) => EnvironmentMode::Replace(vars.clone()),
            None => EnvironmentMode::Inherit,
        };

        // The launcher reads stderr itself to merge it into stdout
        let stderr = if settings.is_redirect_error_stream() {
            StdioDisposition::Piped
        } else {
            settings.stderr_settings().disposition()
        };

        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            directory: settings.directory().map(|d| d.to_path_buf()),
            environment,
            redirect_error_stream: settings.is_redirect_error_stream(),
            stdin: settings.stdin_settings().disposition(),
            stdout: settings.stdout_settings().disposition(),
            stderr,
        })
    }

    pub fn to_std_command(&self) -> std::process::Command {
        let mut command = std::process::Command::new(&self.program);
        command.args(&self.args);

        if let Some(dir) = &self.directory {
            command.current_dir(dir);
        }

        if let EnvironmentMode::Replace(vars) = &self.environment {
            command.env_clear().envs(vars);
        }

        command
            .stdin(self.stdin.into_stdio())
            .stdout(self.stdout.into_stdio())
            .stderr(self.stderr.into_stdio());

        command
    }
}
