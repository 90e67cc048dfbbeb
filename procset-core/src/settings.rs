use crate::error::{ProcSetError, Result};
use crate::stream::{InputStreamSettings, OutputStreamSettings};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A command line in nullable form, as it arrives from untyped sources.
pub type NullableCommand = Option<Vec<Option<String>>>;

/// Everything an external launcher needs to start and wire a process.
///
/// Construction and every later mutation go through the same checks, so a
/// `ProcessSettings` never holds an absent command or an absent stream slot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "RawProcessSettings")]
pub struct ProcessSettings {
    command: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    environment: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    directory: Option<PathBuf>,
    redirect_error_stream: bool,
    stdin_settings: InputStreamSettings,
    stdout_settings: OutputStreamSettings,
    stderr_settings: OutputStreamSettings,
}

/// Settings as read from a file, before validation
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawProcessSettings {
    command: NullableCommand,
    environment: Option<HashMap<String, String>>,
    directory: Option<PathBuf>,
    #[serde(default)]
    redirect_error_stream: bool,
    stdin_settings: Option<InputStreamSettings>,
    stdout_settings: Option<OutputStreamSettings>,
    stderr_settings: Option<OutputStreamSettings>,
}

impl TryFrom<RawProcessSettings> for ProcessSettings {
    type Error = ProcSetError;

    fn try_from(raw: RawProcessSettings) -> Result<Self> {
        ProcessSettings::with_options(
            raw.command,
            raw.redirect_error_stream,
            raw.directory,
            raw.environment,
            raw.stdin_settings,
            raw.stdout_settings,
            raw.stderr_settings,
        )
    }
}

fn check_command(command: NullableCommand) -> Result<Vec<String>> {
    let Some(command) = command else {
        debug!("Rejected absent command");
        return Err(ProcSetError::invalid_argument(
            "Command is not allowed to be null",
        ));
    };

    let checked: Option<Vec<String>> = command.into_iter().collect();
    checked.ok_or_else(|| {
        debug!("Rejected command with absent element");
        ProcSetError::invalid_argument("Command is not allowed to contain nulls")
    })
}

fn check_settings<T: Default>(settings: Option<T>) -> T {
    settings.unwrap_or_default()
}

impl ProcessSettings {
    /// Settings for `command` with no redirection, the inherited environment
    /// and working directory, and neutral stream settings.
    pub fn new<I, S>(command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.into_iter().map(Into::into).collect(),
            environment: None,
            directory: None,
            redirect_error_stream: false,
            stdin_settings: InputStreamSettings::default(),
            stdout_settings: OutputStreamSettings::default(),
            stderr_settings: OutputStreamSettings::default(),
        }
    }

    /// Like [`ProcessSettings::new`], for a command that may be absent or hold absent elements.
    pub fn try_new(command: NullableCommand) -> Result<Self> {
        Self::with_options(command, false, None, None, None, None, None)
    }

    /// Full form. Absent stream settings are replaced with neutral ones.
    pub fn with_options(
        command: NullableCommand,
        redirect_error_stream: bool,
        directory: Option<PathBuf>,
        environment: Option<HashMap<String, String>>,
        stdin_settings: Option<InputStreamSettings>,
        stdout_settings: Option<OutputStreamSettings>,
        stderr_settings: Option<OutputStreamSettings>,
    ) -> Result<Self> {
        Ok(Self {
            command: check_command(command)?,
            environment,
            directory,
            redirect_error_stream,
            stdin_settings: check_settings(stdin_settings),
            stdout_settings: check_settings(stdout_settings),
            stderr_settings: check_settings(stderr_settings),
        })
    }

    pub fn command(&self) -> &[String] {
        &self.command
    }

    pub fn set_command<I, S>(&mut self, command: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command = command.into_iter().map(Into::into).collect();
    }

    /// Replace the command. On error the stored command is left untouched.
    pub fn try_set_command(&mut self, command: NullableCommand) -> Result<()> {
        self.command = check_command(command)?;
        Ok(())
    }

    pub fn is_redirect_error_stream(&self) -> bool {
        self.redirect_error_stream
    }

    pub fn set_redirect_error_stream(&mut self, redirect_error_stream: bool) {
        self.redirect_error_stream = redirect_error_stream;
    }

    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    pub fn set_directory(&mut self, directory: Option<PathBuf>) {
        self.directory = directory;
    }

    /// `None` means the launcher inherits its own environment; `Some` replaces it.
    pub fn environment(&self) -> Option<&HashMap<String, String>> {
        self.environment.as_ref()
    }

    pub fn set_environment(&mut self, environment: Option<HashMap<String, String>>) {
        self.environment = environment;
    }

    pub fn stdin_settings(&self) -> &InputStreamSettings {
        &self.stdin_settings
    }

    pub fn stdin_settings_mut(&mut self) -> &mut InputStreamSettings {
        &mut self.stdin_settings
    }

    pub fn set_stdin_settings(&mut self, settings: Option<InputStreamSettings>) {
        self.stdin_settings = check_settings(settings);
    }

    pub fn stdout_settings(&self) -> &OutputStreamSettings {
        &self.stdout_settings
    }

    pub fn stdout_settings_mut(&mut self) -> &mut OutputStreamSettings {
        &mut self.stdout_settings
    }

    pub fn set_stdout_settings(&mut self, settings: Option<OutputStreamSettings>) {
        self.stdout_settings = check_settings(settings);
    }

    /// Advisory only while the error stream is redirected into stdout.
    pub fn stderr_settings(&self) -> &OutputStreamSettings {
        &self.stderr_settings
    }

    pub fn stderr_settings_mut(&mut self) -> &mut OutputStreamSettings {
        &mut self.stderr_settings
    }

    pub fn set_stderr_settings(&mut self, settings: Option<OutputStreamSettings>) {
        self.stderr_settings = check_settings(settings);
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let raw: RawProcessSettings = toml::from_str(content)?;
        Self::try_from(raw)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let raw: RawProcessSettings = serde_json::from_str(content)?;
        Self::try_from(raw)
    }

    /// Load settings from a `.json` or `.toml` file. Other extensions are read as TOML.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        debug!(path = %path.display(), "Loading process settings");

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_toml_str(&content),
        }
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| ProcSetError::InvalidConfiguration(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::StreamLocation;

    fn nullable(parts: &[Option<&str>]) -> NullableCommand {
        Some(parts.iter().map(|p| p.map(str::to_string)).collect())
    }

    #[test]
    fn test_new_keeps_command() {
        let commands: Vec<Vec<&str>> = vec![
            vec!["echo", "hi"],
            vec!["ls"],
            vec!["sh", "-c", "exit 3", ""],
            vec!["grep", "-r", "two words", "it's \"quoted\"", "$HOME", "a;b|c"],
            vec!["printf", "héllo wörld", "日本語", "emoji 🚀"],
            vec![],
        ];
        for command in commands {
            let settings = ProcessSettings::new(command.clone());
            assert_eq!(settings.command(), command.as_slice());

            let settings =
                ProcessSettings::try_new(Some(command.iter().map(|s| Some(s.to_string())).collect()))
                    .unwrap();
            assert_eq!(settings.command(), command.as_slice());
        }
    }

    #[test]
    fn test_null_command_rejected() {
        let err = ProcessSettings::try_new(None).unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(
            err.to_string(),
            "Invalid argument: Command is not allowed to be null"
        );
    }

    #[test]
    fn test_null_element_rejected() {
        let err = ProcessSettings::try_new(nullable(&[Some("run"), None, Some("x")])).unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(
            err.to_string(),
            "Invalid argument: Command is not allowed to contain nulls"
        );
    }

    #[test]
    fn test_command_only_defaults() {
        let settings = ProcessSettings::new(["true"]);
        assert!(!settings.is_redirect_error_stream());
        assert_eq!(settings.directory(), None);
        assert_eq!(settings.environment(), None);
        assert!(settings.stdin_settings().is_neutral());
        assert!(settings.stdout_settings().is_neutral());
        assert!(settings.stderr_settings().is_neutral());
    }

    #[test]
    fn test_full_form_scenario() {
        let settings = ProcessSettings::with_options(
            nullable(&[Some("echo"), Some("hi")]),
            true,
            None,
            None,
            None,
            None,
            None,
        )
        .unwrap();

        assert_eq!(settings.command(), ["echo", "hi"]);
        assert!(settings.is_redirect_error_stream());
        assert_eq!(settings.directory(), None);
        assert_eq!(settings.environment(), None);
        assert_eq!(settings.stdin_settings(), &InputStreamSettings::default());
        assert_eq!(settings.stdout_settings(), &OutputStreamSettings::default());
        assert_eq!(settings.stderr_settings(), &OutputStreamSettings::default());
    }

    #[test]
    fn test_full_form_keeps_supplied_values() {
        let mut env = HashMap::new();
        env.insert("LANG".to_string(), "C".to_string());
        let stdin = InputStreamSettings::with_buffer("data");
        let stdout = OutputStreamSettings::buffered(Some(64));
        let stderr = OutputStreamSettings::to_file("err.log", true);

        let settings = ProcessSettings::with_options(
            nullable(&[Some("cat")]),
            false,
            Some(PathBuf::from("/work")),
            Some(env.clone()),
            Some(stdin.clone()),
            Some(stdout.clone()),
            Some(stderr.clone()),
        )
        .unwrap();

        assert_eq!(settings.directory(), Some(Path::new("/work")));
        assert_eq!(settings.environment(), Some(&env));
        assert_eq!(settings.stdin_settings(), &stdin);
        assert_eq!(settings.stdout_settings(), &stdout);
        assert_eq!(settings.stderr_settings(), &stderr);
    }

    #[test]
    fn test_stream_setters_substitute_defaults() {
        let mut settings = ProcessSettings::new(["cat"]);

        let stdin = InputStreamSettings::with_file("in.txt");
        settings.set_stdin_settings(Some(stdin.clone()));
        assert_eq!(settings.stdin_settings(), &stdin);
        settings.set_stdin_settings(None);
        assert!(settings.stdin_settings().is_neutral());

        let stdout = OutputStreamSettings::buffered(None);
        settings.set_stdout_settings(Some(stdout.clone()));
        assert_eq!(settings.stdout_settings(), &stdout);
        settings.set_stdout_settings(None);
        assert!(settings.stdout_settings().is_neutral());

        let stderr = OutputStreamSettings::to_file("err.log", false);
        settings.set_stderr_settings(Some(stderr.clone()));
        assert_eq!(settings.stderr_settings(), &stderr);
        settings.set_stderr_settings(None);
        assert!(settings.stderr_settings().is_neutral());
    }

    #[test]
    fn test_stream_settings_mutable_in_place() {
        let mut settings = ProcessSettings::new(["cat"]);
        settings.stdout_settings_mut().print_standard(true);
        assert!(settings.stdout_settings().has(StreamLocation::Standard));
        assert!(settings.stderr_settings().is_neutral());
    }

    #[test]
    fn test_set_command_updates() {
        let mut settings = ProcessSettings::new(["echo", "one"]);
        settings.set_command(["echo", "two"]);
        assert_eq!(settings.command(), ["echo", "two"]);

        settings
            .try_set_command(nullable(&[Some("printf"), Some("%s")]))
            .unwrap();
        assert_eq!(settings.command(), ["printf", "%s"]);
    }

    #[test]
    fn test_failed_set_command_keeps_previous() {
        let mut settings = ProcessSettings::new(["echo", "hi"]);

        let err = settings.try_set_command(None).unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(settings.command(), ["echo", "hi"]);

        let err = settings
            .try_set_command(nullable(&[Some("run"), None]))
            .unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(settings.command(), ["echo", "hi"]);
    }

    #[test]
    fn test_plain_mutators() {
        let mut settings = ProcessSettings::new(["env"]);

        settings.set_redirect_error_stream(true);
        assert!(settings.is_redirect_error_stream());

        settings.set_directory(Some(PathBuf::from("/tmp")));
        assert_eq!(settings.directory(), Some(Path::new("/tmp")));
        settings.set_directory(None);
        assert_eq!(settings.directory(), None);

        settings.set_environment(Some(HashMap::new()));
        assert_eq!(settings.environment().map(|e| e.len()), Some(0));
        settings.set_environment(None);
        assert_eq!(settings.environment(), None);
    }

    #[test]
    fn test_from_toml() {
        let content = r#"
command = ["make", "-j4"]
directory = "/src/project"
redirect_error_stream = true

[environment]
PATH = "/usr/bin"

[stdout_settings]
locations = ["buffer", "standard"]
buffer_size = 4096
"#;
        let settings = ProcessSettings::from_toml_str(content).unwrap();
        assert_eq!(settings.command(), ["make", "-j4"]);
        assert_eq!(settings.directory(), Some(Path::new("/src/project")));
        assert!(settings.is_redirect_error_stream());
        assert_eq!(
            settings.environment().and_then(|e| e.get("PATH")).map(String::as_str),
            Some("/usr/bin")
        );
        assert!(settings.stdout_settings().has(StreamLocation::Buffer));
        assert!(settings.stdout_settings().has(StreamLocation::Standard));
        assert_eq!(settings.stdout_settings().buffer_size(), Some(4096));
        assert!(settings.stdin_settings().is_neutral());
        assert!(settings.stderr_settings().is_neutral());
    }

    #[test]
    fn test_from_toml_output_file_is_captured() {
        let content = "command = [\"cat\"]\n\n[stdout_settings]\noutput_file = \"out.log\"\n";
        let settings = ProcessSettings::from_toml_str(content).unwrap();
        assert!(settings.stdout_settings().has(StreamLocation::File));
        assert_eq!(
            settings.stdout_settings().disposition(),
            crate::stream::StdioDisposition::Piped
        );
    }

    #[test]
    fn test_from_toml_location_without_source() {
        let content = "command = [\"cat\"]\n\n[stdin_settings]\nlocations = [\"file\"]\n";
        let err = ProcessSettings::from_toml_str(content).unwrap_err();
        assert!(matches!(err, ProcSetError::ParseError(_)));
    }

    #[test]
    fn test_from_toml_unknown_key() {
        let content = "command = [\"make\"]\nredirect_errror_stream = true\n";
        let err = ProcessSettings::from_toml_str(content).unwrap_err();
        assert!(matches!(err, ProcSetError::ParseError(_)));
    }

    #[test]
    fn test_from_toml_missing_command() {
        let err = ProcessSettings::from_toml_str("redirect_error_stream = true").unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_from_json_null_element() {
        let err = ProcessSettings::from_json_str(r#"{"command": ["run", null, "x"]}"#).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_from_json_malformed() {
        let err = ProcessSettings::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, ProcSetError::ParseError(_)));
    }

    #[test]
    fn test_serde_deserialize_validates() {
        let result: std::result::Result<ProcessSettings, _> =
            serde_json::from_str(r#"{"command": null}"#);
        assert!(result.is_err());

        let settings: ProcessSettings =
            serde_json::from_str(r#"{"command": ["echo", "hi"]}"#).unwrap();
        assert_eq!(settings.command(), ["echo", "hi"]);
    }

    #[test]
    fn test_toml_output_reloads() {
        let mut settings = ProcessSettings::new(["tar", "-xf", "archive.tar"]);
        settings.set_directory(Some(PathBuf::from("/data")));
        settings.set_stderr_settings(Some(OutputStreamSettings::to_file("err.log", true)));

        let content = settings.to_toml_string().unwrap();
        let reloaded = ProcessSettings::from_toml_str(&content).unwrap();
        assert_eq!(reloaded, settings);
    }

    #[test]
    fn test_load_by_extension() {
        let dir = std::env::temp_dir().join(format!("procset-load-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let json_path = dir.join("settings.json");
        fs::write(&json_path, r#"{"command": ["date"]}"#).unwrap();
        assert_eq!(ProcessSettings::load(&json_path).unwrap().command(), ["date"]);

        let toml_path = dir.join("settings.toml");
        fs::write(&toml_path, "command = [\"uptime\"]\n").unwrap();
        assert_eq!(ProcessSettings::load(&toml_path).unwrap().command(), ["uptime"]);

        let missing = ProcessSettings::load(dir.join("missing.toml")).unwrap_err();
        assert!(matches!(missing, ProcSetError::IoError(_)));

        fs::remove_dir_all(&dir).unwrap();
    }
}
