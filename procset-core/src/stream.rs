use crate::error::ProcSetError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Stdio;

/// Where one of a process's standard streams is sourced from or captured to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StreamLocation {
    /// An in-memory byte buffer
    Buffer,
    /// A file on disk
    File,
    /// The parent's own standard stream
    Standard,
}

/// How a launcher should wire a stream when it builds the native process
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StdioDisposition {
    Null,
    Inherit,
    Piped,
}

impl StdioDisposition {
    fn from_locations(locations: &BTreeSet<StreamLocation>) -> Self {
        if locations.is_empty() {
            StdioDisposition::Null
        } else if locations.len() == 1 && locations.contains(&StreamLocation::Standard) {
            StdioDisposition::Inherit
        } else {
            // Buffer and file targets need the launcher to pump bytes itself
            StdioDisposition::Piped
        }
    }

    pub fn into_stdio(self) -> Stdio {
        match self {
            StdioDisposition::Null => Stdio::null(),
            StdioDisposition::Inherit => Stdio::inherit(),
            StdioDisposition::Piped => Stdio::piped(),
        }
    }
}

/// Settings for feeding a process's standard input.
///
/// The neutral value feeds nothing. Locations combine: a launcher writes the
/// buffer, then the file, then copies its own stdin.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "RawInputStreamSettings")]
pub struct InputStreamSettings {
    locations: BTreeSet<StreamLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    input_buffer: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    input_file: Option<PathBuf>,
}

/// Input settings as read from a file. Sources named by value imply their location.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawInputStreamSettings {
    locations: BTreeSet<StreamLocation>,
    input_buffer: Option<Vec<u8>>,
    input_file: Option<PathBuf>,
}

impl TryFrom<RawInputStreamSettings> for InputStreamSettings {
    type Error = ProcSetError;

    fn try_from(raw: RawInputStreamSettings) -> Result<Self, Self::Error> {
        let mut settings = InputStreamSettings::new();
        settings.set_input_standard(raw.locations.contains(&StreamLocation::Standard));

        match raw.input_buffer {
            Some(bytes) => settings.set_input_buffer(bytes),
            None if raw.locations.contains(&StreamLocation::Buffer) => {
                return Err(ProcSetError::InvalidConfiguration(
                    "stdin location \"buffer\" needs an input_buffer".to_string(),
                ));
            }
            None => {}
        }

        match raw.input_file {
            Some(path) => settings.set_input_file(path),
            None if raw.locations.contains(&StreamLocation::File) => {
                return Err(ProcSetError::InvalidConfiguration(
                    "stdin location \"file\" needs an input_file".to_string(),
                ));
            }
            None => {}
        }

        Ok(settings)
    }
}

impl InputStreamSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_buffer(bytes: impl Into<Vec<u8>>) -> Self {
        let mut settings = Self::new();
        settings.set_input_buffer(bytes);
        settings
    }

    pub fn with_file<P: AsRef<Path>>(path: P) -> Self {
        let mut settings = Self::new();
        settings.set_input_file(path);
        settings
    }

    pub fn locations(&self) -> &BTreeSet<StreamLocation> {
        &self.locations
    }

    pub fn has(&self, location: StreamLocation) -> bool {
        self.locations.contains(&location)
    }

    pub fn input_buffer(&self) -> Option<&[u8]> {
        self.input_buffer.as_deref()
    }

    pub fn set_input_buffer(&mut self, bytes: impl Into<Vec<u8>>) {
        self.locations.insert(StreamLocation::Buffer);
        self.input_buffer = Some(bytes.into());
    }

    pub fn clear_input_buffer(&mut self) {
        self.locations.remove(&StreamLocation::Buffer);
        self.input_buffer = None;
    }

    pub fn input_file(&self) -> Option<&Path> {
        self.input_file.as_deref()
    }

    pub fn set_input_file<P: AsRef<Path>>(&mut self, path: P) {
        self.locations.insert(StreamLocation::File);
        self.input_file = Some(path.as_ref().to_path_buf());
    }

    pub fn clear_input_file(&mut self) {
        self.locations.remove(&StreamLocation::File);
        self.input_file = None;
    }

    pub fn is_input_standard(&self) -> bool {
        self.has(StreamLocation::Standard)
    }

    pub fn set_input_standard(&mut self, standard: bool) {
        if standard {
            self.locations.insert(StreamLocation::Standard);
        } else {
            self.locations.remove(&StreamLocation::Standard);
        }
    }

    pub fn is_neutral(&self) -> bool {
        *self == Self::default()
    }

    pub fn disposition(&self) -> StdioDisposition {
        StdioDisposition::from_locations(&self.locations)
    }
}

/// Settings for capturing a process's standard output or error.
///
/// The neutral value discards everything the process writes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "RawOutputStreamSettings")]
pub struct OutputStreamSettings {
    locations: BTreeSet<StreamLocation>,
    /// Capture limit in bytes, `None` captures without limit.
    #[serde(skip_serializing_if = "Option::is_none")]
    buffer_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_file: Option<PathBuf>,
    append_file: bool,
}

/// Output settings as read from a file. A size limit or file path implies its location.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawOutputStreamSettings {
    locations: BTreeSet<StreamLocation>,
    buffer_size: Option<usize>,
    output_file: Option<PathBuf>,
    append_file: bool,
}

impl TryFrom<RawOutputStreamSettings> for OutputStreamSettings {
    type Error = ProcSetError;

    fn try_from(raw: RawOutputStreamSettings) -> Result<Self, Self::Error> {
        let mut settings = OutputStreamSettings::new();
        settings.print_standard(raw.locations.contains(&StreamLocation::Standard));

        if raw.buffer_size.is_some() || raw.locations.contains(&StreamLocation::Buffer) {
            settings.set_buffer_size(raw.buffer_size);
        }

        match raw.output_file {
            Some(path) => settings.set_output_file(path, raw.append_file),
            None if raw.locations.contains(&StreamLocation::File) => {
                return Err(ProcSetError::InvalidConfiguration(
                    "output location \"file\" needs an output_file".to_string(),
                ));
            }
            None if raw.append_file => {
                return Err(ProcSetError::InvalidConfiguration(
                    "append_file is set without an output_file".to_string(),
                ));
            }
            None => {}
        }

        Ok(settings)
    }
}

impl OutputStreamSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture into memory, keeping at most `size` bytes when a limit is given.
    pub fn buffered(size: Option<usize>) -> Self {
        let mut settings = Self::new();
        settings.set_buffer_size(size);
        settings
    }

    pub fn to_file<P: AsRef<Path>>(path: P, append: bool) -> Self {
        let mut settings = Self::new();
        settings.set_output_file(path, append);
        settings
    }

    pub fn locations(&self) -> &BTreeSet<StreamLocation> {
        &self.locations
    }

    pub fn has(&self, location: StreamLocation) -> bool {
        self.locations.contains(&location)
    }

    pub fn buffer_size(&self) -> Option<usize> {
        self.buffer_size
    }

    pub fn set_buffer_size(&mut self, size: Option<usize>) {
        self.locations.insert(StreamLocation::Buffer);
        self.buffer_size = size;
    }

    pub fn clear_buffer(&mut self) {
        self.locations.remove(&StreamLocation::Buffer);
        self.buffer_size = None;
    }

    pub fn output_file(&self) -> Option<&Path> {
        self.output_file.as_deref()
    }

    pub fn is_append_file(&self) -> bool {
        self.append_file
    }

    pub fn set_output_file<P: AsRef<Path>>(&mut self, path: P, append: bool) {
        self.locations.insert(StreamLocation::File);
        self.output_file = Some(path.as_ref().to_path_buf());
        self.append_file = append;
    }

    pub fn clear_output_file(&mut self) {
        self.locations.remove(&StreamLocation::File);
        self.output_file = None;
        self.append_file = false;
    }

    pub fn is_print_standard(&self) -> bool {
        self.has(StreamLocation::Standard)
    }

    pub fn print_standard(&mut self, standard: bool) {
        if standard {
            self.locations.insert(StreamLocation::Standard);
        } else {
            self.locations.remove(&StreamLocation::Standard);
        }
    }

    pub fn is_neutral(&self) -> bool {
        *self == Self::default()
    }

    pub fn disposition(&self) -> StdioDisposition {
        StdioDisposition::from_locations(&self.locations)
    }
}
