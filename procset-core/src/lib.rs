pub mod error;
pub mod settings;
pub mod stream;

pub use error::{ProcSetError, Result};
pub use settings::{NullableCommand, ProcessSettings};
pub use stream::{InputStreamSettings, OutputStreamSettings, StdioDisposition, StreamLocation};
