pub mod plan;
pub mod prepare;

pub use plan::{EnvironmentMode, LaunchPlan};
pub use prepare::{prepare_command, prepare_tokio_command};
