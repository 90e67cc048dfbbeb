use crate::plan::{EnvironmentMode, LaunchPlan};
use procset_core::{ProcessSettings, Result};
use tracing::{debug, warn};

/// Build a `std::process::Command` from `settings` without spawning it.
///
/// The environment replaces the inherited one when present. Streams that
/// capture to buffers or files come back piped, and the caller is expected
/// to pump them.
pub fn prepare_command(settings: &ProcessSettings) -> Result<std::process::Command> {
    let plan = match LaunchPlan::from_settings(settings) {
        Ok(plan) => plan,
        Err(e) => {
            warn!(error = %e, "Refusing to prepare command");
            return Err(e);
        }
    };

    debug!(
        program = %plan.program,
        args = plan.args.len(),
        directory = ?plan.directory,
        inherit_env = matches!(plan.environment, EnvironmentMode::Inherit),
        redirect_error_stream = plan.redirect_error_stream,
        stdin = ?plan.stdin,
        stdout = ?plan.stdout,
        stderr = ?plan.stderr,
        "Prepared command"
    );

    Ok(plan.to_std_command())
}

/// Async flavour of [`prepare_command`] for launchers running on tokio.
pub fn prepare_tokio_command(settings: &ProcessSettings) -> Result<tokio::process::Command> {
    prepare_command(settings).map(tokio::process::Command::from)
}
