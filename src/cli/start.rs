use crate::cli::{
    actions::Action,
    commands::{self, logging},
    dispatch,
    telemetry::Telemetry,
};
use anyhow::Result;

/// Parse the command line, install logging, and resolve the action to run.
///
/// The returned [`Telemetry`] must outlive the action so its spans are
/// flushed by [`Telemetry::shutdown`].
///
/// # Errors
///
/// Returns an error if logging cannot be installed or the arguments do not
/// form a valid action.
pub fn start() -> Result<(Action, Telemetry)> {
    let matches = commands::new().get_matches();

    let level = logging::level(matches.get_count(logging::ARG_VERBOSITY));
    let telemetry = Telemetry::init(level)?;

    let action = dispatch::handler(&matches)?;
    tracing::debug!(commit = crate::GIT_COMMIT_HASH, ?action, "dispatching");

    Ok((action, telemetry))
}
