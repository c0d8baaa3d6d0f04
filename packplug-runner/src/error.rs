use packplug_wire::WireError;
use std::process::ExitStatus;

/// Failure modes of one plugin invocation (spec §4.D "Termination", §7).
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("could not launch plugin executable `{executable}`")]
    SubprocessDidNotStart {
        executable: String,
        #[source]
        source: std::io::Error,
    },

    /// Non-zero exit. Carries the full command line and captured stderr so
    /// the caller can surface a useful error (spec §4.D).
    #[error("plugin process exited with {status}: {command_line}")]
    SubprocessFailed {
        command_line: String,
        status: ExitStatus,
        stderr: String,
    },

    /// Process exited 0 but no `ActionComplete` was observed before EOF.
    #[error("plugin exited without sending a terminal message: {command_line}")]
    MissingPluginOutput { command_line: String, stderr: String },

    /// Host-initiated cancellation; distinct from [`RunError::SubprocessFailed`]
    /// because any output collected so far is discarded rather than reported
    /// (spec §5 "Cancellation").
    #[error("invocation was cancelled: {command_line}")]
    Cancelled { command_line: String },

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error("failed to create invocation work directory `{path}`")]
    WorkDirCreation {
        path: camino::Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}
