//! Plugin-side error taxonomy (spec §7). Both variants abort the invocation
//! the same way a decode failure does: one line to stderr, process exit 1
//! (spec §4.F step 6) — there is no in-band way to report them, since by the
//! time a plugin can observe either condition it no longer has a coherent
//! result to send back.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum RuntimeError {
    /// A plugin author asked for a tool name not present in the action's
    /// tool map (spec §7).
    #[error("tool not found: {0}")]
    ToolNotFound(String),
    /// The host's input didn't decode into something this plugin can act
    /// on: either wire decode failed, or the requested action doesn't match
    /// the plugin's declared capability (spec §7, §9 "Dynamic dispatch to
    /// user plugin type").
    #[error("malformed input: {0}")]
    MalformedInputJSON(String),
}

/// Internal errors that abort the process before any message can be
/// exchanged (spec §4.F step 6: "write a single line to stderr and exit
/// with code 1").
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to duplicate a standard descriptor: {0}")]
    DescriptorDuplication(#[source] std::io::Error),
}
