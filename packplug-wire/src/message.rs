//! Host/plugin message protocol (spec §4.D, §6).
//!
//! Both message kinds are UTF-8 JSON with a `kind` discriminator. Unknown
//! discriminators are a protocol violation: serde rejects them during
//! decoding (an unrecognized `kind` value is a decode error, not silently
//! ignored), which [`crate::framing::read_message`] turns into
//! [`crate::error::WireError::MalformedMessage`].

use crate::command::{BuildCommand, Diagnostic, PrebuildCommand, UserCommand};
use crate::graph::Input;
use serde::{Deserialize, Serialize};

/// Messages sent from the host (build system) to the plugin subprocess.
#[derive(Clone, Serialize, Deserialize, Debug)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostMessage {
    /// The single request that opens every session (spec §4.D "session loop").
    PerformAction { input: Input },
    /// Answers a plugin-initiated request the host supports.
    SymbolGraphResponse { symbol_graph_json: String },
    /// Answers a plugin-initiated request the host does not support, or
    /// that failed on the host side.
    ErrorResponse { error: String },
}

/// Messages sent from the plugin subprocess back to the host.
#[derive(Clone, Serialize, Deserialize, Debug)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PluginMessage {
    EmitDiagnostic { diagnostic: Diagnostic },
    DefineBuildCommand { command: BuildCommand },
    DefinePrebuildCommand { command: PrebuildCommand },
    DefineUserCommand { command: UserCommand },
    /// Optional plugin-initiated request for host-computed information (e.g.
    /// a symbol graph for a target). The plugin blocks on read until the
    /// matching [`HostMessage::SymbolGraphResponse`] or
    /// [`HostMessage::ErrorResponse`] arrives.
    SymbolGraphRequest { target_name: String },
    /// Terminal message of a session. `success` reflects whether the
    /// plugin's own logic completed without an internal error; it is
    /// independent of whether the plugin emitted error-severity
    /// diagnostics (spec §7 propagation policy).
    ActionComplete { success: bool },
}
