//! The trait a compiled plugin's user type implements, and the two
//! capability protocols dispatched over it (spec §4.F step 5).

use crate::context::PluginContext;
use crate::error::RuntimeError;
use packplug_wire::{BuildCommand, Diagnostic, PrebuildCommand, Target};

/// A command emitted by a build-tool capability: either kind may be mixed
/// freely in the returned list, in emission order (spec §3, §4.D "Ordering").
pub enum EmittedCommand {
    Build(BuildCommand),
    Prebuild(PrebuildCommand),
}

/// The capability (or capabilities) a plugin's user type carries (spec §9
/// "Dynamic dispatch to user plugin type": "the user type carries a
/// capability tag"). SwiftPM plugin types conform to exactly one of
/// `BuildToolPlugin`/`CommandPlugin`, but nothing stops a type from
/// implementing both protocols, so `Both` is a legitimate declaration, not
/// a loophole — `Plugin::capability` defaults to it so a plugin that
/// doesn't care to restrict itself keeps working.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Capability {
    BuildTool,
    UserCommand,
    Both,
}

impl Capability {
    fn accepts_build_tool(self) -> bool {
        matches!(self, Capability::BuildTool | Capability::Both)
    }

    fn accepts_user_command(self) -> bool {
        matches!(self, Capability::UserCommand | Capability::Both)
    }
}

/// Implemented by the user-defined plugin type linked into a compiled
/// plugin executable. A concrete plugin overrides whichever capability
/// method it supports and, if it wants the runtime to reject a mismatched
/// action before calling it at all, `capability()` as well.
pub trait Plugin {
    /// Declares which action(s) this plugin accepts (spec §9). The runtime
    /// checks the requested action against this tag before dispatching.
    fn capability(&self) -> Capability {
        Capability::Both
    }

    /// `CreateBuildToolCommands` capability.
    fn create_build_commands(
        &self,
        _ctx: &PluginContext,
        _target: &Target,
        _diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Vec<EmittedCommand>, RuntimeError> {
        Err(RuntimeError::MalformedInputJSON(
            "plugin does not implement the build-tool capability".into(),
        ))
    }

    /// `PerformUserCommand` capability. Commands are emitted by side effect
    /// via `emit`, not returned, matching the protocol's "returns unit"
    /// contract.
    fn perform_user_command(
        &self,
        _ctx: &PluginContext,
        _targets: &[&Target],
        _arguments: &[String],
        _diagnostics: &mut Vec<Diagnostic>,
        _emit: &mut dyn FnMut(packplug_wire::UserCommand),
    ) -> Result<(), RuntimeError> {
        Err(RuntimeError::MalformedInputJSON(
            "plugin does not implement the user-command capability".into(),
        ))
    }
}

/// Checks the declared capability against the requested action, returning
/// the mismatch as a `MalformedInputJSON` before the plugin's own method is
/// ever called (spec §9: "verifying the user type conforms; if not, emit a
/// malformed-input error").
pub(crate) fn check_capability(
    tag: Capability,
    action: &packplug_wire::Action,
) -> Result<(), RuntimeError> {
    let ok = match action {
        packplug_wire::Action::CreateBuildToolCommands { .. } => tag.accepts_build_tool(),
        packplug_wire::Action::PerformUserCommand { .. } => tag.accepts_user_command(),
    };
    if ok {
        Ok(())
    } else {
        Err(RuntimeError::MalformedInputJSON(format!(
            "plugin capability {tag:?} does not accept the requested action"
        )))
    }
}
