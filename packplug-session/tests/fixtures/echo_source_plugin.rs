// Standalone plugin source compiled on the fly by the test via
// `packplug_compiler::compile`, exercising the full compile-then-invoke
// pipeline: a real `rustc` invocation linked against the workspace's own
// `packplug-runtime` crate, the same way a real plugin author would write
// one.

use packplug_runtime::{EmittedCommand, Plugin, PluginContext, RuntimeError};
use packplug_wire::{CommandConfig, Diagnostic, Severity, Target, UserCommand};
use std::collections::BTreeMap;

struct EchoSourcePlugin;

impl Plugin for EchoSourcePlugin {
    fn create_build_commands(
        &self,
        _ctx: &PluginContext,
        _target: &Target,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Vec<EmittedCommand>, RuntimeError> {
        diagnostics.push(Diagnostic {
            severity: Severity::Remark,
            message: "echo-source-plugin: build".into(),
            file: None,
            line: None,
        });
        Ok(vec![EmittedCommand::Build(packplug_wire::BuildCommand {
            config: CommandConfig {
                display_name: "Echo".into(),
                executable: "/bin/echo".into(),
                arguments: vec!["build".into()],
                environment: BTreeMap::new(),
                working_directory: None,
            },
            inputs: vec![],
            outputs: vec![],
        })])
    }

    fn perform_user_command(
        &self,
        _ctx: &PluginContext,
        _targets: &[&Target],
        _arguments: &[String],
        diagnostics: &mut Vec<Diagnostic>,
        emit: &mut dyn FnMut(UserCommand),
    ) -> Result<(), RuntimeError> {
        diagnostics.push(Diagnostic {
            severity: Severity::Remark,
            message: "echo-source-plugin: user command".into(),
            file: None,
            line: None,
        });
        emit(UserCommand {
            config: CommandConfig {
                display_name: "Echo".into(),
                executable: "/bin/echo".into(),
                arguments: vec!["hi".into()],
                environment: BTreeMap::new(),
                working_directory: None,
            },
        });
        Ok(())
    }
}

fn main() {
    packplug_runtime::run_plugin(EchoSourcePlugin);
}
