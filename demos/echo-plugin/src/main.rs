//! A minimal plugin used as an end-to-end fixture in `packplug-runner` and
//! `packplug-session` integration tests: it implements both capabilities by
//! echoing its inputs back as commands and diagnostics, so tests can assert
//! on the full host/plugin round trip without a real build tool.

use packplug_runtime::{EmittedCommand, Plugin, PluginContext, RuntimeError};
use packplug_wire::{CommandConfig, Diagnostic, Severity, Target, UserCommand};
use std::collections::BTreeMap;

struct EchoPlugin;

impl Plugin for EchoPlugin {
    fn create_build_commands(
        &self,
        ctx: &PluginContext,
        target: &Target,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Vec<EmittedCommand>, RuntimeError> {
        // Test-only triggers so integration tests can exercise scenarios a
        // well-behaved plugin never hits on its own: a target named
        // `NeedsDocTool` always requests a tool this fixture never vends,
        // and `HangForever` simulates a plugin stuck mid-action so tests
        // can drive cancellation against a real subprocess.
        if target.name == "NeedsDocTool" {
            ctx.tool("doc")?;
        }
        if target.name == "HangForever" {
            std::thread::sleep(std::time::Duration::from_secs(60));
        }

        diagnostics.push(Diagnostic {
            severity: Severity::Remark,
            message: format!("echo-plugin: building {}", target.name),
            file: None,
            line: None,
        });
        Ok(vec![EmittedCommand::Build(packplug_wire::BuildCommand {
            config: CommandConfig {
                display_name: format!("Echo {}", target.name),
                executable: "/bin/echo".into(),
                arguments: vec![target.name.clone()],
                environment: BTreeMap::new(),
                working_directory: Some(ctx.work_dir.to_string()),
            },
            inputs: vec![],
            outputs: vec![],
        })])
    }

    fn perform_user_command(
        &self,
        _ctx: &PluginContext,
        targets: &[&Target],
        arguments: &[String],
        diagnostics: &mut Vec<Diagnostic>,
        emit: &mut dyn FnMut(UserCommand),
    ) -> Result<(), RuntimeError> {
        for target in targets {
            diagnostics.push(Diagnostic {
                severity: Severity::Remark,
                message: format!("echo-plugin: user command on {}", target.name),
                file: None,
                line: None,
            });
        }
        emit(UserCommand {
            config: CommandConfig {
                display_name: "Echo arguments".into(),
                executable: "/bin/echo".into(),
                arguments: arguments.to_vec(),
                environment: BTreeMap::new(),
                working_directory: None,
            },
        });
        Ok(())
    }
}

fn main() {
    packplug_runtime::run_plugin(EchoPlugin);
}
