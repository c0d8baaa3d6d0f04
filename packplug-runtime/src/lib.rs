//! Linked into every compiled plugin executable; drives the host message
//! loop on behalf of the user-defined plugin type (spec §4.F "Plugin-side
//! runtime").

mod context;
mod error;
mod plugin;
mod stdio;

pub use context::PluginContext;
pub use error::RuntimeError;
pub use plugin::{Capability, EmittedCommand, Plugin};

use packplug_wire::framing::{read_message, write_message};
use packplug_wire::{Action, HostMessage, PluginMessage};
use std::io::{Read, Write};

/// Runs the host message loop to completion and exits the process (spec
/// §4.F step 6): code 0 on clean EOF with no internal error, 1 otherwise.
/// Never returns.
///
/// A descriptor-duplication failure is exactly the kind of internal error
/// step 6 singles out: one line to stderr, exit 1 — matched here instead of
/// panicking, the same as the decode-failure branch in [`drive`].
pub fn run_plugin(plugin: impl Plugin) -> ! {
    let code = match stdio::take_stdio() {
        Ok((host_in, host_out)) => drive(plugin, host_in, host_out),
        Err(e) => {
            eprintln!("internal error: {e}");
            1
        }
    };
    std::process::exit(code);
}

fn drive(plugin: impl Plugin, mut host_in: impl Read, mut host_out: impl Write) -> i32 {
    loop {
        let message = match read_message::<HostMessage, _>(&mut host_in) {
            Ok(Some(m)) => m,
            Ok(None) => return 0,
            Err(e) => {
                eprintln!("internal error decoding host message: {e}");
                return 1;
            }
        };

        let input = match message {
            HostMessage::PerformAction { input } => input,
            // The runtime never issues requests a response could answer;
            // receiving one out of turn is a protocol violation.
            HostMessage::SymbolGraphResponse { .. } | HostMessage::ErrorResponse { .. } => {
                eprintln!("internal error: unexpected response message with no pending request");
                return 1;
            }
        };

        let ctx = PluginContext::new(&input);
        let mut diagnostics = Vec::new();
        let mut build_commands = Vec::new();
        let mut prebuild_commands = Vec::new();
        let mut user_commands = Vec::new();

        let outcome = plugin::check_capability(plugin.capability(), &input.action).and_then(|()| {
            match &input.action {
                Action::CreateBuildToolCommands { target } => {
                    let target_obj = ctx.target(*target);
                    plugin
                        .create_build_commands(&ctx, target_obj, &mut diagnostics)
                        .map(|commands| {
                            for c in commands {
                                match c {
                                    EmittedCommand::Build(cmd) => build_commands.push(cmd),
                                    EmittedCommand::Prebuild(cmd) => prebuild_commands.push(cmd),
                                }
                            }
                        })
                }
                Action::PerformUserCommand { targets, arguments } => {
                    let target_objs: Vec<_> = targets.iter().map(|id| ctx.target(*id)).collect();
                    let mut emit = |cmd| user_commands.push(cmd);
                    plugin.perform_user_command(
                        &ctx,
                        &target_objs,
                        arguments,
                        &mut diagnostics,
                        &mut emit,
                    )
                }
            }
        });

        // `ToolNotFound`/`MalformedInputJSON` are the named plugin-side
        // members of the error taxonomy (spec §7), distinct from
        // plugin-authored `Diagnostic`s: they abort the invocation (stderr
        // line, exit 1) rather than riding in-band, exactly like S3's
        // tool-not-found scenario ("plugin-side ToolNotFound, exit 1, host
        // reports SubprocessFailed").
        if let Err(err) = outcome {
            eprintln!("plugin error: {err}");
            return 1;
        }

        for command in build_commands {
            if write_message(&mut host_out, &PluginMessage::DefineBuildCommand { command }).is_err()
            {
                return 1;
            }
        }
        for command in prebuild_commands {
            if write_message(&mut host_out, &PluginMessage::DefinePrebuildCommand { command })
                .is_err()
            {
                return 1;
            }
        }
        for command in user_commands {
            if write_message(&mut host_out, &PluginMessage::DefineUserCommand { command }).is_err()
            {
                return 1;
            }
        }
        for diagnostic in diagnostics {
            if write_message(&mut host_out, &PluginMessage::EmitDiagnostic { diagnostic }).is_err()
            {
                return 1;
            }
        }
        if write_message(&mut host_out, &PluginMessage::ActionComplete { success: true }).is_err() {
            return 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use packplug_wire::{CommandConfig, UserCommand};
    use std::collections::BTreeMap;
    use std::io::Cursor;

    struct EchoPlugin;

    impl Plugin for EchoPlugin {
        fn create_build_commands(
            &self,
            _ctx: &PluginContext,
            target: &packplug_wire::Target,
            _diagnostics: &mut Vec<packplug_wire::Diagnostic>,
        ) -> Result<Vec<EmittedCommand>, RuntimeError> {
            Ok(vec![EmittedCommand::Build(packplug_wire::BuildCommand {
                config: CommandConfig {
                    display_name: format!("echo {}", target.name),
                    executable: "/bin/echo".into(),
                    arguments: vec![target.name.clone()],
                    environment: BTreeMap::new(),
                    working_directory: None,
                },
                inputs: vec![],
                outputs: vec![],
            })])
        }
    }

    fn sample_input() -> packplug_wire::Input {
        packplug_wire::Input {
            paths: vec![packplug_wire::Path { base: None, subpath: "/ws".into() }],
            targets: vec![packplug_wire::Target {
                name: "Exe".into(),
                directory: packplug_wire::PathId(0),
                deps: vec![],
                info: packplug_wire::TargetInfo::SourceModule {
                    module_name: "Exe".into(),
                    public_headers_dir: None,
                    files: vec![],
                },
            }],
            products: vec![],
            packages: vec![packplug_wire::Package {
                name: "app".into(),
                directory: packplug_wire::PathId(0),
                dependencies: vec![],
                products: vec![],
                targets: vec![packplug_wire::TargetId(0)],
            }],
            root_package: packplug_wire::PackageId(0),
            plugin_work_dir: packplug_wire::PathId(0),
            built_products_dir: packplug_wire::PathId(0),
            tool_names_to_paths: BTreeMap::new(),
            action: Action::CreateBuildToolCommands { target: packplug_wire::TargetId(0) },
        }
    }

    #[test]
    fn build_tool_capability_round_trip() {
        let mut input_bytes = Vec::new();
        write_message(&mut input_bytes, &HostMessage::PerformAction { input: sample_input() })
            .unwrap();

        let mut output = Vec::new();
        let code = drive(EchoPlugin, Cursor::new(input_bytes), &mut output);
        assert_eq!(code, 0);

        let mut cursor = Cursor::new(output);
        let first: PluginMessage = read_message(&mut cursor).unwrap().unwrap();
        assert!(matches!(first, PluginMessage::DefineBuildCommand { .. }));
        let second: PluginMessage = read_message(&mut cursor).unwrap().unwrap();
        assert!(matches!(second, PluginMessage::ActionComplete { success: true }));
    }

    #[test]
    fn unconformant_plugin_aborts_with_malformed_input() {
        struct NoOpPlugin;
        impl Plugin for NoOpPlugin {}

        let mut input_bytes = Vec::new();
        write_message(&mut input_bytes, &HostMessage::PerformAction { input: sample_input() })
            .unwrap();

        let mut output = Vec::new();
        let code = drive(NoOpPlugin, Cursor::new(input_bytes), &mut output);
        assert_eq!(code, 1);
        assert!(output.is_empty(), "no message is written before the abort");
    }

    #[test]
    fn capability_tag_mismatch_aborts_with_malformed_input() {
        struct BuildOnlyPlugin;
        impl Plugin for BuildOnlyPlugin {
            fn capability(&self) -> Capability {
                Capability::BuildTool
            }
        }

        let mut input = sample_input();
        input.action = Action::PerformUserCommand { targets: vec![], arguments: vec![] };
        let mut input_bytes = Vec::new();
        write_message(&mut input_bytes, &HostMessage::PerformAction { input }).unwrap();

        let mut output = Vec::new();
        let code = drive(BuildOnlyPlugin, Cursor::new(input_bytes), &mut output);
        assert_eq!(code, 1);
        assert!(output.is_empty());
    }

    #[test]
    fn tool_not_found_aborts_the_invocation() {
        struct NeedsDocTool;
        impl Plugin for NeedsDocTool {
            fn create_build_commands(
                &self,
                ctx: &PluginContext,
                _target: &packplug_wire::Target,
                _diagnostics: &mut Vec<packplug_wire::Diagnostic>,
            ) -> Result<Vec<EmittedCommand>, RuntimeError> {
                ctx.tool("doc")?;
                unreachable!("doc is never in the tool map in this test");
            }
        }

        let mut input_bytes = Vec::new();
        write_message(&mut input_bytes, &HostMessage::PerformAction { input: sample_input() })
            .unwrap();

        let mut output = Vec::new();
        let code = drive(NeedsDocTool, Cursor::new(input_bytes), &mut output);
        assert_eq!(code, 1);
        assert!(output.is_empty());
    }

    #[test]
    fn clean_eof_exits_zero() {
        let code = drive(EchoPlugin, Cursor::new(Vec::new()), &mut Vec::new());
        assert_eq!(code, 0);
    }

    #[allow(dead_code)]
    fn unused_user_command_ctor() -> UserCommand {
        UserCommand {
            config: CommandConfig {
                display_name: String::new(),
                executable: String::new(),
                arguments: vec![],
                environment: BTreeMap::new(),
                working_directory: None,
            },
        }
    }
}
