//! Ties components B-D together into the full per-target, per-plugin
//! invocation pipeline (spec §4.E "Session orchestrator").

use crate::error::SessionError;
use crate::tools;
use camino::{Utf8Path, Utf8PathBuf};
use packplug_compiler::PluginApi;
use packplug_graph::{
    ActionRequest, PackageNode, PluginCapability, TargetDependency, TargetKind, TargetNode,
    TargetRole,
};
use packplug_wire::{BuildCommand, CommandConfig, Diagnostic, PrebuildCommand, UserCommand};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

/// One plugin's output against one target, with paths already promoted to
/// absolute (spec §4.E step 5) and diagnostics kept separate from the
/// host's own top-level sink (spec §4.E step 6).
#[derive(Debug, Default)]
pub struct PluginInvocationResult {
    pub plugin_name: String,
    pub build_commands: Vec<BuildCommand>,
    pub prebuild_commands: Vec<PrebuildCommand>,
    pub user_commands: Vec<UserCommand>,
    pub diagnostics: Vec<Diagnostic>,
    pub stderr_text: String,
}

pub struct Session {
    /// Root of the per-plugin compilation caches (spec §5: single-writer,
    /// shared across invocations of the same plugin).
    pub cache_root: Utf8PathBuf,
    /// Root of the per-(plugin,target) work directories (spec §4.E step 1).
    pub output_dir: Utf8PathBuf,
    pub built_products_dir: Utf8PathBuf,
    pub tools_version: String,
    /// The crate plugin sources link against (spec §4.F): resolved once and
    /// reused for every plugin this session compiles.
    pub plugin_api: PluginApi,
}

impl Session {
    pub fn new(
        cache_root: Utf8PathBuf,
        output_dir: Utf8PathBuf,
        built_products_dir: Utf8PathBuf,
        tools_version: impl Into<String>,
        plugin_api: PluginApi,
    ) -> Self {
        Self {
            cache_root,
            output_dir,
            built_products_dir,
            tools_version: tools_version.into(),
            plugin_api,
        }
    }

    /// Runs every plugin attached (directly or via a product dependency)
    /// to every target reachable from `root_package`, in name-sorted target
    /// order (spec §4.E).
    pub fn run_all(
        &self,
        root_package: &PackageNode,
    ) -> Result<BTreeMap<String, Vec<PluginInvocationResult>>, SessionError> {
        let mut reachable = Vec::new();
        collect_reachable_targets(root_package, &mut HashSet::new(), &mut HashSet::new(), &mut reachable);
        reachable.sort_by(|a, b| a.1.name.cmp(&b.1.name));

        let mut results = BTreeMap::new();
        for (package_name, target) in &reachable {
            let plugins = direct_plugin_dependencies(target);
            if plugins.is_empty() {
                continue;
            }

            let tool_paths = self.resolve_tools(target)?;
            let mut per_target = Vec::with_capacity(plugins.len());
            for plugin in &plugins {
                per_target.push(self.invoke_one(root_package, package_name, target, plugin, &tool_paths)?);
            }
            results.insert(target.name.clone(), per_target);
        }
        Ok(results)
    }

    fn invoke_one(
        &self,
        root_package: &PackageNode,
        package_name: &str,
        target: &TargetNode,
        plugin: &TargetNode,
        tool_paths: &BTreeMap<String, Utf8PathBuf>,
    ) -> Result<PluginInvocationResult, SessionError> {
        let (plugin_name, sources, capability) = match &plugin.kind {
            TargetKind::Plugin { plugin_name, sources, capability } => {
                (plugin_name.clone(), sources.clone(), *capability)
            }
            _ => unreachable!("direct_plugin_dependencies only returns plugin-kind targets"),
        };

        let work_dir = self.output_dir.join(package_name).join(&target.name).join(&plugin_name);
        std::fs::create_dir_all(&work_dir).map_err(|source| SessionError::WorkDirCreation {
            path: work_dir.clone(),
            source,
        })?;

        let action = match capability {
            PluginCapability::BuildTool => {
                ActionRequest::CreateBuildToolCommands { target: target.clone() }
            }
            PluginCapability::UserCommand => {
                ActionRequest::PerformUserCommand { targets: vec![target.clone()], arguments: vec![] }
            }
        };
        let input = packplug_graph::serialize(
            root_package,
            &work_dir,
            &self.built_products_dir,
            tool_paths,
            action,
        )?;

        let plugin_cache_dir = self.cache_root.join(&plugin_name);
        let compiled = packplug_compiler::compile(
            &sources,
            &self.tools_version,
            &plugin_cache_dir,
            &self.plugin_api,
        )
        .map_err(|source| SessionError::CompilerLaunch { plugin: plugin_name.clone(), source })?;
        let Some(executable) = compiled.executable else {
            return Err(SessionError::CompilationFailed {
                plugin: plugin_name.clone(),
                diagnostics_file: compiled.diagnostics_file,
                stderr: compiled.raw.stderr,
            });
        };

        let stderr_buf = Arc::new(Mutex::new(String::new()));
        let sink = stderr_buf.clone();
        let (_canceller, handle) = packplug_runner::invoke(
            &executable,
            &[work_dir.as_path()],
            &plugin_cache_dir,
            input,
            Arc::new(move |line: String| {
                let mut buf = sink.lock().unwrap();
                buf.push_str(&line);
                buf.push('\n');
            }),
        );
        let output = handle
            .join()
            .expect("invocation thread panicked")?;
        let stderr_text = stderr_buf.lock().unwrap().clone();

        Ok(PluginInvocationResult {
            plugin_name,
            build_commands: output
                .build_commands
                .into_iter()
                .map(|c| promote_build_command(c, &work_dir))
                .collect(),
            prebuild_commands: output
                .prebuild_commands
                .into_iter()
                .map(|c| promote_prebuild_command(c, &work_dir))
                .collect(),
            user_commands: output
                .user_commands
                .into_iter()
                .map(|c| promote_user_command(c, &work_dir))
                .collect(),
            diagnostics: output.diagnostics,
            stderr_text,
        })
    }

    fn resolve_tools(&self, target: &TargetNode) -> Result<BTreeMap<String, Utf8PathBuf>, SessionError> {
        let mut resolved = BTreeMap::new();
        let host_triple = packplug_compiler::host::host_triple("rustc").map_err(|source| {
            SessionError::CompilerLaunch {
                plugin: "<host-triple-detection>".into(),
                source: packplug_compiler::CompileError::LaunchFailed(source),
            }
        })?;

        for dep in &target.dependencies {
            let TargetDependency::Target(t) = dep else { continue };
            match &t.kind {
                TargetKind::BinaryLibrary { path } => {
                    let extract_root = self.cache_root.join("vended-tools");
                    let tool_path = tools::resolve_vended_tool(path, &t.name, host_triple, &extract_root)?;
                    resolved.insert(t.name.clone(), tool_path);
                }
                TargetKind::Code(code) if code.role == TargetRole::Executable => {
                    resolved.insert(
                        t.name.clone(),
                        tools::resolve_built_tool(&self.built_products_dir, Utf8Path::new(&t.name)),
                    );
                }
                _ => {}
            }
        }
        Ok(resolved)
    }
}

fn direct_plugin_dependencies(target: &TargetNode) -> Vec<TargetNode> {
    let mut found = Vec::new();
    for dep in &target.dependencies {
        match dep {
            TargetDependency::Target(t) if t.is_plugin() => found.push(t.clone()),
            TargetDependency::Product(p) => {
                found.extend(p.targets.iter().filter(|t| t.is_plugin()).cloned());
            }
            _ => {}
        }
    }
    found
}

fn collect_reachable_targets(
    package: &PackageNode,
    seen_packages: &mut HashSet<usize>,
    seen_targets: &mut HashSet<usize>,
    out: &mut Vec<(String, TargetNode)>,
) {
    if !seen_packages.insert(package.identity()) {
        return;
    }
    for target in &package.targets {
        if seen_targets.insert(target.identity()) {
            out.push((package.name.clone(), target.clone()));
        }
    }
    for dep in &package.dependencies {
        collect_reachable_targets(dep, seen_packages, seen_targets, out);
    }
}

fn promote_path(path_str: &str, work_dir: &Utf8Path) -> String {
    let path = Utf8Path::new(path_str);
    if path.is_absolute() {
        path.to_string()
    } else {
        work_dir.join(path).to_string()
    }
}

fn promote_config(mut config: CommandConfig, work_dir: &Utf8Path) -> CommandConfig {
    config.working_directory = config.working_directory.as_deref().map(|d| promote_path(d, work_dir));
    config
}

fn promote_build_command(mut cmd: BuildCommand, work_dir: &Utf8Path) -> BuildCommand {
    cmd.config = promote_config(cmd.config, work_dir);
    cmd.inputs = cmd.inputs.iter().map(|p| promote_path(p, work_dir)).collect();
    cmd.outputs = cmd.outputs.iter().map(|p| promote_path(p, work_dir)).collect();
    cmd
}

fn promote_prebuild_command(mut cmd: PrebuildCommand, work_dir: &Utf8Path) -> PrebuildCommand {
    cmd.config = promote_config(cmd.config, work_dir);
    cmd.output_files_directory = promote_path(&cmd.output_files_directory, work_dir);
    cmd
}

fn promote_user_command(mut cmd: UserCommand, work_dir: &Utf8Path) -> UserCommand {
    cmd.config = promote_config(cmd.config, work_dir);
    cmd
}
