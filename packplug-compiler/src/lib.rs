//! Compiles plugin sources into a per-plugin host executable (spec §4.C
//! "Plugin compiler"). Grounded on `scarb/src/compiler/plugin/proc_macro`
//! and its fingerprint-gated compilation cache: a fingerprint of the
//! compile environment decides whether the compiler is re-invoked at all,
//! and when it does run, it runs to completion so its own diagnostics can
//! be captured verbatim rather than interpreted.

pub mod error;
pub mod fingerprint;
pub mod host;
pub mod plugin_api;

use camino::{Utf8Path, Utf8PathBuf};
pub use error::CompileError;
use fingerprint::Fingerprint;
use itertools::Itertools;
pub use plugin_api::PluginApi;
use std::process::Command;
use tracing::trace_span;

const EXE_SUFFIX: &str = if cfg!(windows) { ".exe" } else { "" };

/// Environment variable a host build system can set to override where the
/// compiler places its incremental cache (spec §4.C, §6).
pub const MODULE_CACHE_ENV_VAR: &str = "PACKPLUG_MODULE_CACHE";

/// What the compiler actually printed, kept for error reporting even when
/// compilation was skipped because a cached executable was reused.
#[derive(Debug, Default, Clone)]
pub struct CompileOutput {
    pub exit_success: bool,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

pub struct CompilationResult {
    /// `Some` only if the compiler exited with code 0 (spec §4.C).
    pub executable: Option<Utf8PathBuf>,
    pub diagnostics_file: Utf8PathBuf,
    pub raw: CompileOutput,
}

/// Compiles `sources` (crate root first) into an executable linked against
/// `plugin_api`, reusing a cached build under `cache_dir` when the compile
/// environment, sources, and plugin-API rlib are all unchanged (spec §4.C
/// "Caching", §8.8 idempotent compilation).
///
/// Fails only if the compiler (or the plugin-API build behind it) could not
/// be launched; an ordinary compile failure is reported via
/// `executable: None` (spec §7).
pub fn compile(
    sources: &[Utf8PathBuf],
    tools_version: &str,
    cache_dir: &Utf8Path,
    plugin_api: &PluginApi,
) -> Result<CompilationResult, CompileError> {
    let _span = trace_span!("packplug_compile").entered();

    std::fs::create_dir_all(cache_dir).map_err(|source| CompileError::CacheDirCreation {
        path: cache_dir.to_owned(),
        source,
    })?;

    let compiler = "rustc";
    let compiler_path = which::which(compiler)
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|_| compiler.to_string());

    let host_triple = host::host_triple(&compiler_path).map_err(CompileError::LaunchFailed)?;
    let toolchain_identity =
        host::toolchain_identity(&compiler_path).map_err(CompileError::LaunchFailed)?;

    // Built once per cache directory and reused across recompiles of the
    // plugin itself: cargo's own freshness check makes a repeat call here
    // cheap when `packplug_api.manifest_path`'s sources haven't changed.
    let api_build_dir = cache_dir.join("plugin-api-build");
    let built_api = plugin_api::build(plugin_api, &api_build_dir)?;
    let mut plugin_api_fingerprint = format!("{}", plugin_api.manifest_path);
    for (name, rlib) in &built_api.rlibs {
        let mtime = std::fs::metadata(rlib)?.modified()?;
        plugin_api_fingerprint.push_str(&format!(":{name}={mtime:?}"));
    }

    let module_cache_override = std::env::var(MODULE_CACHE_ENV_VAR).ok();
    let source_paths = sources.iter().map(|p| p.to_string()).sorted().collect_vec();

    let fp = Fingerprint {
        compiler_path: &compiler_path,
        compiler_version: toolchain_identity,
        host_triple,
        tools_version,
        source_paths: &source_paths,
        module_cache_override: module_cache_override.as_deref(),
        plugin_api_fingerprint: &plugin_api_fingerprint,
    };

    let entry_dir = cache_dir.join(fp.id());
    std::fs::create_dir_all(&entry_dir).map_err(|source| CompileError::CacheDirCreation {
        path: entry_dir.clone(),
        source,
    })?;

    let exe_path = entry_dir.join(format!("plugin{EXE_SUFFIX}"));
    let diagnostics_file = entry_dir.join("diagnostics.json");
    let digest_path = entry_dir.join("digest");

    let new_digest = fp.digest();
    let fresh = digest_path.exists()
        && std::fs::read_to_string(&digest_path)?.trim() == new_digest
        && fingerprint::executable_is_newer_than_sources(&exe_path, sources)?;

    if fresh {
        tracing::debug!(exe = %exe_path, "reusing cached plugin executable");
        return Ok(CompilationResult {
            executable: Some(exe_path),
            diagnostics_file,
            raw: CompileOutput {
                exit_success: true,
                ..Default::default()
            },
        });
    }

    let mut cmd = Command::new(&compiler_path);
    if let Some(entry) = sources.first() {
        cmd.arg(entry);
    }
    cmd.args(["--crate-type", "bin", "--crate-name", "plugin"]);
    cmd.args(["--target", host_triple]);
    cmd.args(["--edition", "2021"]);
    cmd.arg("-o").arg(exe_path.as_str());
    cmd.arg("--error-format=json");
    for (name, rlib) in &built_api.rlibs {
        cmd.arg("--extern").arg(format!("{name}={rlib}"));
    }
    cmd.arg("-L").arg(format!("dependency={}", built_api.deps_dir));
    if let Some(over) = &module_cache_override {
        cmd.args(["-C", &format!("incremental={over}")]);
    }

    tracing::debug!(cmd = ?cmd, "invoking plugin compiler");
    let output = cmd.output().map_err(|e| {
        CompileError::LaunchFailed(anyhow::anyhow!(e).context("failed to launch `rustc`"))
    })?;

    std::fs::write(&diagnostics_file, &output.stderr)?;

    let executable = if output.status.success() {
        std::fs::write(&digest_path, &new_digest)?;
        Some(exe_path)
    } else {
        None
    };

    Ok(CompilationResult {
        executable,
        diagnostics_file,
        raw: CompileOutput {
            exit_success: output.status.success(),
            stdout: output.stdout,
            stderr: output.stderr,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_source(dir: &Utf8Path, name: &str, body: &str) -> Utf8PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    /// Points at the workspace's own `packplug-runtime` crate, the same one
    /// real plugins link against, so these tests exercise the actual
    /// `--extern`/`-L` wiring rather than a stand-in.
    fn runtime_api() -> PluginApi {
        let manifest_path = Utf8Path::new(env!("CARGO_MANIFEST_DIR"))
            .parent()
            .unwrap()
            .join("packplug-runtime")
            .join("Cargo.toml");
        PluginApi {
            manifest_path,
            extern_crates: vec!["packplug_runtime".into(), "packplug_wire".into()],
        }
    }

    #[test]
    fn compiles_a_trivial_plugin_and_caches_it() {
        let tmp = tempfile::tempdir().unwrap();
        let src_dir = Utf8Path::from_path(tmp.path()).unwrap();
        let src = write_source(src_dir, "plugin.rs", "fn main() {}\n");
        let cache_dir = src_dir.join("cache");
        let api = runtime_api();

        let first = compile(std::slice::from_ref(&src), "1.0", &cache_dir, &api).unwrap();
        let exe = first.executable.clone().expect("compiled successfully");
        assert!(exe.exists());
        let first_mtime = std::fs::metadata(&exe).unwrap().modified().unwrap();

        let second = compile(&[src], "1.0", &cache_dir, &api).unwrap();
        let exe2 = second.executable.expect("still compiled");
        assert_eq!(exe, exe2);
        let second_mtime = std::fs::metadata(&exe2).unwrap().modified().unwrap();
        assert_eq!(first_mtime, second_mtime, "cached build must not recompile");
    }

    #[test]
    fn compile_failure_leaves_executable_absent_but_keeps_diagnostics() {
        let tmp = tempfile::tempdir().unwrap();
        let src_dir = Utf8Path::from_path(tmp.path()).unwrap();
        let src = write_source(src_dir, "broken.rs", "this is not rust {{{\n");
        let cache_dir = src_dir.join("cache");

        let result = compile(&[src], "1.0", &cache_dir, &runtime_api()).unwrap();
        assert!(result.executable.is_none());
        assert!(result.diagnostics_file.exists());
        let diagnostics = std::fs::read_to_string(&result.diagnostics_file).unwrap();
        assert!(!diagnostics.is_empty());
    }

    #[test]
    fn changing_source_invalidates_cache() {
        let tmp = tempfile::tempdir().unwrap();
        let src_dir = Utf8Path::from_path(tmp.path()).unwrap();
        let src = write_source(src_dir, "plugin.rs", "fn main() {}\n");
        let cache_dir = src_dir.join("cache");
        let api = runtime_api();

        let first = compile(std::slice::from_ref(&src), "1.0", &cache_dir, &api).unwrap();
        let exe = first.executable.unwrap();
        let first_mtime = std::fs::metadata(&exe).unwrap().modified().unwrap();

        std::thread::sleep(std::time::Duration::from_millis(1100));
        write_source(src_dir, "plugin.rs", "fn main() { let _x = 1; }\n");

        let second = compile(&[src], "1.0", &cache_dir, &api).unwrap();
        let exe2 = second.executable.unwrap();
        let second_mtime = std::fs::metadata(&exe2).unwrap().modified().unwrap();
        assert!(second_mtime > first_mtime);
    }

    #[test]
    fn plugin_can_use_the_runtime_crate_directly() {
        let tmp = tempfile::tempdir().unwrap();
        let src_dir = Utf8Path::from_path(tmp.path()).unwrap();
        let src = write_source(
            src_dir,
            "plugin.rs",
            "use packplug_runtime::PluginContext;\n\
             fn main() {\n    \
                 let _ = std::any::type_name::<PluginContext>();\n\
             }\n",
        );
        let cache_dir = src_dir.join("cache");

        let result = compile(&[src], "1.0", &cache_dir, &runtime_api()).unwrap();
        assert!(
            result.executable.is_some(),
            "expected a successful link against packplug-runtime, diagnostics: {}",
            String::from_utf8_lossy(&result.raw.stderr)
        );
    }
}
