//! Builds and locates the rlibs a plugin's `rustc` invocation links against
//! (spec §4.F: the plugin-side runtime is a real crate, not a header).
//! Building is delegated to `cargo build` against the crate's own manifest
//! so its transitive dependency graph resolves the ordinary way;
//! [`compile`](crate::compile) then points the plugin's own `rustc`
//! invocation at the result with `--extern`/`-L`.

use crate::error::CompileError;
use camino::{Utf8Path, Utf8PathBuf};
use std::process::Command;
use std::time::SystemTime;

/// The crate graph plugin sources may `use` directly. `manifest_path` is
/// built once; `extern_crates` names every crate in that build a plugin is
/// allowed to import by name (e.g. `packplug_runtime` and the `packplug_wire`
/// types it re-exports). Anything reachable only transitively from those
/// needs no entry here: a single `-L dependency=...` resolves it.
pub struct PluginApi {
    pub manifest_path: Utf8PathBuf,
    pub extern_crates: Vec<String>,
}

pub struct BuiltPluginApi {
    /// `(crate_name, rlib_path)` for each of `extern_crates`, each passed as
    /// `--extern {crate_name}={rlib_path}`.
    pub rlibs: Vec<(String, Utf8PathBuf)>,
    /// `cargo build`'s flat output directory: every transitive dependency's
    /// rlib lands here too, so a single `-L dependency={deps_dir}` resolves
    /// the whole chain without naming each one.
    pub deps_dir: Utf8PathBuf,
}

/// Runs `cargo build` against `api.manifest_path` into `target_dir`, then
/// locates the rlib for each of `api.extern_crates`. Idempotent: a second
/// call against the same `target_dir` is a fast no-op, since cargo's own
/// freshness check skips recompilation when sources haven't changed.
pub fn build(api: &PluginApi, target_dir: &Utf8Path) -> Result<BuiltPluginApi, CompileError> {
    let output = Command::new("cargo")
        .args(["build", "--quiet"])
        .arg("--manifest-path")
        .arg(api.manifest_path.as_str())
        .arg("--target-dir")
        .arg(target_dir.as_str())
        .output()
        .map_err(|e| {
            CompileError::LaunchFailed(anyhow::anyhow!(e).context("failed to launch `cargo`"))
        })?;

    if !output.status.success() {
        return Err(CompileError::PluginApiBuildFailed {
            manifest_path: api.manifest_path.clone(),
            stderr: output.stderr,
        });
    }

    let deps_dir = target_dir.join("debug").join("deps");
    let mut rlibs = Vec::with_capacity(api.extern_crates.len());
    for crate_name in &api.extern_crates {
        let rlib = newest_rlib(&deps_dir, crate_name)?.ok_or_else(|| {
            CompileError::PluginApiArtifactMissing {
                manifest_path: api.manifest_path.clone(),
                crate_name: crate_name.clone(),
            }
        })?;
        rlibs.push((crate_name.clone(), rlib));
    }

    Ok(BuiltPluginApi { rlibs, deps_dir })
}

/// `cargo build` never cleans up rlibs from older hashes of the same crate,
/// so when more than one `lib{crate_name}-*.rlib` is present the newest one
/// by mtime is the one that matches the current source tree.
fn newest_rlib(deps_dir: &Utf8Path, crate_name: &str) -> std::io::Result<Option<Utf8PathBuf>> {
    let prefix = format!("lib{crate_name}-");
    let mut newest: Option<(SystemTime, Utf8PathBuf)> = None;
    for entry in std::fs::read_dir(deps_dir)? {
        let entry = entry?;
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else { continue };
        if !(name.starts_with(&prefix) && name.ends_with(".rlib")) {
            continue;
        }
        let modified = entry.metadata()?.modified()?;
        let path = Utf8PathBuf::from_path_buf(entry.path()).expect("cargo paths are utf8");
        let replace = match &newest {
            Some((t, _)) => modified > *t,
            None => true,
        };
        if replace {
            newest = Some((modified, path));
        }
    }
    Ok(newest.map(|(_, p)| p))
}
