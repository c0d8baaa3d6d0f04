//! Process-wide memoized host facts (spec §4.C, §9): the host triple and a
//! minimum-toolchain marker, each computed once by invoking the compiler and
//! cached for the lifetime of the process.

use anyhow::{Context, Result};
use std::process::Command;
use std::sync::OnceLock;

static HOST_TRIPLE: OnceLock<String> = OnceLock::new();
static TOOLCHAIN_IDENTITY: OnceLock<String> = OnceLock::new();

/// The triple the plugin executable will be built for — always the host
/// running the build, since spec.md explicitly rules out cross-plugin
/// interpreters.
pub fn host_triple(compiler: &str) -> Result<&'static str> {
    if let Some(triple) = HOST_TRIPLE.get() {
        return Ok(triple);
    }
    let triple = detect_host_triple(compiler)?;
    Ok(HOST_TRIPLE.get_or_init(|| triple))
}

fn detect_host_triple(compiler: &str) -> Result<String> {
    let output = Command::new(compiler)
        .arg("-vV")
        .output()
        .with_context(|| format!("failed to query host triple from `{compiler}`"))?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    for line in stdout.lines() {
        if let Some(triple) = line.strip_prefix("host: ") {
            return Ok(triple.trim().to_string());
        }
    }
    anyhow::bail!("could not determine host triple from `{compiler} -vV` output")
}

/// Identifies the exact toolchain build in use, analogous to SwiftPM's
/// "minimum deployment version derived once from the plugin-API binary":
/// here, the compiler's own release string, since that fully determines
/// which language features a compiled plugin can rely on.
pub fn toolchain_identity(compiler: &str) -> Result<&'static str> {
    if let Some(identity) = TOOLCHAIN_IDENTITY.get() {
        return Ok(identity);
    }
    let identity = detect_toolchain_identity(compiler)?;
    Ok(TOOLCHAIN_IDENTITY.get_or_init(|| identity))
}

fn detect_toolchain_identity(compiler: &str) -> Result<String> {
    let output = Command::new(compiler)
        .arg("--version")
        .output()
        .with_context(|| format!("failed to query toolchain identity from `{compiler}`"))?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
