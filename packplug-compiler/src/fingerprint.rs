//! A hash of everything that influences a plugin's compiled output, used to
//! decide whether a cached executable can be reused (spec §4.C "Caching").

use camino::Utf8Path;
use data_encoding::HEXLOWER;
use sha2::{Digest, Sha256};
use std::time::SystemTime;

/// Inputs that, if any changes, require recompiling the plugin.
pub struct Fingerprint<'a> {
    pub compiler_path: &'a str,
    pub compiler_version: &'a str,
    pub host_triple: &'a str,
    pub tools_version: &'a str,
    pub source_paths: &'a [String],
    pub module_cache_override: Option<&'a str>,
    /// Identifies the plugin-API rlib a plugin links against: invalidates
    /// the cached executable whenever that rlib is rebuilt, same as a
    /// change to any of `source_paths` would.
    pub plugin_api_fingerprint: &'a str,
}

impl Fingerprint<'_> {
    /// A short, stable identifier for this compile environment. Used as the
    /// cache subdirectory name: a later run with the *same* identifier has
    /// its digest checked for freshness; a different identifier always
    /// misses (spec: "the identifier is a less strict version of the
    /// digest").
    pub fn id(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.compiler_path.as_bytes());
        hasher.update(self.host_triple.as_bytes());
        hasher.update(self.tools_version.as_bytes());
        let digest = hasher.finalize();
        HEXLOWER.encode(&digest[..8])
    }

    /// The full digest: changes whenever anything about the compile
    /// environment or the effective command line changes.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.compiler_path.as_bytes());
        hasher.update(self.compiler_version.as_bytes());
        hasher.update(self.host_triple.as_bytes());
        hasher.update(self.tools_version.as_bytes());
        for path in self.source_paths {
            hasher.update(path.as_bytes());
        }
        if let Some(over) = self.module_cache_override {
            hasher.update(over.as_bytes());
        }
        hasher.update(self.plugin_api_fingerprint.as_bytes());
        HEXLOWER.encode(&hasher.finalize())
    }
}

/// Latest modification time among `paths`, or `None` if none exist.
pub fn latest_mtime(paths: &[camino::Utf8PathBuf]) -> std::io::Result<Option<SystemTime>> {
    let mut latest = None;
    for path in paths {
        let modified = std::fs::metadata(path)?.modified()?;
        latest = Some(latest.map_or(modified, |l: SystemTime| l.max(modified)));
    }
    Ok(latest)
}

/// Whether `executable` is newer than every file in `sources` — the other
/// half of freshness alongside the digest match (spec §4.C: "governed by
/// mtime of sources vs. the executable and a recorded hash").
pub fn executable_is_newer_than_sources(
    executable: &Utf8Path,
    sources: &[camino::Utf8PathBuf],
) -> std::io::Result<bool> {
    let exe_mtime = match std::fs::metadata(executable) {
        Ok(meta) => meta.modified()?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    let Some(sources_mtime) = latest_mtime(sources)? else {
        return Ok(true);
    };
    Ok(exe_mtime >= sources_mtime)
}
