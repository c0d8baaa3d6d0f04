//! Wraps the plugin command in a filesystem/network sandbox where the host
//! platform supports one (spec §4.D "Spawn", SPEC_FULL §2).
//!
//! Grounded on the shape of [`crate::invoke`]'s command construction, which
//! in turn follows `scarb::process::exec_piping`'s `Command` building: the
//! sandbox is just another layer of argv wrapping applied before spawn.

use camino::Utf8Path;
use std::process::Command;

/// A sandbox profile: deny network access and all filesystem writes except
/// under an explicit allow-list of directories.
pub struct SandboxPolicy<'a> {
    pub writable_dirs: &'a [&'a Utf8Path],
}

impl<'a> SandboxPolicy<'a> {
    pub fn new(writable_dirs: &'a [&'a Utf8Path]) -> Self {
        Self { writable_dirs }
    }

    /// Builds the `Command` that will run `executable`, wrapped in a
    /// platform sandbox when one is available. On platforms without a
    /// supported sandbox mechanism this degrades to running the plugin
    /// directly — the spec requires the *contract* (argv-only, scoped
    /// writable dirs) be upheld by the runner's own pipe/cwd handling even
    /// when no OS-level enforcement backs it.
    #[cfg(target_os = "macos")]
    pub fn wrap(&self, executable: &Utf8Path) -> Command {
        let profile = self.sandbox_exec_profile();
        let mut cmd = Command::new("sandbox-exec");
        cmd.arg("-p").arg(profile);
        cmd.arg(executable.as_str());
        cmd
    }

    #[cfg(target_os = "macos")]
    fn sandbox_exec_profile(&self) -> String {
        let mut allows = String::new();
        for dir in self.writable_dirs {
            allows.push_str(&format!(
                "(allow file-write* (subpath \"{}\"))\n",
                dir.as_str().replace('\\', "\\\\").replace('"', "\\\"")
            ));
        }
        format!(
            "(version 1)\n(deny default)\n(allow file-read*)\n(deny network*)\n{allows}\
             (allow process-fork)\n(allow process-exec)\n"
        )
    }

    #[cfg(not(target_os = "macos"))]
    pub fn wrap(&self, executable: &Utf8Path) -> Command {
        tracing::debug!("no sandbox backend on this platform, running plugin unconfined");
        Command::new(executable.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(target_os = "macos")]
    fn profile_allows_each_writable_dir() {
        let a = Utf8Path::new("/tmp/work");
        let policy = SandboxPolicy::new(&[a]);
        let profile = policy.sandbox_exec_profile();
        assert!(profile.contains("/tmp/work"));
        assert!(profile.contains("deny network"));
    }

    #[test]
    #[cfg(not(target_os = "macos"))]
    fn non_macos_runs_executable_directly() {
        let policy = SandboxPolicy::new(&[]);
        let cmd = policy.wrap(Utf8Path::new("/bin/true"));
        assert_eq!(cmd.get_program().to_string_lossy(), "/bin/true");
    }
}
