use camino::Utf8PathBuf;
use thiserror::Error;

/// Spec §4.C: "This function fails only if the compiler could not be
/// launched; ordinary compile failures are signaled via `executable = ∅`."
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("failed to create cache directory `{path}`")]
    CacheDirCreation {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to launch plugin compiler")]
    LaunchFailed(#[source] anyhow::Error),
    #[error("failed to build the plugin-API library at `{manifest_path}`")]
    PluginApiBuildFailed {
        manifest_path: Utf8PathBuf,
        stderr: Vec<u8>,
    },
    #[error("plugin-API crate `{crate_name}` produced no rlib after building `{manifest_path}`")]
    PluginApiArtifactMissing {
        manifest_path: Utf8PathBuf,
        crate_name: String,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
