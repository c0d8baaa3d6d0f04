use camino::Utf8PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Graph(#[from] packplug_graph::GraphError),

    #[error("plugin compiler could not be launched for `{plugin}`")]
    CompilerLaunch {
        plugin: String,
        #[source]
        source: packplug_compiler::CompileError,
    },

    /// Ordinary compile failure (spec §4.E step 3: "on compile failure,
    /// surface a compilation error carrying the raw result").
    #[error("plugin `{plugin}` failed to compile")]
    CompilationFailed {
        plugin: String,
        diagnostics_file: Utf8PathBuf,
        stderr: Vec<u8>,
    },

    #[error(transparent)]
    Run(#[from] packplug_runner::RunError),

    #[error("failed to create invocation work directory `{path}`")]
    WorkDirCreation {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("tool archive `{archive}` has no entry for host triple `{host_triple}`")]
    ToolNotVendedForHost { archive: Utf8PathBuf, host_triple: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
