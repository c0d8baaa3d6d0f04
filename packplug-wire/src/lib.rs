//! Wire schema for the build-tool plugin protocol: the flattened package
//! graph handed to a plugin invocation, the commands and diagnostics it
//! hands back, and the framed host/plugin message protocol in between.
//!
//! This crate has no knowledge of processes, compilers, or sandboxing — it
//! is pure data and (de)serialization, consumed by both the host side
//! (`packplug-graph`, `packplug-runner`, `packplug-session`) and the plugin
//! side (`packplug-runtime`).

pub mod command;
pub mod error;
pub mod framing;
pub mod graph;
pub mod ids;
pub mod message;

pub use command::{BuildCommand, CommandConfig, Diagnostic, PrebuildCommand, Severity, UserCommand};
pub use error::WireError;
pub use graph::{Action, Dependency, File, FileKind, Input, LibraryKind, Package, Path, Product, ProductInfo, Target, TargetInfo};
pub use ids::{PackageId, PathId, ProductId, TargetId};
pub use message::{HostMessage, PluginMessage};
