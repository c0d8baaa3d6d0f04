//! Orchestrates components B-D into the end-to-end session described by
//! spec §4.E: finding the plugins attached to each target, resolving the
//! tools they can see, compiling and invoking each one, and turning their
//! output into build-plan records with paths promoted to absolute.

pub mod error;
mod session;
pub mod tools;

pub use error::SessionError;
pub use session::{PluginInvocationResult, Session};
