//! Resource drivers: thin wrappers around the external tools.
//!
//! Each driver consumes already-resolved properties from the context and
//! performs no defaulting or validation of its own.

mod build;
mod scm;
mod server;

pub use build::BuildDriver;
pub use scm::{ScmAction, ScmDriver};
pub use server::{ServerDriver, ServerInstance, debug_port_from_args, http_port_from_args};
