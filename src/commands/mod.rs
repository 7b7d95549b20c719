//! CLI command handlers.
//!
//! Each submodule handles a specific CLI command:
//! - `build` - Build the signed metapackage repository
//! - `deps` - List required host packages for provisioning
//! - `sync` - Mirror the built repository to a remote host

pub mod build;
pub mod deps;
pub mod sync;

pub use build::cmd_build;
pub use deps::cmd_deps;
pub use sync::cmd_sync;
