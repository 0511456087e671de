//! cmdtree - a tree-of-subcommands dispatcher
//!
//! Commands are arranged in a tree. Each node owns its own argument parser and an
//! optional handler, and dispatch walks the tree one positional token at a time.
//! A YAML-driven front end builds such a tree from a `cmdtree.yml` file.

// Public modules
pub mod cli;
pub mod config;
pub mod error;
pub mod runner;

// Re-export commonly used types
pub use cli::{handler, Cmd, ClapFlags, Context, FlagSet, Handler, Values};
pub use error::{CmdTreeError, ContextError, DispatchError, Result};

/// Current version of cmdtree
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
