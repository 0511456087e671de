//! Command tree dispatch
//!
//! This module holds the command tree, the parser contract it dispatches
//! through, the context handed to handlers, and the YAML-driven application
//! built on top of them.

pub mod app;
pub mod command;
pub mod context;
pub mod flags;

// Re-export main types
pub use command::{handler, Cmd, Handler};
pub use context::Context;
pub use flags::{clap_flags, ClapFlags, FlagSet, FlagSetCreator, Values};
