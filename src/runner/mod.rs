//! Run-line execution engine
//!
//! This module runs the shell lines attached to configured commands,
//! including variable interpolation and context-aware process supervision.

pub mod interpolate;
pub mod shell;

// Re-export main types
pub use interpolate::*;
pub use shell::*;
