//! Generic utility primitives with zero domain knowledge.
//!
//! - `args` - Argument normalization before clap parsing
//! - `command` - Command execution behind a mockable runner
//! - `io` - File I/O with consistent error handling
//! - `shell` - Shell quoting
//! - `signals` - Deferred handling of termination signals
//! - `template` - `{{key}}` template rendering
//! - `validation` - Input validation helpers

pub mod args;
pub mod command;
pub mod io;
pub mod shell;
pub mod signals;
pub mod template;
pub mod validation;
