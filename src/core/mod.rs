pub mod container;
pub mod defaults;
pub mod environment;
pub mod error;
pub mod git;
pub mod paths;
pub mod pipelines;
pub mod provision;
pub mod release;

pub use error::{Error, ErrorCode, Result};
