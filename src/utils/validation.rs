//! Input validation primitives.
//!
//! These replace verbose ok_or_else + Error::validation_* chains.

use crate::error::{Error, Result};

/// Require at least one positional argument, attaching the usage line.
pub fn require_args<'a, T>(args: &'a [T], field: &str, usage: &str) -> Result<&'a [T]> {
    if args.is_empty() {
        Err(Error::validation_missing_argument(vec![field.to_string()])
            .with_hint(format!("Usage: {}", usage)))
    } else {
        Ok(args)
    }
}

/// First value that is present and non-empty.
///
/// Environment variables set to an empty string count as unset.
pub fn first_non_empty<'a, I>(candidates: I) -> Option<String>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}
