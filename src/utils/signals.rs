//! Termination signal bookkeeping.
//!
//! Handlers only record the signal. Child processes share our process group
//! and receive it directly, so the blocked call returns, [`check`] turns the
//! recorded signal into an error, and scoped guards drop as the error
//! propagates.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use crate::error::{Error, Result};

#[cfg(unix)]
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};

fn pending() -> &'static Arc<AtomicUsize> {
    static PENDING: OnceLock<Arc<AtomicUsize>> = OnceLock::new();
    PENDING.get_or_init(|| Arc::new(AtomicUsize::new(0)))
}

/// Record SIGINT, SIGTERM and SIGHUP instead of terminating.
#[cfg(unix)]
pub fn install() -> Result<()> {
    for signum in [SIGINT, SIGTERM, SIGHUP] {
        signal_hook::flag::register_usize(signum, Arc::clone(pending()), signum as usize)
            .map_err(|e| {
                Error::internal_io(e.to_string(), Some(format!("register handler for signal {}", signum)))
            })?;
    }
    Ok(())
}

#[cfg(not(unix))]
pub fn install() -> Result<()> {
    Ok(())
}

/// Fail with `interrupted` if a signal arrived since the last check.
pub fn check() -> Result<()> {
    check_slot(pending())
}

fn check_slot(slot: &AtomicUsize) -> Result<()> {
    match slot.swap(0, Ordering::SeqCst) {
        0 => Ok(()),
        signum => Err(Error::interrupted(signum as i32)),
    }
}
