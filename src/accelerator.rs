//! Scoped release of accelerator resources held by an engine.
//!
//! Engines keep models resident on the GPU between calls. A stage wraps its
//! engine work in [`scoped`] so the release always runs once the work has
//! finished, whatever its outcome.

use std::future::Future;
use tracing::{debug, warn};

use crate::error::Result;

/// Await `work`, then always await `release`.
///
/// A release failure is logged and dropped; the result of `work` is
/// returned unchanged.
pub async fn scoped<T, W, R>(label: &str, work: W, release: R) -> Result<T>
where
    W: Future<Output = Result<T>>,
    R: Future<Output = Result<()>>,
{
    let outcome = work.await;

    match release.await {
        Ok(()) => debug!("Released accelerator resources after {}", label),
        Err(e) => warn!("Failed to release accelerator resources after {}: {}", label, e),
    }

    outcome
}
