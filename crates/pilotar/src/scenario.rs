//! Scenario lifecycle: fresh session in, best-effort teardown out.
//!
//! Scenarios never share a session. [`run_scenario`] owns the teardown
//! contract: the session closes whether the body passes, fails, or panics,
//! and a teardown failure never masks the body's verdict.

use crate::error::HarnessResult;
use crate::harness::Harness;
use crate::session::Session;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Run one scenario body against a freshly acquired harness, closing the
/// session afterwards regardless of the body's outcome.
///
/// The harness is shared behind an [`Arc`] so the body can move clones into
/// spawned sub-tasks if it needs to. A panicking body (assertion macros
/// panic) still gets its session closed; the panic resumes after teardown.
///
/// # Errors
///
/// Whatever the body returns; teardown failures are logged, never returned.
pub async fn run_scenario<S, F, Fut, T>(harness: Harness<S>, body: F) -> HarnessResult<T>
where
    S: Session,
    F: FnOnce(Arc<Harness<S>>) -> Fut,
    Fut: Future<Output = HarnessResult<T>>,
{
    let harness = Arc::new(harness);
    tracing::info!("scenario starting");
    let outcome = AssertUnwindSafe(body(Arc::clone(&harness)))
        .catch_unwind()
        .await;
    harness.close().await;
    match outcome {
        Ok(outcome) => {
            match &outcome {
                Ok(_) => tracing::info!("scenario passed"),
                Err(err) => tracing::error!(error = %err, "scenario failed"),
            }
            outcome
        }
        Err(panic) => {
            tracing::error!("scenario body panicked");
            std::panic::resume_unwind(panic)
        }
    }
}

/// A collision-free name for records a scenario creates: the given prefix, a
/// second-resolution timestamp, and a random nonce. The timestamp keeps
/// repeated runs against a dirty database distinguishable; the nonce keeps
/// concurrent scenarios within the same second apart.
#[must_use]
pub fn unique_name(prefix: &str) -> String {
    let stamp = chrono::Local::now().format("%Y%m%d%H%M%S");
    let nonce = uuid::Uuid::new_v4().simple().to_string();
    format!("{prefix}_{stamp}_{}", &nonce[..6])
}
