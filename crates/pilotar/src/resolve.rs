//! Element resolution: waiting single-element lookup and immediate
//! multi-element queries.
//!
//! `find` is a condition-poller instance: ready once at least one element
//! matches, with the transient kinds swallowed per policy. `find_all` never
//! waits; zero matches is a legitimate answer there (count and existence
//! checks build on it).

use crate::error::HarnessResult;
use crate::harness::Harness;
use crate::locator::Locator;
use crate::session::{ElementHandle, Session};
use crate::wait::{poll_until, Poll, WaitPolicy};

impl<S: Session> Harness<S> {
    /// Resolve a locator to the first matching element in document order,
    /// polling until at least one match exists.
    ///
    /// # Errors
    ///
    /// [`HarnessError::Timeout`] if no match appears within the policy.
    pub async fn find(
        &self,
        locator: &Locator,
        policy: &WaitPolicy,
    ) -> HarnessResult<ElementHandle> {
        let description = locator.to_string();
        poll_until(policy, &description, || {
            let session = self.session();
            async move {
                let mut matches = session.query(locator).await?;
                if matches.is_empty() {
                    Ok(Poll::Pending)
                } else {
                    Ok(Poll::Ready(matches.remove(0)))
                }
            }
        })
        .await
    }

    /// Resolve a locator scoped to `root`, polling until a match exists.
    ///
    /// The root itself must be freshly resolved; a stale root surfaces as the
    /// transient stale kind and is retried or times out per policy.
    pub async fn find_in(
        &self,
        root: &ElementHandle,
        locator: &Locator,
        policy: &WaitPolicy,
    ) -> HarnessResult<ElementHandle> {
        let description = format!("{locator} within {root}");
        poll_until(policy, &description, || {
            let session = self.session();
            async move {
                let mut matches = session.query_within(root, locator).await?;
                if matches.is_empty() {
                    Ok(Poll::Pending)
                } else {
                    Ok(Poll::Ready(matches.remove(0)))
                }
            }
        })
        .await
    }

    /// All elements currently matching the locator. Immediate, no wait:
    /// absence is a valid, non-error outcome.
    pub async fn find_all(&self, locator: &Locator) -> HarnessResult<Vec<ElementHandle>> {
        self.session().query(locator).await
    }

    /// All elements currently matching the locator under `root`. Immediate.
    pub async fn find_all_in(
        &self,
        root: &ElementHandle,
        locator: &Locator,
    ) -> HarnessResult<Vec<ElementHandle>> {
        self.session().query_within(root, locator).await
    }
}
