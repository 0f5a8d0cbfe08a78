//! Navigation gate: request a URL, then hold until the document is ready.
//!
//! Arrival alone proves nothing; scenarios only proceed once
//! `document.readyState` reports complete. The gate gets a longer budget than
//! element waits because a cold server-side render can dominate it.

use crate::error::{HarnessError, HarnessResult};
use crate::harness::Harness;
use crate::locator::Locator;
use crate::session::Session;
use crate::wait::{poll_until, Poll, WaitPolicy};

impl<S: Session> Harness<S> {
    /// Navigate to a route path under the configured base origin and wait for
    /// document readiness.
    ///
    /// # Errors
    ///
    /// [`HarnessError::NavigationFailure`] if the request itself fails;
    /// [`HarnessError::Timeout`] if the document never reaches complete
    /// within the navigation policy.
    pub async fn goto(&self, path: &str) -> HarnessResult<()> {
        self.goto_url(&self.url(path)).await
    }

    /// Navigate to an absolute URL and wait for document readiness.
    pub async fn goto_url(&self, url: &str) -> HarnessResult<()> {
        tracing::debug!(%url, "navigating");
        self.session()
            .navigate(url)
            .await
            .map_err(|err| match err {
                already @ HarnessError::NavigationFailure { .. } => already,
                other => HarnessError::NavigationFailure {
                    url: url.to_string(),
                    message: other.to_string(),
                },
            })?;
        self.await_document_ready().await
    }

    /// Wait for the current document to report `readyState === "complete"`.
    ///
    /// Useful on its own after an action that triggers a same-session
    /// navigation, such as a form submit.
    pub async fn await_document_ready(&self) -> HarnessResult<()> {
        let policy = WaitPolicy::navigation();
        poll_until(&policy, "document readiness", || {
            let session = self.session();
            async move {
                if session.ready_state().await?.is_complete() {
                    Ok(Poll::Ready(()))
                } else {
                    Ok(Poll::Pending)
                }
            }
        })
        .await
    }

    /// Follow an in-page link by its exact trimmed text, then wait for the
    /// resulting document to be ready.
    pub async fn follow_link(&self, link_text: &str) -> HarnessResult<()> {
        self.click(&Locator::link_text(link_text)).await?;
        self.await_document_ready().await
    }
}
