//! Resilient element interaction.
//!
//! Every operation here re-resolves its locator inside the poll loop, so an
//! element that detaches mid-interaction is simply resolved again on the next
//! evaluation instead of failing the scenario. Fills additionally verify the
//! resulting value and retry until it sticks, which covers inputs whose
//! framework re-renders them on focus.

use crate::error::{HarnessError, HarnessResult};
use crate::harness::Harness;
use crate::locator::Locator;
use crate::session::{ElementHandle, Session};
use crate::wait::{poll_until, Poll};
use chrono::NaiveDateTime;
use std::path::Path;

/// Value format for `input[type="datetime-local"]` controls
pub const DATETIME_LOCAL_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// How a fill delivers its text to the element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillStrategy {
    /// Clear, then type through the native input pipeline. The page sees the
    /// same event stream a user produces.
    NativeKeys,
    /// Assign the value property directly and synthesize `input`/`change`
    /// events. For controls that reject synthetic keystrokes, such as
    /// `datetime-local` inputs.
    DirectValue,
}

impl<S: Session> Harness<S> {
    /// Fill a text input: resolve, clear, type natively, and verify the value
    /// stuck. Retries the whole sequence on staleness or a mismatched
    /// read-back until the default policy times out.
    ///
    /// # Errors
    ///
    /// [`HarnessError::Timeout`] if the value never sticks; fatal session
    /// errors propagate immediately.
    pub async fn fill(&self, locator: &Locator, text: &str) -> HarnessResult<()> {
        self.fill_with(FillStrategy::NativeKeys, locator, text).await
    }

    /// Fill a control by assigning its value property directly, bypassing the
    /// native input pipeline. `input` and `change` events still fire so the
    /// page reacts as it would to typing.
    pub async fn set_raw_value(&self, locator: &Locator, value: &str) -> HarnessResult<()> {
        self.fill_with(FillStrategy::DirectValue, locator, value).await
    }

    /// Fill a `datetime-local` input from a [`NaiveDateTime`], formatted the
    /// only way those controls accept (`YYYY-MM-DDTHH:MM`). Uses direct value
    /// assignment; native typing into datetime controls is not portable
    /// across locales.
    pub async fn set_datetime(
        &self,
        locator: &Locator,
        when: NaiveDateTime,
    ) -> HarnessResult<()> {
        let formatted = when.format(DATETIME_LOCAL_FORMAT).to_string();
        self.set_raw_value(locator, &formatted).await
    }

    /// Fill with an explicit delivery strategy. Verification is the same for
    /// both strategies: the element's value property must read back equal to
    /// the requested text before the fill is considered done.
    pub async fn fill_with(
        &self,
        strategy: FillStrategy,
        locator: &Locator,
        text: &str,
    ) -> HarnessResult<()> {
        let policy = self.default_policy();
        let description = format!("fill {locator}");
        poll_until(&policy, &description, || {
            let session = self.session();
            async move {
                let element = match session.query(locator).await?.into_iter().next() {
                    Some(element) => element,
                    None => return Ok(Poll::Pending),
                };
                match strategy {
                    FillStrategy::NativeKeys => session.clear_and_type(&element, text).await?,
                    FillStrategy::DirectValue => session.set_value(&element, text).await?,
                }
                if session.value(&element).await? == text {
                    Ok(Poll::Ready(()))
                } else {
                    Ok(Poll::Pending)
                }
            }
        })
        .await
    }

    /// Resolve and click. A handle invalidated between resolution and the
    /// click is retried as a fresh resolve-and-click.
    pub async fn click(&self, locator: &Locator) -> HarnessResult<()> {
        let policy = self.default_policy();
        let description = format!("click {locator}");
        poll_until(&policy, &description, || {
            let session = self.session();
            async move {
                match session.query(locator).await?.into_iter().next() {
                    Some(element) => {
                        session.click(&element).await?;
                        Ok(Poll::Ready(()))
                    }
                    None => Ok(Poll::Pending),
                }
            }
        })
        .await
    }

    /// Click an already-resolved element once, without retry. For handles the
    /// caller just obtained, such as a row-scoped action link.
    pub async fn click_element(&self, element: &ElementHandle) -> HarnessResult<()> {
        self.session().click(element).await
    }

    /// The current value property of the first element matching the locator,
    /// waiting for it to appear.
    pub async fn read_value(&self, locator: &Locator) -> HarnessResult<String> {
        let element = self.find(locator, &self.default_policy()).await?;
        self.session().value(&element).await
    }

    /// The trimmed text content of the first element matching the locator,
    /// waiting for it to appear.
    pub async fn read_text(&self, locator: &Locator) -> HarnessResult<String> {
        let element = self.find(locator, &self.default_policy()).await?;
        Ok(self.session().text(&element).await?.trim().to_string())
    }

    /// Attach a local file to a file input. The path must exist before the
    /// session is asked to deliver it.
    pub async fn attach_file(&self, locator: &Locator, path: &Path) -> HarnessResult<()> {
        if !path.exists() {
            return Err(HarnessError::FixtureMissing {
                path: path.display().to_string(),
            });
        }
        let element = self.find(locator, &self.default_policy()).await?;
        self.session().attach_file(&element, path).await
    }
}
