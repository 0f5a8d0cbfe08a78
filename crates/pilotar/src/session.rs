//! The browser session boundary.
//!
//! [`Session`] is the abstract seam between the synchronization core and
//! whatever actually drives a browser. The real implementation speaks CDP via
//! chromiumoxide ([`crate::chromium::ChromiumSession`], feature `browser`);
//! [`crate::mock::MockSession`] backs unit tests with an in-memory DOM.
//! Swapping implementations never changes the core's retry/propagate
//! behavior, which is expressed entirely in error kinds.

use crate::error::HarnessResult;
use crate::locator::Locator;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// An opaque reference to a live DOM node.
///
/// Valid only until the next DOM mutation invalidates it; navigation and
/// re-renders destroy handles implicitly. The core never caches a handle
/// across a wait boundary without re-resolving.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle {
    id: String,
}

impl ElementHandle {
    /// Create a handle from a session-specific id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// The session-specific id backing this handle
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Document readiness as reported by the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    /// Document still loading
    Loading,
    /// DOM parsed, subresources may still be loading
    Interactive,
    /// Load complete
    Complete,
}

impl ReadyState {
    /// Parse the value of `document.readyState`
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "complete" => Self::Complete,
            "interactive" => Self::Interactive,
            _ => Self::Loading,
        }
    }

    /// Whether the document finished loading
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

/// One live browser session.
///
/// All methods take `&self`; implementations synchronize internally. Queries
/// report transient absence as an empty result, never as an error; staleness
/// and absence of a *handle* surface as the transient error kinds so the
/// poller can retry them.
#[async_trait]
pub trait Session: Send + Sync {
    /// Issue a navigation request. Does not wait for readiness; the
    /// navigation gate layers that on top.
    async fn navigate(&self, url: &str) -> HarnessResult<()>;

    /// Current document readiness
    async fn ready_state(&self) -> HarnessResult<ReadyState>;

    /// All elements matching the locator, in document order. Empty when
    /// nothing matches.
    async fn query(&self, locator: &Locator) -> HarnessResult<Vec<ElementHandle>>;

    /// All elements matching the locator under `root`, in document order
    async fn query_within(
        &self,
        root: &ElementHandle,
        locator: &Locator,
    ) -> HarnessResult<Vec<ElementHandle>>;

    /// Scroll the element to the viewport center, then click it at the
    /// element level (never a coordinate-based pointer event).
    async fn click(&self, element: &ElementHandle) -> HarnessResult<()>;

    /// Clear the element's value, then type `text` through the native input
    /// pipeline so browser-native input events fire.
    async fn clear_and_type(&self, element: &ElementHandle, text: &str) -> HarnessResult<()>;

    /// Assign the element's value directly and synthesize `input`/`change`
    /// notifications.
    async fn set_value(&self, element: &ElementHandle, value: &str) -> HarnessResult<()>;

    /// The element's current value property
    async fn value(&self, element: &ElementHandle) -> HarnessResult<String>;

    /// The element's text content (untrimmed)
    async fn text(&self, element: &ElementHandle) -> HarnessResult<String>;

    /// Attach a local file to a file input element
    async fn attach_file(&self, element: &ElementHandle, path: &Path) -> HarnessResult<()>;

    /// Shut the session down. Idempotent best effort; scenario teardown
    /// ignores failures here.
    async fn close(&self) -> HarnessResult<()>;
}
