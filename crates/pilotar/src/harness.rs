//! The harness: one session plus the layered operations every scenario uses.
//!
//! The struct itself is thin; the element resolver, interaction layer,
//! navigation gate, and table utilities are implemented as `impl` blocks in
//! their own modules, all polling through [`crate::wait`].

use crate::config::HarnessConfig;
use crate::session::Session;
use crate::wait::WaitPolicy;

/// A live session paired with harness configuration.
///
/// All operations take `&self`; a scenario body shares the harness behind an
/// `Arc` (see [`crate::scenario::run_scenario`]).
#[derive(Debug)]
pub struct Harness<S: Session> {
    session: S,
    config: HarnessConfig,
}

impl<S: Session> Harness<S> {
    /// Pair an already-acquired session with configuration
    pub fn new(session: S, config: HarnessConfig) -> Self {
        Self { session, config }
    }

    /// The underlying session
    pub fn session(&self) -> &S {
        &self.session
    }

    /// The harness configuration
    #[must_use]
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Join a route path onto the configured base origin
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        self.config.url(path)
    }

    /// The default wait policy scenarios poll with
    #[must_use]
    pub fn default_policy(&self) -> WaitPolicy {
        WaitPolicy::default()
    }

    /// Best-effort session shutdown; errors are reported, not propagated
    pub async fn close(&self) {
        if let Err(err) = self.session.close().await {
            tracing::warn!(error = %err, "session close failed during teardown");
        }
    }
}

#[cfg(feature = "browser")]
impl Harness<crate::chromium::ChromiumSession> {
    /// Launch a fresh browser session for one scenario.
    ///
    /// # Errors
    ///
    /// Returns [`crate::HarnessError::SessionFailure`] if the browser cannot
    /// be launched.
    pub async fn launch(config: HarnessConfig) -> crate::error::HarnessResult<Self> {
        let session = crate::chromium::ChromiumSession::launch(&config).await?;
        Ok(Self::new(session, config))
    }
}
