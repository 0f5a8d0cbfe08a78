//! Chromium-backed session over the Chrome `DevTools` Protocol.
//!
//! Element handles are entries in a page-side registry
//! (`window.__pilotar`): each query registers its matches under fresh
//! numeric ids, and every later operation looks its node up by id. A
//! navigation or re-render that disconnects the node makes the lookup report
//! staleness, which the scripts signal with a sentinel object instead of
//! throwing, so the Rust side can map it onto the transient error kinds the
//! poller understands.

use crate::config::HarnessConfig;
use crate::error::{HarnessError, HarnessResult};
use crate::locator::Locator;
use crate::session::{ElementHandle, ReadyState, Session};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::cdp::browser_protocol::input::InsertTextParams;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// What a page-side element script reports back: a payload, or a sentinel
/// naming why the node could not be operated on.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScriptOutcome<T> {
    Value {
        ok: T,
    },
    Sentinel {
        err: String,
    },
}

/// A [`Session`] driving a real chromium instance
#[derive(Debug)]
pub struct ChromiumSession {
    browser: Arc<Mutex<Browser>>,
    page: Page,
    handler: tokio::task::JoinHandle<()>,
}

impl ChromiumSession {
    /// Launch a chromium instance and open a blank page.
    ///
    /// # Errors
    ///
    /// [`HarnessError::SessionFailure`] if the browser cannot be launched or
    /// the initial page cannot be created.
    pub async fn launch(config: &HarnessConfig) -> HarnessResult<Self> {
        let mut builder = CdpConfig::builder()
            .window_size(config.viewport_width, config.viewport_height);

        if !config.headless {
            builder = builder.with_head();
        }
        if !config.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref path) = config.chromium_path {
            builder = builder.chrome_executable(path);
        }

        let cdp_config = builder.build().map_err(|e| HarnessError::SessionFailure {
            message: e.to_string(),
        })?;

        let (browser, mut handler) =
            Browser::launch(cdp_config)
                .await
                .map_err(|e| HarnessError::SessionFailure {
                    message: e.to_string(),
                })?;

        // Drive the CDP event stream until the connection drops.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page =
            browser
                .new_page("about:blank")
                .await
                .map_err(|e| HarnessError::SessionFailure {
                    message: e.to_string(),
                })?;

        tracing::debug!("chromium session launched");
        Ok(Self {
            browser: Arc::new(Mutex::new(browser)),
            page,
            handler,
        })
    }

    /// Evaluate an expression and deserialize its JSON value.
    async fn eval<T: DeserializeOwned>(&self, expression: &str) -> HarnessResult<T> {
        let params = EvaluateParams::builder()
            .expression(expression)
            .return_by_value(true)
            .build()
            .map_err(|message| HarnessError::ScriptFailure { message })?;
        let result =
            self.page
                .evaluate(params)
                .await
                .map_err(|e| HarnessError::ScriptFailure {
                    message: e.to_string(),
                })?;
        result.into_value().map_err(|e| HarnessError::ScriptFailure {
            message: e.to_string(),
        })
    }

    /// Evaluate an element operation script, mapping its sentinel onto the
    /// error kinds the poller can retry.
    async fn eval_on_element<T: DeserializeOwned>(
        &self,
        element: &ElementHandle,
        expression: &str,
    ) -> HarnessResult<T> {
        match self.eval::<ScriptOutcome<T>>(expression).await? {
            ScriptOutcome::Value { ok } => Ok(ok),
            ScriptOutcome::Sentinel { err } if err == "stale" => {
                Err(HarnessError::StaleElement {
                    handle: element.id().to_string(),
                })
            }
            ScriptOutcome::Sentinel { err } => Err(HarnessError::ScriptFailure { message: err }),
        }
    }

    fn node_id(element: &ElementHandle) -> HarnessResult<u64> {
        element
            .id()
            .parse()
            .map_err(|_| HarnessError::ScriptFailure {
                message: format!("malformed element handle: {element}"),
            })
    }

    /// Script running a locator query and registering every match, yielding
    /// the fresh registry ids.
    fn register_script(locator: &Locator, root: &str) -> String {
        let query = locator.js_query_all(root);
        format!(
            "(() => {{ \
             const reg = (window.__pilotar = window.__pilotar || \
             {{ seq: 0, nodes: new Map() }}); \
             return {query}.map((node) => {{ \
             const id = ++reg.seq; reg.nodes.set(id, node); return id; }}); \
             }})()"
        )
    }

    /// Root expression for a registry lookup, yielding the live node or a
    /// stale sentinel via the surrounding script.
    fn root_lookup(id: u64) -> String {
        format!(
            "(window.__pilotar && window.__pilotar.nodes.get({id}) && \
             window.__pilotar.nodes.get({id}).isConnected ? \
             window.__pilotar.nodes.get({id}) : null)"
        )
    }

    /// Wrap an operation body in the live-node guard. `body` sees the node as
    /// `node` and must produce the `{{ok: ...}}` payload.
    fn element_script(id: u64, body: &str) -> String {
        format!(
            "(() => {{ \
             const reg = window.__pilotar; \
             const node = reg ? reg.nodes.get({id}) : undefined; \
             if (!node || !node.isConnected) return {{ err: 'stale' }}; \
             {body} \
             }})()"
        )
    }
}

#[async_trait]
impl Session for ChromiumSession {
    async fn navigate(&self, url: &str) -> HarnessResult<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| HarnessError::NavigationFailure {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn ready_state(&self) -> HarnessResult<ReadyState> {
        let raw: String = self.eval("document.readyState").await?;
        Ok(ReadyState::parse(&raw))
    }

    async fn query(&self, locator: &Locator) -> HarnessResult<Vec<ElementHandle>> {
        let script = Self::register_script(locator, "document");
        let ids: Vec<u64> = self.eval(&script).await?;
        Ok(ids
            .into_iter()
            .map(|id| ElementHandle::new(id.to_string()))
            .collect())
    }

    async fn query_within(
        &self,
        root: &ElementHandle,
        locator: &Locator,
    ) -> HarnessResult<Vec<ElementHandle>> {
        let root_id = Self::node_id(root)?;
        let lookup = Self::root_lookup(root_id);
        let register = Self::register_script(locator, "node");
        let script = format!(
            "(() => {{ \
             const node = {lookup}; \
             if (!node) return {{ err: 'stale' }}; \
             return {{ ok: {register} }}; \
             }})()"
        );
        let ids: Vec<u64> = self.eval_on_element(root, &script).await?;
        Ok(ids
            .into_iter()
            .map(|id| ElementHandle::new(id.to_string()))
            .collect())
    }

    async fn click(&self, element: &ElementHandle) -> HarnessResult<()> {
        let id = Self::node_id(element)?;
        let script = Self::element_script(
            id,
            "node.scrollIntoView({ block: 'center', inline: 'center' }); \
             node.click(); return { ok: true };",
        );
        self.eval_on_element::<bool>(element, &script).await?;
        Ok(())
    }

    async fn clear_and_type(&self, element: &ElementHandle, text: &str) -> HarnessResult<()> {
        let id = Self::node_id(element)?;
        // Focus and empty the control first, then deliver the text through
        // the native input pipeline so the page sees real input events.
        let script = Self::element_script(
            id,
            "node.scrollIntoView({ block: 'center', inline: 'center' }); \
             node.focus(); node.value = ''; \
             node.dispatchEvent(new Event('input', { bubbles: true })); \
             return { ok: true };",
        );
        self.eval_on_element::<bool>(element, &script).await?;

        let params = InsertTextParams::builder()
            .text(text)
            .build()
            .map_err(|message| HarnessError::ScriptFailure { message })?;
        self.page
            .execute(params)
            .await
            .map_err(|e| HarnessError::ScriptFailure {
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn set_value(&self, element: &ElementHandle, value: &str) -> HarnessResult<()> {
        let id = Self::node_id(element)?;
        let literal = serde_json::to_string(value)?;
        let script = Self::element_script(
            id,
            &format!(
                "node.value = {literal}; \
                 node.dispatchEvent(new Event('input', {{ bubbles: true }})); \
                 node.dispatchEvent(new Event('change', {{ bubbles: true }})); \
                 return {{ ok: true }};"
            ),
        );
        self.eval_on_element::<bool>(element, &script).await?;
        Ok(())
    }

    async fn value(&self, element: &ElementHandle) -> HarnessResult<String> {
        let id = Self::node_id(element)?;
        let script = Self::element_script(id, "return { ok: String(node.value ?? '') };");
        self.eval_on_element(element, &script).await
    }

    async fn text(&self, element: &ElementHandle) -> HarnessResult<String> {
        let id = Self::node_id(element)?;
        let script = Self::element_script(id, "return { ok: node.textContent ?? '' };");
        self.eval_on_element(element, &script).await
    }

    async fn attach_file(&self, element: &ElementHandle, path: &Path) -> HarnessResult<()> {
        let id = Self::node_id(element)?;
        // Resolve the live node as a remote object so DOM.setFileInputFiles
        // can address it.
        let lookup = Self::root_lookup(id);
        let params = EvaluateParams::builder()
            .expression(lookup)
            .build()
            .map_err(|message| HarnessError::ScriptFailure { message })?;
        let result =
            self.page
                .evaluate(params)
                .await
                .map_err(|e| HarnessError::ScriptFailure {
                    message: e.to_string(),
                })?;
        let object_id =
            result
                .object()
                .object_id
                .clone()
                .ok_or_else(|| HarnessError::StaleElement {
                    handle: element.id().to_string(),
                })?;

        let params = SetFileInputFilesParams::builder()
            .files(vec![path.display().to_string()])
            .object_id(object_id)
            .build()
            .map_err(|message| HarnessError::ScriptFailure { message })?;
        self.page
            .execute(params)
            .await
            .map_err(|e| HarnessError::ScriptFailure {
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn close(&self) -> HarnessResult<()> {
        let mut browser = self.browser.lock().await;
        browser
            .close()
            .await
            .map_err(|e| HarnessError::SessionFailure {
                message: e.to_string(),
            })?;
        self.handler.abort();
        Ok(())
    }
}
