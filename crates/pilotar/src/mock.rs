//! In-memory session for tests.
//!
//! [`MockSession`] implements [`Session`] over a flat element store instead
//! of a browser, with just enough DOM behavior to exercise the
//! synchronization core: delayed element appearance, handle invalidation
//! through re-render epochs, and click hooks that mutate the store the way a
//! server round-trip would. Selector support is the subset the harness
//! actually emits; XPath deliberately fails fatally so propagation paths stay
//! testable.

use crate::error::{HarnessError, HarnessResult};
use crate::locator::{Locator, Strategy};
use crate::session::{ElementHandle, ReadyState, Session};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Builder for one element in the mock store
#[derive(Debug, Clone, Default)]
pub struct MockElement {
    tag: String,
    dom_id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, String)>,
    text: String,
    value: String,
    parent: Option<u64>,
    appears_in: Option<Duration>,
    reject_keys: bool,
}

impl MockElement {
    /// An element with the given tag name
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Set the `id` attribute
    #[must_use]
    pub fn dom_id(mut self, id: impl Into<String>) -> Self {
        self.dom_id = Some(id.into());
        self
    }

    /// Add a class
    #[must_use]
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// Set an arbitrary attribute
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    /// Set the text content
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set the initial value property
    #[must_use]
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Parent node in the store
    #[must_use]
    pub const fn child_of(mut self, parent: u64) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Keep the element out of query results until `delay` after insertion,
    /// simulating late rendering.
    #[must_use]
    pub const fn appears_in(mut self, delay: Duration) -> Self {
        self.appears_in = Some(delay);
        self
    }

    /// Make native typing a no-op, the way `datetime-local` controls discard
    /// synthetic keystrokes. Direct value assignment still works.
    #[must_use]
    pub const fn reject_keys(mut self) -> Self {
        self.reject_keys = true;
        self
    }
}

#[derive(Debug)]
struct Node {
    spec: MockElement,
    visible_at: Option<Instant>,
}

type ClickHook = Box<dyn FnMut(&mut MockDom) + Send>;
type NavigateHook = Box<dyn FnMut(&str, &mut MockDom) + Send>;

/// The mutable element store behind a [`MockSession`], handed to click hooks
/// so they can mutate the page the way a navigation or re-render would.
#[derive(Default)]
pub struct MockDom {
    nodes: BTreeMap<u64, Node>,
    hooks: BTreeMap<u64, ClickHook>,
    next_id: u64,
    epoch: u64,
}

impl MockDom {
    /// Insert an element, returning its node id
    pub fn add(&mut self, element: MockElement) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        let visible_at = element.appears_in.map(|delay| Instant::now() + delay);
        self.nodes.insert(
            id,
            Node {
                spec: element,
                visible_at,
            },
        );
        id
    }

    /// Register a hook to run when the node is clicked
    pub fn on_click(&mut self, id: u64, hook: impl FnMut(&mut Self) + Send + 'static) {
        self.hooks.insert(id, Box::new(hook));
    }

    /// Remove a node and everything under it, dropping their hooks
    pub fn remove_subtree(&mut self, id: u64) {
        let doomed: Vec<u64> = self
            .nodes
            .keys()
            .copied()
            .filter(|&node| node == id || self.is_descendant(node, id))
            .collect();
        for node in doomed {
            self.nodes.remove(&node);
            self.hooks.remove(&node);
        }
    }

    /// Remove every node and hook, as a full page swap would
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.hooks.clear();
    }

    /// Replace a node's text content
    pub fn set_text(&mut self, id: u64, text: impl Into<String>) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.spec.text = text.into();
        }
    }

    /// Invalidate every outstanding handle without changing the elements
    pub fn rerender(&mut self) {
        self.epoch += 1;
    }

    /// Current value property of the first element with the given `id`
    /// attribute
    #[must_use]
    pub fn value_by_dom_id(&self, dom_id: &str) -> Option<String> {
        self.nodes
            .values()
            .find(|node| node.spec.dom_id.as_deref() == Some(dom_id))
            .map(|node| node.spec.value.clone())
    }

    fn is_descendant(&self, node: u64, ancestor: u64) -> bool {
        let mut current = node;
        while let Some(parent) = self.nodes.get(&current).and_then(|n| n.spec.parent) {
            if parent == ancestor {
                return true;
            }
            current = parent;
        }
        false
    }

    fn visible(&self, id: u64) -> bool {
        self.nodes
            .get(&id)
            .is_some_and(|node| node.visible_at.map_or(true, |at| Instant::now() >= at))
    }

    fn handle(&self, id: u64) -> ElementHandle {
        ElementHandle::new(format!("{id}@{}", self.epoch))
    }

    /// Node ids currently matching the locator in insertion order, optionally
    /// restricted to descendants of `root`.
    fn query_ids(&self, locator: &Locator, root: Option<u64>) -> HarnessResult<Vec<u64>> {
        let compounds = match locator.strategy() {
            Strategy::CssSelector => parse_selector(locator.value()).ok_or_else(|| {
                HarnessError::ScriptFailure {
                    message: format!("unsupported selector: {}", locator.value()),
                }
            })?,
            Strategy::XPath => {
                return Err(HarnessError::ScriptFailure {
                    message: "XPath evaluation is not available in the mock DOM".to_string(),
                })
            }
            _ => Vec::new(),
        };

        let mut matches = Vec::new();
        for (&id, node) in &self.nodes {
            if !self.visible(id) {
                continue;
            }
            if let Some(root) = root {
                if !self.is_descendant(id, root) {
                    continue;
                }
            }
            let hit = match locator.strategy() {
                Strategy::Id => node.spec.dom_id.as_deref() == Some(locator.value()),
                Strategy::TagName => node.spec.tag == locator.value(),
                Strategy::LinkText => {
                    node.spec.tag == "a" && node.spec.text.trim() == locator.value()
                }
                Strategy::CssSelector => self.matches_chain(id, &compounds),
                Strategy::XPath => false,
            };
            if hit {
                matches.push(id);
            }
        }
        Ok(matches)
    }

    /// Descendant-combinator matching: the node matches the last compound and
    /// some ancestor chain matches the rest, in order.
    fn matches_chain(&self, id: u64, compounds: &[Compound]) -> bool {
        let Some((last, ancestors)) = compounds.split_last() else {
            return false;
        };
        if !self.matches_compound(id, last) {
            return false;
        }
        let mut remaining = ancestors;
        let mut current = id;
        while let Some(compound) = remaining.last() {
            let Some(parent) = self.nodes.get(&current).and_then(|n| n.spec.parent) else {
                return false;
            };
            if self.matches_compound(parent, compound) {
                remaining = &remaining[..remaining.len() - 1];
            }
            current = parent;
        }
        true
    }

    fn matches_compound(&self, id: u64, compound: &Compound) -> bool {
        let Some(node) = self.nodes.get(&id) else {
            return false;
        };
        let spec = &node.spec;
        if let Some(tag) = &compound.tag {
            if &spec.tag != tag {
                return false;
            }
        }
        if let Some(wanted) = &compound.id {
            if spec.dom_id.as_ref() != Some(wanted) {
                return false;
            }
        }
        for class in &compound.classes {
            if !spec.classes.contains(class) {
                return false;
            }
        }
        for (name, value) in &compound.attrs {
            let found = spec
                .attrs
                .iter()
                .any(|(n, v)| n == name && v == value);
            if !found {
                return false;
            }
        }
        true
    }
}

/// One compound selector: `tag#id.class[attr='value']`
#[derive(Debug, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, String)>,
}

/// Parse the supported selector subset: whitespace-separated compounds of
/// tag, `#id`, `.class`, and `[attr='value']`. Anything else is unsupported.
fn parse_selector(selector: &str) -> Option<Vec<Compound>> {
    let mut chain = Vec::new();
    for part in selector.split_whitespace() {
        chain.push(parse_compound(part)?);
    }
    if chain.is_empty() {
        None
    } else {
        Some(chain)
    }
}

fn parse_compound(part: &str) -> Option<Compound> {
    let mut compound = Compound::default();
    let mut rest = part;

    let tag_end = rest
        .find(|c| matches!(c, '#' | '.' | '['))
        .unwrap_or(rest.len());
    if tag_end > 0 {
        let tag = &rest[..tag_end];
        if !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return None;
        }
        compound.tag = Some(tag.to_string());
    }
    rest = &rest[tag_end..];

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix('#') {
            let end = after
                .find(|c| matches!(c, '#' | '.' | '['))
                .unwrap_or(after.len());
            compound.id = Some(after[..end].to_string());
            rest = &after[end..];
        } else if let Some(after) = rest.strip_prefix('.') {
            let end = after
                .find(|c| matches!(c, '#' | '.' | '['))
                .unwrap_or(after.len());
            compound.classes.push(after[..end].to_string());
            rest = &after[end..];
        } else if let Some(after) = rest.strip_prefix('[') {
            let end = after.find(']')?;
            let body = &after[..end];
            let (name, raw) = body.split_once('=')?;
            let value = raw
                .strip_prefix('\'')
                .and_then(|v| v.strip_suffix('\''))
                .or_else(|| raw.strip_prefix('"').and_then(|v| v.strip_suffix('"')))
                .unwrap_or(raw);
            compound.attrs.push((name.to_string(), value.to_string()));
            rest = &after[end + 1..];
        } else {
            return None;
        }
    }
    Some(compound)
}

#[derive(Default)]
struct SessionState {
    dom: MockDom,
    nav_hook: Option<NavigateHook>,
    last_url: Option<String>,
    navigated_at: Option<Instant>,
    ready_delay: Option<Duration>,
    navigation_error: Option<String>,
    closed: bool,
    fail_close: bool,
}

/// An in-memory [`Session`] over a [`MockDom`]. Cloning shares the store, so
/// a test can keep a probe handle while the harness owns the session.
#[derive(Clone, Default)]
pub struct MockSession {
    state: Arc<Mutex<SessionState>>,
}

impl MockSession {
    /// An empty session with an immediately-ready document
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().expect("mock session state poisoned")
    }

    /// Insert an element, returning its node id
    pub fn add(&self, element: MockElement) -> u64 {
        self.lock().dom.add(element)
    }

    /// Register a click hook on a node
    pub fn on_click(&self, id: u64, hook: impl FnMut(&mut MockDom) + Send + 'static) {
        self.lock().dom.on_click(id, hook);
    }

    /// Route every navigation into a DOM mutation, the way a real server
    /// renders a page per URL. The hook receives the requested URL and the
    /// store to rebuild.
    pub fn on_navigate(&self, hook: impl FnMut(&str, &mut MockDom) + Send + 'static) {
        self.lock().nav_hook = Some(Box::new(hook));
    }

    /// Invalidate every outstanding handle, as a framework re-render would
    pub fn rerender(&self) {
        self.lock().dom.rerender();
    }

    /// Mutate the store directly, outside any click
    pub fn with_dom<R>(&self, f: impl FnOnce(&mut MockDom) -> R) -> R {
        f(&mut self.lock().dom)
    }

    /// Hold the document in the loading state for `delay` after each
    /// navigation
    pub fn delay_ready(&self, delay: Duration) {
        self.lock().ready_delay = Some(delay);
    }

    /// Make every navigation request fail with the given message
    pub fn fail_navigation(&self, message: impl Into<String>) {
        self.lock().navigation_error = Some(message.into());
    }

    /// Make session shutdown report a failure
    pub fn fail_close(&self) {
        self.lock().fail_close = true;
    }

    /// The most recently requested URL
    #[must_use]
    pub fn last_url(&self) -> Option<String> {
        self.lock().last_url.clone()
    }

    /// Whether the session has been shut down
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Resolve a handle to its node id, rejecting handles from a previous
    /// epoch or for removed nodes.
    fn validate(state: &SessionState, element: &ElementHandle) -> HarnessResult<u64> {
        let (id, epoch) = element
            .id()
            .split_once('@')
            .and_then(|(id, epoch)| Some((id.parse().ok()?, epoch.parse::<u64>().ok()?)))
            .ok_or_else(|| HarnessError::ScriptFailure {
                message: format!("malformed element handle: {element}"),
            })?;
        if epoch != state.dom.epoch || !state.dom.nodes.contains_key(&id) {
            return Err(HarnessError::StaleElement {
                handle: element.id().to_string(),
            });
        }
        Ok(id)
    }
}

#[async_trait]
impl Session for MockSession {
    async fn navigate(&self, url: &str) -> HarnessResult<()> {
        let mut state = self.lock();
        if let Some(message) = state.navigation_error.clone() {
            return Err(HarnessError::SessionFailure { message });
        }
        state.last_url = Some(url.to_string());
        state.navigated_at = Some(Instant::now());
        if let Some(mut hook) = state.nav_hook.take() {
            hook(url, &mut state.dom);
            state.nav_hook = Some(hook);
        }
        Ok(())
    }

    async fn ready_state(&self) -> HarnessResult<ReadyState> {
        let state = self.lock();
        match (state.navigated_at, state.ready_delay) {
            (Some(at), Some(delay)) if at.elapsed() < delay => Ok(ReadyState::Loading),
            _ => Ok(ReadyState::Complete),
        }
    }

    async fn query(&self, locator: &Locator) -> HarnessResult<Vec<ElementHandle>> {
        let state = self.lock();
        let ids = state.dom.query_ids(locator, None)?;
        Ok(ids.into_iter().map(|id| state.dom.handle(id)).collect())
    }

    async fn query_within(
        &self,
        root: &ElementHandle,
        locator: &Locator,
    ) -> HarnessResult<Vec<ElementHandle>> {
        let state = self.lock();
        let root_id = Self::validate(&state, root)?;
        let ids = state.dom.query_ids(locator, Some(root_id))?;
        Ok(ids.into_iter().map(|id| state.dom.handle(id)).collect())
    }

    async fn click(&self, element: &ElementHandle) -> HarnessResult<()> {
        let mut state = self.lock();
        let id = Self::validate(&state, element)?;
        // Take the hook out of the store so it can mutate the store freely;
        // a hook the callback re-registered under the same id wins.
        if let Some(mut hook) = state.dom.hooks.remove(&id) {
            hook(&mut state.dom);
            state.dom.hooks.entry(id).or_insert(hook);
        }
        Ok(())
    }

    async fn clear_and_type(&self, element: &ElementHandle, text: &str) -> HarnessResult<()> {
        let mut state = self.lock();
        let id = Self::validate(&state, element)?;
        let node = state.dom.nodes.get_mut(&id).ok_or_else(|| {
            HarnessError::StaleElement {
                handle: element.id().to_string(),
            }
        })?;
        node.spec.value.clear();
        if !node.spec.reject_keys {
            node.spec.value.push_str(text);
        }
        Ok(())
    }

    async fn set_value(&self, element: &ElementHandle, value: &str) -> HarnessResult<()> {
        let mut state = self.lock();
        let id = Self::validate(&state, element)?;
        if let Some(node) = state.dom.nodes.get_mut(&id) {
            node.spec.value = value.to_string();
        }
        Ok(())
    }

    async fn value(&self, element: &ElementHandle) -> HarnessResult<String> {
        let state = self.lock();
        let id = Self::validate(&state, element)?;
        Ok(state.dom.nodes[&id].spec.value.clone())
    }

    async fn text(&self, element: &ElementHandle) -> HarnessResult<String> {
        let state = self.lock();
        let id = Self::validate(&state, element)?;
        let mut segments = Vec::new();
        let own = &state.dom.nodes[&id].spec.text;
        if !own.is_empty() {
            segments.push(own.clone());
        }
        for (&child, node) in &state.dom.nodes {
            if child != id && state.dom.is_descendant(child, id) && !node.spec.text.is_empty() {
                segments.push(node.spec.text.clone());
            }
        }
        Ok(segments.join(" "))
    }

    async fn attach_file(&self, element: &ElementHandle, path: &Path) -> HarnessResult<()> {
        let mut state = self.lock();
        let id = Self::validate(&state, element)?;
        if let Some(node) = state.dom.nodes.get_mut(&id) {
            node.spec.value = path.display().to_string();
        }
        Ok(())
    }

    async fn close(&self) -> HarnessResult<()> {
        let mut state = self.lock();
        state.closed = true;
        if state.fail_close {
            return Err(HarnessError::SessionFailure {
                message: "browser process already gone".to_string(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for MockSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("MockSession")
            .field("nodes", &state.dom.nodes.len())
            .field("epoch", &state.dom.epoch)
            .field("closed", &state.closed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod selector_tests {
        use super::*;

        #[test]
        fn test_parse_plain_tag() {
            let chain = parse_selector("td").unwrap();
            assert_eq!(chain.len(), 1);
            assert_eq!(chain[0].tag.as_deref(), Some("td"));
        }

        #[test]
        fn test_parse_descendant_chain() {
            let chain = parse_selector("table tbody tr").unwrap();
            assert_eq!(chain.len(), 3);
            assert_eq!(chain[2].tag.as_deref(), Some("tr"));
        }

        #[test]
        fn test_parse_compound_with_class_and_attr() {
            let chain = parse_selector("form input[type='submit']").unwrap();
            assert_eq!(chain[1].tag.as_deref(), Some("input"));
            assert_eq!(
                chain[1].attrs,
                vec![("type".to_string(), "submit".to_string())]
            );

            let chain = parse_selector("a.btn-danger").unwrap();
            assert_eq!(chain[0].classes, vec!["btn-danger".to_string()]);
        }

        #[test]
        fn test_unsupported_selector_rejected() {
            assert!(parse_selector("tr > td").is_none());
            assert!(parse_selector("td:first-child").is_none());
        }
    }

    mod query_tests {
        use super::*;

        #[tokio::test]
        async fn test_query_by_id() {
            let session = MockSession::new();
            session.add(MockElement::new("input").dom_id("Name"));
            session.add(MockElement::new("input").dom_id("Crew"));

            let matches = session.query(&Locator::id("Crew")).await.unwrap();
            assert_eq!(matches.len(), 1);
        }

        #[tokio::test]
        async fn test_query_css_descendant() {
            let session = MockSession::new();
            let table = session.add(MockElement::new("table"));
            let tbody = session.add(MockElement::new("tbody").child_of(table));
            session.add(MockElement::new("tr").child_of(tbody));
            // A row outside any table must not match.
            session.add(MockElement::new("tr"));

            let matches = session
                .query(&Locator::css("table tbody tr"))
                .await
                .unwrap();
            assert_eq!(matches.len(), 1);
        }

        #[tokio::test]
        async fn test_query_css_attr_and_class() {
            let session = MockSession::new();
            let form = session.add(MockElement::new("form"));
            session.add(
                MockElement::new("input")
                    .attr("type", "submit")
                    .child_of(form),
            );
            session.add(MockElement::new("input").attr("type", "text").child_of(form));
            session.add(MockElement::new("a").class("btn-danger").text("Delete"));

            let submits = session
                .query(&Locator::css("form input[type='submit']"))
                .await
                .unwrap();
            assert_eq!(submits.len(), 1);

            let dangers = session.query(&Locator::css("a.btn-danger")).await.unwrap();
            assert_eq!(dangers.len(), 1);
        }

        #[tokio::test]
        async fn test_xpath_fails_fatally() {
            let session = MockSession::new();
            let result = session.query(&Locator::xpath("//td")).await;
            assert!(matches!(
                result,
                Err(HarnessError::ScriptFailure { .. })
            ));
        }

        #[tokio::test]
        async fn test_delayed_element_hidden_until_due() {
            let session = MockSession::new();
            session.add(
                MockElement::new("td").appears_in(Duration::from_millis(80)),
            );
            assert!(session.query(&Locator::tag("td")).await.unwrap().is_empty());
            tokio::time::sleep(Duration::from_millis(100)).await;
            assert_eq!(session.query(&Locator::tag("td")).await.unwrap().len(), 1);
        }
    }

    mod staleness_tests {
        use super::*;

        #[tokio::test]
        async fn test_rerender_invalidates_handles() {
            let session = MockSession::new();
            session.add(MockElement::new("tr"));
            let handle = session.query(&Locator::tag("tr")).await.unwrap().remove(0);

            session.rerender();
            let result = session.text(&handle).await;
            assert!(matches!(result, Err(HarnessError::StaleElement { .. })));
        }

        #[tokio::test]
        async fn test_removed_node_handle_is_stale() {
            let session = MockSession::new();
            let id = session.add(MockElement::new("tr"));
            let handle = session.query(&Locator::tag("tr")).await.unwrap().remove(0);

            session.with_dom(|dom| dom.remove_subtree(id));
            let result = session.click(&handle).await;
            assert!(matches!(result, Err(HarnessError::StaleElement { .. })));
        }
    }

    mod hook_tests {
        use super::*;

        #[tokio::test]
        async fn test_click_hook_can_remove_its_own_target() {
            let session = MockSession::new();
            let button = session.add(MockElement::new("a").text("Delete"));
            session.on_click(button, move |dom| dom.remove_subtree(button));

            let handle = session
                .query(&Locator::link_text("Delete"))
                .await
                .unwrap()
                .remove(0);
            session.click(&handle).await.unwrap();
            assert!(session
                .query(&Locator::link_text("Delete"))
                .await
                .unwrap()
                .is_empty());
        }

        #[tokio::test]
        async fn test_hook_registered_by_hook_survives() {
            let session = MockSession::new();
            let first = session.add(MockElement::new("a").text("Next"));
            session.on_click(first, move |dom| {
                let second = dom.add(MockElement::new("a").text("Finish"));
                dom.on_click(second, |dom| {
                    dom.add(MockElement::new("td").text("done"));
                });
            });

            let handle = session
                .query(&Locator::link_text("Next"))
                .await
                .unwrap()
                .remove(0);
            session.click(&handle).await.unwrap();

            let finish = session
                .query(&Locator::link_text("Finish"))
                .await
                .unwrap()
                .remove(0);
            session.click(&finish).await.unwrap();
            assert_eq!(session.query(&Locator::tag("td")).await.unwrap().len(), 1);
        }
    }
}
