//! Locator abstraction: a strategy + selector string identifying DOM nodes.
//!
//! Locators are immutable value objects created at call sites. They never
//! scope to a previously resolved handle by themselves; scoped lookups pass a
//! freshly resolved root expression at query time, so a stale root can never
//! hide inside a locator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lookup strategy for a [`Locator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    /// Match by element id attribute
    Id,
    /// Match by CSS selector
    CssSelector,
    /// Match by XPath expression
    XPath,
    /// Match anchors by exact trimmed link text
    LinkText,
    /// Match by tag name
    TagName,
}

impl Strategy {
    /// Short name used in locator descriptions and error messages
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::CssSelector => "css",
            Self::XPath => "xpath",
            Self::LinkText => "link",
            Self::TagName => "tag",
        }
    }
}

/// A strategy + selector pair identifying zero or more DOM nodes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    strategy: Strategy,
    value: String,
}

impl Locator {
    /// Locate by element id
    #[must_use]
    pub fn id(value: impl Into<String>) -> Self {
        Self {
            strategy: Strategy::Id,
            value: value.into(),
        }
    }

    /// Locate by CSS selector
    #[must_use]
    pub fn css(value: impl Into<String>) -> Self {
        Self {
            strategy: Strategy::CssSelector,
            value: value.into(),
        }
    }

    /// Locate by XPath expression
    #[must_use]
    pub fn xpath(value: impl Into<String>) -> Self {
        Self {
            strategy: Strategy::XPath,
            value: value.into(),
        }
    }

    /// Locate an anchor by exact trimmed link text
    #[must_use]
    pub fn link_text(value: impl Into<String>) -> Self {
        Self {
            strategy: Strategy::LinkText,
            value: value.into(),
        }
    }

    /// Locate by tag name
    #[must_use]
    pub fn tag(value: impl Into<String>) -> Self {
        Self {
            strategy: Strategy::TagName,
            value: value.into(),
        }
    }

    /// The lookup strategy
    #[must_use]
    pub const fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// The selector string
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Compile to a JavaScript expression producing an array of matching
    /// elements in document order, scoped to `root` (a JS expression such as
    /// `document` or a registry lookup for a live element).
    #[must_use]
    pub fn js_query_all(&self, root: &str) -> String {
        let v = js_string(&self.value);
        let body = match self.strategy {
            Strategy::Id => {
                format!("Array.from(r.querySelectorAll('[id=' + JSON.stringify({v}) + ']'))")
            }
            Strategy::CssSelector => format!("Array.from(r.querySelectorAll({v}))"),
            Strategy::TagName => format!("Array.from(r.querySelectorAll({v}))"),
            Strategy::LinkText => format!(
                "Array.from(r.querySelectorAll('a')).filter(a => a.textContent.trim() === {v})"
            ),
            Strategy::XPath => format!(
                "(() => {{ const out = []; \
                 const snap = document.evaluate({v}, r, null, \
                 XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); \
                 for (let i = 0; i < snap.snapshotLength; i++) \
                 out.push(snap.snapshotItem(i)); return out; }})()"
            ),
        };
        format!("((r) => {body})({root})")
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy.as_str(), self.value)
    }
}

/// Encode a Rust string as a JavaScript string literal.
fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}
