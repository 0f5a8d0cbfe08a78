//! Pilotar: Rust-Native Browser Acceptance Testing for CRUD Web Apps
//!
//! Pilotar (Spanish: "to pilot/steer") drives end-to-end acceptance
//! scenarios against a running web application through the Chrome `DevTools`
//! Protocol, with every wait funneled through one condition-polling core.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                     PILOTAR Architecture                          │
//! ├──────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌──────────────┐    ┌────────────┐           │
//! │   │ Scenario   │    │ Harness      │    │ Headless   │           │
//! │   │ (Rust)     │───►│ poll/resolve │───►│ Browser    │           │
//! │   │            │    │ interact/nav │    │ (chromium) │           │
//! │   └────────────┘    └──────────────┘    └────────────┘           │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Scenarios acquire one fresh session each through
//! [`scenario::run_scenario`], act through the [`Harness`], and assert
//! through the table utilities; nothing in the core sleeps outside
//! [`wait::poll_until`].

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

#[cfg(feature = "browser")]
pub mod chromium;
pub mod config;
pub mod error;
pub mod fixture;
pub mod harness;
pub mod locator;
pub mod mock;
pub mod nav;
pub mod pages;
pub mod scenario;
pub mod session;
pub mod table;
pub mod wait;

mod interact;
mod resolve;

#[cfg(feature = "browser")]
pub use chromium::ChromiumSession;
pub use config::HarnessConfig;
pub use error::{ErrorKind, HarnessError, HarnessResult};
pub use harness::Harness;
pub use interact::{FillStrategy, DATETIME_LOCAL_FORMAT};
pub use locator::{Locator, Strategy};
pub use mock::{MockDom, MockElement, MockSession};
pub use pages::{GroupForm, KindergartenPage, ShipForm, SpaceshipsPage};
pub use scenario::{run_scenario, unique_name};
pub use session::{ElementHandle, ReadyState, Session};
pub use table::normalize_text;
pub use wait::{poll_until, Poll, WaitPolicy};
