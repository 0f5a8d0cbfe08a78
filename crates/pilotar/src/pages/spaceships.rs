//! Page object for the Spaceships resource.

use super::{delete_confirm_button, submit_button, NAME_COLUMN};
use crate::error::HarnessResult;
use crate::harness::Harness;
use crate::locator::Locator;
use crate::session::{ElementHandle, Session};
use crate::wait::WaitPolicy;
use chrono::NaiveDateTime;
use std::path::PathBuf;

/// List page route
pub const LIST_PATH: &str = "/Spaceships";
/// Create form route
pub const CREATE_PATH: &str = "/Spaceships/Create";
/// Update form route
pub const UPDATE_PATH: &str = "/Spaceships/update";

/// Crew column in the list table, used by update-verification scenarios
pub const CREW_COLUMN: usize = 5;

/// Field values for the ship create/update form
#[derive(Debug, Clone)]
pub struct ShipForm {
    /// Display name, column 2 in the list table
    pub name: String,
    /// Classification text
    pub classification: String,
    /// Build timestamp, delivered to a `datetime-local` control
    pub built_date: NaiveDateTime,
    /// Crew size
    pub crew: u32,
    /// Engine power
    pub engine_power: u32,
    /// Optional image to attach to the upload field
    pub image: Option<PathBuf>,
}

impl ShipForm {
    /// A form with the given display name and zeroed numeric fields
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            classification: String::new(),
            built_date: NaiveDateTime::default(),
            crew: 0,
            engine_power: 0,
            image: None,
        }
    }

    /// Set the classification
    #[must_use]
    pub fn classification(mut self, classification: impl Into<String>) -> Self {
        self.classification = classification.into();
        self
    }

    /// Set the build timestamp
    #[must_use]
    pub const fn built(mut self, built_date: NaiveDateTime) -> Self {
        self.built_date = built_date;
        self
    }

    /// Set the crew size
    #[must_use]
    pub const fn crew(mut self, crew: u32) -> Self {
        self.crew = crew;
        self
    }

    /// Set the engine power
    #[must_use]
    pub const fn engine_power(mut self, engine_power: u32) -> Self {
        self.engine_power = engine_power;
        self
    }

    /// Attach an image on submission
    #[must_use]
    pub fn image(mut self, path: impl Into<PathBuf>) -> Self {
        self.image = Some(path.into());
        self
    }
}

/// Scenario-facing operations on the Spaceships pages
#[derive(Debug)]
pub struct SpaceshipsPage<'a, S: Session> {
    harness: &'a Harness<S>,
}

impl<'a, S: Session> SpaceshipsPage<'a, S> {
    /// Bind the page object to a harness
    #[must_use]
    pub const fn new(harness: &'a Harness<S>) -> Self {
        Self { harness }
    }

    /// Open the list page
    pub async fn open(&self) -> HarnessResult<()> {
        self.harness.goto(LIST_PATH).await
    }

    /// Open the create form
    pub async fn open_create(&self) -> HarnessResult<()> {
        self.harness.goto(CREATE_PATH).await
    }

    /// Open the update form route
    pub async fn open_update(&self) -> HarnessResult<()> {
        self.harness.goto(UPDATE_PATH).await
    }

    /// Rows currently in the list table. Immediate.
    pub async fn row_count(&self) -> HarnessResult<usize> {
        self.harness.row_count(&super::data_rows()).await
    }

    /// Whether a row for `name` currently exists. Immediate.
    pub async fn row_exists(&self, name: &str) -> HarnessResult<bool> {
        self.harness.row_exists(&super::data_rows(), name).await
    }

    /// Wait for the row for `name` under the slow policy; list refresh after
    /// a mutation includes a server round-trip and upload processing.
    pub async fn expect_row(&self, name: &str) -> HarnessResult<ElementHandle> {
        self.harness
            .find_row_by_cell_text(&super::data_rows(), name, &WaitPolicy::slow())
            .await
    }

    /// Display name of a row
    pub async fn name_of(&self, row: &ElementHandle) -> HarnessResult<String> {
        self.harness.cell_text(row, NAME_COLUMN).await
    }

    /// Crew value of a row
    pub async fn crew_of(&self, row: &ElementHandle) -> HarnessResult<String> {
        self.harness.cell_text(row, CREW_COLUMN).await
    }

    /// Fill the currently open form from `form` and leave it unsubmitted
    pub async fn fill_form(&self, form: &ShipForm) -> HarnessResult<()> {
        self.harness.fill(&Locator::id("Name"), &form.name).await?;
        self.harness
            .fill(&Locator::id("Classification"), &form.classification)
            .await?;
        self.harness
            .set_datetime(&Locator::id("BuiltDate"), form.built_date)
            .await?;
        self.harness
            .fill(&Locator::id("Crew"), &form.crew.to_string())
            .await?;
        self.harness
            .fill(&Locator::id("EnginePower"), &form.engine_power.to_string())
            .await?;
        if let Some(ref image) = form.image {
            self.harness
                .attach_file(&Locator::id("imageFiles"), image)
                .await?;
        }
        Ok(())
    }

    /// Submit the currently open form and wait for the resulting page
    pub async fn submit(&self) -> HarnessResult<()> {
        self.harness.click(&submit_button()).await?;
        self.harness.await_document_ready().await
    }

    /// Create a ship: open the form, fill it, submit
    pub async fn create(&self, form: &ShipForm) -> HarnessResult<()> {
        self.open_create().await?;
        self.fill_form(form).await?;
        self.submit().await
    }

    /// Probe numeric validation: open the create form, push a raw literal
    /// into the crew field, submit, and report the field's rendered value
    /// afterwards.
    pub async fn attempt_crew_literal(&self, name: &str, literal: &str) -> HarnessResult<String> {
        self.open_create().await?;
        self.harness.fill(&Locator::id("Name"), name).await?;
        self.harness
            .set_raw_value(&Locator::id("Crew"), literal)
            .await?;
        self.harness.click(&submit_button()).await?;
        self.harness.await_document_ready().await?;
        self.harness.read_value(&Locator::id("Crew")).await
    }

    /// Probe numeric validation on the update path: open the ship's update
    /// form through its row's Update link, push a raw literal into the crew
    /// field, submit, and report the field's rendered value afterwards.
    pub async fn attempt_crew_literal_update(
        &self,
        name: &str,
        literal: &str,
    ) -> HarnessResult<String> {
        self.open_row_action(name, "Update").await?;
        self.harness
            .set_raw_value(&Locator::id("Crew"), literal)
            .await?;
        self.harness.click(&submit_button()).await?;
        self.harness.await_document_ready().await?;
        self.harness.read_value(&Locator::id("Crew")).await
    }

    /// Update the crew of the ship named `name` through its row's Update
    /// link, then wait for the list to show the new value.
    pub async fn update_crew(&self, name: &str, crew: u32) -> HarnessResult<()> {
        self.open_row_action(name, "Update").await?;
        self.harness
            .fill(&Locator::id("Crew"), &crew.to_string())
            .await?;
        self.submit().await
    }

    /// Delete the ship named `name`, confirming through the distinguishing
    /// control, and wait for its row to disappear.
    pub async fn delete(&self, name: &str) -> HarnessResult<()> {
        self.open_row_action(name, "Delete").await?;
        self.harness.click(&delete_confirm_button()).await?;
        self.harness.await_document_ready().await?;
        self.harness
            .wait_row_absent(&super::data_rows(), name, &WaitPolicy::slow())
            .await
    }

    /// Open the list, locate the row for `name`, and follow one of its
    /// action links.
    async fn open_row_action(&self, name: &str, action: &str) -> HarnessResult<()> {
        self.open().await?;
        let row = self.expect_row(name).await?;
        let link = self
            .harness
            .find_in(&row, &Locator::link_text(action), &self.harness.default_policy())
            .await?;
        self.harness.click_element(&link).await?;
        self.harness.await_document_ready().await
    }
}
