//! Page object for the Kindergarten groups resource.

use super::{delete_confirm_button, submit_button, NAME_COLUMN};
use crate::error::HarnessResult;
use crate::harness::Harness;
use crate::locator::Locator;
use crate::session::{ElementHandle, Session};
use crate::wait::WaitPolicy;

/// List page route
pub const LIST_PATH: &str = "/Kindergarten";
/// Create form route
pub const CREATE_PATH: &str = "/Kindergarten/Create";
/// Update form route
pub const UPDATE_PATH: &str = "/Kindergarten/update";

/// Children-count column in the list table, used by update-verification
/// scenarios
pub const CHILDREN_COLUMN: usize = 4;

/// Field values for the group create/update form
#[derive(Debug, Clone)]
pub struct GroupForm {
    /// Group display name, column 2 in the list table
    pub group_name: String,
    /// Name of the kindergarten the group belongs to
    pub kindergarten_name: String,
    /// Number of children
    pub children_count: u32,
    /// Teacher's name
    pub teacher_name: String,
}

impl GroupForm {
    /// A form with the given group name and remaining fields empty
    #[must_use]
    pub fn named(group_name: impl Into<String>) -> Self {
        Self {
            group_name: group_name.into(),
            kindergarten_name: String::new(),
            children_count: 0,
            teacher_name: String::new(),
        }
    }

    /// Set the kindergarten name
    #[must_use]
    pub fn kindergarten(mut self, name: impl Into<String>) -> Self {
        self.kindergarten_name = name.into();
        self
    }

    /// Set the children count
    #[must_use]
    pub const fn children(mut self, count: u32) -> Self {
        self.children_count = count;
        self
    }

    /// Set the teacher's name
    #[must_use]
    pub fn teacher(mut self, name: impl Into<String>) -> Self {
        self.teacher_name = name.into();
        self
    }
}

/// Scenario-facing operations on the Kindergarten pages
#[derive(Debug)]
pub struct KindergartenPage<'a, S: Session> {
    harness: &'a Harness<S>,
}

impl<'a, S: Session> KindergartenPage<'a, S> {
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

    /// Whether a row for `group_name` currently exists. Immediate.
    pub async fn row_exists(&self, group_name: &str) -> HarnessResult<bool> {
        self.harness.row_exists(&super::data_rows(), group_name).await
    }

    /// Wait for the row for `group_name` under the slow policy
    pub async fn expect_row(&self, group_name: &str) -> HarnessResult<ElementHandle> {
        self.harness
            .find_row_by_cell_text(&super::data_rows(), group_name, &WaitPolicy::slow())
            .await
    }

    /// Group display name of a row
    pub async fn name_of(&self, row: &ElementHandle) -> HarnessResult<String> {
        self.harness.cell_text(row, NAME_COLUMN).await
    }

    /// Children count of a row
    pub async fn children_of(&self, row: &ElementHandle) -> HarnessResult<String> {
        self.harness.cell_text(row, CHILDREN_COLUMN).await
    }

    /// Fill the currently open form from `form` and leave it unsubmitted
    pub async fn fill_form(&self, form: &GroupForm) -> HarnessResult<()> {
        self.harness
            .fill(&Locator::id("GroupName"), &form.group_name)
            .await?;
        self.harness
            .fill(&Locator::id("KindergartenName"), &form.kindergarten_name)
            .await?;
        self.harness
            .fill(
                &Locator::id("ChildrenCount"),
                &form.children_count.to_string(),
            )
            .await?;
        self.harness
            .fill(&Locator::id("TeacherName"), &form.teacher_name)
            .await?;
        Ok(())
    }

    /// Submit the currently open form and wait for the resulting page
    pub async fn submit(&self) -> HarnessResult<()> {
        self.harness.click(&submit_button()).await?;
        self.harness.await_document_ready().await
    }

    /// Create a group: open the form, fill it, submit
    pub async fn create(&self, form: &GroupForm) -> HarnessResult<()> {
        self.open_create().await?;
        self.fill_form(form).await?;
        self.submit().await
    }

    /// Probe numeric validation on the children-count field with a raw
    /// literal, reporting the field's rendered value after the submit
    /// attempt.
    pub async fn attempt_children_literal(
        &self,
        group_name: &str,
        literal: &str,
    ) -> HarnessResult<String> {
        self.open_create().await?;
        self.harness
            .fill(&Locator::id("GroupName"), group_name)
            .await?;
        self.harness
            .set_raw_value(&Locator::id("ChildrenCount"), literal)
            .await?;
        self.harness.click(&submit_button()).await?;
        self.harness.await_document_ready().await?;
        self.harness.read_value(&Locator::id("ChildrenCount")).await
    }

    /// Update the children count of the group named `group_name` through its
    /// row's Update link.
    pub async fn update_children(&self, group_name: &str, count: u32) -> HarnessResult<()> {
        self.open_row_action(group_name, "Update").await?;
        self.harness
            .fill(&Locator::id("ChildrenCount"), &count.to_string())
            .await?;
        self.submit().await
    }

    /// Delete the group named `group_name`, confirming through the
    /// distinguishing control, and wait for its row to disappear.
    pub async fn delete(&self, group_name: &str) -> HarnessResult<()> {
        self.open_row_action(group_name, "Delete").await?;
        self.harness.click(&delete_confirm_button()).await?;
        self.harness.await_document_ready().await?;
        self.harness
            .wait_row_absent(&super::data_rows(), group_name, &WaitPolicy::slow())
            .await
    }

    async fn open_row_action(&self, group_name: &str, action: &str) -> HarnessResult<()> {
        self.open().await?;
        let row = self.expect_row(group_name).await?;
        let link = self
            .harness
            .find_in(
                &row,
                &Locator::link_text(action),
                &self.harness.default_policy(),
            )
            .await?;
        self.harness.click_element(&link).await?;
        self.harness.await_document_ready().await
    }
}
