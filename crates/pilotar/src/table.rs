//! Table and row verification.
//!
//! Two distinct temporal contracts live here. Counting and existence checks
//! answer about the *current* document and never wait: zero rows is a valid
//! answer, not a pending one. Finding a row that a just-performed mutation is
//! expected to produce waits under a policy, because the row list refreshes
//! asynchronously after create/update/delete round-trips.

use crate::error::HarnessResult;
use crate::harness::Harness;
use crate::locator::Locator;
use crate::session::{ElementHandle, Session};
use crate::wait::{poll_until, Poll, WaitPolicy};

/// Default locator for data rows: body rows only, header excluded
#[must_use]
pub fn data_rows() -> Locator {
    Locator::css("table tbody tr")
}

/// Collapse runs of whitespace to single spaces and trim. Cell comparisons
/// always go through this so markup indentation never affects matching.
#[must_use]
pub fn normalize_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl<S: Session> Harness<S> {
    /// Number of rows currently matching `rows`. Immediate; never waits.
    pub async fn row_count(&self, rows: &Locator) -> HarnessResult<usize> {
        Ok(self.find_all(rows).await?.len())
    }

    /// Whether any current row has a cell whose normalized text equals
    /// `cell_text` exactly. Immediate; never waits. Absence is `false`,
    /// not an error.
    pub async fn row_exists(&self, rows: &Locator, cell_text: &str) -> HarnessResult<bool> {
        Ok(self.locate_row(rows, cell_text).await?.is_some())
    }

    /// Wait for a row with a cell whose normalized text equals `cell_text`
    /// exactly, returning the first such row in document order.
    ///
    /// For asserting the outcome of a mutation: the row list behind a
    /// create/update refreshes after a server round-trip, so this polls.
    ///
    /// # Errors
    ///
    /// [`crate::HarnessError::Timeout`] if no matching row appears.
    pub async fn find_row_by_cell_text(
        &self,
        rows: &Locator,
        cell_text: &str,
        policy: &WaitPolicy,
    ) -> HarnessResult<ElementHandle> {
        let description = format!("row with cell {cell_text:?}");
        poll_until(policy, &description, || {
            let this = self;
            async move {
                Ok(match this.locate_row(rows, cell_text).await? {
                    Some(row) => Poll::Ready(row),
                    None => Poll::Pending,
                })
            }
        })
        .await
    }

    /// Wait for every row with a matching cell to be gone. The post-delete
    /// counterpart of [`Self::find_row_by_cell_text`].
    pub async fn wait_row_absent(
        &self,
        rows: &Locator,
        cell_text: &str,
        policy: &WaitPolicy,
    ) -> HarnessResult<()> {
        let description = format!("absence of row with cell {cell_text:?}");
        poll_until(policy, &description, || {
            let this = self;
            async move {
                Ok(if this.locate_row(rows, cell_text).await?.is_none() {
                    Poll::Ready(())
                } else {
                    Poll::Pending
                })
            }
        })
        .await
    }

    /// Normalized text of the 1-based `column`th cell of `row`.
    ///
    /// # Errors
    ///
    /// [`crate::HarnessError::ElementNotFound`] if the row has fewer cells.
    pub async fn cell_text(&self, row: &ElementHandle, column: usize) -> HarnessResult<String> {
        let cells = self.find_all_in(row, &Locator::tag("td")).await?;
        let cell = cells.get(column.saturating_sub(1)).ok_or_else(|| {
            crate::HarnessError::ElementNotFound {
                locator: format!("td #{column} in row {row}"),
            }
        })?;
        Ok(normalize_text(&self.session().text(cell).await?))
    }

    /// Normalized text of every cell in `row`, in column order.
    pub async fn row_snapshot(&self, row: &ElementHandle) -> HarnessResult<Vec<String>> {
        let cells = self.find_all_in(row, &Locator::tag("td")).await?;
        let mut snapshot = Vec::with_capacity(cells.len());
        for cell in &cells {
            snapshot.push(normalize_text(&self.session().text(cell).await?));
        }
        Ok(snapshot)
    }

    /// One non-waiting scan for a row with an exactly matching cell.
    async fn locate_row(
        &self,
        rows: &Locator,
        cell_text: &str,
    ) -> HarnessResult<Option<ElementHandle>> {
        let wanted = normalize_text(cell_text);
        for row in self.find_all(rows).await? {
            for cell in self.find_all_in(&row, &Locator::tag("td")).await? {
                if normalize_text(&self.session().text(&cell).await?) == wanted {
                    return Ok(Some(row));
                }
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HarnessConfig;
    use crate::error::HarnessError;
    use crate::mock::{MockElement, MockSession};
    use std::time::Duration;

    fn harness(session: MockSession) -> Harness<MockSession> {
        Harness::new(session, HarnessConfig::default())
    }

    fn fast_policy() -> WaitPolicy {
        WaitPolicy::default()
            .with_timeout(Duration::from_millis(300))
            .with_poll_interval(Duration::from_millis(10))
    }

    /// Seed a two-column row and return its session id.
    fn seed_row(session: &MockSession, cells: &[&str]) -> u64 {
        let row = session.add(MockElement::new("tr"));
        for cell in cells {
            session.add(MockElement::new("td").text(*cell).child_of(row));
        }
        row
    }

    #[test]
    fn test_normalize_text_collapses_whitespace() {
        assert_eq!(normalize_text("  TEST_SHIP_01  "), "TEST_SHIP_01");
        assert_eq!(normalize_text("Group\n\t  A"), "Group A");
        assert_eq!(normalize_text(""), "");
    }

    #[tokio::test]
    async fn test_row_count_is_immediate() {
        let session = MockSession::new();
        seed_row(&session, &["TEST_SHIP_01", "Explorer"]);
        seed_row(&session, &["TEST_SHIP_02", "Freighter"]);
        let harness = harness(session);

        assert_eq!(harness.row_count(&Locator::tag("tr")).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_row_count_zero_is_ok() {
        let harness = harness(MockSession::new());
        assert_eq!(harness.row_count(&Locator::tag("tr")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_row_exists_exact_normalized_match() {
        let session = MockSession::new();
        seed_row(&session, &["  TEST_SHIP_01 ", "Explorer"]);
        let harness = harness(session);

        let rows = Locator::tag("tr");
        assert!(harness.row_exists(&rows, "TEST_SHIP_01").await.unwrap());
        // Substrings must not match.
        assert!(!harness.row_exists(&rows, "TEST_SHIP").await.unwrap());
        assert!(!harness.row_exists(&rows, "TEST_SHIP_02").await.unwrap());
    }

    #[tokio::test]
    async fn test_find_row_waits_for_refresh() {
        let session = MockSession::new();
        let row = session.add(MockElement::new("tr").appears_in(Duration::from_millis(60)));
        session.add(
            MockElement::new("td")
                .text("TEST_SHIP_01")
                .child_of(row)
                .appears_in(Duration::from_millis(60)),
        );
        let harness = harness(session);

        let found = harness
            .find_row_by_cell_text(&Locator::tag("tr"), "TEST_SHIP_01", &fast_policy())
            .await
            .unwrap();
        assert_eq!(
            harness.cell_text(&found, 1).await.unwrap(),
            "TEST_SHIP_01"
        );
    }

    #[tokio::test]
    async fn test_find_row_times_out_when_never_appears() {
        let session = MockSession::new();
        seed_row(&session, &["OTHER", "Explorer"]);
        let harness = harness(session);

        let result = harness
            .find_row_by_cell_text(&Locator::tag("tr"), "TEST_SHIP_01", &fast_policy())
            .await;
        assert!(matches!(result, Err(HarnessError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_find_row_first_match_wins() {
        let session = MockSession::new();
        let first = seed_row(&session, &["DUP", "first"]);
        seed_row(&session, &["DUP", "second"]);
        let harness = harness(session);

        let found = harness
            .find_row_by_cell_text(&Locator::tag("tr"), "DUP", &fast_policy())
            .await
            .unwrap();
        assert_eq!(harness.cell_text(&found, 2).await.unwrap(), "first");
        let _ = first;
    }

    #[tokio::test]
    async fn test_wait_row_absent_after_removal() {
        let session = MockSession::new();
        let row = seed_row(&session, &["DOOMED", "Explorer"]);
        let button = session.add(MockElement::new("a").text("Delete"));
        session.on_click(button, move |dom| {
            dom.remove_subtree(row);
        });
        let harness = harness(session);

        harness.click(&Locator::link_text("Delete")).await.unwrap();
        harness
            .wait_row_absent(&Locator::tag("tr"), "DOOMED", &fast_policy())
            .await
            .unwrap();
        assert!(!harness.row_exists(&Locator::tag("tr"), "DOOMED").await.unwrap());
    }

    #[tokio::test]
    async fn test_cell_text_one_based_columns() {
        let session = MockSession::new();
        seed_row(&session, &["TEST_SHIP_01", "Explorer", "2025-02-01", "", "5"]);
        let harness = harness(session);

        let row = harness
            .find_row_by_cell_text(&Locator::tag("tr"), "TEST_SHIP_01", &fast_policy())
            .await
            .unwrap();
        assert_eq!(harness.cell_text(&row, 1).await.unwrap(), "TEST_SHIP_01");
        assert_eq!(harness.cell_text(&row, 2).await.unwrap(), "Explorer");
        assert_eq!(harness.cell_text(&row, 5).await.unwrap(), "5");
    }

    #[tokio::test]
    async fn test_cell_text_out_of_range_is_not_found() {
        let session = MockSession::new();
        seed_row(&session, &["A", "B"]);
        let harness = harness(session);

        let row = harness
            .find_row_by_cell_text(&Locator::tag("tr"), "A", &fast_policy())
            .await
            .unwrap();
        let result = harness.cell_text(&row, 9).await;
        assert!(matches!(result, Err(HarnessError::ElementNotFound { .. })));
    }

    #[tokio::test]
    async fn test_row_snapshot_orders_cells() {
        let session = MockSession::new();
        seed_row(&session, &["Sunshine", " 12 ", "Ms. Reyes"]);
        let harness = harness(session);

        let row = harness
            .find_row_by_cell_text(&Locator::tag("tr"), "Sunshine", &fast_policy())
            .await
            .unwrap();
        assert_eq!(
            harness.row_snapshot(&row).await.unwrap(),
            vec!["Sunshine", "12", "Ms. Reyes"]
        );
    }
}
