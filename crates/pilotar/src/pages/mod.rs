//! Page objects for the application under test.
//!
//! Each resource gets a thin wrapper over the harness that knows its routes,
//! field identifiers, and table layout, so scenarios read as domain steps
//! instead of locator plumbing. The DOM contract these encode: list pages
//! render a heading plus a table whose body rows carry the display name in
//! column 2 and expose Details/Update/Delete links; forms address fields by
//! stable element ids and submit through `input[type='submit']`; the delete
//! flow confirms through a control carrying the `btn-danger` class.

use crate::locator::Locator;

pub mod kindergarten;
pub mod spaceships;

pub use kindergarten::{GroupForm, KindergartenPage};
pub use spaceships::{ShipForm, SpaceshipsPage};

/// Display-name column shared by both list tables
pub const NAME_COLUMN: usize = 2;

/// Submit control of the currently open form
#[must_use]
pub fn submit_button() -> Locator {
    Locator::css("form input[type='submit']")
}

/// Confirmation control on a delete page, distinguished by class
#[must_use]
pub fn delete_confirm_button() -> Locator {
    Locator::css("form .btn-danger")
}

/// Body rows of the resource table
#[must_use]
pub fn data_rows() -> Locator {
    crate::table::data_rows()
}
