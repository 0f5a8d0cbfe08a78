//! Fixture assets for upload scenarios.

use crate::error::{HarnessError, HarnessResult};
use std::path::{Path, PathBuf};

/// Directory holding fixture assets, relative to the crate root
pub const FIXTURES_DIR: &str = "fixtures";

/// Resolve a fixture asset by its path relative to the fixtures directory.
///
/// # Errors
///
/// [`HarnessError::FixtureMissing`] if the file does not exist.
pub fn asset_path(relative: impl AsRef<Path>) -> HarnessResult<PathBuf> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join(FIXTURES_DIR)
        .join(relative.as_ref());
    if path.is_file() {
        Ok(path)
    } else {
        Err(HarnessError::FixtureMissing {
            path: path.display().to_string(),
        })
    }
}
