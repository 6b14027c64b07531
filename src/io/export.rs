//! Write the rendered report to disk.

use std::fs;
use std::path::Path;

use crate::error::AppError;

/// Write `html` to `path` as UTF-8, creating parent directories and
/// replacing any previous report.
pub fn write_report(path: &Path, html: &str) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::new(3, format!("Failed to create report directory '{}': {e}", parent.display()))
        })?;
    }

    fs::write(path, html)
        .map_err(|e| AppError::new(3, format!("Failed to write report '{}': {e}", path.display())))
}
