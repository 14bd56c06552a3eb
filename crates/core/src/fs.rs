//! Filesystem utilities

use std::path::Path;

use log::debug;

/// Check if a path points at a regular file
///
/// Used before opening the read-only database so a missing file is reported
/// as such rather than as a generic connection failure.
pub fn is_file(path: &str) -> bool {
    let found = Path::new(path).is_file();
    if !found {
        debug!("No file at: {}", path);
    }
    found
}
