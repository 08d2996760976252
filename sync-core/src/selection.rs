//! Save file selection.
//!
//! The save file is not a stable identifier: each cycle the directory is
//! listed and the newest file whose name starts with the configured prefix
//! and ends with [`SAVE_EXTENSION`] is used.

use std::path::PathBuf;
use std::time::SystemTime;

/// Fixed save file extension (matched case-insensitively).
pub const SAVE_EXTENSION: &str = ".sav";

/// A directory entry considered for selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveCandidate {
    /// Full path of the file.
    pub path: PathBuf,
    /// Last modification time.
    pub modified: SystemTime,
}

/// Check whether a file name matches `<prefix>*.sav`.
///
/// The prefix is matched exactly; the extension ignores case.
pub fn is_save_file(file_name: &str, prefix: &str) -> bool {
    if !file_name.starts_with(prefix) {
        return false;
    }
    let ext_len = SAVE_EXTENSION.len();
    if file_name.len() < prefix.len() + ext_len {
        return false;
    }
    file_name
        .get(file_name.len() - ext_len..)
        .is_some_and(|tail| tail.eq_ignore_ascii_case(SAVE_EXTENSION))
}

/// Pick the most recently modified candidate.
///
/// Equal timestamps are broken by the greater path so the choice does not
/// depend on directory listing order.
pub fn select_latest(candidates: impl IntoIterator<Item = SaveCandidate>) -> Option<SaveCandidate> {
    candidates.into_iter().max_by(|a, b| {
        a.modified
            .cmp(&b.modified)
            .then_with(|| a.path.cmp(&b.path))
    })
}
