//! SRT rendering of bilingual entries.
//!
//! Output is UTF-8 without a byte-order mark, `\n` line endings, and one blank
//! line after every block.

use std::path::Path;

use crate::errors::SubtitleError;
use crate::file_utils::FileManager;
use crate::merger::BilingualEntry;

/// Render entries as SRT text
pub fn render_srt(entries: &[BilingualEntry]) -> String {
    entries.iter().map(|entry| entry.to_string()).collect()
}

/// Render entries and write them atomically to `path`. Without `overwrite`
/// an existing file at `path` is never replaced.
pub fn write_srt<P: AsRef<Path>>(entries: &[BilingualEntry], path: P, overwrite: bool) -> Result<(), SubtitleError> {
    let content = render_srt(entries);
    if overwrite {
        FileManager::write_atomic(path, &content)
    } else {
        FileManager::write_atomic_new(path, &content)
    }
}
