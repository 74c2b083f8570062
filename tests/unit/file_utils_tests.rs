/*!
 * Tests for file utility functions
 */

use std::fs;
use std::path::Path;

use anyhow::Result;
use dualsub::file_utils::FileManager;

use crate::common;

/// Test that generate_output_path inserts the marker before the extension
#[test]
fn test_generate_output_path_withLanguageSuffix_shouldKeepIt() {
    let output_path = FileManager::generate_output_path(Path::new("/tmp/show/ep01.zh.srt"), "bilingual");
    assert_eq!(output_path, Path::new("/tmp/show/ep01.zh.bilingual.srt"));
}

#[test]
fn test_generate_output_path_withoutExtension_shouldAppendSrt() {
    let output_path = FileManager::generate_output_path(Path::new("subs/translated"), "dual");
    assert_eq!(output_path, Path::new("subs/translated.dual.srt"));
}

/// Test that write_atomic creates and replaces files
#[test]
fn test_write_atomic_withExistingFile_shouldReplaceContent() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let target = common::create_test_file(temp_dir.path(), "out.srt", "old content")?;

    FileManager::write_atomic(&target, "new content")?;

    assert_eq!(fs::read_to_string(&target)?, "new content");
    // Only the target remains, no temporary leftovers
    assert_eq!(fs::read_dir(temp_dir.path())?.count(), 1);

    Ok(())
}

#[test]
fn test_write_atomic_withMissingDirectory_shouldFailWithoutCreatingIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let target = temp_dir.path().join("missing").join("out.srt");

    let result = FileManager::write_atomic(&target, "content");

    assert!(result.is_err());
    assert!(!temp_dir.path().join("missing").exists());

    Ok(())
}
