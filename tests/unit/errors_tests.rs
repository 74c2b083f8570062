/*!
 * Tests for error types and failure kinds
 */

use std::io;
use std::path::PathBuf;

use dualsub::errors::{AlignmentError, AppError, SubtitleError};

#[test]
fn test_subtitleError_encoding_shouldListTriedEncodings() {
    let error = SubtitleError::Encoding {
        tried: vec!["UTF-8".to_string(), "gb18030".to_string()],
    };
    let display = format!("{}", error);
    assert!(display.contains("Could not decode"));
    assert!(display.contains("UTF-8, gb18030"));
}

#[test]
fn test_subtitleError_parse_shouldNameFirstOffendingBlock() {
    let error = SubtitleError::Parse {
        skipped: 3,
        total: 4,
        first_block: 2,
        first_line: "garbage".to_string(),
        reason: "too many unparseable blocks".to_string(),
    };
    let display = format!("{}", error);
    assert!(display.contains("3 of 4 blocks"));
    assert!(display.contains("#2"));
    assert!(display.contains("garbage"));
}

#[test]
fn test_alignmentError_countMismatch_shouldDisplayBothCounts() {
    let error = AlignmentError::CountMismatch { original: 10, translated: 8 };
    let display = format!("{}", error);
    assert!(display.contains("10"));
    assert!(display.contains("8"));
}

#[test]
fn test_appError_fromSubtitleError_shouldWrapAndClassify() {
    let write = SubtitleError::Write {
        path: PathBuf::from("/nowhere/out.srt"),
        source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
    };
    let app_error: AppError = write.into();

    assert!(matches!(app_error, AppError::Subtitle(SubtitleError::Write { .. })));
    assert_eq!(app_error.kind(), "WriteError");
    assert!(app_error.to_string().contains("out.srt"));
}

#[test]
fn test_appError_kind_withEachFailureClass_shouldUseStableNames() {
    let read = AppError::from(SubtitleError::Read {
        path: PathBuf::from("in.srt"),
        source: io::Error::new(io::ErrorKind::NotFound, "missing"),
    });
    assert_eq!(read.kind(), "ReadError");
    assert_eq!(AppError::from(SubtitleError::Encoding { tried: vec![] }).kind(), "EncodingError");
    assert_eq!(AppError::from(SubtitleError::Empty).kind(), "ParseError");
    assert_eq!(
        AppError::from(AlignmentError::CountMismatch { original: 1, translated: 2 }).kind(),
        "AlignmentError"
    );
    assert_eq!(AppError::Config("bad".to_string()).kind(), "ConfigError");
    assert_eq!(AppError::OutputExists(PathBuf::from("out.srt")).kind(), "OutputExists");
}

#[test]
fn test_appError_fromAnyhow_shouldBecomeConfigError() {
    let error: AppError = anyhow::anyhow!("threshold out of range").into();
    assert!(matches!(error, AppError::Config(ref msg) if msg.contains("threshold")));
}
