/*!
 * Integration tests for the bilingual conversion workflow
 */

use std::fs;

use anyhow::Result;
use dualsub::aligner::{AlignmentStrategy, AppliedStrategy};
use dualsub::app_config::Config;
use dualsub::report::{AlignmentAnomaly, Verdict};
use dualsub::subtitle_processor::{ParseOptions, SubtitleTrack, TrackKind};
use dualsub::Controller;

use crate::common;

/// Ten originals ten seconds apart, two seconds long each
fn ten_originals() -> Vec<(usize, u64, u64, &'static str)> {
    vec![
        (1, 10_000, 12_000, "Line 1"),
        (2, 20_000, 22_000, "Line 2"),
        (3, 30_000, 32_000, "Line 3"),
        (4, 40_000, 42_000, "Line 4"),
        (5, 50_000, 52_000, "Line 5"),
        (6, 60_000, 62_000, "Line 6"),
        (7, 70_000, 72_000, "Line 7"),
        (8, 80_000, 82_000, "Line 8"),
        (9, 90_000, 92_000, "Line 9"),
        (10, 100_000, 102_000, "Line 10"),
    ]
}

/// Eight translations overlapping every original except 5 and 9
fn eight_translations() -> Vec<(usize, u64, u64, &'static str)> {
    vec![
        (1, 10_200, 12_300, "第1行"),
        (2, 20_100, 22_400, "第2行"),
        (3, 29_900, 31_800, "第3行"),
        (4, 40_300, 42_500, "第4行"),
        (5, 60_100, 62_200, "第6行"),
        (6, 70_000, 72_000, "第7行"),
        (7, 80_200, 82_100, "第8行"),
        (8, 100_100, 102_300, "第10行"),
    ]
}

/// Test the documented single-entry example end to end
#[test]
fn test_conversion_withSingleEntryPair_shouldWriteCombinedBlock() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let original = common::create_test_file(
        temp_dir.path(),
        "movie.en.srt",
        "1\n00:00:01,000 --> 00:00:03,000\nHello\n",
    )?;
    let translated = common::create_test_file(
        temp_dir.path(),
        "movie.zh.srt",
        "1\n00:00:01,200 --> 00:00:03,500\n你好\n",
    )?;

    let report = Controller::with_defaults()?.run(&original, &translated, None);

    assert!(report.is_success(), "conversion failed: {}", report);
    assert_eq!(report.exit_code(), 0);
    assert_eq!(report.output_file, temp_dir.path().join("movie.zh.bilingual.srt"));
    let output = fs::read_to_string(&report.output_file)?;
    assert_eq!(output, "1\n00:00:01,000 --> 00:00:03,000\nHello\n你好\n\n");

    Ok(())
}

/// Equal counts give one combined entry per position
#[test]
fn test_conversion_withEqualCounts_shouldPairByPosition() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let original = common::create_original_subtitle(temp_dir.path(), "original.srt")?;
    let translated = common::create_translated_subtitle(temp_dir.path(), "translated.srt")?;
    let output = temp_dir.path().join("out.srt");

    let report = Controller::with_defaults()?.run(&original, &translated, Some(&output));

    assert!(report.is_success());
    assert_eq!(report.strategy, Some(AppliedStrategy::Positional));
    assert_eq!(report.matched_pairs, 3);
    assert_eq!(report.output_entries, 3);
    assert!(report.anomalies.is_empty());

    let merged = SubtitleTrack::from_file(&output, TrackKind::Original, &ParseOptions::default())?;
    assert_eq!(merged.len(), 3);
    assert_eq!(
        merged.entries[1].lines,
        vec!["It contains multiple entries.".to_string(), "它包含多个条目。".to_string()]
    );
    // Original timing wins
    assert_eq!(merged.entries[1].start_time_ms, 5_000);
    assert_eq!(merged.entries[1].end_time_ms, 9_000);

    Ok(())
}

/// Originals without an overlapping translation survive as single-language entries
#[test]
fn test_conversion_withTenVersusEight_shouldKeepUnmatchedOriginals() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let original = common::create_test_file(temp_dir.path(), "ep.en.srt", &common::srt_content(&ten_originals()))?;
    let translated = common::create_test_file(temp_dir.path(), "ep.zh.srt", &common::srt_content(&eight_translations()))?;
    let output = temp_dir.path().join("ep.dual.srt");

    let report = Controller::with_defaults()?.run(&original, &translated, Some(&output));

    assert!(report.is_success(), "conversion failed: {}", report);
    assert_eq!(report.strategy, Some(AppliedStrategy::Overlap));
    assert_eq!(report.output_entries, 10);
    assert_eq!(report.matched_pairs, 8);
    assert_eq!(report.unmatched_original, 2);
    assert_eq!(report.unmatched_translated, 0);
    assert!(report.anomalies.contains(&AlignmentAnomaly::CountMismatch { original: 10, translated: 8 }));
    assert!(report.anomalies.contains(&AlignmentAnomaly::UnmatchedOriginal { count: 2 }));

    let merged = SubtitleTrack::from_file(&output, TrackKind::Original, &ParseOptions::default())?;
    assert_eq!(merged.len(), 10);
    assert_eq!(merged.entries[4].lines, vec!["Line 5".to_string()]);
    assert_eq!(merged.entries[8].lines, vec!["Line 9".to_string()]);
    assert_eq!(merged.entries[5].lines, vec!["Line 6".to_string(), "第6行".to_string()]);
    assert_eq!(merged.entries[9].lines, vec!["Line 10".to_string(), "第10行".to_string()]);

    let indices: Vec<usize> = merged.entries.iter().map(|e| e.seq_num).collect();
    assert_eq!(indices, (1..=10).collect::<Vec<_>>());

    Ok(())
}

/// Output start times never go backwards
#[test]
fn test_conversion_withInterleavedExtras_shouldStayMonotonic() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let original = common::create_test_file(
        temp_dir.path(),
        "a.srt",
        &common::srt_content(&[(1, 1_000, 2_000, "One"), (2, 5_000, 6_000, "Two"), (3, 9_000, 10_000, "Three")]),
    )?;
    let translated = common::create_test_file(
        temp_dir.path(),
        "b.srt",
        &common::srt_content(&[
            (1, 1_100, 2_100, "Eins"),
            (2, 3_000, 4_000, "Extra"),
            (3, 5_100, 6_100, "Zwei"),
            (4, 7_000, 8_000, "Noch mehr"),
            (5, 9_100, 10_100, "Drei"),
        ]),
    )?;
    let output = temp_dir.path().join("merged.srt");

    let report = Controller::with_defaults()?.run(&original, &translated, Some(&output));
    assert!(report.is_success());
    assert_eq!(report.unmatched_translated, 2);

    let merged = SubtitleTrack::from_file(&output, TrackKind::Original, &ParseOptions::default())?;
    assert_eq!(merged.len(), 5);
    assert!(merged.entries.windows(2).all(|w| w[0].start_time_ms <= w[1].start_time_ms));
    assert_eq!(merged.entries[1].lines, vec!["Extra".to_string()]);
    assert_eq!(merged.entries[1].start_time_ms, 3_000);

    Ok(())
}

/// Running twice on the same inputs produces identical bytes
#[test]
fn test_conversion_withRepeatedRun_shouldBeByteIdentical() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let original = common::create_test_file(temp_dir.path(), "o.srt", &common::srt_content(&ten_originals()))?;
    let translated = common::create_test_file(temp_dir.path(), "t.srt", &common::srt_content(&eight_translations()))?;
    let first_output = temp_dir.path().join("first.srt");
    let second_output = temp_dir.path().join("second.srt");

    let controller = Controller::with_defaults()?;
    assert!(controller.run(&original, &translated, Some(&first_output)).is_success());
    assert!(controller.run(&original, &translated, Some(&second_output)).is_success());

    assert_eq!(fs::read(&first_output)?, fs::read(&second_output)?);

    Ok(())
}

/// A GB18030 translated file decodes through the fallback encoding
#[test]
fn test_conversion_withGb18030Translation_shouldDecodeWithoutReplacement() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let original = common::create_original_subtitle(temp_dir.path(), "show.en.srt")?;
    let translated_text = fs::read_to_string(common::create_translated_subtitle(temp_dir.path(), "utf8.srt")?)?;
    let (encoded, _, had_errors) = encoding_rs::GB18030.encode(&translated_text);
    assert!(!had_errors);
    let translated = common::create_test_file_bytes(temp_dir.path(), "show.zh.srt", &encoded)?;

    let report = Controller::with_defaults()?.run(&original, &translated, None);

    assert!(report.is_success(), "conversion failed: {}", report);
    assert_eq!(report.translated_encoding.as_deref(), Some("gb18030"));
    let output = fs::read_to_string(&report.output_file)?;
    assert!(output.contains("这是一个测试字幕。"));
    assert!(!output.contains('\u{FFFD}'));

    Ok(())
}

/// Too many broken blocks abort the run without writing anything
#[test]
fn test_conversion_withWrongFileSupplied_shouldFailWithParseError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let original = common::create_original_subtitle(temp_dir.path(), "original.srt")?;
    let translated = common::create_test_file(
        temp_dir.path(),
        "notes.txt",
        "Shopping list\n\neggs\nmilk\n\nbread\n",
    )?;
    let output = temp_dir.path().join("out.srt");

    let report = Controller::with_defaults()?.run(&original, &translated, Some(&output));

    assert!(!report.is_success());
    assert_eq!(report.exit_code(), 1);
    assert!(matches!(report.verdict, Verdict::Failure { ref kind, .. } if kind == "ParseError"));
    assert!(!output.exists());

    Ok(())
}

/// Strict positional alignment refuses differing counts
#[test]
fn test_conversion_withStrictPositionalAndMismatch_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let original = common::create_test_file(temp_dir.path(), "o.srt", &common::srt_content(&ten_originals()))?;
    let translated = common::create_test_file(temp_dir.path(), "t.srt", &common::srt_content(&eight_translations()))?;
    let output = temp_dir.path().join("out.srt");

    let mut config = Config::default();
    config.alignment.strategy = AlignmentStrategy::Positional;
    let report = Controller::with_config(config)?.run(&original, &translated, Some(&output));

    assert!(matches!(report.verdict, Verdict::Failure { ref kind, .. } if kind == "AlignmentError"));
    assert!(!output.exists());

    Ok(())
}

/// Text shaping options clean echoed originals and join multi-line originals
#[test]
fn test_conversion_withTextShaping_shouldCleanAndCollapse() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let original = common::create_test_file(
        temp_dir.path(),
        "o.srt",
        &common::srt_content(&[(1, 1_000, 3_000, "Where are\nyou going?")]),
    )?;
    let translated = common::create_test_file(
        temp_dir.path(),
        "t.srt",
        &common::srt_content(&[(1, 1_000, 3_000, "Where are you going? 你要去哪里？")]),
    )?;
    let output = temp_dir.path().join("out.srt");

    let mut config = Config::default();
    config.merge.clean_translation = true;
    config.merge.collapse_original = true;
    let report = Controller::with_config(config)?.run(&original, &translated, Some(&output));

    assert!(report.is_success(), "conversion failed: {}", report);
    let output = fs::read_to_string(&output)?;
    assert_eq!(output, "1\n00:00:01,000 --> 00:00:03,000\nWhere are you going?\n你要去哪里？\n\n");

    Ok(())
}

/// A translation that only repeats the original is reported as single-language
#[test]
fn test_conversion_withEchoOnlyTranslation_shouldReportSingleLanguageEntry() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let original = common::create_test_file(
        temp_dir.path(),
        "o.srt",
        &common::srt_content(&[(1, 1_000, 2_000, "OK"), (2, 3_000, 4_000, "Thanks")]),
    )?;
    let translated = common::create_test_file(
        temp_dir.path(),
        "t.srt",
        &common::srt_content(&[(1, 1_000, 2_000, "OK"), (2, 3_000, 4_000, "谢谢")]),
    )?;
    let output = temp_dir.path().join("out.srt");

    let mut config = Config::default();
    config.merge.clean_translation = true;
    let report = Controller::with_config(config)?.run(&original, &translated, Some(&output));

    assert!(report.is_success(), "conversion failed: {}", report);
    assert_eq!(report.echoed_translations, 1);
    assert_eq!(report.single_language_entries(), 1);
    assert!(report.to_string().contains("only repeated the original"));
    assert!(fs::read_to_string(&output)?.starts_with("1\n00:00:01,000 --> 00:00:02,000\nOK\n\n2\n"));

    Ok(())
}

/// The JSON report carries counts and a tagged verdict
#[test]
fn test_report_toJson_withSuccessfulRun_shouldSerializeVerdict() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let original = common::create_original_subtitle(temp_dir.path(), "o.srt")?;
    let translated = common::create_translated_subtitle(temp_dir.path(), "t.srt")?;

    let report = Controller::with_defaults()?.run(&original, &translated, None);
    let json: serde_json::Value = serde_json::from_str(&report.to_json()?)?;

    assert_eq!(json["verdict"]["status"], "success");
    assert_eq!(json["strategy"], "positional");
    assert_eq!(json["output_entries"], 3);

    Ok(())
}
