/*!
 * Composition of aligned pairs into bilingual entries.
 *
 * Text rule: original lines, then translated lines, one line break between the
 * two blocks. Timing rule: the original's timing when present, otherwise the
 * only side's timing. Output indices are reassigned 1..N in time order.
 */

use std::fmt;

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::aligner::AlignedPair;
use crate::subtitle_processor::write_srt_block;

// @const: Runs of whitespace, including line breaks
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

// Punctuation left dangling after removing an echoed original
const LEADING_NOISE: &[char] = &[' ', '\t', '.', ',', '!', '?', ';', ':', '"', '\'', '“', '”', '‘', '’', '-', '–', '—'];

/// Text shaping switches for the merger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOptions {
    /// Remove original text echoed at the start of (or inside) the translation
    #[serde(default)]
    pub clean_translation: bool,
    /// Join the original block onto a single line
    #[serde(default)]
    pub collapse_original: bool,
}

/// Which languages an output entry carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntrySource {
    Both,
    OriginalOnly,
    TranslatedOnly,
}

// @struct: One output caption
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BilingualEntry {
    pub index: usize,
    pub start_time_ms: u64,
    pub end_time_ms: u64,
    pub lines: Vec<String>,
    pub source: EntrySource,
}

impl BilingualEntry {
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

impl fmt::Display for BilingualEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_srt_block(f, self.index, self.start_time_ms, self.end_time_ms, &self.lines)
    }
}

/// Merger output
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    /// Entries numbered 1..N
    pub entries: Vec<BilingualEntry>,
    /// Entries whose canonical end is not after their start
    pub timing_anomalies: usize,
    /// Matched pairs whose translation only repeated the original
    pub echoed_translations: usize,
}

/// Merge aligned pairs into bilingual entries
pub fn merge(pairs: &[AlignedPair<'_>], options: &MergeOptions) -> MergeOutcome {
    let mut outcome = MergeOutcome {
        entries: Vec::with_capacity(pairs.len()),
        ..Default::default()
    };

    for (position, pair) in pairs.iter().enumerate() {
        let timing = pair.timing_source();
        if timing.has_inverted_timing() {
            warn!(
                "Entry {} has inverted timing {} --> {}",
                timing.seq_num,
                timing.format_start_time(),
                timing.format_end_time()
            );
            outcome.timing_anomalies += 1;
        }

        let original_lines = pair.original().map(|entry| {
            if options.collapse_original {
                vec![collapse_lines(&entry.lines)]
            } else {
                entry.lines.clone()
            }
        });

        let translated_lines = match (pair.translated(), pair.original()) {
            (Some(translated), Some(original)) if options.clean_translation => {
                let cleaned = strip_echoed_original(&translated.lines, &original.lines);
                if cleaned.is_empty() {
                    debug!("Translation of entry {} only repeats the original", original.seq_num);
                    outcome.echoed_translations += 1;
                    None
                } else {
                    Some(cleaned)
                }
            }
            (Some(translated), _) => Some(translated.lines.clone()),
            (None, _) => None,
        };

        let source = match (pair, &translated_lines) {
            // An echo-only translation leaves just the original text
            (AlignedPair::Matched { .. }, None) => EntrySource::OriginalOnly,
            (AlignedPair::Matched { .. }, Some(_)) => EntrySource::Both,
            (AlignedPair::OriginalOnly(_), _) => EntrySource::OriginalOnly,
            (AlignedPair::TranslatedOnly(_), _) => EntrySource::TranslatedOnly,
        };

        let lines: Vec<String> = original_lines
            .into_iter()
            .chain(translated_lines)
            .flatten()
            .collect();

        outcome.entries.push(BilingualEntry {
            index: position + 1,
            start_time_ms: timing.start_time_ms,
            end_time_ms: timing.end_time_ms,
            lines,
            source,
        });
    }

    outcome
}

/// Join lines with single spaces, collapsing whitespace runs
pub fn collapse_lines(lines: &[String]) -> String {
    WHITESPACE_RUN.replace_all(lines.join(" ").trim(), " ").into_owned()
}

/// Remove an echoed copy of the original from translated text.
///
/// Returns the translated lines untouched when no echo is found, the remainder
/// (on one line) when the original was repeated inside the translation, and an
/// empty vector when the translation is just the original again.
pub fn strip_echoed_original(translated: &[String], original: &[String]) -> Vec<String> {
    let original_flat = collapse_lines(original);
    let translated_flat = collapse_lines(translated);

    if original_flat.is_empty() {
        return translated.to_vec();
    }
    if translated_flat == original_flat {
        return Vec::new();
    }

    let remainder = if let Some(rest) = translated_flat.strip_prefix(original_flat.as_str()) {
        Some(rest.to_string())
    } else if translated_flat.contains(original_flat.as_str()) {
        Some(translated_flat.replacen(original_flat.as_str(), "", 1))
    } else {
        remainder_after_word_match(&translated_flat, &original_flat)
    };

    match remainder.map(|rest| rest.trim().trim_start_matches(LEADING_NOISE).trim().to_string()) {
        Some(rest) if !rest.is_empty() => vec![rest],
        _ => translated.to_vec(),
    }
}

/// Find the original's words, ignoring case and punctuation, inside the
/// translation and return what follows them
fn remainder_after_word_match(translated: &str, original: &str) -> Option<String> {
    let normalize = |word: &str| word.trim_matches(LEADING_NOISE).to_lowercase();
    let original_words: Vec<String> = original.split_whitespace().map(normalize).collect();
    let translated_words: Vec<&str> = translated.split_whitespace().collect();

    if original_words.is_empty() || translated_words.len() <= original_words.len() {
        return None;
    }

    (0..=translated_words.len() - original_words.len())
        .find(|&start| {
            original_words
                .iter()
                .zip(&translated_words[start..])
                .all(|(expected, actual)| *expected == normalize(*actual))
        })
        .map(|start| translated_words[start + original_words.len()..].join(" "))
        .filter(|rest| !rest.is_empty())
}
