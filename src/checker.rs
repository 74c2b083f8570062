/*!
 * Compatibility check between an original and a translated track.
 *
 * Nothing is written: the check tells whether the two files already line up
 * (same count, same indices, same timings), which indices exist on one side
 * only, and whether the translated file already looks bilingual.
 */

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::subtitle_processor::{SubtitleEntry, SubtitleTrack};

/// Timing disagreement between two entries sharing an index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingMismatch {
    pub index: usize,
    pub original_start_ms: u64,
    pub original_end_ms: u64,
    pub translated_start_ms: u64,
    pub translated_end_ms: u64,
}

/// Result of comparing two tracks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub original_entries: usize,
    pub translated_entries: usize,
    /// Indices present only in the original
    pub only_in_original: Vec<usize>,
    /// Indices present only in the translation
    pub only_in_translated: Vec<usize>,
    pub timing_mismatches: Vec<TimingMismatch>,
    /// Translated entries with two or more non-empty lines
    pub bilingual_entries: usize,
}

impl CheckReport {
    pub fn counts_match(&self) -> bool {
        self.original_entries == self.translated_entries
    }

    /// Counts, indices and timings all agree
    pub fn is_perfect_match(&self) -> bool {
        self.counts_match()
            && self.only_in_original.is_empty()
            && self.only_in_translated.is_empty()
            && self.timing_mismatches.is_empty()
    }

    /// Share of translated entries that already look bilingual, in percent
    pub fn bilingual_percentage(&self) -> f64 {
        if self.translated_entries == 0 {
            return 0.0;
        }
        self.bilingual_entries as f64 * 100.0 / self.translated_entries as f64
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_perfect_match() { 0 } else { 1 }
    }
}

/// Compare two tracks by entry index
pub fn check_tracks(original: &SubtitleTrack, translated: &SubtitleTrack) -> CheckReport {
    let original_by_index = first_by_index(&original.entries);
    let translated_by_index = first_by_index(&translated.entries);

    let original_indices: BTreeSet<usize> = original_by_index.keys().copied().collect();
    let translated_indices: BTreeSet<usize> = translated_by_index.keys().copied().collect();

    let timing_mismatches = original_indices
        .intersection(&translated_indices)
        .filter_map(|index| {
            let orig = original_by_index[index];
            let trans = translated_by_index[index];
            let differs = orig.start_time_ms != trans.start_time_ms || orig.end_time_ms != trans.end_time_ms;
            differs.then(|| TimingMismatch {
                index: *index,
                original_start_ms: orig.start_time_ms,
                original_end_ms: orig.end_time_ms,
                translated_start_ms: trans.start_time_ms,
                translated_end_ms: trans.end_time_ms,
            })
        })
        .collect();

    CheckReport {
        original_entries: original.len(),
        translated_entries: translated.len(),
        only_in_original: original_indices.difference(&translated_indices).copied().collect(),
        only_in_translated: translated_indices.difference(&original_indices).copied().collect(),
        timing_mismatches,
        bilingual_entries: translated.entries.iter().filter(|e| looks_bilingual(e)).count(),
    }
}

fn first_by_index(entries: &[SubtitleEntry]) -> HashMap<usize, &SubtitleEntry> {
    let mut by_index = HashMap::with_capacity(entries.len());
    for entry in entries {
        by_index.entry(entry.seq_num).or_insert(entry);
    }
    by_index
}

fn looks_bilingual(entry: &SubtitleEntry) -> bool {
    entry.lines.iter().filter(|line| !line.trim().is_empty()).count() >= 2
}

fn join_indices(indices: &[usize]) -> String {
    indices.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(", ")
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_perfect_match() {
            writeln!(f, "✓ Perfect match: indices and timings agree ({} entries)", self.original_entries)?;
        } else {
            writeln!(f, "✗ Tracks do not match")?;
            if !self.counts_match() {
                writeln!(
                    f,
                    "  Entry counts differ: original {}, translated {}",
                    self.original_entries, self.translated_entries
                )?;
            }
        }

        if !self.only_in_translated.is_empty() {
            writeln!(f, "  Indices only in translated file: {}", join_indices(&self.only_in_translated))?;
        }
        if !self.only_in_original.is_empty() {
            writeln!(f, "  Indices missing from translated file: {}", join_indices(&self.only_in_original))?;
        }
        if !self.timing_mismatches.is_empty() {
            writeln!(f, "  Timing mismatches:")?;
            for mismatch in &self.timing_mismatches {
                writeln!(
                    f,
                    "    #{}: {} --> {} vs {} --> {}",
                    mismatch.index,
                    SubtitleEntry::format_timestamp(mismatch.original_start_ms),
                    SubtitleEntry::format_timestamp(mismatch.original_end_ms),
                    SubtitleEntry::format_timestamp(mismatch.translated_start_ms),
                    SubtitleEntry::format_timestamp(mismatch.translated_end_ms),
                )?;
            }
        }

        let percentage = self.bilingual_percentage();
        if self.bilingual_entries == 0 {
            writeln!(f, "  Translated file is single-language")
        } else if percentage > 90.0 {
            writeln!(f, "  Translated file is already bilingual ({:.1}% of entries)", percentage)
        } else {
            writeln!(
                f,
                "  {} of {} translated entries look bilingual ({:.1}%)",
                self.bilingual_entries, self.translated_entries, percentage
            )
        }
    }
}
