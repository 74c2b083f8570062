/*!
 * Alignment of an original track with its translated track.
 *
 * Two strategies exist:
 * - Positional: entry i of the original pairs with entry i of the translation.
 *   Translations are commonly re-timed independently but keep the narrative
 *   order, so this is the default whenever the entry counts agree.
 * - Overlap: when counts differ, each original entry is paired with the
 *   translated entry whose time interval overlaps it the most. A translated
 *   entry is claimed by at most one original, so no text is duplicated.
 *
 * Entries without a partner are kept as single-sided pairs; nothing is dropped.
 */

use std::cmp::Reverse;
use std::fmt;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::errors::AlignmentError;
use crate::subtitle_processor::{SubtitleEntry, SubtitleTrack};

/// Requested alignment strategy
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AlignmentStrategy {
    /// Positional when counts match, overlap otherwise
    #[default]
    Auto,
    /// Positional only; differing counts are an error
    Positional,
    /// Always align by time overlap
    Overlap,
}

/// Which translated entry wins when two overlap an original equally
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    #[default]
    EarlierStart,
    LaterStart,
}

/// Tuning of the time-overlap strategy
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct OverlapPolicy {
    /// Overlaps of this many milliseconds or fewer do not pair entries
    #[serde(default)]
    pub min_overlap_ms: u64,
    /// Preference between equally overlapping translations
    #[serde(default)]
    pub tie_break: TieBreak,
}

/// Strategy that actually produced an alignment
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AppliedStrategy {
    Positional,
    Overlap,
}

impl fmt::Display for AppliedStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Positional => write!(f, "positional"),
            Self::Overlap => write!(f, "time overlap"),
        }
    }
}

/// One aligned position. Both sides absent is not representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignedPair<'a> {
    Matched {
        original: &'a SubtitleEntry,
        translated: &'a SubtitleEntry,
    },
    OriginalOnly(&'a SubtitleEntry),
    TranslatedOnly(&'a SubtitleEntry),
}

impl<'a> AlignedPair<'a> {
    pub fn original(&self) -> Option<&'a SubtitleEntry> {
        match *self {
            Self::Matched { original, .. } | Self::OriginalOnly(original) => Some(original),
            Self::TranslatedOnly(_) => None,
        }
    }

    pub fn translated(&self) -> Option<&'a SubtitleEntry> {
        match *self {
            Self::Matched { translated, .. } | Self::TranslatedOnly(translated) => Some(translated),
            Self::OriginalOnly(_) => None,
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }

    /// Entry whose timing the output uses: the original when present
    pub fn timing_source(&self) -> &'a SubtitleEntry {
        match *self {
            Self::Matched { original, .. } | Self::OriginalOnly(original) => original,
            Self::TranslatedOnly(translated) => translated,
        }
    }

    pub fn canonical_start_ms(&self) -> u64 {
        self.timing_source().start_time_ms
    }
}

/// Aligned pairs plus diagnostics
#[derive(Debug, Clone)]
pub struct Alignment<'a> {
    /// Pairs in non-decreasing canonical start order
    pub pairs: Vec<AlignedPair<'a>>,
    pub strategy: AppliedStrategy,
    pub matched: usize,
    pub unmatched_original: usize,
    pub unmatched_translated: usize,
    /// Positional partners whose written indices disagree
    pub index_mismatches: usize,
}

/// Align an original track with a translated track using the default overlap policy
pub fn align<'a>(
    original: &'a SubtitleTrack,
    translated: &'a SubtitleTrack,
    strategy: AlignmentStrategy,
) -> Result<Alignment<'a>, AlignmentError> {
    align_with_policy(original, translated, strategy, &OverlapPolicy::default())
}

/// Align an original track with a translated track
pub fn align_with_policy<'a>(
    original: &'a SubtitleTrack,
    translated: &'a SubtitleTrack,
    strategy: AlignmentStrategy,
    policy: &OverlapPolicy,
) -> Result<Alignment<'a>, AlignmentError> {
    let same_count = original.len() == translated.len();

    let applied = match (strategy, same_count) {
        (AlignmentStrategy::Positional, false) => {
            return Err(AlignmentError::CountMismatch {
                original: original.len(),
                translated: translated.len(),
            });
        }
        (AlignmentStrategy::Positional, true) | (AlignmentStrategy::Auto, true) => AppliedStrategy::Positional,
        (AlignmentStrategy::Overlap, _) => AppliedStrategy::Overlap,
        (AlignmentStrategy::Auto, false) => {
            warn!(
                "Entry count mismatch (original {}, translated {}), aligning by time overlap",
                original.len(),
                translated.len()
            );
            AppliedStrategy::Overlap
        }
    };

    let (mut pairs, index_mismatches) = match applied {
        AppliedStrategy::Positional => align_by_position(&original.entries, &translated.entries),
        AppliedStrategy::Overlap => (align_by_overlap(&original.entries, &translated.entries, policy), 0),
    };

    // Stable: equal starts keep original-before-translated and file order
    pairs.sort_by_key(|pair| pair.canonical_start_ms());

    let matched = pairs.iter().filter(|p| p.is_matched()).count();
    let unmatched_original = pairs.iter().filter(|p| matches!(p, AlignedPair::OriginalOnly(_))).count();
    let unmatched_translated = pairs.iter().filter(|p| matches!(p, AlignedPair::TranslatedOnly(_))).count();

    if index_mismatches > 0 {
        debug!("{} positional pairs carry different indices", index_mismatches);
    }
    info!(
        "Aligned by {}: {} matched, {} original-only, {} translated-only",
        applied, matched, unmatched_original, unmatched_translated
    );

    Ok(Alignment {
        pairs,
        strategy: applied,
        matched,
        unmatched_original,
        unmatched_translated,
        index_mismatches,
    })
}

fn align_by_position<'a>(
    original: &'a [SubtitleEntry],
    translated: &'a [SubtitleEntry],
) -> (Vec<AlignedPair<'a>>, usize) {
    let mut index_mismatches = 0;
    let pairs = original
        .iter()
        .zip(translated)
        .map(|(original, translated)| {
            if original.seq_num != translated.seq_num {
                index_mismatches += 1;
            }
            AlignedPair::Matched { original, translated }
        })
        .collect();
    (pairs, index_mismatches)
}

/// Greedy maximum-overlap matching.
///
/// Candidate (original, translated) pairs overlapping by more than
/// `min_overlap_ms` are visited by decreasing overlap, then translated start
/// (earlier or later first per `tie_break`), then file position. A candidate
/// is taken when neither side is claimed yet.
fn align_by_overlap<'a>(
    original: &'a [SubtitleEntry],
    translated: &'a [SubtitleEntry],
    policy: &OverlapPolicy,
) -> Vec<AlignedPair<'a>> {
    let mut candidates: Vec<(u64, u64, usize, usize)> = Vec::new();
    for (i, orig) in original.iter().enumerate() {
        for (j, trans) in translated.iter().enumerate() {
            let overlap = orig.overlap_ms(trans);
            if overlap > policy.min_overlap_ms {
                candidates.push((overlap, trans.start_time_ms, j, i));
            }
        }
    }
    match policy.tie_break {
        TieBreak::EarlierStart => {
            candidates.sort_by_key(|&(overlap, start, j, i)| (Reverse(overlap), start, j, i))
        }
        TieBreak::LaterStart => {
            candidates.sort_by_key(|&(overlap, start, j, i)| (Reverse(overlap), Reverse(start), j, i))
        }
    }

    let mut partner_of_original: Vec<Option<usize>> = vec![None; original.len()];
    let mut claimed: Vec<bool> = vec![false; translated.len()];
    for (_, _, j, i) in candidates {
        if partner_of_original[i].is_none() && !claimed[j] {
            partner_of_original[i] = Some(j);
            claimed[j] = true;
        }
    }

    let mut pairs: Vec<AlignedPair<'a>> = original
        .iter()
        .zip(&partner_of_original)
        .map(|(orig, partner)| match partner {
            Some(j) => AlignedPair::Matched {
                original: orig,
                translated: &translated[*j],
            },
            None => AlignedPair::OriginalOnly(orig),
        })
        .collect();

    pairs.extend(
        translated
            .iter()
            .zip(&claimed)
            .filter(|(_, claimed)| !**claimed)
            .map(|(trans, _)| AlignedPair::TranslatedOnly(trans)),
    );

    pairs
}
