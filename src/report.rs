/*!
 * Conversion report.
 *
 * The report is the only thing a caller sees of a run: entry counts, alignment
 * diagnostics, the output location and a verdict. It is assembled once the run
 * is over and never changes afterwards.
 */

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::aligner::AppliedStrategy;
use crate::errors::AppError;
use crate::subtitle_processor::TrackKind;

/// Non-fatal inconsistency found during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AlignmentAnomaly {
    /// The tracks have a different number of entries
    CountMismatch { original: usize, translated: usize },
    /// Original entries emitted without a translation
    UnmatchedOriginal { count: usize },
    /// Translated entries emitted without an original
    UnmatchedTranslated { count: usize },
    /// Positional partners with different written indices
    IndexMismatch { count: usize },
    /// Output entries whose end is not after their start
    InvertedTiming { count: usize },
    /// Unparseable blocks dropped by the parser
    SkippedBlocks { track: TrackKind, count: usize },
}

impl fmt::Display for AlignmentAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CountMismatch { original, translated } => {
                write!(f, "entry count mismatch: {} original vs {} translated", original, translated)
            }
            Self::UnmatchedOriginal { count } => write!(f, "{} entries carry only the original text", count),
            Self::UnmatchedTranslated { count } => write!(f, "{} entries carry only the translated text", count),
            Self::IndexMismatch { count } => write!(f, "{} paired entries have different indices", count),
            Self::InvertedTiming { count } => write!(f, "{} entries end at or before their start", count),
            Self::SkippedBlocks { track, count } => write!(f, "{} unparseable blocks skipped in {} file", count, track),
        }
    }
}

/// Final outcome of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verdict {
    Success,
    Failure {
        /// Failure class, e.g. "ParseError"
        kind: String,
        /// Human-readable cause
        cause: String,
    },
}

/// Summary of one conversion run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionReport {
    pub original_file: PathBuf,
    pub translated_file: PathBuf,
    pub output_file: PathBuf,
    pub original_entries: usize,
    pub translated_entries: usize,
    pub original_encoding: Option<String>,
    pub translated_encoding: Option<String>,
    pub strategy: Option<AppliedStrategy>,
    pub matched_pairs: usize,
    pub unmatched_original: usize,
    pub unmatched_translated: usize,
    pub echoed_translations: usize,
    pub output_entries: usize,
    pub anomalies: Vec<AlignmentAnomaly>,
    pub verdict: Verdict,
}

impl ConversionReport {
    pub fn is_success(&self) -> bool {
        matches!(self.verdict, Verdict::Success)
    }

    /// Process exit code for the launcher: 0 on success, 1 on failure
    pub fn exit_code(&self) -> i32 {
        if self.is_success() { 0 } else { 1 }
    }

    /// Entries that carry only one language, including originals whose
    /// translation was dropped as a mere echo
    pub fn single_language_entries(&self) -> usize {
        self.unmatched_original + self.unmatched_translated + self.echoed_translations
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for ConversionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.verdict {
            Verdict::Success => writeln!(f, "✅ Bilingual subtitle written: {}", self.output_file.display())?,
            Verdict::Failure { kind, cause } => writeln!(f, "❌ Conversion failed ({}): {}", kind, cause)?,
        }

        writeln!(
            f,
            "  Original:    {} entries{}",
            self.original_entries,
            encoding_suffix(&self.original_encoding)
        )?;
        writeln!(
            f,
            "  Translated:  {} entries{}",
            self.translated_entries,
            encoding_suffix(&self.translated_encoding)
        )?;

        if let Some(strategy) = self.strategy {
            writeln!(f, "  Alignment:   {} ({} matched pairs)", strategy, self.matched_pairs)?;
            writeln!(
                f,
                "  Unmatched:   {} original-only, {} translated-only",
                self.unmatched_original, self.unmatched_translated
            )?;
        }

        if self.is_success() {
            writeln!(f, "  Output:      {} entries", self.output_entries)?;
            let unpartnered = self.unmatched_original + self.unmatched_translated;
            if unpartnered > 0 {
                writeln!(
                    f,
                    "  ⚠ {} entries are single-language because no partner was found",
                    unpartnered
                )?;
            }
            if self.echoed_translations > 0 {
                writeln!(
                    f,
                    "  ⚠ {} entries are single-language because the translation only repeated the original",
                    self.echoed_translations
                )?;
            }
        }

        for anomaly in &self.anomalies {
            writeln!(f, "  - {}", anomaly)?;
        }
        Ok(())
    }
}

fn encoding_suffix(encoding: &Option<String>) -> String {
    encoding
        .as_ref()
        .map(|name| format!(" ({})", name))
        .unwrap_or_default()
}

/// Accumulates run statistics until the verdict is known
#[derive(Debug, Default)]
pub(crate) struct ReportBuilder {
    pub original_file: PathBuf,
    pub translated_file: PathBuf,
    pub output_file: PathBuf,
    pub original_entries: usize,
    pub translated_entries: usize,
    pub original_encoding: Option<String>,
    pub translated_encoding: Option<String>,
    pub strategy: Option<AppliedStrategy>,
    pub matched_pairs: usize,
    pub unmatched_original: usize,
    pub unmatched_translated: usize,
    pub echoed_translations: usize,
    pub output_entries: usize,
    pub anomalies: Vec<AlignmentAnomaly>,
}

impl ReportBuilder {
    pub fn new(original_file: PathBuf, translated_file: PathBuf, output_file: PathBuf) -> Self {
        Self {
            original_file,
            translated_file,
            output_file,
            ..Default::default()
        }
    }

    pub fn record(&mut self, anomaly: AlignmentAnomaly) {
        self.anomalies.push(anomaly);
    }

    pub fn succeed(self) -> ConversionReport {
        self.finish(Verdict::Success)
    }

    pub fn fail(self, error: &AppError) -> ConversionReport {
        self.finish(Verdict::Failure {
            kind: error.kind().to_string(),
            cause: error.to_string(),
        })
    }

    fn finish(self, verdict: Verdict) -> ConversionReport {
        ConversionReport {
            original_file: self.original_file,
            translated_file: self.translated_file,
            output_file: self.output_file,
            original_entries: self.original_entries,
            translated_entries: self.translated_entries,
            original_encoding: self.original_encoding,
            translated_encoding: self.translated_encoding,
            strategy: self.strategy,
            matched_pairs: self.matched_pairs,
            unmatched_original: self.unmatched_original,
            unmatched_translated: self.unmatched_translated,
            echoed_translations: self.echoed_translations,
            output_entries: self.output_entries,
            anomalies: self.anomalies,
            verdict,
        }
    }
}
