use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};

use crate::aligner;
use crate::app_config::Config;
use crate::checker::{self, CheckReport};
use crate::errors::{AppError, SubtitleError};
use crate::file_utils::FileManager;
use crate::merger;
use crate::report::{AlignmentAnomaly, ConversionReport, ReportBuilder};
use crate::serializer;
use crate::subtitle_processor::{ParseOptions, SubtitleTrack, TrackKind};

// @module: Application controller for bilingual conversion

/// Runs one conversion: parse both inputs, align, merge, write, report
pub struct Controller {
    // @field: App configuration
    config: Config,

    // @field: Parser settings resolved from the configuration
    parse_options: ParseOptions,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self, AppError> {
        config.validate()?;
        let parse_options = config.parse_options()?;

        Ok(Self {
            config,
            parse_options,
        })
    }

    /// Controller with the default configuration
    pub fn with_defaults() -> Result<Self, AppError> {
        Self::with_config(Config::default())
    }

    /// Explicit output path, or one derived from the translated file name
    pub fn output_path_for(&self, translated_file: &Path, output_file: Option<&Path>) -> PathBuf {
        match output_file {
            Some(path) => path.to_path_buf(),
            None => FileManager::generate_output_path(translated_file, &self.config.output.bilingual_marker),
        }
    }

    /// Convert one pair of files. Failures end up in the report verdict.
    pub fn run(&self, original_file: &Path, translated_file: &Path, output_file: Option<&Path>) -> ConversionReport {
        let start_time = Instant::now();
        let output_file = self.output_path_for(translated_file, output_file);
        let mut builder = ReportBuilder::new(
            original_file.to_path_buf(),
            translated_file.to_path_buf(),
            output_file.clone(),
        );

        match self.convert(&mut builder, original_file, translated_file, &output_file) {
            Ok(()) => {
                info!(
                    "Conversion completed in {}.",
                    Self::format_duration(start_time.elapsed())
                );
                builder.succeed()
            }
            Err(e) => {
                error!("Conversion failed: {}", e);
                builder.fail(&e)
            }
        }
    }

    /// Compare two files without writing anything
    pub fn check(&self, original_file: &Path, translated_file: &Path) -> Result<CheckReport, AppError> {
        let original = self.load_track(original_file, TrackKind::Original)?;
        let translated = self.load_track(translated_file, TrackKind::Translated)?;
        Ok(checker::check_tracks(&original, &translated))
    }

    fn convert(
        &self,
        report: &mut ReportBuilder,
        original_file: &Path,
        translated_file: &Path,
        output_file: &Path,
    ) -> Result<(), AppError> {
        if !self.config.output.overwrite && output_file.exists() {
            return Err(AppError::OutputExists(output_file.to_path_buf()));
        }

        let original = self.load_track(original_file, TrackKind::Original)?;
        report.original_entries = original.len();
        report.original_encoding = Some(original.encoding.to_string());
        if !original.skipped.is_empty() {
            report.record(AlignmentAnomaly::SkippedBlocks {
                track: TrackKind::Original,
                count: original.skipped.len(),
            });
        }

        let translated = self.load_track(translated_file, TrackKind::Translated)?;
        report.translated_entries = translated.len();
        report.translated_encoding = Some(translated.encoding.to_string());
        if !translated.skipped.is_empty() {
            report.record(AlignmentAnomaly::SkippedBlocks {
                track: TrackKind::Translated,
                count: translated.skipped.len(),
            });
        }

        if original.len() != translated.len() {
            report.record(AlignmentAnomaly::CountMismatch {
                original: original.len(),
                translated: translated.len(),
            });
        }

        let alignment = aligner::align_with_policy(
            &original,
            &translated,
            self.config.alignment.strategy,
            &self.config.alignment.overlap,
        )?;
        report.strategy = Some(alignment.strategy);
        report.matched_pairs = alignment.matched;
        report.unmatched_original = alignment.unmatched_original;
        report.unmatched_translated = alignment.unmatched_translated;
        if alignment.unmatched_original > 0 {
            report.record(AlignmentAnomaly::UnmatchedOriginal {
                count: alignment.unmatched_original,
            });
        }
        if alignment.unmatched_translated > 0 {
            report.record(AlignmentAnomaly::UnmatchedTranslated {
                count: alignment.unmatched_translated,
            });
        }
        if alignment.index_mismatches > 0 {
            report.record(AlignmentAnomaly::IndexMismatch {
                count: alignment.index_mismatches,
            });
        }

        let merged = merger::merge(&alignment.pairs, &self.config.merge);
        report.echoed_translations = merged.echoed_translations;
        if merged.timing_anomalies > 0 {
            report.record(AlignmentAnomaly::InvertedTiming {
                count: merged.timing_anomalies,
            });
        }

        let overwrite = self.config.output.overwrite;
        serializer::write_srt(&merged.entries, output_file, overwrite).map_err(|e| match e {
            // The target appeared while this run was working
            SubtitleError::Write { ref source, .. }
                if !overwrite && source.kind() == io::ErrorKind::AlreadyExists =>
            {
                AppError::OutputExists(output_file.to_path_buf())
            }
            e => AppError::from(e),
        })?;
        report.output_entries = merged.entries.len();
        debug!("Wrote {} bilingual entries to {:?}", merged.entries.len(), output_file);

        Ok(())
    }

    fn load_track(&self, path: &Path, kind: TrackKind) -> Result<SubtitleTrack, AppError> {
        let track = SubtitleTrack::from_file(path, kind, &self.parse_options)?;
        info!(
            "Loaded {} subtitles: {} entries ({}) from {:?}",
            kind,
            track.len(),
            track.encoding,
            path
        );
        if !track.skipped.is_empty() {
            warn!("{} unparseable blocks skipped in {:?}", track.skipped.len(), path);
        }
        Ok(track)
    }

    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let minutes = total_seconds / 60;
        let seconds = total_seconds % 60;

        if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
