/*!
 * # dualsub - bilingual subtitle merger
 *
 * A Rust library that combines an original-language SRT file with an
 * independently timed translation into one bilingual SRT file.
 *
 * ## Features
 *
 * - Tolerant SRT parsing with UTF-8, UTF-16 and legacy encoding detection
 * - Positional alignment when entry counts agree, time-overlap alignment otherwise
 * - Unmatched entries kept as single-language captions, never dropped
 * - Atomic output writes: a failed run never leaves a partial file behind
 * - A conversion report with counts, anomalies and a verdict
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `encoding`: Byte decoding with strict encoding fallback
 * - `subtitle_processor`: SRT entries, tracks and parsing
 * - `aligner`: Pairing of original and translated entries
 * - `merger`: Bilingual text composition and re-indexing
 * - `serializer`: SRT rendering and writing
 * - `checker`: Compatibility check between two tracks
 * - `report`: Conversion report and anomalies
 * - `app_controller`: Orchestration of a conversion run
 * - `app_config`: Configuration management
 * - `file_utils`: File system operations
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(non_snake_case)]

// Public modules
pub mod aligner;
pub mod app_config;
pub mod app_controller;
pub mod checker;
pub mod encoding;
pub mod errors;
pub mod file_utils;
pub mod merger;
pub mod report;
pub mod serializer;
pub mod subtitle_processor;

// Re-export main types for easier usage
pub use aligner::{AlignedPair, Alignment, AlignmentStrategy, AppliedStrategy, OverlapPolicy, TieBreak, align, align_with_policy};
pub use app_config::Config;
pub use app_controller::Controller;
pub use checker::{CheckReport, check_tracks};
pub use errors::{AlignmentError, AppError, SubtitleError};
pub use merger::{BilingualEntry, EntrySource, MergeOptions, merge};
pub use report::{AlignmentAnomaly, ConversionReport, Verdict};
pub use subtitle_processor::{ParseOptions, SubtitleEntry, SubtitleTrack, TrackKind};
