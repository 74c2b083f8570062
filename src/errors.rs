/*!
 * Error types for the dualsub application.
 *
 * Fatal failures of a conversion run (unreadable input, undecodable bytes,
 * broken SRT syntax, failed output write) are modelled here with thiserror.
 * Non-fatal alignment anomalies are not errors; they live in the report.
 */

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading, decoding, parsing or writing subtitle files
#[derive(Error, Debug)]
pub enum SubtitleError {
    /// The input file could not be opened or read
    #[error("Failed to read subtitle file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// None of the attempted encodings decoded the bytes without errors
    #[error("Could not decode subtitle content (tried: {})", tried.join(", "))]
    Encoding {
        /// Encoding names attempted, in order
        tried: Vec<String>,
    },

    /// An encoding label that encoding_rs does not know
    #[error("Unknown text encoding label: {0}")]
    UnknownEncoding(String),

    /// Too many blocks could not be parsed, or nothing could be parsed at all
    #[error("Failed to parse subtitle content: {skipped} of {total} blocks unparseable ({reason}); first offending block #{first_block}: {first_line:?}")]
    Parse {
        /// Number of skipped blocks
        skipped: usize,
        /// Total number of blocks seen
        total: usize,
        /// 1-based position of the first skipped block
        first_block: usize,
        /// First line of the first skipped block
        first_line: String,
        /// Why the parse was aborted
        reason: String,
    },

    /// The content contained no subtitle blocks at all
    #[error("No subtitle entries found in content")]
    Empty,

    /// The output could not be written
    #[error("Failed to write subtitle file {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by the aligner
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AlignmentError {
    /// Strict positional alignment was requested but the tracks differ in length
    #[error("Entry count mismatch: original has {original} entries, translated has {translated}")]
    CountMismatch {
        original: usize,
        translated: usize,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from subtitle reading, parsing or writing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Error from the aligner
    #[error("Alignment error: {0}")]
    Alignment(#[from] AlignmentError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The output exists and overwriting was not allowed
    #[error("Output file already exists: {0:?} (remove --no-clobber to replace it)")]
    OutputExists(PathBuf),
}

impl AppError {
    /// Short machine-friendly name of the failure class
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Subtitle(SubtitleError::Read { .. }) => "ReadError",
            Self::Subtitle(SubtitleError::Encoding { .. }) => "EncodingError",
            Self::Subtitle(SubtitleError::UnknownEncoding(_)) => "EncodingError",
            Self::Subtitle(SubtitleError::Parse { .. }) => "ParseError",
            Self::Subtitle(SubtitleError::Empty) => "ParseError",
            Self::Subtitle(SubtitleError::Write { .. }) => "WriteError",
            Self::Alignment(_) => "AlignmentError",
            Self::Config(_) => "ConfigError",
            Self::OutputExists(_) => "OutputExists",
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Config(error.to_string())
    }
}
