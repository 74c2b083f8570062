use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use log::{LevelFilter, debug};
use serde::{Deserialize, Serialize};

use crate::aligner::{AlignmentStrategy, OverlapPolicy};
use crate::encoding;
use crate::file_utils::DEFAULT_BILINGUAL_MARKER;
use crate::merger::MergeOptions;
use crate::subtitle_processor::{DEFAULT_ANOMALY_THRESHOLD, ParseOptions};

/// Application configuration module
/// This module handles loading and validating the conversion settings.
/// Every field has a default so that partial configuration files load.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Input parsing settings
    #[serde(default)]
    pub parsing: ParsingConfig,

    /// Alignment settings
    #[serde(default)]
    pub alignment: AlignmentConfig,

    /// Text composition settings
    #[serde(default)]
    pub merge: MergeOptions,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Parser configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ParsingConfig {
    /// Share of unparseable blocks (0.0 to 1.0) above which a file is rejected
    #[serde(default = "default_anomaly_threshold")]
    pub anomaly_threshold: f64,

    /// Legacy encodings tried, in order, when the input is not UTF-8
    #[serde(default = "default_fallback_encodings")]
    pub fallback_encodings: Vec<String>,

    /// Encoding label forced for both inputs, skipping detection
    #[serde(default)]
    pub encoding: Option<String>,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            anomaly_threshold: default_anomaly_threshold(),
            fallback_encodings: default_fallback_encodings(),
            encoding: None,
        }
    }
}

/// Alignment configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AlignmentConfig {
    /// Strategy: auto, positional or overlap
    #[serde(default)]
    pub strategy: AlignmentStrategy,

    /// Minimum overlap and tie-break used by the overlap strategy
    #[serde(default)]
    pub overlap: OverlapPolicy,
}

/// Output configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OutputConfig {
    // @field: Marker inserted before the extension of derived output names
    #[serde(default = "default_bilingual_marker")]
    pub bilingual_marker: String,

    // @field: Whether an existing output file may be replaced
    #[serde(default = "default_true")]
    pub overwrite: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            bilingual_marker: default_bilingual_marker(),
            overwrite: true,
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    // @returns: Matching log crate filter
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
        }
    }
}

fn default_anomaly_threshold() -> f64 {
    DEFAULT_ANOMALY_THRESHOLD // abort when more than half of the blocks are unparseable
}

fn default_fallback_encodings() -> Vec<String> {
    vec![encoding::DEFAULT_FALLBACK_ENCODING.to_string()]
}

fn default_bilingual_marker() -> String {
    DEFAULT_BILINGUAL_MARKER.to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a JSON file, or the defaults when it does not exist
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("Config file {:?} not found, using defaults", path);
            return Ok(Self::default());
        }

        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;

        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let threshold = self.parsing.anomaly_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(anyhow!(
                "Anomaly threshold must be between 0.0 and 1.0, got {}",
                threshold
            ));
        }

        encoding::resolve_labels(&self.parsing.fallback_encodings)?;
        if let Some(label) = &self.parsing.encoding {
            encoding::resolve_label(label)?;
        }

        let marker = self.output.bilingual_marker.trim();
        if marker.is_empty() || marker.contains(['/', '\\']) {
            return Err(anyhow!("Invalid bilingual marker: {:?}", self.output.bilingual_marker));
        }

        Ok(())
    }

    /// Parser options with encoding labels resolved
    pub fn parse_options(&self) -> Result<ParseOptions> {
        let declared_encoding = self
            .parsing
            .encoding
            .as_deref()
            .map(encoding::resolve_label)
            .transpose()?;

        Ok(ParseOptions {
            anomaly_threshold: self.parsing.anomaly_threshold,
            declared_encoding,
            fallback_encodings: encoding::resolve_labels(&self.parsing.fallback_encodings)?,
        })
    }
}
