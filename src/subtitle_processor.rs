use std::fmt;
use std::path::{Path, PathBuf};

use encoding_rs::Encoding;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::encoding::{self, DecodedText};
use crate::errors::SubtitleError;

// @module: SRT parsing, track model and rendering

// @const: SRT timing line, tolerant of '.' millisecond separators and trailing coordinates
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,3}:\d{2}:\d{2}[,.]\d{3})\s*-->\s*(\d{1,3}:\d{2}:\d{2}[,.]\d{3})(?:\s.*)?$").unwrap()
});

// @const: Blank-line block separator
static BLOCK_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*\n").unwrap());

/// Default share of unparseable blocks above which a file is rejected
pub const DEFAULT_ANOMALY_THRESHOLD: f64 = 0.5;

// @struct: Single subtitle entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleEntry {
    // @field: Sequence number as written in the file
    pub seq_num: usize,

    // @field: Start time in ms
    pub start_time_ms: u64,

    // @field: End time in ms
    pub end_time_ms: u64,

    // @field: Display lines, in order
    pub lines: Vec<String>,
}

impl SubtitleEntry {
    /// Creates a new subtitle entry from its display lines
    pub fn new(seq_num: usize, start_time_ms: u64, end_time_ms: u64, lines: Vec<String>) -> Self {
        SubtitleEntry {
            seq_num,
            start_time_ms,
            end_time_ms,
            lines,
        }
    }

    /// Creates an entry from text, splitting it on line breaks
    pub fn from_text(seq_num: usize, start_time_ms: u64, end_time_ms: u64, text: &str) -> Self {
        Self::new(
            seq_num,
            start_time_ms,
            end_time_ms,
            text.lines().map(str::to_string).collect(),
        )
    }

    /// Text with lines joined by '\n'
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Whether the end time is not after the start time
    pub fn has_inverted_timing(&self) -> bool {
        self.end_time_ms <= self.start_time_ms
    }

    /// Length of the overlap between this entry's interval and another's, in ms
    pub fn overlap_ms(&self, other: &SubtitleEntry) -> u64 {
        let start = self.start_time_ms.max(other.start_time_ms);
        let end = self.end_time_ms.min(other.end_time_ms);
        end.saturating_sub(start)
    }

    /// Parse an SRT timestamp (HH:MM:SS,mmm) to milliseconds
    pub fn parse_timestamp(timestamp: &str) -> Result<u64, String> {
        let parts: Vec<&str> = timestamp.trim().split(&[':', ',', '.'][..]).collect();

        if parts.len() != 4 {
            return Err(format!("Invalid timestamp format: {}", timestamp));
        }

        let component = |value: &str, name: &str| -> Result<u64, String> {
            value
                .parse::<u64>()
                .map_err(|_| format!("Failed to parse {} in timestamp: {}", name, timestamp))
        };

        let hours = component(parts[0], "hours")?;
        let minutes = component(parts[1], "minutes")?;
        let seconds = component(parts[2], "seconds")?;
        let millis = component(parts[3], "milliseconds")?;

        if minutes >= 60 || seconds >= 60 || millis >= 1000 || parts[3].len() != 3 {
            return Err(format!("Invalid time components in timestamp: {}", timestamp));
        }

        Ok(hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis)
    }

    /// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
    pub fn format_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }

    /// Convert start time to formatted SRT timestamp
    pub fn format_start_time(&self) -> String {
        Self::format_timestamp(self.start_time_ms)
    }

    /// Convert end time to formatted SRT timestamp
    pub fn format_end_time(&self) -> String {
        Self::format_timestamp(self.end_time_ms)
    }
}

impl fmt::Display for SubtitleEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_srt_block(f, self.seq_num, self.start_time_ms, self.end_time_ms, &self.lines)
    }
}

/// Write one SRT block (index, timing, text lines, blank separator)
pub(crate) fn write_srt_block<W: fmt::Write>(
    out: &mut W,
    index: usize,
    start_time_ms: u64,
    end_time_ms: u64,
    lines: &[String],
) -> fmt::Result {
    writeln!(out, "{}", index)?;
    writeln!(
        out,
        "{} --> {}",
        SubtitleEntry::format_timestamp(start_time_ms),
        SubtitleEntry::format_timestamp(end_time_ms)
    )?;
    for line in lines {
        writeln!(out, "{}", line)?;
    }
    writeln!(out)
}

/// Which side of the conversion a track belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Original,
    Translated,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Original => write!(f, "original"),
            Self::Translated => write!(f, "translated"),
        }
    }
}

/// A block that could not be turned into an entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedBlock {
    /// 1-based position of the block in the file
    pub block_number: usize,
    /// First non-empty line of the block
    pub first_line: String,
    /// Why it was skipped
    pub reason: String,
}

/// Parser settings
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Share of unparseable blocks (0.0..=1.0) above which parsing fails
    pub anomaly_threshold: f64,
    /// Encoding to use instead of auto-detection
    pub declared_encoding: Option<&'static Encoding>,
    /// Legacy encodings tried after UTF-8
    pub fallback_encodings: Vec<&'static Encoding>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            anomaly_threshold: DEFAULT_ANOMALY_THRESHOLD,
            declared_encoding: None,
            fallback_encodings: vec![encoding_rs::GB18030],
        }
    }
}

/// Result of splitting content into entries
#[derive(Debug, Clone, Default)]
pub struct ParsedEntries {
    /// Parsed entries, in file order
    pub entries: Vec<SubtitleEntry>,
    /// Blocks that were skipped
    pub skipped: Vec<SkippedBlock>,
    /// Total number of non-empty blocks
    pub total_blocks: usize,
}

/// Parsed subtitle file
#[derive(Debug, Clone)]
pub struct SubtitleTrack {
    /// Source filename, if the track came from disk
    pub source_file: Option<PathBuf>,

    /// Original or translated side
    pub kind: TrackKind,

    /// Entries in file order
    pub entries: Vec<SubtitleEntry>,

    /// Encoding that decoded the file
    pub encoding: &'static str,

    /// Blocks the parser had to skip
    pub skipped: Vec<SkippedBlock>,
}

impl SubtitleTrack {
    /// Create a track from entries that are already in memory
    pub fn from_entries(kind: TrackKind, entries: Vec<SubtitleEntry>) -> Self {
        SubtitleTrack {
            source_file: None,
            kind,
            entries,
            encoding: encoding_rs::UTF_8.name(),
            skipped: Vec::new(),
        }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the track has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read and parse an SRT file
    pub fn from_file<P: AsRef<Path>>(
        path: P,
        kind: TrackKind,
        options: &ParseOptions,
    ) -> Result<Self, SubtitleError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| SubtitleError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut track = Self::from_bytes(&bytes, kind, options)?;
        track.source_file = Some(path.to_path_buf());
        Ok(track)
    }

    /// Decode and parse raw SRT bytes
    pub fn from_bytes(bytes: &[u8], kind: TrackKind, options: &ParseOptions) -> Result<Self, SubtitleError> {
        let DecodedText { text, encoding, .. } = encoding::decode_subtitle_bytes(
            bytes,
            options.declared_encoding,
            &options.fallback_encodings,
        )?;

        let parsed = parse_srt_string(&text, options.anomaly_threshold)?;
        debug!(
            "Parsed {} track: {} entries from {} blocks ({} skipped, encoding {})",
            kind,
            parsed.entries.len(),
            parsed.total_blocks,
            parsed.skipped.len(),
            encoding
        );

        Ok(SubtitleTrack {
            source_file: None,
            kind,
            entries: parsed.entries,
            encoding,
            skipped: parsed.skipped,
        })
    }

    /// Render the track as SRT text, renumbering entries 1..N
    pub fn to_srt_string(&self) -> String {
        let mut out = String::new();
        for (position, entry) in self.entries.iter().enumerate() {
            // Writing into a String cannot fail
            let _ = write_srt_block(&mut out, position + 1, entry.start_time_ms, entry.end_time_ms, &entry.lines);
        }
        out
    }
}

/// Parse SRT text into entries.
///
/// Blocks are separated by blank lines. A block whose timing line cannot be
/// parsed is skipped and recorded; parsing fails only when the share of skipped
/// blocks exceeds `anomaly_threshold` or when no entry survives.
pub fn parse_srt_string(content: &str, anomaly_threshold: f64) -> Result<ParsedEntries, SubtitleError> {
    let normalized = content
        .trim_start_matches('\u{feff}')
        .replace("\r\n", "\n")
        .replace('\r', "\n");
    let mut parsed = ParsedEntries::default();

    for block in BLOCK_SEPARATOR.split(&normalized) {
        let lines: Vec<&str> = block.lines().collect();
        let Some(first) = lines.iter().position(|line| !line.trim().is_empty()) else {
            continue;
        };
        let lines = &lines[first..];
        parsed.total_blocks += 1;
        let block_number = parsed.total_blocks;

        match parse_block(lines, block_number) {
            Ok(entry) => parsed.entries.push(entry),
            Err(reason) => {
                warn!("Skipping subtitle block #{}: {}", block_number, reason);
                parsed.skipped.push(SkippedBlock {
                    block_number,
                    first_line: lines[0].trim().to_string(),
                    reason,
                });
            }
        }
    }

    if parsed.total_blocks == 0 {
        return Err(SubtitleError::Empty);
    }

    let skip_ratio = parsed.skipped.len() as f64 / parsed.total_blocks as f64;
    let abort = parsed.entries.is_empty() || skip_ratio > anomaly_threshold;
    if let (true, Some(first)) = (abort, parsed.skipped.first()) {
        let reason = if parsed.entries.is_empty() {
            "no parseable entries".to_string()
        } else {
            format!(
                "skip ratio {:.0}% exceeds threshold {:.0}%",
                skip_ratio * 100.0,
                anomaly_threshold * 100.0
            )
        };
        return Err(SubtitleError::Parse {
            skipped: parsed.skipped.len(),
            total: parsed.total_blocks,
            first_block: first.block_number,
            first_line: first.first_line.clone(),
            reason,
        });
    }

    let inverted = parsed.entries.iter().filter(|e| e.has_inverted_timing()).count();
    if inverted > 0 {
        warn!("{} entries end at or before their start time", inverted);
    }

    Ok(parsed)
}

/// Parse one block whose first line is non-empty
fn parse_block(lines: &[&str], block_number: usize) -> Result<SubtitleEntry, String> {
    let first = lines[0].trim();

    // Index line is optional; a block may start directly with its timing line
    let (seq_num, timing_at) = match first.parse::<usize>() {
        Ok(num) => (num, 1),
        Err(_) if TIMESTAMP_REGEX.is_match(first) => (block_number, 0),
        Err(_) => return Err(format!("invalid index line {:?}", first)),
    };

    let timing = lines
        .get(timing_at)
        .map(|line| line.trim())
        .ok_or_else(|| "truncated block: missing timing line".to_string())?;

    let caps = TIMESTAMP_REGEX
        .captures(timing)
        .ok_or_else(|| format!("malformed timing line {:?}", timing))?;

    let start_time_ms = SubtitleEntry::parse_timestamp(&caps[1])?;
    let end_time_ms = SubtitleEntry::parse_timestamp(&caps[2])?;

    let mut text_lines: Vec<String> = lines[timing_at + 1..]
        .iter()
        .map(|line| line.trim().to_string())
        .collect();
    while text_lines.last().is_some_and(|line| line.is_empty()) {
        text_lines.pop();
    }
    if text_lines.is_empty() {
        text_lines.push(String::new());
    }

    Ok(SubtitleEntry::new(seq_num, start_time_ms, end_time_ms, text_lines))
}
