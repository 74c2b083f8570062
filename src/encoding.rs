/*!
 * Text encoding detection for subtitle files.
 *
 * Subtitle files in the wild are UTF-8 (with or without a byte-order mark),
 * occasionally UTF-16, and often a regional legacy encoding such as GBK/GB18030
 * or Big5. Detection tries each candidate strictly: a candidate is accepted only
 * when it decodes the whole input without a single malformed sequence, so the
 * resulting text never contains replacement characters.
 */

use encoding_rs::{Encoding, UTF_8};
use log::debug;

use crate::errors::SubtitleError;

/// Default legacy encoding tried after UTF-8
pub const DEFAULT_FALLBACK_ENCODING: &str = "gb18030";

/// Text decoded from raw subtitle bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    /// Decoded content, BOM removed
    pub text: String,
    /// Canonical name of the encoding that decoded the content
    pub encoding: &'static str,
}

/// Resolve an encoding label ("utf-8", "gbk", "big5", "shift_jis", ...)
pub fn resolve_label(label: &str) -> Result<&'static Encoding, SubtitleError> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| SubtitleError::UnknownEncoding(label.to_string()))
}

/// Resolve a list of encoding labels, failing on the first unknown one
pub fn resolve_labels(labels: &[String]) -> Result<Vec<&'static Encoding>, SubtitleError> {
    labels.iter().map(|label| resolve_label(label)).collect()
}

/// Decode raw subtitle bytes.
///
/// With `declared` set, only that encoding is tried (a matching BOM is still
/// stripped). Otherwise the order is: BOM-identified encoding, UTF-8, then each
/// of `fallbacks` in order.
pub fn decode_subtitle_bytes(
    bytes: &[u8],
    declared: Option<&'static Encoding>,
    fallbacks: &[&'static Encoding],
) -> Result<DecodedText, SubtitleError> {
    let bom = Encoding::for_bom(bytes);

    if let Some(encoding) = declared {
        let body = match bom {
            Some((bom_encoding, bom_len)) if bom_encoding == encoding => &bytes[bom_len..],
            _ => bytes,
        };
        return try_decode(body, encoding).ok_or_else(|| encoding_error(&[encoding]));
    }

    let mut tried: Vec<&'static Encoding> = Vec::new();

    if let Some((encoding, bom_len)) = bom {
        if let Some(decoded) = try_decode(&bytes[bom_len..], encoding) {
            return Ok(decoded);
        }
        tried.push(encoding);
    }

    let candidates = std::iter::once(UTF_8).chain(fallbacks.iter().copied());
    for encoding in candidates {
        if tried.contains(&encoding) {
            continue;
        }
        if let Some(decoded) = try_decode(bytes, encoding) {
            if encoding != UTF_8 {
                debug!("Content is not valid UTF-8, decoded as {}", encoding.name());
            }
            return Ok(decoded);
        }
        tried.push(encoding);
    }

    Err(encoding_error(&tried))
}

fn encoding_error(tried: &[&'static Encoding]) -> SubtitleError {
    SubtitleError::Encoding {
        tried: tried.iter().map(|encoding| encoding.name().to_string()).collect(),
    }
}

fn try_decode(bytes: &[u8], encoding: &'static Encoding) -> Option<DecodedText> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| DecodedText {
            text: text.into_owned(),
            encoding: encoding.name(),
        })
}
