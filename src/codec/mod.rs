//! Tag codec for call-data markers
//!
//! Wire format appended after the original call data:
//!
//! ```text
//! <original call data><"ghosttag" as hex><tag as hex>[<payload as hex>]
//! ```
//!
//! Everything here operates on hex strings because that is what JSON-RPC
//! carries in `input`/`data` fields. Encoders emit lowercase hex without a
//! `0x` prefix so the result can be appended directly to existing call data.
//!
//! There is no version field. Changing [`MARKER`] breaks every deployed detector.

pub mod payload;

pub use payload::{parse_payload, try_parse_payload, PayloadFields};

use crate::errors::{CodecError, CodecResult};

/// Protocol marker identifying tagged call data
pub const MARKER: &[u8; 8] = b"ghosttag";

/// [`MARKER`] in lowercase hex
pub const MARKER_HEX: &str = "67686f7374746167";

/// Strip an optional `0x`/`0X` prefix
pub fn strip_hex_prefix(hex_str: &str) -> &str {
    hex_str
        .strip_prefix("0x")
        .or_else(|| hex_str.strip_prefix("0X"))
        .unwrap_or(hex_str)
}

/// Hex-encode a UTF-8 tag (lowercase, no prefix)
pub fn tag_to_hex(tag: &str) -> String {
    hex::encode(tag.as_bytes())
}

/// Marker followed by the hex encoding of `tag`
///
/// # Examples
/// ```
/// use ghosttag::codec::encode_marker_and_tag;
///
/// assert_eq!(encode_marker_and_tag("hi"), "67686f73747461676869");
/// ```
pub fn encode_marker_and_tag(tag: &str) -> String {
    let mut encoded = String::with_capacity(MARKER_HEX.len() + tag.len() * 2);
    encoded.push_str(MARKER_HEX);
    encoded.push_str(&tag_to_hex(tag));
    encoded
}

/// Byte-level variant of [`encode_marker_and_tag`] for tags that arrive as raw bytes
pub fn encode_marker_and_tag_bytes(tag: &[u8]) -> CodecResult<String> {
    let tag = std::str::from_utf8(tag).map_err(|e| CodecError::InvalidUtf8(e.to_string()))?;
    Ok(encode_marker_and_tag(tag))
}

/// Marker followed by a caller-supplied hex tag (e.g. a content digest)
///
/// No UTF-8 validation is applied to the tag bytes. The hex itself must be
/// well formed; it is normalised to lowercase so detectors can match it.
pub fn encode_hex_tag(tag_hex: &str) -> CodecResult<String> {
    let tag_hex = normalise_hex(tag_hex)?;
    Ok(format!("{}{}", MARKER_HEX, tag_hex))
}

/// Validate and lowercase a hex string, dropping any `0x` prefix
pub fn normalise_hex(hex_str: &str) -> CodecResult<String> {
    let bytes = hex::decode(strip_hex_prefix(hex_str))
        .map_err(|e| CodecError::InvalidHex(format!("'{}': {}", hex_str, e)))?;
    Ok(hex::encode(bytes))
}

/// Find `MARKER_HEX ‖ tag_hex` in call data
///
/// Returns the offset (in hex characters of `call_data_hex`, prefix included)
/// immediately after the first match, or `None` when the marker is absent.
/// Both sides are lowercased before the substring search; ASCII lowercasing
/// preserves byte offsets so the result indexes the original string.
///
/// # Examples
/// ```
/// use ghosttag::codec::{encode_marker_and_tag, locate_marker, tag_to_hex};
///
/// let input = format!("0xdeadbeef{}", encode_marker_and_tag("mytag"));
/// let offset = locate_marker(&input, &tag_to_hex("mytag")).unwrap();
/// assert_eq!(offset, input.len());
/// ```
pub fn locate_marker(call_data_hex: &str, tag_hex: &str) -> Option<usize> {
    let haystack = call_data_hex.to_ascii_lowercase();
    let needle = format!("{}{}", MARKER_HEX, tag_hex.to_ascii_lowercase());
    haystack
        .find(&needle)
        .map(|index| index + needle.len())
}

/// Decode the hex that trails a marker match into a UTF-8 string
pub fn decode_payload(payload_hex: &str) -> CodecResult<String> {
    let bytes = hex::decode(strip_hex_prefix(payload_hex))
        .map_err(|e| CodecError::InvalidHex(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| CodecError::InvalidUtf8(e.to_string()))
}

/// Hex-encode a payload string for appending after the tag
pub fn encode_payload(payload: &str) -> String {
    hex::encode(payload.as_bytes())
}
