//! Content-addressed note identifiers and sort-field checksums.
//!
//! GUIDs follow the scheme Anki itself uses for generated notes: the input
//! strings are joined with `__`, hashed with SHA-256, and the first 8 bytes of
//! the digest are rendered big-endian in Anki's base91 alphabet.
//!
//! ```
//! use ankit_apkg::hash::guid_for;
//!
//! assert_eq!(guid_for(&["hello"]), "hZ%+.BW-%^");
//! ```

use std::sync::LazyLock;

use regex_lite::Regex;
use sha1::Sha1;
use sha2::{Digest, Sha256};

/// Separator placed between hashed strings.
pub const GUID_SEPARATOR: &str = "__";

/// The 91 symbols used to render GUIDs, lowest digit first.
pub const BASE91_TABLE: &[u8; 91] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!#$%&()*+,-./:;<=>?@[]^_`{|}~";

static IMG_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img[^>]+src=["']?([^"'>\s]+)["']?[^>]*>"#).expect("valid img pattern")
});

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag pattern"));

/// Derive a GUID from an ordered sequence of strings.
pub fn guid_for<S: AsRef<str>>(fields: &[S]) -> String {
    let joined = fields
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(GUID_SEPARATOR);
    guid_from_prefix(digest_prefix(&joined))
}

/// GUID for a digest prefix. A zero prefix yields the empty string.
pub fn guid_from_prefix(prefix: u64) -> String {
    encode_base91(prefix)
}

/// First 8 bytes of the SHA-256 digest of `input`, big-endian.
pub fn digest_prefix(input: &str) -> u64 {
    let digest = Sha256::digest(input.as_bytes());
    digest[..8]
        .iter()
        .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte))
}

/// Render `value` in base91, most significant digit first.
///
/// Zero renders as the empty string.
pub fn encode_base91(mut value: u64) -> String {
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE91_TABLE[(value % 91) as usize]);
        value /= 91;
    }
    digits.iter().rev().map(|&b| b as char).collect()
}

/// Checksum of a note's sort field, as stored in the `csum` column.
///
/// Media references are reduced to their filenames and markup is stripped
/// before hashing; the value is the first 4 bytes of the SHA-1 digest.
pub fn sort_field_checksum(sort_field: &str) -> i64 {
    let text = strip_html_media(sort_field);
    let digest = Sha1::digest(text.as_bytes());
    let prefix = digest[..4]
        .iter()
        .fold(0u32, |acc, byte| (acc << 8) | u32::from(*byte));
    i64::from(prefix)
}

/// Replace `<img>` tags with their source filename, then drop remaining markup.
pub fn strip_html_media(html: &str) -> String {
    let with_names = IMG_TAG.replace_all(html, " ${1} ");
    let stripped = HTML_TAG.replace_all(&with_names, "");
    decode_entities(stripped.trim())
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
