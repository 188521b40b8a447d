//! Byte-to-text decoding
//!
//! Order of precedence: byte-order mark, charset declared in the Content-Type
//! header, statistical detection, then UTF-8 with replacement characters.
//! Decoding never fails.

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};
use serde::Serialize;

/// Where the chosen encoding came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodingSource {
    Bom,
    Header,
    Detected,
    Fallback,
}

/// Decoded document text
#[derive(Debug, Clone)]
pub struct DecodedText {
    pub text: String,
    /// Canonical encoding name (e.g. "UTF-8", "windows-1252")
    pub encoding: &'static str,
    /// True if malformed sequences were replaced with U+FFFD
    pub had_replacements: bool,
    pub source: EncodingSource,
}

/// Decodes raw bytes into text
///
/// # Arguments
///
/// * `bytes` - Response body
/// * `declared` - Charset label from the Content-Type header, if any
pub fn decode(bytes: &[u8], declared: Option<&str>) -> DecodedText {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, had_replacements) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return DecodedText {
            text: text.into_owned(),
            encoding: encoding.name(),
            had_replacements,
            source: EncodingSource::Bom,
        };
    }

    if let Some(encoding) = declared.and_then(|label| Encoding::for_label(label.trim().as_bytes())) {
        return with_encoding(bytes, encoding, EncodingSource::Header);
    }

    if !bytes.is_empty() {
        let mut detector = EncodingDetector::new();
        detector.feed(bytes, true);
        let encoding = detector.guess(None, true);
        return with_encoding(bytes, encoding, EncodingSource::Detected);
    }

    with_encoding(bytes, UTF_8, EncodingSource::Fallback)
}

fn with_encoding(bytes: &[u8], encoding: &'static Encoding, source: EncodingSource) -> DecodedText {
    let (text, had_replacements) = encoding.decode_without_bom_handling(bytes);
    DecodedText {
        text: text.into_owned(),
        encoding: encoding.name(),
        had_replacements,
        source,
    }
}

/// Extracts the charset parameter from a Content-Type value
///
/// ```
/// use sumi_scrape::document::charset_from_content_type;
///
/// assert_eq!(
///     charset_from_content_type("text/html; Charset=\"ISO-8859-1\""),
///     Some("ISO-8859-1".to_string())
/// );
/// assert_eq!(charset_from_content_type("text/html"), None);
/// ```
pub fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("charset") {
            let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
            (!value.is_empty()).then(|| value.to_string())
        } else {
            None
        }
    })
}
