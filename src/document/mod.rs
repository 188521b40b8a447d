//! Decoding and parsing of fetched pages
//!
//! Raw bytes go through [`decode`] to text, then [`Document::parse`] to an
//! element tree (or flat text when the content has no markup).

mod decode;
mod parse;

pub use decode::{charset_from_content_type, decode, DecodedText, EncodingSource};
pub use parse::{parse_lenient, parse_strict, Document, ParseStrategy};

pub(crate) use parse::collapse_whitespace;

use crate::fetcher::FetchResult;

/// Decodes a fetched body using its Content-Type charset as the declared hint
pub fn decode_response(result: &FetchResult) -> DecodedText {
    let declared = result.content_type().and_then(charset_from_content_type);
    decode(&result.body, declared.as_deref())
}
