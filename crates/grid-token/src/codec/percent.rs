//! Percent-encoding of a token as a single URL component.
//!
//! Encoding matches the browser `encodeURIComponent` set, so tokens produced
//! here and by a web client are byte-identical. Decoding is strict: a `%` not
//! followed by two hex digits is an error rather than being passed through.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::error::DecodeError;

/// Characters left as-is by `encodeURIComponent`, besides ASCII alphanumerics.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encodes `input` as one URL component.
pub fn encode_component(input: &str) -> String {
    utf8_percent_encode(input, COMPONENT).to_string()
}

/// Decodes a percent-encoded URL component.
pub fn decode_component(input: &str) -> Result<String, DecodeError> {
    check_escapes(input)?;
    percent_decode_str(input)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|_| DecodeError::InvalidUtf8)
}

fn check_escapes(input: &str) -> Result<(), DecodeError> {
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
            if !valid {
                return Err(DecodeError::InvalidPercentEncoding { position: i });
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    Ok(())
}
