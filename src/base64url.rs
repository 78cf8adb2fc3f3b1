//! Base64 with the URL-safe alphabet substitution applied separately.
//!
//! Token checksums are computed over the standard alphabet, so the
//! substitution is a distinct step from encoding.
use alloc::{string::String, vec::Vec};

use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};

use crate::error::{Error, Result};

/// Substitute `+` with `-` and `/` with `_`, strip trailing `=` padding.
pub fn to_url_safe(s: &str) -> String {
    s.trim_end_matches('=')
     .chars()
     .map(|c| match c {
        '+' => '-',
        '/' => '_',
        c => c
     })
     .collect()
}

/// Return `true` if `s` only holds characters of the URL-safe alphabet.
///
/// Padding and the standard `+` and `/` are not part of it.
pub fn is_url_safe(s: &str) -> bool {
    s.bytes().all(|c| c.is_ascii_alphanumeric() || c == b'-' || c == b'_')
}

/// Substitute `-` with `+` and `_` with `/`.
pub fn from_url_safe(s: &str) -> String {
    s.chars()
     .map(|c| match c {
        '-' => '+',
        '_' => '/',
        c => c
     })
     .collect()
}

/// Encode with the standard alphabet, without padding.
pub fn encode<T: AsRef<[u8]>>(input: T) -> String {
    STANDARD_NO_PAD.encode(input)
}

/// Decode unpadded standard base64.
///
/// Fails with [`Error::InvalidEncoding`] on characters outside the alphabet,
/// padding, or an impossible length.
pub fn decode<T: AsRef<[u8]>>(input: T) -> Result<Vec<u8>> {
    STANDARD_NO_PAD.decode(input).map_err(|_| Error::InvalidEncoding)
}
