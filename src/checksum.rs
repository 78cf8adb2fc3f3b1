//! Token checksum.
use alloc::string::String;

use sha1::{Digest, Sha1};

use crate::base64url;

/// Length of an unpadded base64 encoded SHA-1 digest.
pub const MAX_CHECKSUM_CHARS: usize = 27;

/// Return the first `chars` characters of the base64 encoded
/// `SHA-1(body ++ salt)` digest.
///
/// The result uses the standard base64 alphabet and is never longer
/// than [`MAX_CHECKSUM_CHARS`].
pub fn checksum(body: &[u8], salt: &[u8], chars: usize) -> String {
    let mut hasher = Sha1::new();
    hasher.update(body);
    hasher.update(salt);
    let mut encoded = base64url::encode(hasher.finalize());
    encoded.truncate(chars);
    encoded
}
