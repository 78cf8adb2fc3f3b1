//! Codec configuration: token length limit, checksum size and salt.
use core::fmt;

use alloc::vec::Vec;

use serde::{Deserialize, Deserializer, Serialize};

use crate::checksum::MAX_CHECKSUM_CHARS;
use crate::error::{Error, Result};

/// Default number of checksum characters.
pub const DEFAULT_CHECKSUM_CHARS: usize = 4;

/// Codec configuration.
///
/// Deserializable from any serde format, every field is optional:
///
/// ```
/// # use payload_token::Config;
/// let config: Config = serde_json::from_str(r#"{"max_length": 64, "private_salt": "s3cr3t"}"#).unwrap();
/// assert_eq!(config, Config::new().with_max_length(64).with_private_salt("s3cr3t"));
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum token length, `None` for unlimited.
    ///
    /// `0` is read as unlimited.
    #[serde(deserialize_with = "deserialize_max_length")]
    pub max_length: Option<usize>,
    /// Number of checksum characters prefixed to every token.
    pub checksum_chars: usize,
    /// Secret appended to the checksummed data.
    #[serde(with = "serde_bytes")]
    pub private_salt: Vec<u8>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_length: None,
            checksum_chars: DEFAULT_CHECKSUM_CHARS,
            private_salt: Vec::new()
        }
    }
}

// never print the salt
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
         .field("max_length", &self.max_length)
         .field("checksum_chars", &self.checksum_chars)
         .field("private_salt", &format_args!("[{} bytes]", self.private_salt.len()))
         .finish()
    }
}

impl Config {
    /// Same as [`Config::default`]: unlimited length, a
    /// [`DEFAULT_CHECKSUM_CHARS`] checksum and no salt.
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the token length. `0` means unlimited.
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = (max_length != 0).then_some(max_length);
        self
    }

    /// Set the checksum prefix length, `0` disables the checksum.
    ///
    /// Values above [`MAX_CHECKSUM_CHARS`] fail [`validate`](Self::validate).
    pub fn with_checksum_chars(mut self, checksum_chars: usize) -> Self {
        self.checksum_chars = checksum_chars;
        self
    }

    /// Set the secret mixed into every checksum.
    pub fn with_private_salt<S: AsRef<[u8]>>(mut self, private_salt: S) -> Self {
        self.private_salt = private_salt.as_ref().to_vec();
        self
    }

    /// Check the configuration can be used by a codec.
    pub fn validate(&self) -> Result<()> {
        if self.checksum_chars > MAX_CHECKSUM_CHARS {
            return Err(Error::InvalidConfig("checksum_chars exceeds the length of the encoded digest"))
        }
        Ok(())
    }
}

fn deserialize_max_length<'de, D>(deserializer: D) -> core::result::Result<Option<usize>, D::Error>
    where D: Deserializer<'de>
{
    Ok(Option::<usize>::deserialize(deserializer)?.filter(|&n| n != 0))
}
