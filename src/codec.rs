use alloc::{string::{String, ToString}, vec::Vec};

use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, trace};

use payload_msgpack::{self as msgpack, Value};

use crate::base64url;
use crate::checksum::checksum;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::normalize::normalize;

/// Encodes payloads into tokens and decodes them back.
///
/// Immutable after construction, so a single instance can be shared
/// between threads.
#[derive(Debug, Clone, Default)]
pub struct PayloadCodec {
    config: Config
}

impl PayloadCodec {
    /// Create a codec after validating `config`.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(PayloadCodec { config })
    }

    /// Return the validated configuration this codec was created with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Encode an array or a map payload into a token.
    ///
    /// Top-level map keys are sorted first, see [`normalize`].
    pub fn encode(&self, payload: &Value) -> Result<String> {
        if !payload.is_collection() {
            debug!("refused to encode a payload that is not an array or a map");
            return Err(Error::UnsupportedType)
        }
        let packed = msgpack::pack(&normalize(payload))?;
        self.seal(&packed)
    }

    /// Encode any serializable array-like or map-like payload into a token.
    ///
    /// The payload is converted to a [`Value`] first, so the token is the
    /// same as the one made by [`encode`](Self::encode) from that value.
    pub fn encode_from<T>(&self, payload: &T) -> Result<String>
        where T: ?Sized + Serialize
    {
        let packed = msgpack::to_vec(payload)?;
        let value = msgpack::unpack(&packed).map_err(|err| Error::Serialize(err.to_string()))?;
        self.encode(&value)
    }

    /// Verify a token and decode its payload.
    pub fn decode(&self, token: &str) -> Result<Value> {
        let packed = self.open(token)?;
        let value = msgpack::unpack(&packed).inspect_err(|err| {
            debug!(error = %err, packed_len = packed.len(), "token payload is malformed");
        })?;
        if !value.is_collection() {
            debug!(packed_len = packed.len(), "token payload is not an array or a map");
            return Err(Error::InvalidPayload(None))
        }
        trace!(token_len = token.len(), packed_len = packed.len(), "token decoded");
        Ok(value)
    }

    /// Verify a token and deserialize its payload directly into `T`.
    pub fn decode_into<T>(&self, token: &str) -> Result<T>
        where T: DeserializeOwned
    {
        let packed = self.open(token)?;
        if !packed.first().is_some_and(|&tag| msgpack::is_collection_tag(tag)) {
            debug!(packed_len = packed.len(), "token payload is not an array or a map");
            return Err(Error::InvalidPayload(None))
        }
        let value = msgpack::from_slice_exact(&packed).inspect_err(|err| {
            debug!(error = %err, packed_len = packed.len(), "token payload does not match the requested type");
        })?;
        trace!(token_len = token.len(), packed_len = packed.len(), "token decoded");
        Ok(value)
    }

    /// Wrap packed bytes into a token.
    fn seal(&self, packed: &[u8]) -> Result<String> {
        let Config { max_length, checksum_chars, ref private_salt } = self.config;
        let body = base64url::encode(packed);
        let mut token = checksum(body.as_bytes(), private_salt, checksum_chars);
        token.push_str(&body);
        let token = base64url::to_url_safe(&token);
        if let Some(max_length) = max_length {
            if token.len() > max_length {
                debug!(length = token.len(), max_length, "token exceeds maximum length");
                return Err(Error::TooLong { length: token.len(), max_length })
            }
        }
        trace!(packed_len = packed.len(), token_len = token.len(), "payload encoded");
        Ok(token)
    }

    /// Verify a token and return the packed bytes it carries.
    fn open(&self, token: &str) -> Result<Vec<u8>> {
        let Config { checksum_chars, ref private_salt, .. } = self.config;
        if !base64url::is_url_safe(token) {
            debug!(token_len = token.len(), "token has characters outside the URL-safe alphabet");
            return Err(Error::InvalidEncoding)
        }
        let token = base64url::from_url_safe(token);
        let Some((prefix, body)) = token.split_at_checked(checksum_chars) else {
            debug!(token_len = token.len(), checksum_chars, "token is shorter than its checksum");
            return Err(Error::InvalidEncoding)
        };
        if prefix != checksum(body.as_bytes(), private_salt, checksum_chars) {
            debug!(token_len = token.len(), "token checksum mismatch");
            return Err(Error::ChecksumMismatch)
        }
        base64url::decode(body).inspect_err(|_| {
            debug!(token_len = token.len(), "token body is not valid base64");
        })
    }
}
