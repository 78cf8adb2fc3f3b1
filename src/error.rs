use core::fmt;

use alloc::string::{String, ToString};

use payload_msgpack::{de, ser};

/// Codec result
pub type Result<T> = core::result::Result<T, Error>;

/// Codec error
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The payload is not an array or a map, or contains a value that can
    /// not be packed
    UnsupportedType,
    /// A string or a collection in the payload is too large to pack
    Overflow,
    /// A `Serialize` implementation failed
    Serialize(String),
    /// The token would exceed the configured maximum length
    TooLong {
        length: usize,
        max_length: usize
    },
    /// The token is shorter than its checksum or is not valid base64
    InvalidEncoding,
    /// The checksum does not match the token body
    ChecksumMismatch,
    /// The token body is not a packed array or map
    ///
    /// Holds the unpacking error, if there was one.
    InvalidPayload(Option<de::Error>),
    /// The configuration was rejected
    InvalidConfig(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnsupportedType => f.write_str("payload must be an array or a map of packable values"),
            Error::Overflow => f.write_str("payload value is too large"),
            Error::Serialize(s) => write!(f, "payload serialization failed: {}", s),
            Error::TooLong { length, max_length } => {
                write!(f, "token length {} exceeds maximum length of {}", length, max_length)
            }
            Error::InvalidEncoding => f.write_str("invalid token encoding"),
            Error::ChecksumMismatch => f.write_str("invalid token checksum"),
            Error::InvalidPayload(Some(err)) => write!(f, "invalid token payload: {}", err),
            Error::InvalidPayload(None) => f.write_str("invalid token payload: not an array or a map"),
            Error::InvalidConfig(s) => write!(f, "invalid configuration: {}", s),
        }
    }
}

impl core::error::Error for Error {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Error::InvalidPayload(Some(err)) => Some(err),
            _ => None
        }
    }
}

impl From<ser::Error> for Error {
    fn from(err: ser::Error) -> Self {
        match err {
            ser::Error::UnsupportedType => Error::UnsupportedType,
            ser::Error::Overflow => Error::Overflow,
            err => Error::Serialize(err.to_string())
        }
    }
}

impl From<de::Error> for Error {
    fn from(err: de::Error) -> Self {
        Error::InvalidPayload(Some(err))
    }
}

#[cfg(test)]
mod tests {
    use alloc::format;
    use super::*;

    #[test]
    fn test_from_ser_error() {
        assert_eq!(Error::from(ser::Error::UnsupportedType), Error::UnsupportedType);
        assert_eq!(Error::from(ser::Error::Overflow), Error::Overflow);
        assert_eq!(Error::from(ser::Error::LengthMismatch),
                   Error::Serialize("Collection length is unknown or does not match the number of elements".into()));
    }

    #[test]
    fn test_source() {
        use core::error::Error as _;
        let err = Error::from(de::Error::TruncatedInput);
        assert_eq!(err, Error::InvalidPayload(Some(de::Error::TruncatedInput)));
        assert_eq!(err.source().map(|e| format!("{}", e)), Some("Unexpected end of MessagePack input".into()));
        assert!(Error::ChecksumMismatch.source().is_none());
        assert!(Error::InvalidPayload(None).source().is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Error::TooLong { length: 32, max_length: 20 }),
                   "token length 32 exceeds maximum length of 20");
        assert_eq!(format!("{}", Error::InvalidPayload(Some(de::Error::UnknownTag(0xC1)))),
                   "invalid token payload: Unknown MessagePack code 0xc1 in input");
    }
}
