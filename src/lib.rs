//! Compact, checksummed, URL-safe tokens carrying small structured payloads.
/*!

A token is a short checksum prefix followed by the URL-safe base64 of a
MessagePack encoded map or array. Tokens fit in a path segment or a query
value and decode back to the exact values they were made from.

```
use payload_token::{Config, Map, PayloadCodec, Value};

let codec = PayloadCodec::default();

let mut payload = Map::new();
payload.insert("hello", "world");
let token = codec.encode(&Value::Map(payload.clone()))?;
assert_eq!(token, "U4iEgaVoZWxsb6V3b3JsZA");
assert_eq!(codec.decode(&token)?, Value::Map(payload));

let codec = PayloadCodec::new(Config::new().with_max_length(20))?;
let payload = Value::from_iter(["01234567890123456789"]);
assert!(codec.encode(&payload).is_err());
# Ok::<(), payload_token::Error>(())
```

Top-level keys are sorted with natural ordering before packing, so maps with
the same entries always produce the same token.

Token layout:

| part     | content
|----------|---------------------------------------------------------------
| prefix   | first `checksum_chars` characters of base64 `SHA-1(body ++ salt)`
| body     | unpadded base64 of the packed payload

Both parts use the URL-safe alphabet (`-` and `_` in place of `+` and `/`).
The checksum is computed over the body in the standard alphabet.

The checksum only catches corruption and casual tampering. It is not an
authentication code, however long the prefix and secret the salt.

The value model and the MessagePack engine live in [`msgpack`].
*/
#![no_std]
#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

pub mod base64url;
pub mod checksum;
pub mod normalize;
mod codec;
mod config;
mod error;

pub use payload_msgpack::{self as msgpack, Key, Map, Value};

pub use codec::PayloadCodec;
pub use config::{Config, DEFAULT_CHECKSUM_CHARS};
pub use error::{Error, Result};
