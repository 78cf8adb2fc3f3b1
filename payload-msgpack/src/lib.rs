//! A MessagePack value model with a serde serializer and a cursor-driven deserializer.
/*!

The format is the subset of MessagePack carried by compact payload tokens.
Everything [`pack`] writes is plain MessagePack, and [`unpack`] reads the
common encodings other implementations produce.

Writing:

| Rust / serde                          | MessagePack
|---------------------------------------|---------------------------------------------
| `()`, `None`, unit struct             | `nil`
| `bool`                                | `true`, `false`
| `u8`..`u64`, `i8`..`i64`              | the shortest `fixint`, `uint` or `int`; never `int` for `n >= 0`
| `i128`, `u128`                        | as above, `Overflow` outside 64 bits
| `f32`, `f64`                          | always `float 64`
| `str`, `char`, `bytes`                | `fixstr`, `str 16` or `str 32`
| sequence, tuple, tuple struct         | `fixarray`, `array 16` or `array 32`
| map, struct                           | `fixmap`, `map 16` or `map 32`
| unit variant                          | the variant name
| newtype, tuple and struct variants    | `{name: payload}`
| [`Value::Map`] with only integer keys | an array of its values

Reading:

| MessagePack                           | visited as
|---------------------------------------|---------------------------------------------
| `nil`, `true`, `false`                | unit, bool
| any integer                           | `u64` when non-negative, `i64` otherwise
| `float 32`, `float 64`                | `f64`
| `str 8/16/32`, `fixstr`               | borrowed `str`, or borrowed bytes if not UTF-8
| `bin 8/16/32`                         | borrowed bytes
| array, map                            | sequence, map
| `ext`, `fixext`, `0xc1`               | rejected with [`de::Error::UnknownTag`]

Typed targets coerce through serde's visitors, so `u8` accepts any integer
in range and a struct accepts a map or an array.
*/
#![no_std]
#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

pub mod write;
pub mod value;
pub mod ser;
pub mod de;

pub use write::{PackWrite, WriteError};
pub use value::{Key, Map, Value};
pub use ser::{pack, to_vec, to_writer};
pub use de::{unpack, from_slice, from_slice_exact, MAX_DEPTH};

/// Return `true` if `tag` opens a MessagePack array or map.
///
/// A token payload is always one of the two, so this rejects scalars
/// without parsing anything else.
pub fn is_collection_tag(tag: u8) -> bool {
    use marker::*;
    matches!(tag, FIXMAP..=FIXARRAY_LAST|ARRAY16|ARRAY32|MAP16|MAP32)
}

/// Format markers, the first byte of every packed value.
mod marker {
    pub const NIL: u8 = 0xC0;
    pub const FALSE: u8 = 0xC2;
    pub const TRUE: u8 = 0xC3;

    pub const BIN8: u8 = 0xC4;
    pub const BIN16: u8 = 0xC5;
    pub const BIN32: u8 = 0xC6;
    pub const FLOAT32: u8 = 0xCA;
    pub const FLOAT64: u8 = 0xCB;
    pub const UINT8: u8 = 0xCC;
    pub const UINT16: u8 = 0xCD;
    pub const UINT32: u8 = 0xCE;
    pub const UINT64: u8 = 0xCF;
    pub const INT8: u8 = 0xD0;
    pub const INT16: u8 = 0xD1;
    pub const INT32: u8 = 0xD2;
    pub const INT64: u8 = 0xD3;
    pub const STR8: u8 = 0xD9;
    pub const STR16: u8 = 0xDA;
    pub const STR32: u8 = 0xDB;
    pub const ARRAY16: u8 = 0xDC;
    pub const ARRAY32: u8 = 0xDD;
    pub const MAP16: u8 = 0xDE;
    pub const MAP32: u8 = 0xDF;

    // The low bits of these carry a length or a value.
    pub const POSFIXINT_LAST: u8 = 0x7F;
    pub const FIXMAP: u8 = 0x80;
    pub const FIXMAP_LAST: u8 = 0x8F;
    pub const FIXARRAY: u8 = 0x90;
    pub const FIXARRAY_LAST: u8 = 0x9F;
    pub const FIXSTR: u8 = 0xA0;
    pub const FIXSTR_LAST: u8 = 0xBF;
    pub const NEGFIXINT: u8 = 0xE0;

    /// Longest array or map with the length in its marker.
    pub const FIX_COLLECTION_LEN: usize = 15;
    /// Longest string with the length in its marker.
    pub const FIXSTR_LEN: usize = 31;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_tags() {
        for tag in [0x80, 0x8f, 0x90, 0x9f, 0xdc, 0xdd, 0xde, 0xdf] {
            assert!(is_collection_tag(tag), "{:#04x}", tag);
        }
        for tag in [0x00, 0x7f, 0xa0, 0xc0, 0xc3, 0xcb, 0xda, 0xe0, 0xff] {
            assert!(!is_collection_tag(tag), "{:#04x}", tag);
        }
    }
}
