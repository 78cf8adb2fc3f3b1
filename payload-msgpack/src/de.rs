//! MessagePack serde deserializer
use core::{fmt, str};

use alloc::string::{String, ToString};

use serde::de::{self, DeserializeSeed, Unexpected, Visitor};

use crate::marker::*;
use crate::value::Value;

/// Maximum nesting of arrays, maps and enum variants accepted on read.
pub const MAX_DEPTH: usize = 128;

/// Deserialization result
pub type Result<T> = core::result::Result<T, Error>;

/// Deserialization error
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
#[non_exhaustive]
pub enum Error {
    /// A reserved or an extension type code was found
    UnknownTag(u8),
    /// Input ended before a declared length was satisfied
    TruncatedInput,
    /// Unparsed bytes follow the message
    TrailingBytes,
    /// Collections are nested deeper than [`MAX_DEPTH`]
    DepthLimitExceeded,
    /// The input does not fit the requested type, or an error passed
    /// down from a [`serde::de::Deserialize`] implementation
    Custom(String),
}

impl serde::de::StdError for Error {}

impl de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Error::UnknownTag(tag) => return write!(f, "Unknown MessagePack code {:#04x} in input", tag),
            Error::TruncatedInput => "Unexpected end of MessagePack input",
            Error::TrailingBytes => "Unexpected bytes after MessagePack input",
            Error::DepthLimitExceeded => "MessagePack input is nested too deeply",
            Error::Custom(s) => return write!(f, "{} while deserializing MessagePack", s),
        })
    }
}

/// Unpack a single [`Value`] occupying the whole `input`.
///
/// Bytes left after the value are rejected with [`Error::TrailingBytes`].
pub fn unpack(input: &[u8]) -> Result<Value> {
    from_slice_exact(input)
}

/// Deserialize a `T` from the front of `input`.
///
/// Return the value and the number of bytes it took. Borrowed `&str`
/// and `&[u8]` in `T` point into `input`.
pub fn from_slice<'a, T>(input: &'a [u8]) -> Result<(T, usize)>
    where T: de::Deserialize<'a>
{
    let mut de = Deserializer::new(input);
    let value = T::deserialize(&mut de)?;
    Ok((value, de.position()))
}

/// Deserialize a `T` that must span the whole `input`.
pub fn from_slice_exact<'a, T>(input: &'a [u8]) -> Result<T>
    where T: de::Deserialize<'a>
{
    match from_slice(input)? {
        (value, len) if len == input.len() => Ok(value),
        _ => Err(Error::TrailingBytes)
    }
}

/// Serde MessagePack deserializer.
///
/// Every value is read by its marker and handed to the visitor as the
/// closest serde type, typed targets coerce from there. Collections
/// nested deeper than [`MAX_DEPTH`] are refused.
pub struct Deserializer<'de> {
    input: &'de [u8],
    pos: usize,
    depth: usize,
}

/// A decoded marker with its fixed-size payload. Lengths are not yet
/// checked against the input.
enum Head {
    Nil,
    Bool(bool),
    UInt(u64),
    Int(i64),
    Float(f64),
    Str(usize),
    Bin(usize),
    Array(usize),
    Map(usize),
}

impl<'de> Deserializer<'de> {
    pub fn new(input: &'de [u8]) -> Self {
        Deserializer { input, pos: 0, depth: 0 }
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn remaining_len(&self) -> usize {
        self.input.len() - self.pos
    }

    fn peek(&self) -> Result<u8> {
        self.input.get(self.pos).copied().ok_or(Error::TruncatedInput)
    }

    fn byte(&mut self) -> Result<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Ok(byte)
    }

    fn bytes(&mut self, len: usize) -> Result<&'de [u8]> {
        let input = self.input;
        let end = self.pos.checked_add(len).ok_or(Error::TruncatedInput)?;
        let bytes = input.get(self.pos..end).ok_or(Error::TruncatedInput)?;
        self.pos = end;
        Ok(bytes)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        self.bytes(N)?.try_into().map_err(|_| Error::TruncatedInput)
    }

    fn len16(&mut self) -> Result<usize> {
        Ok(u16::from_be_bytes(self.array()?).into())
    }

    fn len32(&mut self) -> Result<usize> {
        usize::try_from(u32::from_be_bytes(self.array()?)).map_err(|_| Error::TruncatedInput)
    }

    fn head(&mut self) -> Result<Head> {
        let tag = self.byte()?;
        Ok(match tag {
            0..=POSFIXINT_LAST => Head::UInt(tag.into()),
            FIXMAP..=FIXMAP_LAST => Head::Map((tag - FIXMAP).into()),
            FIXARRAY..=FIXARRAY_LAST => Head::Array((tag - FIXARRAY).into()),
            FIXSTR..=FIXSTR_LAST => Head::Str((tag - FIXSTR).into()),
            NEGFIXINT..=0xFF => Head::Int(i8::from_be_bytes([tag]).into()),
            NIL => Head::Nil,
            FALSE => Head::Bool(false),
            TRUE => Head::Bool(true),
            BIN8 => Head::Bin(self.byte()?.into()),
            BIN16 => Head::Bin(self.len16()?),
            BIN32 => Head::Bin(self.len32()?),
            FLOAT32 => Head::Float(f32::from_be_bytes(self.array()?).into()),
            FLOAT64 => Head::Float(f64::from_be_bytes(self.array()?)),
            UINT8 => Head::UInt(self.byte()?.into()),
            UINT16 => Head::UInt(u16::from_be_bytes(self.array()?).into()),
            UINT32 => Head::UInt(u32::from_be_bytes(self.array()?).into()),
            UINT64 => Head::UInt(u64::from_be_bytes(self.array()?)),
            INT8 => Head::Int(i8::from_be_bytes(self.array()?).into()),
            INT16 => Head::Int(i16::from_be_bytes(self.array()?).into()),
            INT32 => Head::Int(i32::from_be_bytes(self.array()?).into()),
            INT64 => Head::Int(i64::from_be_bytes(self.array()?)),
            STR8 => Head::Str(self.byte()?.into()),
            STR16 => Head::Str(self.len16()?),
            STR32 => Head::Str(self.len32()?),
            ARRAY16 => Head::Array(self.len16()?),
            ARRAY32 => Head::Array(self.len32()?),
            MAP16 => Head::Map(self.len16()?),
            MAP32 => Head::Map(self.len32()?),
            _ => return Err(Error::UnknownTag(tag))
        })
    }

    /// Run `f` one nesting level deeper.
    fn nested<T, F>(&mut self, f: F) -> Result<T>
        where F: FnOnce(&mut Self) -> Result<T>
    {
        if self.depth >= MAX_DEPTH {
            return Err(Error::DepthLimitExceeded)
        }
        self.depth += 1;
        let res = f(self);
        self.depth -= 1;
        res
    }
}

impl<'de> de::Deserializer<'de> for &mut Deserializer<'de> {
    type Error = Error;

    fn is_human_readable(&self) -> bool {
        false
    }

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
        where V: Visitor<'de>
    {
        match self.head()? {
            Head::Nil => visitor.visit_unit(),
            Head::Bool(b) => visitor.visit_bool(b),
            Head::UInt(n) => visitor.visit_u64(n),
            Head::Int(n) => visitor.visit_i64(n),
            Head::Float(f) => visitor.visit_f64(f),
            // strings are not guaranteed to be UTF-8
            Head::Str(len) => {
                let bytes = self.bytes(len)?;
                match str::from_utf8(bytes) {
                    Ok(s) => visitor.visit_borrowed_str(s),
                    Err(_) => visitor.visit_borrowed_bytes(bytes)
                }
            }
            Head::Bin(len) => visitor.visit_borrowed_bytes(self.bytes(len)?),
            Head::Array(len) => self.nested(|de| {
                let mut access = Counted { de, len, remaining: len };
                let value = visitor.visit_seq(&mut access)?;
                access.finish()?;
                Ok(value)
            }),
            Head::Map(len) => self.nested(|de| {
                let mut access = Counted { de, len, remaining: len };
                let value = visitor.visit_map(&mut access)?;
                access.finish()?;
                Ok(value)
            }),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
        where V: Visitor<'de>
    {
        if self.peek()? == NIL {
            self.pos += 1;
            return visitor.visit_none()
        }
        visitor.visit_some(self)
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
        where V: Visitor<'de>
    {
        visitor.visit_newtype_struct(self)
    }

    /// A unit variant is its bare name or index, any other variant is
    /// a one-entry map from the name to the payload.
    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V
    ) -> Result<V::Value>
        where V: Visitor<'de>
    {
        if self.peek()? == FIXMAP | 1 {
            self.pos += 1;
            return self.nested(|de| visitor.visit_enum(Variant { de, payload: true }))
        }
        visitor.visit_enum(Variant { de: self, payload: false })
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple tuple_struct map struct
        identifier ignored_any
    }
}

/// Walks the announced number of array elements or map entries.
struct Counted<'a, 'de> {
    de: &'a mut Deserializer<'de>,
    len: usize,
    remaining: usize,
}

impl<'de> Counted<'_, 'de> {
    fn next<T>(&mut self, seed: T) -> Result<Option<T::Value>>
        where T: DeserializeSeed<'de>
    {
        if self.remaining == 0 {
            return Ok(None)
        }
        self.remaining -= 1;
        seed.deserialize(&mut *self.de).map(Some)
    }

    /// Every element takes at least one byte, so the hint never exceeds
    /// what is left of the input.
    fn hint(&self, bytes_each: usize) -> Option<usize> {
        Some(self.remaining.min(self.de.remaining_len() / bytes_each))
    }

    fn finish(self) -> Result<()> {
        match self.remaining {
            0 => Ok(()),
            _ => Err(de::Error::invalid_length(self.len, &"fewer elements"))
        }
    }
}

impl<'de> de::SeqAccess<'de> for Counted<'_, 'de> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
        where T: DeserializeSeed<'de>
    {
        self.next(seed)
    }

    fn size_hint(&self) -> Option<usize> {
        self.hint(1)
    }
}

impl<'de> de::MapAccess<'de> for Counted<'_, 'de> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
        where K: DeserializeSeed<'de>
    {
        self.next(seed)
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
        where V: DeserializeSeed<'de>
    {
        seed.deserialize(&mut *self.de)
    }

    fn size_hint(&self) -> Option<usize> {
        self.hint(2)
    }
}

struct Variant<'a, 'de> {
    de: &'a mut Deserializer<'de>,
    payload: bool,
}

impl Variant<'_, '_> {
    fn expect_payload(&self, expected: &'static str) -> Result<()> {
        match self.payload {
            true => Ok(()),
            false => Err(de::Error::invalid_type(Unexpected::UnitVariant, &expected))
        }
    }
}

impl<'de> de::EnumAccess<'de> for Variant<'_, 'de> {
    type Error = Error;
    type Variant = Self;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self)>
        where V: DeserializeSeed<'de>
    {
        let variant = seed.deserialize(&mut *self.de)?;
        Ok((variant, self))
    }
}

impl<'de> de::VariantAccess<'de> for Variant<'_, 'de> {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.payload {
            false => Ok(()),
            true => Err(de::Error::invalid_type(Unexpected::Map, &"unit variant"))
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
        where T: DeserializeSeed<'de>
    {
        self.expect_payload("newtype variant")?;
        seed.deserialize(self.de)
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
        where V: Visitor<'de>
    {
        self.expect_payload("tuple variant")?;
        de::Deserializer::deserialize_any(self.de, visitor)
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value>
        where V: Visitor<'de>
    {
        self.expect_payload("struct variant")?;
        de::Deserializer::deserialize_any(self.de, visitor)
    }
}
