//! MessagePack serde serializer
use core::fmt;

use alloc::{string::{String, ToString}, vec::Vec};

use serde::{ser, Serialize};

use crate::marker::*;
use crate::value::Value;
use crate::write::{PackWrite, WriteError};

/// Serialization result
pub type Result<T> = core::result::Result<T, Error>;

/// Serialization error
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Error {
    /// The sink ran out of capacity
    BufferFull,
    /// A value with no representation in the payload format,
    /// such as a map key that is neither an integer nor a string
    UnsupportedType,
    /// An integer wider than 64 bits, or a string or a collection
    /// longer than `u32::MAX`
    Overflow,
    /// A sequence or a map of unknown length, or with a different
    /// number of elements than announced
    LengthMismatch,
    /// An error passed down from a [`serde::ser::Serialize`] implementation
    Custom(String),
}

impl serde::ser::StdError for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Error::BufferFull => "MessagePack output buffer is full",
            Error::UnsupportedType => "Value type can not be packed as MessagePack payload",
            Error::Overflow => "Value exceeds MessagePack size limits",
            Error::LengthMismatch => "Collection length is unknown or does not match the number of elements",
            Error::Custom(s) => return write!(f, "{} while serializing MessagePack", s),
        })
    }
}

impl ser::Error for Error {
    fn custom<T>(msg: T) -> Self
        where T: fmt::Display
    {
        Error::Custom(msg.to_string())
    }
}

impl From<WriteError> for Error {
    fn from(err: WriteError) -> Self {
        match err {
            WriteError::BufferFull => Error::BufferFull
        }
    }
}

/// Pack a [`Value`] into a new vector of bytes.
///
/// Maps with only integer keys are packed as arrays.
pub fn pack(value: &Value) -> Result<Vec<u8>> {
    to_vec(value)
}

/// Serialize `value` as a MessagePack message to a new vector of bytes.
pub fn to_vec<T>(value: &T) -> Result<Vec<u8>>
    where T: ?Sized + Serialize
{
    let mut packed = Vec::new();
    to_writer(&mut packed, value)?;
    Ok(packed)
}

/// Serialize `value` as a MessagePack message to any [`PackWrite`] sink.
///
/// Structs are serialized as maps with field names.
pub fn to_writer<W, T>(writer: W, value: &T) -> Result<()>
    where W: PackWrite, T: ?Sized + Serialize
{
    value.serialize(&mut Serializer::new(writer))
}

/// Serde MessagePack serializer.
pub struct Serializer<W> {
    output: W,
    // set while a map key is being written
    key: bool,
}

impl<W> Serializer<W> {
    pub fn new(output: W) -> Self {
        Serializer { output, key: false }
    }

    pub fn into_inner(self) -> W {
        self.output
    }
}

impl<W: PackWrite> Serializer<W> {
    /// Map keys are limited to integers and strings.
    fn scalar_only(&self) -> Result<()> {
        if self.key {
            return Err(Error::UnsupportedType)
        }
        Ok(())
    }

    fn put_str(&mut self, bytes: &[u8]) -> Result<()> {
        self.output.put_header(Header::Str, bytes.len())?;
        Ok(self.output.write(bytes)?)
    }

    /// Open a one-entry map keyed by the variant name.
    fn put_variant(&mut self, variant: &str) -> Result<()> {
        self.scalar_only()?;
        self.output.write_byte(FIXMAP | 1)?;
        self.put_str(variant.as_bytes())
    }

    fn begin<'a>(&'a mut self, header: Header, len: usize) -> Result<Compound<'a, W>> {
        self.scalar_only()?;
        self.output.put_header(header, len)?;
        Ok(Compound { ser: self, remaining: len })
    }
}

/// Length-prefixed value families.
#[derive(Clone, Copy)]
enum Header {
    Str,
    Array,
    Map,
}

trait PackExt: PackWrite {
    fn put(&mut self, marker: u8, payload: &[u8]) -> Result<()> {
        self.write_byte(marker)?;
        Ok(self.write(payload)?)
    }

    fn put_uint(&mut self, n: u64) -> Result<()> {
        if let Ok(n) = u8::try_from(n) {
            if n <= POSFIXINT_LAST {
                return Ok(self.write_byte(n)?)
            }
            self.put(UINT8, &[n])
        }
        else if let Ok(n) = u16::try_from(n) {
            self.put(UINT16, &n.to_be_bytes())
        }
        else if let Ok(n) = u32::try_from(n) {
            self.put(UINT32, &n.to_be_bytes())
        }
        else {
            self.put(UINT64, &n.to_be_bytes())
        }
    }

    /// Non-negative integers always take the unsigned forms.
    fn put_int(&mut self, n: i64) -> Result<()> {
        if let Ok(n) = u64::try_from(n) {
            return self.put_uint(n)
        }
        if let Ok(n) = i8::try_from(n) {
            let [byte] = n.to_be_bytes();
            if byte >= NEGFIXINT {
                return Ok(self.write_byte(byte)?)
            }
            self.put(INT8, &[byte])
        }
        else if let Ok(n) = i16::try_from(n) {
            self.put(INT16, &n.to_be_bytes())
        }
        else if let Ok(n) = i32::try_from(n) {
            self.put(INT32, &n.to_be_bytes())
        }
        else {
            self.put(INT64, &n.to_be_bytes())
        }
    }

    fn put_header(&mut self, header: Header, len: usize) -> Result<()> {
        let (fixed, fixed_len, marker16, marker32) = match header {
            Header::Str => (FIXSTR, FIXSTR_LEN, STR16, STR32),
            Header::Array => (FIXARRAY, FIX_COLLECTION_LEN, ARRAY16, ARRAY32),
            Header::Map => (FIXMAP, FIX_COLLECTION_LEN, MAP16, MAP32),
        };
        if len <= fixed_len {
            Ok(self.write_byte(fixed | len as u8)?)
        }
        else if let Ok(len) = u16::try_from(len) {
            self.put(marker16, &len.to_be_bytes())
        }
        else if let Ok(len) = u32::try_from(len) {
            self.put(marker32, &len.to_be_bytes())
        }
        else {
            Err(Error::Overflow)
        }
    }
}

impl<W: PackWrite + ?Sized> PackExt for W {}

macro_rules! serialize_integers {
    ($($method:ident($ty:ty) => $put:ident($wide:ty)),* $(,)?) => {$(
        fn $method(self, v: $ty) -> Result<()> {
            let v: $wide = v.try_into().map_err(|_| Error::Overflow)?;
            self.output.$put(v)
        }
    )*};
}

impl<'a, W: PackWrite> ser::Serializer for &'a mut Serializer<W> {
    type Ok = ();
    type Error = Error;

    type SerializeSeq = Compound<'a, W>;
    type SerializeTuple = Compound<'a, W>;
    type SerializeTupleStruct = Compound<'a, W>;
    type SerializeTupleVariant = Compound<'a, W>;
    type SerializeMap = Compound<'a, W>;
    type SerializeStruct = Compound<'a, W>;
    type SerializeStructVariant = Compound<'a, W>;

    fn is_human_readable(&self) -> bool {
        false
    }

    serialize_integers! {
        serialize_i8(i8) => put_int(i64),
        serialize_i16(i16) => put_int(i64),
        serialize_i32(i32) => put_int(i64),
        serialize_i64(i64) => put_int(i64),
        serialize_i128(i128) => put_int(i64),
        serialize_u8(u8) => put_uint(u64),
        serialize_u16(u16) => put_uint(u64),
        serialize_u32(u32) => put_uint(u64),
        serialize_u64(u64) => put_uint(u64),
        serialize_u128(u128) => put_uint(u64),
    }

    fn serialize_bool(self, v: bool) -> Result<()> {
        self.scalar_only()?;
        Ok(self.output.write_byte(if v { TRUE } else { FALSE })?)
    }

    /// Single precision is widened, only `float 64` is written.
    fn serialize_f32(self, v: f32) -> Result<()> {
        self.serialize_f64(v.into())
    }

    fn serialize_f64(self, v: f64) -> Result<()> {
        self.scalar_only()?;
        self.output.put(FLOAT64, &v.to_be_bytes())
    }

    fn serialize_char(self, v: char) -> Result<()> {
        self.put_str(v.encode_utf8(&mut [0; 4]).as_bytes())
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        self.put_str(v.as_bytes())
    }

    /// Byte strings share the `str` family with text.
    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        self.put_str(v)
    }

    fn serialize_none(self) -> Result<()> {
        self.serialize_unit()
    }

    fn serialize_some<T>(self, value: &T) -> Result<()>
        where T: ?Sized + Serialize
    {
        self.scalar_only()?;
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        self.scalar_only()?;
        Ok(self.output.write_byte(NIL)?)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        self.serialize_unit()
    }

    fn serialize_unit_variant(self, _name: &'static str, _index: u32, variant: &'static str) -> Result<()> {
        self.put_str(variant.as_bytes())
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<()>
        where T: ?Sized + Serialize
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        value: &T
    ) -> Result<()>
        where T: ?Sized + Serialize
    {
        self.put_variant(variant)?;
        value.serialize(self)
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Compound<'a, W>> {
        self.begin(Header::Array, len.ok_or(Error::LengthMismatch)?)
    }

    fn serialize_tuple(self, len: usize) -> Result<Compound<'a, W>> {
        self.begin(Header::Array, len)
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<Compound<'a, W>> {
        self.begin(Header::Array, len)
    }

    /// `{variant: [fields...]}`
    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize
    ) -> Result<Compound<'a, W>> {
        self.put_variant(variant)?;
        self.begin(Header::Array, len)
    }

    fn serialize_map(self, len: Option<usize>) -> Result<Compound<'a, W>> {
        self.begin(Header::Map, len.ok_or(Error::LengthMismatch)?)
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<Compound<'a, W>> {
        self.begin(Header::Map, len)
    }

    /// `{variant: {field: value...}}`
    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize
    ) -> Result<Compound<'a, W>> {
        self.put_variant(variant)?;
        self.begin(Header::Map, len)
    }
}

/// Array elements or map entries, counted against the announced length.
pub struct Compound<'a, W> {
    ser: &'a mut Serializer<W>,
    remaining: usize,
}

impl<W: PackWrite> Compound<'_, W> {
    fn count(&mut self) -> Result<()> {
        self.remaining = self.remaining.checked_sub(1).ok_or(Error::LengthMismatch)?;
        Ok(())
    }

    fn element<T>(&mut self, value: &T) -> Result<()>
        where T: ?Sized + Serialize
    {
        self.count()?;
        value.serialize(&mut *self.ser)
    }

    fn field<T>(&mut self, name: &str, value: &T) -> Result<()>
        where T: ?Sized + Serialize
    {
        self.count()?;
        self.ser.put_str(name.as_bytes())?;
        value.serialize(&mut *self.ser)
    }

    fn finish(self) -> Result<()> {
        match self.remaining {
            0 => Ok(()),
            _ => Err(Error::LengthMismatch)
        }
    }
}

macro_rules! impl_elements {
    ($($trait:ident::$method:ident),*) => {$(
        impl<W: PackWrite> ser::$trait for Compound<'_, W> {
            type Ok = ();
            type Error = Error;

            fn $method<T>(&mut self, value: &T) -> Result<()>
                where T: ?Sized + Serialize
            {
                self.element(value)
            }

            fn end(self) -> Result<()> {
                self.finish()
            }
        }
    )*};
}

impl_elements!(
    SerializeSeq::serialize_element,
    SerializeTuple::serialize_element,
    SerializeTupleStruct::serialize_field,
    SerializeTupleVariant::serialize_field
);

macro_rules! impl_fields {
    ($($trait:ident),*) => {$(
        impl<W: PackWrite> ser::$trait for Compound<'_, W> {
            type Ok = ();
            type Error = Error;

            fn serialize_field<T>(&mut self, name: &'static str, value: &T) -> Result<()>
                where T: ?Sized + Serialize
            {
                self.field(name, value)
            }

            fn end(self) -> Result<()> {
                self.finish()
            }
        }
    )*};
}

impl_fields!(SerializeStruct, SerializeStructVariant);

impl<W: PackWrite> ser::SerializeMap for Compound<'_, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
        where T: ?Sized + Serialize
    {
        self.count()?;
        self.ser.key = true;
        let res = key.serialize(&mut *self.ser);
        self.ser.key = false;
        res
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
        where T: ?Sized + Serialize
    {
        value.serialize(&mut *self.ser)
    }

    fn end(self) -> Result<()> {
        self.finish()
    }
}
