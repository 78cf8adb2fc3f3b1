//! Byte sinks for the packer.
use core::fmt;

use alloc::vec::Vec;

/// Error of a [`PackWrite`] sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum WriteError {
    /// The sink can not take more bytes
    BufferFull,
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WriteError::BufferFull => "no room left in the MessagePack output"
        })
    }
}

impl serde::ser::StdError for WriteError {}

/// A sink for packed bytes.
///
/// [`to_writer`](crate::to_writer) takes any implementation. Growable
/// vectors never fail, a bounded sink reports [`WriteError::BufferFull`].
pub trait PackWrite {
    /// Append all of `bytes`, or fail without a partial write.
    fn write(&mut self, bytes: &[u8]) -> Result<(), WriteError>;

    /// Append a single `byte`.
    #[inline]
    fn write_byte(&mut self, byte: u8) -> Result<(), WriteError> {
        self.write(&[byte])
    }
}

impl<W: PackWrite + ?Sized> PackWrite for &mut W {
    #[inline]
    fn write(&mut self, bytes: &[u8]) -> Result<(), WriteError> {
        W::write(self, bytes)
    }

    #[inline]
    fn write_byte(&mut self, byte: u8) -> Result<(), WriteError> {
        W::write_byte(self, byte)
    }
}

impl PackWrite for Vec<u8> {
    #[inline]
    fn write(&mut self, bytes: &[u8]) -> Result<(), WriteError> {
        self.extend_from_slice(bytes);
        Ok(())
    }

    #[inline]
    fn write_byte(&mut self, byte: u8) -> Result<(), WriteError> {
        self.push(byte);
        Ok(())
    }
}
