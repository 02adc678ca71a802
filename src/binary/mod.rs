//! Reading and writing of the binary STL format.

use std::convert::TryFrom;

use crate::{error::Error, sniff::Format};

mod read;
mod write;

pub use self::{
    read::{BinaryReadOptions, BinaryReader},
    write::{write_binary, BinaryStreamWriter, BinaryWriteOptions, BinaryWriter},
};


/// Byte order of the `f32`/`u32`/`u16` fields of a binary stream.
///
/// Little endian is what the ecosystem almost universally produces; big
/// endian streams exist in the wild and are decoded transparently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

impl Default for Endianness {
    fn default() -> Self {
        Endianness::Little
    }
}

impl TryFrom<Format> for Endianness {
    type Error = Error;

    fn try_from(format: Format) -> Result<Self, Error> {
        match format {
            Format::BinaryLe => Ok(Endianness::Little),
            Format::BinaryBe => Ok(Endianness::Big),
            Format::Ascii | Format::Unknown => Err(Error::UnsupportedByteOrder),
        }
    }
}
