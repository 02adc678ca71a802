//! The producer/consumer capability interfaces driven by the codec.
//!
//! Any mesh representation can participate: implement [`MeshSink`] to
//! receive triangles from a decoder, implement [`MeshSource`] to feed an
//! encoder. The codec only ever borrows these objects for the duration of a
//! single call and never stores triangle data after delivering it.

use crate::{
    error::Error,
    triangle::{Header, Triangle},
};


/// A triangle producer, read by the writers.
///
/// The writers call [`triangle`][MeshSource::triangle] exactly once per
/// index, in strictly increasing order, once per write pass. A source whose
/// `triangle_count` disagrees with the indices it can serve violates the
/// caller contract; that is not a stream error.
pub trait MeshSource {
    fn triangle_count(&self) -> u32;

    fn triangle(&self, index: u32) -> Triangle;
}

impl MeshSource for [Triangle] {
    fn triangle_count(&self) -> u32 {
        self.len() as u32
    }

    fn triangle(&self, index: u32) -> Triangle {
        self[index as usize]
    }
}

/// What is known about a solid at the moment it is opened.
///
/// ASCII solids carry an optional name; binary solids carry the declared
/// facet count (useful to pre-size mesh storage) and the raw 80-byte header.
#[derive(Debug, Clone, Copy)]
pub enum SolidMeta<'a> {
    Ascii { name: Option<&'a str> },
    Binary { facet_count: u32, header: &'a Header },
}

impl<'a> SolidMeta<'a> {
    /// The declared facet count, if the format provides one up front.
    pub fn size_hint(&self) -> Option<u32> {
        match self {
            SolidMeta::Ascii { .. } => None,
            SolidMeta::Binary { facet_count, .. } => Some(*facet_count),
        }
    }
}

/// A triangle consumer, fed by the readers.
///
/// Exactly one solid is opened per top-level block in the stream;
/// [`add_triangle`][MeshSink::add_triangle] is invoked once per decoded
/// triangle with a zero-based, monotonically increasing index (no gaps, no
/// reordering). `begin_solid`/`end_solid` default to no-ops.
///
/// The methods are fallible so that sinks which themselves write somewhere
/// (e.g. [`BinaryStreamWriter`][crate::binary::BinaryStreamWriter] during a
/// transcode) can propagate their stream errors through the running decode.
pub trait MeshSink {
    fn begin_solid(&mut self, _meta: SolidMeta<'_>) -> Result<(), Error> {
        Ok(())
    }

    fn add_triangle(&mut self, index: u32, triangle: &Triangle) -> Result<(), Error>;

    fn end_solid(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

/// A sink that simply collects everything into memory.
///
/// Multiple solids in one stream are concatenated; the name and header stem
/// from the first solid that provided them.
#[derive(Debug, Default)]
pub struct RawSolid {
    /// The solid name, if the stream was ASCII and carried one.
    pub name: Option<String>,

    /// The raw header, if the stream was binary.
    pub header: Option<Header>,

    /// All triangles in stream order.
    pub triangles: Vec<Triangle>,
}

impl RawSolid {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Cap on up-front reservation. Declared facet counts come straight off the
/// wire and are not trusted until the records actually arrive.
const MAX_PREALLOC: u32 = 1 << 16;

impl MeshSink for RawSolid {
    fn begin_solid(&mut self, meta: SolidMeta<'_>) -> Result<(), Error> {
        if let Some(count) = meta.size_hint() {
            self.triangles.reserve(count.min(MAX_PREALLOC) as usize);
        }

        match meta {
            SolidMeta::Ascii { name } => {
                if self.name.is_none() {
                    self.name = name.map(|n| n.to_string());
                }
            }
            SolidMeta::Binary { header, .. } => {
                if self.header.is_none() {
                    self.header = Some(*header);
                }
            }
        }
        Ok(())
    }

    fn add_triangle(&mut self, _index: u32, triangle: &Triangle) -> Result<(), Error> {
        self.triangles.push(*triangle);
        Ok(())
    }
}

/// A sink that only counts. Useful to cheaply measure a stream.
#[derive(Debug, Default)]
pub struct CounterSink {
    pub solid_count: u32,
    pub triangle_count: u32,
}

impl CounterSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MeshSink for CounterSink {
    fn begin_solid(&mut self, _meta: SolidMeta<'_>) -> Result<(), Error> {
        self.solid_count += 1;
        Ok(())
    }

    fn add_triangle(&mut self, _index: u32, _triangle: &Triangle) -> Result<(), Error> {
        self.triangle_count += 1;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_hint_is_only_known_for_binary_solids() {
        let header = Header::zeroed();
        let binary = SolidMeta::Binary { facet_count: 7, header: &header };
        let ascii = SolidMeta::Ascii { name: Some("x") };

        assert_eq!(binary.size_hint(), Some(7));
        assert_eq!(ascii.size_hint(), None);
    }

    #[test]
    fn raw_solid_presizes_from_the_hint_within_bounds() {
        let header = Header::zeroed();

        let mut solid = RawSolid::new();
        solid
            .begin_solid(SolidMeta::Binary { facet_count: 100, header: &header })
            .unwrap();
        assert!(solid.triangles.capacity() >= 100);

        // A hostile declared count must not force a giant allocation.
        // (`reserve` may round up, hence the slack.)
        let mut solid = RawSolid::new();
        solid
            .begin_solid(SolidMeta::Binary {
                facet_count: u32::MAX,
                header: &header,
            })
            .unwrap();
        assert!(solid.triangles.capacity() < 2 * MAX_PREALLOC as usize);
    }
}
