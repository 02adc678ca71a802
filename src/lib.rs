//! Streaming codec for the STL mesh exchange format.
//!
//! STL stores a triangle soup: a flat list of facets, each a normal plus
//! three vertex positions, with no connectivity. It comes in two wire
//! flavors, a textual one (`solid ... facet ... endsolid`) and a binary one
//! (80-byte header, facet count, 50-byte records), the latter in either byte
//! order.
//!
//! Everything in this crate streams: readers deliver each triangle to a
//! [`MeshSink`] the moment it is decoded, writers pull triangles from a
//! [`MeshSource`] one at a time. Peak memory is bounded by a single transfer
//! buffer ([`MemBlock`], 128 KiB by default), independent of mesh size, so
//! multi-gigabyte files are fine.
//!
//!
//! # Reading
//!
//! [`read_stl`] sniffs the format and dispatches to the right decoder:
//!
//! ```no_run
//! use std::{fs::File, io::BufReader};
//! use stl_stream::{read_stl, RawSolid};
//!
//! # fn main() -> Result<(), failure::Error> {
//! let mut file = BufReader::new(File::open("mesh.stl")?);
//! let mut solid = RawSolid::new();
//! let format = read_stl(&mut file, &mut solid)?;
//! println!("{:?}: {} triangles", format, solid.triangles.len());
//! # Ok(())
//! # }
//! ```
//!
//! When the format is already known, use [`ascii::AsciiReader`] or
//! [`binary::BinaryReader`] directly (these also work on non-seekable
//! streams). [`probe_infos`] extracts metadata (facet count, solid name,
//! size) without a full decode.
//!
//!
//! # Writing
//!
//! [`binary::write_binary`] and [`ascii::write_ascii`] cover the common
//! case; [`binary::BinaryWriter`] and [`ascii::AsciiWriter`] expose options
//! (byte order, header, float formatting). [`binary::BinaryStreamWriter`] is
//! a [`MeshSink`], so plugging it into a reader transcodes any STL stream to
//! binary in one pass.
//!
//!
//! # Progress and cancellation
//!
//! Long-running calls accept a [`ProgressController`]: it maps the
//! operation's position to a percentage for an attached
//! [`ProgressObserver`] and carries a stop flag ([`StopHandle`]) that any
//! thread may set. Decoders and encoders poll it at triangle granularity and
//! unwind with [`Error::Stopped`], never exposing a partial triangle to a
//! sink.

use std::io::{Read, Seek, SeekFrom};

mod error;
mod memblock;
mod mesh;
mod probe;
mod progress;
mod sniff;
mod triangle;

pub mod ascii;
pub mod binary;

pub(crate) mod parse;


pub use crate::{
    error::Error,
    memblock::{MemBlock, DEFAULT_BUFFER_SIZE},
    mesh::{CounterSink, MeshSink, MeshSource, RawSolid, SolidMeta},
    probe::{probe_infos, Infos, ProbeFlags, ProbeOptions},
    progress::{
        ProgressController, ProgressObserver, ProgressState, StopHandle,
        DEFAULT_NOTIFY_THRESHOLD,
    },
    sniff::{probe_format, Format},
    triangle::{normal_from_vertices, Header, Triangle, HEADER_SIZE, TRIANGLE_RAW_SIZE},
};


/// Options for [`read_stl_with`].
#[derive(Debug, Clone, Copy)]
pub struct ReadOptions {
    /// Size of the transfer buffer used by the selected decoder.
    pub buffer_size: usize,

    /// Skips format sniffing when the caller already knows the format.
    pub format_hint: Option<Format>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            format_hint: None,
        }
    }
}

/// Decodes the STL stream into `sink`, sniffing the format first.
///
/// Convenience wrapper around [`read_stl_with`] with default options and no
/// progress reporting. Returns the detected format.
pub fn read_stl<S, K>(stream: &mut S, sink: &mut K) -> Result<Format, Error>
where
    S: Read + Seek,
    K: MeshSink,
{
    read_stl_with(
        stream,
        sink,
        &ReadOptions::default(),
        &mut ProgressController::new(),
    )
}

/// Decodes the STL stream into `sink` with explicit options and progress.
///
/// The format is taken from `options.format_hint` or sniffed from the
/// stream prefix; a stream that is neither ASCII nor binary STL fails with
/// [`Error::UnknownFormat`]. ASCII progress is byte-based (over the distance
/// to the end of the stream), binary progress is record-based.
pub fn read_stl_with<S, K>(
    stream: &mut S,
    sink: &mut K,
    options: &ReadOptions,
    progress: &mut ProgressController,
) -> Result<Format, Error>
where
    S: Read + Seek,
    K: MeshSink,
{
    use std::convert::TryFrom;

    let format = match options.format_hint {
        Some(format) => format,
        None => probe_format(stream)?,
    };

    if format.is_binary() {
        let endianness = binary::Endianness::try_from(format)?;
        let read_options = binary::BinaryReadOptions {
            buffer_size: options.buffer_size,
        };
        binary::BinaryReader::with_options(stream, endianness, &read_options)?
            .read_into(sink, progress)?;
    } else if format == Format::Ascii {
        let start = stream.seek(SeekFrom::Current(0))?;
        let total = stream.seek(SeekFrom::End(0))?;
        stream.seek(SeekFrom::Start(start))?;

        let read_options = ascii::AsciiReadOptions {
            buffer_size: options.buffer_size,
            size_hint: Some(total - start),
        };
        ascii::AsciiReader::with_options(stream, &read_options)?
            .read_into(sink, progress)?;
    } else {
        return Err(Error::UnknownFormat);
    }

    Ok(format)
}
