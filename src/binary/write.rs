//! Chunked writer for binary STL, plus a sink adapter for transcoding.

use std::io::{self, Seek, SeekFrom, Write};

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::{
    error::Error,
    memblock::MemBlock,
    mesh::{MeshSink, MeshSource, SolidMeta},
    progress::ProgressController,
    triangle::{Header, Triangle, HEADER_SIZE, TRIANGLE_RAW_SIZE},
    DEFAULT_BUFFER_SIZE,
};

use super::Endianness;


/// Options for [`BinaryWriter`].
#[derive(Debug, Clone, Copy)]
pub struct BinaryWriteOptions {
    /// The opaque 80-byte header. By convention it must not start with the
    /// bytes `solid`.
    pub header: Header,

    /// Size of the transfer buffer; rounded down to a whole number of
    /// 50-byte records, at least one must fit.
    pub buffer_size: usize,

    /// Skips header and facet count, emitting raw triangle records only.
    pub write_triangles_only: bool,
}

impl Default for BinaryWriteOptions {
    fn default() -> Self {
        Self {
            header: Header::zeroed(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            write_triangles_only: false,
        }
    }
}

/// A buffered writer for binary STL with a known facet count.
///
/// Records are encoded into the transfer buffer and flushed in chunks that
/// always end at a record boundary. Use [`BinaryStreamWriter`] instead when
/// the triangle count isn't known up front.
#[derive(Debug)]
pub struct BinaryWriter<W: Write> {
    writer: W,
    endianness: Endianness,
    options: BinaryWriteOptions,
    block: MemBlock,
}

impl<W: Write> BinaryWriter<W> {
    pub fn new(writer: W, endianness: Endianness) -> Result<Self, Error> {
        Self::with_options(writer, endianness, BinaryWriteOptions::default())
    }

    pub fn with_options(
        writer: W,
        endianness: Endianness,
        options: BinaryWriteOptions,
    ) -> Result<Self, Error> {
        let block = MemBlock::new(options.buffer_size)?;
        Ok(Self::with_block(writer, endianness, options, block))
    }

    /// Reuses a caller-owned transfer block instead of allocating one
    /// (`options.buffer_size` is ignored in that case).
    pub fn with_block(
        writer: W,
        endianness: Endianness,
        options: BinaryWriteOptions,
        block: MemBlock,
    ) -> Self {
        Self { writer, endianness, options, block }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Writes all triangles of `source` as one solid.
    pub fn write_from<S: MeshSource + ?Sized>(&mut self, source: &S) -> Result<(), Error> {
        self.write_into(source, &mut ProgressController::new())
    }

    /// Writes all triangles of `source`, reporting progress per flushed
    /// chunk and polling for cancellation once per record.
    pub fn write_into<S: MeshSource + ?Sized>(
        &mut self,
        source: &S,
        progress: &mut ProgressController,
    ) -> Result<(), Error> {
        match self.endianness {
            Endianness::Little => self.write_with::<LittleEndian, S>(source, progress),
            Endianness::Big => self.write_with::<BigEndian, S>(source, progress),
        }
    }

    fn write_with<B: ByteOrder, S: MeshSource + ?Sized>(
        &mut self,
        source: &S,
        progress: &mut ProgressController,
    ) -> Result<(), Error> {
        let count = source.triangle_count();
        progress.set_range(0, count as u64);

        // Validate the block before any output hits the stream.
        let chunk = self.block.whole_records(TRIANGLE_RAW_SIZE)?;
        let per_chunk = (chunk.len() / TRIANGLE_RAW_SIZE) as u32;

        if !self.options.write_triangles_only {
            self.writer.write_all(&self.options.header.0)?;
            let mut raw = [0u8; 4];
            B::write_u32(&mut raw, count);
            self.writer.write_all(&raw)?;
        }

        let mut index = 0u32;
        while index < count {
            let batch = per_chunk.min(count - index);
            for i in 0..batch {
                progress.poll_stop()?;
                let offset = i as usize * TRIANGLE_RAW_SIZE;
                source
                    .triangle(index + i)
                    .encode::<B>(&mut chunk[offset..offset + TRIANGLE_RAW_SIZE]);
            }

            self.writer
                .write_all(&chunk[..batch as usize * TRIANGLE_RAW_SIZE])?;
            index += batch;
            progress.check(index as u64)?;
        }

        progress.complete();
        Ok(())
    }
}

/// A [`MeshSink`] that encodes everything it receives as one binary solid.
///
/// Intended for transcoding: feed it to any reader and the decoded stream
/// comes out binary on the other side. Since the total triangle count is
/// unknown while triangles arrive, a placeholder count is written first and
/// patched via seek when [`finish`][Self::finish] is called. Multiple input
/// solids are merged into the single output solid.
#[derive(Debug)]
pub struct BinaryStreamWriter<W: Write + Seek> {
    writer: W,
    endianness: Endianness,
    header: Header,
    count_pos: Option<u64>,
    count: u32,
}

impl<W: Write + Seek> BinaryStreamWriter<W> {
    pub fn new(writer: W, endianness: Endianness, header: Header) -> Self {
        Self {
            writer,
            endianness,
            header,
            count_pos: None,
            count: 0,
        }
    }

    /// Patches the facet count and returns the underlying writer, positioned
    /// after the last record.
    ///
    /// If no solid was ever opened, nothing was written and the writer is
    /// returned untouched.
    pub fn finish(mut self) -> Result<W, Error> {
        if let Some(count_pos) = self.count_pos {
            let mut raw = [0u8; 4];
            match self.endianness {
                Endianness::Little => LittleEndian::write_u32(&mut raw, self.count),
                Endianness::Big => BigEndian::write_u32(&mut raw, self.count),
            }

            let end = self.writer.seek(SeekFrom::Current(0))?;
            self.writer.seek(SeekFrom::Start(count_pos))?;
            self.writer.write_all(&raw)?;
            self.writer.seek(SeekFrom::Start(end))?;
        }
        Ok(self.writer)
    }

    pub fn triangles_written(&self) -> u32 {
        self.count
    }
}

impl<W: Write + Seek> MeshSink for BinaryStreamWriter<W> {
    fn begin_solid(&mut self, _meta: SolidMeta<'_>) -> Result<(), Error> {
        // Header and placeholder count go out once, on the first solid.
        if self.count_pos.is_none() {
            self.writer.write_all(&self.header.0)?;
            self.count_pos = Some(self.writer.seek(SeekFrom::Current(0))?);
            self.writer.write_all(&[0u8; 4])?;
        }
        Ok(())
    }

    fn add_triangle(&mut self, _index: u32, triangle: &Triangle) -> Result<(), Error> {
        let mut raw = [0u8; TRIANGLE_RAW_SIZE];
        match self.endianness {
            Endianness::Little => triangle.encode::<LittleEndian>(&mut raw),
            Endianness::Big => triangle.encode::<BigEndian>(&mut raw),
        }
        self.writer.write_all(&raw)?;
        self.count += 1;
        Ok(())
    }
}

/// Convenience: writes a single solid as little-endian binary to any
/// `io::Write`.
pub fn write_binary<W: Write, S: MeshSource + ?Sized>(
    writer: W,
    source: &S,
) -> Result<(), io::Error> {
    BinaryWriter::new(writer, Endianness::Little)
        .and_then(|mut w| w.write_from(source))
        .map_err(|e| match e {
            Error::Io(io) => io,
            other => io::Error::new(io::ErrorKind::Other, other.to_string()),
        })
}
