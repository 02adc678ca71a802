//! Chunked streaming reader for binary STL.

use std::io::{self, Read};

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::{
    error::Error,
    memblock::MemBlock,
    mesh::{MeshSink, SolidMeta},
    progress::ProgressController,
    triangle::{Header, Triangle, HEADER_SIZE, TRIANGLE_RAW_SIZE},
    DEFAULT_BUFFER_SIZE,
};

use super::Endianness;


/// Options for [`BinaryReader`].
#[derive(Debug, Clone, Copy)]
pub struct BinaryReadOptions {
    /// Size of the transfer buffer. Rounded down to a whole number of
    /// 50-byte records; must fit at least one.
    pub buffer_size: usize,
}

impl Default for BinaryReadOptions {
    fn default() -> Self {
        Self { buffer_size: DEFAULT_BUFFER_SIZE }
    }
}

/// A streaming reader for binary STL in either byte order.
///
/// The stream is consumed in buffer-sized chunks holding a whole number of
/// triangle records, and every record is handed to the sink individually.
/// Exactly `header + count + count * 50` bytes are read from the stream;
/// trailing data is left untouched so a caller can continue reading other
/// content from the same stream.
#[derive(Debug)]
pub struct BinaryReader<R: Read> {
    reader: R,
    endianness: Endianness,
    block: MemBlock,
}

impl<R: Read> BinaryReader<R> {
    pub fn new(reader: R, endianness: Endianness) -> Result<Self, Error> {
        Self::with_options(reader, endianness, &BinaryReadOptions::default())
    }

    pub fn with_options(
        reader: R,
        endianness: Endianness,
        options: &BinaryReadOptions,
    ) -> Result<Self, Error> {
        Ok(Self {
            reader,
            endianness,
            block: MemBlock::new(options.buffer_size)?,
        })
    }

    /// Reuses a caller-owned transfer block instead of allocating one.
    pub fn with_block(reader: R, endianness: Endianness, block: MemBlock) -> Self {
        Self { reader, endianness, block }
    }

    /// Decodes one solid into `sink` without progress reporting.
    pub fn read<K: MeshSink>(self, sink: &mut K) -> Result<(), Error> {
        self.read_into(sink, &mut ProgressController::new())
    }

    /// Decodes one solid into `sink`, reporting progress as a fraction of
    /// the declared facet count and polling for cancellation once per
    /// record.
    pub fn read_into<K: MeshSink>(
        self,
        sink: &mut K,
        progress: &mut ProgressController,
    ) -> Result<(), Error> {
        match self.endianness {
            Endianness::Little => self.read_with::<LittleEndian, K>(sink, progress),
            Endianness::Big => self.read_with::<BigEndian, K>(sink, progress),
        }
    }

    fn read_with<B: ByteOrder, K: MeshSink>(
        mut self,
        sink: &mut K,
        progress: &mut ProgressController,
    ) -> Result<(), Error> {
        let mut header = [0u8; HEADER_SIZE];
        self.reader
            .read_exact(&mut header)
            .map_err(|_| Error::HeaderWrongSize)?;

        let mut count = [0u8; 4];
        self.reader
            .read_exact(&mut count)
            .map_err(|_| Error::FacetCountRead)?;
        let expected = B::read_u32(&count);

        let header = Header(header);
        sink.begin_solid(SolidMeta::Binary {
            facet_count: expected,
            header: &header,
        })?;

        progress.set_range(0, expected as u64);

        let chunk = self.block.whole_records(TRIANGLE_RAW_SIZE)?;
        let mut index = 0u32;

        while index < expected {
            // In u64: the remaining byte count can exceed usize on 32-bit
            // targets for counts above ~85 M.
            let remaining = (expected - index) as u64 * TRIANGLE_RAW_SIZE as u64;
            let want = (chunk.len() as u64).min(remaining) as usize;
            let filled = fill(&mut self.reader, &mut chunk[..want])?;

            // Whole records of a short final read are still delivered before
            // the mismatch is reported.
            for raw in chunk[..filled - filled % TRIANGLE_RAW_SIZE]
                .chunks_exact(TRIANGLE_RAW_SIZE)
            {
                progress.poll_stop()?;
                let triangle = Triangle::decode::<B>(raw);
                sink.add_triangle(index, &triangle)?;
                index += 1;
            }

            if filled < want {
                return Err(Error::FacetCountMismatch {
                    expected,
                    actual: index,
                });
            }

            progress.check(index as u64)?;
        }

        sink.end_solid()?;
        progress.complete();
        Ok(())
    }
}

/// Reads until `buf` is full or the stream ends, ignoring interrupts.
fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize, Error> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}


#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use crate::mesh::RawSolid;

    use super::*;

    fn record(z: f32) -> [u8; TRIANGLE_RAW_SIZE] {
        let triangle = Triangle {
            normal: [0.0, 0.0, 1.0],
            vertices: [[0.0, 0.0, z], [1.0, 0.0, z], [0.0, 1.0, z]],
            attribute_byte_count: 0,
        };
        let mut raw = [0u8; TRIANGLE_RAW_SIZE];
        triangle.encode::<LittleEndian>(&mut raw);
        raw
    }

    fn stream(count_field: u32, records: usize) -> Vec<u8> {
        let mut out = vec![0u8; HEADER_SIZE];
        out.extend_from_slice(&count_field.to_le_bytes());
        for i in 0..records {
            out.extend_from_slice(&record(i as f32));
        }
        out
    }

    #[test]
    fn reads_all_declared_records() {
        let data = stream(3, 3);
        let mut solid = RawSolid::new();
        BinaryReader::new(Cursor::new(data), Endianness::Little)
            .unwrap()
            .read(&mut solid)
            .unwrap();

        assert_eq!(solid.triangles.len(), 3);
        assert_eq!(solid.triangles[2].vertices[0][2], 2.0);
        assert_eq!(solid.header.unwrap().0, [0u8; 80]);
    }

    #[test]
    fn short_stream_is_a_count_mismatch() {
        let mut data = stream(4, 2);
        // Half a record on top of the two whole ones.
        data.extend_from_slice(&[0u8; 25]);

        let mut solid = RawSolid::new();
        let err = BinaryReader::new(Cursor::new(data), Endianness::Little)
            .unwrap()
            .read(&mut solid)
            .unwrap_err();

        assert!(matches!(
            err,
            Error::FacetCountMismatch { expected: 4, actual: 2 },
        ));
        // The two whole records were delivered before the error.
        assert_eq!(solid.triangles.len(), 2);
    }

    #[test]
    fn trailing_bytes_are_left_in_the_stream() {
        let mut data = stream(2, 2);
        data.extend_from_slice(b"tail");

        let mut stream = Cursor::new(data);
        let mut solid = RawSolid::new();
        BinaryReader::new(&mut stream, Endianness::Little)
            .unwrap()
            .read(&mut solid)
            .unwrap();

        assert_eq!(solid.triangles.len(), 2);
        assert_eq!(stream.position(), 84 + 2 * 50);
    }

    #[test]
    fn huge_declared_count_fails_cleanly() {
        // A count whose byte size does not fit in a 32-bit usize. The reader
        // must not overflow while sizing reads; it just runs out of records.
        let data = stream(u32::MAX, 1);

        let mut solid = RawSolid::new();
        let err = BinaryReader::new(Cursor::new(data), Endianness::Little)
            .unwrap()
            .read(&mut solid)
            .unwrap_err();

        assert!(matches!(
            err,
            Error::FacetCountMismatch { expected: u32::MAX, actual: 1 },
        ));
        assert_eq!(solid.triangles.len(), 1);
    }

    #[test]
    fn missing_header_and_count_have_distinct_errors() {
        let short_header = vec![0u8; 40];
        let err = BinaryReader::new(Cursor::new(short_header), Endianness::Little)
            .unwrap()
            .read(&mut RawSolid::new())
            .unwrap_err();
        assert!(matches!(err, Error::HeaderWrongSize));

        let no_count = vec![0u8; HEADER_SIZE + 2];
        let err = BinaryReader::new(Cursor::new(no_count), Endianness::Little)
            .unwrap()
            .read(&mut RawSolid::new())
            .unwrap_err();
        assert!(matches!(err, Error::FacetCountRead));
    }

    #[test]
    fn big_endian_records_decode() {
        let triangle = Triangle {
            normal: [0.0, 1.0, 0.0],
            vertices: [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]],
            attribute_byte_count: 3,
        };

        let mut data = vec![0u8; HEADER_SIZE];
        data.extend_from_slice(&1u32.to_be_bytes());
        let mut raw = [0u8; TRIANGLE_RAW_SIZE];
        triangle.encode::<BigEndian>(&mut raw);
        data.extend_from_slice(&raw);

        let mut solid = RawSolid::new();
        BinaryReader::new(Cursor::new(data), Endianness::Big)
            .unwrap()
            .read(&mut solid)
            .unwrap();
        assert_eq!(solid.triangles, vec![triangle]);
    }
}
