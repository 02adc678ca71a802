//! Format detection from a bounded stream prefix.

use std::io::{self, Read, Seek, SeekFrom};

use byteorder::{ByteOrder, LittleEndian};

use crate::{
    error::Error,
    triangle::{HEADER_SIZE, TRIANGLE_RAW_SIZE},
};


/// Number of prefix bytes the sniffer inspects.
const SNIFF_WINDOW: usize = 512;

/// The wire formats a stream can hold.
///
/// `Unknown` means the stream matched neither the binary size arithmetic nor
/// the ASCII `solid` introduction. Callers must treat it as a hard error,
/// never as a default: the crate-level reader maps it to
/// [`Error::UnknownFormat`]. (The historic "middle-endian" binary variant
/// also lands here; no known producer emits it and this crate does not
/// decode it.)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ascii,
    BinaryLe,
    BinaryBe,
    Unknown,
}

impl Format {
    pub fn is_binary(&self) -> bool {
        match self {
            Format::BinaryLe | Format::BinaryBe => true,
            Format::Ascii | Format::Unknown => false,
        }
    }
}

/// Exact byte size of a single-solid binary stream with `facet_count`
/// triangles.
pub(crate) fn binary_stream_size(facet_count: u32) -> u64 {
    HEADER_SIZE as u64 + 4 + facet_count as u64 * TRIANGLE_RAW_SIZE as u64
}

/// Classifies the stream's format from at most 512 prefix bytes.
///
/// The stream position is restored before returning, so sniffing can be
/// chained with a full decode of the same stream.
///
/// The binary check runs first on purpose: a binary file whose header
/// happens to start with the ASCII bytes `solid ` must still be recognized
/// as binary by the size arithmetic (80 + 4 + count * 50 == stream size,
/// tried with the count field read as little- and as big-endian).
pub fn probe_format<S: Read + Seek>(stream: &mut S) -> Result<Format, Error> {
    let start = stream.seek(SeekFrom::Current(0))?;
    let total = stream.seek(SeekFrom::End(0))?;
    stream.seek(SeekFrom::Start(start))?;
    let remaining = total - start;

    let mut window = [0u8; SNIFF_WINDOW];
    let filled = read_up_to(stream, &mut window)?;
    stream.seek(SeekFrom::Start(start))?;

    // Binary first.
    if filled >= HEADER_SIZE + 4 {
        let le_count = LittleEndian::read_u32(&window[HEADER_SIZE..]);
        let be_count = le_count.swap_bytes();

        if binary_stream_size(le_count) == remaining {
            return Ok(Format::BinaryLe);
        }
        if binary_stream_size(be_count) == remaining {
            return Ok(Format::BinaryBe);
        }
    }

    // ASCII: optional leading whitespace, then `solid` followed by
    // whitespace, case-insensitive.
    let text = &window[..filled];
    let pos = text
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(filled);
    if text.len() >= pos + 6
        && text[pos..pos + 5].eq_ignore_ascii_case(b"solid")
        && text[pos + 5].is_ascii_whitespace()
    {
        return Ok(Format::Ascii);
    }

    Ok(Format::Unknown)
}

fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize, Error> {
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

    use byteorder::BigEndian;

    use super::*;

    fn binary_stream<B: ByteOrder>(facet_count: u32, header: &[u8; 80]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(header);
        let mut count = [0u8; 4];
        B::write_u32(&mut count, facet_count);
        out.extend_from_slice(&count);
        out.extend_from_slice(&vec![0u8; facet_count as usize * TRIANGLE_RAW_SIZE]);
        out
    }

    #[test]
    fn detects_ascii() {
        let mut data = Cursor::new(&b"\n  solid mesh\nendsolid mesh\n"[..]);
        assert_eq!(probe_format(&mut data).unwrap(), Format::Ascii);
        // Position restored.
        assert_eq!(data.position(), 0);
    }

    #[test]
    fn detects_binary_both_endiannesses() {
        let le = binary_stream::<LittleEndian>(3, &[0; 80]);
        let be = binary_stream::<BigEndian>(3, &[0; 80]);
        assert_eq!(probe_format(&mut Cursor::new(le)).unwrap(), Format::BinaryLe);
        assert_eq!(probe_format(&mut Cursor::new(be)).unwrap(), Format::BinaryBe);
    }

    #[test]
    fn only_the_binary_variants_classify_as_binary() {
        assert!(Format::BinaryLe.is_binary());
        assert!(Format::BinaryBe.is_binary());
        assert!(!Format::Ascii.is_binary());
        assert!(!Format::Unknown.is_binary());
    }

    #[test]
    fn binary_with_solid_header_is_still_binary() {
        let mut header = [b' '; 80];
        header[..6].copy_from_slice(b"solid ");
        let data = binary_stream::<LittleEndian>(2, &header);
        assert_eq!(
            probe_format(&mut Cursor::new(data)).unwrap(),
            Format::BinaryLe,
        );
    }

    #[test]
    fn garbage_is_unknown() {
        let mut data = Cursor::new(&b"not an stl stream at all"[..]);
        assert_eq!(probe_format(&mut data).unwrap(), Format::Unknown);
    }

    #[test]
    fn sniffs_relative_to_the_current_position() {
        let mut bytes = b"junk".to_vec();
        bytes.extend_from_slice(&binary_stream::<LittleEndian>(1, &[7; 80]));
        let mut stream = Cursor::new(bytes);
        stream.set_position(4);
        assert_eq!(probe_format(&mut stream).unwrap(), Format::BinaryLe);
        assert_eq!(stream.position(), 4);
    }
}
