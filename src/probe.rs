//! Cheap metadata extraction without a full decode.
//!
//! Knowing the triangle count before allocating lets a sink pre-size its
//! mesh storage; knowing the solid size lets the ASCII reader report byte
//! accurate progress. For binary streams everything is derived
//! arithmetically from the header-adjacent count field; for ASCII streams a
//! single token pass counts `facet` keywords without parsing full facets,
//! so probing is O(tokens), not O(grammar).

use std::io::{Read, Seek};

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::{
    error::Error,
    memblock::MemBlock,
    parse::{buf::Buffer, Token, TokenScanner},
    sniff::{binary_stream_size, probe_format, Format},
    triangle::{Header, HEADER_SIZE},
    DEFAULT_BUFFER_SIZE,
};


/// Selects which pieces of metadata [`probe_infos`] extracts.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProbeFlags {
    /// Total byte size of the STL data (for ASCII: up to and including the
    /// `endsolid` clause).
    pub size: bool,

    /// Number of facets of the first solid.
    pub facet_count: bool,

    /// ASCII only: the optional solid name.
    pub solid_name: bool,

    /// Binary only: the raw 80-byte header.
    pub header: bool,
}

impl ProbeFlags {
    pub fn all() -> Self {
        Self {
            size: true,
            facet_count: true,
            solid_name: true,
            header: true,
        }
    }
}

/// Options for [`probe_infos`].
#[derive(Debug, Clone, Copy)]
pub struct ProbeOptions {
    /// Size of the text window used for ASCII token scanning.
    pub buffer_size: usize,

    /// Skips format sniffing when the caller already knows the format.
    pub format_hint: Option<Format>,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            format_hint: None,
        }
    }
}

/// Metadata retrieved by [`probe_infos`]. Fields that were not requested
/// (or don't apply to the detected format) are `None`.
#[derive(Debug, Clone)]
pub struct Infos {
    pub format: Format,
    pub size: Option<u64>,
    pub facet_count: Option<u32>,
    pub solid_name: Option<String>,
    pub header: Option<Header>,
}

/// Single forward scan producing summary metadata for the next solid in the
/// stream.
///
/// The stream is consumed up to the end of the probed data (binary: header
/// plus count field; ASCII: the `endsolid` clause), so probing multi-solid
/// ASCII streams can be repeated to walk solid by solid.
pub fn probe_infos<S: Read + Seek>(
    stream: &mut S,
    flags: ProbeFlags,
    options: &ProbeOptions,
) -> Result<Infos, Error> {
    let format = match options.format_hint {
        Some(format) => format,
        None => probe_format(stream)?,
    };

    match format {
        Format::Unknown => Err(Error::UnknownFormat),
        Format::BinaryLe => probe_binary::<LittleEndian, S>(stream, format, flags),
        Format::BinaryBe => probe_binary::<BigEndian, S>(stream, format, flags),
        Format::Ascii => probe_ascii(stream, flags, options),
    }
}

fn probe_binary<B: ByteOrder, S: Read>(
    stream: &mut S,
    format: Format,
    flags: ProbeFlags,
) -> Result<Infos, Error> {
    let mut infos = Infos {
        format,
        size: None,
        facet_count: None,
        solid_name: None,
        header: None,
    };

    if !(flags.size || flags.facet_count || flags.header) {
        return Ok(infos);
    }

    let mut header = [0u8; HEADER_SIZE];
    stream
        .read_exact(&mut header)
        .map_err(|_| Error::HeaderWrongSize)?;

    let mut count = [0u8; 4];
    stream
        .read_exact(&mut count)
        .map_err(|_| Error::FacetCountRead)?;
    let facet_count = B::read_u32(&count);

    if flags.header {
        infos.header = Some(Header(header));
    }
    if flags.facet_count {
        infos.facet_count = Some(facet_count);
    }
    if flags.size {
        infos.size = Some(binary_stream_size(facet_count));
    }

    Ok(infos)
}

fn probe_ascii<S: Read>(
    stream: &mut S,
    flags: ProbeFlags,
    options: &ProbeOptions,
) -> Result<Infos, Error> {
    let block = MemBlock::new(options.buffer_size)?;
    let mut scanner = TokenScanner::new(Buffer::new(stream, block)?)?;

    let mut infos = Infos {
        format: Format::Ascii,
        size: None,
        facet_count: None,
        solid_name: None,
        header: None,
    };

    scanner.eat(Token::Solid)?;
    if scanner.current() == Token::Word {
        if flags.solid_name {
            infos.solid_name =
                Some(String::from_utf8_lossy(scanner.text()).into_owned());
        }
        scanner.advance()?;
    }

    let mut facet_count = 0u32;
    let mut end = loop {
        match scanner.current() {
            Token::Facet => facet_count += 1,
            Token::EndSolid => break scanner.offset(),
            Token::Eof => return Err(scanner.unexpected()),
            _ => {}
        }
        scanner.advance()?;
    };

    // Optional trailing solid name belongs to this solid's extent.
    scanner.advance()?;
    if scanner.current() == Token::Word {
        end = scanner.offset();
    }

    if flags.facet_count {
        infos.facet_count = Some(facet_count);
    }
    if flags.size {
        infos.size = Some(end);
    }

    Ok(infos)
}
