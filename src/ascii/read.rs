//! Grammar-driven streaming reader for textual STL.
//!
//! The grammar is LL(1); FIRST/FOLLOW sets don't overlap except for the
//! nullable solid-name production, which is resolved by context: a bare
//! identifier before `facet`/`endsolid` is the optional name, never a
//! keyword.
//!
//! ```text
//! CONTENTS  := SOLID+
//! SOLID     := 'solid' NAME? FACET* 'endsolid' NAME?
//! FACET     := 'facet' 'normal' XYZ 'outer' 'loop' VERTEX VERTEX VERTEX
//!              'endloop' 'endfacet'
//! VERTEX    := 'vertex' XYZ
//! XYZ       := FLOAT FLOAT FLOAT
//! ```
//!
//! Each fully parsed facet is handed to the sink immediately, so the read
//! path needs O(1) memory per triangle. Any grammar violation aborts with
//! [`Error::Parse`] carrying the offending token; there is no recovery or
//! resynchronization.

use std::io::Read;

use crate::{
    error::Error,
    memblock::MemBlock,
    mesh::{MeshSink, SolidMeta},
    parse::{buf::Buffer, Token, TokenScanner},
    progress::ProgressController,
    triangle::Triangle,
    DEFAULT_BUFFER_SIZE,
};


/// Options for [`AsciiReader`].
#[derive(Debug, Clone, Copy)]
pub struct AsciiReadOptions {
    /// Size of the transfer buffer backing the tokenizer.
    pub buffer_size: usize,

    /// Total byte size of the ASCII data, if known (e.g. from
    /// [`probe_infos`][crate::probe_infos] or the file length). Used only
    /// for progress percentages; decoding works without it.
    pub size_hint: Option<u64>,
}

impl Default for AsciiReadOptions {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            size_hint: None,
        }
    }
}

/// A streaming reader for ASCII STL.
///
/// Decodes one or more concatenated solids, delivering every triangle to
/// the sink as soon as it is parsed.
#[derive(Debug)]
pub struct AsciiReader<R: Read> {
    scanner: TokenScanner<R>,
    size_hint: Option<u64>,
}

impl<R: Read> AsciiReader<R> {
    pub fn new(reader: R) -> Result<Self, Error> {
        Self::with_options(reader, &AsciiReadOptions::default())
    }

    pub fn with_options(reader: R, options: &AsciiReadOptions) -> Result<Self, Error> {
        let block = MemBlock::new(options.buffer_size)?;
        Ok(Self {
            scanner: TokenScanner::new(Buffer::new(reader, block)?)?,
            size_hint: options.size_hint,
        })
    }

    /// Reuses a caller-owned transfer block instead of allocating one.
    pub fn with_block(
        reader: R,
        block: MemBlock,
        options: &AsciiReadOptions,
    ) -> Result<Self, Error> {
        Ok(Self {
            scanner: TokenScanner::new(Buffer::new(reader, block)?)?,
            size_hint: options.size_hint,
        })
    }

    /// Decodes the whole stream into `sink`.
    ///
    /// Convenience wrapper around [`read_into`][Self::read_into] without
    /// progress reporting or cancellation.
    pub fn read<K: MeshSink>(self, sink: &mut K) -> Result<(), Error> {
        self.read_into(sink, &mut ProgressController::new())
    }

    /// Decodes the whole stream into `sink`, reporting progress and polling
    /// for cancellation once per parsed facet.
    pub fn read_into<K: MeshSink>(
        mut self,
        sink: &mut K,
        progress: &mut ProgressController,
    ) -> Result<(), Error> {
        progress.set_range(0, self.size_hint.unwrap_or(0));

        // CONTENTS := SOLID+
        loop {
            self.solid(sink, progress)?;
            if self.scanner.current() == Token::Eof {
                break;
            }
        }

        progress.complete();
        Ok(())
    }

    fn solid<K: MeshSink>(
        &mut self,
        sink: &mut K,
        progress: &mut ProgressController,
    ) -> Result<(), Error> {
        self.scanner.eat(Token::Solid)?;

        // Optional solid name: a bare identifier in FIRST position of
        // FACET*/endsolid.
        let name_buf;
        let name = if self.scanner.current() == Token::Word {
            name_buf = String::from_utf8_lossy(self.scanner.text()).into_owned();
            self.scanner.advance()?;
            Some(name_buf.as_str())
        } else {
            None
        };
        sink.begin_solid(SolidMeta::Ascii { name })?;

        let mut index = 0u32;
        while self.scanner.current() == Token::Facet {
            // One cancellation checkpoint per triangle, never finer.
            progress.check(self.scanner.offset())?;

            let triangle = self.facet()?;
            sink.add_triangle(index, &triangle)?;
            index += 1;
        }

        self.scanner.eat(Token::EndSolid)?;
        if self.scanner.current() == Token::Word {
            // Trailing solid name; its content is not validated.
            self.scanner.advance()?;
        }

        sink.end_solid()
    }

    fn facet(&mut self) -> Result<Triangle, Error> {
        self.scanner.eat(Token::Facet)?;
        self.scanner.eat(Token::Normal)?;
        let normal = self.xyz()?;

        self.scanner.eat(Token::Outer)?;
        self.scanner.eat(Token::Loop)?;

        let vertices = [self.vertex()?, self.vertex()?, self.vertex()?];

        self.scanner.eat(Token::EndLoop)?;
        self.scanner.eat(Token::EndFacet)?;

        Ok(Triangle {
            normal,
            vertices,
            attribute_byte_count: 0,
        })
    }

    fn vertex(&mut self) -> Result<[f32; 3], Error> {
        self.scanner.eat(Token::Vertex)?;
        self.xyz()
    }

    fn xyz(&mut self) -> Result<[f32; 3], Error> {
        Ok([self.float()?, self.float()?, self.float()?])
    }

    fn float(&mut self) -> Result<f32, Error> {
        if self.scanner.current() != Token::Word {
            return Err(self.scanner.unexpected());
        }
        let value = self.scanner.float().ok_or_else(|| self.scanner.unexpected())?;
        self.scanner.advance()?;
        Ok(value)
    }
}
