//! Streaming tokenization over a chunked byte stream.
//!
//! The ASCII reader and the metadata prober share this scanner. The current
//! token is always fully materialized in a scratch buffer before any grammar
//! code inspects it, so grammar rules never touch raw stream state.

use std::io::Read;

use smallvec::SmallVec;

use crate::error::Error;

pub(crate) mod buf;
pub(crate) mod float;

use self::buf::Buffer;


/// Longest accepted token (identifiers included). Everything longer aborts
/// with a parse error instead of growing the lookahead unboundedly.
pub(crate) const MAX_TOKEN_LEN: usize = 512;

/// The token alphabet of the STL text grammar. Keywords are matched
/// case-insensitively; every other whitespace-delimited word (identifiers
/// and float literals alike) is a `Word`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Token {
    Solid,
    EndSolid,
    Facet,
    EndFacet,
    Outer,
    Loop,
    EndLoop,
    Normal,
    Vertex,
    Word,
    Eof,
}

fn classify(word: &[u8]) -> Token {
    const KEYWORDS: &[(&[u8], Token)] = &[
        (b"solid", Token::Solid),
        (b"endsolid", Token::EndSolid),
        (b"facet", Token::Facet),
        (b"endfacet", Token::EndFacet),
        (b"outer", Token::Outer),
        (b"loop", Token::Loop),
        (b"endloop", Token::EndLoop),
        (b"normal", Token::Normal),
        (b"vertex", Token::Vertex),
    ];

    for (keyword, token) in KEYWORDS {
        if word.eq_ignore_ascii_case(keyword) {
            return *token;
        }
    }

    Token::Word
}

/// Forward-only token iterator with one token of lookahead.
#[derive(Debug)]
pub(crate) struct TokenScanner<R: Read> {
    buf: Buffer<R>,
    scratch: SmallVec<[u8; 64]>,
    token: Token,
    token_offset: u64,
}

impl<R: Read> TokenScanner<R> {
    /// Wraps a buffer and primes the first token.
    pub(crate) fn new(buf: Buffer<R>) -> Result<Self, Error> {
        let mut out = Self {
            buf,
            scratch: SmallVec::new(),
            token: Token::Eof,
            token_offset: 0,
        };
        out.advance()?;
        Ok(out)
    }

    pub(crate) fn current(&self) -> Token {
        self.token
    }

    /// The bytes of the current token.
    pub(crate) fn text(&self) -> &[u8] {
        &self.scratch
    }

    /// Byte offset at which the current token started.
    pub(crate) fn token_offset(&self) -> u64 {
        self.token_offset
    }

    /// Total bytes consumed from the stream, i.e. the end of the current
    /// token.
    pub(crate) fn offset(&self) -> u64 {
        self.buf.offset()
    }

    /// Skips whitespace and materializes the next token into the scratch
    /// buffer. At end of input the current token becomes `Eof`.
    pub(crate) fn advance(&mut self) -> Result<(), Error> {
        while let Some(b) = self.buf.head()? {
            if !b.is_ascii_whitespace() {
                break;
            }
            self.buf.consume(1);
        }

        self.token_offset = self.buf.offset();
        self.scratch.clear();

        while let Some(b) = self.buf.head()? {
            if b.is_ascii_whitespace() {
                break;
            }
            if self.scratch.len() == MAX_TOKEN_LEN {
                return Err(self.unexpected());
            }
            self.scratch.push(b);
            self.buf.consume(1);
        }

        self.token = if self.scratch.is_empty() {
            Token::Eof
        } else {
            classify(&self.scratch)
        };

        Ok(())
    }

    /// Consumes the current token if it matches, errors otherwise.
    pub(crate) fn eat(&mut self, expected: Token) -> Result<(), Error> {
        if self.token == expected {
            self.advance()
        } else {
            Err(self.unexpected())
        }
    }

    /// Interprets the current token as a float literal.
    pub(crate) fn float(&self) -> Option<f32> {
        float::parse_f32(&self.scratch)
    }

    /// A parse error carrying the current token and its start offset.
    pub(crate) fn unexpected(&self) -> Error {
        Error::Parse {
            token: String::from_utf8_lossy(&self.scratch).into_owned(),
            offset: self.token_offset(),
        }
    }
}


#[cfg(test)]
mod tests {
    use crate::memblock::MemBlock;

    use super::*;

    fn scanner(input: &'static [u8]) -> TokenScanner<&'static [u8]> {
        let buf = Buffer::new(input, MemBlock::new(64).unwrap()).unwrap();
        TokenScanner::new(buf).unwrap()
    }

    #[test]
    fn keywords_are_case_insensitive() {
        let mut s = scanner(b"solid FACET EndLoop endSOLID frob 1.5");
        let expected = [
            Token::Solid,
            Token::Facet,
            Token::EndLoop,
            Token::EndSolid,
            Token::Word,
            Token::Word,
            Token::Eof,
        ];
        for &token in &expected {
            assert_eq!(s.current(), token);
            s.advance().unwrap();
        }
    }

    #[test]
    fn float_tokens_materialize_fully() {
        let mut s = scanner(b"  -1.25e-3\nvertex");
        assert_eq!(s.current(), Token::Word);
        assert_eq!(s.float(), Some(-1.25e-3));
        s.advance().unwrap();
        assert_eq!(s.current(), Token::Vertex);
    }

    #[test]
    fn token_offsets_point_at_token_start() {
        let mut s = scanner(b"solid  name");
        assert_eq!(s.token_offset(), 0);
        s.advance().unwrap();
        assert_eq!(s.token_offset(), 7);
    }

    #[test]
    fn overlong_tokens_error_out() {
        let data: Vec<u8> = std::iter::repeat(b'x').take(MAX_TOKEN_LEN + 1).collect();
        let leaked: &'static [u8] = Box::leak(data.into_boxed_slice());
        let buf = Buffer::new(leaked, MemBlock::new(1024).unwrap()).unwrap();
        match TokenScanner::new(buf) {
            Err(Error::Parse { .. }) => {}
            other => panic!("expected parse error, got {:?}", other.map(|_| ())),
        }
    }
}
