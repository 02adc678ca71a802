use std::io;

use failure::Fail;


/// The error type for everything this crate does.
///
/// The codec never retries and never silently recovers: every failure is
/// surfaced to the immediate caller of the read/write entry point. Partial
/// output that was already flushed to the stream is not rolled back (the
/// facet-count patch performed by the streamed binary writer is the only
/// seek-based correction).
///
/// [`Error::Stopped`] is special: it reports cooperative cancellation and
/// callers are expected to map it to a non-error "user cancelled" outcome.
#[derive(Debug, Fail)]
pub enum Error {
    /// Underlying I/O failure, surfaced immediately.
    #[fail(display = "IO error: {}", _0)]
    Io(io::Error),

    /// The transfer buffer is empty or too small to hold a single unit of
    /// work (one binary triangle record, or one token for ASCII input).
    #[fail(display = "invalid transfer buffer size: {} bytes", size)]
    InvalidBufferSize { size: usize },

    /// The ASCII grammar was violated. Carries the offending token and the
    /// byte offset at which it started. The parser does not resynchronize.
    #[fail(display = "parse error at byte {}: unexpected token {:?}", offset, token)]
    Parse { token: String, offset: u64 },

    /// A binary stream ended before the number of records declared in its
    /// count field was consumed, or a read stopped mid-record.
    #[fail(
        display = "facet count mismatch: stream declared {} facets but {} were read",
        expected, actual,
    )]
    FacetCountMismatch { expected: u32, actual: u32 },

    /// The 80-byte binary header could not be read in full.
    #[fail(display = "binary STL header is shorter than 80 bytes")]
    HeaderWrongSize,

    /// The 4-byte facet count following the binary header could not be read.
    #[fail(display = "failed to read the facet count of a binary STL stream")]
    FacetCountRead,

    /// A `Format` that is not a binary variant was used where a byte order
    /// is required.
    #[fail(display = "unsupported byte order (must be little or big endian)")]
    UnsupportedByteOrder,

    /// The sniffer classified the stream as neither ASCII nor binary. This
    /// is a hard error for callers, never a default.
    #[fail(display = "stream does not hold a recognizable STL format")]
    UnknownFormat,

    /// ASCII float precision outside the supported 1..=9 range.
    #[fail(display = "invalid float precision {} (must be in 1..=9)", prec)]
    InvalidPrecision { prec: u8 },

    /// The configured solid name exceeds the supported length or contains
    /// non-ASCII or line-breaking characters.
    #[fail(display = "solid name is too long or not plain ASCII")]
    InvalidSolidName,

    /// The operation was cancelled via
    /// [`ProgressController::request_stop`][crate::ProgressController::request_stop]
    /// and unwound at a triangle boundary.
    #[fail(display = "operation stopped by caller request")]
    Stopped,
}

impl Error {
    /// Returns `true` for the cooperative-cancellation outcome.
    pub fn is_stopped(&self) -> bool {
        match self {
            Error::Stopped => true,
            _ => false,
        }
    }
}

impl From<io::Error> for Error {
    fn from(src: io::Error) -> Self {
        Error::Io(src)
    }
}
