use std::fmt;

use crate::error::Error;


/// Default size of a [`MemBlock`]: 128 KiB.
///
/// Large enough that even multi-gigabyte meshes are moved in a few thousand
/// stream calls, small enough to stay cache- and allocator-friendly. Peak
/// memory of a codec pass is bounded by this buffer, independent of the
/// triangle count.
pub const DEFAULT_BUFFER_SIZE: usize = 128 * 1024;

/// The single transfer buffer used by a codec pass.
///
/// The readers and the binary writer move their bytes through one of these
/// blocks (the ASCII writer batches formatted text instead). A block is
/// scoped to a single read or write call; callers that want to avoid
/// repeated allocations construct one up front and hand it in via the
/// `with_block` constructors.
pub struct MemBlock {
    bytes: Vec<u8>,
}

impl MemBlock {
    /// Creates a zero-filled block of `size` bytes.
    ///
    /// Returns [`Error::InvalidBufferSize`] for a zero size.
    pub fn new(size: usize) -> Result<Self, Error> {
        if size == 0 {
            return Err(Error::InvalidBufferSize { size });
        }

        Ok(Self { bytes: vec![0; size] })
    }

    /// Wraps an existing allocation. The vector's length (not its capacity)
    /// is the usable buffer size.
    pub fn from_vec(bytes: Vec<u8>) -> Result<Self, Error> {
        if bytes.is_empty() {
            return Err(Error::InvalidBufferSize { size: 0 });
        }

        Ok(Self { bytes })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Hands the allocation back, e.g. to reuse it for another codec pass.
    pub fn into_vec(self) -> Vec<u8> {
        self.bytes
    }

    /// Largest prefix of the block that holds a whole number of
    /// `record_size`-byte records. Fails if not even one record fits.
    pub(crate) fn whole_records(&mut self, record_size: usize) -> Result<&mut [u8], Error> {
        let n = self.bytes.len() / record_size;
        if n == 0 {
            return Err(Error::InvalidBufferSize { size: self.bytes.len() });
        }

        Ok(&mut self.bytes[..n * record_size])
    }
}

impl Default for MemBlock {
    fn default() -> Self {
        Self { bytes: vec![0; DEFAULT_BUFFER_SIZE] }
    }
}

impl fmt::Debug for MemBlock {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "MemBlock {{ len: {} }}", self.bytes.len())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_size_is_rejected() {
        assert!(matches!(
            MemBlock::new(0),
            Err(Error::InvalidBufferSize { size: 0 }),
        ));
        assert!(matches!(
            MemBlock::from_vec(Vec::new()),
            Err(Error::InvalidBufferSize { size: 0 }),
        ));
    }

    #[test]
    fn whole_records_truncates_to_record_multiple() {
        let mut block = MemBlock::new(120).unwrap();
        assert_eq!(block.whole_records(50).unwrap().len(), 100);

        let mut tiny = MemBlock::new(49).unwrap();
        assert!(matches!(
            tiny.whole_records(50),
            Err(Error::InvalidBufferSize { size: 49 }),
        ));
    }

    #[test]
    fn default_block_has_default_size() {
        assert_eq!(MemBlock::default().len(), DEFAULT_BUFFER_SIZE);
    }
}
