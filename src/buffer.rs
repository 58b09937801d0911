//! # Command Buffer
//!
//! The unit of transmission: one print job's bytes, built once by the
//! formatter and consumed once by the scheduler.

/// An ordered ESC/POS byte sequence.
///
/// Owns its bytes and has no structure beyond them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandBuffer {
    bytes: Vec<u8>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw bytes.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Split into consecutive slices of at most `size` bytes.
    ///
    /// Yields `ceil(len / size)` chunks; every chunk but the last is full.
    ///
    /// ```
    /// use struk::CommandBuffer;
    ///
    /// let buffer = CommandBuffer::from(vec![0u8; 45]);
    /// let sizes: Vec<usize> = buffer.chunks(20).map(|c| c.len()).collect();
    /// assert_eq!(sizes, vec![20, 20, 5]);
    /// ```
    pub fn chunks(&self, size: usize) -> std::slice::Chunks<'_, u8> {
        self.bytes.chunks(size)
    }

    /// Number of chunks `chunks(size)` yields.
    pub fn chunk_count(&self, size: usize) -> usize {
        self.bytes.len().div_ceil(size)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl From<Vec<u8>> for CommandBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl From<&crate::ir::Program> for CommandBuffer {
    fn from(program: &crate::ir::Program) -> Self {
        Self {
            bytes: program.to_bytes(),
        }
    }
}
