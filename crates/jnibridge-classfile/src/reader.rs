use jnibridge_core::ClassFormatError;

/// A cursor over class-file bytes.
///
/// All multi-byte reads are big-endian, as the class-file format requires.
/// Every read reports truncation as [`ClassFormatError::Truncated`] with the
/// absolute offset of the failed read, so sub-readers created with
/// [`ByteReader::sub_reader`] keep their position relative to the whole file.
pub struct ByteReader<'a> {
    /// Remaining input starting at the current position.
    bytes: &'a [u8],
    /// Absolute offset of `bytes[0]` in the original file.
    offset: usize,
}

impl<'a> ByteReader<'a> {
    /// Create a reader at the start of `bytes`.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Current absolute byte offset.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes left to read.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Consume exactly `n` bytes.
    pub fn bytes(&mut self, n: usize) -> Result<&'a [u8], ClassFormatError> {
        if self.bytes.len() < n {
            return Err(ClassFormatError::Truncated {
                offset: self.offset,
                needed: n,
            });
        }
        let (head, tail) = self.bytes.split_at(n);
        self.bytes = tail;
        self.offset += n;
        Ok(head)
    }

    #[inline]
    pub fn u1(&mut self) -> Result<u8, ClassFormatError> {
        Ok(self.array::<1>()?[0])
    }

    #[inline]
    pub fn u2(&mut self) -> Result<u16, ClassFormatError> {
        Ok(u16::from_be_bytes(self.array()?))
    }

    #[inline]
    pub fn u4(&mut self) -> Result<u32, ClassFormatError> {
        Ok(u32::from_be_bytes(self.array()?))
    }

    #[inline]
    pub fn u8(&mut self) -> Result<u64, ClassFormatError> {
        Ok(u64::from_be_bytes(self.array()?))
    }

    /// Skip `n` bytes.
    pub fn skip(&mut self, n: usize) -> Result<(), ClassFormatError> {
        self.bytes(n).map(|_| ())
    }

    /// Split off the next `len` bytes as an independent reader and advance
    /// past them.
    pub fn sub_reader(&mut self, len: usize) -> Result<ByteReader<'a>, ClassFormatError> {
        let offset = self.offset;
        let bytes = self.bytes(len)?;
        Ok(ByteReader { bytes, offset })
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], ClassFormatError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.bytes(N)?);
        Ok(out)
    }
}
