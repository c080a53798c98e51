use crate::CursorError;

/// Sequential reader with an explicit, movable position.
///
/// Reads never go past the end of the buffer. A failed read leaves the
/// position where it was.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    pub fn position(&self) -> usize {
        self.offset
    }

    /// Moves to an absolute position. Seeking to the end is allowed, seeking past it is not.
    pub fn seek(&mut self, offset: usize) -> Result<(), CursorError> {
        if offset > self.data.len() {
            return Err(CursorError::UnexpectedEndOfData {
                offset,
                wanted: 0,
                available: self.data.len(),
            });
        }

        self.offset = offset;

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    /// Borrow `length` bytes starting at `offset` without touching the position.
    pub fn peek_bytes_at(&self, offset: usize, length: usize) -> Result<&'a [u8], CursorError> {
        let unexpected_end = || CursorError::UnexpectedEndOfData {
            offset,
            wanted: length,
            available: self.data.len(),
        };

        let end = offset.checked_add(length).ok_or_else(unexpected_end)?;

        self.data.get(offset..end).ok_or_else(unexpected_end)
    }

    fn peek_array_at<const N: usize>(&self, offset: usize) -> Result<[u8; N], CursorError> {
        let mut res = [0u8; N];
        res.copy_from_slice(self.peek_bytes_at(offset, N)?);

        Ok(res)
    }

    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8], CursorError> {
        let res = self.peek_bytes_at(self.offset, length)?;
        self.offset += length;

        Ok(res)
    }

    /// Everything from the current position to the end.
    pub fn read_rest(&mut self) -> &'a [u8] {
        let res = self.data.get(self.offset..).unwrap_or_default();
        self.offset = self.data.len();

        res
    }

    pub fn read_u8(&mut self) -> Result<u8, CursorError> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, CursorError> {
        let res = self.read_u16_at(self.offset)?;
        self.offset += 2;

        Ok(res)
    }

    pub fn read_u32(&mut self) -> Result<u32, CursorError> {
        let res = self.read_u32_at(self.offset)?;
        self.offset += 4;

        Ok(res)
    }

    pub fn read_i32(&mut self) -> Result<i32, CursorError> {
        let res = self.read_i32_at(self.offset)?;
        self.offset += 4;

        Ok(res)
    }

    pub fn read_u16_at(&self, offset: usize) -> Result<u16, CursorError> {
        self.peek_array_at(offset).map(u16::from_le_bytes)
    }

    pub fn read_u32_at(&self, offset: usize) -> Result<u32, CursorError> {
        self.peek_array_at(offset).map(u32::from_le_bytes)
    }

    pub fn read_i32_at(&self, offset: usize) -> Result<i32, CursorError> {
        self.peek_array_at(offset).map(i32::from_le_bytes)
    }
}
