//! Bounds-checked little-endian reader and append-only writer over byte buffers.
//!
//! Writer half grew out of https://github.com/khanghugo/dem/blob/master/src/byte_writer.rs

mod error;
mod reader;

pub use error::CursorError;
pub use reader::ByteReader;

pub struct ByteWriter {
    data: Vec<u8>,
    offset: usize,
}

impl Default for ByteWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteWriter {
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            offset: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            offset: 0,
        }
    }

    fn offset(&mut self, offset: usize) {
        self.offset += offset;
    }

    pub fn get_offset(&self) -> usize {
        self.offset
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn append_u8(&mut self, i: u8) {
        self.data.push(i);
        self.offset(1);
    }

    pub fn append_u16(&mut self, i: u16) {
        self.data.extend(i.to_le_bytes());
        self.offset(2);
    }

    pub fn append_i16(&mut self, i: i16) {
        self.data.extend(i.to_le_bytes());
        self.offset(2);
    }

    pub fn append_u32(&mut self, i: u32) {
        self.data.extend(i.to_le_bytes());
        self.offset(4);
    }

    pub fn append_i32(&mut self, i: i32) {
        self.data.extend(i.to_le_bytes());
        self.offset(4);
    }

    pub fn append_u8_slice(&mut self, i: &[u8]) {
        self.data.extend_from_slice(i);
        self.offset(i.len());
    }

    /// Appends `count` copies of `byte`.
    pub fn append_fill(&mut self, byte: u8, count: usize) {
        self.data.resize(self.data.len() + count, byte);
        self.offset(count);
    }

    /// Overwrites already written bytes. The buffer never grows here.
    pub fn replace(&mut self, start: usize, slice: &[u8]) -> Result<(), CursorError> {
        let available = self.data.len();
        let unexpected_end = || CursorError::UnexpectedEndOfData {
            offset: start,
            wanted: slice.len(),
            available,
        };

        let end = start.checked_add(slice.len()).ok_or_else(unexpected_end)?;
        let target = self.data.get_mut(start..end).ok_or_else(unexpected_end)?;

        target.copy_from_slice(slice);

        Ok(())
    }

    pub fn replace_with_u16(&mut self, start: usize, val: u16) -> Result<(), CursorError> {
        self.replace(start, &val.to_le_bytes())
    }

    pub fn replace_with_u32(&mut self, start: usize, val: u32) -> Result<(), CursorError> {
        self.replace(start, &val.to_le_bytes())
    }

    pub fn replace_with_i32(&mut self, start: usize, val: i32) -> Result<(), CursorError> {
        self.replace(start, &val.to_le_bytes())
    }
}
