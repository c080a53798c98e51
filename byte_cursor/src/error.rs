#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CursorError {
    #[error("Unexpected end of data at offset {offset:#x}: wanted {wanted} bytes, buffer holds {available}")]
    UnexpectedEndOfData {
        offset: usize,
        wanted: usize,
        available: usize,
    },
}
