use byte_cursor::CursorError;

use crate::types::PixelFormat;

/// Coarse grouping of failures so callers can decide what to report and what to skip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The input is not a sprite resource at all. Expected for some resource IDs.
    FormatMismatch,
    /// The buffer is shorter than its own header claims.
    Truncation,
    /// Well-formed looking data that contradicts itself.
    Structural,
    /// The edited bitmap does not fit the resource it should replace.
    PackPrecondition,
    Io,
}

impl ErrorCategory {
    pub fn is_skippable(self) -> bool {
        matches!(self, Self::FormatMismatch)
    }
}

pub trait Categorized {
    fn category(&self) -> ErrorCategory;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaletteError {
    #[error("Palette ends after {entries_read} of {expected} entries")]
    TruncatedPalette { entries_read: usize, expected: usize },
    #[error("Palette byte run of {length} bytes is not a whole number of entries")]
    PartialEntry { length: usize },
}

/// Model invariants, checked whenever a [`crate::SpriteContainer`] is built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContainerError {
    #[error("Frame {frame} pixel {position} uses color index {index}, palette has {palette_len} entries")]
    IndexOutOfPaletteRange {
        frame: usize,
        position: usize,
        index: u8,
        palette_len: usize,
    },
    #[error("Pixel data of frames {first} and {second} overlap")]
    OverlappingFrameRanges { first: usize, second: usize },
    #[error("Pixel data of frame {frame} starts at {offset:#x}, inside the header")]
    FrameInsideHeader { frame: usize, offset: usize },
    #[error("Frame {frame} has empty geometry")]
    EmptyFrame { frame: usize },
    #[error("Frame {frame} stride {stride} is shorter than its {row_bytes} byte rows")]
    StrideTooShort {
        frame: usize,
        stride: usize,
        row_bytes: usize,
    },
    #[error("Frame {frame} holds {found} bytes of pixel data, geometry needs {expected}")]
    FrameDataLength {
        frame: usize,
        expected: usize,
        found: usize,
    },
    #[error("Frame {frame} byte range does not fit in memory")]
    FrameRangeOverflow { frame: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Not a sprite resource (validation key {validation_key}, pixel gap {pixel_gap})")]
    NotASpriteResource { validation_key: u32, pixel_gap: u32 },
    #[error("Header is truncated: {source}")]
    TruncatedHeader {
        #[source]
        source: CursorError,
    },
    #[error("Palette is truncated after {entries_read} of {expected} entries")]
    TruncatedPalette { entries_read: usize, expected: usize },
    #[error("Pixel data of frame {frame} is truncated: needs {wanted} bytes at {offset:#x}, resource holds {available}")]
    TruncatedFrameData {
        frame: usize,
        offset: usize,
        wanted: u64,
        available: usize,
    },
    #[error("Frame {frame} pixel {position} uses color index {index}, palette has {palette_len} entries")]
    IndexOutOfPaletteRange {
        frame: usize,
        position: usize,
        index: u8,
        palette_len: usize,
    },
    #[error("Pixel data of frames {first} and {second} overlap")]
    OverlappingFrameRanges { first: usize, second: usize },
    #[error("Invalid dimensions {width}x{height}")]
    InvalidDimensions { width: i32, height: i32 },
    #[error("Unsupported color depth: {depth}")]
    UnsupportedColorDepth { depth: u16 },
    #[error("Palette entry {index} has reserved byte {value:#04x}")]
    PaletteReservedByteSet { index: usize, value: u8 },
    #[error("Invalid sprite container: {source}")]
    InvalidContainer {
        #[source]
        source: ContainerError,
    },
    #[error("IOError: {source}")]
    IOError {
        #[from]
        source: std::io::Error,
    },
}

impl From<PaletteError> for DecodeError {
    fn from(value: PaletteError) -> Self {
        match value {
            PaletteError::TruncatedPalette {
                entries_read,
                expected,
            } => Self::TruncatedPalette {
                entries_read,
                expected,
            },
            PaletteError::PartialEntry { length } => Self::TruncatedPalette {
                entries_read: length / crate::constants::PALETTE_ENTRY_SIZE,
                expected: crate::constants::PALETTE_ENTRY_COUNT,
            },
        }
    }
}

impl From<ContainerError> for DecodeError {
    fn from(value: ContainerError) -> Self {
        match value {
            ContainerError::IndexOutOfPaletteRange {
                frame,
                position,
                index,
                palette_len,
            } => Self::IndexOutOfPaletteRange {
                frame,
                position,
                index,
                palette_len,
            },
            ContainerError::OverlappingFrameRanges { first, second } => {
                Self::OverlappingFrameRanges { first, second }
            }
            source => Self::InvalidContainer { source },
        }
    }
}

impl Categorized for DecodeError {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::NotASpriteResource { .. } => ErrorCategory::FormatMismatch,
            Self::TruncatedHeader { .. }
            | Self::TruncatedPalette { .. }
            | Self::TruncatedFrameData { .. } => ErrorCategory::Truncation,
            Self::IndexOutOfPaletteRange { .. }
            | Self::OverlappingFrameRanges { .. }
            | Self::InvalidDimensions { .. }
            | Self::UnsupportedColorDepth { .. }
            | Self::PaletteReservedByteSet { .. }
            | Self::InvalidContainer { .. } => ErrorCategory::Structural,
            Self::IOError { .. } => ErrorCategory::Io,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("Palette has {found} entries, the resource needs {expected}")]
    PaletteSizeMismatch { expected: usize, found: usize },
    #[error("Bitmap is {}x{}, the frame it replaces is {}x{}", .found.0, .found.1, .expected.0, .expected.1)]
    FrameGeometryMismatch {
        expected: (u32, u32),
        found: (u32, u32),
    },
    #[error("Pixel {position} uses color index {index}, palette only has {palette_len} entries")]
    TooManyColorIndices {
        position: usize,
        index: u8,
        palette_len: usize,
    },
    #[error("Bitmap is {found:?}, the resource it replaces is {expected:?}")]
    PixelFormatMismatch {
        expected: PixelFormat,
        found: PixelFormat,
    },
    #[error("Resources hold exactly one frame, got {count}")]
    UnsupportedFrameCount { count: usize },
    #[error("Rows of a resource are not padded: stride {stride}, row size {row_bytes}")]
    StrideMismatch { stride: usize, row_bytes: usize },
    #[error("Gap of {gap} bytes before the pixel data is larger than allowed")]
    PixelGapTooLarge { gap: usize },
    #[error("Dimensions {width}x{height} do not fit the header fields")]
    DimensionOverflow { width: u32, height: u32 },
    #[error("Retained {field} block is {found} bytes, expected {expected}")]
    RawFieldLength {
        field: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Slot for {field} lies outside the resource: {source}")]
    HeaderSlotOutOfRange {
        field: &'static str,
        #[source]
        source: CursorError,
    },
    #[error("Invalid sprite container: {source}")]
    Invariant {
        #[from]
        source: ContainerError,
    },
    #[error("IOError: {source}")]
    IOError {
        #[from]
        source: std::io::Error,
    },
}

impl Categorized for EncodeError {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::PaletteSizeMismatch { .. }
            | Self::FrameGeometryMismatch { .. }
            | Self::TooManyColorIndices { .. }
            | Self::PixelFormatMismatch { .. } => ErrorCategory::PackPrecondition,
            Self::IOError { .. } => ErrorCategory::Io,
            _ => ErrorCategory::Structural,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("Not a bitmap file (magic {magic:?})")]
    NotABitmap { magic: [u8; 2] },
    #[error("Bitmap is truncated in its {section}")]
    Truncated { section: &'static str },
    #[error("Unsupported bitmap header of {size} bytes")]
    UnsupportedHeader { size: u32 },
    #[error("Unsupported bitmap compression: {compression}")]
    UnsupportedCompression { compression: u32 },
    #[error("Unsupported bitmap bit depth: {bits}")]
    UnsupportedBitDepth { bits: u16 },
    #[error("Invalid bitmap dimensions {width}x{height}")]
    InvalidDimensions { width: i64, height: i64 },
    #[error("Bitmap palette has {count} entries, more than its bit depth allows")]
    PaletteTooLarge { count: usize },
    #[error("Bitmap holds {found} bytes of pixel data, geometry needs {expected}")]
    PixelDataLength { expected: usize, found: usize },
    #[error("IOError: {source}")]
    IOError {
        #[from]
        source: std::io::Error,
    },
}

impl Categorized for RasterError {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::Truncated { .. } => ErrorCategory::Truncation,
            Self::IOError { .. } => ErrorCategory::Io,
            _ => ErrorCategory::Structural,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("Cannot decode resource: {source}")]
    Decode {
        #[from]
        source: DecodeError,
    },
    #[error("Cannot re-encode decoded resource: {source}")]
    Encode {
        #[from]
        source: EncodeError,
    },
}

impl Categorized for VerifyError {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::Decode { source } => source.category(),
            Self::Encode { source } => source.category(),
        }
    }
}
