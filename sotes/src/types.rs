use std::ops::Range;

use crate::{constants::HEADER_LENGTH, error::ContainerError, palette::Palette};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// One byte per pixel, an index into the palette.
    Indexed8,
    /// Three bytes per pixel, blue first.
    Bgr24,
}

impl PixelFormat {
    pub fn from_color_depth(depth: u16) -> Option<Self> {
        match depth {
            8 => Some(Self::Indexed8),
            24 => Some(Self::Bgr24),
            _ => None,
        }
    }

    pub fn color_depth(self) -> u16 {
        match self {
            Self::Indexed8 => 8,
            Self::Bgr24 => 24,
        }
    }

    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Indexed8 => 1,
            Self::Bgr24 => 3,
        }
    }

    pub fn is_indexed(self) -> bool {
        matches!(self, Self::Indexed8)
    }
}

/// Order in which rows are laid out in a stored buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowOrder {
    /// Last row first. Declared with a positive height.
    BottomUp,
    /// First row first. Declared with a negative height.
    TopDown,
}

impl RowOrder {
    pub fn from_signed_height(height: i32) -> Self {
        if height < 0 {
            Self::TopDown
        } else {
            Self::BottomUp
        }
    }

    /// Converts between stored order and top-down order. Applying it twice is a no-op.
    pub fn reorder(self, data: &[u8], stride: usize) -> Vec<u8> {
        match self {
            Self::TopDown => data.to_vec(),
            Self::BottomUp if stride == 0 => data.to_vec(),
            Self::BottomUp => data.rchunks(stride).flatten().copied().collect(),
        }
    }
}

/// One pixel plane of a container.
///
/// `pixels` is always top row first, `stride` bytes per row, no matter how the rows
/// are stored in the resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    stride: usize,
    offset: usize,
    row_order: RowOrder,
    pixels: Vec<u8>,
}

impl Frame {
    pub fn new(
        (width, height): (u32, u32),
        stride: usize,
        offset: usize,
        row_order: RowOrder,
        pixels: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            width,
            height,
            stride,
            offset,
            row_order,
            pixels: pixels.into(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Absolute offset of the pixel data inside the resource it was read from.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn row_order(&self) -> RowOrder {
        self.row_order
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Rows top to bottom, padding included.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.pixels.chunks(self.stride.max(1))
    }

    /// The rows in the order the resource stores them.
    pub fn stored_pixels(&self) -> Vec<u8> {
        self.row_order.reorder(&self.pixels, self.stride)
    }

    pub fn byte_range(&self) -> Option<Range<usize>> {
        let end = self.offset.checked_add(self.pixels.len())?;

        Some(self.offset..end)
    }
}

/// Obfuscation key and the two slot selectors that locate width and height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct HeaderKeys {
    pub obfuscation: u32,
    pub width_slot: u32,
    pub height_slot: u32,
}

impl HeaderKeys {
    pub fn reveal(&self, stored: u32) -> u32 {
        stored.wrapping_sub(self.obfuscation)
    }

    pub fn hide(&self, value: u32) -> u32 {
        value.wrapping_add(self.obfuscation)
    }

    pub fn reveal_i32(&self, stored: i32) -> i32 {
        stored.wrapping_sub(self.obfuscation as i32)
    }

    pub fn hide_i32(&self, value: i32) -> i32 {
        value.wrapping_add(self.obfuscation as i32)
    }

    /// 16 bit fields only use the low half of the key.
    pub fn reveal_u16(&self, stored: u16) -> u16 {
        stored.wrapping_sub(self.obfuscation as u16)
    }

    pub fn hide_u16(&self, value: u16) -> u16 {
        value.wrapping_add(self.obfuscation as u16)
    }
}

/// Bytes of the resource that are not modeled, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawHeaderFields {
    /// Everything before the palette.
    pub lead: Vec<u8>,
    /// Everything between the palette and the end of the header.
    pub trailer: Vec<u8>,
    /// Between the header and the pixel rows.
    pub gap: Vec<u8>,
    /// After the pixel rows.
    pub trailing: Vec<u8>,
}

/// One decoded sprite resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteContainer {
    keys: HeaderKeys,
    pixel_format: PixelFormat,
    palette: Palette,
    frames: Vec<Frame>,
    raw: RawHeaderFields,
}

impl SpriteContainer {
    pub fn new(
        keys: HeaderKeys,
        pixel_format: PixelFormat,
        palette: Palette,
        frames: Vec<Frame>,
        raw: RawHeaderFields,
    ) -> Result<Self, ContainerError> {
        let res = Self {
            keys,
            pixel_format,
            palette,
            frames,
            raw,
        };

        res.check_geometry()?;
        res.check_ranges()?;
        res.check_indices()?;

        Ok(res)
    }

    pub fn keys(&self) -> HeaderKeys {
        self.keys
    }

    pub fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn raw(&self) -> &RawHeaderFields {
        &self.raw
    }

    fn check_geometry(&self) -> Result<(), ContainerError> {
        let bytes_per_pixel = self.pixel_format.bytes_per_pixel();

        self.frames
            .iter()
            .enumerate()
            .try_for_each(|(frame_index, frame)| {
                if frame.width == 0 || frame.height == 0 {
                    return Err(ContainerError::EmptyFrame { frame: frame_index });
                }

                let row_bytes = (frame.width as usize)
                    .checked_mul(bytes_per_pixel)
                    .ok_or(ContainerError::FrameRangeOverflow { frame: frame_index })?;

                if frame.stride < row_bytes {
                    return Err(ContainerError::StrideTooShort {
                        frame: frame_index,
                        stride: frame.stride,
                        row_bytes,
                    });
                }

                let expected = frame
                    .stride
                    .checked_mul(frame.height as usize)
                    .ok_or(ContainerError::FrameRangeOverflow { frame: frame_index })?;

                if frame.pixels.len() != expected {
                    return Err(ContainerError::FrameDataLength {
                        frame: frame_index,
                        expected,
                        found: frame.pixels.len(),
                    });
                }

                Ok(())
            })
    }

    fn check_ranges(&self) -> Result<(), ContainerError> {
        let mut ranges = self
            .frames
            .iter()
            .enumerate()
            .map(|(frame_index, frame)| {
                if frame.offset < HEADER_LENGTH {
                    return Err(ContainerError::FrameInsideHeader {
                        frame: frame_index,
                        offset: frame.offset,
                    });
                }

                frame
                    .byte_range()
                    .map(|range| (frame_index, range))
                    .ok_or(ContainerError::FrameRangeOverflow { frame: frame_index })
            })
            .collect::<Result<Vec<_>, _>>()?;

        ranges.sort_by_key(|(_, range)| range.start);

        ranges
            .windows(2)
            .try_for_each(|pair| match pair {
                [(first, a), (second, b)] if a.end > b.start => {
                    Err(ContainerError::OverlappingFrameRanges {
                        first: *first.min(second),
                        second: *first.max(second),
                    })
                }
                _ => Ok(()),
            })
    }

    fn check_indices(&self) -> Result<(), ContainerError> {
        if !self.pixel_format.is_indexed() {
            return Ok(());
        }

        let palette_len = self.palette.len();

        self.frames
            .iter()
            .enumerate()
            .try_for_each(|(frame_index, frame)| {
                let row_bytes = frame.width as usize;

                frame
                    .rows()
                    .enumerate()
                    .flat_map(|(row, pixels)| {
                        pixels
                            .iter()
                            .take(row_bytes)
                            .enumerate()
                            .map(move |(column, index)| (row * row_bytes + column, *index))
                    })
                    .find(|(_, index)| *index as usize >= palette_len)
                    .map_or(Ok(()), |(position, index)| {
                        Err(ContainerError::IndexOutOfPaletteRange {
                            frame: frame_index,
                            position,
                            index,
                            palette_len,
                        })
                    })
            })
    }
}
