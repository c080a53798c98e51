//! Uncompressed Windows bitmaps, the format edited images travel in.
//!
//! Only what the game can hold is supported: 8 bit indexed and 24 bit BGR, stored
//! bottom-up or top-down. Color tables are kept byte for byte, reserved byte included.

use std::{
    ffi::OsStr,
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use crate::{
    error::RasterError,
    palette::Palette,
    types::{PixelFormat, RowOrder, SpriteContainer},
};

mod parser;
mod writer;

pub const FILE_HEADER_LENGTH: usize = 14;
pub const INFO_HEADER_LENGTH: u32 = 40;
/// `BITMAPINFOHEADER` and the later headers extending it.
pub const SUPPORTED_INFO_HEADERS: &[u32] = &[40, 52, 56, 108, 124];

/// One decoded bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub pixel_format: PixelFormat,
    /// How rows are stored on disk. Does not affect `pixels`.
    pub row_order: RowOrder,
    /// Empty for 24 bit images without a color table.
    pub palette: Palette,
    /// Top row first, no row padding.
    pub pixels: Vec<u8>,
}

impl RasterImage {
    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.pixel_format.bytes_per_pixel()
    }

    /// The image an unpacked frame turns into.
    pub fn from_container(container: &SpriteContainer, frame_index: usize) -> Option<Self> {
        Self::from_container_with(container, frame_index, false)
    }

    /// Like [`Self::from_container`]. With `keep_palette`, 24 bit frames also carry the
    /// resource's palette slot as their color table.
    pub fn from_container_with(
        container: &SpriteContainer,
        frame_index: usize,
        keep_palette: bool,
    ) -> Option<Self> {
        let frame = container.frame(frame_index)?;
        let pixel_format = container.pixel_format();
        let row_bytes = frame.width() as usize * pixel_format.bytes_per_pixel();

        let pixels = frame
            .rows()
            .flat_map(|row| row.iter().take(row_bytes))
            .copied()
            .collect();

        let palette = if pixel_format.is_indexed() || keep_palette {
            container.palette().clone()
        } else {
            Palette::default()
        };

        Some(Self {
            width: frame.width(),
            height: frame.height(),
            pixel_format,
            row_order: frame.row_order(),
            palette,
            pixels,
        })
    }

    /// Color indices that point past the end of the palette, as `(position, index)`.
    pub fn first_index_outside_palette(&self) -> Option<(usize, u8)> {
        if !self.pixel_format.is_indexed() {
            return None;
        }

        self.pixels
            .iter()
            .enumerate()
            .find(|(_, index)| **index as usize >= self.palette.len())
            .map(|(position, index)| (position, *index))
    }
}

pub fn read_raster(path: impl AsRef<OsStr> + AsRef<Path>) -> Result<RasterImage, RasterError> {
    let bytes = std::fs::read(path)?;

    RasterImage::from_bytes(&bytes)
}

pub fn write_raster(
    path: impl AsRef<Path> + Into<PathBuf>,
    image: &RasterImage,
) -> Result<(), RasterError> {
    let bytes = image.to_bytes()?;

    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;

    file.write_all(&bytes)?;

    file.flush()?;

    Ok(())
}
