use byte_cursor::ByteWriter;

use super::{RasterImage, FILE_HEADER_LENGTH, INFO_HEADER_LENGTH};
use crate::{error::RasterError, types::RowOrder};

/// 72 DPI, what most editors write.
const PIXELS_PER_METER: i32 = 2835;

impl RasterImage {
    /// Writes an uncompressed bitmap with a `BITMAPINFOHEADER`.
    ///
    /// A full 256 entry palette is written with `biClrUsed` 0, anything shorter
    /// declares its own length.
    pub fn to_bytes(&self) -> Result<Vec<u8>, RasterError> {
        let invalid = || RasterError::InvalidDimensions {
            width: self.width.into(),
            height: self.height.into(),
        };

        let row_bytes = self.row_bytes();
        let expected = row_bytes
            .checked_mul(self.height as usize)
            .ok_or_else(invalid)?;

        if self.pixels.len() != expected {
            return Err(RasterError::PixelDataLength {
                expected,
                found: self.pixels.len(),
            });
        }

        let palette_len = self.palette.len();

        if palette_len > 256 {
            return Err(RasterError::PaletteTooLarge { count: palette_len });
        }

        let padded_row_bytes = row_bytes.checked_next_multiple_of(4).ok_or_else(invalid)?;
        let image_size = padded_row_bytes
            .checked_mul(self.height as usize)
            .and_then(|size| u32::try_from(size).ok())
            .ok_or_else(invalid)?;
        let pixel_offset = (FILE_HEADER_LENGTH as u32 + INFO_HEADER_LENGTH) + palette_len as u32 * 4;
        let file_size = pixel_offset.checked_add(image_size).ok_or_else(invalid)?;

        let width = i32::try_from(self.width).map_err(|_| invalid())?;
        let height = match self.row_order {
            RowOrder::BottomUp => i32::try_from(self.height).map_err(|_| invalid())?,
            RowOrder::TopDown => {
                i32::try_from(-i64::from(self.height)).map_err(|_| invalid())?
            }
        };

        let colors_used = if palette_len == 256 && self.pixel_format.is_indexed() {
            0
        } else {
            palette_len as u32
        };

        let mut writer = ByteWriter::with_capacity(file_size as usize);

        // BITMAPFILEHEADER
        writer.append_u8_slice(b"BM");
        writer.append_u32(file_size);
        writer.append_u16(0);
        writer.append_u16(0);
        writer.append_u32(pixel_offset);

        // BITMAPINFOHEADER
        writer.append_u32(INFO_HEADER_LENGTH);
        writer.append_i32(width);
        writer.append_i32(height);
        writer.append_u16(1);
        writer.append_u16(self.pixel_format.color_depth());
        writer.append_u32(0);
        writer.append_u32(image_size);
        writer.append_i32(PIXELS_PER_METER);
        writer.append_i32(PIXELS_PER_METER);
        writer.append_u32(colors_used);
        writer.append_u32(0);

        self.palette.encode(&mut writer);

        let stored = self.row_order.reorder(&self.pixels, row_bytes);

        stored.chunks(row_bytes.max(1)).for_each(|row| {
            writer.append_u8_slice(row);
            writer.append_fill(0, padded_row_bytes - row.len());
        });

        Ok(writer.into_bytes())
    }
}
