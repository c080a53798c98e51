use nom::{
    bytes::complete::take,
    combinator::map,
    multi::count,
    number::complete::{le_i32, le_u16, le_u32},
    IResult as _IResult, Parser,
};

use super::{RasterImage, FILE_HEADER_LENGTH, SUPPORTED_INFO_HEADERS};
use crate::{
    error::RasterError,
    palette::{Palette, PaletteEntry},
    types::{PixelFormat, RowOrder},
};

type IResult<'a, T> = _IResult<&'a [u8], T>;

const BI_RGB: u32 = 0;

struct FileHeader {
    magic: [u8; 2],
    pixel_offset: u32,
}

struct InfoHeader {
    header_size: u32,
    width: i32,
    height: i32,
    bit_count: u16,
    compression: u32,
    colors_used: u32,
}

fn parse_file_header(i: &'_ [u8]) -> IResult<'_, FileHeader> {
    map(
        (take(2usize), le_u32, le_u16, le_u16, le_u32),
        |(magic, _file_size, _reserved1, _reserved2, pixel_offset): (&[u8], _, _, _, _)| {
            FileHeader {
                magic: [magic[0], magic[1]],
                pixel_offset,
            }
        },
    )
    .parse(i)
}

fn parse_info_header(i: &'_ [u8]) -> IResult<'_, InfoHeader> {
    map(
        (
            le_u32, le_i32, le_i32, le_u16, le_u16, le_u32, le_u32, le_i32, le_i32, le_u32, le_u32,
        ),
        |(
            header_size,
            width,
            height,
            _planes,
            bit_count,
            compression,
            _image_size,
            _x_pixels_per_meter,
            _y_pixels_per_meter,
            colors_used,
            _colors_important,
        )| InfoHeader {
            header_size,
            width,
            height,
            bit_count,
            compression,
            colors_used,
        },
    )
    .parse(i)
}

fn parse_color_table(i: &'_ [u8], entry_count: usize) -> IResult<'_, Palette> {
    map(
        count(
            map(take(4usize), |entry: &[u8]| {
                PaletteEntry::from_bytes([entry[0], entry[1], entry[2], entry[3]])
            }),
            entry_count,
        ),
        Palette,
    )
    .parse(i)
}

fn parse_pixel_array(i: &'_ [u8], length: usize) -> IResult<'_, &[u8]> {
    take(length).parse(i)
}

fn truncated<E>(section: &'static str) -> impl Fn(E) -> RasterError {
    move |_| RasterError::Truncated { section }
}

fn color_table_length(info: &InfoHeader, pixel_format: PixelFormat) -> Result<usize, RasterError> {
    let colors_used = info.colors_used as usize;

    match pixel_format {
        PixelFormat::Indexed8 if colors_used == 0 => Ok(256),
        PixelFormat::Indexed8 if colors_used > 256 => Err(RasterError::PaletteTooLarge {
            count: colors_used,
        }),
        // a 24 bit table is only a display hint, keep it if present
        PixelFormat::Indexed8 | PixelFormat::Bgr24 => Ok(colors_used),
    }
}

impl RasterImage {
    pub fn from_bytes(i: &[u8]) -> Result<Self, RasterError> {
        let (_, file_header) = parse_file_header(i).map_err(truncated("file header"))?;

        if &file_header.magic != b"BM" {
            return Err(RasterError::NotABitmap {
                magic: file_header.magic,
            });
        }

        let info_start = i.get(FILE_HEADER_LENGTH..).unwrap_or_default();
        let (_, info) = parse_info_header(info_start).map_err(truncated("info header"))?;

        if !SUPPORTED_INFO_HEADERS.contains(&info.header_size) {
            return Err(RasterError::UnsupportedHeader {
                size: info.header_size,
            });
        }

        if info.compression != BI_RGB {
            return Err(RasterError::UnsupportedCompression {
                compression: info.compression,
            });
        }

        let pixel_format = PixelFormat::from_color_depth(info.bit_count).ok_or(
            RasterError::UnsupportedBitDepth {
                bits: info.bit_count,
            },
        )?;

        if info.width <= 0 || info.height == 0 {
            return Err(RasterError::InvalidDimensions {
                width: info.width.into(),
                height: info.height.into(),
            });
        }

        let width = info.width.unsigned_abs();
        let height = info.height.unsigned_abs();

        // the table follows the info header, whatever its size
        let table_start = FILE_HEADER_LENGTH + info.header_size as usize;
        let table_length = color_table_length(&info, pixel_format)?;
        let (_, palette) = parse_color_table(
            i.get(table_start..).unwrap_or_default(),
            table_length,
        )
        .map_err(truncated("color table"))?;

        let too_large = || RasterError::InvalidDimensions {
            width: width.into(),
            height: height.into(),
        };
        let row_bytes = (width as usize)
            .checked_mul(pixel_format.bytes_per_pixel())
            .ok_or_else(too_large)?;
        let padded_row_bytes = row_bytes.checked_next_multiple_of(4).ok_or_else(too_large)?;
        let pixel_array_length = padded_row_bytes
            .checked_mul(height as usize)
            .ok_or_else(too_large)?;

        let pixel_start = i
            .get(file_header.pixel_offset as usize..)
            .unwrap_or_default();
        let (_, pixel_array) = parse_pixel_array(pixel_start, pixel_array_length)
            .map_err(truncated("pixel array"))?;

        let stored = pixel_array
            .chunks_exact(padded_row_bytes)
            .flat_map(|row| &row[..row_bytes])
            .copied()
            .collect::<Vec<u8>>();

        let row_order = RowOrder::from_signed_height(info.height);

        Ok(Self {
            width,
            height,
            pixel_format,
            row_order,
            palette,
            pixels: row_order.reorder(&stored, row_bytes),
        })
    }
}
