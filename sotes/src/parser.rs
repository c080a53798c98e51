use byte_cursor::{ByteReader, CursorError};
use log::debug;

use crate::{
    constants::*,
    error::DecodeError,
    palette::Palette,
    types::{Frame, HeaderKeys, PixelFormat, RawHeaderFields, RowOrder, SpriteContainer},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Rejects indexed resources whose palette has non-zero reserved bytes.
    ///
    /// The game itself never checks this.
    pub strict: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self { strict: true }
    }
}

impl DecodeOptions {
    pub fn lenient() -> Self {
        Self { strict: false }
    }
}

/// Values read from the fixed header, already de-obfuscated.
struct Header<'a> {
    lead: &'a [u8],
    palette: Palette,
    trailer: &'a [u8],
    keys: HeaderKeys,
    pixel_gap: u32,
    width: i32,
    height: i32,
    color_depth: u16,
}

fn truncated_header(source: CursorError) -> DecodeError {
    DecodeError::TruncatedHeader { source }
}

/// `base + 4 * selector`, `None` when it does not fit.
fn slot_offset(base: usize, selector: u32) -> Option<usize> {
    usize::try_from(selector)
        .ok()?
        .checked_mul(4)?
        .checked_add(base)
}

fn slot_out_of_range(offset: Option<usize>, available: usize) -> DecodeError {
    DecodeError::TruncatedHeader {
        source: CursorError::UnexpectedEndOfData {
            offset: offset.unwrap_or(usize::MAX),
            wanted: 4,
            available,
        },
    }
}

fn read_slot(reader: &ByteReader, base: usize, selector: u32) -> Result<i32, DecodeError> {
    let offset = slot_offset(base, selector);

    offset
        .and_then(|offset| reader.read_i32_at(offset).ok())
        .ok_or_else(|| slot_out_of_range(offset, reader.len()))
}

fn parse_header<'a>(reader: &mut ByteReader<'a>) -> Result<Header<'a>, DecodeError> {
    let lead = reader
        .read_bytes(HEADER_LEAD_LENGTH)
        .map_err(truncated_header)?;
    let palette = Palette::decode(reader, PALETTE_ENTRY_COUNT)?;
    let trailer = reader
        .read_bytes(HEADER_TRAILER_LENGTH)
        .map_err(truncated_header)?;

    // signature first, nothing else is trusted before it matches
    let obfuscation = reader
        .read_u32_at(OBFUSCATION_KEY_OFFSET)
        .map_err(truncated_header)?;
    let reveal = |offset: usize| {
        reader
            .read_u32_at(offset)
            .map(|stored| stored.wrapping_sub(obfuscation))
            .map_err(truncated_header)
    };

    let validation_key = reveal(VALIDATION_KEY_OFFSET)?;
    let pixel_gap = reveal(PIXEL_GAP_OFFSET)?;

    if validation_key != VALIDATION_KEY || pixel_gap > MAX_PIXEL_GAP {
        return Err(DecodeError::NotASpriteResource {
            validation_key,
            pixel_gap,
        });
    }

    let keys = HeaderKeys {
        obfuscation,
        width_slot: reveal(WIDTH_SLOT_OFFSET)?,
        height_slot: reveal(HEIGHT_SLOT_OFFSET)?,
    };

    let width = keys.reveal_i32(read_slot(reader, WIDTH_SLOT_BASE, keys.width_slot)?);
    let height = keys.reveal_i32(read_slot(reader, HEIGHT_SLOT_BASE, keys.height_slot)?);

    let color_depth = keys.reveal_u16(
        reader
            .read_u16_at(COLOR_DEPTH_OFFSET)
            .map_err(truncated_header)?,
    );

    Ok(Header {
        lead,
        palette,
        trailer,
        keys,
        pixel_gap,
        width,
        height,
        color_depth,
    })
}

fn validate_header(header: &Header, options: DecodeOptions) -> Result<PixelFormat, DecodeError> {
    if header.width <= 0 || header.height == 0 {
        return Err(DecodeError::InvalidDimensions {
            width: header.width,
            height: header.height,
        });
    }

    let pixel_format = PixelFormat::from_color_depth(header.color_depth).ok_or(
        DecodeError::UnsupportedColorDepth {
            depth: header.color_depth,
        },
    )?;

    // 24 bit resources carry whatever was in memory in the palette slot
    if options.strict && pixel_format.is_indexed() {
        if let Some((index, value)) = header.palette.first_reserved_byte_set() {
            return Err(DecodeError::PaletteReservedByteSet { index, value });
        }
    }

    Ok(pixel_format)
}

/// Reads the gap, the pixel rows and whatever trails them.
fn parse_frame<'a>(
    reader: &mut ByteReader<'a>,
    header: &Header,
    pixel_format: PixelFormat,
) -> Result<(Frame, &'a [u8], &'a [u8]), DecodeError> {
    let width = header.width.unsigned_abs();
    let height = header.height.unsigned_abs();
    let offset = HEADER_LENGTH + header.pixel_gap as usize;
    let available = reader.len();

    let stride = pixel_format.bytes_per_pixel() as u64 * width as u64;
    let wanted = stride * height as u64;

    let truncated = || DecodeError::TruncatedFrameData {
        frame: 0,
        offset,
        wanted,
        available,
    };

    let gap = reader
        .peek_bytes_at(HEADER_LENGTH, header.pixel_gap as usize)
        .map_err(|_| truncated())?;

    let stride = usize::try_from(stride).map_err(|_| truncated())?;
    let length = usize::try_from(wanted).map_err(|_| truncated())?;

    reader.seek(offset).map_err(|_| truncated())?;
    let stored = reader.read_bytes(length).map_err(|_| truncated())?;
    let trailing = reader.read_rest();

    let row_order = RowOrder::from_signed_height(header.height);
    let frame = Frame::new(
        (width, height),
        stride,
        offset,
        row_order,
        row_order.reorder(stored, stride),
    );

    Ok((frame, gap, trailing))
}

/// Decodes one packed bitmap resource with the default, strict, options.
pub fn decode_resource(i: &[u8]) -> Result<SpriteContainer, DecodeError> {
    decode_resource_with(i, DecodeOptions::default())
}

pub fn decode_resource_with(
    i: &[u8],
    options: DecodeOptions,
) -> Result<SpriteContainer, DecodeError> {
    let mut reader = ByteReader::new(i);

    let header = parse_header(&mut reader)?;
    let pixel_format = validate_header(&header, options)?;
    let (frame, gap, trailing) = parse_frame(&mut reader, &header, pixel_format)?;

    debug!(
        "decoded {}x{} {:?} resource, pixel data at {:#x}, {} trailing bytes",
        frame.width(),
        frame.height(),
        pixel_format,
        frame.offset(),
        trailing.len()
    );

    let Header {
        lead,
        palette,
        trailer,
        keys,
        ..
    } = header;

    let raw = RawHeaderFields {
        lead: lead.to_vec(),
        trailer: trailer.to_vec(),
        gap: gap.to_vec(),
        trailing: trailing.to_vec(),
    };

    let container = SpriteContainer::new(keys, pixel_format, palette, vec![frame], raw)?;

    Ok(container)
}
