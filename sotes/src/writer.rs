use byte_cursor::ByteWriter;
use log::debug;

use crate::{
    constants::*,
    error::EncodeError,
    palette::Palette,
    types::{Frame, HeaderKeys, PixelFormat, RawHeaderFields, RowOrder, SpriteContainer},
};

trait WriteToWriter {
    fn write_to_bytes(&self, writer: &mut ByteWriter);
}

impl WriteToWriter for Palette {
    fn write_to_bytes(&self, writer: &mut ByteWriter) {
        self.encode(writer);
    }
}

impl WriteToWriter for Frame {
    fn write_to_bytes(&self, writer: &mut ByteWriter) {
        writer.append_u8_slice(&self.stored_pixels());
    }
}

fn check_raw_field(field: &'static str, bytes: &[u8], expected: usize) -> Result<(), EncodeError> {
    if bytes.len() != expected {
        return Err(EncodeError::RawFieldLength {
            field,
            expected,
            found: bytes.len(),
        });
    }

    Ok(())
}

/// Everything that has to hold before a single byte is written.
fn check_layout<'a>(container: &'a SpriteContainer) -> Result<&'a Frame, EncodeError> {
    let palette_len = container.palette().len();

    if palette_len != PALETTE_ENTRY_COUNT {
        return Err(EncodeError::PaletteSizeMismatch {
            expected: PALETTE_ENTRY_COUNT,
            found: palette_len,
        });
    }

    let [frame] = container.frames() else {
        return Err(EncodeError::UnsupportedFrameCount {
            count: container.frames().len(),
        });
    };

    let row_bytes = frame.width() as usize * container.pixel_format().bytes_per_pixel();

    if frame.stride() != row_bytes {
        return Err(EncodeError::StrideMismatch {
            stride: frame.stride(),
            row_bytes,
        });
    }

    let RawHeaderFields {
        lead, trailer, gap, ..
    } = container.raw();

    check_raw_field("lead", lead, HEADER_LEAD_LENGTH)?;
    check_raw_field("trailer", trailer, HEADER_TRAILER_LENGTH)?;

    if gap.len() > MAX_PIXEL_GAP as usize {
        return Err(EncodeError::PixelGapTooLarge { gap: gap.len() });
    }

    Ok(frame)
}

fn signed_dimensions(frame: &Frame) -> Result<(i32, i32), EncodeError> {
    let overflow = || EncodeError::DimensionOverflow {
        width: frame.width(),
        height: frame.height(),
    };

    let width = i32::try_from(frame.width()).map_err(|_| overflow())?;
    let height = match frame.row_order() {
        RowOrder::BottomUp => i32::try_from(frame.height()).map_err(|_| overflow())?,
        RowOrder::TopDown => {
            i32::try_from(-i64::from(frame.height())).map_err(|_| overflow())?
        }
    };

    Ok((width, height))
}

/// Key fields first, then the dimension slots. A slot may alias any other field,
/// the game reads them in the same order.
fn write_header_fields(
    writer: &mut ByteWriter,
    keys: HeaderKeys,
    pixel_format: PixelFormat,
    pixel_gap: u32,
    (width, height): (i32, i32),
) -> Result<(), EncodeError> {
    let slot = |field: &'static str| {
        move |source| EncodeError::HeaderSlotOutOfRange { field, source }
    };

    writer
        .replace_with_u16(COLOR_DEPTH_OFFSET, keys.hide_u16(pixel_format.color_depth()))
        .map_err(slot("color depth"))?;
    writer
        .replace_with_u32(VALIDATION_KEY_OFFSET, keys.hide(VALIDATION_KEY))
        .map_err(slot("validation key"))?;
    writer
        .replace_with_u32(WIDTH_SLOT_OFFSET, keys.hide(keys.width_slot))
        .map_err(slot("width slot selector"))?;
    writer
        .replace_with_u32(HEIGHT_SLOT_OFFSET, keys.hide(keys.height_slot))
        .map_err(slot("height slot selector"))?;
    writer
        .replace_with_u32(OBFUSCATION_KEY_OFFSET, keys.obfuscation)
        .map_err(slot("obfuscation key"))?;
    writer
        .replace_with_u32(PIXEL_GAP_OFFSET, keys.hide(pixel_gap))
        .map_err(slot("pixel gap"))?;

    let slot_offset = |base: usize, selector: u32| {
        (selector as usize)
            .checked_mul(4)
            .and_then(|offset| offset.checked_add(base))
            .unwrap_or(usize::MAX)
    };

    writer
        .replace_with_i32(
            slot_offset(WIDTH_SLOT_BASE, keys.width_slot),
            keys.hide_i32(width),
        )
        .map_err(slot("width"))?;
    writer
        .replace_with_i32(
            slot_offset(HEIGHT_SLOT_BASE, keys.height_slot),
            keys.hide_i32(height),
        )
        .map_err(slot("height"))?;

    Ok(())
}

/// Lays out a resource the game accepts.
///
/// The pixel gap key is computed from where the rows actually land, not copied from
/// the resource the container was decoded from.
pub fn encode_resource(container: &SpriteContainer) -> Result<Vec<u8>, EncodeError> {
    let frame = check_layout(container)?;
    let dimensions = signed_dimensions(frame)?;
    let raw = container.raw();

    let mut writer = ByteWriter::with_capacity(
        HEADER_LENGTH + raw.gap.len() + frame.pixels().len() + raw.trailing.len(),
    );

    writer.append_u8_slice(&raw.lead);
    container.palette().write_to_bytes(&mut writer);
    writer.append_u8_slice(&raw.trailer);
    writer.append_u8_slice(&raw.gap);

    let pixel_offset = writer.get_offset();
    let pixel_gap = (pixel_offset - HEADER_LENGTH) as u32;

    frame.write_to_bytes(&mut writer);
    writer.append_u8_slice(&raw.trailing);

    write_header_fields(
        &mut writer,
        container.keys(),
        container.pixel_format(),
        pixel_gap,
        dimensions,
    )?;

    debug!(
        "encoded {}x{} {:?} resource, pixel data at {:#x}, {} bytes total",
        frame.width(),
        frame.height(),
        container.pixel_format(),
        pixel_offset,
        writer.get_offset()
    );

    Ok(writer.into_bytes())
}
