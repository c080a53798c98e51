use log::debug;

use crate::{
    bmp::RasterImage,
    error::EncodeError,
    types::{Frame, SpriteContainer},
};

/// Puts an edited bitmap back into the resource it was unpacked from.
///
/// Everything the bitmap cannot carry (keys, slots, retained header bytes, row order)
/// comes from `reference`. For 24 bit resources the reference palette is kept as is.
pub fn pack(
    reference: &SpriteContainer,
    raster: &RasterImage,
) -> Result<SpriteContainer, EncodeError> {
    let [frame] = reference.frames() else {
        return Err(EncodeError::UnsupportedFrameCount {
            count: reference.frames().len(),
        });
    };

    if frame.dimensions() != (raster.width, raster.height) {
        return Err(EncodeError::FrameGeometryMismatch {
            expected: frame.dimensions(),
            found: (raster.width, raster.height),
        });
    }

    let pixel_format = reference.pixel_format();

    if raster.pixel_format != pixel_format {
        return Err(EncodeError::PixelFormatMismatch {
            expected: pixel_format,
            found: raster.pixel_format,
        });
    }

    let palette = if pixel_format.is_indexed() {
        if let Some((position, index)) = raster.first_index_outside_palette() {
            return Err(EncodeError::TooManyColorIndices {
                position,
                index,
                palette_len: raster.palette.len(),
            });
        }

        if raster.palette.len() != reference.palette().len() {
            return Err(EncodeError::PaletteSizeMismatch {
                expected: reference.palette().len(),
                found: raster.palette.len(),
            });
        }

        raster.palette.clone()
    } else {
        reference.palette().clone()
    };

    let packed = Frame::new(
        frame.dimensions(),
        frame.stride(),
        frame.offset(),
        frame.row_order(),
        raster.pixels.as_slice(),
    );

    debug!(
        "packed {}x{} {:?} bitmap over reference at {:#x}",
        raster.width,
        raster.height,
        pixel_format,
        frame.offset()
    );

    let res = SpriteContainer::new(
        reference.keys(),
        pixel_format,
        palette,
        vec![packed],
        reference.raw().clone(),
    )?;

    Ok(res)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        error::{Categorized, ErrorCategory},
        fixtures::ResourceBuilder,
        palette::{Palette, PaletteEntry},
        parser::{decode_resource, decode_resource_with, DecodeOptions},
        types::PixelFormat,
        writer::encode_resource,
    };

    fn reference(builder: &ResourceBuilder) -> SpriteContainer {
        decode_resource_with(&builder.build(), DecodeOptions::lenient()).unwrap()
    }

    #[test]
    fn edited_bitmap_round_trips() {
        let builder = ResourceBuilder::indexed(7, 5)
            .obfuscation(0x0bad_f00d)
            .slots(3, 2)
            .gap(vec![9; 3])
            .trailing(vec![1, 2]);
        let reference = reference(&builder);

        let mut raster = RasterImage::from_container(&reference, 0).unwrap();
        raster.pixels.iter_mut().for_each(|index| *index = index.wrapping_add(1));
        raster.palette.0.reverse();

        let packed = pack(&reference, &raster).unwrap();
        let bytes = encode_resource(&packed).unwrap();
        let decoded = decode_resource(&bytes).unwrap();

        assert_eq!(decoded.palette(), &raster.palette);
        assert_eq!(decoded.frames()[0].pixels(), raster.pixels.as_slice());
        assert_eq!(decoded.keys(), reference.keys());
        assert_eq!(decoded.raw(), reference.raw());
        assert_eq!(bytes.len(), builder.build().len());
    }

    #[test]
    fn unedited_bitmap_packs_to_same_bytes() {
        for builder in [
            ResourceBuilder::indexed(4, 3).top_down(),
            ResourceBuilder::bgr24(3, 3).palette_junk().obfuscation(5),
        ] {
            let bytes = builder.build();
            let reference = reference(&builder);
            let raster = RasterImage::from_container(&reference, 0).unwrap();

            let packed = pack(&reference, &raster).unwrap();

            assert_eq!(encode_resource(&packed).unwrap(), bytes);
        }
    }

    #[test]
    fn palette_size_mismatch_yields_nothing() {
        let reference = reference(&ResourceBuilder::indexed(4, 4));
        let mut raster = RasterImage::from_container(&reference, 0).unwrap();
        raster.pixels.iter_mut().for_each(|index| *index %= 16);
        raster.palette = Palette::new(vec![PaletteEntry::default(); 16]);

        let err = pack(&reference, &raster).unwrap_err();

        assert!(matches!(
            err,
            EncodeError::PaletteSizeMismatch {
                expected: 256,
                found: 16
            }
        ));
        assert_eq!(err.category(), ErrorCategory::PackPrecondition);
    }

    #[test]
    fn check_order() {
        let reference = reference(&ResourceBuilder::indexed(4, 4));
        let base = RasterImage::from_container(&reference, 0).unwrap();

        // wrong size and wrong format, size wins
        let raster = RasterImage {
            width: 5,
            pixel_format: PixelFormat::Bgr24,
            ..base.clone()
        };
        assert!(matches!(
            pack(&reference, &raster),
            Err(EncodeError::FrameGeometryMismatch {
                expected: (4, 4),
                found: (5, 4)
            })
        ));

        let raster = RasterImage {
            pixel_format: PixelFormat::Bgr24,
            ..base.clone()
        };
        assert!(matches!(
            pack(&reference, &raster),
            Err(EncodeError::PixelFormatMismatch {
                expected: PixelFormat::Indexed8,
                found: PixelFormat::Bgr24
            })
        ));

        // short palette with an index past it, the index wins
        let raster = RasterImage {
            palette: Palette::new(vec![PaletteEntry::default(); 4]),
            ..base.clone()
        };
        assert!(matches!(
            pack(&reference, &raster),
            Err(EncodeError::TooManyColorIndices { palette_len: 4, .. })
        ));
    }
}
