use std::{
    ffi::OsStr,
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use image::{Rgb, RgbImage};

use crate::{
    error::{DecodeError, EncodeError},
    parser::{decode_resource_with, DecodeOptions},
    types::{PixelFormat, SpriteContainer},
    writer::encode_resource,
};

impl SpriteContainer {
    pub fn open_from_bytes(i: &[u8]) -> Result<Self, DecodeError> {
        Self::open_from_bytes_with(i, DecodeOptions::default())
    }

    pub fn open_from_bytes_with(i: &[u8], options: DecodeOptions) -> Result<Self, DecodeError> {
        decode_resource_with(i, options)
    }

    pub fn open_from_file(path: impl AsRef<OsStr> + AsRef<Path>) -> Result<Self, DecodeError> {
        Self::open_from_file_with(path, DecodeOptions::default())
    }

    pub fn open_from_file_with(
        path: impl AsRef<OsStr> + AsRef<Path>,
        options: DecodeOptions,
    ) -> Result<Self, DecodeError> {
        let file = std::fs::read(path)?;

        Self::open_from_bytes_with(&file, options)
    }

    pub fn write_to_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        encode_resource(self)
    }

    pub fn write_to_file(&self, path: impl AsRef<Path> + Into<PathBuf>) -> Result<(), EncodeError> {
        let bytes = self.write_to_bytes()?;

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        file.write_all(&bytes)?;

        file.flush()?;

        Ok(())
    }

    /// A true color preview of one frame. `None` if there is no such frame.
    pub fn to_rgb8(&self, frame_index: usize) -> Option<RgbImage> {
        let frame = self.frame(frame_index)?;
        let stride = frame.stride();
        let pixels = frame.pixels();

        let image = RgbImage::from_fn(frame.width(), frame.height(), |x, y| {
            let start = y as usize * stride + x as usize * self.pixel_format().bytes_per_pixel();

            match self.pixel_format() {
                PixelFormat::Indexed8 => pixels
                    .get(start)
                    .and_then(|index| self.palette().get(*index))
                    .map(|entry| Rgb(entry.rgb()))
                    .unwrap_or(Rgb([0, 0, 0])),
                PixelFormat::Bgr24 => match pixels.get(start..start + 3) {
                    Some(&[blue, green, red]) => Rgb([red, green, blue]),
                    _ => Rgb([0, 0, 0]),
                },
            }
        });

        Some(image)
    }
}
