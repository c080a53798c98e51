//! Reads and writes the packed bitmap resources of Fortune Summoners: Secret of the Elemental Stone.
//!
//! A resource is a fixed 0x458 byte header with an obfuscated geometry, a 256 entry
//! palette, and one unpadded pixel plane. [`decode_resource`] and [`encode_resource`]
//! convert between resource bytes and a [`SpriteContainer`], the [`bmp`] module
//! between a container frame and an ordinary Windows bitmap.
pub mod batch;
pub mod bmp;
pub mod constants;
pub mod error;
mod pack;
pub mod palette;
mod parser;
mod types;
mod utils;
pub mod verify;
mod writer;

#[cfg(test)]
mod fixtures;

pub use bmp::{read_raster, write_raster, RasterImage};
pub use pack::pack;
pub use parser::{decode_resource, decode_resource_with, DecodeOptions};
pub use types::*;
pub use writer::encode_resource;
