//! Byte layout of a packed SotES bitmap resource.
//!
//! Every multi-byte field is little-endian. Stored key fields are `value + obfuscation key`
//! with wrapping arithmetic.

pub const HEADER_LEAD_LENGTH: usize = 0x20;
pub const PALETTE_OFFSET: usize = 0x20;
pub const PALETTE_ENTRY_COUNT: usize = 256;
pub const PALETTE_ENTRY_SIZE: usize = 4;
pub const HEADER_TRAILER_OFFSET: usize = 0x420;
pub const HEADER_TRAILER_LENGTH: usize = 0x38;
/// Pixel data never starts before this.
pub const HEADER_LENGTH: usize = 0x458;

/// Selects which 4-byte slot after [`HEIGHT_SLOT_BASE`] holds the height.
pub const HEIGHT_SLOT_OFFSET: usize = 0x018;
pub const COLOR_DEPTH_OFFSET: usize = 0x430;
pub const VALIDATION_KEY_OFFSET: usize = 0x438;
/// Selects which 4-byte slot after [`WIDTH_SLOT_BASE`] holds the width.
pub const WIDTH_SLOT_OFFSET: usize = 0x440;
pub const OBFUSCATION_KEY_OFFSET: usize = 0x448;
/// Number of opaque bytes between the header and the pixel rows.
pub const PIXEL_GAP_OFFSET: usize = 0x450;

pub const WIDTH_SLOT_BASE: usize = 0x004;
pub const HEIGHT_SLOT_BASE: usize = 0x420;

/// The game refuses resources whose validation key does not de-obfuscate to this.
pub const VALIDATION_KEY: u32 = 10001;
pub const MAX_PIXEL_GAP: u32 = 128;

pub const BITMAP_EXTENSION: &str = "bmp";
pub const RESOURCE_EXTENSION: &str = "bin";
pub const PREVIEW_EXTENSION: &str = "png";
