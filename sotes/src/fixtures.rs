//! Hand-assembled resources for tests. Lays bytes out directly instead of going
//! through the encoder so decoder tests do not depend on it.

use crate::{
    constants::*,
    palette::{Palette, PaletteEntry},
    types::{PixelFormat, RowOrder},
};

pub struct ResourceBuilder {
    pub pixel_format: PixelFormat,
    pub width: u32,
    pub height: u32,
    pub top_down: bool,
    pub palette: Palette,
    /// Top row first.
    pub pixels: Vec<u8>,
    pub obfuscation: u32,
    pub width_slot: u32,
    pub height_slot: u32,
    pub validation_key: u32,
    pub color_depth: Option<u16>,
    pub declared: Option<(i32, i32)>,
    pub gap: Vec<u8>,
    pub trailing: Vec<u8>,
}

impl ResourceBuilder {
    pub fn indexed(width: u32, height: u32) -> Self {
        let palette = (0..PALETTE_ENTRY_COUNT)
            .map(|i| PaletteEntry::from_rgb([i as u8, 255 - i as u8, (i / 2) as u8]))
            .collect::<Vec<_>>();
        let pixels = (0..width * height)
            .map(|i| (i * 37 % 256) as u8)
            .collect();

        Self::new(PixelFormat::Indexed8, width, height, Palette::new(palette), pixels)
    }

    pub fn bgr24(width: u32, height: u32) -> Self {
        let pixels = (0..width * height * 3)
            .map(|i| (i * 13 % 256) as u8)
            .collect();

        Self::new(
            PixelFormat::Bgr24,
            width,
            height,
            Palette::new(vec![PaletteEntry::default(); PALETTE_ENTRY_COUNT]),
            pixels,
        )
    }

    fn new(
        pixel_format: PixelFormat,
        width: u32,
        height: u32,
        palette: Palette,
        pixels: Vec<u8>,
    ) -> Self {
        Self {
            pixel_format,
            width,
            height,
            top_down: false,
            palette,
            pixels,
            obfuscation: 0,
            width_slot: 0,
            height_slot: 0,
            validation_key: VALIDATION_KEY,
            color_depth: None,
            declared: None,
            gap: vec![],
            trailing: vec![],
        }
    }

    pub fn obfuscation(mut self, key: u32) -> Self {
        self.obfuscation = key;
        self
    }

    pub fn slots(mut self, width_slot: u32, height_slot: u32) -> Self {
        self.width_slot = width_slot;
        self.height_slot = height_slot;
        self
    }

    pub fn top_down(mut self) -> Self {
        self.top_down = true;
        self
    }

    pub fn gap(mut self, gap: Vec<u8>) -> Self {
        self.gap = gap;
        self
    }

    pub fn trailing(mut self, trailing: Vec<u8>) -> Self {
        self.trailing = trailing;
        self
    }

    pub fn validation_key(mut self, key: u32) -> Self {
        self.validation_key = key;
        self
    }

    pub fn color_depth(mut self, depth: u16) -> Self {
        self.color_depth = Some(depth);
        self
    }

    pub fn declared_dimensions(mut self, width: i32, height: i32) -> Self {
        self.declared = Some((width, height));
        self
    }

    /// Fills the unused palette of a 24 bit resource with leftover memory.
    pub fn palette_junk(mut self) -> Self {
        self.palette
            .0
            .iter_mut()
            .enumerate()
            .for_each(|(i, entry)| *entry = PaletteEntry::from_bytes([i as u8, 0xcd, 0xcd, 0xcd]));
        self
    }

    fn row_order(&self) -> RowOrder {
        if self.top_down {
            RowOrder::TopDown
        } else {
            RowOrder::BottomUp
        }
    }

    pub fn stride(&self) -> usize {
        self.width as usize * self.pixel_format.bytes_per_pixel()
    }

    pub fn build(&self) -> Vec<u8> {
        let mut bytes = (0..HEADER_LENGTH)
            .map(|i| (i as u8).wrapping_mul(31).wrapping_add(7))
            .collect::<Vec<u8>>();

        bytes[PALETTE_OFFSET..HEADER_TRAILER_OFFSET].copy_from_slice(&self.palette.to_bytes());

        let mut put = |offset: usize, value: &[u8]| {
            if let Some(target) = bytes.get_mut(offset..offset + value.len()) {
                target.copy_from_slice(value);
            }
        };

        let hide = |value: u32| value.wrapping_add(self.obfuscation);
        let (width, height) = self.declared.unwrap_or((
            self.width as i32,
            if self.top_down {
                -(self.height as i32)
            } else {
                self.height as i32
            },
        ));
        let depth = self
            .color_depth
            .unwrap_or(self.pixel_format.color_depth())
            .wrapping_add(self.obfuscation as u16);

        put(OBFUSCATION_KEY_OFFSET, &self.obfuscation.to_le_bytes());
        put(VALIDATION_KEY_OFFSET, &hide(self.validation_key).to_le_bytes());
        put(PIXEL_GAP_OFFSET, &hide(self.gap.len() as u32).to_le_bytes());
        put(WIDTH_SLOT_OFFSET, &hide(self.width_slot).to_le_bytes());
        put(HEIGHT_SLOT_OFFSET, &hide(self.height_slot).to_le_bytes());
        put(COLOR_DEPTH_OFFSET, &depth.to_le_bytes());
        put(
            WIDTH_SLOT_BASE + 4 * self.width_slot as usize,
            &hide(width as u32).to_le_bytes(),
        );
        put(
            HEIGHT_SLOT_BASE + 4 * self.height_slot as usize,
            &hide(height as u32).to_le_bytes(),
        );

        bytes.extend_from_slice(&self.gap);
        bytes.extend(self.row_order().reorder(&self.pixels, self.stride()));
        bytes.extend_from_slice(&self.trailing);

        bytes
    }
}
