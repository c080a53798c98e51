use byte_cursor::{ByteReader, ByteWriter};

use crate::{constants::PALETTE_ENTRY_SIZE, error::PaletteError};

/// One color table entry, stored as B, G, R, reserved exactly like a Windows bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct PaletteEntry {
    pub blue: u8,
    pub green: u8,
    pub red: u8,
    pub reserved: u8,
}

impl PaletteEntry {
    pub fn from_rgb([red, green, blue]: [u8; 3]) -> Self {
        Self {
            blue,
            green,
            red,
            reserved: 0,
        }
    }

    pub fn from_bytes([blue, green, red, reserved]: [u8; 4]) -> Self {
        Self {
            blue,
            green,
            red,
            reserved,
        }
    }

    pub fn to_bytes(self) -> [u8; 4] {
        [self.blue, self.green, self.red, self.reserved]
    }

    pub fn rgb(self) -> [u8; 3] {
        [self.red, self.green, self.blue]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Palette(pub Vec<PaletteEntry>);

impl Palette {
    pub fn new(s: impl Into<Vec<PaletteEntry>>) -> Self {
        Self(s.into())
    }

    pub fn entries(&self) -> &[PaletteEntry] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: u8) -> Option<PaletteEntry> {
        self.0.get(index as usize).copied()
    }

    /// Reads exactly `entry_count` entries from the reader's position.
    pub fn decode(reader: &mut ByteReader, entry_count: usize) -> Result<Self, PaletteError> {
        let mut entries = Vec::with_capacity(entry_count.min(reader.remaining() / PALETTE_ENTRY_SIZE));

        for entries_read in 0..entry_count {
            let bytes = reader
                .read_bytes(PALETTE_ENTRY_SIZE)
                .map_err(|_| PaletteError::TruncatedPalette {
                    entries_read,
                    expected: entry_count,
                })?;

            entries.push(PaletteEntry::from_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3],
            ]));
        }

        Ok(Self(entries))
    }

    /// Decodes a whole byte run. The run must hold a whole number of entries.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PaletteError> {
        if bytes.len() % PALETTE_ENTRY_SIZE != 0 {
            return Err(PaletteError::PartialEntry {
                length: bytes.len(),
            });
        }

        Self::decode(
            &mut ByteReader::new(bytes),
            bytes.len() / PALETTE_ENTRY_SIZE,
        )
    }

    pub fn encode(&self, writer: &mut ByteWriter) {
        self.0
            .iter()
            .for_each(|entry| writer.append_u8_slice(&entry.to_bytes()));
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::with_capacity(self.0.len() * PALETTE_ENTRY_SIZE);
        self.encode(&mut writer);

        writer.into_bytes()
    }

    /// First entry whose reserved byte is not zero.
    pub fn first_reserved_byte_set(&self) -> Option<(usize, u8)> {
        self.0
            .iter()
            .enumerate()
            .find(|(_, entry)| entry.reserved != 0)
            .map(|(index, entry)| (index, entry.reserved))
    }
}
