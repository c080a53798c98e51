//! Decode, re-encode and compare. Tells which part of a resource the codec does not
//! reproduce, if any.

use std::ops::Range;

use crate::{
    constants::{HEADER_LENGTH, HEADER_TRAILER_OFFSET, PALETTE_OFFSET},
    error::VerifyError,
    parser::{decode_resource_with, DecodeOptions},
    types::SpriteContainer,
    writer::encode_resource,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    Lead,
    Palette,
    Trailer,
    Gap,
    Frame(usize),
    Trailing,
    /// The two buffers differ in length.
    Length,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionMismatch {
    pub region: Region,
    /// Absolute offset of the first differing byte.
    pub first_offset: usize,
    pub differing_bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundTripReport {
    pub original_length: usize,
    pub encoded_length: usize,
    pub mismatches: Vec<RegionMismatch>,
    /// Decoding the re-encoded bytes gives back the same container.
    pub structurally_equal: bool,
}

impl RoundTripReport {
    pub fn is_byte_exact(&self) -> bool {
        self.mismatches.is_empty() && self.original_length == self.encoded_length
    }
}

fn regions(container: &SpriteContainer, length: usize) -> Vec<(Region, Range<usize>)> {
    let mut res = vec![
        (Region::Lead, 0..PALETTE_OFFSET),
        (Region::Palette, PALETTE_OFFSET..HEADER_TRAILER_OFFSET),
        (Region::Trailer, HEADER_TRAILER_OFFSET..HEADER_LENGTH),
    ];

    let mut cursor = HEADER_LENGTH;

    container
        .frames()
        .iter()
        .enumerate()
        .for_each(|(frame_index, frame)| {
            let range = frame.byte_range().unwrap_or(frame.offset()..frame.offset());

            if frame_index == 0 {
                res.push((Region::Gap, cursor..range.start));
            }

            cursor = range.end;
            res.push((Region::Frame(frame_index), range));
        });

    res.push((Region::Trailing, cursor..length.max(cursor)));

    res
}

/// The part of `range` that lies inside `bytes`.
fn clamp<'a>(bytes: &'a [u8], range: &Range<usize>) -> &'a [u8] {
    let start = range.start.min(bytes.len());
    let end = range.end.clamp(start, bytes.len());

    &bytes[start..end]
}

fn compare(region: Region, range: Range<usize>, a: &[u8], b: &[u8]) -> Option<RegionMismatch> {
    let (left, right) = (clamp(a, &range), clamp(b, &range));
    let mut differing = left
        .iter()
        .zip(right)
        .enumerate()
        .filter(|(_, (x, y))| x != y)
        .map(|(index, _)| index);

    let first = differing.next()?;
    let differing_bytes = 1 + differing.count();

    Some(RegionMismatch {
        region,
        first_offset: range.start + first,
        differing_bytes,
    })
}

pub fn verify_round_trip(i: &[u8]) -> Result<RoundTripReport, VerifyError> {
    verify_round_trip_with(i, DecodeOptions::default())
}

pub fn verify_round_trip_with(
    i: &[u8],
    options: DecodeOptions,
) -> Result<RoundTripReport, VerifyError> {
    let container = decode_resource_with(i, options)?;
    let encoded = encode_resource(&container)?;

    let mut mismatches = regions(&container, i.len())
        .into_iter()
        .filter_map(|(region, range)| compare(region, range, i, &encoded))
        .collect::<Vec<_>>();

    if i.len() != encoded.len() {
        let shorter = i.len().min(encoded.len());

        mismatches.push(RegionMismatch {
            region: Region::Length,
            first_offset: shorter,
            differing_bytes: i.len().max(encoded.len()) - shorter,
        });
    }

    let structurally_equal = decode_resource_with(&encoded, options)
        .map(|again| again == container)
        .unwrap_or(false);

    Ok(RoundTripReport {
        original_length: i.len(),
        encoded_length: encoded.len(),
        mismatches,
        structurally_equal,
    })
}
