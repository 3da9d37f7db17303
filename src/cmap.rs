//! Character to glyph mapping (`cmap`)
//!
//! Subtables in formats 0, 4 and 12 are decoded and merged into a single codepoint to glyph index
//! map. Other formats are rejected rather than skipped so that no mapped character can go
//! unnoticed when stripping.
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/cmap>

use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;

use bytes::Buf;

use crate::buffer::read_u16_at;
use crate::error::{WoffError, bail, bail_if};

const MAX_CODEPOINT: u32 = 0x10FFFF;

const INDEX_HEADER_SIZE: usize = 4;
const ENCODING_RECORD_SIZE: usize = 8;
const FORMAT0_SIZE: usize = 6 + 256;
const FORMAT4_HEADER_SIZE: usize = 14;
const FORMAT12_HEADER_SIZE: usize = 16;
const FORMAT12_GROUP_SIZE: usize = 12;

/// An inclusive range of codepoints. A list of these represents a set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CodepointRange {
    pub from: u32,
    pub to: u32,
}

impl CodepointRange {
    pub fn new(from: u32, to: u32) -> Self {
        Self { from, to }
    }

    pub fn single(codepoint: u32) -> Self {
        Self::new(codepoint, codepoint)
    }

    pub fn contains(&self, codepoint: u32) -> bool {
        codepoint >= self.from && codepoint <= self.to
    }

    pub fn is_single(&self) -> bool {
        self.from == self.to
    }

    pub fn iter(&self) -> RangeInclusive<u32> {
        self.from..=self.to
    }
}

/// Every codepoint covered by a list of ranges, in list order
pub fn codepoints(ranges: &[CodepointRange]) -> impl Iterator<Item = u32> + '_ {
    ranges.iter().flat_map(CodepointRange::iter)
}

/// Mapping from codepoint to glyph index. Glyph index 0 (`.notdef`) is never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharMap {
    map: BTreeMap<u32, u32>,
}

impl CharMap {
    /// Decode and merge all subtables of a raw `cmap` table.
    pub fn parse(data: &[u8]) -> Result<Self, WoffError> {
        let mut input = data;
        bail_if!(data.len() < INDEX_HEADER_SIZE, WoffError::CmapTruncated);
        let _version = input.try_get_u16()?;
        let num_subtables = input.try_get_u16()? as usize;
        bail_if!(
            data.len() < INDEX_HEADER_SIZE + num_subtables * ENCODING_RECORD_SIZE,
            WoffError::CmapTruncated
        );

        let mut map = BTreeMap::new();
        for _ in 0..num_subtables {
            let platform_id = input.try_get_u16()?;
            let encoding_id = input.try_get_u16()?;
            let offset = input.try_get_u32()? as usize;
            bail_if!(
                offset.checked_add(2).is_none_or(|end| end > data.len()),
                WoffError::CmapTruncated
            );
            let subtable = &data[offset..];

            let format = read_u16_at(subtable, 0)?;
            log::debug!("cmap subtable {platform_id}/{encoding_id} format {format} at {offset}");
            let submap = match format {
                0 => parse_format0(subtable)?,
                4 => parse_format4(subtable)?,
                12 => parse_format12(subtable)?,
                _ => {
                    log::warn!("unsupported cmap format {format}");
                    bail!(WoffError::UnsupportedCmapFormat(format))
                }
            };

            for (codepoint, glyph) in submap {
                debug_assert!(glyph != 0);
                match map.insert(codepoint, glyph) {
                    Some(existing) if existing != glyph => {
                        log::warn!("char index conflict for {codepoint:04x}");
                        bail!(WoffError::ConflictingMapping(codepoint))
                    }
                    _ => {}
                }
            }
        }

        Ok(Self { map })
    }

    /// The glyph mapped to a codepoint, if any. Never `Some(0)`.
    pub fn get(&self, codepoint: u32) -> Option<u32> {
        self.map.get(&codepoint).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Mappings in ascending codepoint order
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.map.iter().map(|(&codepoint, &glyph)| (codepoint, glyph))
    }

    /// Replace `ranges` with the mapped codepoints they cover; mapped codepoints they don't
    /// cover are appended to `remainder`.
    pub fn intersect(&self, ranges: &mut Vec<CodepointRange>, remainder: &mut Vec<CodepointRange>) {
        self.set_op(ranges, remainder, true)
    }

    /// Replace `ranges` with the mapped codepoints they don't cover; mapped codepoints they do
    /// cover are appended to `remainder`.
    pub fn subtract(&self, ranges: &mut Vec<CodepointRange>, remainder: &mut Vec<CodepointRange>) {
        self.set_op(ranges, remainder, false)
    }

    /// Partition the mapped codepoints by membership in `ranges`.
    ///
    /// The result is a list of single-codepoint ranges in ascending order. A single-codepoint
    /// range in the input is consumed the first time it matches.
    fn set_op(
        &self,
        ranges: &mut Vec<CodepointRange>,
        remainder: &mut Vec<CodepointRange>,
        keep_given: bool,
    ) {
        let mut result = Vec::new();
        for &codepoint in self.map.keys() {
            let given = match ranges.iter().position(|range| range.contains(codepoint)) {
                Some(pos) => {
                    if ranges[pos].is_single() {
                        ranges.remove(pos);
                    }
                    true
                }
                None => false,
            };
            if given == keep_given {
                result.push(CodepointRange::single(codepoint));
            } else {
                remainder.push(CodepointRange::single(codepoint));
            }
        }
        *ranges = result;
    }

    /// Reduce `ranges` to the distinct single codepoints that are also covered by `mask`,
    /// keeping first-seen order.
    pub fn static_intersect(mask: &[CodepointRange], ranges: &mut Vec<CodepointRange>) {
        let mut seen = BTreeSet::new();
        let result = codepoints(ranges)
            .filter(|&codepoint| mask.iter().any(|range| range.contains(codepoint)))
            .filter(|&codepoint| seen.insert(codepoint))
            .map(CodepointRange::single)
            .collect();
        *ranges = result;
    }
}

/// Format 0: byte encoding table
fn parse_format0(subtable: &[u8]) -> Result<BTreeMap<u32, u32>, WoffError> {
    bail_if!(subtable.len() < FORMAT0_SIZE, WoffError::CmapTruncated);
    let glyph_ids = &subtable[6..FORMAT0_SIZE];
    Ok(glyph_ids
        .iter()
        .enumerate()
        .filter(|&(_, &glyph)| glyph != 0)
        .map(|(codepoint, &glyph)| (codepoint as u32, glyph as u32))
        .collect())
}

/// Format 4: segment mapping to delta values
fn parse_format4(subtable: &[u8]) -> Result<BTreeMap<u32, u32>, WoffError> {
    bail_if!(subtable.len() < FORMAT4_HEADER_SIZE, WoffError::CmapTruncated);
    let seg_count = (read_u16_at(subtable, 6)? / 2) as usize;
    bail_if!(
        subtable.len() < FORMAT4_HEADER_SIZE + seg_count * 8 + 2,
        WoffError::CmapTruncated
    );

    let end_codes = FORMAT4_HEADER_SIZE;
    // endCode[segCount] is followed by a reserved u16
    let start_codes = end_codes + seg_count * 2 + 2;
    let id_deltas = start_codes + seg_count * 2;
    let id_range_offsets = id_deltas + seg_count * 2;

    let mut map = BTreeMap::new();
    for seg in 0..seg_count {
        let end = read_u16_at(subtable, end_codes + seg * 2)? as u32;
        let start = read_u16_at(subtable, start_codes + seg * 2)? as u32;
        let id_delta = read_u16_at(subtable, id_deltas + seg * 2)?;
        let range_offset_pos = id_range_offsets + seg * 2;
        let id_range_offset = read_u16_at(subtable, range_offset_pos)? as usize;
        bail_if!(start > end, WoffError::InvalidCmapSegment { start, end });

        for codepoint in start..=end {
            let glyph = if id_range_offset == 0 {
                (codepoint as u16).wrapping_add(id_delta)
            } else {
                // idRangeOffset is a byte offset from its own location into glyphIdArray
                let pos = range_offset_pos + id_range_offset + (codepoint - start) as usize * 2;
                read_u16_at(subtable, pos)
                    .map_err(|_| WoffError::CmapTruncated)?
                    .wrapping_add(id_delta)
            };
            if glyph == 0 {
                continue;
            }

            match map.insert(codepoint, glyph as u32) {
                Some(existing) if existing != glyph as u32 => {
                    bail!(WoffError::ConflictingMapping(codepoint))
                }
                _ => {}
            }
        }
    }

    Ok(map)
}

/// Format 12: segmented coverage
fn parse_format12(subtable: &[u8]) -> Result<BTreeMap<u32, u32>, WoffError> {
    bail_if!(subtable.len() < FORMAT12_HEADER_SIZE, WoffError::CmapTruncated);
    let mut input = &subtable[12..];
    let num_groups = input.try_get_u32()? as usize;
    bail_if!(
        num_groups
            .checked_mul(FORMAT12_GROUP_SIZE)
            .is_none_or(|size| subtable.len() - FORMAT12_HEADER_SIZE < size),
        WoffError::CmapTruncated
    );

    let mut map = BTreeMap::new();
    for _ in 0..num_groups {
        let start = input.try_get_u32()?;
        let end = input.try_get_u32()?;
        let start_glyph = input.try_get_u32()?;
        bail_if!(
            start > end || end > MAX_CODEPOINT,
            WoffError::InvalidCmapSegment { start, end }
        );

        for codepoint in start..=end {
            let glyph = start_glyph.wrapping_add(codepoint - start);
            if glyph == 0 {
                continue;
            }
            bail_if!(
                map.insert(codepoint, glyph).is_some(),
                WoffError::ConflictingMapping(codepoint)
            );
        }
    }

    Ok(map)
}
