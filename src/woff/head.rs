//! The fields of the `head` table the editor depends on
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/head>

use crate::buffer::{read_i16_at, read_u16_at, read_u32_at, write_u32_at};
use crate::error::{WoffError, bail_if};
use crate::sfnt_common::HEAD_CHECKSUM_ADJUSTMENT_OFFSET;

pub const HEAD_TABLE_SIZE: usize = 54;

const FLAGS_OFFSET: usize = 16;
const Y_MIN_OFFSET: usize = 38;
const INDEX_TO_LOC_FORMAT_OFFSET: usize = 50;

/// Bit 0 of `head.flags`: "baseline for font at y=0"
const FLAG_BASELINE_AT_Y0: u16 = 1 << 0;

/// A validated view over the raw bytes of a `head` table
pub struct HeadTable<'a> {
    data: &'a [u8],
}

impl<'a> HeadTable<'a> {
    pub fn new(data: &'a [u8]) -> Result<Self, WoffError> {
        bail_if!(data.len() < HEAD_TABLE_SIZE, WoffError::HeadTableTooShort);
        Ok(Self { data })
    }

    pub fn checksum_adjustment(&self) -> Result<u32, WoffError> {
        read_u32_at(self.data, HEAD_CHECKSUM_ADJUSTMENT_OFFSET)
    }

    pub fn flags(&self) -> Result<u16, WoffError> {
        read_u16_at(self.data, FLAGS_OFFSET)
    }

    pub fn baseline_at_zero(&self) -> Result<bool, WoffError> {
        Ok(self.flags()? & FLAG_BASELINE_AT_Y0 != 0)
    }

    /// Minimum y over all glyph bounding boxes
    pub fn y_min(&self) -> Result<i16, WoffError> {
        read_i16_at(self.data, Y_MIN_OFFSET)
    }

    /// 0 for short (u16, halved) loca offsets, 1 for long (u32) offsets
    pub fn index_to_loc_format(&self) -> Result<u16, WoffError> {
        read_u16_at(self.data, INDEX_TO_LOC_FORMAT_OFFSET)
    }
}

/// Overwrite `checkSumAdjustment` in a raw `head` table
pub fn set_checksum_adjustment(data: &mut [u8], adjustment: u32) -> Result<(), WoffError> {
    bail_if!(data.len() < HEAD_TABLE_SIZE, WoffError::HeadTableTooShort);
    write_u32_at(data, HEAD_CHECKSUM_ADJUSTMENT_OFFSET, adjustment)
}
