//! Glyph locations (`loca`)
//!
//! See <https://learn.microsoft.com/en-us/typography/opentype/spec/loca>

use std::ops::Range;

use bytes::{Buf, BufMut};

use crate::error::{WoffError, bail_if};

/// Offset width, from `head.indexToLocFormat`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexFormat {
    /// u16 offsets, stored divided by 2
    Short,
    /// u32 offsets
    Long,
}

impl IndexFormat {
    pub fn from_head(index_to_loc_format: u16) -> Result<Self, WoffError> {
        match index_to_loc_format {
            0 => Ok(Self::Short),
            1 => Ok(Self::Long),
            other => Err(WoffError::BadLocaFormat(other)),
        }
    }

    pub fn entry_size(self) -> usize {
        match self {
            Self::Short => 2,
            Self::Long => 4,
        }
    }
}

/// Decoded `loca` table.
///
/// Holds the raw offsets in bytes. N+1 offsets describe N glyphs; the last offset only marks the
/// end of the final glyph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loca {
    format: IndexFormat,
    offsets: Vec<u32>,
}

impl Loca {
    pub fn parse(data: &[u8], index_to_loc_format: u16) -> Result<Self, WoffError> {
        let format = IndexFormat::from_head(index_to_loc_format)?;
        let entry_size = format.entry_size();
        bail_if!(
            data.len() % entry_size != 0 || data.len() / entry_size < 2,
            WoffError::BadLocaLength(data.len())
        );

        let mut input = data;
        let mut offsets = Vec::with_capacity(data.len() / entry_size);
        while input.has_remaining() {
            let offset = match format {
                IndexFormat::Short => input.try_get_u16()? as u32 * 2,
                IndexFormat::Long => input.try_get_u32()?,
            };
            offsets.push(offset);
        }

        Ok(Self { format, offsets })
    }

    pub fn format(&self) -> IndexFormat {
        self.format
    }

    /// Number of glyphs, not counting the end marker
    pub fn glyph_count(&self) -> u32 {
        (self.offsets.len() - 1) as u32
    }

    pub fn offsets(&self) -> &[u32] {
        &self.offsets
    }

    /// Byte range of a glyph within `glyf`. Backwards ranges are returned as is so that callers
    /// can report them as malformed.
    pub fn glyph_range(&self, index: u32) -> Option<Range<usize>> {
        let index = index as usize;
        let start = *self.offsets.get(index)? as usize;
        let end = *self.offsets.get(index + 1)? as usize;
        Some(start..end)
    }

    /// Move every glyph after `index` (and the end marker) `delta` bytes towards the start.
    ///
    /// The short format can only represent even offsets, so an odd `delta` is rejected there.
    /// Nothing is modified on error.
    pub fn shift_after(&mut self, index: u32, delta: u32) -> Result<(), WoffError> {
        bail_if!(
            self.format == IndexFormat::Short && delta % 2 != 0,
            WoffError::MalformedGlyph(index)
        );
        let len = self.offsets.len();
        let following = &mut self.offsets[(index as usize + 1).min(len)..];
        bail_if!(
            following.iter().any(|&offset| offset < delta),
            WoffError::MalformedGlyph(index)
        );
        for offset in following {
            *offset -= delta;
        }
        Ok(())
    }

    /// Encode in the table's original format
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.offsets.len() * self.format.entry_size());
        for &offset in &self.offsets {
            match self.format {
                IndexFormat::Short => out.put_u16((offset >> 1) as u16),
                IndexFormat::Long => out.put_u32(offset),
            }
        }
        out
    }
}
