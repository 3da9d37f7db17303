//! Simple glyph outlines (`glyf`)
//!
//! Only the parts of the outline format needed to strip a glyph or to move its first point are
//! decoded. Compound glyphs are never modified beyond replacing them with an empty stub.
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/glyf>

use bytes::{Buf, BufMut};

use crate::buffer::{read_i16_at, read_u8_at, write_i16_at, write_u8_at};
use crate::error::{WoffError, bail_if};

pub const GLYPH_HEADER_SIZE: usize = 10;

// simple glyph flags
const GLYF_ON_CURVE: u8 = 1 << 0;
const GLYF_X_SHORT: u8 = 1 << 1;
const GLYF_Y_SHORT: u8 = 1 << 2;
const GLYF_REPEAT: u8 = 1 << 3;
const GLYF_THIS_X_IS_SAME: u8 = 1 << 4;
const GLYF_THIS_Y_IS_SAME: u8 = 1 << 5;

/// Result of moving a glyph onto a baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignOutcome {
    /// Nothing to do: the glyph is empty or already low enough.
    Unchanged,
    /// The outline and bounding box were shifted.
    Aligned,
    /// The first coordinate cannot hold the shifted value in its current encoding. The glyph was
    /// left untouched.
    NotAdjusted,
}

/// The fixed header every glyph starts with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphHeader {
    /// Negative for compound glyphs
    pub number_of_contours: i16,
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
}

impl GlyphHeader {
    pub fn parse(input: &mut impl Buf) -> Result<Self, WoffError> {
        Ok(Self {
            number_of_contours: input.try_get_i16()?,
            x_min: input.try_get_i16()?,
            y_min: input.try_get_i16()?,
            x_max: input.try_get_i16()?,
            y_max: input.try_get_i16()?,
        })
    }

    pub fn write(&self, out: &mut impl BufMut) {
        out.put_i16(self.number_of_contours);
        out.put_i16(self.x_min);
        out.put_i16(self.y_min);
        out.put_i16(self.x_max);
        out.put_i16(self.y_max);
    }

    pub fn is_compound(&self) -> bool {
        self.number_of_contours < 0
    }
}

/// Storage of a single x or y coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordWidth {
    /// Not stored: same as the previous point
    Same,
    /// One unsigned byte; the sign is a flag bit
    Short { positive: bool },
    /// Signed 16-bit delta
    Long,
}

impl CoordWidth {
    fn from_flag(flag: u8, short_bit: u8, same_or_positive_bit: u8) -> Self {
        let same_or_positive = flag & same_or_positive_bit != 0;
        if flag & short_bit != 0 {
            Self::Short {
                positive: same_or_positive,
            }
        } else if same_or_positive {
            Self::Same
        } else {
            Self::Long
        }
    }

    pub fn size(self) -> usize {
        match self {
            Self::Same => 0,
            Self::Short { .. } => 1,
            Self::Long => 2,
        }
    }
}

/// How one point of a simple glyph is encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointFormat {
    /// Offset of the point's flag byte within the glyph
    pub flag_offset: usize,
    /// Whether the flag byte is repeated for other points
    pub flag_shared: bool,
    pub on_curve: bool,
    pub x: CoordWidth,
    pub y: CoordWidth,
}

/// Byte layout of a simple glyph's points
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineLayout {
    pub points: Vec<PointFormat>,
    /// Offset of the first x coordinate within the glyph
    pub x_start: usize,
    /// Offset of the first y coordinate within the glyph
    pub y_start: usize,
    /// Offset just past the last y coordinate
    pub end: usize,
}

/// Decode the flag run of a simple glyph into one descriptor per point.
pub fn decode_outline(index: u32, glyph: &[u8]) -> Result<OutlineLayout, WoffError> {
    decode_layout(glyph).map_err(|_| WoffError::MalformedGlyph(index))
}

fn decode_layout(glyph: &[u8]) -> Result<OutlineLayout, WoffError> {
    let mut input = glyph;
    let header = GlyphHeader::parse(&mut input)?;
    bail_if!(header.number_of_contours <= 0, WoffError::UnexpectedEof);

    let mut last_point = 0;
    for _ in 0..header.number_of_contours {
        last_point = input.try_get_u16()?;
    }
    let num_points = last_point as usize + 1;

    let instruction_length = input.try_get_u16()? as usize;
    bail_if!(
        input.remaining() < instruction_length,
        WoffError::UnexpectedEof
    );
    input.advance(instruction_length);

    let mut points = Vec::with_capacity(num_points);
    while points.len() < num_points {
        let flag_offset = glyph.len() - input.remaining();
        let flag = input.try_get_u8()?;
        let repeat = if flag & GLYF_REPEAT != 0 {
            input.try_get_u8()? as usize
        } else {
            0
        };
        bail_if!(
            points.len() + repeat + 1 > num_points,
            WoffError::UnexpectedEof
        );

        let point = PointFormat {
            flag_offset,
            flag_shared: repeat > 0,
            on_curve: flag & GLYF_ON_CURVE != 0,
            x: CoordWidth::from_flag(flag, GLYF_X_SHORT, GLYF_THIS_X_IS_SAME),
            y: CoordWidth::from_flag(flag, GLYF_Y_SHORT, GLYF_THIS_Y_IS_SAME),
        };
        points.extend(std::iter::repeat_n(point, repeat + 1));
    }

    let x_start = glyph.len() - input.remaining();
    let y_start = x_start + points.iter().map(|p| p.x.size()).sum::<usize>();
    let end = y_start + points.iter().map(|p| p.y.size()).sum::<usize>();
    bail_if!(end > glyph.len(), WoffError::UnexpectedEof);

    Ok(OutlineLayout {
        points,
        x_start,
        y_start,
        end,
    })
}

/// The header of an outline-less copy of a glyph: zero contours, bounding box kept.
pub fn stripped_header(index: u32, glyph: &[u8]) -> Result<[u8; GLYPH_HEADER_SIZE], WoffError> {
    let mut input = glyph;
    let mut header =
        GlyphHeader::parse(&mut input).map_err(|_| WoffError::MalformedGlyph(index))?;
    header.number_of_contours = 0;

    let mut out = [0u8; GLYPH_HEADER_SIZE];
    header.write(&mut out.as_mut_slice());
    Ok(out)
}

/// Shift a glyph down so that its bounding box minimum becomes `target`.
///
/// Only the first y coordinate is rewritten (all later ones are relative to it), so the glyph
/// keeps its length. Glyphs whose `yMin` is already at or below `target` are left alone.
pub fn align_outline(index: u32, glyph: &mut [u8], target: i16) -> Result<AlignOutcome, WoffError> {
    let mut input = &*glyph;
    let header = GlyphHeader::parse(&mut input).map_err(|_| WoffError::MalformedGlyph(index))?;
    if header.number_of_contours == 0 {
        return Ok(AlignOutcome::Unchanged);
    }
    bail_if!(header.is_compound(), WoffError::CompoundGlyph(index));
    if header.y_min <= target {
        return Ok(AlignOutcome::Unchanged);
    }
    let adjust = target as i32 - header.y_min as i32;

    let layout = decode_outline(index, glyph)?;
    let first = layout.points[0];
    let y_pos = layout.y_start;

    let outcome = match first.y {
        CoordWidth::Short { positive } => {
            let magnitude = read_u8_at(glyph, y_pos)? as i32;
            let value = if positive { magnitude } else { -magnitude };
            let shifted = value + adjust;
            let now_positive = shifted > 0 || (shifted == 0 && positive);
            match u8::try_from(shifted.unsigned_abs()) {
                Ok(_) if now_positive != positive && first.flag_shared => AlignOutcome::NotAdjusted,
                Ok(new_magnitude) => {
                    if now_positive != positive {
                        let flag = read_u8_at(glyph, first.flag_offset)?;
                        write_u8_at(glyph, first.flag_offset, flag ^ GLYF_THIS_Y_IS_SAME)?;
                    }
                    write_u8_at(glyph, y_pos, new_magnitude)?;
                    AlignOutcome::Aligned
                }
                Err(_) => AlignOutcome::NotAdjusted,
            }
        }
        CoordWidth::Long => {
            let value = read_i16_at(glyph, y_pos)? as i32;
            match i16::try_from(value + adjust) {
                Ok(shifted) => {
                    write_i16_at(glyph, y_pos, shifted)?;
                    AlignOutcome::Aligned
                }
                Err(_) => AlignOutcome::NotAdjusted,
            }
        }
        // Would need a byte inserted into the coordinate array
        CoordWidth::Same => AlignOutcome::NotAdjusted,
    };

    if outcome == AlignOutcome::Aligned {
        let shifted = GlyphHeader {
            y_min: target,
            // y_max >= y_min > target, so this cannot go below i16::MIN
            y_max: (header.y_max as i32 + adjust) as i16,
            ..header
        };
        shifted.write(&mut &mut glyph[..GLYPH_HEADER_SIZE]);
    }

    Ok(outcome)
}
