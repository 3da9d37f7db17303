//! Small synthetic fonts for tests
//!
//! The default [`TestFont`] has six glyphs:
//!
//! | index | codepoints    | yMin | notes                          |
//! |-------|---------------|------|--------------------------------|
//! | 0     |               | 0    | `.notdef`, carries instructions |
//! | 1     | U+0041 U+0061 | 0    |                                |
//! | 2     | U+0042        | 0    |                                |
//! | 3     | U+002D        | 250  | floats above the baseline      |
//! | 4     | U+005E        | 400  | floats above the baseline      |
//! | 5     | U+1F600       | -100 | last glyph                     |

use bytes::BufMut;
use font_types::Tag;

use crate::compression::{ZlibCodec, compress_table};
use crate::sfnt_common::{
    CHECKSUM_MAGIC, HEAD_CHECKSUM_ADJUSTMENT_OFFSET, compute_checksum, table_checksum,
};
use crate::table_tags::{CMAP, GLYF, HEAD, LOCA};
use crate::woff::glyf::GlyphHeader;
use crate::woff::headers::{TableDirectoryEntry, WOFF_ENTRY_SIZE, WOFF_HEADER_SIZE, WoffHeader};
use crate::woff::WoffFile;

pub const NAME: Tag = Tag::new(b"name");
pub const TRUETYPE_FLAVOR: Tag = Tag::new(b"\0\x01\0\0");

/// Directory order of the tables in [`TestFont::build`]
pub const TABLE_ORDER: [Tag; 5] = [CMAP, GLYF, HEAD, LOCA, NAME];

const ON_CURVE: u8 = 0x01;
const X_SHORT: u8 = 0x02;
const Y_SHORT: u8 = 0x04;
const REPEAT: u8 = 0x08;
const X_SAME_OR_POSITIVE: u8 = 0x10;
const Y_SAME_OR_POSITIVE: u8 = 0x20;

pub struct TestFont {
    pub glyphs: Vec<Vec<u8>>,
    pub cmap: Vec<u8>,
    pub index_to_loc_format: u16,
    pub head_flags: u16,
    /// Global bounding box minimum. Computed from the glyphs when unset.
    pub y_min: Option<i16>,
    pub with_head: bool,
}

impl Default for TestFont {
    fn default() -> Self {
        Self {
            glyphs: vec![
                simple_glyph_with_instructions(
                    &[&[(50, 0), (50, 700), (450, 700), (450, 0)]],
                    &[0; 128],
                ),
                simple_glyph(&[&[(0, 0), (300, 700), (600, 0)]]),
                simple_glyph(&[&[(0, 0), (0, 700), (400, 350)]]),
                simple_glyph(&[&[(50, 250), (450, 250), (450, 320), (50, 320)]]),
                simple_glyph(&[&[(100, 400), (250, 650), (400, 400)]]),
                simple_glyph(&[&[(0, -100), (500, -100), (250, 600)]]),
            ],
            cmap: CmapBuilder::default()
                .format4(&[
                    Segment::delta(0x2D, 0x2D, 3u16.wrapping_sub(0x2D)),
                    Segment::delta(0x41, 0x42, 0u16.wrapping_sub(0x40)),
                    Segment::delta(0x5E, 0x5E, 4u16.wrapping_sub(0x5E)),
                    Segment::array(0x61, 0x61, 0, &[1]),
                ])
                .format12(&[(0x41, 0x42, 1), (0x1F600, 0x1F600, 5)])
                .build(),
            index_to_loc_format: 0,
            // Baseline at y=0, lsb at x=0, integer ppem
            head_flags: 0x000B,
            y_min: None,
            with_head: true,
        }
    }
}

impl TestFont {
    pub fn without_head(mut self) -> Self {
        self.with_head = false;
        self
    }

    /// Each glyph padded to an even length
    fn padded_glyphs(&self) -> impl Iterator<Item = Vec<u8>> + '_ {
        self.glyphs.iter().map(|glyph| {
            let mut glyph = glyph.clone();
            if glyph.len() % 2 != 0 {
                glyph.push(0);
            }
            glyph
        })
    }

    pub fn glyf(&self) -> Vec<u8> {
        self.padded_glyphs().flatten().collect()
    }

    pub fn loca_offsets(&self) -> Vec<u32> {
        let mut offsets = vec![0];
        let mut offset = 0;
        for glyph in self.padded_glyphs() {
            offset += glyph.len() as u32;
            offsets.push(offset);
        }
        offsets
    }

    pub fn loca(&self) -> Vec<u8> {
        let mut loca = Vec::new();
        for offset in self.loca_offsets() {
            match self.index_to_loc_format {
                0 => loca.put_u16((offset / 2) as u16),
                _ => loca.put_u32(offset),
            }
        }
        loca
    }

    /// `head` with a zero `checkSumAdjustment`
    pub fn head(&self) -> Vec<u8> {
        let y_min = self.y_min.unwrap_or_else(|| {
            self.glyphs
                .iter()
                .filter_map(|glyph| GlyphHeader::parse(&mut glyph.as_slice()).ok())
                .filter(|header| header.number_of_contours != 0)
                .map(|header| header.y_min)
                .min()
                .unwrap_or(0)
        });

        let mut head = Vec::new();
        head.put_u32(0x00010000); // version
        head.put_u32(0x00010000); // fontRevision
        head.put_u32(0); // checkSumAdjustment
        head.put_u32(0x5F0F3CF5); // magicNumber
        head.put_u16(self.head_flags);
        head.put_u16(1000); // unitsPerEm
        head.put_u64(0); // created
        head.put_u64(0); // modified
        head.put_i16(0); // xMin
        head.put_i16(y_min);
        head.put_i16(600); // xMax
        head.put_i16(700); // yMax
        head.put_u16(0); // macStyle
        head.put_u16(8); // lowestRecPPEM
        head.put_i16(2); // fontDirectionHint
        head.put_u16(self.index_to_loc_format);
        head.put_i16(0); // glyphDataFormat
        head
    }

    /// Decompressed tables in directory order, `head` with a correct `checkSumAdjustment`
    pub fn tables(&self) -> Vec<(Tag, Vec<u8>)> {
        let mut tables = vec![(CMAP, self.cmap.clone()), (GLYF, self.glyf())];
        if self.with_head {
            tables.push((HEAD, self.head()));
        }
        tables.push((LOCA, self.loca()));
        tables.push((NAME, noise(40)));

        if self.with_head {
            let sfnt = sfnt_bytes(TRUETYPE_FLAVOR, &tables);
            let adjustment = CHECKSUM_MAGIC.wrapping_sub(compute_checksum(&sfnt));
            let head = &mut tables[2].1;
            head[HEAD_CHECKSUM_ADJUSTMENT_OFFSET..HEAD_CHECKSUM_ADJUSTMENT_OFFSET + 4]
                .copy_from_slice(&adjustment.to_be_bytes());
        }
        tables
    }

    /// A WOFF file laid out exactly as [`WoffFile::to_buf`] lays it out after
    /// [`WoffFile::finalize`].
    pub fn build(&self) -> Vec<u8> {
        let tables = self.tables();
        let stored: Vec<Vec<u8>> = tables
            .iter()
            .map(|(_, data)| compress_table(&ZlibCodec, data))
            .collect();

        let num_tables = tables.len();
        let mut offset = WOFF_HEADER_SIZE + num_tables * WOFF_ENTRY_SIZE;
        let mut entries = Vec::new();
        for ((tag, data), stored) in tables.iter().zip(&stored) {
            entries.push(TableDirectoryEntry {
                tag: *tag,
                offset: offset as u32,
                comp_length: stored.len() as u32,
                orig_length: data.len() as u32,
                orig_checksum: table_checksum(*tag, data),
            });
            offset += padded_len(stored.len());
        }

        let header = WoffHeader {
            signature: Tag::new(b"wOFF"),
            flavor: TRUETYPE_FLAVOR,
            length: offset as u32,
            num_tables: num_tables as u16,
            reserved: 0,
            total_sfnt_size: (12
                + 16 * num_tables
                + tables.iter().map(|(_, data)| padded_len(data.len())).sum::<usize>())
                as u32,
            major_version: 1,
            minor_version: 0,
            meta_offset: 0,
            meta_length: 0,
            meta_orig_length: 0,
            priv_offset: 0,
            priv_length: 0,
        };

        let mut out = Vec::new();
        header.write(&mut out);
        for entry in &entries {
            entry.write(&mut out);
        }
        for data in &stored {
            out.extend_from_slice(data);
            out.resize(padded_len(out.len()), 0);
        }
        assert_eq!(out.len(), offset);
        out
    }
}

fn padded_len(len: usize) -> usize {
    (len + 3) & !3
}

/// The uncompressed SFNT file a parsed WOFF decodes to, with `checkSumAdjustment` zeroed
pub fn build_sfnt(woff: &WoffFile) -> Vec<u8> {
    let tables: Vec<(Tag, Vec<u8>)> = woff
        .tables()
        .iter()
        .map(|entry| {
            let mut data = woff.table_data_for(entry.tag).unwrap();
            if entry.tag == HEAD {
                data[HEAD_CHECKSUM_ADJUSTMENT_OFFSET..HEAD_CHECKSUM_ADJUSTMENT_OFFSET + 4]
                    .fill(0);
            }
            (entry.tag, data)
        })
        .collect();
    sfnt_bytes(woff.header().flavor, &tables)
}

fn sfnt_bytes(flavor: Tag, tables: &[(Tag, Vec<u8>)]) -> Vec<u8> {
    let num_tables = tables.len() as u16;
    let entry_selector = num_tables.ilog2() as u16;
    let search_range = 16u16 << entry_selector;

    let mut out = Vec::new();
    out.put_slice(&flavor.to_be_bytes());
    out.put_u16(num_tables);
    out.put_u16(search_range);
    out.put_u16(entry_selector);
    out.put_u16(num_tables * 16 - search_range);

    let mut offset = 12 + 16 * tables.len();
    for (tag, data) in tables {
        let mut checksum_data = data.clone();
        if *tag == HEAD {
            checksum_data[HEAD_CHECKSUM_ADJUSTMENT_OFFSET..HEAD_CHECKSUM_ADJUSTMENT_OFFSET + 4]
                .fill(0);
        }
        out.put_slice(&tag.to_be_bytes());
        out.put_u32(compute_checksum(&checksum_data));
        out.put_u32(offset as u32);
        out.put_u32(data.len() as u32);
        offset += padded_len(data.len());
    }
    for (_, data) in tables {
        out.extend_from_slice(data);
        out.resize(padded_len(out.len()), 0);
    }
    out
}

/// Deterministic, incompressible bytes
pub fn noise(len: usize) -> Vec<u8> {
    let mut state: u32 = 0x2545_F491;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 24) as u8
        })
        .collect()
}

pub fn simple_glyph(contours: &[&[(i16, i16)]]) -> Vec<u8> {
    simple_glyph_with_instructions(contours, &[])
}

/// Encode a simple glyph with the smallest coordinate encodings and repeated flags folded
pub fn simple_glyph_with_instructions(
    contours: &[&[(i16, i16)]],
    instructions: &[u8],
) -> Vec<u8> {
    let points: Vec<(i16, i16)> = contours.iter().flat_map(|c| c.iter().copied()).collect();
    let header = GlyphHeader {
        number_of_contours: contours.len() as i16,
        x_min: points.iter().map(|p| p.0).min().unwrap_or(0),
        y_min: points.iter().map(|p| p.1).min().unwrap_or(0),
        x_max: points.iter().map(|p| p.0).max().unwrap_or(0),
        y_max: points.iter().map(|p| p.1).max().unwrap_or(0),
    };

    let mut glyph = Vec::new();
    header.write(&mut glyph);
    let mut end_point = 0;
    for contour in contours {
        end_point += contour.len();
        glyph.put_u16(end_point as u16 - 1);
    }
    glyph.put_u16(instructions.len() as u16);
    glyph.put_slice(instructions);

    let mut flags = Vec::new();
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    let encode = |delta: i32, short: u8, same_or_positive: u8, out: &mut Vec<u8>| {
        if delta == 0 {
            same_or_positive
        } else if delta.unsigned_abs() <= 255 {
            out.push(delta.unsigned_abs() as u8);
            short | if delta > 0 { same_or_positive } else { 0 }
        } else {
            out.put_i16(delta as i16);
            0
        }
    };
    let mut previous = (0i32, 0i32);
    for &(x, y) in &points {
        let (x, y) = (x as i32, y as i32);
        let mut flag = ON_CURVE;
        flag |= encode(x - previous.0, X_SHORT, X_SAME_OR_POSITIVE, &mut xs);
        flag |= encode(y - previous.1, Y_SHORT, Y_SAME_OR_POSITIVE, &mut ys);
        flags.push(flag);
        previous = (x, y);
    }

    let mut i = 0;
    while i < flags.len() {
        let run = flags[i..]
            .iter()
            .take(256)
            .take_while(|&&flag| flag == flags[i])
            .count();
        if run > 1 {
            glyph.push(flags[i] | REPEAT);
            glyph.push((run - 1) as u8);
        } else {
            glyph.push(flags[i]);
        }
        i += run;
    }
    glyph.extend_from_slice(&xs);
    glyph.extend_from_slice(&ys);
    glyph
}

/// A format 4 segment
pub struct Segment {
    start: u16,
    end: u16,
    id_delta: u16,
    glyph_ids: Option<Vec<u16>>,
}

impl Segment {
    pub fn delta(start: u16, end: u16, id_delta: u16) -> Self {
        Self {
            start,
            end,
            id_delta,
            glyph_ids: None,
        }
    }

    /// A segment that looks its glyphs up in the glyph id array
    pub fn array(start: u16, end: u16, id_delta: u16, glyph_ids: &[u16]) -> Self {
        Self {
            start,
            end,
            id_delta,
            glyph_ids: Some(glyph_ids.to_vec()),
        }
    }
}

/// Builds a `cmap` table, subtables in the order they were added
#[derive(Default)]
pub struct CmapBuilder {
    subtables: Vec<(u16, u16, Vec<u8>)>,
}

impl CmapBuilder {
    pub fn format0(mut self, glyph_ids: &[u8; 256]) -> Self {
        let mut subtable = Vec::new();
        subtable.put_u16(0);
        subtable.put_u16(6 + 256);
        subtable.put_u16(0); // language
        subtable.put_slice(glyph_ids);
        self.subtables.push((1, 0, subtable));
        self
    }

    /// The terminating 0xFFFF segment is appended automatically
    pub fn format4(mut self, segments: &[Segment]) -> Self {
        let terminator = Segment::delta(0xFFFF, 0xFFFF, 1);
        let segments: Vec<&Segment> = segments.iter().chain([&terminator]).collect();
        let seg_count = segments.len() as u16;
        let entry_selector = seg_count.ilog2() as u16;
        let search_range = 2u16 << entry_selector;

        let mut glyph_id_array = Vec::new();
        let mut id_range_offsets = Vec::new();
        for (i, segment) in segments.iter().enumerate() {
            match &segment.glyph_ids {
                Some(ids) => {
                    // Distance from this idRangeOffset entry to the segment's first glyph id
                    let to_array_start = (segments.len() - i) * 2;
                    id_range_offsets.push((to_array_start + glyph_id_array.len() * 2) as u16);
                    glyph_id_array.extend_from_slice(ids);
                }
                None => id_range_offsets.push(0),
            }
        }

        let mut subtable = Vec::new();
        subtable.put_u16(4);
        subtable.put_u16(16 + 8 * seg_count + 2 * glyph_id_array.len() as u16);
        subtable.put_u16(0); // language
        subtable.put_u16(seg_count * 2);
        subtable.put_u16(search_range);
        subtable.put_u16(entry_selector);
        subtable.put_u16(seg_count * 2 - search_range);
        segments.iter().for_each(|s| subtable.put_u16(s.end));
        subtable.put_u16(0); // reservedPad
        segments.iter().for_each(|s| subtable.put_u16(s.start));
        segments.iter().for_each(|s| subtable.put_u16(s.id_delta));
        id_range_offsets.iter().for_each(|&o| subtable.put_u16(o));
        glyph_id_array.iter().for_each(|&id| subtable.put_u16(id));
        self.subtables.push((3, 1, subtable));
        self
    }

    /// Groups of (startCharCode, endCharCode, startGlyphID)
    pub fn format12(mut self, groups: &[(u32, u32, u32)]) -> Self {
        let mut subtable = Vec::new();
        subtable.put_u16(12);
        subtable.put_u16(0); // reserved
        subtable.put_u32(16 + 12 * groups.len() as u32);
        subtable.put_u32(0); // language
        subtable.put_u32(groups.len() as u32);
        for &(start, end, start_glyph) in groups {
            subtable.put_u32(start);
            subtable.put_u32(end);
            subtable.put_u32(start_glyph);
        }
        self.subtables.push((3, 10, subtable));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut cmap = Vec::new();
        cmap.put_u16(0); // version
        cmap.put_u16(self.subtables.len() as u16);
        let mut offset = 4 + 8 * self.subtables.len();
        for (platform_id, encoding_id, subtable) in &self.subtables {
            cmap.put_u16(*platform_id);
            cmap.put_u16(*encoding_id);
            cmap.put_u32(offset as u32);
            offset += subtable.len();
        }
        for (_, _, subtable) in &self.subtables {
            cmap.extend_from_slice(subtable);
        }
        cmap
    }
}
