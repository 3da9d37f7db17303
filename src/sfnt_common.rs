//! Checksums and records shared with the uncompressed (SFNT) form of a font
//!
//! A WOFF file never contains an SFNT header or table directory, but the font-wide
//! `checkSumAdjustment` stored in `head` is defined over the SFNT file the WOFF decodes to. The
//! records here are reconstructed purely so they can be summed.

use arrayvec::ArrayVec;
use font_types::Tag;

use crate::{Round4, table_tags::HEAD};

pub const SFNT_HEADER_SIZE: usize = 12;
pub const SFNT_ENTRY_SIZE: usize = 16;

/// The value the whole-font checksum must add up to.
///
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/otff#calculating-checksums>
pub const CHECKSUM_MAGIC: u32 = 0xB1B0AFBA;

/// Byte offset of `checkSumAdjustment` within the `head` table
pub const HEAD_CHECKSUM_ADJUSTMENT_OFFSET: usize = 8;

/// Compute the big-endian u32 word sum of `buf`
pub fn compute_checksum(buf: &[u8]) -> u32 {
    compute_checksum_from(0, buf)
}

/// Continue a running word sum with the contents of `buf`
pub fn compute_checksum_from(initial: u32, buf: &[u8]) -> u32 {
    let mut checksum = initial;
    let mut iter = buf.chunks_exact(4);
    for chunk in &mut iter {
        checksum = checksum.wrapping_add(u32::from_be_bytes([
            chunk[0], chunk[1], chunk[2], chunk[3],
        ]));
    }

    // Treat size not aligned on 4 as if it were padded to 4 with 0's.
    let remainder = iter.remainder();
    if !remainder.is_empty() {
        let mut last = [0u8; 4];
        last[..remainder.len()].copy_from_slice(remainder);
        checksum = checksum.wrapping_add(u32::from_be_bytes(last));
    }

    checksum
}

/// Checksum of a table as recorded in its directory entry.
///
/// The `head` table embeds the font-wide `checkSumAdjustment`, which is treated as zero while
/// summing the table itself.
pub fn table_checksum(tag: Tag, data: &[u8]) -> u32 {
    let checksum = compute_checksum(data);
    if tag == HEAD && data.len() >= HEAD_CHECKSUM_ADJUSTMENT_OFFSET + 4 {
        let adjustment =
            &data[HEAD_CHECKSUM_ADJUSTMENT_OFFSET..HEAD_CHECKSUM_ADJUSTMENT_OFFSET + 4];
        checksum.wrapping_sub(compute_checksum(adjustment))
    } else {
        checksum
    }
}

/// The OpenType table directory header for a font with `num_tables` tables
///
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/otff#table-directory>
pub fn sfnt_header_record(flavor: Tag, num_tables: u16) -> ArrayVec<u8, SFNT_HEADER_SIZE> {
    let mut max_pow2: u16 = 0;
    while 1u32 << (max_pow2 + 1) <= (num_tables as u32) {
        max_pow2 += 1;
    }
    let entry_selector = max_pow2;
    let search_range: u16 = (1u16 << max_pow2) << 4;
    let range_shift = ((num_tables as u32) << 4).saturating_sub(search_range as u32) as u16;

    let mut record = ArrayVec::new();
    record.extend(flavor.to_be_bytes()); // sfnt version
    record.extend(num_tables.to_be_bytes());
    record.extend(search_range.to_be_bytes());
    record.extend(entry_selector.to_be_bytes());
    record.extend(range_shift.to_be_bytes());
    record
}

/// A single OpenType table record
pub fn sfnt_entry_record(
    tag: Tag,
    checksum: u32,
    offset: u32,
    length: u32,
) -> ArrayVec<u8, SFNT_ENTRY_SIZE> {
    let mut record = ArrayVec::new();
    record.extend(tag.to_be_bytes());
    record.extend(checksum.to_be_bytes());
    record.extend(offset.to_be_bytes());
    record.extend(length.to_be_bytes());
    record
}

/// Offset of the first table in an SFNT file with `num_tables` tables
pub fn sfnt_first_table_offset(num_tables: usize) -> usize {
    Round4!(SFNT_HEADER_SIZE) + Round4!(num_tables * SFNT_ENTRY_SIZE)
}
