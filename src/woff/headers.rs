use bytes::{Buf, BufMut};
use font_types::Tag;

use crate::error::{WoffError, bail_if};
use crate::table_tags::WOFF1_SIG;

pub const WOFF_HEADER_SIZE: usize = 44;
pub const WOFF_ENTRY_SIZE: usize = 20;

/// WOFF 1.0 header
///
/// <https://www.w3.org/TR/WOFF/#WOFFHeader>
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WoffHeader {
    /// b"wOFF"
    pub signature: Tag,
    /// The "sfnt version" of the input font.
    pub flavor: Tag,
    /// Total size of the WOFF file.
    pub length: u32,
    /// Number of entries in directory of font tables.
    pub num_tables: u16,
    /// Reserved; set to 0.
    pub reserved: u16,
    /// Total size needed for the uncompressed font data, including the sfnt header, directory,
    /// and font tables (including padding).
    pub total_sfnt_size: u32,
    /// Major version of the WOFF file.
    pub major_version: u16,
    /// Minor version of the WOFF file.
    pub minor_version: u16,
    /// Offset to metadata block, from beginning of WOFF file.
    pub meta_offset: u32,
    /// Length of compressed metadata block.
    pub meta_length: u32,
    /// Uncompressed size of metadata block.
    pub meta_orig_length: u32,
    /// Offset to private data block, from beginning of WOFF file.
    pub priv_offset: u32,
    /// Length of private data block.
    pub priv_length: u32,
}

impl WoffHeader {
    pub fn parse(input: &mut impl Buf) -> Result<Self, WoffError> {
        let input_len = input.remaining();
        bail_if!(input_len < WOFF_HEADER_SIZE, WoffError::HeaderTooShort);

        let signature = Tag::from_u32(input.try_get_u32()?);
        bail_if!(signature != WOFF1_SIG, WoffError::BadSignature(signature));

        let header = Self {
            signature,
            flavor: Tag::from_u32(input.try_get_u32()?),
            length: input.try_get_u32()?,
            num_tables: input.try_get_u16()?,
            reserved: input.try_get_u16()?,
            total_sfnt_size: input.try_get_u32()?,
            major_version: input.try_get_u16()?,
            minor_version: input.try_get_u16()?,
            meta_offset: input.try_get_u32()?,
            meta_length: input.try_get_u32()?,
            meta_orig_length: input.try_get_u32()?,
            priv_offset: input.try_get_u32()?,
            priv_length: input.try_get_u32()?,
        };

        // Validate
        bail_if!(
            header.length as usize != input_len,
            WoffError::LengthMismatch {
                stated: header.length,
                actual: input_len,
            }
        );
        bail_if!(
            header.meta_length != 0 || header.priv_length != 0,
            WoffError::UnsupportedMetadata
        );

        Ok(header)
    }

    pub fn write(&self, out: &mut impl BufMut) {
        out.put_u32(u32::from_be_bytes(self.signature.to_be_bytes()));
        out.put_u32(u32::from_be_bytes(self.flavor.to_be_bytes()));
        out.put_u32(self.length);
        out.put_u16(self.num_tables);
        out.put_u16(self.reserved);
        out.put_u32(self.total_sfnt_size);
        out.put_u16(self.major_version);
        out.put_u16(self.minor_version);
        out.put_u32(self.meta_offset);
        out.put_u32(self.meta_length);
        out.put_u32(self.meta_orig_length);
        out.put_u32(self.priv_offset);
        out.put_u32(self.priv_length);
    }
}

/// <https://www.w3.org/TR/WOFF/#TableDirectory>
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDirectoryEntry {
    /// 4-byte sfnt table identifier.
    pub tag: Tag,
    /// Offset to the data, from beginning of WOFF file.
    pub offset: u32,
    /// Length of the compressed data, excluding padding.
    pub comp_length: u32,
    /// Length of the uncompressed table, excluding padding.
    pub orig_length: u32,
    /// Checksum of the uncompressed table.
    pub orig_checksum: u32,
}

impl TableDirectoryEntry {
    pub fn parse(input: &mut impl Buf) -> Result<Self, WoffError> {
        Ok(Self {
            tag: Tag::from_u32(input.try_get_u32()?),
            offset: input.try_get_u32()?,
            comp_length: input.try_get_u32()?,
            orig_length: input.try_get_u32()?,
            orig_checksum: input.try_get_u32()?,
        })
    }

    pub fn write(&self, out: &mut impl BufMut) {
        out.put_u32(u32::from_be_bytes(self.tag.to_be_bytes()));
        out.put_u32(self.offset);
        out.put_u32(self.comp_length);
        out.put_u32(self.orig_length);
        out.put_u32(self.orig_checksum);
    }

    /// Whether the table is stored zlib-compressed rather than verbatim
    pub fn is_compressed(&self) -> bool {
        self.comp_length < self.orig_length
    }

    /// The table's stored data within the raw WOFF file
    pub fn data_as_slice<'a>(&self, data: &'a [u8]) -> Result<&'a [u8], WoffError> {
        let start = self.offset as usize;
        let end = start
            .checked_add(self.comp_length as usize)
            .ok_or(WoffError::TableDataTruncated(self.tag))?;
        data.get(start..end)
            .ok_or(WoffError::TableDataTruncated(self.tag))
    }
}
