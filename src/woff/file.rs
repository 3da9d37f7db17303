//! The WOFF container: header, table directory and the stored (possibly compressed) table data

use font_types::Tag;

use crate::compression::{TableCodec, compress_table, decompress_table};
use crate::error::{WoffError, bail, bail_if};
use crate::sfnt_common::{
    CHECKSUM_MAGIC, compute_checksum, compute_checksum_from, sfnt_entry_record,
    sfnt_first_table_offset, sfnt_header_record, table_checksum,
};
use crate::table_tags::HEAD;
use crate::woff::head::{HeadTable, set_checksum_adjustment};
use crate::woff::headers::{TableDirectoryEntry, WOFF_ENTRY_SIZE, WOFF_HEADER_SIZE, WoffHeader};
use crate::{Config, Round4, log_verbose};

/// A parsed WOFF 1.0 file.
///
/// Tables are kept in their stored form and only decompressed on request. Replacing a table
/// recompresses it and updates its directory entry, but leaves the layout (table offsets and the
/// total length) stale until [`WoffFile::finalize`] is called.
pub struct WoffFile {
    config: Config,
    codec: Box<dyn TableCodec>,
    header: WoffHeader,
    /// Directory entries in file order
    tables: Vec<TableDirectoryEntry>,
    /// Stored data for each entry in `tables`, at the same index
    table_data: Vec<Vec<u8>>,
}

/// A checked and recompressed replacement for one table, not yet stored
struct StagedTable {
    index: usize,
    checksum: u32,
    orig_length: u32,
    stored: Vec<u8>,
}

impl WoffFile {
    /// Parse a complete WOFF file using the built-in zlib codec
    #[cfg(feature = "z")]
    pub fn parse(raw_woff_data: &[u8], config: Config) -> Result<Self, WoffError> {
        Self::parse_with_codec(raw_woff_data, config, Box::new(crate::ZlibCodec))
    }

    /// Parse a complete WOFF file using a custom codec for table data
    pub fn parse_with_codec(
        raw_woff_data: &[u8],
        config: Config,
        codec: Box<dyn TableCodec>,
    ) -> Result<Self, WoffError> {
        let mut woff = Self::parse_header(raw_woff_data, config, codec)?;
        woff.parse_tables(raw_woff_data)?;
        Ok(woff)
    }

    /// Parse and validate the header only. The result has no tables until
    /// [`WoffFile::parse_tables`] is called with the same data.
    pub fn parse_header(
        raw_woff_data: &[u8],
        config: Config,
        codec: Box<dyn TableCodec>,
    ) -> Result<Self, WoffError> {
        let mut input = raw_woff_data;
        let header = WoffHeader::parse(&mut input)?;
        Ok(Self {
            config,
            codec,
            header,
            tables: Vec::new(),
            table_data: Vec::new(),
        })
    }

    /// Read the table directory and copy out each table's stored data.
    pub fn parse_tables(&mut self, raw_woff_data: &[u8]) -> Result<(), WoffError> {
        let num_tables = self.header.num_tables as usize;
        bail_if!(num_tables == 0, WoffError::EmptyTableDirectory);

        let directory_end = WOFF_HEADER_SIZE + num_tables * WOFF_ENTRY_SIZE;
        bail_if!(
            directory_end > raw_woff_data.len(),
            WoffError::TableDirectoryTruncated
        );

        let mut input = &raw_woff_data[WOFF_HEADER_SIZE..directory_end];
        let mut tables = Vec::with_capacity(num_tables);
        let mut table_data = Vec::with_capacity(num_tables);
        for _ in 0..num_tables {
            let table = TableDirectoryEntry::parse(&mut input)?;
            bail_if!(table.offset % 4 != 0, WoffError::MisalignedTable(table.tag));
            table_data.push(table.data_as_slice(raw_woff_data)?.to_vec());
            tables.push(table);
        }
        self.tables = tables;
        self.table_data = table_data;
        log_verbose!(self.config, "parsed {num_tables} tables");

        let head_data = match self.table_data_for(HEAD) {
            Ok(data) => data,
            Err(WoffError::TableNotFound(_)) => bail!(WoffError::MissingHeadTable),
            Err(err) => bail!(err),
        };
        let head = HeadTable::new(&head_data)?;
        if head.checksum_adjustment()? != self.sfnt_checksum() {
            log::warn!("overall checksum mismatch, ignoring");
        }

        Ok(())
    }

    pub fn config(&self) -> Config {
        self.config
    }

    pub fn header(&self) -> &WoffHeader {
        &self.header
    }

    pub fn tables(&self) -> &[TableDirectoryEntry] {
        &self.tables
    }

    pub fn table_index(&self, tag: Tag) -> Option<usize> {
        self.tables.iter().position(|table| table.tag == tag)
    }

    /// The directory entry and decompressed data for a table.
    ///
    /// A checksum that doesn't match the data is reported but not treated as an error.
    pub fn table(&self, tag: Tag) -> Result<(&TableDirectoryEntry, Vec<u8>), WoffError> {
        let index = self.table_index(tag).ok_or(WoffError::TableNotFound(tag))?;
        let table = &self.tables[index];
        let data = decompress_table(
            self.codec.as_ref(),
            &self.table_data[index],
            table.orig_length as usize,
        )
        .ok_or(WoffError::DecompressionFailed(tag))?;

        if table_checksum(tag, &data) != table.orig_checksum {
            log::warn!("table '{tag}' checksum mismatch");
        }

        Ok((table, data))
    }

    /// The decompressed data for a table
    pub fn table_data_for(&self, tag: Tag) -> Result<Vec<u8>, WoffError> {
        self.table(tag).map(|(_, data)| data)
    }

    /// Replace a table's data.
    ///
    /// With `update_checksum` the directory checksum is recomputed, and a write that would leave
    /// it unchanged is rejected as redundant. The new data is stored compressed when that makes
    /// it strictly smaller. Nothing is modified if an error is returned.
    pub fn set_table(
        &mut self,
        tag: Tag,
        data: &[u8],
        update_checksum: bool,
    ) -> Result<(), WoffError> {
        let staged = self.stage_table(tag, data, update_checksum)?;
        self.commit_table(staged);
        Ok(())
    }

    /// Replace several tables at once, updating their checksums.
    ///
    /// Every table is checked and recompressed before any is stored, so either all of them are
    /// replaced or none is.
    pub fn set_tables(&mut self, updates: &[(Tag, &[u8])]) -> Result<(), WoffError> {
        let staged = updates
            .iter()
            .map(|&(tag, data)| self.stage_table(tag, data, true))
            .collect::<Result<Vec<_>, _>>()?;
        for table in staged {
            self.commit_table(table);
        }
        Ok(())
    }

    fn stage_table(
        &self,
        tag: Tag,
        data: &[u8],
        update_checksum: bool,
    ) -> Result<StagedTable, WoffError> {
        let index = self.table_index(tag).ok_or(WoffError::TableNotFound(tag))?;
        let orig_length =
            u32::try_from(data.len()).map_err(|_| WoffError::TableOutsideContainer(tag))?;

        let checksum = if update_checksum {
            let checksum = table_checksum(tag, data);
            bail_if!(
                checksum == self.tables[index].orig_checksum,
                WoffError::ChecksumUnchanged(tag)
            );
            checksum
        } else {
            self.tables[index].orig_checksum
        };

        Ok(StagedTable {
            index,
            checksum,
            orig_length,
            stored: compress_table(self.codec.as_ref(), data),
        })
    }

    fn commit_table(&mut self, staged: StagedTable) {
        let table = &mut self.tables[staged.index];
        let tag = table.tag;
        if table.orig_checksum != staged.checksum {
            log_verbose!(
                self.config,
                "updated checksum for '{tag}': {:08x}",
                staged.checksum
            );
        }
        table.orig_checksum = staged.checksum;
        table.orig_length = staged.orig_length;
        // Never larger than orig_length, which already fits in a u32
        table.comp_length = staged.stored.len() as u32;
        self.table_data[staged.index] = staged.stored;
        log_verbose!(self.config, "updated data for '{tag}'");
    }

    /// Lay the tables out back to back after the header and directory, each padded to 4 bytes,
    /// and update the header's `length` and `totalSfntSize` to match.
    pub fn update_offsets(&mut self) {
        let num_tables = self.tables.len();
        let mut sfnt_size: usize = sfnt_first_table_offset(num_tables);
        let mut offset: usize =
            Round4!(WOFF_HEADER_SIZE) + Round4!(num_tables * WOFF_ENTRY_SIZE);
        for table in self.tables.iter_mut() {
            table.offset = offset as u32;
            sfnt_size += Round4!(table.orig_length as usize);
            offset += Round4!(table.comp_length as usize);
        }
        self.header.num_tables = num_tables as u16;
        self.header.length = offset as u32;
        self.header.total_sfnt_size = sfnt_size as u32;
    }

    /// The `checkSumAdjustment` value for the SFNT font this file decodes to.
    ///
    /// The SFNT header and directory are reconstructed (tables in directory order, each padded to
    /// 4 bytes) and summed together with every table's checksum.
    pub fn sfnt_checksum(&self) -> u32 {
        let num_tables = self.tables.len();
        let header = sfnt_header_record(self.header.flavor, num_tables as u16);
        let mut checksum = compute_checksum(&header);

        let mut offset = sfnt_first_table_offset(num_tables) as u32;
        for table in &self.tables {
            let entry =
                sfnt_entry_record(table.tag, table.orig_checksum, offset, table.orig_length);
            checksum = compute_checksum_from(checksum, &entry);
            checksum = checksum.wrapping_add(table.orig_checksum);
            offset = offset.wrapping_add(Round4!(table.orig_length));
        }

        CHECKSUM_MAGIC.wrapping_sub(checksum)
    }

    /// Store the current [`WoffFile::sfnt_checksum`] in the `head` table.
    pub fn update_sfnt_checksum(&mut self) -> Result<(), WoffError> {
        let mut head_data = self.table_data_for(HEAD)?;
        let adjustment = self.sfnt_checksum();
        set_checksum_adjustment(&mut head_data, adjustment)?;
        // The head checksum excludes checkSumAdjustment, so it doesn't change here
        self.set_table(HEAD, &head_data, false)?;
        log_verbose!(self.config, "updated full header checksum: {adjustment:08x}");
        Ok(())
    }

    /// Bring offsets, lengths and the font-wide checksum up to date after editing.
    pub fn finalize(&mut self) -> Result<(), WoffError> {
        self.update_offsets();
        self.update_sfnt_checksum()?;
        // Recompressing 'head' may have changed its stored length
        self.update_offsets();
        Ok(())
    }

    /// Serialize the header, directory and table data at their recorded offsets.
    pub fn to_buf(&self) -> Result<Vec<u8>, WoffError> {
        let length = self.header.length as usize;
        let directory_end = WOFF_HEADER_SIZE + self.tables.len() * WOFF_ENTRY_SIZE;
        bail_if!(directory_end > length, WoffError::TableDirectoryTruncated);

        let mut out = vec![0u8; length];
        {
            let mut writer = &mut out[..directory_end];
            self.header.write(&mut writer);
            for table in &self.tables {
                table.write(&mut writer);
            }
        }

        for (table, data) in self.tables.iter().zip(&self.table_data) {
            bail_if!(table.offset % 4 != 0, WoffError::MisalignedTable(table.tag));
            let start = table.offset as usize;
            let end = start + data.len();
            bail_if!(
                start < directory_end || end > length,
                WoffError::TableOutsideContainer(table.tag)
            );
            out[start..end].copy_from_slice(data);
        }

        Ok(out)
    }
}
