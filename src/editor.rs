//! Glyph level edits on a parsed font, and the strip/align pipeline built on them

use std::ops::Range;

use crate::cmap::{CharMap, CodepointRange, codepoints};
use crate::compression::TableCodec;
use crate::error::{WoffError, bail, bail_if};
use crate::table_tags::{CMAP, GLYF, HEAD, LOCA};
use crate::woff::glyf::{
    AlignOutcome, GLYPH_HEADER_SIZE, GlyphHeader, align_outline, stripped_header,
};
use crate::woff::head::HeadTable;
use crate::woff::{Loca, WoffFile};
use crate::{Config, log_verbose};

/// Which characters to strip
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CharSelection {
    /// Strip the mapped characters in these ranges
    Exclude(Vec<CodepointRange>),
    /// Strip every mapped character outside these ranges
    Include(Vec<CodepointRange>),
}

/// Which of the remaining characters to align, and to what
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlignRequest {
    /// An empty list selects every character that is not stripped.
    pub ranges: Vec<CodepointRange>,
    /// Explicit target for the glyphs' minimum y. Inferred from the glyphs when unset.
    pub baseline: Option<i16>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditOptions {
    pub selection: Option<CharSelection>,
    pub align: Option<AlignRequest>,
}

/// A font being edited, along with the tables derived from it.
///
/// `loca` is kept in sync with every change made to `glyf`.
pub struct FontEditor {
    woff: WoffFile,
    char_map: CharMap,
    loca: Loca,
}

impl FontEditor {
    pub fn new(woff: WoffFile) -> Result<Self, WoffError> {
        let char_map = CharMap::parse(&woff.table_data_for(CMAP)?)?;
        log::info!("found {} chars", char_map.len());

        let head_data = woff.table_data_for(HEAD)?;
        let index_to_loc_format = HeadTable::new(&head_data)?.index_to_loc_format()?;
        let loca = Loca::parse(&woff.table_data_for(LOCA)?, index_to_loc_format)?;
        log_verbose!(woff.config(), "found {} glyphs", loca.glyph_count());

        Ok(Self {
            woff,
            char_map,
            loca,
        })
    }

    pub fn char_map(&self) -> &CharMap {
        &self.char_map
    }

    pub fn loca(&self) -> &Loca {
        &self.loca
    }

    pub fn woff(&self) -> &WoffFile {
        &self.woff
    }

    pub fn into_inner(self) -> WoffFile {
        self.woff
    }

    fn glyph_range(&self, index: u32, glyf_len: usize) -> Result<Range<usize>, WoffError> {
        let range = self
            .loca
            .glyph_range(index)
            .ok_or(WoffError::GlyphIndexOutOfRange(index))?;
        bail_if!(
            range.start > range.end || range.end > glyf_len,
            WoffError::MalformedGlyph(index)
        );
        Ok(range)
    }

    /// Replace a glyph's outline with an empty stub that keeps its bounding box, and move the
    /// following glyphs up to close the gap.
    ///
    /// Glyph 0 (`.notdef`) and the last glyph are never stripped.
    pub fn delete_char_index(&mut self, index: u32) -> Result<(), WoffError> {
        let glyph_count = self.loca.glyph_count();
        bail_if!(index >= glyph_count, WoffError::GlyphIndexOutOfRange(index));
        if index == 0 || index == glyph_count - 1 {
            log_verbose!(self.woff.config(), "keeping glyph #{index}");
            return Ok(());
        }

        let mut glyf = self.woff.table_data_for(GLYF)?;
        let range = self.glyph_range(index, glyf.len())?;
        if range.is_empty() {
            return Ok(());
        }
        bail_if!(
            range.len() < GLYPH_HEADER_SIZE,
            WoffError::MalformedGlyph(index)
        );

        let header_end = range.start + GLYPH_HEADER_SIZE;
        let stub = stripped_header(index, &glyf[range.clone()])?;
        let removed = range.end - header_end;
        if glyf[range.start..header_end] == stub
            && glyf[header_end..range.end].iter().all(|&byte| byte == 0)
        {
            log::info!("kept glyph #{index}, is already stripped?");
            return Ok(());
        }

        let mut loca = self.loca.clone();
        loca.shift_after(index, removed as u32)?;

        glyf[range.start..header_end].copy_from_slice(&stub);
        glyf.drain(header_end..range.end);
        let loca_data = loca.to_bytes();
        let stored = if removed > 0 {
            self.woff.set_tables(&[(GLYF, &glyf[..]), (LOCA, &loca_data[..])])
        } else {
            self.woff.set_table(GLYF, &glyf, true)
        };
        match stored {
            Ok(()) => {}
            Err(WoffError::ChecksumUnchanged(_)) => {
                log::info!("kept glyph #{index}, is already stripped?");
                return Ok(());
            }
            Err(err) => bail!(err),
        }
        self.loca = loca;

        log_verbose!(
            self.woff.config(),
            "replaced glyph #{index} with dummy value ({removed} bytes removed)"
        );
        Ok(())
    }

    /// Shift a glyph down so that its minimum y becomes `target`. See [`align_outline`].
    pub fn align_char_index(&mut self, index: u32, target: i16) -> Result<AlignOutcome, WoffError> {
        bail_if!(
            index >= self.loca.glyph_count(),
            WoffError::GlyphIndexOutOfRange(index)
        );

        let mut glyf = self.woff.table_data_for(GLYF)?;
        let range = self.glyph_range(index, glyf.len())?;
        if range.is_empty() {
            return Ok(AlignOutcome::Unchanged);
        }

        let outcome = align_outline(index, &mut glyf[range], target)?;
        if outcome == AlignOutcome::Aligned {
            self.woff.set_table(GLYF, &glyf, true)?;
            log_verbose!(self.woff.config(), "aligned glyph #{index} to {target}");
        }
        Ok(outcome)
    }

    /// The baseline to align the characters in `ranges` to.
    ///
    /// An explicit `baseline` is checked against the font's bounding box. Otherwise it is the
    /// smallest positive `yMin` among the characters' glyphs, but never less than 1 or the
    /// font's overall `yMin`.
    pub fn min_alignment(
        &self,
        ranges: &[CodepointRange],
        baseline: Option<i16>,
    ) -> Result<i16, WoffError> {
        let head_data = self.woff.table_data_for(HEAD)?;
        let head = HeadTable::new(&head_data)?;
        if !head.baseline_at_zero()? {
            log::warn!("baseline is not at y=0");
            bail!(WoffError::NoBaselineAtZero);
        }
        let global = head.y_min()?;
        log::info!("global bounding box minimum y is {global} (baseline 0)");

        if let Some(given) = baseline {
            bail_if!(
                given < global,
                WoffError::UserMinBelowGlobalMin { given, global }
            );
            return Ok(given);
        }

        let glyf = self.woff.table_data_for(GLYF)?;
        let smallest = codepoints(ranges)
            .filter_map(|codepoint| self.char_map.get(codepoint))
            .filter_map(|index| {
                let glyph = glyf.get(self.loca.glyph_range(index)?)?;
                // Empty and unreadable glyphs don't take part
                GlyphHeader::parse(&mut &glyph[..]).ok()
            })
            .map(|header| header.y_min)
            .filter(|&y_min| y_min > 0)
            .min()
            .unwrap_or(1);

        Ok(smallest.max(global).max(1))
    }

    /// See [`WoffFile::finalize`]
    pub fn finalize(&mut self) -> Result<(), WoffError> {
        self.woff.finalize()
    }

    pub fn to_buf(&self) -> Result<Vec<u8>, WoffError> {
        self.woff.to_buf()
    }

    /// Split the font's characters into the set to strip and the set to align.
    pub fn plan(&self, options: &EditOptions) -> (Vec<CodepointRange>, Vec<CodepointRange>) {
        let mut remainder = Vec::new();
        let strip = match &options.selection {
            Some(CharSelection::Exclude(ranges)) => {
                let mut strip = ranges.clone();
                self.char_map.intersect(&mut strip, &mut remainder);
                strip
            }
            Some(CharSelection::Include(ranges)) => {
                let mut strip = ranges.clone();
                self.char_map.subtract(&mut strip, &mut remainder);
                strip
            }
            None => {
                let mut strip = Vec::new();
                self.char_map.intersect(&mut strip, &mut remainder);
                strip
            }
        };

        let align = match &options.align {
            None => Vec::new(),
            Some(request) if request.ranges.is_empty() => remainder,
            Some(request) => {
                let mut align = request.ranges.clone();
                CharMap::static_intersect(&remainder, &mut align);
                align
            }
        };

        (strip, align)
    }
}

/// Strip and align characters of a WOFF file.
///
/// Returns the edited file, or `None` if the options select nothing to do.
#[cfg(feature = "z")]
pub fn edit_woff(
    raw_woff_data: &[u8],
    options: &EditOptions,
    config: Config,
) -> Result<Option<Vec<u8>>, WoffError> {
    edit_woff_with_codec(raw_woff_data, options, config, Box::new(crate::ZlibCodec))
}

/// [`edit_woff`] with a custom codec for table data
pub fn edit_woff_with_codec(
    raw_woff_data: &[u8],
    options: &EditOptions,
    config: Config,
    codec: Box<dyn TableCodec>,
) -> Result<Option<Vec<u8>>, WoffError> {
    let woff = WoffFile::parse_with_codec(raw_woff_data, config, codec)?;
    let mut editor = FontEditor::new(woff)?;
    let (strip, align) = editor.plan(options);

    if strip.is_empty() {
        log::info!("not removing any char glyphs");
    } else {
        log::info!("removing {} char glyphs", strip.len());
        for codepoint in codepoints(&strip) {
            let Some(index) = editor.char_map().get(codepoint) else {
                continue;
            };
            log_verbose!(config, "char {codepoint:04x} @ {index}");
            editor.delete_char_index(index)?;
        }
    }

    if align.is_empty() {
        log::info!("not aligning any char glyphs");
    } else {
        let baseline = options.align.as_ref().and_then(|request| request.baseline);
        let target = editor.min_alignment(&align, baseline)?;
        log::info!("aligning {} char glyphs to {target}", align.len());
        for codepoint in codepoints(&align) {
            let Some(index) = editor.char_map().get(codepoint) else {
                continue;
            };
            log_verbose!(config, "char {codepoint:04x} @ {index}");
            if editor.align_char_index(index, target)? == AlignOutcome::NotAdjusted {
                log::warn!(
                    "could not adjust coordinates of char {codepoint:04x}, going on anyways"
                );
            }
        }
    }

    if strip.is_empty() && align.is_empty() {
        log::info!("nothing to do");
        return Ok(None);
    }

    editor.finalize()?;
    editor.to_buf().map(Some)
}
