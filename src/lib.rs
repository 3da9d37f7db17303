//! In-place editing of WOFF 1.0 fonts
//!
//! Strips the outlines of selected characters and lowers selected glyphs onto a common baseline,
//! then re-emits a WOFF file whose offsets, lengths and checksums are all consistent again.
//!
//! Only the `head`, `cmap`, `loca` and `glyf` tables are interpreted. Every other table is
//! carried through byte for byte.

pub mod buffer;
pub mod cmap;
pub mod compression;
pub mod editor;
pub mod error;
pub mod parsing_util;
pub mod sfnt_common;
pub mod table_tags;
pub mod woff;

#[cfg(test)]
mod test_data;

pub use cmap::{CharMap, CodepointRange};
#[cfg(feature = "z")]
pub use compression::ZlibCodec;
pub use compression::TableCodec;
#[cfg(feature = "z")]
pub use editor::edit_woff;
pub use editor::{AlignRequest, CharSelection, EditOptions, FontEditor, edit_woff_with_codec};
pub use error::WoffError;
pub use parsing_util::parse_range_list;
pub use woff::{AlignOutcome, WoffFile};

/// Options that affect how much the editor reports, threaded through every entry point.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Report per-table and per-glyph progress at `info` level rather than `debug`.
    pub verbose: bool,
}

// Log at info level if the config asks for verbose output, at debug level otherwise.
macro_rules! log_verbose {
    ($config: expr, $($arg:tt)+) => {
        if $config.verbose {
            log::info!($($arg)+);
        } else {
            log::debug!($($arg)+);
        }
    };
}
use log_verbose;

// Round a value up to the nearest multiple of 4. Don't round the value in the
// case that rounding up overflows.
//
// Implemented as a macro to make it generic over the type without horrible type bounds
macro_rules! Round4 {
    ($value:expr) => {
        match $value.checked_add(3) {
            Some(value_plus_3) => value_plus_3 & !3,
            None => $value,
        }
    };
}
use Round4;
