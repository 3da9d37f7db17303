use font_types::Tag;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WoffError {
    // Container
    #[error("Input is shorter than a WOFF header")]
    HeaderTooShort,
    #[error("Not a WOFF 1.0 file (signature '{0}')")]
    BadSignature(Tag),
    #[error("Header length {stated} does not match input length {actual}")]
    LengthMismatch { stated: u32, actual: usize },
    #[error("Metadata or private data blocks are not supported")]
    UnsupportedMetadata,
    #[error("Font has no tables")]
    EmptyTableDirectory,
    #[error("Table directory is truncated")]
    TableDirectoryTruncated,
    #[error("Table '{0}' is not aligned to 4 bytes")]
    MisalignedTable(Tag),
    #[error("Data for table '{0}' is truncated")]
    TableDataTruncated(Tag),
    #[error("Table '{0}' does not fit the container layout")]
    TableOutsideContainer(Tag),
    #[error("Font has no 'head' table")]
    MissingHeadTable,
    #[error("Table '{0}' not found")]
    TableNotFound(Tag),
    #[error("Cannot decompress table '{0}'")]
    DecompressionFailed(Tag),
    #[error("Checksum for '{0}' has not changed")]
    ChecksumUnchanged(Tag),
    #[error("'head' table is too short")]
    HeadTableTooShort,

    // Character map
    #[error("Character map is truncated")]
    CmapTruncated,
    #[error("Unsupported character map format {0}")]
    UnsupportedCmapFormat(u16),
    #[error("Invalid character map segment {start:04x}-{end:04x}")]
    InvalidCmapSegment { start: u32, end: u32 },
    #[error("Conflicting glyph indices for character {0:04x}")]
    ConflictingMapping(u32),

    // Glyphs
    #[error("Invalid loca index format {0}")]
    BadLocaFormat(u16),
    #[error("loca table has an invalid length {0}")]
    BadLocaLength(usize),
    #[error("Glyph index {0} is out of range")]
    GlyphIndexOutOfRange(u32),
    #[error("Glyph {0} is malformed")]
    MalformedGlyph(u32),
    #[error("Glyph {0} is a compound glyph")]
    CompoundGlyph(u32),

    // Alignment
    #[error("Baseline is not at y=0")]
    NoBaselineAtZero,
    #[error("Given alignment {given} is less than global bounding box minimum y {global}")]
    UserMinBelowGlobalMin { given: i16, global: i16 },

    // Input
    #[error("Invalid codepoint range '{0}'")]
    InvalidRange(String),

    #[error("Unexpected end of data")]
    UnexpectedEof,
}

impl From<bytes::TryGetError> for WoffError {
    fn from(_value: bytes::TryGetError) -> Self {
        Self::UnexpectedEof
    }
}

macro_rules! bail {
    ($err: expr) => {
        return Err($err)
    };
}
pub(crate) use bail;

macro_rules! bail_if {
    ($cond: expr, $err: expr) => {
        if $cond {
            return Err($err);
        }
    };
}
pub(crate) use bail_if;
