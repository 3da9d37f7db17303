pub mod file;
pub mod glyf;
pub mod head;
pub mod headers;
pub mod loca;

pub use file::WoffFile;
pub use glyf::AlignOutcome;
pub use headers::{TableDirectoryEntry, WoffHeader};
pub use loca::{IndexFormat, Loca};
