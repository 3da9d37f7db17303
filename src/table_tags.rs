//! Font table tags

use font_types::Tag;

pub const WOFF1_SIG: Tag = Tag::new(b"wOFF");

// Tables the editor understands. Every other table is carried through untouched.
pub const CMAP: Tag = Tag::new(b"cmap");
pub const GLYF: Tag = Tag::new(b"glyf");
pub const HEAD: Tag = Tag::new(b"head");
pub const LOCA: Tag = Tag::new(b"loca");
