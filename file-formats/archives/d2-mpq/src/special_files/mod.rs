//! Reserved files stored inside archives under parenthesized names

mod listfile;

pub use listfile::parse_listfile;

/// Name of the file listing every other file in the archive
pub const LISTFILE: &str = "(listfile)";
