//! Path utilities for MPQ archives
//!
//! MPQ archives use backslashes (`\`) as path separators internally, regardless
//! of the host operating system. Lookups accept either separator since the
//! name hash folds `/` into `\`.
//!
//! # Examples
//!
//! ```no_run
//! use d2_mpq::Archive;
//!
//! let archive = Archive::open("d2data.mpq").unwrap();
//!
//! // Both separators refer to the same entry
//! let data1 = archive.read_file("data/global/excel/armor.txt").unwrap();
//! let data2 = archive.read_file("data\\global\\excel\\armor.txt").unwrap();
//! assert_eq!(data1, data2);
//! ```

/// Normalize a path to the separator stored in MPQ listfiles
///
/// # Examples
///
/// ```
/// use d2_mpq::path::normalize_mpq_path;
///
/// assert_eq!(normalize_mpq_path("data/global/ui.dc6"), "data\\global\\ui.dc6");
/// assert_eq!(normalize_mpq_path("data\\global\\ui.dc6"), "data\\global\\ui.dc6");
/// ```
pub fn normalize_mpq_path(path: &str) -> String {
    path.replace('/', "\\")
}

/// Convert an MPQ path to a system path
///
/// On Unix-like systems backslashes become forward slashes. On Windows the
/// path is returned unchanged.
///
/// # Examples
///
/// ```
/// use d2_mpq::path::mpq_path_to_system;
///
/// #[cfg(unix)]
/// assert_eq!(mpq_path_to_system("data\\local\\font.dc6"), "data/local/font.dc6");
/// ```
pub fn mpq_path_to_system(path: &str) -> String {
    #[cfg(unix)]
    {
        path.replace('\\', "/")
    }

    #[cfg(windows)]
    {
        path.to_string()
    }
}

/// Final component of an MPQ path
///
/// Either separator ends a component. File encryption keys are derived from
/// this part of the name only.
///
/// ```
/// use d2_mpq::path::base_name;
///
/// assert_eq!(base_name("data\\global\\music\\act1.wav"), "act1.wav");
/// assert_eq!(base_name("data/global/music/act1.wav"), "act1.wav");
/// assert_eq!(base_name("act1.wav"), "act1.wav");
/// ```
pub fn base_name(path: &str) -> &str {
    match path.rfind(['\\', '/']) {
        Some(pos) => &path[pos + 1..],
        None => path,
    }
}
