//! File location for zone data and index files.
//!
//! Catalog distributions end up on disk in a few different shapes: all zone
//! files dumped into the working directory, the DVD directory structure
//! copied under some base path, or the files placed in the base path
//! directly. The locator tries those in order and reports absence with
//! `None` — a missing zone file means the catalog has no coverage there,
//! which is routine (CMC stops at dec +50°, URAT1 at dec −15°).

use std::fs::File;
use std::path::{Path, PathBuf};

use crate::catalogs::CatalogLayout;

/// Probes for `name` in the working directory, then `base/<subdir>/name`,
/// then `base/name`. Returns the first candidate that opens, with the path
/// it opened under (for error reporting).
pub fn locate_file(base: &Path, subdir: Option<&str>, name: &str) -> Option<(PathBuf, File)> {
    let mut candidates: Vec<PathBuf> = vec![PathBuf::from(name)];
    if let Some(sub) = subdir {
        candidates.push(base.join(sub).join(name));
    }
    candidates.push(base.join(name));

    for path in candidates {
        if let Ok(file) = File::open(&path) {
            return Some((path, file));
        }
    }
    None
}

/// Locates one zone's data file for catalog `C`.
pub fn locate_zone<C: CatalogLayout>(base: &Path, zone: i32) -> Option<(PathBuf, File)> {
    locate_file(base, C::DATA_SUBDIR, &C::zone_file_name(zone))
}

/// Locates catalog `C`'s sparse index file.
pub fn locate_index<C: CatalogLayout>(base: &Path) -> Option<(PathBuf, File)> {
    locate_file(base, C::DATA_SUBDIR, C::INDEX_FILE)
}
