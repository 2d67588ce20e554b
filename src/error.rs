//! Error types for catalog access.
//!
//! A missing zone or index file is *not* an error here: catalogs have sparse
//! declination coverage, so the locator returns `Option` and extraction
//! treats an absent zone as contributing zero stars. The variants below cover
//! the conditions that do abort a call: real I/O failures on files known to
//! exist, structural violations of the fixed formats, and encode calls with
//! field values the packed layouts cannot hold.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Seek or read failure on a file that was successfully opened.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Zone file length is not a whole multiple of the record size.
    #[error("zone file {path:?}: {size} bytes is not a multiple of {record_size}-byte records")]
    MisalignedZone {
        path: PathBuf,
        size: u64,
        record_size: usize,
    },

    /// Index file does not start with the expected magic bytes.
    #[error("index {path:?}: bad magic {found:02x?}, expected {expected:02x?}")]
    BadIndexMagic {
        path: PathBuf,
        found: [u8; 4],
        expected: [u8; 4],
    },

    /// Index file has valid magic but an inconsistent structure
    /// (unsupported version, truncated tables, bad zone range).
    #[error("index {path:?}: {reason}")]
    InvalidIndex { path: PathBuf, reason: String },

    /// A field value passed to `encode` exceeds its coding range.
    #[error("cannot encode {field} = {value}: outside {min}..={max}")]
    FieldOutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
}

impl CatalogError {
    /// Shorthand used by the codecs' range checks.
    pub(crate) fn out_of_range(field: &'static str, value: i64, min: i64, max: i64) -> Self {
        CatalogError::FieldOutOfRange {
            field,
            value,
            min,
            max,
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;

/// Range-checks `value` before a codec packs it into a narrow field.
pub(crate) fn check_range(field: &'static str, value: i64, min: i64, max: i64) -> Result<i64> {
    if value < min || value > max {
        return Err(CatalogError::out_of_range(field, value, min, max));
    }
    Ok(value)
}
