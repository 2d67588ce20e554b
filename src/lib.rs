//! Zone-partitioned star catalog access.
//!
//! Several large astrometric catalogs (the compact Gaia-DR2 form, CMC-14/15,
//! UCAC-2/3/4, URAT1) ship as flat binary files, one file per declination
//! zone, with the records in each file sorted by right ascension. This crate
//! reads them: it locates zone files, narrows the RA range with an optional
//! sparse index, runs a clamped secant search to a tight starting offset, and
//! streams the records of an RA/dec rectangle to a caller-supplied consumer.
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`catalogs`] | Per-catalog record structs, codecs, and layout constants behind the [`CatalogLayout`](catalogs::CatalogLayout) trait |
//! | [`query`] | Zone file location, the sparse RA index, the interval search engine, and the rectangle extractor |
//! | [`bright`] | All-sky brightness grid accumulated from full catalog scans |
//! | [`error`] | [`CatalogError`](error::CatalogError) and the crate [`Result`](error::Result) |
//!
//! # Quick Start
//!
//! ```no_run
//! use zonestar::catalogs::gaia::Gaia;
//! use zonestar::query::{ExtractSession, RectangleQuery};
//!
//! # fn main() -> zonestar::error::Result<()> {
//! let query = RectangleQuery::new(83.633, -5.375, 0.5, 0.5);
//! let mut session = ExtractSession::<Gaia>::open("/data/gaia2")?;
//! let n = session.extract(&query, |zone, offset, star| {
//!     println!("{:03}-{:08}: RA {} mas", zone, offset + 1, star.ra);
//! })?;
//! println!("{} stars", n);
//! # Ok(())
//! # }
//! ```
//!
//! # On-disk layout
//!
//! A zone file is a bare sequence of fixed-size little-endian records (25 to
//! 84 bytes depending on the catalog) with no header; the file length must be
//! a whole multiple of the record size. An optional per-catalog index file
//! (`ZIDX` container) stores RA checkpoints that narrow the search bracket;
//! its absence only costs speed, never results.
//!
//! # Features
//!
//! - **`cli`** (default) — builds the `extract`, `mkindex` and `skymap`
//!   command-line utilities.

pub mod bright;
pub mod catalogs;
pub mod error;
pub mod query;
