//! Rectangle extraction: the public entry point.
//!
//! An [`ExtractSession`] owns the catalog base path, the sparse index (if
//! one was found), a record filter, and the search statistics accumulated
//! over its lifetime — sessions are meant to be reused, since workloads
//! like astrometry matching fire thousands of small rectangles at the same
//! catalog.
//!
//! Extraction walks the zones spanning the declination band. Per zone:
//! locate the file (skip silently when the catalog has no coverage there),
//! get a bracket from the index or fall back to the whole zone, refine it
//! with the secant search, then scan forward handing matching records to
//! the consumer. The RA-sortedness of the zone lets the scan stop at the
//! first record past the eastern edge.
//!
//! A rectangle spilling over RA 0°/360° is handled by re-running the whole
//! extraction with the center shifted ±360° and summing the counts. The
//! shifted center lies outside [0°, 360°), which is also what stops the
//! recursion. Matches are not deduplicated between the passes; a rectangle
//! wider than the full circle would count seam stars twice.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use super::index::ZoneIndex;
use super::locate::{locate_index, locate_zone};
use super::reader::ZoneReader;
use super::search::{refine, Bracket, ACCEPTABLE_LIMIT};
use crate::catalogs::{CatalogLayout, MAS_PER_DEG};
use crate::error::Result;

/// An immutable RA/dec rectangle, degrees. Construction normalizes the RA
/// center into [0°, 360°).
#[derive(Debug, Clone, Copy)]
pub struct RectangleQuery {
    pub ra_deg: f64,
    pub dec_deg: f64,
    pub width_deg: f64,
    pub height_deg: f64,
}

impl RectangleQuery {
    pub fn new(ra_deg: f64, dec_deg: f64, width_deg: f64, height_deg: f64) -> Self {
        Self {
            ra_deg: ra_deg.rem_euclid(360.0),
            dec_deg,
            width_deg,
            height_deg,
        }
    }
}

/// Record filter applied during extraction. The default drops doubtful
/// records (no cross-match id) and keeps Tycho-matched stars.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractFilter {
    /// Drop stars matched against Tycho (callers merging catalogs use this
    /// to avoid duplicates).
    pub omit_tycho: bool,
    /// Keep records lacking the 2MASS cross-match.
    pub include_doubtfuls: bool,
}

impl ExtractFilter {
    fn accepts<C: CatalogLayout>(&self, star: &C::Star) -> bool {
        if self.omit_tycho && C::tycho_matched(star) {
            return false;
        }
        if !self.include_doubtfuls && C::doubtful(star) {
            return false;
        }
        true
    }
}

/// Search effort accounting, accumulated across every extraction a session
/// runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchStats {
    /// Time spent in index lookups and secant refinement.
    pub time_searching: Duration,
    /// Zone files opened and scanned.
    pub zones_scanned: u32,
    /// Records handed to consumers.
    pub records_matched: u64,
}

/// A reusable extraction context for one catalog under one base path.
#[derive(Debug)]
pub struct ExtractSession<C: CatalogLayout> {
    base: PathBuf,
    index: Option<ZoneIndex>,
    pub filter: ExtractFilter,
    pub stats: SearchStats,
    _catalog: std::marker::PhantomData<C>,
}

impl<C: CatalogLayout> ExtractSession<C> {
    /// Opens a session, loading the catalog's sparse index if present.
    ///
    /// A missing index file is fine (searches start from whole-zone
    /// brackets); an index that exists but fails validation is an error,
    /// so a corrupt index cannot silently degrade every query.
    pub fn open(base: impl AsRef<Path>) -> Result<Self> {
        let base = base.as_ref().to_path_buf();
        let index = match locate_index::<C>(&base) {
            Some((path, file)) => {
                let index = ZoneIndex::open(path, &file)?;
                Some(index)
            }
            None => {
                log::debug!("{}: no {} found, searching whole zones", C::NAME, C::INDEX_FILE);
                None
            }
        };
        Ok(Self {
            base,
            index,
            filter: ExtractFilter::default(),
            stats: SearchStats::default(),
            _catalog: std::marker::PhantomData,
        })
    }

    /// True when a sparse index was found and loaded.
    pub fn has_index(&self) -> bool {
        self.index.is_some()
    }

    /// Streams every record inside `query` to `consumer` as
    /// `(zone, offset, record)`, in zone order and file order within each
    /// zone. Returns the match count.
    pub fn extract<F>(&mut self, query: &RectangleQuery, mut consumer: F) -> Result<u64>
    where
        F: FnMut(i32, u32, &C::Star),
    {
        let matched = self.run(query.ra_deg, query, &mut consumer)?;
        self.stats.records_matched += matched;
        Ok(matched)
    }

    fn run<F>(&mut self, ra_deg: f64, query: &RectangleQuery, consumer: &mut F) -> Result<u64>
    where
        F: FnMut(i32, u32, &C::Star),
    {
        let dec1 = query.dec_deg - query.height_deg / 2.0;
        let dec2 = query.dec_deg + query.height_deg / 2.0;
        let ra1 = ra_deg - query.width_deg / 2.0;
        let ra2 = ra_deg + query.width_deg / 2.0;

        let min_ra = C::ra_native(ra1);
        let max_ra = C::ra_native(ra2);
        let min_dec = (dec1 * MAS_PER_DEG as f64) as i32;
        let max_dec = (dec2 * MAS_PER_DEG as f64) as i32;

        let filter = self.filter;
        let mut matched = 0u64;

        for zone in C::zone_containing(dec1)..=C::zone_containing(dec2) {
            let Some((path, file)) = locate_zone::<C>(&self.base, zone) else {
                log::debug!("{}: zone {} absent, skipped", C::NAME, zone);
                continue;
            };
            let mut reader = ZoneReader::<C>::new(path, file)?;
            let n_records = reader.record_count();
            if n_records == 0 {
                continue;
            }

            let search_started = Instant::now();
            let bracket = self.initial_bracket(zone, min_ra, n_records);
            let start = refine(
                |offset| reader.ra_at(offset),
                min_ra,
                bracket,
                ACCEPTABLE_LIMIT,
            )?;
            self.stats.time_searching += search_started.elapsed();
            self.stats.zones_scanned += 1;
            log::debug!(
                "{}: zone {} search gave offset {} of {}",
                C::NAME,
                zone,
                start,
                n_records
            );

            reader.scan_from(start, |offset, star| {
                let ra = C::ra(&star);
                if ra > max_ra {
                    return false;
                }
                if ra > min_ra {
                    let dec = C::dec_mas(&star);
                    if dec > min_dec && dec < max_dec && filter.accepts::<C>(&star) {
                        matched += 1;
                        consumer(zone, offset, &star);
                    }
                }
                true
            })?;
        }

        // A rectangle reaching past RA 0 or RA 360 needs the stars on the
        // other side of the seam; the shifted center fails the range guard,
        // so recursion stops after one level.
        if (0.0..360.0).contains(&ra_deg) {
            if ra1 < 0.0 {
                matched += self.run(ra_deg + 360.0, query, consumer)?;
            }
            if ra2 > 360.0 {
                matched += self.run(ra_deg - 360.0, query, consumer)?;
            }
        }

        Ok(matched)
    }

    /// Index-provided bracket when available and trustworthy, else the
    /// whole zone. A record count that disagrees with the zone file marks
    /// the index as stale for that zone.
    fn initial_bracket(&self, zone: i32, target_ra: i32, n_records: u32) -> Bracket {
        let ra_limit = C::ra_limit();
        if let Some(index) = &self.index {
            match index.record_count(zone) {
                Some(count) if count == n_records => {
                    if let Some(bracket) = index.bracket(zone, target_ra, ra_limit) {
                        return bracket;
                    }
                }
                Some(count) => {
                    log::warn!(
                        "{}: index says zone {} has {} records, file has {}; ignoring index",
                        C::NAME,
                        zone,
                        count,
                        n_records
                    );
                }
                None => {}
            }
        }
        Bracket::whole_zone(n_records, ra_limit)
    }
}

/// Fetches the single record at `(zone, offset)`, or `None` when the zone
/// file is absent or shorter than `offset`. `offset` is 0-based.
pub fn read_star<C: CatalogLayout>(
    base: impl AsRef<Path>,
    zone: i32,
    offset: u32,
) -> Result<Option<C::Star>> {
    let Some((path, file)) = locate_zone::<C>(base.as_ref(), zone) else {
        return Ok(None);
    };
    let mut reader = ZoneReader::<C>::new(path, file)?;
    if offset >= reader.record_count() {
        return Ok(None);
    }
    reader.read_at(offset).map(Some)
}
