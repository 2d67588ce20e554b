//! The `ZIDX` sparse RA index.
//!
//! One container file per catalog holds, for every zone, a monotonic table
//! of RA checkpoints that narrows the search bracket before any zone file
//! is read. Two layouts cover the schemes in use:
//!
//! - **Spaced** — the RA of every Nth record in the zone. The table size
//!   tracks the star count, so dense zones get proportionally more
//!   checkpoints; this is the right shape for Gaia's wildly uneven sky.
//!   First and last checkpoints (offset 0 at RA 0, offset N at 360°) are
//!   implicit.
//! - **Bucketed** — record offsets at fixed RA bucket boundaries (the
//!   classic 1440-bucket grid of the UCAC distributions), one offset per
//!   boundary plus the zone record count at the end.
//!
//! Either way the index is advisory: [`ZoneIndex::bracket`] only proposes a
//! starting bracket, and the search engine confirms against real records.
//! The whole file is memory-mapped and validated once per session, which
//! subsumes per-lookup caching for the repeated-small-query workloads this
//! exists for.
//!
//! ## File format (little-endian throughout)
//!
//! | Offset | Field |
//! |--------|-------|
//! | 0 | magic `b"ZIDX"` |
//! | 4 | version, currently 1 |
//! | 8 | layout: 1 = spaced, 2 = bucketed |
//! | 12 | parameter: record spacing or bucket count |
//! | 16 | first zone id (i32) |
//! | 20 | zone count |
//! | 24 | per-zone record counts, u32 each |
//! | ... | per-zone tables: i32 checkpoint RAs (spaced) or u32 offsets (bucketed) |

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use memmap2::Mmap;

use super::search::Bracket;
use crate::error::{CatalogError, Result};

pub const INDEX_MAGIC: [u8; 4] = *b"ZIDX";
pub const INDEX_VERSION: u32 = 1;
const HEADER_SIZE: usize = 24;

/// Which checkpoint scheme an index file uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexLayout {
    /// RA of every `spacing`th record per zone.
    Spaced { spacing: u32 },
    /// Record offsets at `buckets` fixed RA boundaries per zone.
    Bucketed { buckets: u32 },
}

impl IndexLayout {
    fn tag(&self) -> u32 {
        match self {
            IndexLayout::Spaced { .. } => 1,
            IndexLayout::Bucketed { .. } => 2,
        }
    }

    fn param(&self) -> u32 {
        match *self {
            IndexLayout::Spaced { spacing } => spacing,
            IndexLayout::Bucketed { buckets } => buckets,
        }
    }

    /// Table entries for a zone of `count` records.
    fn table_len(&self, count: u32) -> usize {
        match *self {
            IndexLayout::Spaced { spacing } => {
                if count == 0 {
                    0
                } else {
                    ((count - 1) / spacing) as usize
                }
            }
            IndexLayout::Bucketed { buckets } => buckets as usize + 1,
        }
    }
}

/// One zone's checkpoint table, as handed to [`write_index`].
#[derive(Debug, Clone)]
pub enum ZoneTable {
    /// RAs of records at `spacing`, `2*spacing`, ... (native units,
    /// non-decreasing).
    Spaced(Vec<i32>),
    /// For each bucket boundary, the first offset whose record's RA is at
    /// or past it; the final entry is the zone record count.
    Bucketed(Vec<u32>),
}

/// Writes a `ZIDX` index. `zones` holds `(record_count, table)` for every
/// zone from `first_zone` on, in order.
///
/// Panics if a table's kind or length disagrees with `layout` — the
/// builders in `mkindex` derive both from the same scan, so a mismatch is
/// a bug, not an input condition.
pub fn write_index<W: Write>(
    mut w: W,
    layout: IndexLayout,
    first_zone: i32,
    zones: &[(u32, ZoneTable)],
) -> Result<()> {
    w.write_all(&INDEX_MAGIC)?;
    w.write_u32::<LittleEndian>(INDEX_VERSION)?;
    w.write_u32::<LittleEndian>(layout.tag())?;
    w.write_u32::<LittleEndian>(layout.param())?;
    w.write_i32::<LittleEndian>(first_zone)?;
    w.write_u32::<LittleEndian>(zones.len() as u32)?;
    for &(count, _) in zones {
        w.write_u32::<LittleEndian>(count)?;
    }
    for &(count, ref table) in zones {
        let expected = layout.table_len(count);
        match (layout, table) {
            (IndexLayout::Spaced { .. }, ZoneTable::Spaced(ras)) => {
                assert_eq!(ras.len(), expected, "spaced table length");
                for &ra in ras {
                    w.write_i32::<LittleEndian>(ra)?;
                }
            }
            (IndexLayout::Bucketed { .. }, ZoneTable::Bucketed(offsets)) => {
                assert_eq!(offsets.len(), expected, "bucketed table length");
                for &offset in offsets {
                    w.write_u32::<LittleEndian>(offset)?;
                }
            }
            _ => panic!("zone table kind does not match index layout"),
        }
    }
    Ok(())
}

/// A validated, memory-mapped `ZIDX` index.
#[derive(Debug)]
pub struct ZoneIndex {
    mmap: Mmap,
    layout: IndexLayout,
    first_zone: i32,
    counts: Vec<u32>,
    /// Byte offset of each zone's table within the map.
    table_starts: Vec<usize>,
}

impl ZoneIndex {
    /// Maps and validates an index file. Fails with
    /// [`CatalogError::BadIndexMagic`] on foreign files and
    /// [`CatalogError::InvalidIndex`] on structural damage; the caller
    /// decides whether absence of the file was acceptable.
    pub fn open(path: PathBuf, file: &File) -> Result<Self> {
        fn invalid(path: &PathBuf, reason: String) -> CatalogError {
            CatalogError::InvalidIndex {
                path: path.clone(),
                reason,
            }
        }

        let mmap = unsafe { Mmap::map(file) }?;
        if mmap.len() < HEADER_SIZE {
            return Err(invalid(
                &path,
                format!("only {} bytes, no header", mmap.len()),
            ));
        }
        if mmap[0..4] != INDEX_MAGIC {
            return Err(CatalogError::BadIndexMagic {
                path,
                found: mmap[0..4].try_into().unwrap(),
                expected: INDEX_MAGIC,
            });
        }
        let version = LittleEndian::read_u32(&mmap[4..8]);
        if version != INDEX_VERSION {
            return Err(invalid(&path, format!("unsupported version {}", version)));
        }
        let param = LittleEndian::read_u32(&mmap[12..16]);
        if param == 0 {
            return Err(invalid(&path, "zero spacing/bucket parameter".into()));
        }
        let layout = match LittleEndian::read_u32(&mmap[8..12]) {
            1 => IndexLayout::Spaced { spacing: param },
            2 => IndexLayout::Bucketed { buckets: param },
            tag => return Err(invalid(&path, format!("unknown layout tag {}", tag))),
        };
        let first_zone = LittleEndian::read_i32(&mmap[16..20]);
        let n_zones = LittleEndian::read_u32(&mmap[20..24]) as usize;
        if n_zones == 0 || n_zones > 10_000 {
            return Err(invalid(&path, format!("implausible zone count {}", n_zones)));
        }
        if mmap.len() < HEADER_SIZE + n_zones * 4 {
            return Err(invalid(&path, "truncated zone count table".into()));
        }

        let mut counts = vec![0u32; n_zones];
        LittleEndian::read_u32_into(&mmap[HEADER_SIZE..HEADER_SIZE + n_zones * 4], &mut counts);

        let mut table_starts = Vec::with_capacity(n_zones);
        let mut at = HEADER_SIZE + n_zones * 4;
        for &count in &counts {
            table_starts.push(at);
            at += layout.table_len(count) * 4;
        }
        if mmap.len() != at {
            return Err(invalid(
                &path,
                format!(
                    "size {} does not match {} expected from the zone counts",
                    mmap.len(),
                    at
                ),
            ));
        }

        Ok(Self {
            mmap,
            layout,
            first_zone,
            counts,
            table_starts,
        })
    }

    pub fn layout(&self) -> IndexLayout {
        self.layout
    }

    /// Record count the index was built against, used to spot stale
    /// indexes before trusting their brackets.
    pub fn record_count(&self, zone: i32) -> Option<u32> {
        let zi = self.zone_slot(zone)?;
        Some(self.counts[zi])
    }

    /// Proposes a search bracket for `target_ra` in `zone`. `ra_limit` is
    /// 360° in the catalog's native RA units (the same value the index was
    /// built with). `None` when the zone is outside the indexed range.
    pub fn bracket(&self, zone: i32, target_ra: i32, ra_limit: i32) -> Option<Bracket> {
        let zi = self.zone_slot(zone)?;
        let count = self.counts[zi];
        if count == 0 {
            return Some(Bracket::whole_zone(0, ra_limit));
        }
        match self.layout {
            IndexLayout::Spaced { spacing } => {
                Some(self.spaced_bracket(zi, count, spacing, target_ra, ra_limit))
            }
            IndexLayout::Bucketed { buckets } => {
                Some(self.bucketed_bracket(zi, count, buckets, target_ra, ra_limit))
            }
        }
    }

    fn zone_slot(&self, zone: i32) -> Option<usize> {
        let slot = zone.checked_sub(self.first_zone)?;
        if slot < 0 || slot as usize >= self.counts.len() {
            return None;
        }
        Some(slot as usize)
    }

    fn checkpoint(&self, zi: usize, entry: usize) -> i32 {
        let at = self.table_starts[zi] + entry * 4;
        LittleEndian::read_i32(&self.mmap[at..at + 4])
    }

    fn spaced_bracket(
        &self,
        zi: usize,
        count: u32,
        spacing: u32,
        target_ra: i32,
        ra_limit: i32,
    ) -> Bracket {
        let n_cp = ((count - 1) / spacing) as usize;

        // Conceptually the table is 0, cp[0], .., cp[n_cp-1], ra_limit at
        // offsets 0, spacing, .., n_cp*spacing, count. Find the first entry
        // at or past the target.
        let mut i = 1;
        while i <= n_cp && self.checkpoint(zi, i - 1) < target_ra {
            i += 1;
        }

        let lo = (i as u32 - 1) * spacing;
        let lo_ra = if i == 1 {
            0
        } else {
            self.checkpoint(zi, i - 2)
        };
        if i == n_cp + 1 {
            Bracket {
                lo,
                lo_ra,
                hi: count,
                hi_ra: ra_limit,
            }
        } else {
            Bracket {
                lo,
                lo_ra,
                hi: i as u32 * spacing,
                hi_ra: self.checkpoint(zi, i - 1),
            }
        }
    }

    fn bucketed_bracket(
        &self,
        zi: usize,
        count: u32,
        buckets: u32,
        target_ra: i32,
        ra_limit: i32,
    ) -> Bracket {
        let boundary = |b: u32| (b as i64 * ra_limit as i64 / buckets as i64) as i32;
        let bucket = ((target_ra.max(0) as i64 * buckets as i64) / ra_limit as i64)
            .clamp(0, buckets as i64 - 1) as u32;

        let offset_entry = |b: u32| {
            let at = self.table_starts[zi] + b as usize * 4;
            LittleEndian::read_u32(&self.mmap[at..at + 4])
        };
        let lo = offset_entry(bucket).min(count);
        let hi = offset_entry(bucket + 1).min(count);
        if lo > hi {
            // Non-monotonic table; fall back to the whole zone.
            return Bracket::whole_zone(count, ra_limit);
        }
        Bracket {
            lo,
            lo_ra: boundary(bucket),
            hi,
            hi_ra: boundary(bucket + 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    fn open_index(bytes: &[u8]) -> Result<ZoneIndex> {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        ZoneIndex::open(file.path().to_path_buf(), file.as_file())
    }

    fn spaced_fixture() -> Vec<u8> {
        // One zone, 10 records, spacing 3: checkpoints at offsets 3, 6, 9.
        let mut buf = Vec::new();
        write_index(
            &mut buf,
            IndexLayout::Spaced { spacing: 3 },
            0,
            &[(10, ZoneTable::Spaced(vec![100, 200, 300]))],
        )
        .unwrap();
        buf
    }

    #[test]
    fn round_trips_spaced_layout() {
        let index = open_index(&spaced_fixture()).unwrap();
        assert_eq!(index.layout(), IndexLayout::Spaced { spacing: 3 });
        assert_eq!(index.record_count(0), Some(10));
        assert_eq!(index.record_count(1), None);
        assert_eq!(index.record_count(-1), None);
    }

    #[test]
    fn spaced_brackets() {
        let index = open_index(&spaced_fixture()).unwrap();
        let limit = 1_296_000_000;

        // Below the first checkpoint.
        let b = index.bracket(0, 50, limit).unwrap();
        assert_eq!(
            b,
            Bracket {
                lo: 0,
                lo_ra: 0,
                hi: 3,
                hi_ra: 100
            }
        );

        // Between checkpoints.
        let b = index.bracket(0, 250, limit).unwrap();
        assert_eq!(
            b,
            Bracket {
                lo: 6,
                lo_ra: 200,
                hi: 9,
                hi_ra: 300
            }
        );

        // Past the last checkpoint: the partial tail block.
        let b = index.bracket(0, 500, limit).unwrap();
        assert_eq!(
            b,
            Bracket {
                lo: 9,
                lo_ra: 300,
                hi: 10,
                hi_ra: limit
            }
        );

        // A target equal to a checkpoint keeps it as the high bound.
        let b = index.bracket(0, 200, limit).unwrap();
        assert_eq!(b.hi_ra, 200);
        assert_eq!(b.lo, 3);
    }

    #[test]
    fn bucketed_brackets() {
        let limit = 1_296_000_000;
        // One zone, 100 records, 4 buckets of 90° each.
        let mut buf = Vec::new();
        write_index(
            &mut buf,
            IndexLayout::Bucketed { buckets: 4 },
            1,
            &[(100, ZoneTable::Bucketed(vec![0, 10, 50, 90, 100]))],
        )
        .unwrap();
        let index = open_index(&buf).unwrap();

        // 100° falls in the second bucket.
        let b = index.bracket(1, 100 * 3_600_000, limit).unwrap();
        assert_eq!(b.lo, 10);
        assert_eq!(b.hi, 50);
        assert_eq!(b.lo_ra, limit / 4);
        assert_eq!(b.hi_ra, limit / 2);

        // Negative targets (a query spilling below RA 0) use bucket 0.
        let b = index.bracket(1, -5, limit).unwrap();
        assert_eq!(b.lo, 0);
        assert_eq!(b.lo_ra, 0);

        // Out-of-range zones are not indexed.
        assert!(index.bracket(0, 0, limit).is_none());
        assert!(index.bracket(2, 0, limit).is_none());
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = spaced_fixture();
        bytes[0..4].copy_from_slice(b"JUNK");
        let err = open_index(&bytes).unwrap_err();
        assert!(matches!(err, CatalogError::BadIndexMagic { .. }));
    }

    #[test]
    fn rejects_bad_version() {
        let mut bytes = spaced_fixture();
        bytes[4] = 9;
        let err = open_index(&bytes).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidIndex { .. }));
    }

    #[test]
    fn rejects_truncated_tables() {
        let mut bytes = spaced_fixture();
        bytes.truncate(bytes.len() - 4);
        let err = open_index(&bytes).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidIndex { .. }));
    }

    #[test]
    fn empty_zone_brackets_are_empty() {
        let mut buf = Vec::new();
        write_index(
            &mut buf,
            IndexLayout::Spaced { spacing: 1000 },
            5,
            &[(0, ZoneTable::Spaced(vec![]))],
        )
        .unwrap();
        let index = open_index(&buf).unwrap();
        let b = index.bracket(5, 42, 1_296_000_000).unwrap();
        assert!(b.is_empty());
    }
}
