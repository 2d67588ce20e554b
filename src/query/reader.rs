//! Validated random access over one zone file.
//!
//! A zone file is a headerless run of fixed-size records; the record count
//! comes from the file length, which must divide evenly or the file is
//! rejected as corrupt. The reader serves the two access patterns the
//! search engine needs: single-record probes (which only read the four-byte
//! RA prefix) and forward scans in 400-record batches.
//!
//! I/O errors here are real errors — by the time a `ZoneReader` exists the
//! file was located and opened, so a failed seek or short read means a bad
//! disk or a file truncated underneath us, not missing coverage.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::marker::PhantomData;
use std::path::PathBuf;

use crate::catalogs::CatalogLayout;
use crate::error::{CatalogError, Result};

/// Records read per batch during linear scans. Large enough to amortize
/// read overhead without materializing a whole zone.
pub const SCAN_BATCH: usize = 400;

/// Random access over one zone's RA-sorted records.
#[derive(Debug)]
pub struct ZoneReader<C: CatalogLayout> {
    file: File,
    path: PathBuf,
    n_records: u32,
    record_buf: Vec<u8>,
    _catalog: PhantomData<C>,
}

impl<C: CatalogLayout> ZoneReader<C> {
    /// Wraps an opened zone file, validating its length.
    pub fn new(path: PathBuf, file: File) -> Result<Self> {
        let size = file.metadata()?.len();
        if size % C::RECORD_SIZE as u64 != 0 {
            return Err(CatalogError::MisalignedZone {
                path,
                size,
                record_size: C::RECORD_SIZE,
            });
        }
        Ok(Self {
            file,
            path,
            n_records: (size / C::RECORD_SIZE as u64) as u32,
            record_buf: vec![0u8; C::RECORD_SIZE],
            _catalog: PhantomData,
        })
    }

    /// Number of records in the zone.
    pub fn record_count(&self) -> u32 {
        self.n_records
    }

    /// Path the zone file was opened under.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// RA sort key of the record at `offset`, reading only its prefix.
    pub fn ra_at(&mut self, offset: u32) -> Result<i32> {
        self.seek_to(offset)?;
        let mut prefix = [0u8; 4];
        self.file.read_exact(&mut prefix)?;
        Ok(C::ra_from_prefix(prefix))
    }

    /// Decodes the record at `offset`.
    pub fn read_at(&mut self, offset: u32) -> Result<C::Star> {
        self.seek_to(offset)?;
        self.file.read_exact(&mut self.record_buf)?;
        Ok(C::decode(&self.record_buf))
    }

    /// Scans forward from `start`, decoding records in [`SCAN_BATCH`]-record
    /// batches and handing each to `visit` with its offset. Stops at end of
    /// zone or when `visit` returns `false`.
    pub fn scan_from<F>(&mut self, start: u32, mut visit: F) -> Result<()>
    where
        F: FnMut(u32, C::Star) -> bool,
    {
        if start >= self.n_records {
            return Ok(());
        }
        self.seek_to(start)?;

        let mut batch = vec![0u8; SCAN_BATCH * C::RECORD_SIZE];
        let mut offset = start;
        while offset < self.n_records {
            let n = (self.n_records - offset).min(SCAN_BATCH as u32) as usize;
            let bytes = &mut batch[..n * C::RECORD_SIZE];
            self.file.read_exact(bytes)?;
            for rec in bytes.chunks_exact(C::RECORD_SIZE) {
                if !visit(offset, C::decode(rec)) {
                    return Ok(());
                }
                offset += 1;
            }
        }
        Ok(())
    }

    fn seek_to(&mut self, offset: u32) -> Result<()> {
        self.file
            .seek(SeekFrom::Start(offset as u64 * C::RECORD_SIZE as u64))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogs::gaia::{Gaia, GaiaStar};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn test_star(ra: i32) -> GaiaStar {
        GaiaStar {
            ra,
            dec: 0,
            ra_sigma: 10,
            dec_sigma: 10,
            pm_ra: 0,
            pm_dec: 0,
            pm_ra_sigma: 0,
            pm_dec_sigma: 0,
            epoch: 15_000,
            mag: 12_000,
            mag_sigma: 5,
        }
    }

    fn write_zone(ras: &[i32]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        let mut buf = [0u8; Gaia::RECORD_SIZE];
        for &ra in ras {
            Gaia::encode(&test_star(ra), &mut buf).unwrap();
            file.write_all(&buf).unwrap();
        }
        file.flush().unwrap();
        file
    }

    fn open_reader(file: &NamedTempFile) -> ZoneReader<Gaia> {
        let handle = File::open(file.path()).unwrap();
        ZoneReader::new(file.path().to_path_buf(), handle).unwrap()
    }

    #[test]
    fn counts_records() {
        let file = write_zone(&[100, 200, 300]);
        assert_eq!(open_reader(&file).record_count(), 3);
    }

    #[test]
    fn rejects_misaligned_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0u8; 30]).unwrap();
        file.flush().unwrap();

        let handle = File::open(file.path()).unwrap();
        let err = ZoneReader::<Gaia>::new(file.path().to_path_buf(), handle).unwrap_err();
        assert!(matches!(err, CatalogError::MisalignedZone { size: 30, .. }));
    }

    #[test]
    fn ra_prefix_probe() {
        let file = write_zone(&[100, 200, 300]);
        let mut reader = open_reader(&file);
        assert_eq!(reader.ra_at(0).unwrap(), 100);
        assert_eq!(reader.ra_at(2).unwrap(), 300);
        assert_eq!(reader.ra_at(1).unwrap(), 200);
    }

    #[test]
    fn scan_visits_in_order_and_stops() {
        let file = write_zone(&[10, 20, 30, 40, 50]);
        let mut reader = open_reader(&file);

        let mut seen = Vec::new();
        reader
            .scan_from(1, |offset, star| {
                seen.push((offset, star.ra));
                star.ra < 40
            })
            .unwrap();
        assert_eq!(seen, vec![(1, 20), (2, 30), (3, 40)]);
    }

    #[test]
    fn scan_past_end_is_empty() {
        let file = write_zone(&[10, 20]);
        let mut reader = open_reader(&file);
        let mut seen = 0;
        reader
            .scan_from(5, |_, _| {
                seen += 1;
                true
            })
            .unwrap();
        assert_eq!(seen, 0);
    }
}
