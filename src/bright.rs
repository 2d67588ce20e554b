//! All-sky brightness grid built from full catalog scans.
//!
//! A 3600×1800 grid of 0.1°×0.1° cells covers the sky. Each record of each
//! zone lands in one cell, contributing either its flux equivalent (scaled
//! so one count is a magnitude-20 star, i.e. a cell value of 100 equals one
//! mag-15 star) or a bare count of stars. Star counts turn out to matter
//! more than total brightness for judging galactic confusion, hence the two
//! modes.
//!
//! This is a sequential pass over every record — no searching — so a full
//! catalog takes a while. The grid saves to and reloads from a flat
//! little-endian i32 file, letting a run resume zone range by zone range;
//! accumulation is additive, so the caller must not feed the same zone
//! twice.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};

use crate::catalogs::{CatalogLayout, MAS_PER_DEG};
use crate::error::Result;
use crate::query::reader::ZoneReader;

/// Grid cells in RA: 0.1° each.
pub const GRID_WIDTH: usize = 3600;
/// Grid cells in declination: 0.1° each.
pub const GRID_HEIGHT: usize = 1800;

/// Default magnitude cutoff, millimags. Beyond mag 22 the Gaia coverage is
/// uneven enough to imprint survey artifacts on the map.
pub const DEFAULT_MAG_LIMIT: i32 = 22_000;

/// What a star adds to its cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccumulateMode {
    /// Flux-equivalent sum: `100^((20000 - mag_mmag) / 5000)` per star.
    Flux,
    /// Plain star count.
    Count,
}

/// The accumulation grid.
pub struct BrightnessMap {
    cells: Vec<i32>,
    mode: AccumulateMode,
    mag_limit: i32,
    /// Flux per millimag, precomputed; empty in count mode.
    flux_table: Vec<i32>,
}

impl BrightnessMap {
    pub fn new(mode: AccumulateMode, mag_limit: i32) -> Self {
        let flux_table = match mode {
            AccumulateMode::Flux => (0..mag_limit.max(0))
                .map(|mmag| 100f64.powf((20_000 - mmag) as f64 / 5000.0) as i32)
                .collect(),
            AccumulateMode::Count => Vec::new(),
        };
        Self {
            cells: vec![0; GRID_WIDTH * GRID_HEIGHT],
            mode,
            mag_limit,
            flux_table,
        }
    }

    /// Adds one star. Records with no magnitude (`mag_mmag <= 0`) or
    /// fainter than the limit are ignored.
    pub fn accumulate<C: CatalogLayout>(&mut self, star: &C::Star) {
        let mag = C::mag_mmag(star);
        if mag <= 0 || mag >= self.mag_limit {
            return;
        }
        let x = (C::ra(star) as i64 * 10 / C::RA_UNITS_PER_DEG)
            .clamp(0, GRID_WIDTH as i64 - 1) as usize;
        let y = ((C::dec_mas(star) as i64 + 90 * MAS_PER_DEG) * 10 / MAS_PER_DEG)
            .clamp(0, GRID_HEIGHT as i64 - 1) as usize;
        self.cells[x + y * GRID_WIDTH] += match self.mode {
            AccumulateMode::Flux => self.flux_table[mag as usize],
            AccumulateMode::Count => 1,
        };
    }

    /// Scans one whole zone into the grid, returning the records read.
    pub fn accumulate_zone<C: CatalogLayout>(&mut self, reader: &mut ZoneReader<C>) -> Result<u64> {
        let mut n_read = 0u64;
        reader.scan_from(0, |_, star| {
            self.accumulate::<C>(&star);
            n_read += 1;
            true
        })?;
        Ok(n_read)
    }

    pub fn cells(&self) -> &[i32] {
        &self.cells
    }

    pub fn cell(&self, x: usize, y: usize) -> i32 {
        self.cells[x + y * GRID_WIDTH]
    }

    /// Replaces the grid with a previously saved one. Returns false when
    /// the file does not exist (a fresh run).
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<bool> {
        let mut file = match File::open(path.as_ref()) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(err) => return Err(err.into()),
        };
        let mut bytes = vec![0u8; GRID_WIDTH * GRID_HEIGHT * 4];
        file.read_exact(&mut bytes)?;
        LittleEndian::read_i32_into(&bytes, &mut self.cells);
        Ok(true)
    }

    /// Writes the grid as flat little-endian i32s.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut bytes = vec![0u8; GRID_WIDTH * GRID_HEIGHT * 4];
        LittleEndian::write_i32_into(&self.cells, &mut bytes);
        let mut file = File::create(path.as_ref())?;
        file.write_all(&bytes)?;
        Ok(())
    }

    /// Renders the grid as an 8-bit PGM, north up, RA increasing leftward
    /// (sky convention). Cell values map through
    /// `255 * (cell - offset) / (scale * cos(dec))`, clamped to 0..=255;
    /// the cos(dec) factor compensates for the shrinking solid angle of
    /// the fixed-width cells toward the poles.
    pub fn render_pgm<W: Write>(&self, mut w: W, scale: i32, offset: i32) -> Result<()> {
        writeln!(w, "P5\n{} {}\n255", GRID_WIDTH, GRID_HEIGHT)?;
        let mut row = [0u8; GRID_WIDTH];
        for y in (0..GRID_HEIGHT).rev() {
            let dec_rad =
                (y as f64 - GRID_HEIGHT as f64 / 2.0 + 0.5) * std::f64::consts::PI / GRID_HEIGHT as f64;
            let cos_dec = dec_rad.cos();
            for (out, x) in row.iter_mut().zip((0..GRID_WIDTH).rev()) {
                let value = 255.0 * (self.cell(x, y) - offset) as f64 / (scale as f64 * cos_dec);
                *out = value.clamp(0.0, 255.0) as u8;
            }
            w.write_all(&row)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogs::gaia::{Gaia, GaiaStar};

    fn star(ra_deg: f64, dec_deg: f64, mag: u16) -> GaiaStar {
        GaiaStar {
            ra: (ra_deg * 3_600_000.0) as i32,
            dec: (dec_deg * 3_600_000.0) as i32,
            ra_sigma: 0,
            dec_sigma: 0,
            pm_ra: 0,
            pm_dec: 0,
            pm_ra_sigma: 0,
            pm_dec_sigma: 0,
            epoch: 0,
            mag,
            mag_sigma: 0,
        }
    }

    #[test]
    fn one_count_is_a_mag_20_star() {
        let mut map = BrightnessMap::new(AccumulateMode::Flux, DEFAULT_MAG_LIMIT);
        map.accumulate::<Gaia>(&star(180.0, 0.0, 20_000));
        assert_eq!(map.cell(1800, 900), 1);

        // A mag-15 star is a hundred times brighter.
        let mut map = BrightnessMap::new(AccumulateMode::Flux, DEFAULT_MAG_LIMIT);
        map.accumulate::<Gaia>(&star(180.0, 0.0, 15_000));
        assert_eq!(map.cell(1800, 900), 100);
    }

    #[test]
    fn flux_accumulation_is_additive() {
        let mut map = BrightnessMap::new(AccumulateMode::Flux, DEFAULT_MAG_LIMIT);
        let s = star(10.05, -45.05, 17_500);
        map.accumulate::<Gaia>(&s);
        let once = map.cell(100, 449);
        assert!(once > 0);
        map.accumulate::<Gaia>(&s);
        assert_eq!(map.cell(100, 449), 2 * once);
    }

    #[test]
    fn count_mode_counts() {
        let mut map = BrightnessMap::new(AccumulateMode::Count, DEFAULT_MAG_LIMIT);
        let s = star(10.05, -45.05, 17_500);
        map.accumulate::<Gaia>(&s);
        map.accumulate::<Gaia>(&s);
        assert_eq!(map.cell(100, 449), 2);
    }

    #[test]
    fn faint_and_magless_stars_are_skipped() {
        let mut map = BrightnessMap::new(AccumulateMode::Count, DEFAULT_MAG_LIMIT);
        map.accumulate::<Gaia>(&star(180.0, 0.0, 0));
        map.accumulate::<Gaia>(&star(180.0, 0.0, 22_000));
        assert_eq!(map.cells().iter().filter(|&&c| c != 0).count(), 0);
    }

    #[test]
    fn save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bright.zq");

        let mut map = BrightnessMap::new(AccumulateMode::Count, DEFAULT_MAG_LIMIT);
        map.accumulate::<Gaia>(&star(359.95, 89.95, 12_000));
        map.save(&path).unwrap();

        let mut resumed = BrightnessMap::new(AccumulateMode::Count, DEFAULT_MAG_LIMIT);
        assert!(resumed.load(&path).unwrap());
        assert_eq!(resumed.cell(3599, 1799), 1);

        let mut fresh = BrightnessMap::new(AccumulateMode::Count, DEFAULT_MAG_LIMIT);
        assert!(!fresh.load(dir.path().join("missing.zq")).unwrap());
    }

    #[test]
    fn pgm_header_and_size() {
        let map = BrightnessMap::new(AccumulateMode::Count, DEFAULT_MAG_LIMIT);
        let mut out = Vec::new();
        map.render_pgm(&mut out, 20, 0).unwrap();
        assert!(out.starts_with(b"P5\n3600 1800\n255\n"));
        let header_len = b"P5\n3600 1800\n255\n".len();
        assert_eq!(out.len(), header_len + GRID_WIDTH * GRID_HEIGHT);
    }
}
