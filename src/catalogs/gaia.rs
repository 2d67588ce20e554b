//! The compact Gaia-DR2 catalog: 28-byte records, 180 one-degree zones.
//!
//! Zone files are named `000.cat` through `179.cat`, counting up from the
//! south pole. Gaia's sky coverage is far from uniform, which is why its
//! `gaia.idx` uses the spacing-based index layout (checkpoint density tracks
//! star density) and why the search engine clamps its interpolation steps
//! (see [`crate::query::search`]).

use byteorder::{ByteOrder, LittleEndian};

use super::{dec_deg_from_mas, CatalogLayout, StarSummary, MAS_PER_DEG};
use crate::error::{check_range, Result};

/// Layout marker for the compact Gaia-DR2 catalog.
#[derive(Debug)]
pub struct Gaia;

/// One Gaia star, 28 bytes on disk.
///
/// Positions are ICRS at J2000.0. The position sigmas are stored on disk as
/// `i8` offset by −128; this struct holds them in their natural 0..=255
/// range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GaiaStar {
    /// Right ascension, milliarcseconds.
    pub ra: i32,
    /// Declination, milliarcseconds (signed).
    pub dec: i32,
    /// RA sigma in half-milliarcseconds, 0..=255.
    pub ra_sigma: u16,
    /// Dec sigma in half-milliarcseconds, 0..=255.
    pub dec_sigma: u16,
    /// Proper motion in RA, microarcseconds/year.
    pub pm_ra: i32,
    /// Proper motion in dec, microarcseconds/year.
    pub pm_dec: i32,
    /// Proper motion sigmas, same units.
    pub pm_ra_sigma: u16,
    pub pm_dec_sigma: u16,
    /// Mean epoch in milliyears since 2000.0.
    pub epoch: i16,
    /// G magnitude in millimags, 0 when unknown.
    pub mag: u16,
    /// Magnitude sigma in millimags.
    pub mag_sigma: u16,
}

impl GaiaStar {
    /// Mean epoch as a decimal year.
    pub fn epoch_year(&self) -> f64 {
        2000.0 + self.epoch as f64 / 1000.0
    }
}

impl CatalogLayout for Gaia {
    type Star = GaiaStar;

    const NAME: &'static str = "gaia";
    const RECORD_SIZE: usize = 28;
    const ZONE_HEIGHT_DEG: f64 = 1.0;
    const FIRST_ZONE: i32 = 0;
    const LAST_ZONE: i32 = 179;
    const RA_UNITS_PER_DEG: i64 = MAS_PER_DEG;
    const DATA_SUBDIR: Option<&'static str> = None;
    const INDEX_FILE: &'static str = "gaia.idx";

    fn zone_file_name(zone: i32) -> String {
        format!("{:03}.cat", zone)
    }

    fn decode(buf: &[u8]) -> GaiaStar {
        GaiaStar {
            ra: LittleEndian::read_i32(&buf[0..4]),
            dec: LittleEndian::read_i32(&buf[4..8]),
            ra_sigma: (buf[8] as i8 as i16 + 128) as u16,
            dec_sigma: (buf[9] as i8 as i16 + 128) as u16,
            pm_ra: LittleEndian::read_i32(&buf[10..14]),
            pm_dec: LittleEndian::read_i32(&buf[14..18]),
            pm_ra_sigma: LittleEndian::read_u16(&buf[18..20]),
            pm_dec_sigma: LittleEndian::read_u16(&buf[20..22]),
            epoch: LittleEndian::read_i16(&buf[22..24]),
            mag: LittleEndian::read_u16(&buf[24..26]),
            mag_sigma: LittleEndian::read_u16(&buf[26..28]),
        }
    }

    fn encode(star: &GaiaStar, buf: &mut [u8]) -> Result<()> {
        let ra_sigma = check_range("ra_sigma", star.ra_sigma as i64, 0, 255)?;
        let dec_sigma = check_range("dec_sigma", star.dec_sigma as i64, 0, 255)?;

        LittleEndian::write_i32(&mut buf[0..4], star.ra);
        LittleEndian::write_i32(&mut buf[4..8], star.dec);
        buf[8] = (ra_sigma - 128) as i8 as u8;
        buf[9] = (dec_sigma - 128) as i8 as u8;
        LittleEndian::write_i32(&mut buf[10..14], star.pm_ra);
        LittleEndian::write_i32(&mut buf[14..18], star.pm_dec);
        LittleEndian::write_u16(&mut buf[18..20], star.pm_ra_sigma);
        LittleEndian::write_u16(&mut buf[20..22], star.pm_dec_sigma);
        LittleEndian::write_i16(&mut buf[22..24], star.epoch);
        LittleEndian::write_u16(&mut buf[24..26], star.mag);
        LittleEndian::write_u16(&mut buf[26..28], star.mag_sigma);
        Ok(())
    }

    fn ra(star: &GaiaStar) -> i32 {
        star.ra
    }

    fn dec_mas(star: &GaiaStar) -> i32 {
        star.dec
    }

    fn mag_mmag(star: &GaiaStar) -> i32 {
        star.mag as i32
    }

    fn summarize(zone: i32, offset: u32, star: &GaiaStar) -> StarSummary {
        StarSummary {
            zone,
            number: offset + 1,
            ra_deg: Self::ra_deg(star.ra),
            dec_deg: dec_deg_from_mas(star.dec),
            mag: star.mag as f64 / 1000.0,
            epoch: star.epoch_year(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> GaiaStar {
        GaiaStar {
            ra: 444_786_983,
            dec: -61_234_567,
            ra_sigma: 3,
            dec_sigma: 255,
            pm_ra: -15_432,
            pm_dec: 8_001,
            pm_ra_sigma: 120,
            pm_dec_sigma: 98,
            epoch: 15_500,
            mag: 18_204,
            mag_sigma: 12,
        }
    }

    #[test]
    fn round_trip() {
        let star = sample();
        let mut buf = [0u8; Gaia::RECORD_SIZE];
        Gaia::encode(&star, &mut buf).unwrap();
        assert_eq!(Gaia::decode(&buf), star);
    }

    #[test]
    fn sigma_offset_extremes() {
        for sigma in [0u16, 127, 128, 255] {
            let star = GaiaStar {
                ra_sigma: sigma,
                dec_sigma: sigma,
                ..sample()
            };
            let mut buf = [0u8; Gaia::RECORD_SIZE];
            Gaia::encode(&star, &mut buf).unwrap();
            let back = Gaia::decode(&buf);
            assert_eq!(back.ra_sigma, sigma);
            assert_eq!(back.dec_sigma, sigma);
        }
    }

    #[test]
    fn sigma_out_of_range_rejected() {
        let star = GaiaStar {
            ra_sigma: 256,
            ..sample()
        };
        let mut buf = [0u8; Gaia::RECORD_SIZE];
        assert!(Gaia::encode(&star, &mut buf).is_err());
    }

    #[test]
    fn ra_prefix_matches_decoded_ra() {
        let star = sample();
        let mut buf = [0u8; Gaia::RECORD_SIZE];
        Gaia::encode(&star, &mut buf).unwrap();
        let prefix: [u8; 4] = buf[0..4].try_into().unwrap();
        assert_eq!(Gaia::ra_from_prefix(prefix), star.ra);
    }

    #[test]
    fn zone_numbering() {
        assert_eq!(Gaia::zone_containing(-90.0), 0);
        assert_eq!(Gaia::zone_containing(-89.5), 0);
        assert_eq!(Gaia::zone_containing(0.5), 90);
        assert_eq!(Gaia::zone_containing(89.9), 179);
        assert_eq!(Gaia::zone_containing(90.0), 179);
        assert_eq!(Gaia::zone_file_name(8), "008.cat");
    }

    #[test]
    fn epoch_year() {
        let star = GaiaStar {
            epoch: 15_500,
            ..sample()
        };
        assert!((star.epoch_year() - 2015.5).abs() < 1e-12);
    }
}
