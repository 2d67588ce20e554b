//! UCAC-2: 44-byte records, 288 zones of 0.5°, northern limit about +40°.

use byteorder::{ByteOrder, LittleEndian};

use super::{dec_deg_from_mas, CatalogLayout, StarSummary, MAS_PER_DEG};
use crate::error::Result;

/// Layout marker for UCAC-2.
#[derive(Debug)]
pub struct Ucac2;

/// One UCAC-2 star, 44 bytes on disk. Unlike its successors, UCAC-2 stores
/// declination signed (no south-polar-distance offset) and its magnitude in
/// centimags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ucac2Star {
    /// RA / dec, milliarcseconds.
    pub ra: i32,
    pub dec: i32,
    /// Internal UCAC magnitude (red bandpass), 0.01 mag.
    pub mag: i16,
    pub e_ra: i8,
    pub e_dec: i8,
    pub nobs: i8,
    pub e_posn: i8,
    pub ncat: i8,
    pub catalog_flag: i8,
    /// Central epochs minus 1975, in 0.001 yr.
    pub epoch_ra: i16,
    pub epoch_dec: i16,
    /// Proper motions, 0.1 mas/yr.
    pub pm_ra: i32,
    pub pm_dec: i32,
    pub e_pm_ra: i8,
    pub e_pm_dec: i8,
    /// Goodness of fit, 0.05 units.
    pub q_pm_ra: i8,
    pub q_pm_dec: i8,
    pub twomass_id: i32,
    /// 2MASS magnitudes, millimags.
    pub j_mag: i16,
    pub h_mag: i16,
    pub ks_mag: i16,
    pub twomass_ph_qual: i8,
    pub twomass_cc_flag: i8,
}

impl Ucac2Star {
    pub fn epoch_year(&self) -> f64 {
        1975.0 + self.epoch_ra as f64 / 1000.0
    }
}

impl CatalogLayout for Ucac2 {
    type Star = Ucac2Star;

    const NAME: &'static str = "ucac2";
    const RECORD_SIZE: usize = 44;
    const ZONE_HEIGHT_DEG: f64 = 0.5;
    const FIRST_ZONE: i32 = 1;
    const LAST_ZONE: i32 = 288;
    const RA_UNITS_PER_DEG: i64 = MAS_PER_DEG;
    const DATA_SUBDIR: Option<&'static str> = None;
    const INDEX_FILE: &'static str = "ucac2.idx";

    fn zone_file_name(zone: i32) -> String {
        format!("z{:03}", zone)
    }

    fn decode(buf: &[u8]) -> Ucac2Star {
        Ucac2Star {
            ra: LittleEndian::read_i32(&buf[0..4]),
            dec: LittleEndian::read_i32(&buf[4..8]),
            mag: LittleEndian::read_i16(&buf[8..10]),
            e_ra: buf[10] as i8,
            e_dec: buf[11] as i8,
            nobs: buf[12] as i8,
            e_posn: buf[13] as i8,
            ncat: buf[14] as i8,
            catalog_flag: buf[15] as i8,
            epoch_ra: LittleEndian::read_i16(&buf[16..18]),
            epoch_dec: LittleEndian::read_i16(&buf[18..20]),
            pm_ra: LittleEndian::read_i32(&buf[20..24]),
            pm_dec: LittleEndian::read_i32(&buf[24..28]),
            e_pm_ra: buf[28] as i8,
            e_pm_dec: buf[29] as i8,
            q_pm_ra: buf[30] as i8,
            q_pm_dec: buf[31] as i8,
            twomass_id: LittleEndian::read_i32(&buf[32..36]),
            j_mag: LittleEndian::read_i16(&buf[36..38]),
            h_mag: LittleEndian::read_i16(&buf[38..40]),
            ks_mag: LittleEndian::read_i16(&buf[40..42]),
            twomass_ph_qual: buf[42] as i8,
            twomass_cc_flag: buf[43] as i8,
        }
    }

    fn encode(star: &Ucac2Star, buf: &mut [u8]) -> Result<()> {
        LittleEndian::write_i32(&mut buf[0..4], star.ra);
        LittleEndian::write_i32(&mut buf[4..8], star.dec);
        LittleEndian::write_i16(&mut buf[8..10], star.mag);
        buf[10] = star.e_ra as u8;
        buf[11] = star.e_dec as u8;
        buf[12] = star.nobs as u8;
        buf[13] = star.e_posn as u8;
        buf[14] = star.ncat as u8;
        buf[15] = star.catalog_flag as u8;
        LittleEndian::write_i16(&mut buf[16..18], star.epoch_ra);
        LittleEndian::write_i16(&mut buf[18..20], star.epoch_dec);
        LittleEndian::write_i32(&mut buf[20..24], star.pm_ra);
        LittleEndian::write_i32(&mut buf[24..28], star.pm_dec);
        buf[28] = star.e_pm_ra as u8;
        buf[29] = star.e_pm_dec as u8;
        buf[30] = star.q_pm_ra as u8;
        buf[31] = star.q_pm_dec as u8;
        LittleEndian::write_i32(&mut buf[32..36], star.twomass_id);
        LittleEndian::write_i16(&mut buf[36..38], star.j_mag);
        LittleEndian::write_i16(&mut buf[38..40], star.h_mag);
        LittleEndian::write_i16(&mut buf[40..42], star.ks_mag);
        buf[42] = star.twomass_ph_qual as u8;
        buf[43] = star.twomass_cc_flag as u8;
        Ok(())
    }

    fn ra(star: &Ucac2Star) -> i32 {
        star.ra
    }

    fn dec_mas(star: &Ucac2Star) -> i32 {
        star.dec
    }

    fn mag_mmag(star: &Ucac2Star) -> i32 {
        star.mag as i32 * 10
    }

    fn summarize(zone: i32, offset: u32, star: &Ucac2Star) -> StarSummary {
        StarSummary {
            zone,
            number: offset + 1,
            ra_deg: Self::ra_deg(star.ra),
            dec_deg: dec_deg_from_mas(star.dec),
            mag: star.mag as f64 / 100.0,
            epoch: star.epoch_year(),
        }
    }
}
