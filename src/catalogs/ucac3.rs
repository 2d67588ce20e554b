//! UCAC-3: 84-byte records, 360 zones of 0.5°, south-polar-distance based.

use byteorder::{ByteOrder, LittleEndian};

use super::{dec_deg_from_mas, CatalogLayout, StarSummary, MAS_PER_DEG};
use crate::error::Result;

/// Layout marker for UCAC-3.
#[derive(Debug)]
pub struct Ucac3;

const SPD_OFFSET: i32 = 90 * 3_600_000;

/// Index of the Tycho digit in [`Ucac3Star::catflag`].
pub const CATFLAG_TYCHO: usize = 1;

/// One UCAC-3 star, 84 bytes on disk. All fields are plain little-endian
/// values; UCAC-3 kept SuperCOSMOS photometry and per-catalog match flags
/// that UCAC-4 later dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ucac3Star {
    /// RA / south polar distance, milliarcseconds.
    pub ra: i32,
    pub spd: i32,
    /// Fit-model and aperture magnitudes, millimags.
    pub mag1: i16,
    pub mag2: i16,
    pub mag_sigma: i16,
    pub obj_type: i8,
    pub double_star_flag: i8,
    pub ra_sigma: i16,
    pub dec_sigma: i16,
    pub n_ucac_total: i8,
    pub n_ucac_used: i8,
    pub n_cats_used: i8,
    pub n_cats_total: i8,
    /// Central epochs minus 1900, 0.01 yr.
    pub epoch_ra: i16,
    pub epoch_dec: i16,
    /// Proper motions, 0.1 mas/yr.
    pub pm_ra: i32,
    pub pm_dec: i32,
    pub pm_ra_sigma: i16,
    pub pm_dec_sigma: i16,
    pub twomass_id: i32,
    pub mag_j: i16,
    pub mag_h: i16,
    pub mag_k: i16,
    pub icq_flag: [i8; 3],
    pub e2mpho: [i8; 3],
    /// SuperCOSMOS B / R2 / I magnitudes and flags.
    pub sc_bmag: i16,
    pub sc_rmag: i16,
    pub sc_imag: i16,
    pub sc_class: i8,
    pub sc_bmag_quality: i8,
    pub sc_rmag_quality: i8,
    pub sc_imag_quality: i8,
    /// Match flags for ten major catalogs; `catflag[CATFLAG_TYCHO]` is Tycho.
    pub catflag: [i8; 10],
    pub yale_g1: i8,
    pub yale_c1: i8,
    pub leda_flag: i8,
    pub twomass_ext_flag: i8,
    /// MPOS running star number.
    pub running_number: i32,
}

impl Ucac3Star {
    pub fn dec(&self) -> i32 {
        self.spd - SPD_OFFSET
    }

    pub fn epoch_year(&self) -> f64 {
        1900.0 + self.epoch_ra as f64 / 100.0
    }
}

impl CatalogLayout for Ucac3 {
    type Star = Ucac3Star;

    const NAME: &'static str = "ucac3";
    const RECORD_SIZE: usize = 84;
    const ZONE_HEIGHT_DEG: f64 = 0.5;
    const FIRST_ZONE: i32 = 1;
    const LAST_ZONE: i32 = 360;
    const RA_UNITS_PER_DEG: i64 = MAS_PER_DEG;
    const DATA_SUBDIR: Option<&'static str> = None;
    const INDEX_FILE: &'static str = "ucac3.idx";

    fn zone_file_name(zone: i32) -> String {
        format!("z{:03}", zone)
    }

    fn decode(buf: &[u8]) -> Ucac3Star {
        let mut icq_flag = [0i8; 3];
        let mut e2mpho = [0i8; 3];
        let mut catflag = [0i8; 10];
        for i in 0..3 {
            icq_flag[i] = buf[50 + i] as i8;
            e2mpho[i] = buf[53 + i] as i8;
        }
        for i in 0..10 {
            catflag[i] = buf[66 + i] as i8;
        }

        Ucac3Star {
            ra: LittleEndian::read_i32(&buf[0..4]),
            spd: LittleEndian::read_i32(&buf[4..8]),
            mag1: LittleEndian::read_i16(&buf[8..10]),
            mag2: LittleEndian::read_i16(&buf[10..12]),
            mag_sigma: LittleEndian::read_i16(&buf[12..14]),
            obj_type: buf[14] as i8,
            double_star_flag: buf[15] as i8,
            ra_sigma: LittleEndian::read_i16(&buf[16..18]),
            dec_sigma: LittleEndian::read_i16(&buf[18..20]),
            n_ucac_total: buf[20] as i8,
            n_ucac_used: buf[21] as i8,
            n_cats_used: buf[22] as i8,
            n_cats_total: buf[23] as i8,
            epoch_ra: LittleEndian::read_i16(&buf[24..26]),
            epoch_dec: LittleEndian::read_i16(&buf[26..28]),
            pm_ra: LittleEndian::read_i32(&buf[28..32]),
            pm_dec: LittleEndian::read_i32(&buf[32..36]),
            pm_ra_sigma: LittleEndian::read_i16(&buf[36..38]),
            pm_dec_sigma: LittleEndian::read_i16(&buf[38..40]),
            twomass_id: LittleEndian::read_i32(&buf[40..44]),
            mag_j: LittleEndian::read_i16(&buf[44..46]),
            mag_h: LittleEndian::read_i16(&buf[46..48]),
            mag_k: LittleEndian::read_i16(&buf[48..50]),
            icq_flag,
            e2mpho,
            sc_bmag: LittleEndian::read_i16(&buf[56..58]),
            sc_rmag: LittleEndian::read_i16(&buf[58..60]),
            sc_imag: LittleEndian::read_i16(&buf[60..62]),
            sc_class: buf[62] as i8,
            sc_bmag_quality: buf[63] as i8,
            sc_rmag_quality: buf[64] as i8,
            sc_imag_quality: buf[65] as i8,
            catflag,
            yale_g1: buf[76] as i8,
            yale_c1: buf[77] as i8,
            leda_flag: buf[78] as i8,
            twomass_ext_flag: buf[79] as i8,
            running_number: LittleEndian::read_i32(&buf[80..84]),
        }
    }

    fn encode(star: &Ucac3Star, buf: &mut [u8]) -> Result<()> {
        LittleEndian::write_i32(&mut buf[0..4], star.ra);
        LittleEndian::write_i32(&mut buf[4..8], star.spd);
        LittleEndian::write_i16(&mut buf[8..10], star.mag1);
        LittleEndian::write_i16(&mut buf[10..12], star.mag2);
        LittleEndian::write_i16(&mut buf[12..14], star.mag_sigma);
        buf[14] = star.obj_type as u8;
        buf[15] = star.double_star_flag as u8;
        LittleEndian::write_i16(&mut buf[16..18], star.ra_sigma);
        LittleEndian::write_i16(&mut buf[18..20], star.dec_sigma);
        buf[20] = star.n_ucac_total as u8;
        buf[21] = star.n_ucac_used as u8;
        buf[22] = star.n_cats_used as u8;
        buf[23] = star.n_cats_total as u8;
        LittleEndian::write_i16(&mut buf[24..26], star.epoch_ra);
        LittleEndian::write_i16(&mut buf[26..28], star.epoch_dec);
        LittleEndian::write_i32(&mut buf[28..32], star.pm_ra);
        LittleEndian::write_i32(&mut buf[32..36], star.pm_dec);
        LittleEndian::write_i16(&mut buf[36..38], star.pm_ra_sigma);
        LittleEndian::write_i16(&mut buf[38..40], star.pm_dec_sigma);
        LittleEndian::write_i32(&mut buf[40..44], star.twomass_id);
        LittleEndian::write_i16(&mut buf[44..46], star.mag_j);
        LittleEndian::write_i16(&mut buf[46..48], star.mag_h);
        LittleEndian::write_i16(&mut buf[48..50], star.mag_k);
        for i in 0..3 {
            buf[50 + i] = star.icq_flag[i] as u8;
            buf[53 + i] = star.e2mpho[i] as u8;
        }
        LittleEndian::write_i16(&mut buf[56..58], star.sc_bmag);
        LittleEndian::write_i16(&mut buf[58..60], star.sc_rmag);
        LittleEndian::write_i16(&mut buf[60..62], star.sc_imag);
        buf[62] = star.sc_class as u8;
        buf[63] = star.sc_bmag_quality as u8;
        buf[64] = star.sc_rmag_quality as u8;
        buf[65] = star.sc_imag_quality as u8;
        for i in 0..10 {
            buf[66 + i] = star.catflag[i] as u8;
        }
        buf[76] = star.yale_g1 as u8;
        buf[77] = star.yale_c1 as u8;
        buf[78] = star.leda_flag as u8;
        buf[79] = star.twomass_ext_flag as u8;
        LittleEndian::write_i32(&mut buf[80..84], star.running_number);
        Ok(())
    }

    fn ra(star: &Ucac3Star) -> i32 {
        star.ra
    }

    fn dec_mas(star: &Ucac3Star) -> i32 {
        star.dec()
    }

    fn mag_mmag(star: &Ucac3Star) -> i32 {
        star.mag1 as i32
    }

    fn tycho_matched(star: &Ucac3Star) -> bool {
        star.catflag[CATFLAG_TYCHO] != 0
    }

    fn doubtful(star: &Ucac3Star) -> bool {
        star.twomass_id == 0
    }

    fn summarize(zone: i32, offset: u32, star: &Ucac3Star) -> StarSummary {
        StarSummary {
            zone,
            number: offset + 1,
            ra_deg: Self::ra_deg(star.ra),
            dec_deg: dec_deg_from_mas(star.dec()),
            mag: star.mag1 as f64 / 1000.0,
            epoch: star.epoch_year(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let star = Ucac3Star {
            ra: 987_654_321,
            spd: 200_000_000,
            mag1: 15_230,
            mag2: 15_250,
            mag_sigma: 30,
            obj_type: 0,
            double_star_flag: 0,
            ra_sigma: 45,
            dec_sigma: 48,
            n_ucac_total: 3,
            n_ucac_used: 3,
            n_cats_used: 4,
            n_cats_total: 4,
            epoch_ra: 10_150,
            epoch_dec: 10_175,
            pm_ra: -300,
            pm_dec: 150,
            pm_ra_sigma: 40,
            pm_dec_sigma: 42,
            twomass_id: 55_555,
            mag_j: 14_000,
            mag_h: 13_600,
            mag_k: 13_500,
            icq_flag: [0, 1, 2],
            e2mpho: [3, 4, 5],
            sc_bmag: 16_000,
            sc_rmag: 15_400,
            sc_imag: 15_100,
            sc_class: 1,
            sc_bmag_quality: 0,
            sc_rmag_quality: 0,
            sc_imag_quality: 0,
            catflag: [0, 1, 0, 0, 0, 0, 0, 0, 1, 0],
            yale_g1: 0,
            yale_c1: 0,
            leda_flag: 0,
            twomass_ext_flag: 0,
            running_number: 7_654_321,
        };
        let mut buf = [0u8; Ucac3::RECORD_SIZE];
        Ucac3::encode(&star, &mut buf).unwrap();
        assert_eq!(Ucac3::decode(&buf), star);
    }

    #[test]
    fn spd_converts_to_signed_dec() {
        let star = Ucac3Star {
            ra: 0,
            spd: 90 * 3_600_000 - 1_800_000,
            mag1: 0,
            mag2: 0,
            mag_sigma: 0,
            obj_type: 0,
            double_star_flag: 0,
            ra_sigma: 0,
            dec_sigma: 0,
            n_ucac_total: 0,
            n_ucac_used: 0,
            n_cats_used: 0,
            n_cats_total: 0,
            epoch_ra: 0,
            epoch_dec: 0,
            pm_ra: 0,
            pm_dec: 0,
            pm_ra_sigma: 0,
            pm_dec_sigma: 0,
            twomass_id: 0,
            mag_j: 0,
            mag_h: 0,
            mag_k: 0,
            icq_flag: [0; 3],
            e2mpho: [0; 3],
            sc_bmag: 0,
            sc_rmag: 0,
            sc_imag: 0,
            sc_class: 0,
            sc_bmag_quality: 0,
            sc_rmag_quality: 0,
            sc_imag_quality: 0,
            catflag: [0; 10],
            yale_g1: 0,
            yale_c1: 0,
            leda_flag: 0,
            twomass_ext_flag: 0,
            running_number: 0,
        };
        assert_eq!(star.dec(), -1_800_000);
        assert_eq!(Ucac3::dec_mas(&star), -1_800_000);
    }
}
