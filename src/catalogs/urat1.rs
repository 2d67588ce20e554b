//! URAT1: 80-byte records, 900 zones of 0.2°, `ur1/z001`..`ur1/z900`.
//!
//! URAT observed from the northern hemisphere only; zone files below about
//! dec −15° do not exist and extraction just skips them.

use byteorder::{ByteOrder, LittleEndian};

use super::{dec_deg_from_mas, CatalogLayout, StarSummary, MAS_PER_DEG};
use crate::error::Result;

/// Layout marker for URAT1.
#[derive(Debug)]
pub struct Urat1;

const SPD_OFFSET: i32 = 90 * 3_600_000;

/// One URAT1 star, 80 bytes on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Urat1Star {
    /// Mean RA on ICRF at the URAT mean observation epoch, mas.
    pub ra: i32,
    /// South polar distance (dec + 90°), mas.
    pub spd: i32,
    /// Position errors from scatter and from the model, mas.
    pub sigs: i16,
    pub sigm: i16,
    /// Observation-set counts.
    pub nst: i8,
    pub nsu: i8,
    /// Mean observation epoch in milliyears since 2000.0.
    pub epoc: i16,
    /// Mean URAT model-fit magnitude, millimags.
    pub mmag: u16,
    /// Photometry error, millimags.
    pub sigp: i16,
    pub nsm: i8,
    pub r#ref: i8,
    /// Image counts.
    pub nit: i16,
    pub niu: i16,
    /// Grating observation counts.
    pub ngt: i8,
    pub ngu: i8,
    /// Proper motions from 2MASS, 0.1 mas/yr, with per-coordinate error.
    pub pmr: i16,
    pub pmd: i16,
    pub pme: i16,
    /// Match flags against 2MASS and APASS.
    pub mfm: i8,
    pub mfa: i8,
    /// 2MASS star identifier.
    pub id2: i32,
    /// 2MASS J/H/K magnitudes, millimags, with errors and flags.
    pub twomass_mag: [u16; 3],
    pub twomass_mag_sigma: [i16; 3],
    pub icc_flag: [i8; 3],
    pub photo_flag: [i8; 3],
    /// APASS B/V/g/r/i magnitudes, millimags, with errors.
    pub apass_mag: [u16; 5],
    pub apass_mag_sigma: [i16; 5],
    pub ann: i8,
    pub ano: i8,
}

impl Urat1Star {
    pub fn dec(&self) -> i32 {
        self.spd - SPD_OFFSET
    }

    pub fn epoch_year(&self) -> f64 {
        2000.0 + self.epoc as f64 / 1000.0
    }
}

impl CatalogLayout for Urat1 {
    type Star = Urat1Star;

    const NAME: &'static str = "urat1";
    const RECORD_SIZE: usize = 80;
    const ZONE_HEIGHT_DEG: f64 = 0.2;
    const FIRST_ZONE: i32 = 1;
    const LAST_ZONE: i32 = 900;
    const RA_UNITS_PER_DEG: i64 = MAS_PER_DEG;
    const DATA_SUBDIR: Option<&'static str> = Some("ur1");
    const INDEX_FILE: &'static str = "urat1.idx";

    fn zone_file_name(zone: i32) -> String {
        format!("z{:03}", zone)
    }

    fn decode(buf: &[u8]) -> Urat1Star {
        let mut twomass_mag = [0u16; 3];
        LittleEndian::read_u16_into(&buf[40..46], &mut twomass_mag);
        let mut twomass_mag_sigma = [0i16; 3];
        LittleEndian::read_i16_into(&buf[46..52], &mut twomass_mag_sigma);
        let mut apass_mag = [0u16; 5];
        LittleEndian::read_u16_into(&buf[58..68], &mut apass_mag);
        let mut apass_mag_sigma = [0i16; 5];
        LittleEndian::read_i16_into(&buf[68..78], &mut apass_mag_sigma);

        Urat1Star {
            ra: LittleEndian::read_i32(&buf[0..4]),
            spd: LittleEndian::read_i32(&buf[4..8]),
            sigs: LittleEndian::read_i16(&buf[8..10]),
            sigm: LittleEndian::read_i16(&buf[10..12]),
            nst: buf[12] as i8,
            nsu: buf[13] as i8,
            epoc: LittleEndian::read_i16(&buf[14..16]),
            mmag: LittleEndian::read_u16(&buf[16..18]),
            sigp: LittleEndian::read_i16(&buf[18..20]),
            nsm: buf[20] as i8,
            r#ref: buf[21] as i8,
            nit: LittleEndian::read_i16(&buf[22..24]),
            niu: LittleEndian::read_i16(&buf[24..26]),
            ngt: buf[26] as i8,
            ngu: buf[27] as i8,
            pmr: LittleEndian::read_i16(&buf[28..30]),
            pmd: LittleEndian::read_i16(&buf[30..32]),
            pme: LittleEndian::read_i16(&buf[32..34]),
            mfm: buf[34] as i8,
            mfa: buf[35] as i8,
            id2: LittleEndian::read_i32(&buf[36..40]),
            twomass_mag,
            twomass_mag_sigma,
            icc_flag: [buf[52] as i8, buf[53] as i8, buf[54] as i8],
            photo_flag: [buf[55] as i8, buf[56] as i8, buf[57] as i8],
            apass_mag,
            apass_mag_sigma,
            ann: buf[78] as i8,
            ano: buf[79] as i8,
        }
    }

    fn encode(star: &Urat1Star, buf: &mut [u8]) -> Result<()> {
        LittleEndian::write_i32(&mut buf[0..4], star.ra);
        LittleEndian::write_i32(&mut buf[4..8], star.spd);
        LittleEndian::write_i16(&mut buf[8..10], star.sigs);
        LittleEndian::write_i16(&mut buf[10..12], star.sigm);
        buf[12] = star.nst as u8;
        buf[13] = star.nsu as u8;
        LittleEndian::write_i16(&mut buf[14..16], star.epoc);
        LittleEndian::write_u16(&mut buf[16..18], star.mmag);
        LittleEndian::write_i16(&mut buf[18..20], star.sigp);
        buf[20] = star.nsm as u8;
        buf[21] = star.r#ref as u8;
        LittleEndian::write_i16(&mut buf[22..24], star.nit);
        LittleEndian::write_i16(&mut buf[24..26], star.niu);
        buf[26] = star.ngt as u8;
        buf[27] = star.ngu as u8;
        LittleEndian::write_i16(&mut buf[28..30], star.pmr);
        LittleEndian::write_i16(&mut buf[30..32], star.pmd);
        LittleEndian::write_i16(&mut buf[32..34], star.pme);
        buf[34] = star.mfm as u8;
        buf[35] = star.mfa as u8;
        LittleEndian::write_i32(&mut buf[36..40], star.id2);
        LittleEndian::write_u16_into(&star.twomass_mag, &mut buf[40..46]);
        LittleEndian::write_i16_into(&star.twomass_mag_sigma, &mut buf[46..52]);
        for i in 0..3 {
            buf[52 + i] = star.icc_flag[i] as u8;
            buf[55 + i] = star.photo_flag[i] as u8;
        }
        LittleEndian::write_u16_into(&star.apass_mag, &mut buf[58..68]);
        LittleEndian::write_i16_into(&star.apass_mag_sigma, &mut buf[68..78]);
        buf[78] = star.ann as u8;
        buf[79] = star.ano as u8;
        Ok(())
    }

    fn ra(star: &Urat1Star) -> i32 {
        star.ra
    }

    fn dec_mas(star: &Urat1Star) -> i32 {
        star.dec()
    }

    fn mag_mmag(star: &Urat1Star) -> i32 {
        star.mmag as i32
    }

    fn summarize(zone: i32, offset: u32, star: &Urat1Star) -> StarSummary {
        StarSummary {
            zone,
            number: offset + 1,
            ra_deg: Self::ra_deg(star.ra),
            dec_deg: dec_deg_from_mas(star.dec()),
            mag: star.mmag as f64 / 1000.0,
            epoch: star.epoch_year(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let star = Urat1Star {
            ra: 700_000_001,
            spd: 400_000_002,
            sigs: 15,
            sigm: 18,
            nst: 5,
            nsu: 4,
            epoc: 13_700,
            mmag: 14_210,
            sigp: 25,
            nsm: 4,
            r#ref: 1,
            nit: 22,
            niu: 20,
            ngt: 2,
            ngu: 1,
            pmr: -88,
            pmd: 41,
            pme: 55,
            mfm: 1,
            mfa: 1,
            id2: 99_999_999,
            twomass_mag: [13_000, 12_600, 12_500],
            twomass_mag_sigma: [21, 22, 23],
            icc_flag: [0, 0, 0],
            photo_flag: [1, 1, 1],
            apass_mag: [15_000, 14_500, 14_800, 14_300, 14_100],
            apass_mag_sigma: [30, 31, 32, 33, 34],
            ann: 3,
            ano: 12,
        };
        let mut buf = [0u8; Urat1::RECORD_SIZE];
        Urat1::encode(&star, &mut buf).unwrap();
        assert_eq!(Urat1::decode(&buf), star);
    }

    #[test]
    fn zone_layout() {
        assert_eq!(Urat1::zone_containing(-14.9), 376);
        assert_eq!(Urat1::zone_file_name(376), "z376");
        assert_eq!(Urat1::DATA_SUBDIR, Some("ur1"));
    }
}
