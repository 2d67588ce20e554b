//! Clamped secant search over RA-sorted records.
//!
//! Plain binary search works here, but the RA distribution within a zone is
//! smooth enough that linear interpolation usually lands close to the
//! target. Pure interpolation has a failure mode, though: where the star
//! density is very uneven (Gaia's sky coverage especially) the interpolated
//! step can shrink to almost nothing and convergence degrades to a crawl.
//! Each probe is therefore clamped to consume at least one eighth of the
//! bracket, which bounds the iteration count at O(log N) while keeping the
//! near-one-probe behavior on smooth stretches.
//!
//! The search stops once the bracket holds at most [`ACCEPTABLE_LIMIT`]
//! records; the caller's linear scan filters the handful of leading records
//! below the target RA, so a tighter stop would buy nothing.

use crate::error::Result;

/// Bracket size at which refinement stops and the linear scan takes over.
pub const ACCEPTABLE_LIMIT: u32 = 40;

/// A half-open search bracket: records in `lo..hi`, with `lo_ra`/`hi_ra`
/// the best known RA bounds at the edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bracket {
    pub lo: u32,
    pub lo_ra: i32,
    pub hi: u32,
    pub hi_ra: i32,
}

impl Bracket {
    /// The no-index bracket: the whole zone, RA bounds 0 and 360°.
    pub fn whole_zone(n_records: u32, ra_limit: i32) -> Self {
        Bracket {
            lo: 0,
            lo_ra: 0,
            hi: n_records,
            hi_ra: ra_limit,
        }
    }

    /// Number of records still inside the bracket.
    pub fn len(&self) -> u32 {
        self.hi - self.lo
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Narrows `bracket` around `target_ra` until it holds at most `limit`
/// records, returning the bracket's final low offset.
///
/// `read_ra` reads the RA sort key of the record at an offset. Every record
/// before the returned offset has RA < `target_ra`, and the first record
/// with RA ≥ `target_ra` lies within `limit` records after it.
///
/// A bracket whose RA bounds are inverted (possible on the very first probe
/// with a stale index) interpolates to the midpoint; the probe result
/// restores the invariant.
pub fn refine<F>(mut read_ra: F, target_ra: i32, mut bracket: Bracket, limit: u32) -> Result<u32>
where
    F: FnMut(u32) -> Result<i32>,
{
    let limit = limit.max(1);
    while bracket.len() > limit {
        let delta = bracket.len();
        let bite = delta / 8 + 1;
        let step = if bracket.hi_ra > bracket.lo_ra {
            // 64-bit: delta * (target - lo_ra) can exceed 2^31 comfortably.
            let num = (target_ra as i64 - bracket.lo_ra as i64).max(0) as u64;
            let den = (bracket.hi_ra as i64 - bracket.lo_ra as i64) as u64;
            (delta as u64 * num / den).min(delta as u64) as u32
        } else {
            delta / 2
        };
        let probe = bracket.lo + step.clamp(bite, delta - bite);

        let ra = read_ra(probe)?;
        if ra < target_ra {
            bracket.lo = probe;
            bracket.lo_ra = ra;
        } else {
            bracket.hi = probe;
            bracket.hi_ra = ra;
        }
    }
    Ok(bracket.lo)
}

/// Exact lower bound: the first offset whose record has RA ≥ `target_ra`,
/// or `n_records` if every record is below it.
///
/// Refines the bracket, then advances linearly through the residue. Used
/// where the exact boundary matters (bucket index construction, repeated
/// point queries); rectangle extraction scans from the refined offset
/// directly and lets its RA filter do this work.
pub fn lower_bound<F>(
    mut read_ra: F,
    n_records: u32,
    target_ra: i32,
    bracket: Bracket,
    limit: u32,
) -> Result<u32>
where
    F: FnMut(u32) -> Result<i32>,
{
    let mut offset = refine(&mut read_ra, target_ra, bracket, limit)?;
    while offset < n_records && read_ra(offset)? < target_ra {
        offset += 1;
    }
    Ok(offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    /// read_ra over an in-memory RA table.
    fn table(ras: &[i32]) -> impl FnMut(u32) -> Result<i32> + '_ {
        move |offset| Ok(ras[offset as usize])
    }

    fn uniform_zone(n: usize) -> Vec<i32> {
        (0..n).map(|i| (i as i64 * 1_296_000_000 / n as i64) as i32).collect()
    }

    #[test]
    fn lower_bound_matches_linear_scan() {
        let ras: Vec<i32> = vec![5, 5, 10, 20, 20, 20, 35, 90, 90, 120];
        let n = ras.len() as u32;
        for target in [0, 5, 6, 20, 21, 90, 120, 121] {
            let expected = ras.iter().take_while(|&&ra| ra < target).count() as u32;
            let got = lower_bound(
                table(&ras),
                n,
                target,
                Bracket::whole_zone(n, 1_296_000_000),
                2,
            )
            .unwrap();
            assert_eq!(got, expected, "target {}", target);
        }
    }

    #[test]
    fn lower_bound_at_extremes() {
        let ras = uniform_zone(1000);
        let n = ras.len() as u32;
        let whole = Bracket::whole_zone(n, 1_296_000_000);

        // Below the first record: offset 0.
        assert_eq!(lower_bound(table(&ras), n, -5, whole, 40).unwrap(), 0);
        assert_eq!(lower_bound(table(&ras), n, 0, whole, 40).unwrap(), 0);
        // Beyond the last record: offset N.
        assert_eq!(
            lower_bound(table(&ras), n, 1_295_999_999, whole, 40).unwrap(),
            n
        );
    }

    #[test]
    fn refine_result_is_within_limit_of_lower_bound() {
        let ras = uniform_zone(5000);
        let n = ras.len() as u32;
        let mut rng = rand::rng();
        for _ in 0..200 {
            let target: i32 = rng.random_range(0..1_296_000_000);
            let whole = Bracket::whole_zone(n, 1_296_000_000);
            let start = refine(table(&ras), target, whole, ACCEPTABLE_LIMIT).unwrap();
            let exact = ras.iter().take_while(|&&ra| ra < target).count() as u32;
            assert!(start <= exact, "start {} past lower bound {}", start, exact);
            assert!(
                exact - start <= ACCEPTABLE_LIMIT,
                "residue {} exceeds limit",
                exact - start
            );
        }
    }

    #[test]
    fn each_iteration_takes_a_minimum_bite() {
        // One probe must shrink any bracket by at least delta/8 + 1,
        // whatever the RA bounds and target are.
        let mut rng = rand::rng();
        for _ in 0..500 {
            let n: u32 = rng.random_range(41..100_000);
            let lo_ra: i32 = rng.random_range(0..1_000_000_000);
            let hi_ra: i32 = rng.random_range(lo_ra + 1..1_296_000_000);
            let target: i32 = rng.random_range(lo_ra..=hi_ra);
            let bracket = Bracket {
                lo: 0,
                lo_ra,
                hi: n,
                hi_ra,
            };

            // Stop after exactly one probe by failing the second read.
            let mut probes = Vec::new();
            let result = refine(
                |offset| {
                    probes.push(offset);
                    if probes.len() > 1 {
                        Err(std::io::Error::other("stop").into())
                    } else {
                        Ok(if offset < n / 2 { lo_ra } else { hi_ra })
                    }
                },
                target,
                bracket,
                ACCEPTABLE_LIMIT,
            );
            let _ = result;

            let probe = probes[0];
            let bite = n / 8 + 1;
            assert!(probe >= bite, "probe {} below bite {} (n {})", probe, bite, n);
            assert!(
                probe <= n - bite,
                "probe {} above {} (n {})",
                probe,
                n - bite,
                n
            );
        }
    }

    #[test]
    fn degenerate_bracket_still_converges() {
        // A stale index can hand us lo_ra == hi_ra; the midpoint fallback
        // must still make progress.
        let ras = uniform_zone(1000);
        let n = ras.len() as u32;
        let stale = Bracket {
            lo: 0,
            lo_ra: 500,
            hi: n,
            hi_ra: 500,
        };
        let start = refine(table(&ras), 648_000_000, stale, 40).unwrap();
        let exact = ras.iter().take_while(|&&ra| ra < 648_000_000).count() as u32;
        assert!(start <= exact && exact - start <= 40);
    }

    #[test]
    fn tiny_zone_needs_no_probes() {
        let got = refine(
            |_| panic!("no probe expected"),
            25,
            Bracket::whole_zone(3, 1_296_000_000),
            40,
        )
        .unwrap();
        assert_eq!(got, 0);
    }
}
