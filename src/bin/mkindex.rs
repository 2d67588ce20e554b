//! Build a sparse RA index (`ZIDX`) for a zone-partitioned catalog.
//!
//! The spaced layout records the RA of every Nth star per zone, so the
//! index grows with star density exactly where the extra checkpoints help.
//! A spacing of 10000 keeps the whole-catalog index a few megabytes while
//! always landing the search within 10000 records of the target. The
//! bucketed layout is the classic fixed RA grid; 1440 buckets matches the
//! historical quarter-degree index files.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};

use zonestar::catalogs::{
    cmc::{Cmc14, Cmc15},
    gaia::Gaia,
    ucac2::Ucac2,
    ucac3::Ucac3,
    ucac4::Ucac4,
    urat1::Urat1,
    CatalogLayout,
};
use zonestar::query::{
    locate::locate_zone, lower_bound, search::Bracket, write_index, IndexLayout, ZoneReader,
    ZoneTable, ACCEPTABLE_LIMIT,
};

#[derive(Clone, Copy, ValueEnum)]
enum CatalogArg {
    Gaia,
    Cmc14,
    Cmc15,
    Ucac2,
    Ucac3,
    Ucac4,
    Urat1,
}

#[derive(Clone, Copy, ValueEnum)]
enum LayoutArg {
    /// RA of every Nth record (adapts to star density)
    Spaced,
    /// Record offsets on a fixed RA grid
    Bucketed,
}

#[derive(Parser)]
#[command(name = "mkindex")]
#[command(about = "Build a sparse RA index for a zone-partitioned star catalog")]
#[command(version)]
struct Cli {
    /// Which catalog to index
    #[arg(long, value_enum)]
    catalog: CatalogArg,

    /// Base path holding the catalog data (defaults to the current directory)
    #[arg(long, default_value = "")]
    path: String,

    /// Where to write the index (defaults to the catalog's index file name)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Index layout
    #[arg(long, value_enum, default_value = "spaced")]
    layout: LayoutArg,

    /// Record spacing for the spaced layout
    #[arg(long, default_value = "10000")]
    spacing: u32,

    /// Bucket count for the bucketed layout
    #[arg(long, default_value = "1440")]
    buckets: u32,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.catalog {
        CatalogArg::Gaia => run::<Gaia>(&cli),
        CatalogArg::Cmc14 => run::<Cmc14>(&cli),
        CatalogArg::Cmc15 => run::<Cmc15>(&cli),
        CatalogArg::Ucac2 => run::<Ucac2>(&cli),
        CatalogArg::Ucac3 => run::<Ucac3>(&cli),
        CatalogArg::Ucac4 => run::<Ucac4>(&cli),
        CatalogArg::Urat1 => run::<Urat1>(&cli),
    }
}

fn run<C: CatalogLayout>(cli: &Cli) -> anyhow::Result<()> {
    anyhow::ensure!(cli.spacing >= 100, "spacing below 100 makes a huge index");
    anyhow::ensure!(cli.buckets >= 1, "at least one bucket required");

    let layout = match cli.layout {
        LayoutArg::Spaced => IndexLayout::Spaced {
            spacing: cli.spacing,
        },
        LayoutArg::Bucketed => IndexLayout::Bucketed {
            buckets: cli.buckets,
        },
    };
    let base = PathBuf::from(&cli.path);
    let n_zones = (C::LAST_ZONE - C::FIRST_ZONE + 1) as u64;

    let progress = ProgressBar::new(n_zones).with_style(ProgressStyle::with_template(
        "{bar:40} {pos}/{len} zones {msg}",
    )?);

    let mut zones = Vec::with_capacity(n_zones as usize);
    let mut total_stars = 0u64;
    for zone in C::FIRST_ZONE..=C::LAST_ZONE {
        progress.set_message(C::zone_file_name(zone));
        let entry = match locate_zone::<C>(&base, zone) {
            Some((path, file)) => {
                let mut reader = ZoneReader::<C>::new(path, file)?;
                total_stars += reader.record_count() as u64;
                match layout {
                    IndexLayout::Spaced { spacing } => spaced_zone(&mut reader, spacing)?,
                    IndexLayout::Bucketed { buckets } => bucketed_zone(&mut reader, buckets)?,
                }
            }
            // Catalogs with partial sky coverage index absent zones as empty.
            None => match layout {
                IndexLayout::Spaced { .. } => (0, ZoneTable::Spaced(Vec::new())),
                IndexLayout::Bucketed { buckets } => {
                    (0, ZoneTable::Bucketed(vec![0; buckets as usize + 1]))
                }
            },
        };
        zones.push(entry);
        progress.inc(1);
    }
    progress.finish_and_clear();

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(C::INDEX_FILE));
    let writer = BufWriter::new(File::create(&output)?);
    write_index(writer, layout, C::FIRST_ZONE, &zones)?;

    println!(
        "{}: indexed {} stars across {} zones into {:?}",
        C::NAME,
        total_stars,
        n_zones,
        output
    );
    Ok(())
}

/// RA of every `spacing`th record.
fn spaced_zone<C: CatalogLayout>(
    reader: &mut ZoneReader<C>,
    spacing: u32,
) -> anyhow::Result<(u32, ZoneTable)> {
    let count = reader.record_count();
    let mut checkpoints = Vec::new();
    let mut at = spacing;
    while at < count {
        checkpoints.push(reader.ra_at(at)?);
        at += spacing;
    }
    Ok((count, ZoneTable::Spaced(checkpoints)))
}

/// First record offset at or past each bucket boundary. Each boundary's
/// search starts from the previous boundary's answer, so the whole zone is
/// bracketed once, not `buckets` times.
fn bucketed_zone<C: CatalogLayout>(
    reader: &mut ZoneReader<C>,
    buckets: u32,
) -> anyhow::Result<(u32, ZoneTable)> {
    let count = reader.record_count();
    let ra_limit = C::ra_limit();

    let mut offsets = Vec::with_capacity(buckets as usize + 1);
    let mut prev_offset = 0u32;
    let mut prev_boundary = 0i32;
    for bucket in 0..buckets {
        let boundary = (bucket as i64 * ra_limit as i64 / buckets as i64) as i32;
        let bracket = Bracket {
            lo: prev_offset,
            lo_ra: prev_boundary,
            hi: count,
            hi_ra: ra_limit,
        };
        let offset = lower_bound(
            |off| reader.ra_at(off),
            count,
            boundary,
            bracket,
            ACCEPTABLE_LIMIT,
        )?;
        offsets.push(offset);
        prev_offset = offset;
        prev_boundary = boundary;
    }
    offsets.push(count);
    Ok((count, ZoneTable::Bucketed(offsets)))
}
