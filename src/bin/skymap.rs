//! Build and render an all-sky brightness map from a star catalog.
//!
//! `build` scans every record of the chosen zones into the 3600×1800 grid,
//! saving after each zone so an interrupted run can resume where it left
//! off — rerunning over zones already in the map double-counts them, so
//! resume with a zone range that starts after the last completed zone.
//! `render` turns a saved map into an 8-bit PGM.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};

use zonestar::bright::{AccumulateMode, BrightnessMap, DEFAULT_MAG_LIMIT};
use zonestar::catalogs::{
    cmc::{Cmc14, Cmc15},
    gaia::Gaia,
    ucac2::Ucac2,
    ucac3::Ucac3,
    ucac4::Ucac4,
    urat1::Urat1,
    CatalogLayout,
};
use zonestar::query::{locate::locate_zone, ZoneReader};

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

#[derive(Parser)]
#[command(name = "skymap")]
#[command(about = "All-sky brightness map from zone-partitioned star catalogs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Accumulate catalog zones into a brightness map
    Build {
        /// Which catalog to scan
        #[arg(long, value_enum, default_value = "gaia")]
        catalog: CatalogArg,

        /// Base path holding the catalog data
        #[arg(long, default_value = "")]
        path: String,

        /// Map file to create or resume
        #[arg(long, default_value = "bright.zq")]
        map: PathBuf,

        /// Count stars instead of summing flux
        #[arg(long)]
        count: bool,

        /// Magnitude cutoff in millimags
        #[arg(long, default_value_t = DEFAULT_MAG_LIMIT)]
        mag_limit: i32,

        /// First zone to scan (defaults to the catalog's first)
        #[arg(long)]
        first_zone: Option<i32>,

        /// Last zone to scan (defaults to the catalog's last)
        #[arg(long)]
        last_zone: Option<i32>,
    },
    /// Render a saved map as an 8-bit PGM
    Render {
        /// Map file to read
        #[arg(long, default_value = "bright.zq")]
        map: PathBuf,

        /// Output image
        #[arg(long, default_value = "bright.pgm")]
        output: PathBuf,

        /// Cell value that maps to full white (before cos-dec correction)
        #[arg(long, default_value = "200")]
        scale: i32,

        /// Cell value subtracted before scaling
        #[arg(long, default_value = "0")]
        offset: i32,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Build { catalog, .. } => match catalog {
            CatalogArg::Gaia => build::<Gaia>(&cli.command),
            CatalogArg::Cmc14 => build::<Cmc14>(&cli.command),
            CatalogArg::Cmc15 => build::<Cmc15>(&cli.command),
            CatalogArg::Ucac2 => build::<Ucac2>(&cli.command),
            CatalogArg::Ucac3 => build::<Ucac3>(&cli.command),
            CatalogArg::Ucac4 => build::<Ucac4>(&cli.command),
            CatalogArg::Urat1 => build::<Urat1>(&cli.command),
        },
        Commands::Render {
            map,
            output,
            scale,
            offset,
        } => render(map, output, *scale, *offset),
    }
}

fn build<C: CatalogLayout>(command: &Commands) -> anyhow::Result<()> {
    let Commands::Build {
        path,
        map: map_path,
        count,
        mag_limit,
        first_zone,
        last_zone,
        ..
    } = command
    else {
        unreachable!()
    };

    let mode = if *count {
        AccumulateMode::Count
    } else {
        AccumulateMode::Flux
    };
    let first = (*first_zone).unwrap_or(C::FIRST_ZONE).max(C::FIRST_ZONE);
    let last = (*last_zone).unwrap_or(C::LAST_ZONE).min(C::LAST_ZONE);
    anyhow::ensure!(first <= last, "empty zone range {}..{}", first, last);

    let mut map = BrightnessMap::new(mode, *mag_limit);
    if map.load(map_path)? {
        println!("Resuming from {:?}", map_path);
    }

    let base = PathBuf::from(path);
    let progress = ProgressBar::new((last - first + 1) as u64).with_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} zones {msg}")?,
    );

    let mut total = 0u64;
    for zone in first..=last {
        progress.set_message(C::zone_file_name(zone));
        if let Some((zone_path, file)) = locate_zone::<C>(&base, zone) {
            let mut reader = ZoneReader::<C>::new(zone_path, file)?;
            total += map.accumulate_zone(&mut reader)?;
            map.save(map_path)?;
        } else {
            log::debug!("{}: zone {} absent, skipped", C::NAME, zone);
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    println!(
        "{}: accumulated {} stars into {:?} (zones {}..={})",
        C::NAME,
        total,
        map_path,
        first,
        last
    );
    Ok(())
}

fn render(map_path: &PathBuf, output: &PathBuf, scale: i32, offset: i32) -> anyhow::Result<()> {
    anyhow::ensure!(scale > 0, "scale must be positive");

    let mut map = BrightnessMap::new(AccumulateMode::Count, DEFAULT_MAG_LIMIT);
    anyhow::ensure!(map.load(map_path)?, "no map at {:?}", map_path);

    let writer = BufWriter::new(File::create(output)?);
    map.render_pgm(writer, scale, offset)?;
    println!("Rendered {:?}", output);
    Ok(())
}
