//! Extract stars in an RA/dec rectangle from a zone-partitioned catalog.

use std::io::Write;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};

use zonestar::catalogs::{
    cmc::{Cmc14, Cmc15},
    gaia::Gaia,
    ucac2::Ucac2,
    ucac3::Ucac3,
    ucac4::Ucac4,
    urat1::Urat1,
    CatalogLayout, StarSummary,
};
use zonestar::query::{read_star, ExtractFilter, ExtractSession, RectangleQuery};

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
enum OutputFormat {
    Table,
    Csv,
    Json,
    /// Re-encoded binary records, unchanged from the zone file layout.
    Raw,
}

#[derive(Parser)]
#[command(name = "extract")]
#[command(about = "Extract stars in an RA/dec rectangle from binary star catalogs")]
#[command(version)]
struct Cli {
    /// Which catalog to read
    #[arg(long, value_enum)]
    catalog: CatalogArg,

    /// Base path holding the catalog data (defaults to the current directory)
    #[arg(long, default_value = "")]
    path: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract every star in a rectangle
    Rect {
        /// Center right ascension, degrees
        ra: f64,
        /// Center declination, degrees
        dec: f64,
        /// Rectangle width in RA, degrees
        #[arg(long, default_value = "1.0")]
        width: f64,
        /// Rectangle height in dec, degrees
        #[arg(long, default_value = "1.0")]
        height: f64,
        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
        /// Drop stars matched against Tycho
        #[arg(long)]
        omit_tycho: bool,
        /// Keep stars without a 2MASS cross-match
        #[arg(long)]
        include_doubtfuls: bool,
        /// Print search timing to stderr
        #[arg(long)]
        timing: bool,
    },
    /// Fetch one star by zone and 1-based record number
    Star { zone: i32, number: u32 },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.catalog {
        CatalogArg::Gaia => run::<Gaia>(cli),
        CatalogArg::Cmc14 => run::<Cmc14>(cli),
        CatalogArg::Cmc15 => run::<Cmc15>(cli),
        CatalogArg::Ucac2 => run::<Ucac2>(cli),
        CatalogArg::Ucac3 => run::<Ucac3>(cli),
        CatalogArg::Ucac4 => run::<Ucac4>(cli),
        CatalogArg::Urat1 => run::<Urat1>(cli),
    }
}

fn run<C: CatalogLayout>(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Rect {
            ra,
            dec,
            width,
            height,
            format,
            omit_tycho,
            include_doubtfuls,
            timing,
        } => {
            let query = RectangleQuery::new(ra, dec, width, height);
            let mut session = ExtractSession::<C>::open(&cli.path)?;
            session.filter = ExtractFilter {
                omit_tycho,
                include_doubtfuls,
            };

            let start = timing.then(Instant::now);
            let count = match format {
                OutputFormat::Raw => print_raw(&mut session, &query)?,
                _ => {
                    let mut rows = Vec::new();
                    let count = session.extract(&query, |zone, offset, star| {
                        rows.push(C::summarize(zone, offset, star));
                    })?;
                    print_rows(&rows, format)?;
                    count
                }
            };

            if let Some(started) = start {
                eprintln!(
                    "{} stars in {:.2} ms ({:.2} ms searching, {} zones, index: {})",
                    count,
                    started.elapsed().as_secs_f64() * 1000.0,
                    session.stats.time_searching.as_secs_f64() * 1000.0,
                    session.stats.zones_scanned,
                    if session.has_index() { "yes" } else { "no" },
                );
            }
        }
        Commands::Star { zone, number } => {
            anyhow::ensure!(number >= 1, "record numbers are 1-based");
            match read_star::<C>(&cli.path, zone, number - 1)? {
                Some(star) => print_table(&[C::summarize(zone, number - 1, &star)]),
                None => anyhow::bail!("no record {} in zone {}", number, zone),
            }
        }
    }
    Ok(())
}

fn print_raw<C: CatalogLayout>(
    session: &mut ExtractSession<C>,
    query: &RectangleQuery,
) -> anyhow::Result<u64> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut buf = vec![0u8; C::RECORD_SIZE];
    let mut encode_err = None;
    let count = session.extract(query, |_, _, star| {
        if encode_err.is_some() {
            return;
        }
        match C::encode(star, &mut buf) {
            Ok(()) => {
                let _ = out.write_all(&buf);
            }
            Err(err) => encode_err = Some(err),
        }
    })?;
    if let Some(err) = encode_err {
        return Err(err.into());
    }
    Ok(count)
}

fn print_rows(rows: &[StarSummary], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => print_table(rows),
        OutputFormat::Csv => {
            println!("zone,number,ra_deg,dec_deg,mag,epoch");
            for row in rows {
                println!(
                    "{},{},{:.8},{:.8},{:.3},{:.3}",
                    row.zone, row.number, row.ra_deg, row.dec_deg, row.mag, row.epoch
                );
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(rows)?),
        OutputFormat::Raw => unreachable!("raw output never builds summary rows"),
    }
    Ok(())
}

fn print_table(rows: &[StarSummary]) {
    for row in rows {
        println!(
            "{:03}-{:08} RA={:12.8}° Dec={:+12.8}° Mag={:6.3} Epoch={:8.3}",
            row.zone, row.number, row.ra_deg, row.dec_deg, row.mag, row.epoch
        );
    }
    if rows.is_empty() {
        println!("No stars found in the rectangle.");
    } else {
        println!("\nTotal stars: {}", rows.len());
    }
}
