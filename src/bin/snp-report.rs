//! A binary to print the ranked report of a personal genome.
//!
//! ```shell
//! cargo run --release --bin=snp-report --features=binaries -- ~/.snpmatch
//! ```
//!
//! The data directory must already hold the knowledge cache (`rsidDict.json`)
//! and the personal-genotype cache (`snpDict.json`). When the personal genome
//! and the knowledge base use different builds, the UCSC chain files are read
//! from `<data>/chains` (or from `--chains`).

use std::io::Write as _;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use clap_verbosity_flag::Verbosity;
use snpmatch::core::ReferenceBuild;
use snpmatch::directory::DataDirectory;
use snpmatch::knowledge::Cache;
use snpmatch::liftover::ChainFileProvider;
use snpmatch::personal::PersonalData;
use snpmatch::report;
use snpmatch::report::Entry;
use snpmatch::resolver::Builder;
use tracing::info;
use tracing_log::AsTrace as _;
use tracing_subscriber::EnvFilter;

/// Prints the markers of a personal genome, most notable first.
#[derive(Parser)]
struct Args {
    /// The data directory.
    directory: PathBuf,

    /// If desired, a directory of chain files other than `<directory>/chains`.
    #[arg(short, long)]
    chains: Option<PathBuf>,

    /// The build assumed for knowledge-base records that don't name one.
    #[arg(long, default_value = "GRCh38", value_parser = parse_build)]
    default_build: ReferenceBuild,

    /// If desired, the maximum number of markers to print.
    #[arg(short, long)]
    limit: Option<usize>,

    #[command(flatten)]
    verbose: Verbosity,
}

/// Parses a build from its knowledge-base name (e.g., `GRCh37`).
fn parse_build(value: &str) -> Result<ReferenceBuild, String> {
    ReferenceBuild::match_label(value).ok_or_else(|| format!("unknown reference build: {value}"))
}

/// Writes one entry of the report.
fn write_entry(out: &mut impl std::io::Write, rank: usize, entry: &Entry) -> std::io::Result<()> {
    let orientation = entry
        .orientation
        .map(|orientation| orientation.to_string())
        .unwrap_or_else(|| String::from("unknown"));

    writeln!(
        out,
        "{rank}. {} {} [{}; orientation: {}]",
        entry.rsid,
        entry.genotype,
        entry.rank_key,
        orientation
    )?;

    if let Some(description) = &entry.description {
        writeln!(out, "   {description}")?;
    }

    if entry.orientation_changed {
        writeln!(out, "   ! {}", report::ORIENTATION_WARNING)?;
    }

    for (i, variant) in entry.variants.iter().enumerate() {
        let marker = if entry.matched == Some(i) { '*' } else { ' ' };
        writeln!(out, "   {marker} {}", report::describe_variant(variant))?;
    }

    Ok(())
}

fn run(args: &Args) -> Result<()> {
    let data = DataDirectory::new(args.directory.clone());

    let personal = PersonalData::load(data.personal_cache())
        .with_context(|| format!("loading personal data from {}", data.display()))?;
    let cache = Cache::open_current(data.knowledge_cache())
        .with_context(|| format!("loading knowledge cache from {}", data.display()))?;

    info!(
        "{} personal markers ({}), {} cached records",
        personal.len(),
        personal.reference_build(),
        cache.len()
    );

    let provider = match &args.chains {
        Some(chains) => ChainFileProvider::new(chains.clone()),
        None => data.chains(),
    };

    let mut resolver = Builder::default()
        .default_knowledge_base_build(args.default_build)
        .build(personal.reference_build(), provider);

    let entries = report::build(&cache, &personal, &mut resolver).context("building report")?;
    info!("{} markers in the report", entries.len());

    let limit = args.limit.unwrap_or(entries.len());
    let mut out = std::io::stdout().lock();

    for (i, entry) in entries.iter().take(limit).enumerate() {
        write_entry(&mut out, i + 1, entry).context("writing report")?;
    }

    out.flush().context("writing report")?;

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    match std::env::var("RUST_LOG") {
        Ok(_) => tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init(),
        Err(_) => tracing_subscriber::fmt()
            .with_max_level(args.verbose.log_level_filter().as_trace())
            .with_writer(std::io::stderr)
            .init(),
    };

    run(&args)
}
