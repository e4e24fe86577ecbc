//! Command line front-end: cross-match, duplicate search and submission history
//! over CSV observation exports.

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use std::process::ExitCode;
use tracing::{error, info, warn};

use mpcq::{
    observations::{
        csv_reader::read_observations_file,
        display::{
            duplicate_rows, match_rows, submission_rows, to_json, DuplicateTable, MatchTable,
            SubmissionTable,
        },
    },
    Designation, InMemorySource, Mpcq, MpcqConfig, MpcqError, Tolerance,
};

#[derive(Parser)]
#[command(name = "mpcq")]
#[command(about = "Cross-match and de-duplicate MPC astrometric observations")]
#[command(version)]
struct Cli {
    /// TOML configuration file (tolerances, worker count)
    #[arg(long, global = true)]
    config: Option<Utf8PathBuf>,

    /// Number of worker threads (0 = one per logical CPU)
    #[arg(long, global = true)]
    workers: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Match input observations against a reference export
    CrossMatch(CrossMatchArgs),

    /// Find observations reported more than once
    Duplicates(DuplicatesArgs),

    /// Summarize the submissions of objects
    Submissions(SubmissionsArgs),
}

#[derive(Args)]
struct ToleranceArgs {
    /// Time tolerance in seconds
    #[arg(long)]
    time_tolerance: Option<f64>,

    /// Angular tolerance in arcseconds
    #[arg(long)]
    angle_tolerance: Option<f64>,
}

impl ToleranceArgs {
    fn apply(&self, base: Tolerance) -> Result<Tolerance, MpcqError> {
        Tolerance::new(
            self.time_tolerance
                .unwrap_or(base.time_tolerance_seconds()),
            self.angle_tolerance
                .unwrap_or(base.angle_tolerance_arcsec()),
        )
    }
}

#[derive(Args)]
struct CrossMatchArgs {
    /// Reference observations (CSV)
    #[arg(long)]
    reference: Utf8PathBuf,

    /// Observations to match (CSV)
    #[arg(long)]
    input: Utf8PathBuf,

    #[command(flatten)]
    tolerance: ToleranceArgs,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct DuplicatesArgs {
    /// Observations to search (CSV)
    #[arg(long)]
    reference: Utf8PathBuf,

    /// Objects to search; every object of the file when omitted
    designations: Vec<String>,

    #[command(flatten)]
    tolerance: ToleranceArgs,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct SubmissionsArgs {
    /// Observations to summarize (CSV)
    #[arg(long)]
    reference: Utf8PathBuf,

    /// Objects to summarize; every object of the file when omitted
    designations: Vec<String>,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

fn load_config(cli: &Cli) -> Result<MpcqConfig, MpcqError> {
    let mut config = match &cli.config {
        Some(path) => MpcqConfig::from_file(path)?,
        None => MpcqConfig::default(),
    };
    if let Some(workers) = cli.workers {
        config = config.with_workers(workers);
    }
    Ok(config)
}

fn designations_or_all(raw: &[String], source: &InMemorySource) -> Vec<Designation> {
    if raw.is_empty() {
        source.designations()
    } else {
        raw.iter().map(|d| Designation::from(d.as_str())).collect()
    }
}

fn cross_match(config: MpcqConfig, args: &CrossMatchArgs) -> Result<(), MpcqError> {
    let tolerance = args.tolerance.apply(config.crossmatch)?;
    let engine = Mpcq::new(InMemorySource::from_csv(&args.reference)?, config);

    let loaded = read_observations_file(&args.input)?;
    if !loaded.rejected.is_empty() {
        warn!(rejected = loaded.rejected.len(), "Some input rows were rejected");
    }

    let report = engine.cross_match(&loaded.observations, &tolerance)?;
    for failure in &report.failures {
        error!(designation = %failure.designation, error = %failure.error, "Object not matched");
    }

    if args.json {
        println!("{}", to_json(&match_rows(&report.results))?);
    } else {
        println!("{}", MatchTable::new(&report.results));
    }
    Ok(())
}

fn duplicates(config: MpcqConfig, args: &DuplicatesArgs) -> Result<(), MpcqError> {
    let tolerance = args.tolerance.apply(config.duplicates)?;
    let engine = Mpcq::new(InMemorySource::from_csv(&args.reference)?, config);
    let designations = designations_or_all(&args.designations, engine.source());

    let outcomes = engine.find_duplicates_batch(&designations, &tolerance)?;

    let mut rows = Vec::new();
    for outcome in &outcomes {
        match &outcome.result {
            Ok(groups) if args.json => rows.extend(duplicate_rows(&outcome.designation, groups)),
            Ok(groups) => {
                println!("{} – {} duplicate group(s)", outcome.designation, groups.len());
                if !groups.is_empty() {
                    println!("{}", DuplicateTable::new(&outcome.designation, groups));
                }
            }
            Err(err) => error!(designation = %outcome.designation, %err, "Duplicate search failed"),
        }
    }
    if args.json {
        println!("{}", to_json(&rows)?);
    }
    Ok(())
}

fn submissions(config: MpcqConfig, args: &SubmissionsArgs) -> Result<(), MpcqError> {
    let engine = Mpcq::new(InMemorySource::from_csv(&args.reference)?, config);
    let designations = designations_or_all(&args.designations, engine.source());

    let summaries = engine.submission_history(&designations)?;
    if args.json {
        println!("{}", to_json(&submission_rows(&summaries))?);
    } else {
        println!("{}", SubmissionTable::new(&summaries));
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), MpcqError> {
    let config = load_config(&cli)?;
    info!(
        crossmatch = %config.crossmatch,
        duplicates = %config.duplicates,
        workers = config.engine.workers,
        "Configuration loaded"
    );

    match &cli.command {
        Commands::CrossMatch(args) => cross_match(config, args),
        Commands::Duplicates(args) => duplicates(config, args),
        Commands::Submissions(args) => submissions(config, args),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
