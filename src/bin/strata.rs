//! Strata Binary
//!
//! Runs command scripts against a data directory and inspects indexes.

use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use strata::{Config, Engine, FieldOverflowPolicy, Session};
use tracing_subscriber::{fmt, EnvFilter};

/// Strata record store
#[derive(Parser, Debug)]
#[command(name = "strata")]
#[command(about = "Typed record store with a B+ tree index over paged segment files")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./strata_data", global = true)]
    data_dir: PathBuf,

    /// Maximum keys per index node
    #[arg(long, default_value = "4", global = true)]
    fanout: usize,

    /// Page size in bytes
    #[arg(long, default_value = "2000", global = true)]
    page_size: usize,

    /// Pages per segment file
    #[arg(long, default_value = "10", global = true)]
    pages_per_segment: usize,

    /// Fixed width of every field in bytes
    #[arg(long, default_value = "20", global = true)]
    field_width: usize,

    /// Truncate over-long field values instead of rejecting the record
    #[arg(long, global = true)]
    truncate: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Execute a command script
    Run {
        /// Script with one command per line
        input: PathBuf,

        /// File receiving SEARCH/LIST/FILTER output
        output: PathBuf,
    },

    /// Print the index shape of a type
    Show {
        /// Type name
        type_name: String,
    },

    /// List registered types with their index statistics
    Types,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,strata=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    tracing::info!("Strata v{}", strata::VERSION);
    tracing::info!("Data directory: {}", args.data_dir.display());

    let policy = if args.truncate {
        FieldOverflowPolicy::Truncate
    } else {
        FieldOverflowPolicy::Reject
    };
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .fanout(args.fanout)
        .page_size(args.page_size)
        .pages_per_segment(args.pages_per_segment)
        .field_width(args.field_width)
        .overflow_policy(policy)
        .build();

    if let Err(e) = dispatch(args.command, config) {
        tracing::error!("{}", e);
        process::exit(1);
    }
}

fn dispatch(command: Commands, config: Config) -> strata::Result<()> {
    let engine = Engine::open(config)?;

    match command {
        Commands::Run { input, output } => {
            let reader = BufReader::new(File::open(&input)?);
            let writer = BufWriter::new(File::create(&output)?);

            let mut session = Session::new(engine, writer)?;
            session.run(reader)?;
            let (summary, _) = session.finish()?;

            tracing::info!(
                succeeded = summary.succeeded,
                failed = summary.failed,
                "script finished"
            );
        }
        Commands::Show { type_name } => {
            let Some(tree) = engine.tree(&type_name) else {
                eprintln!("unknown type '{}'", type_name);
                process::exit(2);
            };
            print!("{}", tree.render());
        }
        Commands::Types => {
            for name in engine.list_types() {
                let (Some(tree), Some(schema)) = (engine.tree(&name), engine.schema(&name)) else {
                    continue;
                };
                let stats = tree.stats();
                println!(
                    "{}\trecords={}\tdepth={}\tsplits={}\tfusions={}\tsegment={}",
                    name,
                    tree.len(),
                    tree.depth(),
                    stats.splits,
                    stats.fusions,
                    schema.active_segment
                );
            }
        }
    }
    Ok(())
}
