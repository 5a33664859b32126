//! fileslice-cat
//!
//! Prints the merged view of a file slice: an optional base file overlaid
//! with any number of delta logs.

use std::path::PathBuf;

use clap::Parser;
use fileslice::base::BaseFile;
use fileslice::config::SimpleKeyFields;
use fileslice::log::DeltaLogScanner;
use fileslice::{BaseFileReader, Config, MergeMode, SliceReader};
use tracing_subscriber::{fmt, EnvFilter};

/// Print the reconciled records of a file slice
#[derive(Parser, Debug)]
#[command(name = "fileslice-cat")]
#[command(about = "Merge a base file with its delta logs and print the result")]
#[command(version)]
struct Args {
    /// Base file (omit for log-only slices)
    #[arg(short, long)]
    base: Option<PathBuf>,

    /// Delta log files, oldest first
    #[arg(short, long = "log")]
    logs: Vec<PathBuf>,

    /// Merge mode: overwrite, event-time or partial
    #[arg(short, long, default_value = "event-time")]
    merge: String,

    /// Ordering (pre-combine) column
    #[arg(short, long)]
    ordering_field: Option<String>,

    /// Record key column (requires --partition-field)
    #[arg(long, requires = "partition_field")]
    key_field: Option<String>,

    /// Partition path column
    #[arg(long, requires = "key_field")]
    partition_field: Option<String>,

    /// Populate operations from the `_operation` column
    #[arg(long)]
    with_operation_field: bool,

    /// Force this partition path onto every record
    #[arg(long)]
    partition_override: Option<String>,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,fileslice=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> fileslice::Result<()> {
    let merge_mode: MergeMode = args.merge.parse()?;

    let mut builder = Config::builder()
        .merge_mode(merge_mode)
        .with_operation_field(args.with_operation_field);
    if let Some(field) = args.ordering_field {
        builder = builder.ordering_field(field);
    }
    if let (Some(key), Some(partition)) = (args.key_field, args.partition_field) {
        builder = builder.simple_key_fields(SimpleKeyFields::new(key, partition));
    }
    if let Some(name) = args.partition_override {
        builder = builder.partition_name_override(name);
    }
    let config = builder.build();

    let mut scanner = DeltaLogScanner::scan(args.logs.as_slice(), &config)?;
    tracing::info!(
        logs = args.logs.len(),
        changes = scanner.stats().records_read + scanner.stats().deletes_read,
        "Scanned delta logs"
    );

    let base = match &args.base {
        Some(path) => Some(BaseFile::open(path)?),
        None => None,
    };

    let schema = match (&base, scanner.schema()) {
        (Some(base), _) => base.schema().clone(),
        (None, Some(schema)) => schema.clone(),
        (None, None) => {
            return Err(fileslice::SliceError::Config(
                "No base file and no data blocks: cannot determine schema".to_string(),
            ))
        }
    };

    let base = base.map(|b| Box::new(b) as Box<dyn BaseFileReader>);
    let mut reader = SliceReader::new(base, &mut scanner, schema, &config)?;

    let mut emitted = 0u64;
    for record in reader.by_ref() {
        println!("{}", record?);
        emitted += 1;
    }

    let stats = reader.stats();
    reader.close()?;

    tracing::info!(
        emitted,
        merged = stats.merged,
        suppressed = stats.suppressed,
        tail = stats.tail_records,
        "Slice read complete"
    );
    Ok(())
}
