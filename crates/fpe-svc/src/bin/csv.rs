//! `fpe-csv`: encrypt or decrypt the classified columns of a CSV dataset.
//!
//! ```text
//! fpe-csv --key fpe.key [--catalog data_dictionary.csv] encrypt original.csv encrypted.csv
//! fpe-csv --key fpe.key [--catalog data_dictionary.csv] decrypt encrypted.csv decrypted.csv
//! ```
//!
//! Options fall back to the same environment variables as the service
//! (`KEY_PATH`, `CATALOG_PATH`, `FEISTEL_ROUNDS`, ...), so a dataset
//! encrypted here decrypts through the HTTP API and vice versa.
//!
//! Unlike the service, an explicitly named catalog that cannot be parsed is
//! an error: a batch run never silently falls back to the builtin catalog.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use fpe::{
    CatalogFormat, FieldCatalog, Key, RoundStrategy, Table, TransformOptions, TransformReport,
    Transformed, Transformer, DEFAULT_ROUNDS,
};

#[derive(Parser, Debug)]
#[command(
    name = "fpe-csv",
    version,
    about = "Format-preserving encryption of CSV datasets"
)]
struct Cli {
    /// Key file written by `fpe-keygen`
    #[arg(long, env = "KEY_PATH")]
    key: PathBuf,

    /// Field catalog (.csv, .yaml, .yml or .json); builtin catalog if omitted
    #[arg(long, env = "CATALOG_PATH")]
    catalog: Option<PathBuf>,

    /// Feistel rounds for numeric fields
    #[arg(long, env = "FEISTEL_ROUNDS", default_value_t = DEFAULT_ROUNDS)]
    rounds: u32,

    /// Round function for numeric fields
    #[arg(long, env = "ROUND_STRATEGY", value_enum, default_value = "modular")]
    strategy: Strategy,

    /// Reject numeric values that do not match their field's format
    #[arg(long, env = "VALIDATE_FORMAT")]
    validate: bool,

    /// Stop at the first failed cell instead of keeping it unchanged
    #[arg(long, env = "STRICT_MODE")]
    strict: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encrypt the classified columns of a dataset
    Encrypt {
        /// Plaintext CSV with a header row
        input: PathBuf,
        /// Where to write the encrypted CSV
        output: PathBuf,
    },

    /// Decrypt a dataset produced by `encrypt`
    Decrypt {
        /// Encrypted CSV with a header row
        input: PathBuf,
        /// Where to write the decrypted CSV
        output: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Strategy {
    /// Whole half modulo 10^width
    Modular,
    /// One mask digit per position
    Digitwise,
}

impl From<Strategy> for RoundStrategy {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Modular => RoundStrategy::Modular,
            Strategy::Digitwise => RoundStrategy::Digitwise,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let (rows, report) = run(&cli)?;

    for failure in &report.failures {
        eprintln!("warning: {failure} (kept unchanged)");
    }
    for short in &report.short_values {
        let row = short.row.unwrap_or_default();
        eprintln!(
            "note: field `{}` (row {row}) has a single digit and was not mixed",
            short.field
        );
    }

    let output = match &cli.command {
        Command::Encrypt { output, .. } | Command::Decrypt { output, .. } => output,
    };
    println!(
        "wrote {rows} rows to {} ({} failed cells)",
        output.display(),
        report.failures.len()
    );
    Ok(())
}

/// Transform one dataset. Returns the row count and the report.
fn run(cli: &Cli) -> Result<(usize, TransformReport)> {
    let key_bytes =
        fs::read(&cli.key).with_context(|| format!("failed to read {}", cli.key.display()))?;
    let key = Key::from_bytes(key_bytes)
        .with_context(|| format!("key material in {} is unusable", cli.key.display()))?;
    if key.is_short() {
        eprintln!("warning: key is shorter than recommended");
    }

    let catalog = match &cli.catalog {
        Some(path) => load_catalog(path)?,
        None => FieldCatalog::builtin(),
    };
    let options = TransformOptions {
        rounds: cli.rounds,
        strategy: cli.strategy.into(),
        validate: cli.validate,
        strict: cli.strict,
    };
    let engine = Transformer::new(&key, Arc::new(catalog), options)
        .context("failed to build transform engine")?;

    let (input, output, encrypt) = match &cli.command {
        Command::Encrypt { input, output } => (input, output, true),
        Command::Decrypt { input, output } => (input, output, false),
    };

    let file =
        File::open(input).with_context(|| format!("failed to open {}", input.display()))?;
    let table = Table::from_csv_reader(BufReader::new(file))
        .with_context(|| format!("failed to read {}", input.display()))?;

    let transformed = if encrypt {
        engine.encrypt_table(&table)
    } else {
        engine.decrypt_table(&table)
    };
    let Transformed { output: table, report } =
        transformed.context("aborted in strict mode; no output written")?;

    let file =
        File::create(output).with_context(|| format!("failed to create {}", output.display()))?;
    table
        .to_csv_writer(BufWriter::new(file))
        .with_context(|| format!("failed to write {}", output.display()))?;

    Ok((table.rows.len(), report))
}

fn load_catalog(path: &Path) -> Result<FieldCatalog> {
    let name = path.display().to_string();
    let bytes = fs::read(path).with_context(|| format!("failed to read {name}"))?;
    let (catalog, warnings) = CatalogFormat::from_path(&name)
        .and_then(|format| FieldCatalog::parse(format, &bytes))
        .with_context(|| format!("catalog {name} is unusable"))?;

    for warning in &warnings {
        eprintln!("warning: {warning}");
    }
    Ok(catalog)
}
