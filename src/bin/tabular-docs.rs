//! `tabular-docs` command-line front end.
//!
//! Converts a CSV or Excel file into newline-delimited JSON documents, one per data row.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{ArgAction, Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use tabular_docs::pipeline::{
    convert_path, CompositeObserver, ConversionObserver, ConvertOptions, FileObserver, PipelineOptions, StdErrObserver,
};
use tabular_docs::sink::JsonLinesSink;
use tabular_docs::source::{CsvOptions, SheetSelection, SourceFormat, SourceOptions};

#[derive(Parser)]
#[command(
    name = "tabular-docs",
    version,
    about = "Convert a header-first CSV/Excel table into NDJSON documents with inferred column types"
)]
struct Cli {
    /// Input file (.csv, .tsv, .xlsx, .xls, .xlsm, .xlsb, .ods).
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Write documents here instead of stdout.
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Force the input format instead of detecting it from the extension.
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Sheet to read from a workbook (default: first sheet).
    #[arg(long, value_name = "NAME")]
    sheet: Option<String>,

    /// CSV field delimiter (default: tab for .tsv, `,` otherwise).
    #[arg(long)]
    delimiter: Option<char>,

    /// Infer column types in parallel.
    #[arg(long)]
    parallel_inference: bool,

    /// Append run phases and outcomes to this file.
    #[arg(long, value_name = "PATH")]
    run_log: Option<PathBuf>,

    /// Increase log verbosity (-v debug and run phases, -vv trace). `RUST_LOG` overrides.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Csv,
    Excel,
}

impl From<FormatArg> for SourceFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Csv => SourceFormat::Csv,
            FormatArg::Excel => SourceFormat::Excel,
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn build_observer(cli: &Cli) -> Option<Arc<dyn ConversionObserver>> {
    let mut observers = CompositeObserver::new();
    if cli.verbose > 0 {
        observers = observers.with(Arc::new(StdErrObserver));
    }
    if let Some(path) = &cli.run_log {
        observers = observers.with(Arc::new(FileObserver::new(path)));
    }
    if observers.is_empty() {
        None
    } else {
        Some(Arc::new(observers))
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let delimiter = cli
        .delimiter
        .map(|c| {
            u8::try_from(c)
                .ok()
                .filter(u8::is_ascii)
                .context("--delimiter must be a single ASCII character")
        })
        .transpose()?;

    let observer = build_observer(&cli);
    let options = ConvertOptions {
        source: SourceOptions {
            format: cli.format.map(Into::into),
            sheet: cli.sheet.map_or(SheetSelection::First, SheetSelection::Named),
            csv: CsvOptions { delimiter },
        },
        pipeline: PipelineOptions {
            parallel_inference: cli.parallel_inference,
            observer,
            ..Default::default()
        },
    };

    let writer: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    let mut sink = JsonLinesSink::new(writer);

    let summary = convert_path(&cli.input, &mut sink, &options)
        .with_context(|| format!("converting {}", cli.input.display()))?;
    sink.flush().context("flushing output")?;

    for column in &summary.columns {
        eprintln!("  {:>3}  {:<8} {}", column.index, column.column_type, column.name);
    }
    eprintln!("{} documents written", summary.documents);
    Ok(())
}
