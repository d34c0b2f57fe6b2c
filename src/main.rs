mod cli;

use std::{
    error,
    fs::File,
    io::{self, BufWriter, Write},
    process::ExitCode,
};

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use tm32::{ListingFormat, listing::write_listing, memimg};

const DEFAULT_TRACE_FILTER: &str = "tm32=trace,tm32dis=trace";

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Dropping the guard flushes the trace file.
    let _guard = match init_tracing(&cli) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("could not set up tracing: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Installs the trace subscriber when `--debug` is given. Without it every
/// event of the decoder is discarded.
fn init_tracing(cli: &Cli) -> io::Result<Option<WorkerGuard>> {
    if !cli.debug {
        return Ok(None);
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_TRACE_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let guard = match &cli.trace_file {
        Some(path) => {
            let (writer, guard) = tracing_appender::non_blocking(File::create(path)?);
            builder.with_writer(writer).with_ansi(false).init();
            Some(guard)
        }
        None => {
            builder.with_writer(io::stderr).init();
            None
        }
    };

    tracing::debug!("debug enabled");
    Ok(guard)
}

fn run(cli: &Cli) -> Result<(), Box<dyn error::Error>> {
    let data = cli::load(&cli.input)?;
    let length = data.len();
    println!(
        "Read in {length} (0x{length:x}) bytes from file '{}'",
        cli.input.display()
    );

    let range = cli::select(length, cli.skip, cli.count)?;
    if cli.skip > 0 {
        println!("Skipping {0} (0x{0:x}) bytes", cli.skip);
    }
    if cli.adjust > 0 {
        println!("Using 0x{:x} adjustment offset", cli.adjust);
    }
    println!("Disassembling {0} (0x{0:x}) bytes", range.len());

    let transposed;
    let code = if cli.memimg {
        println!("Transposing memory image from bit-striped to sequential bytes");
        transposed = memimg::transpose_range(&data, range);
        transposed.as_slice()
    } else {
        &data[range]
    };

    let mut out = BufWriter::new(io::stdout().lock());
    write_listing(&mut out, code, cli.adjust, ListingFormat::from(cli.format))?;
    out.flush()?;

    Ok(())
}
