//! Command line parsing and loading of the object file.

use std::fs;
use std::io;
use std::ops::Range;
use std::path::{Path, PathBuf};

use clap::Parser;
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(
    name = "tm32dis",
    version,
    about = "A disassembler for the TriMedia TM3260 five issue-slot VLIW core",
    after_help = "Example:  tm32dis -s 913 -c 64 -a 0x40000000 -m -i 2701_bootrom.bin"
)]
pub struct Cli {
    /// TM3260 object file.
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Skip <N> bytes at the start of the file.
    #[arg(
        short,
        long,
        value_name = "N",
        default_value = "0",
        value_parser = parse_number::<usize>
    )]
    pub skip: usize,

    /// Disassemble <N> bytes, 0 for the rest of the file.
    #[arg(
        short,
        long,
        value_name = "N",
        default_value = "0",
        value_parser = parse_number::<usize>
    )]
    pub count: usize,

    /// Add <OFFSET> to the displayed addresses.
    #[arg(
        short,
        long,
        value_name = "OFFSET",
        default_value = "0",
        value_parser = parse_number::<u64>
    )]
    pub adjust: u64,

    /// The input is a bit-striped memory image (bootloader).
    #[arg(short, long)]
    pub memimg: bool,

    /// Output format style: 1 for one line per instruction, anything else for
    /// the annotated listing.
    #[arg(
        short,
        long,
        value_name = "N",
        default_value = "0",
        value_parser = parse_number::<u32>
    )]
    pub format: u32,

    /// Trace decoding details.
    #[arg(short, long)]
    pub debug: bool,

    /// Write the trace to <FILE> instead of stderr.
    #[arg(long, value_name = "FILE", requires = "debug")]
    pub trace_file: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read tm32 object file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot skip {skip} bytes of a {length} byte file")]
    SkipTooLarge { skip: usize, length: usize },

    #[error(
        "count parameter too large for file length: {count} bytes requested, {available} left"
    )]
    CountTooLarge { count: usize, available: usize },
}

/// Parses an integer written the way C's `strtol` with base 0 accepts it:
/// `0x` hex, a leading `0` for octal, decimal otherwise.
pub fn parse_number<T: TryFrom<u64>>(text: &str) -> Result<T, String> {
    let text = text.trim();
    let hex = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X"));
    let (digits, radix) = if let Some(hex) = hex {
        (hex, 16)
    } else if text.len() > 1 && text.starts_with('0') {
        (&text[1..], 8)
    } else {
        (text, 10)
    };

    let value = u64::from_str_radix(digits, radix)
        .map_err(|err| format!("invalid number '{text}': {err}"))?;
    T::try_from(value).map_err(|_| format!("number '{text}' out of range"))
}

pub fn load(path: &Path) -> Result<Vec<u8>, LoadError> {
    fs::read(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Byte range to disassemble out of a `length` byte file. A `count` of 0
/// selects everything after the skipped bytes.
pub fn select(length: usize, skip: usize, count: usize) -> Result<Range<usize>, LoadError> {
    if skip > length {
        return Err(LoadError::SkipTooLarge { skip, length });
    }

    let available = length - skip;
    if count > available {
        return Err(LoadError::CountTooLarge { count, available });
    }

    let count = if count == 0 { available } else { count };
    Ok(skip..skip + count)
}
