//! Strip characters from a WOFF font and align the remaining glyphs to a common baseline
//!
//! Ranges are comma separated lists of hexadecimal codepoints or `from-to` pairs, e.g.
//! `20-7e,F001-F008,E12a`. An empty alignment list aligns every character that is kept.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use woffstrip::{
    AlignRequest, CharSelection, Config, EditOptions, WoffError, edit_woff, parse_range_list,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Report every glyph touched
    #[arg(short, long)]
    verbose: bool,

    /// Strip the characters in these ranges
    #[arg(short, long, value_name = "RANGES", conflicts_with = "include")]
    exclude: Option<String>,

    /// Keep only the characters in these ranges
    #[arg(short, long, value_name = "RANGES")]
    include: Option<String>,

    /// Align the glyphs of these (kept) characters
    #[arg(short, long, value_name = "RANGES")]
    align: Option<String>,

    /// Baseline to align to. Inferred from the glyphs when not given.
    #[arg(
        short = 'b',
        long,
        value_name = "N",
        requires = "align",
        value_parser = clap::value_parser!(i16).range(1..)
    )]
    baseline: Option<i16>,

    /// The input WOFF file
    input: PathBuf,

    /// Where to write the result. Without it the edit is only checked.
    output: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("cannot read '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot write '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Woff(#[from] WoffError),
}

fn main() -> ExitCode {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let config = Config {
        verbose: args.verbose,
    };

    let selection = match (&args.exclude, &args.include) {
        (Some(ranges), _) => Some(CharSelection::Exclude(parse_range_list(ranges)?)),
        (_, Some(ranges)) => Some(CharSelection::Include(parse_range_list(ranges)?)),
        (None, None) => None,
    };
    let align = match &args.align {
        Some(ranges) => Some(AlignRequest {
            ranges: parse_range_list(ranges)?,
            baseline: args.baseline,
        }),
        None => None,
    };
    let options = EditOptions { selection, align };

    let woff = std::fs::read(&args.input).map_err(|source| CliError::Read {
        path: args.input.clone(),
        source,
    })?;

    let Some(edited) = edit_woff(&woff, &options, config)? else {
        return Ok(());
    };

    if let Some(output) = args.output {
        std::fs::write(&output, edited).map_err(|source| CliError::Write {
            path: output.clone(),
            source,
        })?;
        log::info!("wrote to '{}' - done.", output.display());
    }
    Ok(())
}
