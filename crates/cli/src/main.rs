//! rekorder CLI: inspect and verify log files.
//!
//! - `rekorder info FILE`: header fields and compression ratio
//! - `rekorder containers FILE`: container offsets and sizes
//! - `rekorder records FILE [-n N] [-c CAT]`: decoded records
//! - `rekorder verify FILE`: full decode plus totals check
//!
//! `--json` switches every command to JSON output; `-v` enables logging to
//! stderr.

mod commands;
mod format;
mod parse;

use std::process;

use rekorder::{LogReader, Result};
use tracing::Level;

use commands::build_cli;
use format::{
    format_containers, format_error, format_info, format_records, format_summary, OutputMode,
};
use parse::{matches_to_action, CliAction};

fn main() {
    let matches = build_cli().get_matches();

    let output_mode = if matches.get_flag("json") {
        OutputMode::Json
    } else {
        OutputMode::Human
    };
    init_logging(matches.get_count("verbose"));

    let action = match matches_to_action(&matches) {
        Ok(action) => action,
        Err(e) => {
            eprintln!("(error) {}", e);
            process::exit(2);
        }
    };

    match run(action, output_mode) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("{}", format_error(&e, output_mode));
            process::exit(1);
        }
    }
}

fn init_logging(verbosity: u8) {
    if verbosity == 0 {
        return;
    }
    let level = match verbosity {
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn run(action: CliAction, mode: OutputMode) -> Result<String> {
    match action {
        CliAction::Info { path } => {
            let reader = LogReader::open(&path)?;
            Ok(format_info(
                reader.path(),
                reader.header(),
                reader.file_len(),
                mode,
            ))
        }
        CliAction::Containers { path } => {
            let reader = LogReader::open(&path)?;
            let containers = reader.containers().collect::<Result<Vec<_>>>()?;
            Ok(format_containers(&containers, mode))
        }
        CliAction::Records {
            path,
            limit,
            category,
        } => {
            let reader = LogReader::open(&path)?;
            let mut records = Vec::new();
            for record in reader.records() {
                let record = record?;
                if category.map_or(true, |c| c == record.category) {
                    records.push(record);
                }
                if limit.map_or(false, |n| records.len() >= n) {
                    break;
                }
            }
            Ok(format_records(&records, mode))
        }
        CliAction::Verify { path } => {
            let reader = LogReader::open(&path)?;
            let summary = reader.verify()?;
            Ok(format_summary(&summary, mode))
        }
    }
}
