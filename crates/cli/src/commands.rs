//! clap command tree.

use std::path::PathBuf;

use clap::{value_parser, Arg, ArgAction, Command};

fn file_arg() -> Arg {
    Arg::new("file")
        .value_name("FILE")
        .help("Log file (.xmraw)")
        .required(true)
        .value_parser(value_parser!(PathBuf))
}

/// Build the top-level command.
pub fn build_cli() -> Command {
    Command::new("rekorder")
        .about("Inspect and verify rekorder log files")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Print JSON instead of text"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::Count)
                .help("Log to stderr (-v info, -vv debug, -vvv trace)"),
        )
        .subcommand(
            Command::new("info")
                .about("Show the file header")
                .arg(file_arg()),
        )
        .subcommand(
            Command::new("containers")
                .about("List containers and their sizes")
                .arg(file_arg()),
        )
        .subcommand(
            Command::new("records")
                .about("Print records in file order")
                .arg(file_arg())
                .arg(
                    Arg::new("limit")
                        .short('n')
                        .long("limit")
                        .value_name("N")
                        .value_parser(value_parser!(usize))
                        .help("Stop after N records"),
                )
                .arg(
                    Arg::new("category")
                        .short('c')
                        .long("category")
                        .value_name("CAT")
                        .value_parser(value_parser!(u8))
                        .help("Only records of this category"),
                ),
        )
        .subcommand(
            Command::new("verify")
                .about("Decode every record and check the header totals")
                .arg(file_arg()),
        )
}
