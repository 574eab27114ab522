//! ArgMatches → CliAction conversion.

use std::path::PathBuf;

use clap::ArgMatches;

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliAction {
    /// Print the header.
    Info { path: PathBuf },
    /// List containers.
    Containers { path: PathBuf },
    /// Print records.
    Records {
        path: PathBuf,
        limit: Option<usize>,
        category: Option<u8>,
    },
    /// Full decode plus totals check.
    Verify { path: PathBuf },
}

/// Convert clap ArgMatches into a CliAction.
pub fn matches_to_action(matches: &ArgMatches) -> Result<CliAction, String> {
    let (sub_name, m) = matches
        .subcommand()
        .ok_or_else(|| "No command provided".to_string())?;
    let path = m
        .get_one::<PathBuf>("file")
        .cloned()
        .ok_or_else(|| format!("{}: missing FILE", sub_name))?;

    match sub_name {
        "info" => Ok(CliAction::Info { path }),
        "containers" => Ok(CliAction::Containers { path }),
        "records" => Ok(CliAction::Records {
            path,
            limit: m.get_one::<usize>("limit").copied(),
            category: m.get_one::<u8>("category").copied(),
        }),
        "verify" => Ok(CliAction::Verify { path }),
        other => Err(format!("Unknown command: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::build_cli;

    fn parse(args: &[&str]) -> Result<CliAction, String> {
        let matches = build_cli()
            .try_get_matches_from(args)
            .map_err(|e| e.to_string())?;
        matches_to_action(&matches)
    }

    #[test]
    fn test_info() {
        assert_eq!(
            parse(&["rekorder", "info", "a.xmraw"]).unwrap(),
            CliAction::Info {
                path: PathBuf::from("a.xmraw")
            }
        );
    }

    #[test]
    fn test_records_filters() {
        assert_eq!(
            parse(&["rekorder", "records", "a.xmraw", "-n", "5", "--category", "1"]).unwrap(),
            CliAction::Records {
                path: PathBuf::from("a.xmraw"),
                limit: Some(5),
                category: Some(1),
            }
        );
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let matches = build_cli()
            .try_get_matches_from(["rekorder", "verify", "a.xmraw", "--json", "-vv"])
            .unwrap();
        assert!(matches.get_flag("json"));
        assert_eq!(matches.get_count("verbose"), 2);
        assert_eq!(
            matches_to_action(&matches).unwrap(),
            CliAction::Verify {
                path: PathBuf::from("a.xmraw")
            }
        );
    }

    #[test]
    fn test_missing_file_rejected() {
        assert!(parse(&["rekorder", "containers"]).is_err());
        assert!(parse(&["rekorder", "records", "a.xmraw", "--category", "300"]).is_err());
    }
}
