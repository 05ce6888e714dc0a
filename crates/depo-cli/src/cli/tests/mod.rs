//! CLI parse tests.

use super::{Cli, CliCommand};
use clap::Parser;
use std::path::PathBuf;

pub(super) fn parse(args: &[&str]) -> CliCommand {
    let cli = Cli::try_parse_from(args).unwrap();
    cli.command
}


#[test]
fn cli_parse_fields() {
    assert!(matches!(parse(&["depo", "fields"]), CliCommand::Fields));
}

#[test]
fn cli_parse_checksum() {
    match parse(&["depo", "checksum", "a.csv", "b.csv", "--root", "/data"]) {
        CliCommand::Checksum { files, root } => {
            assert_eq!(files, vec!["a.csv".to_string(), "b.csv".to_string()]);
            assert_eq!(root, PathBuf::from("/data"));
        }
        _ => panic!("expected Checksum"),
    }
}

#[test]
fn cli_checksum_root_defaults_to_current_dir() {
    match parse(&["depo", "checksum", "a.csv"]) {
        CliCommand::Checksum { root, .. } => assert_eq!(root, PathBuf::from(".")),
        _ => panic!("expected Checksum"),
    }
}

#[test]
fn cli_checksum_requires_a_file() {
    assert!(Cli::try_parse_from(["depo", "checksum"]).is_err());
}

#[test]
fn cli_rejects_unknown_command() {
    assert!(Cli::try_parse_from(["depo", "download"]).is_err());
}
