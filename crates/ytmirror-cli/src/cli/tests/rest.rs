//! Tests for the status and check subcommands.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;

#[test]
fn cli_parse_status() {
    assert!(matches!(
        parse(&["ytmirror", "status"]),
        CliCommand::Status
    ));
}

#[test]
fn cli_parse_check() {
    assert!(matches!(parse(&["ytmirror", "check"]), CliCommand::Check));
}

#[test]
fn cli_rejects_unknown_subcommand() {
    assert!(Cli::try_parse_from(["ytmirror", "mirror-all"]).is_err());
}
