//! Tests for CLI parsing and request building

use std::fs;

use clap::Parser;
use rstest::rstest;
use tempfile::TempDir;

use fritz_annotate::application::services::{FailedStep, Outcome};
use fritz_annotate::cli::commands::{
    annotation_request, init_config, resolve_settings, write_outcome,
};
use fritz_annotate::cli::{normalize_legacy_flags, Cli, CliError};
use fritz_annotate::domain::Action;
use fritz_annotate::exitcode;
use fritz_annotate::infrastructure::traits::RealFileSystem;

fn parse(args: &[&str]) -> Cli {
    let mut argv = vec!["fritz-annotate"];
    argv.extend_from_slice(args);
    Cli::try_parse_from(normalize_legacy_flags(argv)).expect("valid arguments")
}

#[test]
fn given_legacy_single_dash_flags_when_parsing_then_builds_request() {
    // Arrange / Act
    let cli = parse(&[
        "-action", "Post", "-source", "ZTF21abc", "-group_ids", "1", "2", "-token", "abc",
        "-origin", "tool", "-key", "score", "-value", "0.9",
    ]);
    let request = annotation_request(&cli).unwrap();

    // Assert
    assert_eq!(request.action, Action::Post);
    assert_eq!(request.source, "ZTF21abc");
    assert_eq!(request.group_ids, Some(vec![1, 2]));
    assert_eq!(request.origin.as_deref(), Some("tool"));
    assert_eq!(request.key.as_deref(), Some("score"));
    assert_eq!(request.value.as_deref(), Some("0.9"));
    assert_eq!(cli.token.as_deref(), Some("abc"));
}

#[rstest]
#[case("post", Action::Post)]
#[case("POST", Action::Post)]
#[case("Update", Action::Update)]
#[case("DELETE", Action::Delete)]
fn given_action_in_any_case_when_parsing_then_normalizes(
    #[case] raw: &str,
    #[case] expected: Action,
) {
    let cli = parse(&["--action", raw, "--source", "ZTF1"]);

    assert_eq!(cli.action, Some(expected));
}

#[test]
fn given_unknown_action_when_parsing_then_clap_rejects() {
    let result = Cli::try_parse_from(["fritz-annotate", "--action", "archive", "--source", "ZTF1"]);

    let err = result.unwrap_err().to_string();
    assert!(err.contains("archive"), "{err}");
}

#[test]
fn given_negative_value_when_parsing_then_keeps_sign() {
    let cli = parse(&["-action", "update", "-source", "ZTF1", "-value", "-2.5"]);

    assert_eq!(cli.value.as_deref(), Some("-2.5"));
}

#[test]
fn given_dashed_group_ids_alias_when_parsing_then_accepted() {
    let cli = parse(&["--action", "post", "--source", "ZTF1", "--group-ids", "7"]);

    assert_eq!(cli.group_ids, Some(vec![7]));
}

#[test]
fn given_no_action_when_building_request_then_usage_error() {
    let cli = parse(&["--source", "ZTF1"]);

    let err = annotation_request(&cli).unwrap_err();
    assert!(matches!(err, CliError::Usage(_)));
    assert_eq!(err.exit_code(), exitcode::USAGE);
}

#[test]
fn given_no_source_when_building_request_then_usage_error() {
    let cli = parse(&["--action", "delete"]);

    let err = annotation_request(&cli).unwrap_err();
    assert!(err.to_string().contains("--source"), "{err}");
}

#[test]
fn given_config_file_and_flags_when_resolving_then_flags_win() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("fritz-annotate.toml");
    fs::write(
        &config,
        "base_url = \"https://preview.fritz.science\"\ntoken = \"from-file\"\n",
    )
    .unwrap();
    let config_arg = config.to_str().unwrap();

    // Act
    let from_file = resolve_settings(&parse(&["--config-file", config_arg])).unwrap();
    let overridden = resolve_settings(&parse(&[
        "--config-file",
        config_arg,
        "--token",
        "from-flag",
        "--base-url",
        "http://localhost:5000",
    ]))
    .unwrap();

    // Assert
    assert_eq!(from_file.base_url, "https://preview.fritz.science");
    assert_eq!(overridden.token.as_deref(), Some("from-flag"));
    assert_eq!(overridden.base_url, "http://localhost:5000");
}

#[test]
fn given_existing_config_when_init_then_refuses_to_overwrite() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("fritz-annotate.toml");

    // Act
    init_config(&RealFileSystem, &path).unwrap();
    let second = init_config(&RealFileSystem, &path);

    // Assert
    assert!(fs::read_to_string(&path).unwrap().contains("base_url"));
    assert!(matches!(second, Err(CliError::Usage(_))));
}

#[test]
fn given_config_subcommand_when_parsing_then_no_annotation_flags_needed() {
    let cli = parse(&["config", "show"]);

    assert!(cli.command.is_some());
    assert!(cli.action.is_none());
}

fn rendered(outcome: &Outcome) -> String {
    let mut out = Vec::new();
    write_outcome(&mut out, outcome).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn given_rejected_run_when_writing_outcome_then_reports_on_output_stream() {
    // Arrange
    let outcome = Outcome::Rejected {
        message: "please specify origin to update".into(),
    };

    // Act
    let line = rendered(&outcome);

    // Assert
    assert!(line.contains("Error"), "{line}");
    assert!(line.contains("please specify origin to update"), "{line}");
    assert!(line.ends_with('\n'));
}

#[rstest]
#[case(
    Outcome::NoMatch { obj_id: "ZTF1".into(), origin: "tool".into(), key: "score".into() },
    "Origin/key pair tool/score did not match any existing annotations for ZTF1."
)]
#[case(
    Outcome::Failed {
        obj_id: "ZTF1".into(),
        action: Action::Delete,
        step: FailedStep::Write,
        detail: "HTTP 500".into(),
    },
    "Did not delete annotation for ZTF1 (HTTP 500) - check inputs."
)]
fn given_outcome_when_writing_then_one_line_with_message(
    #[case] outcome: Outcome,
    #[case] expected: &str,
) {
    let line = rendered(&outcome);

    assert!(line.contains(expected), "{line}");
    assert_eq!(line.lines().count(), 1);
}
