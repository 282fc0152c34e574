use clap::{CommandFactory, Parser};
use efs_stress::config::ByteSize;
use efs_stress::tooling::cli::{Cli, ReportFormat};

#[test]
fn parse_valid_flag_matrix() {
    let cases: Vec<Vec<&str>> = vec![
        vec!["efs-stress"],
        vec!["efs-stress", "--max-level=0"],
        vec!["efs-stress", "--max-files", "1"],
        vec!["efs-stress", "--max-links=0", "--min-files=1"],
        vec!["efs-stress", "--max-size=500"],
        vec!["efs-stress", "--max-size=10b"],
        vec!["efs-stress", "--max-size=2kb"],
        vec!["efs-stress", "--max-size=1M"],
        vec!["efs-stress", "--seed", "42", "--serial", "R58M123"],
        vec!["efs-stress", "--report", "json", "--no-color"],
        vec!["efs-stress", "--print-config", "--config", "stress.toml"],
        vec!["efs-stress", "--log-level", "debug", "--log-format", "json"],
    ];

    for args in cases {
        let parsed = Cli::try_parse_from(args.clone());
        assert!(parsed.is_ok(), "expected valid parse for args: {args:?}");
    }
}

#[test]
fn parse_rejects_malformed_values() {
    let cases: Vec<Vec<&str>> = vec![
        vec!["efs-stress", "--max-size=x"],
        vec!["efs-stress", "--max-size=K"],
        vec!["efs-stress", "--max-size=1.5M"],
        vec!["efs-stress", "--max-level=-1"],
        vec!["efs-stress", "--max-files=many"],
        vec!["efs-stress", "--seed=abc"],
        vec!["efs-stress", "--report=yaml"],
        vec!["efs-stress", "--unknown-flag"],
    ];

    for args in cases {
        let parsed = Cli::try_parse_from(args.clone());
        assert!(parsed.is_err(), "expected parse failure for args: {args:?}");
    }
}

#[test]
fn parse_size_suffixes_reach_the_cli() {
    let size = |arg: &str| {
        Cli::try_parse_from(["efs-stress", arg])
            .unwrap()
            .max_size
            .unwrap()
    };
    assert_eq!(size("--max-size=10B"), ByteSize(10));
    assert_eq!(size("--max-size=2K"), ByteSize(2048));
    assert_eq!(size("--max-size=1M"), ByteSize(1_048_576));
    assert_eq!(size("--max-size=500"), ByteSize(500));
}

#[test]
fn parse_report_formats() {
    let cli = Cli::try_parse_from(["efs-stress", "--report", "text"]).unwrap();
    assert_eq!(cli.report, Some(ReportFormat::Text));
    let cli = Cli::try_parse_from(["efs-stress", "--report", "json"]).unwrap();
    assert_eq!(cli.report, Some(ReportFormat::Json));
}

#[test]
fn help_lists_generation_flags() {
    let help = Cli::command().render_long_help().to_string();
    for flag in [
        "--max-level",
        "--max-files",
        "--max-links",
        "--max-size",
        "--min-files",
        "--seed",
        "--serial",
        "--config",
        "--print-config",
        "--report",
    ] {
        assert!(help.contains(flag), "help is missing {flag}");
    }
}
