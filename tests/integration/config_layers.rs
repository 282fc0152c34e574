use clap::Parser;
use efs_stress::config::{ByteSize, ConfigLoader};
use efs_stress::tooling::cli::{Cli, CliContext};
use std::io::Write;
use tempfile::NamedTempFile;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn file_values_apply_over_defaults() {
    let file = config_file(
        r#"
[bounds]
max_files = 3
max_size = "2K"

[container]
tool = "/system/bin/efs"

[device]
serial = "emulator-5554"
"#,
    );
    let config = ConfigLoader::load(Some(file.path())).unwrap();
    assert_eq!(config.bounds.max_files, 3);
    assert_eq!(config.bounds.max_size, ByteSize(2048));
    assert_eq!(config.bounds.max_level, 5);
    assert_eq!(config.container.tool, "/system/bin/efs");
    assert_eq!(config.device.serial.as_deref(), Some("emulator-5554"));
    assert_eq!(config.roots.plain, "/data/data/testn");
}

#[test]
fn flags_win_over_the_file() {
    let file = config_file("[bounds]\nmax_files = 3\nmin_files = 12\n");
    let path = file.path().to_str().unwrap();
    let cli = Cli::try_parse_from(["efs-stress", "--config", path, "--max-files=7", "--seed=5"])
        .unwrap();
    let context = CliContext::new(&cli).unwrap();
    assert_eq!(context.config().bounds.max_files, 7);
    assert_eq!(context.config().bounds.min_files, 12);
    assert_eq!(context.seed(), 5);
}

#[test]
fn flags_are_applied_before_validation() {
    let file = config_file("[bounds]\nmax_files = 0\n");
    assert!(ConfigLoader::load(Some(file.path())).is_err());

    let path = file.path().to_str().unwrap();
    let cli = Cli::try_parse_from(["efs-stress", "--config", path, "--max-files=2"]).unwrap();
    assert!(CliContext::new(&cli).is_ok());
}

#[test]
fn zero_size_fails_validation() {
    let cli = Cli::try_parse_from(["efs-stress", "--max-size=0"]).unwrap();
    assert!(CliContext::new(&cli).is_err());
}

#[test]
fn nested_roots_are_rejected() {
    let file = config_file("[roots]\nplain = \"/data/data/t\"\nsecure = \"/data/data/t/x\"\n");
    assert!(ConfigLoader::load(Some(file.path())).is_err());
}

#[test]
fn printed_config_loads_back() {
    let cli = Cli::try_parse_from(["efs-stress", "--max-links=4", "--max-size=3K"]).unwrap();
    let context = CliContext::new(&cli).unwrap();
    let file = config_file(&context.render_config().unwrap());

    let reloaded = ConfigLoader::load(Some(file.path())).unwrap();
    assert_eq!(reloaded.bounds, context.config().bounds);
}
