//! Integration tests for the `example run` command.
use std::fs;
use tempfile::tempdir;
use tescost::cli::RunOpts;
use tescost::cli::example::handle_example_run_command;
use tescost::settings::Settings;

/// An integration test for the `example run` command.
#[test]
fn test_handle_example_run_command() {
    unsafe { std::env::set_var("TESCOST_LOG_LEVEL", "off") };

    let tempdir = tempdir().unwrap();
    let opts = RunOpts {
        output_dir: Some(tempdir.path().to_path_buf()),
        overwrite: false,
    };
    handle_example_run_command("oil_tank", &opts, Some(Settings::default())).unwrap();

    // No cash-flow analysis is configured for this example
    assert!(!tempdir.path().join("cash_flow.csv").exists());

    let costs = fs::read_to_string(tempdir.path().join("costs.csv")).unwrap();
    let kocher = costs
        .lines()
        .find(|line| line.starts_with("capex_kocher,"))
        .unwrap();
    assert!(kocher.starts_with("capex_kocher,,,\"Missing parameters:"));
    assert!(
        costs
            .lines()
            .any(|line| line.starts_with("lcos_pereira,") && line.ends_with(",$/kWh,"))
    );

    let calibration = fs::read_to_string(tempdir.path().join("calibration.csv")).unwrap();
    assert_eq!(calibration.lines().count(), 2);
}
