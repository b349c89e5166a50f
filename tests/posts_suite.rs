mod common;

use std::time::Duration;

use clap::Parser;
use httpcontract::cli::{self, Cli, EXIT_FAILURES, EXIT_SUCCESS};
use httpcontract::suites::posts;
use httpcontract::testing::CaseStatus;
use httpcontract::{Assertion, EndpointConfig, RequestDescription, RunMode, Runner, TestCase};

fn config(base_url: &str) -> EndpointConfig {
    EndpointConfig::builder(base_url)
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

#[test]
fn posts_suite_passes_against_a_conforming_service() {
    let stub = common::start();
    let config = config(&stub.base_url());
    let report = Runner::new(&config).run(&posts::suite());

    let failing: Vec<_> = report
        .cases
        .iter()
        .filter(|case| case.status != CaseStatus::Passed)
        .map(|case| format!("{}: {:?} {:?}", case.name, case.failures().collect::<Vec<_>>(), case.error))
        .collect();
    assert!(failing.is_empty(), "{failing:#?}");
    assert_eq!(report.total, 10);
    assert!(report.is_success());
}

#[test]
fn parallel_and_serial_runs_agree() {
    let stub = common::start();
    let config = config(&stub.base_url());
    let cases = posts::suite();

    let serial = Runner::new(&config).with_mode(RunMode::Serial).run(&cases);
    let parallel = Runner::new(&config).with_mode(RunMode::Parallel).run(&cases);

    let names = |report: &httpcontract::RunReport| {
        report
            .cases
            .iter()
            .map(|case| (case.name.clone(), case.status))
            .collect::<Vec<_>>()
    };
    assert_eq!(names(&serial), names(&parallel));
}

#[test]
fn failures_and_transport_errors_are_reported_per_case() {
    let stub = common::start();
    let config = EndpointConfig::builder(&stub.base_url())
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let cases = vec![
        TestCase::new("ok", RequestDescription::get("/posts/1")).expect(Assertion::status(200)),
        TestCase::new("wrong_status", RequestDescription::get("/posts/1"))
            .expect(Assertion::status(404))
            .expect(Assertion::field_equals("id", 2)),
        TestCase::new("too_slow", RequestDescription::get("/slow").query("ms", 1500))
            .expect(Assertion::status(200)),
    ];
    let report = Runner::new(&config).run(&cases);

    assert_eq!(report.passed, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.errored, 1);
    assert_eq!(report.cases[1].failures().count(), 2);
    assert!(report.cases[2].error.as_deref().unwrap().contains("timed out"));
    assert!(!report.is_success());
}

#[test]
fn cli_run_writes_json_report() {
    let stub = common::start();
    let dir = tempfile::tempdir().unwrap();
    let report_path = dir.path().join("report.json");
    let base_url = stub.base_url();
    let report_arg = report_path.to_string_lossy().into_owned();

    let cli = Cli::try_parse_from([
        "httpcontract",
        "run",
        "--base-url",
        base_url.as_str(),
        "--timeout-ms",
        "5000",
        "--format",
        "json",
        "--report",
        report_arg.as_str(),
    ])
    .unwrap();
    let output = cli::execute(cli).unwrap();
    assert_eq!(output.exit_code, EXIT_SUCCESS);

    let written = std::fs::read_to_string(&report_path).unwrap();
    assert_eq!(written, output.stdout);
    let json: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(json["passed"], 10);
}

#[test]
fn cli_run_exits_non_zero_when_service_is_down() {
    let base_url = common::closed_port_url();
    let cli = Cli::try_parse_from([
        "httpcontract",
        "run",
        "--base-url",
        base_url.as_str(),
        "--timeout-ms",
        "1000",
        "--filter",
        "get_single",
    ])
    .unwrap();
    let output = cli::execute(cli).unwrap();
    assert_eq!(output.exit_code, EXIT_FAILURES);
    assert!(output.stdout.contains("ERROR get_single_post"));
    assert!(output.stdout.contains("1 cases: 0 passed, 0 failed, 1 errored"));
}

#[test]
fn cli_run_keeps_outcome_when_report_file_cannot_be_written() {
    let stub = common::start();
    let base_url = stub.base_url();
    let dir = tempfile::tempdir().unwrap();
    let report_path = dir.path().join("missing").join("report.txt");
    let report_arg = report_path.to_string_lossy().into_owned();

    let cli = Cli::try_parse_from([
        "httpcontract",
        "run",
        "--base-url",
        base_url.as_str(),
        "--filter",
        "get_single_post",
        "--report",
        report_arg.as_str(),
    ])
    .unwrap();
    let output = cli::execute(cli).unwrap();
    assert_eq!(output.exit_code, EXIT_SUCCESS);
    assert!(output.stdout.contains("PASS  get_single_post"));
    assert!(output.stderr.contains("failed to write report file"));
    assert!(!report_path.exists());
}
