use predicates::str::contains;

fn run_output(args: &[&str]) -> String {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("login-sim");
    cmd.args(args);
    let output = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(output).expect("stdout should be utf-8")
}

#[test]
fn summary_lists_every_metric() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("login-sim");
    cmd.args(["run", "--runs", "50", "--format", "summary"]);
    cmd.assert()
        .success()
        .stdout(contains("Metadata:\nseed: 42\nruns: 50 ("))
        .stdout(contains("sla_threshold: 5\nSummary:\n"))
        .stdout(contains("Total requests: "))
        .stdout(contains("Throughput (requests/s): "))
        .stdout(contains("Estimated success rate: "))
        .stdout(contains("Mean authentication time (s): "))
        .stdout(contains("SLA violations: "));
}

#[test]
fn same_seed_prints_identical_output() {
    let args = ["run", "--runs", "100", "--seed", "7", "--format", "human"];
    assert_eq!(run_output(&args), run_output(&args));
}

#[test]
fn human_output_includes_rolling_throughput() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("login-sim");
    cmd.args(["run", "--runs", "30", "--window", "25"]);
    cmd.assert()
        .success()
        .stdout(contains("Rolling throughput (window 25):\n"))
        .stdout(contains("defined points: "));
}

#[test]
fn json_output_is_parseable() {
    let stdout = run_output(&["run", "--runs", "20", "--format", "json"]);
    let value: serde_json::Value = serde_json::from_str(&stdout).expect("valid json");

    let summary = &value["summary"];
    let total = summary["total_requests"].as_u64().unwrap();
    let successes = summary["num_successes"].as_u64().unwrap();
    let failures = summary["num_failures"].as_u64().unwrap();
    assert_eq!(successes + failures, total);
    assert_eq!(value["metadata"]["runs"], 20);
}

#[test]
fn empty_log_reports_undefined_rates() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("login-sim");
    cmd.args([
        "run",
        "--runs",
        "1",
        "--arrival-rate",
        "0.0001",
        "--format",
        "summary",
    ]);
    cmd.assert()
        .success()
        .stdout(contains("Total requests: 0\n"))
        .stdout(contains("Total simulated time (s): undefined\n"))
        .stdout(contains("Throughput (requests/s): 0\n"))
        .stdout(contains("Estimated success rate: undefined\n"));
}
