use std::process::{Command, Output};

fn agentcost() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_agentcost"));
    // keep a developer's own settings file out of the way
    cmd.env("HOME", env!("CARGO_TARGET_TMPDIR"))
        .env_remove("AGENTCOST_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

fn run(args: &[&str]) -> Output {
    agentcost().args(args).output().expect("failed to execute")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

#[test]
fn no_args_shows_help_and_exits_zero() {
    let output = run(&[]);

    assert!(output.status.success(), "expected exit code 0");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage: agentcost"));
    assert!(stdout.contains("Commands:"));
}

#[test]
fn help_flag_shows_help() {
    let output = run(&["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Monthly cost estimator"));
    assert!(stdout.contains("break-even"));
}

#[test]
fn version_flag_shows_version() {
    let output = run(&["--version"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("agentcost "));
}

#[test]
fn invalid_subcommand_fails() {
    let output = run(&["nonexistent"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unrecognized subcommand"));
}

#[test]
fn estimate_scenario_json() {
    let output = run(&["estimate", "--scenario", "prototype", "--json"]);

    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["breakdown"]["totalMonthlyCost"], 6.969);
    assert_eq!(json["check"]["valid"], true);
    assert_eq!(json["breakdown"]["lineItems"].as_array().unwrap().len(), 14);
}

#[test]
fn estimate_set_values_table() {
    let output = run(&["estimate", "--set", "runtimeCpuHours=100"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Runtime CPU"));
    assert!(stdout.contains("$8.95"));
}

#[test]
fn estimate_rate_override() {
    let output = run(&[
        "estimate",
        "--set",
        "identityTokenRequests=50000",
        "--rate",
        "identityTokenRequests=0.02",
        "-j",
    ]);

    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["breakdown"]["totalMonthlyCost"], 1.0);
}

#[test]
fn estimate_invalid_value_fails_with_field_errors() {
    let output = run(&["estimate", "--set", "runtimeCpuHours=1.234"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("runtimeCpuHours"));
    assert!(stderr.contains("INVALID_DECIMAL_PLACES"));
}

#[test]
fn estimate_with_suggestions() {
    let output = run(&["estimate", "-s", "startup", "--suggest", "--json"]);

    assert!(output.status.success());
    assert!(stdout_json(&output)["suggestions"].is_array());
}

#[test]
fn check_valid_and_invalid() {
    let ok = run(&["check", "runtimeCpuHours", "12.5", "--json"]);
    assert!(ok.status.success());
    let json = stdout_json(&ok);
    assert_eq!(json["valid"], true);
    assert_eq!(json["sanitizedValue"], 12.5);

    let bad = run(&["check", "identityTokenRequests", "-5", "--json"]);
    assert!(!bad.status.success());
    let json = stdout_json(&bad);
    assert_eq!(json["error"]["code"], "NEGATIVE_NUMBER");
    assert_eq!(json["showError"], true);
}

#[test]
fn compare_two_scenarios() {
    let output = run(&["compare", "prototype", "startup", "--json"]);

    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["isMoreExpensive"], true);
    assert_eq!(json["totalDelta"], 132.25);
}

#[test]
fn project_has_twelve_months() {
    let output = run(&["project", "-s", "prototype", "--growth", "0.1", "--json"]);

    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["monthlyProjections"].as_array().unwrap().len(), 12);
}

#[test]
fn break_even_default_profile() {
    let output = run(&[
        "break-even",
        "--fixed-costs",
        "10",
        "--revenue-per-unit",
        "0.001",
        "--json",
    ]);

    assert!(output.status.success());
    let json = stdout_json(&output);
    // revenue below marginal cost never breaks even
    assert_eq!(json["breakEvenUnits"], 10_000_000);
    assert_eq!(json["marginalCostPerUnit"], 0.003144);
}

#[test]
fn tiered_cost() {
    let output = run(&["tiered", "1500", "--tier", "0:1", "--tier", "1000:0.5", "--json"]);

    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["cost"], 1.25);
}

#[test]
fn rates_and_scenarios_listings() {
    let rates = run(&["rates", "--json"]);
    assert!(rates.status.success());
    assert_eq!(stdout_json(&rates)["lastUpdated"], "2025-10-13");

    let scenarios = run(&["scenarios", "--json"]);
    assert!(scenarios.status.success());
    let json = stdout_json(&scenarios);
    assert_eq!(json[0]["id"], "prototype");
    assert_eq!(json[0]["totalMonthlyCost"], 6.969);
}

#[test]
fn missing_explicit_config_fails() {
    let output = run(&["rates", "--config", "/definitely/not/here.toml"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("settings file not found"));
}
