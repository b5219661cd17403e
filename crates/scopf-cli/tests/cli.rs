use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, to_string_pretty, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write_case(dir: &Path, case: &Value) -> PathBuf {
    let path = dir.join("case.json");
    fs::write(&path, to_string_pretty(case).unwrap()).unwrap();
    path
}

fn two_bus(contingencies: Value) -> Value {
    json!({
        "buses": [{ "id": 1 }, { "id": 2 }],
        "branches": [
            { "from": 1, "to": 2, "reactance": 0.1, "flow_min": -100.0, "flow_max": 100.0 }
        ],
        "generators": [
            { "bus": 1, "pmin": 0.0, "pmax": 200.0, "cost": 10.0, "alpha": 1.0 }
        ],
        "demand": { "2": 50.0 },
        "contingencies": contingencies
    })
}

fn meshed() -> Value {
    json!({
        "buses": [{ "id": 1 }, { "id": 2, "demand": 60.0 }, { "id": 3 }],
        "branches": [
            { "from": 1, "to": 2, "reactance": 0.1, "flow_min": -80.0, "flow_max": 80.0 },
            { "from": 2, "to": 3, "reactance": 0.1, "flow_min": -80.0, "flow_max": 80.0 },
            { "from": 1, "to": 3, "reactance": 0.1, "flow_min": -80.0, "flow_max": 80.0 }
        ],
        "generators": [
            { "bus": 1, "pmin": 0.0, "pmax": 150.0, "cost": 10.0, "alpha": 0.5 },
            { "bus": 3, "pmin": 0.0, "pmax": 150.0, "cost": 25.0, "alpha": 0.5 }
        ],
        "contingencies": { "branches": ["1-2-1"], "generators": ["3-1"] }
    })
}

#[test]
fn scopf_solve_writes_solution() {
    let tmp = tempdir().unwrap();
    let case = write_case(tmp.path(), &two_bus(json!({})));
    let out = tmp.path().join("solution.json");

    let mut cmd = Command::cargo_bin("scopf").unwrap();
    cmd.args([
        "solve",
        case.to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
        "--threads",
        "2",
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("Objective: $500.00/hr"));

    let solution: Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    let pg = solution["base"]["generation"]["1-1"].as_f64().unwrap();
    assert!((pg - 50.0).abs() < 1e-3, "pg = {}", pg);
    assert_eq!(solution["lp_solver"], "clarabel");
}

#[test]
fn scopf_solve_with_contingencies_and_config() {
    let tmp = tempdir().unwrap();
    let case = write_case(tmp.path(), &meshed());
    let config = tmp.path().join("scopf.toml");
    fs::write(&config, "parallel = false\nangle_reference = \"per_island\"\n").unwrap();
    let out = tmp.path().join("solution.json");

    let mut cmd = Command::cargo_bin("scopf").unwrap();
    cmd.args([
        "solve",
        case.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
        "--lp-solver",
        "clarabel",
        "-o",
        out.to_str().unwrap(),
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("3 scenarios"));

    let solution: Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert!(solution["branch_contingencies"]["1-2-1"]["generation"]["1-1"].is_number());
    assert!(solution["generator_contingencies"]["3-1"]["omega"].is_number());
    assert!(solution["generator_contingencies"]["3-1"]["generation"]["3-1"].is_null());
}

#[test]
fn scopf_solve_infeasible_exits_with_2() {
    let tmp = tempdir().unwrap();
    let case = write_case(tmp.path(), &two_bus(json!({ "generators": ["1-1"] })));

    let mut cmd = Command::cargo_bin("scopf").unwrap();
    cmd.args(["solve", case.to_str().unwrap()])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("infeasible"));
}

#[test]
fn scopf_rejects_unknown_lp_solver() {
    let tmp = tempdir().unwrap();
    let case = write_case(tmp.path(), &two_bus(json!({})));

    let mut cmd = Command::cargo_bin("scopf").unwrap();
    cmd.args(["solve", case.to_str().unwrap(), "--lp-solver", "glpk"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown lp solver 'glpk'"));
}

#[test]
fn scopf_validate_reports_bad_input() {
    let tmp = tempdir().unwrap();
    let mut case = two_bus(json!({ "branches": ["2-1-1"] }));
    case["branches"][0]["reactance"] = json!(0.0);
    let case = write_case(tmp.path(), &case);

    let mut cmd = Command::cargo_bin("scopf").unwrap();
    cmd.args(["validate", case.to_str().unwrap()])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Reactance must be finite and nonzero"));
}

#[test]
fn scopf_validate_reports_dangling_contingency() {
    let tmp = tempdir().unwrap();
    let case = write_case(tmp.path(), &two_bus(json!({ "generators": ["2-1"] })));

    let mut cmd = Command::cargo_bin("scopf").unwrap();
    cmd.args(["validate", case.to_str().unwrap()])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("gen 2-1"));
}

#[test]
fn scopf_validate_accepts_good_case() {
    let tmp = tempdir().unwrap();
    let case = write_case(tmp.path(), &meshed());

    let mut cmd = Command::cargo_bin("scopf").unwrap();
    cmd.args(["validate", case.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Network OK: 3 buses"))
        .stdout(predicate::str::contains("Contingencies OK: 1 branch, 1 generator"))
        .stdout(predicate::str::contains("Diagnostics: No issues"));
}

#[test]
fn scopf_validate_lists_stranded_demand() {
    let tmp = tempdir().unwrap();
    let case = write_case(tmp.path(), &two_bus(json!({ "branches": ["1-2-1"] })));

    let mut cmd = Command::cargo_bin("scopf").unwrap();
    cmd.args(["validate", case.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Diagnostics: 2 warnings"))
        .stdout(predicate::str::contains(
            "[warning:islanding] Buses 2 carry 50.0 MW of demand with no generator attached (branch 1-2-1)",
        ));
}

#[cfg(not(feature = "solver-highs"))]
#[test]
fn scopf_solve_reports_missing_backend() {
    let tmp = tempdir().unwrap();
    let case = write_case(tmp.path(), &two_bus(json!({})));

    let mut cmd = Command::cargo_bin("scopf").unwrap();
    cmd.args(["solve", case.to_str().unwrap(), "--lp-solver", "highs"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("lp solver 'highs' is not compiled in"));
}

#[test]
fn scopf_inspect_prints_row_counts() {
    let tmp = tempdir().unwrap();
    let case = write_case(tmp.path(), &meshed());

    let mut cmd = Command::cargo_bin("scopf").unwrap();
    cmd.args(["inspect", case.to_str().unwrap(), "--free-angles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("across 3 scenarios"))
        .stdout(predicate::str::is_match(r"power_balance\s+9").unwrap())
        .stdout(predicate::str::is_match(r"angle_reference\s+0").unwrap());
}

#[test]
fn scopf_missing_case_file_fails() {
    let mut cmd = Command::cargo_bin("scopf").unwrap();
    cmd.args(["validate", "does-not-exist.json"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("reading case file"));
}
