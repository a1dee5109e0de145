//! Tests of the reporting subcommands
#![allow(deprecated)] // suppress assert_cmd::Command::cargo_bin deprecation in tests

mod utils;

use assert_cmd::Command;
use predicates::prelude::*;
use utils::Workspace;

const STATS: &str = r#"["neg_tr","pos_tr","neg_te","pos_te","acc","AUC","TPR","FPR"]"#;

/// Two runs over two periods with the given TPR per period
fn bundle(ws: &Workspace, name: &str, tpr: [f64; 2]) -> std::path::PathBuf {
    let row = |t1: f64, t2: f64| {
        format!(
            "[10,10,5,5,0.9,0.95,{},0.1, 12,12,6,6,0.8,0.9,{},0.2]",
            t1, t2
        )
    };
    let body = format!(
        r#"{{
  "res": [{}, {}],
  "avstats": [
    {{"Total": 10, "Hidost": 9, "AV1": 6, "AV2": 8}},
    {{"Total": 10, "Hidost": 7, "AV1": 6, "AV2": 8}}
  ],
  "key_dates": ["2014-01-01", "2014-01-08"],
  "stats": {}
}}"#,
        row(tpr[0], tpr[1]),
        row(tpr[0], tpr[1]),
        STATS
    );
    ws.write(name, &body)
}

#[test]
fn test_avstats_prints_rates() {
    let ws = Workspace::new();
    let res = bundle(&ws, "res.json", [1.0, 0.5]);

    let mut cmd = Command::cargo_bin("drifteval").unwrap();
    cmd.arg("avstats")
        .arg("--res")
        .arg(&res)
        .assert()
        .success()
        .stdout(predicate::str::contains("detector"))
        .stdout(predicate::str::contains("Hidost"))
        .stdout(predicate::str::contains("80.00%"))
        .stdout(predicate::str::contains("100.00%"));
}

#[test]
fn test_avstats_rejects_malformed_bundle() {
    let ws = Workspace::new();
    let res = ws.write(
        "bad.json",
        &format!(
            r#"{{"res": [[1, 2, 3]], "avstats": [{{}}], "key_dates": ["2014-01-01"], "stats": {}}}"#,
            STATS
        ),
    );

    let mut cmd = Command::cargo_bin("drifteval").unwrap();
    cmd.arg("avstats")
        .arg("--res")
        .arg(&res)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid result bundle"));
}

#[test]
fn test_compare_two_methods() {
    let ws = Workspace::new();
    let a = bundle(&ws, "a.json", [1.0, 0.5]);
    let b = bundle(&ws, "b.json", [0.25, 0.75]);

    let mut cmd = Command::cargo_bin("drifteval").unwrap();
    cmd.arg("compare")
        .arg("--res")
        .arg(&a)
        .arg(&b)
        .arg("--methods")
        .arg("Hidost")
        .arg("PJScan")
        .arg("--metrics")
        .arg("TPR")
        .arg("FPR")
        .assert()
        .success()
        .stdout(predicate::str::contains("=== True positive rate (TPR) ==="))
        .stdout(predicate::str::contains("=== False positive rate (FPR) ==="))
        .stdout(predicate::str::contains("PJScan"))
        .stdout(predicate::str::contains("0.7500"))
        .stdout(predicate::str::contains("Dates ranging from 2014-01-01 to 2014-01-08"))
        .stdout(predicate::str::contains("Total days: 8"));
}

#[test]
fn test_compare_rejects_unknown_metric() {
    let ws = Workspace::new();
    let a = bundle(&ws, "a.json", [1.0, 0.5]);

    let mut cmd = Command::cargo_bin("drifteval").unwrap();
    cmd.arg("compare")
        .arg("--res")
        .arg(&a)
        .arg("--methods")
        .arg("Hidost")
        .arg("--metrics")
        .arg("F1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_compare_requires_matching_names() {
    let ws = Workspace::new();
    let a = bundle(&ws, "a.json", [1.0, 0.5]);

    let mut cmd = Command::cargo_bin("drifteval").unwrap();
    cmd.arg("compare")
        .arg("--res")
        .arg(&a)
        .arg("--methods")
        .arg("Hidost")
        .arg("PJScan")
        .arg("--metrics")
        .arg("TPR")
        .assert()
        .failure()
        .stderr(predicate::str::contains("equal number of result files and method names"));
}

#[test]
fn test_partition_report() {
    let ws = Workspace::new();
    let train = ws.train_file("train.libsvm", 9);
    let test = ws.test_file("test.libsvm", 2, 3, 4, 0);

    let mut cmd = Command::cargo_bin("drifteval").unwrap();
    cmd.arg("partition")
        .arg("--train")
        .arg(&train)
        .arg("--test")
        .arg(&test)
        .assert()
        .success()
        .stdout(predicate::str::contains("pos_te"))
        .stdout(predicate::str::contains("2014-02-01"))
        .stdout(predicate::str::contains("Total days: 1"));
}

#[test]
fn test_feature_drift_report() {
    let ws = Workspace::new();
    let p1 = ws.write("p1.txt", "/Root\n/Root/Pages\n/Root/JS\n");
    let p2 = ws.write("p2.txt", "/Root\n/Root/Pages\n/Root/AA\n/Root/OpenAction\n");

    let mut cmd = Command::cargo_bin("drifteval").unwrap();
    cmd.arg("feature-drift")
        .arg("--features")
        .arg(&p1)
        .arg(&p2)
        .arg("--method")
        .arg("Hidost")
        .assert()
        .success()
        .stdout(predicate::str::contains(" Hidost "))
        .stdout(predicate::str::contains("2 (67%)"))
        .stdout(predicate::str::contains("1-2"));
}

#[test]
fn test_feature_drift_needs_two_periods() {
    let ws = Workspace::new();
    let p1 = ws.write("p1.txt", "/Root\n");

    let mut cmd = Command::cargo_bin("drifteval").unwrap();
    cmd.arg("feature-drift")
        .arg("--features")
        .arg(&p1)
        .assert()
        .failure();
}
