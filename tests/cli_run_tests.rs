//! End-to-end tests of `drifteval run`

mod utils;

use drifteval::results::ResultBundle;
use predicates::prelude::*;
use utils::{arg, Workspace};

fn two_periods(ws: &Workspace) -> Vec<String> {
    let train1 = ws.train_file("train1.libsvm", 30);
    let train2 = ws.train_file("train2.libsvm", 40);
    let test1 = ws.test_file("test1.libsvm", 1, 10, 10, 0);
    let test2 = ws.test_file("test2.libsvm", 2, 6, 8, 100);
    vec![
        "--train".into(),
        arg(&train1),
        arg(&train2),
        "--test".into(),
        arg(&test1),
        arg(&test2),
    ]
}

#[test]
fn test_run_prints_averaged_summary() {
    let ws = Workspace::new();
    let store = ws.store("av.json", &[0, 1, 2, 100]);
    let config = ws.fast_config();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("drifteval");
    cmd.arg("run")
        .args(two_periods(&ws))
        .arg("-s")
        .arg(&store)
        .arg("--config")
        .arg(&config)
        .arg("-c")
        .arg("2")
        .assert()
        .success()
        .stdout(predicate::str::contains("neg_tr"))
        .stdout(predicate::str::contains("AV1"))
        .stdout(predicate::str::contains("Hidost"))
        .stdout(predicate::str::contains("Dates ranging from 2014-01-01 to 2014-02-01"));
}

#[test]
fn test_run_saves_result_bundle() {
    let ws = Workspace::new();
    let store = ws.store("av.json", &[0, 1, 2, 100]);
    let config = ws.fast_config();
    let res = ws.path("res.json");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("drifteval");
    cmd.arg("run")
        .args(two_periods(&ws))
        .arg("-s")
        .arg(&store)
        .arg("--config")
        .arg(&config)
        .arg("-c")
        .arg("3")
        .arg("--res-out")
        .arg(&res)
        .assert()
        .success();

    let bundle = ResultBundle::load(&res).unwrap();
    assert_eq!(bundle.n_runs(), 3);
    assert_eq!(bundle.n_periods(), 2);
    assert_eq!(bundle.avstats[0].total(), 16);
    assert_eq!(bundle.avstats[0].get("AV1"), 4);
    assert_eq!(bundle.avstats[0].get("AV2"), 0);

    // period 1: 10 benign, 10 malicious in the test split
    assert_eq!(bundle.res[0][2], 10.0);
    assert_eq!(bundle.res[0][3], 10.0);
    // the separable data is classified perfectly
    let averaged = bundle.average().unwrap();
    assert_eq!(averaged.series("TPR"), Some(vec![1.0, 1.0]));
    assert_eq!(averaged.series("FPR"), Some(vec![0.0, 0.0]));
}

#[test]
fn test_run_svm_msgpack_bundle() {
    let ws = Workspace::new();
    let store = ws.store("av.json", &[]);
    let res = ws.path("res.msgpack");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("drifteval");
    cmd.arg("run")
        .args(two_periods(&ws))
        .arg("-s")
        .arg(&store)
        .arg("--classifier")
        .arg("svm")
        .arg("--binarize")
        .arg("--res-out")
        .arg(&res)
        .assert()
        .success();

    let bundle = ResultBundle::load(&res).unwrap();
    assert_eq!(bundle.n_runs(), 1);
    assert_eq!(bundle.avstats[0].iter().count(), 2);
}

#[test]
fn test_run_reorders_periods_chronologically() {
    let ws = Workspace::new();
    let store = ws.store("av.json", &[]);
    let config = ws.fast_config();
    let res = ws.path("res.json");
    let train1 = ws.train_file("train1.libsvm", 30);
    let train2 = ws.train_file("train2.libsvm", 40);
    let late = ws.test_file("late.libsvm", 3, 4, 4, 0);
    let early = ws.test_file("early.libsvm", 1, 4, 4, 100);

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("drifteval");
    cmd.arg("run")
        .arg("--train")
        .arg(&train2)
        .arg(&train1)
        .arg("--test")
        .arg(&late)
        .arg(&early)
        .arg("-s")
        .arg(&store)
        .arg("--config")
        .arg(&config)
        .arg("--res-out")
        .arg(&res)
        .assert()
        .success()
        .stderr(predicate::str::contains("not in chronological order"));

    let bundle = ResultBundle::load(&res).unwrap();
    assert!(bundle.key_dates[0] < bundle.key_dates[1]);
    // train1 (30 rows: 15 benign) now pairs with the January test file
    assert_eq!(bundle.res[0][0], 15.0);
    // neg_tr of the second period starts the second block of 8
    assert_eq!(bundle.res[0][8], 20.0);
}

#[test]
fn test_run_rejects_unequal_file_lists() {
    let ws = Workspace::new();
    let store = ws.store("av.json", &[]);
    let train = ws.train_file("train.libsvm", 10);

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("drifteval");
    cmd.arg("run")
        .arg("--train")
        .arg(&train)
        .arg(&train)
        .arg("--test")
        .arg(ws.test_file("test.libsvm", 1, 2, 2, 0))
        .arg("-s")
        .arg(&store)
        .assert()
        .failure()
        .stderr(predicate::str::contains("equal number of training and test files"));
}

#[test]
fn test_run_reports_degenerate_split() {
    let ws = Workspace::new();
    let store = ws.store("av.json", &[]);
    let config = ws.fast_config();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("drifteval");
    cmd.arg("run")
        .arg("--train")
        .arg(ws.train_file("train.libsvm", 10))
        .arg("--test")
        .arg(ws.test_file("test.libsvm", 1, 5, 0, 0))
        .arg("-s")
        .arg(&store)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Degenerate test split in period 1"));
}

#[test]
fn test_run_rejects_bad_subsample() {
    let ws = Workspace::new();
    let store = ws.store("av.json", &[]);

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("drifteval");
    cmd.arg("run")
        .args(two_periods(&ws))
        .arg("-s")
        .arg(&store)
        .arg("--subsample")
        .arg("1.5")
        .assert()
        .failure()
        .stderr(predicate::str::contains("subsample fraction"));
}

#[test]
fn test_run_missing_store_fails() {
    let ws = Workspace::new();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("drifteval");
    cmd.arg("run")
        .args(two_periods(&ws))
        .arg("-s")
        .arg(ws.path("missing.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load detection store"));
}
