// Report tests

use super::*;
use crate::experiment::AveragedResult;
use crate::metrics::StatVector;
use std::collections::BTreeMap;
use std::fs;

fn date(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2014, m, d).unwrap()
}

fn averaged(tpr: &[f64]) -> AveragedResult {
    AveragedResult {
        stats: tpr
            .iter()
            .map(|&t| StatVector {
                tpr: t,
                ..StatVector::default()
            })
            .collect(),
        avstats: BTreeMap::new(),
        key_dates: (0..tpr.len()).map(|i| date(1, 1 + 7 * i as u32)).collect(),
    }
}

fn method(name: &str, tpr: &[f64]) -> MethodResult {
    MethodResult {
        name: name.to_string(),
        averaged: averaged(tpr),
    }
}

#[test]
fn test_metric_labels() {
    assert_eq!(metric_label("FPR"), Some("False positive rate"));
    assert_eq!(metric_label("fpr"), None);
}

#[test]
fn test_comparison_table() {
    let cmp = MethodComparison::new(
        vec![method("Hidost", &[0.9, 0.8]), method("PJScan", &[0.5, 0.25])],
        vec!["TPR".to_string()],
    )
    .unwrap();
    assert_eq!(cmp.row("TPR", 1), vec![Some(0.8), Some(0.25)]);

    let text = cmp.to_string();
    assert!(text.contains("=== True positive rate (TPR) ==="));
    assert!(text.contains("Hidost"));
    assert!(text.contains("0.2500"));
    assert!(text.contains("Dates ranging from 2014-01-01 to 2014-01-08"));
    assert!(text.contains("Total days: 8"));
}

#[test]
fn test_comparison_rejects_unknown_metric() {
    let err = MethodComparison::new(vec![method("a", &[1.0])], vec!["F1".to_string()]).unwrap_err();
    assert!(matches!(err, crate::error::EvalError::InvalidConfiguration(_)));
}

#[test]
fn test_comparison_rejects_period_mismatch() {
    let err = MethodComparison::new(
        vec![method("a", &[1.0, 1.0]), method("b", &[1.0])],
        vec!["TPR".to_string()],
    )
    .unwrap_err();
    assert!(matches!(
        err,
        crate::error::EvalError::InconsistentPeriodCount { run: 2, .. }
    ));
}

#[test]
fn test_av_rates_sorted_descending() {
    let counts: BTreeMap<String, f64> = [("Total", 100.0), ("Hidost", 95.0), ("AV1", 60.0), ("AV2", 80.0)]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    let rates = AvRates::new(&counts).unwrap();
    let names: Vec<&str> = rates.rates.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Total", "Hidost", "AV2", "AV1"]);
    assert_eq!(rates.rate("AV1"), Some(0.6));
    assert_eq!(rates.rate("Total"), Some(1.0));
    assert!(rates.to_string().contains("95.00%"));
}

#[test]
fn test_av_rates_require_total() {
    assert!(AvRates::new(&BTreeMap::new()).is_err());
}

#[test]
fn test_partition_counts_and_order() {
    let dir = tempfile::tempdir().unwrap();
    let write = |name: &str, body: &str| {
        let p = dir.path().join(name);
        fs::write(&p, body).unwrap();
        p
    };
    let train_a = write("train_a", "1 1:1\n0 1:1\n0 2:1\n");
    let test_a = write("test_a", "1 1:1 # 2014/03/02\n0 # 2014/03/05\n");
    let train_b = write("train_b", "1 1:1\n");
    let test_b = write("test_b", "0 # 2014/01/10\n0 # 2014/01/12\n1 # 2014/01/11\n");

    let report = partition_dataset(&[train_a, train_b], &[test_a, test_b]).unwrap();
    assert_eq!(report.key_dates(), vec![date(1, 10), date(3, 2)]);
    assert_eq!(
        report.periods[0],
        PeriodCounts {
            index: 1,
            start: date(1, 10),
            end: date(1, 12),
            pos_tr: 1,
            neg_tr: 0,
            pos_te: 1,
            neg_te: 2,
        }
    );
    assert_eq!(report.periods[1].neg_tr, 2);
    assert!(report.to_string().contains("Total days: 52"));
}

#[test]
fn test_partition_requires_pairs() {
    assert!(partition_dataset(&[], &[]).is_err());
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_drift_between_periods() {
    let lists = vec![
        names(&["/Root", "/Root/Pages", "/Root/JS"]),
        names(&["/Root", "/Root/Pages", "/Root/AA", "/Root/OpenAction"]),
        names(&[]),
    ];
    let drift = feature_drift("Hidost", &lists);
    assert_eq!(
        drift.rows[0],
        DriftRow {
            old: 3,
            added: 2,
            removed: 1,
            same: 2,
            new: 4
        }
    );
    assert_eq!(drift.rows[1].removed, 4);

    let text = drift.to_string();
    assert!(text.contains(" Hidost "));
    assert!(text.contains("2 (67%)"));
    assert!(text.contains("1-2"));
}

#[test]
fn test_read_feature_names_skips_blank_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("feats.txt");
    fs::write(&path, "/Root\n\n  /Root/Pages  \n").unwrap();
    assert_eq!(read_feature_names(&path).unwrap(), names(&["/Root", "/Root/Pages"]));
}

#[test]
fn test_read_feature_names_from_path_dump() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("feats.nppf");
    fs::write(
        &path,
        b"header\0\0\n\0Root\n\0Root\0Pages\n\0Root\0\0OpenAction\n".as_slice(),
    )
    .unwrap();
    assert_eq!(
        read_feature_names(&path).unwrap(),
        names(&["/Root", "/Root/Pages", "/RootOpenAction"])
    );
}

#[test]
fn test_path_dump_without_names() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.nppf");
    fs::write(&path, b"header\0\n".as_slice()).unwrap();
    assert!(read_feature_names(&path).unwrap().is_empty());
}

#[test]
fn test_experiment_summary_lists_periods_and_detectors() {
    let mut result = averaged(&[1.0, 0.5]);
    result.avstats.insert("Total".to_string(), 20.0);
    result.avstats.insert("Hidost".to_string(), 15.0);
    let text = ExperimentSummary(&result).to_string();
    assert!(text.contains("neg_tr"));
    assert!(text.contains("2014-01-08"));
    assert!(text.contains("0.5000"));
    assert!(text.contains("Hidost"));
    assert!(text.contains("Total days: 8"));
}
