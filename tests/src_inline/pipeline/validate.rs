use super::*;
use crate::input::Database;
use serde_json::{Value, json};

fn record(name: &str, score: Option<f64>, rank: Option<u32>, pct: Option<f64>) -> OrganizationRecord {
    let mut r = match score {
        Some(s) => OrganizationRecord::new(name, s),
        None => {
            let mut r = OrganizationRecord::default();
            r.set("name", Value::from(name));
            r
        }
    };
    if let Some(rank) = rank {
        r.set("overall_rank", Value::from(rank));
    }
    if let Some(pct) = pct {
        r.set("percentile", Value::from(pct));
    }
    r
}

#[test]
fn test_freshly_ranked_population_is_clean() {
    let mut db = Database::bare(vec![
        OrganizationRecord::new("A", 90.0),
        OrganizationRecord::new("B", 80.0),
        OrganizationRecord::new("C", 80.0),
        OrganizationRecord::new("D", 60.0),
    ]);
    db.apply_ranking().unwrap();
    let report = audit(&db.organizations);
    assert!(report.is_clean(), "{report:?}");
    assert_eq!(report.population, 4);
    assert_eq!(report.distinct_scores, 3);
    assert_eq!(report.tie_groups, 1);
}

#[test]
fn test_empty_population_is_clean() {
    let report = audit(&[]);
    assert!(report.is_clean());
    assert_eq!(report.population, 0);
}

#[test]
fn test_tie_conflict_detected() {
    let records = vec![
        record("A", Some(90.0), Some(1), Some(100.0)),
        record("B", Some(80.0), Some(2), Some(75.0)),
        record("C", Some(80.0), Some(3), Some(50.0)),
        record("D", Some(60.0), Some(4), Some(25.0)),
    ];
    let report = audit(&records);
    assert_eq!(report.defect_count(), 1);
    assert_eq!(
        report.tie_conflicts,
        vec![TieConflict {
            score: 80.0,
            ranks: vec![2, 3],
            names: vec!["B".to_string(), "C".to_string()],
        }]
    );
}

#[test]
fn test_monotonicity_violation_detected() {
    let records = vec![
        record("A", Some(90.0), Some(2), Some(50.0)),
        record("B", Some(80.0), Some(1), Some(100.0)),
    ];
    let report = audit(&records);
    assert_eq!(report.defect_count(), 1);
    assert_eq!(
        report.monotonicity_violations,
        vec![MonotonicityViolation {
            higher_score: 90.0,
            higher_score_rank: 2,
            lower_score: 80.0,
            lower_score_rank: 1,
        }]
    );
}

#[test]
fn test_missing_and_out_of_range_values_reported() {
    let records = vec![
        record("A", Some(90.0), Some(1), None),
        record("B", Some(80.0), Some(2), Some(120.0)),
        record("C", None, None, None),
    ];
    let report = audit(&records);

    assert_eq!(report.missing_percentile, vec!["A".to_string(), "C".to_string()]);
    assert_eq!(report.missing_rank, vec!["C".to_string()]);
    assert_eq!(report.unscored, vec!["C".to_string()]);
    assert_eq!(report.percentile_out_of_range.len(), 1);
    assert_eq!(report.percentile_out_of_range[0].name, "B");
    assert_eq!(report.formula_mismatches.len(), 1);
    let mismatch = &report.formula_mismatches[0];
    assert_eq!(mismatch.rank, 2);
    assert!((mismatch.expected - 200.0 / 3.0).abs() < 1e-9);
    assert!(report.tie_conflicts.is_empty());
    assert!(report.monotonicity_violations.is_empty());
    assert_eq!(report.defect_count(), 6);
    assert!(!report.is_clean());
}

#[test]
fn test_formula_tolerance() {
    let records = vec![
        record("A", Some(90.0), Some(1), Some(100.0 - 1e-9)),
        record("B", Some(80.0), Some(2), Some(50.0 + 1e-3)),
    ];
    let report = audit(&records);
    assert_eq!(report.formula_mismatches.len(), 1);
    assert_eq!(report.formula_mismatches[0].name, "B");
}

#[test]
fn test_wrong_typed_rank_and_percentile_reported_as_malformed() {
    let db = Database::from_json_str(
        r#"[
            {"name": "A", "total_score": 90, "overall_rank": 1.0, "percentile": "100"},
            {"name": "B", "total_score": 80, "overall_rank": -1, "percentile": 50},
            {"name": "C", "total_score": 70, "overall_rank": "3", "percentile": 0}
        ]"#,
    )
    .unwrap();
    let report = audit(&db.organizations);

    let ranks = report
        .malformed_rank
        .iter()
        .map(|f| (f.name.as_str(), f.value.as_str()))
        .collect::<Vec<_>>();
    assert_eq!(ranks, vec![("A", "1.0"), ("B", "-1"), ("C", "\"3\"")]);
    assert_eq!(
        report.malformed_percentile,
        vec![MalformedField {
            name: "A".to_string(),
            value: "\"100\"".to_string(),
        }]
    );
    assert!(report.missing_rank.is_empty());
    assert!(report.missing_percentile.is_empty());
    assert_eq!(report.percentile_out_of_range.len(), 0);
    assert_eq!(report.defect_count(), 4);
}

#[test]
fn test_ranking_repairs_malformed_values() {
    let mut db = Database::from_json_str(
        r#"[
            {"name": "A", "total_score": 90, "overall_rank": "1", "percentile": "100"},
            {"name": "B", "total_score": 80, "overall_rank": 2.5}
        ]"#,
    )
    .unwrap();
    db.apply_ranking().unwrap();
    let report = audit(&db.organizations);
    assert!(report.is_clean(), "{report:?}");
    assert_eq!(
        serde_json::to_value(&db.organizations[0]).unwrap(),
        json!({"name": "A", "total_score": 90, "overall_rank": 1, "percentile": 100.0})
    );
}
