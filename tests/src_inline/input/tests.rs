use super::*;

const WRAPPED: &str = r#"{
  "metadata": {"total_organizations": 0, "data_sources": ["NABH", "JCI"]},
  "organizations": [
    {"name": "Org A", "country": "India", "total_score": 90.0},
    {"name": "Org B", "country": "USA", "total_score": 80.0, "certifications": ["JCI"]},
    {"name": "Org C", "total_score": 80.0}
  ],
  "version": 2
}"#;

#[test]
fn test_bare_array_shape() {
    let db = Database::from_json_str(r#"[{"name": "A", "total_score": 1}]"#).unwrap();
    assert_eq!(db.shape, DatabaseShape::Bare);
    assert_eq!(db.organizations.len(), 1);
    assert!(db.metadata().is_none());

    let text = db.to_json_string().unwrap();
    assert!(text.trim_start().starts_with('['));
    assert!(text.ends_with('\n'));
}

#[test]
fn test_wrapped_shape_keeps_sibling_keys_in_order() {
    let db = Database::from_json_str(WRAPPED).unwrap();
    assert_eq!(db.organizations.len(), 3);
    assert!(db.metadata().is_some());

    let text = db.to_json_string().unwrap();
    let meta = text.find("\"metadata\"").unwrap();
    let orgs = text.find("\"organizations\"").unwrap();
    let version = text.find("\"version\"").unwrap();
    assert!(meta < orgs && orgs < version);
    assert!(text.contains("\"certifications\""));

    let again = Database::from_json_str(&text).unwrap();
    assert_eq!(again, db);
}

#[test]
fn test_unsupported_shapes_rejected() {
    for text in ["42", "\"x\"", r#"{"foo": 1}"#, r#"{"organizations": {}}"#] {
        let err = Database::from_json_str(text).unwrap_err();
        assert!(
            matches!(err, StoreError::UnsupportedShape(_)),
            "{text}: {err}"
        );
    }
    assert!(matches!(
        Database::from_json_str("{not json"),
        Err(StoreError::Json(_))
    ));
}

#[test]
fn test_malformed_record_reports_index() {
    let err = Database::from_json_str(r#"[{"name": "A"}, 7]"#).unwrap_err();
    assert!(matches!(err, StoreError::Record { index: 1, .. }));
}

#[test]
fn test_apply_ranking_writes_rank_percentile_and_metadata() {
    let mut db = Database::from_json_str(WRAPPED).unwrap();
    let outcome = db.apply_ranking().unwrap();
    assert_eq!(
        outcome,
        RankingOutcome {
            population: 3,
            distinct_scores: 2
        }
    );

    let ranks = db
        .organizations
        .iter()
        .map(|r| r.rank().valid().unwrap())
        .collect::<Vec<_>>();
    assert_eq!(ranks, vec![1, 2, 2]);
    let b = &db.organizations[1];
    assert!((b.percentile().valid().unwrap() - 200.0 / 3.0).abs() < 1e-9);
    assert_eq!(db.metadata().unwrap()["total_organizations"], 3);
}

#[test]
fn test_apply_ranking_is_idempotent() {
    let mut db = Database::from_json_str(WRAPPED).unwrap();
    db.apply_ranking().unwrap();
    let first = db.to_json_string().unwrap();
    db.apply_ranking().unwrap();
    assert_eq!(db.to_json_string().unwrap(), first);
}

#[test]
fn test_missing_score_rejects_batch_untouched() {
    let text = r#"[
        {"name": "A", "total_score": 90},
        {"name": "B"}
    ]"#;
    let mut db = Database::from_json_str(text).unwrap();
    let before = db.clone();
    let err = db.apply_ranking().unwrap_err();
    assert_eq!(
        err,
        RankError::MissingScore {
            index: 1,
            name: "B".to_string()
        }
    );
    assert_eq!(db, before);
}

#[test]
fn test_non_numeric_score_rejected() {
    let mut db =
        Database::from_json_str(r#"[{"name": "A", "total_score": "ninety"}]"#).unwrap();
    let err = db.apply_ranking().unwrap_err();
    assert!(matches!(err, RankError::NonNumericScore { index: 0, .. }));
    assert!(err.to_string().contains("ninety"));
}

#[test]
fn test_empty_database_ranks_to_empty() {
    let mut db = Database::from_json_str(r#"{"organizations": [], "metadata": {}}"#).unwrap();
    let outcome = db.apply_ranking().unwrap();
    assert_eq!(outcome.population, 0);
    assert_eq!(db.metadata().unwrap()["total_organizations"], 0);
}

#[test]
fn test_wrong_typed_rank_and_percentile_load_and_are_overwritten() {
    let text = r#"[
        {"overall_rank": "3", "name": "A", "percentile": "50", "total_score": 90},
        {"name": "B", "overall_rank": 1.0, "total_score": 80, "percentile": -1}
    ]"#;
    let mut db = Database::from_json_str(text).unwrap();
    assert!(matches!(db.organizations[0].rank(), FieldValue::Malformed(_)));

    db.apply_ranking().unwrap();
    let out = db.to_json_string().unwrap();
    let first = out.find("\"overall_rank\": 1").unwrap();
    let name = out.find("\"name\": \"A\"").unwrap();
    assert!(first < name, "{out}");
    assert_eq!(db.organizations[1].rank(), FieldValue::Valid(2));
    assert_eq!(db.organizations[1].percentile(), FieldValue::Valid(50.0));
}

#[test]
fn test_record_key_order_preserved_on_write() {
    let text = r#"[{"id": 1, "country": "India", "name": "A", "total_score": 5}]"#;
    let mut db = Database::from_json_str(text).unwrap();
    db.apply_ranking().unwrap();
    let value: Value = serde_json::from_str(&db.to_json_string().unwrap()).unwrap();
    let keys = value[0]
        .as_object()
        .unwrap()
        .keys()
        .cloned()
        .collect::<Vec<_>>();
    assert_eq!(
        keys,
        vec!["id", "country", "name", "total_score", "overall_rank", "percentile"]
    );
}
