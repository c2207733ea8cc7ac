//! Integration tests for scoring: ingestion, aggregation, overrides, lock.

use serde_json::json;

use tenderscope_core::{
    Category, Criterion, CriterionId, EditOutcome, EditRejection, EngineConfig, MatrixState,
    Provenance, Role, Submission, TenderError, TenderSession, Vendor, VendorId, METRICS,
};

fn criteria() -> Vec<Criterion> {
    vec![
        Criterion::new("iso", "ISO 9001", Category::Technical, 40.0),
        Criterion::new("profile", "Implementation Profile", Category::Technical, 60.0),
        Criterion::new("months", "Implementation Months", Category::Financial, 100.0),
    ]
}

fn session() -> TenderSession {
    TenderSession::new(
        "T-2024-017",
        criteria(),
        vec![Vendor::new("v1", "Acme"), Vendor::new("v2", "Globex")],
        EngineConfig::default(),
    )
}

fn submissions() -> Vec<Submission> {
    serde_json::from_value(json!([
        {
            "vendor_id": "v1",
            "values": {
                "ISO 9001": "Yes",
                "Implementation Profile": {
                    "man_months": 560,
                    "consultants": 25,
                    "experience_years": "10"
                },
                "Implementation Months": 6
            }
        },
        {
            "vendor_id": "v2",
            "values": {
                "ISO 9001": " no ",
                "Implementation Profile": { "man_months": 700 },
                "Implementation Months": "30"
            }
        }
    ]))
    .unwrap()
}

fn loaded() -> TenderSession {
    let mut s = session();
    for sub in submissions() {
        assert!(s.ingest(sub).unwrap().is_applied());
    }
    s
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// ── Normalization through ingestion ──

#[test]
fn ingested_values_normalize_per_criterion() {
    let s = loaded();
    let m = s.matrix();
    let v1 = VendorId::new("v1");
    let v2 = VendorId::new("v2");

    assert_eq!(m.score(&CriterionId::new("iso"), &v1).unwrap().value, 10.0);
    assert_eq!(m.score(&CriterionId::new("iso"), &v2).unwrap().value, 0.0);

    // 0.4 * 8 + 0.3 * 5 + 0.3 * 5
    let profile = m.score(&CriterionId::new("profile"), &v1).unwrap();
    assert!(close(profile.value, 6.2));
    assert_eq!(profile.confidence, 1.0);
    assert_eq!(profile.provenance, Provenance::Machine);

    // Only man_months present: full marks on 0.4 of the blend.
    let partial = m.score(&CriterionId::new("profile"), &v2).unwrap();
    assert!(close(partial.value, 4.0));
    assert!(close(partial.confidence, 1.0 / 3.0));

    // Inverse scale: 6 of 24 months, and over the ceiling clamps to 0.
    assert!(close(m.score(&CriterionId::new("months"), &v1).unwrap().value, 7.5));
    assert_eq!(m.score(&CriterionId::new("months"), &v2).unwrap().value, 0.0);
}

#[test]
fn every_normalized_score_is_in_range() {
    let s = loaded();
    for score in s.matrix().scores() {
        assert!((0.0..=10.0).contains(&score.value), "{score:?}");
        assert!((0.0..=1.0).contains(&score.confidence), "{score:?}");
    }
}

#[test]
fn missing_criterion_value_scores_zero() {
    let mut s = session();
    let sub: Submission = serde_json::from_value(json!({
        "vendor_id": "v1",
        "values": { "ISO 9001": null }
    }))
    .unwrap();
    s.ingest(sub).unwrap();
    let score = s
        .matrix()
        .score(&CriterionId::new("iso"), &VendorId::new("v1"))
        .unwrap();
    assert_eq!(score.value, 0.0);
    assert_eq!(score.confidence, 0.0);
}

// ── Aggregation and ranking ──

#[test]
fn category_scores_are_weighted_and_ranked() {
    let s = loaded();
    let ranking = s.ranking(Category::Technical);
    assert_eq!(ranking.len(), 2);
    assert_eq!(ranking[0].vendor_id, VendorId::new("v1"));
    assert_eq!(ranking[0].rank, 1);
    // 0.4 * 10 + 0.6 * 6.2
    assert!(close(ranking[0].score, 7.72));
    assert!(close(ranking[0].ui_score, 77.2));
    assert!(close(ranking[1].score, 2.4));
}

#[test]
fn all_tens_aggregate_to_ten_for_any_weights() {
    for weights in [[1.0, 1.0], [90.0, 10.0], [0.0, 35.0], [250.0, 3.0]] {
        let mut s = TenderSession::new(
            "T-1",
            vec![
                Criterion::new("a", "A", Category::Esg, weights[0]),
                Criterion::new("b", "B", Category::Esg, weights[1]),
            ],
            vec![Vendor::new("v1", "Acme")],
            EngineConfig::default(),
        );
        let sub: Submission =
            serde_json::from_value(json!({"vendor_id": "v1", "values": {"A": "yes", "B": "YES"}}))
                .unwrap();
        s.ingest(sub).unwrap();
        assert!(close(
            s.category_score(&VendorId::new("v1"), Category::Esg),
            10.0
        ));
    }
}

#[test]
fn misaligned_weights_warn_but_do_not_block_lock() {
    let mut s = loaded();
    let out = s.set_weight(&CriterionId::new("iso"), 10.0).unwrap();
    assert_eq!(out, EditOutcome::Applied);

    let alignment = s.alignment(Category::Technical);
    assert_eq!(alignment.total_weight, 70.0);
    assert!(!alignment.aligned);

    let snapshot = s.lock(Role::Chair).unwrap();
    assert!(snapshot
        .content
        .alignments
        .iter()
        .any(|a| a.category == Category::Technical && !a.aligned));
}

// ── Overrides ──

#[test]
fn override_is_kept_until_reset() {
    let mut s = loaded();
    let c = CriterionId::new("profile");
    let v = VendorId::new("v2");

    s.override_score(&c, &v, 9.0).unwrap();
    assert!(s.matrix().score(&c, &v).unwrap().is_overridden());

    for sub in submissions() {
        s.ingest(sub).unwrap();
    }
    assert_eq!(s.matrix().score(&c, &v).unwrap().value, 9.0);

    s.reset_override(&c, &v).unwrap();
    let restored = s.matrix().score(&c, &v).unwrap();
    assert_eq!(restored.provenance, Provenance::Machine);
    assert!(close(restored.value, 4.0));
}

#[test]
fn override_out_of_range_is_refused() {
    let mut s = loaded();
    let out = s
        .override_score(&CriterionId::new("iso"), &VendorId::new("v1"), 11.0)
        .unwrap();
    assert_eq!(
        out,
        EditOutcome::Rejected {
            reason: EditRejection::ScoreOutOfRange { value: 11.0 }
        }
    );
}

#[test]
fn unknown_ids_are_errors() {
    let mut s = loaded();
    assert!(matches!(
        s.set_weight(&CriterionId::new("nope"), 5.0).unwrap_err(),
        TenderError::UnknownCriterion(_)
    ));
    assert!(matches!(
        s.override_score(&CriterionId::new("iso"), &VendorId::new("v9"), 5.0)
            .unwrap_err(),
        TenderError::UnknownVendor(_)
    ));
}

// ── Lock ──

#[test]
fn only_chair_may_lock() {
    let mut s = loaded();
    for role in [Role::Evaluator, Role::Observer] {
        let err = s.lock(role).unwrap_err();
        assert!(err.to_string().contains("only the chair"));
        assert_eq!(s.lifecycle_state(), MatrixState::Editable);
    }
    assert!(s.snapshot().is_none());
    assert_eq!(s.history().len(), 2);
    assert!(s.history().iter().all(|h| h.to.is_none()));
}

#[test]
fn lock_twice_yields_one_transition() {
    let mut s = loaded();
    s.lock(Role::Chair).unwrap();
    assert!(matches!(
        s.lock(Role::Chair).unwrap_err(),
        TenderError::Transition(_)
    ));
    assert_eq!(s.lifecycle_state(), MatrixState::Locked);
    let accepted = s.history().iter().filter(|h| h.to.is_some()).count();
    assert_eq!(accepted, 1);
}

#[test]
fn locked_matrix_refuses_edits_and_keeps_snapshot_valid() {
    let mut s = loaded();
    let digest = s.lock(Role::Chair).unwrap().digest.clone();
    let before = METRICS.edits_rejected();

    let out = s.set_weight(&CriterionId::new("iso"), 55.0).unwrap();
    assert_eq!(
        out,
        EditOutcome::Rejected {
            reason: EditRejection::MatrixLocked
        }
    );
    assert!(METRICS.edits_rejected() > before);

    let snapshot = s.snapshot().unwrap();
    assert_eq!(snapshot.digest, digest);
    assert_eq!(snapshot.locked_by, Role::Chair);
    snapshot.verify().unwrap();
    assert_eq!(snapshot.content.scores.len(), 6);
    assert_eq!(snapshot.content.rankings[&Category::Technical][0].rank, 1);
}
