//! Rating and rollup integration tests
//!
//! Covers the dual-rating score math, lifecycle transitions, rollup
//! fallback behavior, and the end-to-end Store Manager scenario.

use appraise::storage::test_utils::{
    create_test_store, job_kra_fixture, participant_fixture, responsibility_fixture,
};
use appraise::{
    AppraisalEngine, AppraisalError, AppraisalStore, AssessmentMode, CompanyId, JobId,
    KraSnapshot, ParticipantId, Rater, RatingSubmission, Responsibility, SnapshotId,
    SnapshotStatus,
};
use appraise::storage::libsql::LibsqlStore;
use std::sync::Arc;

struct Setup {
    store: Arc<LibsqlStore>,
    engine: AppraisalEngine,
    company_id: CompanyId,
    job_id: JobId,
    participant_id: ParticipantId,
}

async fn setup() -> Setup {
    let store = create_test_store().await.expect("test store");
    let engine = AppraisalEngine::new(store.clone());
    Setup {
        store,
        engine,
        company_id: CompanyId::new(),
        job_id: JobId::new(),
        participant_id: participant_fixture(),
    }
}

/// One KRA-based responsibility with job KRAs of the given weights,
/// populated for the participant. Returns the responsibility and its
/// snapshots in sequence order.
async fn populated_responsibility(
    s: &Setup,
    kra_weights: &[u32],
) -> (Responsibility, Vec<KraSnapshot>) {
    let responsibility = responsibility_fixture(
        s.company_id,
        s.job_id,
        "Sales Targets",
        100,
        AssessmentMode::KraBased,
        0,
    );
    s.store
        .insert_responsibility(&responsibility)
        .await
        .expect("insert responsibility");

    for (i, weight) in kra_weights.iter().enumerate() {
        let kra = job_kra_fixture(
            s.company_id,
            s.job_id,
            responsibility.id,
            None,
            Some(&format!("KRA {}", i + 1)),
            *weight,
        );
        s.store.insert_job_kra(&kra).await.expect("insert job kra");
    }

    s.engine
        .populate(s.company_id, s.participant_id, s.job_id)
        .await
        .expect("populate");

    let snapshots = s
        .store
        .list_snapshots(s.company_id, s.participant_id, responsibility.id)
        .await
        .expect("list snapshots");

    (responsibility, snapshots)
}

fn self_rating(rating: u8) -> RatingSubmission {
    RatingSubmission {
        rater: Rater::Employee,
        rating,
        comments: Some("self assessment".to_string()),
        manager_id: None,
    }
}

fn manager_rating(rating: u8, manager_id: ParticipantId) -> RatingSubmission {
    RatingSubmission {
        rater: Rater::Manager,
        rating,
        comments: Some("manager review".to_string()),
        manager_id: Some(manager_id),
    }
}

#[tokio::test]
async fn test_rating_round_trip() {
    let s = setup().await;
    let (_, snapshots) = populated_responsibility(&s, &[60]).await;
    let snapshot_id = snapshots[0].id;
    let manager = participant_fixture();

    let after_self = s
        .engine
        .record_rating(s.company_id, snapshot_id, self_rating(3))
        .await
        .expect("self rating");
    assert_eq!(after_self.status, SnapshotStatus::SelfRated);
    assert_eq!(after_self.self_rating, Some(3));
    assert!(after_self.self_rated_at.is_some());
    assert_eq!(after_self.final_score, None);

    let after_manager = s
        .engine
        .record_rating(s.company_id, snapshot_id, manager_rating(5, manager))
        .await
        .expect("manager rating");
    assert_eq!(after_manager.status, SnapshotStatus::Completed);
    assert_eq!(after_manager.calculated_score, Some(4.0));
    assert_eq!(after_manager.final_score, Some(5.0));
    assert_eq!(after_manager.weight_adjusted_score, Some(4.0 * 0.6));
    assert_eq!(after_manager.manager_id, Some(manager));

    // Persisted state matches what the recorder returned
    let stored = s
        .store
        .get_snapshot(s.company_id, snapshot_id)
        .await
        .expect("get snapshot");
    assert_eq!(stored.status, SnapshotStatus::Completed);
    assert_eq!(stored.calculated_score, Some(4.0));
    assert_eq!(stored.final_score, Some(5.0));
    assert_eq!(stored.self_comments.as_deref(), Some("self assessment"));
    assert_eq!(stored.manager_comments.as_deref(), Some("manager review"));
}

#[tokio::test]
async fn test_manager_only_rating() {
    let s = setup().await;
    let (_, snapshots) = populated_responsibility(&s, &[100]).await;
    let manager = participant_fixture();

    let snapshot = s
        .engine
        .record_rating(s.company_id, snapshots[0].id, manager_rating(5, manager))
        .await
        .expect("manager rating");

    // Manager rating stands in for the missing self rating
    assert_eq!(snapshot.calculated_score, Some(5.0));
    assert_eq!(snapshot.final_score, Some(5.0));
    assert_eq!(snapshot.status, SnapshotStatus::Completed);
    assert_eq!(snapshot.self_rating, None);
}

#[tokio::test]
async fn test_late_self_rating_keeps_snapshot_completed() {
    let s = setup().await;
    let (_, snapshots) = populated_responsibility(&s, &[100]).await;
    let snapshot_id = snapshots[0].id;
    let manager = participant_fixture();

    s.engine
        .record_rating(s.company_id, snapshot_id, manager_rating(5, manager))
        .await
        .expect("manager rating");

    let snapshot = s
        .engine
        .record_rating(s.company_id, snapshot_id, self_rating(3))
        .await
        .expect("late self rating");

    assert_eq!(snapshot.status, SnapshotStatus::Completed);
    assert_eq!(snapshot.calculated_score, Some(4.0));
    assert_eq!(snapshot.final_score, Some(5.0));
}

#[tokio::test]
async fn test_rating_outside_scale_rejected() {
    let s = setup().await;
    let (_, snapshots) = populated_responsibility(&s, &[100]).await;

    let err = s
        .engine
        .record_rating(s.company_id, snapshots[0].id, self_rating(6))
        .await
        .unwrap_err();
    assert!(matches!(err, AppraisalError::Validation(_)));

    // Nothing was written
    let stored = s
        .store
        .get_snapshot(s.company_id, snapshots[0].id)
        .await
        .expect("get snapshot");
    assert_eq!(stored.status, SnapshotStatus::Pending);
    assert_eq!(stored.self_rating, None);
}

#[tokio::test]
async fn test_rating_unknown_snapshot_fails() {
    let s = setup().await;

    let err = s
        .engine
        .record_rating(s.company_id, SnapshotId::new(), self_rating(3))
        .await
        .unwrap_err();
    assert!(matches!(err, AppraisalError::SnapshotNotFound(_)));
}

#[tokio::test]
async fn test_rollup_with_partial_data() {
    let s = setup().await;
    let (responsibility, snapshots) = populated_responsibility(&s, &[60, 40]).await;
    let manager = participant_fixture();

    // Only the weight-60 snapshot gets rated
    let rated = snapshots.iter().find(|sn| sn.weight == 60).expect("weight-60");
    s.engine
        .record_rating(s.company_id, rated.id, manager_rating(4, manager))
        .await
        .expect("manager rating");

    let score = s
        .engine
        .rollup(s.company_id, s.participant_id, responsibility.id)
        .await
        .expect("rollup");
    assert_eq!(score, Some(4.0));
}

#[tokio::test]
async fn test_rollup_with_no_snapshots() {
    let s = setup().await;

    let score = s
        .engine
        .rollup(s.company_id, s.participant_id, appraise::ResponsibilityId::new())
        .await
        .expect("rollup");
    assert_eq!(score, None);
}

#[tokio::test]
async fn test_rollup_uses_self_rating_mid_cycle() {
    let s = setup().await;
    let (responsibility, snapshots) = populated_responsibility(&s, &[50, 50]).await;
    let manager = participant_fixture();

    let first = &snapshots[0];
    let second = &snapshots[1];

    s.engine
        .record_rating(s.company_id, first.id, self_rating(3))
        .await
        .expect("self rating");
    s.engine
        .record_rating(s.company_id, second.id, manager_rating(5, manager))
        .await
        .expect("manager rating");

    // Self-rated snapshot contributes provisionally: (3*50 + 5*50) / 100
    let score = s
        .engine
        .rollup(s.company_id, s.participant_id, responsibility.id)
        .await
        .expect("rollup");
    assert_eq!(score, Some(4.0));
}

#[tokio::test]
async fn test_store_manager_end_to_end() {
    let s = setup().await;
    let manager = participant_fixture();

    // Job "Store Manager": "Sales Targets" (weight 70, auto, one job KRA)
    // and "Team Leadership" (weight 30, responsibility-only).
    let sales = responsibility_fixture(
        s.company_id,
        s.job_id,
        "Sales Targets",
        70,
        AssessmentMode::Auto,
        0,
    );
    let leadership = responsibility_fixture(
        s.company_id,
        s.job_id,
        "Team Leadership",
        30,
        AssessmentMode::ResponsibilityOnly,
        1,
    );
    s.store
        .insert_responsibility(&sales)
        .await
        .expect("insert sales");
    s.store
        .insert_responsibility(&leadership)
        .await
        .expect("insert leadership");

    let revenue = job_kra_fixture(
        s.company_id,
        s.job_id,
        sales.id,
        None,
        Some("Monthly Revenue"),
        100,
    );
    s.store.insert_job_kra(&revenue).await.expect("insert kra");

    let outcome = s
        .engine
        .populate(s.company_id, s.participant_id, s.job_id)
        .await
        .expect("populate");
    assert_eq!(outcome.populated, 1);

    let snapshots = s
        .store
        .list_snapshots(s.company_id, s.participant_id, sales.id)
        .await
        .expect("list snapshots");
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].name, "Monthly Revenue");

    s.engine
        .record_rating(s.company_id, snapshots[0].id, self_rating(4))
        .await
        .expect("self rating");
    s.engine
        .record_rating(s.company_id, snapshots[0].id, manager_rating(4, manager))
        .await
        .expect("manager rating");

    let sales_score = s
        .engine
        .rollup(s.company_id, s.participant_id, sales.id)
        .await
        .expect("rollup");
    assert_eq!(sales_score, Some(4.0));

    // Team Leadership has no snapshots; its score comes from a direct
    // responsibility-level rating path outside this engine.
    let leadership_score = s
        .engine
        .rollup(s.company_id, s.participant_id, leadership.id)
        .await
        .expect("rollup");
    assert_eq!(leadership_score, None);
}
