//! Snapshot rating recording
//!
//! Records self- and manager-submitted ratings onto existing snapshots.
//! The manager rating is authoritative: once it is present the snapshot's
//! calculated, final and weight-adjusted scores are computed and the
//! snapshot completes. Re-submitting a rating is last-write-wins.

use crate::error::{AppraisalError, Result};
use crate::storage::AppraisalStore;
use crate::types::{
    CompanyId, KraSnapshot, Rater, RatingSubmission, SnapshotId, SnapshotStatus, MAX_RATING,
    MIN_RATING,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;

/// Reject a rating outside the fixed scale before any write
fn validate_rating(rating: u8) -> Result<()> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(AppraisalError::Validation(format!(
            "Rating {} outside the {}-{} scale",
            rating, MIN_RATING, MAX_RATING
        )));
    }
    Ok(())
}

/// Compute the snapshot's scores from its recorded ratings
///
/// Requires a manager rating. The self-rating surrogate is the recorded
/// self rating, else the manager rating, so the average never divides
/// against a missing value. The manager rating stands as the final score.
fn apply_scores(snapshot: &mut KraSnapshot) {
    let Some(manager_rating) = snapshot.manager_rating else {
        return;
    };

    let effective_self = snapshot
        .effective_self_rating()
        .unwrap_or(manager_rating);

    let calculated = (f64::from(effective_self) + f64::from(manager_rating)) / 2.0;

    snapshot.calculated_score = Some(calculated);
    snapshot.final_score = Some(f64::from(manager_rating));
    snapshot.weight_adjusted_score = Some(calculated * (f64::from(snapshot.weight) / 100.0));
    snapshot.status = SnapshotStatus::Completed;
}

/// Records ratings and computes snapshot scores
pub struct RatingRecorder {
    store: Arc<dyn AppraisalStore>,
}

impl RatingRecorder {
    pub fn new(store: Arc<dyn AppraisalStore>) -> Self {
        Self { store }
    }

    /// Record a rating against a snapshot and return the updated row
    ///
    /// The self path marks the snapshot self-rated; the manager path
    /// computes scores and completes it. A self rating arriving after the
    /// manager's recomputes the calculated and weight-adjusted scores with
    /// the real self rating and the snapshot stays completed.
    pub async fn record(
        &self,
        company_id: CompanyId,
        snapshot_id: SnapshotId,
        submission: RatingSubmission,
    ) -> Result<KraSnapshot> {
        validate_rating(submission.rating)?;

        let mut snapshot = self.store.get_snapshot(company_id, snapshot_id).await?;
        let now = Utc::now();

        match submission.rater {
            Rater::Employee => {
                snapshot.self_rating = Some(submission.rating);
                snapshot.self_comments = submission.comments;
                snapshot.self_rated_at = Some(now);

                if snapshot.manager_rating.is_some() {
                    apply_scores(&mut snapshot);
                } else {
                    snapshot.status = SnapshotStatus::SelfRated;
                }
            }
            Rater::Manager => {
                snapshot.manager_rating = Some(submission.rating);
                snapshot.manager_comments = submission.comments;
                snapshot.manager_rated_at = Some(now);
                snapshot.manager_id = submission.manager_id;

                apply_scores(&mut snapshot);
            }
        }

        snapshot.updated_at = now;
        self.store.save_rating(&snapshot).await?;

        debug!(
            "Recorded {:?} rating {} on snapshot {} (status: {})",
            submission.rater,
            submission.rating,
            snapshot_id,
            snapshot.status.as_str()
        );

        Ok(snapshot)
    }
}
