//! Responsibility-level score rollup
//!
//! Aggregates a responsibility's KRA snapshot scores into one
//! weight-proportional mean. Each snapshot contributes its best available
//! score (final, else manager, else self), so a partially completed
//! appraisal still produces a provisional rollup.

use crate::error::Result;
use crate::storage::AppraisalStore;
use crate::types::{CompanyId, KraSnapshot, ParticipantId, ResponsibilityId};
use std::sync::Arc;
use tracing::debug;

/// Computes weighted responsibility scores from snapshot ratings
pub struct RollupCalculator {
    store: Arc<dyn AppraisalStore>,
}

impl RollupCalculator {
    pub fn new(store: Arc<dyn AppraisalStore>) -> Self {
        Self { store }
    }

    /// Weighted mean of a responsibility's snapshot scores
    ///
    /// Returns `None` when the responsibility has no snapshots, or when no
    /// snapshot contributes (no score at all, or zero weight). Never 0 or
    /// NaN for an empty set.
    pub async fn rollup(
        &self,
        company_id: CompanyId,
        participant_id: ParticipantId,
        responsibility_id: ResponsibilityId,
    ) -> Result<Option<f64>> {
        let snapshots = self
            .store
            .list_snapshots(company_id, participant_id, responsibility_id)
            .await?;

        if snapshots.is_empty() {
            return Ok(None);
        }

        let score = weighted_mean(&snapshots);

        debug!(
            "Rollup for participant {} responsibility {}: {:?} over {} snapshots",
            participant_id,
            responsibility_id,
            score,
            snapshots.len()
        );

        Ok(score)
    }
}

/// Weight-proportional mean over the contributing snapshots
///
/// A snapshot contributes only when it has a score (final → manager → self
/// fallback, evaluated per snapshot) and a positive weight; everything else
/// adds zero to both numerator and denominator.
fn weighted_mean(snapshots: &[KraSnapshot]) -> Option<f64> {
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;

    for snapshot in snapshots {
        let Some(score) = snapshot.contributing_score() else {
            continue;
        };
        if snapshot.weight == 0 {
            continue;
        }

        let weight = f64::from(snapshot.weight);
        weighted_sum += score * weight;
        weight_total += weight;
    }

    if weight_total == 0.0 {
        return None;
    }

    Some(weighted_sum / weight_total)
}
