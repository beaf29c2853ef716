//! Appraisal scoring engine
//!
//! The four components of the KRA scoring core: weight validation and
//! repair, snapshot population, rating recording, and score rollup. Each
//! component runs request/response over the store with no shared in-process
//! state; `AppraisalEngine` bundles them behind one handle.

pub mod catalog;
pub mod populate;
pub mod rating;
pub mod rollup;
pub mod weights;

use crate::error::Result;
use crate::storage::AppraisalStore;
use crate::types::{
    CompanyId, JobId, KraId, KraSnapshot, ParticipantId, PopulationOutcome, RatingSubmission,
    ResponsibilityId, SnapshotId, WeightReport,
};
use std::sync::Arc;

pub use catalog::{resolve_effective_kras, EffectiveKras, KraSource};
pub use populate::SnapshotPopulator;
pub use rating::RatingRecorder;
pub use rollup::RollupCalculator;
pub use weights::{distribute_evenly, WeightValidator};

/// Facade over the four scoring components
pub struct AppraisalEngine {
    weights: WeightValidator,
    populator: SnapshotPopulator,
    recorder: RatingRecorder,
    rollup: RollupCalculator,
}

impl AppraisalEngine {
    pub fn new(store: Arc<dyn AppraisalStore>) -> Self {
        Self {
            weights: WeightValidator::new(store.clone()),
            populator: SnapshotPopulator::new(store.clone()),
            recorder: RatingRecorder::new(store.clone()),
            rollup: RollupCalculator::new(store),
        }
    }

    /// Validate a job's responsibility and KRA weight totals
    pub async fn validate_weights(
        &self,
        company_id: CompanyId,
        job_id: JobId,
    ) -> Result<WeightReport> {
        self.weights.validate(company_id, job_id).await
    }

    /// Evenly redistribute a job's responsibility weights
    pub async fn distribute_responsibility_weights(
        &self,
        company_id: CompanyId,
        job_id: JobId,
    ) -> Result<Vec<(ResponsibilityId, u32)>> {
        self.weights
            .distribute_responsibility_weights(company_id, job_id)
            .await
    }

    /// Evenly redistribute KRA weights within one responsibility
    pub async fn distribute_kra_weights(
        &self,
        company_id: CompanyId,
        job_id: JobId,
        responsibility_id: ResponsibilityId,
    ) -> Result<Vec<(KraId, u32)>> {
        self.weights
            .distribute_kra_weights(company_id, job_id, responsibility_id)
            .await
    }

    /// Create KRA snapshots for a participant (idempotent)
    pub async fn populate(
        &self,
        company_id: CompanyId,
        participant_id: ParticipantId,
        job_id: JobId,
    ) -> Result<PopulationOutcome> {
        self.populator
            .populate(company_id, participant_id, job_id)
            .await
    }

    /// Record a self or manager rating on a snapshot
    pub async fn record_rating(
        &self,
        company_id: CompanyId,
        snapshot_id: SnapshotId,
        submission: RatingSubmission,
    ) -> Result<KraSnapshot> {
        self.recorder
            .record(company_id, snapshot_id, submission)
            .await
    }

    /// Weighted responsibility-level score from snapshot ratings
    pub async fn rollup(
        &self,
        company_id: CompanyId,
        participant_id: ParticipantId,
        responsibility_id: ResponsibilityId,
    ) -> Result<Option<f64>> {
        self.rollup
            .rollup(company_id, participant_id, responsibility_id)
            .await
    }
}
