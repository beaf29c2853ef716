//! Storage layer for the appraisal scoring engine
//!
//! Provides the typed store abstraction the engine components depend on,
//! and the libSQL implementation behind it.

pub mod libsql;
pub mod test_utils;

use crate::error::Result;
use crate::types::{
    BaseKra, CompanyId, JobId, JobKra, KraId, KraSnapshot, ParticipantId, Responsibility,
    ResponsibilityId, SnapshotId,
};
use async_trait::async_trait;
use std::collections::HashSet;

/// Typed store contract for the scoring engine
///
/// Responsibilities and KRA definitions are owned by the job-architecture
/// tooling; the engine only reads them through this trait. Snapshots are
/// owned by the engine end to end. Every method is scoped by company id.
#[async_trait]
pub trait AppraisalStore: Send + Sync {
    /// Currently-effective responsibilities for a job (no end date),
    /// ordered by sequence
    async fn list_effective_responsibilities(
        &self,
        company_id: CompanyId,
        job_id: JobId,
    ) -> Result<Vec<Responsibility>>;

    /// Active job-specific KRAs for a job, across all its responsibilities
    async fn list_job_kras(&self, company_id: CompanyId, job_id: JobId) -> Result<Vec<JobKra>>;

    /// Active base/library KRAs for a responsibility, ordered by sequence
    async fn list_base_kras(
        &self,
        company_id: CompanyId,
        responsibility_id: ResponsibilityId,
    ) -> Result<Vec<BaseKra>>;

    /// Look up a base KRA by id (linked metadata for job-specific overrides)
    async fn get_base_kra(
        &self,
        company_id: CompanyId,
        kra_id: KraId,
    ) -> Result<Option<BaseKra>>;

    /// Idempotency guard: (responsibility, source KRA) pairs that already
    /// have a snapshot for this participant
    async fn existing_snapshot_keys(
        &self,
        company_id: CompanyId,
        participant_id: ParticipantId,
    ) -> Result<HashSet<(ResponsibilityId, KraId)>>;

    /// Insert a batch of snapshots in a single transaction
    ///
    /// Conflicts on the (participant, responsibility, source KRA)
    /// uniqueness key are ignored, not duplicated. Returns the number of
    /// rows actually inserted.
    async fn insert_snapshots(
        &self,
        company_id: CompanyId,
        snapshots: &[KraSnapshot],
    ) -> Result<usize>;

    /// Fetch a snapshot by id
    async fn get_snapshot(
        &self,
        company_id: CompanyId,
        snapshot_id: SnapshotId,
    ) -> Result<KraSnapshot>;

    /// Persist a snapshot's rating, score and status columns (last write wins)
    async fn save_rating(&self, snapshot: &KraSnapshot) -> Result<()>;

    /// All snapshots for one (participant, responsibility), ordered by
    /// sequence
    async fn list_snapshots(
        &self,
        company_id: CompanyId,
        participant_id: ParticipantId,
        responsibility_id: ResponsibilityId,
    ) -> Result<Vec<KraSnapshot>>;

    /// Bulk-update responsibility weights in a single transaction
    async fn update_responsibility_weights(
        &self,
        company_id: CompanyId,
        weights: &[(ResponsibilityId, u32)],
    ) -> Result<()>;

    /// Bulk-update job-specific KRA weights in a single transaction
    async fn update_job_kra_weights(
        &self,
        company_id: CompanyId,
        weights: &[(KraId, u32)],
    ) -> Result<()>;

    /// Bulk-update base/library KRA weights in a single transaction
    async fn update_base_kra_weights(
        &self,
        company_id: CompanyId,
        weights: &[(KraId, u32)],
    ) -> Result<()>;
}
