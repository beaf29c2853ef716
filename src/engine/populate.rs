//! KRA snapshot population
//!
//! Freezes a job's KRA structure into per-participant snapshot rows at
//! appraisal time. Population is idempotent: snapshots are keyed on
//! (participant, responsibility, source KRA) and existing keys are
//! skipped, so repeated runs never duplicate rows.

use crate::engine::catalog::{resolve_effective_kras, KraSource};
use crate::error::Result;
use crate::storage::AppraisalStore;
use crate::types::{
    CompanyId, JobId, KraSnapshot, ParticipantId, PopulationOutcome, ResponsibilityId,
    SnapshotId, SnapshotStatus,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};

/// Creates immutable KRA snapshots for an appraisal participant
pub struct SnapshotPopulator {
    store: Arc<dyn AppraisalStore>,
}

impl SnapshotPopulator {
    pub fn new(store: Arc<dyn AppraisalStore>) -> Self {
        Self { store }
    }

    /// Populate snapshots for a participant from their job's KRA structure
    ///
    /// Per responsibility, the declared assessment mode is resolved once;
    /// responsibility-only responsibilities contribute no snapshots. The
    /// whole batch is written in one transaction: any read or write failure
    /// aborts the call, and re-running is safe.
    pub async fn populate(
        &self,
        company_id: CompanyId,
        participant_id: ParticipantId,
        job_id: JobId,
    ) -> Result<PopulationOutcome> {
        let responsibilities = self
            .store
            .list_effective_responsibilities(company_id, job_id)
            .await?;
        let job_kras = self.store.list_job_kras(company_id, job_id).await?;
        let existing = self
            .store
            .existing_snapshot_keys(company_id, participant_id)
            .await?;

        let now = Utc::now();
        let mut batch = Vec::new();
        let mut skipped = 0usize;

        for responsibility in &responsibilities {
            let own_kras: Vec<_> = job_kras
                .iter()
                .filter(|k| k.responsibility_id == responsibility.id)
                .cloned()
                .collect();

            let effective = resolve_effective_kras(
                self.store.as_ref(),
                company_id,
                responsibility,
                &own_kras,
            )
            .await?;

            if !effective.mode.requires_kras() {
                debug!(
                    "Responsibility {} resolved to responsibility-only, no snapshots",
                    responsibility.id
                );
                continue;
            }

            for (position, source) in effective.sources.iter().enumerate() {
                if existing.contains(&(responsibility.id, source.source_id)) {
                    skipped += 1;
                    continue;
                }

                batch.push(build_snapshot(
                    company_id,
                    participant_id,
                    responsibility.id,
                    source,
                    position,
                    now,
                ));
            }
        }

        let populated = self.store.insert_snapshots(company_id, &batch).await?;

        // Rows the uniqueness constraint rejected were created concurrently;
        // count them as skipped, same as the pre-check.
        skipped += batch.len() - populated;

        info!(
            "Populated {} snapshots ({} skipped) for participant {}",
            populated, skipped, participant_id
        );

        Ok(PopulationOutcome { populated, skipped })
    }
}

/// Build a pending snapshot from a resolved KRA source
///
/// Sequence order comes from the catalog when defined, else from the
/// source's position in the creation batch, so repeated populate calls
/// never reorder previously created snapshots.
fn build_snapshot(
    company_id: CompanyId,
    participant_id: ParticipantId,
    responsibility_id: ResponsibilityId,
    source: &KraSource,
    position: usize,
    now: DateTime<Utc>,
) -> KraSnapshot {
    KraSnapshot {
        id: SnapshotId::new(),
        company_id,
        participant_id,
        responsibility_id,
        source_kra_id: source.source_id,
        job_kra_id: source.job_kra_id,
        name: source.name.clone(),
        description: source.description.clone(),
        target_metric: source.target_metric.clone(),
        measurement_method: source.measurement_method.clone(),
        weight: source.weight,
        sequence_order: source.sequence_order.unwrap_or(position as u32),
        status: SnapshotStatus::Pending,
        self_rating: None,
        self_comments: None,
        self_rated_at: None,
        manager_rating: None,
        manager_comments: None,
        manager_rated_at: None,
        manager_id: None,
        calculated_score: None,
        final_score: None,
        weight_adjusted_score: None,
        evidence: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}
