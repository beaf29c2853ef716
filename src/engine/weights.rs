//! Weight validation and even-distribution repair
//!
//! Runs at design time against the job template, before any appraisal
//! starts: reports whether responsibility weights sum to 100 and whether
//! each KRA-scored responsibility's KRA weights do too, and offers an
//! even-distribution repair for either level.

use crate::engine::catalog::resolve_effective_kras;
use crate::error::{AppraisalError, Result};
use crate::storage::AppraisalStore;
use crate::types::{CompanyId, JobId, KraId, KraWeightCheck, ResponsibilityId, WeightReport};
use std::sync::Arc;
use tracing::{debug, info};

/// Target total for any sibling weight set
const WEIGHT_TOTAL: u32 = 100;

/// Split 100 percentage points evenly across `count` siblings
///
/// Every slot gets `floor(100 / count)`; the first `100 % count` slots get
/// one extra point, so the result always sums to exactly 100. The same
/// split applies whether the siblings are responsibilities or KRAs.
pub fn distribute_evenly(count: usize) -> Result<Vec<u32>> {
    if count == 0 {
        return Err(AppraisalError::Validation(
            "Cannot distribute weights over zero items".to_string(),
        ));
    }

    let count_u32 = count as u32;
    let share = WEIGHT_TOTAL / count_u32;
    let remainder = WEIGHT_TOTAL % count_u32;

    Ok((0..count_u32)
        .map(|i| if i < remainder { share + 1 } else { share })
        .collect())
}

/// Validates a job's weight distribution and applies repairs
pub struct WeightValidator {
    store: Arc<dyn AppraisalStore>,
}

impl WeightValidator {
    pub fn new(store: Arc<dyn AppraisalStore>) -> Self {
        Self { store }
    }

    /// Validate responsibility and KRA weight totals for a job
    ///
    /// A responsibility's KRA weights are only checked when its effective
    /// mode requires KRA scoring and it actually has KRAs; responsibilities
    /// without KRAs are exempt.
    pub async fn validate(&self, company_id: CompanyId, job_id: JobId) -> Result<WeightReport> {
        let responsibilities = self
            .store
            .list_effective_responsibilities(company_id, job_id)
            .await?;
        let job_kras = self.store.list_job_kras(company_id, job_id).await?;

        let responsibility_weight_total: u32 =
            responsibilities.iter().map(|r| r.weight).sum();
        let is_responsibility_weight_valid = responsibility_weight_total == WEIGHT_TOTAL;

        let mut per_responsibility = Vec::with_capacity(responsibilities.len());
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

            let kra_weight_total: u32 = effective.sources.iter().map(|s| s.weight).sum();
            let needs_kras = effective.mode.requires_kras() && !effective.sources.is_empty();
            let is_valid = !needs_kras || kra_weight_total == WEIGHT_TOTAL;

            per_responsibility.push(KraWeightCheck {
                responsibility_id: responsibility.id,
                kra_weight_total,
                is_valid,
                needs_kras,
            });
        }

        let is_fully_valid =
            is_responsibility_weight_valid && per_responsibility.iter().all(|c| c.is_valid);

        debug!(
            "Weight validation for job {}: responsibility total {}, fully valid: {}",
            job_id, responsibility_weight_total, is_fully_valid
        );

        Ok(WeightReport {
            responsibility_weight_total,
            is_responsibility_weight_valid,
            per_responsibility,
            is_fully_valid,
        })
    }

    /// Evenly redistribute a job's responsibility weights
    ///
    /// Persists all new weights in one transaction and returns the applied
    /// assignments in responsibility order.
    pub async fn distribute_responsibility_weights(
        &self,
        company_id: CompanyId,
        job_id: JobId,
    ) -> Result<Vec<(ResponsibilityId, u32)>> {
        let responsibilities = self
            .store
            .list_effective_responsibilities(company_id, job_id)
            .await?;

        let weights = distribute_evenly(responsibilities.len())?;
        let assignments: Vec<(ResponsibilityId, u32)> = responsibilities
            .iter()
            .zip(weights)
            .map(|(r, w)| (r.id, w))
            .collect();

        self.store
            .update_responsibility_weights(company_id, &assignments)
            .await?;

        info!(
            "Redistributed weights across {} responsibilities for job {}",
            assignments.len(),
            job_id
        );

        Ok(assignments)
    }

    /// Evenly redistribute KRA weights within one responsibility
    ///
    /// Applies to the responsibility's effective KRA set: its job-specific
    /// KRAs when it has any, else its active base library. Persists all new
    /// weights in one transaction.
    pub async fn distribute_kra_weights(
        &self,
        company_id: CompanyId,
        job_id: JobId,
        responsibility_id: ResponsibilityId,
    ) -> Result<Vec<(KraId, u32)>> {
        let job_kras: Vec<_> = self
            .store
            .list_job_kras(company_id, job_id)
            .await?
            .into_iter()
            .filter(|k| k.responsibility_id == responsibility_id)
            .collect();

        if !job_kras.is_empty() {
            let weights = distribute_evenly(job_kras.len())?;
            let assignments: Vec<(KraId, u32)> =
                job_kras.iter().zip(weights).map(|(k, w)| (k.id, w)).collect();

            self.store
                .update_job_kra_weights(company_id, &assignments)
                .await?;

            return Ok(assignments);
        }

        let base_kras = self
            .store
            .list_base_kras(company_id, responsibility_id)
            .await?;

        let weights = distribute_evenly(base_kras.len())?;
        let assignments: Vec<(KraId, u32)> =
            base_kras.iter().zip(weights).map(|(k, w)| (k.id, w)).collect();

        self.store
            .update_base_kra_weights(company_id, &assignments)
            .await?;

        Ok(assignments)
    }
}
