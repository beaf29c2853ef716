//! Effective-KRA resolution
//!
//! One responsibility's scoring decomposes over an "effective" KRA set:
//! its job-specific KRAs when it has any, else its active base library.
//! Both the weight validator and the snapshot populator go through this
//! module so the resolution rule cannot drift between them.

use crate::error::Result;
use crate::storage::AppraisalStore;
use crate::types::{BaseKra, CompanyId, EffectiveMode, JobKra, KraId, Responsibility};

/// A KRA definition normalized from either catalog tier
///
/// Content is already resolved through the job-to-base fallback, so
/// downstream code never needs to know which tier a source came from.
#[derive(Debug, Clone)]
pub struct KraSource {
    /// Snapshot identity key: base KRA id, or job KRA's own id when unlinked
    pub source_id: KraId,

    /// The job-specific KRA this came from, if any
    pub job_kra_id: Option<KraId>,

    pub name: String,
    pub description: String,
    pub target_metric: String,
    pub measurement_method: String,
    pub weight: u32,

    /// Explicit ordering from the catalog; `None` defers to batch position
    pub sequence_order: Option<u32>,
}

impl KraSource {
    /// Build a source from a base/library KRA
    pub fn from_base(kra: &BaseKra) -> Self {
        Self {
            source_id: kra.id,
            job_kra_id: None,
            name: kra.name.clone(),
            description: kra.description.clone(),
            target_metric: kra.target_metric.clone(),
            measurement_method: kra.measurement_method.clone(),
            weight: kra.weight,
            sequence_order: Some(kra.sequence_order),
        }
    }

    /// Build a source from a job-specific KRA, inheriting content from its
    /// linked base KRA field by field
    ///
    /// Each content field is an ordered candidate list: the job KRA's own
    /// value, then the linked base KRA's, then empty.
    pub fn from_job(kra: &JobKra, linked: Option<&BaseKra>) -> Self {
        let inherit = |own: &Option<String>, base: fn(&BaseKra) -> &String| {
            [
                own.clone(),
                linked.map(|b| base(b).clone()),
            ]
            .into_iter()
            .flatten()
            .next()
            .unwrap_or_default()
        };

        Self {
            source_id: kra.snapshot_source_id(),
            job_kra_id: Some(kra.id),
            name: inherit(&kra.name, |b| &b.name),
            description: inherit(&kra.description, |b| &b.description),
            target_metric: inherit(&kra.target_metric, |b| &b.target_metric),
            measurement_method: inherit(&kra.measurement_method, |b| &b.measurement_method),
            weight: kra.weight,
            sequence_order: kra.sequence_order,
        }
    }
}

/// A responsibility's resolved assessment mode and effective KRA set
#[derive(Debug, Clone)]
pub struct EffectiveKras {
    pub mode: EffectiveMode,
    pub sources: Vec<KraSource>,
}

/// Resolve a responsibility's effective mode and KRA set
///
/// `job_kras` must already be filtered to this responsibility. When the
/// responsibility has job-specific KRAs they win; otherwise the active base
/// library for the responsibility is the fallback, in sequence order.
pub async fn resolve_effective_kras(
    store: &dyn AppraisalStore,
    company_id: CompanyId,
    responsibility: &Responsibility,
    job_kras: &[JobKra],
) -> Result<EffectiveKras> {
    let mode = responsibility.assessment_mode.resolve(!job_kras.is_empty());

    if !mode.requires_kras() {
        return Ok(EffectiveKras {
            mode,
            sources: Vec::new(),
        });
    }

    let sources = if job_kras.is_empty() {
        store
            .list_base_kras(company_id, responsibility.id)
            .await?
            .iter()
            .map(KraSource::from_base)
            .collect()
    } else {
        let mut sources = Vec::with_capacity(job_kras.len());
        for kra in job_kras {
            let linked = match kra.source_kra_id {
                Some(id) => store.get_base_kra(company_id, id).await?,
                None => None,
            };
            sources.push(KraSource::from_job(kra, linked.as_ref()));
        }
        sources
    };

    Ok(EffectiveKras { mode, sources })
}
