//! Test utilities for storage initialization
//!
//! Provides a temp-file backed store for tests plus fixture constructors
//! for the job-architecture entities the engine reads.
//!
//! Note: tests use a temporary file-based database rather than `:memory:`
//! because libsql's in-memory databases don't share state across
//! connections (each `get_conn()` call would see an empty database).

use crate::error::Result;
use crate::storage::libsql::{ConnectionMode, LibsqlStore};
use crate::types::{
    AssessmentMode, BaseKra, CompanyId, JobId, JobKra, KraId, ParticipantId, Responsibility,
    ResponsibilityId,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Initialize tracing output for tests (no-op when already installed)
pub fn init_test_logging() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Create a temp-file backed store with migrations applied
///
/// Each call gets a unique database file so tests don't conflict.
pub async fn create_test_store() -> Result<Arc<LibsqlStore>> {
    init_test_logging();

    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let counter = COUNTER.fetch_add(1, Ordering::SeqCst);

    let temp_path = std::env::temp_dir().join(format!(
        "appraise_test_{}_{}.db",
        std::process::id(),
        counter
    ));

    // Clean up any stale file from a previous run
    let _ = std::fs::remove_file(&temp_path);

    let store = LibsqlStore::connect(
        ConnectionMode::Local(temp_path.to_string_lossy().into_owned()),
        true,
    )
    .await?;

    Ok(Arc::new(store))
}

/// Fixture: a responsibility with no end date
pub fn responsibility_fixture(
    company_id: CompanyId,
    job_id: JobId,
    name: &str,
    weight: u32,
    assessment_mode: AssessmentMode,
    sequence_order: u32,
) -> Responsibility {
    Responsibility {
        id: ResponsibilityId::new(),
        company_id,
        job_id,
        name: name.to_string(),
        weight,
        assessment_mode,
        sequence_order,
        end_date: None,
    }
}

/// Fixture: an active base/library KRA
pub fn base_kra_fixture(
    company_id: CompanyId,
    responsibility_id: ResponsibilityId,
    name: &str,
    weight: u32,
    sequence_order: u32,
) -> BaseKra {
    BaseKra {
        id: KraId::new(),
        company_id,
        responsibility_id,
        name: name.to_string(),
        description: format!("{} description", name),
        target_metric: format!("{} target", name),
        measurement_method: "quarterly review".to_string(),
        weight,
        sequence_order,
        is_active: true,
    }
}

/// Fixture: an active job-specific KRA
pub fn job_kra_fixture(
    company_id: CompanyId,
    job_id: JobId,
    responsibility_id: ResponsibilityId,
    source_kra_id: Option<KraId>,
    name: Option<&str>,
    weight: u32,
) -> JobKra {
    JobKra {
        id: KraId::new(),
        company_id,
        job_id,
        responsibility_id,
        source_kra_id,
        name: name.map(|n| n.to_string()),
        description: None,
        target_metric: None,
        measurement_method: None,
        weight,
        sequence_order: None,
        is_active: true,
    }
}

/// Fixture: a fresh participant id
pub fn participant_fixture() -> ParticipantId {
    ParticipantId::new()
}
