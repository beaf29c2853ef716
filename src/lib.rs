//! Appraise - Appraisal KRA Snapshot & Weighted Scoring Engine
//!
//! A library for the appraisal-time core of an HR system: freezing a job's
//! responsibility/KRA structure into immutable per-participant snapshots,
//! validating weight distributions, collecting dual (self/manager) ratings,
//! and computing weighted rollup scores.
//!
//! # Architecture
//!
//! The system is organized into several layers:
//! - **Types**: Core data structures (Responsibility, KRAs, KraSnapshot)
//! - **Storage**: The `AppraisalStore` trait and its libSQL backend
//! - **Engine**: Weight validation, population, rating, rollup
//!
//! # Example
//!
//! ```ignore
//! use appraise::{AppraisalEngine, Rater, RatingSubmission};
//! use appraise::storage::libsql::{ConnectionMode, LibsqlStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(
//!         LibsqlStore::connect(ConnectionMode::Local("appraise.db".into()), true).await?,
//!     );
//!     let engine = AppraisalEngine::new(store);
//!
//!     // Freeze the job's KRA structure for a participant
//!     let outcome = engine.populate(company_id, participant_id, job_id).await?;
//!     println!("populated {}, skipped {}", outcome.populated, outcome.skipped);
//!
//!     // Record the manager's rating
//!     engine
//!         .record_rating(
//!             company_id,
//!             snapshot_id,
//!             RatingSubmission {
//!                 rater: Rater::Manager,
//!                 rating: 5,
//!                 comments: None,
//!                 manager_id: Some(manager_id),
//!             },
//!         )
//!         .await?;
//!
//!     // Weighted responsibility score
//!     let score = engine.rollup(company_id, participant_id, responsibility_id).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use engine::{
    distribute_evenly, AppraisalEngine, RatingRecorder, RollupCalculator, SnapshotPopulator,
    WeightValidator,
};
pub use error::{AppraisalError, Result};
pub use storage::{libsql::LibsqlStore, AppraisalStore};
pub use types::{
    AssessmentMode, BaseKra, CompanyId, EffectiveMode, JobId, JobKra, KraId, KraSnapshot,
    KraWeightCheck, ParticipantId, PopulationOutcome, Rater, RatingSubmission, Responsibility,
    ResponsibilityId, SnapshotId, SnapshotStatus, WeightReport,
};
