//! Core data types for the appraisal scoring engine
//!
//! This module defines the entities the engine reads (responsibilities and
//! the two KRA catalogs) and the one entity it owns end to end (the
//! per-participant KRA snapshot), plus the enums and fallback chains the
//! scoring rules are built on.

use crate::error::{AppraisalError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lowest accepted rating value (inclusive)
pub const MIN_RATING: u8 = 1;

/// Highest accepted rating value (inclusive)
pub const MAX_RATING: u8 = 5;

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random ID
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Parse an ID from a string
            pub fn from_string(s: &str) -> Result<Self> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id! {
    /// Tenant scope. Mandatory on every entity and every query so one
    /// company's appraisal data can never leak into another's.
    CompanyId
}
entity_id! {
    /// Identifier of a job template
    JobId
}
entity_id! {
    /// Identifier of an appraisal participant
    ParticipantId
}
entity_id! {
    /// Identifier of a job responsibility
    ResponsibilityId
}
entity_id! {
    /// Identifier of a KRA definition (base/library or job-specific)
    KraId
}
entity_id! {
    /// Identifier of an appraisal KRA snapshot
    SnapshotId
}

/// Declared assessment mode on a responsibility
///
/// Controls whether the responsibility is scored directly or decomposed
/// into KRA-level scores. `Auto` is resolved at population time via
/// [`AssessmentMode::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentMode {
    /// Resolve to KRA-based when job-specific KRAs exist, else responsibility-only
    Auto,

    /// Scored through KRA snapshots
    KraBased,

    /// Scored through KRA snapshots plus a direct responsibility rating
    Hybrid,

    /// Scored directly at the responsibility level, no snapshots
    ResponsibilityOnly,
}

impl AssessmentMode {
    /// Resolve the declared mode into an effective mode
    ///
    /// This is the single resolution rule shared by the weight validator
    /// and the snapshot populator; both call sites must stay on this
    /// function so the `Auto` rule cannot drift between them.
    pub fn resolve(self, has_job_kras: bool) -> EffectiveMode {
        match self {
            AssessmentMode::Auto => {
                if has_job_kras {
                    EffectiveMode::KraBased
                } else {
                    EffectiveMode::ResponsibilityOnly
                }
            }
            AssessmentMode::KraBased => EffectiveMode::KraBased,
            AssessmentMode::Hybrid => EffectiveMode::Hybrid,
            AssessmentMode::ResponsibilityOnly => EffectiveMode::ResponsibilityOnly,
        }
    }

    /// Canonical string form used in storage
    pub fn as_str(&self) -> &'static str {
        match self {
            AssessmentMode::Auto => "auto",
            AssessmentMode::KraBased => "kra_based",
            AssessmentMode::Hybrid => "hybrid",
            AssessmentMode::ResponsibilityOnly => "responsibility_only",
        }
    }
}

impl std::str::FromStr for AssessmentMode {
    type Err = AppraisalError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(AssessmentMode::Auto),
            "kra_based" => Ok(AssessmentMode::KraBased),
            "hybrid" => Ok(AssessmentMode::Hybrid),
            "responsibility_only" => Ok(AssessmentMode::ResponsibilityOnly),
            _ => Err(AppraisalError::Other(format!(
                "Unknown assessment mode: {}",
                s
            ))),
        }
    }
}

/// Assessment mode after `Auto` resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectiveMode {
    /// Scored through KRA snapshots
    KraBased,

    /// Scored through KRA snapshots plus a direct responsibility rating
    Hybrid,

    /// Scored directly, no snapshots created
    ResponsibilityOnly,
}

impl EffectiveMode {
    /// Whether this mode decomposes scoring into KRA snapshots
    pub fn requires_kras(&self) -> bool {
        !matches!(self, EffectiveMode::ResponsibilityOnly)
    }
}

/// Snapshot lifecycle status
///
/// Transitions are not strictly linear: a manager rating can arrive before
/// or instead of a self rating. `Completed` is reached once a final score
/// has been computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotStatus {
    /// Created, no ratings yet
    Pending,

    /// Self rating recorded
    SelfRated,

    /// Manager rating recorded, score not yet final
    ManagerRated,

    /// Final score computed
    Completed,
}

impl SnapshotStatus {
    /// Canonical string form used in storage
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotStatus::Pending => "pending",
            SnapshotStatus::SelfRated => "self_rated",
            SnapshotStatus::ManagerRated => "manager_rated",
            SnapshotStatus::Completed => "completed",
        }
    }
}

impl std::str::FromStr for SnapshotStatus {
    type Err = AppraisalError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(SnapshotStatus::Pending),
            "self_rated" => Ok(SnapshotStatus::SelfRated),
            "manager_rated" => Ok(SnapshotStatus::ManagerRated),
            "completed" => Ok(SnapshotStatus::Completed),
            _ => Err(AppraisalError::Other(format!(
                "Unknown snapshot status: {}",
                s
            ))),
        }
    }
}

/// A job duty with a percentage share of the job
///
/// Owned by the job-architecture tooling; the engine only reads these.
/// Sibling weights within one job are expected to sum to 100.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Responsibility {
    pub id: ResponsibilityId,
    pub company_id: CompanyId,
    pub job_id: JobId,
    pub name: String,

    /// Percentage share of the job (0-100)
    pub weight: u32,

    /// Declared assessment mode; `Auto` resolves at population time
    pub assessment_mode: AssessmentMode,

    pub sequence_order: u32,

    /// A responsibility with an end date is no longer effective and is
    /// ignored by population and validation
    pub end_date: Option<DateTime<Utc>>,
}

/// Generic, reusable KRA from the responsibility catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseKra {
    pub id: KraId,
    pub company_id: CompanyId,
    pub responsibility_id: ResponsibilityId,
    pub name: String,
    pub description: String,
    pub target_metric: String,
    pub measurement_method: String,

    /// Percentage share within the responsibility (0-100)
    pub weight: u32,

    pub sequence_order: u32,
    pub is_active: bool,
}

/// Job-specific KRA override
///
/// May reference a base KRA through `source_kra_id` or stand alone. Content
/// fields are per-field overrides: `None` means "inherit from the linked
/// base KRA".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobKra {
    pub id: KraId,
    pub company_id: CompanyId,
    pub job_id: JobId,
    pub responsibility_id: ResponsibilityId,

    /// Linked base KRA, when this override specializes a library entry
    pub source_kra_id: Option<KraId>,

    pub name: Option<String>,
    pub description: Option<String>,
    pub target_metric: Option<String>,
    pub measurement_method: Option<String>,

    /// Percentage share within the responsibility (0-100)
    pub weight: u32,

    pub sequence_order: Option<u32>,
    pub is_active: bool,
}

impl JobKra {
    /// Identity used for snapshot deduplication
    ///
    /// Ordered candidate list: the linked base KRA id, else this job KRA's
    /// own id. Keeps repeated population runs keyed on the same identity
    /// whether or not the override is linked.
    pub fn snapshot_source_id(&self) -> KraId {
        self.source_kra_id.unwrap_or(self.id)
    }
}

/// Immutable-at-creation, mutable-at-rating appraisal record
///
/// One row per (participant, responsibility, source KRA). Definition fields
/// are copied at creation time so later edits to the KRA library do not
/// rewrite appraisal history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KraSnapshot {
    // === Identity ===
    pub id: SnapshotId,
    pub company_id: CompanyId,
    pub participant_id: ParticipantId,
    pub responsibility_id: ResponsibilityId,

    /// Deduplication key: the base KRA id, or the job KRA's own id when unlinked
    pub source_kra_id: KraId,

    /// The job-specific KRA this snapshot was taken from, if any
    pub job_kra_id: Option<KraId>,

    // === Definition copied at creation time ===
    pub name: String,
    pub description: String,
    pub target_metric: String,
    pub measurement_method: String,

    /// Percentage share within the responsibility (0-100)
    pub weight: u32,

    pub sequence_order: u32,

    // === Lifecycle ===
    pub status: SnapshotStatus,

    // === Ratings ===
    pub self_rating: Option<u8>,
    pub self_comments: Option<String>,
    pub self_rated_at: Option<DateTime<Utc>>,
    pub manager_rating: Option<u8>,
    pub manager_comments: Option<String>,
    pub manager_rated_at: Option<DateTime<Utc>>,
    pub manager_id: Option<ParticipantId>,

    // === Computed scores ===
    /// Average of the effective self rating and the manager rating
    pub calculated_score: Option<f64>,

    /// Manager's rating, authoritative for the record of truth
    pub final_score: Option<f64>,

    /// `calculated_score * (weight / 100)`
    pub weight_adjusted_score: Option<f64>,

    // === Evidence ===
    /// Attachment references supporting the ratings
    pub evidence: Vec<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl KraSnapshot {
    /// Score this snapshot contributes to a rollup
    ///
    /// Ordered candidate list evaluated per snapshot: final score, then
    /// manager rating, then self rating. A mid-cycle snapshot with only a
    /// self rating still contributes a provisional value.
    pub fn contributing_score(&self) -> Option<f64> {
        [
            self.final_score,
            self.manager_rating.map(f64::from),
            self.self_rating.map(f64::from),
        ]
        .into_iter()
        .flatten()
        .next()
    }

    /// Self-rating surrogate used when computing the calculated score
    ///
    /// Ordered candidate list: the recorded self rating, else the manager
    /// rating, so averaging never divides against a missing value.
    pub fn effective_self_rating(&self) -> Option<u8> {
        [self.self_rating, self.manager_rating]
            .into_iter()
            .flatten()
            .next()
    }
}

/// Who submitted a rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rater {
    /// The participant rating themselves
    Employee,

    /// The participant's manager
    Manager,
}

/// A rating submission against one snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingSubmission {
    pub rater: Rater,

    /// Rating on the fixed 1-5 scale
    pub rating: u8,

    pub comments: Option<String>,

    /// Identity of the rating manager; required on the manager path
    pub manager_id: Option<ParticipantId>,
}

/// Outcome of a population run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationOutcome {
    /// Snapshots newly created by this call
    pub populated: usize,

    /// Snapshots that already existed and were left untouched
    pub skipped: usize,
}

/// Per-responsibility KRA weight check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KraWeightCheck {
    pub responsibility_id: ResponsibilityId,

    /// Sum of the responsibility's effective KRA weights
    pub kra_weight_total: u32,

    /// False only when `needs_kras` is true and the total is not 100
    pub is_valid: bool,

    /// True when the effective mode requires KRA scoring and at least one
    /// KRA exists
    pub needs_kras: bool,
}

/// Result of validating a job's weight distribution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightReport {
    /// Sum of all effective responsibility weights
    pub responsibility_weight_total: u32,

    /// True when the responsibility weights sum to exactly 100
    pub is_responsibility_weight_valid: bool,

    pub per_responsibility: Vec<KraWeightCheck>,

    /// Responsibility weights valid and no responsibility has an invalid
    /// KRA weight total
    pub is_fully_valid: bool,
}
