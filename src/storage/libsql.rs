//! LibSQL storage backend implementation
//!
//! Persistent storage for job-architecture reads and snapshot writes using
//! libSQL/SQLite. Connections are acquired per operation from a shared
//! `Database`; schema migrations are plain SQL files applied idempotently
//! at startup.

use crate::error::{AppraisalError, Result};
use crate::storage::AppraisalStore;
use crate::types::{
    AssessmentMode, BaseKra, CompanyId, JobId, JobKra, KraId, KraSnapshot, ParticipantId,
    Responsibility, ResponsibilityId, SnapshotId, SnapshotStatus,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{params, Builder, Connection, Database};
use std::collections::HashSet;
use tracing::{debug, info};

/// Parse a SQL file into individual statements
fn parse_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in sql.lines() {
        let trimmed = line.trim();

        // Skip comment-only and empty lines when not building a statement
        if current.is_empty() && (trimmed.is_empty() || trimmed.starts_with("--")) {
            continue;
        }

        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);

        if trimmed.ends_with(';') {
            statements.push(current.clone());
            current.clear();
        }
    }

    if !current.trim().is_empty() {
        statements.push(current);
    }

    statements
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppraisalError::Other(format!("Invalid timestamp: {}", e)))
}

fn parse_optional_timestamp(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
    s.as_deref().map(parse_timestamp).transpose()
}

/// Database connection mode
#[derive(Debug, Clone)]
pub enum ConnectionMode {
    /// Local file-based database
    Local(String),
    /// In-memory database (single connection use only)
    InMemory,
}

/// LibSQL storage backend
pub struct LibsqlStore {
    db: Database,
}

impl LibsqlStore {
    /// Validate a database file before opening
    ///
    /// Returns `Ok(true)` if the file exists and carries a valid SQLite
    /// header, `Ok(false)` if it does not exist and `must_exist` is false.
    fn validate_database_file(db_path: &str, must_exist: bool) -> Result<bool> {
        use std::fs;
        use std::path::Path;

        let path = Path::new(db_path);

        if !path.exists() {
            if must_exist {
                return Err(AppraisalError::Database(format!(
                    "Database file not found at '{}'. Check your database configuration or enable create_if_missing.",
                    db_path
                )));
            }
            return Ok(false);
        }

        // SQLite files start with "SQLite format 3\0" (16 bytes)
        let bytes = fs::read(path).map_err(|e| {
            AppraisalError::Database(format!("Cannot read database file at '{}': {}", db_path, e))
        })?;

        if bytes.len() < 16 || &bytes[0..16] != b"SQLite format 3\0" {
            return Err(AppraisalError::Database(format!(
                "Database file at '{}' is corrupted or not a valid SQLite database.",
                db_path
            )));
        }

        debug!("Database file validation passed: {}", db_path);
        Ok(true)
    }

    /// Create a new LibSQL store and run pending migrations
    ///
    /// # Arguments
    /// * `mode` - Connection mode (local file or in-memory)
    /// * `create_if_missing` - If true, create the database if it doesn't
    ///   exist. If false, error on a missing database.
    pub async fn connect(mode: ConnectionMode, create_if_missing: bool) -> Result<Self> {
        info!(
            "Connecting to LibSQL database: {:?} (create_if_missing: {})",
            mode, create_if_missing
        );

        let db = match &mode {
            ConnectionMode::Local(path) => {
                Self::validate_database_file(path, !create_if_missing)?;

                if create_if_missing {
                    if let Some(parent) = std::path::Path::new(path).parent() {
                        std::fs::create_dir_all(parent).map_err(|e| {
                            AppraisalError::Database(format!(
                                "Failed to create database directory {}: {}",
                                parent.display(),
                                e
                            ))
                        })?;
                    }
                }

                Builder::new_local(path).build().await.map_err(|e| {
                    AppraisalError::Database(format!("Failed to create local database: {}", e))
                })?
            }
            ConnectionMode::InMemory => {
                Builder::new_local(":memory:").build().await.map_err(|e| {
                    AppraisalError::Database(format!("Failed to create in-memory database: {}", e))
                })?
            }
        };

        let store = Self { db };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Wrap an already-built database (test constructor)
    pub fn from_database(db: Database) -> Self {
        Self { db }
    }

    /// Get a connection from the database
    pub(crate) fn get_conn(&self) -> Result<Connection> {
        self.db
            .connect()
            .map_err(|e| AppraisalError::Database(format!("Failed to get connection: {}", e)))
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations...");

        let conn = self.get_conn()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS _migrations_applied (
                migration_name TEXT PRIMARY KEY,
                applied_at INTEGER NOT NULL
            )",
            params![],
        )
        .await
        .map_err(|e| {
            AppraisalError::Migration(format!("Failed to create migrations table: {}", e))
        })?;

        let manifest_dir = env!("CARGO_MANIFEST_DIR");
        let migrations_path = std::path::PathBuf::from(manifest_dir).join("migrations");

        let migration_files = ["001_initial_schema.sql", "002_add_indexes.sql"];

        for migration_file in migration_files {
            let mut rows = conn
                .query(
                    "SELECT COUNT(*) FROM _migrations_applied WHERE migration_name = ?",
                    params![migration_file],
                )
                .await?;

            let already_applied = if let Some(row) = rows.next().await? {
                row.get::<i64>(0).unwrap_or(0)
            } else {
                0
            };

            if already_applied > 0 {
                debug!("Skipping already applied migration: {}", migration_file);
                continue;
            }

            let file_path = migrations_path.join(migration_file);
            debug!("Executing migration: {:?}", file_path);

            let sql = std::fs::read_to_string(&file_path).map_err(|e| {
                AppraisalError::Migration(format!(
                    "Failed to read migration file {}: {}",
                    migration_file, e
                ))
            })?;

            let statements = parse_sql_statements(&sql);
            for (i, statement) in statements.iter().enumerate() {
                let statement = statement.trim();
                if !statement.is_empty() {
                    conn.execute(statement, params![]).await.map_err(|e| {
                        AppraisalError::Migration(format!(
                            "Failed to execute statement #{} in {}: {}",
                            i + 1,
                            migration_file,
                            e
                        ))
                    })?;
                }
            }

            let now = Utc::now().timestamp();
            conn.execute(
                "INSERT INTO _migrations_applied (migration_name, applied_at) VALUES (?, ?)",
                params![migration_file, now],
            )
            .await
            .map_err(|e| AppraisalError::Migration(format!("Failed to record migration: {}", e)))?;

            info!("Executed migration: {}", migration_file);
        }

        info!("Database migrations completed");
        Ok(())
    }

    // === Job-architecture write surface ===
    //
    // Used by the surrounding application's template tooling and by test
    // fixtures. The scoring engine itself only reads these tables.

    /// Insert a job responsibility
    pub async fn insert_responsibility(&self, responsibility: &Responsibility) -> Result<()> {
        let conn = self.get_conn()?;

        conn.execute(
            "INSERT INTO job_responsibilities (
                id, company_id, job_id, name, weight, assessment_mode,
                sequence_order, end_date
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                responsibility.id.to_string(),
                responsibility.company_id.to_string(),
                responsibility.job_id.to_string(),
                responsibility.name.clone(),
                responsibility.weight as i64,
                responsibility.assessment_mode.as_str(),
                responsibility.sequence_order as i64,
                responsibility.end_date.map(|dt| dt.to_rfc3339()),
            ],
        )
        .await
        .map_err(|e| AppraisalError::Database(format!("Failed to insert responsibility: {}", e)))?;

        Ok(())
    }

    /// Insert a base/library KRA
    pub async fn insert_base_kra(&self, kra: &BaseKra) -> Result<()> {
        let conn = self.get_conn()?;

        conn.execute(
            "INSERT INTO responsibility_kras (
                id, company_id, responsibility_id, name, description,
                target_metric, measurement_method, weight, sequence_order,
                is_active
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                kra.id.to_string(),
                kra.company_id.to_string(),
                kra.responsibility_id.to_string(),
                kra.name.clone(),
                kra.description.clone(),
                kra.target_metric.clone(),
                kra.measurement_method.clone(),
                kra.weight as i64,
                kra.sequence_order as i64,
                kra.is_active as i64,
            ],
        )
        .await
        .map_err(|e| AppraisalError::Database(format!("Failed to insert base KRA: {}", e)))?;

        Ok(())
    }

    /// Insert a job-specific KRA
    pub async fn insert_job_kra(&self, kra: &JobKra) -> Result<()> {
        let conn = self.get_conn()?;

        conn.execute(
            "INSERT INTO job_responsibility_kras (
                id, company_id, job_id, responsibility_id, source_kra_id,
                name, description, target_metric, measurement_method, weight,
                sequence_order, is_active
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                kra.id.to_string(),
                kra.company_id.to_string(),
                kra.job_id.to_string(),
                kra.responsibility_id.to_string(),
                kra.source_kra_id.map(|id| id.to_string()),
                kra.name.clone(),
                kra.description.clone(),
                kra.target_metric.clone(),
                kra.measurement_method.clone(),
                kra.weight as i64,
                kra.sequence_order.map(|s| s as i64),
                kra.is_active as i64,
            ],
        )
        .await
        .map_err(|e| AppraisalError::Database(format!("Failed to insert job KRA: {}", e)))?;

        Ok(())
    }

    // === Row mapping ===

    fn row_to_responsibility(row: &libsql::Row) -> Result<Responsibility> {
        let id: String = row.get(0)?;
        let company_id: String = row.get(1)?;
        let job_id: String = row.get(2)?;
        let name: String = row.get(3)?;
        let weight: i64 = row.get(4)?;
        let mode: String = row.get(5)?;
        let sequence_order: i64 = row.get(6)?;
        let end_date: Option<String> = row.get(7)?;

        Ok(Responsibility {
            id: ResponsibilityId::from_string(&id)?,
            company_id: CompanyId::from_string(&company_id)?,
            job_id: JobId::from_string(&job_id)?,
            name,
            weight: weight as u32,
            assessment_mode: mode.parse::<AssessmentMode>()?,
            sequence_order: sequence_order as u32,
            end_date: parse_optional_timestamp(end_date)?,
        })
    }

    fn row_to_base_kra(row: &libsql::Row) -> Result<BaseKra> {
        let id: String = row.get(0)?;
        let company_id: String = row.get(1)?;
        let responsibility_id: String = row.get(2)?;
        let name: String = row.get(3)?;
        let description: String = row.get(4)?;
        let target_metric: String = row.get(5)?;
        let measurement_method: String = row.get(6)?;
        let weight: i64 = row.get(7)?;
        let sequence_order: i64 = row.get(8)?;
        let is_active: i64 = row.get(9)?;

        Ok(BaseKra {
            id: KraId::from_string(&id)?,
            company_id: CompanyId::from_string(&company_id)?,
            responsibility_id: ResponsibilityId::from_string(&responsibility_id)?,
            name,
            description,
            target_metric,
            measurement_method,
            weight: weight as u32,
            sequence_order: sequence_order as u32,
            is_active: is_active != 0,
        })
    }

    fn row_to_job_kra(row: &libsql::Row) -> Result<JobKra> {
        let id: String = row.get(0)?;
        let company_id: String = row.get(1)?;
        let job_id: String = row.get(2)?;
        let responsibility_id: String = row.get(3)?;
        let source_kra_id: Option<String> = row.get(4)?;
        let name: Option<String> = row.get(5)?;
        let description: Option<String> = row.get(6)?;
        let target_metric: Option<String> = row.get(7)?;
        let measurement_method: Option<String> = row.get(8)?;
        let weight: i64 = row.get(9)?;
        let sequence_order: Option<i64> = row.get(10)?;
        let is_active: i64 = row.get(11)?;

        Ok(JobKra {
            id: KraId::from_string(&id)?,
            company_id: CompanyId::from_string(&company_id)?,
            job_id: JobId::from_string(&job_id)?,
            responsibility_id: ResponsibilityId::from_string(&responsibility_id)?,
            source_kra_id: source_kra_id
                .as_deref()
                .map(KraId::from_string)
                .transpose()?,
            name,
            description,
            target_metric,
            measurement_method,
            weight: weight as u32,
            sequence_order: sequence_order.map(|s| s as u32),
            is_active: is_active != 0,
        })
    }

    fn row_to_snapshot(row: &libsql::Row) -> Result<KraSnapshot> {
        let id: String = row.get(0)?;
        let company_id: String = row.get(1)?;
        let participant_id: String = row.get(2)?;
        let responsibility_id: String = row.get(3)?;
        let source_kra_id: String = row.get(4)?;
        let job_kra_id: Option<String> = row.get(5)?;
        let name: String = row.get(6)?;
        let description: String = row.get(7)?;
        let target_metric: String = row.get(8)?;
        let measurement_method: String = row.get(9)?;
        let weight: i64 = row.get(10)?;
        let sequence_order: i64 = row.get(11)?;
        let status: String = row.get(12)?;
        let self_rating: Option<i64> = row.get(13)?;
        let self_comments: Option<String> = row.get(14)?;
        let self_rated_at: Option<String> = row.get(15)?;
        let manager_rating: Option<i64> = row.get(16)?;
        let manager_comments: Option<String> = row.get(17)?;
        let manager_rated_at: Option<String> = row.get(18)?;
        let manager_id: Option<String> = row.get(19)?;
        let calculated_score: Option<f64> = row.get(20)?;
        let final_score: Option<f64> = row.get(21)?;
        let weight_adjusted_score: Option<f64> = row.get(22)?;
        let evidence_json: String = row.get(23)?;
        let created_at: String = row.get(24)?;
        let updated_at: String = row.get(25)?;

        let evidence: Vec<String> = serde_json::from_str(&evidence_json)?;

        Ok(KraSnapshot {
            id: SnapshotId::from_string(&id)?,
            company_id: CompanyId::from_string(&company_id)?,
            participant_id: ParticipantId::from_string(&participant_id)?,
            responsibility_id: ResponsibilityId::from_string(&responsibility_id)?,
            source_kra_id: KraId::from_string(&source_kra_id)?,
            job_kra_id: job_kra_id.as_deref().map(KraId::from_string).transpose()?,
            name,
            description,
            target_metric,
            measurement_method,
            weight: weight as u32,
            sequence_order: sequence_order as u32,
            status: status.parse::<SnapshotStatus>()?,
            self_rating: self_rating.map(|r| r as u8),
            self_comments,
            self_rated_at: parse_optional_timestamp(self_rated_at)?,
            manager_rating: manager_rating.map(|r| r as u8),
            manager_comments,
            manager_rated_at: parse_optional_timestamp(manager_rated_at)?,
            manager_id: manager_id
                .as_deref()
                .map(ParticipantId::from_string)
                .transpose()?,
            calculated_score,
            final_score,
            weight_adjusted_score,
            evidence,
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
        })
    }
}

const SNAPSHOT_COLUMNS: &str = "id, company_id, participant_id, responsibility_id, source_kra_id, \
     job_kra_id, name, description, target_metric, measurement_method, \
     weight, sequence_order, status, self_rating, self_comments, \
     self_rated_at, manager_rating, manager_comments, manager_rated_at, \
     manager_id, calculated_score, final_score, weight_adjusted_score, \
     evidence, created_at, updated_at";

#[async_trait]
impl AppraisalStore for LibsqlStore {
    async fn list_effective_responsibilities(
        &self,
        company_id: CompanyId,
        job_id: JobId,
    ) -> Result<Vec<Responsibility>> {
        let conn = self.get_conn()?;

        let mut rows = conn
            .query(
                "SELECT id, company_id, job_id, name, weight, assessment_mode,
                        sequence_order, end_date
                 FROM job_responsibilities
                 WHERE company_id = ? AND job_id = ? AND end_date IS NULL
                 ORDER BY sequence_order, id",
                params![company_id.to_string(), job_id.to_string()],
            )
            .await
            .map_err(|e| {
                AppraisalError::Database(format!("Failed to list responsibilities: {}", e))
            })?;

        let mut responsibilities = Vec::new();
        while let Some(row) = rows.next().await? {
            responsibilities.push(Self::row_to_responsibility(&row)?);
        }

        Ok(responsibilities)
    }

    async fn list_job_kras(&self, company_id: CompanyId, job_id: JobId) -> Result<Vec<JobKra>> {
        let conn = self.get_conn()?;

        let mut rows = conn
            .query(
                "SELECT id, company_id, job_id, responsibility_id, source_kra_id,
                        name, description, target_metric, measurement_method,
                        weight, sequence_order, is_active
                 FROM job_responsibility_kras
                 WHERE company_id = ? AND job_id = ? AND is_active = 1
                 ORDER BY responsibility_id, sequence_order, rowid",
                params![company_id.to_string(), job_id.to_string()],
            )
            .await
            .map_err(|e| AppraisalError::Database(format!("Failed to list job KRAs: {}", e)))?;

        let mut kras = Vec::new();
        while let Some(row) = rows.next().await? {
            kras.push(Self::row_to_job_kra(&row)?);
        }

        Ok(kras)
    }

    async fn list_base_kras(
        &self,
        company_id: CompanyId,
        responsibility_id: ResponsibilityId,
    ) -> Result<Vec<BaseKra>> {
        let conn = self.get_conn()?;

        let mut rows = conn
            .query(
                "SELECT id, company_id, responsibility_id, name, description,
                        target_metric, measurement_method, weight,
                        sequence_order, is_active
                 FROM responsibility_kras
                 WHERE company_id = ? AND responsibility_id = ? AND is_active = 1
                 ORDER BY sequence_order, rowid",
                params![company_id.to_string(), responsibility_id.to_string()],
            )
            .await
            .map_err(|e| AppraisalError::Database(format!("Failed to list base KRAs: {}", e)))?;

        let mut kras = Vec::new();
        while let Some(row) = rows.next().await? {
            kras.push(Self::row_to_base_kra(&row)?);
        }

        Ok(kras)
    }

    async fn get_base_kra(
        &self,
        company_id: CompanyId,
        kra_id: KraId,
    ) -> Result<Option<BaseKra>> {
        let conn = self.get_conn()?;

        let mut rows = conn
            .query(
                "SELECT id, company_id, responsibility_id, name, description,
                        target_metric, measurement_method, weight,
                        sequence_order, is_active
                 FROM responsibility_kras
                 WHERE company_id = ? AND id = ?",
                params![company_id.to_string(), kra_id.to_string()],
            )
            .await
            .map_err(|e| AppraisalError::Database(format!("Failed to get base KRA: {}", e)))?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::row_to_base_kra(&row)?)),
            None => Ok(None),
        }
    }

    async fn existing_snapshot_keys(
        &self,
        company_id: CompanyId,
        participant_id: ParticipantId,
    ) -> Result<HashSet<(ResponsibilityId, KraId)>> {
        let conn = self.get_conn()?;

        let mut rows = conn
            .query(
                "SELECT responsibility_id, source_kra_id
                 FROM appraisal_kra_snapshots
                 WHERE company_id = ? AND participant_id = ?",
                params![company_id.to_string(), participant_id.to_string()],
            )
            .await
            .map_err(|e| {
                AppraisalError::Database(format!("Failed to list snapshot keys: {}", e))
            })?;

        let mut keys = HashSet::new();
        while let Some(row) = rows.next().await? {
            let responsibility_id: String = row.get(0)?;
            let source_kra_id: String = row.get(1)?;
            keys.insert((
                ResponsibilityId::from_string(&responsibility_id)?,
                KraId::from_string(&source_kra_id)?,
            ));
        }

        Ok(keys)
    }

    async fn insert_snapshots(
        &self,
        company_id: CompanyId,
        snapshots: &[KraSnapshot],
    ) -> Result<usize> {
        if snapshots.is_empty() {
            return Ok(0);
        }

        let conn = self.get_conn()?;

        let tx = conn
            .transaction()
            .await
            .map_err(|e| AppraisalError::Database(format!("Failed to begin transaction: {}", e)))?;

        let mut inserted = 0usize;
        for snapshot in snapshots {
            let evidence_json = serde_json::to_string(&snapshot.evidence)?;

            // OR IGNORE closes the race between the key pre-check and the
            // insert: a concurrent duplicate becomes a skip, not an error.
            let affected = tx
                .execute(
                    "INSERT OR IGNORE INTO appraisal_kra_snapshots (
                        id, company_id, participant_id, responsibility_id,
                        source_kra_id, job_kra_id, name, description,
                        target_metric, measurement_method, weight,
                        sequence_order, status, evidence, created_at, updated_at
                    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                    params![
                        snapshot.id.to_string(),
                        company_id.to_string(),
                        snapshot.participant_id.to_string(),
                        snapshot.responsibility_id.to_string(),
                        snapshot.source_kra_id.to_string(),
                        snapshot.job_kra_id.map(|id| id.to_string()),
                        snapshot.name.clone(),
                        snapshot.description.clone(),
                        snapshot.target_metric.clone(),
                        snapshot.measurement_method.clone(),
                        snapshot.weight as i64,
                        snapshot.sequence_order as i64,
                        snapshot.status.as_str(),
                        evidence_json,
                        snapshot.created_at.to_rfc3339(),
                        snapshot.updated_at.to_rfc3339(),
                    ],
                )
                .await
                .map_err(|e| {
                    AppraisalError::Database(format!("Failed to insert snapshot: {}", e))
                })?;

            inserted += affected as usize;
        }

        tx.commit()
            .await
            .map_err(|e| AppraisalError::Database(format!("Failed to commit snapshots: {}", e)))?;

        debug!(
            "Inserted {} of {} snapshot rows for company {}",
            inserted,
            snapshots.len(),
            company_id
        );

        Ok(inserted)
    }

    async fn get_snapshot(
        &self,
        company_id: CompanyId,
        snapshot_id: SnapshotId,
    ) -> Result<KraSnapshot> {
        let conn = self.get_conn()?;

        let sql = format!(
            "SELECT {} FROM appraisal_kra_snapshots WHERE company_id = ? AND id = ?",
            SNAPSHOT_COLUMNS
        );

        let mut rows = conn
            .query(&sql, params![company_id.to_string(), snapshot_id.to_string()])
            .await
            .map_err(|e| AppraisalError::Database(format!("Failed to get snapshot: {}", e)))?;

        match rows.next().await? {
            Some(row) => Self::row_to_snapshot(&row),
            None => Err(AppraisalError::SnapshotNotFound(snapshot_id.to_string())),
        }
    }

    async fn save_rating(&self, snapshot: &KraSnapshot) -> Result<()> {
        let conn = self.get_conn()?;

        let evidence_json = serde_json::to_string(&snapshot.evidence)?;

        let affected = conn
            .execute(
                "UPDATE appraisal_kra_snapshots SET
                    self_rating = ?,
                    self_comments = ?,
                    self_rated_at = ?,
                    manager_rating = ?,
                    manager_comments = ?,
                    manager_rated_at = ?,
                    manager_id = ?,
                    calculated_score = ?,
                    final_score = ?,
                    weight_adjusted_score = ?,
                    status = ?,
                    evidence = ?,
                    updated_at = ?
                 WHERE company_id = ? AND id = ?",
                params![
                    snapshot.self_rating.map(|r| r as i64),
                    snapshot.self_comments.clone(),
                    snapshot.self_rated_at.map(|dt| dt.to_rfc3339()),
                    snapshot.manager_rating.map(|r| r as i64),
                    snapshot.manager_comments.clone(),
                    snapshot.manager_rated_at.map(|dt| dt.to_rfc3339()),
                    snapshot.manager_id.map(|id| id.to_string()),
                    snapshot.calculated_score,
                    snapshot.final_score,
                    snapshot.weight_adjusted_score,
                    snapshot.status.as_str(),
                    evidence_json,
                    snapshot.updated_at.to_rfc3339(),
                    snapshot.company_id.to_string(),
                    snapshot.id.to_string(),
                ],
            )
            .await
            .map_err(|e| AppraisalError::Database(format!("Failed to save rating: {}", e)))?;

        if affected == 0 {
            return Err(AppraisalError::SnapshotNotFound(snapshot.id.to_string()));
        }

        Ok(())
    }

    async fn list_snapshots(
        &self,
        company_id: CompanyId,
        participant_id: ParticipantId,
        responsibility_id: ResponsibilityId,
    ) -> Result<Vec<KraSnapshot>> {
        let conn = self.get_conn()?;

        let sql = format!(
            "SELECT {} FROM appraisal_kra_snapshots
             WHERE company_id = ? AND participant_id = ? AND responsibility_id = ?
             ORDER BY sequence_order, rowid",
            SNAPSHOT_COLUMNS
        );

        let mut rows = conn
            .query(
                &sql,
                params![
                    company_id.to_string(),
                    participant_id.to_string(),
                    responsibility_id.to_string()
                ],
            )
            .await
            .map_err(|e| AppraisalError::Database(format!("Failed to list snapshots: {}", e)))?;

        let mut snapshots = Vec::new();
        while let Some(row) = rows.next().await? {
            snapshots.push(Self::row_to_snapshot(&row)?);
        }

        Ok(snapshots)
    }

    async fn update_responsibility_weights(
        &self,
        company_id: CompanyId,
        weights: &[(ResponsibilityId, u32)],
    ) -> Result<()> {
        let conn = self.get_conn()?;

        let tx = conn
            .transaction()
            .await
            .map_err(|e| AppraisalError::Database(format!("Failed to begin transaction: {}", e)))?;

        for (id, weight) in weights {
            tx.execute(
                "UPDATE job_responsibilities SET weight = ? WHERE company_id = ? AND id = ?",
                params![*weight as i64, company_id.to_string(), id.to_string()],
            )
            .await
            .map_err(|e| {
                AppraisalError::Database(format!("Failed to update responsibility weight: {}", e))
            })?;
        }

        tx.commit()
            .await
            .map_err(|e| AppraisalError::Database(format!("Failed to commit weights: {}", e)))?;

        Ok(())
    }

    async fn update_job_kra_weights(
        &self,
        company_id: CompanyId,
        weights: &[(KraId, u32)],
    ) -> Result<()> {
        let conn = self.get_conn()?;

        let tx = conn
            .transaction()
            .await
            .map_err(|e| AppraisalError::Database(format!("Failed to begin transaction: {}", e)))?;

        for (id, weight) in weights {
            tx.execute(
                "UPDATE job_responsibility_kras SET weight = ? WHERE company_id = ? AND id = ?",
                params![*weight as i64, company_id.to_string(), id.to_string()],
            )
            .await
            .map_err(|e| {
                AppraisalError::Database(format!("Failed to update job KRA weight: {}", e))
            })?;
        }

        tx.commit()
            .await
            .map_err(|e| AppraisalError::Database(format!("Failed to commit weights: {}", e)))?;

        Ok(())
    }

    async fn update_base_kra_weights(
        &self,
        company_id: CompanyId,
        weights: &[(KraId, u32)],
    ) -> Result<()> {
        let conn = self.get_conn()?;

        let tx = conn
            .transaction()
            .await
            .map_err(|e| AppraisalError::Database(format!("Failed to begin transaction: {}", e)))?;

        for (id, weight) in weights {
            tx.execute(
                "UPDATE responsibility_kras SET weight = ? WHERE company_id = ? AND id = ?",
                params![*weight as i64, company_id.to_string(), id.to_string()],
            )
            .await
            .map_err(|e| {
                AppraisalError::Database(format!("Failed to update base KRA weight: {}", e))
            })?;
        }

        tx.commit()
            .await
            .map_err(|e| AppraisalError::Database(format!("Failed to commit weights: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sql_statements() {
        let sql = "-- comment\nCREATE TABLE a (x INTEGER);\n\nCREATE INDEX i ON a(x);";
        let statements = parse_sql_statements(sql);
        assert_eq!(statements.len(), 2);
        assert!(statements[0].contains("CREATE TABLE"));
        assert!(statements[1].contains("CREATE INDEX"));
    }

    #[test]
    fn test_parse_timestamp_round_trip() {
        let now = Utc::now();
        let parsed = parse_timestamp(&now.to_rfc3339()).unwrap();
        assert_eq!(parsed, now);
    }
}
