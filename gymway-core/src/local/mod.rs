//! Local SQLite cache for workout plans and pending completion toggles.
//!
//! Every public operation on [`LocalCache`] degrades instead of failing:
//! storage errors are logged and reads come back empty. Callers treat a
//! broken cache the same as an empty one.

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::models::{Difficulty, Exercise, ExerciseStatus, WorkoutPlan};

/// Errors from opening or querying the local database.
#[derive(Error, Debug)]
pub enum LocalCacheError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Opens (creating if needed) the database at `path` and runs migrations.
pub async fn init_db(path: &Path) -> Result<SqlitePool, LocalCacheError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite:{}?mode=rwc", path.display());
    let options = SqliteConnectOptions::from_str(&db_url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

static SHARED_POOL: OnceLock<OnceCell<SqlitePool>> = OnceLock::new();

/// Returns the process-wide pool, creating it on first use.
///
/// Concurrent first callers wait on the same initialization. The path is
/// only consulted by the call that wins.
pub async fn shared_pool(path: &Path) -> Result<SqlitePool, LocalCacheError> {
    let cell = SHARED_POOL.get_or_init(OnceCell::new);
    let pool = cell
        .get_or_try_init(|| async {
            tracing::info!("Opening local database at {}", path.display());
            init_db(path).await
        })
        .await?;
    Ok(pool.clone())
}

fn timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

#[derive(sqlx::FromRow)]
struct PlanRow {
    id: String,
    title: String,
    description: String,
    exercises: String,
    duration: i64,
    difficulty: String,
    created_by: String,
    assigned_to: String,
    assigned_at: Option<String>,
    is_completed: bool,
    completed_at: Option<String>,
}

impl PlanRow {
    fn into_plan(self) -> WorkoutPlan {
        let exercises: Vec<Exercise> = if self.exercises.is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(&self.exercises).unwrap_or_else(|e| {
                tracing::warn!("Unreadable exercise list for plan {}: {}", self.id, e);
                Vec::new()
            })
        };

        WorkoutPlan {
            difficulty: self.difficulty.parse().unwrap_or(Difficulty::Beginner),
            duration: u32::try_from(self.duration).unwrap_or(60),
            assigned_at: self.assigned_at.as_deref().and_then(parse_timestamp),
            completed_at: self.completed_at.as_deref().and_then(parse_timestamp),
            id: self.id,
            title: self.title,
            description: self.description,
            exercises,
            created_by: self.created_by,
            assigned_to: self.assigned_to,
            is_completed: self.is_completed,
        }
    }
}

#[derive(sqlx::FromRow)]
struct StatusRow {
    exercise_id: String,
    workout_plan_id: String,
    is_completed: bool,
    is_synced: bool,
    last_updated: String,
}

impl From<StatusRow> for ExerciseStatus {
    fn from(row: StatusRow) -> Self {
        ExerciseStatus {
            last_updated: parse_timestamp(&row.last_updated).unwrap_or_else(Utc::now),
            exercise_id: row.exercise_id,
            workout_plan_id: row.workout_plan_id,
            is_completed: row.is_completed,
            is_synced: row.is_synced,
        }
    }
}

const UPSERT_PLAN: &str = r#"
    INSERT OR REPLACE INTO workout_plans
        (id, title, description, exercises, duration, difficulty, created_by,
         assigned_to, assigned_at, is_completed, completed_at, last_updated)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

/// Local cache of workout plans plus the `exercise_status` shadow table.
#[derive(Debug, Clone)]
pub struct LocalCache {
    pool: SqlitePool,
}

impl LocalCache {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens a cache backed by its own database file.
    pub async fn open(path: &Path) -> Result<Self, LocalCacheError> {
        Ok(Self::new(init_db(path).await?))
    }

    /// Opens the cache on the process-wide shared pool.
    pub async fn shared(path: &Path) -> Result<Self, LocalCacheError> {
        Ok(Self::new(shared_pool(path).await?))
    }

    /// All cached plans, most recently written first.
    pub async fn read_all(&self) -> Vec<WorkoutPlan> {
        match self.try_read_all().await {
            Ok(plans) => {
                tracing::debug!("Read {} plan(s) from local cache", plans.len());
                plans
            }
            Err(e) => {
                tracing::warn!("Local cache read failed: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn read_by_id(&self, plan_id: &str) -> Option<WorkoutPlan> {
        match self.try_read_by_id(plan_id).await {
            Ok(plan) => plan,
            Err(e) => {
                tracing::warn!("Local cache read of plan {} failed: {}", plan_id, e);
                None
            }
        }
    }

    /// Upserts every plan in one transaction.
    pub async fn write_all(&self, plans: &[WorkoutPlan]) {
        match self.try_write_all(plans).await {
            Ok(()) => tracing::debug!("Cached {} plan(s)", plans.len()),
            Err(e) => tracing::warn!("Failed to cache {} plan(s): {}", plans.len(), e),
        }
    }

    pub async fn write_one(&self, plan: &WorkoutPlan) {
        if let Err(e) = self.try_write_one(plan).await {
            tracing::warn!("Failed to cache plan '{}': {}", plan.title, e);
        }
    }

    /// Records a completion toggle locally.
    ///
    /// Writes the shadow row first and then rewrites the cached plan's
    /// exercise list. The two writes are not wrapped in a transaction.
    pub async fn record_exercise_completion(
        &self,
        exercise_id: &str,
        plan_id: &str,
        completed: bool,
    ) {
        if let Err(e) = self
            .try_record_exercise_completion(exercise_id, plan_id, completed)
            .await
        {
            tracing::warn!(
                "Failed to record completion of exercise {} in plan {}: {}",
                exercise_id,
                plan_id,
                e
            );
        }
    }

    /// Shadow rows whose toggle has not reached the remote store yet.
    pub async fn pending_unsynced(&self) -> Vec<ExerciseStatus> {
        let result: Result<Vec<StatusRow>, sqlx::Error> = sqlx::query_as(
            "SELECT * FROM exercise_status WHERE is_synced = 0 ORDER BY last_updated",
        )
        .fetch_all(&self.pool)
        .await;

        match result {
            Ok(rows) => rows.into_iter().map(ExerciseStatus::from).collect(),
            Err(e) => {
                tracing::warn!("Failed to read pending exercise statuses: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn statuses_for_plan(&self, plan_id: &str) -> Vec<ExerciseStatus> {
        let result: Result<Vec<StatusRow>, sqlx::Error> = sqlx::query_as(
            "SELECT * FROM exercise_status WHERE workout_plan_id = ? ORDER BY exercise_id",
        )
        .bind(plan_id)
        .fetch_all(&self.pool)
        .await;

        match result {
            Ok(rows) => rows.into_iter().map(ExerciseStatus::from).collect(),
            Err(e) => {
                tracing::warn!("Failed to read statuses for plan {}: {}", plan_id, e);
                Vec::new()
            }
        }
    }

    /// Marks the shadow row synced, but only while it still holds the
    /// `completed` value that reached the remote store. A row rewritten by
    /// a later toggle stays pending.
    pub async fn mark_synced(&self, exercise_id: &str, completed: bool) {
        let result = sqlx::query(
            "UPDATE exercise_status SET is_synced = 1 WHERE exercise_id = ? AND is_completed = ?",
        )
        .bind(exercise_id)
        .bind(completed)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => tracing::debug!(
                "Exercise {} changed since it was synced, left pending",
                exercise_id
            ),
            Ok(_) => {}
            Err(e) => tracing::warn!("Failed to mark exercise {} synced: {}", exercise_id, e),
        }
    }

    /// Drops every cached plan. Shadow rows are kept.
    pub async fn clear(&self) {
        match sqlx::query("DELETE FROM workout_plans")
            .execute(&self.pool)
            .await
        {
            Ok(_) => tracing::info!("Local plan cache cleared"),
            Err(e) => tracing::warn!("Failed to clear local cache: {}", e),
        }
    }

    async fn try_read_all(&self) -> Result<Vec<WorkoutPlan>, LocalCacheError> {
        let rows: Vec<PlanRow> =
            sqlx::query_as("SELECT * FROM workout_plans ORDER BY last_updated DESC, id")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(PlanRow::into_plan).collect())
    }

    async fn try_read_by_id(&self, plan_id: &str) -> Result<Option<WorkoutPlan>, LocalCacheError> {
        let row: Option<PlanRow> = sqlx::query_as("SELECT * FROM workout_plans WHERE id = ?")
            .bind(plan_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(PlanRow::into_plan))
    }

    async fn try_write_all(&self, plans: &[WorkoutPlan]) -> Result<(), LocalCacheError> {
        let mut tx = self.pool.begin().await?;
        for plan in plans {
            let exercises = serde_json::to_string(&plan.exercises)?;
            bind_plan(sqlx::query(UPSERT_PLAN), plan, exercises)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn try_write_one(&self, plan: &WorkoutPlan) -> Result<(), LocalCacheError> {
        let exercises = serde_json::to_string(&plan.exercises)?;
        bind_plan(sqlx::query(UPSERT_PLAN), plan, exercises)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn try_record_exercise_completion(
        &self,
        exercise_id: &str,
        plan_id: &str,
        completed: bool,
    ) -> Result<(), LocalCacheError> {
        let status = ExerciseStatus::pending(exercise_id, plan_id, completed);
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO exercise_status
                (exercise_id, workout_plan_id, is_completed, is_synced, last_updated)
            VALUES (?, ?, ?, 0, ?)
            "#,
        )
        .bind(&status.exercise_id)
        .bind(&status.workout_plan_id)
        .bind(status.is_completed)
        .bind(timestamp(&status.last_updated))
        .execute(&self.pool)
        .await?;

        match self.try_read_by_id(plan_id).await? {
            Some(mut plan) => {
                if !plan.set_exercise_completed(exercise_id, completed) {
                    tracing::debug!("Exercise {} not in cached plan {}", exercise_id, plan_id);
                }
                self.try_write_one(&plan).await?;
            }
            None => tracing::debug!("Plan {} not cached, only status recorded", plan_id),
        }

        Ok(())
    }
}

fn bind_plan<'q>(
    query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    plan: &'q WorkoutPlan,
    exercises: String,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    query
        .bind(&plan.id)
        .bind(&plan.title)
        .bind(&plan.description)
        .bind(exercises)
        .bind(i64::from(plan.duration))
        .bind(plan.difficulty.to_string())
        .bind(&plan.created_by)
        .bind(&plan.assigned_to)
        .bind(plan.assigned_at.as_ref().map(timestamp))
        .bind(plan.is_completed)
        .bind(plan.completed_at.as_ref().map(timestamp))
        .bind(timestamp(&Utc::now()))
}
