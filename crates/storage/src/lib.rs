use sqlx::{migrate::MigrateError, sqlite::SqlitePoolOptions, Row, SqlitePool};
use thiserror::Error;

use dayfinder_core::types::{Day, DayPatch, NewDay};

/// Top-level database handle that owns the SQLite connection pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Establishes a new SQLite connection pool for the provided connection string.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(StorageError::Connect)?;

        apply_pragmas(&pool).await?;

        Ok(Self { pool })
    }

    /// Applies migrations located under `migrations/`.
    pub async fn run_migrations(&self) -> Result<(), StorageError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(StorageError::Migration)?;
        Ok(())
    }

    /// Returns a handle to operate on day records.
    pub fn days(&self) -> DayRepository {
        DayRepository {
            pool: self.pool.clone(),
        }
    }

    /// Exposes the inner pool when lower level access is required.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

async fn apply_pragmas(pool: &SqlitePool) -> Result<(), StorageError> {
    sqlx::query("PRAGMA foreign_keys = ON;")
        .execute(pool)
        .await
        .map_err(StorageError::Pragma)?;

    sqlx::query("PRAGMA journal_mode = WAL;")
        .fetch_one(pool)
        .await
        .map_err(StorageError::Pragma)?;

    sqlx::query("PRAGMA synchronous = NORMAL;")
        .execute(pool)
        .await
        .map_err(StorageError::Pragma)?;

    sqlx::query("PRAGMA busy_timeout = 5000;")
        .execute(pool)
        .await
        .map_err(StorageError::Pragma)?;

    Ok(())
}

/// General storage level errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to connect to sqlite: {0}")]
    Connect(sqlx::Error),
    #[error("failed to apply pragma: {0}")]
    Pragma(sqlx::Error),
    #[error("failed to run database migrations: {0}")]
    Migration(MigrateError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Repository responsible for the `day` table.
#[derive(Clone)]
pub struct DayRepository {
    pool: SqlitePool,
}

impl DayRepository {
    /// Inserts a new day and returns the stored record with its assigned id.
    pub async fn insert(&self, record: &NewDay) -> Result<Day, DayError> {
        let row = sqlx::query(
            "INSERT INTO day (date, day_of_week) VALUES (?, ?) \
             RETURNING id, date, day_of_week",
        )
        .bind(&record.date)
        .bind(&record.day_of_week)
        .fetch_one(&self.pool)
        .await?;

        Ok(day_from_row(&row))
    }

    /// Lists every stored day in insertion order.
    pub async fn fetch_all(&self) -> Result<Vec<Day>, DayError> {
        let rows = sqlx::query_as::<_, DayRow>(
            "SELECT id, date, day_of_week FROM day ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(DayRow::into_domain).collect())
    }

    /// Fetches a single day by id.
    pub async fn fetch_by_id(&self, id: i64) -> Result<Option<Day>, DayError> {
        let row = sqlx::query_as::<_, DayRow>(
            "SELECT id, date, day_of_week FROM day WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(DayRow::into_domain))
    }

    /// Returns `true` when a day with the given id exists.
    pub async fn exists(&self, id: i64) -> Result<bool, DayError> {
        let row = sqlx::query("SELECT 1 FROM day WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.is_some())
    }

    /// Overwrites every field of an existing day.
    pub async fn update(&self, record: &Day) -> Result<Day, DayError> {
        let result = sqlx::query("UPDATE day SET date = ?, day_of_week = ? WHERE id = ?")
            .bind(&record.date)
            .bind(&record.day_of_week)
            .bind(record.id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DayError::NotFound);
        }

        Ok(record.clone())
    }

    /// Applies a partial update: only fields present in `patch` overwrite the
    /// stored value. Returns `None` when the id is unknown.
    pub async fn merge(&self, id: i64, patch: &DayPatch) -> Result<Option<Day>, DayError> {
        let Some(mut existing) = self.fetch_by_id(id).await? else {
            return Ok(None);
        };

        if let Some(date) = &patch.date {
            existing.date = date.clone();
        }
        if let Some(day_of_week) = &patch.day_of_week {
            existing.day_of_week = day_of_week.clone();
        }

        self.update(&existing).await.map(Some)
    }

    /// Deletes the day with the given id. Deleting an unknown id is a no-op.
    pub async fn delete(&self, id: i64) -> Result<(), DayError> {
        sqlx::query("DELETE FROM day WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Counts stored days.
    pub async fn count(&self) -> Result<i64, DayError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM day")
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get("n"))
    }
}

fn day_from_row(row: &sqlx::sqlite::SqliteRow) -> Day {
    Day {
        id: row.get("id"),
        date: row.get("date"),
        day_of_week: row.get("day_of_week"),
    }
}

/// Database row for the `day` table.
#[derive(Debug, sqlx::FromRow)]
struct DayRow {
    id: i64,
    date: String,
    day_of_week: String,
}

impl DayRow {
    fn into_domain(self) -> Day {
        Day {
            id: self.id,
            date: self.date,
            day_of_week: self.day_of_week,
        }
    }
}

/// Errors that can occur while operating on day records.
#[derive(Debug, Error)]
pub enum DayError {
    #[error("day not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each test gets its own named in-memory database so pooled connections
    // see the same data without leaking state between tests.
    async fn setup_db(name: &str) -> Database {
        let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
        let db = Database::connect(&url).await.expect("connect");
        db.run_migrations().await.expect("migrations");
        db
    }

    fn new_day(date: &str, day_of_week: &str) -> NewDay {
        NewDay {
            date: date.to_string(),
            day_of_week: day_of_week.to_string(),
        }
    }

    #[tokio::test]
    async fn insert_assigns_id_and_round_trips() {
        let repo = setup_db("insert").await.days();

        let created = repo
            .insert(&new_day("15-08-2025", "FRIDAY"))
            .await
            .expect("insert");
        assert!(created.id > 0);

        let fetched = repo
            .fetch_by_id(created.id)
            .await
            .expect("fetch")
            .expect("present");
        assert_eq!(fetched, created);
        assert_eq!(fetched.date, "15-08-2025");
        assert_eq!(fetched.day_of_week, "FRIDAY");
    }

    #[tokio::test]
    async fn fetch_all_returns_insertion_order() {
        let repo = setup_db("fetch_all").await.days();

        let first = repo.insert(&new_day("11-08-2025", "MONDAY")).await.expect("insert");
        let second = repo.insert(&new_day("12-08-2025", "TUESDAY")).await.expect("insert");

        let all = repo.fetch_all().await.expect("fetch all");
        assert_eq!(all, vec![first, second]);
    }

    #[tokio::test]
    async fn update_overwrites_every_field() {
        let repo = setup_db("update").await.days();
        let created = repo.insert(&new_day("11-08-2025", "MONDAY")).await.expect("insert");

        let updated = repo
            .update(&Day {
                id: created.id,
                date: "12-08-2025".to_string(),
                day_of_week: "TUESDAY".to_string(),
            })
            .await
            .expect("update");

        let fetched = repo
            .fetch_by_id(created.id)
            .await
            .expect("fetch")
            .expect("present");
        assert_eq!(fetched, updated);
        assert_eq!(fetched.day_of_week, "TUESDAY");
    }

    #[tokio::test]
    async fn update_unknown_id_errors_without_writing() {
        let repo = setup_db("update_unknown").await.days();
        repo.insert(&new_day("11-08-2025", "MONDAY")).await.expect("insert");

        let err = repo
            .update(&Day {
                id: 4242,
                date: "12-08-2025".to_string(),
                day_of_week: "TUESDAY".to_string(),
            })
            .await
            .expect_err("unknown id");
        assert!(matches!(err, DayError::NotFound));
        assert_eq!(repo.count().await.expect("count"), 1);
    }

    #[tokio::test]
    async fn merge_overwrites_only_supplied_fields() {
        let repo = setup_db("merge").await.days();
        let created = repo.insert(&new_day("11-08-2025", "MONDAY")).await.expect("insert");

        let merged = repo
            .merge(
                created.id,
                &DayPatch {
                    date: None,
                    day_of_week: Some("SUNDAY".to_string()),
                },
            )
            .await
            .expect("merge")
            .expect("present");

        assert_eq!(merged.date, "11-08-2025");
        assert_eq!(merged.day_of_week, "SUNDAY");
    }

    #[tokio::test]
    async fn merge_unknown_id_returns_none() {
        let repo = setup_db("merge_unknown").await.days();

        let merged = repo
            .merge(99, &DayPatch::default())
            .await
            .expect("merge");
        assert!(merged.is_none());
    }

    #[tokio::test]
    async fn delete_removes_exactly_one_and_is_idempotent() {
        let repo = setup_db("delete").await.days();
        let created = repo.insert(&new_day("11-08-2025", "MONDAY")).await.expect("insert");
        repo.insert(&new_day("12-08-2025", "TUESDAY")).await.expect("insert");

        repo.delete(created.id).await.expect("delete");
        assert_eq!(repo.count().await.expect("count"), 1);
        assert!(repo
            .fetch_by_id(created.id)
            .await
            .expect("fetch")
            .is_none());

        // Deleting the same id again is not an error.
        repo.delete(created.id).await.expect("repeat delete");
        assert_eq!(repo.count().await.expect("count"), 1);
    }

    #[tokio::test]
    async fn migrations_apply() {
        let db = setup_db("migrations").await;

        let tables: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'day'",
        )
        .fetch_one(db.pool())
        .await
        .expect("fetch tables");
        assert_eq!(tables.0, 1);
    }
}
