//! Data Access Layer
//!
//! Persistence for completed assessments, backed by PostgreSQL via `sqlx`.
//! The store is behind a trait so the completion handoff can be exercised
//! without a live database; failures here are logged and surfaced to the
//! caller but never corrupt in-memory session state.

use anyhow::Result;
use async_trait::async_trait;
use persona_core::profile::PersonaProfile;
use persona_core::scoring::AssessmentScore;
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::models::AssessmentRecord;

/// Storage contract for completed assessments.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssessmentStore: Send + Sync {
    async fn save(
        &self,
        user_id: &str,
        profile: &PersonaProfile,
        score: &AssessmentScore,
    ) -> Result<()>;

    /// All saved assessments for a user, newest first.
    async fn fetch_all(&self, user_id: &str) -> Result<Vec<AssessmentRecord>>;

    async fn fetch(&self, id: Uuid) -> Result<Option<AssessmentRecord>>;

    async fn delete(&self, id: Uuid) -> Result<()>;
}

/// A wrapper around the `PgPool` to provide a clear data access interface.
#[derive(Clone)]
pub struct Db {
    pool: PgPool,
}

impl Db {
    /// Creates a new `Db` instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs all pending `sqlx` migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl AssessmentStore for Db {
    async fn save(
        &self,
        user_id: &str,
        profile: &PersonaProfile,
        score: &AssessmentScore,
    ) -> Result<()> {
        sqlx::query("INSERT INTO assessments (user_id, profile, score) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(Json(profile))
            .bind(Json(score))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn fetch_all(&self, user_id: &str) -> Result<Vec<AssessmentRecord>> {
        let records = sqlx::query_as::<_, AssessmentRecord>(
            r#"
            SELECT id, user_id, profile, score, created_at
            FROM assessments
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<AssessmentRecord>> {
        let record = sqlx::query_as::<_, AssessmentRecord>(
            "SELECT id, user_id, profile, score, created_at FROM assessments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM assessments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
