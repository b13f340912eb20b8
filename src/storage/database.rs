//! PostgreSQL database client for assessment records.
//!
//! Assessments are append-only from the pipeline's perspective: the service
//! inserts one row per evaluated QA interaction and reads them back for
//! inspection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use uuid::Uuid;

use super::migrations::MigrationRunner;

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Connection to the database failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(#[from] sqlx::Error),

    /// Record not found.
    #[error("Assessment not found: {0}")]
    NotFound(Uuid),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Migration error.
    #[error("Migration error: {0}")]
    Migration(#[from] super::migrations::MigrationError),
}

/// A chunk returned by the retrieval system for a QA interaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    /// The retrieved text.
    pub content: String,
    /// Retrieval score, when the retriever reports one.
    pub score: Option<f64>,
}

/// Payload for creating an assessment record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAssessment {
    /// The question that was asked.
    pub question: String,
    /// The answer that was produced.
    pub answer: String,
    /// Reference context a human or judge verified as correct.
    pub verified_reference_context: Option<String>,
    /// Chunks the retriever returned for the question.
    pub chunks_retrieved: Option<Vec<RetrievedChunk>>,
}

impl NewAssessment {
    /// Min/max/avg over the scores of the retrieved chunks.
    ///
    /// All three are `None` when no chunk carries a score.
    pub fn score_stats(&self) -> (Option<f64>, Option<f64>, Option<f64>) {
        let scores: Vec<f64> = self
            .chunks_retrieved
            .iter()
            .flatten()
            .filter_map(|chunk| chunk.score)
            .collect();

        if scores.is_empty() {
            return (None, None, None);
        }

        let min = scores.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let avg = scores.iter().sum::<f64>() / scores.len() as f64;

        (Some(min), Some(max), Some(avg))
    }
}

/// A persisted assessment record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Assessment {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
    pub verified_reference_context: Option<String>,
    pub chunks_retrieved: Option<serde_json::Value>,
    pub min_retrieval_score: Option<f64>,
    pub max_retrieval_score: Option<f64>,
    pub avg_retrieval_score: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// PostgreSQL database client.
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connects to the database and returns a new client.
    ///
    /// # Arguments
    ///
    /// * `database_url` - PostgreSQL connection string
    pub async fn connect(database_url: &str) -> Result<Self, DatabaseError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .min_connections(1)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect(database_url)
            .await
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        Ok(Self { pool })
    }

    /// Creates a new database client from an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs database migrations.
    pub async fn run_migrations(&self) -> Result<(), DatabaseError> {
        let runner = MigrationRunner::new(self.pool.clone());
        runner.run_migrations().await?;
        Ok(())
    }

    /// Inserts an assessment, computing retrieval score statistics from the
    /// submitted chunks, and returns the stored row.
    pub async fn insert_assessment(
        &self,
        new: &NewAssessment,
    ) -> Result<Assessment, DatabaseError> {
        let (min_score, max_score, avg_score) = new.score_stats();
        let chunks_json = match &new.chunks_retrieved {
            Some(chunks) => Some(serde_json::to_value(chunks)?),
            None => None,
        };

        let assessment: Assessment = sqlx::query_as(
            r#"
            INSERT INTO assessments (
                id, question, answer, verified_reference_context, chunks_retrieved,
                min_retrieval_score, max_retrieval_score, avg_retrieval_score, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, question, answer, verified_reference_context, chunks_retrieved,
                      min_retrieval_score, max_retrieval_score, avg_retrieval_score, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.question)
        .bind(&new.answer)
        .bind(&new.verified_reference_context)
        .bind(&chunks_json)
        .bind(min_score)
        .bind(max_score)
        .bind(avg_score)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(assessment)
    }

    /// Fetches an assessment by id.
    pub async fn get_assessment(&self, id: Uuid) -> Result<Assessment, DatabaseError> {
        let assessment: Option<Assessment> = sqlx::query_as(
            r#"
            SELECT id, question, answer, verified_reference_context, chunks_retrieved,
                   min_retrieval_score, max_retrieval_score, avg_retrieval_score, created_at
            FROM assessments WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        assessment.ok_or(DatabaseError::NotFound(id))
    }

    /// Lists the most recent assessments.
    pub async fn list_assessments(&self, limit: i64) -> Result<Vec<Assessment>, DatabaseError> {
        let assessments: Vec<Assessment> = sqlx::query_as(
            r#"
            SELECT id, question, answer, verified_reference_context, chunks_retrieved,
                   min_retrieval_score, max_retrieval_score, avg_retrieval_score, created_at
            FROM assessments ORDER BY created_at DESC LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(assessments)
    }
}
