use r2e::prelude::*;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{JobMessage, JobMessageLevel};

#[derive(Clone)]
pub struct JobMessageRepository {
    pool: PgPool,
}

#[bean]
impl JobMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn append(
        &self,
        model_id: Uuid,
        job_type: &str,
        level: JobMessageLevel,
        message: &str,
    ) -> Result<JobMessage, AppError> {
        sqlx::query_as::<_, JobMessage>(
            "INSERT INTO job_messages (model_id, job_type, level, message) VALUES ($1, $2, $3, $4) \
             RETURNING id, model_id, job_type, level, message, created_at",
        )
        .bind(model_id)
        .bind(job_type)
        .bind(level)
        .bind(message)
        .fetch_one(&self.pool)
        .await
        .map_err(Into::into)
    }

    pub async fn for_model(&self, model_id: Uuid) -> Result<Vec<JobMessage>, AppError> {
        sqlx::query_as::<_, JobMessage>(
            "SELECT id, model_id, job_type, level, message, created_at FROM job_messages \
             WHERE model_id = $1 ORDER BY created_at",
        )
        .bind(model_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }
}
