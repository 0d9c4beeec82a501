use r2e::r2e_data::Entity;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, JsonSchema)]
#[sqlx(type_name = "job_message_level", rename_all = "snake_case")]
pub enum JobMessageLevel {
    Warning,
    Error,
}

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct JobMessage {
    pub id: Uuid,
    pub model_id: Uuid,
    pub job_type: String,
    pub level: JobMessageLevel,
    pub message: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Entity for JobMessage {
    type Id = Uuid;

    fn table_name() -> &'static str {
        "job_messages"
    }

    fn id_column() -> &'static str {
        "id"
    }

    fn columns() -> &'static [&'static str] {
        &["id", "model_id", "job_type", "level", "message", "created_at"]
    }

    fn id(&self) -> &Uuid {
        &self.id
    }
}
