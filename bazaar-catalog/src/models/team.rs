use garde::Validate;
use r2e::r2e_data::Entity;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Team {
    pub id: Uuid,
    pub name: String,
}

impl Entity for Team {
    type Id = Uuid;

    fn table_name() -> &'static str {
        "teams"
    }

    fn id_column() -> &'static str {
        "id"
    }

    fn columns() -> &'static [&'static str] {
        &["id", "name"]
    }

    fn id(&self) -> &Uuid {
        &self.id
    }
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct CreateTeamRequest {
    #[garde(length(min = 1, max = 100))]
    pub name: String,
}
