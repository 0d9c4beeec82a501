use std::time::Duration;

use bazaar_catalog::models::Permission;
use serde::Deserialize;

#[derive(Debug)]
pub enum ControlPlaneError {
    Unreachable(String),
}

/// The replica's only outbound dependency on the control plane: "does
/// this caller have at least this level of access to this model" (spec
/// §1's "permission verification against the control plane"). Answers
/// are cached per caller by `ReplicaPermissionCache` so a busy replica
/// doesn't round-trip on every request.
pub struct ControlPlaneClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct PermissionCheckEnvelope {
    data: Option<PermissionCheckData>,
}

#[derive(Deserialize)]
struct PermissionCheckData {
    allowed: bool,
}

impl ControlPlaneClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client configuration is static and always valid");
        Self { client, base_url: base_url.into() }
    }

    pub async fn check_permission(&self, token: &str, model_identifier: &str, required: Permission) -> Result<bool, ControlPlaneError> {
        let required = match required {
            Permission::Read => "Read",
            Permission::Write => "Write",
        };
        let url = format!("{}/model/permission-check", self.base_url);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(&[("model_identifier", model_identifier), ("required", required)])
            .send()
            .await
            .map_err(|e| ControlPlaneError::Unreachable(e.to_string()))?;

        if !resp.status().is_success() {
            return Ok(false);
        }
        let envelope: PermissionCheckEnvelope = resp.json().await.map_err(|e| ControlPlaneError::Unreachable(e.to_string()))?;
        Ok(envelope.data.map(|d| d.allowed).unwrap_or(false))
    }
}
