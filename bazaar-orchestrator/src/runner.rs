use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobFamily {
    Train,
    Deploy,
}

/// A validated, serialized job request ready to hand to the external
/// runner: "accept, execute, report terminal state via callback."
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSpec {
    pub family: JobFamily,
    pub model_id: Uuid,
    pub job_name: String,
    pub payload: Value,
}

#[derive(Debug)]
pub enum RunnerError {
    Rejected(String),
    Unreachable(String),
    Timeout,
}

impl std::fmt::Display for RunnerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunnerError::Rejected(msg) => write!(f, "runner rejected job: {msg}"),
            RunnerError::Unreachable(msg) => write!(f, "runner unreachable: {msg}"),
            RunnerError::Timeout => write!(f, "runner call timed out"),
        }
    }
}

/// The external job-execution collaborator contract: submit a spec,
/// receive a runner-assigned job id; stop an in-flight job by that id.
/// Out of scope per spec §1 ("the model training engine itself"); this
/// crate only speaks the submission/cancellation protocol.
#[async_trait]
pub trait JobRunner: Send + Sync {
    async fn submit(&self, spec: &JobSpec) -> Result<String, RunnerError>;
    async fn stop(&self, job_id: &str) -> Result<(), RunnerError>;
}

/// HTTP implementation: 5s connect / 60s read timeout and one idempotent
/// retry on a 5xx or connection error, per the outbound-call policy in
/// spec §5.
pub struct HttpJobRunner {
    client: reqwest::Client,
    base_url: String,
}

impl HttpJobRunner {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(60))
            .build()
            .expect("reqwest client configuration is static and always valid");
        Self { client, base_url: base_url.into() }
    }

    async fn post_with_retry(&self, path: &str, body: &impl Serialize) -> Result<reqwest::Response, RunnerError> {
        let url = format!("{}{}", self.base_url, path);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = self.client.post(&url).json(body).send().await;
            match result {
                Ok(resp) if resp.status().is_server_error() && attempt < 2 => continue,
                Ok(resp) => return Ok(resp),
                Err(err) if attempt < 2 && (err.is_connect() || err.is_timeout()) => continue,
                Err(err) if err.is_timeout() => return Err(RunnerError::Timeout),
                Err(err) => return Err(RunnerError::Unreachable(err.to_string())),
            }
        }
    }
}

#[async_trait]
impl JobRunner for HttpJobRunner {
    async fn submit(&self, spec: &JobSpec) -> Result<String, RunnerError> {
        let resp = self.post_with_retry("/jobs", spec).await?;
        if !resp.status().is_success() {
            return Err(RunnerError::Rejected(format!("runner returned {}", resp.status())));
        }
        #[derive(Deserialize)]
        struct SubmitResponse {
            job_id: String,
        }
        resp.json::<SubmitResponse>()
            .await
            .map(|r| r.job_id)
            .map_err(|e| RunnerError::Unreachable(e.to_string()))
    }

    async fn stop(&self, job_id: &str) -> Result<(), RunnerError> {
        let resp = self.post_with_retry(&format!("/jobs/{job_id}/stop"), &()).await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(RunnerError::Rejected(format!("runner returned {}", resp.status())))
        }
    }
}

/// In-memory runner for tests: records submitted specs and always
/// succeeds, mirroring the `MockBackend` idiom used elsewhere in the
/// framework for "contract trait + deterministic test double."
#[derive(Default)]
pub struct MockJobRunner {
    pub submitted: tokio::sync::Mutex<Vec<JobSpec>>,
}

#[async_trait]
impl JobRunner for MockJobRunner {
    async fn submit(&self, spec: &JobSpec) -> Result<String, RunnerError> {
        let job_id = format!("mock-job-{}", spec.model_id);
        self.submitted.lock().await.push(spec.clone());
        Ok(job_id)
    }

    async fn stop(&self, _job_id: &str) -> Result<(), RunnerError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_runner_records_submissions() {
        let runner = MockJobRunner::default();
        let spec = JobSpec {
            family: JobFamily::Train,
            model_id: Uuid::new_v4(),
            job_name: "train-foo".into(),
            payload: serde_json::json!({}),
        };
        let job_id = runner.submit(&spec).await.unwrap();
        assert!(job_id.starts_with("mock-job-"));
        assert_eq!(runner.submitted.lock().await.len(), 1);
    }
}
