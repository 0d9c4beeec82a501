use std::sync::Arc;

use bazaar_catalog::models::{JobMessageLevel, JobStatus, Model};
use bazaar_catalog::repository::{JobMessageRepository, ModelRepository};
use bazaar_catalog::AppError;
use bazaar_orchestrator::license::LicenseChecker;
use bazaar_orchestrator::runner::{JobFamily, JobRunner, JobSpec};
use bazaar_orchestrator::transitions::{preceding_states, valid_transition};
use r2e::prelude::*;
use uuid::Uuid;

#[derive(Clone)]
pub struct TrainService {
    models: ModelRepository,
    job_messages: JobMessageRepository,
    runner: Arc<dyn JobRunner>,
    license: Arc<dyn LicenseChecker>,
}

#[bean]
impl TrainService {
    pub fn new(
        models: ModelRepository,
        job_messages: JobMessageRepository,
        runner: Arc<dyn JobRunner>,
        license: Arc<dyn LicenseChecker>,
    ) -> Self {
        Self { models, job_messages, runner, license }
    }

    pub async fn start_ndb(
        &self,
        owner_id: Uuid,
        model_name: &str,
        sub_kind: Option<&str>,
        domain: Option<&str>,
        spec_payload: serde_json::Value,
    ) -> Result<Model, AppError> {
        let active_trainings = self.models.count_active_trainings().await?.max(0) as u64;
        self.license.admit_training(active_trainings).await.map_err(|err| AppError::Quota(err.to_string()))?;

        let model = self.models.reserve(owner_id, model_name, "ndb", sub_kind, domain, None).await?;

        let job = JobSpec {
            family: JobFamily::Train,
            model_id: model.id,
            job_name: model.train_job_name(),
            payload: spec_payload,
        };

        self.models.transition_train_status(model.id, preceding_states(JobStatus::Starting), JobStatus::Starting).await?;

        match self.runner.submit(&job).await {
            Ok(_) => {
                self.models.transition_train_status(model.id, preceding_states(JobStatus::InProgress), JobStatus::InProgress).await?;
            }
            Err(err) => {
                self.models.transition_train_status(model.id, preceding_states(JobStatus::Failed), JobStatus::Failed).await?;
                self.job_messages.append(model.id, "train", JobMessageLevel::Error, &err.to_string()).await?;
                return Err(AppError::Transient(err.to_string()));
            }
        }

        self.models.by_id(model.id).await
    }

    /// Runner callback on success: merges reported metadata and marks the
    /// row complete. Catalog monotonicity (invariant 1) is enforced by
    /// `transition_train_status`'s compare-and-swap `from` list.
    pub async fn complete(&self, model_id: Uuid, metadata: serde_json::Value) -> Result<Model, AppError> {
        let applied = self
            .models
            .transition_train_status(model_id, preceding_states(JobStatus::Complete), JobStatus::Complete)
            .await?;
        if !applied {
            return Err(AppError::Conflict("train job is not in a state that can complete".into()));
        }
        self.models.merge_metadata(model_id, Some(metadata), None).await?;
        self.models.by_id(model_id).await
    }

    pub async fn update_status(&self, model_id: Uuid, status: JobStatus, message: Option<&str>) -> Result<(), AppError> {
        let model = self.models.by_id(model_id).await?;
        if !valid_transition(model.train_status, status) {
            return Err(AppError::Conflict(format!(
                "cannot move train status from {:?} to {status:?}",
                model.train_status
            )));
        }
        self.models.transition_train_status(model_id, &[model.train_status], status).await?;
        if let Some(message) = message {
            let level = if status == JobStatus::Failed { JobMessageLevel::Error } else { JobMessageLevel::Warning };
            self.job_messages.append(model_id, "train", level, message).await?;
        }
        Ok(())
    }
}
