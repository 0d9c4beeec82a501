use std::sync::Arc;

use bazaar_catalog::models::{JobMessageLevel, JobStatus, Model, ModelPermission};
use bazaar_catalog::repository::{JobMessageRepository, ModelRepository};
use bazaar_catalog::AppError;
use bazaar_orchestrator::runner::{JobFamily, JobRunner, JobSpec};
use bazaar_orchestrator::transitions::{preceding_states, valid_transition};
use bazaar_permissions::Principal;
use r2e::prelude::*;
use uuid::Uuid;

use crate::services::model_service::ModelService;

#[derive(Clone)]
pub struct DeployService {
    models: ModelRepository,
    job_messages: JobMessageRepository,
    model_service: ModelService,
    runner: Arc<dyn JobRunner>,
}

#[bean]
impl DeployService {
    pub fn new(
        models: ModelRepository,
        job_messages: JobMessageRepository,
        model_service: ModelService,
        runner: Arc<dyn JobRunner>,
    ) -> Self {
        Self { models, job_messages, model_service, runner }
    }

    /// Deployments aren't a separate table: a model's `deploy_status` and
    /// `Model::deployment_name()` model the whole deployment lifecycle, so
    /// `deployment_id` and `model_id` are the same value everywhere in this
    /// service.
    pub async fn by_deployment_identifier(&self, identifier: &str) -> Result<Model, AppError> {
        let bare = identifier.strip_prefix("deployment-").unwrap_or(identifier);
        self.model_service.by_identifier(bare).await
    }

    pub async fn run(&self, principal: &Principal, model_identifier: &str, payload: serde_json::Value) -> Result<Model, AppError> {
        let model = self.model_service.by_identifier(model_identifier).await?;
        self.model_service.require_write(principal, &model).await?;

        if model.train_status != JobStatus::Complete {
            return Err(AppError::Conflict(format!("model train status is {:?}, not complete", model.train_status)));
        }

        let job = JobSpec {
            family: JobFamily::Deploy,
            model_id: model.id,
            job_name: model.deployment_name(),
            payload,
        };

        self.models.transition_deploy_status(model.id, preceding_states(JobStatus::Starting), JobStatus::Starting).await?;

        match self.runner.submit(&job).await {
            Ok(_) => {
                self.models.transition_deploy_status(model.id, preceding_states(JobStatus::InProgress), JobStatus::InProgress).await?;
            }
            Err(err) => {
                self.models.transition_deploy_status(model.id, preceding_states(JobStatus::Failed), JobStatus::Failed).await?;
                self.job_messages.append(model.id, "deploy", JobMessageLevel::Error, &err.to_string()).await?;
                return Err(AppError::Transient(err.to_string()));
            }
        }

        self.models.by_id(model.id).await
    }

    /// Stop sends a delete to the runner and only transitions to `stopped`
    /// once the runner confirms — per the cancellation policy in spec §5,
    /// a confirmation timeout still forces the row to `stopped` with a
    /// JobMessage noting the reconciliation failure.
    pub async fn stop(&self, principal: &Principal, deployment_identifier: &str) -> Result<Model, AppError> {
        let model = self.by_deployment_identifier(deployment_identifier).await?;
        self.model_service.require_write(principal, &model).await?;

        if let Err(err) = self.runner.stop(&model.deployment_name()).await {
            self.job_messages
                .append(model.id, "deploy", JobMessageLevel::Warning, &format!("stop did not confirm: {err}"))
                .await?;
        }
        self.models.transition_deploy_status(model.id, &[model.deploy_status], JobStatus::Stopped).await?;
        self.models.by_id(model.id).await
    }

    pub async fn status(&self, principal: &Principal, deployment_identifier: &str) -> Result<Model, AppError> {
        let model = self.by_deployment_identifier(deployment_identifier).await?;
        self.model_service.require_read(principal, &model).await?;
        Ok(model)
    }

    pub async fn update_status(&self, deployment_id: Uuid, status: JobStatus) -> Result<(), AppError> {
        let model = self.models.by_id(deployment_id).await?;
        if !valid_transition(model.deploy_status, status) {
            return Err(AppError::Conflict(format!(
                "cannot move deploy status from {:?} to {status:?}",
                model.deploy_status
            )));
        }
        self.models.transition_deploy_status(deployment_id, &[model.deploy_status], status).await?;
        Ok(())
    }

    pub async fn permissions(&self, principal: &Principal, deployment_id: Uuid) -> Result<Vec<ModelPermission>, AppError> {
        let model = self.models.by_id(deployment_id).await?;
        self.model_service.require_write(principal, &model).await?;
        self.models.permissions_for_model(deployment_id).await
    }
}
