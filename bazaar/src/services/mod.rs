pub mod deploy_service;
pub mod identity_service;
pub mod model_service;
pub mod team_service;
pub mod train_service;
pub mod upload_service;

pub use deploy_service::DeployService;
pub use identity_service::IdentityService;
pub use model_service::ModelService;
pub use team_service::TeamService;
pub use train_service::TrainService;
pub use upload_service::UploadService;
