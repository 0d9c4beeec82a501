pub mod deploy_controller;
pub mod identity_controller;
pub mod model_controller;
pub mod team_controller;
pub mod train_controller;
pub mod upload_controller;

pub use deploy_controller::DeployController;
pub use identity_controller::IdentityController;
pub use model_controller::ModelController;
pub use team_controller::TeamController;
pub use train_controller::TrainController;
pub use upload_controller::UploadController;
