mod job_message;
mod model;
mod team;
mod user;

pub use job_message::{JobMessage, JobMessageLevel};
pub use model::{
    AccessLevel, JobStatus, Model, ModelAttribute, ModelDependency, ModelMetadata,
    ModelNameCheck, ModelPermission, Permission, UpdateAccessLevelRequest,
    UpdateDefaultPermissionRequest, UpdateModelPermissionRequest,
};
pub use team::{CreateTeamRequest, Team};
pub use user::{NewPasswordRequest, PasswordReset, SignupRequest, TeamRole, User, UserTeam};
