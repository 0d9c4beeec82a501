use bazaar_catalog::models::{NewPasswordRequest, SignupRequest};
use bazaar_catalog::Envelope;
use r2e::prelude::*;

use bazaar_catalog::AppError;

use crate::basic_auth::BasicAuth;
use crate::dto::{LoginResponse, ResetPasswordRequest, UserInfoResponse, VerifyRequest};
use crate::identity::BazaarUser;
use crate::services::IdentityService;
use crate::state::AppState;
use crate::validate::validated;

#[derive(Controller)]
#[controller(path = "/user", state = AppState)]
pub struct IdentityController {
    #[inject]
    identity: IdentityService,
}

#[routes]
impl IdentityController {
    #[post("/signup")]
    async fn signup(&self, Json(body): Json<SignupRequest>) -> Result<Json<Envelope<UserInfoResponse>>, AppError> {
        validated(&body)?;
        let user = self.identity.signup(&body).await?;
        Ok(Json(Envelope::ok("signup successful, check your email to verify your account", user.into())))
    }

    #[get("/login")]
    async fn login(&self, auth: BasicAuth) -> Result<Json<Envelope<LoginResponse>>, AppError> {
        let access_token = self.identity.login(&auth.email, &auth.password).await?;
        Ok(Json(Envelope::ok("login successful", LoginResponse { access_token })))
    }

    #[post("/verify")]
    async fn verify(&self, Json(body): Json<VerifyRequest>) -> Result<Json<Envelope<UserInfoResponse>>, AppError> {
        let user = self.identity.verify(body.token).await?;
        Ok(Json(Envelope::ok("account verified", user.into())))
    }

    #[post("/reset-password")]
    async fn reset_password(&self, Json(body): Json<ResetPasswordRequest>) -> Result<Json<Envelope<()>>, AppError> {
        validated(&body)?;
        self.identity.request_password_reset(&body.email).await?;
        Ok(Json(Envelope::ok("if that email is registered, a reset code was sent", ())))
    }

    #[post("/new-password")]
    async fn new_password(&self, Json(body): Json<NewPasswordRequest>) -> Result<Json<Envelope<()>>, AppError> {
        validated(&body)?;
        self.identity.set_new_password(&body).await?;
        Ok(Json(Envelope::ok("password updated", ())))
    }

    #[get("/info")]
    async fn info(&self, user: BazaarUser) -> Result<Json<Envelope<UserInfoResponse>>, AppError> {
        let info = self.identity.info(user.user_id).await?;
        Ok(Json(Envelope::ok("ok", info.into())))
    }
}
