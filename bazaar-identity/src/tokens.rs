use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Session,
    Upload,
    CacheInsert,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub kind: TokenKind,
    pub exp: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
}

#[derive(Debug)]
pub enum TokenError {
    Expired,
    Invalid(String),
    WrongKind,
}

/// Issues and verifies the three token families the control plane hands
/// out: session (login), upload (chunked artifact writes), and
/// cache-insert (LLM-dispatcher writes to the semantic cache). All three
/// are HS256 JWTs signed by the same process-local secret; the `kind`
/// claim keeps a token from one family being accepted where another is
/// expected.
#[derive(Clone)]
pub struct TokenService {
    secret: Vec<u8>,
}

impl TokenService {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self { secret: secret.into() }
    }

    fn now() -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs()
    }

    pub fn issue_session_token(&self, user_id: Uuid) -> String {
        self.encode(Claims {
            sub: user_id,
            kind: TokenKind::Session,
            exp: Self::now() + 3600 * 12,
            model_id: None,
            model_name: None,
        })
    }

    /// Lifetime scales with declared upload size: a 15-minute floor plus a
    /// linear term per megabyte, capped at 24 hours. The exact curve is an
    /// implementation policy (spec §9 open question); this is deliberately
    /// simple and reconfigurable.
    pub fn issue_upload_token(&self, user_id: Uuid, model_id: Uuid, model_name: &str, size_bytes: u64) -> String {
        const FLOOR_SECS: u64 = 15 * 60;
        const PER_MB_SECS: u64 = 2;
        const CAP_SECS: u64 = 24 * 3600;

        let size_mb = size_bytes / (1024 * 1024);
        let lifetime = (FLOOR_SECS + size_mb * PER_MB_SECS).min(CAP_SECS);

        self.encode(Claims {
            sub: user_id,
            kind: TokenKind::Upload,
            exp: Self::now() + lifetime,
            model_id: Some(model_id),
            model_name: Some(model_name.to_string()),
        })
    }

    pub fn issue_cache_insert_token(&self, model_id: Uuid) -> String {
        self.encode(Claims {
            sub: model_id,
            kind: TokenKind::CacheInsert,
            exp: Self::now() + 5 * 60,
            model_id: Some(model_id),
            model_name: None,
        })
    }

    fn encode(&self, claims: Claims) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.secret),
        )
        .expect("HS256 encoding of a well-formed claims struct never fails")
    }

    fn decode_any(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        decode::<Claims>(token, &DecodingKey::from_secret(&self.secret), &validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                other => TokenError::Invalid(other.to_string()),
            })
    }

    pub fn verify_session(&self, token: &str) -> Result<Uuid, TokenError> {
        let claims = self.decode_any(token)?;
        if claims.kind != TokenKind::Session {
            return Err(TokenError::WrongKind);
        }
        Ok(claims.sub)
    }

    pub fn verify_upload(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.decode_any(token)?;
        if claims.kind != TokenKind::Upload {
            return Err(TokenError::WrongKind);
        }
        Ok(claims)
    }

    pub fn verify_cache_insert(&self, token: &str) -> Result<Uuid, TokenError> {
        let claims = self.decode_any(token)?;
        if claims.kind != TokenKind::CacheInsert {
            return Err(TokenError::WrongKind);
        }
        claims.model_id.ok_or_else(|| TokenError::Invalid("missing model_id claim".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_token_round_trips() {
        let svc = TokenService::new("test-secret");
        let user_id = Uuid::new_v4();
        let token = svc.issue_session_token(user_id);
        assert_eq!(svc.verify_session(&token).unwrap(), user_id);
    }

    #[test]
    fn upload_token_rejected_as_session() {
        let svc = TokenService::new("test-secret");
        let token = svc.issue_upload_token(Uuid::new_v4(), Uuid::new_v4(), "foo", 1_000_000);
        assert!(matches!(svc.verify_session(&token), Err(TokenError::WrongKind)));
    }

    #[test]
    fn upload_token_lifetime_scales_and_caps() {
        let svc = TokenService::new("test-secret");
        let small = svc.issue_upload_token(Uuid::new_v4(), Uuid::new_v4(), "small", 1024);
        let huge = svc.issue_upload_token(Uuid::new_v4(), Uuid::new_v4(), "huge", 100 * 1024 * 1024 * 1024);
        let small_claims = svc.verify_upload(&small).unwrap();
        let huge_claims = svc.verify_upload(&huge).unwrap();
        assert!(huge_claims.exp >= small_claims.exp);
    }

    #[test]
    fn cache_insert_token_carries_model_id() {
        let svc = TokenService::new("test-secret");
        let model_id = Uuid::new_v4();
        let token = svc.issue_cache_insert_token(model_id);
        assert_eq!(svc.verify_cache_insert(&token).unwrap(), model_id);
    }
}
