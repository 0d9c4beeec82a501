use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Capacity and expiry terms, grounded in the platform's license file
/// (`boltLicenseKey` plus an allocation ceiling checked against the job
/// scheduler before a train request is admitted). This crate models the
/// ceiling as a flat count of concurrently active training jobs rather
/// than replicating the external scheduler call.
#[derive(Debug, Clone)]
pub struct LicenseInfo {
    pub max_concurrent_trainings: u64,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug)]
pub enum LicenseError {
    Expired { expired_at: DateTime<Utc> },
    CapacityExceeded { active: u64, max: u64 },
}

impl std::fmt::Display for LicenseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LicenseError::Expired { expired_at } => write!(f, "license expired at {expired_at}"),
            LicenseError::CapacityExceeded { active, max } => {
                write!(f, "license allows {max} concurrent training jobs, {active} already active")
            }
        }
    }
}

/// The external license collaborator contract: given the number of
/// training jobs currently occupying `starting`/`in_progress`, decide
/// whether one more is allowed. Out of scope per spec §1; this crate
/// only speaks the admission-check protocol.
#[async_trait]
pub trait LicenseChecker: Send + Sync {
    async fn admit_training(&self, active_trainings: u64) -> Result<(), LicenseError>;
}

/// Reads capacity and expiry from the environment, mirroring the
/// platform's license-file convention without parsing a signed file.
pub struct EnvLicenseChecker {
    info: LicenseInfo,
}

impl EnvLicenseChecker {
    pub fn new(info: LicenseInfo) -> Self {
        Self { info }
    }

    pub fn from_env() -> Self {
        let max_concurrent_trainings = std::env::var("BAZAAR_LICENSE_MAX_TRAININGS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);
        let expires_at = std::env::var("BAZAAR_LICENSE_EXPIRES_AT")
            .ok()
            .and_then(|v| DateTime::parse_from_rfc3339(&v).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| Utc::now() + chrono::Duration::days(365 * 100));
        Self::new(LicenseInfo { max_concurrent_trainings, expires_at })
    }
}

#[async_trait]
impl LicenseChecker for EnvLicenseChecker {
    async fn admit_training(&self, active_trainings: u64) -> Result<(), LicenseError> {
        let now = Utc::now();
        if now >= self.info.expires_at {
            return Err(LicenseError::Expired { expired_at: self.info.expires_at });
        }
        if active_trainings >= self.info.max_concurrent_trainings {
            return Err(LicenseError::CapacityExceeded { active: active_trainings, max: self.info.max_concurrent_trainings });
        }
        Ok(())
    }
}

/// Always admits, for tests that don't exercise the license path.
#[derive(Default)]
pub struct MockLicenseChecker {
    pub deny: Option<fn(u64) -> LicenseError>,
}

#[async_trait]
impl LicenseChecker for MockLicenseChecker {
    async fn admit_training(&self, active_trainings: u64) -> Result<(), LicenseError> {
        match &self.deny {
            Some(f) => Err(f(active_trainings)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn admits_below_capacity() {
        let checker = EnvLicenseChecker::new(LicenseInfo {
            max_concurrent_trainings: 2,
            expires_at: Utc::now() + chrono::Duration::days(1),
        });
        assert!(checker.admit_training(1).await.is_ok());
    }

    #[tokio::test]
    async fn rejects_at_capacity() {
        let checker = EnvLicenseChecker::new(LicenseInfo {
            max_concurrent_trainings: 2,
            expires_at: Utc::now() + chrono::Duration::days(1),
        });
        let err = checker.admit_training(2).await.unwrap_err();
        assert!(matches!(err, LicenseError::CapacityExceeded { active: 2, max: 2 }));
    }

    #[tokio::test]
    async fn rejects_when_expired() {
        let checker = EnvLicenseChecker::new(LicenseInfo {
            max_concurrent_trainings: 10,
            expires_at: Utc::now() - chrono::Duration::days(1),
        });
        let err = checker.admit_training(0).await.unwrap_err();
        assert!(matches!(err, LicenseError::Expired { .. }));
    }
}
