//! Signing identity and its load-once cell.
//!
//! # Responsibilities
//! - Hold the credential and region scope the gateway signs with
//! - Load it from the configured source on first use
//! - Share it read-only across concurrent requests
//!
//! # Design Decisions
//! - `OnceLock` is the single-execution barrier; no per-request lock
//! - Loading never fails; incomplete identities are rejected at signing
//!   time so the failure is reported per request and logged loudly
//! - The secret never appears in `Debug` output

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::config::{CredentialsConfig, SigningConfig};
use crate::signing::SigningError;

/// Credential plus region scope.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningIdentity {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
    region: String,
}

impl SigningIdentity {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: Option<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token,
            region: region.into(),
        }
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }

    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }

    /// Deployment region.
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Check that every field the signer needs is present.
    pub fn validate(&self) -> Result<(), SigningError> {
        if self.access_key_id.trim().is_empty() {
            return Err(SigningError::InvalidIdentity("access key id is empty"));
        }
        if self.secret_access_key.is_empty() {
            return Err(SigningError::InvalidIdentity("secret access key is empty"));
        }
        if self.region.trim().is_empty() {
            return Err(SigningError::InvalidIdentity("region is empty"));
        }
        if matches!(self.session_token.as_deref(), Some(t) if t.trim().is_empty()) {
            return Err(SigningError::InvalidIdentity("session token is empty"));
        }
        Ok(())
    }
}

impl fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .field("region", &self.region)
            .finish()
    }
}

/// Lazily loaded, process-wide identity.
pub struct IdentityCell {
    config: SigningConfig,
    cell: OnceLock<Arc<SigningIdentity>>,
}

impl IdentityCell {
    /// Cell that loads from `config` on first use.
    pub fn new(config: SigningConfig) -> Self {
        Self {
            config,
            cell: OnceLock::new(),
        }
    }

    /// Cell holding an identity that is already known.
    pub fn preloaded(identity: SigningIdentity) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(Arc::new(identity));
        Self {
            config: SigningConfig::default(),
            cell,
        }
    }

    /// The identity, loading it on the first call.
    pub fn get(&self) -> Arc<SigningIdentity> {
        self.cell
            .get_or_init(|| {
                let identity = load_identity(&self.config, |key| std::env::var(key).ok());
                tracing::info!(
                    access_key_id = %identity.access_key_id(),
                    region = %identity.region(),
                    has_session_token = identity.session_token().is_some(),
                    "Signing identity loaded"
                );
                Arc::new(identity)
            })
            .clone()
    }
}

impl fmt::Debug for IdentityCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityCell")
            .field("loaded", &self.cell.get().is_some())
            .finish()
    }
}

/// Build an identity from configuration and an environment lookup.
pub fn load_identity<F>(config: &SigningConfig, env: F) -> SigningIdentity
where
    F: Fn(&str) -> Option<String>,
{
    let region = Some(config.region.clone())
        .filter(|r| !r.trim().is_empty())
        .or_else(|| env("AWS_REGION"))
        .or_else(|| env("AWS_DEFAULT_REGION"))
        .unwrap_or_default();

    match &config.credentials {
        CredentialsConfig::Environment => SigningIdentity::new(
            env("AWS_ACCESS_KEY_ID").unwrap_or_default(),
            env("AWS_SECRET_ACCESS_KEY").unwrap_or_default(),
            env("AWS_SESSION_TOKEN"),
            region,
        ),
        CredentialsConfig::Static {
            access_key_id,
            secret_access_key,
            session_token,
        } => SigningIdentity::new(
            access_key_id.clone(),
            secret_access_key.clone(),
            session_token.clone(),
            region,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_load_from_environment() {
        let config = SigningConfig::default();
        let identity = load_identity(
            &config,
            env_from(&[
                ("AWS_ACCESS_KEY_ID", "AKIDEXAMPLE"),
                ("AWS_SECRET_ACCESS_KEY", "secret"),
                ("AWS_SESSION_TOKEN", "token"),
                ("AWS_REGION", "us-east-1"),
            ]),
        );

        assert_eq!(identity.access_key_id(), "AKIDEXAMPLE");
        assert_eq!(identity.session_token(), Some("token"));
        assert_eq!(identity.region(), "us-east-1");
        assert!(identity.validate().is_ok());
    }

    #[test]
    fn test_config_region_wins_over_environment() {
        let config = SigningConfig {
            region: "eu-west-1".into(),
            ..SigningConfig::default()
        };
        let identity = load_identity(&config, env_from(&[("AWS_REGION", "us-east-1")]));
        assert_eq!(identity.region(), "eu-west-1");
    }

    #[test]
    fn test_missing_fields_are_invalid() {
        let identity = load_identity(&SigningConfig::default(), env_from(&[]));
        assert!(matches!(
            identity.validate(),
            Err(SigningError::InvalidIdentity(_))
        ));

        let identity = SigningIdentity::new("AKID", "secret", Some(" ".into()), "us-east-1");
        assert_eq!(
            identity.validate(),
            Err(SigningError::InvalidIdentity("session token is empty"))
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let identity = SigningIdentity::new("AKID", "very-secret", Some("tok".into()), "us-east-1");
        let rendered = format!("{:?}", identity);
        assert!(!rendered.contains("very-secret"));
        assert!(!rendered.contains("tok\""));
        assert!(rendered.contains("AKID"));
    }

    #[test]
    fn test_cell_loads_once() {
        let cell = IdentityCell::preloaded(SigningIdentity::new("AKID", "s", None, "us-east-1"));
        let first = cell.get();
        let second = cell.get();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
