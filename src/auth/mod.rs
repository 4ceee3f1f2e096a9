//! Identity gate: resolve a request's bearer credential to a user id.
//!
//! Exactly one verification mechanism exists: the token is exchanged with
//! the hosted identity provider ([`provider::AuthClient::get_user`]). When the
//! remote store is not configured the gate runs in placeholder mode and every
//! request is the fixed [`PLACEHOLDER_USER_ID`]. Debug builds additionally
//! support a development identity for credential-less requests; release
//! builds do not contain that path.

pub mod provider;

use serde::Serialize;

use crate::config::AppConfig;
use provider::{AuthClient, ProviderUser};

/// Identity used for credential-less requests in debug builds with `DEBUG=true`.
pub const DEV_USER_ID: &str = "12345678-1234-1234-1234-123456789012";
pub const DEV_USER_EMAIL: &str = "dev@example.com";

/// Identity of every request when the remote store is not configured.
pub const PLACEHOLDER_USER_ID: &str = "dummy-user-id";
pub const PLACEHOLDER_USER_EMAIL: &str = "test@example.com";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("authorization header required")]
    MissingCredential,

    #[error("invalid authentication token")]
    InvalidCredential,

    #[error("identity provider not configured")]
    NotConfigured,

    #[error("identity provider rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("identity provider failure: {0}")]
    Provider(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(e: reqwest::Error) -> Self {
        Self::Provider(e.to_string())
    }
}

/// The caller a request was resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub id: String,
    pub email: Option<String>,
}

impl Identity {
    pub fn development() -> Self {
        Self {
            id: DEV_USER_ID.into(),
            email: Some(DEV_USER_EMAIL.into()),
        }
    }

    pub fn placeholder() -> Self {
        Self {
            id: PLACEHOLDER_USER_ID.into(),
            email: Some(PLACEHOLDER_USER_EMAIL.into()),
        }
    }
}

impl From<ProviderUser> for Identity {
    fn from(user: ProviderUser) -> Self {
        Self {
            id: user.id,
            email: user.email,
        }
    }
}

enum Verifier {
    Provider(AuthClient),
    Placeholder,
}

pub struct IdentityGate {
    verifier: Verifier,
    #[cfg(debug_assertions)]
    dev_bypass: bool,
}

impl IdentityGate {
    /// Verify every credential against the identity provider.
    pub fn provider(client: AuthClient) -> Self {
        Self {
            verifier: Verifier::Provider(client),
            #[cfg(debug_assertions)]
            dev_bypass: false,
        }
    }

    /// Accept every request as [`PLACEHOLDER_USER_ID`].
    pub fn placeholder() -> Self {
        Self {
            verifier: Verifier::Placeholder,
            #[cfg(debug_assertions)]
            dev_bypass: false,
        }
    }

    /// Serve credential-less requests as [`DEV_USER_ID`].
    #[cfg(debug_assertions)]
    pub fn with_dev_bypass(mut self, enabled: bool) -> Self {
        self.dev_bypass = enabled;
        self
    }

    /// Provider mode when the remote store is configured, placeholder mode otherwise.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let gate = if config.store_configured() {
            // Token lookups only need some project key; prefer the public one.
            let key = if config.supabase.anon_key.is_empty() {
                &config.supabase.service_role_key
            } else {
                &config.supabase.anon_key
            };
            Self::provider(AuthClient::new(&config.supabase.url, key)?)
        } else {
            Self::placeholder()
        };

        #[cfg(debug_assertions)]
        let gate = gate.with_dev_bypass(config.server.debug);

        if cfg!(not(debug_assertions)) && config.server.debug {
            tracing::warn!("DEBUG is set but release builds have no development identity");
        }

        Ok(gate)
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.verifier, Verifier::Placeholder)
    }

    #[cfg(debug_assertions)]
    fn bypass(&self, credential: Option<&str>) -> Option<Identity> {
        (self.dev_bypass && credential.is_none()).then(Identity::development)
    }

    #[cfg(not(debug_assertions))]
    fn bypass(&self, _credential: Option<&str>) -> Option<Identity> {
        None
    }

    /// Resolve a bearer credential to an identity. Every failure is terminal
    /// for the request.
    pub async fn resolve(&self, credential: Option<&str>) -> Result<Identity, AuthError> {
        if let Some(identity) = self.bypass(credential) {
            tracing::debug!("development identity used for request without credential");
            return Ok(identity);
        }

        let client = match &self.verifier {
            Verifier::Placeholder => return Ok(Identity::placeholder()),
            Verifier::Provider(client) => client,
        };

        let token = credential.ok_or(AuthError::MissingCredential)?;
        match client.get_user(token).await {
            Ok(Some(user)) => Ok(user.into()),
            Ok(None) => Err(AuthError::InvalidCredential),
            Err(e) => {
                tracing::warn!(error = %e, "token exchange failed");
                Err(e)
            }
        }
    }

    /// Same check as [`IdentityGate::resolve`] for a token in hand, but never
    /// errors: any failure is `None`.
    pub async fn verify_token(&self, token: &str) -> Option<Identity> {
        self.resolve(Some(token)).await.ok()
    }
}
