//! Client for the hosted identity provider (Supabase GoTrue, `auth/v1`).

use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::AuthError;

/// A user record as returned by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Tokens issued on sign in (and on sign up when no confirmation is required).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default = "bearer")]
    pub token_type: String,
    #[serde(default = "default_expiry")]
    pub expires_in: u64,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: ProviderUser,
}

fn bearer() -> String {
    "bearer".into()
}

fn default_expiry() -> u64 {
    3600
}

/// Result of a sign up: the user, plus a session unless the provider wants
/// the email confirmed first.
#[derive(Debug, Clone)]
pub struct SignUp {
    pub user: ProviderUser,
    pub session: Option<Session>,
}

#[derive(Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    base: Url,
}

impl AuthClient {
    /// `api_key` is sent as the `apikey` header on every call.
    pub fn new(project_url: &str, api_key: &str) -> anyhow::Result<Self> {
        let base = Url::parse(&format!("{}/auth/v1/", project_url.trim_end_matches('/')))
            .with_context(|| format!("invalid SUPABASE_URL: {project_url}"))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(api_key).context("api key is not a valid header")?,
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self { http, base })
    }

    fn endpoint(&self, path: &str) -> Result<Url, AuthError> {
        self.base
            .join(path)
            .map_err(|e| AuthError::Provider(format!("bad auth url: {e}")))
    }

    /// Exchange an access token for its user. `Ok(None)` means the provider
    /// rejected the token.
    pub async fn get_user(&self, token: &str) -> Result<Option<ProviderUser>, AuthError> {
        let response = self
            .http
            .get(self.endpoint("user")?)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .send()
            .await?;

        match response.status() {
            s if s.is_success() => Ok(Some(response.json().await?)),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            s => {
                let body = response.text().await.unwrap_or_default();
                Err(AuthError::Provider(format!("user lookup returned {s}: {body}")))
            }
        }
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUp, AuthError> {
        let response = self
            .http
            .post(self.endpoint("signup")?)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;
        let body = rejected_or_json(response).await?;

        // Returns a session when auto-confirm is on, the bare user otherwise.
        if body.get("access_token").is_some() {
            let session: Session = serde_json::from_value(body)
                .map_err(|e| AuthError::Provider(format!("bad sign up session: {e}")))?;
            Ok(SignUp {
                user: session.user.clone(),
                session: Some(session),
            })
        } else {
            let user = body.get("user").cloned().unwrap_or(body);
            let user: ProviderUser = serde_json::from_value(user)
                .map_err(|e| AuthError::Provider(format!("bad sign up user: {e}")))?;
            Ok(SignUp {
                user,
                session: None,
            })
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let mut url = self.endpoint("token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let response = self
            .http
            .post(url)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;
        let body = rejected_or_json(response).await?;
        serde_json::from_value(body)
            .map_err(|e| AuthError::Provider(format!("bad sign in session: {e}")))
    }

    /// Liveness check (`GET /health`).
    pub async fn health(&self) -> Result<(), AuthError> {
        let response = self.http.get(self.endpoint("health")?).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(AuthError::Provider(format!("health check returned {status}")))
        }
    }

    /// Revoke the session behind `token`.
    pub async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        let response = self
            .http
            .post(self.endpoint("logout")?)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(AuthError::Rejected {
            status: status.as_u16(),
            message: provider_message(&body),
        })
    }
}

/// 4xx responses are the provider refusing the request (bad password, taken
/// email, ...); anything else unexpected is a provider failure.
async fn rejected_or_json(response: reqwest::Response) -> Result<Value, AuthError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }
    let body = response.text().await.unwrap_or_default();
    if status.is_client_error() {
        Err(AuthError::Rejected {
            status: status.as_u16(),
            message: provider_message(&body),
        })
    } else {
        Err(AuthError::Provider(format!("auth provider returned {status}: {body}")))
    }
}

/// Pull a human-readable message out of a GoTrue error body.
fn provider_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            ["msg", "error_description", "message", "error"]
                .iter()
                .find_map(|k| v.get(*k).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| "request rejected by auth provider".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn sign_in_returns_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .and(header("apikey", "anon"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "jwt",
                "token_type": "bearer",
                "expires_in": 3600,
                "refresh_token": "r",
                "user": {"id": "u1", "email": "a@example.com", "aud": "authenticated"}
            })))
            .mount(&server)
            .await;

        let client = AuthClient::new(&server.uri(), "anon").unwrap();
        let session = client.sign_in("a@example.com", "secret1").await.unwrap();
        assert_eq!(session.access_token, "jwt");
        assert_eq!(session.user.id, "u1");
        assert_eq!(session.user.extra.get("aud"), Some(&json!("authenticated")));
    }

    #[tokio::test]
    async fn sign_in_rejection_keeps_provider_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials"
            })))
            .mount(&server)
            .await;

        let client = AuthClient::new(&server.uri(), "anon").unwrap();
        match client.sign_in("a@example.com", "wrong").await.unwrap_err() {
            AuthError::Rejected { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid login credentials");
            }
            other => panic!("expected rejection, got {other}"),
        }
    }

    #[tokio::test]
    async fn sign_up_without_session_returns_user() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "u2",
                "email": "new@example.com"
            })))
            .mount(&server)
            .await;

        let client = AuthClient::new(&server.uri(), "anon").unwrap();
        let outcome = client.sign_up("new@example.com", "secret1").await.unwrap();
        assert_eq!(outcome.user.id, "u2");
        assert!(outcome.session.is_none());
    }

    #[tokio::test]
    async fn rejected_token_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = AuthClient::new(&server.uri(), "anon").unwrap();
        assert!(client.get_user("expired").await.unwrap().is_none());
    }
}
