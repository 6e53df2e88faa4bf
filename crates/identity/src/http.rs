//! Reqwest-backed identity provider adapter.
//!
//! Talks to an Identity Toolkit style REST API. This adapter owns transport
//! details only: request serialisation, timeout, and mapping of provider
//! error codes onto [`IdentityError`].

use std::time::Duration;

use async_trait::async_trait;
use common::{Claims, NewItem};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{Credential, IdentityError, IdentityProvider, Result, UserRecord};

/// Connection settings for [`HttpIdentityProvider`].
#[derive(Debug, Clone)]
pub struct HttpIdentityConfig {
    /// API root, e.g. `https://identitytoolkit.googleapis.com`.
    pub base_url: Url,
    /// Project whose user pool is administered.
    pub project_id: String,
    /// Public API key used for token lookups.
    pub api_key: Option<String>,
    /// OAuth access token authorising admin calls.
    pub access_token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// Identity provider adapter that performs HTTP requests against one project.
pub struct HttpIdentityProvider {
    client: Client,
    config: HttpIdentityConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    display_name: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignUpResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LocalIdRequest<'a> {
    local_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateClaimsRequest<'a> {
    local_id: &'a str,
    custom_attributes: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest<'a> {
    id_token: &'a str,
}

#[derive(Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl HttpIdentityProvider {
    /// Build an adapter using a reqwest client with the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(mut config: HttpIdentityConfig) -> std::result::Result<Self, reqwest::Error> {
        // `Url::join` drops a last path segment that has no trailing slash
        if !config.base_url.path().ends_with('/') {
            let path = format!("{}/", config.base_url.path());
            config.base_url.set_path(&path);
        }
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn project_url(&self, action: &str) -> Result<Url> {
        let path = format!("v1/projects/{}/{action}", self.config.project_id);
        self.config
            .base_url
            .join(&path)
            .map_err(|e| IdentityError::Decode(format!("invalid identity endpoint: {e}")))
    }

    fn lookup_url(&self) -> Result<Url> {
        let mut url = self
            .config
            .base_url
            .join("v1/accounts:lookup")
            .map_err(|e| IdentityError::Decode(format!("invalid identity endpoint: {e}")))?;
        if let Some(ref key) = self.config.api_key {
            url.query_pairs_mut().append_pair("key", key);
        }
        Ok(url)
    }

    async fn post<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        url: Url,
        body: &B,
        subject: &str,
    ) -> Result<R> {
        let mut request = self.client.post(url).json(body);
        if let Some(ref token) = self.config.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() {
            return Err(map_error_response(status, bytes.as_ref(), subject));
        }

        serde_json::from_slice(bytes.as_ref()).map_err(|e| {
            IdentityError::Decode(format!("invalid identity provider payload: {e}"))
        })
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    #[tracing::instrument(skip(self, item, credential), fields(email = %item.email_address))]
    async fn create_user(&self, item: &NewItem, credential: &Credential) -> Result<UserRecord> {
        let url = self.project_url("accounts")?;
        let body = SignUpRequest {
            email: &item.email_address,
            password: credential.expose(),
            display_name: &item.name,
        };

        let created: SignUpResponse = self.post(url, &body, &item.email_address).await?;
        Ok(UserRecord {
            uid: created.local_id,
            email: created.email.unwrap_or_else(|| item.email_address.clone()),
            display_name: created.display_name.unwrap_or_else(|| item.name.clone()),
            custom_claims: Claims::default(),
        })
    }

    #[tracing::instrument(skip(self))]
    async fn delete_user(&self, uid: &str) -> Result<()> {
        let url = self.project_url("accounts:delete")?;
        let _: serde_json::Value = self
            .post(url, &LocalIdRequest { local_id: uid }, uid)
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, claims))]
    async fn set_custom_claims(&self, uid: &str, claims: &Claims) -> Result<()> {
        let url = self.project_url("accounts:update")?;
        let custom_attributes = claims
            .to_json_string()
            .map_err(|e| IdentityError::Decode(format!("claims not encodable: {e}")))?;
        let body = UpdateClaimsRequest {
            local_id: uid,
            custom_attributes,
        };
        let _: serde_json::Value = self.post(url, &body, uid).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, token))]
    async fn verify_token(&self, token: &str) -> Result<String> {
        let url = self.lookup_url()?;
        let found: LookupResponse = self
            .post(url, &LookupRequest { id_token: token }, "token")
            .await?;

        found
            .users
            .into_iter()
            .next()
            .map(|user| user.local_id)
            .ok_or_else(|| IdentityError::InvalidToken("token has no subject".to_string()))
    }
}

/// Maps a provider error body (`{"error":{"message":"CODE : detail"}}`).
fn map_error_response(status: StatusCode, body: &[u8], subject: &str) -> IdentityError {
    let message = serde_json::from_slice::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| String::from_utf8_lossy(body).into_owned());
    let code = message
        .split([' ', ':'])
        .next()
        .unwrap_or_default()
        .trim();

    match code {
        "USER_NOT_FOUND" => IdentityError::UserNotFound(subject.to_string()),
        "EMAIL_EXISTS" | "DUPLICATE_EMAIL" => IdentityError::EmailExists(subject.to_string()),
        "INVALID_ID_TOKEN" | "TOKEN_EXPIRED" | "USER_DISABLED" | "INVALID_TOKEN" => {
            IdentityError::InvalidToken(code.to_string())
        }
        _ => IdentityError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(base: &str) -> HttpIdentityProvider {
        HttpIdentityProvider::new(HttpIdentityConfig {
            base_url: Url::parse(base).unwrap(),
            project_id: "demo-project".to_string(),
            api_key: Some("key-123".to_string()),
            access_token: None,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn project_urls_include_project_and_action() {
        let provider = provider("https://identity.example.com/");
        let url = provider.project_url("accounts:delete").unwrap();
        assert_eq!(
            url.as_str(),
            "https://identity.example.com/v1/projects/demo-project/accounts:delete"
        );
    }

    #[test]
    fn base_path_prefix_is_kept() {
        for base in [
            "https://identity.example.com/prefix",
            "https://identity.example.com/prefix/",
        ] {
            let provider = provider(base);
            assert_eq!(
                provider.project_url("accounts").unwrap().as_str(),
                "https://identity.example.com/prefix/v1/projects/demo-project/accounts"
            );
            assert_eq!(
                provider.lookup_url().unwrap().as_str(),
                "https://identity.example.com/prefix/v1/accounts:lookup?key=key-123"
            );
        }
    }

    #[test]
    fn lookup_url_carries_api_key() {
        let provider = provider("https://identity.example.com/");
        let url = provider.lookup_url().unwrap();
        assert_eq!(
            url.as_str(),
            "https://identity.example.com/v1/accounts:lookup?key=key-123"
        );
    }

    #[test]
    fn maps_user_not_found() {
        let body = br#"{"error":{"code":400,"message":"USER_NOT_FOUND"}}"#;
        let err = map_error_response(StatusCode::BAD_REQUEST, body, "ext-1");
        assert!(matches!(err, IdentityError::UserNotFound(ref uid) if uid == "ext-1"));
    }

    #[test]
    fn maps_email_exists_with_detail_suffix() {
        let body = br#"{"error":{"message":"EMAIL_EXISTS : already in use"}}"#;
        let err = map_error_response(StatusCode::BAD_REQUEST, body, "a@example.com");
        assert!(matches!(err, IdentityError::EmailExists(_)));
    }

    #[test]
    fn maps_token_rejections() {
        for code in ["INVALID_ID_TOKEN", "TOKEN_EXPIRED", "USER_DISABLED"] {
            let body = format!(r#"{{"error":{{"message":"{code}"}}}}"#);
            let err = map_error_response(StatusCode::BAD_REQUEST, body.as_bytes(), "token");
            assert!(matches!(err, IdentityError::InvalidToken(_)), "{code}");
        }
    }

    #[test]
    fn unknown_errors_keep_status_and_body() {
        let err = map_error_response(StatusCode::SERVICE_UNAVAILABLE, b"upstream down", "x");
        match err {
            IdentityError::Api { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "upstream down");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
