use crate::{Error, Result};
use async_trait::async_trait;
use log::{debug, error};
use reqwest::header::{AUTHORIZATION, HeaderValue};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub username: String,
    pub role: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ValidateResponse {
    pub valid: bool,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl ValidateResponse {
    pub fn invalid() -> Self {
        Self::default()
    }
}

#[derive(Debug, Deserialize)]
struct AuthErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// The authentication endpoints served next to the client service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, request: LoginRequest) -> Result<AuthResponse>;
    async fn register(&self, request: RegisterRequest) -> Result<AuthResponse>;
    /// Asks the service whether a token is still good. A rejected token is `Ok` with
    /// `valid == false`; only transport failures are errors.
    async fn validate(&self, token: String) -> Result<ValidateResponse>;
}

#[derive(Debug, Clone)]
pub struct HttpAuthApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAuthApi {
    pub fn new<S: AsRef<str>>(base_url: S, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: String::from(base_url.as_ref().trim_end_matches('/')),
        })
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let url = format!("{}{path}", self.base_url);
        debug!("POST {url}");
        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();
        let text = response.text().await?;
        if status.is_success() {
            Ok(serde_json::from_str(&text)?)
        } else {
            let reason = serde_json::from_str::<AuthErrorBody>(&text)
                .ok()
                .and_then(|b| b.error.or(b.message))
                .unwrap_or_else(|| format!("HTTP {status}"));
            Err(Error::auth(reason))
        }
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn login(&self, request: LoginRequest) -> Result<AuthResponse> {
        self.post("/login", &request).await.inspect_err(|e| {
            error!("Login failed: {e}");
        })
    }

    async fn register(&self, request: RegisterRequest) -> Result<AuthResponse> {
        self.post("/register", &request).await.inspect_err(|e| {
            error!("Registration failed: {e}");
        })
    }

    async fn validate(&self, token: String) -> Result<ValidateResponse> {
        let url = format!("{}/validate", self.base_url);
        let bearer = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| Error::auth(format!("Invalid token format: {e}")))?;
        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, bearer)
            .json(&serde_json::json!({}))
            .send()
            .await?;
        if !response.status().is_success() {
            debug!("Token rejected with HTTP {}", response.status());
            return Ok(ValidateResponse::invalid());
        }
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}
