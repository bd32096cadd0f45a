//! The authenticated session: who is logged in and which bearer token goes out with requests.
//!
//! ```text
//!   Unauthenticated ──init (stored token)──▶ Validating ──valid──▶ Authenticated
//!         ▲   │                                  │                      │
//!         │   └──────login / register ok─────────┼─────────────────────▶│
//!         └──────────invalid / unreachable───────┘                      │
//!         └──────────────────────────logout─────────────────────────────┘
//! ```
//!
//! The token lives in memory and in a [`TokenStore`]; both copies are set and cleared
//! together.

use crate::{
    Error, Result, SESSION_FILE_PATH,
    auth::{AuthApi, AuthResponse, LoginRequest, RegisterRequest},
};
use camino::{Utf8Path, Utf8PathBuf};
use getset::Getters;
use log::{error, info, warn};
use serde::Serialize;
use std::{
    collections::BTreeMap,
    fs::{self, DirBuilder, OpenOptions},
    sync::Mutex,
};
use strum::EnumIs;
use time::OffsetDateTime;

/// The key the token is stored under.
pub const TOKEN_KEY: &str = "jwt_token";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters)]
#[getset(get = "pub")]
pub struct User {
    username: String,
    role: String,
}

impl User {
    pub fn new<U: Into<String>, R: Into<String>>(username: U, role: R) -> Self {
        Self {
            username: username.into(),
            role: role.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct Session {
    token: String,
    user: User,
    established_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, EnumIs)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Validating,
    Authenticated(Session),
}

/// Durable storage for a single token.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<String>>;
    fn save(&self, token: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Keeps the token in a small YAML file, under [`TOKEN_KEY`].
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: Utf8PathBuf,
}

impl FileTokenStore {
    pub fn new<P: Into<Utf8PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    #[inline]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl Default for FileTokenStore {
    fn default() -> Self {
        Self::new(SESSION_FILE_PATH.clone())
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = fs::read(&self.path)?;
        let mut values: BTreeMap<String, String> = serde_norway::from_slice(&data)?;
        Ok(values.remove(TOKEN_KEY).filter(|t| !t.is_empty()))
    }

    fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            DirBuilder::new().recursive(true).create(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&self.path)?;
        let values = BTreeMap::from([(TOKEN_KEY, token)]);
        serde_norway::to_writer(file, &values)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn with_token<S: Into<String>>(token: S) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.token.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.slot().clone())
    }

    fn save(&self, token: &str) -> Result<()> {
        *self.slot() = Some(String::from(token));
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.slot() = None;
        Ok(())
    }
}

/// Owns the session state. Pass it (or its token) to whatever needs credentials.
#[derive(Debug)]
pub struct SessionManager<A, S> {
    api: A,
    store: S,
    state: SessionState,
}

impl<A: AuthApi, S: TokenStore> SessionManager<A, S> {
    pub fn new(api: A, store: S) -> Self {
        Self {
            api,
            store,
            state: SessionState::Unauthenticated,
        }
    }

    /// Restores a stored session, if there is one, by asking the service to validate its token.
    pub async fn init(&mut self) -> &SessionState {
        let stored = match self.store.load() {
            Ok(token) => token,
            Err(e) => {
                warn!("Could not read the stored session: {e}");
                None
            }
        };
        let Some(token) = stored else {
            self.state = SessionState::Unauthenticated;
            return &self.state;
        };
        self.state = SessionState::Validating;
        match self.api.validate(token.clone()).await {
            Ok(response) if response.valid => {
                let user = User::new(
                    response.username.unwrap_or_default(),
                    response.role.unwrap_or_default(),
                );
                info!("Restored session for {}", user.username);
                self.authenticate(token, user);
            }
            Ok(_) => {
                info!("Stored token is no longer valid");
                self.discard();
            }
            Err(e) => {
                error!("Token validation error: {e}");
                self.discard();
            }
        }
        &self.state
    }

    pub async fn login<U: Into<String>, P: Into<String>>(
        &mut self,
        username: U,
        password: P,
    ) -> Result<Session> {
        let request = LoginRequest {
            username: username.into(),
            password: password.into(),
        };
        let result = self.api.login(request).await;
        self.establish(result)
    }

    pub async fn register<U, E, P>(&mut self, username: U, email: E, password: P) -> Result<Session>
    where
        U: Into<String>,
        E: Into<String>,
        P: Into<String>,
    {
        let request = RegisterRequest {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        };
        let result = self.api.register(request).await;
        self.establish(result)
    }

    pub fn logout(&mut self) -> Result<()> {
        if let SessionState::Authenticated(session) = &self.state {
            info!("Logging out {}", session.user.username);
        }
        self.state = SessionState::Unauthenticated;
        self.store.clear()
    }

    fn establish(&mut self, result: Result<AuthResponse>) -> Result<Session> {
        match result {
            Ok(response) if !response.token.is_empty() => {
                if let Err(e) = self.store.save(&response.token) {
                    self.discard();
                    return Err(e);
                }
                let user = User::new(response.username, response.role);
                info!("Logged in as {}", user.username);
                Ok(self.authenticate(response.token, user))
            }
            Ok(_) => {
                self.discard();
                Err(Error::auth("The service did not return a token"))
            }
            Err(e) => {
                self.discard();
                Err(e)
            }
        }
    }

    fn authenticate(&mut self, token: String, user: User) -> Session {
        let session = Session {
            token,
            user,
            established_at: OffsetDateTime::now_utc(),
        };
        self.state = SessionState::Authenticated(session.clone());
        session
    }

    fn discard(&mut self) {
        self.state = SessionState::Unauthenticated;
        if let Err(e) = self.store.clear() {
            warn!("Could not remove the stored session: {e}");
        }
    }

    #[inline]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn session(&self) -> Option<&Session> {
        match &self.state {
            SessionState::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    #[inline]
    pub fn token(&self) -> Option<&str> {
        self.session().map(|s| s.token.as_str())
    }

    #[inline]
    pub fn user(&self) -> Option<&User> {
        self.session().map(|s| &s.user)
    }

    #[inline]
    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated()
    }

    #[inline]
    pub fn is_loading(&self) -> bool {
        self.state.is_validating()
    }

    #[inline]
    pub fn store(&self) -> &S {
        &self.store
    }
}
