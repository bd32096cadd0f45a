use crate::{
    Result,
    auth::HttpAuthApi,
    client::ApiClient,
    config::Config,
    session::{FileTokenStore, SessionManager},
    transport::HttpTransport,
};
use log::debug;

pub type Session = SessionManager<HttpAuthApi, FileTokenStore>;
pub type Api = ApiClient<HttpTransport>;

/// Everything a command needs: the configuration, the session and a client for both services.
#[derive(Debug)]
pub struct State {
    config: Config,
    session: Session,
    api: Api,
}

impl State {
    /// Loads the config and restores any stored session before the first request is made.
    pub async fn load() -> Result<Self> {
        let config = Config::load()?;
        Self::from_config(config).await
    }

    pub async fn from_config(config: Config) -> Result<Self> {
        let auth = HttpAuthApi::new(config.urls().auth(), config.timeout())?;
        let transport = HttpTransport::new(config.endpoints(), config.timeout())?;
        let mut session = SessionManager::new(auth, FileTokenStore::default());
        session.init().await;
        let mut api = ApiClient::new(transport, config.routing().clone());
        api.set_bearer(session.token().map(String::from));
        debug!(
            "Ready; clients at {}, goals at {}",
            config.urls().client_service(),
            config.urls().goal_service()
        );
        Ok(Self {
            config,
            session,
            api,
        })
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    #[inline]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[inline]
    pub fn api(&self) -> &Api {
        &self.api
    }

    pub async fn login(&mut self, username: String, password: String) -> Result<()> {
        let result = self.session.login(username, password).await;
        self.sync_bearer();
        result.map(|_| ())
    }

    pub async fn register(&mut self, username: String, email: String, password: String) -> Result<()> {
        let result = self.session.register(username, email, password).await;
        self.sync_bearer();
        result.map(|_| ())
    }

    pub fn logout(&mut self) -> Result<()> {
        let result = self.session.logout();
        self.sync_bearer();
        self.api.clear_cache();
        result
    }

    fn sync_bearer(&mut self) {
        self.api.set_bearer(self.session.token().map(String::from));
    }
}
