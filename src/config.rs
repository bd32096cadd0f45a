use crate::{
    CONFIG_FILE_PATH, Result,
    router::{Endpoints, NameRouter},
    search::DEFAULT_DEBOUNCE,
};
use camino::Utf8Path;
use getset::{CopyGetters, Getters};
use log::debug;
use serde::{Deserialize, Serialize};
use std::{
    env,
    fs::{self, DirBuilder, OpenOptions},
    time::Duration,
};

pub const CLIENT_SERVICE_URL_VAR: &str = "CLIENT_GOALS_CLIENT_SERVICE_URL";
pub const GOAL_SERVICE_URL_VAR: &str = "CLIENT_GOALS_GOAL_SERVICE_URL";
pub const AUTH_URL_VAR: &str = "CLIENT_GOALS_AUTH_URL";

pub const DEFAULT_CLIENT_SERVICE_URL: &str = "http://localhost:8080/graphql";
pub const DEFAULT_GOAL_SERVICE_URL: &str = "http://localhost:8081/graphql";
pub const DEFAULT_AUTH_URL: &str = "http://localhost:8080/auth";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(rename_all = "kebab-case", default)]
#[getset(get = "pub")]
pub struct ServiceUrls {
    client_service: String,
    goal_service: String,
    auth: String,
}

impl Default for ServiceUrls {
    fn default() -> Self {
        Self {
            client_service: String::from(DEFAULT_CLIENT_SERVICE_URL),
            goal_service: String::from(DEFAULT_GOAL_SERVICE_URL),
            auth: String::from(DEFAULT_AUTH_URL),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, CopyGetters)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    #[getset(get = "pub")]
    urls: ServiceUrls,
    #[getset(get_copy = "pub")]
    timeout_secs: u64,
    #[getset(get_copy = "pub")]
    page_size: u64,
    #[getset(get_copy = "pub")]
    debounce_ms: u64,
    #[getset(get = "pub")]
    routing: NameRouter,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            urls: ServiceUrls::default(),
            timeout_secs: 30,
            page_size: 10,
            debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
            routing: NameRouter::default(),
        }
    }
}

impl Config {
    pub fn save(&self) -> Result<()> {
        self.save_to(&*CONFIG_FILE_PATH)
    }

    pub fn save_to<P: AsRef<Utf8Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            DirBuilder::new().recursive(true).create(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(path)?;
        serde_norway::to_writer(file, self)?;
        Ok(())
    }

    /// Loads the config file, writing the defaults out first if there is none, then applies
    /// any URL overrides from the environment.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&*CONFIG_FILE_PATH)?;
        config.apply_env();
        Ok(config)
    }

    pub fn load_from<P: AsRef<Utf8Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::read_from(path)
        } else {
            debug!("No config at {path}; writing defaults");
            let config = Self::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Like [`Config::load`], but never touches the disk beyond reading.
    pub fn read() -> Result<Self> {
        let mut config = Self::read_from(&*CONFIG_FILE_PATH)?;
        config.apply_env();
        Ok(config)
    }

    pub fn read_from<P: AsRef<Utf8Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read(path)?;
        Ok(serde_norway::from_slice(&data)?)
    }

    fn apply_env(&mut self) {
        self.apply_overrides(|name| env::var(name).ok());
    }

    fn apply_overrides<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) {
        let targets = [
            (CLIENT_SERVICE_URL_VAR, &mut self.urls.client_service),
            (GOAL_SERVICE_URL_VAR, &mut self.urls.goal_service),
            (AUTH_URL_VAR, &mut self.urls.auth),
        ];
        for (name, target) in targets {
            if let Some(value) = lookup(name).filter(|v| !v.trim().is_empty()) {
                debug!("{name} overrides {target}");
                *target = value;
            }
        }
    }

    #[inline]
    pub fn endpoints(&self) -> Endpoints {
        Endpoints::new(&self.urls.client_service, &self.urls.goal_service)
    }

    #[inline]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[inline]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("client-goals.yaml")).unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());
        assert_eq!(config.urls().client_service(), DEFAULT_CLIENT_SERVICE_URL);
        assert_eq!(config.urls().goal_service(), DEFAULT_GOAL_SERVICE_URL);
        assert_eq!(config.debounce(), DEFAULT_DEBOUNCE);
    }

    #[test]
    fn reading_a_missing_file_leaves_it_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("nested/config.yaml")).unwrap();
        assert_eq!(Config::read_from(&path).unwrap(), Config::default());
        assert!(!path.exists());
        assert!(!path.parent().unwrap().exists());
    }

    #[test]
    fn partial_file_keeps_defaults_for_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("config.yaml")).unwrap();
        fs::write(
            &path,
            "page-size: 20\nrouting:\n  goal-operations: [GetMilestones]\n",
        )
        .unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.page_size(), 20);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.routing().goal_operations(), &["GetMilestones"]);
        assert_eq!(
            config.routing().client_operations(),
            NameRouter::default().client_operations()
        );
    }

    #[test]
    fn environment_overrides_urls() {
        let mut config = Config::default();
        config.apply_overrides(|name| match name {
            GOAL_SERVICE_URL_VAR => Some("https://goals.internal/graphql".into()),
            AUTH_URL_VAR => Some("  ".into()),
            _ => None,
        });
        assert_eq!(config.urls().goal_service(), "https://goals.internal/graphql");
        assert_eq!(config.urls().auth(), DEFAULT_AUTH_URL);
        assert_eq!(
            config.endpoints().url(crate::router::Service::Goals),
            "https://goals.internal/graphql"
        );
    }
}
