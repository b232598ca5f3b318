use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub oauth: OAuthConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

/// Which implementation checks bearer tokens.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum VerifierKind {
    /// RS256 ID tokens checked against the provider's JWKS.
    #[default]
    Google,
    /// HS256 tokens signed with `oauth.shared_secret`.
    SharedSecret,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OAuthConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub redirect_url: String,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default = "default_userinfo_uri")]
    pub userinfo_uri: String,
    #[serde(default = "default_jwks_uri")]
    pub jwks_uri: String,
    #[serde(default = "default_issuers")]
    pub issuers: Vec<String>,
    #[serde(default)]
    pub verifier: VerifierKind,
    #[serde(default)]
    pub shared_secret: String,
}

fn default_scopes() -> Vec<String> { vec!["openid".into(), "profile".into(), "email".into()] }
fn default_auth_uri() -> String { "https://accounts.google.com/o/oauth2/v2/auth".into() }
fn default_token_uri() -> String { "https://oauth2.googleapis.com/token".into() }
fn default_userinfo_uri() -> String { "https://www.googleapis.com/userinfo/v2/me".into() }
fn default_jwks_uri() -> String { "https://www.googleapis.com/oauth2/v3/certs".into() }
fn default_issuers() -> Vec<String> {
    vec!["accounts.google.com".into(), "https://accounts.google.com".into()]
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_url: String::new(),
            scopes: default_scopes(),
            auth_uri: default_auth_uri(),
            token_uri: default_token_uri(),
            userinfo_uri: default_userinfo_uri(),
            jwks_uri: default_jwks_uri(),
            issuers: default_issuers(),
            verifier: VerifierKind::default(),
            shared_secret: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Memory,
    File,
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default = "default_file_path")]
    pub file_path: String,
}

fn default_file_path() -> String { "data/documents.json".into() }

impl Default for StoreConfig {
    fn default() -> Self {
        Self { backend: StoreBackend::default(), file_path: default_file_path() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_acquire_timeout() -> u64 { 30 }

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
        }
    }
}

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` (or `CONFIG_PATH`), falling back to defaults when the
    /// file is missing, then apply env overrides and validate.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(e) if is_missing_file(&e) => AppConfig::default(),
            Err(e) => return Err(e),
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.normalize_with(|key| std::env::var(key).ok())?;
        self.validate()
    }

    /// Fill empty values from the environment lookup and clamp defaults.
    pub fn normalize_with<F>(&mut self, env: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.server.normalize(&env)?;
        self.oauth.normalize_from_env(&env);
        self.database.normalize_from_env(&env);
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.oauth.validate()?;
        if self.store.backend == StoreBackend::File && self.store.file_path.trim().is_empty() {
            return Err(anyhow!("store.file_path must be set for the file backend"));
        }
        if self.store.backend == StoreBackend::Postgres {
            self.database.validate()?;
        }
        Ok(())
    }
}

fn is_missing_file(e: &anyhow::Error) -> bool {
    e.downcast_ref::<std::io::Error>()
        .map(|io| io.kind() == std::io::ErrorKind::NotFound)
        .unwrap_or(false)
}

impl ServerConfig {
    fn normalize<F>(&mut self, env: &F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if let Some(port) = env("PORT").and_then(|p| p.parse::<u16>().ok()) {
            self.port = port;
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl OAuthConfig {
    fn normalize_from_env<F>(&mut self, env: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        fill(&mut self.client_id, env("OAUTH_CLIENT_ID"));
        fill(&mut self.client_secret, env("OAUTH_CLIENT_SECRET"));
        fill(&mut self.redirect_url, env("OAUTH_REDIRECT_URL"));
        fill(&mut self.shared_secret, env("OAUTH_SHARED_SECRET"));
        if self.scopes.is_empty() {
            self.scopes = default_scopes();
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self.verifier {
            VerifierKind::Google if self.client_id.trim().is_empty() => {
                Err(anyhow!("oauth.client_id is required for the google verifier"))
            }
            VerifierKind::SharedSecret if self.shared_secret.trim().is_empty() => {
                Err(anyhow!("oauth.shared_secret is required for the shared_secret verifier"))
            }
            _ => Ok(()),
        }
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env<F>(&mut self, env: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        fill(&mut self.url, env("DATABASE_URL"));
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive"));
        }
        Ok(())
    }
}

fn fill(slot: &mut String, value: Option<String>) {
    if slot.trim().is_empty() {
        if let Some(v) = value {
            *slot = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = parse("").unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.store.backend, StoreBackend::Memory);
        assert_eq!(cfg.oauth.verifier, VerifierKind::Google);
        assert_eq!(cfg.oauth.token_uri, "https://oauth2.googleapis.com/token");
    }

    #[test]
    fn parses_sections() {
        let cfg = parse(
            r#"
            [server]
            host = "0.0.0.0"
            port = 9000

            [oauth]
            verifier = "shared_secret"
            shared_secret = "s3cret"
            client_id = "abc.apps.googleusercontent.com"

            [store]
            backend = "file"
            file_path = "var/docs.json"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.oauth.verifier, VerifierKind::SharedSecret);
        assert_eq!(cfg.store.backend, StoreBackend::File);
        assert_eq!(cfg.store.file_path, "var/docs.json");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn env_fills_blank_values_and_port_overrides() {
        let mut cfg = AppConfig::default();
        cfg.normalize_with(env_of(&[
            ("PORT", "3000"),
            ("OAUTH_CLIENT_ID", "from-env"),
            ("DATABASE_URL", "postgres://localhost/db"),
        ]))
        .unwrap();
        assert_eq!(cfg.server.port, 3000);
        assert_eq!(cfg.oauth.client_id, "from-env");
        assert_eq!(cfg.database.url, "postgres://localhost/db");
        assert_eq!(cfg.server.worker_threads, Some(4));
    }

    #[test]
    fn env_does_not_override_configured_client_id() {
        let mut cfg = AppConfig::default();
        cfg.oauth.client_id = "from-file".into();
        cfg.normalize_with(env_of(&[("OAUTH_CLIENT_ID", "from-env")])).unwrap();
        assert_eq!(cfg.oauth.client_id, "from-file");
    }

    #[test]
    fn google_verifier_requires_client_id() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn shared_secret_verifier_requires_secret() {
        let mut cfg = AppConfig::default();
        cfg.oauth.verifier = VerifierKind::SharedSecret;
        assert!(cfg.validate().is_err());
        cfg.oauth.shared_secret = "x".into();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn postgres_backend_requires_postgres_url() {
        let mut cfg = AppConfig::default();
        cfg.oauth.client_id = "id".into();
        cfg.store.backend = StoreBackend::Postgres;
        cfg.database = DatabaseConfig { url: "mysql://x".into(), min_connections: 1, max_connections: 2, connect_timeout_secs: 1, acquire_timeout_secs: 1, sqlx_logging: false };
        assert!(cfg.validate().is_err());
        cfg.database.url = "postgres://localhost/db".into();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn postgres_backend_can_take_its_url_from_env_alone() {
        let mut cfg = parse(
            r#"
            [oauth]
            client_id = "x"

            [store]
            backend = "postgres"
            "#,
        )
        .unwrap();
        cfg.normalize_with(env_of(&[("DATABASE_URL", "postgres://localhost/db")])).unwrap();
        assert_eq!(cfg.database.min_connections, 2);
        assert_eq!(cfg.database.max_connections, 10);
        assert_eq!(cfg.database.connect_timeout_secs, 30);
        assert!(cfg.validate().is_ok());
    }
}
