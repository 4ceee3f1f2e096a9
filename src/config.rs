use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub supabase: SupabaseConfig,
    pub openai: OpenAiConfig,
    pub dev: DevConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    /// Enables the development identity for requests without a credential.
    /// Only honored by debug builds.
    pub debug: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
    pub service_role_key: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DevConfig {
    /// Per-collection record limit of the in-memory store.
    pub memory_capacity: usize,
    /// Seed the in-memory store with sample records for the placeholder user.
    pub seed_samples: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            supabase: SupabaseConfig::default(),
            openai: OpenAiConfig::default(),
            dev: DevConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
            log_level: "info".into(),
            debug: false,
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".into(),
            model: "gpt-3.5-turbo".into(),
            max_tokens: 150,
            temperature: 0.7,
        }
    }
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            memory_capacity: 10_000,
            seed_samples: true,
        }
    }
}

/// Returns `~/.emotitask/`, or the working directory when no home is known.
pub fn default_app_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".emotitask")
}

/// Returns the default config file path: `~/.emotitask/config.toml`
pub fn default_config_path() -> PathBuf {
    default_app_dir().join("config.toml")
}

impl AppConfig {
    /// Load config from the default TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            AppConfig::default()
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply environment variable overrides. Variable names match the
    /// deployment `.env` files (`SUPABASE_URL`, `API_PORT`, `DEBUG`, ...).
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("SUPABASE_URL") {
            self.supabase.url = val;
        }
        if let Ok(val) = std::env::var("SUPABASE_ANON_KEY") {
            self.supabase.anon_key = val;
        }
        if let Ok(val) = std::env::var("SUPABASE_SERVICE_ROLE_KEY") {
            self.supabase.service_role_key = val;
        }
        if let Ok(val) = std::env::var("API_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("API_PORT") {
            self.server.port = val
                .parse()
                .with_context(|| format!("API_PORT is not a valid port: {val}"))?;
        }
        if let Ok(val) = std::env::var("DEBUG") {
            self.server.debug = val.eq_ignore_ascii_case("true");
        }
        if let Ok(val) = std::env::var("EMOTITASK_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("OPENAI_API_KEY") {
            self.openai.api_key = val;
        }
        if let Ok(val) = std::env::var("OPENAI_BASE_URL") {
            self.openai.base_url = val;
        }
        if let Ok(val) = std::env::var("OPENAI_MODEL") {
            self.openai.model = val;
        }
        Ok(())
    }

    /// Whether the remote store can be used: needs the project URL and the service key.
    pub fn store_configured(&self) -> bool {
        !self.supabase.url.is_empty() && !self.supabase.service_role_key.is_empty()
    }

    /// Whether the identity provider endpoints (sign up / sign in) can be used.
    pub fn auth_configured(&self) -> bool {
        !self.supabase.url.is_empty() && !self.supabase.anon_key.is_empty()
    }

    pub fn llm_configured(&self) -> bool {
        !self.openai.api_key.is_empty()
    }

    /// Log a warning for every missing integration setting. Never fails.
    pub fn warn_missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.supabase.url.is_empty() {
            warn!("SUPABASE_URL not configured - remote storage and auth are disabled");
            missing.push("SUPABASE_URL");
        }
        if self.supabase.anon_key.is_empty() {
            warn!("SUPABASE_ANON_KEY not configured - sign up and sign in will not work");
            missing.push("SUPABASE_ANON_KEY");
        }
        if self.supabase.service_role_key.is_empty() {
            warn!("SUPABASE_SERVICE_ROLE_KEY not configured - database operations will not work");
            missing.push("SUPABASE_SERVICE_ROLE_KEY");
        }
        if self.openai.api_key.is_empty() {
            warn!("OPENAI_API_KEY not configured - chat will use canned responses");
            missing.push("OPENAI_API_KEY");
        }
        missing
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.log_level, "info");
        assert!(!config.server.debug);
        assert_eq!(config.openai.model, "gpt-3.5-turbo");
        assert_eq!(config.dev.memory_capacity, 10_000);
        assert!(!config.store_configured());
        assert!(!config.llm_configured());
        assert!(default_config_path().ends_with("config.toml"));
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[server]
port = 9000
debug = true

[supabase]
url = "https://example.supabase.co"
service_role_key = "service"

[dev]
memory_capacity = 5
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 9000);
        assert!(config.server.debug);
        assert_eq!(config.supabase.url, "https://example.supabase.co");
        assert_eq!(config.dev.memory_capacity, 5);
        assert!(config.store_configured());
        // anon key missing, so the identity provider endpoints stay off
        assert!(!config.auth_configured());
        // defaults still apply for unset fields
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.openai.max_tokens, 150);
    }

    #[test]
    fn missing_settings_are_reported_not_fatal() {
        let config = AppConfig::default();
        let missing = config.warn_missing();
        assert_eq!(
            missing,
            vec![
                "SUPABASE_URL",
                "SUPABASE_ANON_KEY",
                "SUPABASE_SERVICE_ROLE_KEY",
                "OPENAI_API_KEY"
            ]
        );
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        std::env::set_var("SUPABASE_URL", "https://env.supabase.co");
        std::env::set_var("API_PORT", "8123");
        std::env::set_var("DEBUG", "True");

        config.apply_env_overrides().unwrap();

        assert_eq!(config.supabase.url, "https://env.supabase.co");
        assert_eq!(config.server.port, 8123);
        assert!(config.server.debug);

        // Clean up
        std::env::remove_var("SUPABASE_URL");
        std::env::remove_var("API_PORT");
        std::env::remove_var("DEBUG");
    }
}
