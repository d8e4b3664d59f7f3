use std::{env, path::PathBuf};

use anyhow::Context;
use serde::Deserialize;
use tracing_subscriber::{EnvFilter, fmt};

use crate::{llm::DEFAULT_OPENAI_MODEL, storage};

pub const ROOT_ENV: &str = "CAREER_LOG_ROOT";
pub const BIND_ENV: &str = "CAREER_LOG_BIND";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub logs_dir: PathBuf,
    pub server: ServerConfig,
    pub llm: LlmProviderConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum LlmProviderConfig {
    LocalStub,
    OpenAi {
        #[serde(default = "default_openai_model")]
        model: String,
        #[serde(default = "default_openai_api_key_env")]
        api_key_env: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        organization: Option<String>,
    },
}

impl Default for LlmProviderConfig {
    fn default() -> Self {
        LlmProviderConfig::OpenAi {
            model: default_openai_model(),
            api_key_env: default_openai_api_key_env(),
            base_url: None,
            organization: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl ServerConfig {
    pub fn addr(&self) -> &str {
        &self.bind_addr
    }
}

impl AppConfig {
    /// Reads `.env` if present, then the process environment and the
    /// optional `config/llm.yml` under the application root. Creates the
    /// logs directory.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let root = match env::var(ROOT_ENV) {
            Ok(path) => PathBuf::from(path),
            Err(_) => env::current_dir()?,
        };
        let logs_dir = root.join(storage::LOGS_DIR);
        let config_dir = root.join("config");

        let llm_path = config_dir.join("llm.yml");
        let llm = if llm_path.exists() {
            load_yaml(llm_path)?
        } else {
            LlmProviderConfig::default()
        };

        storage::ensure_logs_layout(&logs_dir)?;

        Ok(Self {
            logs_dir,
            llm,
            server: ServerConfig {
                bind_addr: env::var(BIND_ENV).unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            },
        })
    }
}

pub fn load_yaml<T: serde::de::DeserializeOwned>(path: PathBuf) -> anyhow::Result<T> {
    let content =
        std::fs::read_to_string(&path).with_context(|| format!("reading yaml {:?}", path))?;
    let parsed =
        serde_yaml::from_str(&content).with_context(|| format!("parsing yaml {:?}", path))?;
    Ok(parsed)
}

fn default_openai_model() -> String {
    DEFAULT_OPENAI_MODEL.to_string()
}

fn default_openai_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn llm_config_parses_tagged_providers() {
        let stub: LlmProviderConfig = serde_yaml::from_str("provider: local_stub\n").unwrap();
        assert_eq!(stub, LlmProviderConfig::LocalStub);

        let openai: LlmProviderConfig =
            serde_yaml::from_str("provider: open_ai\nbase_url: http://localhost:9000/v1\n")
                .unwrap();
        assert_eq!(
            openai,
            LlmProviderConfig::OpenAi {
                model: "gpt-4-turbo".to_string(),
                api_key_env: "OPENAI_API_KEY".to_string(),
                base_url: Some("http://localhost:9000/v1".to_string()),
                organization: None,
            }
        );
    }

    #[test]
    #[serial]
    fn load_uses_root_and_creates_logs_dir() {
        let tmp = TempDir::new().expect("tempdir");
        std::fs::create_dir_all(tmp.path().join("config")).unwrap();
        std::fs::write(tmp.path().join("config/llm.yml"), "provider: local_stub\n").unwrap();

        unsafe {
            env::set_var(ROOT_ENV, tmp.path());
            env::set_var(BIND_ENV, "127.0.0.1:0");
        }

        let config = AppConfig::load().expect("load config");
        assert_eq!(config.logs_dir, tmp.path().join("daily_logs"));
        assert!(config.logs_dir.is_dir());
        assert_eq!(config.llm, LlmProviderConfig::LocalStub);
        assert_eq!(config.server.addr(), "127.0.0.1:0");

        unsafe {
            env::remove_var(ROOT_ENV);
            env::remove_var(BIND_ENV);
        }
    }

    #[test]
    #[serial]
    fn load_defaults_to_openai_without_llm_yaml() {
        let tmp = TempDir::new().expect("tempdir");
        unsafe {
            env::set_var(ROOT_ENV, tmp.path());
            env::remove_var(BIND_ENV);
        }

        let config = AppConfig::load().expect("load config");
        assert_eq!(config.llm, LlmProviderConfig::default());
        assert_eq!(config.server.addr(), "0.0.0.0:8000");

        unsafe {
            env::remove_var(ROOT_ENV);
        }
    }
}
