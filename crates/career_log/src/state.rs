use std::sync::Arc;

use tokio::sync::Notify;

use crate::{
    config::{AppConfig, LlmProviderConfig},
    llm::{LlmClient, LocalStubClient, OpenAiClient},
    report::ReportGenerator,
    storage::{FsLogStore, LogStore},
};

#[derive(Clone)]
pub struct AppContext {
    config: Arc<AppConfig>,
    shutdown: Arc<Notify>,
    store: Arc<dyn LogStore>,
    llm: Arc<dyn LlmClient>,
}

impl AppContext {
    pub fn new(config: AppConfig, store: Arc<dyn LogStore>, llm: Arc<dyn LlmClient>) -> Self {
        Self {
            config: Arc::new(config),
            shutdown: Arc::new(Notify::new()),
            store,
            llm,
        }
    }

    /// Filesystem store under the configured logs directory, LLM client per
    /// the configured provider.
    pub fn from_app_config(config: AppConfig) -> anyhow::Result<Self> {
        let llm: Arc<dyn LlmClient> = match &config.llm {
            LlmProviderConfig::LocalStub => Arc::new(LocalStubClient),
            LlmProviderConfig::OpenAi {
                model,
                api_key_env,
                base_url,
                organization,
            } => Arc::new(OpenAiClient::from_env(
                api_key_env,
                model,
                base_url.clone(),
                organization.clone(),
            )?),
        };
        let store: Arc<dyn LogStore> = Arc::new(FsLogStore::new(config.logs_dir.clone()));
        Ok(Self::new(config, store, llm))
    }

    pub fn config(&self) -> Arc<AppConfig> {
        Arc::clone(&self.config)
    }

    pub fn store(&self) -> Arc<dyn LogStore> {
        Arc::clone(&self.store)
    }

    pub fn llm(&self) -> Arc<dyn LlmClient> {
        Arc::clone(&self.llm)
    }

    pub fn reports(&self) -> ReportGenerator {
        ReportGenerator::new(self.store(), self.llm())
    }

    pub fn shutdown_notifier(&self) -> Arc<Notify> {
        Arc::clone(&self.shutdown)
    }

    pub fn request_shutdown(&self) {
        self.shutdown.notify_waiters();
    }
}
