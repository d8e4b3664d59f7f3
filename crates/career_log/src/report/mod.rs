use std::sync::Arc;

use tracing::{debug, info};

use crate::daily_log::ReportRequest;
use crate::error::AppError;
use crate::llm::{CompletionOptions, LlmClient};
use crate::storage::LogStore;

pub mod prompts;

pub use prompts::{LOG_SEPARATOR, build_report_prompt};

/// Turns a range of stored logs into a career-development report.
#[derive(Clone)]
pub struct ReportGenerator {
    store: Arc<dyn LogStore>,
    llm: Arc<dyn LlmClient>,
}

impl ReportGenerator {
    pub fn new(store: Arc<dyn LogStore>, llm: Arc<dyn LlmClient>) -> Self {
        Self { store, llm }
    }

    /// Raw markdown of every stored log whose key falls inside the range,
    /// in key order, each followed by the separator. Empty when nothing matches.
    pub async fn collect_logs(&self, range: &ReportRequest) -> Result<String, AppError> {
        let mut combined = String::new();
        let mut included = 0usize;

        for key in self.store.list().await? {
            if !range.contains(&key) {
                continue;
            }
            let content = self.store.read_raw(&key).await?;
            combined.push_str(&content);
            combined.push_str(LOG_SEPARATOR);
            included += 1;
        }

        debug!(
            start = %range.start_date,
            end = %range.end_date,
            included,
            "collected logs for report"
        );
        Ok(combined)
    }

    pub async fn generate(&self, range: &ReportRequest) -> Result<String, AppError> {
        let logs = self.collect_logs(range).await?;
        if logs.is_empty() {
            return Err(AppError::NotFound(
                "No logs found in the specified date range.".to_string(),
            ));
        }

        let prompt = build_report_prompt(&logs);
        let options = CompletionOptions {
            system: Some(prompts::REPORT_SYSTEM.to_string()),
            temperature: prompts::REPORT_TEMPERATURE,
        };

        let identity = self.llm.identity();
        info!(
            provider = identity.provider,
            model = identity.model.as_deref().unwrap_or("-"),
            prompt_chars = prompt.len(),
            "requesting report"
        );

        self.llm
            .complete(&prompt, &options)
            .await
            .map_err(AppError::upstream)
    }
}
