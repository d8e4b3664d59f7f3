use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{LogStore, markdown};
use crate::daily_log::{DailyLog, validate_date_key};
use crate::error::AppError;

#[derive(Debug, Clone)]
struct StoredLog {
    log: DailyLog,
    markdown: String,
}

/// Process-local store for tests and throwaway runs. Renders the same
/// markdown view as the filesystem store so reports see identical input.
#[derive(Debug, Default)]
pub struct MemoryLogStore {
    entries: RwLock<BTreeMap<String, StoredLog>>,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores raw markdown without a structured record, as if a file had
    /// been written by hand.
    pub fn insert_raw(&self, date: &str, markdown: impl Into<String>) {
        let markdown = markdown.into();
        let log = markdown::parse(&markdown, date);
        self.entries
            .write()
            .insert(date.to_string(), StoredLog { log, markdown });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl LogStore for MemoryLogStore {
    async fn save(&self, log: &DailyLog) -> Result<String, AppError> {
        validate_date_key(&log.log_date)?;
        let stored = StoredLog {
            log: log.clone(),
            markdown: markdown::render(log),
        };
        self.entries.write().insert(log.log_date.clone(), stored);
        Ok(format!("memory://{}.md", log.log_date))
    }

    async fn load(&self, date: &str) -> Result<DailyLog, AppError> {
        if validate_date_key(date).is_err() {
            return Err(AppError::NotFound(format!("Log not found for {date}")));
        }
        self.entries
            .read()
            .get(date)
            .map(|stored| stored.log.clone())
            .ok_or_else(|| AppError::NotFound(format!("Log not found for {date}")))
    }

    async fn list(&self) -> Result<Vec<String>, AppError> {
        Ok(self.entries.read().keys().cloned().collect())
    }

    async fn read_raw(&self, date: &str) -> Result<String, AppError> {
        self.entries
            .read()
            .get(date)
            .map(|stored| stored.markdown.clone())
            .ok_or_else(|| AppError::NotFound(format!("Log not found for {date}")))
    }
}
