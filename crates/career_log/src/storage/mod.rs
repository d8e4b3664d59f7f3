use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::Context;
use async_trait::async_trait;
use tokio::fs as async_fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::daily_log::{DailyLog, validate_date_key};
use crate::error::AppError;

pub mod markdown;
mod memory;

pub use memory::MemoryLogStore;

pub const LOGS_DIR: &str = "daily_logs";
pub(crate) const RECORDS_DIR: &str = ".records";

/// Persistence for daily logs, one entry per date. Saving a date that
/// already exists overwrites it.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Persists the log and returns where it was written.
    async fn save(&self, log: &DailyLog) -> Result<String, AppError>;

    async fn load(&self, date: &str) -> Result<DailyLog, AppError>;

    /// Stored date keys in ascending order.
    async fn list(&self) -> Result<Vec<String>, AppError>;

    /// The markdown view exactly as stored.
    async fn read_raw(&self, date: &str) -> Result<String, AppError>;
}

pub fn ensure_logs_layout(logs_dir: &Path) -> anyhow::Result<()> {
    let records = logs_dir.join(RECORDS_DIR);
    std::fs::create_dir_all(&records).with_context(|| format!("creating dir {:?}", records))?;
    Ok(())
}

pub async fn write_markdown(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent).await?;
    }
    let mut file = async_fs::File::create(path).await?;
    file.write_all(content.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

pub fn list_markdown_files(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .map(|ext| ext == "md")
                .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect()
}

/// Markdown files in a flat directory with a structured JSON record kept
/// next to each one. The markdown is what humans and reports read; the
/// record is what `load` trusts while it is not older than the markdown.
#[derive(Debug, Clone)]
pub struct FsLogStore {
    root: PathBuf,
}

impl FsLogStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn markdown_path(&self, date: &str) -> PathBuf {
        self.root.join(format!("{date}.md"))
    }

    fn record_path(&self, date: &str) -> PathBuf {
        self.root.join(RECORDS_DIR).join(format!("{date}.json"))
    }

    /// The structured record, if one exists and is at least as new as the
    /// markdown view. Anything else defers to the markdown.
    async fn read_record(&self, date: &str) -> Result<Option<DailyLog>, AppError> {
        let path = self.record_path(date);
        if !record_is_current(&self.markdown_path(date), &path).await {
            return Ok(None);
        }

        let content = match async_fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(err) => {
                warn!(date, error = %err, "unreadable structured record, parsing markdown");
                return Ok(None);
            }
        };

        let log = serde_json::from_str(&content).map_err(|err| {
            AppError::ParseFailure(format!("corrupt record for {date}: {err}"))
        })?;
        Ok(Some(log))
    }
}

#[async_trait]
impl LogStore for FsLogStore {
    async fn save(&self, log: &DailyLog) -> Result<String, AppError> {
        validate_date_key(&log.log_date)?;

        let record = serde_json::to_string_pretty(log)
            .map_err(|err| AppError::Storage(std::io::Error::other(err)))?;
        let record_path = self.record_path(&log.log_date);

        // Drop the old record first so a failure below leaves the markdown
        // as the only source for this date.
        match async_fs::remove_file(&record_path).await {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }

        let path = self.markdown_path(&log.log_date);
        write_markdown(&path, &markdown::render(log)).await?;
        write_markdown(&record_path, &record).await?;

        info!(date = %log.log_date, path = %path.display(), "daily log saved");
        Ok(path.to_string_lossy().to_string())
    }

    async fn load(&self, date: &str) -> Result<DailyLog, AppError> {
        // A key that could never have been saved is simply absent.
        if validate_date_key(date).is_err() {
            return Err(AppError::NotFound(format!("Log not found for {date}")));
        }

        // The markdown view is the existence check; an orphaned record is ignored.
        let markdown = self.read_raw(date).await?;

        if let Some(log) = self.read_record(date).await? {
            debug!(date, "loaded daily log from structured record");
            return Ok(log);
        }

        debug!(date, "no structured record, parsing markdown");
        Ok(markdown::parse(&markdown, date))
    }

    async fn list(&self) -> Result<Vec<String>, AppError> {
        if !async_fs::try_exists(&self.root).await? {
            warn!(path = %self.root.display(), "logs directory missing");
            return Ok(Vec::new());
        }

        let mut keys: Vec<String> = list_markdown_files(&self.root)
            .into_iter()
            .filter_map(|path| {
                path.file_stem()
                    .and_then(|stem| stem.to_str())
                    .map(str::to_string)
            })
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn read_raw(&self, date: &str) -> Result<String, AppError> {
        let path = self.markdown_path(date);
        async_fs::read_to_string(&path)
            .await
            .map_err(|err| read_error(date, err))
    }
}

async fn modified_at(path: &Path) -> Option<SystemTime> {
    async_fs::metadata(path)
        .await
        .and_then(|meta| meta.modified())
        .ok()
}

/// A record older than its markdown was left behind by an edit or a
/// restore that only touched the markdown.
async fn record_is_current(markdown_path: &Path, record_path: &Path) -> bool {
    match (modified_at(markdown_path).await, modified_at(record_path).await) {
        (Some(markdown), Some(record)) => record >= markdown,
        _ => false,
    }
}

fn read_error(date: &str, err: std::io::Error) -> AppError {
    match err.kind() {
        ErrorKind::NotFound => AppError::NotFound(format!("Log not found for {date}")),
        ErrorKind::InvalidData => {
            AppError::ParseFailure(format!("log for {date} is not valid UTF-8"))
        }
        _ => AppError::Storage(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_log(date: &str) -> DailyLog {
        DailyLog {
            log_date: date.to_string(),
            name: "Ada".to_string(),
            project: "Engine / Sprint 12".to_string(),
            tasks_completed: vec!["Shipped the parser".to_string()],
            tasks_planned: vec!["Write the docs".to_string()],
            blockers: vec![],
            reflection_well: "Good focus".to_string(),
            reflection_improve: String::new(),
        }
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let temp = tempdir().unwrap();
        let store = FsLogStore::new(temp.path().join(LOGS_DIR));

        let location = store.save(&sample_log("2024-01-15")).await.unwrap();
        assert!(location.ends_with("2024-01-15.md"));
        assert!(temp.path().join("daily_logs/.records/2024-01-15.json").exists());

        let loaded = store.load("2024-01-15").await.unwrap();
        assert_eq!(loaded, sample_log("2024-01-15"));
    }

    #[tokio::test]
    async fn load_falls_back_to_markdown_without_record() {
        let temp = tempdir().unwrap();
        let logs_dir = temp.path().join(LOGS_DIR);
        ensure_logs_layout(&logs_dir).unwrap();
        let store = FsLogStore::new(&logs_dir);

        let markdown = markdown::render(&sample_log("2024-01-15"));
        std::fs::write(logs_dir.join("2024-01-15.md"), markdown).unwrap();

        let loaded = store.load("2024-01-15").await.unwrap();
        assert_eq!(loaded.name, "Ada");
        assert_eq!(loaded.project, "Engine / Sprint 12");
        assert!(loaded.blockers.is_empty());
    }

    #[tokio::test]
    async fn save_overwrites_existing_date() {
        let temp = tempdir().unwrap();
        let store = FsLogStore::new(temp.path().join(LOGS_DIR));

        store.save(&sample_log("2024-01-15")).await.unwrap();
        let mut updated = sample_log("2024-01-15");
        updated.name = "Grace".to_string();
        store.save(&updated).await.unwrap();

        assert_eq!(store.list().await.unwrap(), vec!["2024-01-15".to_string()]);
        assert_eq!(store.load("2024-01-15").await.unwrap().name, "Grace");
        let raw = store.read_raw("2024-01-15").await.unwrap();
        assert!(raw.contains("**Name:** Grace"));
    }

    #[tokio::test]
    async fn load_missing_date_is_not_found() {
        let temp = tempdir().unwrap();
        let store = FsLogStore::new(temp.path().join(LOGS_DIR));
        let err = store.load("2024-03-01").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn load_non_canonical_key_is_not_found() {
        let temp = tempdir().unwrap();
        let store = FsLogStore::new(temp.path().join(LOGS_DIR));
        let err = store.load("2024-1-5").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn load_ignores_record_older_than_markdown() {
        let temp = tempdir().unwrap();
        let logs_dir = temp.path().join(LOGS_DIR);
        let store = FsLogStore::new(&logs_dir);
        store.save(&sample_log("2024-01-15")).await.unwrap();

        let mut edited = sample_log("2024-01-15");
        edited.name = "Grace".to_string();
        std::fs::write(logs_dir.join("2024-01-15.md"), markdown::render(&edited)).unwrap();
        std::fs::File::options()
            .write(true)
            .open(logs_dir.join(".records/2024-01-15.json"))
            .unwrap()
            .set_modified(SystemTime::now() - std::time::Duration::from_secs(3600))
            .unwrap();

        let loaded = store.load("2024-01-15").await.unwrap();
        assert_eq!(loaded.name, "Grace");
        assert!(store.read_raw("2024-01-15").await.unwrap().contains("Grace"));
    }

    #[tokio::test]
    async fn failed_record_write_keeps_load_and_markdown_in_step() {
        let temp = tempdir().unwrap();
        let logs_dir = temp.path().join(LOGS_DIR);
        let store = FsLogStore::new(&logs_dir);
        store.save(&sample_log("2024-01-15")).await.unwrap();

        // Records can no longer be written.
        std::fs::remove_dir_all(logs_dir.join(".records")).unwrap();
        std::fs::write(logs_dir.join(".records"), "not a directory").unwrap();

        let mut updated = sample_log("2024-01-15");
        updated.name = "Grace".to_string();
        let err = store.save(&updated).await.unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));

        let loaded = store.load("2024-01-15").await.unwrap();
        let raw = store.read_raw("2024-01-15").await.unwrap();
        assert!(raw.contains(&format!("**Name:** {}", loaded.name)));
    }

    #[tokio::test]
    async fn save_rejects_non_date_keys() {
        let temp = tempdir().unwrap();
        let store = FsLogStore::new(temp.path().join(LOGS_DIR));
        let err = store.save(&sample_log("../escape")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(!temp.path().join("escape.md").exists());
    }

    #[tokio::test]
    async fn list_returns_sorted_markdown_stems_only() {
        let temp = tempdir().unwrap();
        let store = FsLogStore::new(temp.path().join(LOGS_DIR));
        store.save(&sample_log("2024-02-01")).await.unwrap();
        store.save(&sample_log("2024-01-15")).await.unwrap();
        std::fs::write(temp.path().join("daily_logs/notes.txt"), "ignored").unwrap();

        let keys = store.list().await.unwrap();
        assert_eq!(keys, vec!["2024-01-15".to_string(), "2024-02-01".to_string()]);
    }

    #[tokio::test]
    async fn list_on_missing_directory_is_empty() {
        let temp = tempdir().unwrap();
        let store = FsLogStore::new(temp.path().join("absent"));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_utf8_markdown_is_parse_failure() {
        let temp = tempdir().unwrap();
        let logs_dir = temp.path().join(LOGS_DIR);
        ensure_logs_layout(&logs_dir).unwrap();
        std::fs::write(logs_dir.join("2024-01-15.md"), [0xff, 0xfe, 0x00]).unwrap();

        let store = FsLogStore::new(&logs_dir);
        let err = store.load("2024-01-15").await.unwrap_err();
        assert!(matches!(err, AppError::ParseFailure(_)));
    }
}
