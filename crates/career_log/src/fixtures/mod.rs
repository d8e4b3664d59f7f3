use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::storage::{LOGS_DIR, RECORDS_DIR};

const CORE_FIXTURE_DIR: &str = "tests/fixtures/core";

/// Return the on-disk location of the bundled core fixture.
pub fn core_fixture_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(CORE_FIXTURE_DIR)
}

/// Install the bundled core fixture into the provided target root.
///
/// The fixture holds a `config/llm.yml` selecting the offline stub
/// provider and two hand-written logs under `daily_logs/` (no structured
/// records, so loads exercise the markdown parser). Existing files with
/// the same path are overwritten, and any structured record left for an
/// installed date is removed so it cannot shadow the fixture markdown.
pub fn install_core_fixture(target_root: &Path) -> Result<PathBuf> {
    let fixture_root = core_fixture_root();

    copy_dir_recursive(&fixture_root.join("config"), &target_root.join("config"))
        .with_context(|| "copying config fixture")?;
    copy_dir_recursive(&fixture_root.join(LOGS_DIR), &target_root.join(LOGS_DIR))
        .with_context(|| "copying daily log fixture")?;
    drop_stale_records(&fixture_root.join(LOGS_DIR), &target_root.join(LOGS_DIR))?;

    Ok(target_root.to_path_buf())
}

fn drop_stale_records(fixture_logs: &Path, target_logs: &Path) -> Result<()> {
    if !fixture_logs.exists() {
        return Ok(());
    }

    let records = target_logs.join(RECORDS_DIR);
    for entry in fs::read_dir(fixture_logs)? {
        let path = entry?.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("md") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        let record = records.join(format!("{stem}.json"));
        match fs::remove_file(&record) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(err).with_context(|| format!("removing stale record {:?}", record));
            }
        }
    }

    Ok(())
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    if !src.exists() {
        return Ok(());
    }

    fs::create_dir_all(dst).with_context(|| format!("creating fixture dir {:?}", dst))?;

    for entry in fs::read_dir(src).with_context(|| format!("reading fixture dir {:?}", src))? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)
                .with_context(|| format!("copying fixture file {:?}", src_path))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daily_log::DailyLog;
    use crate::storage::{FsLogStore, LogStore};
    use tempfile::TempDir;

    #[test]
    fn core_fixture_root_exists() {
        let root = core_fixture_root();
        assert!(root.exists(), "core fixture directory should exist");
    }

    #[test]
    fn install_core_fixture_copies_files() {
        let tmp = TempDir::new().expect("temp dir");
        let installed = install_core_fixture(tmp.path()).expect("install fixture");
        assert!(installed.join("config/llm.yml").exists());
        assert!(installed.join("daily_logs/2024-01-15.md").exists());
        assert!(installed.join("daily_logs/2024-01-16.md").exists());
    }

    #[tokio::test]
    async fn install_over_saved_log_replaces_its_record() {
        let tmp = TempDir::new().expect("temp dir");
        let store = FsLogStore::new(tmp.path().join(LOGS_DIR));
        let log = DailyLog {
            log_date: "2024-01-15".to_string(),
            name: "Old Name".to_string(),
            project: "Old Project".to_string(),
            ..Default::default()
        };
        store.save(&log).await.expect("save");
        let unrelated = DailyLog {
            log_date: "2024-03-01".to_string(),
            name: "Kept".to_string(),
            ..Default::default()
        };
        store.save(&unrelated).await.expect("save unrelated");

        install_core_fixture(tmp.path()).expect("install fixture");

        assert!(!tmp.path().join("daily_logs/.records/2024-01-15.json").exists());
        assert!(tmp.path().join("daily_logs/.records/2024-03-01.json").exists());
        let loaded = store.load("2024-01-15").await.expect("load");
        assert_eq!(loaded.name, "Ada Lovelace");
        assert_eq!(store.load("2024-03-01").await.expect("load").name, "Kept");
    }
}
