use std::path::{Path, PathBuf};

use anyhow::Result;

pub fn install_core_fixture(root: &Path) -> Result<PathBuf> {
    career_log::fixtures::install_core_fixture(root)
}
