use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub const EXPORT_FILE_NAME: &str = "results.csv";

/// Writes the service's CSV text unchanged to `<dir>/results.csv`.
pub fn write_results_csv(dir: &Path, csv_text: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("create export dir {}", dir.display()))?;
    let path = dir.join(EXPORT_FILE_NAME);
    let tmp = path.with_extension("csv.tmp");
    fs::write(&tmp, csv_text).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, &path).with_context(|| format!("swap {}", path.display()))?;
    Ok(path)
}
