//! Data-directory layout and path resolution.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

/// Resolved locations of everything rash keeps on disk.
pub struct ConfigStore {
  data_dir: PathBuf,
}

impl ConfigStore {
  /// Resolve the data directory: an explicit override, or `~/.config/rash`.
  pub fn new(override_dir: Option<PathBuf>) -> Result<Self> {
    let data_dir = match override_dir {
      Some(dir) => dir,
      None => {
        let home = std::env::var_os("HOME")
          .context("HOME is not set; pass --data-dir")?;
        Path::new(&home).join(".config").join("rash")
      }
    };
    Ok(Self { data_dir })
  }

  pub fn db_path(&self) -> PathBuf {
    self.data_dir.join("db.sqlite")
  }

  /// Directory the shell hooks write capture files into.
  pub fn record_dir(&self) -> PathBuf {
    self.data_dir.join("record")
  }

  /// All capture files currently on disk, sorted by path so batch import
  /// order is stable.
  pub fn capture_files(&self) -> Result<Vec<PathBuf>> {
    let mut files = vec![];
    collect_json(&self.record_dir(), &mut files)?;
    files.sort();
    Ok(files)
  }
}

fn collect_json(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
  if !dir.exists() {
    return Ok(());
  }
  for entry in
    std::fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))?
  {
    let path = entry?.path();
    if path.is_dir() {
      collect_json(&path, out)?;
    } else if path.extension().is_some_and(|ext| ext == "json") {
      out.push(path);
    }
  }
  Ok(())
}
