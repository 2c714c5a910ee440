use chrono::Local;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WriteOutcome {
    pub backup_path: Option<PathBuf>,
    pub final_path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    #[error("{0}")]
    Io(#[from] io::Error),
    #[error("failed to create backup copy: {0}")]
    BackupCreate(String),
    #[error("target path has no parent directory: {0}")]
    NoParent(PathBuf),
}

/// Writes `contents` to `target` through a sibling temp file and a rename, so a
/// crash never leaves a half-written resource behind. With `keep_backup` the
/// previous file is copied to `<name>.<ext>.bak.<timestamp>` first.
pub fn write_atomically(
    target: &Path,
    contents: &[u8],
    keep_backup: bool,
) -> Result<WriteOutcome, BackupError> {
    let parent = target
        .parent()
        .ok_or_else(|| BackupError::NoParent(target.to_path_buf()))?;
    if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent)?;
    }

    let backup_path = if keep_backup && target.exists() {
        let candidate = build_backup_path(target);
        fs::copy(target, &candidate).map_err(|err| BackupError::BackupCreate(err.to_string()))?;
        Some(candidate)
    } else {
        None
    };

    let temp_path = build_temp_path(target);
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&temp_path)?;
    file.write_all(contents)?;
    file.sync_all()?;
    drop(file);

    #[cfg(target_os = "windows")]
    {
        use std::io::ErrorKind;
        if let Err(err) = fs::rename(&temp_path, target) {
            if err.kind() == ErrorKind::AlreadyExists {
                fs::remove_file(target)?;
                fs::rename(&temp_path, target)?;
            } else {
                let _ = fs::remove_file(&temp_path);
                return Err(BackupError::Io(err));
            }
        }
    }

    #[cfg(not(target_os = "windows"))]
    {
        if let Err(err) = fs::rename(&temp_path, target) {
            let _ = fs::remove_file(&temp_path);
            return Err(BackupError::Io(err));
        }
    }

    Ok(WriteOutcome {
        backup_path,
        final_path: target.to_path_buf(),
    })
}

fn build_backup_path(target: &Path) -> PathBuf {
    let timestamp = Local::now().format("%Y%m%d%H%M%S");
    let mut name = target
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(format!(".bak.{timestamp}"));
    target.with_file_name(name)
}

fn build_temp_path(target: &Path) -> PathBuf {
    let mut temp = target.to_path_buf();
    let suffix = format!("__tmp__pid_{}", std::process::id());
    match temp.file_name() {
        Some(name) => {
            let mut os_string = name.to_os_string();
            os_string.push(suffix);
            temp.set_file_name(os_string);
        }
        None => {
            temp.push(format!("temp{suffix}"));
        }
    }
    temp
}
