use crate::utils::error::{PressError, Result};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

const LOCK_FILE_NAME: &str = ".press-lock";

/// Exclusive build lock on an output directory. Acquisition creates the lock
/// file with `create_new`, so a second builder gets an error instead of a
/// guard; dropping the guard removes the file on every exit path.
pub struct BuildLock {
    path: PathBuf,
}

impl BuildLock {
    /// 取得輸出目錄的建置鎖；已被鎖定時回傳錯誤，不產生 guard
    pub fn acquire(output_dir: &Path) -> Result<Self> {
        fs::create_dir_all(output_dir)?;
        let path = output_dir.join(LOCK_FILE_NAME);

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(PressError::BuildLockError {
                    path: path.display().to_string(),
                    message: "another build is already running (stale lock? remove the file)"
                        .to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        // 記錄持有者 pid，方便診斷殘留的鎖
        let _ = writeln!(file, "{}", std::process::id());

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for BuildLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::debug!("🔶 Could not remove lock file {}: {}", self.path.display(), e);
        }
    }
}
