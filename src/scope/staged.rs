use crate::utils::error::Result;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Staged file write: data goes to `<path>.tmp`, and only [`StagedWrite::commit`]
/// renames it onto the final path. A guard dropped without commit removes the
/// staged file, so readers of the output directory never observe a
/// half-written file.
pub struct StagedWrite {
    staged_path: PathBuf,
    final_path: PathBuf,
    file: Option<File>,
    committed: bool,
}

impl StagedWrite {
    /// 開始暫存寫入；建立 `<path>.tmp`，失敗時不會留下任何待清理的狀態
    pub fn begin(final_path: &Path) -> Result<Self> {
        if let Some(parent) = final_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut staged_path = final_path.as_os_str().to_owned();
        staged_path.push(".tmp");
        let staged_path = PathBuf::from(staged_path);

        let file = File::create(&staged_path)?;

        Ok(Self {
            staged_path,
            final_path: final_path.to_path_buf(),
            file: Some(file),
            committed: false,
        })
    }

    pub fn write_all(&mut self, data: &[u8]) -> Result<()> {
        if let Some(file) = self.file.as_mut() {
            file.write_all(data)?;
        }
        Ok(())
    }

    /// 暫存檔路徑（提交前的實體位置）
    pub fn staged_path(&self) -> &Path {
        &self.staged_path
    }

    /// Close the staged file and rename it onto the final path. A failed
    /// rename leaves `committed` unset, so the drop path still removes the
    /// staged file — exactly one teardown either way.
    pub fn commit(mut self) -> Result<()> {
        if let Some(file) = self.file.take() {
            file.sync_all()?;
        }
        fs::rename(&self.staged_path, &self.final_path)?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagedWrite {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        // 未提交：關閉後移除暫存檔
        drop(self.file.take());
        if let Err(e) = fs::remove_file(&self.staged_path) {
            tracing::debug!(
                "🔶 Could not remove staged file {}: {}",
                self.staged_path.display(),
                e
            );
        }
    }
}
