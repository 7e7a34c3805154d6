use crate::core::Storage;
use crate::scope::StagedWrite;
use crate::utils::error::Result;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }
}

impl Storage for LocalStorage {
    async fn list_files(&self, dir: &str) -> Result<Vec<String>> {
        let root = Path::new(&self.base_path).join(dir);
        let mut files = Vec::new();
        let mut pending = vec![root];

        while let Some(current) = pending.pop() {
            for entry in fs::read_dir(&current)? {
                let entry = entry?;
                let path = entry.path();
                if path.is_dir() {
                    pending.push(path);
                } else {
                    // 回傳相對於 base 的路徑,可直接交給 read_file
                    let rel = path.strip_prefix(&self.base_path).unwrap_or(path.as_path());
                    files.push(rel.to_string_lossy().into_owned());
                }
            }
        }

        files.sort();
        Ok(files)
    }

    async fn read_file(&self, path: &str) -> Result<String> {
        let full_path = Path::new(&self.base_path).join(path);
        let text = fs::read_to_string(full_path)?;
        Ok(text)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = Path::new(&self.base_path).join(path);

        // 先寫暫存檔再改名,中斷的建置不會留下半成品
        let mut staged = StagedWrite::begin(&full_path)?;
        staged.write_all(data)?;
        staged.commit()?;
        Ok(())
    }
}
