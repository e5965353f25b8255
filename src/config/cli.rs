use crate::domain::ports::Storage;
use crate::utils::error::Result;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// One JSON file per slot under `base_path`.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        Path::new(&self.base_path).join(format!("{}.json", key))
    }
}

impl Storage for LocalStorage {
    async fn read_slot(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.slot_path(key)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_slot(&self, key: &str, data: &[u8]) -> Result<()> {
        let full_path = self.slot_path(key);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        // 先寫暫存檔再改名，避免留下寫到一半的檔案
        let tmp_path = full_path.with_extension("json.tmp");
        fs::write(&tmp_path, data)?;
        fs::rename(&tmp_path, &full_path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_slot_reads_as_none() {
        let dir = tempfile::TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().to_string_lossy().into_owned());
        assert!(storage.read_slot("bingoStudents_main").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_write_replaces_slot() {
        let dir = tempfile::TempDir::new().unwrap();
        let base = dir.path().join("nested");
        let storage = LocalStorage::new(base.to_string_lossy().into_owned());
        storage.write_slot("k", b"[1,2,3]").await.unwrap();
        storage.write_slot("k", b"[]").await.unwrap();
        assert_eq!(storage.read_slot("k").await.unwrap().unwrap(), b"[]");
        assert!(!base.join("k.json.tmp").exists());
    }
}
