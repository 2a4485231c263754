//! Raw audio asset storage
//!
//! Assets live in a flat namespace: a track's storage path is the asset name.

use async_trait::async_trait;
use pacer_core::{AssetLoader, PacerError, Result};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;

/// Reject names that would escape the flat asset namespace
fn check_name(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\');
    if invalid {
        return Err(PacerError::invalid_input(format!(
            "invalid asset name '{name}'"
        )));
    }
    Ok(())
}

/// `AssetLoader` keeping bytes in memory
#[derive(Debug, Default)]
pub struct MemoryAssetLoader {
    assets: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryAssetLoader {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AssetLoader for MemoryAssetLoader {
    async fn import_asset(&self, bytes: Vec<u8>, name: &str) -> Result<()> {
        check_name(name)?;
        self.assets.write().await.insert(name.to_string(), bytes);
        Ok(())
    }

    async fn load_asset(&self, path: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.assets.read().await.get(path).cloned())
    }

    async fn delete_asset(&self, path: &str) -> Result<()> {
        self.assets.write().await.remove(path);
        Ok(())
    }

    async fn list_asset_names(&self) -> Result<Vec<String>> {
        Ok(self.assets.read().await.keys().cloned().collect())
    }
}

/// `AssetLoader` storing each asset as a file in one directory
#[derive(Debug, Clone)]
pub struct FsAssetLoader {
    base_path: PathBuf,
}

impl FsAssetLoader {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Create the asset directory if needed
    pub async fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.base_path).await?;
        Ok(())
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn resolve(&self, name: &str) -> Result<PathBuf> {
        check_name(name)?;
        Ok(self.base_path.join(name))
    }
}

#[async_trait]
impl AssetLoader for FsAssetLoader {
    async fn import_asset(&self, bytes: Vec<u8>, name: &str) -> Result<()> {
        let path = self.resolve(name)?;
        tracing::info!(asset = name, size = bytes.len(), "importing asset");
        fs::write(&path, bytes).await?;
        Ok(())
    }

    async fn load_asset(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let file = self.resolve(path)?;
        match fs::read(&file).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_asset(&self, path: &str) -> Result<()> {
        let file = self.resolve(path)?;
        match fs::remove_file(&file).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    async fn list_asset_names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = fs::read_dir(&self.base_path).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traversal_names_are_rejected() {
        assert!(check_name("../etc/passwd").is_err());
        assert!(check_name("a/b.mp3").is_err());
        assert!(check_name("..").is_err());
        assert!(check_name("").is_err());
        assert!(check_name("song one.mp3").is_ok());
    }
}
