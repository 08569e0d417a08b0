//! Directory-backed key-value store

use std::fmt::Write as _;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::error::Result;

use super::KeyValueStore;

const VALUE_EXTENSION: &str = "json";

/// Stores each key as one file inside a directory.
///
/// Writes land in a temporary sibling file which is flushed and then renamed
/// over the target, so readers only ever see a complete old or new value.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    /// Open a store rooted at `dir`, creating the directory if needed
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{VALUE_EXTENSION}", encode_key(key)))
    }

    fn temp_path_for(&self, target: &Path) -> PathBuf {
        let file_name = target
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        self.dir
            .join(format!(".{file_name}.tmp-{}", uuid::Uuid::now_v7().simple()))
    }
}

impl KeyValueStore for FileKeyValueStore {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    async fn write(&self, key: &str, value: &str) -> Result<()> {
        let target = self.path_for(key);
        let temp = self.temp_path_for(&target);

        let written = write_and_sync(&temp, value).await;
        let result = match written {
            Ok(()) => tokio::fs::rename(&temp, &target).await,
            Err(error) => Err(error),
        };

        if let Err(error) = result {
            if let Err(cleanup_error) = tokio::fs::remove_file(&temp).await {
                if cleanup_error.kind() != ErrorKind::NotFound {
                    tracing::warn!(
                        "Failed to remove temporary file {}: {}",
                        temp.display(),
                        cleanup_error
                    );
                }
            }
            return Err(error.into());
        }

        tracing::debug!("Wrote {} bytes to {}", value.len(), target.display());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}

async fn write_and_sync(path: &Path, value: &str) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(value.as_bytes()).await?;
    file.sync_all().await
}

/// Encode a key into a portable file name.
///
/// ASCII alphanumerics, `-` and `_` pass through; every other byte becomes
/// `%XX`, so distinct keys never collide.
fn encode_key(key: &str) -> String {
    let mut encoded = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            encoded.push(char::from(byte));
        } else {
            let _ = write!(encoded, "%{byte:02X}");
        }
    }
    if encoded.is_empty() {
        encoded.push_str("%00");
    }
    encoded
}
