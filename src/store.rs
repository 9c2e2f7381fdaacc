//! Locale file persistence: one JSON object per locale in a directory.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, error, warn};

use crate::error::StoreError;

/// Phrase -> translated value for one locale. Sorted so output is stable.
pub type LocaleFile = BTreeMap<String, String>;

/// Reads and writes `<directory>/<locale>.json`.
#[derive(Debug, Clone)]
pub struct LocaleFileStore {
    directory: PathBuf,
}

impl LocaleFileStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn path_for(&self, locale: &str) -> PathBuf {
        self.directory.join(format!("{}.json", locale))
    }

    /// Load a locale file, or an empty one if it is absent or malformed.
    ///
    /// Never fails: problems are logged and the caller starts from scratch.
    pub async fn load(&self, locale: &str) -> LocaleFile {
        let path = self.path_for(locale);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Locale file {} does not exist, starting empty", path.display());
                return LocaleFile::new();
            }
            Err(e) => {
                error!("Failed to read locale file {}: {}", path.display(), e);
                return LocaleFile::new();
            }
        };

        match serde_json::from_str::<LocaleFile>(&content) {
            Ok(file) => {
                debug!("Loaded {} entries from {}", file.len(), path.display());
                file
            }
            Err(e) => {
                error!("Locale file {} is malformed: {}", path.display(), e);
                LocaleFile::new()
            }
        }
    }

    /// Persist a locale file as 2-space indented JSON.
    ///
    /// The content goes to a sibling temp file first and is renamed over the
    /// target, so readers see either the old or the new file.
    pub async fn save(&self, locale: &str, file: &LocaleFile) -> Result<(), StoreError> {
        let path = self.path_for(locale);
        let mut json = serde_json::to_string_pretty(file).map_err(|source| StoreError::Serialize {
            locale: locale.to_string(),
            source,
        })?;
        json.push('\n');

        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(|source| StoreError::Write {
                path: self.directory.clone(),
                source,
            })?;

        let tmp_path = self.directory.join(format!("{}.json.tmp", locale));
        tokio::fs::write(&tmp_path, json)
            .await
            .map_err(|source| StoreError::Write {
                path: tmp_path.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(|source| StoreError::Write {
                path: path.clone(),
                source,
            })?;

        debug!("Wrote {} entries to {}", file.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn file(entries: &[(&str, &str)]) -> LocaleFile {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_path_for() {
        let store = LocaleFileStore::new("locales");
        assert_eq!(store.path_for("es"), PathBuf::from("locales/es.json"));
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = LocaleFileStore::new(dir.path());
        assert!(store.load("es").await.is_empty());
    }

    #[tokio::test]
    async fn test_load_malformed_file_is_empty() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("es.json"), "{ not json").unwrap();
        let store = LocaleFileStore::new(dir.path());
        assert!(store.load("es").await.is_empty());
    }

    #[tokio::test]
    async fn test_load_non_string_values_is_empty() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("es.json"), r#"{"Hello": 1}"#).unwrap();
        let store = LocaleFileStore::new(dir.path());
        assert!(store.load("es").await.is_empty());
    }

    #[tokio::test]
    async fn test_save_writes_sorted_pretty_json() {
        let dir = TempDir::new().unwrap();
        let store = LocaleFileStore::new(dir.path());

        store
            .save("es", &file(&[("World", "Mundo"), ("Hello", "Hola")]))
            .await
            .unwrap();

        let written = std::fs::read_to_string(dir.path().join("es.json")).unwrap();
        assert_eq!(
            written,
            "{\n  \"Hello\": \"Hola\",\n  \"World\": \"Mundo\"\n}\n"
        );
        assert!(!dir.path().join("es.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_save_creates_directory() {
        let dir = TempDir::new().unwrap();
        let store = LocaleFileStore::new(dir.path().join("nested").join("locales"));

        store.save("fr", &file(&[("Hello", "Bonjour")])).await.unwrap();

        assert_eq!(store.load("fr").await, file(&[("Hello", "Bonjour")]));
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_content() {
        let dir = TempDir::new().unwrap();
        let store = LocaleFileStore::new(dir.path());

        store.save("de", &file(&[("Hello", "Hello")])).await.unwrap();
        store.save("de", &file(&[("Hello", "Hallo")])).await.unwrap();

        assert_eq!(store.load("de").await, file(&[("Hello", "Hallo")]));
    }
}
