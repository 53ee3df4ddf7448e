//! JSON content store for the public site sections.
//!
//! Each section lives in its own file under the data dir. Reads go through
//! a small freshness-based cache; a save rewrites the file, clears the whole
//! cache, and verifies the write by reading the file back. A missing or
//! unparsable section file degrades to an empty object so the public pages
//! keep rendering.

use crate::error::Error;
use serde_json::Value;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};
use tokio::{fs, sync::RwLock};
use tracing::{error, info};

pub const SECTIONS: [&str; 3] = ["home", "about", "experience"];

const CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Clone, Debug)]
struct CachedSection {
    value: Value,
    fetched_at: Instant,
}

impl CachedSection {
    fn is_fresh(&self) -> bool {
        self.fetched_at.elapsed() < CACHE_TTL
    }
}

pub struct ContentStore {
    data_dir: PathBuf,
    cache: RwLock<HashMap<String, CachedSection>>,
}

impl ContentStore {
    #[must_use]
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            cache: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn is_valid_section(section: &str) -> bool {
        SECTIONS.contains(&section)
    }

    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path_for(&self, section: &str) -> PathBuf {
        self.data_dir.join(format!("{section}.json"))
    }

    /// Load a section, serving from cache when fresh.
    ///
    /// # Errors
    /// Returns `Error::Content` for an unknown section name.
    pub async fn load(&self, section: &str) -> Result<Value, Error> {
        if !Self::is_valid_section(section) {
            return Err(Error::content(format!("invalid section: {section}")));
        }

        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(section) {
                if cached.is_fresh() {
                    return Ok(cached.value.clone());
                }
            }
        }

        let value = self.read_from_disk(section).await;

        let mut cache = self.cache.write().await;
        cache.insert(
            section.to_string(),
            CachedSection {
                value: value.clone(),
                fetched_at: Instant::now(),
            },
        );

        Ok(value)
    }

    async fn read_from_disk(&self, section: &str) -> Value {
        let path = self.path_for(section);
        match fs::read_to_string(&path).await {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(e) => {
                    error!("invalid JSON in {}: {e}", path.display());
                    Value::Object(serde_json::Map::new())
                }
            },
            Err(e) => {
                error!("data file {} not readable: {e}", path.display());
                Value::Object(serde_json::Map::new())
            }
        }
    }

    /// Persist a section and clear the cache, then verify the write by
    /// reading the file back.
    ///
    /// # Errors
    /// Returns `Error::Content` on an unknown section or any write/verify
    /// failure.
    pub async fn save(&self, section: &str, value: &Value) -> Result<(), Error> {
        if !Self::is_valid_section(section) {
            return Err(Error::content(format!("invalid section: {section}")));
        }

        let path = self.path_for(section);
        let pretty = serde_json::to_string_pretty(value)
            .map_err(|e| Error::content(format!("cannot serialize {section}: {e}")))?;

        fs::write(&path, &pretty)
            .await
            .map_err(|e| Error::content(format!("cannot write {}: {e}", path.display())))?;

        self.clear_cache().await;

        // Read back what was just written so a partial write is caught now
        // rather than on the next page load.
        let raw = fs::read_to_string(&path)
            .await
            .map_err(|e| Error::content(format!("verify read of {} failed: {e}", path.display())))?;
        let _: Value = serde_json::from_str(&raw)
            .map_err(|e| Error::content(format!("verify parse of {} failed: {e}", path.display())))?;

        info!("saved section {section} and cleared content cache");

        Ok(())
    }

    pub async fn clear_cache(&self) {
        self.cache.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store(dir: &Path) -> ContentStore {
        ContentStore::new(dir.to_path_buf())
    }

    #[tokio::test]
    async fn missing_file_loads_as_empty_object() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        assert_eq!(store.load("home").await.unwrap(), json!({}));
    }

    #[tokio::test]
    async fn invalid_section_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        assert!(store.load("secrets").await.is_err());
        assert!(store.save("../etc/passwd", &json!({})).await.is_err());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let value = json!({"title": "About me", "paragraphs": ["hello"]});

        store.save("about", &value).await.unwrap();
        assert_eq!(store.load("about").await.unwrap(), value);
    }

    #[tokio::test]
    async fn save_clears_the_cache() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        store.save("home", &json!({"v": 1})).await.unwrap();
        assert_eq!(store.load("home").await.unwrap(), json!({"v": 1}));

        // A direct file edit is invisible while the cache is warm.
        std::fs::write(dir.path().join("home.json"), r#"{"v": 2}"#).unwrap();
        assert_eq!(store.load("home").await.unwrap(), json!({"v": 1}));

        // Saving anything clears everything.
        store.save("about", &json!({})).await.unwrap();
        assert_eq!(store.load("home").await.unwrap(), json!({"v": 2}));
    }

    #[tokio::test]
    async fn corrupt_file_degrades_to_empty_object() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("experience.json"), "{broken").unwrap();
        let store = store(dir.path());
        assert_eq!(store.load("experience").await.unwrap(), json!({}));
    }
}
