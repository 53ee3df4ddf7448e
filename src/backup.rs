//! Backup bundles for the site content.
//!
//! A backup is a single timestamped JSON document holding every section plus
//! the optional `settings.json`. Restore validates the bundle first, copies
//! the current data files aside under `backups/pre_restore/`, and only then
//! overwrites anything.

use crate::{
    content::{ContentStore, SECTIONS},
    error::Error,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::fs;

#[derive(Debug, Serialize, Deserialize)]
pub struct BackupBundle {
    pub created_at: DateTime<Utc>,
    pub sections: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<Value>,
}

#[must_use]
pub fn backup_filename(now: DateTime<Utc>) -> String {
    format!("portfolio_backup_{}.json", now.format("%Y%m%d_%H%M%S"))
}

/// Bundle all sections and settings into a downloadable document.
///
/// # Errors
/// Returns `Error::Content` when the bundle cannot be serialized.
pub async fn create(store: &ContentStore) -> Result<(String, Vec<u8>), Error> {
    let mut sections = BTreeMap::new();
    for section in SECTIONS {
        sections.insert(section.to_string(), store.load(section).await?);
    }

    let settings_path = store.data_dir().join("settings.json");
    let settings = match fs::read_to_string(&settings_path).await {
        Ok(raw) => serde_json::from_str(&raw).ok(),
        Err(_) => None,
    };

    let bundle = BackupBundle {
        created_at: Utc::now(),
        sections,
        settings,
    };

    let bytes = serde_json::to_vec_pretty(&bundle)
        .map_err(|e| Error::content(format!("cannot serialize backup: {e}")))?;

    Ok((backup_filename(bundle.created_at), bytes))
}

/// Restore sections (and settings, if bundled) from a backup document.
/// Unknown section names in the bundle are ignored.
///
/// # Errors
/// Returns `Error::Content` on an unparsable bundle or a failed write.
pub async fn restore(store: &ContentStore, bytes: &[u8]) -> Result<Vec<String>, Error> {
    let bundle: BackupBundle = serde_json::from_slice(bytes)
        .map_err(|e| Error::content(format!("invalid backup file: {e}")))?;

    snapshot_current(store).await?;

    let mut restored = Vec::new();
    for (section, value) in &bundle.sections {
        if ContentStore::is_valid_section(section) {
            store.save(section, value).await?;
            restored.push(section.clone());
        }
    }

    if let Some(settings) = &bundle.settings {
        let pretty = serde_json::to_string_pretty(settings)
            .map_err(|e| Error::content(format!("cannot serialize settings: {e}")))?;
        let path = store.data_dir().join("settings.json");
        fs::write(&path, pretty)
            .await
            .map_err(|e| Error::content(format!("cannot write {}: {e}", path.display())))?;
    }

    store.clear_cache().await;

    Ok(restored)
}

/// Copy the current data files aside before a restore touches them.
async fn snapshot_current(store: &ContentStore) -> Result<(), Error> {
    let snapshot_dir = store.data_dir().join("backups").join("pre_restore");
    fs::create_dir_all(&snapshot_dir)
        .await
        .map_err(|e| Error::content(format!("cannot create {}: {e}", snapshot_dir.display())))?;

    for section in SECTIONS {
        let source = store.data_dir().join(format!("{section}.json"));
        if source.exists() {
            let target = snapshot_dir.join(format!("{section}.json"));
            fs::copy(&source, &target)
                .await
                .map_err(|e| Error::content(format!("cannot snapshot {section}: {e}")))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filename_is_timestamped() {
        let now = "2026-08-29T10:30:00Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(backup_filename(now), "portfolio_backup_20260829_103000.json");
    }

    #[tokio::test]
    async fn create_then_restore_round_trips() {
        let source = tempfile::tempdir().unwrap();
        let store = ContentStore::new(source.path().to_path_buf());
        store.save("home", &json!({"headline": "hi"})).await.unwrap();
        store.save("about", &json!({"bio": "short"})).await.unwrap();
        std::fs::write(source.path().join("settings.json"), r#"{"contact_form":{}}"#).unwrap();

        let (filename, bytes) = create(&store).await.unwrap();
        assert!(filename.starts_with("portfolio_backup_"));

        let target = tempfile::tempdir().unwrap();
        let fresh = ContentStore::new(target.path().to_path_buf());
        let restored = restore(&fresh, &bytes).await.unwrap();

        assert!(restored.contains(&"home".to_string()));
        assert_eq!(fresh.load("home").await.unwrap(), json!({"headline": "hi"}));
        assert_eq!(fresh.load("about").await.unwrap(), json!({"bio": "short"}));
        assert!(target.path().join("settings.json").exists());
    }

    #[tokio::test]
    async fn restore_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::new(dir.path().to_path_buf());
        assert!(restore(&store, b"not a backup").await.is_err());
    }

    #[tokio::test]
    async fn restore_ignores_unknown_sections() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::new(dir.path().to_path_buf());

        let bundle = json!({
            "created_at": "2026-08-29T10:30:00Z",
            "sections": {
                "home": {"ok": true},
                "evil": {"path": "../../etc"}
            }
        });
        let restored = restore(&store, &serde_json::to_vec(&bundle).unwrap())
            .await
            .unwrap();

        assert_eq!(restored, vec!["home".to_string()]);
        assert!(!dir.path().join("evil.json").exists());
    }

    #[tokio::test]
    async fn restore_snapshots_existing_data_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::new(dir.path().to_path_buf());
        store.save("home", &json!({"old": true})).await.unwrap();

        let bundle = json!({
            "created_at": "2026-08-29T10:30:00Z",
            "sections": {"home": {"new": true}}
        });
        restore(&store, &serde_json::to_vec(&bundle).unwrap())
            .await
            .unwrap();

        let snapshot = dir.path().join("backups").join("pre_restore").join("home.json");
        let saved: Value =
            serde_json::from_str(&std::fs::read_to_string(snapshot).unwrap()).unwrap();
        assert_eq!(saved, json!({"old": true}));
        assert_eq!(store.load("home").await.unwrap(), json!({"new": true}));
    }
}
