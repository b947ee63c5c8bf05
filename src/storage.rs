use crate::errors::TrackerError;
use crate::store::AppData;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, warn};

/// Reads the data file. A missing file is an empty store; anything unreadable is an error
/// so a damaged file never gets overwritten with an empty one.
pub async fn load_data(path: &Path) -> Result<AppData, TrackerError> {
    match fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|err| {
            error!("failed to parse data file {}: {err}", path.display());
            TrackerError::Storage(format!("{}: {err}", path.display()))
        }),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            info!("no data file at {}, starting empty", path.display());
            Ok(AppData::default())
        }
        Err(err) => {
            error!("failed to read data file {}: {err}", path.display());
            Err(err.into())
        }
    }
}

/// Writes the store to a sibling temp file, then renames it over `path`.
/// The data file is either the old document or the new one, never a partial write.
pub async fn persist_data(path: &Path, data: &AppData) -> Result<(), TrackerError> {
    let payload = serde_json::to_vec_pretty(data)?;
    let staged = staging_path(path);
    fs::write(&staged, payload).await?;

    if let Err(err) = fs::rename(&staged, path).await {
        error!("failed to replace data file {}: {err}", path.display());
        if let Err(cleanup) = fs::remove_file(&staged).await {
            warn!("failed to remove {}: {cleanup}", staged.display());
        }
        return Err(err.into());
    }
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

pub async fn ensure_parent_dir(path: &Path) -> Result<(), TrackerError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[tokio::test]
    async fn missing_file_loads_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let data = load_data(&dir.path().join("absent.json")).await.unwrap();
        assert_eq!(data.users().count(), 0);
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, b"{ not json").await.unwrap();
        assert!(matches!(load_data(&path).await, Err(TrackerError::Storage(_))));
    }

    #[tokio::test]
    async fn persisted_data_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/tracker.json");
        let mut data = AppData::default();
        let now = DateTime::from_timestamp(1_760_000_000, 0).unwrap();
        data.register("budi", "budi@example.com", "Budi", now).unwrap();

        ensure_parent_dir(&path).await.unwrap();
        persist_data(&path, &data).await.unwrap();

        let reloaded = load_data(&path).await.unwrap();
        assert!(reloaded.user_by_username("budi").is_some());
    }

    #[tokio::test]
    async fn persist_replaces_previous_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.json");
        fs::write(&path, b"{ stale").await.unwrap();

        let mut data = AppData::default();
        let now = DateTime::from_timestamp(1_760_000_000, 0).unwrap();
        data.register("sari", "sari@example.com", "", now).unwrap();
        persist_data(&path, &data).await.unwrap();

        assert!(load_data(&path).await.unwrap().user_by_username("sari").is_some());
        assert!(!staging_path(&path).exists());
    }

    #[tokio::test]
    async fn failed_replace_cleans_up_staged_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.json");
        fs::create_dir(&path).await.unwrap();

        let result = persist_data(&path, &AppData::default()).await;
        assert!(matches!(result, Err(TrackerError::Storage(_))));
        assert!(path.is_dir());
        assert!(!staging_path(&path).exists());
    }
}
