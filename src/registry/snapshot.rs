use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::{errors, registry::record::EquipmentList};

// Load the registry snapshot. A missing file is reported separately so startup can refuse to run.
pub async fn load(path: &Path) -> errors::Result<EquipmentList> {
    if !path.exists() {
        return Err(errors::Errors::SnapshotNotFound(format!(
            "Snapshot file does not exist: {}",
            path.display()
        )));
    }

    let data = tokio::fs::read(path)
        .await
        .map_err(|e| errors::Errors::SnapshotReadError(format!("{}: {}", path.display(), e)))?;

    let list = serde_json::from_slice(&data)
        .map_err(|e| errors::Errors::SnapshotDecodeError(format!("{}: {}", path.display(), e)))?;

    Ok(list)
}

// Rewrite the whole snapshot. The document goes to a sibling file first and is renamed into place.
pub async fn persist(path: &Path, list: &EquipmentList) -> errors::Result<()> {
    let data = serde_json::to_vec_pretty(list)
        .map_err(|e| errors::Errors::SnapshotEncodeError(e.to_string()))?;

    let temp_path = temp_path_for(path);

    if let Err(e) = write_synced(&temp_path, &data).await {
        remove_leftover(&temp_path).await;
        return Err(errors::Errors::SnapshotWriteError(format!(
            "{}: {}",
            temp_path.display(),
            e
        )));
    }

    if let Err(e) = tokio::fs::rename(&temp_path, path).await {
        remove_leftover(&temp_path).await;
        return Err(errors::Errors::SnapshotWriteError(format!(
            "{}: {}",
            path.display(),
            e
        )));
    }

    Ok(())
}

async fn write_synced(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(data).await?;
    file.sync_all().await
}

async fn remove_leftover(temp_path: &Path) {
    match tokio::fs::remove_file(temp_path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("Failed to remove {}: {}", temp_path.display(), e),
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut file_name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    file_name.push(".tmp");

    path.with_file_name(file_name)
}
