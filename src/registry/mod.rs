use std::path::{Path, PathBuf};

use tokio::sync::Mutex;

use crate::{
    errors,
    registry::record::{EquipmentList, EquipmentRecord},
};

pub mod record;
pub mod snapshot;

// Owns the in-memory equipment registry and its on-disk snapshot.
// Every access goes through one mutex, and mutations hold it across the persist.
#[derive(Debug)]
pub struct EquipmentStore {
    path: PathBuf,
    registry: Mutex<EquipmentList>,
}

impl EquipmentStore {
    // Load the snapshot at `path`. Fails if the snapshot is missing or unreadable.
    pub async fn load(path: PathBuf) -> errors::Result<Self> {
        let registry = snapshot::load(&path).await?;

        if registry.is_empty() {
            log::warn!("Snapshot {} holds no equipment records", path.display());
        }

        log::info!(
            "Loaded {} equipment records from {}",
            registry.len(),
            path.display()
        );
        for record in &registry.equipments {
            log::debug!(
                "id={} name={} status={}",
                record.id,
                record.name,
                record.status
            );
        }

        Ok(Self {
            path,
            registry: Mutex::new(registry),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn get_all(&self) -> EquipmentList {
        self.registry.lock().await.clone()
    }

    pub async fn get(&self, id: i64) -> Option<EquipmentRecord> {
        self.registry.lock().await.find(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.registry.lock().await.len()
    }

    // Apply `status` to the record with `id` and rewrite the snapshot.
    //
    // An unknown id still rewrites the snapshot and yields the (unchanged) registry.
    // The new registry is kept in memory even when the write fails; the error is
    // returned so the caller can report it.
    pub async fn alter(&self, id: i64, status: bool) -> errors::Result<EquipmentList> {
        let mut registry = self.registry.lock().await;

        if registry.find(id).is_none() {
            log::warn!("ALTER on unknown equipment id {}, persisting unchanged registry", id);
        }

        let updated = registry.with_status(id, status);
        *registry = updated.clone();

        if let Err(error) = snapshot::persist(&self.path, &updated).await {
            log::error!("Failed to persist equipment snapshot: {}", error);
            return Err(error);
        }

        Ok(updated)
    }
}
