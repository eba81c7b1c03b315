//! bpf - downlink maps pinned in the BPF filesystem, opened through aya

use super::{DlMapKey, DlMapValue, MapHandle, MapStore, UpdateFlags};
use anyhow::{Context, Result, anyhow};
use aya::maps::{HashMap, Map, MapData, MapError};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

type DlMap = HashMap<MapData, DlMapKey, DlMapValue>;

/// Map store backed by pinned kernel hash maps.  Opened maps stay open for
/// the life of the store.
#[derive(Default)]
pub struct BpfMapStore {
    maps: Mutex<Vec<DlMap>>,
}

impl BpfMapStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<DlMap>>> {
        self.maps.lock().map_err(|_| anyhow!("eBPF map store poisoned"))
    }
}

fn map_mut(maps: &mut [DlMap], handle: MapHandle) -> Result<&mut DlMap> {
    maps.get_mut(handle.0)
        .ok_or_else(|| anyhow!("Bad map handle {}", handle.0))
}

impl MapStore for BpfMapStore {
    fn get_handle(&self, path: &Path) -> Result<MapHandle> {
        let data = MapData::from_pin(path)
            .with_context(|| format!("Failed to open pinned map {}", path.display()))?;
        // The conversion rejects maps whose key or value size differs from DlMapKey / DlMapValue.
        let map: DlMap = Map::HashMap(data)
            .try_into()
            .with_context(|| format!("{} is not a downlink map", path.display()))?;

        let mut maps = self.lock()?;
        maps.push(map);
        Ok(MapHandle(maps.len() - 1))
    }

    fn upsert(
        &self,
        handle: MapHandle,
        key: &DlMapKey,
        value: &DlMapValue,
        flags: UpdateFlags,
    ) -> Result<()> {
        let mut maps = self.lock()?;
        map_mut(&mut maps, handle)?
            .insert(key, value, flags.bits())
            .context("bpf_map_update_elem")
    }

    fn lookup(&self, handle: MapHandle, key: &DlMapKey) -> Result<Option<DlMapValue>> {
        let mut maps = self.lock()?;
        match map_mut(&mut maps, handle)?.get(key, 0) {
            Ok(value) => Ok(Some(value)),
            Err(MapError::KeyNotFound) => Ok(None),
            Err(e) => Err(e).context("bpf_map_lookup_elem"),
        }
    }

    fn remove(&self, handle: MapHandle, key: &DlMapKey) -> Result<()> {
        let mut maps = self.lock()?;
        map_mut(&mut maps, handle)?
            .remove(key)
            .context("bpf_map_delete_elem")
    }
}
