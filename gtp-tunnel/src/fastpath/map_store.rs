use anyhow::{Result, anyhow, bail, ensure};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const DL_MAP_KEY_LEN: usize = 4;
pub const DL_MAP_VALUE_LEN: usize = 16;

/// UE IPv4 address, network byte order.
pub type DlMapKey = [u8; DL_MAP_KEY_LEN];

/// Encoded [`super::DlMapEntry`].
pub type DlMapValue = [u8; DL_MAP_VALUE_LEN];

/// Handle to an open downlink map, as returned by [`MapStore::get_handle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapHandle(pub usize);

/// Semantics of an element update, matching BPF_ANY / BPF_NOEXIST / BPF_EXIST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateFlags {
    Any,
    NoExist,
    Exist,
}

impl UpdateFlags {
    pub fn bits(self) -> u64 {
        match self {
            UpdateFlags::Any => 0,
            UpdateFlags::NoExist => 1,
            UpdateFlags::Exist => 2,
        }
    }
}

/// Access to pinned downlink maps.  `get_handle` fails unless the pinned map's
/// key and value sizes are exactly those of [`DlMapKey`] and [`DlMapValue`].
pub trait MapStore: Send + Sync + 'static {
    fn get_handle(&self, path: &Path) -> Result<MapHandle>;
    fn upsert(
        &self,
        handle: MapHandle,
        key: &DlMapKey,
        value: &DlMapValue,
        flags: UpdateFlags,
    ) -> Result<()>;
    fn lookup(&self, handle: MapHandle, key: &DlMapKey) -> Result<Option<DlMapValue>>;
    fn remove(&self, handle: MapHandle, key: &DlMapKey) -> Result<()>;
}

/// In-process map store with the same update semantics as the kernel.  Maps
/// must be pinned before a handle can be obtained, as with bpf_obj_get().
#[derive(Default)]
pub struct InMemoryMapStore(Mutex<InMemoryMaps>);

#[derive(Default)]
struct InMemoryMaps {
    pinned: HashMap<PathBuf, usize>,
    maps: Vec<InMemoryMap>,
}

struct InMemoryMap {
    key_size: usize,
    value_size: usize,
    elems: HashMap<DlMapKey, DlMapValue>,
}

impl InMemoryMapStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty downlink map at `path`.
    pub fn pin(&self, path: impl Into<PathBuf>) -> Result<()> {
        self.pin_with_layout(path, DL_MAP_KEY_LEN, DL_MAP_VALUE_LEN)
    }

    /// Create an empty map at `path` with the given key and value sizes.
    pub fn pin_with_layout(
        &self,
        path: impl Into<PathBuf>,
        key_size: usize,
        value_size: usize,
    ) -> Result<()> {
        let mut inner = self.lock()?;
        let idx = inner.maps.len();
        inner.maps.push(InMemoryMap {
            key_size,
            value_size,
            elems: HashMap::new(),
        });
        inner.pinned.insert(path.into(), idx);
        Ok(())
    }

    /// Number of elements in the map behind `handle`.
    pub fn len(&self, handle: MapHandle) -> Result<usize> {
        let mut inner = self.lock()?;
        Ok(inner.map(handle)?.len())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, InMemoryMaps>> {
        self.0.lock().map_err(|_| anyhow!("In-memory map store poisoned"))
    }
}

impl InMemoryMaps {
    fn map(&mut self, handle: MapHandle) -> Result<&mut HashMap<DlMapKey, DlMapValue>> {
        self.maps
            .get_mut(handle.0)
            .map(|map| &mut map.elems)
            .ok_or_else(|| anyhow!("Bad map handle {}", handle.0))
    }
}

impl MapStore for InMemoryMapStore {
    fn get_handle(&self, path: &Path) -> Result<MapHandle> {
        let inner = self.lock()?;
        let Some(&idx) = inner.pinned.get(path) else {
            bail!("No map pinned at {}", path.display());
        };
        let map = &inner.maps[idx];
        ensure!(
            map.key_size == DL_MAP_KEY_LEN && map.value_size == DL_MAP_VALUE_LEN,
            "Map at {} has {}/{} byte keys/values, expected {DL_MAP_KEY_LEN}/{DL_MAP_VALUE_LEN}",
            path.display(),
            map.key_size,
            map.value_size
        );
        Ok(MapHandle(idx))
    }

    fn upsert(
        &self,
        handle: MapHandle,
        key: &DlMapKey,
        value: &DlMapValue,
        flags: UpdateFlags,
    ) -> Result<()> {
        let mut inner = self.lock()?;
        let map = inner.map(handle)?;
        let exists = map.contains_key(key);
        match flags {
            UpdateFlags::NoExist => ensure!(!exists, "Map element already exists"),
            UpdateFlags::Exist => ensure!(exists, "Map element does not exist"),
            UpdateFlags::Any => {}
        }
        map.insert(*key, *value);
        Ok(())
    }

    fn lookup(&self, handle: MapHandle, key: &DlMapKey) -> Result<Option<DlMapValue>> {
        let mut inner = self.lock()?;
        Ok(inner.map(handle)?.get(key).copied())
    }

    fn remove(&self, handle: MapHandle, key: &DlMapKey) -> Result<()> {
        let mut inner = self.lock()?;
        ensure!(
            inner.map(handle)?.remove(key).is_some(),
            "Map element does not exist"
        );
        Ok(())
    }
}
