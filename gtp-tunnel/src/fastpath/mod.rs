//! fastpath - mirror downlink tunnels into the eBPF downlink map
//!
//! The map is keyed by UE IPv4 address (network byte order).  Each value holds
//! the eNB IPv4 address and outgoing TEID (both network byte order) followed by
//! the IMSI as a native-endian u64.  IPv6 tunnels are left to the OpenFlow path.

mod bpf;
mod map_store;

pub use bpf::BpfMapStore;
pub use map_store::{
    DL_MAP_KEY_LEN, DL_MAP_VALUE_LEN, DlMapKey, DlMapValue, InMemoryMapStore, MapHandle, MapStore,
    UpdateFlags,
};

use crate::{DualStackAddr, Imsi};
use anyhow::{Context, Result};
use slog::{Logger, debug, error, info, o};
use std::net::Ipv4Addr;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DlMapEntry {
    pub enb: Ipv4Addr,
    pub o_tei: u32,
    pub imsi: u64,
}

impl DlMapEntry {
    pub fn to_bytes(&self) -> DlMapValue {
        let mut value = [0u8; DL_MAP_VALUE_LEN];
        value[0..4].copy_from_slice(&self.enb.octets());
        value[4..8].copy_from_slice(&self.o_tei.to_be_bytes());
        value[8..16].copy_from_slice(&self.imsi.to_ne_bytes());
        value
    }

    pub fn from_bytes(value: &DlMapValue) -> Self {
        let mut enb = [0u8; 4];
        let mut o_tei = [0u8; 4];
        let mut imsi = [0u8; 8];
        enb.copy_from_slice(&value[0..4]);
        o_tei.copy_from_slice(&value[4..8]);
        imsi.copy_from_slice(&value[8..16]);
        DlMapEntry {
            enb: Ipv4Addr::from(enb),
            o_tei: u32::from_be_bytes(o_tei),
            imsi: u64::from_ne_bytes(imsi),
        }
    }
}

struct OpenMap {
    store: Arc<dyn MapStore>,
    handle: MapHandle,
}

/// Keeps the kernel downlink map in step with the OpenFlow tunnels.  An
/// inactive mirror ignores every update.
pub struct FastPathMirror {
    map: Option<OpenMap>,
    logger: Logger,
}

impl FastPathMirror {
    pub fn disabled(logger: &Logger) -> Self {
        FastPathMirror {
            map: None,
            logger: logger.new(o!("component" => "fast-path")),
        }
    }

    pub fn try_open(store: Arc<dyn MapStore>, path: &Path, logger: &Logger) -> Result<Self> {
        let handle = store
            .get_handle(path)
            .with_context(|| format!("Failed to open eBPF map {}", path.display()))?;
        let logger = logger.new(o!("component" => "fast-path"));
        info!(logger, "Opened downlink map {}", path.display());
        Ok(FastPathMirror {
            map: Some(OpenMap { store, handle }),
            logger,
        })
    }

    /// Like [`FastPathMirror::try_open`], but failure leaves the mirror inactive
    /// so that tunnels are still programmed through OpenFlow.
    pub fn open(store: Arc<dyn MapStore>, path: &Path, logger: &Logger) -> Self {
        Self::try_open(store, path, logger).unwrap_or_else(|e| {
            error!(logger, "{e:#} - eBPF fast path disabled");
            Self::disabled(logger)
        })
    }

    pub fn is_active(&self) -> bool {
        self.map.is_some()
    }

    /// Add or replace the entry for the UE.  Skipped unless both UE and eNB
    /// have IPv4 addresses.
    pub fn add_entry(
        &self,
        ue: &DualStackAddr,
        enb: &DualStackAddr,
        o_tei: u32,
        imsi: &Imsi,
    ) -> Result<()> {
        let (Some(map), Some(ue), Some(enb)) = (&self.map, ue.ipv4(), enb.ipv4()) else {
            return Ok(());
        };
        let entry = DlMapEntry {
            enb,
            o_tei,
            imsi: imsi.as_u64(),
        };
        map.store
            .upsert(map.handle, &ue.octets(), &entry.to_bytes(), UpdateFlags::Any)
            .with_context(|| format!("Failed to add downlink map entry for UE {ue}"))?;
        debug!(self.logger, "Added downlink map entry {ue} -> {entry:?}");
        Ok(())
    }

    pub fn delete_entry(&self, ue: &DualStackAddr, enb: &DualStackAddr) -> Result<()> {
        let (Some(map), Some(ue), Some(_)) = (&self.map, ue.ipv4(), enb.ipv4()) else {
            return Ok(());
        };
        map.store
            .remove(map.handle, &ue.octets())
            .with_context(|| format!("Failed to delete downlink map entry for UE {ue}"))?;
        debug!(self.logger, "Deleted downlink map entry {ue}");
        Ok(())
    }

    /// Returns None if the mirror is inactive or has no entry for the UE.
    pub fn lookup(&self, ue: Ipv4Addr) -> Result<Option<DlMapEntry>> {
        let Some(map) = &self.map else {
            return Ok(None);
        };
        let value = map
            .store
            .lookup(map.handle, &ue.octets())
            .with_context(|| format!("Failed to read downlink map entry for UE {ue}"))?;
        Ok(value.as_ref().map(DlMapEntry::from_bytes))
    }
}
