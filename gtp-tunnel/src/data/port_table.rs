use super::PortName;

pub const INIT_PORT_TABLE_SIZE: usize = 64;
pub const MAX_PORT_TABLE_SIZE: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortRecord {
    pub name: PortName,
    pub port_number: u32,
}

/// Outcome of [`PortTable::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    Stored,
    /// The table hit its size ceiling, so every earlier record was discarded
    /// before this one was stored.
    StoredAfterFlush,
    Dropped,
}

/// Cache of GTP port name to OpenFlow port number, searched linearly.
///
/// The table starts with 64 slots and doubles when full.  Growing past 1024
/// slots resets it to 64 empty slots instead, so memory stays bounded at the
/// cost of re-provisioning peers that are still in use.
#[derive(Debug)]
pub struct PortTable {
    slots: Vec<Option<PortRecord>>,
    occupied: usize,
}

impl Default for PortTable {
    fn default() -> Self {
        Self::new()
    }
}

impl PortTable {
    pub fn new() -> Self {
        PortTable {
            slots: vec![None; INIT_PORT_TABLE_SIZE],
            occupied: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn occupied_count(&self) -> usize {
        self.occupied
    }

    /// Returns the cached port number, or 0 if the name is not cached.
    pub fn lookup(&self, name: &PortName) -> u32 {
        self.iter()
            .find(|record| record.name == *name)
            .map_or(0, |record| record.port_number)
    }

    /// Caches a port number.  Callers are expected to have looked the name up
    /// first; duplicates are not detected.  Port number 0 means "unknown" and
    /// is never stored.
    pub fn insert(&mut self, name: PortName, port_number: u32) -> Insertion {
        if port_number == 0 {
            return Insertion::Dropped;
        }

        let mut flushed = false;
        if self.occupied == self.slots.len() {
            let new_size = self.slots.len() * 2;
            if new_size > MAX_PORT_TABLE_SIZE {
                self.slots = vec![None; INIT_PORT_TABLE_SIZE];
                self.occupied = 0;
                flushed = true;
            } else {
                self.slots.resize(new_size, None);
            }
        }

        let Some(slot) = self.slots.iter_mut().find(|slot| slot.is_none()) else {
            return Insertion::Dropped;
        };
        *slot = Some(PortRecord { name, port_number });
        self.occupied += 1;

        if flushed {
            Insertion::StoredAfterFlush
        } else {
            Insertion::Stored
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &PortRecord> {
        self.slots.iter().flatten()
    }
}
