use dcinv_api::{EquipmentQuery, EquipmentRecord};

/// Issues monotonically increasing fetch generations and rejects
/// responses that a newer fetch has superseded.
#[derive(Debug, Default)]
pub struct GenerationGuard {
    newest: u64,
}

impl GenerationGuard {
    pub fn begin(&mut self) -> u64 {
        self.newest += 1;
        self.newest
    }

    /// Whether a response for `generation` may still be applied.
    pub fn accept(&self, generation: u64) -> bool {
        generation >= self.newest
    }

    pub fn newest(&self) -> u64 {
        self.newest
    }
}

/// The canonical equipment list, replaced wholesale on every accepted fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventorySnapshot {
    pub records: Vec<EquipmentRecord>,
    /// Filters the records were fetched with.
    pub filters: EquipmentQuery,
    /// Generation of the fetch that produced this snapshot; 0 before the first load.
    pub generation: u64,
}

impl InventorySnapshot {
    pub fn is_loaded(&self) -> bool {
        self.generation > 0
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_filtered(&self) -> bool {
        !self.filters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn find(&self, id: i64) -> Option<&EquipmentRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn expired(&self) -> impl Iterator<Item = &EquipmentRecord> {
        self.records.iter().filter(|r| r.is_expired)
    }
}
