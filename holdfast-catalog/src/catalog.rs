use crate::variant::Variant;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// Read-only view of the catalog: existence and current price of a variant.
/// Catalog management itself is an external collaborator; checkout only ever
/// reads through this seam.
pub trait CatalogReader: Send + Sync {
    fn variant(&self, id: Uuid) -> Option<Variant>;
}

/// In-memory catalog backing the reader seam.
#[derive(Default)]
pub struct InMemoryCatalog {
    variants: RwLock<HashMap<Uuid, Variant>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, variant: Variant) {
        self.variants.write().unwrap().insert(variant.id, variant);
    }
}

impl CatalogReader for InMemoryCatalog {
    fn variant(&self, id: Uuid) -> Option<Variant> {
        self.variants.read().unwrap().get(&id).cloned()
    }
}
