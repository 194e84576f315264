use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use uuid::Uuid;

/// Snapshot of one variant's counters. `available` is always derived, never
/// stored independently.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct StockLevels {
    pub total: u32,
    pub reserved: u32,
}

impl StockLevels {
    pub fn available(&self) -> u32 {
        self.total - self.reserved
    }
}

#[derive(Debug)]
struct StockRow {
    total: u32,
    reserved: u32,
}

/// Per-variant stock counters and the only mutations allowed to touch them.
///
/// Every mutation is a serialized read-check-write under that variant's own
/// row lock, so `0 <= reserved <= total` holds at every observable instant.
/// Operations on disjoint variants run fully in parallel; the map-level lock
/// is only written during registration.
#[derive(Default)]
pub struct StockLedger {
    rows: RwLock<HashMap<Uuid, Arc<Mutex<StockRow>>>>,
}

impl StockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed counters for a variant. Re-registering is rejected so live
    /// reservations cannot be wiped by catalog management.
    pub fn register(&self, variant_id: Uuid, total: u32) -> Result<(), StockError> {
        let mut rows = self.rows.write().unwrap();
        if rows.contains_key(&variant_id) {
            return Err(StockError::AlreadyRegistered(variant_id));
        }
        rows.insert(variant_id, Arc::new(Mutex::new(StockRow { total, reserved: 0 })));
        Ok(())
    }

    /// Place a temporary hold on `qty` units.
    pub fn reserve(&self, variant_id: Uuid, qty: u32) -> Result<(), StockError> {
        let row = self.row(variant_id)?;
        let mut row = row.lock().unwrap();

        let available = row.total - row.reserved;
        if available < qty {
            return Err(StockError::InsufficientStock {
                requested: qty,
                available,
            });
        }

        row.reserved += qty;
        Ok(())
    }

    /// Give a hold back to the available pool. Not safe to call twice for the
    /// same hold; callers gate on order state to avoid double-release.
    pub fn release(&self, variant_id: Uuid, qty: u32) -> Result<(), StockError> {
        let row = self.row(variant_id)?;
        let mut row = row.lock().unwrap();

        if row.reserved < qty {
            return Err(StockError::InsufficientReserved {
                requested: qty,
                reserved: row.reserved,
            });
        }

        row.reserved -= qty;
        Ok(())
    }

    /// Convert a hold into a completed sale. The only operation that
    /// permanently removes stock from the system.
    pub fn confirm(&self, variant_id: Uuid, qty: u32) -> Result<(), StockError> {
        let row = self.row(variant_id)?;
        let mut row = row.lock().unwrap();

        if row.reserved < qty {
            return Err(StockError::InsufficientReserved {
                requested: qty,
                reserved: row.reserved,
            });
        }
        if row.total < qty {
            return Err(StockError::InsufficientTotal {
                requested: qty,
                total: row.total,
            });
        }

        row.total -= qty;
        row.reserved -= qty;
        Ok(())
    }

    /// Reverse a previously confirmed sale (post-payment refund). Never used
    /// to undo a mere reservation; that is what `release` is for.
    pub fn restock(&self, variant_id: Uuid, qty: u32) -> Result<(), StockError> {
        let row = self.row(variant_id)?;
        let mut row = row.lock().unwrap();

        row.total += qty;
        Ok(())
    }

    /// Counter snapshot for admin introspection and reconciliation logs.
    pub fn levels(&self, variant_id: Uuid) -> Result<StockLevels, StockError> {
        let row = self.row(variant_id)?;
        let row = row.lock().unwrap();
        Ok(StockLevels {
            total: row.total,
            reserved: row.reserved,
        })
    }

    fn row(&self, variant_id: Uuid) -> Result<Arc<Mutex<StockRow>>, StockError> {
        self.rows
            .read()
            .unwrap()
            .get(&variant_id)
            .cloned()
            .ok_or(StockError::NotFound(variant_id))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StockError {
    #[error("stock not tracked for variant {0}")]
    NotFound(Uuid),

    #[error("stock already registered for variant {0}")]
    AlreadyRegistered(Uuid),

    // Counters stay out of the display string; they are for logs only.
    #[error("insufficient stock: requested {requested}")]
    InsufficientStock { requested: u32, available: u32 },

    #[error("insufficient reserved stock: requested {requested}")]
    InsufficientReserved { requested: u32, reserved: u32 },

    #[error("insufficient total stock: requested {requested}")]
    InsufficientTotal { requested: u32, total: u32 },
}
