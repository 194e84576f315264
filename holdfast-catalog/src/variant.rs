use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A purchasable SKU. Stock counters for a variant live in the
/// [`StockLedger`](crate::stock::StockLedger), keyed by this id; orders hold
/// non-owning references to variants by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variant {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    /// Unit price in minor units.
    pub price: u32,
    pub active: bool,
}
