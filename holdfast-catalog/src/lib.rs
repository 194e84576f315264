pub mod catalog;
pub mod stock;
pub mod variant;

pub use catalog::{CatalogReader, InMemoryCatalog};
pub use stock::{StockError, StockLedger, StockLevels};
pub use variant::Variant;
