use crate::models::{Order, OrderState};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use uuid::Uuid;

/// Arena of independently addressable order rows.
///
/// Each row carries its own lock so settlement and the reclaimer can
/// serialize on a single order without blocking the rest of the store. Rows
/// reference variants by id only; the variant's lifetime is independent and
/// shared across many orders.
#[derive(Default)]
pub struct OrderStore {
    rows: RwLock<HashMap<Uuid, Arc<Mutex<Order>>>>,
}

impl OrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, order: Order) {
        self.rows
            .write()
            .unwrap()
            .insert(order.id, Arc::new(Mutex::new(order)));
    }

    /// The live row, for callers that must mutate under the row lock.
    pub fn row(&self, id: Uuid) -> Option<Arc<Mutex<Order>>> {
        self.rows.read().unwrap().get(&id).cloned()
    }

    /// A point-in-time copy, for read paths.
    pub fn snapshot(&self, id: Uuid) -> Option<Order> {
        self.row(id).map(|row| row.lock().unwrap().clone())
    }

    /// Rows still awaiting payment that were created at or before `cutoff`.
    /// Candidates only: the scan races live settlement, so callers must
    /// re-check state under each row lock before mutating.
    pub fn stale_pending(&self, cutoff: DateTime<Utc>) -> Vec<Arc<Mutex<Order>>> {
        self.rows
            .read()
            .unwrap()
            .values()
            .filter(|row| {
                let order = row.lock().unwrap();
                order.state == OrderState::PendingPayment && order.created_at <= cutoff
            })
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().unwrap().is_empty()
    }
}
