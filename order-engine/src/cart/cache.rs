use crate::storage::{CART_KEY, LocalStorage, StorageResult};
use crate::utils::money;
use shared::order::CartLine;
use std::sync::Arc;

/// Cart lines backed by local storage.
///
/// Every mutation persists immediately. A persist failure is logged and the
/// in-memory list stays authoritative for the session.
pub struct CartCache {
    storage: Arc<dyn LocalStorage>,
    lines: Vec<CartLine>,
}

impl CartCache {
    /// Empty cart, nothing read from storage
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        Self {
            storage,
            lines: Vec::new(),
        }
    }

    /// Cart restored from storage
    pub fn load(storage: Arc<dyn LocalStorage>) -> Self {
        let mut cart = Self::new(storage);
        cart.restore();
        cart
    }

    /// Append a line. Identical products are kept as separate lines.
    pub fn add(&mut self, line: CartLine) {
        tracing::debug!(product_ref = %line.product_ref, "Cart line added");
        self.lines.push(line);
        self.persist_logged();
    }

    /// Remove the line at `index`; `None` when out of range
    pub fn remove(&mut self, index: usize) -> Option<CartLine> {
        if index >= self.lines.len() {
            return None;
        }
        let line = self.lines.remove(index);
        self.persist_logged();
        Some(line)
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.persist_logged();
    }

    /// Live sum of `unit_price × quantity`
    pub fn total(&self) -> f64 {
        money::cart_total(&self.lines)
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn persist(&self) -> StorageResult<()> {
        let json = serde_json::to_string(&self.lines)?;
        self.storage.set(CART_KEY, &json)
    }

    /// Reload lines from storage and return how many were read.
    /// Missing, unreadable or malformed state yields an empty cart.
    pub fn restore(&mut self) -> usize {
        self.lines = match self.storage.get(CART_KEY) {
            Ok(Some(json)) => match serde_json::from_str::<Vec<CartLine>>(&json) {
                Ok(lines) => lines,
                Err(e) => {
                    tracing::warn!(error = %e, "Stored cart is corrupt, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stored cart, starting empty");
                Vec::new()
            }
        };
        tracing::debug!(lines = self.lines.len(), "Cart restored");
        self.lines.len()
    }

    fn persist_logged(&self) {
        if let Err(e) = self.persist() {
            tracing::error!(error = %e, "Failed to persist cart");
        }
    }
}
