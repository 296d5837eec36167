use crate::catalog::{CatalogStore, Product, ProductId};
use std::collections::HashSet;
use thiserror::Error;

pub mod store;

pub use store::{JsonFileStore, SelectionStore};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("product {0} is not in the loaded catalog")]
    UnknownProduct(ProductId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Added,
    Removed,
}

impl Toggle {
    pub fn is_selected(self) -> bool {
        matches!(self, Self::Added)
    }
}

/// Ordered, id-unique selection mirrored into a [`SelectionStore`] after
/// every mutation.
pub struct SelectionManager {
    items: Vec<Product>,
    store: Box<dyn SelectionStore>,
    warnings: Vec<String>,
}

impl SelectionManager {
    /// Rehydrates from `store`. Unreadable storage starts an empty selection
    /// and leaves a warning behind instead of failing startup.
    pub fn load(store: Box<dyn SelectionStore>) -> Self {
        let mut warnings = Vec::new();
        let items = match store.load() {
            Ok(Some(items)) => dedupe(items),
            Ok(None) => Vec::new(),
            Err(err) => {
                tracing::warn!("discarding stored selection: {err}");
                warnings.push(format!("stored selection unreadable: {err}"));
                Vec::new()
            }
        };
        tracing::debug!(count = items.len(), "selection rehydrated");

        Self {
            items,
            store,
            warnings,
        }
    }

    pub fn items(&self) -> &[Product] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// One row per selected product, in selection order: the id the remove
    /// button carries and the `"{name} ({brand})"` label.
    pub fn panel_rows(&self) -> Vec<(ProductId, String)> {
        self.items
            .iter()
            .map(|product| (product.id, format!("{} ({})", product.name, product.brand)))
            .collect()
    }

    pub fn contains(&self, id: ProductId) -> bool {
        self.items.iter().any(|product| product.id == id)
    }

    pub fn toggle(
        &mut self,
        id: ProductId,
        catalog: &CatalogStore,
    ) -> Result<Toggle, SelectionError> {
        let outcome = if let Some(index) = self.position(id) {
            self.items.remove(index);
            Toggle::Removed
        } else {
            let product = catalog.get(id).ok_or(SelectionError::UnknownProduct(id))?;
            self.items.push(product.clone());
            Toggle::Added
        };
        self.persist();
        Ok(outcome)
    }

    /// Returns whether anything was removed. Persists either way.
    pub fn remove(&mut self, id: ProductId) -> bool {
        let removed = match self.position(id) {
            Some(index) => {
                self.items.remove(index);
                true
            }
            None => false,
        };
        self.persist();
        removed
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.persist();
    }

    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }

    fn position(&self, id: ProductId) -> Option<usize> {
        self.items.iter().position(|product| product.id == id)
    }

    fn persist(&mut self) {
        if let Err(err) = self.store.save(&self.items) {
            tracing::warn!("failed to persist selection: {err}");
            self.warnings.push(format!("failed to persist selection: {err}"));
        }
    }
}

fn dedupe(items: Vec<Product>) -> Vec<Product> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|product| seen.insert(product.id))
        .collect()
}
