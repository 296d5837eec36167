use crate::catalog::{CatalogError, Product};
use crate::completion::CompletionError;
use crate::conversation::RequestId;

/// Results of background work, delivered to the UI thread.
#[derive(Debug)]
pub enum AppEvent {
    CatalogFetched {
        category: String,
        result: Result<Vec<Product>, CatalogError>,
    },
    CompletionFinished {
        id: RequestId,
        result: Result<String, CompletionError>,
    },
}
