use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub type ProductId = u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub brand: String,
    pub category: String,
    pub description: String,
    pub image: String,
}

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    products: Vec<Product>,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to fetch catalog {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    File(PathBuf),
    Http(String),
}

impl CatalogSource {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            Self::Http(trimmed.to_string())
        } else {
            Self::File(PathBuf::from(trimmed))
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Http(url) => url.clone(),
        }
    }
}

/// Fetches the whole catalog document. Cheap to clone into background tasks.
#[derive(Debug, Clone)]
pub struct CatalogFetcher {
    source: CatalogSource,
    http: reqwest::Client,
}

impl CatalogFetcher {
    pub fn new(source: CatalogSource, http: reqwest::Client) -> Self {
        Self { source, http }
    }

    pub fn source(&self) -> &CatalogSource {
        &self.source
    }

    pub async fn load(&self) -> Result<Vec<Product>, CatalogError> {
        let bytes = match &self.source {
            CatalogSource::File(path) => {
                tokio::fs::read(path)
                    .await
                    .map_err(|source| CatalogError::Io {
                        path: path.clone(),
                        source,
                    })?
            }
            CatalogSource::Http(url) => {
                let http_err = |source: reqwest::Error| CatalogError::Http {
                    url: url.clone(),
                    source,
                };
                self.http
                    .get(url)
                    .send()
                    .await
                    .and_then(|response| response.error_for_status())
                    .map_err(http_err)?
                    .bytes()
                    .await
                    .map_err(http_err)?
                    .to_vec()
            }
        };
        parse_catalog(&bytes)
    }
}

pub fn parse_catalog(bytes: &[u8]) -> Result<Vec<Product>, CatalogError> {
    let document: CatalogDocument = serde_json::from_slice(bytes)?;
    Ok(document.products)
}

/// Products whose category equals `category` exactly, in catalog order.
pub fn narrow(products: &[Product], category: &str) -> Vec<Product> {
    products
        .iter()
        .filter(|product| product.category == category)
        .cloned()
        .collect()
}

/// Last fetched catalog. Replaced wholesale on every fetch.
#[derive(Debug, Default)]
pub struct CatalogStore {
    products: Vec<Product>,
}

impl CatalogStore {
    pub fn replace(&mut self, products: Vec<Product>) {
        self.products = products;
    }

    #[cfg(test)]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|product| product.id == id)
    }

    /// Caches a fresh fetch and returns the products matching `category`.
    pub fn filter(&mut self, products: Vec<Product>, category: &str) -> Vec<Product> {
        self.replace(products);
        narrow(&self.products, category)
    }
}
