use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::{Client, StatusCode};
use shared::{
    domain::{Category, CategoryFilter, Price, Product, ProductId},
    error::{ApiError, ApiException, ErrorCode},
};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("catalog server rejected request with {status}: {source}")]
    Rejected {
        status: StatusCode,
        source: ApiException,
    },
    #[error("invalid catalog url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn list_products(&self, filter: &CategoryFilter) -> Result<Vec<Product>, CatalogError>;
}

/// Catalog compiled into the binary.
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    products: Vec<Product>,
}

impl StaticCatalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    pub fn demo() -> Self {
        Self::new(demo_products())
    }
}

#[async_trait]
impl CatalogProvider for StaticCatalog {
    async fn list_products(&self, filter: &CategoryFilter) -> Result<Vec<Product>, CatalogError> {
        Ok(self
            .products
            .iter()
            .filter(|product| filter.matches(&product.category))
            .cloned()
            .collect())
    }
}

/// Reads `GET {base}/api/products` from a storefront server.
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    http: Client,
    base_url: url::Url,
}

impl HttpCatalog {
    /// `base_url` may carry a path prefix (`https://host/loja`); the catalog
    /// endpoint is resolved under it.
    pub fn new(base_url: &str) -> Result<Self, CatalogError> {
        let mut base_url = url::Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            http: Client::new(),
            base_url,
        })
    }
}

#[async_trait]
impl CatalogProvider for HttpCatalog {
    async fn list_products(&self, filter: &CategoryFilter) -> Result<Vec<Product>, CatalogError> {
        let mut endpoint = self.base_url.join("api/products")?;
        if let Some(category) = filter.as_category() {
            endpoint
                .query_pairs_mut()
                .append_pair("category", category.as_str());
        }
        debug!(%endpoint, "fetching catalog");

        let response = self.http.get(endpoint).send().await?;
        let status = response.status();
        if !status.is_success() {
            let source = match response.json::<ApiError>().await {
                Ok(body) => ApiException::new(body.code, body.message),
                Err(_) => ApiException::new(ErrorCode::Internal, "unreadable error body"),
            };
            return Err(CatalogError::Rejected { status, source });
        }
        Ok(response.json::<Vec<Product>>().await?)
    }
}

fn listed_at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 11, day, 12, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// The five products the storefront launched with.
pub fn demo_products() -> Vec<Product> {
    vec![
        Product {
            id: ProductId(1),
            name: "iPhone 11 Pro Max - 64GB".into(),
            description: "iPhone 11 Pro Max novo, lacrado.".into(),
            price: Price(499_990),
            category: Category::new(Category::NEW_PHONES),
            image: "/iphone11-pro-max-64gb.png".into(),
            photos: vec![
                "/iphone11-pro-max-64gb.png".into(),
                "/iphone11-pro-max-64gb-2.png".into(),
                "/iphone11-pro-max-64gb-3.png".into(),
            ],
            details: vec![
                "Tela Super Retina XDR de 6,5 polegadas".into(),
                "Chip A13 Bionic".into(),
                "Câmera tripla de 12MP".into(),
                "Bateria de longa duração".into(),
                "Garantia de 1 ano".into(),
            ],
            stock: 1,
            created_at: listed_at(1),
        },
        Product {
            id: ProductId(2),
            name: "iPhone 13 - 128GB (Usado)".into(),
            description: "Em ótimo estado, 90% de bateria.".into(),
            price: Price(289_000),
            category: Category::new(Category::USED_PHONES),
            image: "/iphone13-128gb.png".into(),
            photos: Vec::new(),
            details: Vec::new(),
            stock: 1,
            created_at: listed_at(2),
        },
        Product {
            id: ProductId(3),
            name: "iPhone 15 Pro Max - 256GB".into(),
            description: "iPhone 15 Pro Max novo, lacrado.".into(),
            price: Price(599_000),
            category: Category::new(Category::NEW_PHONES),
            image: "/iphone15-pro-max-256gb.png".into(),
            photos: Vec::new(),
            details: Vec::new(),
            stock: 1,
            created_at: listed_at(3),
        },
        Product {
            id: ProductId(4),
            name: "iPhone 12 - 64GB (Usado)".into(),
            description: "Em ótimo estado, 90% de bateria.".into(),
            price: Price(259_000),
            category: Category::new(Category::USED_PHONES),
            image: "/iphone12-64gb.png".into(),
            photos: Vec::new(),
            details: Vec::new(),
            stock: 1,
            created_at: listed_at(4),
        },
        Product {
            id: ProductId(5),
            name: "Kit Apple".into(),
            description: "Kit Apple com AirPods Pro, AirPods Max e Apple Watch.".into(),
            price: Price(189_000),
            category: Category::new(Category::ACCESSORIES),
            image: "/kit-apple.png".into(),
            photos: Vec::new(),
            details: Vec::new(),
            stock: 1,
            created_at: listed_at(5),
        },
    ]
}

#[cfg(test)]
#[path = "tests/catalog_tests.rs"]
mod tests;
