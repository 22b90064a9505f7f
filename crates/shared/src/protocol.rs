use serde::{Deserialize, Serialize};

use crate::domain::{AdminUserSummary, Category, OrderSummary, Price, Product, ProductId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "username")]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    pub user: AdminUserSummary,
    /// Only present when sessions are delivered in the response body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupResponse {
    pub message: String,
    pub user: AdminUserSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Body of `POST /api/products`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    pub category: Category,
    #[serde(default, alias = "image_url")]
    pub image: String,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub details: Vec<String>,
    #[serde(default)]
    pub stock: i64,
}

/// Body of `PUT /api/products/:id`; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, alias = "image_url", skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photos: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
}

impl ProductPatch {
    pub fn apply_to(self, draft: &mut ProductDraft) {
        if let Some(v) = self.name {
            draft.name = v;
        }
        if let Some(v) = self.description {
            draft.description = v;
        }
        if let Some(v) = self.price {
            draft.price = v;
        }
        if let Some(v) = self.category {
            draft.category = v;
        }
        if let Some(v) = self.image {
            draft.image = v;
        }
        if let Some(v) = self.photos {
            draft.photos = v;
        }
        if let Some(v) = self.details {
            draft.details = v;
        }
        if let Some(v) = self.stock {
            draft.stock = v;
        }
    }
}

impl From<Product> for ProductDraft {
    fn from(product: Product) -> Self {
        Self {
            name: product.name,
            description: product.description,
            price: product.price,
            category: product.category,
            image: product.image,
            photos: product.photos,
            details: product.details,
            stock: product.stock,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductQuery {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDeleted {
    pub message: String,
    pub id: ProductId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_products: i64,
    pub total_value: Price,
    pub total_orders: i64,
    pub recent_orders: Vec<OrderSummary>,
}
