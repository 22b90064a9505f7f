use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(ProductId);
id_newtype!(AdminUserId);
id_newtype!(OrderId);

/// Catalog label a product is listed under.
///
/// The storefront ships with three well-known labels, but the set is open:
/// the admin panel may file products under any non-empty label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(pub String);

impl Category {
    pub const NEW_PHONES: &'static str = "novos";
    pub const USED_PHONES: &'static str = "usados";
    pub const ACCESSORIES: &'static str = "acessorios";

    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Label the catalog uses for "no filter".
pub const ALL_CATEGORIES_LABEL: &str = "todos";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    /// Blank labels and `todos` mean no filtering.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        if label.is_empty() || label.eq_ignore_ascii_case(ALL_CATEGORIES_LABEL) {
            Self::All
        } else {
            Self::Only(Category::new(label))
        }
    }

    pub fn as_category(&self) -> Option<&Category> {
        match self {
            Self::All => None,
            Self::Only(category) => Some(category),
        }
    }

    pub fn matches(&self, category: &Category) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == category,
        }
    }
}

/// Amount in cents, between zero and [`Price::MAX_CENTS`]. Rendered in pt-BR
/// (`R$ 4.999,90`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(pub i64);

impl Price {
    /// R$ 100.000.000,00. Keeps catalog-wide sums far inside `i64`.
    pub const MAX_CENTS: i64 = 10_000_000_000;

    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub fn cents(self) -> i64 {
        self.0
    }

    pub fn is_valid(self) -> bool {
        (0..=Self::MAX_CENTS).contains(&self.0)
    }

    pub fn format_brl(self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let cents = self.0.unsigned_abs();
        let whole = (cents / 100).to_string();
        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, ch) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }
        format!("R$ {sign}{grouped},{:02}", cents % 100)
    }
}

impl std::iter::Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.map(|p| p.0).sum())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub category: Category,
    /// Primary image, shown whenever `photos` has nothing at the index.
    pub image: String,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub details: Vec<String>,
    #[serde(default)]
    pub stock: i64,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn photo_count(&self) -> usize {
        self.photos.len()
    }

    /// Photo reference displayed at `index`, falling back to the primary image.
    pub fn photo_at(&self, index: usize) -> &str {
        self.photos
            .get(index)
            .map(String::as_str)
            .unwrap_or(&self.image)
    }

    pub fn has_gallery(&self) -> bool {
        self.photos.len() > 1
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUserSummary {
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: OrderId,
    pub customer_name: String,
    pub total: Price,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(photos: &[&str]) -> Product {
        Product {
            id: ProductId(1),
            name: "iPhone 13 - 128GB".into(),
            description: String::new(),
            price: Price(289_000),
            category: Category::new(Category::USED_PHONES),
            image: "/primary.png".into(),
            photos: photos.iter().map(|p| p.to_string()).collect(),
            details: Vec::new(),
            stock: 1,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn formats_prices_in_brazilian_locale() {
        assert_eq!(Price(499_990).format_brl(), "R$ 4.999,90");
        assert_eq!(Price(289_000).format_brl(), "R$ 2.890,00");
        assert_eq!(Price(5).format_brl(), "R$ 0,05");
        assert_eq!(Price(123_456_789).format_brl(), "R$ 1.234.567,89");
    }

    #[test]
    fn price_range_is_bounded() {
        assert!(Price(0).is_valid());
        assert!(Price(Price::MAX_CENTS).is_valid());
        assert!(!Price(-1).is_valid());
        assert!(!Price(Price::MAX_CENTS + 1).is_valid());
        assert!(!Price(i64::MAX).is_valid());
    }

    #[test]
    fn photo_at_falls_back_to_primary_image() {
        let without = product(&[]);
        assert_eq!(without.photo_at(0), "/primary.png");

        let with = product(&["/a.png", "/b.png"]);
        assert_eq!(with.photo_at(1), "/b.png");
        assert_eq!(with.photo_at(5), "/primary.png");
        assert!(with.has_gallery());
    }

    #[test]
    fn todos_label_means_no_filter() {
        assert_eq!(CategoryFilter::from_label("todos"), CategoryFilter::All);
        assert_eq!(CategoryFilter::from_label("  "), CategoryFilter::All);
        let only = CategoryFilter::from_label("usados");
        assert!(only.matches(&Category::new("usados")));
        assert!(!only.matches(&Category::new("novos")));
    }
}
