//! Wrap-around photo navigation for the detail modal and the catalog cards.
//!
//! Two isolated state instances exist: [`CarouselController`] owns the modal
//! selection and its photo index, [`CardCarousels`] keeps one index per
//! catalog card. Neither ever leaves `[0, photo_count)`.

use std::collections::HashMap;

use shared::domain::{Product, ProductId};
use tracing::debug;

/// Index after `current` in a sequence of `count` photos.
///
/// Sequences of zero or one photo never move off index 0.
pub fn wrap_next(current: usize, count: usize) -> usize {
    if count <= 1 {
        return 0;
    }
    (current + 1) % count
}

/// Index before `current` in a sequence of `count` photos.
pub fn wrap_previous(current: usize, count: usize) -> usize {
    if count <= 1 {
        return 0;
    }
    (current % count + count - 1) % count
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorDot {
    pub index: usize,
    pub active: bool,
}

/// Modal carousel: at most one selected product and its current photo.
#[derive(Debug, Clone, Default)]
pub struct CarouselController {
    selected: Option<Product>,
    photo_index: usize,
}

impl CarouselController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select_product(&mut self, product: Product) {
        debug!(product_id = product.id.0, "product selected");
        self.selected = Some(product);
        self.photo_index = 0;
    }

    pub fn clear_selection(&mut self) {
        if let Some(product) = self.selected.take() {
            debug!(product_id = product.id.0, "selection cleared");
        }
        self.photo_index = 0;
    }

    pub fn selected(&self) -> Option<&Product> {
        self.selected.as_ref()
    }

    pub fn photo_index(&self) -> usize {
        self.photo_index
    }

    fn photo_count(&self) -> usize {
        self.selected.as_ref().map_or(0, Product::photo_count)
    }

    pub fn next_photo(&mut self) {
        self.photo_index = wrap_next(self.photo_index, self.photo_count());
    }

    pub fn previous_photo(&mut self) {
        self.photo_index = wrap_previous(self.photo_index, self.photo_count());
    }

    /// Callers pass indices taken from [`Self::indicator_dots`], so the range
    /// is not checked again here.
    pub fn jump_to_photo(&mut self, index: usize) {
        self.photo_index = index;
    }

    /// Photo currently shown in the modal, or `None` with nothing selected.
    pub fn current_photo(&self) -> Option<&str> {
        self.selected
            .as_ref()
            .map(|product| product.photo_at(self.photo_index))
    }

    /// One dot per photo; empty unless the selected product has a gallery.
    pub fn indicator_dots(&self) -> Vec<IndicatorDot> {
        match &self.selected {
            Some(product) if product.has_gallery() => (0..product.photo_count())
                .map(|index| IndicatorDot {
                    index,
                    active: index == self.photo_index,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Per-card photo indices for the catalog grid. Missing entries read as 0.
#[derive(Debug, Clone, Default)]
pub struct CardCarousels {
    indices: HashMap<ProductId, usize>,
}

impl CardCarousels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index_of(&self, product_id: ProductId) -> usize {
        self.indices.get(&product_id).copied().unwrap_or(0)
    }

    pub fn next(&mut self, product_id: ProductId, photo_count: usize) {
        if photo_count == 0 {
            return;
        }
        let next = wrap_next(self.index_of(product_id), photo_count);
        self.indices.insert(product_id, next);
    }

    pub fn previous(&mut self, product_id: ProductId, photo_count: usize) {
        if photo_count == 0 {
            return;
        }
        let previous = wrap_previous(self.index_of(product_id), photo_count);
        self.indices.insert(product_id, previous);
    }

    pub fn card_photo<'a>(&self, product: &'a Product) -> &'a str {
        product.photo_at(self.index_of(product.id))
    }
}

#[cfg(test)]
#[path = "tests/carousel_tests.rs"]
mod tests;
