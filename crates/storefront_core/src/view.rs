//! Catalog page state and the input adapter that drives it.
//!
//! Every user interaction is expressed as a [`StorefrontCommand`] and
//! applied through [`StorefrontView::apply`]; nothing here knows about the
//! UI toolkit that produced the event.

use shared::domain::{CategoryFilter, Product, ProductId};
use tracing::{debug, warn};

use crate::{
    carousel::{CardCarousels, CarouselController},
    catalog::{CatalogError, CatalogProvider},
    gesture::{SwipeDirection, SwipeTracker},
};

/// Shown in place of the grid when the catalog could not be fetched.
pub const LOAD_FAILED_MESSAGE: &str = "Erro ao carregar produtos";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogLoadState {
    Loading,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone)]
pub enum StorefrontCommand {
    SetCategory(CategoryFilter),
    OpenProduct(ProductId),
    CloseProduct,
    NextPhoto,
    PreviousPhoto,
    JumpToPhoto(usize),
    NextCardPhoto(ProductId),
    PreviousCardPhoto(ProductId),
    TouchStart(f32),
    TouchMove(f32),
    TouchEnd,
}

#[derive(Debug, Clone)]
pub struct StorefrontView {
    products: Vec<Product>,
    filter: CategoryFilter,
    load_state: CatalogLoadState,
    modal: CarouselController,
    cards: CardCarousels,
    swipe: SwipeTracker,
}

impl Default for StorefrontView {
    fn default() -> Self {
        Self {
            products: Vec::new(),
            filter: CategoryFilter::All,
            load_state: CatalogLoadState::Loading,
            modal: CarouselController::new(),
            cards: CardCarousels::new(),
            swipe: SwipeTracker::new(),
        }
    }
}

impl StorefrontView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: Vec<Product>) -> Self {
        let mut view = Self::new();
        view.replace_products(products);
        view
    }

    /// Fetches the whole catalog once. Failures are not retried.
    pub async fn load(&mut self, provider: &dyn CatalogProvider) {
        self.load_state = CatalogLoadState::Loading;
        match provider.list_products(&CategoryFilter::All).await {
            Ok(products) => self.replace_products(products),
            Err(error) => self.fail_load(&error),
        }
    }

    fn replace_products(&mut self, products: Vec<Product>) {
        debug!(count = products.len(), "catalog loaded");
        self.products = products;
        self.load_state = CatalogLoadState::Ready;
    }

    fn fail_load(&mut self, error: &CatalogError) {
        warn!(%error, "failed to load catalog");
        self.products.clear();
        self.load_state = CatalogLoadState::Failed(LOAD_FAILED_MESSAGE.to_string());
    }

    pub fn load_state(&self) -> &CatalogLoadState {
        &self.load_state
    }

    pub fn filter(&self) -> &CategoryFilter {
        &self.filter
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn visible_products(&self) -> impl Iterator<Item = &Product> {
        self.products
            .iter()
            .filter(|product| self.filter.matches(&product.category))
    }

    pub fn product(&self, product_id: ProductId) -> Option<&Product> {
        self.products.iter().find(|product| product.id == product_id)
    }

    pub fn modal(&self) -> &CarouselController {
        &self.modal
    }

    pub fn cards(&self) -> &CardCarousels {
        &self.cards
    }

    pub fn card_photo<'a>(&self, product: &'a Product) -> &'a str {
        self.cards.card_photo(product)
    }

    pub fn next_photo_card(&mut self, product_id: ProductId) {
        if let Some(count) = self.product(product_id).map(Product::photo_count) {
            self.cards.next(product_id, count);
        }
    }

    pub fn previous_photo_card(&mut self, product_id: ProductId) {
        if let Some(count) = self.product(product_id).map(Product::photo_count) {
            self.cards.previous(product_id, count);
        }
    }

    pub fn on_gesture_start(&mut self, x: f32) {
        self.swipe.on_start(x);
    }

    pub fn on_gesture_move(&mut self, x: f32) {
        self.swipe.on_move(x);
    }

    pub fn on_gesture_end(&mut self) {
        match self.swipe.on_end() {
            Some(SwipeDirection::Left) => self.modal.next_photo(),
            Some(SwipeDirection::Right) => self.modal.previous_photo(),
            None => {}
        }
    }

    pub fn apply(&mut self, command: StorefrontCommand) {
        match command {
            StorefrontCommand::SetCategory(filter) => self.filter = filter,
            StorefrontCommand::OpenProduct(product_id) => {
                if let Some(product) = self.product(product_id).cloned() {
                    self.modal.select_product(product);
                }
            }
            StorefrontCommand::CloseProduct => self.modal.clear_selection(),
            StorefrontCommand::NextPhoto => self.modal.next_photo(),
            StorefrontCommand::PreviousPhoto => self.modal.previous_photo(),
            StorefrontCommand::JumpToPhoto(index) => self.modal.jump_to_photo(index),
            StorefrontCommand::NextCardPhoto(product_id) => self.next_photo_card(product_id),
            StorefrontCommand::PreviousCardPhoto(product_id) => {
                self.previous_photo_card(product_id)
            }
            StorefrontCommand::TouchStart(x) => self.on_gesture_start(x),
            StorefrontCommand::TouchMove(x) => self.on_gesture_move(x),
            StorefrontCommand::TouchEnd => self.on_gesture_end(),
        }
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
