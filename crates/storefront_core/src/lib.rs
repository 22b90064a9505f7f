//! Client-side storefront logic: catalog loading, the photo carousels with
//! swipe navigation, and purchase hand-off links.

pub mod carousel;
pub mod catalog;
pub mod gesture;
pub mod purchase;
pub mod view;

pub use carousel::{CardCarousels, CarouselController, IndicatorDot};
pub use catalog::{demo_products, CatalogError, CatalogProvider, HttpCatalog, StaticCatalog};
pub use gesture::{SwipeDirection, SwipeTracker, SWIPE_THRESHOLD};
pub use purchase::PurchaseLinks;
pub use view::{CatalogLoadState, StorefrontCommand, StorefrontView};
