use super::*;
use chrono::Utc;
use shared::domain::{Category, Price};

fn product_with_photos(id: i64, count: usize) -> Product {
    Product {
        id: ProductId(id),
        name: format!("produto {id}"),
        description: String::new(),
        price: Price(100_000),
        category: Category::new(Category::NEW_PHONES),
        image: format!("/p{id}.png"),
        photos: (0..count).map(|i| format!("/p{id}-{i}.png")).collect(),
        details: Vec::new(),
        stock: 1,
        created_at: Utc::now(),
    }
}

#[test]
fn next_wraps_after_last_photo() {
    let mut carousel = CarouselController::new();
    carousel.select_product(product_with_photos(1, 3));
    assert_eq!(carousel.photo_index(), 0);
    carousel.next_photo();
    assert_eq!(carousel.photo_index(), 1);
    carousel.next_photo();
    assert_eq!(carousel.photo_index(), 2);
    carousel.next_photo();
    assert_eq!(carousel.photo_index(), 0);
}

#[test]
fn previous_wraps_before_first_photo() {
    let mut carousel = CarouselController::new();
    carousel.select_product(product_with_photos(1, 4));
    carousel.previous_photo();
    assert_eq!(carousel.photo_index(), 3);
}

#[test]
fn next_and_previous_round_trip_for_every_index() {
    for count in 2..7 {
        for start in 0..count {
            let mut carousel = CarouselController::new();
            carousel.select_product(product_with_photos(1, count));
            carousel.jump_to_photo(start);

            carousel.next_photo();
            carousel.previous_photo();
            assert_eq!(carousel.photo_index(), start, "next/previous n={count}");

            carousel.previous_photo();
            carousel.next_photo();
            assert_eq!(carousel.photo_index(), start, "previous/next n={count}");
        }
    }
}

#[test]
fn zero_or_one_photo_keeps_index_at_zero() {
    for count in [0, 1] {
        let mut carousel = CarouselController::new();
        carousel.select_product(product_with_photos(1, count));
        carousel.next_photo();
        assert_eq!(carousel.photo_index(), 0);
        carousel.previous_photo();
        assert_eq!(carousel.photo_index(), 0);
    }
}

#[test]
fn navigation_without_selection_is_a_no_op() {
    let mut carousel = CarouselController::new();
    carousel.next_photo();
    carousel.previous_photo();
    assert_eq!(carousel.photo_index(), 0);
    assert!(carousel.current_photo().is_none());
}

#[test]
fn jump_sets_index_regardless_of_prior_position() {
    let mut carousel = CarouselController::new();
    carousel.select_product(product_with_photos(1, 5));
    carousel.next_photo();
    carousel.next_photo();
    for k in 0..5 {
        carousel.jump_to_photo(k);
        assert_eq!(carousel.photo_index(), k);
    }
}

#[test]
fn selecting_another_product_resets_index() {
    let mut carousel = CarouselController::new();
    let q = product_with_photos(1, 3);
    let p = product_with_photos(2, 3);

    carousel.select_product(q.clone());
    carousel.jump_to_photo(2);
    carousel.select_product(p);
    assert_eq!(carousel.photo_index(), 0);

    carousel.select_product(q);
    assert_eq!(carousel.photo_index(), 0, "modal index is single-slot");
}

#[test]
fn clear_selection_drops_product() {
    let mut carousel = CarouselController::new();
    carousel.select_product(product_with_photos(1, 3));
    carousel.clear_selection();
    assert!(carousel.selected().is_none());
}

#[test]
fn current_photo_falls_back_to_primary_image() {
    let mut carousel = CarouselController::new();
    carousel.select_product(product_with_photos(9, 0));
    assert_eq!(carousel.current_photo(), Some("/p9.png"));

    carousel.select_product(product_with_photos(3, 2));
    carousel.next_photo();
    assert_eq!(carousel.current_photo(), Some("/p3-1.png"));
}

#[test]
fn indicator_dots_only_for_galleries() {
    let mut carousel = CarouselController::new();
    carousel.select_product(product_with_photos(1, 1));
    assert!(carousel.indicator_dots().is_empty());

    carousel.select_product(product_with_photos(2, 3));
    carousel.jump_to_photo(1);
    let dots = carousel.indicator_dots();
    assert_eq!(dots.len(), 3);
    assert_eq!(
        dots.iter().filter(|d| d.active).map(|d| d.index).collect::<Vec<_>>(),
        vec![1]
    );
}

#[test]
fn card_indices_are_independent() {
    let mut cards = CardCarousels::new();
    let a = ProductId(1);
    let b = ProductId(2);

    assert_eq!(cards.index_of(a), 0);
    cards.next(a, 3);
    cards.next(a, 3);
    assert_eq!(cards.index_of(a), 2);
    assert_eq!(cards.index_of(b), 0);

    cards.previous(b, 4);
    assert_eq!(cards.index_of(b), 3);
    assert_eq!(cards.index_of(a), 2);

    cards.next(a, 3);
    assert_eq!(cards.index_of(a), 0);
}

#[test]
fn card_navigation_ignores_products_without_photos() {
    let mut cards = CardCarousels::new();
    cards.next(ProductId(7), 0);
    cards.previous(ProductId(7), 0);
    assert_eq!(cards.index_of(ProductId(7)), 0);
}

#[test]
fn wrap_helpers_stay_in_range() {
    for count in 0..6 {
        for current in 0..count.max(1) {
            let next = wrap_next(current, count);
            let previous = wrap_previous(current, count);
            if count == 0 {
                assert_eq!((next, previous), (0, 0));
            } else {
                assert!(next < count && previous < count);
            }
        }
    }
}
