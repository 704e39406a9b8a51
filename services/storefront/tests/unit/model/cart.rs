use chrono::{Duration, Utc};

use storefront::model::{CartModel, CartUpdateError};

use super::{ut_cart_item, ut_decimal};

#[test]
fn add_item_merge_same_product() {
    let mut cart = CartModel::new("ut-sess-01".to_string(), Utc::now());
    cart.add_item(ut_cart_item("p1", None, 2, "10"));
    cart.add_item(ut_cart_item("p2", Some("red"), 1, "25.5"));
    cart.add_item(ut_cart_item("p1", None, 3, "10"));
    assert_eq!(cart.items.len(), 2);
    assert_eq!(cart.items[0].id.as_str(), "p1");
    assert_eq!(cart.items[0].quantity, 5);
    assert_eq!(cart.items[1].id.as_str(), "p2");
    assert_eq!(cart.total_quantity(), 6);
}

#[test]
fn add_item_variant_separate_lines() {
    let mut cart = CartModel::new("ut-sess-02".to_string(), Utc::now());
    cart.add_item(ut_cart_item("p7", Some("red"), 1, "30"));
    cart.add_item(ut_cart_item("p7", Some("blue"), 2, "30"));
    cart.add_item(ut_cart_item("p7", None, 1, "30"));
    cart.add_item(ut_cart_item("p7", Some("blue"), 4, "30"));
    assert_eq!(cart.items.len(), 3);
    let variants = cart
        .items
        .iter()
        .map(|i| (i.variant.as_deref(), i.quantity))
        .collect::<Vec<_>>();
    assert_eq!(variants, vec![(Some("red"), 1), (Some("blue"), 6), (None, 1)]);
    assert_eq!(cart.subtotal(), ut_decimal("240"));
}

#[test]
fn update_quantity_ok() {
    let mut cart = CartModel::new("ut-sess-03".to_string(), Utc::now());
    cart.add_item(ut_cart_item("p1", None, 2, "10"));
    let result = cart.update_quantity("p1", 0);
    assert!(result.is_ok());
    // zero quantity is stored as-is, the line stays in the cart
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 0);
    assert_eq!(cart.subtotal(), ut_decimal("0"));
}

#[test]
fn update_quantity_item_not_found() {
    let mut cart = CartModel::new("ut-sess-04".to_string(), Utc::now());
    let result = cart.update_quantity("p1", 0);
    assert_eq!(result, Err(CartUpdateError::ItemNotFound));
    cart.add_item(ut_cart_item("p1", None, 2, "10"));
    let result = cart.update_quantity("p2", 9);
    assert_eq!(result, Err(CartUpdateError::ItemNotFound));
    assert_eq!(cart.items[0].quantity, 2);
}

#[test]
fn remove_item_all_variants() {
    let mut cart = CartModel::new("ut-sess-05".to_string(), Utc::now());
    cart.add_item(ut_cart_item("p1", Some("s"), 1, "10"));
    cart.add_item(ut_cart_item("p2", None, 1, "11"));
    cart.add_item(ut_cart_item("p1", Some("m"), 1, "10"));
    assert_eq!(cart.remove_item("p1"), 2);
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].id.as_str(), "p2");
    // removing absent item is not an error
    assert_eq!(cart.remove_item("p404"), 0);
    cart.clear();
    assert!(cart.is_empty());
}

#[test]
fn expiry_check() {
    let now = Utc::now();
    let mut cart = CartModel::new("ut-sess-06".to_string(), now);
    assert!(!cart.is_expired(now + Duration::seconds(3600), 3600));
    assert!(cart.is_expired(now + Duration::seconds(3601), 3600));
    cart.last_access = now - Duration::days(2);
    assert!(cart.is_expired(now, 86400));
}
