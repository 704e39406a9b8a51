use std::boxed::Box;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};

use storefront::adapter::datastore::{AbstInMemoryDStore, AppDataStoreContext, AppInMemoryDStore};
use storefront::model::{CartModel, CartItemModel};
use storefront::repository::{app_repo_cart, app_repo_payment_record, AbsCartRepo};
use storefront_common::config::AppInMemoryDbCfg;
use storefront_common::error::AppErrorCode;

use crate::model::{ut_cart_item, ut_decimal};

pub(crate) fn ut_inmem_dstore(max_items: u32) -> Arc<Box<dyn AbstInMemoryDStore>> {
    let cfg = AppInMemoryDbCfg {
        alias: "unit-test-inmem".to_string(),
        max_items,
    };
    let obj: Box<dyn AbstInMemoryDStore> = Box::new(AppInMemoryDStore::new(&cfg));
    Arc::new(obj)
}

pub(crate) async fn ut_setup_cart_repo(max_items: u32) -> Box<dyn AbsCartRepo> {
    let ds = AppDataStoreContext {
        in_mem: Some(ut_inmem_dstore(max_items)),
    };
    app_repo_cart(Arc::new(ds)).await.unwrap()
}

fn ut_saved_cart(session_id: &str, items: Vec<CartItemModel>) -> CartModel {
    let mut obj = CartModel::new(session_id.to_string(), Utc::now());
    items.into_iter().for_each(|i| obj.add_item(i));
    obj
}

#[tokio::test]
async fn missing_datastore() {
    let ds = AppDataStoreContext { in_mem: None };
    let result = app_repo_cart(Arc::new(ds)).await;
    let error = result.err().unwrap();
    assert_eq!(error.code, AppErrorCode::MissingDataStore);
}

#[tokio::test]
async fn fetch_never_saved() {
    let repo = ut_setup_cart_repo(20).await;
    let result = repo.fetch_cart("ut-sess-absent").await;
    assert!(result.unwrap().is_none());
}

#[tokio::test]
async fn save_fetch_keep_line_order() {
    let repo = ut_setup_cart_repo(20).await;
    let mut cart = ut_saved_cart(
        "ut-sess-1",
        vec![
            ut_cart_item("p7", None, 1, "19.90"),
            ut_cart_item("p2", Some("red"), 3, "1200.50"),
            ut_cart_item("p2", Some("blue"), 1, "1200.50"),
        ],
    );
    cart.items[0].name = Some("Lampa".to_string());
    cart.items[0].sku = Some("LP-7".to_string());
    let result = repo.save(&mut cart).await;
    assert_eq!(result.unwrap(), 4); // metadata row + 3 lines
    assert_eq!(cart.version, 1);

    let loaded = repo.fetch_cart("ut-sess-1").await.unwrap().unwrap();
    assert_eq!(loaded.version, 1);
    assert_eq!(loaded.items, cart.items);
    assert_eq!(loaded.items[1].variant.as_deref(), Some("red"));
    assert_eq!(loaded.items[0].name.as_deref(), Some("Lampa"));
    assert!(loaded.items[0].image.is_none());
    assert_eq!(loaded.subtotal(), ut_decimal("4821.90"));
    // carts of other sessions are not affected
    let result = repo.fetch_cart("ut-sess-2").await;
    assert!(result.unwrap().is_none());
}

#[tokio::test]
async fn save_shrink_removes_stale_lines() {
    let repo = ut_setup_cart_repo(20).await;
    let mut cart = ut_saved_cart(
        "ut-sess-1",
        vec![
            ut_cart_item("p1", None, 1, "10"),
            ut_cart_item("p2", None, 2, "20"),
            ut_cart_item("p3", None, 3, "30"),
        ],
    );
    let _ = repo.save(&mut cart).await.unwrap();
    let num_removed = cart.remove_item("p1");
    assert_eq!(num_removed, 1);
    let _ = repo.save(&mut cart).await.unwrap();
    assert_eq!(cart.version, 2);
    let loaded = repo.fetch_cart("ut-sess-1").await.unwrap().unwrap();
    let ids = loaded.items.iter().map(|i| i.id.as_str()).collect::<Vec<_>>();
    assert_eq!(ids, vec!["p2", "p3"]);
    assert_eq!(loaded.version, 2);

    cart.clear();
    let _ = repo.save(&mut cart).await.unwrap();
    let loaded = repo.fetch_cart("ut-sess-1").await.unwrap().unwrap();
    assert!(loaded.is_empty());
    assert_eq!(loaded.version, 3);
}

#[tokio::test]
async fn touch_keeps_version() {
    let repo = ut_setup_cart_repo(20).await;
    let mut cart = ut_saved_cart("ut-sess-1", vec![ut_cart_item("p1", None, 1, "10")]);
    cart.last_access -= Duration::hours(5);
    let _ = repo.save(&mut cart).await.unwrap();
    let t0 = cart.last_access;
    cart.last_access = Utc::now();
    let result = repo.touch(&cart).await;
    assert!(result.is_ok());
    let loaded = repo.fetch_cart("ut-sess-1").await.unwrap().unwrap();
    assert_eq!(loaded.version, 1);
    assert!(loaded.last_access > t0);
}

#[tokio::test]
async fn discard_ok() {
    let repo = ut_setup_cart_repo(20).await;
    let mut cart = ut_saved_cart(
        "ut-sess-1",
        vec![ut_cart_item("p1", None, 1, "10"), ut_cart_item("p2", None, 1, "5")],
    );
    let _ = repo.save(&mut cart).await.unwrap();
    let result = repo.discard("ut-sess-1").await;
    assert!(result.is_ok());
    let result = repo.fetch_cart("ut-sess-1").await;
    assert!(result.unwrap().is_none());
    // discarding absent cart is not an error
    let result = repo.discard("ut-sess-1").await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn save_exceed_capacity() {
    let repo = ut_setup_cart_repo(3).await;
    let items = (0..4)
        .map(|n| ut_cart_item(format!("p{n}").as_str(), None, 1, "1"))
        .collect::<Vec<_>>();
    let mut cart = ut_saved_cart("ut-sess-1", items);
    let result = repo.save(&mut cart).await;
    let error = result.err().unwrap();
    assert_eq!(error.code, AppErrorCode::ExceedingMaxLimit);
    let detail = error.detail.unwrap();
    assert!(detail.contains("cart_line"));
}

#[tokio::test]
async fn datastore_rows_shared_by_sessions() {
    let dstore = ut_inmem_dstore(20);
    let ds = AppDataStoreContext {
        in_mem: Some(dstore.clone()),
    };
    let repo = app_repo_cart(Arc::new(ds)).await.unwrap();
    let mut cart_a = ut_saved_cart("sess-a", vec![ut_cart_item("p1", None, 1, "10")]);
    let mut cart_b = ut_saved_cart("sess-a/x", vec![ut_cart_item("p9", None, 2, "10")]);
    let _ = repo.save(&mut cart_a).await.unwrap();
    let _ = repo.save(&mut cart_b).await.unwrap();
    let info = HashMap::from([("cart_metadata".to_string(), vec!["sess-a".to_string(), "sess-a/x".to_string()])]);
    let fetched = dstore.fetch(info).await.unwrap();
    assert_eq!(fetched["cart_metadata"].len(), 2);
    let loaded = repo.fetch_cart("sess-a").await.unwrap().unwrap();
    assert_eq!(loaded.items.len(), 1);
    assert_eq!(loaded.items[0].id.as_str(), "p1");
}

#[tokio::test]
async fn line_order_beyond_four_digits() {
    let num_lines = 10_002usize;
    let repo = ut_setup_cart_repo(num_lines as u32 + 1).await;
    let mut cart = ut_saved_cart("ut-sess-1", vec![]);
    cart.items = (0..num_lines)
        .map(|n| ut_cart_item(format!("p{n}").as_str(), None, 1, "1"))
        .collect();
    let result = repo.save(&mut cart).await;
    assert_eq!(result.unwrap(), num_lines + 1);
    let loaded = repo.fetch_cart("ut-sess-1").await.unwrap().unwrap();
    assert_eq!(loaded.items.len(), num_lines);
    let ids = loaded.items[9998..10002]
        .iter()
        .map(|i| i.id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["p9998", "p9999", "p10000", "p10001"]);
    assert_eq!(loaded.items, cart.items);
}

#[tokio::test]
async fn purge_expired_carts() {
    let ttl_secs = 3600u32;
    let now = Utc::now();
    let repo = ut_setup_cart_repo(4).await;
    let mut stale_a = ut_saved_cart("ut-sess-a", vec![ut_cart_item("p1", None, 1, "10")]);
    stale_a.last_access = now - Duration::hours(3);
    let mut stale_b = ut_saved_cart(
        "ut-sess-b",
        vec![ut_cart_item("p1", None, 1, "10"), ut_cart_item("p2", None, 1, "4")],
    );
    stale_b.last_access = now - Duration::seconds(ttl_secs as i64 + 1);
    let mut fresh = ut_saved_cart("ut-sess-c", vec![ut_cart_item("p3", None, 1, "7")]);
    fresh.last_access = now - Duration::minutes(5);
    for cart in [&mut stale_a, &mut stale_b] {
        let _ = repo.save(cart).await.unwrap();
    }
    // line table is full
    let error = repo.save(&mut fresh).await.err().unwrap();
    assert_eq!(error.code, AppErrorCode::ExceedingMaxLimit);
    assert_eq!(fresh.version, 0);

    let num_purged = repo.purge_expired(now, ttl_secs).await.unwrap();
    assert_eq!(num_purged, 2);
    for sid in ["ut-sess-a", "ut-sess-b"] {
        let result = repo.fetch_cart(sid).await;
        assert!(result.unwrap().is_none());
    }
    let _ = repo.save(&mut fresh).await.unwrap();
    assert_eq!(fresh.version, 1);
    // carts accessed within the TTL are kept
    let num_purged = repo.purge_expired(now, ttl_secs).await.unwrap();
    assert_eq!(num_purged, 0);
    let loaded = repo.fetch_cart("ut-sess-c").await.unwrap().unwrap();
    assert_eq!(loaded.items.len(), 1);
}

#[tokio::test]
async fn claim_payment_intent_once() {
    let now = Utc::now();
    let ds = AppDataStoreContext {
        in_mem: Some(ut_inmem_dstore(2)),
    };
    let repo = app_repo_payment_record(Arc::new(ds)).await.unwrap();
    let claimed = repo.claim_intent("pi_ut_1", "ut-sess-1", now).await.unwrap();
    assert!(claimed);
    let claimed = repo.claim_intent("pi_ut_1", "ut-sess-1", now).await.unwrap();
    assert!(!claimed);
    let claimed = repo.claim_intent("pi_ut_1", "ut-sess-2", now).await.unwrap();
    assert!(!claimed);
    let t1 = now - Duration::hours(2);
    let claimed = repo.claim_intent("pi_ut_2", "ut-sess-2", t1).await.unwrap();
    assert!(claimed);
    let error = repo.claim_intent("pi_ut_3", "ut-sess-3", now).await.err().unwrap();
    assert_eq!(error.code, AppErrorCode::ExceedingMaxLimit);

    let num_purged = repo.purge_expired(now, 3600).await.unwrap();
    assert_eq!(num_purged, 1);
    let claimed = repo.claim_intent("pi_ut_3", "ut-sess-3", now).await.unwrap();
    assert!(claimed);
    // recent record survives the purge
    let claimed = repo.claim_intent("pi_ut_1", "ut-sess-1", now).await.unwrap();
    assert!(!claimed);
}
