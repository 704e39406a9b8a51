use axum::http::StatusCode;
use serde_json::json;

use super::UtWebClient;

#[tokio::test]
async fn session_id_reused_by_cookie() {
    let mut client = UtWebClient::new();
    let resp = client.send("GET", "/api/session-id", None).await;
    assert_eq!(resp.status, StatusCode::OK);
    let sid0 = resp.body["sessionID"].as_str().unwrap().to_string();
    let resp = client.send("GET", "/api/session-id", None).await;
    assert_eq!(resp.body["sessionID"].as_str(), Some(sid0.as_str()));
    client.forget_session();
    let resp = client.send("GET", "/api/session-id", None).await;
    assert_ne!(resp.body["sessionID"].as_str(), Some(sid0.as_str()));
}

#[tokio::test]
async fn add_same_item_merged() {
    let mut client = UtWebClient::new();
    let item = json!({"id": "p1", "quantity": 2, "price": 10});
    let resp = client.send("POST", "/api/cart", Some(item)).await;
    assert_eq!(resp.status, StatusCode::CREATED);
    let item = json!({"id": "p1", "quantity": 3, "price": 10});
    let resp = client.send("POST", "/api/cart", Some(item)).await;
    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.headers["x-cart-version"].to_str().unwrap(), "2");

    let resp = client.send("GET", "/api/cart", None).await;
    assert_eq!(resp.status, StatusCode::OK);
    let items = resp.body.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"].as_str(), Some("p1"));
    assert_eq!(items[0]["quantity"].as_u64(), Some(5));
    assert_eq!(items[0]["price"].as_f64(), Some(10.0));
}

#[tokio::test]
async fn update_quantity_empty_cart() {
    let mut client = UtWebClient::new();
    let body = json!({"quantity": 0});
    let resp = client.send("PUT", "/api/cart/p1", Some(body)).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.body, json!({"message": "Item not found"}));
}

#[tokio::test]
async fn update_remove_clear() {
    let mut client = UtWebClient::new();
    let items = [
        json!({"id": "p1", "quantity": 1, "price": 135.5, "name": "Krzesło"}),
        json!({"id": "p2", "variant": "dąb", "quantity": 1, "price": 1200.5}),
        json!({"id": "p2", "variant": "orzech", "quantity": 2, "price": 1200.5}),
    ];
    for item in items {
        let resp = client.send("POST", "/api/cart", Some(item)).await;
        assert_eq!(resp.status, StatusCode::CREATED);
    }
    let resp = client
        .send("PUT", "/api/cart/p1", Some(json!({"quantity": 4})))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body[0]["quantity"].as_u64(), Some(4));
    assert_eq!(resp.body[0]["name"].as_str(), Some("Krzesło"));

    // both variants removed
    let resp = client.send("DELETE", "/api/cart/p2", None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body.as_array().unwrap().len(), 1);
    let resp = client.send("DELETE", "/api/cart/p2", None).await;
    assert_eq!(resp.status, StatusCode::OK);

    let resp = client.send("DELETE", "/api/cart", None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, json!([]));
    assert_eq!(resp.headers["x-cart-version"].to_str().unwrap(), "7");
}

#[tokio::test]
async fn add_item_malformed_body() {
    let mut client = UtWebClient::new();
    let item = json!({"id": "p1", "quantity": -1, "price": 10});
    let resp = client.send("POST", "/api/cart", Some(item)).await;
    assert!(resp.status.is_client_error());
    let resp = client.send("GET", "/api/cart", None).await;
    assert_eq!(resp.body, json!([]));
}
