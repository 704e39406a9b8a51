use axum::http::StatusCode;
use serde_json::{json, Value as JsnVal};

use super::UtWebClient;

fn ut_form_body(shipping: &str, coupon: Option<&str>) -> JsnVal {
    json!({
        "customerType": "individual",
        "firstName": "Jan", "lastName": "Kowalski",
        "email": "jan.kowalski@example.com", "phone": "+48 600 100 200",
        "street": "ul. Długa 5", "city": "Gdańsk", "postalCode": "80-831",
        "shippingOption": shipping, "couponCode": coupon,
        "termsAccepted": true
    })
}

async fn ut_fill_cart(client: &mut UtWebClient, items: &[(&str, u32, f64)]) {
    for (id, qty, price) in items {
        let item = json!({"id": id, "quantity": qty, "price": price});
        let resp = client.send("POST", "/api/cart", Some(item)).await;
        assert_eq!(resp.status, StatusCode::CREATED);
    }
}

#[tokio::test]
async fn shipping_options() {
    let mut client = UtWebClient::new();
    let resp = client.send("GET", "/api/checkout/shipping-options", None).await;
    assert_eq!(resp.status, StatusCode::OK);
    let opts = resp.body.as_array().unwrap();
    assert_eq!(opts.len(), 3);
    assert_eq!(opts[0]["code"].as_str(), Some("dpd"));
    assert_eq!(opts[0]["price"].as_f64(), Some(19.99));
    assert_eq!(opts[1]["price"].as_f64(), Some(0.0));
}

#[tokio::test]
async fn validate_coupon() {
    let mut client = UtWebClient::new();
    let body = json!({"code": "rabat10"});
    let resp = client.send("POST", "/api/coupons/validate", Some(body)).await;
    assert_eq!(resp.status, StatusCode::OK);
    let expect = json!({"isValid": true, "discountType": "percentage", "amount": 10});
    assert_eq!(resp.body, expect);
    let body = json!({"code": "MINUS50"});
    let resp = client.send("POST", "/api/coupons/validate", Some(body)).await;
    let expect = json!({"isValid": true, "discountType": "fixed", "amount": 5000});
    assert_eq!(resp.body, expect);
    let body = json!({"code": "OLD5"});
    let resp = client.send("POST", "/api/coupons/validate", Some(body)).await;
    assert_eq!(resp.body, json!({"isValid": false, "amount": 0}));
}

#[tokio::test]
async fn quote_total_never_negative() {
    let mut client = UtWebClient::new();
    ut_fill_cart(&mut client, &[("p1", 1, 20.0)]).await;
    let body = json!({"shippingOption": "pickup", "couponCode": "MINUS50"});
    let resp = client.send("POST", "/api/checkout/quote", Some(body)).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["subtotal"].as_f64(), Some(20.0));
    assert_eq!(resp.body["discount"].as_f64(), Some(50.0));
    assert_eq!(resp.body["total"].as_f64(), Some(0.0));
    assert_eq!(resp.body["currency"].as_str(), Some("pln"));

    let body = json!({"shippingOption": "courier-x"});
    let resp = client.send("POST", "/api/checkout/quote", Some(body)).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["message"].as_str(), Some("Validation failed"));
    assert_eq!(resp.body["invalid"], json!(["shippingOption"]));
}

#[tokio::test]
async fn create_intent_then_query_status() {
    let mut client = UtWebClient::new();
    ut_fill_cart(&mut client, &[("p1", 2, 135.5), ("p2", 1, 1200.5)]).await;
    let body = ut_form_body("dpd", Some("RABAT10"));
    let resp = client
        .send("POST", "/api/checkout/payment-intent", Some(body))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let intent_id = resp.body["paymentIntentId"].as_str().unwrap().to_string();
    let secret = resp.body["clientSecret"].as_str().unwrap();
    assert!(secret.starts_with(intent_id.as_str()));
    // 1471.50 + 19.99, then 10% off
    assert_eq!(resp.body["breakdown"]["total"].as_f64(), Some(1342.34));
    assert_eq!(resp.body["breakdown"]["discount"].as_f64(), Some(149.15));

    let uri = format!("/api/checkout/payment-intent/{intent_id}");
    let resp = client.send("GET", uri.as_str(), None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["status"].as_str(), Some("requires_payment_method"));
    let resp = client
        .send("GET", "/api/checkout/payment-intent/pi_ut_absent", None)
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    // decoded slash must not reach other resources of the processor
    let uri = "/api/checkout/payment-intent/pi_ut_succeeded%2Frefunds";
    let resp = client.send("GET", uri, None).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_intent_validation_failed() {
    let mut client = UtWebClient::new();
    let mut body = ut_form_body("dpd", None);
    body["customerType"] = json!("company");
    body["nip"] = json!("123");
    body["firstName"] = json!("  ");
    let resp = client
        .send("POST", "/api/checkout/payment-intent", Some(body))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["emptyCart"].as_bool(), Some(true));
    assert_eq!(resp.body["missing"], json!(["firstName", "companyName"]));
    assert_eq!(resp.body["invalid"], json!(["nip"]));
}

#[tokio::test(start_paused = true)]
async fn pending_payment_reload() {
    let mut client = UtWebClient::new();
    let uri = "/api/checkout/payment-intent/pi_ut_succeeded/pending";
    let resp = client.send("POST", uri, None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["next"].as_str(), Some("reload"));
    let expect = "https://shop.example.com/platnosc?payment_intent=pi_ut_succeeded&redirect_status=succeeded";
    assert_eq!(resp.body["redirectUrl"].as_str(), Some(expect));
    let uri = "/api/checkout/payment-intent/pi_ut_requires_pm/pending";
    let resp = client.send("POST", uri, None).await;
    assert_eq!(resp.body, json!({"status": "requires_payment_method", "next": "back-to-cart"}));
}

#[tokio::test]
async fn confirm_order() {
    let mut client = UtWebClient::new();
    ut_fill_cart(&mut client, &[("p1", 2, 100.0)]).await;
    let body = json!({"paymentIntentId": "pi_ut_processing", "form": ut_form_body("pickup", None)});
    let resp = client.send("POST", "/api/checkout/confirm", Some(body)).await;
    assert_eq!(resp.status, StatusCode::CONFLICT);
    assert_eq!(resp.body, json!({"status": "processing"}));
    // paid by another session
    let body = json!({"paymentIntentId": "pi_ut_succeeded", "form": ut_form_body("pickup", None)});
    let resp = client.send("POST", "/api/checkout/confirm", Some(body)).await;
    assert_eq!(resp.status, StatusCode::CONFLICT);
    assert_eq!(resp.body, json!({"status": "succeeded", "reason": "session-mismatch"}));

    // the mock processor completes payments of this receipt email at once
    let mut form = ut_form_body("pickup", None);
    form["email"] = json!("paid@example.com");
    let resp = client
        .send("POST", "/api/checkout/payment-intent", Some(form.clone()))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let intent_id = resp.body["paymentIntentId"].as_str().unwrap().to_string();

    let body = json!({"paymentIntentId": intent_id, "form": form});
    let resp = client.send("POST", "/api/checkout/confirm", Some(body.clone())).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["status"].as_str(), Some("succeeded"));
    assert_eq!(resp.body["orderId"].as_str().unwrap().len(), 32);
    assert_eq!(resp.body["breakdown"]["total"].as_f64(), Some(200.0));
    assert_eq!(resp.body["items"][0]["quantity"].as_u64(), Some(2));

    let resp = client.send("GET", "/api/cart", None).await;
    assert_eq!(resp.body, json!([]));
    let rows = client.shr_state.spreadsheet().fetch_rows().await.unwrap();
    assert_eq!(rows.len(), 5);

    // the same payment cannot be turned into another order
    ut_fill_cart(&mut client, &[("p1", 2, 100.0)]).await;
    let resp = client.send("POST", "/api/checkout/confirm", Some(body)).await;
    assert_eq!(resp.status, StatusCode::CONFLICT);
    assert_eq!(resp.body, json!({"status": "succeeded", "reason": "already-confirmed"}));
    let rows = client.shr_state.spreadsheet().fetch_rows().await.unwrap();
    assert_eq!(rows.len(), 5);
}
