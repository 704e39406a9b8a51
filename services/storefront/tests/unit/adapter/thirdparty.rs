use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;

use storefront::adapter::thirdparty::{
    valid_intent_id, AppProcessorErrorReason, AppThirdPartyContext, PaymentIntentCreateArgs,
};
use storefront::error::AppError;
use storefront::model::PaymentIntentStatus;
use storefront_common::confidentiality::AbstractConfidentiality;
use storefront_common::config::App3rdPartyCfg;
use storefront_common::error::AppErrorCode;
use storefront_common::logging::AppLogContext;

use crate::{ut_default_share_state, ut_setup_config, MockConfidential};

fn ut_intent_args(idempotency_key: &str, amount_minor: i64) -> PaymentIntentCreateArgs {
    PaymentIntentCreateArgs {
        amount_minor,
        currency: "pln".to_string(),
        receipt_email: "jan@example.com".to_string(),
        idempotency_key: idempotency_key.to_string(),
        metadata: HashMap::from([("session_id".to_string(), "ut-sess".to_string())]),
    }
}

#[tokio::test]
async fn mock_content_query() {
    let shr_state = ut_default_share_state();
    let content = shr_state.content_api();
    let items = content.query_items("Products").await.unwrap();
    assert_eq!(items.len(), 3);
    let items = content.query_items("Kontenery").await.unwrap();
    assert_eq!(items.len(), 3);
    let error = content.query_items("Zamówienia").await.err().unwrap();
    assert!(matches!(error.reason, AppProcessorErrorReason::RemoteStatus(404)));
}

#[tokio::test]
async fn mock_content_get_item() {
    let shr_state = ut_default_share_state();
    let content = shr_state.content_api();
    let found = content.get_item("Products", "p2").await.unwrap();
    let found = found.unwrap();
    assert_eq!(found.get("title").unwrap().as_str(), Some("Stół rozkładany"));
    let found = content.get_item("Products", "p404").await.unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn mock_processor_create_idempotent() {
    let shr_state = ut_default_share_state();
    let processor = shr_state.processor();
    let m0 = processor
        .create_intent(ut_intent_args("ut-sess-1-13998", 13998))
        .await
        .unwrap();
    assert_eq!(m0.status, PaymentIntentStatus::RequiresPaymentMethod);
    assert_eq!(m0.amount, 13998);
    assert!(m0.client_secret.as_deref().unwrap().starts_with(m0.id.as_str()));
    let m1 = processor
        .create_intent(ut_intent_args("ut-sess-1-13998", 13998))
        .await
        .unwrap();
    assert_eq!(m0.id, m1.id);
    let m2 = processor
        .create_intent(ut_intent_args("ut-sess-2-13998", 13998))
        .await
        .unwrap();
    assert_ne!(m0.id, m2.id);
    let saved = processor.retrieve_intent(m2.id.as_str()).await.unwrap();
    assert_eq!(saved.amount, 13998);
}

#[tokio::test]
async fn mock_processor_reuse_key_other_params() {
    let shr_state = ut_default_share_state();
    let processor = shr_state.processor();
    let args0 = ut_intent_args("ut-sess-1-7-abc", 13998);
    let mut args1 = ut_intent_args("ut-sess-1-7-abc", 13998);
    args1.receipt_email = "jan.k@example.org".to_string();
    assert_ne!(args0.fingerprint(), args1.fingerprint());
    assert_eq!(args0.fingerprint(), ut_intent_args("other-key", 13998).fingerprint());

    let m0 = processor.create_intent(args0).await.unwrap();
    let error = processor.create_intent(args1).await.err().unwrap();
    assert!(matches!(error.reason, AppProcessorErrorReason::RemoteStatus(400)));
    // the intent created with the key is untouched
    let saved = processor.retrieve_intent(m0.id.as_str()).await.unwrap();
    assert_eq!(saved.session_id(), Some("ut-sess"));
}

#[tokio::test]
async fn mock_processor_status_by_email() {
    let shr_state = ut_default_share_state();
    let processor = shr_state.processor();
    let mut args = ut_intent_args("ut-sess-9-1-abc", 4500);
    args.receipt_email = "paid@example.com".to_string();
    let m = processor.create_intent(args).await.unwrap();
    assert_eq!(m.status, PaymentIntentStatus::Succeeded);
    let m = processor.retrieve_intent("pi_ut_succeeded").await.unwrap();
    assert_eq!(m.amount, 132435);
    assert_eq!(m.session_id(), Some("ut-sess-1"));
}

#[test]
fn intent_id_format() {
    assert!(valid_intent_id("pi_3MtwBwLkdIwHu7ix28a3tqPa"));
    assert!(valid_intent_id("pi_mock_0001"));
    for bad in ["", "pi_1/refunds", "pi_1?expand=x", "../pi_1", "pi 1", "pi_ł"] {
        assert!(!valid_intent_id(bad), "id: {bad}");
    }
}

#[tokio::test]
async fn mock_processor_retrieve() {
    let shr_state = ut_default_share_state();
    let processor = shr_state.processor();
    let m = processor.retrieve_intent("pi_ut_processing").await.unwrap();
    assert_eq!(m.status, PaymentIntentStatus::Processing);
    let error = processor.retrieve_intent("pi_ut_absent").await.err().unwrap();
    assert!(matches!(error.reason, AppProcessorErrorReason::NotFound));
    let error = AppError::from(error);
    assert_eq!(error.code, AppErrorCode::RemoteResourceNotFound);
}

#[tokio::test]
async fn mock_spreadsheet_fetch_append() {
    let shr_state = ut_default_share_state();
    let sheet = shr_state.spreadsheet();
    let rows = sheet.fetch_rows().await.unwrap();
    assert_eq!(rows.len(), 4);
    // numeric cell turned to plain text
    let (_key, cells) = &rows[1];
    assert_eq!(cells.get("quantity").map(String::as_str), Some("1"));
    let new_row = HashMap::from([
        ("containerId".to_string(), String::new()),
        ("orderId".to_string(), "ZAM-9".to_string()),
    ]);
    let num = sheet.append_rows(vec![new_row]).await.unwrap();
    assert_eq!(num, 1);
    let rows = sheet.fetch_rows().await.unwrap();
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[4].1["orderId"].as_str(), "ZAM-9");
}

#[tokio::test]
async fn mock_automation_hook() {
    let shr_state = ut_default_share_state();
    let hook = shr_state.automation_hook();
    let result = hook.relay(json!({"orderId": "ut-order-1"})).await;
    assert!(result.is_ok());
}

#[test]
fn context_missing_service() {
    let cfg = ut_setup_config("app_config_ok.json");
    let logctx = AppLogContext::new(&cfg.basepath, &cfg.api_server.logging).unwrap();
    let cfdntl: Box<dyn AbstractConfidentiality> = Box::new(MockConfidential {});
    let partial = cfg
        .api_server
        .third_parties
        .iter()
        .filter(|c| c.name() != "spreadsheet")
        .cloned()
        .collect::<Vec<Arc<App3rdPartyCfg>>>();
    let result = AppThirdPartyContext::new(
        &partial,
        &cfg.basepath,
        Arc::new(cfdntl),
        Arc::new(logctx),
    );
    let error = result.err().unwrap();
    assert!(matches!(error.reason, AppProcessorErrorReason::InvalidConfig));
}

#[test]
fn context_mock_fixture_missing() {
    let mut cfg = ut_setup_config("app_config_ok.json");
    cfg.basepath.service += "no-such-dir/";
    let logctx = AppLogContext::new(&cfg.basepath, &cfg.api_server.logging).unwrap();
    let cfdntl: Box<dyn AbstractConfidentiality> = Box::new(MockConfidential {});
    let result = AppThirdPartyContext::new(
        &cfg.api_server.third_parties,
        &cfg.basepath,
        Arc::new(cfdntl),
        Arc::new(logctx),
    );
    let error = result.err().unwrap();
    assert!(matches!(error.reason, AppProcessorErrorReason::MockData(_)));
}
