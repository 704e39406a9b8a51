mod checkout;
mod container;

use std::boxed::Box;

use chrono::{DateTime, Utc};

use storefront::model::{CheckoutFormModel, CustomerKind};
use storefront::repository::{app_repo_cart, app_repo_payment_record, AbsCartRepo, AbsPaymentRecordRepo};
use storefront::usecase::{CartMutation, ModifyCartUsKsResult, ModifyCartUseCase};
use storefront::AppSharedState;

use crate::model::ut_cart_item;

pub(crate) async fn ut_cart_repo(shr_state: &AppSharedState) -> Box<dyn AbsCartRepo> {
    app_repo_cart(shr_state.datastore()).await.unwrap()
}

pub(crate) async fn ut_payment_record_repo(
    shr_state: &AppSharedState,
) -> Box<dyn AbsPaymentRecordRepo> {
    app_repo_payment_record(shr_state.datastore()).await.unwrap()
}

pub(crate) fn ut_session_ttl(shr_state: &AppSharedState) -> u32 {
    shr_state.config().api_server.session.ttl_secs
}

// items given as (product-id, quantity, unit-price)
pub(crate) async fn ut_fill_cart(
    shr_state: &AppSharedState,
    session_id: &str,
    items: &[(&str, u32, &str)],
    now: DateTime<Utc>,
) {
    for (id, qty, price) in items {
        let uc = ModifyCartUseCase {
            repo: ut_cart_repo(shr_state).await,
            logctx: shr_state.log_context(),
            ttl_secs: ut_session_ttl(shr_state),
        };
        let op = CartMutation::AddItem(ut_cart_item(id, None, *qty, price));
        let result = uc.execute(session_id, op, now).await;
        assert!(matches!(result, ModifyCartUsKsResult::Success(_)));
    }
}

pub(crate) fn ut_checkout_form(shipping: &str, coupon: Option<&str>) -> CheckoutFormModel {
    CheckoutFormModel {
        customer_kind: CustomerKind::Individual,
        first_name: "Jan".to_string(),
        last_name: "Kowalski".to_string(),
        email: " jan.kowalski@example.com ".to_string(),
        phone: "+48 600 100 200".to_string(),
        street: "ul. Długa 5".to_string(),
        city: "Gdańsk".to_string(),
        postal_code: "80-831".to_string(),
        company_name: None,
        nip: None,
        shipping_option: shipping.to_string(),
        coupon_code: coupon.map(String::from),
        terms_accepted: true,
    }
}
