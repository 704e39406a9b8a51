use chrono::{DateTime, Local, TimeZone, Utc};

use storefront::model::CouponDiscountModel;
use storefront::usecase::{
    CheckoutQuoteUsKsResult, CheckoutQuoteUseCase, CreatePaymentIntentUsKsResult,
    CreatePaymentIntentUseCase, ShippingOptionsUseCase, ValidateCouponUseCase,
};
use storefront::AppSharedState;

use super::{ut_cart_repo, ut_checkout_form, ut_fill_cart, ut_session_ttl};
use crate::model::ut_decimal;
use crate::ut_default_share_state;

async fn ut_quote(
    shr_state: &AppSharedState,
    session_id: &str,
    shipping: &str,
    coupon: Option<&str>,
) -> CheckoutQuoteUsKsResult {
    let uc = CheckoutQuoteUseCase {
        repo: ut_cart_repo(shr_state).await,
        checkout: shr_state.config().api_server.checkout.clone(),
        logctx: shr_state.log_context(),
        ttl_secs: ut_session_ttl(shr_state),
    };
    uc.execute(session_id, shipping, coupon, Utc::now()).await
}

fn ut_local_time(y: i32, m: u32, d: u32, hr: u32, min: u32) -> DateTime<Utc> {
    Local
        .with_ymd_and_hms(y, m, d, hr, min, 0)
        .single()
        .unwrap()
        .with_timezone(&Utc)
}

#[test]
fn list_shipping_options() {
    let shr_state = ut_default_share_state();
    let uc = ShippingOptionsUseCase {
        checkout: shr_state.config().api_server.checkout.clone(),
    };
    let opts = uc.execute().unwrap();
    assert_eq!(opts.len(), 3);
    assert_eq!(opts[0].code.as_str(), "dpd");
    assert_eq!(opts[0].price, ut_decimal("19.99"));
    assert!(opts[1].price.is_zero());
    assert_eq!(opts[2].price, ut_decimal("14.50"));
}

#[test]
fn validate_coupon_codes() {
    let shr_state = ut_default_share_state();
    let now = ut_local_time(2026, 10, 1, 12, 0);
    let cases = [
        ("RABAT10", CouponDiscountModel::Percentage(10)),
        (" rabat10 ", CouponDiscountModel::Percentage(10)),
        ("MINUS50", CouponDiscountModel::Fixed { minor_units: 5000 }),
        ("OLD5", CouponDiscountModel::Invalid),
        ("NOPE", CouponDiscountModel::Invalid),
        ("", CouponDiscountModel::Invalid),
    ];
    for (code, expect) in cases {
        let uc = ValidateCouponUseCase {
            checkout: shr_state.config().api_server.checkout.clone(),
        };
        let actual = uc.execute(code, now);
        assert_eq!(actual, expect, "code: {code}");
    }
}

#[tokio::test]
async fn quote_with_coupon() {
    let shr_state = ut_default_share_state();
    ut_fill_cart(&shr_state, "ut-sess-1", &[("p1", 2, "100")], Utc::now()).await;
    let result = ut_quote(&shr_state, "ut-sess-1", "dpd", Some("RABAT10")).await;
    let cost = match result {
        CheckoutQuoteUsKsResult::Success(c) => c,
        _others => panic!("unexpected result"),
    };
    assert_eq!(cost.subtotal, ut_decimal("200"));
    assert_eq!(cost.shipping, ut_decimal("19.99"));
    assert_eq!(cost.discount, ut_decimal("22.00"));
    assert_eq!(cost.tax, ut_decimal("46.00"));
    assert_eq!(cost.total, ut_decimal("197.99"));
    assert_eq!(cost.total_minor_units(), 19799);
}

#[tokio::test]
async fn quote_discount_exceeds_total() {
    let shr_state = ut_default_share_state();
    ut_fill_cart(&shr_state, "ut-sess-1", &[("p9", 1, "20")], Utc::now()).await;
    let result = ut_quote(&shr_state, "ut-sess-1", "pickup", Some("MINUS50")).await;
    if let CheckoutQuoteUsKsResult::Success(cost) = result {
        assert_eq!(cost.discount, ut_decimal("50"));
        assert!(cost.total.is_zero());
    } else {
        panic!("unexpected result");
    }
    // expired coupon is ignored
    let result = ut_quote(&shr_state, "ut-sess-1", "pickup", Some("OLD5")).await;
    if let CheckoutQuoteUsKsResult::Success(cost) = result {
        assert!(cost.discount.is_zero());
        assert_eq!(cost.total, ut_decimal("20"));
    } else {
        panic!("unexpected result");
    }
}

#[tokio::test]
async fn quote_unknown_shipping() {
    let shr_state = ut_default_share_state();
    ut_fill_cart(&shr_state, "ut-sess-1", &[("p1", 1, "100")], Utc::now()).await;
    let result = ut_quote(&shr_state, "ut-sess-1", "rocket", None).await;
    if let CheckoutQuoteUsKsResult::Invalid(e) = result {
        assert_eq!(e.invalid, vec!["shippingOption"]);
        assert!(!e.empty_cart);
    } else {
        panic!("unexpected result");
    }
}

// coupon expiry is decided by the local calendar date in every step of the
// checkout, also around midnight
#[tokio::test]
async fn coupon_expiry_consistent_across_steps() {
    let shr_state = ut_default_share_state();
    let cases = [
        (ut_local_time(2099, 12, 31, 23, 30), true),
        (ut_local_time(2100, 1, 1, 0, 30), false),
    ];
    for (idx, (now, expect_valid)) in cases.into_iter().enumerate() {
        let session_id = format!("ut-sess-{idx}");
        ut_fill_cart(&shr_state, session_id.as_str(), &[("p1", 1, "100")], now).await;
        let expect_discount = if expect_valid { "50" } else { "0" };

        let uc = ValidateCouponUseCase {
            checkout: shr_state.config().api_server.checkout.clone(),
        };
        assert_eq!(uc.execute("MINUS50", now).is_valid(), expect_valid);

        let uc = CheckoutQuoteUseCase {
            repo: ut_cart_repo(&shr_state).await,
            checkout: shr_state.config().api_server.checkout.clone(),
            logctx: shr_state.log_context(),
            ttl_secs: ut_session_ttl(&shr_state),
        };
        let result = uc
            .execute(session_id.as_str(), "pickup", Some("MINUS50"), now)
            .await;
        if let CheckoutQuoteUsKsResult::Success(cost) = result {
            assert_eq!(cost.discount, ut_decimal(expect_discount));
        } else {
            panic!("unexpected result");
        }

        let uc = CreatePaymentIntentUseCase {
            repo: ut_cart_repo(&shr_state).await,
            processor: shr_state.processor(),
            checkout: shr_state.config().api_server.checkout.clone(),
            logctx: shr_state.log_context(),
            ttl_secs: ut_session_ttl(&shr_state),
        };
        let form = ut_checkout_form("pickup", Some("MINUS50"));
        let result = uc.execute(session_id.as_str(), form, now).await;
        if let CreatePaymentIntentUsKsResult::Success { cost, intent } = result {
            assert_eq!(cost.discount, ut_decimal(expect_discount));
            assert_eq!(intent.metadata.contains_key("coupon_code"), expect_valid);
        } else {
            panic!("unexpected result");
        }
    }
}
