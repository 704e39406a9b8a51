use std::boxed::Box;
use std::result::Result as DefaultResult;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};

use storefront_common::config::AppCheckoutCfg;
use storefront_common::logging::AppLogContext;

use super::manage_cart::load_active_cart;
use crate::error::AppError;
use crate::model::{
    local_today, CartModel, CheckoutCostModel, CheckoutFormError, CheckoutFormModel, CouponDiscountModel,
    ShippingOptionModel,
};
use crate::repository::AbsCartRepo;

pub struct ShippingOptionsUseCase {
    pub checkout: Arc<AppCheckoutCfg>,
}
pub struct ValidateCouponUseCase {
    pub checkout: Arc<AppCheckoutCfg>,
}
pub struct CheckoutQuoteUseCase {
    pub repo: Box<dyn AbsCartRepo>,
    pub checkout: Arc<AppCheckoutCfg>,
    pub logctx: Arc<AppLogContext>,
    pub ttl_secs: u32,
}

pub enum CheckoutQuoteUsKsResult {
    Success(CheckoutCostModel),
    Invalid(CheckoutFormError),
    ServerError(AppError),
}

// cart, shipping option and coupon resolved for one checkout attempt
pub(crate) struct CheckoutSnapshot {
    pub cart: CartModel,
    pub shipping: ShippingOptionModel,
    pub coupon: CouponDiscountModel,
    pub cost: CheckoutCostModel,
}

pub(crate) fn find_shipping(
    cfg: &AppCheckoutCfg,
    code: &str,
) -> DefaultResult<Option<ShippingOptionModel>, AppError> {
    let found = cfg.shipping.iter().find(|s| s.code == code.trim());
    match found {
        Some(c) => ShippingOptionModel::try_from_cfg(c).map(Some),
        None => Ok(None),
    }
}

impl CheckoutSnapshot {
    /// coupon is always validated again at this point, a coupon accepted
    /// earlier may have expired since
    pub(crate) fn resolve(
        cfg: &AppCheckoutCfg,
        cart: CartModel,
        shipping: ShippingOptionModel,
        coupon_code: Option<&str>,
        today: NaiveDate,
    ) -> Self {
        let coupon = coupon_code
            .map(|c| CouponDiscountModel::validate(c, &cfg.coupons, today))
            .unwrap_or(CouponDiscountModel::Invalid);
        let cost = CheckoutCostModel::compute(&cart.items, &shipping, &coupon, cfg.tax_rate);
        Self {
            cart,
            shipping,
            coupon,
            cost,
        }
    }

    /// validate the checkout form against the session cart and configured
    /// shipping options, then resolve the cost
    pub(crate) async fn load_with_form(
        repo: &dyn AbsCartRepo,
        logctx: &Arc<AppLogContext>,
        cfg: &AppCheckoutCfg,
        session_id: &str,
        form: &CheckoutFormModel,
        ttl_secs: u32,
        now: DateTime<Utc>,
    ) -> DefaultResult<DefaultResult<Self, CheckoutFormError>, AppError> {
        let cart = load_active_cart(repo, logctx, session_id, ttl_secs, now).await?;
        let shipping_exists = |code: &str| cfg.shipping.iter().any(|s| s.code == code.trim());
        if let Err(e) = form.validate(cart.is_empty(), shipping_exists) {
            return Ok(Err(e));
        }
        let shipping = match find_shipping(cfg, form.shipping_option.as_str())? {
            Some(s) => s,
            None => {
                let e = CheckoutFormError {
                    invalid: vec!["shippingOption"],
                    ..Default::default()
                };
                return Ok(Err(e));
            }
        };
        let today = local_today(now);
        let obj = Self::resolve(cfg, cart, shipping, form.coupon_code.as_deref(), today);
        Ok(Ok(obj))
    }
} // end of impl CheckoutSnapshot

impl ShippingOptionsUseCase {
    pub fn execute(self) -> DefaultResult<Vec<ShippingOptionModel>, AppError> {
        ShippingOptionModel::try_from_cfgs(&self.checkout.shipping)
    }
}

impl ValidateCouponUseCase {
    pub fn execute(self, code: &str, now: DateTime<Utc>) -> CouponDiscountModel {
        CouponDiscountModel::validate(code, &self.checkout.coupons, local_today(now))
    }
}

impl CheckoutQuoteUseCase {
    pub async fn execute(
        self,
        session_id: &str,
        shipping_code: &str,
        coupon_code: Option<&str>,
        now: DateTime<Utc>,
    ) -> CheckoutQuoteUsKsResult {
        let repo = self.repo.as_ref();
        let cart =
            match load_active_cart(repo, &self.logctx, session_id, self.ttl_secs, now).await {
                Ok(c) => c,
                Err(e) => return CheckoutQuoteUsKsResult::ServerError(e),
            };
        let shipping = match find_shipping(&self.checkout, shipping_code) {
            Ok(Some(s)) => s,
            Ok(None) => {
                let e = CheckoutFormError {
                    invalid: vec!["shippingOption"],
                    ..Default::default()
                };
                return CheckoutQuoteUsKsResult::Invalid(e);
            }
            Err(e) => return CheckoutQuoteUsKsResult::ServerError(e),
        };
        let snapshot =
            CheckoutSnapshot::resolve(&self.checkout, cart, shipping, coupon_code, local_today(now));
        CheckoutQuoteUsKsResult::Success(snapshot.cost)
    }
}
