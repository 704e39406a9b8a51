use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;

use storefront_common::config::{AppCouponCfg, AppCouponKindCfg, AppShippingOptionCfg};
use storefront_common::error::AppErrorCode;

use super::{money_round, parse_money_text, CartItemModel};
use crate::constant::checkout::{EMAIL_PATTERN, NIP_PATTERN};
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq)]
pub struct ShippingOptionModel {
    pub code: String,
    pub label: String,
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CouponDiscountModel {
    Invalid,
    Fixed { minor_units: u32 },
    Percentage(u32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutCostModel {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CustomerKind {
    Individual,
    Company,
}

#[derive(Debug, Clone)]
pub struct CheckoutFormModel {
    pub customer_kind: CustomerKind,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub company_name: Option<String>,
    pub nip: Option<String>,
    pub shipping_option: String,
    pub coupon_code: Option<String>,
    pub terms_accepted: bool,
}

#[derive(Debug, Default, PartialEq)]
pub struct CheckoutFormError {
    pub missing: Vec<&'static str>,
    pub invalid: Vec<&'static str>,
    pub empty_cart: bool,
}

impl ShippingOptionModel {
    pub fn try_from_cfg(cfg: &AppShippingOptionCfg) -> Result<Self, AppError> {
        let price = cfg
            .price
            .or_else(|| parse_money_text(cfg.label.as_str()))
            .ok_or(AppError {
                code: AppErrorCode::InvalidInput,
                detail: Some(format!("shipping-price-missing:{}", cfg.code)),
            })?;
        Ok(Self {
            code: cfg.code.clone(),
            label: cfg.label.clone(),
            price: money_round(price),
        })
    }

    pub fn try_from_cfgs(cfgs: &[AppShippingOptionCfg]) -> Result<Vec<Self>, AppError> {
        cfgs.iter().map(Self::try_from_cfg).collect()
    }
}

impl CouponDiscountModel {
    /// look up the code in the coupon source, codes are compared
    /// case-insensitively, a coupon is still usable on its expiry date
    pub fn validate(code: &str, source: &[AppCouponCfg], today: NaiveDate) -> Self {
        let code = code.trim();
        if code.is_empty() {
            return Self::Invalid;
        }
        let found = source
            .iter()
            .find(|c| c.code.eq_ignore_ascii_case(code));
        match found {
            Some(c) if c.expiry.map(|exp| today <= exp).unwrap_or(true) => match c.kind {
                AppCouponKindCfg::Fixed => Self::Fixed {
                    minor_units: c.amount,
                },
                AppCouponKindCfg::Percentage => Self::Percentage(c.amount.min(100)),
            },
            _others => Self::Invalid,
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, Self::Invalid)
    }

    pub fn discount_type(&self) -> Option<&'static str> {
        match self {
            Self::Invalid => None,
            Self::Fixed { .. } => Some("fixed"),
            Self::Percentage(_) => Some("percentage"),
        }
    }

    // minor currency unit for fixed amount, percent number for percentage
    pub fn raw_amount(&self) -> u32 {
        match self {
            Self::Invalid => 0,
            Self::Fixed { minor_units } => *minor_units,
            Self::Percentage(p) => *p,
        }
    }

    /// resolve the coupon to monetary amount against the total before
    /// discount (product subtotal plus shipping)
    pub fn resolve(&self, pre_discount: Decimal) -> Decimal {
        match self {
            Self::Invalid => Decimal::ZERO,
            Self::Fixed { minor_units } => Decimal::new(*minor_units as i64, 2),
            Self::Percentage(p) => pre_discount * Decimal::from(*p) / Decimal::ONE_HUNDRED,
        }
    }
} // end of impl CouponDiscountModel

impl CheckoutCostModel {
    /// all amounts are in currency units, the coupon amount is already
    /// resolved, the tax is informational and already included in the prices
    pub fn from_parts(
        subtotal: Decimal,
        shipping: Decimal,
        coupon_amount: Decimal,
        tax_rate: Decimal,
    ) -> Self {
        let total = (subtotal + shipping - coupon_amount).max(Decimal::ZERO);
        Self {
            subtotal: money_round(subtotal),
            tax: money_round(subtotal * tax_rate),
            shipping: money_round(shipping),
            discount: money_round(coupon_amount),
            total: money_round(total),
        }
    }

    pub fn compute(
        items: &[CartItemModel],
        shipping: &ShippingOptionModel,
        coupon: &CouponDiscountModel,
        tax_rate: Decimal,
    ) -> Self {
        let subtotal = items.iter().map(CartItemModel::line_total).sum::<Decimal>();
        let coupon_amount = coupon.resolve(subtotal + shipping.price);
        Self::from_parts(subtotal, shipping.price, coupon_amount, tax_rate)
    }

    /// grand total in minor currency unit, as required by payment processors
    pub fn total_minor_units(&self) -> i64 {
        let scaled = money_round(self.total) * Decimal::ONE_HUNDRED;
        i64::try_from(scaled.trunc()).unwrap_or(i64::MAX)
    }
} // end of impl CheckoutCostModel

fn is_blank(v: &str) -> bool {
    v.trim().is_empty()
}

fn pattern_match(pattern: &str, value: &str) -> bool {
    Regex::new(pattern)
        .map(|re| re.is_match(value.trim()))
        .unwrap_or(false)
}

impl CheckoutFormModel {
    /// gate of the form-complete step, all the checks run before any call
    /// to remote services
    pub fn validate<F>(&self, cart_empty: bool, shipping_exists: F) -> Result<(), CheckoutFormError>
    where
        F: Fn(&str) -> bool,
    {
        let mut e = CheckoutFormError {
            empty_cart: cart_empty,
            ..Default::default()
        };
        let required = [
            ("firstName", self.first_name.as_str()),
            ("lastName", self.last_name.as_str()),
            ("email", self.email.as_str()),
            ("phone", self.phone.as_str()),
            ("street", self.street.as_str()),
            ("city", self.city.as_str()),
            ("postalCode", self.postal_code.as_str()),
            ("shippingOption", self.shipping_option.as_str()),
        ];
        e.missing.extend(
            required
                .iter()
                .filter(|(_, v)| is_blank(v))
                .map(|(label, _)| *label),
        );
        if !self.terms_accepted {
            e.missing.push("termsAccepted");
        }
        if !is_blank(&self.email) && !pattern_match(EMAIL_PATTERN, &self.email) {
            e.invalid.push("email");
        }
        if !is_blank(&self.shipping_option) && !shipping_exists(self.shipping_option.as_str()) {
            e.invalid.push("shippingOption");
        }
        if self.customer_kind == CustomerKind::Company {
            let company = self.company_name.as_deref().unwrap_or("");
            if is_blank(company) {
                e.missing.push("companyName");
            }
            match self.nip.as_deref() {
                Some(n) if !is_blank(n) => {
                    if !pattern_match(NIP_PATTERN, n) {
                        e.invalid.push("nip");
                    }
                }
                _others => e.missing.push("nip"),
            }
        }
        if e.missing.is_empty() && e.invalid.is_empty() && !e.empty_cart {
            Ok(())
        } else {
            Err(e)
        }
    } // end of fn validate

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }
} // end of impl CheckoutFormModel
