mod cart;
mod checkout;
mod container;
mod payment;
mod product;

use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate, Utc};
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};

pub use cart::{CartItemModel, CartModel, CartUpdateError};
pub use checkout::{
    CheckoutCostModel, CheckoutFormError, CheckoutFormModel, CouponDiscountModel, CustomerKind,
    ShippingOptionModel,
};
pub use container::{
    aggregate_sheet_rows, ContainerLineModel, ContainerModel, DeliveryRouteModel,
    DeliveryStageModel, MemberContainerModel, MemberIdentity, SheetRowModel,
};
pub use payment::{
    PaymentFlow, PaymentFlowError, PaymentFlowEvent, PaymentFlowState, PaymentIntentModel,
    PaymentIntentStatus, PendingNextStep,
};
pub use product::{CategoryLookupModel, ProductModel};

/// calendar date of the shop, coupon expiry and delivery stages are counted
/// in days of the local time zone
pub fn local_today(now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&Local).date_naive()
}

/// round to 2 decimal places, the precision of every amount shown to
/// shoppers and sent to the payment processor
pub fn money_round(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// extract the last amount written in free text, e.g. `Kurier DPD - 19,99 zł`
/// or `1 234,50 zł` from spreadsheet cells.
///
/// Either comma or dot is taken as decimal separator when followed by at most
/// 2 digits, any other comma / dot / space is a digit group separator.
pub fn parse_money_text(raw: &str) -> Option<Decimal> {
    const SEPARATORS: &[char] = &[',', '.'];
    let re = Regex::new(r"-?\d[\d \u{00a0}.,]*").ok()?;
    let found = re.find_iter(raw).last()?.as_str();
    let compact = found
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>();
    let compact = compact.trim_end_matches(SEPARATORS);
    let normalized = match compact.rfind(SEPARATORS) {
        Some(pos) if compact.len() - pos - 1 <= 2 => {
            let (int_part, frac_part) = compact.split_at(pos);
            format!("{}.{}", int_part.replace(SEPARATORS, ""), &frac_part[1..])
        }
        _others => compact.replace(SEPARATORS, ""),
    };
    Decimal::from_str(normalized.as_str()).ok()
}
