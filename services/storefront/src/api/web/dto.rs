use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::model::{
    CartItemModel, CheckoutCostModel, CheckoutFormError, CheckoutFormModel, ContainerLineModel,
    ContainerModel, CouponDiscountModel, CustomerKind, DeliveryStageModel, MemberContainerModel,
    ProductModel, ShippingOptionModel,
};

#[derive(Serialize)]
pub struct SessionIdRespDto {
    #[serde(rename = "sessionID")]
    pub session_id: String,
}

#[derive(Serialize)]
pub struct ErrorMessageDto {
    pub message: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CartItemDto {
    pub id: String,
    #[serde(default)]
    pub variant: Option<String>,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
}

#[derive(Deserialize)]
pub struct CartQuantityReqDto {
    pub quantity: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub discounted_price: Decimal,
    pub in_stock: bool,
    pub quantity_in_stock: u32,
    pub main_image: String,
    pub media: Vec<String>,
    pub category_id: String,
    pub sku: String,
    pub ean: String,
}

#[derive(Deserialize)]
pub struct ProductBatchReqDto {
    pub ids: Vec<String>,
}

#[derive(Serialize)]
pub struct ShippingOptionDto {
    pub code: String,
    pub label: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

#[derive(Deserialize)]
pub struct CouponValidateReqDto {
    pub code: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponValidateRespDto {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_type: Option<&'static str>,
    // minor currency unit for fixed discount, 0 - 100 for percentage
    pub amount: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutQuoteReqDto {
    pub shipping_option: String,
    #[serde(default)]
    pub coupon_code: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct CostBreakdownDto {
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub shipping: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub currency: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CustomerKindDto {
    #[default]
    Individual,
    Company,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutFormDto {
    #[serde(default)]
    pub customer_type: CustomerKindDto,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub nip: Option<String>,
    #[serde(default)]
    pub shipping_option: String,
    #[serde(default)]
    pub coupon_code: Option<String>,
    #[serde(default)]
    pub terms_accepted: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutValidationErrorDto {
    pub message: String,
    pub missing: Vec<&'static str>,
    pub invalid: Vec<&'static str>,
    pub empty_cart: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentCreateRespDto {
    pub payment_intent_id: String,
    pub client_secret: String,
    pub breakdown: CostBreakdownDto,
}

#[derive(Serialize)]
pub struct PaymentIntentStatusRespDto {
    pub id: String,
    pub status: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPendingRespDto {
    pub status: String,
    pub next: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmCheckoutReqDto {
    pub payment_intent_id: String,
    pub form: CheckoutFormDto,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmCheckoutRespDto {
    pub status: String,
    pub order_id: String,
    pub breakdown: CostBreakdownDto,
    pub items: Vec<CartItemDto>,
}

#[derive(Serialize)]
pub struct PaymentStatusOnlyDto {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

#[derive(Serialize, Debug, Clone)]
pub struct DeliveryStatusDto {
    pub waypoint: &'static str,
    pub label: &'static str,
    pub x: u8,
    pub y: u8,
    pub progress: u8,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerLineDto {
    pub order_id: String,
    pub product_name: String,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerDto {
    pub id: String,
    pub order_ids: Vec<String>,
    pub customers: Vec<String>,
    pub departure_date: Option<NaiveDate>,
    pub lines: Vec<ContainerLineDto>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub currency: String,
    pub delivery: DeliveryStatusDto,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MemberIdentityDto {
    #[serde(default)]
    pub member_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

// the automation platform wraps the member fields in `data`, direct callers
// send them at top level
#[derive(Deserialize)]
pub struct ContainerWebhookReqDto {
    #[serde(default)]
    pub data: Option<MemberIdentityDto>,
    #[serde(flatten)]
    pub toplvl: MemberIdentityDto,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberContainerDto {
    pub id: String,
    pub container_number: String,
    pub departure_date: Option<NaiveDate>,
    pub product_ids: Vec<String>,
    pub delivery: DeliveryStatusDto,
}

#[derive(Serialize)]
pub struct MemberContainerRespDto {
    pub containers: Vec<MemberContainerDto>,
    pub products: HashMap<String, ProductDto>,
    pub total: usize,
}

impl From<CartItemDto> for CartItemModel {
    fn from(value: CartItemDto) -> Self {
        let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());
        Self {
            id: value.id,
            variant: non_empty(value.variant),
            quantity: value.quantity,
            price: value.price,
            name: non_empty(value.name),
            image: non_empty(value.image),
            sku: non_empty(value.sku),
        }
    }
}
impl From<&CartItemModel> for CartItemDto {
    fn from(value: &CartItemModel) -> Self {
        Self {
            id: value.id.clone(),
            variant: value.variant.clone(),
            quantity: value.quantity,
            price: value.price,
            name: value.name.clone(),
            image: value.image.clone(),
            sku: value.sku.clone(),
        }
    }
}

impl From<ProductModel> for ProductDto {
    fn from(value: ProductModel) -> Self {
        Self {
            id: value.id,
            name: value.name,
            description: value.description,
            price: value.price,
            discounted_price: value.discounted_price,
            in_stock: value.in_stock,
            quantity_in_stock: value.quantity_in_stock,
            main_image: value.main_image,
            media: value.media,
            category_id: value.category_id,
            sku: value.sku,
            ean: value.ean,
        }
    }
}

impl From<ShippingOptionModel> for ShippingOptionDto {
    fn from(value: ShippingOptionModel) -> Self {
        Self {
            code: value.code,
            label: value.label,
            price: value.price,
        }
    }
}

impl From<&CouponDiscountModel> for CouponValidateRespDto {
    fn from(value: &CouponDiscountModel) -> Self {
        Self {
            is_valid: value.is_valid(),
            discount_type: value.discount_type(),
            amount: value.raw_amount(),
        }
    }
}

impl From<(CheckoutCostModel, &str)> for CostBreakdownDto {
    fn from(value: (CheckoutCostModel, &str)) -> Self {
        let (m, currency) = value;
        Self {
            subtotal: m.subtotal,
            tax: m.tax,
            shipping: m.shipping,
            discount: m.discount,
            total: m.total,
            currency: currency.to_string(),
        }
    }
}

impl From<CheckoutFormDto> for CheckoutFormModel {
    fn from(value: CheckoutFormDto) -> Self {
        let customer_kind = match value.customer_type {
            CustomerKindDto::Individual => CustomerKind::Individual,
            CustomerKindDto::Company => CustomerKind::Company,
        };
        Self {
            customer_kind,
            first_name: value.first_name,
            last_name: value.last_name,
            email: value.email,
            phone: value.phone,
            street: value.street,
            city: value.city,
            postal_code: value.postal_code,
            company_name: value.company_name,
            nip: value.nip,
            shipping_option: value.shipping_option,
            coupon_code: value.coupon_code,
            terms_accepted: value.terms_accepted,
        }
    }
}

impl From<CheckoutFormError> for CheckoutValidationErrorDto {
    fn from(value: CheckoutFormError) -> Self {
        Self {
            message: "Validation failed".to_string(),
            missing: value.missing,
            invalid: value.invalid,
            empty_cart: value.empty_cart,
        }
    }
}

impl From<DeliveryStageModel> for DeliveryStatusDto {
    fn from(value: DeliveryStageModel) -> Self {
        Self {
            waypoint: value.waypoint,
            label: value.label,
            x: value.position.0,
            y: value.position.1,
            progress: value.progress,
        }
    }
}

impl From<ContainerLineModel> for ContainerLineDto {
    fn from(value: ContainerLineModel) -> Self {
        Self {
            order_id: value.order_id,
            product_name: value.product_name,
            quantity: value.quantity,
            unit_price: value.unit_price,
            total: value.total,
        }
    }
}

impl From<ContainerModel> for ContainerDto {
    fn from(value: ContainerModel) -> Self {
        Self {
            id: value.id,
            order_ids: value.order_ids,
            customers: value.customers,
            departure_date: value.departure,
            lines: value.lines.into_iter().map(ContainerLineDto::from).collect(),
            total_amount: value.total_amount,
            currency: value.currency,
            delivery: value.delivery.into(),
        }
    }
}

impl From<MemberContainerModel> for MemberContainerDto {
    fn from(value: MemberContainerModel) -> Self {
        Self {
            id: value.id,
            container_number: value.number,
            departure_date: value.departure,
            product_ids: value.product_ids,
            delivery: value.delivery.into(),
        }
    }
}

impl ContainerWebhookReqDto {
    pub fn into_identity(self) -> crate::model::MemberIdentity {
        let nested = self.data.unwrap_or_default();
        crate::model::MemberIdentity {
            member_id: nested.member_id.or(self.toplvl.member_id),
            email: nested.email.or(self.toplvl.email),
        }
    }
}
