use std::collections::HashMap;
use std::sync::Arc;

use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::routing::{delete, get, post, put, MethodRouter};
use serde::Serialize;

use storefront_common::logging::{app_log_event, AppLogContext, AppLogLevel};

use crate::constant::{api::web as WebConst, HTTP_CONTENT_TYPE_JSON};
use crate::{AppSharedState, WebApiHdlrLabel};

mod cart;
mod checkout;
mod container;
pub mod dto;
mod product;
mod session;

use dto::ErrorMessageDto;

pub type ApiRouteType = MethodRouter<AppSharedState>;
pub type ApiRouteTableType = HashMap<WebApiHdlrLabel, ApiRouteType>;

pub fn route_table() -> ApiRouteTableType {
    let data = [
        (WebConst::SESSION_ID, get(session::retrieve_id)),
        (WebConst::RETRIEVE_CART, get(cart::retrieve)),
        (WebConst::ADD_CART_ITEM, post(cart::add_item)),
        (WebConst::UPDATE_CART_ITEM, put(cart::update_quantity)),
        (WebConst::REMOVE_CART_ITEM, delete(cart::remove_item)),
        (WebConst::CLEAR_CART, delete(cart::clear)),
        (WebConst::PRODUCT_DETAIL, get(product::detail)),
        (WebConst::PRODUCT_BATCH, post(product::batch)),
        (WebConst::CATEGORY_TABLE, get(product::categories)),
        (WebConst::SHIPPING_OPTIONS, get(checkout::shipping_options)),
        (WebConst::VALIDATE_COUPON, post(checkout::validate_coupon)),
        (WebConst::CHECKOUT_QUOTE, post(checkout::quote)),
        (
            WebConst::CREATE_PAYMENT_INTENT,
            post(checkout::create_payment_intent),
        ),
        (
            WebConst::PAYMENT_INTENT_STATUS,
            get(checkout::payment_intent_status),
        ),
        (
            WebConst::PAYMENT_INTENT_PENDING,
            post(checkout::payment_intent_pending),
        ),
        (WebConst::CONFIRM_CHECKOUT, post(checkout::confirm)),
        (WebConst::CONTAINER_LIST, get(container::list)),
        (WebConst::MEMBER_CONTAINERS, post(container::member_webhook)),
    ];
    HashMap::from(data)
}

pub(super) fn json_header_map() -> HeaderMap {
    let mut hdr_map = HeaderMap::new();
    let ctype_val = HeaderValue::from_static(HTTP_CONTENT_TYPE_JSON);
    hdr_map.insert(header::CONTENT_TYPE, ctype_val);
    hdr_map
}

pub(super) fn message_body(msg: &str) -> String {
    let dto = ErrorMessageDto {
        message: msg.to_string(),
    };
    serde_json::to_string(&dto).unwrap_or_else(|_e| "{}".to_string())
}

pub(super) fn server_error_body() -> String {
    message_body("Internal server error")
}

// serialization failure of response body falls back to internal error
pub(super) fn serialize_body<T: Serialize>(
    status: StatusCode,
    body: &T,
    logctx: &Arc<AppLogContext>,
) -> (StatusCode, String) {
    match serde_json::to_string(body) {
        Ok(s) => (status, s),
        Err(e) => {
            app_log_event!(logctx, AppLogLevel::ERROR, "resp-serialize:{:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, server_error_body())
        }
    }
}
