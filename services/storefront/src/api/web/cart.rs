use axum::debug_handler;
use axum::extract::{Json as ExtractJson, Path as ExtractPath, State as ExtractState};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use chrono::Utc;

use storefront_common::logging::{app_log_event, AppLogLevel};

use super::dto::{CartItemDto, CartQuantityReqDto};
use super::{json_header_map, message_body, serialize_body, server_error_body};
use crate::constant::HTTP_HEADER_CART_VERSION;
use crate::model::CartModel;
use crate::repository::app_repo_cart;
use crate::session::AppSession;
use crate::usecase::{
    CartMutation, ModifyCartUsKsResult, ModifyCartUseCase, RetrieveCartUsKsResult,
    RetrieveCartUseCase,
};
use crate::AppSharedState;

type CartRespType = (StatusCode, HeaderMap, String);

fn cart_response(appstate: &AppSharedState, status: StatusCode, cart: &CartModel) -> CartRespType {
    let logctx = appstate.log_context();
    let items = cart.items.iter().map(CartItemDto::from).collect::<Vec<_>>();
    let (status, body) = serialize_body(status, &items, &logctx);
    let mut hdr_map = json_header_map();
    hdr_map.insert(HTTP_HEADER_CART_VERSION, HeaderValue::from(cart.version));
    (status, hdr_map, body)
}

fn server_error() -> CartRespType {
    let status = StatusCode::INTERNAL_SERVER_ERROR;
    (status, json_header_map(), server_error_body())
}

async fn modify_cart(appstate: AppSharedState, session: AppSession, op: CartMutation) -> CartRespType {
    let logctx = appstate.log_context();
    let repo = match app_repo_cart(appstate.datastore()).await {
        Ok(v) => v,
        Err(e) => {
            app_log_event!(logctx, AppLogLevel::ERROR, "{}", e);
            return server_error();
        }
    };
    let status_ok = match &op {
        CartMutation::AddItem(_) => StatusCode::CREATED,
        _others => StatusCode::OK,
    };
    let uc = ModifyCartUseCase {
        repo,
        logctx: logctx.clone(),
        ttl_secs: appstate.session_keys().ttl_secs(),
    };
    match uc.execute(session.id.as_str(), op, Utc::now()).await {
        ModifyCartUsKsResult::Success(cart) => cart_response(&appstate, status_ok, &cart),
        ModifyCartUsKsResult::ItemNotFound => {
            let body = message_body("Item not found");
            (StatusCode::NOT_FOUND, json_header_map(), body)
        }
        ModifyCartUsKsResult::ServerError(e) => {
            app_log_event!(logctx, AppLogLevel::ERROR, "{}", e);
            server_error()
        }
    }
} // end of fn modify_cart

#[debug_handler(state=AppSharedState)]
pub(super) async fn retrieve(
    session: AppSession,
    ExtractState(appstate): ExtractState<AppSharedState>,
) -> impl IntoResponse {
    let logctx = appstate.log_context();
    let repo = match app_repo_cart(appstate.datastore()).await {
        Ok(v) => v,
        Err(e) => {
            app_log_event!(logctx, AppLogLevel::ERROR, "{}", e);
            return server_error();
        }
    };
    let uc = RetrieveCartUseCase {
        repo,
        logctx: logctx.clone(),
        ttl_secs: appstate.session_keys().ttl_secs(),
    };
    match uc.execute(session.id.as_str(), Utc::now()).await {
        RetrieveCartUsKsResult::Success(cart) => cart_response(&appstate, StatusCode::OK, &cart),
        RetrieveCartUsKsResult::ServerError(e) => {
            app_log_event!(logctx, AppLogLevel::ERROR, "{}", e);
            server_error()
        }
    }
}

#[debug_handler(state=AppSharedState)]
pub(super) async fn add_item(
    session: AppSession,
    ExtractState(appstate): ExtractState<AppSharedState>,
    ExtractJson(req_body): ExtractJson<CartItemDto>,
) -> impl IntoResponse {
    let op = CartMutation::AddItem(req_body.into());
    modify_cart(appstate, session, op).await
}

#[debug_handler(state=AppSharedState)]
pub(super) async fn update_quantity(
    ExtractPath(item_id): ExtractPath<String>,
    session: AppSession,
    ExtractState(appstate): ExtractState<AppSharedState>,
    ExtractJson(req_body): ExtractJson<CartQuantityReqDto>,
) -> impl IntoResponse {
    let op = CartMutation::UpdateQuantity {
        item_id,
        quantity: req_body.quantity,
    };
    modify_cart(appstate, session, op).await
}

#[debug_handler(state=AppSharedState)]
pub(super) async fn remove_item(
    ExtractPath(item_id): ExtractPath<String>,
    session: AppSession,
    ExtractState(appstate): ExtractState<AppSharedState>,
) -> impl IntoResponse {
    modify_cart(appstate, session, CartMutation::RemoveItem(item_id)).await
}

#[debug_handler(state=AppSharedState)]
pub(super) async fn clear(
    session: AppSession,
    ExtractState(appstate): ExtractState<AppSharedState>,
) -> impl IntoResponse {
    modify_cart(appstate, session, CartMutation::Clear).await
}
