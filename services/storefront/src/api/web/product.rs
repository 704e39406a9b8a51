use axum::debug_handler;
use axum::extract::{Json as ExtractJson, Path as ExtractPath, State as ExtractState};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use storefront_common::logging::{app_log_event, AppLogLevel};

use super::dto::{ProductBatchReqDto, ProductDto};
use super::{json_header_map, message_body, serialize_body, server_error_body};
use crate::usecase::{
    CategoryLookupUseCase, ProductBatchUsKsResult, ProductBatchUseCase, ProductDetailUsKsResult,
    ProductDetailUseCase,
};
use crate::AppSharedState;

#[debug_handler(state=AppSharedState)]
pub(super) async fn detail(
    ExtractPath(product_id): ExtractPath<String>,
    ExtractState(appstate): ExtractState<AppSharedState>,
) -> impl IntoResponse {
    let logctx = appstate.log_context();
    let uc = ProductDetailUseCase {
        content: appstate.content_api(),
        collection: appstate.config().api_server.content.products.clone(),
        logctx: logctx.clone(),
    };
    let (status, body) = match uc.execute(product_id.as_str()).await {
        ProductDetailUsKsResult::Success(m) => {
            serialize_body(StatusCode::OK, &ProductDto::from(m), &logctx)
        }
        ProductDetailUsKsResult::NotFound => {
            (StatusCode::NOT_FOUND, message_body("Product not found"))
        }
        ProductDetailUsKsResult::ServerError(_e) => {
            (StatusCode::INTERNAL_SERVER_ERROR, server_error_body())
        }
    };
    (status, json_header_map(), body)
}

#[debug_handler(state=AppSharedState)]
pub(super) async fn batch(
    ExtractState(appstate): ExtractState<AppSharedState>,
    ExtractJson(req_body): ExtractJson<ProductBatchReqDto>,
) -> impl IntoResponse {
    let logctx = appstate.log_context();
    let uc = ProductBatchUseCase {
        content: appstate.content_api(),
        collection: appstate.config().api_server.content.products.clone(),
        logctx: logctx.clone(),
    };
    let (status, body) = match uc.execute(req_body.ids).await {
        ProductBatchUsKsResult::Success(ms) => {
            let items = ms
                .into_iter()
                .map(|m| m.map(ProductDto::from))
                .collect::<Vec<_>>();
            serialize_body(StatusCode::OK, &items, &logctx)
        }
        ProductBatchUsKsResult::ExceedLimit(num) => {
            app_log_event!(logctx, AppLogLevel::WARNING, "batch-size:{num}");
            (StatusCode::BAD_REQUEST, message_body("Too many products requested"))
        }
    };
    (status, json_header_map(), body)
}

#[debug_handler(state=AppSharedState)]
pub(super) async fn categories(
    ExtractState(appstate): ExtractState<AppSharedState>,
) -> impl IntoResponse {
    let logctx = appstate.log_context();
    let uc = CategoryLookupUseCase {
        content: appstate.content_api(),
        collection: appstate.config().api_server.content.categories.clone(),
        logctx: logctx.clone(),
    };
    let table = uc.execute().await.into_inner();
    let (status, body) = serialize_body(StatusCode::OK, &table, &logctx);
    (status, json_header_map(), body)
}
