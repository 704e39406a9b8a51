use axum::debug_handler;
use axum::extract::{Json as ExtractJson, State as ExtractState};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;

use storefront_common::logging::{app_log_event, AppLogLevel};

use super::dto::{
    ContainerDto, ContainerWebhookReqDto, MemberContainerDto, MemberContainerRespDto, ProductDto,
};
use super::{json_header_map, serialize_body, server_error_body};
use crate::model::{local_today, DeliveryRouteModel};
use crate::usecase::{ContainerListUseCase, MemberContainersUseCase};
use crate::AppSharedState;

#[debug_handler(state=AppSharedState)]
pub(super) async fn list(ExtractState(appstate): ExtractState<AppSharedState>) -> impl IntoResponse {
    let logctx = appstate.log_context();
    let uc = ContainerListUseCase {
        spreadsheet: appstate.spreadsheet(),
        route: DeliveryRouteModel::default(),
        logctx: logctx.clone(),
    };
    let today = local_today(Utc::now());
    let (status, body) = match uc.execute(today).await {
        Ok(ms) => {
            let items = ms.into_iter().map(ContainerDto::from).collect::<Vec<_>>();
            serialize_body(StatusCode::OK, &items, &logctx)
        }
        Err(_e) => (StatusCode::INTERNAL_SERVER_ERROR, server_error_body()),
    };
    (status, json_header_map(), body)
}

#[debug_handler(state=AppSharedState)]
pub(super) async fn member_webhook(
    ExtractState(appstate): ExtractState<AppSharedState>,
    ExtractJson(req_body): ExtractJson<ContainerWebhookReqDto>,
) -> impl IntoResponse {
    let logctx = appstate.log_context();
    app_log_event!(logctx, AppLogLevel::DEBUG, "container-webhook");
    let cfg = appstate.config();
    let uc = MemberContainersUseCase {
        content: appstate.content_api(),
        container_collection: cfg.api_server.content.containers.clone(),
        product_collection: cfg.api_server.content.products.clone(),
        route: DeliveryRouteModel::default(),
        logctx: logctx.clone(),
    };
    let today = local_today(Utc::now());
    let (status, body) = match uc.execute(req_body.into_identity(), today).await {
        Ok(out) => {
            let containers = out
                .containers
                .into_iter()
                .map(MemberContainerDto::from)
                .collect::<Vec<_>>();
            let products = out
                .products
                .into_iter()
                .map(|(k, v)| (k, ProductDto::from(v)))
                .collect();
            let resp = MemberContainerRespDto {
                total: containers.len(),
                containers,
                products,
            };
            serialize_body(StatusCode::OK, &resp, &logctx)
        }
        Err(_e) => (StatusCode::INTERNAL_SERVER_ERROR, server_error_body()),
    };
    (status, json_header_map(), body)
}
