use axum::debug_handler;
use axum::extract::State as ExtractState;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;

use storefront_common::logging::{app_log_event, AppLogLevel};

use super::dto::SessionIdRespDto;
use super::{json_header_map, serialize_body};
use crate::session::AppSession;
use crate::AppSharedState;

#[debug_handler(state=AppSharedState)]
pub(super) async fn retrieve_id(
    session: AppSession,
    ExtractState(appstate): ExtractState<AppSharedState>,
) -> impl IntoResponse {
    let logctx = appstate.log_context();
    app_log_event!(logctx, AppLogLevel::DEBUG, "new-session:{}", session.is_new);
    let body = SessionIdRespDto {
        session_id: session.id,
    };
    let (status, body) = serialize_body(StatusCode::OK, &body, &logctx);
    let hdr_map: HeaderMap = json_header_map();
    (status, hdr_map, body)
}
