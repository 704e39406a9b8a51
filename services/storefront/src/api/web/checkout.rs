use axum::debug_handler;
use axum::extract::{Json as ExtractJson, Path as ExtractPath, State as ExtractState};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;

use storefront_common::logging::{app_log_event, AppLogLevel};

use super::dto::{
    CartItemDto, CheckoutFormDto, CheckoutQuoteReqDto, CheckoutValidationErrorDto,
    ConfirmCheckoutReqDto, ConfirmCheckoutRespDto, CostBreakdownDto, CouponValidateReqDto,
    CouponValidateRespDto, PaymentIntentCreateRespDto, PaymentIntentStatusRespDto,
    PaymentPendingRespDto, PaymentStatusOnlyDto, ShippingOptionDto,
};
use super::{json_header_map, message_body, serialize_body, server_error_body};
use crate::repository::{app_repo_cart, app_repo_payment_record};
use crate::session::AppSession;
use crate::usecase::{
    CheckoutQuoteUsKsResult, CheckoutQuoteUseCase, ConfirmCheckoutUsKsResult,
    ConfirmCheckoutUseCase, CreatePaymentIntentUsKsResult, CreatePaymentIntentUseCase,
    PaymentIntentStatusUsKsResult, PaymentIntentStatusUseCase, PaymentPendingUsKsResult,
    PaymentPendingUseCase, ShippingOptionsUseCase, ValidateCouponUseCase,
};
use crate::AppSharedState;

#[debug_handler(state=AppSharedState)]
pub(super) async fn shipping_options(
    ExtractState(appstate): ExtractState<AppSharedState>,
) -> impl IntoResponse {
    let logctx = appstate.log_context();
    let uc = ShippingOptionsUseCase {
        checkout: appstate.config().api_server.checkout.clone(),
    };
    let (status, body) = match uc.execute() {
        Ok(ms) => {
            let items = ms
                .into_iter()
                .map(ShippingOptionDto::from)
                .collect::<Vec<_>>();
            serialize_body(StatusCode::OK, &items, &logctx)
        }
        Err(e) => {
            app_log_event!(logctx, AppLogLevel::ERROR, "{}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, server_error_body())
        }
    };
    (status, json_header_map(), body)
}

#[debug_handler(state=AppSharedState)]
pub(super) async fn validate_coupon(
    ExtractState(appstate): ExtractState<AppSharedState>,
    ExtractJson(req_body): ExtractJson<CouponValidateReqDto>,
) -> impl IntoResponse {
    let logctx = appstate.log_context();
    let uc = ValidateCouponUseCase {
        checkout: appstate.config().api_server.checkout.clone(),
    };
    let result = uc.execute(req_body.code.as_str(), Utc::now());
    let resp = CouponValidateRespDto::from(&result);
    let (status, body) = serialize_body(StatusCode::OK, &resp, &logctx);
    (status, json_header_map(), body)
}

#[debug_handler(state=AppSharedState)]
pub(super) async fn quote(
    session: AppSession,
    ExtractState(appstate): ExtractState<AppSharedState>,
    ExtractJson(req_body): ExtractJson<CheckoutQuoteReqDto>,
) -> impl IntoResponse {
    let logctx = appstate.log_context();
    let repo = match app_repo_cart(appstate.datastore()).await {
        Ok(v) => v,
        Err(e) => {
            app_log_event!(logctx, AppLogLevel::ERROR, "{}", e);
            let status = StatusCode::INTERNAL_SERVER_ERROR;
            return (status, json_header_map(), server_error_body());
        }
    };
    let checkout = appstate.config().api_server.checkout.clone();
    let currency = checkout.currency.clone();
    let uc = CheckoutQuoteUseCase {
        repo,
        checkout,
        logctx: logctx.clone(),
        ttl_secs: appstate.session_keys().ttl_secs(),
    };
    let result = uc
        .execute(
            session.id.as_str(),
            req_body.shipping_option.as_str(),
            req_body.coupon_code.as_deref(),
            Utc::now(),
        )
        .await;
    let (status, body) = match result {
        CheckoutQuoteUsKsResult::Success(cost) => {
            let resp = CostBreakdownDto::from((cost, currency.as_str()));
            serialize_body(StatusCode::OK, &resp, &logctx)
        }
        CheckoutQuoteUsKsResult::Invalid(e) => {
            let resp = CheckoutValidationErrorDto::from(e);
            serialize_body(StatusCode::BAD_REQUEST, &resp, &logctx)
        }
        CheckoutQuoteUsKsResult::ServerError(e) => {
            app_log_event!(logctx, AppLogLevel::ERROR, "{}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, server_error_body())
        }
    };
    (status, json_header_map(), body)
} // end of fn quote

#[debug_handler(state=AppSharedState)]
pub(super) async fn create_payment_intent(
    session: AppSession,
    ExtractState(appstate): ExtractState<AppSharedState>,
    ExtractJson(req_body): ExtractJson<CheckoutFormDto>,
) -> impl IntoResponse {
    let logctx = appstate.log_context();
    let repo = match app_repo_cart(appstate.datastore()).await {
        Ok(v) => v,
        Err(e) => {
            app_log_event!(logctx, AppLogLevel::ERROR, "{}", e);
            let status = StatusCode::INTERNAL_SERVER_ERROR;
            return (status, json_header_map(), server_error_body());
        }
    };
    let checkout = appstate.config().api_server.checkout.clone();
    let currency = checkout.currency.clone();
    let uc = CreatePaymentIntentUseCase {
        repo,
        processor: appstate.processor(),
        checkout,
        logctx: logctx.clone(),
        ttl_secs: appstate.session_keys().ttl_secs(),
    };
    let result = uc
        .execute(session.id.as_str(), req_body.into(), Utc::now())
        .await;
    let (status, body) = match result {
        CreatePaymentIntentUsKsResult::Success { intent, cost } => {
            let resp = PaymentIntentCreateRespDto {
                payment_intent_id: intent.id,
                client_secret: intent.client_secret.unwrap_or_default(),
                breakdown: CostBreakdownDto::from((cost, currency.as_str())),
            };
            serialize_body(StatusCode::OK, &resp, &logctx)
        }
        CreatePaymentIntentUsKsResult::Invalid(e) => {
            let resp = CheckoutValidationErrorDto::from(e);
            serialize_body(StatusCode::BAD_REQUEST, &resp, &logctx)
        }
        CreatePaymentIntentUsKsResult::ServerError(e) => {
            app_log_event!(logctx, AppLogLevel::ERROR, "{}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, server_error_body())
        }
    };
    (status, json_header_map(), body)
} // end of fn create_payment_intent

#[debug_handler(state=AppSharedState)]
pub(super) async fn payment_intent_status(
    ExtractPath(intent_id): ExtractPath<String>,
    ExtractState(appstate): ExtractState<AppSharedState>,
) -> impl IntoResponse {
    let logctx = appstate.log_context();
    let uc = PaymentIntentStatusUseCase {
        processor: appstate.processor(),
        logctx: logctx.clone(),
    };
    let (status, body) = match uc.execute(intent_id.as_str()).await {
        PaymentIntentStatusUsKsResult::Success(m) => {
            let resp = PaymentIntentStatusRespDto {
                status: m.status.as_str().to_string(),
                id: m.id,
            };
            serialize_body(StatusCode::OK, &resp, &logctx)
        }
        PaymentIntentStatusUsKsResult::NotFound => (
            StatusCode::NOT_FOUND,
            message_body("Payment intent not found"),
        ),
        PaymentIntentStatusUsKsResult::ServerError(_e) => {
            (StatusCode::INTERNAL_SERVER_ERROR, server_error_body())
        }
    };
    (status, json_header_map(), body)
}

#[debug_handler(state=AppSharedState)]
pub(super) async fn payment_intent_pending(
    ExtractPath(intent_id): ExtractPath<String>,
    ExtractState(appstate): ExtractState<AppSharedState>,
) -> impl IntoResponse {
    let logctx = appstate.log_context();
    app_log_event!(logctx, AppLogLevel::DEBUG, "pending:{intent_id}");
    let uc = PaymentPendingUseCase {
        processor: appstate.processor(),
        checkout: appstate.config().api_server.checkout.clone(),
        logctx: logctx.clone(),
    };
    let (status, body) = match uc.execute(intent_id.as_str()).await {
        PaymentPendingUsKsResult::Success {
            intent,
            next,
            redirect_url,
        } => {
            let resp = PaymentPendingRespDto {
                status: intent.status.as_str().to_string(),
                next: next.as_str(),
                redirect_url,
            };
            serialize_body(StatusCode::OK, &resp, &logctx)
        }
        PaymentPendingUsKsResult::NotFound => (
            StatusCode::NOT_FOUND,
            message_body("Payment intent not found"),
        ),
        PaymentPendingUsKsResult::ServerError(_e) => {
            (StatusCode::INTERNAL_SERVER_ERROR, server_error_body())
        }
    };
    (status, json_header_map(), body)
}

#[debug_handler(state=AppSharedState)]
pub(super) async fn confirm(
    session: AppSession,
    ExtractState(appstate): ExtractState<AppSharedState>,
    ExtractJson(req_body): ExtractJson<ConfirmCheckoutReqDto>,
) -> impl IntoResponse {
    let logctx = appstate.log_context();
    let repo = match app_repo_cart(appstate.datastore()).await {
        Ok(v) => v,
        Err(e) => {
            app_log_event!(logctx, AppLogLevel::ERROR, "{}", e);
            let status = StatusCode::INTERNAL_SERVER_ERROR;
            return (status, json_header_map(), server_error_body());
        }
    };
    let records = match app_repo_payment_record(appstate.datastore()).await {
        Ok(v) => v,
        Err(e) => {
            app_log_event!(logctx, AppLogLevel::ERROR, "{}", e);
            let status = StatusCode::INTERNAL_SERVER_ERROR;
            return (status, json_header_map(), server_error_body());
        }
    };
    let checkout = appstate.config().api_server.checkout.clone();
    let currency = checkout.currency.clone();
    let uc = ConfirmCheckoutUseCase {
        repo,
        records,
        processor: appstate.processor(),
        spreadsheet: appstate.spreadsheet(),
        hook: appstate.automation_hook(),
        checkout,
        logctx: logctx.clone(),
        ttl_secs: appstate.session_keys().ttl_secs(),
    };
    let ConfirmCheckoutReqDto {
        payment_intent_id,
        form,
    } = req_body;
    let result = uc
        .execute(
            session.id.as_str(),
            payment_intent_id.as_str(),
            form.into(),
            Utc::now(),
        )
        .await;
    let (status, body) = match result {
        ConfirmCheckoutUsKsResult::Success {
            order_id,
            intent,
            cost,
            items,
        } => {
            let resp = ConfirmCheckoutRespDto {
                status: intent.status.as_str().to_string(),
                order_id,
                breakdown: CostBreakdownDto::from((cost, currency.as_str())),
                items: items.iter().map(CartItemDto::from).collect(),
            };
            serialize_body(StatusCode::OK, &resp, &logctx)
        }
        ConfirmCheckoutUsKsResult::NotSucceeded(s) => {
            let resp = PaymentStatusOnlyDto {
                status: s.as_str().to_string(),
                reason: None,
            };
            serialize_body(StatusCode::CONFLICT, &resp, &logctx)
        }
        ConfirmCheckoutUsKsResult::Rejected { status, reason } => {
            let resp = PaymentStatusOnlyDto {
                status: status.as_str().to_string(),
                reason: Some(reason),
            };
            serialize_body(StatusCode::CONFLICT, &resp, &logctx)
        }
        ConfirmCheckoutUsKsResult::Invalid(e) => {
            let resp = CheckoutValidationErrorDto::from(e);
            serialize_body(StatusCode::BAD_REQUEST, &resp, &logctx)
        }
        ConfirmCheckoutUsKsResult::NotFound => (
            StatusCode::NOT_FOUND,
            message_body("Payment intent not found"),
        ),
        ConfirmCheckoutUsKsResult::ServerError(e) => {
            app_log_event!(logctx, AppLogLevel::ERROR, "{}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, server_error_body())
        }
    };
    (status, json_header_map(), body)
} // end of fn confirm
