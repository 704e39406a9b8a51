mod cart;
mod checkout;

use axum::body::Body as AxumBody;
use axum::http::{header, HeaderMap, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value as JsnVal;
use tower::ServiceExt;

use storefront::api::web::route_table;
use storefront::network::{app_web_service, WebServiceRoute};
use storefront::AppSharedState;

use crate::ut_default_share_state;

// keep the session cookie issued by the server, like a browser would do
pub(crate) struct UtWebClient {
    pub(crate) shr_state: AppSharedState,
    service: WebServiceRoute,
    cookie: Option<String>,
}

pub(crate) struct UtWebResp {
    pub(crate) status: StatusCode,
    pub(crate) headers: HeaderMap,
    pub(crate) body: JsnVal,
}

impl UtWebClient {
    pub(crate) fn new() -> Self {
        let shr_state = ut_default_share_state();
        let cfg = shr_state.config();
        let (service, _num_routes) =
            app_web_service(&cfg.api_server.listen, route_table(), shr_state.clone());
        Self {
            shr_state,
            service,
            cookie: None,
        }
    }

    pub(crate) fn forget_session(&mut self) {
        self.cookie = None;
    }

    pub(crate) async fn send(&mut self, method: &str, uri: &str, body: Option<JsnVal>) -> UtWebResp {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(c) = self.cookie.as_ref() {
            builder = builder.header(header::COOKIE, c.as_str());
        }
        let body = match body {
            Some(v) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                AxumBody::from(v.to_string())
            }
            None => AxumBody::empty(),
        };
        let req = builder.body(body).unwrap();
        let resp = self.service.clone().oneshot(req).await.unwrap();
        if let Some(v) = resp.headers().get(header::SET_COOKIE) {
            let pair = v.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_string());
        }
        let status = resp.status();
        let headers = resp.headers().clone();
        let rawdata = resp.into_body().collect().await.unwrap().to_bytes();
        // extractor rejections from the framework come in plain text
        let body = if rawdata.is_empty() {
            JsnVal::Null
        } else {
            serde_json::from_slice::<JsnVal>(&rawdata)
                .unwrap_or_else(|_e| JsnVal::String(String::from_utf8_lossy(&rawdata).to_string()))
        };
        UtWebResp {
            status,
            headers,
            body,
        }
    } // end of fn send
} // end of impl UtWebClient
