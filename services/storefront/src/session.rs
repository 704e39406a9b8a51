use std::result::Result;

use async_trait::async_trait;
use axum::extract::{FromRequestParts, Request, State as ExtractState};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode as jwt_decode, encode as jwt_encode};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use storefront_common::confidentiality::AbstractConfidentiality;
use storefront_common::config::AppSessionCfg;
use storefront_common::error::AppErrorCode;
use storefront_common::logging::{app_log_event, AppLogLevel};

use crate::constant::app_meta;
use crate::error::AppError;
use crate::{generate_custom_uid, AppSharedState};

#[derive(Serialize, Deserialize)]
struct AppSessionClaim {
    sid: String,
    iat: i64,
    exp: i64,
}

/// signing keys and cookie attributes of shopper sessions, the cookie value
/// is HS256-signed token which wraps the session ID
pub struct AppSessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    cookie_name: String,
    ttl_secs: u32,
    secure: bool,
}

#[derive(Debug, Clone)]
pub struct AppSession {
    pub id: String,
    // true if the session is created in current request
    pub is_new: bool,
}

impl AppSessionKeys {
    pub fn try_build(
        cfg: &AppSessionCfg,
        cfdntl: &dyn AbstractConfidentiality,
    ) -> Result<Self, AppError> {
        let serial = cfdntl.try_get_payload(cfg.confidentiality_path.as_str())?;
        let secret = serde_json::from_str::<String>(serial.as_str()).map_err(|e| AppError {
            code: AppErrorCode::InvalidJsonFormat,
            detail: Some(e.to_string()),
        })?;
        if secret.is_empty() {
            return Err(AppError {
                code: AppErrorCode::NoSessionCfg,
                detail: Some("empty-secret".to_string()),
            });
        }
        let validation = {
            let mut v = Validation::new(Algorithm::HS256);
            v.set_required_spec_claims(&["exp"]);
            v.leeway = 0;
            v
        };
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            cookie_name: cfg.cookie_name.clone(),
            ttl_secs: cfg.ttl_secs,
            secure: cfg.secure,
        })
    }

    pub fn cookie_name(&self) -> &str {
        self.cookie_name.as_str()
    }
    pub fn ttl_secs(&self) -> u32 {
        self.ttl_secs
    }

    pub fn issue(&self, session_id: &str, now: DateTime<Utc>) -> Result<String, AppError> {
        let claim = AppSessionClaim {
            sid: session_id.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.ttl_secs as i64)).timestamp(),
        };
        jwt_encode(&Header::new(Algorithm::HS256), &claim, &self.encoding).map_err(|e| AppError {
            code: AppErrorCode::CryptoFailure,
            detail: Some(e.to_string()),
        })
    }

    /// session ID wrapped in the token, fails on wrong signature or expiry
    pub fn verify(&self, token: &str) -> Result<String, AppError> {
        jwt_decode::<AppSessionClaim>(token, &self.decoding, &self.validation)
            .map(|d| d.claims.sid)
            .map_err(|e| AppError {
                code: AppErrorCode::SessionInvalid,
                detail: Some(format!("{:?}", e.kind())),
            })
    }

    pub fn set_cookie_value(&self, token: &str) -> String {
        // cross-site requests from the storefront page carry the cookie only
        // with `SameSite=None`, which browsers accept only on secure cookies
        let samesite = if self.secure {
            "SameSite=None; Secure"
        } else {
            "SameSite=Lax"
        };
        format!(
            "{}={}; Path=/; Max-Age={}; HttpOnly; {}",
            self.cookie_name, token, self.ttl_secs, samesite
        )
    }

    pub(crate) fn find_token<'a, I>(&self, cookie_headers: I) -> Option<&'a str>
    where
        I: Iterator<Item = &'a HeaderValue>,
    {
        let name = self.cookie_name.as_str();
        cookie_headers
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(k, _v)| *k == name)
            .map(|(_k, v)| v)
    }
} // end of impl AppSessionKeys

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AppSession {
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

/// attach a session to every request, new session is issued when the cookie
/// is absent, malformed, wrongly signed or expired
pub async fn session_middleware(
    ExtractState(appstate): ExtractState<AppSharedState>,
    mut req: Request,
    next: Next,
) -> Response {
    let keys = appstate.session_keys();
    let logctx = appstate.log_context();
    let verified = keys
        .find_token(req.headers().get_all(COOKIE).iter())
        .map(|token| keys.verify(token));
    let session = match verified {
        Some(Ok(id)) => AppSession { id, is_new: false },
        Some(Err(e)) => {
            app_log_event!(logctx, AppLogLevel::DEBUG, "{}", e);
            AppSession::new_random()
        }
        None => AppSession::new_random(),
    };
    let new_cookie = if session.is_new {
        match keys.issue(session.id.as_str(), Utc::now()) {
            Ok(token) => HeaderValue::from_str(keys.set_cookie_value(token.as_str()).as_str()).ok(),
            Err(e) => {
                app_log_event!(logctx, AppLogLevel::ERROR, "{}", e);
                None
            }
        }
    } else {
        None
    };
    req.extensions_mut().insert(session);
    let mut resp = next.run(req).await;
    if let Some(v) = new_cookie {
        resp.headers_mut().append(SET_COOKIE, v);
    }
    resp
} // end of fn session_middleware

impl AppSession {
    fn new_random() -> Self {
        let id = generate_custom_uid(app_meta::MACHINE_CODE).to_string();
        Self { id, is_new: true }
    }
}
