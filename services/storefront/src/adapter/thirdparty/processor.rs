use std::collections::HashMap;
use std::result::Result;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use hyper::header::{HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use hyper::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use tokio_native_tls::TlsConnector;

use storefront_common::confidentiality::AbstractConfidentiality;
use storefront_common::config::{App3rdPartyCfg, AppBasepathCfg};
use storefront_common::logging::{app_log_event, AppLogContext, AppLogLevel};

use super::base_client::{deserialize_json, header_value, secure_connector, BaseClient};
use super::{
    load_credential, load_mock_data, valid_intent_id, AbstractPaymentProcessor,
    AppProcessorError, AppProcessorErrorReason, AppProcessorFnLabel, PaymentIntentCreateArgs,
};
use crate::constant::HTTP_CONTENT_TYPE_JSON;
use crate::model::{PaymentIntentModel, PaymentIntentStatus};

const API_VERSION: &str = "v1";
const HEADER_NAME_IDEMPOTENCY: &str = "idempotency-key";

#[derive(Serialize)]
struct AutomaticPaymentMethods {
    enabled: bool,
}

#[derive(Serialize)]
struct CreatePaymentIntent<'a> {
    amount: i64,
    currency: &'a str,
    receipt_email: &'a str,
    automatic_payment_methods: AutomaticPaymentMethods,
    metadata: &'a HashMap<String, String>,
}

#[derive(Deserialize)]
struct PaymentIntentResource {
    id: String,
    client_secret: Option<String>,
    status: String,
    amount: i64,
    currency: String,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

impl From<PaymentIntentResource> for PaymentIntentModel {
    fn from(value: PaymentIntentResource) -> Self {
        Self {
            status: PaymentIntentStatus::from_processor(value.status.as_str()),
            id: value.id,
            client_secret: value.client_secret,
            amount: value.amount,
            currency: value.currency,
            metadata: value.metadata,
        }
    }
}

pub(super) struct AppProcessorStripeCtx {
    cfg: Arc<App3rdPartyCfg>,
    secure_connector: TlsConnector,
    api_key: String,
    logctx: Arc<AppLogContext>,
}

impl AppProcessorStripeCtx {
    pub(super) fn try_build(
        cfg: Arc<App3rdPartyCfg>,
        cfdntl: &dyn AbstractConfidentiality,
        logctx: Arc<AppLogContext>,
    ) -> Result<Self, AppProcessorError> {
        let api_key = match cfg.as_ref() {
            App3rdPartyCfg::dev {
                confidentiality_path,
                ..
            } => load_credential::<String>(cfdntl, confidentiality_path)?,
            App3rdPartyCfg::test { .. } => {
                return Err(AppProcessorError {
                    reason: AppProcessorErrorReason::InvalidConfig,
                    fn_label: AppProcessorFnLabel::TryBuild,
                })
            }
        };
        let secure_connector = secure_connector().map_err(|e| AppProcessorError {
            reason: e.into(),
            fn_label: AppProcessorFnLabel::TryBuild,
        })?;
        Ok(Self {
            cfg,
            secure_connector,
            api_key,
            logctx,
        })
    } // end of fn try-build

    async fn request(
        &self,
        resource_path: &str,
        method: Method,
        body: Option<Vec<u8>>,
        mut headers: Vec<(HeaderName, HeaderValue)>,
    ) -> Result<PaymentIntentModel, AppProcessorErrorReason> {
        let (host, port) = match self.cfg.as_ref() {
            App3rdPartyCfg::dev { host, port, .. } => (host.as_str(), *port),
            App3rdPartyCfg::test { .. } => return Err(AppProcessorErrorReason::InvalidConfig),
        };
        let auth = format!("Bearer {}", self.api_key.as_str());
        headers.extend([
            (AUTHORIZATION, header_value(auth.as_str())?),
            (ACCEPT, header_value(HTTP_CONTENT_TYPE_JSON)?),
            (
                CONTENT_TYPE,
                header_value("application/x-www-form-urlencoded")?,
            ),
        ]);
        let uri = "/".to_string() + API_VERSION + resource_path;
        let mut client =
            BaseClient::try_build(self.logctx.clone(), &self.secure_connector, host, port).await?;
        let (raw, status) = client.execute(uri.as_str(), method, body, headers).await?;
        match status {
            StatusCode::NOT_FOUND => Err(AppProcessorErrorReason::NotFound),
            s if s.is_success() => {
                let rsc = deserialize_json::<PaymentIntentResource>(&raw, status)?;
                Ok(rsc.into())
            }
            s => {
                let logctx = &self.logctx;
                let detail = String::from_utf8_lossy(&raw);
                app_log_event!(logctx, AppLogLevel::WARNING, "status:{}, {}", s.as_u16(), detail);
                Err(AppProcessorErrorReason::RemoteStatus(s.as_u16()))
            }
        }
    } // end of fn request
} // end of impl AppProcessorStripeCtx

#[async_trait]
impl AbstractPaymentProcessor for AppProcessorStripeCtx {
    async fn create_intent(
        &self,
        args: PaymentIntentCreateArgs,
    ) -> Result<PaymentIntentModel, AppProcessorError> {
        let body_obj = CreatePaymentIntent {
            amount: args.amount_minor,
            currency: args.currency.as_str(),
            receipt_email: args.receipt_email.as_str(),
            automatic_payment_methods: AutomaticPaymentMethods { enabled: true },
            metadata: &args.metadata,
        };
        let result = match serde_qs::to_string(&body_obj) {
            Ok(form) => {
                // the same key is given on retry, processor returns the intent
                // created at the first attempt
                let headers = header_value(args.idempotency_key.as_str())
                    .map(|v| vec![(HeaderName::from_static(HEADER_NAME_IDEMPOTENCY), v)])
                    .map_err(AppProcessorErrorReason::from);
                match headers {
                    Ok(h) => {
                        self.request("/payment_intents", Method::POST, Some(form.into_bytes()), h)
                            .await
                    }
                    Err(e) => Err(e),
                }
            }
            Err(e) => Err(AppProcessorErrorReason::CorruptedResponse(e.to_string())),
        };
        result.map_err(|reason| AppProcessorError {
            reason,
            fn_label: AppProcessorFnLabel::CreateIntent,
        })
    }

    async fn retrieve_intent(&self, id_: &str) -> Result<PaymentIntentModel, AppProcessorError> {
        if !valid_intent_id(id_) {
            return Err(AppProcessorError {
                reason: AppProcessorErrorReason::NotFound,
                fn_label: AppProcessorFnLabel::RetrieveIntent,
            });
        }
        let path = format!("/payment_intents/{id_}");
        self.request(path.as_str(), Method::GET, None, Vec::new())
            .await
            .map_err(|reason| AppProcessorError {
                reason,
                fn_label: AppProcessorFnLabel::RetrieveIntent,
            })
    }
} // end of impl AppProcessorStripeCtx

#[derive(Deserialize)]
struct MockIntentFixtureItem {
    status: String,
    #[serde(default)]
    amount: i64,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

#[derive(Deserialize)]
struct MockIntentFixture {
    // existing payment intents, keyed by ID
    intents: HashMap<String, MockIntentFixtureItem>,
    #[serde(default)]
    initial_status: Option<String>,
    // status of new intents created for specific receipt emails, similar to
    // the magic values accepted in test mode of the processor
    #[serde(default)]
    status_by_receipt_email: HashMap<String, String>,
}

#[derive(Default)]
struct MockIntentStore {
    intents: HashMap<String, PaymentIntentModel>,
    // idempotency key -> (payment intent ID, fingerprint of parameters)
    created: HashMap<String, (String, String)>,
}

pub(super) struct MockProcessorStripe {
    store: Mutex<MockIntentStore>,
    initial_status: String,
    status_by_email: HashMap<String, String>,
    serial: AtomicU32,
}

impl MockProcessorStripe {
    pub(super) fn build(basepath: &AppBasepathCfg, data_src: &str) -> Result<Self, AppProcessorError> {
        let fixture =
            load_mock_data::<MockIntentFixture>(basepath, data_src, AppProcessorFnLabel::TryBuild)?;
        let intents = fixture
            .intents
            .into_iter()
            .map(|(id, item)| {
                let m = PaymentIntentModel {
                    client_secret: Some(format!("{id}_secret_mock")),
                    status: PaymentIntentStatus::from_processor(item.status.as_str()),
                    id: id.clone(),
                    amount: item.amount,
                    currency: "pln".to_string(),
                    metadata: item.metadata,
                };
                (id, m)
            })
            .collect();
        Ok(Self {
            store: Mutex::new(MockIntentStore {
                intents,
                created: HashMap::new(),
            }),
            initial_status: fixture
                .initial_status
                .unwrap_or("requires_payment_method".to_string()),
            status_by_email: fixture.status_by_receipt_email,
            serial: AtomicU32::new(1),
        })
    }

    fn lock_error(fn_label: AppProcessorFnLabel) -> AppProcessorError {
        AppProcessorError {
            reason: AppProcessorErrorReason::MockData("lock-poisoned".to_string()),
            fn_label,
        }
    }
}

#[async_trait]
impl AbstractPaymentProcessor for MockProcessorStripe {
    async fn create_intent(
        &self,
        args: PaymentIntentCreateArgs,
    ) -> Result<PaymentIntentModel, AppProcessorError> {
        let mut guard = self
            .store
            .lock()
            .map_err(|_e| Self::lock_error(AppProcessorFnLabel::CreateIntent))?;
        let fingerprint = args.fingerprint();
        // the processor rejects a reused key sent with different parameters
        if let Some((id, saved_fp)) = guard.created.get(args.idempotency_key.as_str()) {
            return if saved_fp == &fingerprint {
                guard.intents.get(id).cloned().ok_or(AppProcessorError {
                    reason: AppProcessorErrorReason::MockData(format!("lost-intent:{id}")),
                    fn_label: AppProcessorFnLabel::CreateIntent,
                })
            } else {
                Err(AppProcessorError {
                    reason: AppProcessorErrorReason::RemoteStatus(400),
                    fn_label: AppProcessorFnLabel::CreateIntent,
                })
            };
        }
        let status = self
            .status_by_email
            .get(args.receipt_email.as_str())
            .unwrap_or(&self.initial_status);
        let seq = self.serial.fetch_add(1, Ordering::Relaxed);
        let id = format!("pi_mock_{seq:04}");
        let m = PaymentIntentModel {
            client_secret: Some(format!("{id}_secret_mock")),
            status: PaymentIntentStatus::from_processor(status.as_str()),
            id: id.clone(),
            amount: args.amount_minor,
            currency: args.currency,
            metadata: args.metadata,
        };
        guard
            .created
            .insert(args.idempotency_key, (id.clone(), fingerprint));
        guard.intents.insert(id, m.clone());
        Ok(m)
    }

    async fn retrieve_intent(&self, id_: &str) -> Result<PaymentIntentModel, AppProcessorError> {
        if !valid_intent_id(id_) {
            return Err(AppProcessorError {
                reason: AppProcessorErrorReason::NotFound,
                fn_label: AppProcessorFnLabel::RetrieveIntent,
            });
        }
        let guard = self
            .store
            .lock()
            .map_err(|_e| Self::lock_error(AppProcessorFnLabel::RetrieveIntent))?;
        guard.intents.get(id_).cloned().ok_or(AppProcessorError {
            reason: AppProcessorErrorReason::NotFound,
            fn_label: AppProcessorFnLabel::RetrieveIntent,
        })
    }
}
