mod base_client;
mod content;
mod hook;
mod processor;
mod spreadsheet;

use std::boxed::Box;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::marker::{Send, Sync};
use std::result::Result;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value as JsnVal;

use storefront_common::confidentiality::AbstractConfidentiality;
use storefront_common::config::{App3rdPartyCfg, AppBasepathCfg};
use storefront_common::error::AppErrorCode;
use storefront_common::logging::{app_log_event, AppLogContext, AppLogLevel};

pub use self::base_client::{BaseClientError, BaseClientErrorReason};
use self::content::{AppContentApiCtx, MockContentApi};
use self::hook::{AppAutomationHookCtx, MockAutomationHook};
use self::processor::{AppProcessorStripeCtx, MockProcessorStripe};
use self::spreadsheet::{AppSpreadsheetCtx, MockSpreadsheet};
use crate::constant::thirdparty as label3pt;
use crate::error::AppError;
use crate::model::{PaymentIntentModel, SheetRowModel};

#[derive(Debug)]
pub enum AppProcessorErrorReason {
    InvalidConfig,
    MissingCredential,
    CredentialCorrupted,
    LowLvlNet(BaseClientError),
    RemoteStatus(u16),
    NotFound,
    MockData(String),
    CorruptedResponse(String),
}

#[derive(Debug)]
pub enum AppProcessorFnLabel {
    TryBuild,
    QueryItems,
    GetItem,
    CreateIntent,
    RetrieveIntent,
    FetchRows,
    AppendRows,
    Relay,
}

#[derive(Debug)]
pub struct AppProcessorError {
    pub reason: AppProcessorErrorReason,
    pub fn_label: AppProcessorFnLabel,
}

impl From<BaseClientError> for AppProcessorErrorReason {
    fn from(value: BaseClientError) -> Self {
        Self::LowLvlNet(value)
    }
}

impl From<AppProcessorError> for AppError {
    fn from(value: AppProcessorError) -> Self {
        let code = match &value.reason {
            AppProcessorErrorReason::NotFound => AppErrorCode::RemoteResourceNotFound,
            AppProcessorErrorReason::InvalidConfig
            | AppProcessorErrorReason::MissingCredential
            | AppProcessorErrorReason::CredentialCorrupted => AppErrorCode::No3rdPartyCfg,
            _others => AppErrorCode::RemoteServiceFailure,
        };
        AppError {
            code,
            detail: Some(format!("{:?}, {:?}", value.fn_label, value.reason)),
        }
    }
}

/// read-only access to collections of the external CMS
#[async_trait]
pub trait AbstractContentApi: Send + Sync {
    async fn query_items(&self, collection: &str) -> Result<Vec<JsnVal>, AppProcessorError>;

    /// `None` when the item does not exist in the collection
    async fn get_item(
        &self,
        collection: &str,
        id_: &str,
    ) -> Result<Option<JsnVal>, AppProcessorError>;
}

pub struct PaymentIntentCreateArgs {
    pub amount_minor: i64,
    pub currency: String,
    pub receipt_email: String,
    pub idempotency_key: String,
    pub metadata: HashMap<String, String>,
}

impl PaymentIntentCreateArgs {
    /// hex digest over every parameter sent to the processor except the
    /// idempotency key, metadata entries are sorted by key
    pub fn fingerprint(&self) -> String {
        let mut meta = self.metadata.iter().collect::<Vec<_>>();
        meta.sort();
        let mut ctx = md5::Context::new();
        ctx.consume(self.amount_minor.to_string().as_bytes());
        ctx.consume(b"\n");
        ctx.consume(self.currency.as_bytes());
        ctx.consume(b"\n");
        ctx.consume(self.receipt_email.as_bytes());
        for (k, v) in meta {
            ctx.consume(b"\n");
            ctx.consume(k.as_bytes());
            ctx.consume(b"=");
            ctx.consume(v.as_bytes());
        }
        format!("{:x}", ctx.compute())
    }
}

/// processor-side identifiers consist of ASCII letters, digits and underscore,
/// anything else must not be forwarded into the resource path
pub fn valid_intent_id(id_: &str) -> bool {
    !id_.is_empty() && id_.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[async_trait]
pub trait AbstractPaymentProcessor: Send + Sync {
    async fn create_intent(
        &self,
        args: PaymentIntentCreateArgs,
    ) -> Result<PaymentIntentModel, AppProcessorError>;

    async fn retrieve_intent(&self, id_: &str) -> Result<PaymentIntentModel, AppProcessorError>;
}

#[async_trait]
pub trait AbstractSpreadsheet: Send + Sync {
    async fn fetch_rows(&self) -> Result<Vec<SheetRowModel>, AppProcessorError>;

    // return number of rows appended
    async fn append_rows(
        &self,
        rows: Vec<HashMap<String, String>>,
    ) -> Result<usize, AppProcessorError>;
}

#[async_trait]
pub trait AbstractAutomationHook: Send + Sync {
    async fn relay(&self, payload: JsnVal) -> Result<(), AppProcessorError>;
}

pub struct AppThirdPartyContext {
    pub content: Arc<Box<dyn AbstractContentApi>>,
    pub processor: Arc<Box<dyn AbstractPaymentProcessor>>,
    pub spreadsheet: Arc<Box<dyn AbstractSpreadsheet>>,
    pub hook: Arc<Box<dyn AbstractAutomationHook>>,
}

// fixture data of mock services, path relative to the service base path
fn load_mock_data<T: DeserializeOwned>(
    basepath: &AppBasepathCfg,
    data_src: &str,
    fn_label: AppProcessorFnLabel,
) -> Result<T, AppProcessorError> {
    let fullpath = basepath.service.clone() + data_src;
    let reader = File::open(fullpath.as_str())
        .map(BufReader::new)
        .map_err(|e| AppProcessorError {
            reason: AppProcessorErrorReason::MockData(format!("{fullpath}, {e}")),
            fn_label: AppProcessorFnLabel::TryBuild,
        })?;
    serde_json::from_reader::<_, T>(reader).map_err(|e| AppProcessorError {
        reason: AppProcessorErrorReason::MockData(e.to_string()),
        fn_label,
    })
}

// credentials are stored as serialised JSON in the confidentiality source
fn load_credential<T: DeserializeOwned>(
    cfdntl: &dyn AbstractConfidentiality,
    path: &str,
) -> Result<T, AppProcessorError> {
    let serial = cfdntl
        .try_get_payload(path)
        .map_err(|_e| AppProcessorError {
            reason: AppProcessorErrorReason::MissingCredential,
            fn_label: AppProcessorFnLabel::TryBuild,
        })?;
    serde_json::from_str::<T>(serial.as_str()).map_err(|_e| AppProcessorError {
        reason: AppProcessorErrorReason::CredentialCorrupted,
        fn_label: AppProcessorFnLabel::TryBuild,
    })
}

impl AppThirdPartyContext {
    pub fn new(
        cfgs3pt: &[Arc<App3rdPartyCfg>],
        basepath: &AppBasepathCfg,
        cfdntl: Arc<Box<dyn AbstractConfidentiality>>,
        logctx: Arc<AppLogContext>,
    ) -> Result<Self, AppProcessorError> {
        let mut content: Option<Box<dyn AbstractContentApi>> = None;
        let mut processor: Option<Box<dyn AbstractPaymentProcessor>> = None;
        let mut spreadsheet: Option<Box<dyn AbstractSpreadsheet>> = None;
        let mut hook: Option<Box<dyn AbstractAutomationHook>> = None;
        let cfd: &dyn AbstractConfidentiality = &**cfdntl;
        for c in cfgs3pt {
            let name = c.name().to_lowercase();
            match (c.as_ref(), name.as_str()) {
                (App3rdPartyCfg::dev { .. }, label3pt::CONTENT_API) => {
                    let obj = AppContentApiCtx::try_build(c.clone(), cfd, logctx.clone())?;
                    content = Some(Box::new(obj));
                }
                (App3rdPartyCfg::test { data_src, .. }, label3pt::CONTENT_API) => {
                    let obj = MockContentApi::build(basepath, data_src)?;
                    content = Some(Box::new(obj));
                }
                (App3rdPartyCfg::dev { .. }, label3pt::PAYMENT_PROCESSOR) => {
                    let obj = AppProcessorStripeCtx::try_build(c.clone(), cfd, logctx.clone())?;
                    processor = Some(Box::new(obj));
                }
                (App3rdPartyCfg::test { data_src, .. }, label3pt::PAYMENT_PROCESSOR) => {
                    let obj = MockProcessorStripe::build(basepath, data_src)?;
                    processor = Some(Box::new(obj));
                }
                (App3rdPartyCfg::dev { .. }, label3pt::SPREADSHEET) => {
                    let obj = AppSpreadsheetCtx::try_build(c.clone(), cfd, logctx.clone())?;
                    spreadsheet = Some(Box::new(obj));
                }
                (App3rdPartyCfg::test { data_src, .. }, label3pt::SPREADSHEET) => {
                    let obj = MockSpreadsheet::build(basepath, data_src)?;
                    spreadsheet = Some(Box::new(obj));
                }
                (App3rdPartyCfg::dev { .. }, label3pt::AUTOMATION_HOOK) => {
                    let obj = AppAutomationHookCtx::try_build(c.clone(), cfd, logctx.clone())?;
                    hook = Some(Box::new(obj));
                }
                (App3rdPartyCfg::test { .. }, label3pt::AUTOMATION_HOOK) => {
                    hook = Some(Box::new(MockAutomationHook::build(logctx.clone())));
                }
                _others => {
                    app_log_event!(logctx, AppLogLevel::WARNING, "unknown-3rdparty:{name}");
                }
            }
        } // end of loop
        match (content, processor, spreadsheet, hook) {
            (Some(c), Some(p), Some(s), Some(h)) => Ok(Self {
                content: Arc::new(c),
                processor: Arc::new(p),
                spreadsheet: Arc::new(s),
                hook: Arc::new(h),
            }),
            _others => Err(AppProcessorError {
                reason: AppProcessorErrorReason::InvalidConfig,
                fn_label: AppProcessorFnLabel::TryBuild,
            }),
        }
    } // end of fn new
} // end of impl AppThirdPartyContext
