pub mod adapter;
pub mod api;
pub mod constant;
pub mod error;
pub mod model;
pub mod network;
pub mod repository;
pub mod session;
pub mod usecase;

use std::boxed::Box;
use std::result::Result;
use std::sync::Arc;

use chrono::Utc;
use uuid::{Builder, Uuid};

use storefront_common::confidentiality::AbstractConfidentiality;
pub use storefront_common::config::{AppConfig, WebApiListenCfg, WebApiRouteCfg};
use storefront_common::logging::AppLogContext;

use crate::adapter::datastore::AppDataStoreContext;
use crate::adapter::thirdparty::{
    AbstractAutomationHook, AbstractContentApi, AbstractPaymentProcessor, AbstractSpreadsheet,
    AppProcessorError, AppThirdPartyContext,
};
use crate::error::AppError;
use crate::session::AppSessionKeys;

pub type WebApiHdlrLabel = &'static str;

pub struct AppSharedState {
    _config: Arc<AppConfig>,
    _log_ctx: Arc<AppLogContext>,
    _dstore: Arc<AppDataStoreContext>,
    _session_keys: Arc<AppSessionKeys>,
    _thirdparty: Arc<AppThirdPartyContext>,
}

#[derive(Debug)]
pub enum ShrStateInitProgress {
    DataStore,
    SessionKeys,
    ThirdParty,
}

#[derive(Debug)]
pub struct ShrStateInitError {
    pub progress: ShrStateInitProgress,
    pub detail: String,
}

impl From<AppProcessorError> for ShrStateInitError {
    fn from(value: AppProcessorError) -> Self {
        Self {
            progress: ShrStateInitProgress::ThirdParty,
            detail: format!("{:?}", value),
        }
    }
}

impl std::fmt::Display for ShrStateInitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "progress:{:?}, detail:{}", self.progress, self.detail)
    }
}

impl AppSharedState {
    pub fn new(
        cfg: AppConfig,
        logctx: AppLogContext,
        confidential: Box<dyn AbstractConfidentiality>,
    ) -> Result<Self, ShrStateInitError> {
        let logctx = Arc::new(logctx);
        let confidential = Arc::new(confidential);
        let _dstore = AppDataStoreContext::new(&cfg.api_server.data_store, logctx.clone())
            .map(Arc::new)
            .map_err(|e: AppError| ShrStateInitError {
                progress: ShrStateInitProgress::DataStore,
                detail: e.to_string(),
            })?;
        let _session_keys = AppSessionKeys::try_build(&cfg.api_server.session, &**confidential)
            .map(Arc::new)
            .map_err(|e| ShrStateInitError {
                progress: ShrStateInitProgress::SessionKeys,
                detail: e.to_string(),
            })?;
        let _thirdparty = AppThirdPartyContext::new(
            &cfg.api_server.third_parties,
            &cfg.basepath,
            confidential,
            logctx.clone(),
        )
        .map(Arc::new)?;
        Ok(Self {
            _config: Arc::new(cfg),
            _log_ctx: logctx,
            _dstore,
            _session_keys,
            _thirdparty,
        })
    } // end of fn new

    pub fn config(&self) -> Arc<AppConfig> {
        self._config.clone()
    }
    pub fn log_context(&self) -> Arc<AppLogContext> {
        self._log_ctx.clone()
    }
    pub fn datastore(&self) -> Arc<AppDataStoreContext> {
        self._dstore.clone()
    }
    pub fn session_keys(&self) -> Arc<AppSessionKeys> {
        self._session_keys.clone()
    }
    pub fn content_api(&self) -> Arc<Box<dyn AbstractContentApi>> {
        self._thirdparty.content.clone()
    }
    pub fn processor(&self) -> Arc<Box<dyn AbstractPaymentProcessor>> {
        self._thirdparty.processor.clone()
    }
    pub fn spreadsheet(&self) -> Arc<Box<dyn AbstractSpreadsheet>> {
        self._thirdparty.spreadsheet.clone()
    }
    pub fn automation_hook(&self) -> Arc<Box<dyn AbstractAutomationHook>> {
        self._thirdparty.hook.clone()
    }
} // end of impl AppSharedState

impl Clone for AppSharedState {
    fn clone(&self) -> Self {
        Self {
            _config: self._config.clone(),
            _log_ctx: self._log_ctx.clone(),
            _dstore: self._dstore.clone(),
            _session_keys: self._session_keys.clone(),
            _thirdparty: self._thirdparty.clone(),
        }
    }
}

pub(crate) fn generate_custom_uid(machine_code: u8) -> Uuid {
    // few bits of the ID are assigned to represent each machine/node, rest
    // of that should be timestamp with random byte sequence
    let millis = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
    let mut node_id = rand::random::<[u8; 10]>();
    node_id[0] = machine_code;
    Builder::from_unix_timestamp_millis(millis, &node_id).into_uuid()
}
