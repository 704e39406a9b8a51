use std::result::Result;
use std::sync::Arc;

use async_trait::async_trait;
use hyper::header::{ACCEPT, CONTENT_TYPE};
use hyper::Method;
use serde_json::Value as JsnVal;
use tokio_native_tls::TlsConnector;

use storefront_common::confidentiality::AbstractConfidentiality;
use storefront_common::config::App3rdPartyCfg;
use storefront_common::logging::{app_log_event, AppLogContext, AppLogLevel};

use super::base_client::{header_value, secure_connector, BaseClient};
use super::{
    load_credential, AbstractAutomationHook, AppProcessorError, AppProcessorErrorReason,
    AppProcessorFnLabel,
};
use crate::constant::HTTP_CONTENT_TYPE_JSON;

// the webhook path itself is the secret of no-code automation platforms
pub(super) struct AppAutomationHookCtx {
    cfg: Arc<App3rdPartyCfg>,
    secure_connector: TlsConnector,
    hook_path: String,
    logctx: Arc<AppLogContext>,
}

impl AppAutomationHookCtx {
    pub(super) fn try_build(
        cfg: Arc<App3rdPartyCfg>,
        cfdntl: &dyn AbstractConfidentiality,
        logctx: Arc<AppLogContext>,
    ) -> Result<Self, AppProcessorError> {
        let hook_path = match cfg.as_ref() {
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
        if !hook_path.starts_with('/') {
            return Err(AppProcessorError {
                reason: AppProcessorErrorReason::CredentialCorrupted,
                fn_label: AppProcessorFnLabel::TryBuild,
            });
        }
        let secure_connector = secure_connector().map_err(|e| AppProcessorError {
            reason: e.into(),
            fn_label: AppProcessorFnLabel::TryBuild,
        })?;
        Ok(Self {
            cfg,
            secure_connector,
            hook_path,
            logctx,
        })
    }

    async fn _relay(&self, payload: JsnVal) -> Result<(), AppProcessorErrorReason> {
        let (host, port) = match self.cfg.as_ref() {
            App3rdPartyCfg::dev { host, port, .. } => (host.as_str(), *port),
            App3rdPartyCfg::test { .. } => return Err(AppProcessorErrorReason::InvalidConfig),
        };
        let body = serde_json::to_vec(&payload)
            .map_err(|e| AppProcessorErrorReason::CorruptedResponse(e.to_string()))?;
        let headers = vec![
            (ACCEPT, header_value(HTTP_CONTENT_TYPE_JSON)?),
            (CONTENT_TYPE, header_value(HTTP_CONTENT_TYPE_JSON)?),
        ];
        let mut client =
            BaseClient::try_build(self.logctx.clone(), &self.secure_connector, host, port).await?;
        let (_raw, status) = client
            .execute(self.hook_path.as_str(), Method::POST, Some(body), headers)
            .await?;
        if status.is_success() {
            Ok(())
        } else {
            Err(AppProcessorErrorReason::RemoteStatus(status.as_u16()))
        }
    }
}

#[async_trait]
impl AbstractAutomationHook for AppAutomationHookCtx {
    async fn relay(&self, payload: JsnVal) -> Result<(), AppProcessorError> {
        self._relay(payload).await.map_err(|reason| {
            let logctx = &self.logctx;
            app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", reason);
            AppProcessorError {
                reason,
                fn_label: AppProcessorFnLabel::Relay,
            }
        })
    }
}

pub(super) struct MockAutomationHook {
    logctx: Arc<AppLogContext>,
}

impl MockAutomationHook {
    pub(super) fn build(logctx: Arc<AppLogContext>) -> Self {
        Self { logctx }
    }
}

#[async_trait]
impl AbstractAutomationHook for MockAutomationHook {
    async fn relay(&self, payload: JsnVal) -> Result<(), AppProcessorError> {
        let logctx = &self.logctx;
        app_log_event!(logctx, AppLogLevel::DEBUG, "mock-relay: {}", payload);
        Ok(())
    }
}
