use std::collections::HashMap;
use std::result::Result;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use hyper::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use hyper::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsnVal;
use tokio_native_tls::TlsConnector;

use storefront_common::confidentiality::AbstractConfidentiality;
use storefront_common::config::{App3rdPartyCfg, AppBasepathCfg};
use storefront_common::logging::{app_log_event, AppLogContext, AppLogLevel};

use super::base_client::{deserialize_json, header_value, secure_connector, BaseClient};
use super::{
    load_credential, load_mock_data, AbstractSpreadsheet, AppProcessorError,
    AppProcessorErrorReason, AppProcessorFnLabel,
};
use crate::constant::HTTP_CONTENT_TYPE_JSON;
use crate::model::SheetRowModel;

#[derive(Deserialize)]
struct SpreadsheetCredential {
    sheet_id: String,
    api_token: String,
}

#[derive(Serialize)]
struct AppendRowsReq {
    data: Vec<HashMap<String, String>>,
}
#[derive(Deserialize)]
struct AppendRowsResp {
    created: usize,
}

// cells are read as plain text, numeric cells are converted back to string
fn into_sheet_rows(raw: Vec<HashMap<String, JsnVal>>) -> Vec<SheetRowModel> {
    raw.into_iter()
        .enumerate()
        .map(|(idx, row)| {
            let cells = row
                .into_iter()
                .map(|(k, v)| {
                    let v = match v {
                        JsnVal::String(s) => s,
                        JsnVal::Null => String::new(),
                        other => other.to_string(),
                    };
                    (k, v)
                })
                .collect::<HashMap<_, _>>();
            (idx.to_string(), cells)
        })
        .collect()
}

pub(super) struct AppSpreadsheetCtx {
    cfg: Arc<App3rdPartyCfg>,
    secure_connector: TlsConnector,
    credential: SpreadsheetCredential,
    logctx: Arc<AppLogContext>,
}

impl AppSpreadsheetCtx {
    pub(super) fn try_build(
        cfg: Arc<App3rdPartyCfg>,
        cfdntl: &dyn AbstractConfidentiality,
        logctx: Arc<AppLogContext>,
    ) -> Result<Self, AppProcessorError> {
        let credential = match cfg.as_ref() {
            App3rdPartyCfg::dev {
                confidentiality_path,
                ..
            } => load_credential::<SpreadsheetCredential>(cfdntl, confidentiality_path)?,
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
            credential,
            logctx,
        })
    }

    async fn request(
        &self,
        method: Method,
        body: Option<Vec<u8>>,
    ) -> Result<Vec<u8>, AppProcessorErrorReason> {
        let (host, port) = match self.cfg.as_ref() {
            App3rdPartyCfg::dev { host, port, .. } => (host.as_str(), *port),
            App3rdPartyCfg::test { .. } => return Err(AppProcessorErrorReason::InvalidConfig),
        };
        let auth = format!("Bearer {}", self.credential.api_token.as_str());
        let headers = vec![
            (AUTHORIZATION, header_value(auth.as_str())?),
            (ACCEPT, header_value(HTTP_CONTENT_TYPE_JSON)?),
            (CONTENT_TYPE, header_value(HTTP_CONTENT_TYPE_JSON)?),
        ];
        let path = format!("/api/v1/{}", self.credential.sheet_id);
        let mut client =
            BaseClient::try_build(self.logctx.clone(), &self.secure_connector, host, port).await?;
        let (raw, status) = client.execute(path.as_str(), method, body, headers).await?;
        if status.is_success() {
            Ok(raw)
        } else {
            Err(AppProcessorErrorReason::RemoteStatus(status.as_u16()))
        }
    }

    async fn _fetch_rows(&self) -> Result<Vec<SheetRowModel>, AppProcessorErrorReason> {
        let raw = self.request(Method::GET, None).await?;
        let rows = deserialize_json::<Vec<HashMap<String, JsnVal>>>(&raw, hyper::StatusCode::OK)?;
        Ok(into_sheet_rows(rows))
    }

    async fn _append_rows(
        &self,
        data: Vec<HashMap<String, String>>,
    ) -> Result<usize, AppProcessorErrorReason> {
        let body = serde_json::to_vec(&AppendRowsReq { data })
            .map_err(|e| AppProcessorErrorReason::CorruptedResponse(e.to_string()))?;
        let raw = self.request(Method::POST, Some(body)).await?;
        let resp = deserialize_json::<AppendRowsResp>(&raw, hyper::StatusCode::CREATED)?;
        Ok(resp.created)
    }
} // end of impl AppSpreadsheetCtx

#[async_trait]
impl AbstractSpreadsheet for AppSpreadsheetCtx {
    async fn fetch_rows(&self) -> Result<Vec<SheetRowModel>, AppProcessorError> {
        self._fetch_rows().await.map_err(|reason| {
            let logctx = &self.logctx;
            app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", reason);
            AppProcessorError {
                reason,
                fn_label: AppProcessorFnLabel::FetchRows,
            }
        })
    }

    async fn append_rows(
        &self,
        rows: Vec<HashMap<String, String>>,
    ) -> Result<usize, AppProcessorError> {
        self._append_rows(rows).await.map_err(|reason| {
            let logctx = &self.logctx;
            app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", reason);
            AppProcessorError {
                reason,
                fn_label: AppProcessorFnLabel::AppendRows,
            }
        })
    }
}

// rows are kept in memory, appended rows are visible to subsequent reads
pub(super) struct MockSpreadsheet {
    rows: Mutex<Vec<HashMap<String, JsnVal>>>,
}

impl MockSpreadsheet {
    pub(super) fn build(basepath: &AppBasepathCfg, data_src: &str) -> Result<Self, AppProcessorError> {
        let rows = load_mock_data::<Vec<HashMap<String, JsnVal>>>(
            basepath,
            data_src,
            AppProcessorFnLabel::TryBuild,
        )?;
        Ok(Self {
            rows: Mutex::new(rows),
        })
    }
}

#[async_trait]
impl AbstractSpreadsheet for MockSpreadsheet {
    async fn fetch_rows(&self) -> Result<Vec<SheetRowModel>, AppProcessorError> {
        let guard = self.rows.lock().map_err(|_e| AppProcessorError {
            reason: AppProcessorErrorReason::MockData("lock-poisoned".to_string()),
            fn_label: AppProcessorFnLabel::FetchRows,
        })?;
        Ok(into_sheet_rows(guard.clone()))
    }

    async fn append_rows(
        &self,
        rows: Vec<HashMap<String, String>>,
    ) -> Result<usize, AppProcessorError> {
        let mut guard = self.rows.lock().map_err(|_e| AppProcessorError {
            reason: AppProcessorErrorReason::MockData("lock-poisoned".to_string()),
            fn_label: AppProcessorFnLabel::AppendRows,
        })?;
        let num = rows.len();
        let iter = rows.into_iter().map(|r| {
            r.into_iter()
                .map(|(k, v)| (k, JsnVal::String(v)))
                .collect::<HashMap<_, _>>()
        });
        guard.extend(iter);
        Ok(num)
    }
}
