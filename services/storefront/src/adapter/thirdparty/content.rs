use std::collections::HashMap;
use std::result::Result;
use std::sync::Arc;

use async_trait::async_trait;
use hyper::header::{HeaderName, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use hyper::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsnVal;
use tokio_native_tls::TlsConnector;

use storefront_common::confidentiality::AbstractConfidentiality;
use storefront_common::config::{App3rdPartyCfg, AppBasepathCfg};
use storefront_common::logging::{app_log_event, AppLogContext, AppLogLevel};

use super::base_client::{deserialize_json, header_value, secure_connector, BaseClient};
use super::{
    load_credential, load_mock_data, AbstractContentApi, AppProcessorError,
    AppProcessorErrorReason, AppProcessorFnLabel,
};
use crate::constant::HTTP_CONTENT_TYPE_JSON;

const PAGE_LIMIT: u32 = 100;
// upper bound of pages read in one query, collections of this site are small
const MAX_NUM_PAGES: u32 = 20;

#[derive(Deserialize)]
struct ContentApiCredential {
    api_key: String,
    site_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryPaging {
    limit: u32,
    offset: u32,
}
#[derive(Serialize)]
struct QuerySpec {
    paging: QueryPaging,
}
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryItemsReq<'a> {
    data_collection_id: &'a str,
    query: QuerySpec,
}

#[derive(Deserialize)]
struct DataItem {
    id: String,
    data: JsnVal,
}
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryItemsResp {
    data_items: Vec<DataItem>,
}
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetItemResp {
    data_item: DataItem,
}

impl DataItem {
    // the payload of an item does not always carry its own ID
    fn into_value(self) -> JsnVal {
        let Self { id, mut data } = self;
        if let Some(obj) = data.as_object_mut() {
            obj.entry("_id").or_insert(JsnVal::String(id));
        }
        data
    }
}

pub(super) struct AppContentApiCtx {
    cfg: Arc<App3rdPartyCfg>,
    secure_connector: TlsConnector,
    credential: ContentApiCredential,
    logctx: Arc<AppLogContext>,
}

impl AppContentApiCtx {
    pub(super) fn try_build(
        cfg: Arc<App3rdPartyCfg>,
        cfdntl: &dyn AbstractConfidentiality,
        logctx: Arc<AppLogContext>,
    ) -> Result<Self, AppProcessorError> {
        let credential = match cfg.as_ref() {
            App3rdPartyCfg::dev {
                confidentiality_path,
                ..
            } => load_credential::<ContentApiCredential>(cfdntl, confidentiality_path)?,
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
        path: &str,
        method: Method,
        body: Option<Vec<u8>>,
    ) -> Result<(Vec<u8>, StatusCode), AppProcessorErrorReason> {
        let (host, port) = match self.cfg.as_ref() {
            App3rdPartyCfg::dev { host, port, .. } => (host.as_str(), *port),
            App3rdPartyCfg::test { .. } => return Err(AppProcessorErrorReason::InvalidConfig),
        };
        let headers = vec![
            (AUTHORIZATION, header_value(self.credential.api_key.as_str())?),
            (
                HeaderName::from_static("wix-site-id"),
                header_value(self.credential.site_id.as_str())?,
            ),
            (ACCEPT, header_value(HTTP_CONTENT_TYPE_JSON)?),
            (CONTENT_TYPE, header_value(HTTP_CONTENT_TYPE_JSON)?),
        ];
        let mut client =
            BaseClient::try_build(self.logctx.clone(), &self.secure_connector, host, port).await?;
        let out = client.execute(path, method, body, headers).await?;
        Ok(out)
    }

    async fn _query_items(&self, collection: &str) -> Result<Vec<JsnVal>, AppProcessorErrorReason> {
        let mut out = Vec::new();
        for page in 0..MAX_NUM_PAGES {
            let req = QueryItemsReq {
                data_collection_id: collection,
                query: QuerySpec {
                    paging: QueryPaging {
                        limit: PAGE_LIMIT,
                        offset: page * PAGE_LIMIT,
                    },
                },
            };
            let body = serde_json::to_vec(&req)
                .map_err(|e| AppProcessorErrorReason::CorruptedResponse(e.to_string()))?;
            let (raw, status) = self
                .request("/wix-data/v2/items/query", Method::POST, Some(body))
                .await?;
            if !status.is_success() {
                return Err(AppProcessorErrorReason::RemoteStatus(status.as_u16()));
            }
            let resp = deserialize_json::<QueryItemsResp>(&raw, status)?;
            let num_fetched = resp.data_items.len();
            out.extend(resp.data_items.into_iter().map(DataItem::into_value));
            if num_fetched < PAGE_LIMIT as usize {
                break;
            }
        }
        Ok(out)
    }

    async fn _get_item(
        &self,
        collection: &str,
        id_: &str,
    ) -> Result<Option<JsnVal>, AppProcessorErrorReason> {
        let path = format!("/wix-data/v2/items/{id_}?dataCollectionId={collection}");
        let (raw, status) = self.request(path.as_str(), Method::GET, None).await?;
        if status == StatusCode::NOT_FOUND {
            Ok(None)
        } else if status.is_success() {
            let resp = deserialize_json::<GetItemResp>(&raw, status)?;
            Ok(Some(resp.data_item.into_value()))
        } else {
            Err(AppProcessorErrorReason::RemoteStatus(status.as_u16()))
        }
    }
} // end of impl AppContentApiCtx

#[async_trait]
impl AbstractContentApi for AppContentApiCtx {
    async fn query_items(&self, collection: &str) -> Result<Vec<JsnVal>, AppProcessorError> {
        self._query_items(collection).await.map_err(|reason| {
            let logctx = &self.logctx;
            app_log_event!(logctx, AppLogLevel::ERROR, "collection:{collection}, {:?}", reason);
            AppProcessorError {
                reason,
                fn_label: AppProcessorFnLabel::QueryItems,
            }
        })
    }

    async fn get_item(
        &self,
        collection: &str,
        id_: &str,
    ) -> Result<Option<JsnVal>, AppProcessorError> {
        self._get_item(collection, id_).await.map_err(|reason| {
            let logctx = &self.logctx;
            app_log_event!(
                logctx,
                AppLogLevel::ERROR,
                "collection:{collection}, id:{id_}, {:?}",
                reason
            );
            AppProcessorError {
                reason,
                fn_label: AppProcessorFnLabel::GetItem,
            }
        })
    }
} // end of impl AppContentApiCtx

// items of each collection loaded from fixture file, keyed by collection name
pub(super) struct MockContentApi {
    collections: HashMap<String, Vec<JsnVal>>,
}

impl MockContentApi {
    pub(super) fn build(basepath: &AppBasepathCfg, data_src: &str) -> Result<Self, AppProcessorError> {
        let collections = load_mock_data::<HashMap<String, Vec<JsnVal>>>(
            basepath,
            data_src,
            AppProcessorFnLabel::TryBuild,
        )?;
        Ok(Self { collections })
    }
}

#[async_trait]
impl AbstractContentApi for MockContentApi {
    async fn query_items(&self, collection: &str) -> Result<Vec<JsnVal>, AppProcessorError> {
        self.collections
            .get(collection)
            .cloned()
            .ok_or(AppProcessorError {
                reason: AppProcessorErrorReason::RemoteStatus(404),
                fn_label: AppProcessorFnLabel::QueryItems,
            })
    }

    async fn get_item(
        &self,
        collection: &str,
        id_: &str,
    ) -> Result<Option<JsnVal>, AppProcessorError> {
        let items = self.query_items(collection).await.map_err(|e| AppProcessorError {
            reason: e.reason,
            fn_label: AppProcessorFnLabel::GetItem,
        })?;
        let found = items
            .into_iter()
            .find(|item| item.get("_id").and_then(JsnVal::as_str) == Some(id_));
        Ok(found)
    }
}
