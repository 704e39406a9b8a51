use std::boxed::Box;
use std::sync::Arc;

use futures_util::future::join_all;

use storefront_common::error::AppErrorCode;
use storefront_common::logging::{app_log_event, AppLogContext, AppLogLevel};

use crate::adapter::thirdparty::AbstractContentApi;
use crate::constant::hard_limit;
use crate::error::AppError;
use crate::model::{CategoryLookupModel, ProductModel};

pub struct ProductDetailUseCase {
    pub content: Arc<Box<dyn AbstractContentApi>>,
    pub collection: String,
    pub logctx: Arc<AppLogContext>,
}
pub struct ProductBatchUseCase {
    pub content: Arc<Box<dyn AbstractContentApi>>,
    pub collection: String,
    pub logctx: Arc<AppLogContext>,
}
pub struct CategoryLookupUseCase {
    pub content: Arc<Box<dyn AbstractContentApi>>,
    pub collection: String,
    pub logctx: Arc<AppLogContext>,
}

pub enum ProductDetailUsKsResult {
    Success(ProductModel),
    NotFound,
    ServerError(AppError),
}
pub enum ProductBatchUsKsResult {
    // keep the order of the requested IDs, `None` for any product which
    // cannot be loaded
    Success(Vec<Option<ProductModel>>),
    ExceedLimit(usize),
}

pub(crate) async fn fetch_product(
    content: &dyn AbstractContentApi,
    collection: &str,
    product_id: &str,
) -> Result<Option<ProductModel>, AppError> {
    match content.get_item(collection, product_id).await? {
        Some(item) => ProductModel::from_content_item(&item)
            .map(Some)
            .ok_or(AppError {
                code: AppErrorCode::DataCorruption,
                detail: Some(format!("product-id:{product_id}")),
            }),
        None => Ok(None),
    }
}

impl ProductDetailUseCase {
    pub async fn execute(self, product_id: &str) -> ProductDetailUsKsResult {
        let result = fetch_product(&**self.content, &self.collection, product_id).await;
        match result {
            Ok(Some(m)) => ProductDetailUsKsResult::Success(m),
            Ok(None) => ProductDetailUsKsResult::NotFound,
            Err(e) => {
                let logctx = &self.logctx;
                app_log_event!(logctx, AppLogLevel::ERROR, "product:{product_id}, {}", e);
                ProductDetailUsKsResult::ServerError(e)
            }
        }
    }
}

impl ProductBatchUseCase {
    pub async fn execute(self, ids: Vec<String>) -> ProductBatchUsKsResult {
        if ids.len() > hard_limit::MAX_PRODUCTS_PER_BATCH {
            return ProductBatchUsKsResult::ExceedLimit(ids.len());
        }
        let content = &**self.content;
        let collection = self.collection.as_str();
        // requests are issued at the same time, the joined results follow
        // the order of the given IDs
        let futs = ids.iter().map(|id| fetch_product(content, collection, id.as_str()));
        let results = join_all(futs).await;
        let logctx = &self.logctx;
        let out = results
            .into_iter()
            .zip(ids.iter())
            .map(|(r, id)| match r {
                Ok(v) => v,
                Err(e) => {
                    app_log_event!(logctx, AppLogLevel::WARNING, "skip product:{id}, {}", e);
                    None
                }
            })
            .collect();
        ProductBatchUsKsResult::Success(out)
    }
}

impl CategoryLookupUseCase {
    /// failure degrades to empty lookup table
    pub async fn execute(self) -> CategoryLookupModel {
        match self.content.query_items(self.collection.as_str()).await {
            Ok(items) => CategoryLookupModel::from_content_items(&items),
            Err(e) => {
                let logctx = &self.logctx;
                app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", e);
                CategoryLookupModel::default()
            }
        }
    }
}
