mod in_mem;

use std::boxed::Box;
use std::sync::Arc;

use storefront_common::config::AppDataStoreCfg;
use storefront_common::error::AppErrorCode;
use storefront_common::logging::{app_log_event, AppLogContext, AppLogLevel};

pub use in_mem::{
    AbsDStoreFilterKeyOp, AbstInMemoryDStore, AppInMemDeleteInfo, AppInMemFetchKeys,
    AppInMemFetchedData, AppInMemFetchedSingleRow, AppInMemFetchedSingleTable,
    AppInMemUpdateData, AppInMemoryDStore,
};

use crate::error::AppError;

pub struct AppDataStoreContext {
    pub in_mem: Option<Arc<Box<dyn AbstInMemoryDStore>>>,
}

impl AppDataStoreContext {
    pub fn new(cfg: &[AppDataStoreCfg], logctx: Arc<AppLogContext>) -> Result<Self, AppError> {
        let mut in_mem = None;
        for c in cfg {
            match c {
                AppDataStoreCfg::InMemory(d) => {
                    if in_mem.is_some() {
                        app_log_event!(
                            logctx,
                            AppLogLevel::WARNING,
                            "duplicate in-memory store, alias:{}",
                            d.alias
                        );
                        continue;
                    }
                    let item: Box<dyn AbstInMemoryDStore> = Box::new(AppInMemoryDStore::new(d));
                    in_mem = Some(Arc::new(item));
                }
            }
        }
        if in_mem.is_none() {
            return Err(AppError {
                code: AppErrorCode::MissingDataStore,
                detail: Some("in-memory".to_string()),
            });
        }
        Ok(Self { in_mem })
    }
} // end of impl AppDataStoreContext
