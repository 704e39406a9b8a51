use std::boxed::Box;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use futures_util::future::join_all;

use storefront_common::logging::{app_log_event, AppLogContext, AppLogLevel};

use super::product_lookup::fetch_product;
use crate::adapter::thirdparty::{AbstractContentApi, AbstractSpreadsheet};
use crate::error::AppError;
use crate::model::{
    aggregate_sheet_rows, ContainerModel, DeliveryRouteModel, MemberContainerModel,
    MemberIdentity, ProductModel,
};

pub struct ContainerListUseCase {
    pub spreadsheet: Arc<Box<dyn AbstractSpreadsheet>>,
    pub route: DeliveryRouteModel,
    pub logctx: Arc<AppLogContext>,
}

pub struct MemberContainersUseCase {
    pub content: Arc<Box<dyn AbstractContentApi>>,
    pub container_collection: String,
    pub product_collection: String,
    pub route: DeliveryRouteModel,
    pub logctx: Arc<AppLogContext>,
}

pub struct MemberContainersOutput {
    pub containers: Vec<MemberContainerModel>,
    pub products: HashMap<String, ProductModel>,
}

impl ContainerListUseCase {
    pub async fn execute(self, today: NaiveDate) -> Result<Vec<ContainerModel>, AppError> {
        let rows = self.spreadsheet.fetch_rows().await.map_err(|e| {
            let e = AppError::from(e);
            let logctx = &self.logctx;
            app_log_event!(logctx, AppLogLevel::ERROR, "{}", e);
            e
        })?;
        let num_rows = rows.len();
        let out = aggregate_sheet_rows(rows, &self.route, today);
        let logctx = &self.logctx;
        app_log_event!(
            logctx,
            AppLogLevel::DEBUG,
            "rows:{num_rows}, containers:{}",
            out.len()
        );
        Ok(out)
    }
}

impl MemberContainersUseCase {
    pub async fn execute(
        self,
        member: MemberIdentity,
        today: NaiveDate,
    ) -> Result<MemberContainersOutput, AppError> {
        let logctx = &self.logctx;
        if member.is_empty() {
            app_log_event!(logctx, AppLogLevel::WARNING, "webhook-without-member");
            return Ok(MemberContainersOutput {
                containers: Vec::new(),
                products: HashMap::new(),
            });
        }
        let content = &**self.content;
        let items = content
            .query_items(self.container_collection.as_str())
            .await
            .map_err(|e| {
                let e = AppError::from(e);
                app_log_event!(logctx, AppLogLevel::ERROR, "{}", e);
                e
            })?;
        let containers = MemberContainerModel::filter_owned(&items, &member, &self.route, today);
        let mut product_ids: Vec<&str> = Vec::new();
        for pid in containers.iter().flat_map(|c| c.product_ids.iter()) {
            if !product_ids.contains(&pid.as_str()) {
                product_ids.push(pid.as_str());
            }
        }
        let collection = self.product_collection.as_str();
        let futs = product_ids
            .iter()
            .map(|pid| fetch_product(content, collection, pid));
        let results = join_all(futs).await;
        let mut products = HashMap::new();
        for (pid, result) in product_ids.iter().zip(results) {
            match result {
                Ok(Some(p)) => {
                    products.insert(pid.to_string(), p);
                }
                Ok(None) => {
                    app_log_event!(logctx, AppLogLevel::WARNING, "product-missing:{pid}");
                }
                Err(e) => {
                    app_log_event!(logctx, AppLogLevel::ERROR, "product:{pid}, {}", e);
                }
            }
        }
        Ok(MemberContainersOutput {
            containers,
            products,
        })
    } // end of fn execute
} // end of impl MemberContainersUseCase
