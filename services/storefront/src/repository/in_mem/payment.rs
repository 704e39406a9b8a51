use std::boxed::Box;
use std::collections::HashMap;
use std::result::Result as DefaultResult;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::adapter::datastore::{AbsDStoreFilterKeyOp, AbstInMemoryDStore};
use crate::error::AppError;
use crate::repository::AbsPaymentRecordRepo;

#[allow(non_snake_case)]
mod ConfirmedIntentTable {
    pub(super) const LABEL: &str = "confirmed_intent";
    pub(super) const IDX_CONFIRMED_AT: usize = 1;
}

struct ConfirmedBeforeOp {
    threshold: DateTime<Utc>,
}
impl AbsDStoreFilterKeyOp for ConfirmedBeforeOp {
    fn filter(&self, _k: &str, v: &[String]) -> bool {
        v.get(ConfirmedIntentTable::IDX_CONFIRMED_AT)
            .and_then(|t| DateTime::parse_from_rfc3339(t.as_str()).ok())
            .map(|t| t.with_timezone(&Utc) < self.threshold)
            .unwrap_or(true)
    }
}

pub struct PaymentRecordInMemRepo {
    datastore: Arc<Box<dyn AbstInMemoryDStore>>,
}

impl PaymentRecordInMemRepo {
    pub async fn new(m: Arc<Box<dyn AbstInMemoryDStore>>) -> DefaultResult<Self, AppError> {
        m.create_table(ConfirmedIntentTable::LABEL).await?;
        Ok(Self { datastore: m })
    }
}

#[async_trait]
impl AbsPaymentRecordRepo for PaymentRecordInMemRepo {
    async fn claim_intent(
        &self,
        intent_id: &str,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> DefaultResult<bool, AppError> {
        let row = vec![session_id.to_string(), now.to_rfc3339()];
        let rows = HashMap::from([(intent_id.to_string(), row)]);
        let data = HashMap::from([(ConfirmedIntentTable::LABEL.to_string(), rows)]);
        let num_inserted = self.datastore.save_absent(data).await?;
        Ok(num_inserted == 1)
    }

    async fn purge_expired(&self, now: DateTime<Utc>, ttl_secs: u32) -> DefaultResult<usize, AppError> {
        let op = ConfirmedBeforeOp {
            threshold: now - Duration::seconds(ttl_secs as i64),
        };
        let keys = self
            .datastore
            .filter_keys(ConfirmedIntentTable::LABEL.to_string(), &op)
            .await?;
        if keys.is_empty() {
            return Ok(0);
        }
        let info = HashMap::from([(ConfirmedIntentTable::LABEL.to_string(), keys)]);
        self.datastore.delete(info).await
    }
}
