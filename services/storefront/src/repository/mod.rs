mod in_mem;

use std::boxed::Box;
use std::result::Result as DefaultResult;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use storefront_common::error::AppErrorCode;

use crate::adapter::datastore::AppDataStoreContext;
use crate::error::AppError;
use crate::model::CartModel;

pub use in_mem::cart::CartInMemRepo;
pub use in_mem::payment::PaymentRecordInMemRepo;

// the repository instance may be used across an await, the future created by
// app callers has to be able to pass to different threads
#[async_trait]
pub trait AbsCartRepo: Sync + Send {
    /// `None` if the session has never saved a cart, or the cart was discarded
    async fn fetch_cart(&self, session_id: &str) -> DefaultResult<Option<CartModel>, AppError>;

    /// write all lines of the cart in their current order, the version
    /// counter of the given cart is increased before saving
    async fn save(&self, obj: &mut CartModel) -> DefaultResult<usize, AppError>;

    // refresh last access time without changing the cart version
    async fn touch(&self, obj: &CartModel) -> DefaultResult<(), AppError>;

    async fn discard(&self, session_id: &str) -> DefaultResult<(), AppError>;

    /// remove all carts not accessed within the TTL, return number of carts
    /// removed
    async fn purge_expired(&self, now: DateTime<Utc>, ttl_secs: u32) -> DefaultResult<usize, AppError>;
}

// payment intents already turned into orders
#[async_trait]
pub trait AbsPaymentRecordRepo: Sync + Send {
    /// mark the payment intent as confirmed by the session, return `false`
    /// if the intent has been confirmed before
    async fn claim_intent(
        &self,
        intent_id: &str,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> DefaultResult<bool, AppError>;

    /// a session can only replay its own intent, records older than the
    /// session TTL are no longer needed
    async fn purge_expired(&self, now: DateTime<Utc>, ttl_secs: u32) -> DefaultResult<usize, AppError>;
}

pub async fn app_repo_cart(
    ds: Arc<AppDataStoreContext>,
) -> DefaultResult<Box<dyn AbsCartRepo>, AppError> {
    if let Some(m) = &ds.in_mem {
        let obj = CartInMemRepo::new(m.clone()).await?;
        Ok(Box::new(obj))
    } else {
        Err(AppError {
            code: AppErrorCode::MissingDataStore,
            detail: Some("unknown-type".to_string()),
        })
    }
}

pub async fn app_repo_payment_record(
    ds: Arc<AppDataStoreContext>,
) -> DefaultResult<Box<dyn AbsPaymentRecordRepo>, AppError> {
    if let Some(m) = &ds.in_mem {
        let obj = PaymentRecordInMemRepo::new(m.clone()).await?;
        Ok(Box::new(obj))
    } else {
        Err(AppError {
            code: AppErrorCode::MissingDataStore,
            detail: Some("unknown-type".to_string()),
        })
    }
}
