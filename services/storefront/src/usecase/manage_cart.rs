use std::boxed::Box;
use std::result::Result as DefaultResult;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use storefront_common::error::AppErrorCode;
use storefront_common::logging::{app_log_event, AppLogContext, AppLogLevel};

use crate::error::AppError;
use crate::model::{CartItemModel, CartModel, CartUpdateError};
use crate::repository::AbsCartRepo;

pub enum CartMutation {
    AddItem(CartItemModel),
    UpdateQuantity { item_id: String, quantity: u32 },
    RemoveItem(String),
    Clear,
}

pub struct RetrieveCartUseCase {
    pub repo: Box<dyn AbsCartRepo>,
    pub logctx: Arc<AppLogContext>,
    pub ttl_secs: u32,
}
pub struct ModifyCartUseCase {
    pub repo: Box<dyn AbsCartRepo>,
    pub logctx: Arc<AppLogContext>,
    pub ttl_secs: u32,
}

pub enum RetrieveCartUsKsResult {
    Success(CartModel),
    ServerError(AppError),
}
pub enum ModifyCartUsKsResult {
    Success(CartModel),
    ItemNotFound,
    ServerError(AppError),
}

/// load cart of the session, a cart not accessed within the session TTL is
/// discarded and replaced with an empty one
pub(crate) async fn load_active_cart(
    repo: &dyn AbsCartRepo,
    logctx: &Arc<AppLogContext>,
    session_id: &str,
    ttl_secs: u32,
    now: DateTime<Utc>,
) -> DefaultResult<CartModel, AppError> {
    let saved = repo.fetch_cart(session_id).await?;
    let obj = match saved {
        Some(c) if c.is_expired(now, ttl_secs) => {
            app_log_event!(
                logctx,
                AppLogLevel::INFO,
                "cart expired, session:{session_id}, last-access:{}",
                c.last_access
            );
            repo.discard(session_id).await?;
            CartModel::new(session_id.to_string(), now)
        }
        Some(mut c) => {
            c.last_access = now;
            c
        }
        None => CartModel::new(session_id.to_string(), now),
    };
    Ok(obj)
}

/// save the cart, if the store is full then the carts left behind by expired
/// sessions are removed and the save is tried once again
pub(crate) async fn save_reclaiming(
    repo: &dyn AbsCartRepo,
    logctx: &Arc<AppLogContext>,
    obj: &mut CartModel,
    ttl_secs: u32,
    now: DateTime<Utc>,
) -> DefaultResult<usize, AppError> {
    match repo.save(obj).await {
        Err(e) if e.code == AppErrorCode::ExceedingMaxLimit => {
            let num_purged = repo.purge_expired(now, ttl_secs).await?;
            app_log_event!(
                logctx,
                AppLogLevel::INFO,
                "cart store full, {}, expired carts removed:{num_purged}",
                e
            );
            repo.save(obj).await
        }
        others => others,
    }
}

impl RetrieveCartUseCase {
    pub async fn execute(self, session_id: &str, now: DateTime<Utc>) -> RetrieveCartUsKsResult {
        match self._execute(session_id, now).await {
            Ok(c) => RetrieveCartUsKsResult::Success(c),
            Err(e) => RetrieveCartUsKsResult::ServerError(e),
        }
    }

    async fn _execute(&self, session_id: &str, now: DateTime<Utc>) -> DefaultResult<CartModel, AppError> {
        let repo = self.repo.as_ref();
        let obj = load_active_cart(repo, &self.logctx, session_id, self.ttl_secs, now).await?;
        // carts never saved are not written on read
        if obj.version > 0 {
            repo.touch(&obj).await?;
        }
        Ok(obj)
    }
}

impl ModifyCartUseCase {
    pub async fn execute(
        self,
        session_id: &str,
        op: CartMutation,
        now: DateTime<Utc>,
    ) -> ModifyCartUsKsResult {
        match self._execute(session_id, op, now).await {
            Ok(Some(c)) => ModifyCartUsKsResult::Success(c),
            Ok(None) => ModifyCartUsKsResult::ItemNotFound,
            Err(e) => ModifyCartUsKsResult::ServerError(e),
        }
    }

    // concurrent requests of the same session are not serialised, the last
    // save overwrites the others
    async fn _execute(
        &self,
        session_id: &str,
        op: CartMutation,
        now: DateTime<Utc>,
    ) -> DefaultResult<Option<CartModel>, AppError> {
        let repo = self.repo.as_ref();
        let mut obj = load_active_cart(repo, &self.logctx, session_id, self.ttl_secs, now).await?;
        match op {
            CartMutation::AddItem(item) => obj.add_item(item),
            CartMutation::UpdateQuantity { item_id, quantity } => {
                match obj.update_quantity(item_id.as_str(), quantity) {
                    Ok(()) => {}
                    Err(CartUpdateError::ItemNotFound) => return Ok(None),
                }
            }
            CartMutation::RemoveItem(item_id) => {
                let _num_removed = obj.remove_item(item_id.as_str());
            }
            CartMutation::Clear => obj.clear(),
        }
        let _num_saved = save_reclaiming(repo, &self.logctx, &mut obj, self.ttl_secs, now).await?;
        let logctx = &self.logctx;
        app_log_event!(
            logctx,
            AppLogLevel::DEBUG,
            "session:{session_id}, num-lines:{}, version:{}",
            obj.items.len(),
            obj.version
        );
        Ok(Some(obj))
    }
} // end of impl ModifyCartUseCase
