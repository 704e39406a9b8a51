use std::boxed::Box;
use std::collections::HashMap;
use std::result::Result as DefaultResult;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use storefront_common::error::AppErrorCode;

use crate::adapter::datastore::{
    AbsDStoreFilterKeyOp, AbstInMemoryDStore, AppInMemFetchedSingleRow,
    AppInMemFetchedSingleTable,
};
use crate::error::AppError;
use crate::model::{CartItemModel, CartModel};
use crate::repository::AbsCartRepo;

#[allow(non_snake_case)]
mod CartTable {
    use super::{AppInMemFetchedSingleRow, AppInMemFetchedSingleTable, CartModel, HashMap};
    pub(super) const LABEL: &str = "cart_metadata";
    pub(super) struct UpdateArg<'a>(pub(super) &'a CartModel);

    impl From<UpdateArg<'_>> for AppInMemFetchedSingleRow {
        fn from(value: UpdateArg<'_>) -> Self {
            let obj = value.0;
            vec![obj.last_access.to_rfc3339(), obj.version.to_string()]
        }
    }
    impl From<UpdateArg<'_>> for AppInMemFetchedSingleTable {
        fn from(value: UpdateArg<'_>) -> Self {
            let key = value.0.session_id.clone();
            let row = AppInMemFetchedSingleRow::from(value);
            HashMap::from([(key, row)])
        }
    }
} // end of inner-mod CartTable

#[allow(non_snake_case)]
mod CartLineTable {
    use super::{AppInMemFetchedSingleTable, CartModel};
    pub(super) const LABEL: &str = "cart_line";
    pub(super) struct UpdateArg<'a>(pub(super) &'a CartModel);

    // position of each line is part of the key, that keeps the order of
    // the lines in the cart
    pub(super) fn pkey(session_id: &str, idx: usize) -> String {
        format!("{session_id}/{idx:04}")
    }
    pub(super) fn split_pkey(key: &str) -> Option<(&str, usize)> {
        let (sid, idx) = key.rsplit_once('/')?;
        idx.parse::<usize>().ok().map(|i| (sid, i))
    }

    impl From<UpdateArg<'_>> for AppInMemFetchedSingleTable {
        fn from(value: UpdateArg<'_>) -> Self {
            let obj = value.0;
            let opt = |v: &Option<String>| v.clone().unwrap_or_default();
            obj.items
                .iter()
                .enumerate()
                .map(|(idx, item)| {
                    let row = vec![
                        item.id.clone(),
                        opt(&item.variant),
                        item.quantity.to_string(),
                        item.price.to_string(),
                        opt(&item.name),
                        opt(&item.image),
                        opt(&item.sku),
                    ];
                    (pkey(obj.session_id.as_str(), idx), row)
                })
                .collect()
        }
    }
} // end of inner-mod CartLineTable

struct InnerFilterKeyOp<'a> {
    session_ids: &'a [String],
}
impl AbsDStoreFilterKeyOp for InnerFilterKeyOp<'_> {
    fn filter(&self, k: &str, _v: &[String]) -> bool {
        CartLineTable::split_pkey(k)
            .map(|(sid, _)| self.session_ids.iter().any(|s| s == sid))
            .unwrap_or(false)
    }
}

// metadata rows whose last access is earlier than the given time, rows
// which cannot be parsed are treated as expired as well
struct ExpiredFilterKeyOp {
    threshold: DateTime<Utc>,
}
impl AbsDStoreFilterKeyOp for ExpiredFilterKeyOp {
    fn filter(&self, _k: &str, v: &[String]) -> bool {
        v.first()
            .and_then(|t| DateTime::parse_from_rfc3339(t.as_str()).ok())
            .map(|t| t.with_timezone(&Utc) < self.threshold)
            .unwrap_or(true)
    }
}

fn corrupted(detail: String) -> AppError {
    AppError {
        code: AppErrorCode::DataCorruption,
        detail: Some(detail),
    }
}

impl TryFrom<AppInMemFetchedSingleRow> for CartItemModel {
    type Error = AppError;
    fn try_from(value: AppInMemFetchedSingleRow) -> DefaultResult<Self, Self::Error> {
        let mut iter = value.into_iter();
        let mut next_field = || {
            iter.next()
                .ok_or_else(|| corrupted("cart-line-num-fields".to_string()))
        };
        let id = next_field()?;
        let variant = next_field()?;
        let quantity = next_field()?
            .parse::<u32>()
            .map_err(|e| corrupted(e.to_string()))?;
        let price =
            Decimal::from_str(next_field()?.as_str()).map_err(|e| corrupted(e.to_string()))?;
        let (name, image, sku) = (next_field()?, next_field()?, next_field()?);
        let non_empty = |s: String| if s.is_empty() { None } else { Some(s) };
        Ok(Self {
            id,
            variant: non_empty(variant),
            quantity,
            price,
            name: non_empty(name),
            image: non_empty(image),
            sku: non_empty(sku),
        })
    }
}

fn parse_metadata(row: AppInMemFetchedSingleRow) -> DefaultResult<(DateTime<Utc>, u32), AppError> {
    let (last_access, version) = match row.as_slice() {
        [t, v] => (t, v),
        _others => return Err(corrupted("cart-metadata-num-fields".to_string())),
    };
    let last_access = DateTime::parse_from_rfc3339(last_access.as_str())
        .map_err(|e| corrupted(e.to_string()))?
        .with_timezone(&Utc);
    let version = version.parse::<u32>().map_err(|e| corrupted(e.to_string()))?;
    Ok((last_access, version))
}

pub struct CartInMemRepo {
    datastore: Arc<Box<dyn AbstInMemoryDStore>>,
}

impl CartInMemRepo {
    pub async fn new(m: Arc<Box<dyn AbstInMemoryDStore>>) -> DefaultResult<Self, AppError> {
        m.create_table(CartTable::LABEL).await?;
        m.create_table(CartLineTable::LABEL).await?;
        Ok(Self { datastore: m })
    }

    async fn line_keys(&self, session_ids: &[String]) -> DefaultResult<Vec<String>, AppError> {
        let op = InnerFilterKeyOp { session_ids };
        self.datastore
            .filter_keys(CartLineTable::LABEL.to_string(), &op)
            .await
    }

    async fn session_line_keys(&self, session_id: &str) -> DefaultResult<Vec<String>, AppError> {
        self.line_keys(&[session_id.to_string()]).await
    }

    async fn _save(&self, obj: &CartModel) -> DefaultResult<usize, AppError> {
        let num_lines = obj.items.len();
        let stale_keys = self
            .session_line_keys(obj.session_id.as_str())
            .await?
            .into_iter()
            .filter(|k| {
                CartLineTable::split_pkey(k)
                    .map(|(_, idx)| idx >= num_lines)
                    .unwrap_or(false)
            })
            .collect::<Vec<_>>();
        let rows0: AppInMemFetchedSingleTable = CartTable::UpdateArg(obj).into();
        let rows1: AppInMemFetchedSingleTable = CartLineTable::UpdateArg(obj).into();
        let data = HashMap::from([
            (CartTable::LABEL.to_string(), rows0),
            (CartLineTable::LABEL.to_string(), rows1),
        ]);
        let num_saved = self.datastore.save(data).await?;
        if !stale_keys.is_empty() {
            let info = HashMap::from([(CartLineTable::LABEL.to_string(), stale_keys)]);
            let _num_deleted = self.datastore.delete(info).await?;
        }
        Ok(num_saved)
    }
}

#[async_trait]
impl AbsCartRepo for CartInMemRepo {
    async fn fetch_cart(&self, session_id: &str) -> DefaultResult<Option<CartModel>, AppError> {
        let mut line_keys = self.session_line_keys(session_id).await?;
        line_keys.sort_by_key(|k| CartLineTable::split_pkey(k).map(|(_, idx)| idx));
        let info = HashMap::from([
            (CartTable::LABEL.to_string(), vec![session_id.to_string()]),
            (CartLineTable::LABEL.to_string(), line_keys.clone()),
        ]);
        let mut result = self.datastore.fetch(info).await?;
        let metadata = result
            .remove(CartTable::LABEL)
            .and_then(|mut t| t.remove(session_id));
        let (last_access, version) = match metadata {
            Some(row) => parse_metadata(row)?,
            None => return Ok(None),
        };
        let mut rows_lines = result.remove(CartLineTable::LABEL).unwrap_or_default();
        let items = line_keys
            .iter()
            .filter_map(|k| rows_lines.remove(k))
            .map(CartItemModel::try_from)
            .collect::<DefaultResult<Vec<_>, AppError>>()?;
        Ok(Some(CartModel {
            session_id: session_id.to_string(),
            items,
            version,
            last_access,
        }))
    } // end of fn fetch_cart

    async fn save(&self, obj: &mut CartModel) -> DefaultResult<usize, AppError> {
        obj.version = obj.version.wrapping_add(1);
        let result = self._save(obj).await;
        if result.is_err() {
            obj.version = obj.version.wrapping_sub(1);
        }
        result
    }

    async fn touch(&self, obj: &CartModel) -> DefaultResult<(), AppError> {
        let rows: AppInMemFetchedSingleTable = CartTable::UpdateArg(obj).into();
        let data = HashMap::from([(CartTable::LABEL.to_string(), rows)]);
        let _num_saved = self.datastore.save(data).await?;
        Ok(())
    }

    async fn discard(&self, session_id: &str) -> DefaultResult<(), AppError> {
        let line_keys = self.session_line_keys(session_id).await?;
        let info = HashMap::from([
            (CartTable::LABEL.to_string(), vec![session_id.to_string()]),
            (CartLineTable::LABEL.to_string(), line_keys),
        ]);
        let _num_affected = self.datastore.delete(info).await?;
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>, ttl_secs: u32) -> DefaultResult<usize, AppError> {
        let op = ExpiredFilterKeyOp {
            threshold: now - Duration::seconds(ttl_secs as i64),
        };
        let expired = self
            .datastore
            .filter_keys(CartTable::LABEL.to_string(), &op)
            .await?;
        if expired.is_empty() {
            return Ok(0);
        }
        let line_keys = self.line_keys(&expired).await?;
        let num_carts = expired.len();
        let info = HashMap::from([
            (CartTable::LABEL.to_string(), expired),
            (CartLineTable::LABEL.to_string(), line_keys),
        ]);
        let _num_affected = self.datastore.delete(info).await?;
        Ok(num_carts)
    }
} // end of impl AbsCartRepo for CartInMemRepo
