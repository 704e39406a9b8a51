use std::collections::HashMap;
use std::result::Result as DefaultResult;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use storefront_common::config::AppInMemoryDbCfg;
use storefront_common::error::AppErrorCode;

use crate::error::AppError;

// simple implementation of in-memory data storage

// application callers are responsible to maintain the structure
// of each row in each table. Each element of a row is stringified
// regardless of its original types (integer, decimal number, date)
type InnerRow = Vec<String>;
type InnerTable = HashMap<String, InnerRow>;
type AllTable = HashMap<String, InnerTable>;
pub type AppInMemUpdateData = AllTable;
pub type AppInMemDeleteInfo = HashMap<String, Vec<String>>; // list of IDs per table
pub type AppInMemFetchKeys = HashMap<String, Vec<String>>;
pub type AppInMemFetchedData = AllTable;
pub type AppInMemFetchedSingleTable = InnerTable;
pub type AppInMemFetchedSingleRow = InnerRow;

pub trait AbsDStoreFilterKeyOp: Send + Sync {
    fn filter(&self, k: &str, v: &[String]) -> bool;
}

#[async_trait]
pub trait AbstInMemoryDStore: Send + Sync {
    async fn create_table(&self, label: &str) -> DefaultResult<(), AppError>;
    async fn save(&self, data: AppInMemUpdateData) -> DefaultResult<usize, AppError>;
    // insert only the rows whose keys are not in the table yet, the check
    // and the insertion happen under the same lock, return number of rows
    // inserted
    async fn save_absent(&self, data: AppInMemUpdateData) -> DefaultResult<usize, AppError>;
    async fn delete(&self, info: AppInMemDeleteInfo) -> DefaultResult<usize, AppError>;
    async fn fetch(&self, info: AppInMemFetchKeys) -> DefaultResult<AppInMemFetchedData, AppError>;
    async fn filter_keys(
        &self,
        tbl_label: String,
        op: &dyn AbsDStoreFilterKeyOp,
    ) -> DefaultResult<Vec<String>, AppError>;
}

pub struct AppInMemoryDStore {
    max_items_per_table: u32,
    table_map: Mutex<AllTable>,
}

impl AppInMemoryDStore {
    pub fn new(cfg: &AppInMemoryDbCfg) -> Self {
        Self {
            table_map: Mutex::new(HashMap::new()),
            max_items_per_table: cfg.max_items,
        }
    }

    fn try_get_table(&self) -> DefaultResult<MutexGuard<AllTable>, AppError> {
        self.table_map.lock().map_err(|e| AppError {
            detail: Some(e.to_string()),
            code: AppErrorCode::AcquireLockFailure,
        })
    }

    fn _check_table_existence<'a, I>(_map: &AllTable, mut labels: I) -> DefaultResult<(), AppError>
    where
        I: Iterator<Item = &'a String>,
    {
        if let Some(d) = labels.find(|label| !_map.contains_key(label.as_str())) {
            Err(AppError {
                detail: Some(d.to_string()),
                code: AppErrorCode::DataTableNotExist,
            })
        } else {
            Ok(())
        }
    }

    // number of rows in a table after saving new data, must not exceed the limit
    fn _check_capacity(&self, _map: &AllTable, _data: &AllTable) -> DefaultResult<(), AppError> {
        let limit = self.max_items_per_table as usize;
        let mut invalid = _data.iter().filter(|(label, d_grp)| {
            let table = &_map[label.as_str()];
            let num_new = d_grp.keys().filter(|k| !table.contains_key(*k)).count();
            (table.len() + num_new) > limit
        });
        if let Some((label, _)) = invalid.next() {
            Err(AppError {
                detail: Some(format!("table:{label}, limit:{limit}")),
                code: AppErrorCode::ExceedingMaxLimit,
            })
        } else {
            Ok(())
        }
    }
} // end of impl AppInMemoryDStore

#[async_trait]
impl AbstInMemoryDStore for AppInMemoryDStore {
    async fn create_table(&self, label: &str) -> DefaultResult<(), AppError> {
        let mut _map = self.try_get_table()?;
        if !_map.contains_key(label) {
            _map.insert(label.to_string(), HashMap::new());
        }
        Ok(())
    }

    async fn save(&self, data: AppInMemUpdateData) -> DefaultResult<usize, AppError> {
        let mut _map = self.try_get_table()?;
        Self::_check_table_existence(&_map, data.keys())?;
        self._check_capacity(&_map, &data)?;
        let tot_cnt = data
            .into_iter()
            .map(|(label, d_grp)| {
                let table = _map.entry(label).or_default();
                let num = d_grp.len();
                table.extend(d_grp);
                num
            })
            .sum();
        Ok(tot_cnt)
    } // end of fn save

    async fn save_absent(&self, data: AppInMemUpdateData) -> DefaultResult<usize, AppError> {
        let mut _map = self.try_get_table()?;
        Self::_check_table_existence(&_map, data.keys())?;
        let data = data
            .into_iter()
            .map(|(label, d_grp)| {
                let table = &_map[label.as_str()];
                let fresh = d_grp
                    .into_iter()
                    .filter(|(k, _v)| !table.contains_key(k))
                    .collect::<InnerTable>();
                (label, fresh)
            })
            .collect::<AllTable>();
        self._check_capacity(&_map, &data)?;
        let tot_cnt = data
            .into_iter()
            .map(|(label, d_grp)| {
                let table = _map.entry(label).or_default();
                let num = d_grp.len();
                table.extend(d_grp);
                num
            })
            .sum();
        Ok(tot_cnt)
    } // end of fn save_absent

    async fn delete(&self, info: AppInMemDeleteInfo) -> DefaultResult<usize, AppError> {
        let mut _map = self.try_get_table()?;
        Self::_check_table_existence(&_map, info.keys())?;
        let tot_cnt = info
            .into_iter()
            .map(|(label, ids)| {
                let table = _map.entry(label).or_default();
                ids.iter().filter_map(|id| table.remove(id)).count()
            })
            .sum();
        Ok(tot_cnt)
    }

    async fn fetch(&self, info: AppInMemFetchKeys) -> DefaultResult<AppInMemFetchedData, AppError> {
        let _map = self.try_get_table()?;
        Self::_check_table_existence(&_map, info.keys())?;
        let out = info
            .into_iter()
            .map(|(label, ids)| {
                let table = &_map[label.as_str()];
                let rows = ids
                    .into_iter()
                    .filter_map(|id| table.get(&id).map(|row| (id, row.clone())))
                    .collect::<InnerTable>();
                (label, rows)
            })
            .collect::<AllTable>();
        Ok(out)
    }

    async fn filter_keys(
        &self,
        tbl_label: String,
        op: &dyn AbsDStoreFilterKeyOp,
    ) -> DefaultResult<Vec<String>, AppError> {
        let _map = self.try_get_table()?;
        let table = _map.get(tbl_label.as_str()).ok_or(AppError {
            detail: Some(tbl_label.clone()),
            code: AppErrorCode::DataTableNotExist,
        })?;
        let out = table
            .iter()
            .filter(|(k, v)| op.filter(k.as_str(), v.as_slice()))
            .map(|(k, _v)| k.clone())
            .collect();
        Ok(out)
    }
} // end of impl AbstInMemoryDStore for AppInMemoryDStore
