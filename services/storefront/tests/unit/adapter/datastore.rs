use std::collections::HashMap;
use std::sync::Arc;

use storefront::adapter::datastore::{
    AbsDStoreFilterKeyOp, AbstInMemoryDStore, AppDataStoreContext, AppInMemDeleteInfo,
    AppInMemFetchKeys, AppInMemUpdateData, AppInMemoryDStore,
};
use storefront_common::config::{AppDataStoreCfg, AppInMemoryDbCfg};
use storefront_common::error::AppErrorCode;
use storefront_common::logging::AppLogContext;

use crate::ut_setup_config;

const UT_TABLE_LABEL_A: &str = "ut-table-cart";
const UT_TABLE_LABEL_B: &str = "ut-table-line";

fn ut_row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|s| s.to_string()).collect()
}

async fn ut_setup_dstore(max_items: u32) -> AppInMemoryDStore {
    let cfg = AppInMemoryDbCfg {
        alias: "ut-inmem".to_string(),
        max_items,
    };
    let dstore = AppInMemoryDStore::new(&cfg);
    for label in [UT_TABLE_LABEL_A, UT_TABLE_LABEL_B] {
        let result = dstore.create_table(label).await;
        assert!(result.is_ok());
    }
    dstore
}

struct UtPrefixFilter(&'static str);

impl AbsDStoreFilterKeyOp for UtPrefixFilter {
    fn filter(&self, k: &str, _v: &[String]) -> bool {
        k.starts_with(self.0)
    }
}

#[tokio::test]
async fn save_fetch_ok() {
    let dstore = ut_setup_dstore(10).await;
    let data: AppInMemUpdateData = HashMap::from([
        (
            UT_TABLE_LABEL_A.to_string(),
            HashMap::from([
                ("s1".to_string(), ut_row(&["2026-01-01T00:00:00+00:00", "1"])),
                ("s2".to_string(), ut_row(&["2026-01-02T00:00:00+00:00", "4"])),
            ]),
        ),
        (
            UT_TABLE_LABEL_B.to_string(),
            HashMap::from([("s1/0000".to_string(), ut_row(&["p1", "", "2", "10.5"]))]),
        ),
    ]);
    let result = dstore.save(data).await;
    assert_eq!(result.unwrap(), 3);

    let keys: AppInMemFetchKeys = HashMap::from([
        (UT_TABLE_LABEL_A.to_string(), ut_row(&["s2", "s-absent"])),
        (UT_TABLE_LABEL_B.to_string(), ut_row(&["s1/0000"])),
    ]);
    let fetched = dstore.fetch(keys).await.unwrap();
    let table_a = fetched.get(UT_TABLE_LABEL_A).unwrap();
    assert_eq!(table_a.len(), 1);
    assert_eq!(table_a["s2"][1].as_str(), "4");
    let table_b = fetched.get(UT_TABLE_LABEL_B).unwrap();
    assert_eq!(table_b["s1/0000"][3].as_str(), "10.5");
}

#[tokio::test]
async fn save_overwrite_same_key() {
    let dstore = ut_setup_dstore(2).await;
    for version in ["1", "2", "3"] {
        let data = HashMap::from([(
            UT_TABLE_LABEL_A.to_string(),
            HashMap::from([("s1".to_string(), ut_row(&["t", version]))]),
        )]);
        let result = dstore.save(data).await;
        assert!(result.is_ok());
    }
    let keys = HashMap::from([(UT_TABLE_LABEL_A.to_string(), ut_row(&["s1"]))]);
    let fetched = dstore.fetch(keys).await.unwrap();
    assert_eq!(fetched[UT_TABLE_LABEL_A]["s1"][1].as_str(), "3");
}

#[tokio::test]
async fn save_table_not_exist() {
    let dstore = ut_setup_dstore(10).await;
    let data = HashMap::from([(
        "ut-no-such-table".to_string(),
        HashMap::from([("k".to_string(), ut_row(&["v"]))]),
    )]);
    let error = dstore.save(data).await.err().unwrap();
    assert_eq!(error.code, AppErrorCode::DataTableNotExist);
    let op = UtPrefixFilter("k");
    let error = dstore
        .filter_keys("ut-no-such-table".to_string(), &op)
        .await
        .err()
        .unwrap();
    assert_eq!(error.code, AppErrorCode::DataTableNotExist);
}

#[tokio::test]
async fn save_exceed_limit() {
    let dstore = ut_setup_dstore(2).await;
    let data = HashMap::from([(
        UT_TABLE_LABEL_B.to_string(),
        HashMap::from([
            ("k1".to_string(), ut_row(&["a"])),
            ("k2".to_string(), ut_row(&["b"])),
            ("k3".to_string(), ut_row(&["c"])),
        ]),
    )]);
    let error = dstore.save(data).await.err().unwrap();
    assert_eq!(error.code, AppErrorCode::ExceedingMaxLimit);
    // nothing is written on failure
    let keys = HashMap::from([(UT_TABLE_LABEL_B.to_string(), ut_row(&["k1", "k2", "k3"]))]);
    let fetched = dstore.fetch(keys).await.unwrap();
    assert!(fetched[UT_TABLE_LABEL_B].is_empty());
}

#[tokio::test]
async fn save_absent_keeps_existing() {
    let dstore = ut_setup_dstore(3).await;
    let data = HashMap::from([(
        UT_TABLE_LABEL_A.to_string(),
        HashMap::from([("pi_1".to_string(), ut_row(&["s1", "t0"]))]),
    )]);
    assert_eq!(dstore.save_absent(data).await.unwrap(), 1);
    let data = HashMap::from([(
        UT_TABLE_LABEL_A.to_string(),
        HashMap::from([
            ("pi_1".to_string(), ut_row(&["s9", "t1"])),
            ("pi_2".to_string(), ut_row(&["s2", "t1"])),
        ]),
    )]);
    assert_eq!(dstore.save_absent(data).await.unwrap(), 1);
    let keys = HashMap::from([(UT_TABLE_LABEL_A.to_string(), ut_row(&["pi_1", "pi_2"]))]);
    let fetched = dstore.fetch(keys).await.unwrap();
    let table = &fetched[UT_TABLE_LABEL_A];
    assert_eq!(table["pi_1"], ut_row(&["s1", "t0"]));
    assert_eq!(table["pi_2"], ut_row(&["s2", "t1"]));
    // existing keys do not count against the limit
    let data = HashMap::from([(
        UT_TABLE_LABEL_A.to_string(),
        HashMap::from([
            ("pi_1".to_string(), ut_row(&["s1", "t2"])),
            ("pi_2".to_string(), ut_row(&["s2", "t2"])),
            ("pi_3".to_string(), ut_row(&["s3", "t2"])),
        ]),
    )]);
    assert_eq!(dstore.save_absent(data).await.unwrap(), 1);
    let data = HashMap::from([(
        UT_TABLE_LABEL_A.to_string(),
        HashMap::from([("pi_4".to_string(), ut_row(&["s4", "t3"]))]),
    )]);
    let error = dstore.save_absent(data).await.err().unwrap();
    assert_eq!(error.code, AppErrorCode::ExceedingMaxLimit);
}

#[tokio::test]
async fn filter_then_delete() {
    let dstore = ut_setup_dstore(10).await;
    let data = HashMap::from([(
        UT_TABLE_LABEL_B.to_string(),
        HashMap::from([
            ("s1/0000".to_string(), ut_row(&["p1"])),
            ("s1/0001".to_string(), ut_row(&["p2"])),
            ("s2/0000".to_string(), ut_row(&["p3"])),
        ]),
    )]);
    let _ = dstore.save(data).await.unwrap();
    let op = UtPrefixFilter("s1/");
    let mut found = dstore
        .filter_keys(UT_TABLE_LABEL_B.to_string(), &op)
        .await
        .unwrap();
    found.sort();
    assert_eq!(found, ut_row(&["s1/0000", "s1/0001"]));
    let mut ids = found.clone();
    ids.push("s9/0000".to_string());
    let info: AppInMemDeleteInfo = HashMap::from([(UT_TABLE_LABEL_B.to_string(), ids)]);
    let num_deleted = dstore.delete(info).await.unwrap();
    assert_eq!(num_deleted, 2);
    let op = UtPrefixFilter("s");
    let remain = dstore
        .filter_keys(UT_TABLE_LABEL_B.to_string(), &op)
        .await
        .unwrap();
    assert_eq!(remain, ut_row(&["s2/0000"]));
}

#[test]
fn datastore_context_from_config() {
    let cfg = ut_setup_config("app_config_ok.json");
    let logctx = AppLogContext::new(&cfg.basepath, &cfg.api_server.logging).unwrap();
    let logctx = Arc::new(logctx);
    let result = AppDataStoreContext::new(&cfg.api_server.data_store, logctx.clone());
    assert!(result.unwrap().in_mem.is_some());
    let dup = vec![
        AppDataStoreCfg::InMemory(AppInMemoryDbCfg {
            alias: "first".to_string(),
            max_items: 3,
        }),
        AppDataStoreCfg::InMemory(AppInMemoryDbCfg {
            alias: "second".to_string(),
            max_items: 5,
        }),
    ];
    let result = AppDataStoreContext::new(&dup, logctx.clone());
    assert!(result.is_ok());
    let result = AppDataStoreContext::new(&[], logctx);
    let error = result.err().unwrap();
    assert_eq!(error.code, AppErrorCode::MissingDataStore);
}
