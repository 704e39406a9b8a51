use storefront_common::config::{AppBasepathCfg, AppCfgHardLimit};

pub const EXAMPLE_REL_PATH: &str = "tests/examples/";

pub fn ut_service_basepath() -> String {
    env!("CARGO_MANIFEST_DIR").to_string() + "/"
}

#[allow(dead_code)]
pub fn ut_basepath() -> AppBasepathCfg {
    let service = ut_service_basepath();
    AppBasepathCfg {
        system: service.clone(),
        service,
    }
}

#[allow(dead_code)]
pub fn ut_mock_limit() -> AppCfgHardLimit {
    AppCfgHardLimit {
        nitems_per_inmem_table: 2200,
        max_session_ttl_secs: 2592000,
    }
}
