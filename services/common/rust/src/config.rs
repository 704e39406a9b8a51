use std::collections::hash_map::RandomState;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::result::Result as DefaultResult;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::de::{Error as DeserializeError, Expected};
use serde::Deserialize;

use crate::constant::{env_vars, logging as const_log};
use crate::error::{AppCfgError, AppErrorCode};
use crate::{AppLogAlias, WebApiPath};

#[derive(Deserialize)]
pub struct AppLogHandlerCfg {
    pub min_level: const_log::Level,
    pub destination: const_log::Destination,
    pub alias: AppLogAlias,
    pub path: Option<String>,
}

#[derive(Deserialize)]
pub struct AppLoggerCfg {
    pub alias: AppLogAlias,
    pub handlers: Vec<String>,
    pub level: Option<const_log::Level>,
}

#[derive(Deserialize)]
pub struct AppLoggingCfg {
    pub handlers: Vec<AppLogHandlerCfg>,
    pub loggers: Vec<AppLoggerCfg>,
}

#[derive(Deserialize)]
pub struct WebApiRouteCfg {
    pub path: WebApiPath,
    #[serde(deserialize_with = "jsn_deny_empty_string")]
    pub handler: String,
}

impl std::fmt::Display for WebApiRouteCfg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "path:{}, handler:{}", self.path, self.handler)
    }
}

#[derive(Deserialize)]
pub struct WebApiListenCfg {
    // all routes are nested under this path segment, e.g. `api`
    #[serde(deserialize_with = "jsn_deny_empty_string")]
    pub prefix: String,
    #[serde(deserialize_with = "jsn_deny_empty_string")]
    pub host: String,
    pub port: u16,
    pub max_connections: u32,
    pub cors: String,
    pub routes: Vec<WebApiRouteCfg>,
}

#[derive(Deserialize)]
#[serde(tag = "source")]
pub enum AppConfidentialCfg {
    UserSpace {
        #[serde(deserialize_with = "jsn_deny_empty_string")]
        sys_path: String,
    },
}

#[derive(Deserialize, Debug)]
pub struct AppInMemoryDbCfg {
    #[serde(deserialize_with = "jsn_deny_empty_string")]
    pub alias: String,
    pub max_items: u32,
}

#[allow(non_camel_case_types)]
#[derive(Deserialize)]
#[serde(tag = "_type")]
pub enum AppDataStoreCfg {
    InMemory(AppInMemoryDbCfg),
}

#[derive(Deserialize)]
pub struct AppSessionCfg {
    #[serde(deserialize_with = "jsn_deny_empty_string")]
    pub cookie_name: String,
    pub ttl_secs: u32,
    // add `Secure` and `SameSite=None` to the cookie, required when the
    // storefront pages are served from another site
    pub secure: bool,
    #[serde(deserialize_with = "jsn_deny_empty_string")]
    pub confidentiality_path: String,
}

#[allow(non_camel_case_types)]
#[derive(Deserialize, Debug)]
#[serde(tag = "mode")]
pub enum App3rdPartyCfg {
    dev {
        name: String,
        host: String,
        port: u16,
        confidentiality_path: String,
    },
    test {
        name: String,
        data_src: String,
    },
}

impl App3rdPartyCfg {
    pub fn name(&self) -> &str {
        match self {
            Self::dev { name, .. } | Self::test { name, .. } => name.as_str(),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct AppShippingOptionCfg {
    #[serde(deserialize_with = "jsn_deny_empty_string")]
    pub code: String,
    #[serde(deserialize_with = "jsn_deny_empty_string")]
    pub label: String,
    // omitted means the price is written in the label, e.g. `Kurier - 19,99 zl`
    pub price: Option<Decimal>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AppCouponKindCfg {
    Fixed,
    Percentage,
}

#[derive(Deserialize, Debug)]
pub struct AppCouponCfg {
    #[serde(deserialize_with = "jsn_deny_empty_string")]
    pub code: String,
    pub kind: AppCouponKindCfg,
    // minor currency unit for fixed amount, 0 - 100 for percentage
    pub amount: u32,
    pub expiry: Option<NaiveDate>,
}

#[derive(Deserialize)]
pub struct AppCheckoutCfg {
    #[serde(deserialize_with = "jsn_deny_empty_string")]
    pub currency: String,
    pub tax_rate: Decimal,
    pub shipping: Vec<AppShippingOptionCfg>,
    pub coupons: Vec<AppCouponCfg>,
    // the payment page the processor redirects back to
    pub return_url: String,
}

// collection identifiers in the external content service
#[derive(Deserialize)]
pub struct AppContentCollectionCfg {
    #[serde(deserialize_with = "jsn_deny_empty_string")]
    pub products: String,
    #[serde(deserialize_with = "jsn_deny_empty_string")]
    pub categories: String,
    #[serde(deserialize_with = "jsn_deny_empty_string")]
    pub containers: String,
}

#[derive(Deserialize)]
pub struct ApiServerCfg {
    pub logging: AppLoggingCfg,
    pub listen: WebApiListenCfg,
    pub limit_req_body_in_bytes: usize,
    pub num_workers: u8,
    pub stack_sz_kb: u16,
    pub data_store: Vec<AppDataStoreCfg>,
    pub session: AppSessionCfg,
    pub third_parties: Vec<Arc<App3rdPartyCfg>>,
    pub checkout: Arc<AppCheckoutCfg>,
    pub content: AppContentCollectionCfg,
    pub confidentiality: AppConfidentialCfg,
}

pub struct AppBasepathCfg {
    pub system: String,
    pub service: String,
}

pub struct AppConfig {
    pub basepath: AppBasepathCfg,
    pub api_server: ApiServerCfg,
}

pub struct AppCfgHardLimit {
    pub nitems_per_inmem_table: u32,
    pub max_session_ttl_secs: u32,
}
pub struct AppCfgInitArgs {
    pub env_var_map: HashMap<String, String, RandomState>,
    pub limit: AppCfgHardLimit,
}

impl AppConfig {
    pub fn new(args: AppCfgInitArgs) -> DefaultResult<Self, AppCfgError> {
        let (mut env_var_map, limit) = (args.env_var_map, args.limit);
        let sys_basepath = if let Some(s) = env_var_map.remove(env_vars::SYS_BASEPATH) {
            s + "/"
        } else {
            return Err(AppCfgError {
                detail: None,
                code: AppErrorCode::MissingSysBasePath,
            });
        };
        let app_basepath = if let Some(a) = env_var_map.remove(env_vars::SERVICE_BASEPATH) {
            a + "/"
        } else {
            return Err(AppCfgError {
                detail: None,
                code: AppErrorCode::MissingAppBasePath,
            });
        };
        let api_srv_cfg = if let Some(cfg_path) = env_var_map.remove(env_vars::CFG_FILEPATH) {
            let fullpath = app_basepath.clone() + &cfg_path;
            Self::parse_from_file(fullpath, limit)?
        } else {
            return Err(AppCfgError {
                detail: None,
                code: AppErrorCode::MissingConfigPath,
            });
        };
        Ok(Self {
            api_server: api_srv_cfg,
            basepath: AppBasepathCfg {
                system: sys_basepath,
                service: app_basepath,
            },
        })
    } // end of new

    pub fn parse_from_file(
        filepath: String,
        limit: AppCfgHardLimit,
    ) -> DefaultResult<ApiServerCfg, AppCfgError> {
        // load and parse a config file with given path
        match File::open(filepath) {
            Ok(fileobj) => {
                let reader = BufReader::new(fileobj);
                match serde_json::from_reader::<BufReader<File>, ApiServerCfg>(reader) {
                    Ok(jsnobj) => {
                        Self::_check_web_listener(&jsnobj.listen)?;
                        Self::_check_logging(&jsnobj.logging)?;
                        Self::_check_datastore(&jsnobj.data_store, &limit)?;
                        Self::_check_session(&jsnobj.session, &limit)?;
                        Self::_check_3rdparty(&jsnobj.third_parties)?;
                        Self::_check_checkout(&jsnobj.checkout)?;
                        Ok(jsnobj)
                    }
                    Err(e) => Err(AppCfgError {
                        detail: Some(e.to_string()),
                        code: AppErrorCode::InvalidJsonFormat,
                    }),
                }
            }
            Err(e) => Err(AppCfgError {
                detail: Some(e.to_string()),
                code: AppErrorCode::IOerror(e.kind()),
            }),
        }
    }

    fn _check_web_listener(obj: &WebApiListenCfg) -> DefaultResult<(), AppCfgError> {
        let mut iter2 = obj
            .routes
            .iter()
            .filter(|i| i.path.is_empty() || i.handler.is_empty());
        if obj.routes.is_empty() {
            Err(AppCfgError {
                detail: None,
                code: AppErrorCode::NoRouteApiServerCfg,
            })
        } else if obj.prefix.contains('/') {
            let err_msg = Some("prefix must be single path segment".to_string());
            Err(AppCfgError {
                detail: err_msg,
                code: AppErrorCode::InvalidRoutePrefix,
            })
        } else if let Some(badroute) = iter2.next() {
            let err_msg = Some(badroute.to_string());
            Err(AppCfgError {
                detail: err_msg,
                code: AppErrorCode::InvalidRouteConfig,
            })
        } else {
            Ok(())
        }
    } // end of _check_web_listener

    fn _check_logging(obj: &AppLoggingCfg) -> DefaultResult<(), AppCfgError> {
        let mut filtered = obj.loggers.iter().filter(|item| item.handlers.is_empty());
        let mut filtered2 = obj.handlers.iter().filter(|item| match &item.destination {
            const_log::Destination::LOCALFS => item.path.is_none(),
            _other => false,
        }); // for file-type handler, the field `path` has to be provided
        let mut filtered3 = obj.handlers.iter().filter(|item| item.alias.is_empty());
        let mut filtered4 = obj.loggers.iter().filter(|item| item.alias.is_empty());
        if obj.handlers.is_empty() {
            Err(AppCfgError {
                detail: None,
                code: AppErrorCode::NoLogHandlerCfg,
            })
        } else if obj.loggers.is_empty() {
            Err(AppCfgError {
                detail: None,
                code: AppErrorCode::NoLoggerCfg,
            })
        } else if let Some(alogger) = filtered.next() {
            let msg = format!("the logger does not have handler: {}", alogger.alias);
            Err(AppCfgError {
                detail: Some(msg),
                code: AppErrorCode::NoHandlerInLoggerCfg,
            })
        } else if let Some(_hdlr) = filtered3.next() {
            Err(AppCfgError {
                detail: None,
                code: AppErrorCode::MissingAliasLogHdlerCfg,
            })
        } else if let Some(_logger) = filtered4.next() {
            Err(AppCfgError {
                detail: None,
                code: AppErrorCode::MissingAliasLoggerCfg,
            })
        } else if let Some(alogger) = filtered2.next() {
            let msg = format!("file-type handler does not contain path: {}", alogger.alias);
            Err(AppCfgError {
                detail: Some(msg),
                code: AppErrorCode::InvalidHandlerLoggerCfg,
            })
        } else {
            let iter = obj.handlers.iter().map(|i| i.alias.as_str());
            let hdlr_alias_map: HashSet<&str> = HashSet::from_iter(iter);
            let mut filtered = obj.loggers.iter().filter(|item| {
                let mut inner_iter = item
                    .handlers
                    .iter()
                    .filter(|i| !hdlr_alias_map.contains(i.as_str())); // dump invalid handler alias
                inner_iter.next().is_some()
            }); // handler alias in each logger has to be present
            if let Some(alogger) = filtered.next() {
                let msg = format!(
                    "the logger contains invalid handler alias: {}",
                    alogger.alias
                );
                Err(AppCfgError {
                    detail: Some(msg),
                    code: AppErrorCode::InvalidHandlerLoggerCfg,
                })
            } else {
                Ok(())
            }
        }
    } // end of _check_logging

    fn _check_datastore(
        obj: &Vec<AppDataStoreCfg>,
        limit: &AppCfgHardLimit,
    ) -> DefaultResult<(), AppCfgError> {
        if obj.is_empty() {
            return Err(AppCfgError {
                detail: None,
                code: AppErrorCode::NoDatabaseCfg,
            });
        }
        for item in obj {
            match item {
                AppDataStoreCfg::InMemory(c) => {
                    let lmt = limit.nitems_per_inmem_table;
                    if c.max_items > lmt {
                        let e = AppCfgError {
                            detail: Some(format!("limit:{}", lmt)),
                            code: AppErrorCode::ExceedingMaxLimit,
                        };
                        return Err(e);
                    }
                }
            }
        } // end of loop
        Ok(())
    } // end of _check_datastore

    fn _check_session(
        obj: &AppSessionCfg,
        limit: &AppCfgHardLimit,
    ) -> DefaultResult<(), AppCfgError> {
        if obj.ttl_secs == 0 {
            Err(AppCfgError {
                detail: Some("session-ttl-zero".to_string()),
                code: AppErrorCode::NoSessionCfg,
            })
        } else if obj.ttl_secs > limit.max_session_ttl_secs {
            Err(AppCfgError {
                detail: Some(format!("limit-session-ttl:{}", limit.max_session_ttl_secs)),
                code: AppErrorCode::ExceedingMaxLimit,
            })
        } else {
            Ok(())
        }
    }

    fn _check_3rdparty(obj: &[Arc<App3rdPartyCfg>]) -> DefaultResult<(), AppCfgError> {
        if obj.is_empty() {
            return Err(AppCfgError {
                detail: None,
                code: AppErrorCode::No3rdPartyCfg,
            });
        }
        let mut names = HashSet::new();
        for item in obj {
            let name = item.name();
            if name.is_empty() || !names.insert(name) {
                return Err(AppCfgError {
                    detail: Some(format!("3rdparty-name:{name}")),
                    code: AppErrorCode::No3rdPartyCfg,
                });
            }
        }
        Ok(())
    }

    fn _check_checkout(obj: &AppCheckoutCfg) -> DefaultResult<(), AppCfgError> {
        let mut bad_coupons = obj.coupons.iter().filter(|c| {
            c.kind == AppCouponKindCfg::Percentage && c.amount > 100
        });
        let mut bad_shipping = obj
            .shipping
            .iter()
            .filter(|s| s.price.map(|p| p.is_sign_negative()).unwrap_or(false));
        if obj.shipping.is_empty() {
            Err(AppCfgError {
                detail: Some("shipping-option".to_string()),
                code: AppErrorCode::NoCheckoutCfg,
            })
        } else if obj.tax_rate.is_sign_negative() || obj.tax_rate > Decimal::ONE {
            Err(AppCfgError {
                detail: Some(format!("tax-rate:{}", obj.tax_rate)),
                code: AppErrorCode::InvalidInput,
            })
        } else if let Some(c) = bad_coupons.next() {
            Err(AppCfgError {
                detail: Some(format!("coupon-percentage:{}", c.code)),
                code: AppErrorCode::InvalidInput,
            })
        } else if let Some(sh) = bad_shipping.next() {
            Err(AppCfgError {
                detail: Some(format!("shipping-price:{}", sh.code)),
                code: AppErrorCode::InvalidInput,
            })
        } else {
            Ok(())
        }
    } // end of _check_checkout
} // end of impl AppConfig

struct ExpectNonEmptyString {
    min_len: u32,
}

impl Expected for ExpectNonEmptyString {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        let msg = format!("minimum string length >= {}", self.min_len);
        formatter.write_str(msg.as_str())
    }
}

fn jsn_deny_empty_string<'de, D>(raw: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match String::deserialize(raw) {
        Ok(s) => {
            if s.is_empty() {
                let unexp = s.len();
                let exp = ExpectNonEmptyString { min_len: 1 };
                let e = DeserializeError::invalid_length(unexp, &exp);
                Err(e)
            } else {
                Ok(s)
            }
        }
        Err(e) => Err(e),
    }
}
