use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::result::Result as DefaultResult;
use std::sync::RwLock;

use serde_json::Value as JsnVal;

use super::AbstractConfidentiality;
use crate::error::{AppConfidentialityError, AppErrorCode};

const SOURCE_SIZE_LIMIT_NBYTES: u64 = 8196;

// secrets kept in a small JSON file on the local filesystem, each secret is
// addressed by slash-separated path e.g. `session/secret` or `3rdparty/0/key`
pub struct UserSpaceConfidentiality {
    _src_fullpath: String,
    // only a handful of entries : session signing key, API keys of the
    // content service, payment processor, spreadsheet service
    _cached: RwLock<HashMap<String, String>>,
}

impl UserSpaceConfidentiality {
    pub fn build(fullpath: String) -> Self {
        let _cached = RwLock::new(HashMap::new());
        Self {
            _cached,
            _src_fullpath: fullpath,
        }
    }

    fn rawdata_from_source(&self) -> DefaultResult<Vec<u8>, AppConfidentialityError> {
        let mut file = File::open(self._src_fullpath.as_str()).map_err(|e| {
            AppConfidentialityError {
                code: AppErrorCode::IOerror(e.kind()),
                detail: e.to_string(),
            }
        })?;
        let actual_f_sz = file
            .metadata()
            .map_err(|e| AppConfidentialityError {
                code: AppErrorCode::IOerror(e.kind()),
                detail: e.to_string(),
            })?
            .len();
        if actual_f_sz >= SOURCE_SIZE_LIMIT_NBYTES {
            return Err(AppConfidentialityError {
                code: AppErrorCode::ExceedingMaxLimit,
                detail: format!("source-file, size:{actual_f_sz}"),
            });
        }
        let mut rawbuf = Vec::new();
        file.read_to_end(&mut rawbuf)
            .map_err(|e| AppConfidentialityError {
                code: AppErrorCode::IOerror(e.kind()),
                detail: e.to_string(),
            })?;
        Ok(rawbuf)
    } // end of fn rawdata_from_source

    fn search_json_payload<'a>(
        toplvl: &'a JsnVal,
        id_: &str,
    ) -> DefaultResult<&'a JsnVal, AppConfidentialityError> {
        let mut curr_lvl = toplvl;
        for tok in id_.split('/') {
            let found = match curr_lvl {
                JsnVal::Object(o) => o
                    .get(tok)
                    .ok_or(format!("json-object,id:{}", id_)),
                JsnVal::Array(a) => match tok.parse::<usize>() {
                    Ok(t) => a.get(t).ok_or(format!("json-array,id:{}", id_)),
                    Err(e) => Err(format!("path-error,id:{},detail:{}", id_, e)),
                },
                _others => Err(format!("json-scalar,id:{}", id_)),
            };
            curr_lvl = found.map_err(|detail| AppConfidentialityError {
                code: AppErrorCode::NoConfidentialityCfg,
                detail,
            })?;
        }
        Ok(curr_lvl)
    }

    fn load_payload(&self, id_: &str) -> DefaultResult<String, AppConfidentialityError> {
        let rawdata = self.rawdata_from_source()?;
        let toplvl = serde_json::from_slice::<JsnVal>(&rawdata).map_err(|e| {
            AppConfidentialityError {
                code: AppErrorCode::InvalidJsonFormat,
                detail: e.to_string(),
            }
        })?;
        let found = Self::search_json_payload(&toplvl, id_)?;
        serde_json::to_string(found).map_err(|e| AppConfidentialityError {
            code: AppErrorCode::DataCorruption,
            detail: e.to_string(),
        })
    }
} // end of impl UserSpaceConfidentiality

impl AbstractConfidentiality for UserSpaceConfidentiality {
    fn try_get_payload(&self, id_: &str) -> DefaultResult<String, AppConfidentialityError> {
        let lock_err = |e: String| AppConfidentialityError {
            code: AppErrorCode::AcquireLockFailure,
            detail: e + ", source: UserSpaceConfidentiality",
        };
        {
            let rguard = self._cached.read().map_err(|e| lock_err(e.to_string()))?;
            if let Some(v) = rguard.get(id_) {
                return Ok(v.clone());
            }
        }
        let found = self.load_payload(id_)?;
        let mut wguard = self._cached.write().map_err(|e| lock_err(e.to_string()))?;
        let _old = wguard.insert(id_.to_string(), found.clone());
        Ok(found)
    }
}
