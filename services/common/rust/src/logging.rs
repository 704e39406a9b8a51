use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::io::stdout;
use std::path::Path;

use tracing::dispatcher::Dispatch;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::Layer as TraceLayer;
use tracing_subscriber::prelude::__tracing_subscriber_SubscriberExt;
use tracing_subscriber::{self, Layer as LayerIntf, Registry};

use crate::constant::logging::{Destination as DstOption, Level as AppLogLevelInner};
use crate::AppLogAlias;

use crate::config::{AppBasepathCfg, AppLogHandlerCfg, AppLoggerCfg, AppLoggingCfg};
use crate::error::{AppCfgError, AppErrorCode};

pub type AppLogLevel = AppLogLevelInner;
type DefaultHandler = (NonBlocking, tracing::Level, WorkerGuard);
type AppLogger = Dispatch;

pub struct AppLogContext {
    _io_guards: Vec<WorkerGuard>,
    loggers: HashMap<String, AppLogger, RandomState>,
}

// this macro has to be exposed since top-level binary executable (e.g. web)
// will invoke this macro indirectly
#[macro_export]
macro_rules! to_3rdparty_level {
    ($lvlin:expr) => {
        match $lvlin {
            $crate::logging::AppLogLevel::FATAL | $crate::logging::AppLogLevel::ERROR => {
                tracing::Level::ERROR
            }
            $crate::logging::AppLogLevel::WARNING => tracing::Level::WARN,
            $crate::logging::AppLogLevel::INFO => tracing::Level::INFO,
            $crate::logging::AppLogLevel::DEBUG => tracing::Level::DEBUG,
            $crate::logging::AppLogLevel::TRACE => tracing::Level::TRACE,
        } // in `tracing` ecosystem, level comparison is like
          // TRACE > DEBUG > INFO > WARN > ERROR
    };
}

fn _gen_localfile_writer(
    basepath: &str,
    cfg: &AppLogHandlerCfg,
) -> Result<(NonBlocking, WorkerGuard), AppCfgError> {
    let rpath = cfg.path.as_ref().ok_or(AppCfgError {
        code: AppErrorCode::InvalidHandlerLoggerCfg,
        detail: Some(format!("missing-path, handler:{}", cfg.alias)),
    })?;
    let mut fullpath = basepath.to_string();
    if !basepath.ends_with('/') && !rpath.starts_with('/') {
        fullpath += "/";
    }
    fullpath += rpath.as_str();
    let p = Path::new(&fullpath);
    match (p.parent(), p.file_name()) {
        (Some(dir), Some(fname_prefix)) => {
            let wr_dst = RollingFileAppender::new(Rotation::DAILY, dir, fname_prefix);
            Ok(tracing_appender::non_blocking(wr_dst))
        }
        _others => Err(AppCfgError {
            code: AppErrorCode::InvalidHandlerLoggerCfg,
            detail: Some(format!("invalid-path:{fullpath}")),
        }),
    }
}

fn _gen_console_writer(_: &AppLogHandlerCfg) -> (NonBlocking, WorkerGuard) {
    let wr_dst = stdout();
    tracing_appender::non_blocking(wr_dst)
} // Note tracing spawns new thread dedicating to each non-blocking writer,
  // the context-switching rule depends on underlying OS platform.

fn _init_handler(
    basepath: &AppBasepathCfg,
    cfg: &AppLogHandlerCfg,
) -> Result<DefaultHandler, AppCfgError> {
    let lvl = to_3rdparty_level!(&cfg.min_level);
    let (io_wr, guard) = match &cfg.destination {
        DstOption::CONSOLE => _gen_console_writer(cfg),
        DstOption::LOCALFS => _gen_localfile_writer(&basepath.system, cfg)?,
    }; // callers MUST always keep the guard along with writer, for successfully flushing
       // log messages to I/O
    Ok((io_wr, lvl, guard))
}

fn _init_logger(cfg: &AppLoggerCfg, hdlrs: &HashMap<AppLogAlias, DefaultHandler>) -> AppLogger {
    let iter = cfg.handlers.iter().filter_map(|alias| {
        hdlrs.get(alias).map(|(wr_ptr, default_lvl, _guard)| {
            let io_writer = wr_ptr.clone();
            let lvl = if let Some(l) = cfg.level.as_ref() {
                to_3rdparty_level!(l)
            } else {
                *default_lvl
            };
            let filter = LevelFilter::from_level(lvl);
            TraceLayer::new()
                .with_writer(io_writer)
                .with_file(false) // to prevent full path exposed
                .with_line_number(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_filter(filter)
        })
    });
    let layers = Vec::from_iter(iter);
    let subscriber = Registry::default().with(layers);
    Dispatch::new(subscriber)
} // end of _init_logger

impl AppLogContext {
    pub fn new(basepath: &AppBasepathCfg, cfg: &AppLoggingCfg) -> Result<Self, AppCfgError> {
        let mut hdlrs = HashMap::new();
        for item in cfg.handlers.iter() {
            let h = _init_handler(basepath, item)?;
            let _ = hdlrs.insert(item.alias.clone(), h);
        }
        let iter2 = cfg
            .loggers
            .iter()
            .map(|item| (item.alias.to_string(), _init_logger(item, &hdlrs)));
        let logger_map: HashMap<String, Dispatch, RandomState> = HashMap::from_iter(iter2);
        Ok(Self {
            loggers: logger_map,
            _io_guards: hdlrs.into_values().map(|(_, _, g)| g).collect(),
        }) // keep guards of the IO writers during the lifetime
    }

    /// logger aliases are module paths, an event goes to the logger of the
    /// closest enclosing module, e.g. events from `storefront::usecase::checkout`
    /// fall back to the logger `storefront::usecase` if the former is absent
    pub fn get_assigner(&self, key: &str) -> Option<&Dispatch> {
        let mut curr = key;
        loop {
            if let Some(d) = self.loggers.get(curr) {
                break Some(d);
            }
            match curr.rsplit_once("::") {
                Some((parent, _)) => {
                    curr = parent;
                }
                None => {
                    break None;
                }
            }
        }
    }

    pub fn num_loggers(&self) -> usize {
        self.loggers.len()
    }
} // end of impl AppLogContext

// events from modules outside any configured logger go to the process-wide
// default subscriber
#[macro_export]
macro_rules! app_log_event {
    ( $ctx:ident, $lvl:expr, $($arg:tt)+ ) => {{
        const MOD_PATH:&str = module_path!();
        const LVL_INNER: tracing::Level = $crate::logging::to_3rdparty_level!($lvl);
        if let Some(assigner) = $ctx.get_assigner(MOD_PATH) {
            tracing::dispatcher::with_default(assigner, || {
                tracing::event!(LVL_INNER, $($arg)+);
            });
        } else {
            tracing::event!(LVL_INNER, $($arg)+);
        }
    }};
}

pub use app_log_event;
pub use to_3rdparty_level;
