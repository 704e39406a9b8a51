use std::boxed::Box;
use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::env;

use tokio::runtime::Builder as RuntimeBuilder;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use storefront::api::web::route_table;
use storefront::constant::hard_limit;
use storefront::network::{app_web_service, middleware, net_listener};
use storefront::{AppConfig, AppSharedState};
use storefront_common::confidentiality::{self, AbstractConfidentiality};
use storefront_common::config::{AppCfgHardLimit, AppCfgInitArgs};
use storefront_common::constant::env_vars::EXPECTED_LABELS;
use storefront_common::logging::{app_log_event, AppLogContext, AppLogLevel};

async fn shutdown_signal(shr_state: AppSharedState) {
    let log_ctx_p = shr_state.log_context();
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            app_log_event!(log_ctx_p, AppLogLevel::WARNING, "shutdown signal received");
        }
        Err(e) => {
            app_log_event!(log_ctx_p, AppLogLevel::ERROR, "signal listener error, {}", e);
        }
    }
}

async fn start_server(shr_state: AppSharedState) {
    let log_ctx_p = shr_state.log_context();
    let cfg = shr_state.config();
    let routes = route_table();
    let listener = &cfg.api_server.listen;
    let (service, num_applied) = app_web_service(listener, routes, shr_state.clone());
    if num_applied == 0 {
        app_log_event!(
            log_ctx_p,
            AppLogLevel::ERROR,
            "no route created, web API server failed to start"
        );
        return;
    }
    let tcp_listener = match net_listener(listener.host.clone(), listener.port).await {
        Ok(v) => v,
        Err(e) => {
            app_log_event!(log_ctx_p, AppLogLevel::ERROR, "API server failed to start, {}", e);
            return;
        }
    };
    let connlm = middleware::conn_limit(listener.max_connections);
    let reqlm = middleware::req_body_limit(cfg.api_server.limit_req_body_in_bytes);
    let co = match middleware::cors(cfg.basepath.service.clone() + listener.cors.as_str()) {
        Ok(v) => v,
        Err(e) => {
            app_log_event!(
                log_ctx_p,
                AppLogLevel::ERROR,
                "cors layer init error, detail: {}",
                e
            );
            CorsLayer::new()
        }
    };
    let middlewares = ServiceBuilder::new().layer(connlm).layer(reqlm).layer(co);
    let service = service.layer(middlewares);
    app_log_event!(
        log_ctx_p,
        AppLogLevel::INFO,
        "API server listening, port:{}, num-routes:{num_applied}",
        listener.port
    );
    let result = axum::serve(tcp_listener, service)
        .with_graceful_shutdown(shutdown_signal(shr_state))
        .await;
    if let Err(e) = result {
        app_log_event!(log_ctx_p, AppLogLevel::ERROR, "API server error, {}", e);
    }
    app_log_event!(log_ctx_p, AppLogLevel::WARNING, "API server terminating");
} // end of fn start_server

fn start_async_runtime(cfg: AppConfig, confidential: Box<dyn AbstractConfidentiality>) {
    let log_ctx = match AppLogContext::new(&cfg.basepath, &cfg.api_server.logging) {
        Ok(v) => v,
        Err(e) => {
            println!("app failed to init logging, error: {} ", e);
            return;
        }
    };
    let shr_state = match AppSharedState::new(cfg, log_ctx, confidential) {
        Ok(v) => v,
        Err(e) => {
            println!("app failed to init shared state, error: {} ", e);
            return;
        }
    };
    let cfg = shr_state.config();
    let log_ctx = shr_state.log_context();
    let log_ctx2 = log_ctx.clone();
    let stack_nbytes: usize = (cfg.api_server.stack_sz_kb as usize) << 10;
    let result = RuntimeBuilder::new_multi_thread()
        .worker_threads(cfg.api_server.num_workers as usize)
        .on_thread_start(move || {
            // invoked by every new worker thread, variables moved into the
            // closure have to be clonable
            let log_cpy = log_ctx.clone();
            app_log_event!(log_cpy, AppLogLevel::INFO, "[API server] worker started");
        })
        .on_thread_stop(move || {
            let log_cpy = log_ctx2.clone();
            app_log_event!(log_cpy, AppLogLevel::INFO, "[API server] worker terminating");
        })
        .thread_stack_size(stack_nbytes)
        .thread_name("storefront-api-worker")
        // manage low-level I/O drivers used by network types
        .enable_io()
        // the pending-payment poll sleeps on the runtime timer
        .enable_time()
        .build();
    match result {
        Ok(rt) => {
            rt.block_on(async move {
                start_server(shr_state).await;
            });
        }
        Err(e) => {
            let log_ctx_p = shr_state.log_context();
            app_log_event!(
                log_ctx_p,
                AppLogLevel::ERROR,
                "async runtime failed to build, {} ",
                e
            );
        }
    };
} // end of fn start_async_runtime

fn main() {
    let iter = env::vars().filter(|(k, _v)| EXPECTED_LABELS.contains(&k.as_str()));
    let env_var_map: HashMap<String, String, RandomState> = HashMap::from_iter(iter);
    let args = AppCfgInitArgs {
        env_var_map,
        limit: AppCfgHardLimit {
            nitems_per_inmem_table: hard_limit::MAX_ITEMS_STORED_PER_MODEL,
            max_session_ttl_secs: hard_limit::MAX_SESSION_TTL_SECS,
        },
    };
    match AppConfig::new(args) {
        Ok(cfg) => match confidentiality::build_context(&cfg) {
            Ok(confidential) => start_async_runtime(cfg, confidential),
            Err(e) => {
                println!("app failed to init confidentiality handler, error: {} ", e);
            }
        },
        Err(e) => {
            println!("app failed to configure, error: {} ", e);
        }
    };
} // end of main
