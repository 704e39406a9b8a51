use std::io::{Error as IoError, ErrorKind};
use std::result::Result;
use std::sync::Arc;

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::client::conn::http1::{handshake, SendRequest};
use hyper::header::{HeaderMap, HeaderName, HeaderValue, HOST};
use hyper::{Error as HyperError, Method, Request, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tokio_native_tls::{native_tls, TlsConnector};

use storefront_common::logging::{app_log_event, AppLogContext, AppLogLevel};

#[derive(Debug)]
pub enum BaseClientErrorReason {
    TcpNet(ErrorKind, String),
    SysIo(ErrorKind, String),
    Http {
        sender_closed: bool,
        parse_error: bool,
        req_cancelled: bool,
        message_corrupted: bool,
        timeout: bool,
        detail: String,
    },
    HttpRequest(String),
    Tls(String),
    SerialiseFailure(String),
    DeserialiseFailure(Box<String>, u16),
}

impl From<IoError> for BaseClientErrorReason {
    fn from(value: IoError) -> Self {
        let ekind = value.kind();
        match &ekind {
            ErrorKind::TimedOut
            | ErrorKind::AddrInUse
            | ErrorKind::NotConnected
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionRefused
            | ErrorKind::ConnectionAborted => Self::TcpNet(ekind, value.to_string()),
            _others => Self::SysIo(ekind, value.to_string()),
        }
    }
}
impl From<HyperError> for BaseClientErrorReason {
    fn from(value: HyperError) -> Self {
        Self::Http {
            sender_closed: value.is_closed(),
            parse_error: value.is_parse_status() | value.is_parse(),
            timeout: value.is_timeout(),
            message_corrupted: value.is_incomplete_message() | value.is_body_write_aborted(),
            req_cancelled: value.is_canceled(),
            detail: value.to_string(),
        }
    }
}
impl From<native_tls::Error> for BaseClientErrorReason {
    fn from(value: native_tls::Error) -> Self {
        Self::Tls(value.to_string())
    }
}

#[derive(Debug)]
pub struct BaseClientError {
    pub reason: BaseClientErrorReason,
}

impl From<BaseClientErrorReason> for BaseClientError {
    fn from(reason: BaseClientErrorReason) -> Self {
        Self { reason }
    }
}

pub(super) fn secure_connector() -> Result<TlsConnector, BaseClientError> {
    let mut builder = native_tls::TlsConnector::builder();
    builder.min_protocol_version(Some(native_tls::Protocol::Tlsv12));
    let c = builder
        .build()
        .map_err(|e| BaseClientError { reason: e.into() })?;
    Ok(c.into())
}

// one TLS connection per remote call, upstream services in this application
// are contacted occasionally and never in long bursts
pub(super) struct BaseClient {
    req_sender: SendRequest<Full<Bytes>>,
    logctx: Arc<AppLogContext>,
    host: String,
    port: u16,
}

impl BaseClient {
    pub(super) async fn try_build(
        logctx: Arc<AppLogContext>,
        secure_connector: &TlsConnector,
        host: &str,
        port: u16,
    ) -> Result<Self, BaseClientError> {
        let logctx_cpy = logctx.clone();
        let tcp_stream = TcpStream::connect((host, port)).await.map_err(|e| {
            app_log_event!(
                logctx_cpy,
                AppLogLevel::ERROR,
                "tcp-conn-err, {host}:{port}, {:?}",
                &e
            );
            BaseClientError { reason: e.into() }
        })?;
        let tls_stream = secure_connector
            .connect(host, tcp_stream)
            .await
            .map_err(|e| BaseClientError { reason: e.into() })?;
        let io_adapter = TokioIo::new(tls_stream);
        let (req_sender, connector) = handshake(io_adapter)
            .await
            .map_err(|e| BaseClientError { reason: e.into() })?;
        let host_cpy = host.to_string();
        let fut = async move {
            if let Err(e) = connector.await {
                app_log_event!(
                    logctx_cpy,
                    AppLogLevel::WARNING,
                    "remote server: {host_cpy}:{port}, {:?}",
                    e
                );
            }
        };
        let _handle = tokio::spawn(fut);
        Ok(Self {
            req_sender,
            logctx,
            host: host.to_string(),
            port,
        })
    } // end of fn try-build

    pub(super) async fn execute(
        &mut self,
        path: &str,
        method: Method,
        body: Option<Vec<u8>>,
        headers: Vec<(HeaderName, HeaderValue)>,
    ) -> Result<(Vec<u8>, StatusCode), BaseClientError> {
        let body = body.map(Full::from).unwrap_or_default();
        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .body(body)
            .map_err(|e| BaseClientError {
                reason: BaseClientErrorReason::HttpRequest(e.to_string()),
            })?;
        self.append_necessary_headers(req.headers_mut(), headers)?;
        self._execute(req).await
    }

    async fn _execute(
        &mut self,
        req: Request<Full<Bytes>>,
    ) -> Result<(Vec<u8>, StatusCode), BaseClientError> {
        let logctx_p = &self.logctx;
        let uri_log = req.uri().path().to_string();
        let mut resp = self.req_sender.send_request(req).await.map_err(|e| {
            app_log_event!(logctx_p, AppLogLevel::WARNING, "{:?}", e);
            BaseClientError { reason: e.into() }
        })?;
        let mut raw_collected = Vec::<u8>::new();
        while let Some(nxt) = resp.frame().await {
            let frm = nxt.map_err(|e| BaseClientError { reason: e.into() })?;
            // trailers are irrelevant to all the remote services
            if let Ok(chunk) = frm.into_data() {
                raw_collected.extend_from_slice(chunk.as_ref());
            }
        }
        let status_code = resp.status();
        if status_code.is_client_error() {
            app_log_event!(
                logctx_p,
                AppLogLevel::INFO,
                "server:{}:{}, uri:{}, status:{}",
                self.host.as_str(),
                self.port,
                uri_log,
                status_code.as_u16()
            );
        } else if status_code.is_server_error() {
            app_log_event!(
                logctx_p,
                AppLogLevel::WARNING,
                "server:{}:{}, uri:{}, status:{}",
                self.host.as_str(),
                self.port,
                uri_log,
                status_code.as_u16()
            );
        }
        Ok((raw_collected, status_code))
    } // end of fn _execute

    fn append_necessary_headers(
        &self,
        dst: &mut HeaderMap,
        wr_data: Vec<(HeaderName, HeaderValue)>,
    ) -> Result<(), BaseClientError> {
        for (k, v) in wr_data {
            let _old = dst.insert(k, v);
        }
        // required in case the remote server sits behind reverse proxy (e.g. CDN)
        let host = HeaderValue::from_str(self.host.as_str()).map_err(|e| BaseClientError {
            reason: BaseClientErrorReason::HttpRequest(e.to_string()),
        })?;
        let _discarded = dst.insert(HOST, host);
        Ok(())
    }
} // end of impl BaseClient

pub(super) fn header_value(raw: &str) -> Result<HeaderValue, BaseClientError> {
    HeaderValue::from_str(raw).map_err(|_e| BaseClientError {
        reason: BaseClientErrorReason::HttpRequest("header-parse-fail".to_string()),
    })
}

pub(super) fn deserialize_json<D: serde::de::DeserializeOwned>(
    raw: &[u8],
    status: StatusCode,
) -> Result<D, BaseClientError> {
    serde_json::from_slice::<D>(raw).map_err(|e| {
        let detail = Box::new(e.to_string());
        BaseClientError {
            reason: BaseClientErrorReason::DeserialiseFailure(detail, status.as_u16()),
        }
    })
}
