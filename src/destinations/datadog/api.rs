//! Direct submission to the Datadog logs intake API
//!
//! Every entry becomes one `POST` carrying a single-item JSON array,
//! compressed with zlib and declared as `Content-Encoding: deflate`. The call
//! is bounded by the flush timeout and never retried.
//!
//! The blocking HTTP client refuses to run on an async runtime thread, so the
//! client is built and each request is sent on a short-lived helper thread.
//! The caller waits on a channel for at most the flush timeout, which keeps
//! logging usable from inside async code.

use super::options::DatadogConfig;
use crate::core::{LogLevel, LoggerError, Result};
use crate::destinations::Shipper;
use crossbeam_channel::RecvTimeoutError;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{CONTENT_ENCODING, CONTENT_TYPE};
use serde::Serialize;
use std::io::Write;
use std::thread;
use std::time::Duration;

pub const API_KEY_HEADER: &str = "DD-API-KEY";

/// One element of the intake payload
#[derive(Debug, Serialize)]
struct HttpLogItem<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    ddsource: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ddtags: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hostname: Option<&'a str>,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    service: Option<&'a str>,
}

pub struct ApiShipper {
    client: Client,
    url: String,
    api_key: String,
    timeout: Duration,
    source: Option<String>,
    tags: Option<String>,
    hostname: Option<String>,
    service: Option<String>,
}

impl ApiShipper {
    pub fn new(config: DatadogConfig, api_key: String, site: &str) -> Result<Self> {
        let url = config
            .endpoint
            .clone()
            .unwrap_or_else(|| intake_url(site));
        reqwest::Url::parse(&url)
            .map_err(|e| LoggerError::config("datadog api", format!("invalid intake URL '{}': {}", url, e)))?;
        let timeout = config.flush_timeout;

        Ok(Self {
            client: build_client(timeout, config.use_proxy)?,
            url,
            api_key,
            timeout,
            tags: config.tags_string(),
            source: config.source,
            hostname: config.hostname,
            service: config.service,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn request(&self, message: &str) -> Result<RequestBuilder> {
        let payload = [HttpLogItem {
            ddsource: self.source.as_deref(),
            ddtags: self.tags.as_deref(),
            hostname: self.hostname.as_deref(),
            message,
            service: self.service.as_deref(),
        }];
        let body = deflate(&serde_json::to_vec(&payload)?)?;

        Ok(self
            .client
            .post(&self.url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .header(CONTENT_ENCODING, "deflate")
            .body(body))
    }
}

impl Shipper for ApiShipper {
    fn ship(&self, _level: LogLevel, encoded: &[u8]) -> Result<()> {
        let message = String::from_utf8_lossy(encoded);
        let request = self.request(message.trim_end())?;

        let (tx, rx) = crossbeam_channel::bounded(1);
        thread::Builder::new()
            .name("layerlog-submit".to_string())
            .spawn(move || {
                let _ = tx.send(submit(request));
            })
            .map_err(|e| LoggerError::io_operation("spawning submit thread", "log not sent", e))?;

        match rx.recv_timeout(self.timeout) {
            Ok(Err(e)) if e.is_deadline_exceeded() => Err(LoggerError::deadline(self.timeout)),
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(LoggerError::deadline(self.timeout)),
            Err(RecvTimeoutError::Disconnected) => {
                Err(LoggerError::writer("submit thread exited without a result"))
            }
        }
    }
}

fn submit(request: RequestBuilder) -> Result<()> {
    let response = request.send()?;
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    Err(LoggerError::Rejected {
        status: status.as_u16(),
        body: response.text().unwrap_or_default(),
    })
}

pub fn intake_url(site: &str) -> String {
    format!("https://http-intake.logs.{}/api/v2/logs", site)
}

fn deflate(body: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(body.len() / 2), Compression::default());
    encoder.write_all(body)?;
    Ok(encoder.finish()?)
}

/// The request timeout aborts the in-flight request on the helper thread
/// once the caller has stopped waiting.
fn build_client(timeout: Duration, use_proxy: bool) -> Result<Client> {
    thread::Builder::new()
        .name("layerlog-client".to_string())
        .spawn(move || {
            let builder = Client::builder().timeout(timeout);
            let builder = if use_proxy { builder } else { builder.no_proxy() };
            builder.build()
        })
        .map_err(|e| LoggerError::io_operation("spawning client thread", "client not built", e))?
        .join()
        .map_err(|_| LoggerError::other("HTTP client construction panicked"))?
        .map_err(LoggerError::from)
}
