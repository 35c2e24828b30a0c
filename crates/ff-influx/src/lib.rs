mod csv_stream;
mod flux;
mod line;

pub use csv_stream::RecordIter;

use std::time::Duration;

use orion_error::prelude::*;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header;

use ff_config::ConnectConfig;
use ff_core::error::{CopyReason, CopyResult};
use ff_core::{OutputPoint, QuerySpec, RecordStream, SeriesReader, SeriesWriter};

const DEFAULT_TIMEOUT_MS: u64 = 60_000;

// ---------------------------------------------------------------------------
// InfluxClient
// ---------------------------------------------------------------------------

/// Blocking HTTP client for one InfluxDB 2.x instance.
///
/// Queries stream their annotated-CSV response lazily, so memory use is
/// bounded by the caller's batch size rather than the result size. The
/// connection pool lives for the whole run and is released on drop, on every
/// exit path.
pub struct InfluxClient {
    http: Client,
    url: String,
    org: String,
    token: String,
    auth_basic: bool,
}

impl InfluxClient {
    pub fn connect(cfg: &ConnectConfig) -> CopyResult<Self> {
        let mut builder = Client::builder()
            .timeout(Duration::from_millis(cfg.timeout.unwrap_or(DEFAULT_TIMEOUT_MS)));
        if let Some(size) = cfg.connection_pool_maxsize {
            builder = builder.pool_max_idle_per_host(size);
        }
        let http = builder.build().map_err(|e| {
            StructError::from(CopyReason::RunConfig).with_detail(format!("http client: {e}"))
        })?;
        Ok(Self {
            http,
            url: cfg.url.trim_end_matches('/').to_string(),
            org: cfg.org.clone(),
            token: cfg.token.clone(),
            auth_basic: cfg.auth_basic.unwrap_or(false),
        })
    }

    /// Attach credentials. With `auth_basic` the token is read as
    /// `user:password`; otherwise it goes out as a `Token` header.
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        if self.auth_basic {
            match self.token.split_once(':') {
                Some((user, pass)) => request.basic_auth(user, Some(pass)),
                None => request.basic_auth(self.token.as_str(), None::<&str>),
            }
        } else {
            request.header(header::AUTHORIZATION, format!("Token {}", self.token))
        }
    }
}

impl SeriesReader for InfluxClient {
    fn open_stream(&self, spec: &QuerySpec) -> CopyResult<RecordStream<'_>> {
        let script = flux::render(spec);
        log::debug!("flux query:\n{script}");
        let body = serde_json::json!({
            "query": script,
            "type": "flux",
            "dialect": { "header": true, "delimiter": ",", "annotations": ["datatype"] },
        });
        let response = self
            .authorize(self.http.post(format!("{}/api/v2/query", self.url)))
            .query(&[("org", self.org.as_str())])
            .json(&body)
            .send()
            .map_err(|e| {
                StructError::from(CopyReason::SourceRead)
                    .with_detail(format!("query request: {e}"))
            })?;
        let response = check_status(response, CopyReason::SourceRead)?;
        Ok(Box::new(RecordIter::new(response)))
    }
}

impl SeriesWriter for InfluxClient {
    fn write_batch(&self, bucket: &str, points: &[OutputPoint]) -> CopyResult<()> {
        let body = line::encode_batch(points);
        let response = self
            .authorize(self.http.post(format!("{}/api/v2/write", self.url)))
            .query(&[
                ("org", self.org.as_str()),
                ("bucket", bucket),
                ("precision", "ns"),
            ])
            .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(body)
            .send()
            .map_err(|e| {
                StructError::from(CopyReason::SinkWrite).with_detail(format!("write request: {e}"))
            })?;
        check_status(response, CopyReason::SinkWrite).map(|_| ())
    }
}

/// Map a non-2xx response to an error carrying the status and a body snippet.
/// Tokens never appear in response bodies, so the snippet is safe to surface.
fn check_status(response: Response, reason: CopyReason) -> CopyResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    let snippet: String = body.chars().take(300).collect();
    StructError::from(reason)
        .with_detail(format!("HTTP {status}: {snippet}"))
        .err()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ConnectConfig {
        r#"
url = "http://localhost:8086/"
token = "tok"
org = "my-org"
"#
        .parse()
        .unwrap()
    }

    #[test]
    fn connect_trims_trailing_slash() {
        let client = InfluxClient::connect(&config()).unwrap();
        assert_eq!(client.url, "http://localhost:8086");
    }

    #[test]
    fn connect_defaults() {
        let client = InfluxClient::connect(&config()).unwrap();
        assert!(!client.auth_basic);
        assert_eq!(client.org, "my-org");
    }
}
