use std::time::Duration;

use fbconfig::{DEFAULT_MAX_BODY_BYTES, DEFAULT_TIMEOUT_SECS};
use tracing::debug;
use ureq::Agent;

use crate::errors::Tr064Error;
use crate::model::ConnectionTarget;

/// One header as received, name and value untouched and in wire order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawHeader {
    pub name: String,
    pub value: String,
}

impl RawHeader {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// POST request issued against the device.
///
/// Request specs are values: the authenticated request is derived from the
/// first one with [`HttpRequest::with_header`], never by mutating it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpRequest {
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn with_header(&self, name: &str, value: String) -> Self {
        let mut next = self.clone();
        next.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        next.headers.push((name.to_string(), value));
        next
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<RawHeader>,
    pub body: String,
}

impl HttpResponse {
    /// First header value containing `needle`, whatever the header name.
    pub fn find_header_value(&self, needle: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.value.contains(needle))
            .map(|h| h.value.as_str())
    }
}

/// HTTP POST primitive used by the handshake.
///
/// Non-2xx statuses are not errors: the device's 401 carries the digest
/// challenge. Only failures to obtain a complete response are reported.
pub trait Transport {
    fn send_post(
        &self,
        target: &ConnectionTarget,
        request: &HttpRequest,
    ) -> Result<HttpResponse, Tr064Error>;
}

/// Blocking transport over a `ureq` agent.
#[derive(Clone, Debug)]
pub struct UreqTransport {
    agent: Agent,
    max_body_bytes: u64,
}

impl UreqTransport {
    pub fn new(timeout: Duration, max_body_bytes: u64) -> Self {
        // 4xx/5xx must come back as responses so the challenge can be read.
        let config = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build();

        Self {
            agent: config.into(),
            max_body_bytes,
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            DEFAULT_MAX_BODY_BYTES,
        )
    }
}

impl Transport for UreqTransport {
    fn send_post(
        &self,
        target: &ConnectionTarget,
        request: &HttpRequest,
    ) -> Result<HttpResponse, Tr064Error> {
        let url = format!("http://{}:{}{}", target.host, target.port, request.path);

        let mut builder = self.agent.post(&url);
        for (name, value) in &request.headers {
            // ureq computes it from the body it sends.
            if name.eq_ignore_ascii_case("content-length") {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }

        let mut response = builder
            .send(request.body.as_str())
            .map_err(|e| Tr064Error::transport(format!("POST {url} failed: {e}")))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                RawHeader::new(
                    name.as_str(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        let bytes = response
            .body_mut()
            .with_config()
            .limit(self.max_body_bytes)
            .read_to_vec()
            .map_err(|e| Tr064Error::transport(format!("reading response of {url}: {e}")))?;
        // Undecodable payloads fail extraction, not transport.
        let body = String::from_utf8(bytes)
            .map_err(|e| Tr064Error::extraction(format!("response of {url} is not UTF-8: {e}")))?;

        debug!(url = %url, status, body_len = body.len(), "TR-064 response received");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
