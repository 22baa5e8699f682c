use reqwest::header::{CONTENT_TYPE, HeaderMap};
use reqwest::{Client, StatusCode};

use crate::config::TracksConfig;
use crate::error::TransportError;

/// The calls the synchronizer needs from a Tracks server.
#[allow(async_fn_in_trait)]
pub trait RemoteClient {
    /// Absolute URL of a path relative to the base URL.
    fn url(&self, path: &str) -> String;

    /// GET a document relative to the base URL.
    async fn get(&self, path: &str) -> Result<String, TransportError>;

    /// POST an XML payload relative to the base URL, returning the id of the
    /// created resource.
    async fn post(&self, path: &str, payload: &str) -> Result<u64, TransportError>;
}

/// Tracks REST client using HTTP basic auth.
#[derive(Clone)]
pub struct TracksClient {
    base_url: String,
    username: String,
    password: String,
    http: Client,
}

impl TracksClient {
    pub fn new(base_url: &str, username: &str, password: &str) -> Result<Self, TransportError> {
        let http = Client::builder()
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;
        Ok(Self {
            base_url: base_url.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            http,
        })
    }

    pub fn for_target(target: &TracksConfig, password: &str) -> Result<Self, TransportError> {
        Self::new(&target.base_url, &target.user, password)
    }
}

impl RemoteClient for TracksClient {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> Result<String, TransportError> {
        let url = self.url(path);
        log::debug!("GET {}", url);
        let resp = self
            .http
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .header(CONTENT_TYPE, "text/xml")
            .send()
            .await
            .map_err(|e| TransportError::Request {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url,
                status: status.as_u16(),
                headers: header_block(resp.headers()),
            });
        }

        resp.text().await.map_err(|e| TransportError::Request {
            url,
            reason: format!("Failed to read response: {}", e),
        })
    }

    async fn post(&self, path: &str, payload: &str) -> Result<u64, TransportError> {
        let url = self.url(path);
        log::debug!("POST {}: {}", url, payload);
        let resp = self
            .http
            .post(&url)
            .basic_auth(&self.username, Some(&self.password))
            .header(CONTENT_TYPE, "text/xml")
            .body(payload.to_string())
            .send()
            .await
            .map_err(|e| TransportError::Request {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        let headers = header_block(resp.headers());
        match resp.status() {
            StatusCode::OK | StatusCode::CREATED => location_id(&headers),
            s => Err(TransportError::Status {
                url,
                status: s.as_u16(),
                headers,
            }),
        }
    }
}

impl<C: RemoteClient> RemoteClient for &C {
    fn url(&self, path: &str) -> String {
        (**self).url(path)
    }

    async fn get(&self, path: &str) -> Result<String, TransportError> {
        (**self).get(path).await
    }

    async fn post(&self, path: &str, payload: &str) -> Result<u64, TransportError> {
        (**self).post(path, payload).await
    }
}

/// Render response headers as `Name: value` lines for scanning and diagnostics.
fn header_block(headers: &HeaderMap) -> String {
    let mut block = String::new();
    for (name, value) in headers {
        block.push_str(name.as_str());
        block.push_str(": ");
        block.push_str(&String::from_utf8_lossy(value.as_bytes()));
        block.push_str("\r\n");
    }
    block
}

/// Recover the id of a created resource from the `Location` header.
///
/// The last `/`-separated segment of the URL must be all digits, as in
/// `Location: http://host/contexts/42`.
pub fn location_id(headers: &str) -> Result<u64, TransportError> {
    let line = headers
        .lines()
        .find(|line| {
            line.split_once(':')
                .is_some_and(|(name, _)| name.trim().eq_ignore_ascii_case("location"))
        })
        .ok_or_else(|| TransportError::MissingLocation {
            headers: headers.to_string(),
        })?;

    let bad = || TransportError::BadLocation {
        line: line.trim().to_string(),
    };

    let (_, value) = line.split_once(':').ok_or_else(bad)?;
    let (_, segment) = value.trim().rsplit_once('/').ok_or_else(bad)?;
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(bad());
    }
    segment.parse().map_err(|_| bad())
}
