// HTTP access behind a small trait so installers can run against fakes.

use std::time::Duration;

use reqwest::Url;
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use thiserror::Error;

use crate::model::config::AppConfig;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("{url} redirected more than once")]
    TooManyRedirects { url: String },
    #[error("redirect from {url} has no usable location")]
    BadRedirect { url: String },
}

/// A fully buffered response. Redirects are never followed by the transport.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub location: Option<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            location: None,
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn redirect(status: u16, location: impl Into<String>) -> Self {
        Self {
            status,
            location: Some(location.into()),
            body: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self.status, 301 | 302)
    }
}

pub trait Fetcher {
    fn get(&self, url: &str) -> Result<HttpResponse, FetchError>;

    fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<HttpResponse, FetchError>;

    /// Issue a request with its own timeout and return the status code.
    fn probe(&self, url: &str, timeout: Duration) -> Result<u16, FetchError>;
}

/// GET `url`, following at most one 301/302 hop.
///
/// A second redirect is reported as [`FetchError::TooManyRedirects`]; any
/// final non-2xx status becomes [`FetchError::Status`].
pub fn get_with_single_redirect(
    fetcher: &dyn Fetcher,
    url: &str,
) -> Result<HttpResponse, FetchError> {
    let first = fetcher.get(url)?;
    let response = if first.is_redirect() {
        let target = resolve_location(url, first.location.as_deref())?;
        tracing::debug!("following redirect {url} -> {target}");
        let second = fetcher.get(&target)?;
        if second.is_redirect() {
            return Err(FetchError::TooManyRedirects { url: target });
        }
        second
    } else {
        first
    };

    if !response.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: response.status,
        });
    }
    Ok(response)
}

fn resolve_location(base: &str, location: Option<&str>) -> Result<String, FetchError> {
    let bad = || FetchError::BadRedirect {
        url: base.to_string(),
    };
    let location = location.filter(|l| !l.is_empty()).ok_or_else(bad)?;
    if let Ok(absolute) = Url::parse(location) {
        return Ok(absolute.into());
    }
    let base = Url::parse(base).map_err(|_| bad())?;
    base.join(location).map(Into::into).map_err(|_| bad())
}

/// `reqwest`-backed [`Fetcher`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .redirect(Policy::none())
            .timeout(config.request_timeout())
            .user_agent(config.http.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }

    fn read(url: &str, response: reqwest::blocking::Response) -> Result<HttpResponse, FetchError> {
        let status = response.status().as_u16();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .map_err(|err| transport(url, &err))?
            .to_vec();
        Ok(HttpResponse {
            status,
            location,
            body,
        })
    }
}

impl Fetcher for HttpFetcher {
    fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| transport(url, &err))?;
        Self::read(url, response)
    }

    fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<HttpResponse, FetchError> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .map_err(|err| transport(url, &err))?;
        Self::read(url, response)
    }

    fn probe(&self, url: &str, timeout: Duration) -> Result<u16, FetchError> {
        self.client
            .get(url)
            .timeout(timeout)
            .send()
            .map(|response| response.status().as_u16())
            .map_err(|err| transport(url, &err))
    }
}

fn transport(url: &str, err: &reqwest::Error) -> FetchError {
    let message = if err.is_timeout() {
        "timed out".to_string()
    } else if err.is_connect() {
        "connection failed".to_string()
    } else {
        err.to_string()
    };
    FetchError::Transport {
        url: url.to_string(),
        message,
    }
}
