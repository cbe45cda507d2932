//! HTTP client for fetching the key set

use crate::error::{Error, Result};
use std::future::Future;
use std::pin::Pin;

/// Status line and body of a key set response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Transport used by [`RemoteKeySet`](crate::RemoteKeySet)
///
/// Implementations perform a single GET and report whatever status the
/// server answered with; interpreting the status is left to the caller.
/// Redirects must not be followed.
///
/// # Errors
///
/// Transport failures should be reported as [`Error::FetchFailed`] with a
/// component-prefixed message (e.g., `"network: connection refused"`).
pub trait HttpClient: Send + Sync {
    fn get<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse>> + Send + 'a>>;
}

/// [`HttpClient`] backed by `reqwest`
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Client that never follows redirects
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| Error::ConfigurationInvalid(format!("http client: {e}")))?;
        Ok(Self { client })
    }

    /// Wrap an existing client
    ///
    /// The caller is responsible for its redirect policy.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl HttpClient for ReqwestClient {
    fn get<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse>> + Send + 'a>> {
        Box::pin(async move {
            let response = self
                .client
                .get(url)
                .header(reqwest::header::ACCEPT, "application/json")
                .send()
                .await
                .map_err(|e| Error::FetchFailed(format!("network: {e}")))?;

            let status = response.status().as_u16();
            let body = response
                .bytes()
                .await
                .map_err(|e| Error::FetchFailed(format!("network: {e}")))?
                .to_vec();

            Ok(HttpResponse { status, body })
        })
    }
}
