//! HTTP transport used by the fetch pipeline
//!
//! The pipeline only ever issues GETs, so the trait is a single method.
//! `HttpTransport` is the reqwest-backed implementation used by the app;
//! tests provide an in-memory one.

use std::future::Future;

use reqwest::Client;

use super::error::TransportError;

/// Something that can GET a URL and hand back the body
///
/// Implementations must map non-2xx responses to `TransportError::Status`
/// so callers can treat "request failed" uniformly.
pub trait Transport: Send + Sync + 'static {
    fn get(
        &self,
        url: &str,
        headers: &[(&'static str, &'static str)],
    ) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;
}

/// reqwest-backed transport
///
/// No timeout is configured: a hung request stalls only its own unit of work.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Transport for HttpTransport {
    async fn get(
        &self,
        url: &str,
        headers: &[(&'static str, &'static str)],
    ) -> Result<Vec<u8>, TransportError> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            // Keep the body around: the provider explains auth/rate errors there
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}
