//! The seam between the typed client and the network.

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Method, StatusCode};
use url::Url;

use super::error::BoxError;

/// A request ready to be sent. The body, if any, is already JSON-encoded.
#[derive(Debug, Clone)]
pub struct HttpRequest {
  pub method: Method,
  pub url: Url,
  pub body: Option<Vec<u8>>,
}

/// Status and raw body of a completed exchange.
#[derive(Debug, Clone)]
pub struct HttpResponse {
  pub status: StatusCode,
  pub body: Vec<u8>,
}

/// Sends one request and waits for the full response.
///
/// Implementations must not apply their own deadline; the client races every
/// call against its timeout and drops the future when it fires.
#[async_trait]
pub trait Transport: Send + Sync {
  async fn send(&self, request: HttpRequest) -> Result<HttpResponse, BoxError>;
}

/// Transport backed by a shared reqwest client.
#[derive(Clone, Default)]
pub struct HttpTransport {
  client: reqwest::Client,
}

impl HttpTransport {
  pub fn new() -> Result<Self, BoxError> {
    let client = reqwest::Client::builder()
      .user_agent(concat!("wellpulse/", env!("CARGO_PKG_VERSION")))
      .build()?;
    Ok(Self { client })
  }
}

#[async_trait]
impl Transport for HttpTransport {
  async fn send(&self, request: HttpRequest) -> Result<HttpResponse, BoxError> {
    let mut builder = self.client.request(request.method, request.url);
    if let Some(body) = request.body {
      builder = builder.header(CONTENT_TYPE, "application/json").body(body);
    }

    let response = builder.send().await?;
    let status = response.status();
    let body = response.bytes().await?.to_vec();

    Ok(HttpResponse { status, body })
  }
}
