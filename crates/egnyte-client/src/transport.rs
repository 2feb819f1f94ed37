//! Single-attempt HTTP transport
//!
//! Every API call goes through [`Transport`]: one round trip, no retries.
//! Success bodies are returned as text or parsed as JSON; failures are
//! handed to the [`Classifier`] the request was built with.

use crate::classify::Classifier;
use crate::headers::ResponseHeaders;
use crate::{ClientError, Config, Result};
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

/// Request body
#[derive(Clone, Debug, Default)]
pub(crate) enum Body {
    #[default]
    Empty,
    Json(Bytes),
    Bytes(Bytes),
}

/// A fully formed request, built by the resource modules
#[derive(Clone, Debug)]
pub(crate) struct ApiRequest {
    method: Method,
    url: Url,
    headers: Vec<(&'static str, String)>,
    body: Body,
    classifier: Classifier,
}

impl ApiRequest {
    pub(crate) fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: Body::Empty,
            classifier: Classifier::Standard,
        }
    }

    pub(crate) fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub(crate) fn post(url: Url) -> Self {
        Self::new(Method::POST, url)
    }

    pub(crate) fn header(mut self, name: &'static str, value: impl ToString) -> Self {
        self.headers.push((name, value.to_string()));
        self
    }

    /// Serialize `body` as the JSON payload, keeping struct field order
    pub(crate) fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        let data = serde_json::to_vec(body)
            .map_err(|e| ClientError::invalid("body", format!("cannot serialize request: {}", e)))?;
        self.body = Body::Json(Bytes::from(data));
        Ok(self)
    }

    pub(crate) fn bytes(mut self, data: Bytes) -> Self {
        self.body = Body::Bytes(data);
        self
    }

    pub(crate) fn classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }
}

/// A buffered success response
#[derive(Clone, Debug)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: ResponseHeaders,
    /// Body text, verbatim
    pub body: String,
}

impl ApiResponse {
    /// Parse the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|e| ClientError::unparsable(&self.body, e))
    }

    /// Parse the body as JSON if there is one
    pub(crate) fn json_opt<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        if self.body.trim().is_empty() {
            return Ok(None);
        }
        self.json().map(Some)
    }
}

/// A success response whose body has not been read
pub struct StreamingResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: ResponseHeaders,
    /// Body chunks as they arrive
    pub body: BoxStream<'static, Result<Bytes>>,
}

impl std::fmt::Debug for StreamingResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Shared HTTP transport
#[derive(Clone, Debug)]
pub(crate) struct Transport {
    http: Client,
    cancel: Option<CancellationToken>,
}

impl Transport {
    pub(crate) fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| ClientError::Config(format!("invalid user agent: {}", e)))?,
        );
        if let Some(token) = &config.access_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ClientError::Config(format!("invalid access token: {}", e)))?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(ClientError::Http)?;

        Ok(Self { http, cancel: None })
    }

    pub(crate) fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            http: self.http.clone(),
            cancel: Some(token),
        }
    }

    /// Send a request and buffer the body as text
    pub(crate) async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let classifier = request.classifier;
        let builder = self.prepare(request);

        let (status, headers, body) = self
            .cancellable(async move {
                let response = builder.send().await?;
                let status = response.status().as_u16();
                let headers = ResponseHeaders::from(response.headers());
                let body = response.text().await?;
                Ok((status, headers, body))
            })
            .await?;

        debug!(status, bytes = body.len(), "Received response");

        if !is_success(status) {
            return Err(classifier.apply(status, headers, &body));
        }

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }

    /// Send a request and parse the success body as JSON
    pub(crate) async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        self.send(request).await?.json()
    }

    /// Send a request and hand back the body unread.
    ///
    /// Cancellation covers the wait for response headers; once the stream is
    /// returned the caller aborts by dropping it.
    pub(crate) async fn send_stream(&self, request: ApiRequest) -> Result<StreamingResponse> {
        let classifier = request.classifier;
        let builder = self.prepare(request);

        let response = self.cancellable(async move { Ok(builder.send().await?) }).await?;
        let status = response.status().as_u16();
        let headers = ResponseHeaders::from(response.headers());

        if !is_success(status) {
            let body = self.cancellable(async move { Ok(response.text().await?) }).await?;
            return Err(classifier.apply(status, headers, &body));
        }

        debug!(status, "Streaming response body");
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(ClientError::Http))
            .boxed();

        Ok(StreamingResponse {
            status,
            headers,
            body,
        })
    }

    fn prepare(&self, request: ApiRequest) -> reqwest::RequestBuilder {
        let ApiRequest {
            method,
            mut url,
            headers,
            body,
            ..
        } = request;
        sanitize_url(&mut url);

        debug!("Sending {} request to {}", method, url);
        let mut builder = self.http.request(method, url);

        for (name, value) in headers {
            builder = builder.header(name, value);
        }

        match body {
            Body::Empty => builder,
            Body::Json(data) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(data),
            Body::Bytes(data) => builder
                .header(header::CONTENT_TYPE, "application/octet-stream")
                .body(data),
        }
    }

    async fn cancellable<F, T>(&self, round_trip: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match &self.cancel {
            Some(token) => tokio::select! {
                _ = token.cancelled() => {
                    debug!("Request cancelled");
                    Err(ClientError::Cancelled)
                }
                result = round_trip => result,
            },
            None => round_trip.await,
        }
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Percent-encode literal square brackets left in the path and query.
///
/// The URL parser keeps `[` and `]` as-is but some origin servers reject them.
pub(crate) fn sanitize_url(url: &mut Url) {
    let is_bracket = |c: char| c == '[' || c == ']';

    if url.path().contains(is_bracket) {
        let path = escape_brackets(url.path());
        url.set_path(&path);
    }
    if let Some(query) = url.query().filter(|q| q.contains(is_bracket)) {
        let query = escape_brackets(query);
        url.set_query(Some(&query));
    }
}

fn escape_brackets(s: &str) -> String {
    s.replace('[', "%5B").replace(']', "%5D")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_brackets() {
        let mut url = Url::parse("https://acme.egnyte.com/pubapi/v1/fs/Shared/[draft]?name=[a]").unwrap();
        sanitize_url(&mut url);
        assert_eq!(
            url.as_str(),
            "https://acme.egnyte.com/pubapi/v1/fs/Shared/%5Bdraft%5D?name=%5Ba%5D"
        );
    }

    #[test]
    fn test_sanitize_leaves_other_urls_alone() {
        let mut url = Url::parse("https://acme.egnyte.com/pubapi/v1/fs/Shared/a%20b").unwrap();
        sanitize_url(&mut url);
        assert_eq!(url.as_str(), "https://acme.egnyte.com/pubapi/v1/fs/Shared/a%20b");
    }

    #[test]
    fn test_json_body_keeps_field_order() {
        #[derive(Serialize)]
        struct Move<'a> {
            action: &'a str,
            destination: &'a str,
        }

        let url = Url::parse("https://acme.egnyte.com/pubapi/v1/fs/a").unwrap();
        let request = ApiRequest::post(url)
            .json(&Move {
                action: "move",
                destination: "/Shared/b",
            })
            .unwrap();

        match request.body {
            Body::Json(data) => assert_eq!(
                &data[..],
                br#"{"action":"move","destination":"/Shared/b"}"#
            ),
            other => panic!("Expected JSON body, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_json_keeps_body_and_source() {
        let response = ApiResponse {
            status: 200,
            headers: ResponseHeaders::new(),
            body: "<html>gateway</html>".to_string(),
        };

        match response.json::<serde_json::Value>() {
            Err(ClientError::MalformedResponse { body, source, .. }) => {
                assert_eq!(body, "<html>gateway</html>");
                assert!(source.is_some());
            }
            other => panic!("Expected MalformedResponse, got {:?}", other),
        }
    }
}
