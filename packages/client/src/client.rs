// ABOUTME: HTTP wrapper that attaches a bearer token for the requested scope
// ABOUTME: Auth failures short-circuit before any request; non-2xx responses are errors

use std::sync::Arc;
use std::time::Duration;

use cloudlens_auth::{CredentialManager, Scope};
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION},
    Client, Method, RequestBuilder, Response,
};
use serde_json::Value;
use tracing::{debug, error};

use crate::error::{ClientError, ClientResult};

/// Per-request options; caller headers win for every name except `Authorization`
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: Vec::new(),
            body: None,
        }
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

#[derive(Clone)]
pub struct AuthenticatedClient {
    http: Client,
    credentials: Arc<CredentialManager>,
}

impl AuthenticatedClient {
    pub fn new(credentials: Arc<CredentialManager>, timeout: Duration) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self::with_http_client(http, credentials))
    }

    pub fn with_http_client(http: Client, credentials: Arc<CredentialManager>) -> Self {
        Self { http, credentials }
    }

    pub fn credentials(&self) -> &Arc<CredentialManager> {
        &self.credentials
    }

    /// Perform `options` against `url` with a bearer token for `scope`.
    ///
    /// Never retries. A token failure is returned without touching the network.
    pub async fn authenticated_fetch(
        &self,
        url: &str,
        options: RequestOptions,
        scope: &Scope,
    ) -> ClientResult<Response> {
        let token = self.credentials.acquire_token(scope).await?;

        let mut headers = caller_headers(&options.headers)?;
        let bearer = HeaderValue::from_str(&token.bearer())
            .map_err(|e| ClientError::InvalidHeader(format!("Authorization: {}", e)))?;
        headers.insert(AUTHORIZATION, bearer);

        let request = self
            .http
            .request(options.method.clone(), url)
            .headers(headers);
        self.send(url, with_body(request, options.body)).await
    }

    /// Authenticated GET returning the parsed JSON body
    pub async fn fetch_json(&self, url: &str, scope: &Scope) -> ClientResult<Value> {
        let response = self
            .authenticated_fetch(url, RequestOptions::get(), scope)
            .await?;
        parse_json(response).await
    }

    /// Plain GET for endpoints that take no token
    pub async fn fetch_anonymous_json(&self, url: &str) -> ClientResult<Value> {
        let response = self.send(url, self.http.get(url)).await?;
        parse_json(response).await
    }

    async fn send(&self, url: &str, request: RequestBuilder) -> ClientResult<Response> {
        debug!("Requesting {}", url);
        let response = request.send().await.map_err(|e| {
            error!("Request to {} failed: {}", url, e);
            ClientError::RequestFailed {
                status: None,
                message: format!("Request to {} failed: {}", url, e),
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            error!("{} returned {}", url, status);
            return Err(ClientError::RequestFailed {
                status: Some(status.as_u16()),
                message: format!("HTTP {}", status),
            });
        }
        Ok(response)
    }
}

fn caller_headers(pairs: &[(String, String)]) -> ClientResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ClientError::InvalidHeader(format!("{}: {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| ClientError::InvalidHeader(format!("{}: {}", name, e)))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

fn with_body(request: RequestBuilder, body: Option<Value>) -> RequestBuilder {
    match body {
        Some(body) => request.json(&body),
        None => request,
    }
}

async fn parse_json(response: Response) -> ClientResult<Value> {
    response
        .json::<Value>()
        .await
        .map_err(|e| ClientError::InvalidResponse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_headers_later_values_win() {
        let headers = caller_headers(&[
            ("X-Region".to_string(), "us-east-1".to_string()),
            ("x-region".to_string(), "eu-west-1".to_string()),
        ])
        .unwrap();
        assert_eq!(headers.get("x-region").unwrap(), "eu-west-1");
    }

    #[test]
    fn test_invalid_header_name_rejected() {
        let result = caller_headers(&[("bad header".to_string(), "v".to_string())]);
        assert!(matches!(result, Err(ClientError::InvalidHeader(_))));
    }
}
