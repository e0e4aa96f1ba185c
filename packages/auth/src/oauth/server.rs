// ABOUTME: Loopback callback server receiving the OAuth authorization redirect
// ABOUTME: Listens on localhost, ignores unrelated requests and extracts code and state

use std::time::Duration;

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};
use tracing::{debug, error, info};
use url::Url;

use crate::error::{AuthError, AuthResult};

pub const DEFAULT_CALLBACK_PORT: u16 = 3737;
const CALLBACK_PATH: &str = "/auth/callback";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// What the authorization server sent back on the redirect
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    Code { code: String, state: String },
    Error { error: String, description: Option<String> },
}

pub struct CallbackServer {
    port: u16,
    timeout: Duration,
}

impl Default for CallbackServer {
    fn default() -> Self {
        Self::new()
    }
}

impl CallbackServer {
    pub fn new() -> Self {
        Self::with_port(DEFAULT_CALLBACK_PORT)
    }

    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn callback_url(&self) -> String {
        format!("http://localhost:{}{}", self.port, CALLBACK_PATH)
    }

    /// Wait for the redirect and return `(authorization_code, state)`
    pub async fn wait_for_callback(&self) -> AuthResult<(String, String)> {
        let addr = format!("127.0.0.1:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| AuthError::CallbackServer(format!("Failed to bind to {}: {}", addr, e)))?;

        info!("Waiting for OAuth callback on {}", addr);

        let outcome = tokio::time::timeout(self.timeout, Self::accept_callback(&listener))
            .await
            .map_err(|_| {
                AuthError::CallbackServer(format!(
                    "No OAuth callback received within {}s",
                    self.timeout.as_secs()
                ))
            })??;

        match outcome {
            CallbackOutcome::Code { code, state } => {
                info!("Received authorization code");
                Ok((code, state))
            }
            CallbackOutcome::Error { error, description } => Err(AuthError::OAuthFailed(
                match description {
                    Some(description) => format!("{}: {}", error, description),
                    None => error,
                },
            )),
        }
    }

    async fn accept_callback(listener: &TcpListener) -> AuthResult<CallbackOutcome> {
        loop {
            let (mut stream, peer_addr) = listener.accept().await.map_err(|e| {
                AuthError::CallbackServer(format!("Failed to accept connection: {}", e))
            })?;
            debug!("Received connection from {}", peer_addr);

            let mut buffer = vec![0; 4096];
            let n = stream
                .read(&mut buffer)
                .await
                .map_err(|e| AuthError::CallbackServer(format!("Failed to read request: {}", e)))?;
            let request = String::from_utf8_lossy(&buffer[..n]);

            match Self::parse_request_line(&request) {
                Some(outcome) => {
                    let response = match &outcome {
                        CallbackOutcome::Code { .. } => Self::html_response("200 OK", SUCCESS_HTML),
                        CallbackOutcome::Error { error, .. } => Self::html_response(
                            "400 Bad Request",
                            &format!(
                                "<html><body><h1>Authentication Failed</h1><p>{}</p><p>You can close this tab.</p></body></html>",
                                escape_html(error)
                            ),
                        ),
                    };
                    if let Err(e) = stream.write_all(response.as_bytes()).await {
                        error!("Failed to send callback response: {}", e);
                    }
                    return Ok(outcome);
                }
                None => {
                    // Browsers also request /favicon.ico; keep waiting.
                    let _ = stream
                        .write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n")
                        .await;
                }
            }
        }
    }

    /// Parse `GET /auth/callback?... HTTP/1.1`; `None` for anything else
    pub fn parse_request_line(request: &str) -> Option<CallbackOutcome> {
        let first_line = request.lines().next()?;
        let mut parts = first_line.split_whitespace();
        let _method = parts.next()?;
        let target = parts.next()?;

        let url = Url::parse(&format!("http://localhost{}", target)).ok()?;
        if url.path() != CALLBACK_PATH {
            return None;
        }

        let mut code = None;
        let mut state = None;
        let mut error = None;
        let mut description = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => code = Some(value.into_owned()),
                "state" => state = Some(value.into_owned()),
                "error" => error = Some(value.into_owned()),
                "error_description" => description = Some(value.into_owned()),
                _ => {}
            }
        }

        match (code, state, error) {
            (_, _, Some(error)) => Some(CallbackOutcome::Error { error, description }),
            (Some(code), Some(state), None) => Some(CallbackOutcome::Code { code, state }),
            _ => Some(CallbackOutcome::Error {
                error: "missing_code".to_string(),
                description: Some("No authorization code or state found in callback".to_string()),
            }),
        }
    }

    fn html_response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        )
    }
}

/// Escape text echoed from the callback query into the response page
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const SUCCESS_HTML: &str = r#"<html>
<head>
    <title>Signed in to cloudlens</title>
    <style>
        body { font-family: system-ui, -apple-system, sans-serif; max-width: 600px; margin: 100px auto; text-align: center; }
        h1 { color: #22c55e; }
        p { color: #64748b; }
    </style>
</head>
<body>
    <h1>Signed in</h1>
    <p>You can close this tab and return to your terminal.</p>
</body>
</html>"#;
