//! Response rewriting that adds the live-reload client to HTML pages.
//!
//! Every response passing through [`inject_reload_script`] is buffered in
//! full. When its `Content-Type` is exactly `text/html; charset=utf-8`, each
//! literal `</body>` in the body is replaced by the reload script followed by
//! `</body>`, and `Content-Length` is recomputed. Anything else is forwarded
//! unchanged, status and headers included.
//!
//! The match on `</body>` is literal: uppercase or attribute-bearing tags are
//! left alone, and a body with no closing tag gains no script.

use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderValue};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use sack_core::{DEFAULT_PORT, DEFAULT_RELOAD_PATH, DevServerConfig};

use crate::error::ReloadError;
use crate::registry::RELOAD_PAYLOAD;

/// The only content type that triggers injection.
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

const BODY_CLOSE: &str = "</body>";

/// The client-side snippet that reconnects a page to the reload endpoint.
///
/// # Examples
///
/// ```
/// use sack_reload::ReloadScript;
///
/// let script = ReloadScript::default();
/// assert_eq!(script.url(), "ws://localhost:7536/ws");
/// assert!(script.snippet().starts_with("<script>"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadScript {
    snippet: String,
    url: String,
}

impl ReloadScript {
    /// Builds the script for an endpoint at `ws://{host}:{port}{path}`.
    #[must_use]
    pub fn new(host: &str, port: u16, path: &str) -> Self {
        let url = format!("ws://{host}:{port}{path}");
        let snippet = format!(
            concat!(
                "<script>\n",
                "  const socket = new WebSocket(\"{url}\");\n",
                "  socket.onmessage = function(event) {{\n",
                "    if (event.data === \"{payload}\") {{\n",
                "      window.location.reload();\n",
                "    }}\n",
                "  }};\n",
                "</script>\n",
            ),
            url = url,
            payload = RELOAD_PAYLOAD,
        );
        Self { snippet, url }
    }

    /// Builds the script for the host, port and reload path of `config`.
    #[must_use]
    pub fn from_config(config: &DevServerConfig) -> Self {
        Self::new(&config.host, config.port, &config.reload_path)
    }

    /// Returns the WebSocket URL the script connects to.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the `<script>` element inserted before `</body>`.
    #[inline]
    #[must_use]
    pub fn snippet(&self) -> &str {
        &self.snippet
    }

    /// Inserts the script before every literal `</body>` in `html`.
    #[must_use]
    pub fn inject_into(&self, html: &str) -> String {
        html.replace(BODY_CLOSE, &format!("{}{BODY_CLOSE}", self.snippet))
    }
}

impl Default for ReloadScript {
    fn default() -> Self {
        Self::new("localhost", DEFAULT_PORT, DEFAULT_RELOAD_PATH)
    }
}

/// A fully buffered response.
#[derive(Debug)]
pub struct RecordedResponse {
    /// Status as set by the handler.
    pub status: StatusCode,
    /// Headers as set by the handler.
    pub headers: HeaderMap,
    /// The complete body.
    pub body: Bytes,
}

impl RecordedResponse {
    /// Buffers `response` in full.
    ///
    /// # Errors
    ///
    /// Returns [`ReloadError::Body`] if the body stream fails.
    pub async fn capture(response: Response) -> Result<Self, ReloadError> {
        let (parts, body) = response.into_parts();
        let body = axum::body::to_bytes(body, usize::MAX).await?;
        Ok(Self {
            status: parts.status,
            headers: parts.headers,
            body,
        })
    }

    /// Returns `true` if the content type is exactly [`HTML_CONTENT_TYPE`].
    #[must_use]
    pub fn is_html(&self) -> bool {
        self.headers
            .get(CONTENT_TYPE)
            .is_some_and(|value| value.as_bytes() == HTML_CONTENT_TYPE.as_bytes())
    }

    /// Injects `script` if this is an HTML response.
    ///
    /// A body that is not valid UTF-8 is left untouched. So is an empty body,
    /// which is what a `HEAD` response carries; its `Content-Length` keeps
    /// the handler's value, which does not count the script.
    #[must_use]
    pub fn inject(mut self, script: &ReloadScript) -> Self {
        if !self.is_html() || self.body.is_empty() {
            return self;
        }
        let Ok(html) = std::str::from_utf8(&self.body) else {
            tracing::debug!("HTML response is not valid UTF-8, skipping injection");
            return self;
        };

        let rewritten = script.inject_into(html);
        self.headers
            .insert(CONTENT_LENGTH, HeaderValue::from(rewritten.len()));
        self.body = Bytes::from(rewritten);
        self
    }

    /// Rebuilds a response with the recorded status, headers and body.
    #[must_use]
    pub fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Middleware that injects the reload script into HTML responses.
///
/// Use with [`axum::middleware::from_fn_with_state`]:
///
/// ```
/// use axum::{Router, middleware, routing::get, response::Html};
/// use sack_reload::{ReloadScript, inject_reload_script};
///
/// let app: Router = Router::new()
///     .route("/", get(|| async { Html("<html><body>hi</body></html>") }))
///     .layer(middleware::from_fn_with_state(
///         ReloadScript::default(),
///         inject_reload_script,
///     ));
/// ```
pub async fn inject_reload_script(
    State(script): State<ReloadScript>,
    request: Request,
    next: Next,
) -> Response {
    let uri = request.uri().clone();
    let response = next.run(request).await;

    match RecordedResponse::capture(response).await {
        Ok(recorded) => recorded.inject(&script).into_response(),
        Err(err) => {
            tracing::warn!(uri = %uri, error = %err, "Failed to buffer response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::middleware::from_fn_with_state;
    use axum::response::Html;
    use axum::routing::get;
    use tower::ServiceExt;

    const PAGE: &str = "<html><body><h1>Hi</h1></body></html>";

    fn app() -> Router {
        Router::new()
            .route("/page", get(|| async { Html(PAGE) }))
            .route(
                "/created",
                get(|| async { (StatusCode::CREATED, Html("<body>made</body>")) }),
            )
            .route(
                "/json",
                get(|| async {
                    (
                        [(CONTENT_TYPE, "application/json")],
                        r#"{"body":"</body>"}"#,
                    )
                }),
            )
            .route(
                "/plain-html",
                get(|| async { ([(CONTENT_TYPE, "text/html")], "<body></body>") }),
            )
            .route("/no-close", get(|| async { Html("<p>fragment</p>") }))
            .route("/twice", get(|| async { Html("<body></body><body></body>") }))
            .layer(from_fn_with_state(ReloadScript::default(), inject_reload_script))
    }

    async fn get_response(uri: &str) -> (StatusCode, HeaderMap, String) {
        let response = app()
            .oneshot(axum::http::Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, String::from_utf8(body.to_vec()).unwrap())
    }

    #[test]
    fn test_script_snippet() {
        let script = ReloadScript::new("localhost", 7536, "/ws");
        insta::assert_snapshot!(script.snippet(), @r#"
        <script>
          const socket = new WebSocket("ws://localhost:7536/ws");
          socket.onmessage = function(event) {
            if (event.data === "reload") {
              window.location.reload();
            }
          };
        </script>
        "#);
    }

    #[test]
    fn test_script_from_config() {
        let config = DevServerConfig {
            host: "127.0.0.1".to_owned(),
            port: 9000,
            reload_path: "/live".to_owned(),
            ..DevServerConfig::default()
        };
        assert_eq!(ReloadScript::from_config(&config).url(), "ws://127.0.0.1:9000/live");
    }

    #[tokio::test]
    async fn test_html_gets_script_once() {
        let (status, headers, body) = get_response("/page").await;
        let snippet = ReloadScript::default().snippet().to_owned();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.matches(&snippet).count(), 1);
        assert!(body.ends_with(&format!("{snippet}</body></html>")));
        assert_eq!(
            headers.get(CONTENT_LENGTH).unwrap().to_str().unwrap(),
            body.len().to_string()
        );
    }

    #[tokio::test]
    async fn test_status_is_preserved() {
        let (status, _, body) = get_response("/created").await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body.contains("window.location.reload()"));
    }

    #[tokio::test]
    async fn test_every_body_close_is_rewritten() {
        let (_, _, body) = get_response("/twice").await;
        assert_eq!(body.matches("<script>").count(), 2);
    }

    #[tokio::test]
    async fn test_non_html_passes_through() {
        let (status, headers, body) = get_response("/json").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"body":"</body>"}"#);
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
    }

    #[tokio::test]
    async fn test_html_without_charset_is_not_rewritten() {
        let (_, _, body) = get_response("/plain-html").await;
        assert_eq!(body, "<body></body>");
    }

    #[tokio::test]
    async fn test_html_without_body_close_is_unchanged() {
        let (_, headers, body) = get_response("/no-close").await;
        assert_eq!(body, "<p>fragment</p>");
        assert_eq!(
            headers.get(CONTENT_LENGTH).unwrap().to_str().unwrap(),
            "15"
        );
    }

    #[test]
    fn test_empty_body_keeps_content_length() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(HTML_CONTENT_TYPE));
        headers.insert(CONTENT_LENGTH, HeaderValue::from(PAGE.len()));
        let recorded = RecordedResponse {
            status: StatusCode::OK,
            headers,
            body: Bytes::new(),
        };

        let injected = recorded.inject(&ReloadScript::default());
        assert!(injected.body.is_empty());
        assert_eq!(injected.headers.get(CONTENT_LENGTH).unwrap(), &PAGE.len().to_string());
    }

    #[tokio::test]
    async fn test_head_request_does_not_report_zero_length() {
        let response = app()
            .oneshot(axum::http::Request::head("/page").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let length = response
            .headers()
            .get(CONTENT_LENGTH)
            .map(|value| value.to_str().unwrap().to_owned());
        assert_ne!(length.as_deref(), Some("0"));
    }

    #[test]
    fn test_invalid_utf8_is_left_alone() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(HTML_CONTENT_TYPE));
        let recorded = RecordedResponse {
            status: StatusCode::OK,
            headers,
            body: Bytes::from_static(b"\xff</body>"),
        };

        let injected = recorded.inject(&ReloadScript::default());
        assert_eq!(injected.body.as_ref(), b"\xff</body>");
    }
}
