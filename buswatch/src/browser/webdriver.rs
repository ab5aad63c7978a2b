//! W3C WebDriver implementation of the browser traits.
//!
//! Talks JSON over HTTP to a running driver (`chromedriver`, `geckodriver`,
//! a Selenium grid, ...). Only the handful of endpoints the scraper needs
//! are implemented:
//!
//! | Operation          | Endpoint                                   |
//! |--------------------|--------------------------------------------|
//! | new session        | `POST /session`                            |
//! | navigate           | `POST /session/{id}/url`                   |
//! | find elements      | `POST /session/{id}/elements`              |
//! | find from element  | `POST /session/{id}/element/{eid}/elements`|
//! | element rect       | `GET  /session/{id}/element/{eid}/rect`    |
//! | element text       | `GET  /session/{id}/element/{eid}/text`    |
//! | element attribute  | `GET  /session/{id}/element/{eid}/attribute/{name}` |
//! | execute script     | `POST /session/{id}/execute/sync`          |
//! | delete session     | `DELETE /session/{id}`                     |

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use tokio::time::Instant;

use super::{BoardBrowser, BoardElement, BoardSession, BrowserError};
use crate::http::{JsonRequest, JsonTransport, ReqwestTransport};

/// Default chromedriver listen address.
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

/// W3C web element identifier key.
const ELEMENT_KEY: &str = "element-6066-11e4-a52f-4f50d4b3ff9f";

/// How often `wait_for_selector` re-queries the document.
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Per-request HTTP timeout. Page loads can be slow on the operator's side.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const SCROLL_TO_BOTTOM_SCRIPT: &str = "window.scrollTo(0, document.body.scrollHeight);";

/// Creates headless WebDriver sessions against a driver endpoint.
#[derive(Debug, Clone)]
pub struct WebDriverBrowser {
    transport: Arc<dyn JsonTransport>,
    base_url: String,
    headless: bool,
}

impl WebDriverBrowser {
    /// Creates a browser factory for the driver at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, BrowserError> {
        let transport = ReqwestTransport::with_timeout(REQUEST_TIMEOUT)
            .map_err(|e| BrowserError::Http(e.to_string()))?;
        Ok(Self::with_transport(base_url, Arc::new(transport)))
    }

    /// Creates a browser factory that talks through `transport`.
    pub fn with_transport(base_url: impl Into<String>, transport: Arc<dyn JsonTransport>) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            headless: true,
        }
    }

    /// Run the browser with a visible window (useful when debugging selectors).
    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn capabilities(&self) -> Value {
        let mut args = vec!["--disable-gpu", "--no-sandbox"];
        if self.headless {
            args.insert(0, "--headless");
        }

        json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": { "args": args }
                }
            }
        })
    }
}

impl BoardBrowser for WebDriverBrowser {
    type Session = WebDriverSession;

    fn open_session(&self) -> BoxFuture<'_, Result<WebDriverSession, BrowserError>> {
        Box::pin(async move {
            let url = format!("{}/session", self.base_url);
            let value = send(
                self.transport.as_ref(),
                Method::POST,
                &url,
                Some(self.capabilities()),
            )
            .await?;

            let session_id = value
                .get("sessionId")
                .and_then(Value::as_str)
                .ok_or_else(|| BrowserError::MalformedResponse("missing sessionId".to_string()))?;

            tracing::debug!(session_id = %session_id, "WebDriver session created");

            Ok(WebDriverSession {
                endpoint: Endpoint {
                    transport: Arc::clone(&self.transport),
                    session_url: format!("{}/session/{}", self.base_url, session_id).into(),
                },
            })
        })
    }
}

/// Transport handle plus the URL of one session.
#[derive(Debug, Clone)]
struct Endpoint {
    transport: Arc<dyn JsonTransport>,
    session_url: Arc<str>,
}

impl Endpoint {
    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, BrowserError> {
        let url = if path.is_empty() {
            self.session_url.to_string()
        } else {
            format!("{}/{}", self.session_url, path)
        };
        send(self.transport.as_ref(), method, &url, body).await
    }

    async fn find_elements(
        &self,
        path: &str,
        selector: &str,
    ) -> Result<Vec<WebDriverElement>, BrowserError> {
        let body = json!({ "using": "css selector", "value": selector });
        let value = self.command(Method::POST, path, Some(body)).await?;
        parse_elements(self, value)
    }
}

/// A live WebDriver session.
#[derive(Debug)]
pub struct WebDriverSession {
    endpoint: Endpoint,
}

impl BoardSession for WebDriverSession {
    type Element = WebDriverElement;

    fn open<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<(), BrowserError>> {
        Box::pin(async move {
            self.endpoint
                .command(Method::POST, "url", Some(json!({ "url": url })))
                .await
                .map(|_| ())
        })
    }

    fn wait_for_selector<'a>(
        &'a self,
        selector: &'a str,
        timeout: Duration,
    ) -> BoxFuture<'a, Result<bool, BrowserError>> {
        Box::pin(async move {
            let deadline = Instant::now() + timeout;
            loop {
                if !self.endpoint.find_elements("elements", selector).await?.is_empty() {
                    return Ok(true);
                }

                let now = Instant::now();
                if now >= deadline {
                    return Ok(false);
                }
                tokio::time::sleep(SELECTOR_POLL_INTERVAL.min(deadline - now)).await;
            }
        })
    }

    fn scroll_to_bottom(&self) -> BoxFuture<'_, Result<(), BrowserError>> {
        Box::pin(async move {
            let body = json!({ "script": SCROLL_TO_BOTTOM_SCRIPT, "args": [] });
            self.endpoint
                .command(Method::POST, "execute/sync", Some(body))
                .await
                .map(|_| ())
        })
    }

    fn find_all<'a>(
        &'a self,
        selector: &'a str,
    ) -> BoxFuture<'a, Result<Vec<WebDriverElement>, BrowserError>> {
        Box::pin(self.endpoint.find_elements("elements", selector))
    }

    fn close(self) -> BoxFuture<'static, Result<(), BrowserError>> {
        Box::pin(async move {
            self.endpoint
                .command(Method::DELETE, "", None)
                .await
                .map(|_| ())
        })
    }
}

/// An element reference inside a [`WebDriverSession`].
#[derive(Debug, Clone)]
pub struct WebDriverElement {
    endpoint: Endpoint,
    id: String,
}

impl WebDriverElement {
    fn path(&self, suffix: &str) -> String {
        format!("element/{}/{}", self.id, suffix)
    }
}

impl BoardElement for WebDriverElement {
    fn vertical_position(&self) -> BoxFuture<'_, Result<f64, BrowserError>> {
        Box::pin(async move {
            let rect = self
                .endpoint
                .command(Method::GET, &self.path("rect"), None)
                .await?;
            rect.get("y")
                .and_then(Value::as_f64)
                .ok_or_else(|| BrowserError::MalformedResponse("rect without y".to_string()))
        })
    }

    fn text(&self) -> BoxFuture<'_, Result<String, BrowserError>> {
        Box::pin(async move {
            let value = self
                .endpoint
                .command(Method::GET, &self.path("text"), None)
                .await?;
            value
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| BrowserError::MalformedResponse("text is not a string".to_string()))
        })
    }

    fn attribute<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Option<String>, BrowserError>> {
        Box::pin(async move {
            let path = self.path(&format!("attribute/{}", name));
            let value = self.endpoint.command(Method::GET, &path, None).await?;
            match value {
                Value::Null => Ok(None),
                Value::String(s) => Ok(Some(s)),
                other => Ok(Some(other.to_string())),
            }
        })
    }

    fn find_all<'a>(
        &'a self,
        selector: &'a str,
    ) -> BoxFuture<'a, Result<Vec<WebDriverElement>, BrowserError>> {
        Box::pin(async move {
            let path = self.path("elements");
            self.endpoint.find_elements(&path, selector).await
        })
    }
}

async fn send(
    transport: &dyn JsonTransport,
    method: Method,
    url: &str,
    body: Option<Value>,
) -> Result<Value, BrowserError> {
    let mut request = JsonRequest::new(method, url);
    if let Some(body) = body {
        request = request.with_body(body);
    }

    let response = transport
        .send(request)
        .await
        .map_err(|e| BrowserError::Http(e.to_string()))?;

    let payload: Value = response
        .json()
        .map_err(|e| BrowserError::MalformedResponse(format!("{} from {}", e, url)))?;

    extract_value(response.status, payload)
}

/// Unwraps the `value` member of a WebDriver response, turning error
/// payloads into [`BrowserError::Command`].
fn extract_value(status: StatusCode, mut payload: Value) -> Result<Value, BrowserError> {
    let value = payload
        .get_mut("value")
        .map(Value::take)
        .unwrap_or(Value::Null);

    if status.is_success() {
        return Ok(value);
    }

    let error = value
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("unknown error")
        .to_string();
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Err(BrowserError::Command { error, message })
}

fn parse_elements(
    endpoint: &Endpoint,
    value: Value,
) -> Result<Vec<WebDriverElement>, BrowserError> {
    let Value::Array(items) = value else {
        return Err(BrowserError::MalformedResponse(
            "expected an array of elements".to_string(),
        ));
    };

    items
        .into_iter()
        .map(|item| {
            item.get(ELEMENT_KEY)
                .and_then(Value::as_str)
                .map(|id| WebDriverElement {
                    endpoint: endpoint.clone(),
                    id: id.to_string(),
                })
                .ok_or_else(|| {
                    BrowserError::MalformedResponse("element without identifier".to_string())
                })
        })
        .collect()
}
