//! Discord REST transport.
//!
//! Resolves a channel name the way a bot sees it: list the bot's guilds,
//! then each guild's channels, and take the first text channel with the
//! wanted name. Resolved ids are cached for the lifetime of the notifier.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use super::{Notifier, NotifyError};
use crate::http::{JsonRequest, JsonTransport, ReqwestTransport};

/// Discord REST API root.
pub const DEFAULT_DISCORD_API_BASE: &str = "https://discord.com/api/v10";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Discord `GUILD_TEXT` channel type.
const GUILD_TEXT: u8 = 0;

#[derive(Debug, Deserialize)]
struct Guild {
    id: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct Channel {
    id: String,
    #[serde(rename = "type")]
    kind: u8,
    #[serde(default)]
    name: Option<String>,
}

/// Sends messages as a Discord bot.
pub struct DiscordNotifier {
    transport: Arc<dyn JsonTransport>,
    api_base: String,
    token: String,
    channel_ids: Mutex<HashMap<String, String>>,
}

impl DiscordNotifier {
    /// Creates a notifier authenticated with a bot token.
    pub fn new(token: impl Into<String>) -> Result<Self, NotifyError> {
        let transport = ReqwestTransport::with_timeout(REQUEST_TIMEOUT)
            .map_err(|e| NotifyError::Http(e.to_string()))?;
        Ok(Self::with_transport(token, Arc::new(transport)))
    }

    /// Creates a notifier on an existing transport.
    pub fn with_transport(token: impl Into<String>, transport: Arc<dyn JsonTransport>) -> Self {
        Self {
            transport,
            api_base: DEFAULT_DISCORD_API_BASE.to_string(),
            token: token.into(),
            channel_ids: Mutex::new(HashMap::new()),
        }
    }

    /// Point at a different API root (proxies, test servers).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, NotifyError> {
        let mut request = JsonRequest::new(method, format!("{}{}", self.api_base, path))
            .with_authorization(format!("Bot {}", self.token));
        if let Some(body) = body {
            request = request.with_body(body);
        }

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| NotifyError::Http(e.to_string()))?;

        if !response.status.is_success() {
            return Err(NotifyError::Api {
                status: response.status.as_u16(),
                body: response.body,
            });
        }

        response
            .json()
            .map_err(|e| NotifyError::Http(format!("Failed to decode response: {}", e)))
    }

    async fn resolve_channel(&self, name: &str) -> Result<String, NotifyError> {
        if let Some(id) = self.cached_channel(name) {
            return Ok(id);
        }

        let guilds: Vec<Guild> = self
            .request(Method::GET, "/users/@me/guilds", None)
            .await?;

        for guild in &guilds {
            let channels: Vec<Channel> = self
                .request(Method::GET, &format!("/guilds/{}/channels", guild.id), None)
                .await?;

            if let Some(channel) = find_text_channel(&channels, name) {
                tracing::debug!(
                    guild = %guild.name,
                    channel = name,
                    channel_id = %channel.id,
                    "Resolved notification channel"
                );
                let id = channel.id.clone();
                if let Ok(mut ids) = self.channel_ids.lock() {
                    ids.insert(name.to_string(), id.clone());
                }
                return Ok(id);
            }
        }

        Err(NotifyError::ChannelNotFound(name.to_string()))
    }

    fn cached_channel(&self, name: &str) -> Option<String> {
        self.channel_ids
            .lock()
            .ok()
            .and_then(|ids| ids.get(name).cloned())
    }

    /// Drop a cached id so the next send resolves the name again.
    fn forget_channel(&self, name: &str) {
        if let Ok(mut ids) = self.channel_ids.lock() {
            ids.remove(name);
        }
    }
}

impl Notifier for DiscordNotifier {
    fn send<'a>(
        &'a self,
        channel: &'a str,
        message: &'a str,
    ) -> BoxFuture<'a, Result<(), NotifyError>> {
        Box::pin(async move {
            let channel_id = self.resolve_channel(channel).await?;
            let posted: Result<serde_json::Value, _> = self
                .request(
                    Method::POST,
                    &format!("/channels/{}/messages", channel_id),
                    Some(json!({ "content": message })),
                )
                .await;

            match posted {
                Ok(_) => Ok(()),
                Err(NotifyError::Api { status: 404, body }) => {
                    tracing::warn!(
                        channel,
                        channel_id = %channel_id,
                        "Cached channel no longer exists, will resolve again"
                    );
                    self.forget_channel(channel);
                    Err(NotifyError::Api { status: 404, body })
                }
                Err(e) => Err(e),
            }
        })
    }
}

/// First text channel named `name`, in listing order.
fn find_text_channel<'a>(channels: &'a [Channel], name: &str) -> Option<&'a Channel> {
    channels
        .iter()
        .find(|c| c.kind == GUILD_TEXT && c.name.as_deref() == Some(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::tests::{MockTransport, UnreachableTransport};
    use reqwest::StatusCode;

    fn channels(raw: &str) -> Vec<Channel> {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn test_find_text_channel_skips_voice_and_categories() {
        let list = channels(
            r#"[
                {"id": "1", "type": 4, "name": "general"},
                {"id": "2", "type": 2, "name": "general"},
                {"id": "3", "type": 0, "name": "general"},
                {"id": "4", "type": 0, "name": "general"}
            ]"#,
        );

        assert_eq!(find_text_channel(&list, "general").unwrap().id, "3");
    }

    #[test]
    fn test_find_text_channel_exact_name() {
        let list = channels(r#"[{"id": "1", "type": 0, "name": "general-2"}]"#);
        assert!(find_text_channel(&list, "general").is_none());
    }

    #[test]
    fn test_channel_without_name_decodes() {
        let list = channels(r#"[{"id": "9", "type": 1}]"#);
        assert_eq!(list.len(), 1);
        assert!(find_text_channel(&list, "general").is_none());
    }

    #[test]
    fn test_api_base_trailing_slash() {
        let notifier = DiscordNotifier::with_transport("token", Arc::new(MockTransport::default()))
            .with_api_base("http://127.0.0.1:1/api/");
        assert_eq!(notifier.api_base, "http://127.0.0.1:1/api");
    }

    const API: &str = "http://discord";

    fn url(path: &str) -> String {
        format!("{}{}", API, path)
    }

    /// Two guilds; only the second has a text channel named `通知チャンネル`.
    fn two_guilds() -> MockTransport {
        MockTransport::default()
            .route(
                Method::GET,
                &url("/users/@me/guilds"),
                StatusCode::OK,
                json!([{"id": "g1", "name": "first"}, {"id": "g2", "name": "second"}]),
            )
            .route(
                Method::GET,
                &url("/guilds/g1/channels"),
                StatusCode::OK,
                json!([
                    {"id": "10", "type": 0, "name": "general"},
                    {"id": "11", "type": 2, "name": "通知チャンネル"}
                ]),
            )
            .route(
                Method::GET,
                &url("/guilds/g2/channels"),
                StatusCode::OK,
                json!([{"id": "20", "type": 0, "name": "通知チャンネル"}]),
            )
    }

    fn notifier(mock: MockTransport) -> (DiscordNotifier, Arc<MockTransport>) {
        let mock = Arc::new(mock);
        let notifier = DiscordNotifier::with_transport("secret", mock.clone()).with_api_base(API);
        (notifier, mock)
    }

    #[tokio::test]
    async fn test_resolves_channel_in_second_guild_and_reuses_cache() {
        let (notifier, mock) = notifier(two_guilds().route(
            Method::POST,
            &url("/channels/20/messages"),
            StatusCode::OK,
            json!({"id": "m1"}),
        ));

        notifier.send("通知チャンネル", "first").await.unwrap();
        notifier.send("通知チャンネル", "second").await.unwrap();

        assert_eq!(mock.count(Method::GET, &url("/users/@me/guilds")), 1);
        assert_eq!(mock.count(Method::GET, &url("/guilds/g2/channels")), 1);
        assert_eq!(mock.count(Method::POST, &url("/channels/20/messages")), 2);

        let requests = mock.requests.lock().unwrap();
        let last = requests.last().unwrap();
        assert_eq!(last.authorization.as_deref(), Some("Bot secret"));
        assert_eq!(last.body.as_ref().unwrap()["content"], "second");
    }

    #[tokio::test]
    async fn test_deleted_channel_is_resolved_again() {
        // POST route left out: the mock answers 404 as for a deleted channel.
        let (notifier, mock) = notifier(two_guilds());

        let first = notifier.send("通知チャンネル", "hello").await;
        assert!(matches!(first, Err(NotifyError::Api { status: 404, .. })));
        assert!(notifier.cached_channel("通知チャンネル").is_none());

        let _ = notifier.send("通知チャンネル", "hello").await;
        assert_eq!(mock.count(Method::GET, &url("/users/@me/guilds")), 2);
    }

    #[tokio::test]
    async fn test_other_api_errors_keep_cache() {
        let (notifier, mock) = notifier(two_guilds().route(
            Method::POST,
            &url("/channels/20/messages"),
            StatusCode::FORBIDDEN,
            json!({"message": "Missing Access"}),
        ));

        let result = notifier.send("通知チャンネル", "hello").await;
        assert!(matches!(result, Err(NotifyError::Api { status: 403, .. })));
        assert_eq!(notifier.cached_channel("通知チャンネル").as_deref(), Some("20"));

        let _ = notifier.send("通知チャンネル", "hello").await;
        assert_eq!(mock.count(Method::GET, &url("/users/@me/guilds")), 1);
    }

    #[tokio::test]
    async fn test_channel_not_found() {
        let (notifier, _mock) = notifier(two_guilds());

        let result = notifier.send("missing", "hello").await;
        assert!(matches!(result, Err(NotifyError::ChannelNotFound(name)) if name == "missing"));
    }

    #[tokio::test]
    async fn test_unreachable_api_is_http_error() {
        let notifier = DiscordNotifier::with_transport("token", Arc::new(UnreachableTransport))
            .with_api_base(API);

        let result = notifier.send("general", "hello").await;
        assert!(matches!(result, Err(NotifyError::Http(_))));
    }
}
