//! Outbound notifications.
//!
//! The change watcher only knows the [`Notifier`] trait; [`DiscordNotifier`]
//! is the production transport. Delivery is fire-and-forget from the
//! watcher's point of view: a failed send is logged and never retried.

mod discord;

pub use discord::{DiscordNotifier, DEFAULT_DISCORD_API_BASE};

use std::sync::Arc;

use futures::future::BoxFuture;
use thiserror::Error;

/// Errors raised while delivering a notification.
#[derive(Debug, Clone, Error)]
pub enum NotifyError {
    /// Transport failure.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The service answered with a non-success status.
    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },

    /// No text channel with this name is visible to the bot.
    #[error("channel not found: {0}")]
    ChannelNotFound(String),
}

/// Delivers a text message to a named channel.
pub trait Notifier: Send + Sync {
    fn send<'a>(
        &'a self,
        channel: &'a str,
        message: &'a str,
    ) -> BoxFuture<'a, Result<(), NotifyError>>;
}

impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    fn send<'a>(
        &'a self,
        channel: &'a str,
        message: &'a str,
    ) -> BoxFuture<'a, Result<(), NotifyError>> {
        (**self).send(channel, message)
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records every message; optionally fails every send.
    #[derive(Default)]
    pub struct RecordingNotifier {
        pub sent: Mutex<Vec<(String, String)>>,
        pub fail: bool,
    }

    impl RecordingNotifier {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        pub fn messages(&self) -> Vec<(String, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl Notifier for RecordingNotifier {
        fn send<'a>(
            &'a self,
            channel: &'a str,
            message: &'a str,
        ) -> BoxFuture<'a, Result<(), NotifyError>> {
            Box::pin(async move {
                self.sent
                    .lock()
                    .unwrap()
                    .push((channel.to_string(), message.to_string()));
                if self.fail {
                    Err(NotifyError::Http("connection refused".to_string()))
                } else {
                    Ok(())
                }
            })
        }
    }

    #[tokio::test]
    async fn test_recording_notifier() {
        let notifier = RecordingNotifier::default();
        notifier.send("general", "hello").await.unwrap();
        assert_eq!(
            notifier.messages(),
            vec![("general".to_string(), "hello".to_string())]
        );

        let failing = RecordingNotifier::failing();
        assert!(failing.send("general", "hello").await.is_err());
    }

    #[test]
    fn test_error_display() {
        let err = NotifyError::Api {
            status: 403,
            body: "Missing Access".to_string(),
        };
        assert_eq!(err.to_string(), "API returned 403: Missing Access");
        assert_eq!(
            NotifyError::ChannelNotFound("bus".to_string()).to_string(),
            "channel not found: bus"
        );
    }
}
