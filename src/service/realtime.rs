// service/realtime.rs
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{config::Config, error::ClientError, models::chatmodels::ChatMessage};

pub const MESSAGE_SENT_EVENT: &str = "message.sent";

/// Channel naming convention shared with the backend broadcaster.
pub fn channel_name(document_id: &str) -> String {
    format!("private-chat.{}", document_id)
}

/// One inbound event as delivered by the pub/sub transport.
#[derive(Debug, Clone)]
pub struct RealtimeEvent {
    pub event: String,
    pub channel: String,
    pub payload: serde_json::Value,
}

/// The third-party pub/sub SDK, consumed as a black box. Delivery is
/// at-least-once; ordering is the consumer's problem.
#[async_trait]
pub trait RealtimeTransport: Send + Sync {
    /// Ephemeral connection id presented to the authorization endpoint.
    fn socket_id(&self) -> String;

    async fn subscribe(
        &self,
        channel: &str,
        auth_signature: &str,
    ) -> Result<mpsc::Receiver<RealtimeEvent>, ClientError>;

    async fn unsubscribe(&self, channel: &str) -> Result<(), ClientError>;
}

/// Obtains the signed grant a private channel requires.
#[async_trait]
pub trait ChannelAuthorizer: Send + Sync {
    async fn authorize(&self, channel: &str, socket_id: &str) -> Result<String, ClientError>;
}

/// Production authorizer: posts the channel name and connection id to the
/// backend's broadcasting endpoint with the caller's bearer token.
#[derive(Debug, Clone)]
pub struct HttpChannelAuthorizer {
    http: reqwest::Client,
    auth_url: String,
    bearer_token: String,
}

impl HttpChannelAuthorizer {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        Self {
            http,
            auth_url: config.realtime_auth_url.clone(),
            bearer_token: config.bearer_token.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AuthGrant {
    auth: String,
}

#[async_trait]
impl ChannelAuthorizer for HttpChannelAuthorizer {
    async fn authorize(&self, channel: &str, socket_id: &str) -> Result<String, ClientError> {
        let response = self
            .http
            .post(&self.auth_url)
            .bearer_auth(&self.bearer_token)
            .json(&serde_json::json!({
                "channel_name": channel,
                "socket_id": socket_id,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClientError::Realtime(format!(
                "channel authorization rejected with status {}",
                response.status()
            )));
        }
        let grant: AuthGrant = response.json().await?;
        Ok(grant.auth)
    }
}

/// A live subscription to one document's chat channel. Dropping without
/// calling [`Subscription::unsubscribe`] leaves the transport to reap the
/// channel on disconnect.
pub struct Subscription {
    channel: String,
    receiver: mpsc::Receiver<ChatMessage>,
    transport: Arc<dyn RealtimeTransport>,
}

impl Subscription {
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Next inbound message not authored by the current user. `None` when
    /// the transport closed the stream.
    pub async fn recv(&mut self) -> Option<ChatMessage> {
        self.receiver.recv().await
    }

    pub async fn unsubscribe(self) {
        if let Err(e) = self.transport.unsubscribe(&self.channel).await {
            tracing::warn!("failed to unsubscribe from {}: {}", self.channel, e);
        }
    }
}

/// Subscribes to per-document private channels and hands inbound chat
/// messages to the session. All authorize/subscribe failures are logged
/// and swallowed; chat simply stays stale until the next refetch.
pub struct RealtimeChannelClient {
    authorizer: Arc<dyn ChannelAuthorizer>,
    transport: Arc<dyn RealtimeTransport>,
    active_channel: Mutex<Option<String>>,
}

impl RealtimeChannelClient {
    pub fn new(authorizer: Arc<dyn ChannelAuthorizer>, transport: Arc<dyn RealtimeTransport>) -> Self {
        Self {
            authorizer,
            transport,
            active_channel: Mutex::new(None),
        }
    }

    /// Subscribe to a document's channel. Resubscribing with the same
    /// document id replaces the previous interest in that channel.
    pub async fn subscribe(&self, document_id: &str, current_user_id: &str) -> Option<Subscription> {
        let channel = channel_name(document_id);

        let previous = self.active_channel.lock().unwrap().take();
        if let Some(previous) = previous {
            if let Err(e) = self.transport.unsubscribe(&previous).await {
                tracing::warn!("failed to release channel {}: {}", previous, e);
            }
        }

        let socket_id = self.transport.socket_id();
        let auth = match self.authorizer.authorize(&channel, &socket_id).await {
            Ok(auth) => auth,
            Err(e) => {
                tracing::warn!("channel authorization failed for {}: {}", channel, e);
                return None;
            }
        };

        let mut events = match self.transport.subscribe(&channel, &auth).await {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!("subscribe failed for {}: {}", channel, e);
                return None;
            }
        };

        // interest is recorded only once the transport actually holds the
        // channel, so a failed attempt leaves nothing to release later
        *self.active_channel.lock().unwrap() = Some(channel.clone());

        let (tx, rx) = mpsc::channel(64);
        let own_user_id = current_user_id.to_string();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if event.event != MESSAGE_SENT_EVENT {
                    continue;
                }
                let message = match event.payload.get("message") {
                    Some(raw) => match serde_json::from_value::<ChatMessage>(raw.clone()) {
                        Ok(message) => message,
                        Err(e) => {
                            tracing::warn!("dropping malformed chat event: {}", e);
                            continue;
                        }
                    },
                    None => continue,
                };
                if message.user_id == own_user_id {
                    continue;
                }
                if tx.send(message).await.is_err() {
                    break;
                }
            }
        });

        Some(Subscription {
            channel,
            receiver: rx,
            transport: self.transport.clone(),
        })
    }
}
