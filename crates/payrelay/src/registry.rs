//! Transaction id → live client channel.
//!
//! Each connected client owns one [`ChannelHandle`]. Registering a
//! transaction points it at that channel, replacing whatever was there
//! before. The map is keyed by transaction id only, so disconnect cleanup
//! scans for the channel.

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Identity of one client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(Uuid);

impl ChannelId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ChannelId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Outbound `paymentStatus` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename = "paymentStatus", rename_all = "camelCase")]
pub struct StatusPush {
    pub transaction_id: String,
    pub status: String,
}

/// Sending half of a client connection.
#[derive(Debug, Clone)]
pub struct ChannelHandle {
    id: ChannelId,
    tx: mpsc::UnboundedSender<StatusPush>,
}

impl ChannelHandle {
    pub fn new(tx: mpsc::UnboundedSender<StatusPush>) -> Self {
        Self {
            id: ChannelId::new(),
            tx,
        }
    }

    /// Create a handle together with the receiver the connection drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<StatusPush>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Queue a push. Returns `false` if the connection is gone.
    pub fn push(&self, event: StatusPush) -> bool {
        self.tx.send(event).is_ok()
    }
}

impl PartialEq for ChannelHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ChannelHandle {}

/// Result of a [`ConnectionRegistry::notify`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// Push queued on the registered channel.
    Delivered,
    /// Nobody is watching this transaction.
    NoListener,
    /// The registered channel had already closed; its entry was dropped.
    Disconnected,
}

impl NotifyOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotifyOutcome::Delivered => "delivered",
            NotifyOutcome::NoListener => "no_listener",
            NotifyOutcome::Disconnected => "disconnected",
        }
    }
}

/// Process-wide map of transaction ids to the client watching them.
pub struct ConnectionRegistry {
    channels: DashMap<String, ChannelHandle>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    /// Point `transaction_id` at `channel`, returning the superseded handle.
    /// There is no ownership check: the latest registration wins.
    pub fn register(
        &self,
        transaction_id: &str,
        channel: ChannelHandle,
    ) -> Option<ChannelHandle> {
        let channel_id = channel.id();
        let previous = self.channels.insert(transaction_id.to_string(), channel);
        match &previous {
            Some(old) if old.id() != channel_id => tracing::info!(
                transaction_id = %transaction_id,
                channel = %channel_id,
                superseded = %old.id(),
                "transaction re-registered by another channel"
            ),
            _ => tracing::debug!(
                transaction_id = %transaction_id,
                channel = %channel_id,
                "transaction registered"
            ),
        }
        previous
    }

    /// Drop the registration pointing at `channel`, if any.
    ///
    /// Stops at the first match. A channel registered under several ids
    /// loses only one of them per call.
    pub fn unregister(&self, channel: ChannelId) -> Option<String> {
        let transaction_id = loop {
            let key = self
                .channels
                .iter()
                .find(|entry| entry.value().id() == channel)
                .map(|entry| entry.key().clone())?;

            // A miss means another channel took `key` after the scan. That id
            // is no longer ours, so rescanning terminates.
            if let Some((transaction_id, _)) = self
                .channels
                .remove_if(&key, |_, handle| handle.id() == channel)
            {
                break transaction_id;
            }
        };

        tracing::debug!(
            transaction_id = %transaction_id,
            channel = %channel,
            "transaction unregistered"
        );
        Some(transaction_id)
    }

    pub fn lookup(&self, transaction_id: &str) -> Option<ChannelHandle> {
        self.channels
            .get(transaction_id)
            .map(|entry| entry.value().clone())
    }

    /// Push `status` to the channel watching `transaction_id`.
    ///
    /// Best effort and at most once: nothing is buffered for clients that
    /// register later.
    pub fn notify(&self, transaction_id: &str, status: &str) -> NotifyOutcome {
        let Some(handle) = self.lookup(transaction_id) else {
            return NotifyOutcome::NoListener;
        };

        let delivered = handle.push(StatusPush {
            transaction_id: transaction_id.to_string(),
            status: status.to_string(),
        });

        if delivered {
            NotifyOutcome::Delivered
        } else {
            self.channels
                .remove_if(transaction_id, |_, h| h.id() == handle.id());
            tracing::debug!(
                transaction_id = %transaction_id,
                channel = %handle.id(),
                "dropped push for closed channel"
            );
            NotifyOutcome::Disconnected
        }
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
