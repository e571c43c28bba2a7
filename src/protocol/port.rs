//! Channels between a host, a view loop and the canvas UI.

use serde_json::Value;

use crate::{
    EditorConfig, Result,
    common::{Queue, QueueReceiver, QueueSender},
    protocol::message::{HostMessage, Inbound, Reply, UserAction, ViewMessage},
};

pub struct ViewPort;

impl ViewPort {
    /// Builds the three ends of one view's channels, each queue bounded by `cap`.
    pub fn pair(cap: usize) -> (HostEnd, ViewEnd, UiEnd) {
        let (inbound_tx, inbound_rx) = Queue::bounded::<Inbound>(cap);
        let (outbound_tx, outbound_rx) = Queue::bounded::<ViewMessage>(cap);
        let (reply_tx, reply_rx) = Queue::bounded::<Reply>(cap);

        (
            HostEnd {
                to_view: inbound_tx.clone(),
                from_view: outbound_rx,
            },
            ViewEnd {
                inbound: inbound_rx,
                to_host: outbound_tx,
                to_ui: reply_tx,
            },
            UiEnd {
                to_view: inbound_tx,
                replies: reply_rx,
            },
        )
    }

    /// Same as [`ViewPort::pair`] with the configured queue size.
    pub fn from_config(config: &EditorConfig) -> (HostEnd, ViewEnd, UiEnd) {
        Self::pair(config.queue_size)
    }
}

/// Extension host side.
pub struct HostEnd {
    to_view: QueueSender<Inbound>,
    from_view: QueueReceiver<ViewMessage>,
}

impl HostEnd {
    pub fn load(
        &self,
        manifest: Value,
    ) -> Result<()> {
        self.to_view.send(HostMessage::Load {
            manifest,
        }
        .into())
    }

    pub fn close(&self) -> Result<()> {
        self.to_view.send(HostMessage::Close.into())
    }

    pub fn next_message(&self) -> Option<ViewMessage> {
        self.from_view.next()
    }

    pub async fn next_message_async(&self) -> Option<ViewMessage> {
        self.from_view.next_async().await
    }
}

/// View loop side, consumed by [`ViewController::serve`](crate::ViewController::serve).
pub struct ViewEnd {
    pub(crate) inbound: QueueReceiver<Inbound>,
    pub(crate) to_host: QueueSender<ViewMessage>,
    pub(crate) to_ui: QueueSender<Reply>,
}

/// Canvas side: sends gestures, receives replies.
pub struct UiEnd {
    to_view: QueueSender<Inbound>,
    replies: QueueReceiver<Reply>,
}

impl UiEnd {
    pub fn send(
        &self,
        action: UserAction,
    ) -> Result<()> {
        self.to_view.send(action.into())
    }

    pub async fn send_async(
        &self,
        action: UserAction,
    ) -> Result<()> {
        self.to_view.send_async(action.into()).await
    }

    pub fn next_reply(&self) -> Option<Reply> {
        self.replies.next()
    }

    pub async fn next_reply_async(&self) -> Option<Reply> {
        self.replies.next_async().await
    }
}
