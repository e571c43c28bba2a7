//! Bounded message queues for host and view communication.

use flume::{Receiver, Sender};

use crate::{EdgeflowError, Result};

/// Bounded MPSC queue split into a cloneable sending half and a receiving half.
///
/// The receiving half observes disconnection once every sender is dropped,
/// which is how a view loop learns that its host went away.
pub struct Queue;

impl Queue {
    /// create a new queue
    pub fn bounded<T>(cap: usize) -> (QueueSender<T>, QueueReceiver<T>) {
        let (tx, rx) = flume::bounded(cap);
        (
            QueueSender {
                sender: tx,
            },
            QueueReceiver {
                receiver: rx,
            },
        )
    }
}

#[derive(Debug)]
pub struct QueueSender<T> {
    sender: Sender<T>,
}

impl<T> Clone for QueueSender<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

#[derive(Debug)]
pub struct QueueReceiver<T> {
    receiver: Receiver<T>,
}

impl<T> QueueSender<T> {
    /// send a message to the queue
    pub fn send(
        &self,
        msg: T,
    ) -> Result<()> {
        self.sender.send(msg).map_err(|e| EdgeflowError::Queue(e.to_string()))
    }

    /// send a message to the queue asynchronously
    pub async fn send_async(
        &self,
        msg: T,
    ) -> Result<()> {
        self.sender.send_async(msg).await.map_err(|e| EdgeflowError::Queue(e.to_string()))
    }
}

impl<T> QueueReceiver<T> {
    /// receive a message, `None` once all senders are gone
    pub fn next(&self) -> Option<T> {
        self.receiver.recv().ok()
    }

    /// receive a message without blocking
    pub fn try_next(&self) -> Option<T> {
        self.receiver.try_recv().ok()
    }

    /// receive a message from the queue asynchronously
    pub async fn next_async(&self) -> Option<T> {
        self.receiver.recv_async().await.ok()
    }
}
