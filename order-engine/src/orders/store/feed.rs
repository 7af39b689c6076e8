//! Live change feed handle

use futures::Stream;
use shared::order::{ChangeEvent, Order};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Message delivered by a change feed, in arrival order
#[derive(Debug, Clone, PartialEq)]
pub enum FeedMessage {
    /// Full result set, sent on (re)connect
    Snapshot(Vec<Order>),
    /// Incremental batch
    Changes(Vec<ChangeEvent>),
    /// The feed failed and will deliver nothing more
    Error(String),
}

/// Receiving side of a subscription.
///
/// Dropping the feed (or calling [`cancel`](Self::cancel)) stops the
/// producer and releases its resources. The queue is unbounded so nothing
/// is dropped when the consumer is slow.
pub struct ChangeFeed {
    rx: mpsc::UnboundedReceiver<FeedMessage>,
    token: CancellationToken,
}

impl ChangeFeed {
    pub fn new(rx: mpsc::UnboundedReceiver<FeedMessage>, token: CancellationToken) -> Self {
        Self { rx, token }
    }

    /// Feed driven by hand, for backends without a producer task
    pub fn channel() -> (mpsc::UnboundedSender<FeedMessage>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self::new(rx, CancellationToken::new()))
    }

    pub async fn recv(&mut self) -> Option<FeedMessage> {
        if self.token.is_cancelled() {
            return None;
        }
        self.rx.recv().await
    }

    pub fn cancel(&mut self) {
        self.token.cancel();
        self.rx.close();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for ChangeFeed {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

impl Stream for ChangeFeed {
    type Item = FeedMessage;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.token.is_cancelled() {
            return Poll::Ready(None);
        }
        self.rx.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_messages_arrive_in_order() {
        let (tx, mut feed) = ChangeFeed::channel();
        tx.send(FeedMessage::Snapshot(vec![])).unwrap();
        tx.send(FeedMessage::Error("boom".into())).unwrap();
        drop(tx);

        assert_eq!(feed.next().await, Some(FeedMessage::Snapshot(vec![])));
        assert_eq!(feed.recv().await, Some(FeedMessage::Error("boom".into())));
        assert_eq!(feed.recv().await, None);
    }

    #[tokio::test]
    async fn test_cancel_stops_delivery() {
        let (tx, mut feed) = ChangeFeed::channel();
        tx.send(FeedMessage::Snapshot(vec![])).unwrap();
        feed.cancel();
        assert!(feed.is_cancelled());
        assert_eq!(feed.recv().await, None);
        assert!(tx.send(FeedMessage::Snapshot(vec![])).is_err());
    }
}
