//! Inbound queue: many connection handlers produce, one dispatch loop consumes.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Creates an unbounded FIFO of raw wire records.
pub fn inbound_queue() -> (InboundSender, InboundReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (InboundSender { tx }, InboundReceiver { rx })
}

/// Producer side, cloned into every connection handler.
#[derive(Debug, Clone)]
pub struct InboundSender {
    tx: mpsc::UnboundedSender<String>,
}

impl InboundSender {
    /// Never blocks. Returns `false` once the consumer is gone.
    pub fn enqueue(&self, record: String) -> bool {
        self.tx.send(record).is_ok()
    }
}

#[derive(Debug)]
pub struct InboundReceiver {
    rx: mpsc::UnboundedReceiver<String>,
}

impl InboundReceiver {
    /// Waits for the next record. Returns `None` when `cancel` fires or every
    /// producer has been dropped.
    pub async fn dequeue(&mut self, cancel: &CancellationToken) -> Option<String> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            record = self.rx.recv() => record,
        }
    }

    pub fn try_dequeue(&mut self) -> Option<String> {
        self.rx.try_recv().ok()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_fifo_order_across_producers() {
        let (tx, mut rx) = inbound_queue();
        let other = tx.clone();

        assert!(tx.enqueue("PREPARE;1;M1".into()));
        assert!(other.enqueue("PREPARE;2;M2".into()));
        assert!(tx.enqueue("PREPARE;3;M3".into()));
        assert_eq!(rx.len(), 3);

        let token = CancellationToken::new();
        assert_eq!(rx.dequeue(&token).await.as_deref(), Some("PREPARE;1;M1"));
        assert_eq!(rx.dequeue(&token).await.as_deref(), Some("PREPARE;2;M2"));
        assert_eq!(rx.try_dequeue().as_deref(), Some("PREPARE;3;M3"));
        assert!(rx.is_empty());
    }

    #[tokio::test]
    async fn test_dequeue_unblocks_on_cancel() {
        let (_tx, mut rx) = inbound_queue();
        let token = CancellationToken::new();

        let waiter = {
            let token = token.clone();
            tokio::spawn(async move { rx.dequeue(&token).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();

        let result = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("dequeue should return after cancel")
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_enqueue_after_consumer_dropped() {
        let (tx, rx) = inbound_queue();
        drop(rx);
        assert!(!tx.enqueue("ACCEPT;1;M1;M1".into()));
    }
}
