//! Broadcast channel backing the notice bus

use crate::message::Notice;
use tokio::sync::broadcast;
use tracing::debug;

/// Default channel capacity before slow subscribers start lagging
pub const DEFAULT_CAPACITY: usize = 256;

/// Notice bus handle
///
/// Cheap to clone; all clones publish into the same channel. Publishing is
/// best-effort: with no live subscribers the notice is dropped, never an error.
#[derive(Debug, Clone)]
pub struct NoticeBus {
    tx: broadcast::Sender<Notice>,
}

impl NoticeBus {
    /// Create a bus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish a notice, returning the number of subscribers that received it
    pub fn publish(&self, notice: Notice) -> usize {
        let subject = notice.subject();
        match self.tx.send(notice) {
            Ok(receivers) => {
                debug!("Published {} to {} subscribers", subject, receivers);
                receivers
            }
            // No subscribers: the notice stream is advisory, not load-bearing
            Err(_) => 0,
        }
    }

    /// Subscribe to all notices published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for NoticeBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NoticeType;
    use serde_json::json;

    #[tokio::test]
    async fn test_publish_without_subscribers_is_dropped() {
        let bus = NoticeBus::default();
        let delivered = bus.publish(Notice::new(NoticeType::FlightRegistered, json!({})));
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn test_publish_reaches_all_subscribers() {
        let bus = NoticeBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        let delivered = bus.publish(Notice::new(
            NoticeType::OracleRequestOpened,
            json!({"index": 3}),
        ));
        assert_eq!(delivered, 2);

        let n1 = rx1.recv().await.unwrap();
        let n2 = rx2.recv().await.unwrap();
        assert_eq!(n1.id, n2.id);
        assert_eq!(n1.payload["index"], 3);
    }

    #[tokio::test]
    async fn test_notices_arrive_in_publish_order() {
        let bus = NoticeBus::default();
        let mut rx = bus.subscribe();

        for i in 0..10 {
            bus.publish(Notice::new(NoticeType::CreditIssued, json!({ "seq": i })));
        }

        for i in 0..10 {
            let notice = rx.recv().await.unwrap();
            assert_eq!(notice.payload["seq"], i);
        }
    }
}
