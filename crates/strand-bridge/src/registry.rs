use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use strand_store::BoxedReader;
use strand_types::Object;
use tokio::sync::{watch, Mutex};
use tracing::debug;
use uuid::Uuid;

use crate::error::{BridgeError, BridgeResult};

/// An open reader plus the flag that closes it.
pub struct Subscription {
    reader: Mutex<BoxedReader>,
    closed: watch::Sender<bool>,
}

impl Subscription {
    pub fn new(reader: BoxedReader) -> Self {
        let (closed, _) = watch::channel(false);
        Self {
            reader: Mutex::new(reader),
            closed,
        }
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Read the next object, waiting at most `timeout`.
    ///
    /// Closing the subscription interrupts a pending read, which then
    /// fails with `subscription closed`.
    pub async fn next(&self, timeout: Duration) -> BridgeResult<Object> {
        let closed = self.closed.subscribe();
        let read = async {
            let mut reader = self.reader.lock().await;
            reader.read().await
        };
        tokio::select! {
            biased;
            _ = wait_closed(closed) => Err(BridgeError::SubscriptionClosed),
            res = tokio::time::timeout(timeout, read) => match res {
                Ok(Ok(Some(object))) => Ok(object),
                Ok(Ok(None)) => Err(BridgeError::EndOfStream),
                Ok(Err(e)) => Err(e.into()),
                Err(_) => Err(BridgeError::Timeout(timeout.as_millis() as u64)),
            },
        }
    }

    /// Interrupt pending reads, then close the reader.
    pub async fn close(&self) {
        self.closed.send_replace(true);
        self.reader.lock().await.close();
    }
}

async fn wait_closed(mut closed: watch::Receiver<bool>) {
    loop {
        if *closed.borrow_and_update() {
            return;
        }
        if closed.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Token table of open subscriptions.
///
/// Lookups take the read lock and may run side by side; `register` and
/// `remove` take the write lock. Entries are handed out as `Arc`s so no
/// lock is held while a reader is in use.
#[derive(Default)]
pub struct SubscriptionRegistry {
    entries: RwLock<HashMap<String, Arc<Subscription>>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a reader under a fresh token.
    pub fn register(&self, reader: BoxedReader) -> String {
        let token = Uuid::now_v7().to_string();
        self.entries
            .write()
            .expect("registry lock poisoned")
            .insert(token.clone(), Arc::new(Subscription::new(reader)));
        debug!(%token, "subscription registered");
        token
    }

    pub fn get(&self, token: &str) -> BridgeResult<Arc<Subscription>> {
        self.entries
            .read()
            .expect("registry lock poisoned")
            .get(token)
            .cloned()
            .ok_or(BridgeError::MissingSubscription)
    }

    /// Take a subscription out of the table. Closing it is up to the caller.
    pub fn remove(&self, token: &str) -> BridgeResult<Arc<Subscription>> {
        let removed = self
            .entries
            .write()
            .expect("registry lock poisoned")
            .remove(token)
            .ok_or(BridgeError::MissingSubscription)?;
        debug!(%token, "subscription removed");
        Ok(removed)
    }

    pub fn len(&self) -> usize {
        self.entries.read().expect("registry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use strand_store::{ObjectReader, StoreResult, VecReader};

    /// Reader that never yields.
    struct Stalled;

    #[async_trait::async_trait]
    impl ObjectReader for Stalled {
        async fn read(&mut self) -> StoreResult<Option<Object>> {
            std::future::pending().await
        }

        fn close(&mut self) {}
    }

    fn objects(types: &[&str]) -> BoxedReader {
        Box::new(VecReader::new(types.iter().map(|t| Object::new(*t)).collect()))
    }

    #[test]
    fn tokens_are_unique() {
        let registry = SubscriptionRegistry::new();
        let tokens: HashSet<String> = (0..1000).map(|_| registry.register(objects(&[]))).collect();
        assert_eq!(tokens.len(), 1000);
        assert_eq!(registry.len(), 1000);
    }

    #[test]
    fn concurrent_register_get_remove() {
        use std::thread;

        let registry = Arc::new(SubscriptionRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    let mut issued = Vec::new();
                    let mut kept = Vec::new();
                    for j in 0..100 {
                        let token = registry.register(objects(&["a"]));
                        assert!(registry.get(&token).is_ok());
                        if (i + j) % 2 == 0 {
                            registry.remove(&token).unwrap();
                            assert!(matches!(
                                registry.get(&token),
                                Err(BridgeError::MissingSubscription)
                            ));
                            assert!(matches!(
                                registry.remove(&token),
                                Err(BridgeError::MissingSubscription)
                            ));
                        } else {
                            kept.push(token.clone());
                        }
                        issued.push(token);
                    }
                    (issued, kept)
                })
            })
            .collect();

        let mut issued = HashSet::new();
        let mut kept = Vec::new();
        for h in handles {
            let (tokens, still_open) = h.join().expect("thread should not panic");
            for token in tokens {
                assert!(issued.insert(token), "token issued twice");
            }
            kept.extend(still_open);
        }
        assert_eq!(issued.len(), 800);
        assert_eq!(kept.len(), 400);
        assert_eq!(registry.len(), 400);
        for token in &kept {
            assert!(registry.get(token).is_ok());
        }
    }

    #[test]
    fn removed_token_is_missing() {
        let registry = SubscriptionRegistry::new();
        let token = registry.register(objects(&[]));
        assert!(registry.get(&token).is_ok());
        registry.remove(&token).unwrap();
        assert!(matches!(registry.get(&token), Err(BridgeError::MissingSubscription)));
        assert!(matches!(registry.remove(&token), Err(BridgeError::MissingSubscription)));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn next_reads_in_order_then_ends() {
        let sub = Subscription::new(objects(&["a", "b"]));
        let timeout = Duration::from_secs(1);
        assert_eq!(sub.next(timeout).await.unwrap().object_type(), "a");
        assert_eq!(sub.next(timeout).await.unwrap().object_type(), "b");
        assert!(matches!(sub.next(timeout).await, Err(BridgeError::EndOfStream)));
    }

    #[tokio::test]
    async fn next_times_out() {
        let sub = Subscription::new(Box::new(Stalled));
        let err = sub.next(Duration::from_millis(20)).await.unwrap_err();
        assert_eq!(err.to_string(), "timed out after 20ms");
    }

    #[tokio::test]
    async fn close_interrupts_pending_read() {
        let sub = Arc::new(Subscription::new(Box::new(Stalled)));
        let pending = {
            let sub = sub.clone();
            tokio::spawn(async move { sub.next(Duration::from_secs(30)).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        sub.close().await;
        assert!(sub.is_closed());
        let result = pending.await.unwrap();
        assert!(matches!(result, Err(BridgeError::SubscriptionClosed)));
    }

    #[tokio::test]
    async fn closed_subscription_refuses_reads() {
        let sub = Subscription::new(objects(&["a"]));
        sub.close().await;
        assert!(matches!(
            sub.next(Duration::from_secs(1)).await,
            Err(BridgeError::SubscriptionClosed)
        ));
    }
}
