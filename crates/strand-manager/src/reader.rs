use std::collections::{HashSet, VecDeque};

use async_trait::async_trait;
use strand_store::{ObjectReader, StoreResult};
use strand_types::{Object, ObjectHash};
use tokio::sync::mpsc;

use crate::router::Routed;

/// Live, filtered reader: replays a snapshot, then follows new objects.
///
/// Objects that were already stored when the subscription opened are
/// yielded first, in store order. After that the reader waits for objects
/// routed by the manager, skipping any that were part of the replay. The
/// feed never ends on its own; only `close` or dropping the manager does.
pub struct LiveReader {
    replay: VecDeque<Object>,
    replayed: HashSet<ObjectHash>,
    live: Option<mpsc::UnboundedReceiver<Routed>>,
}

impl LiveReader {
    pub(crate) fn new(snapshot: Vec<Object>, live: mpsc::UnboundedReceiver<Routed>) -> Self {
        let replayed = snapshot.iter().map(Object::hash).collect();
        Self {
            replay: snapshot.into(),
            replayed,
            live: Some(live),
        }
    }
}

#[async_trait]
impl ObjectReader for LiveReader {
    async fn read(&mut self) -> StoreResult<Option<Object>> {
        if let Some(object) = self.replay.pop_front() {
            return Ok(Some(object));
        }
        let Some(live) = self.live.as_mut() else {
            return Ok(None);
        };
        while let Some(routed) = live.recv().await {
            if !self.replayed.contains(&routed.hash) {
                return Ok(Some(routed.object));
            }
        }
        self.live = None;
        Ok(None)
    }

    fn close(&mut self) {
        self.replay.clear();
        self.replayed.clear();
        self.live = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn routed(object: Object) -> Routed {
        Routed {
            hash: object.hash(),
            object,
        }
    }

    #[tokio::test]
    async fn replay_then_live() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut reader = LiveReader::new(vec![Object::new("old")], rx);
        tx.send(routed(Object::new("new"))).unwrap();

        assert_eq!(reader.read().await.unwrap().unwrap().object_type(), "old");
        assert_eq!(reader.read().await.unwrap().unwrap().object_type(), "new");
    }

    #[tokio::test]
    async fn replayed_objects_are_not_repeated() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut reader = LiveReader::new(vec![Object::new("old")], rx);
        tx.send(routed(Object::new("old"))).unwrap();
        tx.send(routed(Object::new("new"))).unwrap();

        assert_eq!(reader.read().await.unwrap().unwrap().object_type(), "old");
        assert_eq!(reader.read().await.unwrap().unwrap().object_type(), "new");
    }

    #[tokio::test]
    async fn closed_feed_ends_the_reader() {
        let (tx, rx) = mpsc::unbounded_channel::<Routed>();
        let mut reader = LiveReader::new(Vec::new(), rx);
        drop(tx);
        assert!(reader.read().await.unwrap().is_none());
        assert!(reader.read().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn close_discards_replay() {
        let (_tx, rx) = mpsc::unbounded_channel::<Routed>();
        let mut reader = LiveReader::new(vec![Object::new("old")], rx);
        reader.close();
        assert!(reader.read().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn backlog_is_delivered_in_order() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut reader = LiveReader::new(Vec::new(), rx);
        for n in 0..2000 {
            let object = Object::new("note").with_field("n", n.into()).unwrap();
            tx.send(routed(object)).unwrap();
        }
        for n in 0..2000 {
            let object = reader.read().await.unwrap().unwrap();
            assert_eq!(object.field("n"), Some(&n.into()));
        }
    }
}
