use std::collections::VecDeque;

use async_trait::async_trait;
use strand_types::Object;

use crate::error::StoreResult;

/// Sequential, pull-only cursor over objects.
///
/// `read` yields the next object, or `Ok(None)` once the reader is exhausted
/// or closed. Live readers never exhaust on their own; they wait for the next
/// matching object instead.
#[async_trait]
pub trait ObjectReader: Send {
    async fn read(&mut self) -> StoreResult<Option<Object>>;

    /// Release the reader's resources. Later reads return `Ok(None)`.
    fn close(&mut self);
}

/// Owned, type-erased reader.
pub type BoxedReader = Box<dyn ObjectReader>;

/// Finite reader over a pre-materialized list of objects.
#[derive(Debug, Default)]
pub struct VecReader {
    objects: VecDeque<Object>,
}

impl VecReader {
    pub fn new(objects: Vec<Object>) -> Self {
        Self {
            objects: objects.into(),
        }
    }

    /// Objects not yet read.
    pub fn remaining(&self) -> usize {
        self.objects.len()
    }
}

#[async_trait]
impl ObjectReader for VecReader {
    async fn read(&mut self) -> StoreResult<Option<Object>> {
        Ok(self.objects.pop_front())
    }

    fn close(&mut self) {
        self.objects.clear();
    }
}

/// Drain a reader to exhaustion.
pub async fn read_all(reader: &mut dyn ObjectReader) -> StoreResult<Vec<Object>> {
    let mut objects = Vec::new();
    while let Some(object) = reader.read().await? {
        objects.push(object);
    }
    Ok(objects)
}
