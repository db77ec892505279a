// src/store/memory.rs

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{Mutex, watch};

use super::{
    AggregateStore, StatsMutation,
    subscription::{SnapshotSender, StatsSubscription},
};
use crate::{error::AppError, models::user_stats::StatsDocument};

#[derive(Default)]
struct Inner {
    docs: HashMap<String, StatsDocument>,
    watchers: HashMap<String, SnapshotSender>,
}

impl Inner {
    fn publish(&mut self, user_id: &str) {
        let Some(sender) = self.watchers.get(user_id) else {
            return;
        };
        if sender.receiver_count() == 0 {
            self.watchers.remove(user_id);
            return;
        }
        let doc = self.docs.get(user_id).cloned().unwrap_or_default();
        sender.send_replace(Ok(doc));
    }
}

/// Process-local aggregate store. Every operation runs under one async mutex,
/// which makes `transact` trivially atomic. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryAggregateStore {
    inner: Mutex<Inner>,
}

impl MemoryAggregateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AggregateStore for MemoryAggregateStore {
    async fn get(&self, user_id: &str) -> Result<Option<StatsDocument>, AppError> {
        Ok(self.inner.lock().await.docs.get(user_id).cloned())
    }

    async fn insert_if_absent(&self, user_id: &str, doc: StatsDocument) -> Result<bool, AppError> {
        let mut inner = self.inner.lock().await;
        if inner.docs.contains_key(user_id) {
            return Ok(false);
        }
        inner.docs.insert(user_id.to_string(), doc);
        inner.publish(user_id);
        Ok(true)
    }

    async fn transact(
        &self,
        user_id: &str,
        mutation: StatsMutation<'_>,
    ) -> Result<StatsDocument, AppError> {
        let mut inner = self.inner.lock().await;
        let mut doc = inner.docs.get(user_id).cloned().unwrap_or_default();
        let patch = mutation(&doc);
        doc.merge(patch);
        inner.docs.insert(user_id.to_string(), doc.clone());
        inner.publish(user_id);
        Ok(doc)
    }

    async fn subscribe(&self, user_id: &str) -> Result<StatsSubscription, AppError> {
        let mut inner = self.inner.lock().await;
        let current = inner.docs.get(user_id).cloned().unwrap_or_default();
        let sender = inner
            .watchers
            .entry(user_id.to_string())
            .or_insert_with(|| watch::channel(Ok(current)).0);
        Ok(StatsSubscription::new(sender.subscribe(), None))
    }
}
