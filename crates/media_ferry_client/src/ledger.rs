//! Bounded in-memory list of recent successful deliveries, newest first.

use crate::{ChannelKind, RequestKind};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use tokio::sync::RwLock;

pub const LEDGER_CAPACITY: usize = 5;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecentItem {
    pub source_url: String,
    pub kind: RequestKind,
    pub artifact_name: String,
    pub channel: ChannelKind,
    pub completed_at: DateTime<Utc>,
}

pub struct RecentItems {
    items: RwLock<VecDeque<RecentItem>>,
    capacity: usize,
}

impl Default for RecentItems {
    fn default() -> Self {
        Self::new()
    }
}

impl RecentItems {
    pub fn new() -> Self {
        Self::with_capacity(LEDGER_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
        }
    }

    /// Push to the front; anything past capacity falls off the tail.
    pub async fn record(&self, item: RecentItem) {
        let mut items = self.items.write().await;
        items.push_front(item);
        items.truncate(self.capacity);
    }

    pub async fn most_recent(&self) -> Option<RecentItem> {
        self.items.read().await.front().cloned()
    }

    pub async fn items(&self) -> Vec<RecentItem> {
        self.items.read().await.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}
