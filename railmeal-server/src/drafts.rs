//! Server-held order drafts.
//!
//! A draft carries the passenger's choices from train search to checkout.
//! Drafts live in memory only, keyed by a random id, and expire after a
//! period without access. Checkout clears a draft only once the order has
//! been committed.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use moka::future::Cache as MokaCache;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::OrderDraft;

/// Opaque draft identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DraftId(Uuid);

impl DraftId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DraftId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DraftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for DraftId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Configuration for draft storage.
#[derive(Debug, Clone)]
pub struct DraftConfig {
    /// Drafts not read or written for this long are dropped.
    pub idle_ttl: Duration,

    /// Maximum number of drafts held at once.
    pub max_capacity: u64,
}

impl Default for DraftConfig {
    fn default() -> Self {
        Self {
            idle_ttl: Duration::from_secs(30 * 60),
            max_capacity: 10_000,
        }
    }
}

impl DraftConfig {
    pub fn with_idle_ttl(mut self, ttl: Duration) -> Self {
        self.idle_ttl = ttl;
        self
    }

    pub fn with_max_capacity(mut self, n: u64) -> Self {
        self.max_capacity = n;
        self
    }
}

/// In-memory draft sessions.
#[derive(Clone)]
pub struct DraftSessions {
    drafts: MokaCache<DraftId, OrderDraft>,
}

impl DraftSessions {
    pub fn new(config: &DraftConfig) -> Self {
        let drafts = MokaCache::builder()
            .time_to_idle(config.idle_ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { drafts }
    }

    /// Store a new draft and return its id.
    pub async fn create(&self, draft: OrderDraft) -> DraftId {
        let id = DraftId::new();
        self.drafts.insert(id, draft).await;
        id
    }

    pub async fn get(&self, id: &DraftId) -> Option<OrderDraft> {
        self.drafts.get(id).await
    }

    /// Replace an existing draft. Returns `false` if `id` is unknown or
    /// expired.
    pub async fn replace(&self, id: &DraftId, draft: OrderDraft) -> bool {
        if self.drafts.get(id).await.is_none() {
            return false;
        }
        self.drafts.insert(*id, draft).await;
        true
    }

    /// Drop a draft. Returns whether it existed.
    pub async fn clear(&self, id: &DraftId) -> bool {
        self.drafts.remove(id).await.is_some()
    }
}
