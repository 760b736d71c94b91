//! Short-lived status notifications shown next to the preview.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use uuid::Uuid;

pub const DEFAULT_CAPACITY: usize = 5;
pub const DEFAULT_TTL_MS: i64 = 4_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub id: Uuid,
    pub kind: ToastKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Bounded queue; the oldest toast is evicted when full.
#[derive(Debug, Clone)]
pub struct ToastQueue {
    toasts: VecDeque<Toast>,
    capacity: usize,
    ttl: Duration,
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, Duration::milliseconds(DEFAULT_TTL_MS))
    }
}

impl ToastQueue {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            toasts: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            ttl,
        }
    }

    pub fn push(&mut self, kind: ToastKind, message: impl Into<String>) -> Uuid {
        self.push_at(kind, message, Utc::now())
    }

    pub fn push_at(
        &mut self,
        kind: ToastKind,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Uuid {
        while self.toasts.len() >= self.capacity {
            self.toasts.pop_front();
        }
        let id = Uuid::new_v4();
        self.toasts.push_back(Toast {
            id,
            kind,
            message: message.into(),
            created_at: now,
        });
        id
    }

    /// Toasts that have not expired at `now`, oldest first.
    pub fn active(&self, now: DateTime<Utc>) -> Vec<Toast> {
        self.toasts
            .iter()
            .filter(|t| now - t.created_at < self.ttl)
            .cloned()
            .collect()
    }

    pub fn dismiss(&mut self, id: Uuid) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|t| t.id != id);
        self.toasts.len() != before
    }

    /// Drop expired toasts.
    pub fn prune(&mut self, now: DateTime<Utc>) {
        let ttl = self.ttl;
        self.toasts.retain(|t| now - t.created_at < ttl);
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn evicts_oldest_when_full() {
        let mut queue = ToastQueue::default();
        let now = Utc::now();
        let first = queue.push_at(ToastKind::Info, "0", now);
        for i in 1..=DEFAULT_CAPACITY {
            queue.push_at(ToastKind::Info, i.to_string(), now);
        }
        assert_eq!(queue.len(), DEFAULT_CAPACITY);
        assert!(queue.active(now).iter().all(|t| t.id != first));
        assert_eq!(queue.active(now)[0].message, "1");
    }

    #[test]
    fn expires_after_ttl() {
        let mut queue = ToastQueue::default();
        let now = Utc::now();
        queue.push_at(ToastKind::Success, "saved", now);

        assert_eq!(queue.active(now + Duration::milliseconds(3_999)).len(), 1);
        assert!(queue.active(now + Duration::milliseconds(DEFAULT_TTL_MS)).is_empty());

        queue.prune(now + Duration::seconds(5));
        assert!(queue.is_empty());
    }

    #[test]
    fn dismiss_by_id() {
        let mut queue = ToastQueue::default();
        let id = queue.push(ToastKind::Error, "boom");
        assert!(queue.dismiss(id));
        assert!(!queue.dismiss(id));
        assert!(queue.is_empty());
    }
}
