//! Transient user-facing feedback raised by store operations.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: u64,
    pub level: NoticeLevel,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Queue {
    next_id: u64,
    notices: VecDeque<Notice>,
}

/// Bounded, expiring queue of notices. Oldest first.
#[derive(Debug)]
pub struct NoticeBoard {
    ttl: Duration,
    limit: usize,
    queue: Mutex<Queue>,
}

impl NoticeBoard {
    pub fn new(ttl: Duration, limit: usize) -> Self {
        Self {
            ttl,
            limit: limit.max(1),
            queue: Mutex::new(Queue::default()),
        }
    }

    pub fn push(&self, level: NoticeLevel, message: impl Into<String>) -> u64 {
        self.push_at(level, message.into(), Utc::now())
    }

    pub fn info(&self, message: impl Into<String>) -> u64 {
        self.push(NoticeLevel::Info, message)
    }

    pub fn success(&self, message: impl Into<String>) -> u64 {
        self.push(NoticeLevel::Success, message)
    }

    pub fn error(&self, message: impl Into<String>) -> u64 {
        self.push(NoticeLevel::Error, message)
    }

    fn push_at(&self, level: NoticeLevel, message: String, now: DateTime<Utc>) -> u64 {
        let mut queue = self.lock();
        queue.next_id += 1;
        let id = queue.next_id;
        queue.notices.push_back(Notice {
            id,
            level,
            message,
            raised_at: now,
        });
        while queue.notices.len() > self.limit {
            queue.notices.pop_front();
        }
        id
    }

    /// Returns false if the notice already expired or was dismissed.
    pub fn dismiss(&self, id: u64) -> bool {
        let mut queue = self.lock();
        let before = queue.notices.len();
        queue.notices.retain(|n| n.id != id);
        queue.notices.len() != before
    }

    pub fn active(&self) -> Vec<Notice> {
        self.active_at(Utc::now())
    }

    /// Drop expired notices and return the rest, newest last.
    pub fn active_at(&self, now: DateTime<Utc>) -> Vec<Notice> {
        let mut queue = self.lock();
        let ttl = self.ttl;
        queue.notices.retain(|n| !expired(n, now, ttl));
        queue.notices.iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.lock().notices.clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Queue> {
        // A panic while holding the lock cannot leave the queue half-updated.
        self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn expired(notice: &Notice, now: DateTime<Utc>, ttl: Duration) -> bool {
    match now.signed_duration_since(notice.raised_at).to_std() {
        Ok(age) => age >= ttl,
        // Raised "after" now: clock skew, keep it.
        Err(_) => false,
    }
}
