//! # Alarm queue
//! In-memory ordered list of future announcements.
//!
//! Events come out in non-decreasing `fire_at`; ties go to the lower
//! `priority` value, then to the earlier insertion. Nothing is persisted: a
//! restart drops every pending alarm.

pub mod queue;

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Serialize;

use crate::briefing::AlarmContent;

pub use queue::{spawn_delivery_loop, AlarmQueue};

/// Longer delays are clamped; nobody sets an alarm ten years out.
const MAX_DELAY_SECS: u64 = 10 * 365 * 24 * 3600;

/// Identifies one scheduled alarm; also the cancellation token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AlarmHandle(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlarmPayload {
    pub label: String,
    pub content: AlarmContent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlarmEvent {
    pub id: AlarmHandle,
    pub fire_at: DateTime<Utc>,
    pub priority: i32,
    pub payload: AlarmPayload,
}

impl AlarmEvent {
    fn key(&self) -> (DateTime<Utc>, i32, u64) {
        (self.fire_at, self.priority, self.id.0)
    }
}

impl Ord for AlarmEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl PartialOrd for AlarmEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-heap of pending alarms. Handles are issued in insertion order, which
/// makes the id the final tie-breaker.
#[derive(Debug, Default)]
pub struct AlarmScheduler {
    heap: BinaryHeap<Reverse<AlarmEvent>>,
    next_id: u64,
}

impl AlarmScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `delay_secs` from the current wall clock.
    pub fn schedule(&mut self, delay_secs: u64, priority: i32, payload: AlarmPayload) -> AlarmHandle {
        self.schedule_at(Utc::now(), delay_secs, priority, payload)
    }

    pub fn schedule_at(
        &mut self,
        now: DateTime<Utc>,
        delay_secs: u64,
        priority: i32,
        payload: AlarmPayload,
    ) -> AlarmHandle {
        let id = AlarmHandle(self.next_id);
        self.next_id += 1;
        let delay = ChronoDuration::seconds(delay_secs.min(MAX_DELAY_SECS) as i64);
        let fire_at = now + delay;
        self.heap.push(Reverse(AlarmEvent {
            id,
            fire_at,
            priority,
            payload,
        }));
        id
    }

    /// Earliest event, if it is due at `now`.
    pub fn peek_due(&self, now: DateTime<Utc>) -> Option<&AlarmEvent> {
        self.heap
            .peek()
            .map(|Reverse(ev)| ev)
            .filter(|ev| ev.fire_at <= now)
    }

    /// Remove and return the earliest event, if it is due at `now`.
    pub fn pop_due(&mut self, now: DateTime<Utc>) -> Option<AlarmEvent> {
        self.peek_due(now)?;
        self.heap.pop().map(|Reverse(ev)| ev)
    }

    pub fn next_fire_at(&self) -> Option<DateTime<Utc>> {
        self.heap.peek().map(|Reverse(ev)| ev.fire_at)
    }

    pub fn cancel(&mut self, handle: AlarmHandle) -> bool {
        let before = self.heap.len();
        self.heap.retain(|Reverse(ev)| ev.id != handle);
        self.heap.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Pending events in delivery order.
    pub fn list_pending(&self) -> Vec<AlarmEvent> {
        let mut v: Vec<AlarmEvent> = self.heap.iter().map(|Reverse(ev)| ev.clone()).collect();
        v.sort();
        v
    }
}
