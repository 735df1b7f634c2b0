//! URL frontier: discovered URLs awaiting fetch
//!
//! Records live in an arena indexed by [`RecordId`]. A record's id is its
//! discovery order, so ids are handed out strictly increasing and are the
//! only handle workers ever hold. Dequeue order is FIFO by discovery
//! (breadth-first); records waiting out a retry backoff sit in a separate
//! time-ordered queue until they are due.
//!
//! Membership is keyed by the canonical URL, while each record keeps the
//! spelling it was first discovered under, which is what gets fetched.

use crate::state::UrlStatus;
use crate::url::canonicalize;
use crate::{DocFetchError, Result};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, VecDeque};
use std::time::{Duration, Instant};
use url::Url;

/// Discovery order of a URL record
pub type RecordId = usize;

/// A URL known to the frontier
#[derive(Debug, Clone)]
pub struct UrlRecord {
    pub id: RecordId,

    /// URL to request, as first discovered
    pub url: Url,

    /// Dedup key
    pub canonical: Url,

    pub depth: u32,
    pub status: UrlStatus,

    /// Fetch attempts started so far
    pub attempts: u32,
}

/// Result of asking the frontier for work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dequeue {
    /// A record is ready; it is now InFlight
    Ready(RecordId),

    /// Nothing ready yet. `Some(d)` when a retry becomes due after `d`,
    /// `None` when only in-flight work can produce more records.
    Wait(Option<Duration>),

    /// Nothing queued, nothing delayed, nothing in flight
    Drained,
}

#[derive(Debug)]
pub struct Frontier {
    records: Vec<UrlRecord>,
    index: HashMap<String, RecordId>,
    ready: VecDeque<RecordId>,
    delayed: BinaryHeap<Reverse<(Instant, RecordId)>>,
    in_flight: usize,
    max_depth: u32,
    max_retries: u32,
}

impl Frontier {
    pub fn new(max_depth: u32, max_retries: u32) -> Self {
        Self {
            records: Vec::new(),
            index: HashMap::new(),
            ready: VecDeque::new(),
            delayed: BinaryHeap::new(),
            in_flight: 0,
            max_depth,
            max_retries,
        }
    }

    /// Adds a URL discovered at `depth`
    ///
    /// Returns false if its canonical form is already known, it cannot be
    /// canonicalized, or `depth` exceeds the limit.
    pub fn enqueue(&mut self, url: Url, depth: u32) -> bool {
        if depth > self.max_depth {
            return false;
        }
        let Ok(canonical) = canonicalize(url.clone()) else {
            return false;
        };
        if self.index.contains_key(canonical.as_str()) {
            return false;
        }

        let id = self.records.len();
        self.index.insert(canonical.as_str().to_string(), id);
        self.records.push(UrlRecord {
            id,
            url,
            canonical,
            depth,
            status: UrlStatus::Pending,
            attempts: 0,
        });
        self.ready.push_back(id);
        true
    }

    /// Claims the next record, promoting due retries first
    pub fn dequeue(&mut self, now: Instant) -> Dequeue {
        while let Some(Reverse((due, id))) = self.delayed.peek().copied() {
            if due > now {
                break;
            }
            self.delayed.pop();
            self.ready.push_back(id);
        }

        if let Some(id) = self.ready.pop_front() {
            let record = &mut self.records[id];
            record.status = UrlStatus::InFlight;
            record.attempts += 1;
            self.in_flight += 1;
            return Dequeue::Ready(id);
        }

        if let Some(Reverse((due, _))) = self.delayed.peek() {
            return Dequeue::Wait(Some(due.saturating_duration_since(now)));
        }

        if self.in_flight > 0 {
            Dequeue::Wait(None)
        } else {
            Dequeue::Drained
        }
    }

    /// Returns an in-flight record to the queue after `delay`
    ///
    /// Returns false (and marks the record Failed) once its retries are used up.
    pub fn requeue(&mut self, id: RecordId, delay: Duration, now: Instant) -> Result<bool> {
        let max_retries = self.max_retries;
        let record = self.transition(id, UrlStatus::Pending)?;

        if record.attempts > max_retries {
            record.status = UrlStatus::Failed;
            return Ok(false);
        }

        self.delayed.push(Reverse((now + delay, id)));
        Ok(true)
    }

    pub fn mark_done(&mut self, id: RecordId) -> Result<()> {
        self.transition(id, UrlStatus::Done).map(|_| ())
    }

    pub fn mark_failed(&mut self, id: RecordId) -> Result<()> {
        self.transition(id, UrlStatus::Failed).map(|_| ())
    }

    fn transition(&mut self, id: RecordId, next: UrlStatus) -> Result<&mut UrlRecord> {
        let record = self
            .records
            .get_mut(id)
            .ok_or_else(|| DocFetchError::Worker(format!("unknown record {}", id)))?;

        if !record.status.can_transition_to(next) {
            return Err(DocFetchError::InvalidStatusTransition {
                from: record.status,
                to: next,
            });
        }

        if record.status == UrlStatus::InFlight {
            self.in_flight -= 1;
        }
        record.status = next;
        Ok(record)
    }

    pub fn get(&self, id: RecordId) -> Option<&UrlRecord> {
        self.records.get(id)
    }

    pub fn contains(&self, url: &Url) -> bool {
        canonicalize(url.clone())
            .map(|canonical| self.index.contains_key(canonical.as_str()))
            .unwrap_or(false)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Records waiting to be dispatched (ready or delayed)
    pub fn pending(&self) -> usize {
        self.ready.len() + self.delayed.len()
    }

    /// Total records ever enqueued
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Stops handing out queued work; in-flight records are unaffected
    pub fn close(&mut self) {
        self.ready.clear();
        self.delayed.clear();
    }
}
