//! Job intake
//!
//! A [`Job`] is an opaque text payload. Jobs enter through a bounded
//! [`JobQueue`] and leave through the [`JobSource`] trait, which the device
//! session polls. The queue rejects work instead of blocking the submitter.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{JobSourceError, QueueError};

/// Default number of jobs a [`JobQueue`] holds.
pub const DEFAULT_QUEUE_CAPACITY: usize = 25;

/// Poll replies that mean "nothing to do", compared case-insensitively.
pub const NO_JOB_SENTINELS: &[&str] = &["NOJOB", "NONE"];

/// A unit of work: text to draw, or a program body to stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// The payload.
    pub body: String,
}

impl Job {
    /// Create a job from a payload.
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }
}

/// Returns true when a poll reply carries no job.
pub fn is_no_job(reply: &str) -> bool {
    let reply = reply.trim();
    reply.is_empty()
        || NO_JOB_SENTINELS
            .iter()
            .any(|sentinel| reply.eq_ignore_ascii_case(sentinel))
}

/// Something the device session can poll for work.
pub trait JobSource {
    /// Take the next job, if any.
    ///
    /// `Ok(None)` means idle. Errors are transient; the caller retries on
    /// its next poll tick.
    fn next_job(&mut self) -> Result<Option<Job>, JobSourceError>;
}

/// Bounded FIFO of pending jobs.
///
/// Shared between a submitter and the poller through an `Arc`.
#[derive(Debug)]
pub struct JobQueue {
    jobs: Mutex<VecDeque<Job>>,
    capacity: usize,
}

impl JobQueue {
    /// Create a queue holding at most `capacity` jobs (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            jobs: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Submit text, returning its 1-based position in the queue.
    pub fn submit(&self, text: &str) -> Result<usize, QueueError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(QueueError::EmptyText);
        }

        let mut jobs = self.jobs.lock();
        if jobs.len() >= self.capacity {
            tracing::warn!("Rejecting job, queue full ({} jobs)", jobs.len());
            return Err(QueueError::QueueFull {
                capacity: self.capacity,
            });
        }
        jobs.push_back(Job::new(text));
        tracing::debug!("Queued job at position {}", jobs.len());
        Ok(jobs.len())
    }

    /// Remove and return the oldest job.
    pub fn pop(&self) -> Option<Job> {
        self.jobs.lock().pop_front()
    }

    /// Number of pending jobs.
    pub fn len(&self) -> usize {
        self.jobs.lock().len()
    }

    /// True when no jobs are pending.
    pub fn is_empty(&self) -> bool {
        self.jobs.lock().is_empty()
    }

    /// Maximum number of pending jobs.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

impl JobSource for JobQueue {
    fn next_job(&mut self) -> Result<Option<Job>, JobSourceError> {
        Ok(self.pop())
    }
}

impl JobSource for Arc<JobQueue> {
    fn next_job(&mut self) -> Result<Option<Job>, JobSourceError> {
        Ok(self.pop())
    }
}
