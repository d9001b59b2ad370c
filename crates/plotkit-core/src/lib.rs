//! # plotkit Core
//!
//! Core types shared by every plotkit crate: the error taxonomy, wire
//! number formatting, and the job intake abstractions.

pub mod error;
pub mod job;
pub mod units;

pub use error::{
    ConnectionError, ControllerError, Error, JobSourceError, LayoutError, QueueError, Result,
};

pub use job::{is_no_job, Job, JobQueue, JobSource, DEFAULT_QUEUE_CAPACITY};

pub use units::{format_coordinate, format_feed_rate, format_fixed, format_seconds};
