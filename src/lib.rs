//! # plotkit
//!
//! Writes text with a pen plotter. Text is laid out in a single-stroke
//! Hershey font, compiled to G-code, and streamed to a GRBL controller one
//! acknowledged line at a time.
//!
//! ## Architecture
//!
//! 1. **plotkit-core** - Errors, wire number formatting, job queue
//! 2. **plotkit-designer** - Font, layout, toolpath compiler, G-code serializer
//! 3. **plotkit-communication** - Serial transport, GRBL protocol, device session
//! 4. **plotkit-settings** - Configuration file
//! 5. **plotkit** - Logging setup and the command line binary

pub use plotkit_communication as communication;
pub use plotkit_designer as designer;
pub use plotkit_settings as settings;

pub use plotkit_core::{
    ConnectionError, ControllerError, Error, Job, JobQueue, JobSource, JobSourceError,
    LayoutError, QueueError, Result,
};

pub use plotkit_designer::{text_to_gcode, PlotOptions, TextToGcode};

pub use plotkit_communication::{
    list_ports, DeviceSession, Halt, HaltReason, HttpJobSource, SerialTransport, SessionConfig,
};

pub use plotkit_settings::Config;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Job source that turns text jobs into G-code jobs.
///
/// Pops text from an inner source (normally the shared [`JobQueue`]) and
/// compiles it, so the device session only ever sees program bodies.
pub struct CompilingJobSource<S> {
    inner: S,
    pipeline: TextToGcode,
}

impl<S: JobSource> CompilingJobSource<S> {
    pub fn new(inner: S, options: &PlotOptions) -> std::result::Result<Self, LayoutError> {
        Ok(Self {
            inner,
            pipeline: TextToGcode::new(options)?,
        })
    }

    pub fn pipeline(&self) -> &TextToGcode {
        &self.pipeline
    }
}

impl<S: JobSource> JobSource for CompilingJobSource<S> {
    fn next_job(&mut self) -> std::result::Result<Option<Job>, JobSourceError> {
        let Some(job) = self.inner.next_job()? else {
            return Ok(None);
        };
        let program = self.pipeline.compile(&job.body);
        tracing::info!(
            "Compiled {:?} into {} command(s), {} pen stroke(s)",
            job.body,
            program.commands().len(),
            program.pen_down_count()
        );
        Ok(Some(Job::new(self.pipeline.serialize(&program))))
    }
}

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    // Program text may go to stdout, so logs go to stderr.
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_compiles_queued_text() {
        let queue = Arc::new(JobQueue::new(2));
        queue.submit("HI").unwrap();
        let mut source = CompilingJobSource::new(queue.clone(), &PlotOptions::default()).unwrap();

        let job = source.next_job().unwrap().unwrap();
        assert!(job.body.starts_with("G21\nG90\nM5\n"));
        assert!(job.body.ends_with("M30"));
        assert_eq!(job.body, text_to_gcode("HI").unwrap());
        assert_eq!(source.next_job().unwrap(), None);
    }

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
        assert!(BUILD_DATE.ends_with("UTC"));
    }
}
