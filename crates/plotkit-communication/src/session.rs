//! Plotter device session
//!
//! Drives a GRBL controller through boot, unlock, homing and zeroing, then
//! polls a [`JobSource`] and streams each job line by line, waiting for the
//! controller to acknowledge every line before sending the next.
//!
//! ```text
//! Booting -> Unlocking -> Homing -> Idle -> Running -> Recovering -> Idle
//!                  \          \               \            \
//!                   +----------+---------------+------------+--> Halted
//! ```
//!
//! A failure that leaves the machine in an unknown physical state ends the
//! session with a [`Halt`]. Once halted the session refuses every send, and
//! only a restart (which re-runs the boot sequence) clears it.

use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

use plotkit_core::{ControllerError, Job, JobSource};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::communication::Transport;
use crate::firmware::grbl::commands::{
    self, ABSOLUTE_MODE, HOME, MILLIMETER_UNITS, RETURN_TO_ORIGIN, UNLOCK, WAKE, ZERO_ORIGIN,
};
use crate::firmware::grbl::{decode_alarm, decode_error, ControllerResponse, ResponseScanner};

const READ_BUFFER_SIZE: usize = 256;

/// Device session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Booting,
    Unlocking,
    Homing,
    Idle,
    Running,
    Recovering,
    Halted,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Booting => "booting",
            Self::Unlocking => "unlocking",
            Self::Homing => "homing",
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Recovering => "recovering",
            Self::Halted => "halted",
        };
        f.write_str(name)
    }
}

/// Session timing and retry settings. All durations are milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Pause after the wake sequence
    pub wake_settle_ms: u64,
    /// Window for discarding the startup banner
    pub boot_drain_ms: u64,
    /// Raises the pen before homing and after every job
    pub pen_up_command: String,
    pub pen_up_timeout_ms: u64,
    pub unlock_timeout_ms: u64,
    pub unlock_attempts: u32,
    pub unlock_backoff_ms: u64,
    pub homing_timeout_ms: u64,
    /// Mode and zero commands
    pub setup_timeout_ms: u64,
    /// Each job line
    pub line_timeout_ms: u64,
    pub return_timeout_ms: u64,
    pub post_job_drain_ms: u64,
    /// Pause between job polls while idle
    pub poll_interval_ms: u64,
    /// Longest wait for a single chunk of response bytes
    pub read_chunk_ms: u64,
    /// Sleep between empty reads
    pub read_poll_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            wake_settle_ms: 500,
            boot_drain_ms: 1200,
            pen_up_command: "M5".to_string(),
            pen_up_timeout_ms: 8000,
            unlock_timeout_ms: 8000,
            unlock_attempts: 5,
            unlock_backoff_ms: 300,
            homing_timeout_ms: 90_000,
            setup_timeout_ms: 5000,
            line_timeout_ms: 20_000,
            return_timeout_ms: 30_000,
            post_job_drain_ms: 600,
            poll_interval_ms: 2000,
            read_chunk_ms: 800,
            read_poll_ms: 5,
        }
    }
}

impl SessionConfig {
    /// Check that every wait can make progress.
    pub fn validate(&self) -> Result<(), String> {
        if self.unlock_attempts == 0 {
            return Err("unlock_attempts must be at least 1".to_string());
        }
        if self.read_chunk_ms == 0 {
            return Err("read_chunk_ms must be non-zero".to_string());
        }
        if self.pen_up_command.trim().is_empty() {
            return Err("pen_up_command must not be empty".to_string());
        }
        Ok(())
    }
}

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

/// Outcome of a sent line, or `None` while the response is still open.
fn verdict(
    line: &str,
    response: ControllerResponse,
) -> Option<Result<ControllerResponse, ControllerError>> {
    match response {
        ControllerResponse::Acknowledged | ControllerResponse::ProgramEnd => Some(Ok(response)),
        ControllerResponse::Alarm(code) => {
            let message = code.map(decode_alarm).unwrap_or("Alarm").to_string();
            tracing::warn!("'{}' raised an alarm: {}", line, message);
            Some(Err(ControllerError::Alarm { code, message }))
        }
        ControllerResponse::Error(code) => {
            let message = code.map(decode_error).unwrap_or("Error").to_string();
            tracing::warn!("'{}' rejected: {}", line, message);
            Some(Err(ControllerError::CommandRejected { code, message }))
        }
        ControllerResponse::Banner | ControllerResponse::Unrecognized => None,
    }
}

/// Why a session halted
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HaltReason {
    #[error("Unlock failed after {attempts} attempt(s): {last}")]
    UnlockFailed {
        attempts: u32,
        last: ControllerError,
    },

    #[error("Homing failed: {0}")]
    HomingFailed(ControllerError),

    #[error("Job line {line_number} '{line}' failed: {failure}")]
    MotionFailed {
        /// 1-based index among the job's sendable lines
        line_number: usize,
        line: String,
        failure: ControllerError,
    },

    #[error("Pen-up after job failed: {0}")]
    PenUpFailed(ControllerError),

    #[error("Return to origin failed: {0}")]
    ReturnToOriginFailed(ControllerError),
}

/// Terminal session fault, with the state it happened in.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Session halted while {state}: {reason}")]
pub struct Halt {
    pub reason: HaltReason,
    pub state: SessionState,
}

/// Summary of a completed job
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JobReport {
    pub lines_sent: usize,
    pub elapsed: Duration,
}

/// Result of one poll of the job source
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The source had nothing to do
    NoJob,
    /// The source could not be reached; retried next tick
    FetchFailed(String),
    Completed(JobReport),
}

/// Session driving one controller over an exclusively owned transport.
pub struct DeviceSession<T: Transport> {
    transport: T,
    config: SessionConfig,
    state: SessionState,
    halt: Option<Halt>,
}

impl<T: Transport> DeviceSession<T> {
    pub fn new(transport: T, config: SessionConfig) -> Self {
        Self {
            transport,
            config,
            state: SessionState::Booting,
            halt: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The halt that ended the session, if any.
    pub fn halt(&self) -> Option<&Halt> {
        self.halt.as_ref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn halted(&self) -> Result<(), Halt> {
        match &self.halt {
            Some(halt) => Err(halt.clone()),
            None => Ok(()),
        }
    }

    fn enter_halt(&mut self, reason: HaltReason) -> Halt {
        let halt = Halt {
            reason,
            state: self.state,
        };
        tracing::error!("{}; manual intervention required", halt);
        self.state = SessionState::Halted;
        self.halt = Some(halt.clone());
        halt
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state != state {
            tracing::debug!("Session {} -> {}", self.state, state);
            self.state = state;
        }
    }

    /// Boot, unlock, home and zero the controller.
    pub fn start(&mut self) -> Result<(), Halt> {
        self.halted()?;
        let config = self.config.clone();
        tracing::info!("Booting controller on {}", self.transport.name());
        self.set_state(SessionState::Booting);

        if let Err(e) = self.transport.write_all(WAKE.as_bytes()) {
            tracing::warn!("Failed to send wake sequence: {}", e);
        }
        thread::sleep(ms(config.wake_settle_ms));
        let discarded = self.drain(ms(config.boot_drain_ms));
        tracing::debug!("Discarded {} boot byte(s)", discarded);

        // An alarm-locked controller rejects this; unlocking follows anyway.
        if let Err(e) = self.send_line_wait(&config.pen_up_command, ms(config.pen_up_timeout_ms)) {
            tracing::warn!("Boot pen-up not acknowledged: {}", e);
        }

        self.set_state(SessionState::Unlocking);
        self.unlock(&config)?;

        self.set_state(SessionState::Homing);
        tracing::info!("Homing");
        if let Err(e) = self.send_line_wait(HOME, ms(config.homing_timeout_ms)) {
            return Err(self.enter_halt(HaltReason::HomingFailed(e)));
        }

        self.zero(&config);
        self.set_state(SessionState::Idle);
        tracing::info!("Controller homed and zeroed, waiting for jobs");
        Ok(())
    }

    fn unlock(&mut self, config: &SessionConfig) -> Result<(), Halt> {
        let attempts = config.unlock_attempts.max(1);
        let mut last = ControllerError::Timeout {
            timeout_ms: config.unlock_timeout_ms,
        };
        for attempt in 1..=attempts {
            match self.send_line_wait(UNLOCK, ms(config.unlock_timeout_ms)) {
                Ok(_) => {
                    tracing::info!("Unlocked on attempt {}", attempt);
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("Unlock attempt {}/{} failed: {}", attempt, attempts, e);
                    last = e;
                    if attempt < attempts {
                        thread::sleep(ms(config.unlock_backoff_ms));
                    }
                }
            }
        }
        Err(self.enter_halt(HaltReason::UnlockFailed { attempts, last }))
    }

    /// Absolute millimeters and a fresh origin. Best-effort: the machine is
    /// homed, so a failure here is logged and skipped.
    fn zero(&mut self, config: &SessionConfig) {
        for command in [ABSOLUTE_MODE, MILLIMETER_UNITS, ZERO_ORIGIN] {
            self.best_effort(command, config.setup_timeout_ms);
        }
    }

    fn best_effort(&mut self, command: &str, timeout_ms: u64) {
        if let Err(e) = self.send_line_wait(command, ms(timeout_ms)) {
            tracing::warn!("'{}' not acknowledged, continuing: {}", command, e);
        }
    }

    /// Send one line and wait for the controller's verdict.
    ///
    /// Succeeds on an acknowledgment or program-end token; fails on an
    /// alarm or error token, or when `timeout` passes with neither. Blank
    /// lines succeed without touching the transport.
    pub fn send_line_wait(
        &mut self,
        line: &str,
        timeout: Duration,
    ) -> Result<ControllerResponse, ControllerError> {
        if self.halt.is_some() {
            return Err(ControllerError::Halted);
        }
        let line = line.trim();
        if line.is_empty() {
            return Ok(ControllerResponse::Acknowledged);
        }

        tracing::trace!("GRBL< {}", line);
        let mut packet = Vec::with_capacity(line.len() + 1);
        packet.extend_from_slice(line.as_bytes());
        packet.push(b'\n');
        self.transport
            .write_all(&packet)
            .map_err(|e| ControllerError::Transport {
                reason: e.to_string(),
            })?;

        let mut scanner = ResponseScanner::new();
        let mut buf = [0u8; READ_BUFFER_SIZE];
        let deadline = Instant::now() + timeout;
        // Set once a failure token arrives without the rest of its line.
        let mut grace_until: Option<Instant> = None;

        loop {
            let limit = grace_until.unwrap_or(deadline);
            let remaining = limit.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                if grace_until.is_some() {
                    tracing::debug!("Failure line for '{}' never terminated", line);
                    if let Some(verdict) = verdict(line, scanner.classify()) {
                        return verdict;
                    }
                }
                break;
            }
            let window = remaining.min(ms(self.config.read_chunk_ms));
            let n = self.read_within(&mut buf, window)?;
            if n == 0 {
                continue;
            }
            tracing::trace!("GRBL> {}", String::from_utf8_lossy(&buf[..n]).trim_end());
            scanner.feed(&buf[..n]);

            let response = scanner.classify();
            if response.is_failure() && !scanner.failure_line_complete() {
                if grace_until.is_none() {
                    let grace = Instant::now() + ms(self.config.read_chunk_ms);
                    grace_until = Some(grace.min(deadline));
                }
                continue;
            }
            if let Some(verdict) = verdict(line, response) {
                return verdict;
            }
        }

        tracing::warn!(
            "Timed out after {}ms waiting for '{}' (received {:?})",
            timeout.as_millis(),
            line,
            scanner.text()
        );
        Err(ControllerError::Timeout {
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        })
    }

    /// Read one chunk, polling until something arrives or `window` passes.
    fn read_within(&mut self, buf: &mut [u8], window: Duration) -> Result<usize, ControllerError> {
        let deadline = Instant::now() + window;
        loop {
            let n = self
                .transport
                .read_chunk(buf)
                .map_err(|e| ControllerError::Transport {
                    reason: e.to_string(),
                })?;
            if n > 0 || Instant::now() >= deadline {
                return Ok(n);
            }
            thread::sleep(ms(self.config.read_poll_ms));
        }
    }

    /// Discard whatever the controller sends during `window`.
    ///
    /// Returns the number of bytes discarded. Read errors end the drain early.
    pub fn drain(&mut self, window: Duration) -> usize {
        let deadline = Instant::now() + window;
        let mut buf = [0u8; READ_BUFFER_SIZE];
        let mut discarded = 0;
        while Instant::now() < deadline {
            match self.transport.read_chunk(&mut buf) {
                Ok(0) => thread::sleep(ms(self.config.read_poll_ms)),
                Ok(n) => {
                    tracing::trace!("GRBL> {}", String::from_utf8_lossy(&buf[..n]).trim_end());
                    discarded += n;
                }
                Err(e) => {
                    tracing::warn!("Read failed while draining: {}", e);
                    break;
                }
            }
        }
        discarded
    }

    /// Stream a job, then raise the pen and return to the origin.
    pub fn run_job(&mut self, job: &Job) -> Result<JobReport, Halt> {
        self.halted()?;
        let config = self.config.clone();
        let lines = commands::program_lines(&job.body);
        let started = Instant::now();

        self.set_state(SessionState::Running);
        tracing::info!("Running job ({} line(s))", lines.len());

        for (index, line) in lines.iter().enumerate() {
            tracing::debug!("Job line {}/{}: {}", index + 1, lines.len(), line);
            if let Err(failure) = self.send_line_wait(line, ms(config.line_timeout_ms)) {
                return Err(self.enter_halt(HaltReason::MotionFailed {
                    line_number: index + 1,
                    line: line.clone(),
                    failure,
                }));
            }
        }

        self.recover(&config)?;

        let report = JobReport {
            lines_sent: lines.len(),
            elapsed: started.elapsed(),
        };
        tracing::info!(
            "Job complete: {} line(s) in {:.1}s",
            report.lines_sent,
            report.elapsed.as_secs_f64()
        );
        self.set_state(SessionState::Idle);
        Ok(report)
    }

    fn recover(&mut self, config: &SessionConfig) -> Result<(), Halt> {
        self.set_state(SessionState::Recovering);

        if let Err(e) = self.send_line_wait(&config.pen_up_command, ms(config.pen_up_timeout_ms)) {
            return Err(self.enter_halt(HaltReason::PenUpFailed(e)));
        }
        self.best_effort(ABSOLUTE_MODE, config.setup_timeout_ms);
        self.best_effort(MILLIMETER_UNITS, config.setup_timeout_ms);

        if let Err(e) = self.send_line_wait(RETURN_TO_ORIGIN, ms(config.return_timeout_ms)) {
            return Err(self.enter_halt(HaltReason::ReturnToOriginFailed(e)));
        }
        self.best_effort(ZERO_ORIGIN, config.setup_timeout_ms);
        self.drain(ms(config.post_job_drain_ms));
        Ok(())
    }

    /// Ask `source` for one job and run it.
    ///
    /// Fetch failures are reported and left for the next tick.
    pub fn poll_once<S: JobSource + ?Sized>(&mut self, source: &mut S) -> Result<PollOutcome, Halt> {
        self.halted()?;
        match source.next_job() {
            Ok(Some(job)) => self.run_job(&job).map(PollOutcome::Completed),
            Ok(None) => Ok(PollOutcome::NoJob),
            Err(e) => {
                tracing::warn!("Job fetch failed, retrying next poll: {}", e);
                Ok(PollOutcome::FetchFailed(e.to_string()))
            }
        }
    }

    /// Boot if needed, then poll `source` until `keep_running` says stop.
    ///
    /// Returns `Ok` only when asked to stop. A halt is returned to the caller.
    pub fn run<S, F>(&mut self, source: &mut S, mut keep_running: F) -> Result<(), Halt>
    where
        S: JobSource + ?Sized,
        F: FnMut() -> bool,
    {
        if self.state == SessionState::Booting {
            self.start()?;
        }
        while keep_running() {
            if let PollOutcome::Completed(report) = self.poll_once(source)? {
                tracing::debug!("Polling again after a {} line job", report.lines_sent);
            }
            thread::sleep(ms(self.config.poll_interval_ms));
        }
        tracing::info!("Session stopped");
        Ok(())
    }
}
