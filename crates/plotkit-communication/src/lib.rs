//! # plotkit Communication
//!
//! Talks to the plotter's motion controller: a byte [`Transport`] (serial in
//! production), GRBL response scanning, the [`DeviceSession`] state machine,
//! and an HTTP [`JobSource`](plotkit_core::JobSource).

pub mod communication;
pub mod firmware;
pub mod http;
pub mod session;

pub use communication::serial::{is_controller_port, list_ports, SerialPortInfo, SerialTransport};
pub use communication::{ConnectionParams, SerialParity, Transport};
pub use firmware::grbl::{
    classify_response, decode_alarm, decode_error, normalize_line, program_lines,
    ControllerResponse, ResponseScanner,
};
pub use http::HttpJobSource;
pub use session::{
    DeviceSession, Halt, HaltReason, JobReport, PollOutcome, SessionConfig, SessionState,
};
