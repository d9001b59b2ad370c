//! GRBL protocol support
//!
//! Command vocabulary, response scanning and code decoding for GRBL 1.1
//! controllers.

pub mod commands;
pub mod error_decoder;
pub mod response_parser;

pub use commands::{normalize_line, program_lines};
pub use error_decoder::{decode_alarm, decode_error, format_alarm, format_error};
pub use response_parser::{classify_response, ControllerResponse, ResponseScanner};
