//! GRBL response scanning
//!
//! GRBL answers every line with free-form text. The session only cares
//! about a handful of tokens, so responses are classified by scanning a
//! cumulative, case-folded buffer for the substrings in [`TOKENS`]. The
//! buffer is cumulative because a serial read can end in the middle of a
//! token.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A classified controller response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControllerResponse {
    /// `ok`
    Acknowledged,
    /// `Pgm End`, sent after `M2`/`M30`
    ProgramEnd,
    /// `ALARM:n`
    Alarm(Option<u8>),
    /// `error:n`
    Error(Option<u8>),
    /// Startup banner (`Grbl 1.1h ['$' for help]`)
    Banner,
    /// Nothing the session acts on
    Unrecognized,
}

#[derive(Debug, Clone, Copy)]
enum TokenKind {
    Acknowledged,
    ProgramEnd,
    Alarm,
    Error,
    Banner,
}

/// Response tokens in priority order. Matching is on lowercase bytes.
const TOKENS: &[(&[u8], TokenKind)] = &[
    (b"ok", TokenKind::Acknowledged),
    (b"pgm end", TokenKind::ProgramEnd),
    (b"alarm", TokenKind::Alarm),
    (b"error", TokenKind::Error),
    (b"grbl", TokenKind::Banner),
];

impl ControllerResponse {
    /// True for responses that complete a command successfully.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Acknowledged | Self::ProgramEnd)
    }

    /// True for alarm and error responses.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Alarm(_) | Self::Error(_))
    }
}

impl fmt::Display for ControllerResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Acknowledged => write!(f, "ok"),
            Self::ProgramEnd => write!(f, "program end"),
            Self::Alarm(Some(code)) => write!(f, "{}", super::error_decoder::format_alarm(*code)),
            Self::Alarm(None) => write!(f, "ALARM"),
            Self::Error(Some(code)) => write!(f, "{}", super::error_decoder::format_error(*code)),
            Self::Error(None) => write!(f, "error"),
            Self::Banner => write!(f, "banner"),
            Self::Unrecognized => write!(f, "unrecognized"),
        }
    }
}

/// Accumulates controller output until a token appears.
#[derive(Debug, Clone, Default)]
pub struct ResponseScanner {
    buffer: Vec<u8>,
}

impl ResponseScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append received bytes, case-folded.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buffer
            .extend(bytes.iter().map(|b| b.to_ascii_lowercase()));
    }

    /// Classify everything received so far.
    pub fn classify(&self) -> ControllerResponse {
        let Some(kind) = TOKENS
            .iter()
            .find(|(token, _)| find(&self.buffer, token).is_some())
            .map(|(_, kind)| *kind)
        else {
            return ControllerResponse::Unrecognized;
        };

        match kind {
            TokenKind::Acknowledged => ControllerResponse::Acknowledged,
            TokenKind::ProgramEnd => ControllerResponse::ProgramEnd,
            TokenKind::Alarm => ControllerResponse::Alarm(self.code_after(b"alarm:")),
            TokenKind::Error => ControllerResponse::Error(self.code_after(b"error:")),
            TokenKind::Banner => ControllerResponse::Banner,
        }
    }

    /// Case-folded text received so far.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.buffer).into_owned()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// True unless an alarm or error token is still waiting for the end of
    /// its line, where the code digits are.
    pub fn failure_line_complete(&self) -> bool {
        let Some(start) = [b"alarm".as_slice(), b"error".as_slice()]
            .iter()
            .filter_map(|token| find(&self.buffer, token))
            .min()
        else {
            return true;
        };
        self.buffer[start..]
            .iter()
            .any(|b| matches!(b, b'\n' | b'\r'))
    }

    fn code_after(&self, prefix: &[u8]) -> Option<u8> {
        let start = find(&self.buffer, prefix)? + prefix.len();
        let digits: String = self.buffer[start..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .map(|&b| b as char)
            .collect();
        digits.parse().ok()
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Classify a complete response in one step.
pub fn classify_response(text: &str) -> ControllerResponse {
    let mut scanner = ResponseScanner::new();
    scanner.feed(text.as_bytes());
    scanner.classify()
}
