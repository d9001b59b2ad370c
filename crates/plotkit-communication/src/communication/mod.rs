//! Byte transports to the motion controller.
//!
//! A [`Transport`] is a blocking byte stream with a short per-read timeout.
//! The device session owns exactly one transport for its whole life.

pub mod serial;

use std::io;

use serde::{Deserialize, Serialize};

/// Blocking byte link to a controller.
pub trait Transport {
    /// Write every byte of `data`.
    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Read whatever arrived within the per-read timeout.
    ///
    /// Returns `Ok(0)` when nothing arrived. Errors mean the link is gone.
    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Human readable name for logs.
    fn name(&self) -> String;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        (**self).write_all(data)
    }

    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_chunk(buf)
    }

    fn name(&self) -> String {
        (**self).name()
    }
}

/// Serial parity setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerialParity {
    #[default]
    None,
    Even,
    Odd,
}

/// Serial connection parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionParams {
    /// Port name (e.g., "/dev/ttyUSB0", "COM3")
    pub port: String,
    pub baud_rate: u32,
    pub data_bits: u8,
    pub stop_bits: u8,
    pub parity: SerialParity,
    /// Hardware (RTS/CTS) flow control
    pub flow_control: bool,
    /// Per-read timeout in milliseconds; must be non-zero
    pub timeout_ms: u64,
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: 115_200,
            data_bits: 8,
            stop_bits: 1,
            parity: SerialParity::None,
            flow_control: false,
            timeout_ms: 20,
        }
    }
}

impl ConnectionParams {
    pub fn for_port(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            ..Self::default()
        }
    }
}
