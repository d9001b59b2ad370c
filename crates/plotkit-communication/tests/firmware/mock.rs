//! Scripted in-memory controller.

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use plotkit_communication::{SessionConfig, Transport};

type Responder = Box<dyn FnMut(&str) -> Vec<&'static str> + Send>;

/// Replies to each written line with the chunks the responder returns.
pub struct ScriptedTransport {
    pub sent_data: Arc<Mutex<Vec<String>>>,
    pending: VecDeque<Vec<u8>>,
    responder: Responder,
}

impl ScriptedTransport {
    pub fn new(responder: impl FnMut(&str) -> Vec<&'static str> + Send + 'static) -> Self {
        Self {
            sent_data: Arc::new(Mutex::new(Vec::new())),
            pending: VecDeque::new(),
            responder: Box::new(responder),
        }
    }

    /// A controller that acknowledges everything.
    pub fn always_ok() -> Self {
        Self::new(|_| vec!["ok\r\n"])
    }

    /// Queue bytes as if the controller sent them unprompted.
    pub fn push_unsolicited(&mut self, chunk: &str) {
        self.pending.push_back(chunk.as_bytes().to_vec());
    }
}

impl Transport for ScriptedTransport {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        let text = String::from_utf8_lossy(data).into_owned();
        self.sent_data.lock().push(text.clone());
        let line = text.trim_end_matches('\n');
        if line.trim().is_empty() {
            return Ok(());
        }
        for chunk in (self.responder)(line) {
            self.pending.push_back(chunk.as_bytes().to_vec());
        }
        Ok(())
    }

    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(mut chunk) = self.pending.pop_front() else {
            return Ok(0);
        };
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            self.pending.push_front(chunk.split_off(n));
        }
        Ok(n)
    }

    fn name(&self) -> String {
        "scripted".to_string()
    }
}

/// Session timings short enough for tests.
pub fn fast_config() -> SessionConfig {
    SessionConfig {
        wake_settle_ms: 1,
        boot_drain_ms: 5,
        pen_up_timeout_ms: 100,
        unlock_timeout_ms: 100,
        unlock_backoff_ms: 1,
        homing_timeout_ms: 100,
        setup_timeout_ms: 100,
        line_timeout_ms: 100,
        return_timeout_ms: 100,
        post_job_drain_ms: 5,
        poll_interval_ms: 1,
        read_chunk_ms: 10,
        read_poll_ms: 1,
        ..SessionConfig::default()
    }
}

pub fn short() -> Duration {
    Duration::from_millis(50)
}
