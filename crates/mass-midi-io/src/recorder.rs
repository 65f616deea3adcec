//! In-memory recording backend.
//!
//! Records every open, close and message per device with a timestamp relative
//! to the backend's creation. Used by tests and for dry runs without hardware.

use crate::backend::{OutputBackend, OutputConnection};
use crate::error::{Error, Result};
use crate::message::MidiOutputMessage;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedMessage {
    pub device: String,
    pub message: MidiOutputMessage,
    /// Time since the backend was created.
    pub at: Duration,
}

/// Everything that happened on one device.
#[derive(Debug, Clone, Default)]
pub struct DeviceLog {
    pub opens: usize,
    pub closes: usize,
    messages: Vec<RecordedMessage>,
}

impl DeviceLog {
    pub fn messages(&self) -> &[RecordedMessage] {
        &self.messages
    }

    pub fn bytes(&self) -> Vec<[u8; 3]> {
        self.messages.iter().map(|m| m.message.bytes).collect()
    }
}

#[derive(Default)]
struct RecorderState {
    logs: HashMap<String, DeviceLog>,
    timeline: Vec<RecordedMessage>,
    fail_after: HashMap<String, usize>,
}

struct RecorderInner {
    known: Option<Vec<String>>,
    started: Instant,
    state: Mutex<RecorderState>,
}

/// Backend whose devices record instead of playing.
///
/// Clone is cheap and clones share the same recordings.
#[derive(Clone)]
pub struct RecordingBackend {
    inner: Arc<RecorderInner>,
}

impl RecordingBackend {
    /// Accepts any device name.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Only the given names can be opened; others fail with `DeviceNotFound`.
    pub fn with_devices<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::build(Some(names.into_iter().map(Into::into).collect()))
    }

    fn build(known: Option<Vec<String>>) -> Self {
        Self {
            inner: Arc::new(RecorderInner {
                known,
                started: Instant::now(),
                state: Mutex::new(RecorderState::default()),
            }),
        }
    }

    /// Make writes to `device` fail once it has recorded `writes` messages.
    pub fn fail_writes_after(&self, device: &str, writes: usize) {
        self.inner
            .state
            .lock()
            .fail_after
            .insert(device.to_string(), writes);
    }

    /// Snapshot of one device's log (empty if never opened).
    pub fn log(&self, device: &str) -> DeviceLog {
        self.inner
            .state
            .lock()
            .logs
            .get(device)
            .cloned()
            .unwrap_or_default()
    }

    /// All messages across devices, in write order.
    pub fn timeline(&self) -> Vec<RecordedMessage> {
        self.inner.state.lock().timeline.clone()
    }
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputBackend for RecordingBackend {
    fn open(&self, name: &str) -> Result<Box<dyn OutputConnection>> {
        if let Some(known) = &self.inner.known {
            if !known.iter().any(|k| k == name) {
                return Err(Error::DeviceNotFound(name.to_string()));
            }
        }

        self.inner
            .state
            .lock()
            .logs
            .entry(name.to_string())
            .or_default()
            .opens += 1;

        Ok(Box::new(RecordingConnection {
            device: name.to_string(),
            inner: Arc::clone(&self.inner),
            closed: false,
        }))
    }

    fn list_devices(&self) -> Vec<String> {
        match &self.inner.known {
            Some(known) => known.clone(),
            None => {
                let mut names: Vec<String> =
                    self.inner.state.lock().logs.keys().cloned().collect();
                names.sort();
                names
            }
        }
    }
}

struct RecordingConnection {
    device: String,
    inner: Arc<RecorderInner>,
    closed: bool,
}

impl OutputConnection for RecordingConnection {
    fn send(&mut self, message: &MidiOutputMessage) -> Result<()> {
        if self.closed {
            return Err(Error::DeviceClosed(self.device.clone()));
        }

        let at = self.inner.started.elapsed();
        let mut state = self.inner.state.lock();
        let state = &mut *state;

        let log = state.logs.entry(self.device.clone()).or_default();
        if let Some(&limit) = state.fail_after.get(&self.device) {
            if log.messages.len() >= limit {
                return Err(Error::DeviceWrite {
                    device: self.device.clone(),
                    message: "injected write failure".to_string(),
                });
            }
        }

        let recorded = RecordedMessage {
            device: self.device.clone(),
            message: *message,
            at,
        };
        log.messages.push(recorded.clone());
        state.timeline.push(recorded);
        Ok(())
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.inner
            .state
            .lock()
            .logs
            .entry(self.device.clone())
            .or_default()
            .closes += 1;
    }
}

impl Drop for RecordingConnection {
    fn drop(&mut self) {
        self.close();
    }
}
