//! Device registry: one shared writer per device name.
//!
//! Every [`DeviceHandle`] for the same name shares one connection. The
//! connection is opened with the first handle and closed when the last handle
//! closes. Writes go through a mutex held for exactly one message, so
//! concurrent users interleave between messages but never inside one.

use crate::backend::{OutputBackend, OutputConnection};
use crate::error::{Error, Result};
use crate::message::MidiOutputMessage;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

struct SharedOutput {
    name: String,
    users: AtomicUsize,
    connection: Mutex<Option<Box<dyn OutputConnection>>>,
}

impl SharedOutput {
    fn new(name: &str, connection: Box<dyn OutputConnection>) -> Self {
        Self {
            name: name.to_string(),
            users: AtomicUsize::new(1),
            connection: Mutex::new(Some(connection)),
        }
    }

    fn send(&self, message: &MidiOutputMessage) -> Result<()> {
        let mut connection = self.connection.lock();
        match connection.as_mut() {
            Some(conn) => conn.send(message),
            None => Err(Error::DeviceClosed(self.name.clone())),
        }
    }

    fn close(&self) {
        if let Some(mut conn) = self.connection.lock().take() {
            conn.close();
            debug!("Closed MIDI output '{}'", self.name);
        }
    }
}

struct RegistryInner {
    backend: Arc<dyn OutputBackend>,
    outputs: DashMap<String, Arc<SharedOutput>>,
}

/// Opens devices through a backend and shares them by name.
///
/// Clone is cheap (Arc internally).
#[derive(Clone)]
pub struct DeviceRegistry {
    inner: Arc<RegistryInner>,
}

impl DeviceRegistry {
    pub fn new(backend: impl OutputBackend) -> Self {
        Self::with_backend(Arc::new(backend))
    }

    pub fn with_backend(backend: Arc<dyn OutputBackend>) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                backend,
                outputs: DashMap::new(),
            }),
        }
    }

    /// Acquire a handle to `name`, opening the device if no handle holds it.
    pub fn open(&self, name: &str) -> Result<DeviceHandle> {
        let output = match self.inner.outputs.entry(name.to_string()) {
            Entry::Occupied(entry) => {
                let output = Arc::clone(entry.get());
                output.users.fetch_add(1, Ordering::AcqRel);
                output
            }
            Entry::Vacant(entry) => {
                let connection = self.inner.backend.open(name)?;
                debug!("Opened MIDI output '{}'", name);
                let output = Arc::new(SharedOutput::new(name, connection));
                entry.insert(Arc::clone(&output));
                output
            }
        };

        Ok(DeviceHandle {
            registry: self.clone(),
            output,
            closed: AtomicBool::new(false),
        })
    }

    pub fn is_open(&self, name: &str) -> bool {
        self.inner.outputs.contains_key(name)
    }

    /// Names of devices currently held by at least one handle.
    pub fn open_devices(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .inner
            .outputs
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    /// Devices the backend can open.
    pub fn list_devices(&self) -> Vec<String> {
        self.inner.backend.list_devices()
    }

    fn release(&self, output: &Arc<SharedOutput>) {
        // The user count only changes under the shard lock, so a concurrent
        // `open` either sees the entry before removal or opens a fresh one.
        let removed = self.inner.outputs.remove_if(&output.name, |_, current| {
            Arc::ptr_eq(current, output) && current.users.fetch_sub(1, Ordering::AcqRel) == 1
        });
        if let Some((_, output)) = removed {
            output.close();
        }
    }
}

/// A scoped claim on one output device.
///
/// Dropping the handle closes it.
pub struct DeviceHandle {
    registry: DeviceRegistry,
    output: Arc<SharedOutput>,
    closed: AtomicBool,
}

impl DeviceHandle {
    pub fn name(&self) -> &str {
        &self.output.name
    }

    /// Write one message, holding the device's writer for just this message.
    pub fn send(&self, message: MidiOutputMessage) -> Result<()> {
        if self.is_closed() {
            return Err(Error::DeviceClosed(self.output.name.clone()));
        }
        self.output.send(&message)
    }

    /// Write raw status and data bytes.
    pub fn write(&self, status: u8, data1: u8, data2: u8) -> Result<()> {
        self.send(MidiOutputMessage::new(status, data1, data2))
    }

    pub fn note_on(&self, channel: u8, note: u8, velocity: u8) -> Result<()> {
        self.send(MidiOutputMessage::note_on(channel, note, velocity))
    }

    pub fn note_off(&self, channel: u8, note: u8, velocity: u8) -> Result<()> {
        self.send(MidiOutputMessage::note_off(channel, note, velocity))
    }

    /// Release this handle. Idempotent.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.registry.release(&self.output);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Drop for DeviceHandle {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for DeviceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceHandle")
            .field("name", &self.output.name)
            .field("closed", &self.is_closed())
            .finish()
    }
}
