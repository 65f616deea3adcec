//! Device backend traits.

use crate::error::Result;
use crate::message::MidiOutputMessage;

/// Source of output connections, looked up by device name.
pub trait OutputBackend: Send + Sync + 'static {
    /// Open a connection to the named device.
    ///
    /// Fails with [`Error::DeviceNotFound`](crate::Error::DeviceNotFound) when
    /// no output matches `name`.
    fn open(&self, name: &str) -> Result<Box<dyn OutputConnection>>;

    /// Names of the outputs this backend can open.
    fn list_devices(&self) -> Vec<String>;
}

/// An open connection to one output device.
pub trait OutputConnection: Send {
    /// Write one message.
    fn send(&mut self, message: &MidiOutputMessage) -> Result<()>;

    /// Release the connection. Calling it again is a no-op.
    fn close(&mut self);
}
