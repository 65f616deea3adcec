//! Builder for configuring and constructing a `MassEngine`.

use crate::sequence::SequenceOptions;
use crate::{MassEngine, Result};
use mass_midi_io::{DeviceRegistry, OutputBackend, RecordingBackend};
use std::sync::Arc;
use tracing::debug;

/// Without a backend the engine records to memory, which is what tests and
/// dry runs want. Hardware output needs the `midi-io` feature and
/// `.midi_hardware()`.
///
/// # Example
///
/// ```ignore
/// use mass::prelude::*;
///
/// let engine = MassEngine::builder()
///     .midi_hardware()
///     .cancel_on_error(true)
///     .build()?;
///
/// println!("{:?}", engine.list_devices());
/// ```
#[derive(Default)]
pub struct MassEngineBuilder {
    backend: Option<Arc<dyn OutputBackend>>,
    cancel_on_error: bool,
}

impl MassEngineBuilder {
    pub fn backend(mut self, backend: impl OutputBackend) -> Self {
        self.backend = Some(Arc::new(backend));
        self
    }

    pub fn shared_backend(mut self, backend: Arc<dyn OutputBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Send to real MIDI outputs through midir.
    #[cfg(feature = "midi-io")]
    pub fn midi_hardware(self) -> Self {
        self.backend(mass_midi_io::MidirBackend::new())
    }

    /// Default: false
    pub fn cancel_on_error(mut self, enabled: bool) -> Self {
        self.cancel_on_error = enabled;
        self
    }

    pub fn build(self) -> Result<MassEngine> {
        let backend = self.backend.unwrap_or_else(|| {
            debug!("No output backend configured, recording to memory");
            Arc::new(RecordingBackend::new()) as Arc<dyn OutputBackend>
        });

        let options = SequenceOptions {
            cancel_on_error: self.cancel_on_error,
        };
        Ok(MassEngine::from_parts(
            DeviceRegistry::with_backend(backend),
            options,
        ))
    }
}
