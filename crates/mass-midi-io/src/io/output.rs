//! MIDI output via midir: device enumeration and one owner thread per connection.

use crate::backend::{OutputBackend, OutputConnection};
use crate::error::{Error, Result};
use crate::message::MidiOutputMessage;
use crossbeam_channel::{bounded, Receiver, Sender};
use midir::{MidiOutput, MidiOutputConnection};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiOutputDevice {
    pub index: usize,
    pub name: String,
}

enum MidiOutputCommand {
    Send(MidiOutputMessage, Sender<Result<()>>),
    Shutdown,
}

/// Hardware outputs, matched by name.
///
/// A name matches a port when it equals the port name, or failing that when it
/// is a case-insensitive substring of it.
#[derive(Debug, Clone)]
pub struct MidirBackend {
    client_name: String,
}

impl MidirBackend {
    pub fn new() -> Self {
        Self::with_client_name("mass-midi-output")
    }

    pub fn with_client_name(name: impl Into<String>) -> Self {
        Self {
            client_name: name.into(),
        }
    }

    pub fn devices(&self) -> Result<Vec<MidiOutputDevice>> {
        let midi_output = MidiOutput::new(&self.client_name)?;
        Ok(midi_output
            .ports()
            .iter()
            .enumerate()
            .map(|(index, port)| MidiOutputDevice {
                index,
                name: midi_output
                    .port_name(port)
                    .unwrap_or_else(|_| format!("Unknown Device {}", index)),
            })
            .collect())
    }

    fn connect(client_name: &str, name: &str) -> Result<MidiOutputConnection> {
        let midi_output = MidiOutput::new(client_name)?;
        let ports = midi_output.ports();
        let names: Vec<String> = ports
            .iter()
            .map(|port| midi_output.port_name(port).unwrap_or_default())
            .collect();

        let index = find_port(&names, name).ok_or_else(|| Error::DeviceNotFound(name.to_string()))?;

        midi_output
            .connect(&ports[index], "mass-output")
            .map_err(|e| Error::MidiDevice(e.to_string()))
    }

    fn output_thread(
        mut connection: MidiOutputConnection,
        device: String,
        command_receiver: Receiver<MidiOutputCommand>,
    ) {
        while let Ok(command) = command_receiver.recv() {
            match command {
                MidiOutputCommand::Send(message, reply) => {
                    let result = connection.send(&message.bytes).map_err(|e| Error::DeviceWrite {
                        device: device.clone(),
                        message: e.to_string(),
                    });
                    let _ = reply.send(result);
                }
                MidiOutputCommand::Shutdown => break,
            }
        }
        connection.close();
        debug!("MIDI output thread for '{}' stopped", device);
    }
}

impl Default for MidirBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn find_port(names: &[String], wanted: &str) -> Option<usize> {
    names.iter().position(|n| n == wanted).or_else(|| {
        let wanted = wanted.to_lowercase();
        names
            .iter()
            .position(|n| n.to_lowercase().contains(&wanted))
    })
}

impl OutputBackend for MidirBackend {
    fn open(&self, name: &str) -> Result<Box<dyn OutputConnection>> {
        let (command_sender, command_receiver) = bounded(64);
        let (ready_sender, ready_receiver) = bounded(1);

        let client_name = self.client_name.clone();
        let device = name.to_string();

        // The midir connection never leaves this thread.
        let thread = thread::Builder::new()
            .name(format!("midi-output-{}", name))
            .spawn(move || match Self::connect(&client_name, &device) {
                Ok(connection) => {
                    let _ = ready_sender.send(Ok(()));
                    Self::output_thread(connection, device, command_receiver);
                }
                Err(e) => {
                    let _ = ready_sender.send(Err(e));
                }
            })
            .map_err(|e| Error::MidiDevice(format!("Failed to spawn MIDI output thread: {}", e)))?;

        match ready_receiver.recv() {
            Ok(Ok(())) => Ok(Box::new(MidirConnection {
                device: name.to_string(),
                command_sender,
                thread: Some(thread),
            })),
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(Error::MidiDevice("MIDI output thread exited".to_string()))
            }
        }
    }

    fn list_devices(&self) -> Vec<String> {
        match self.devices() {
            Ok(devices) => devices.into_iter().map(|d| d.name).collect(),
            Err(e) => {
                warn!("Cannot enumerate MIDI outputs: {}", e);
                Vec::new()
            }
        }
    }
}

struct MidirConnection {
    device: String,
    command_sender: Sender<MidiOutputCommand>,
    thread: Option<JoinHandle<()>>,
}

impl OutputConnection for MidirConnection {
    fn send(&mut self, message: &MidiOutputMessage) -> Result<()> {
        let thread_gone = || Error::DeviceWrite {
            device: self.device.clone(),
            message: "MIDI output thread not running".to_string(),
        };

        let (reply_sender, reply_receiver) = bounded(1);
        self.command_sender
            .send(MidiOutputCommand::Send(*message, reply_sender))
            .map_err(|_| thread_gone())?;
        reply_receiver.recv().map_err(|_| thread_gone())?
    }

    fn close(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = self.command_sender.send(MidiOutputCommand::Shutdown);
            let _ = thread.join();
        }
    }
}

impl Drop for MidirConnection {
    fn drop(&mut self) {
        self.close();
    }
}
