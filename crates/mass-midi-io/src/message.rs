//! Raw 3-byte channel messages.

/// Status nibble of a Note On message.
pub const NOTE_ON: u8 = 0x90;
/// Status nibble of a Note Off message.
pub const NOTE_OFF: u8 = 0x80;
/// Status nibble of a Control Change message.
pub const CONTROL_CHANGE: u8 = 0xB0;

/// A single 3-byte MIDI message as written to a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MidiOutputMessage {
    pub bytes: [u8; 3],
}

impl MidiOutputMessage {
    /// Raw status and data bytes, written as given.
    pub const fn new(status: u8, data1: u8, data2: u8) -> Self {
        Self {
            bytes: [status, data1, data2],
        }
    }

    pub fn note_on(channel: u8, note: u8, velocity: u8) -> Self {
        Self::channel_message(NOTE_ON, channel, note, velocity)
    }

    pub fn note_off(channel: u8, note: u8, velocity: u8) -> Self {
        Self::channel_message(NOTE_OFF, channel, note, velocity)
    }

    pub fn control_change(channel: u8, cc_number: u8, value: u8) -> Self {
        Self::channel_message(CONTROL_CHANGE, channel, cc_number, value)
    }

    /// CC 123 on `channel`.
    pub fn all_notes_off(channel: u8) -> Self {
        Self::control_change(channel, 123, 0)
    }

    // Channels are 0-15, data bytes are 7-bit.
    fn channel_message(kind: u8, channel: u8, data1: u8, data2: u8) -> Self {
        let channel = channel.min(15);
        Self::new(kind | channel, data1 & 0x7F, data2 & 0x7F)
    }

    pub const fn status(&self) -> u8 {
        self.bytes[0]
    }

    pub const fn data1(&self) -> u8 {
        self.bytes[1]
    }

    pub const fn data2(&self) -> u8 {
        self.bytes[2]
    }

    pub const fn channel(&self) -> u8 {
        self.bytes[0] & 0x0F
    }

    pub const fn is_note_on(&self) -> bool {
        self.bytes[0] & 0xF0 == NOTE_ON
    }

    pub const fn is_note_off(&self) -> bool {
        self.bytes[0] & 0xF0 == NOTE_OFF
    }
}

impl From<[u8; 3]> for MidiOutputMessage {
    fn from(bytes: [u8; 3]) -> Self {
        Self { bytes }
    }
}

impl AsRef<[u8]> for MidiOutputMessage {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}
