//! MIDI output to the operating system's synthesizer, reached through the
//! first available system MIDI output port.

use midir::{MidiOutput, MidiOutputConnection};
use thiserror::Error;
use wmidi::{Channel, MidiMessage, Note, U7};

use crate::messages::SynthMessage;

const CLIENT_NAME: &str = "minipiano";

/// Every note plays on a single channel.
const CHANNEL: Channel = Channel::Ch1;

/// The one failure mode of this program: the platform MIDI output cannot be
/// reached. Callers log it and carry on silently.
#[derive(Debug, Error)]
#[error("MIDI device unavailable: {reason}")]
pub struct DeviceUnavailable {
    reason: String,
}

impl DeviceUnavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl From<midir::InitError> for DeviceUnavailable {
    fn from(err: midir::InitError) -> Self {
        Self::new(err.to_string())
    }
}

impl From<midir::ConnectError<MidiOutput>> for DeviceUnavailable {
    fn from(err: midir::ConnectError<MidiOutput>) -> Self {
        Self::new(err.to_string())
    }
}

impl From<midir::SendError> for DeviceUnavailable {
    fn from(err: midir::SendError) -> Self {
        Self::new(err.to_string())
    }
}

/// Sink for note messages once a connection is open.
pub trait NoteOutput {
    fn send(&mut self, msg: SynthMessage) -> Result<(), DeviceUnavailable>;
}

/// Opens synthesizer connections on demand.
pub trait MidiBackend {
    type Conn: NoteOutput;

    fn connect(&mut self) -> Result<Self::Conn, DeviceUnavailable>;
}

/// The system synthesizer. Each `connect` call is an independent attempt,
/// creating a fresh client and picking the first output port it offers.
pub struct SystemSynth;

impl MidiBackend for SystemSynth {
    type Conn = SystemSynthConn;

    fn connect(&mut self) -> Result<SystemSynthConn, DeviceUnavailable> {
        let output = MidiOutput::new(CLIENT_NAME)?;
        let ports = output.ports();
        let port = ports
            .first()
            .ok_or_else(|| DeviceUnavailable::new("no MIDI output ports"))?;
        let port_name = output
            .port_name(port)
            .unwrap_or_else(|_| String::from("<unknown>"));
        let conn = output.connect(port, CLIENT_NAME)?;
        log::info!("connected to MIDI output '{port_name}'");
        Ok(SystemSynthConn { conn })
    }
}

pub struct SystemSynthConn {
    conn: MidiOutputConnection,
}

impl SystemSynthConn {
    fn transmit(&mut self, msg: &MidiMessage) -> Result<(), DeviceUnavailable> {
        let mut buf = [0u8; 3];
        let len = msg
            .copy_to_slice(&mut buf)
            .map_err(|err| DeviceUnavailable::new(format!("encoding failed: {err}")))?;
        self.conn.send(&buf[..len])?;
        Ok(())
    }
}

impl NoteOutput for SystemSynthConn {
    fn send(&mut self, msg: SynthMessage) -> Result<(), DeviceUnavailable> {
        match msg {
            SynthMessage::NoteOn(note, velocity) => self.transmit(&MidiMessage::NoteOn(
                CHANNEL,
                Note::from(U7::from_u8_lossy(note)),
                U7::from_u8_lossy(velocity),
            )),
            SynthMessage::NoteOff(note) => self.transmit(&MidiMessage::NoteOff(
                CHANNEL,
                Note::from(U7::from_u8_lossy(note)),
                U7::from_u8_lossy(0),
            )),
            SynthMessage::AllNotesOff => {
                for note in 0..128u8 {
                    self.transmit(&MidiMessage::NoteOff(
                        CHANNEL,
                        Note::from(U7::from_u8_lossy(note)),
                        U7::from_u8_lossy(0),
                    ))?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_on_wire_format() {
        let msg = MidiMessage::NoteOn(
            CHANNEL,
            Note::from(U7::from_u8_lossy(48)),
            U7::from_u8_lossy(80),
        );
        let mut buf = [0u8; 3];
        let len = msg.copy_to_slice(&mut buf).unwrap();
        assert_eq!(&[0x90, 48, 80], &buf[..len]);
    }

    #[test]
    fn note_off_wire_format() {
        let msg = MidiMessage::NoteOff(
            CHANNEL,
            Note::from(U7::from_u8_lossy(48)),
            U7::from_u8_lossy(0),
        );
        let mut buf = [0u8; 3];
        let len = msg.copy_to_slice(&mut buf).unwrap();
        assert_eq!(&[0x80, 48, 0], &buf[..len]);
    }
}
