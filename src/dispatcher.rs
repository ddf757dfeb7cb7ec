//! Turns key presses and releases into note messages on the synthesizer,
//! opening the connection lazily on the first note.

use crate::controls::Controls;
use crate::messages::SynthMessage;
use crate::midi::{MidiBackend, NoteOutput};

pub struct NoteDispatcher<B: MidiBackend> {
    backend: B,
    conn: Option<B::Conn>,
}

impl<B: MidiBackend> NoteDispatcher<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            conn: None,
        }
    }

    /// Opens the connection if none is open yet. A failed attempt is logged
    /// and leaves the dispatcher ready to retry on the next note.
    fn ensure_open(&mut self) -> Option<&mut B::Conn> {
        if self.conn.is_none() {
            match self.backend.connect() {
                Ok(conn) => self.conn = Some(conn),
                Err(err) => {
                    log::error!("cannot reach the system synthesizer: {err}");
                    return None;
                }
            }
        }
        self.conn.as_mut()
    }

    /// Starts sounding a semitone of the active octave, with the current
    /// volume as velocity. Repeated presses of a held key are forwarded
    /// as-is; the synthesizer coalesces or restarts the note.
    pub fn note_on(&mut self, semitone: u8, controls: &Controls) {
        let note = controls.midi_note(semitone);
        let velocity = controls.volume();
        if let Some(conn) = self.ensure_open() {
            if let Err(err) = conn.send(SynthMessage::NoteOn(note, velocity)) {
                log::warn!("note-on {note} failed: {err}");
            }
        }
    }

    /// Stops sounding a semitone. The note number is computed against the
    /// octave in effect at release time, so a key held across an octave
    /// change releases at the new pitch. Without an open connection this
    /// does nothing.
    pub fn note_off(&mut self, semitone: u8, controls: &Controls) {
        let note = controls.midi_note(semitone);
        if let Some(conn) = self.conn.as_mut() {
            if let Err(err) = conn.send(SynthMessage::NoteOff(note)) {
                log::warn!("note-off {note} failed: {err}");
            }
        }
    }
}

impl<B: MidiBackend> Drop for NoteDispatcher<B> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.as_mut() {
            if let Err(err) = conn.send(SynthMessage::AllNotesOff) {
                log::warn!("failed to silence notes on shutdown: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::DeviceUnavailable;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[derive(Default)]
    struct Shared {
        sent: RefCell<Vec<SynthMessage>>,
        opens: Cell<usize>,
        failures: Cell<usize>,
    }

    struct FakeBackend(Rc<Shared>);

    struct FakeConn(Rc<Shared>);

    impl MidiBackend for FakeBackend {
        type Conn = FakeConn;

        fn connect(&mut self) -> Result<FakeConn, DeviceUnavailable> {
            self.0.opens.set(self.0.opens.get() + 1);
            if self.0.failures.get() > 0 {
                self.0.failures.set(self.0.failures.get() - 1);
                return Err(DeviceUnavailable::new("no MIDI output ports"));
            }
            Ok(FakeConn(self.0.clone()))
        }
    }

    impl NoteOutput for FakeConn {
        fn send(&mut self, msg: SynthMessage) -> Result<(), DeviceUnavailable> {
            self.0.sent.borrow_mut().push(msg);
            Ok(())
        }
    }

    fn rig() -> (Rc<Shared>, NoteDispatcher<FakeBackend>) {
        let shared = Rc::new(Shared::default());
        let dispatcher = NoteDispatcher::new(FakeBackend(shared.clone()));
        (shared, dispatcher)
    }

    #[test]
    fn press_and_release_at_the_defaults() {
        let (shared, mut dispatcher) = rig();
        let controls = Controls::default();

        dispatcher.note_on(0, &controls);
        dispatcher.note_off(0, &controls);

        assert_eq!(
            vec![SynthMessage::NoteOn(48, 80), SynthMessage::NoteOff(48)],
            *shared.sent.borrow()
        );
    }

    #[test]
    fn octave_change_shifts_the_note() {
        let (shared, mut dispatcher) = rig();
        let mut controls = Controls::default();

        controls.decrease_octave();
        assert_eq!(3, controls.octave());
        dispatcher.note_on(0, &controls);

        assert_eq!(vec![SynthMessage::NoteOn(36, 80)], *shared.sent.borrow());
    }

    #[test]
    fn volume_becomes_the_velocity() {
        let (shared, mut dispatcher) = rig();
        let mut controls = Controls::default();

        controls.set_volume(127);
        dispatcher.note_on(11, &controls);

        assert_eq!(vec![SynthMessage::NoteOn(59, 127)], *shared.sent.borrow());
    }

    #[test]
    fn release_without_a_connection_does_nothing() {
        let (shared, mut dispatcher) = rig();
        let controls = Controls::default();

        dispatcher.note_off(0, &controls);

        assert!(shared.sent.borrow().is_empty());
        assert_eq!(0, shared.opens.get());
    }

    #[test]
    fn connection_is_opened_once_and_reused() {
        let (shared, mut dispatcher) = rig();
        let controls = Controls::default();

        dispatcher.note_on(0, &controls);
        dispatcher.note_off(0, &controls);
        dispatcher.note_on(2, &controls);

        assert_eq!(1, shared.opens.get());
    }

    #[test]
    fn failed_open_mutes_the_note_and_is_retried() {
        let (shared, mut dispatcher) = rig();
        let controls = Controls::default();
        shared.failures.set(1);

        dispatcher.note_on(0, &controls);
        assert!(shared.sent.borrow().is_empty());
        assert_eq!(1, shared.opens.get());

        dispatcher.note_on(0, &controls);
        assert_eq!(vec![SynthMessage::NoteOn(48, 80)], *shared.sent.borrow());
        assert_eq!(2, shared.opens.get());
    }

    #[test]
    fn repeated_presses_are_forwarded_unchanged() {
        let (shared, mut dispatcher) = rig();
        let controls = Controls::default();

        dispatcher.note_on(5, &controls);
        dispatcher.note_on(5, &controls);
        dispatcher.note_on(5, &controls);

        assert_eq!(3, shared.sent.borrow().len());
    }

    #[test]
    fn release_uses_the_octave_at_release_time() {
        let (shared, mut dispatcher) = rig();
        let mut controls = Controls::default();

        dispatcher.note_on(0, &controls);
        controls.decrease_octave();
        dispatcher.note_off(0, &controls);

        // The release lands on the shifted pitch; note 48 may keep ringing on
        // synthesizers that do not time out.
        assert_eq!(
            vec![SynthMessage::NoteOn(48, 80), SynthMessage::NoteOff(36)],
            *shared.sent.borrow()
        );
    }

    #[test]
    fn dropping_an_open_dispatcher_silences_everything() {
        let (shared, mut dispatcher) = rig();
        let controls = Controls::default();

        dispatcher.note_on(0, &controls);
        drop(dispatcher);

        assert_eq!(
            Some(&SynthMessage::AllNotesOff),
            shared.sent.borrow().last()
        );
    }

    #[test]
    fn dropping_a_never_used_dispatcher_sends_nothing() {
        let (shared, dispatcher) = rig();

        drop(dispatcher);

        assert!(shared.sent.borrow().is_empty());
        assert_eq!(0, shared.opens.get());
    }
}
