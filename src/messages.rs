/// Requests understood by a synthesizer connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SynthMessage {
    NoteOn(u8, u8), // (note, velocity)
    NoteOff(u8),    // note
    /// Silence everything, sent when shutting down.
    AllNotesOff,
}
