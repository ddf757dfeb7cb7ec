//! The fixed layout of the one-octave keyboard: key captions, black/white
//! classification, and the computer-keyboard bindings.

use egui::Key;

pub const KEY_COUNT: usize = 12;

/// Caption shown on each on-screen key. The letters double as the computer
/// keyboard bindings, laid out like the bottom row of a QWERTY keyboard.
pub const KEY_LABELS: [&str; KEY_COUNT] = [
    "Z", "S", "X", "D", "C", "V", "G", "B", "H", "N", "J", "M",
];

const KEY_BINDINGS: [Key; KEY_COUNT] = {
    use egui::Key::*;
    [Z, S, X, D, C, V, G, B, H, N, J, M]
};

/// Semitone index bound to a keyboard key, or `None` if the key is unbound.
pub fn semitone_for(key: Key) -> Option<u8> {
    KEY_BINDINGS.iter().position(|&k| k == key).map(|i| i as u8)
}

pub fn label(semitone: u8) -> &'static str {
    KEY_LABELS[semitone as usize % KEY_COUNT]
}

/// Black keys are C#, D#, F#, G#, A#.
pub fn is_black(semitone: u8) -> bool {
    matches!(semitone % 12, 1 | 3 | 6 | 8 | 10)
}
