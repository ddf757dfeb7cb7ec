//! The application window: a one-octave keyboard drawn with the egui painter
//! and a settings row with octave buttons and a volume slider.

use std::collections::HashSet;

use egui::{Align2, Color32, FontId, Pos2, Rect, Sense, Stroke, StrokeKind, Vec2};

use crate::controls::Controls;
use crate::dispatcher::NoteDispatcher;
use crate::keymap;
use crate::midi::SystemSynth;

// Offsets of the black keys in white-key widths from the left edge.
const BLACK_KEY_POSITIONS: [f32; 5] = [0.75, 1.75, 3.75, 4.75, 5.75];

const WHITE_KEY_COUNT: usize = 7;
const WHITE_KEY_WIDTH: f32 = 62.0;
const WHITE_KEY_HEIGHT: f32 = 170.0;
const BLACK_KEY_WIDTH: f32 = 36.0;
const BLACK_KEY_HEIGHT: f32 = 104.0;

pub const WINDOW_SIZE: [f32; 2] = [450.0, 252.0];

pub struct PianoApp {
    controls: Controls,
    dispatcher: NoteDispatcher<SystemSynth>,
    /// Semitones currently held down, for highlighting.
    pressed: HashSet<u8>,
    /// Key the mouse started a note on; released on mouse-up.
    mouse_key: Option<u8>,
}

impl PianoApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        Self {
            controls: Controls::default(),
            dispatcher: NoteDispatcher::new(SystemSynth),
            pressed: HashSet::new(),
            mouse_key: None,
        }
    }

    fn press(&mut self, semitone: u8) {
        self.pressed.insert(semitone);
        self.dispatcher.note_on(semitone, &self.controls);
    }

    fn release(&mut self, semitone: u8) {
        self.pressed.remove(&semitone);
        self.dispatcher.note_off(semitone, &self.controls);
    }

    fn on_key_down(&mut self, key: egui::Key) {
        match key {
            egui::Key::ArrowUp => self.controls.increase_octave(),
            egui::Key::ArrowDown => self.controls.decrease_octave(),
            _ => {
                if let Some(semitone) = keymap::semitone_for(key) {
                    self.press(semitone);
                }
            }
        }
    }

    fn on_key_up(&mut self, key: egui::Key) {
        if let Some(semitone) = keymap::semitone_for(key) {
            self.release(semitone);
        }
    }

    fn keyboard_ui(&mut self, ui: &mut egui::Ui) {
        let size = Vec2::new(WHITE_KEY_COUNT as f32 * WHITE_KEY_WIDTH, WHITE_KEY_HEIGHT);
        let (rect, _response) = ui.allocate_exact_size(size, Sense::hover());
        if !ui.is_rect_visible(rect) {
            return;
        }

        let white_keys: Vec<(u8, Rect)> = (0..keymap::KEY_COUNT as u8)
            .filter(|&semitone| !keymap::is_black(semitone))
            .enumerate()
            .map(|(i, semitone)| {
                let min = Pos2::new(rect.left() + i as f32 * WHITE_KEY_WIDTH, rect.top());
                let key_rect =
                    Rect::from_min_size(min, Vec2::new(WHITE_KEY_WIDTH - 1.0, WHITE_KEY_HEIGHT));
                (semitone, key_rect)
            })
            .collect();

        let black_keys: Vec<(u8, Rect)> = (0..keymap::KEY_COUNT as u8)
            .filter(|&semitone| keymap::is_black(semitone))
            .zip(BLACK_KEY_POSITIONS)
            .map(|(semitone, offset)| {
                let min = Pos2::new(
                    rect.left() + offset * WHITE_KEY_WIDTH - BLACK_KEY_WIDTH / 2.0,
                    rect.top(),
                );
                let key_rect =
                    Rect::from_min_size(min, Vec2::new(BLACK_KEY_WIDTH, BLACK_KEY_HEIGHT));
                (semitone, key_rect)
            })
            .collect();

        let painter = ui.painter();
        for (semitone, key_rect) in &white_keys {
            let fill = if self.pressed.contains(semitone) {
                Color32::from_rgb(140, 180, 255)
            } else {
                Color32::WHITE
            };
            painter.rect_filled(*key_rect, 2.0, fill);
            painter.rect_stroke(
                *key_rect,
                2.0,
                Stroke::new(1.0, Color32::from_gray(120)),
                StrokeKind::Middle,
            );
            painter.text(
                Pos2::new(key_rect.center().x, key_rect.bottom() - 14.0),
                Align2::CENTER_CENTER,
                keymap::label(*semitone),
                FontId::proportional(14.0),
                Color32::DARK_GRAY,
            );
        }
        for (semitone, key_rect) in &black_keys {
            let fill = if self.pressed.contains(semitone) {
                Color32::from_rgb(90, 130, 210)
            } else {
                Color32::BLACK
            };
            painter.rect_filled(*key_rect, 2.0, fill);
            painter.text(
                Pos2::new(key_rect.center().x, key_rect.bottom() - 12.0),
                Align2::CENTER_CENTER,
                keymap::label(*semitone),
                FontId::proportional(12.0),
                Color32::GRAY,
            );
        }

        // Black keys sit on top of the white ones, so hit-test them first.
        let hovered = ui.input(|i| i.pointer.hover_pos()).and_then(|pos| {
            black_keys
                .iter()
                .chain(white_keys.iter())
                .find(|(_, key_rect)| key_rect.contains(pos))
                .map(|(semitone, _)| *semitone)
        });

        if ui.input(|i| i.pointer.primary_pressed()) {
            if let Some(semitone) = hovered {
                self.mouse_key = Some(semitone);
                self.press(semitone);
            }
        }
        if ui.input(|i| i.pointer.primary_released()) {
            if let Some(semitone) = self.mouse_key.take() {
                self.release(semitone);
            }
        }
    }

    fn settings_ui(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Octave Down").clicked() {
                self.controls.decrease_octave();
            }
            if ui.button("Octave Up").clicked() {
                self.controls.increase_octave();
            }
            ui.label(format!("Octave: {}", self.controls.octave()));
            ui.separator();
            let mut volume = self.controls.volume();
            if ui
                .add(egui::Slider::new(&mut volume, 0..=127).text("Volume"))
                .changed()
            {
                self.controls.set_volume(volume);
            }
        });
    }
}

impl eframe::App for PianoApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Auto-repeat arrives as further presses of a held key and is
        // forwarded like any other press.
        let events = ctx.input(|i| i.events.clone());
        for event in events {
            if let egui::Event::Key { key, pressed, .. } = event {
                if pressed {
                    self.on_key_down(key);
                } else {
                    self.on_key_up(key);
                }
            }
        }

        egui::TopBottomPanel::bottom("settings").show(ctx, |ui| {
            ui.add_space(4.0);
            self.settings_ui(ui);
            ui.add_space(4.0);
        });
        egui::CentralPanel::default().show(ctx, |ui| {
            self.keyboard_ui(ui);
        });
    }
}
