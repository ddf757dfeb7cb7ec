mod app;
mod controls;
mod dispatcher;
mod keymap;
mod messages;
mod midi;

use env_logger::Env;

fn main() -> eframe::Result {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let viewport = egui::ViewportBuilder::default()
        .with_inner_size(app::WINDOW_SIZE)
        .with_resizable(false);
    let options = eframe::NativeOptions {
        viewport,
        centered: true,
        ..Default::default()
    };

    eframe::run_native(
        "Minipiano",
        options,
        Box::new(|cc| Ok(Box::new(app::PianoApp::new(cc)))),
    )
}
