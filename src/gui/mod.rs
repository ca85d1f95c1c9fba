mod panes;

use anyhow::{anyhow, Result};
use eframe::egui;
use std::time::Instant;

use crate::core::{Bench, SubmitOutcome};

pub fn start(bench: Bench) -> Result<()> {
    log::info!("[GUI] probe-bench GUI starting...");
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Probe Bench")
            .with_inner_size([960.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "probe-bench",
        options,
        Box::new(|_cc| Ok(Box::new(BenchApp { bench }))),
    )
    .map_err(|err| anyhow!("GUI terminated with an error: {err}"))
}

struct BenchApp {
    bench: Bench,
}

impl BenchApp {
    fn submit_flash(&mut self) {
        if self.bench.submit_flash() == SubmitOutcome::Busy {
            log::debug!("[GUI] flash already running");
        }
    }

    fn submit_test(&mut self) {
        if self.bench.submit_test() == SubmitOutcome::Busy {
            log::debug!("[GUI] test already running");
        }
    }

    fn flash_pane(&mut self, ui: &mut egui::Ui) {
        ui.heading("Firmware");
        ui.horizontal(|ui| {
            ui.label("Port:");
            panes::port_combo(ui, "flash_port", self.bench.flash_ports_mut());
        });

        ui.horizontal(|ui| {
            if ui.button("Browse...").clicked() {
                // Cancelling keeps the previous choice.
                if let Some(path) = rfd::FileDialog::new()
                    .set_title("Select firmware")
                    .add_filter("Intel HEX File", &["hex"])
                    .pick_file()
                {
                    self.bench.set_flash_image(Some(path));
                }
            }
            let label = self
                .bench
                .flash_image()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "No file selected".to_string());
            ui.label(label);
        });

        let enabled = self.bench.flash().is_submit_enabled();
        if ui
            .add_enabled(enabled, egui::Button::new("Flash (F5)"))
            .clicked()
        {
            self.submit_flash();
        }

        panes::log_view(ui, "flash_log", self.bench.flash_mut().sink_mut());
    }

    fn test_pane(&mut self, ui: &mut egui::Ui) {
        ui.heading("Functional test");
        ui.horizontal(|ui| {
            ui.label("Port:");
            panes::port_combo(ui, "test_port", self.bench.test_ports_mut());
        });

        let enabled = self.bench.test().is_submit_enabled();
        if ui
            .add_enabled(enabled, egui::Button::new("Start test (F6)"))
            .clicked()
        {
            self.submit_test();
        }

        panes::log_view(ui, "test_log", self.bench.test_mut().sink_mut());
    }
}

impl eframe::App for BenchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.bench.on_tick(Instant::now());

        if !ctx.wants_keyboard_input() {
            let (flash, test) =
                ctx.input(|i| (i.key_pressed(egui::Key::F5), i.key_pressed(egui::Key::F6)));
            if flash {
                self.submit_flash();
            }
            if test {
                self.submit_test();
            }
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.columns(2, |columns| {
                self.flash_pane(&mut columns[0]);
                self.test_pane(&mut columns[1]);
            });
        });

        ctx.request_repaint_after(self.bench.next_wake(Instant::now()));
    }
}
