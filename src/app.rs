use std::{path::PathBuf, time::Duration};

use eframe::egui::{self, Color32};

use crate::{
    engine::ClickJob,
    input::{self, EnigoSink},
    recorder::{Playback, Recording},
    settings::{self, Settings},
};

#[cfg(feature = "hooks")]
use crate::{hotkey::HotkeyListener, recorder::Recorder};

pub struct ClickmateApp {
    settings: Settings,
    settings_path: PathBuf,
    job: Option<ClickJob>,

    recording: Recording,
    recording_path: String,
    playback: Option<Playback>,
    playback_speed: f32,
    playback_loops: u32,

    /// Last validation or I/O error, shown under the buttons.
    error: Option<String>,

    #[cfg(feature = "hooks")]
    hotkey: Option<HotkeyListener>,
    #[cfg(feature = "hooks")]
    recorder: Recorder,
}

impl ClickmateApp {
    pub fn new(cc: &eframe::CreationContext<'_>, settings_path: PathBuf, autostart: bool) -> Self {
        let settings = match Settings::load(&settings_path) {
            Ok(settings) => settings,
            Err(error) => {
                log::warn!("{error:#}");
                Settings::default()
            }
        };

        let mut app = Self {
            settings,
            settings_path,
            job: None,
            recording: Recording::default(),
            recording_path: "recording.json".into(),
            playback: None,
            playback_speed: 1.0,
            playback_loops: 1,
            error: None,
            #[cfg(feature = "hooks")]
            hotkey: None,
            #[cfg(feature = "hooks")]
            recorder: Recorder::default(),
        };

        app.apply_theme(&cc.egui_ctx);

        #[cfg(feature = "hooks")]
        match HotkeyListener::spawn(&app.settings.hotkey) {
            Ok(listener) => app.hotkey = Some(listener),
            Err(error) => app.error = Some(error.to_string()),
        }

        if autostart {
            app.start();
        }

        app
    }

    fn apply_theme(&self, ctx: &egui::Context) {
        ctx.set_visuals(if self.settings.dark {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        });
    }

    fn is_clicking(&self) -> bool {
        self.job.as_ref().map_or(false, ClickJob::is_running)
    }

    fn is_playing(&self) -> bool {
        self.playback.as_ref().map_or(false, Playback::is_running)
    }

    fn start(&mut self) {
        if self.is_clicking() {
            return;
        }
        match self.settings.to_click_config() {
            Ok(config) => {
                if !config.pattern.is_empty() {
                    // Canonicalize whatever spacing the user typed.
                    self.settings.pattern = settings::format_pattern(&config.pattern);
                }
                self.job = Some(ClickJob::spawn(config, Box::new(EnigoSink)));
                self.error = None;
            }
            Err(error) => self.error = Some(format!("{error:#}")),
        }
    }

    fn stop(&mut self) {
        if let Some(mut job) = self.job.take() {
            job.stop();
        }
    }

    fn toggle(&mut self) {
        if self.is_clicking() {
            self.stop();
        } else {
            self.start();
        }
    }

    fn save_settings(&mut self) {
        if let Err(error) = self.settings.save(&self.settings_path) {
            self.error = Some(format!("{error:#}"));
        } else {
            self.error = None;
        }
    }

    fn start_playback(&mut self) {
        if self.is_playing() {
            return;
        }
        if self.recording.is_empty() {
            self.error = Some("no recording loaded".into());
            return;
        }
        self.playback = Some(Playback::spawn(
            self.recording.clone(),
            self.playback_speed,
            self.playback_loops,
            Box::new(EnigoSink),
        ));
        self.error = None;
    }

    fn stop_playback(&mut self) {
        if let Some(mut playback) = self.playback.take() {
            playback.stop();
        }
    }

    fn status_line(&self) -> (String, Color32) {
        if self.is_clicking() {
            let cycles = self.job.as_ref().map_or(0, ClickJob::cycles_done);
            (format!("Status: Running ({cycles} cycles)"), Color32::GREEN)
        } else if let Some(job) = &self.job {
            (
                format!("Status: Finished after {} cycles", job.cycles_done()),
                Color32::GRAY,
            )
        } else {
            ("Status: Stopped".into(), Color32::RED)
        }
    }

    fn clicker_panel(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.label("Clicking");

            egui::ComboBox::from_label("Mouse button")
                .selected_text(self.settings.button.clone())
                .show_ui(ui, |ui| {
                    for name in ["left", "right", "middle"] {
                        ui.selectable_value(&mut self.settings.button, name.into(), name);
                    }
                });

            egui::ComboBox::from_label("Click type")
                .selected_text(self.settings.click_type.clone())
                .show_ui(ui, |ui| {
                    for name in ["single", "double", "pattern", "hold"] {
                        ui.selectable_value(&mut self.settings.click_type, name.into(), name);
                    }
                });

            let pattern_mode = self.settings.click_type == "pattern";
            if pattern_mode {
                ui.horizontal(|ui| {
                    ui.label("Pattern (s):");
                    ui.text_edit_singleline(&mut self.settings.pattern);
                });
            } else {
                ui.horizontal(|ui| {
                    ui.label("Clicks / sec:");
                    ui.add(
                        egui::DragValue::new(&mut self.settings.cps)
                            .speed(0.1)
                            .clamp_range(0.1..=1000.0),
                    );
                });
            }

            if self.settings.click_type == "hold" {
                ui.horizontal(|ui| {
                    ui.label("Hold (s):");
                    ui.add(
                        egui::DragValue::new(&mut self.settings.hold_secs)
                            .speed(0.1)
                            .clamp_range(0.0..=60.0),
                    );
                });
            }

            ui.horizontal(|ui| {
                ui.label("Jitter (ms):");
                ui.add(
                    egui::DragValue::new(&mut self.settings.jitter_ms).clamp_range(0..=1000),
                );
            });

            ui.horizontal(|ui| {
                egui::ComboBox::from_label("Repeat")
                    .selected_text(self.settings.repeat_mode.clone())
                    .show_ui(ui, |ui| {
                        for name in ["until_stopped", "fixed"] {
                            ui.selectable_value(&mut self.settings.repeat_mode, name.into(), name);
                        }
                    });
                if self.settings.repeat_mode == "fixed" {
                    ui.add(
                        egui::DragValue::new(&mut self.settings.repeat_count)
                            .clamp_range(1..=1_000_000),
                    );
                }
            });

            ui.horizontal(|ui| {
                egui::ComboBox::from_label("Target")
                    .selected_text(self.settings.target_mode.clone())
                    .show_ui(ui, |ui| {
                        for name in ["cursor", "fixed"] {
                            ui.selectable_value(&mut self.settings.target_mode, name.into(), name);
                        }
                    });
            });
            if self.settings.target_mode == "fixed" {
                ui.horizontal(|ui| {
                    ui.label("X");
                    ui.add(egui::DragValue::new(&mut self.settings.target_x));
                    ui.label("Y");
                    ui.add(egui::DragValue::new(&mut self.settings.target_y));
                    if ui.button("Use current position").clicked() {
                        let (x, y) = input::cursor_position();
                        let (x, y) = input::clamp_to_display(x, y);
                        self.settings.target_x = x;
                        self.settings.target_y = y;
                    }
                });
            }
        });
    }

    fn hotkey_panel(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.label("Hotkey");
            ui.horizontal(|ui| {
                ui.text_edit_singleline(&mut self.settings.hotkey);
                #[cfg(feature = "hooks")]
                if ui.button("Apply").clicked() {
                    match &self.hotkey {
                        Some(listener) => match listener.rebind(&self.settings.hotkey) {
                            Ok(()) => self.error = None,
                            Err(error) => self.error = Some(error.to_string()),
                        },
                        None => match HotkeyListener::spawn(&self.settings.hotkey) {
                            Ok(listener) => {
                                self.hotkey = Some(listener);
                                self.error = None;
                            }
                            Err(error) => self.error = Some(error.to_string()),
                        },
                    }
                }
                #[cfg(not(feature = "hooks"))]
                ui.label("(built without global hooks)");
            });
        });
    }

    fn recording_panel(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.label("Record & playback");

            #[cfg(feature = "hooks")]
            ui.horizontal(|ui| {
                if self.recorder.is_recording() {
                    if ui.button("Stop recording").clicked() {
                        self.recording = self.recorder.stop();
                    }
                    ui.label(format!("recording... {} events", self.recorder.event_count()));
                } else if ui.button("Record").clicked() {
                    self.recorder.start();
                }
            });

            ui.horizontal(|ui| {
                ui.label("File:");
                ui.text_edit_singleline(&mut self.recording_path);
                if ui.button("Save").clicked() {
                    match self.recording.save(self.recording_path.as_ref()) {
                        Ok(()) => self.error = None,
                        Err(error) => self.error = Some(format!("{error:#}")),
                    }
                }
                if ui.button("Load").clicked() {
                    match Recording::load(self.recording_path.as_ref()) {
                        Ok(recording) => {
                            self.recording = recording;
                            self.error = None;
                        }
                        Err(error) => self.error = Some(format!("{error:#}")),
                    }
                }
            });

            ui.horizontal(|ui| {
                ui.label("Speed:");
                ui.add(
                    egui::DragValue::new(&mut self.playback_speed)
                        .speed(0.1)
                        .clamp_range(0.1..=10.0),
                );
                ui.label("Loops:");
                ui.add(egui::DragValue::new(&mut self.playback_loops).clamp_range(1..=1000));
                if self.is_playing() {
                    if ui.button("Stop playback").clicked() {
                        self.stop_playback();
                    }
                } else if ui.button("Play").clicked() {
                    self.start_playback();
                }
            });

            if !self.recording.is_empty() {
                ui.monospace(format!(
                    "{} events, {:.1}s",
                    self.recording.events.len(),
                    self.recording.duration_ms() as f64 / 1000.0
                ));
            }
        });
    }
}

impl eframe::App for ClickmateApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        #[cfg(feature = "hooks")]
        match self.hotkey.as_ref().map(HotkeyListener::take_toggle) {
            Some(Ok(true)) => self.toggle(),
            Some(Err(error)) => {
                self.error = Some(error.to_string());
                self.hotkey = None;
            }
            _ => {}
        }

        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            ui.heading("ClickMate");
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.clicker_panel(ui);
            self.hotkey_panel(ui);
            self.recording_panel(ui);

            ui.horizontal(|ui| {
                if ui.button("Start").clicked() {
                    self.start();
                }
                if ui.button("Stop").clicked() {
                    self.stop();
                }
                if ui.button("Save settings").clicked() {
                    self.save_settings();
                }
                if ui.checkbox(&mut self.settings.dark, "Dark mode").changed() {
                    self.apply_theme(ctx);
                }
            });

            let (status, color) = self.status_line();
            ui.colored_label(color, status);
            if let Some(error) = &self.error {
                ui.colored_label(Color32::RED, error);
            }
        });

        // Keep polling so hotkey toggles and finished jobs show up promptly.
        ctx.request_repaint_after(Duration::from_millis(100));
    }
}
