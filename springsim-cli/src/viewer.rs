//! Interactive window for command scripts
//!
//! Draws the curve, springs, and particles in a front (x/y) projection and
//! rebuilds the scene whenever the script file changes on disk.

use eframe::egui;
use notify::{Event, RecommendedWatcher, Watcher};
use springsim_core::{
    build_simulation_from_source, Diagnostic, DiagnosticSeverity, SimulationConfig,
    SimulationState,
};
use std::path::PathBuf;
use std::sync::mpsc;

/// Frame length used by the Step button
const STEP_FRAME_DT: f32 = 1.0 / 60.0;

pub fn launch(
    source_path: PathBuf,
    config: SimulationConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([960.0, 720.0])
            .with_title("SpringSim"),
        ..Default::default()
    };
    eframe::run_native(
        "SpringSim",
        options,
        Box::new(move |cc| Ok(Box::new(ViewerApp::new(source_path, config, cc)))),
    )
    .map_err(|e| e.to_string())?;
    Ok(())
}

pub struct ViewerApp {
    source_path: PathBuf,
    source_text: String,
    config: SimulationConfig,
    state: SimulationState,
    report: Vec<Diagnostic>,
    last_load_error: Option<String>,
    playing: bool,
    speed_multiplier: f32,
    #[allow(dead_code)] // Kept alive to maintain file watching
    file_watcher: Option<RecommendedWatcher>,
    file_receiver: mpsc::Receiver<notify::Result<Event>>,
    needs_reload: bool,
}

impl ViewerApp {
    pub fn new(
        source_path: PathBuf,
        config: SimulationConfig,
        _cc: &eframe::CreationContext<'_>,
    ) -> Self {
        let (source_text, last_load_error) = match std::fs::read_to_string(&source_path) {
            Ok(text) => (text, None),
            Err(e) => (String::new(), Some(format!("reading {}: {}", source_path.display(), e))),
        };

        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            // The receiver is gone during shutdown
            let _ = tx.send(res);
        })
        .ok();

        if let Some(ref mut w) = watcher {
            if let Err(e) = w.watch(&source_path, notify::RecursiveMode::NonRecursive) {
                ftlog::warn!("not watching {}: {}", source_path.display(), e);
            }
        }

        let mut app = Self {
            source_path,
            source_text,
            state: SimulationState::new(config.clone()),
            config,
            report: Vec::new(),
            last_load_error,
            playing: false,
            speed_multiplier: 1.0,
            file_watcher: watcher,
            file_receiver: rx,
            needs_reload: false,
        };

        app.reload_state();

        app
    }

    fn reload_state(&mut self) {
        let (state, report) = build_simulation_from_source(&self.source_text, self.config.clone());
        self.state = state;
        self.report = report
            .iter()
            .filter(|d| d.severity != DiagnosticSeverity::Info)
            .cloned()
            .collect();
    }

    fn check_file_changes(&mut self) {
        while let Ok(event) = self.file_receiver.try_recv() {
            match event {
                Ok(Event {
                    kind: notify::EventKind::Modify(_),
                    paths,
                    ..
                }) => {
                    if paths.iter().any(|p| p.ends_with(&self.source_path)) {
                        match std::fs::read_to_string(&self.source_path) {
                            Ok(new_text) => {
                                self.source_text = new_text;
                                self.last_load_error = None;
                                self.needs_reload = true;
                            }
                            Err(e) => self.last_load_error = Some(e.to_string()),
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    ftlog::warn!("file watcher error: {}", e);
                }
            }
        }

        if self.needs_reload {
            ftlog::info!("reloading {}", self.source_path.display());
            self.reload_state();
            self.needs_reload = false;
        }
    }

    fn draw_scene(&self, ui: &egui::Ui) {
        let rect = ui.max_rect();
        let painter = ui.painter();
        let snapshot = self.state.snapshot();

        // World coordinates roughly in [-10, 10], ground along the lower third
        let world_range = 20.0;
        let scale = (rect.width().min(rect.height()) / world_range) * 0.9;
        let origin = rect.center() + egui::vec2(0.0, rect.height() * 0.3);
        let to_screen = |p: glam::Vec3| origin + egui::vec2(p.x * scale, -p.y * scale);

        painter.line_segment(
            [
                egui::pos2(rect.left(), origin.y),
                egui::pos2(rect.right(), origin.y),
            ],
            egui::Stroke::new(1.0, egui::Color32::DARK_GREEN),
        );

        if snapshot.curve.len() > 1 {
            let points: Vec<egui::Pos2> = snapshot.curve.iter().map(|p| to_screen(*p)).collect();
            painter.add(egui::Shape::line(
                points,
                egui::Stroke::new(1.5, egui::Color32::LIGHT_RED),
            ));
        }
        for point in self.state.spline.control_points() {
            painter.circle_stroke(
                to_screen(*point),
                3.0,
                egui::Stroke::new(1.0, egui::Color32::RED),
            );
        }

        for spring in &snapshot.springs {
            painter.line_segment(
                [to_screen(spring.a), to_screen(spring.b)],
                egui::Stroke::new(1.0, egui::Color32::GRAY),
            );
        }

        for particle in &snapshot.particles {
            let screen_pos = to_screen(particle.position);
            let radius = (particle.mass.sqrt() * scale * 0.3).clamp(3.0, 15.0);
            let (fill, outline) = if particle.driven {
                (egui::Color32::YELLOW, egui::Color32::GOLD)
            } else {
                (egui::Color32::LIGHT_BLUE, egui::Color32::BLUE)
            };
            painter.circle_filled(screen_pos, radius, fill);
            painter.circle_stroke(screen_pos, radius, egui::Stroke::new(1.0, outline));
        }
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_file_changes();

        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button(if self.playing { "⏸ Pause" } else { "▶ Play" }).clicked() {
                    self.playing = !self.playing;
                }

                if ui.button("⏮ Reset").clicked() {
                    self.reload_state();
                    self.playing = false;
                }

                if ui.button("⏭ Step").clicked() {
                    self.state.advance_frame(STEP_FRAME_DT);
                }

                ui.separator();

                ui.label("Speed:");
                ui.add(egui::Slider::new(&mut self.speed_multiplier, 0.1..=4.0));

                ui.separator();

                ui.label(format!(
                    "t = {:.3}s  {}  dt {}",
                    self.state.time(),
                    self.state.system.method(),
                    self.state.dt()
                ));
                ui.label(format!("arc length {:.3}", self.state.spline.arc_length()));
            });
        });

        if self.last_load_error.is_some() || !self.report.is_empty() {
            egui::TopBottomPanel::bottom("errors").show(ctx, |ui| {
                ui.set_max_height(120.0);
                egui::ScrollArea::vertical().show(ui, |ui| {
                    if let Some(ref error) = self.last_load_error {
                        ui.label(
                            egui::RichText::new(format!("Error: {}", error))
                                .color(egui::Color32::RED),
                        );
                    }
                    for diagnostic in &self.report {
                        let color = match diagnostic.severity {
                            DiagnosticSeverity::Error => egui::Color32::RED,
                            _ => egui::Color32::YELLOW,
                        };
                        ui.label(egui::RichText::new(diagnostic.to_string()).color(color));
                    }
                });
            });
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_scene(ui);
        });

        if self.playing {
            let frame_dt = ctx.input(|i| i.stable_dt);
            self.state.advance_scaled(frame_dt, self.speed_multiplier);
            if !self.state.system.is_finite() {
                self.last_load_error = Some("simulation diverged; try a smaller timestep".into());
                self.playing = false;
            }
            ctx.request_repaint();
        }
    }
}
