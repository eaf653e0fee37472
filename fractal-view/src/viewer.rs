//! Interactive fractal tree viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns a [`FractalTree`] and
//! drives it once per frame, and [`FrameCapture`], the
//! [`InstancePublisher`] implementation that stands in for the GPU
//! draw-submission collaborator: it receives each level's finished
//! instance matrices and paints them as an orthographic front view.

use eframe::App;
use fractal_core::config::{Config, UpdateMode};
use fractal_core::publish::{InstancePublisher, LevelDraw, MeshKind};
use fractal_core::transform::{Bounds, PackedTransform};
use fractal_core::tree::FractalTree;
use fractal_core::types;
use fractal_core::update::RootPose;
use glam::{Quat, Vec3};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Gradient endpoint for the trunk levels.
const BRANCH_COLOR_A: egui::Color32 = egui::Color32::from_rgb(126, 82, 44);
/// Gradient endpoint for the outer levels.
const BRANCH_COLOR_B: egui::Color32 = egui::Color32::from_rgb(222, 186, 132);
/// Distinct color for the leaf-mesh level.
const LEAF_COLOR: egui::Color32 = egui::Color32::from_rgb(92, 182, 72);

/// One captured level: resolved draw color plus the projected-instance
/// source data (world position and uniform scale per node).
struct LevelSprites {
    color: egui::Color32,
    instances: Vec<(Vec3, f32)>,
}

/// Per-frame publisher scratch owned by the viewer.
///
/// Reused across frames; level vectors keep their capacity so steady
/// state publishing does not reallocate.
#[derive(Default)]
struct FrameCapture {
    bounds: Option<Bounds>,
    levels: Vec<LevelSprites>,
}

/// Resolves a level's draw metadata to a flat color, standing in for
/// the gradient sampling a shader would do.
fn level_color(draw: &LevelDraw) -> egui::Color32 {
    match draw.mesh {
        MeshKind::Leaf => LEAF_COLOR,
        MeshKind::Branch => {
            let t = draw.gradient_position;
            let lerp = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t) as u8;
            egui::Color32::from_rgb(
                lerp(BRANCH_COLOR_A.r(), BRANCH_COLOR_B.r()),
                lerp(BRANCH_COLOR_A.g(), BRANCH_COLOR_B.g()),
                lerp(BRANCH_COLOR_A.b(), BRANCH_COLOR_B.b()),
            )
        }
    }
}

impl InstancePublisher for FrameCapture {
    fn begin_frame(&mut self, bounds: Bounds, depth: usize) {
        self.bounds = Some(bounds);
        self.levels.truncate(depth);
        for level in &mut self.levels {
            level.instances.clear();
        }
        while self.levels.len() < depth {
            self.levels.push(LevelSprites {
                color: egui::Color32::WHITE,
                instances: Vec::new(),
            });
        }
    }

    fn submit_level(&mut self, draw: &LevelDraw, matrices: &[PackedTransform]) {
        let sprites = &mut self.levels[draw.level];
        sprites.color = level_color(draw);
        sprites.instances.reserve(matrices.len());
        for matrix in matrices {
            sprites
                .instances
                .push((matrix.translation(), matrix.uniform_scale()));
        }
    }
}

/// Main application state for the interactive viewer.
///
/// [`Viewer`] glues together:
/// - The kernel: [`FractalTree`] plus the pending [`Config`] edits.
/// - The publisher boundary: [`FrameCapture`].
/// - UI state (pan/zoom, run control, root pose sliders, timing).
///
/// The typical per-frame update is:
/// 1. Handle UI interactions / input.
/// 2. If `running`, advance the root yaw and call [`FractalTree::update`].
/// 3. Publish into [`FrameCapture`] and paint the captured instances.
pub struct Viewer {
    tree: FractalTree,
    cfg_edit: Config,
    seed: u64,
    capture: FrameCapture,
    last_error: Option<String>,

    running: bool,
    zoom: f32,
    pan: egui::Vec2,

    root_yaw: f32,
    turn_speed: f32,
    root_tilt: f32,
    root_scale: f32,

    last_update_ms: f64,
}

impl Viewer {
    /// Creates a viewer with a default-configured tree.
    pub fn new() -> Self {
        let cfg = Config::default();
        let seed = 0;
        let mut rng = StdRng::seed_from_u64(seed);
        // Config::default() always validates.
        let tree = FractalTree::build(cfg, &mut rng).expect("default config must validate");

        Self {
            tree,
            cfg_edit: cfg,
            seed,
            capture: FrameCapture::default(),
            last_error: None,
            running: true,
            zoom: 90.0,
            pan: egui::vec2(0.0, 120.0),
            root_yaw: 0.0,
            turn_speed: 0.15,
            root_tilt: 0.0,
            root_scale: 1.0,
            last_update_ms: 0.0,
        }
    }

    /// The owning-object pose fed to the kernel this frame.
    fn root_pose(&self) -> RootPose {
        RootPose {
            position: Vec3::ZERO,
            rotation: Quat::from_rotation_z(self.root_tilt) * Quat::from_rotation_y(self.root_yaw),
            scale: self.root_scale,
        }
    }

    /// Advances the animation and recomputes every instance matrix.
    fn step(&mut self, delta_time: f32) {
        self.root_yaw += self.turn_speed * delta_time;
        let pose = self.root_pose();

        let started = std::time::Instant::now();
        self.tree.update(delta_time, &pose);
        self.last_update_ms = started.elapsed().as_secs_f64() * 1000.0;

        self.tree.publish(&mut self.capture);
    }

    /// Applies the pending configuration edits.
    ///
    /// On validation failure the previous tree keeps rendering and the
    /// error is surfaced in the config panel.
    fn apply_config(&mut self) {
        let mut rng = StdRng::seed_from_u64(self.seed);
        match self.tree.rebuild(self.cfg_edit, &mut rng) {
            Ok(()) => self.last_error = None,
            Err(e) => {
                log::warn!("rebuild rejected: {e}");
                self.last_error = Some(e.to_string());
            }
        }
    }

    /// Converts a world-space position to screen-space.
    ///
    /// An orthographic front view: the world `z` axis is dropped, `x`
    /// is scaled by `zoom` and offset by `pan`, and the y-axis is
    /// flipped so that positive y goes up in world space.
    fn world_to_screen(&self, p: Vec3, rect: egui::Rect) -> egui::Pos2 {
        let center = rect.center();
        egui::pos2(
            center.x + p.x * self.zoom + self.pan.x,
            center.y - p.y * self.zoom + self.pan.y,
        )
    }

    /// Helper to draw a labeled `f32` [`egui::DragValue`].
    fn labeled_drag_f32(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut f32,
        range: std::ops::RangeInclusive<f32>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Builds the top panel UI (run controls, root pose, zoom).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .button(if self.running { "⏸ Pause" } else { "▶ Run" })
                    .clicked()
                {
                    self.running = !self.running;
                }

                if ui.button("Step").clicked() {
                    self.step(1.0 / 60.0);
                }

                ui.separator();
                ui.add(egui::Slider::new(&mut self.turn_speed, -1.0..=1.0).text("Turn"));
                ui.add(egui::Slider::new(&mut self.root_tilt, -0.8..=0.8).text("Tilt"));
                ui.add(egui::Slider::new(&mut self.root_scale, 0.2..=3.0).text("Scale"));

                ui.separator();
                ui.add(egui::Slider::new(&mut self.zoom, 10.0..=400.0).text("Zoom"));
            });
        });
    }

    /// Builds the bottom status bar (instance counts, update timing).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("update = {:.2} ms", self.last_update_ms));
                ui.separator();
                ui.label(format!("depth = {}", self.tree.depth()));
                ui.label(format!(
                    "instances = {}",
                    types::total_nodes(self.tree.depth())
                ));
            });
        });
    }

    /// Builds the right-hand configuration panel.
    ///
    /// Edits accumulate in `cfg_edit` and only take effect through the
    /// Rebuild button, since a depth or range change requires a full
    /// teardown and reallocation of the tree.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.heading("Config");

                ui.separator();
                ui.label("Depth");
                ui.horizontal(|ui| {
                    ui.label("depth:");
                    let mut depth = self.cfg_edit.depth as u32;
                    ui.add(
                        egui::DragValue::new(&mut depth)
                            .range(types::MIN_DEPTH as u32..=types::MAX_DEPTH as u32)
                            .speed(0.1),
                    );
                    self.cfg_edit.depth = depth as usize;
                });

                ui.separator();
                ui.label("Update mode");
                ui.horizontal(|ui| {
                    if ui
                        .selectable_label(self.cfg_edit.mode == UpdateMode::Rigid, "Rigid")
                        .clicked()
                    {
                        self.cfg_edit.mode = UpdateMode::Rigid;
                    }
                    if ui
                        .selectable_label(self.cfg_edit.mode == UpdateMode::Sagging, "Sagging")
                        .clicked()
                    {
                        self.cfg_edit.mode = UpdateMode::Sagging;
                    }
                });

                ui.separator();
                ui.label("Spin velocity (rad/s)");
                Self::labeled_drag_f32(
                    ui,
                    "min:",
                    &mut self.cfg_edit.spin_velocity.min,
                    0.0..=4.0,
                    0.01,
                );
                Self::labeled_drag_f32(
                    ui,
                    "max:",
                    &mut self.cfg_edit.spin_velocity.max,
                    0.0..=4.0,
                    0.01,
                );

                ui.horizontal(|ui| {
                    ui.label("reverse chance:");
                    let mut chance = self.cfg_edit.reverse_spin_chance as f32;
                    ui.add(
                        egui::DragValue::new(&mut chance)
                            .range(0.0..=1.0)
                            .speed(0.01),
                    );
                    self.cfg_edit.reverse_spin_chance = chance as f64;
                });

                ui.separator();
                ui.label("Max sag angle (rad)");
                Self::labeled_drag_f32(
                    ui,
                    "min:",
                    &mut self.cfg_edit.max_sag_angle.min,
                    0.0..=1.5,
                    0.01,
                );
                Self::labeled_drag_f32(
                    ui,
                    "max:",
                    &mut self.cfg_edit.max_sag_angle.max,
                    0.0..=1.5,
                    0.01,
                );

                ui.separator();
                ui.label("Seed");
                ui.horizontal(|ui| {
                    ui.label("seed:");
                    ui.add(egui::DragValue::new(&mut self.seed).speed(1.0));
                });

                ui.separator();
                if ui.button("Rebuild").clicked() {
                    self.apply_config();
                }
                if ui.button("Reset cfg to default").clicked() {
                    self.cfg_edit = Config::default();
                }

                if let Some(error) = &self.last_error {
                    ui.separator();
                    ui.colored_label(egui::Color32::LIGHT_RED, error.as_str());
                }
            });
    }

    /// Builds the central panel where the captured instances are drawn.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
            let rect = response.rect;
            let painter = ui.painter_at(rect);

            // Pan with drag.
            if response.dragged() {
                self.pan += response.drag_delta();
            }

            // Zoom with scroll.
            let scroll = ui.ctx().input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                let factor = (1.0 + scroll * 0.001).clamp(0.5, 2.0);
                self.zoom = (self.zoom * factor).clamp(10.0, 400.0);
            }

            // Paint trunk levels first so the small outer levels stay
            // visible on top.
            for level in &self.capture.levels {
                for &(position, scale) in &level.instances {
                    let p = self.world_to_screen(position, rect);
                    let r = (0.5 * scale * self.zoom).max(1.0);
                    painter.circle_filled(p, r, level.color);
                }
            }

            if self.running {
                let delta_time = ctx.input(|i| i.stable_dt).min(0.1);
                self.step(delta_time);
                ctx.request_repaint();
            }
        });
    }
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
    }
}
