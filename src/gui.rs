// src/gui.rs
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use eframe::egui;
use egui::{Color32, RichText};
use egui_plot::{Line, Plot, PlotPoints, Points};

use crate::drivers::{
    save_frame_png, Accumulator, Frame, PlotStyle, PlotType, SampleSource,
};
use crate::settings::ViewerSettings;
use crate::ticker::{settle, TickOutcome, Ticker};

const PLOT_HEIGHT: f32 = 380.0;

pub struct ViewerApp {
    // 数据
    accumulator: Accumulator<Box<dyn SampleSource>>,
    frame: Frame,

    // 定时器
    ticker: Ticker,

    // 显示
    plot_type: PlotType,
    style: PlotStyle,

    // 设置对话框 (Some = 打开)
    draft_max_points: Option<usize>,

    // 状态
    source_label: String,
    last_error: Option<String>,
    fatal: Arc<AtomicBool>,
}

impl ViewerApp {
    /// Builds the chart and arms the ticker. Called from the eframe creation
    /// callback, so nothing polls before the window exists.
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        settings: &ViewerSettings,
        accumulator: Accumulator<Box<dyn SampleSource>>,
        fatal: Arc<AtomicBool>,
    ) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::light());

        let source_label = accumulator.source().describe();
        let mut ticker = Ticker::new(settings.tick_interval());
        ticker.start(Instant::now());
        log::info!(
            "streaming from {source_label} every {:?}, window {} points",
            ticker.period(),
            accumulator.max_num_points()
        );

        Self {
            frame: accumulator.latest_frame(),
            accumulator,
            ticker,
            plot_type: settings.plot_type,
            style: PlotStyle::default(),
            draft_max_points: None,
            source_label,
            last_error: None,
            fatal,
        }
    }

    fn run_tick(&mut self, ctx: &egui::Context) {
        match settle(&mut self.ticker, self.accumulator.tick()) {
            TickOutcome::Published(frame) => self.frame = frame,
            TickOutcome::Fatal(msg) => {
                self.last_error = Some(msg);
                self.fatal.store(true, Ordering::SeqCst);
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
            TickOutcome::Stopped(msg) => self.last_error = Some(msg),
        }
    }

    fn save_png(&mut self) {
        let path = PathBuf::from(format!("ftviewer_{}.png", self.frame.tick_count));
        if let Err(err) = save_frame_png(&self.frame, self.plot_type, &self.style, &path) {
            log::warn!("could not save {}: {err}", path.display());
            self.last_error = Some(err.to_string());
        }
    }

    fn draw_chart(&self, ui: &mut egui::Ui) {
        let color = Color32::from_rgb(
            self.style.color.0,
            self.style.color.1,
            self.style.color.2,
        );
        let points: Vec<[f64; 2]> = self
            .frame
            .points()
            .into_iter()
            .filter(|p| p[1].is_finite())
            .collect();
        let points = PlotPoints::new(points);
        egui::Frame::canvas(ui.style()).show(ui, |ui| {
            Plot::new("stream_plot")
                .height(PLOT_HEIGHT)
                .x_axis_label(self.style.x_label.as_str())
                .y_axis_label(self.style.y_label.as_str())
                .auto_bounds_x()
                .auto_bounds_y()
                .show(ui, |plot_ui| match self.plot_type {
                    PlotType::Line => plot_ui.line(Line::new(points).color(color)),
                    PlotType::Scatter => plot_ui.points(
                        Points::new(points)
                            .radius(self.style.marker_size as f32)
                            .color(color),
                    ),
                });
        });
    }

    fn draw_settings(&mut self, ctx: &egui::Context) {
        let Some(mut draft) = self.draft_max_points else {
            return;
        };
        let mut apply = false;
        let mut close = false;
        egui::Window::new("Settings")
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label("Max num points");
                    ui.add(egui::DragValue::new(&mut draft).clamp_range(1..=1_000_000));
                });
                ui.horizontal(|ui| {
                    apply = ui.button("OK").clicked();
                    close = ui.button("Cancel").clicked();
                });
            });
        if apply {
            match self.accumulator.set_max_num_points(draft) {
                Ok(frame) => self.frame = frame,
                Err(err) => self.last_error = Some(err.to_string()),
            }
        }
        self.draft_max_points = if apply || close { None } else { Some(draft) };
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // 1. 定时刷新
        if self.ticker.poll(Instant::now()) {
            self.run_tick(ctx);
        }
        if let Some(wait) = self.ticker.remaining(Instant::now()) {
            ctx.request_repaint_after(wait);
        }

        // 2. 界面
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(self.source_label.as_str());
                ui.separator();
                ui.label(format!(
                    "ticks: {}  buffered: {}/{}",
                    self.frame.tick_count,
                    self.frame.data.len(),
                    self.accumulator.max_num_points()
                ));
                if !self.ticker.is_running() {
                    ui.label(RichText::new("stopped").color(Color32::RED));
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("OK").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                    if ui
                        .add_enabled(!self.frame.is_empty(), egui::Button::new("Save PNG"))
                        .clicked()
                    {
                        self.save_png();
                    }
                    if ui.button("Settings").clicked() && self.draft_max_points.is_none() {
                        self.draft_max_points = Some(self.accumulator.max_num_points());
                    }
                });
            });
            if let Some(err) = &self.last_error {
                ui.label(RichText::new(err).color(Color32::RED).small());
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_chart(ui);
            ui.add_space(6.0);
            ui.vertical_centered(|ui| {
                ui.horizontal(|ui| {
                    for plot_type in [PlotType::Line, PlotType::Scatter] {
                        ui.radio_value(&mut self.plot_type, plot_type, plot_type.label());
                    }
                });
            });
        });

        self.draw_settings(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.ticker.stop();
        log::info!(
            "viewer closed after {} samples",
            self.frame.tick_count
        );
    }
}
