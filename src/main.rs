// src/main.rs
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]
mod drivers;
mod gui;
mod settings;
mod ticker;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use anyhow::{anyhow, Context, Result};
use eframe::egui;
use drivers::{Accumulator, BufferSource, SampleSource, SimulatedSource};
use settings::{SourceMode, ViewerSettings};
// 按配置打开数据源；连接失败直接退出
fn open_source(settings: &ViewerSettings) -> Result<Box<dyn SampleSource>> {
    let source: Box<dyn SampleSource> = match settings.source {
        SourceMode::Buffer => Box::new(
            BufferSource::connect(
                &settings.host,
                settings.port,
                settings.block_size,
                settings.channel,
            )
            .with_context(|| {
                format!(
                    "could not connect to FieldTrip buffer at {}:{}",
                    settings.host, settings.port
                )
            })?,
        ),
        SourceMode::Simulation => {
            let sim = &settings.simulation;
            Box::new(SimulatedSource::new(
                sim.sample_rate_hz,
                sim.frequency_hz,
                sim.amplitude,
                sim.noise,
            ))
        }
    };
    log::info!("opened {}", source.describe());
    Ok(source)
}
// 入口函数
fn main() -> Result<()> {
    env_logger::init();
    let settings = ViewerSettings::load().context("failed to load settings")?;
    let source = open_source(&settings)?;
    let accumulator = Accumulator::new(source, settings.max_num_points, settings.truncation)?;
    let fatal = Arc::new(AtomicBool::new(false));
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([800.0, 500.0])
            .with_title("FieldTrip stream"),
        ..Default::default()
    };
    let app_fatal = Arc::clone(&fatal);
    eframe::run_native(
        "ftviewer",
        options,
        Box::new(move |cc| {
            Box::new(gui::ViewerApp::new(cc, &settings, accumulator, app_fatal))
        }),
    )
    .map_err(|e| anyhow!("viewer window failed: {e}"))?;
    if fatal.load(Ordering::SeqCst) {
        std::process::exit(1);
    }
    Ok(())
}
