use std::io::Cursor;
use std::path::Path;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use crate::drivers::buffer::Frame;
use crate::drivers::error::ViewerError;
/// How samples are drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotType {
    #[default]
    Line,
    Scatter,
}
impl PlotType {
    pub fn label(self) -> &'static str {
        match self {
            PlotType::Line => "line",
            PlotType::Scatter => "scatter",
        }
    }
}
#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    pub padding: RGBColor,
    pub color: RGBColor,
    pub marker_size: u32,
    pub x_label: String,
    pub y_label: String,
}
impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 800,
            height: 380,
            background: WHITE,
            padding: RGBColor(211, 211, 211),
            color: BLUE,
            marker_size: 2,
            x_label: "Time".into(),
            y_label: "Signal".into(),
        }
    }
}
pub fn render_frame_png(
    frame: &Frame,
    plot_type: PlotType,
    style: &PlotStyle,
) -> Result<Vec<u8>, ViewerError> {
    if frame.is_empty() {
        return Err(ViewerError::Plot("frame has no samples".into()));
    }
    let points: Vec<(f64, f64)> = frame
        .points()
        .into_iter()
        .filter(|p| p[1].is_finite())
        .map(|p| (p[0], p[1]))
        .collect();
    if points.is_empty() {
        return Err(ViewerError::Plot("frame has no finite samples".into()));
    }
    let x_min = points[0].0;
    let x_max = points[points.len() - 1].0.max(x_min + 1.0);
    let (y_min, y_max) = points
        .iter()
        .fold((f64::MAX, f64::MIN), |(lo, hi), p| (lo.min(p.1), hi.max(p.1)));
    let y_bounds = if (y_max - y_min).abs() < f64::EPSILON {
        (y_min - 1.0, y_max + 1.0)
    } else {
        (y_min, y_max)
    };
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.padding)?;
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .set_label_area_size(LabelAreaPosition::Left, 55)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d(x_min..x_max, y_bounds.0..y_bounds.1)?;
        chart.plotting_area().fill(&style.background)?;
        chart
            .configure_mesh()
            .x_desc(style.x_label.as_str())
            .y_desc(style.y_label.as_str())
            .light_line_style(&BLACK.mix(0.05))
            .draw()?;
        let series = points.iter().copied();
        match plot_type {
            PlotType::Line => {
                chart.draw_series(LineSeries::new(series, &style.color))?;
            }
            PlotType::Scatter => {
                let color = style.color;
                let size = style.marker_size;
                chart.draw_series(series.map(|p| Circle::new(p, size, color.filled())))?;
            }
        }
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
pub fn save_frame_png(
    frame: &Frame,
    plot_type: PlotType,
    style: &PlotStyle,
    path: &Path,
) -> Result<(), ViewerError> {
    let png = render_frame_png(frame, plot_type, style)?;
    std::fs::write(path, png)?;
    log::info!("saved chart to {}", path.display());
    Ok(())
}
fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, ViewerError> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| ViewerError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    let dynamic = DynamicImage::ImageRgb8(image);
    dynamic.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn empty_frame_is_rejected() {
        let err = render_frame_png(&Frame::default(), PlotType::Line, &PlotStyle::default());
        assert!(matches!(err, Err(ViewerError::Plot(_))));
    }
    #[test]
    fn flat_single_point_frame_still_renders() {
        let frame = Frame {
            index: vec![7],
            data: vec![3.0],
            tick_count: 7,
        };
        let style = PlotStyle {
            width: 200,
            height: 120,
            ..PlotStyle::default()
        };
        let png = render_frame_png(&frame, PlotType::Scatter, &style).unwrap();
        assert!(!png.is_empty());
    }
    fn frame_of(data: Vec<f64>) -> Frame {
        Frame {
            index: (1..=data.len() as u64).collect(),
            tick_count: data.len() as u64,
            data,
        }
    }
    #[test]
    fn non_finite_samples_are_skipped() {
        let style = PlotStyle {
            width: 200,
            height: 120,
            ..PlotStyle::default()
        };
        for data in [vec![1.0, f64::INFINITY], vec![1.0, f64::NAN, 2.0, f64::NEG_INFINITY]] {
            for plot_type in [PlotType::Line, PlotType::Scatter] {
                let png = render_frame_png(&frame_of(data.clone()), plot_type, &style).unwrap();
                assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
            }
        }
    }
    #[test]
    fn frame_without_finite_samples_is_rejected() {
        for data in [vec![f64::NAN, f64::NAN], vec![f64::INFINITY]] {
            let err = render_frame_png(&frame_of(data), PlotType::Line, &PlotStyle::default());
            assert!(matches!(err, Err(ViewerError::Plot(msg)) if msg.contains("finite")));
        }
    }
}
