// src/drivers/mod.rs
// 数据采集、滚动缓冲与绘图
pub mod buffer;
pub mod error;
pub mod fieldtrip;
pub mod pipeline;
pub mod plot;
pub mod source;
// 公开导出常用类型
pub use buffer::{Frame, TruncationMode};
pub use error::ViewerError;
pub use pipeline::Accumulator;
pub use plot::{save_frame_png, PlotStyle, PlotType};
pub use source::{BufferSource, SampleSource, SimulatedSource};
