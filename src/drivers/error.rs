use thiserror::Error;
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("unsupported data type code {0}")]
    UnsupportedDataType(u32),
    #[error("Failed to retrieve header!")]
    HeaderUnavailable,
    #[error("buffer refused data request for samples {begin}..={end}")]
    DataUnavailable { begin: u32, end: u32 },
    #[error("channel {channel} out of range: block has {available} channel(s)")]
    ChannelOutOfRange { channel: usize, available: usize },
    #[error("invalid settings: {0}")]
    InvalidConfig(String),
    #[error("failed to render plot: {0}")]
    Plot(String),
}
impl ViewerError {
    /// Errors that end the whole session rather than just the update loop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ViewerError::HeaderUnavailable)
    }
}
impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for ViewerError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        ViewerError::Plot(format!("{value:?}"))
    }
}
impl From<image::ImageError> for ViewerError {
    fn from(value: image::ImageError) -> Self {
        ViewerError::Plot(value.to_string())
    }
}
