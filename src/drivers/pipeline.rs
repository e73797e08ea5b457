use crate::drivers::buffer::{Frame, RollingBuffer, TruncationMode};
use crate::drivers::error::ViewerError;
use crate::drivers::source::SampleSource;
/// Polls a source into a rolling buffer and exposes ready-to-plot frames.
pub struct Accumulator<S: SampleSource> {
    source: S,
    buffer: RollingBuffer,
}
impl<S: SampleSource> Accumulator<S> {
    pub fn new(
        source: S,
        max_num_points: usize,
        mode: TruncationMode,
    ) -> Result<Self, ViewerError> {
        Ok(Self {
            source,
            buffer: RollingBuffer::new(max_num_points, mode)?,
        })
    }
    /// One update: fetch, append, truncate, publish. A failed fetch leaves
    /// the buffer untouched.
    pub fn tick(&mut self) -> Result<Frame, ViewerError> {
        let block = self.source.fetch()?;
        self.buffer.push_block(&block);
        log::trace!(
            "tick: +{} samples, {} buffered, count {}",
            block.len(),
            self.buffer.len(),
            self.buffer.tick_count()
        );
        Ok(self.buffer.snapshot())
    }
    pub fn latest_frame(&self) -> Frame {
        self.buffer.snapshot()
    }
    pub fn max_num_points(&self) -> usize {
        self.buffer.max_num_points()
    }
    pub fn set_max_num_points(&mut self, max_num_points: usize) -> Result<Frame, ViewerError> {
        self.buffer.set_max_num_points(max_num_points)?;
        log::info!("window set to {max_num_points} points");
        Ok(self.buffer.snapshot())
    }
    pub fn source(&self) -> &S {
        &self.source
    }
}
