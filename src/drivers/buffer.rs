use std::collections::VecDeque;
use serde::{Deserialize, Serialize};
use crate::drivers::ViewerError;
/// Published view of the rolling buffer, ready to plot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    /// Sample numbers, contiguous and ending at `tick_count`.
    pub index: Vec<u64>,
    pub data: Vec<f64>,
    pub tick_count: u64,
}
impl Frame {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    pub fn points(&self) -> Vec<[f64; 2]> {
        self.index
            .iter()
            .zip(&self.data)
            .map(|(&i, &v)| [i as f64, v])
            .collect()
    }
}
/// How the buffer is cut back after a block is appended.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TruncationMode {
    /// Never hold more than `max_num_points` samples.
    #[default]
    Exact,
    /// Keep `max_num_points - 1` prior samples and append the whole block,
    /// so a block of `k` samples can leave up to `max_num_points + k - 1`.
    Legacy,
}
/// Rolling window over the most recent samples of one channel.
pub struct RollingBuffer {
    data: VecDeque<f64>,
    tick_count: u64,
    max_num_points: usize,
    mode: TruncationMode,
}
impl RollingBuffer {
    pub fn new(max_num_points: usize, mode: TruncationMode) -> Result<Self, ViewerError> {
        if max_num_points == 0 {
            return Err(ViewerError::InvalidConfig(
                "max_num_points must be at least 1".into(),
            ));
        }
        Ok(Self {
            data: VecDeque::with_capacity(max_num_points),
            tick_count: 0,
            max_num_points,
            mode,
        })
    }
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn max_num_points(&self) -> usize {
        self.max_num_points
    }
    /// Applies a new window size right away, dropping the oldest samples if needed.
    pub fn set_max_num_points(&mut self, max_num_points: usize) -> Result<(), ViewerError> {
        if max_num_points == 0 {
            return Err(ViewerError::InvalidConfig(
                "max_num_points must be at least 1".into(),
            ));
        }
        self.max_num_points = max_num_points;
        self.trim_to(max_num_points);
        Ok(())
    }
    pub fn push_block(&mut self, block: &[f64]) {
        self.tick_count += block.len() as u64;
        self.trim_to(self.max_num_points - 1);
        self.data.extend(block.iter().copied());
        if self.mode == TruncationMode::Exact {
            self.trim_to(self.max_num_points);
        }
    }
    pub fn snapshot(&self) -> Frame {
        let first = self.tick_count + 1 - self.data.len() as u64;
        Frame {
            index: (first..=self.tick_count).take(self.data.len()).collect(),
            data: self.data.iter().copied().collect(),
            tick_count: self.tick_count,
        }
    }
    fn trim_to(&mut self, keep: usize) {
        let excess = self.data.len().saturating_sub(keep);
        self.data.drain(..excess);
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn single_samples_roll_through_window() {
        let mut buffer = RollingBuffer::new(3, TruncationMode::Exact).unwrap();
        let expected = [
            (vec![5.0], vec![1]),
            (vec![5.0, 6.0], vec![1, 2]),
            (vec![5.0, 6.0, 7.0], vec![1, 2, 3]),
            (vec![6.0, 7.0, 8.0], vec![2, 3, 4]),
        ];
        for (value, (data, index)) in [5.0, 6.0, 7.0, 8.0].into_iter().zip(expected) {
            buffer.push_block(&[value]);
            let frame = buffer.snapshot();
            assert_eq!(frame.data, data);
            assert_eq!(frame.index, index);
        }
        assert_eq!(buffer.tick_count(), 4);
    }
    #[test]
    fn legacy_mode_overshoots_by_block_size() {
        let mut buffer = RollingBuffer::new(3, TruncationMode::Legacy).unwrap();
        buffer.push_block(&[1.0, 2.0, 3.0]);
        buffer.push_block(&[4.0, 5.0, 6.0, 7.0]);
        let frame = buffer.snapshot();
        assert_eq!(frame.data, vec![2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        assert_eq!(frame.index, vec![2, 3, 4, 5, 6, 7]);
        assert_eq!(frame.tick_count, 7);
    }
    #[test]
    fn exact_mode_never_exceeds_window() {
        let mut buffer = RollingBuffer::new(4, TruncationMode::Exact).unwrap();
        let mut total = 0u64;
        for k in [1usize, 7, 0, 3, 12, 2] {
            let block: Vec<f64> = (0..k).map(|i| (total + i as u64) as f64).collect();
            total += k as u64;
            buffer.push_block(&block);
            let frame = buffer.snapshot();
            assert_eq!(frame.tick_count, total);
            assert_eq!(frame.data.len(), (total as usize).min(4));
            assert_eq!(frame.index.len(), frame.data.len());
            assert_eq!(frame.index.last().copied(), Some(total));
            // data holds the sample numbers themselves, shifted by one
            assert!(frame.index.iter().zip(&frame.data).all(|(&i, &v)| v == (i - 1) as f64));
        }
    }
    #[test]
    fn single_sample_blocks_stay_bounded_in_both_modes() {
        for mode in [TruncationMode::Exact, TruncationMode::Legacy] {
            let mut buffer = RollingBuffer::new(5, mode).unwrap();
            for i in 0..20 {
                buffer.push_block(&[i as f64]);
                assert!(buffer.len() <= 5);
            }
        }
    }
    #[test]
    fn empty_state_and_empty_blocks() {
        let mut buffer = RollingBuffer::new(2, TruncationMode::Exact).unwrap();
        assert!(buffer.snapshot().is_empty());
        buffer.push_block(&[]);
        let frame = buffer.snapshot();
        assert_eq!(frame.tick_count, 0);
        assert!(frame.index.is_empty());
    }
    #[test]
    fn shrinking_window_trims_oldest() {
        let mut buffer = RollingBuffer::new(10, TruncationMode::Exact).unwrap();
        buffer.push_block(&[1.0, 2.0, 3.0, 4.0]);
        buffer.set_max_num_points(2).unwrap();
        let frame = buffer.snapshot();
        assert_eq!(frame.data, vec![3.0, 4.0]);
        assert_eq!(frame.index, vec![3, 4]);
        assert!(buffer.set_max_num_points(0).is_err());
        assert!(RollingBuffer::new(0, TruncationMode::Legacy).is_err());
    }
}
