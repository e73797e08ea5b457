#[cfg(test)]
use std::collections::VecDeque;
use std::f64::consts::TAU;
use std::time::Instant;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use crate::drivers::fieldtrip::FieldTripClient;
use crate::drivers::ViewerError;
/// Number of most recent samples pulled from the buffer per poll.
pub const DEFAULT_BLOCK_SIZE: u32 = 500;
/// Something that yields the newest samples of one channel on demand.
pub trait SampleSource {
    fn fetch(&mut self) -> Result<Vec<f64>, ViewerError>;
    /// Human readable origin, shown in the status bar.
    fn describe(&self) -> String;
}
impl<S: SampleSource + ?Sized> SampleSource for Box<S> {
    fn fetch(&mut self) -> Result<Vec<f64>, ViewerError> {
        (**self).fetch()
    }
    fn describe(&self) -> String {
        (**self).describe()
    }
}
/// Polls a FieldTrip buffer for its latest `block_size` samples.
pub struct BufferSource {
    client: FieldTripClient,
    block_size: u32,
    channel: usize,
}
impl BufferSource {
    pub fn connect(
        host: &str,
        port: u16,
        block_size: u32,
        channel: usize,
    ) -> Result<Self, ViewerError> {
        let client = FieldTripClient::connect(host, port)?;
        Ok(Self::with_client(client, block_size, channel))
    }
    pub fn with_client(client: FieldTripClient, block_size: u32, channel: usize) -> Self {
        Self {
            client,
            block_size,
            channel,
        }
    }
}
/// Inclusive range covering the newest `block_size` samples of `total`.
pub fn latest_window(total: u32, block_size: u32) -> Option<(u32, u32)> {
    if total == 0 || block_size == 0 {
        return None;
    }
    Some((total.saturating_sub(block_size), total - 1))
}
impl SampleSource for BufferSource {
    fn fetch(&mut self) -> Result<Vec<f64>, ViewerError> {
        let header = self
            .client
            .get_header()?
            .ok_or(ViewerError::HeaderUnavailable)?;
        log::debug!(
            "buffer holds {} samples of {} channel(s) at {} Hz ({:?})",
            header.nsamples,
            header.nchans,
            header.fsample,
            header.data_type
        );
        let Some((begin, end)) = latest_window(header.nsamples, self.block_size) else {
            return Ok(Vec::new());
        };
        let block = self.client.get_data(begin, end)?;
        log::trace!("received {} samples of {:?}", block.nsamples, block.data_type);
        block.channel(self.channel)
    }
    fn describe(&self) -> String {
        format!("FieldTrip buffer {} (channel {})", self.client.peer(), self.channel)
    }
}
/// Noisy sine generator standing in for a live buffer.
pub struct SimulatedSource {
    sample_rate_hz: f64,
    frequency_hz: f64,
    amplitude: f64,
    noise: f64,
    emitted: u64,
    started_at: Instant,
    rng: StdRng,
}
impl SimulatedSource {
    pub fn new(sample_rate_hz: f64, frequency_hz: f64, amplitude: f64, noise: f64) -> Self {
        Self {
            sample_rate_hz,
            frequency_hz,
            amplitude,
            noise: noise.abs(),
            emitted: 0,
            started_at: Instant::now(),
            rng: StdRng::from_entropy(),
        }
    }
    #[cfg(test)]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }
    /// Produce exactly `n` consecutive samples.
    pub fn next_block(&mut self, n: usize) -> Vec<f64> {
        (0..n)
            .map(|_| {
                let t = self.emitted as f64 / self.sample_rate_hz;
                self.emitted += 1;
                let noise = if self.noise > 0.0 {
                    self.rng.gen_range(-self.noise..self.noise)
                } else {
                    0.0
                };
                self.amplitude * (TAU * self.frequency_hz * t).sin() + noise
            })
            .collect()
    }
}
impl SampleSource for SimulatedSource {
    fn fetch(&mut self) -> Result<Vec<f64>, ViewerError> {
        let due = (self.started_at.elapsed().as_secs_f64() * self.sample_rate_hz) as u64;
        let n = due.saturating_sub(self.emitted) as usize;
        Ok(self.next_block(n))
    }
    fn describe(&self) -> String {
        format!(
            "simulated {:.1} Hz sine @ {:.0} Hz",
            self.frequency_hz, self.sample_rate_hz
        )
    }
}
/// In-memory source for tests.
#[cfg(test)]
pub struct ManualSource {
    queue: VecDeque<Result<Vec<f64>, ViewerError>>,
}
#[cfg(test)]
impl ManualSource {
    pub fn new(blocks: impl IntoIterator<Item = Vec<f64>>) -> Self {
        Self {
            queue: blocks.into_iter().map(Ok).collect(),
        }
    }
    /// Queue a failure to be returned by the next fetch after the current blocks.
    pub fn then_fail(mut self, error: ViewerError) -> Self {
        self.queue.push_back(Err(error));
        self
    }
}
#[cfg(test)]
impl SampleSource for ManualSource {
    fn fetch(&mut self) -> Result<Vec<f64>, ViewerError> {
        self.queue.pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }
    fn describe(&self) -> String {
        format!("manual ({} queued)", self.queue.len())
    }
}
