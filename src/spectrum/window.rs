//! Rolling sample window fed by the capture adapter.
//!
//! Holds the most recent `capacity` interleaved samples of the stream. New
//! packets logically shift the window left and land in the tail. Storage is a
//! ring buffer with a write cursor, so an append costs O(packet) rather than a
//! memmove of the whole window; every read goes through the cursor and comes
//! back oldest-first.

use rustfft::num_complex::Complex32;

use super::error::SpectrumError;
use super::transform::is_power_of_two;

/// Fixed-capacity, chronologically ordered window of interleaved audio samples.
///
/// Channel `c` of an `n`-channel stream occupies logical indices
/// `c, c + n, c + 2n, ...`. Samples are real; the imaginary part is implied zero
/// and only materialized by [`SampleWindow::extract_channel`].
#[derive(Debug, Clone)]
pub struct SampleWindow {
    /// Ring storage, physical order
    data: Vec<f32>,
    /// Physical index of the oldest sample (also the next write position)
    cursor: usize,
    /// Total samples appended since construction, silence included
    appended: u64,
}

impl SampleWindow {
    /// Allocates a zero-filled window.
    ///
    /// # Errors
    /// - If `capacity` is not a power of two
    pub fn new(capacity: usize) -> Result<Self, SpectrumError> {
        if !is_power_of_two(capacity) {
            return Err(SpectrumError::NotPowerOfTwo(capacity));
        }

        Ok(Self {
            data: vec![0.0; capacity],
            cursor: 0,
            appended: 0,
        })
    }

    /// Number of samples the window holds. Never changes.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Total samples pushed through the window, including silent packets.
    pub fn samples_appended(&self) -> u64 {
        self.appended
    }

    /// Shifts the window left by `raw.len()` and writes `raw` into the tail.
    ///
    /// An empty packet is a no-op. A packet at least as long as the window
    /// replaces it with the packet's last `capacity` samples. `channel_stride`
    /// is the interleave width of the packet; a packet that is not a whole
    /// number of frames is still appended, but logged.
    pub fn append(&mut self, raw: &[f32], channel_stride: usize) {
        if raw.is_empty() || self.data.is_empty() {
            return;
        }

        if channel_stride > 1 && raw.len() % channel_stride != 0 {
            tracing::warn!(
                "Packet of {} samples is not a whole number of {}-channel frames",
                raw.len(),
                channel_stride
            );
        }

        let capacity = self.data.len();
        self.appended += raw.len() as u64;

        if raw.len() >= capacity {
            self.data.copy_from_slice(&raw[raw.len() - capacity..]);
            self.cursor = 0;
            return;
        }

        let head = (capacity - self.cursor).min(raw.len());
        self.data[self.cursor..self.cursor + head].copy_from_slice(&raw[..head]);
        self.data[..raw.len() - head].copy_from_slice(&raw[head..]);
        self.cursor = (self.cursor + raw.len()) % capacity;
    }

    /// Advances the window by `len` zero samples.
    ///
    /// Silent packets still move the window so its timebase keeps pace with the
    /// stream.
    pub fn append_silence(&mut self, len: usize) {
        if len == 0 || self.data.is_empty() {
            return;
        }

        let capacity = self.data.len();
        self.appended += len as u64;

        if len >= capacity {
            self.data.fill(0.0);
            self.cursor = 0;
            return;
        }

        let head = (capacity - self.cursor).min(len);
        self.data[self.cursor..self.cursor + head].fill(0.0);
        self.data[..len - head].fill(0.0);
        self.cursor = (self.cursor + len) % capacity;
    }

    /// Iterates the window oldest-first.
    pub fn iter(&self) -> impl Iterator<Item = &f32> + '_ {
        self.data[self.cursor..]
            .iter()
            .chain(self.data[..self.cursor].iter())
    }

    /// Copies the window out in chronological order.
    pub fn to_vec(&self) -> Vec<f32> {
        self.iter().copied().collect()
    }

    /// Extracts one channel of the interleaved window as a complex sequence.
    ///
    /// Returns `capacity / channels` samples, oldest-first, imaginary part zero.
    ///
    /// # Errors
    /// - If `channels` is zero or does not evenly divide the capacity
    /// - If `channel >= channels`
    pub fn extract_channel(
        &self,
        channel: usize,
        channels: usize,
    ) -> Result<Vec<Complex32>, SpectrumError> {
        if channels == 0 || self.capacity() % channels != 0 {
            return Err(SpectrumError::InvalidChannelCount {
                channels,
                capacity: self.capacity(),
            });
        }
        if channel >= channels {
            return Err(SpectrumError::InvalidChannel { channel, channels });
        }

        Ok(self
            .iter()
            .skip(channel)
            .step_by(channels)
            .map(|&s| Complex32::new(s, 0.0))
            .collect())
    }
}
