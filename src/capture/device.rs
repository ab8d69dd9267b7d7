//! Audio device capture.
//!
//! Opens an input device (or an output device in loopback mode), converts
//! every callback buffer to interleaved f32 and hands it to the render loop as
//! a [`CapturePacket`] over a channel. The render loop polls and drains; the
//! sample window itself never crosses threads.

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::Arc;

use super::packet::CapturePacket;
use crate::config::CaptureSource;
use crate::spectrum::SampleWindow;

#[cfg(target_os = "linux")]
use std::fs::OpenOptions;
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

/// Packets the callback may queue ahead of the render loop. Device callbacks
/// usually cover 5-20ms, so this is several seconds of audio.
const PACKET_QUEUE_CAPACITY: usize = 512;

/// Largest silent packet sent in place of dropped audio.
const MAX_GAP_SAMPLES: usize = 1 << 20;

/// Streams audio packets from a device.
///
/// Features:
/// - Captures from a named, indexed or default device at its native format
/// - Loopback capture of output devices where the host supports it
/// - Pause support: packets keep flowing but are marked silent
pub struct AudioCapture {
    /// Device sample rate in frames per second
    sample_rate: u32,
    /// Interleaved channel count of the device stream
    channels: usize,
    /// Active stream (kept alive while capturing)
    stream: Option<cpal::Stream>,
    /// Receiving end of the callback channel
    receiver: Option<Receiver<CapturePacket>>,
    /// Whether incoming packets are marked silent
    is_paused: Arc<AtomicBool>,
    /// Device name or "default"
    device_name: String,
    source: CaptureSource,
}

/// Counts from one drain of the packet channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainStats {
    pub packets: usize,
    pub samples: usize,
    pub silent_packets: usize,
}

impl AudioCapture {
    /// Creates a capture for a device spec ("default", index or name).
    ///
    /// Nothing is opened until [`AudioCapture::start`].
    pub fn new(device_name: String, source: CaptureSource) -> Self {
        Self {
            sample_rate: 0,
            channels: 1,
            stream: None,
            receiver: None,
            is_paused: Arc::new(AtomicBool::new(false)),
            device_name,
            source,
        }
    }

    /// Opens the device and starts streaming packets.
    ///
    /// # Errors
    /// - If the device is not available
    /// - If the device's sample format is unsupported
    /// - If stream creation or start fails
    pub fn start(&mut self) -> Result<()> {
        let source = self.source;
        let device = suppress_alsa_warnings(|| {
            let host = cpal::default_host();
            find_device(&host, &self.device_name, source)
        })?;

        let device_name = device
            .name()
            .unwrap_or_else(|_| "Unknown device".to_string());
        tracing::info!("Capture device: {} ({})", device_name, source);

        let supported = match source {
            CaptureSource::Input => device.default_input_config()?,
            CaptureSource::Loopback => device.default_output_config()?,
        };
        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.config();

        self.sample_rate = config.sample_rate.0;
        self.channels = config.channels as usize;

        tracing::debug!(
            "Device configuration: {}Hz, {} channels, {:?}",
            self.sample_rate,
            self.channels,
            sample_format
        );

        let (sender, receiver) = mpsc::sync_channel(PACKET_QUEUE_CAPACITY);
        let paused = Arc::clone(&self.is_paused);

        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, sender, paused)?,
            SampleFormat::I16 => build_stream::<i16>(&device, &config, sender, paused)?,
            SampleFormat::U16 => build_stream::<u16>(&device, &config, sender, paused)?,
            other => return Err(anyhow!("Unsupported sample format: {other:?}")),
        };

        stream.play()?;
        self.stream = Some(stream);
        self.receiver = Some(receiver);

        tracing::debug!("Audio stream started");
        Ok(())
    }

    /// Drains every packet that has arrived since the last call into `window`.
    ///
    /// Never blocks. Returns what was drained.
    pub fn drain_into(&self, window: &mut SampleWindow) -> DrainStats {
        let mut stats = DrainStats::default();
        let Some(receiver) = self.receiver.as_ref() else {
            return stats;
        };

        for packet in receiver.try_iter() {
            if packet.is_empty() {
                continue;
            }
            packet.apply_to(window, self.channels);
            stats.packets += 1;
            stats.samples += packet.len();
            if packet.silent {
                stats.silent_packets += 1;
            }
        }
        stats
    }

    /// Stops the stream. Packets already queued are dropped with the receiver.
    pub fn stop(&mut self) {
        if self.stream.take().is_some() {
            tracing::debug!("Audio stream stopped");
        }
        self.receiver = None;
    }

    /// Returns the device sample rate (zero before `start`).
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Returns the interleaved channel count of the stream.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Toggles between paused and capturing states.
    pub fn toggle_pause(&self) {
        let paused = !self.is_paused.fetch_xor(true, Ordering::Relaxed);
        if paused {
            tracing::debug!("Capture paused");
        } else {
            tracing::debug!("Capture resumed");
        }
    }

    /// Returns whether packets are currently marked silent.
    pub fn is_paused(&self) -> bool {
        self.is_paused.load(Ordering::Relaxed)
    }
}

/// Builds an input stream converting samples of type `T` to f32 packets.
fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    sender: SyncSender<CapturePacket>,
    paused: Arc<AtomicBool>,
) -> Result<cpal::Stream>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let mut sender = PacketSender::new(sender);
    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            let samples: Vec<f32> = data.iter().map(|&s| s.to_sample::<f32>()).collect();
            let packet = if paused.load(Ordering::Relaxed) {
                CapturePacket::silent(samples)
            } else {
                CapturePacket::new(samples)
            };
            sender.send(packet);
        },
        |err| {
            tracing::error!("Audio stream error: {}", err);
        },
        None,
    )?;
    Ok(stream)
}

/// Callback side of the bounded packet queue.
///
/// A packet that finds the queue full is dropped and its length remembered.
/// Before the next packet goes out, one silent packet covering the dropped
/// samples is queued, so the window keeps pace with the stream.
struct PacketSender {
    sender: SyncSender<CapturePacket>,
    dropped: usize,
}

impl PacketSender {
    fn new(sender: SyncSender<CapturePacket>) -> Self {
        Self { sender, dropped: 0 }
    }

    /// Queues `packet` without blocking the audio thread.
    fn send(&mut self, packet: CapturePacket) {
        if self.dropped > 0 {
            let gap = CapturePacket::silent(vec![0.0; self.dropped.min(MAX_GAP_SAMPLES)]);
            match self.sender.try_send(gap) {
                Ok(()) => self.dropped = 0,
                Err(TrySendError::Full(_)) => {
                    self.dropped = self.dropped.saturating_add(packet.len());
                    return;
                }
                // The receiver is gone once the session ends
                Err(TrySendError::Disconnected(_)) => return,
            }
        }

        match self.sender.try_send(packet) {
            Ok(()) | Err(TrySendError::Disconnected(_)) => {}
            Err(TrySendError::Full(packet)) => {
                tracing::warn!("Packet queue full, replacing captured audio with silence");
                self.dropped = packet.len();
            }
        }
    }
}

/// Finds a device by "default", numeric index or exact name.
///
/// Loopback capture searches output devices; input capture searches input
/// devices.
///
/// # Errors
/// - If no device with the specified name/index is found
fn find_device(host: &cpal::Host, device_spec: &str, source: CaptureSource) -> Result<cpal::Device> {
    if device_spec == "default" {
        let device = match source {
            CaptureSource::Input => host.default_input_device(),
            CaptureSource::Loopback => host.default_output_device(),
        };
        return device.ok_or_else(|| anyhow!("No default {source} device available"));
    }

    let devices: Vec<cpal::Device> = match source {
        CaptureSource::Input => host.input_devices().map(|d| d.collect::<Vec<_>>()),
        CaptureSource::Loopback => host.output_devices().map(|d| d.collect::<Vec<_>>()),
    }
    .map_err(|e| anyhow!("Failed to enumerate devices: {e}"))?;

    // Unnamed devices are skipped so indices match `orbscope list-devices`
    let (names, devices): (Vec<String>, Vec<cpal::Device>) = devices
        .into_iter()
        .filter_map(|device| Some((device.name().ok()?, device)))
        .unzip();

    let position = device_position(&names, device_spec)?;
    devices
        .into_iter()
        .nth(position)
        .ok_or_else(|| anyhow!("Audio device '{device_spec}' disappeared during lookup"))
}

/// Position of a device spec (numeric index or exact name) among the listed names.
///
/// # Errors
/// - If the index is out of range or no device has that name
fn device_position(names: &[String], device_spec: &str) -> Result<usize> {
    if let Ok(index) = device_spec.parse::<usize>() {
        if index >= names.len() {
            return Err(anyhow!(
                "Device index {} is out of range (0-{})",
                index,
                names.len().saturating_sub(1)
            ));
        }
        return Ok(index);
    }

    names
        .iter()
        .position(|name| name == device_spec)
        .ok_or_else(|| {
            anyhow!(
                "Audio device '{device_spec}' not found. Use 'orbscope list-devices' to see available devices."
            )
        })
}

/// Temporarily redirects stderr to /dev/null to suppress ALSA library warnings on Linux.
/// On non-Linux platforms, this is a no-op since ALSA doesn't exist.
#[cfg(target_os = "linux")]
pub(crate) fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let dev_null = OpenOptions::new()
        .write(true)
        .open("/dev/null")
        .map_err(|e| anyhow!("Failed to open /dev/null: {e}"))?;

    let dev_null_fd = dev_null.as_raw_fd();

    // Save the current stderr file descriptor
    let old_stderr = unsafe { libc::dup(libc::STDERR_FILENO) };
    if old_stderr == -1 {
        return Err(anyhow!("Failed to duplicate stderr"));
    }

    let redirect_result = unsafe { libc::dup2(dev_null_fd, libc::STDERR_FILENO) };
    if redirect_result == -1 {
        unsafe { libc::close(old_stderr) };
        return Err(anyhow!("Failed to redirect stderr"));
    }

    let result = f();

    // Restore the original stderr
    unsafe {
        libc::dup2(old_stderr, libc::STDERR_FILENO);
        libc::close(old_stderr);
    }

    result
}

/// On non-Linux platforms, no stderr suppression is needed since ALSA doesn't exist.
#[cfg(not(target_os = "linux"))]
pub(crate) fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_before_start_is_empty() {
        let capture = AudioCapture::new("default".to_string(), CaptureSource::Input);
        let mut window = SampleWindow::new(8).unwrap();

        assert_eq!(capture.drain_into(&mut window), DrainStats::default());
        assert_eq!(window.samples_appended(), 0);
    }

    #[test]
    fn test_drain_applies_queued_packets() {
        let (sender, receiver) = mpsc::sync_channel(PACKET_QUEUE_CAPACITY);
        let mut capture = AudioCapture::new("default".to_string(), CaptureSource::Input);
        capture.channels = 2;
        capture.receiver = Some(receiver);

        sender.send(CapturePacket::new(vec![1.0, 2.0, 3.0, 4.0])).unwrap();
        sender.send(CapturePacket::silent(vec![5.0, 6.0])).unwrap();

        let mut window = SampleWindow::new(8).unwrap();
        let stats = capture.drain_into(&mut window);

        assert_eq!(
            stats,
            DrainStats {
                packets: 2,
                samples: 6,
                silent_packets: 1
            }
        );
        assert_eq!(window.to_vec(), vec![0.0, 0.0, 1.0, 2.0, 3.0, 4.0, 0.0, 0.0]);
    }

    #[test]
    fn test_full_queue_turns_dropped_audio_into_silence() {
        let (sender, receiver) = mpsc::sync_channel(1);
        let mut sender = PacketSender::new(sender);

        sender.send(CapturePacket::new(vec![1.0; 4]));
        // Queue is full: both packets are dropped
        sender.send(CapturePacket::new(vec![2.0; 3]));
        sender.send(CapturePacket::new(vec![3.0; 2]));

        assert_eq!(receiver.try_recv().unwrap(), CapturePacket::new(vec![1.0; 4]));
        assert!(receiver.try_recv().is_err());

        // Room again: the gap goes out first, sized to everything dropped
        sender.send(CapturePacket::new(vec![4.0; 5]));
        let gap = receiver.try_recv().unwrap();
        assert!(gap.silent);
        assert_eq!(gap.len(), 5);

        // The 4.0 packet found the queue full behind the gap, so it becomes
        // the next gap
        sender.send(CapturePacket::new(vec![6.0; 1]));
        let gap = receiver.try_recv().unwrap();
        assert!(gap.silent);
        assert_eq!(gap.len(), 5);
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_sender_survives_closed_queue() {
        let (sender, receiver) = mpsc::sync_channel(1);
        drop(receiver);
        let mut sender = PacketSender::new(sender);
        sender.send(CapturePacket::new(vec![1.0; 4]));
        assert_eq!(sender.dropped, 0);
    }

    #[test]
    fn test_device_position_by_index_and_name() {
        let names = vec!["Mic".to_string(), "Line In".to_string()];
        assert_eq!(device_position(&names, "1").unwrap(), 1);
        assert_eq!(device_position(&names, "Mic").unwrap(), 0);
        assert!(device_position(&names, "2").is_err());
        assert!(device_position(&names, "Speakers").is_err());
    }

    #[test]
    fn test_toggle_pause() {
        let capture = AudioCapture::new("default".to_string(), CaptureSource::Input);
        assert!(!capture.is_paused());
        capture.toggle_pause();
        assert!(capture.is_paused());
        capture.toggle_pause();
        assert!(!capture.is_paused());
    }
}
