//! Capture packets handed from the audio callback to the render loop.

use crate::spectrum::SampleWindow;

/// One burst of interleaved samples as delivered by the audio device.
///
/// Length is arbitrary and need not be a power of two. A silent packet carries
/// its sample count but its contents are ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturePacket {
    pub samples: Vec<f32>,
    pub silent: bool,
}

impl CapturePacket {
    pub fn new(samples: Vec<f32>) -> Self {
        Self {
            samples,
            silent: false,
        }
    }

    pub fn silent(samples: Vec<f32>) -> Self {
        Self {
            samples,
            silent: true,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Pushes the packet into the window. Silent packets advance it with zeros.
    pub fn apply_to(&self, window: &mut SampleWindow, channel_stride: usize) {
        if self.silent {
            window.append_silence(self.samples.len());
        } else {
            window.append(&self.samples, channel_stride);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_packet_writes_zeros() {
        let mut window = SampleWindow::new(4).unwrap();
        window.append(&[1.0, 2.0, 3.0, 4.0], 1);

        CapturePacket::silent(vec![9.0, 9.0]).apply_to(&mut window, 1);
        assert_eq!(window.to_vec(), vec![3.0, 4.0, 0.0, 0.0]);
    }

    #[test]
    fn test_audible_packet_appends() {
        let mut window = SampleWindow::new(8).unwrap();
        let packet = CapturePacket::new(vec![0.5, -0.5, 0.25]);
        packet.apply_to(&mut window, 1);

        assert_eq!(packet.len(), 3);
        assert_eq!(window.to_vec(), vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.5, -0.5, 0.25]);
    }
}
