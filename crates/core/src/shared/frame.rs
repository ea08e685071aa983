use std::time::Duration;

/// A single decoded camera frame: contiguous RGB bytes in row-major order,
/// plus its position in the stream.
///
/// `timestamp` is stream time (elapsed since the source started), which is
/// what every grace period and cooldown is measured against. Frames whose
/// detections were computed upstream may carry no pixel data at all.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
    timestamp: Duration,
}

impl Frame {
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        channels: u8,
        index: usize,
        timestamp: Duration,
    ) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
            timestamp,
        }
    }

    /// Frame without pixels, for pipelines fed by pre-computed detections.
    pub fn empty(index: usize, timestamp: Duration) -> Self {
        Self::new(Vec::new(), 0, 0, 3, index, timestamp)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn timestamp(&self) -> Duration {
        self.timestamp
    }

    pub fn has_pixels(&self) -> bool {
        !self.data.is_empty()
    }
}
