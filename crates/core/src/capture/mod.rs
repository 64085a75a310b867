//! Camera/microphone capture.
//!
//! `MediaCapture` owns the device and walks
//! `Unacquired -> Acquired -> Recording -> Acquired -> ... -> Released`.
//! Each stopped recording is finalized into exactly one WAV blob.

pub mod wav;

use std::time::Duration;

use async_trait::async_trait;
use tokio::{sync::mpsc, time};
use tracing::{debug, info, warn};

use crate::error::{MockviewError, Result};

pub use wav::{WavFileDevice, decode_wav, encode_wav};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl Default for StreamFormat {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            channels: 1,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AudioChunk {
    pub samples: Vec<i16>,
}

#[async_trait]
pub trait CaptureDevice: Send {
    /// Ask for access. Refusal is `PermissionDenied`.
    async fn acquire(&mut self) -> Result<StreamFormat>;

    /// Begin delivering chunks into `sink`. The device drops its sender once
    /// the last chunk after `stop` has been delivered.
    fn start(&mut self, sink: mpsc::UnboundedSender<AudioChunk>) -> Result<()>;

    fn stop(&mut self);

    /// Stop every acquired track.
    fn release(&mut self);

    fn name(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Unacquired,
    Acquired,
    Recording,
    Released,
}

/// A finalized answer, ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recording {
    pub bytes: Vec<u8>,
    pub sample_count: usize,
    pub format: StreamFormat,
}

impl Recording {
    pub const MIME_TYPE: &'static str = "audio/wav";
    pub const FILE_NAME: &'static str = "answer.wav";

    pub fn is_empty(&self) -> bool {
        self.sample_count == 0
    }

    pub fn duration_secs(&self) -> f64 {
        let frames = self.sample_count as f64 / self.format.channels.max(1) as f64;
        frames / self.format.sample_rate.max(1) as f64
    }
}

pub struct MediaCapture<D: CaptureDevice> {
    device: D,
    state: CaptureState,
    format: StreamFormat,
    chunks: Option<mpsc::UnboundedReceiver<AudioChunk>>,
    finalize_timeout: Duration,
}

impl<D: CaptureDevice> MediaCapture<D> {
    pub fn new(device: D, finalize_timeout: Duration) -> Self {
        Self {
            device,
            state: CaptureState::Unacquired,
            format: StreamFormat::default(),
            chunks: None,
            finalize_timeout,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == CaptureState::Recording
    }

    pub fn format(&self) -> StreamFormat {
        self.format
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub async fn acquire(&mut self) -> Result<StreamFormat> {
        match self.state {
            CaptureState::Unacquired => {}
            CaptureState::Acquired | CaptureState::Recording => return Ok(self.format),
            CaptureState::Released => {
                return Err(MockviewError::InvalidState(
                    "capture devices were already released".into(),
                ));
            }
        }

        self.format = self.device.acquire().await?;
        self.state = CaptureState::Acquired;
        info!(
            device = self.device.name(),
            sample_rate = self.format.sample_rate,
            channels = self.format.channels,
            "capture acquired"
        );
        Ok(self.format)
    }

    pub fn start_recording(&mut self) -> Result<()> {
        match self.state {
            CaptureState::Acquired => {}
            CaptureState::Recording => {
                return Err(MockviewError::InvalidState(
                    "a recording is already active".into(),
                ));
            }
            CaptureState::Unacquired | CaptureState::Released => {
                return Err(MockviewError::InvalidState(
                    "camera and microphone are not acquired".into(),
                ));
            }
        }

        let (tx, rx) = mpsc::unbounded_channel();
        self.device.start(tx)?;
        self.chunks = Some(rx);
        self.state = CaptureState::Recording;
        debug!(device = self.device.name(), "recording started");
        Ok(())
    }

    /// Stop the open recording and finalize it. Zero captured samples still
    /// yield one (header-only) blob.
    pub async fn stop_recording(&mut self) -> Result<Recording> {
        if self.state != CaptureState::Recording {
            return Err(MockviewError::InvalidState("no active recording".into()));
        }
        let Some(mut rx) = self.chunks.take() else {
            return Err(MockviewError::InvalidState("no active recording".into()));
        };

        self.device.stop();
        self.state = CaptureState::Acquired;

        let mut samples = Vec::new();
        let drained =
            time::timeout(self.finalize_timeout, collect_chunks(&mut rx, &mut samples)).await;
        if drained.is_err() {
            warn!(
                device = self.device.name(),
                "device kept the stream open, finalizing with the chunks received so far"
            );
            while let Ok(chunk) = rx.try_recv() {
                samples.extend(chunk.samples);
            }
        }

        let bytes = encode_wav(&samples, self.format)?;
        debug!(
            samples = samples.len(),
            bytes = bytes.len(),
            "recording finalized"
        );
        Ok(Recording {
            bytes,
            sample_count: samples.len(),
            format: self.format,
        })
    }

    /// Stop all tracks. Safe to call repeatedly; an open recording is discarded.
    pub fn release(&mut self) {
        match self.state {
            CaptureState::Released => return,
            CaptureState::Recording => {
                self.device.stop();
                self.chunks = None;
                self.device.release();
            }
            CaptureState::Acquired => self.device.release(),
            CaptureState::Unacquired => {}
        }
        self.state = CaptureState::Released;
        info!(device = self.device.name(), "capture released");
    }
}

impl<D: CaptureDevice> Drop for MediaCapture<D> {
    fn drop(&mut self) {
        self.release();
    }
}

async fn collect_chunks(rx: &mut mpsc::UnboundedReceiver<AudioChunk>, samples: &mut Vec<i16>) {
    while let Some(chunk) = rx.recv().await {
        samples.extend(chunk.samples);
    }
}
