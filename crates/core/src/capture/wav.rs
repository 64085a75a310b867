use std::{
    collections::VecDeque,
    io::Cursor,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tokio::{fs, sync::mpsc};
use tracing::{debug, warn};

use crate::{
    capture::{AudioChunk, CaptureDevice, StreamFormat},
    error::{MockviewError, Result},
};

/// Encode 16-bit PCM as an in-memory WAV file.
pub fn encode_wav(samples: &[i16], format: StreamFormat) -> Result<Vec<u8>> {
    let spec = WavSpec {
        channels: format.channels,
        sample_rate: format.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for &sample in samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

pub fn decode_wav(bytes: &[u8]) -> Result<(Vec<i16>, StreamFormat)> {
    read_samples(WavReader::new(Cursor::new(bytes))?)
}

fn read_samples<R: std::io::Read>(mut reader: WavReader<R>) -> Result<(Vec<i16>, StreamFormat)> {
    let spec = reader.spec();
    let samples = match spec.sample_format {
        SampleFormat::Int if spec.bits_per_sample <= 16 => reader
            .samples::<i16>()
            .collect::<std::result::Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let shift = spec.bits_per_sample.saturating_sub(16);
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| (v >> shift) as i16))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
        SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(|v| (v.clamp(-1.0, 1.0) * i16::MAX as f32) as i16))
            .collect::<std::result::Result<Vec<_>, _>>()?,
    };

    Ok((
        samples,
        StreamFormat {
            sample_rate: spec.sample_rate,
            channels: spec.channels,
        },
    ))
}

/// Replays pre-recorded `*.wav` answers from a directory, one file per
/// recording, in file-name order. Once the answers run out, recordings are
/// silent.
pub struct WavFileDevice {
    dir: PathBuf,
    answers: VecDeque<PathBuf>,
    format: StreamFormat,
    chunk_len: usize,
}

impl WavFileDevice {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            answers: VecDeque::new(),
            format: StreamFormat::default(),
            chunk_len: 1_600,
        }
    }

    pub fn remaining_answers(&self) -> usize {
        self.answers.len()
    }

    async fn scan(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        let mut entries = fs::read_dir(dir).await?;
        let mut answers = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_wav = path
                .extension()
                .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("wav"));
            if is_wav {
                answers.push(path);
            }
        }
        answers.sort();
        Ok(answers)
    }
}

#[async_trait]
impl CaptureDevice for WavFileDevice {
    async fn acquire(&mut self) -> Result<StreamFormat> {
        let answers = Self::scan(&self.dir)
            .await
            .map_err(|e| MockviewError::PermissionDenied {
                reason: format!("cannot open {}: {e}", self.dir.display()),
            })?;

        if let Some(first) = answers.first() {
            let reader = WavReader::open(first)?;
            let spec = reader.spec();
            self.format = StreamFormat {
                sample_rate: spec.sample_rate,
                channels: spec.channels,
            };
        }
        for path in &answers {
            let spec = WavReader::open(path)?.spec();
            if spec.sample_rate != self.format.sample_rate || spec.channels != self.format.channels
            {
                return Err(MockviewError::validation(format!(
                    "{} does not match the {} Hz / {} channel format of the other answers",
                    path.display(),
                    self.format.sample_rate,
                    self.format.channels
                )));
            }
        }

        debug!(dir = %self.dir.display(), answers = answers.len(), "answer files found");
        self.answers = answers.into();
        Ok(self.format)
    }

    fn start(&mut self, sink: mpsc::UnboundedSender<AudioChunk>) -> Result<()> {
        let Some(path) = self.answers.pop_front() else {
            warn!("no recorded answers left, capturing silence");
            return Ok(());
        };

        let (samples, _) = read_samples(WavReader::open(&path)?)?;
        debug!(path = %path.display(), samples = samples.len(), "replaying answer");
        for chunk in samples.chunks(self.chunk_len) {
            if sink
                .send(AudioChunk {
                    samples: chunk.to_vec(),
                })
                .is_err()
            {
                break;
            }
        }
        Ok(())
    }

    fn stop(&mut self) {}

    fn release(&mut self) {
        self.answers.clear();
    }

    fn name(&self) -> &str {
        "wav-files"
    }
}
