//! Spoken questions: audio clips, WAV framing and the transcription trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{QaError, Result};

/// Sample format of a recorded clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Number of interleaved channels.
    pub channels: u16,
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self::mono_16khz()
    }
}

impl AudioFormat {
    /// Mono at 16 kHz, the rate speech recognizers expect.
    pub fn mono_16khz() -> Self {
        Self { sample_rate: 16_000, channels: 1 }
    }
}

/// A mono recording as normalized `f32` samples in `[-1, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    /// Samples, one per frame.
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl AudioClip {
    /// Create a clip from samples at `sample_rate`.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self { samples, sample_rate }
    }

    /// Create a clip at the default 16 kHz rate.
    pub fn mono_16khz(samples: Vec<f32>) -> Self {
        Self::new(samples, AudioFormat::mono_16khz().sample_rate)
    }

    /// Create a clip from PCM16 samples.
    pub fn from_i16_samples(samples: &[i16], sample_rate: u32) -> Self {
        Self::new(samples.iter().map(|s| f32::from(*s) / 32768.0).collect(), sample_rate)
    }

    /// Convert to PCM16 samples, clamping out-of-range values.
    pub fn to_i16_samples(&self) -> Vec<i16> {
        self.samples.iter().map(|s| (s.clamp(-1.0, 1.0) * 32767.0).round() as i16).collect()
    }

    /// Whether the clip has no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in milliseconds.
    pub fn duration_ms(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 * 1000.0 / f64::from(self.sample_rate)
    }

    /// Encode as a 16-bit PCM mono RIFF/WAVE file.
    pub fn to_wav_bytes(&self) -> Vec<u8> {
        let pcm = self.to_i16_samples();
        let data_len = (pcm.len() * 2) as u32;
        let byte_rate = self.sample_rate * 2;

        let mut out = Vec::with_capacity(44 + data_len as usize);
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes()); // PCM
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&self.sample_rate.to_le_bytes());
        out.extend_from_slice(&byte_rate.to_le_bytes());
        out.extend_from_slice(&2u16.to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        for sample in pcm {
            out.extend_from_slice(&sample.to_le_bytes());
        }
        out
    }

    /// Decode a 16-bit PCM RIFF/WAVE file. Multi-channel input is downmixed
    /// to mono by averaging each frame.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::MalformedAudio`] for anything other than a
    /// well-formed 16-bit PCM WAV stream.
    pub fn from_wav_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
            return Err(QaError::MalformedAudio("missing RIFF/WAVE header".into()));
        }

        let mut format: Option<AudioFormat> = None;
        let mut cursor = 12;
        while cursor + 8 <= bytes.len() {
            let id = &bytes[cursor..cursor + 4];
            let size = read_u32(bytes, cursor + 4)? as usize;
            let body_start = cursor + 8;
            let body_end = body_start
                .checked_add(size)
                .filter(|end| *end <= bytes.len())
                .ok_or_else(|| QaError::MalformedAudio("truncated chunk".into()))?;
            let body = &bytes[body_start..body_end];

            match id {
                b"fmt " => format = Some(parse_fmt(body)?),
                b"data" => {
                    let format = format
                        .ok_or_else(|| QaError::MalformedAudio("data before fmt chunk".into()))?;
                    return Ok(decode_pcm16(body, format));
                }
                _ => {}
            }
            // Chunks are word aligned.
            cursor = body_end + (size & 1);
        }

        Err(QaError::MalformedAudio("no data chunk".into()))
    }
}

fn read_u16(bytes: &[u8], at: usize) -> Result<u16> {
    bytes
        .get(at..at + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .ok_or_else(|| QaError::MalformedAudio("unexpected end of stream".into()))
}

fn read_u32(bytes: &[u8], at: usize) -> Result<u32> {
    bytes
        .get(at..at + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| QaError::MalformedAudio("unexpected end of stream".into()))
}

fn parse_fmt(body: &[u8]) -> Result<AudioFormat> {
    let tag = read_u16(body, 0)?;
    let channels = read_u16(body, 2)?;
    let sample_rate = read_u32(body, 4)?;
    let bits = read_u16(body, 14)?;
    if tag != 1 || bits != 16 {
        return Err(QaError::MalformedAudio(format!(
            "unsupported encoding (format tag {tag}, {bits} bits); expected 16-bit PCM"
        )));
    }
    if channels == 0 || sample_rate == 0 {
        return Err(QaError::MalformedAudio("zero channels or sample rate".into()));
    }
    Ok(AudioFormat { sample_rate, channels })
}

fn decode_pcm16(body: &[u8], format: AudioFormat) -> AudioClip {
    let channels = usize::from(format.channels);
    let frame_bytes = channels * 2;
    let samples = body
        .chunks_exact(frame_bytes)
        .map(|frame| {
            let sum: f32 = frame
                .chunks_exact(2)
                .map(|s| f32::from(i16::from_le_bytes([s[0], s[1]])) / 32768.0)
                .sum();
            sum / channels as f32
        })
        .collect();
    AudioClip::new(samples, format.sample_rate)
}

/// Speech-to-text for spoken questions.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe `clip` into text.
    async fn transcribe(&self, clip: &AudioClip) -> Result<String>;

    /// Return a short identifier for the underlying model.
    fn name(&self) -> &str;
}
