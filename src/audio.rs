// src/audio.rs
//
// In-memory audio signal type plus the record/batch shapes that flow
// through the data loader.  Decoding real container formats is a backend
// concern; this layer only deals in PCM sample matrices.

use std::collections::BTreeMap;

use ndarray::{s, Array2, Array3};

use crate::data_loader::dataset::DatasetError;

/// Silence floor used when a clip's RMS is exactly zero.
const SILENCE_FLOOR_DB: f64 = -120.0;

/// A decoded audio clip: channels x frames PCM samples at a fixed rate.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    samples: Array2<f32>,
    sample_rate: u32,
}

impl AudioBuffer {
    /// Wrap a channels x frames sample matrix.
    pub fn new(samples: Array2<f32>, sample_rate: u32) -> Result<Self, DatasetError> {
        if sample_rate == 0 {
            return Err(DatasetError::InvalidArgument(
                "sample_rate must be > 0".to_string(),
            ));
        }
        if samples.nrows() == 0 {
            return Err(DatasetError::InvalidArgument(
                "audio buffer needs at least one channel".to_string(),
            ));
        }
        Ok(Self { samples, sample_rate })
    }

    /// Single-channel convenience constructor.
    pub fn from_mono(data: Vec<f32>, sample_rate: u32) -> Result<Self, DatasetError> {
        let frames = data.len();
        let samples = Array2::from_shape_vec((1, frames), data)
            .map_err(|e| DatasetError::InvalidArgument(e.to_string()))?;
        Self::new(samples, sample_rate)
    }

    pub fn num_channels(&self) -> usize {
        self.samples.nrows()
    }

    pub fn num_frames(&self) -> usize {
        self.samples.ncols()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn samples(&self) -> &Array2<f32> {
        &self.samples
    }

    /// Clip duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.num_frames() as f64 / self.sample_rate as f64
    }

    /// Average all channels down to one.
    pub fn to_mono(&self) -> AudioBuffer {
        if self.num_channels() == 1 {
            return self.clone();
        }
        let frames = self.num_frames();
        let scale = 1.0 / self.num_channels() as f32;
        let mut mono = Array2::<f32>::zeros((1, frames));
        for ch in self.samples.rows() {
            for (i, &v) in ch.iter().enumerate() {
                mono[[0, i]] += v * scale;
            }
        }
        AudioBuffer { samples: mono, sample_rate: self.sample_rate }
    }

    /// Resample to `rate` via per-channel linear interpolation.
    pub fn resample(&self, rate: u32) -> Result<AudioBuffer, DatasetError> {
        if rate == 0 {
            return Err(DatasetError::InvalidArgument(
                "target sample_rate must be > 0".to_string(),
            ));
        }
        if rate == self.sample_rate {
            return Ok(self.clone());
        }
        let in_frames = self.num_frames();
        let out_frames =
            ((in_frames as f64) * (rate as f64) / (self.sample_rate as f64)).round() as usize;
        let step = self.sample_rate as f64 / rate as f64;
        let mut out = Array2::<f32>::zeros((self.num_channels(), out_frames));
        for (c, ch) in self.samples.rows().into_iter().enumerate() {
            for i in 0..out_frames {
                let pos = i as f64 * step;
                let j = pos.floor() as usize;
                let frac = (pos - j as f64) as f32;
                let a = ch[j.min(in_frames - 1)];
                let b = ch[(j + 1).min(in_frames - 1)];
                out[[c, i]] = a + (b - a) * frac;
            }
        }
        Ok(AudioBuffer { samples: out, sample_rate: rate })
    }

    /// RMS level in dBFS across all channels.  Perceptually weighted
    /// loudness is a collaborator concern; RMS is enough for batch metadata.
    pub fn loudness_db(&self) -> f64 {
        let n = self.samples.len();
        if n == 0 {
            return SILENCE_FLOOR_DB;
        }
        let sum_sq: f64 = self.samples.iter().map(|&v| (v as f64) * (v as f64)).sum();
        let rms = (sum_sq / n as f64).sqrt();
        if rms <= 0.0 {
            SILENCE_FLOOR_DB
        } else {
            (20.0 * rms.log10()).max(SILENCE_FLOOR_DB)
        }
    }

    /// Zero-pad at the end to exactly `frames`.  Never truncates.
    pub fn pad_to(&self, frames: usize) -> AudioBuffer {
        let cur = self.num_frames();
        if frames <= cur {
            return self.clone();
        }
        let mut out = Array2::<f32>::zeros((self.num_channels(), frames));
        out.slice_mut(s![.., ..cur]).assign(&self.samples);
        AudioBuffer { samples: out, sample_rate: self.sample_rate }
    }

    /// Stack clips into one batch tensor.  With `pad == true` shorter clips
    /// are zero-padded to the longest; otherwise all lengths must match.
    /// Channel counts and sample rates must agree across the batch.
    pub fn batch(clips: &[AudioBuffer], pad: bool) -> Result<SignalBatch, DatasetError> {
        let first = clips.first().ok_or_else(|| {
            DatasetError::InvalidArgument("cannot batch zero clips".to_string())
        })?;
        let channels = first.num_channels();
        let rate = first.sample_rate;
        let mut max_frames = 0usize;
        for clip in clips {
            if clip.num_channels() != channels {
                return Err(DatasetError::InvalidArgument(format!(
                    "channel count mismatch in batch: {} vs {}",
                    clip.num_channels(),
                    channels
                )));
            }
            if clip.sample_rate != rate {
                return Err(DatasetError::InvalidArgument(format!(
                    "sample rate mismatch in batch: {} vs {}",
                    clip.sample_rate, rate
                )));
            }
            max_frames = max_frames.max(clip.num_frames());
        }
        if !pad {
            if clips.iter().any(|c| c.num_frames() != max_frames) {
                return Err(DatasetError::InvalidArgument(
                    "clip lengths differ and padding is disabled".to_string(),
                ));
            }
        }

        let mut data = Array3::<f32>::zeros((clips.len(), channels, max_frames));
        let mut lengths = Vec::with_capacity(clips.len());
        let mut loudness_db = Vec::with_capacity(clips.len());
        for (b, clip) in clips.iter().enumerate() {
            let n = clip.num_frames();
            data.slice_mut(s![b, .., ..n]).assign(&clip.samples);
            lengths.push(n);
            // loudness is measured on the clip itself, pre-padding
            loudness_db.push(clip.loudness_db());
        }
        Ok(SignalBatch { data, lengths, sample_rate: rate, loudness_db })
    }
}

/// A padded batch of clips: batch x channels x frames.
#[derive(Debug, Clone)]
pub struct SignalBatch {
    /// Stacked sample data, zero-padded on the frame axis.
    pub data: Array3<f32>,
    /// Original (pre-padding) frame count of each clip.
    pub lengths: Vec<usize>,
    /// Sample rate shared by every clip in the batch.
    pub sample_rate: u32,
    /// Per-clip RMS loudness, measured before padding.
    pub loudness_db: Vec<f64>,
}

impl SignalBatch {
    pub fn batch_size(&self) -> usize {
        self.data.shape()[0]
    }

    pub fn padded_frames(&self) -> usize {
        self.data.shape()[2]
    }
}

/// One value inside an item record.
#[derive(Debug, Clone)]
pub enum Field {
    Signal(AudioBuffer),
    Scalar(f64),
    Int(i64),
    Text(String),
}

/// A single fetched sample: field name -> value.  `BTreeMap` keeps field
/// order deterministic across items.
pub type Item = BTreeMap<String, Field>;

/// One aggregated column of a collated batch.
#[derive(Debug, Clone)]
pub enum BatchField {
    Signals(SignalBatch),
    Scalars(Vec<f64>),
    Ints(Vec<i64>),
    Texts(Vec<String>),
}

/// A collated batch: field name -> aggregated column.
pub type Batch = BTreeMap<String, BatchField>;
