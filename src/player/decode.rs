//! Audio file decoding for waveform extraction.
//!
//! This module turns a WAV or FLAC file into a flat buffer of interleaved
//! floating-point samples normalized to [-1.0, 1.0], together with the sample
//! rate and channel count. It is the single seam between the on-disk formats
//! and everything downstream: the envelope extractor and the playback sources
//! both consume its output.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure to open or decode an audio file.
///
/// Carries the offending path so the UI can report which track failed without
/// the caller threading it through separately.
#[derive(Debug, Error)]
#[error("could not decode {}: {source}", path.display())]
pub struct DecodeError {
    pub path: PathBuf,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

impl DecodeError {
    fn new(
        path: &Path,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            path: path.to_path_buf(),
            source: source.into(),
        }
    }
}

/// A fully decoded audio file: interleaved f32 samples in [-1.0, 1.0].
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl DecodedAudio {
    /// Number of frames (one sample per channel, taken together).
    pub fn frame_count(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels as usize
        }
    }

    pub fn duration(&self) -> std::time::Duration {
        if self.sample_rate == 0 {
            return std::time::Duration::ZERO;
        }
        std::time::Duration::from_secs_f64(self.frame_count() as f64 / self.sample_rate as f64)
    }
}

/// Decode a file based on its extension.
pub fn decode(path: &Path) -> Result<DecodedAudio, DecodeError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "wav" => decode_wav(path),
        "flac" => decode_flac(path),
        _ => Err(DecodeError::new(
            path,
            format!("unsupported audio format: {ext}"),
        )),
    }
}

fn decode_wav(path: &Path) -> Result<DecodedAudio, DecodeError> {
    let file = File::open(path).map_err(|e| DecodeError::new(path, e))?;
    let mut reader =
        hound::WavReader::new(BufReader::new(file)).map_err(|e| DecodeError::new(path, e))?;
    let spec = reader.spec();

    log::info!("WAV format: {spec:?}");

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| DecodeError::new(path, e))?,
        hound::SampleFormat::Int => {
            let bits = spec.bits_per_sample;
            if !(8..=32).contains(&bits) {
                return Err(DecodeError::new(
                    path,
                    format!("unsupported bit depth: {bits}"),
                ));
            }
            let max_value = (1i64 << (bits - 1)) as f32;
            let raw: Vec<i32> = match bits {
                16 => {
                    let samples: Result<Vec<i16>, _> = reader.samples().collect();
                    samples
                        .map_err(|e| DecodeError::new(path, e))?
                        .into_iter()
                        .map(i32::from)
                        .collect()
                }
                8 => {
                    let samples: Result<Vec<i8>, _> = reader.samples().collect();
                    samples
                        .map_err(|e| DecodeError::new(path, e))?
                        .into_iter()
                        .map(i32::from)
                        .collect()
                }
                _ => {
                    let samples: Result<Vec<i32>, _> = reader.samples().collect();
                    samples.map_err(|e| DecodeError::new(path, e))?
                }
            };
            raw.into_iter().map(|s| s as f32 / max_value).collect()
        }
    };

    Ok(DecodedAudio {
        samples,
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}

fn decode_flac(path: &Path) -> Result<DecodedAudio, DecodeError> {
    let mut reader = claxon::FlacReader::open(path).map_err(|e| DecodeError::new(path, e))?;
    let info = reader.streaminfo();

    log::info!(
        "FLAC format: {} Hz, {} channels, {} bits",
        info.sample_rate,
        info.channels,
        info.bits_per_sample
    );

    let max_value = (1i64 << (info.bits_per_sample - 1)) as f32;
    let mut samples = Vec::new();
    for sample in reader.samples() {
        let sample = sample.map_err(|e| DecodeError::new(path, e))?;
        samples.push(sample as f32 / max_value);
    }

    Ok(DecodedAudio {
        samples,
        sample_rate: info.sample_rate,
        channels: info.channels as u16,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_test_wav(path: &Path, channels: u16, samples: &[i16]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_decode_nonexistent_file() {
        let err = decode(Path::new("/nonexistent/file.wav")).unwrap_err();
        assert_eq!(err.path, Path::new("/nonexistent/file.wav"));
    }

    #[test]
    fn test_decode_unsupported_extension() {
        let err = decode(Path::new("track.mp3")).unwrap_err();
        assert!(err.to_string().contains("unsupported audio format"));
    }

    #[test]
    fn test_decode_wav_normalizes_samples() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("test.wav");
        write_test_wav(&path, 1, &[0, i16::MAX, i16::MIN]);

        let decoded = decode(&path).unwrap();
        assert_eq!(decoded.sample_rate, 8000);
        assert_eq!(decoded.channels, 1);
        assert_eq!(decoded.samples.len(), 3);
        assert_eq!(decoded.samples[0], 0.0);
        assert!((decoded.samples[1] - 1.0).abs() < 1e-3);
        assert!((decoded.samples[2] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_frame_count_stereo() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("stereo.wav");
        write_test_wav(&path, 2, &[100, -100, 200, -200]);

        let decoded = decode(&path).unwrap();
        assert_eq!(decoded.channels, 2);
        assert_eq!(decoded.frame_count(), 2);
    }

    #[test]
    fn test_duration() {
        let audio = DecodedAudio {
            samples: vec![0.0; 16000],
            sample_rate: 8000,
            channels: 2,
        };
        assert_eq!(audio.duration(), std::time::Duration::from_secs(1));
    }
}
