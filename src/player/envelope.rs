//! Amplitude envelope extraction for the waveform timeline.
//!
//! The envelope is the per-frame loudness of the whole track: one value per
//! multi-channel frame, computed as the mean of the absolute per-channel
//! samples. Absolute values are taken before averaging so out-of-phase stereo
//! material does not cancel to silence in the display. The envelope is
//! extracted once per loaded file and cached until the next track replaces it.
//!
//! Extraction is O(file size), so it runs on a background thread and hands the
//! result back over a channel. Each result is tagged with the path it was
//! requested for; the receiver drops results that no longer match the current
//! track, so a slow extraction can never overwrite a newer one.

use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use super::decode::{self, DecodeError};

/// One mean-of-absolute amplitude value per audio frame, in [0.0, 1.0].
pub type AmplitudeEnvelope = Vec<f32>;

/// Reduce an interleaved sample stream to a per-frame amplitude envelope.
///
/// Consumes the stream in one-second chunks (`sample_rate * channels`
/// samples) until exhausted. A trailing partial frame is averaged over the
/// samples it actually has.
pub fn extract<I>(mut samples: I, sample_rate: u32, channels: u16) -> AmplitudeEnvelope
where
    I: Iterator<Item = f32>,
{
    let channels = channels.max(1) as usize;
    let chunk_len = (sample_rate as usize).max(1) * channels;

    let mut envelope = Vec::new();
    let mut chunk: Vec<f32> = Vec::with_capacity(chunk_len);

    loop {
        chunk.clear();
        chunk.extend(samples.by_ref().take(chunk_len));
        if chunk.is_empty() {
            break;
        }

        for frame in chunk.chunks(channels) {
            let sum: f32 = frame.iter().map(|s| s.abs()).sum();
            envelope.push(sum / frame.len() as f32);
        }
    }

    envelope
}

/// A finished extraction, tagged with the path it was requested for.
pub struct EnvelopeResult {
    pub path: PathBuf,
    pub result: Result<AmplitudeEnvelope, DecodeError>,
}

/// Background envelope extraction with a single receive side.
///
/// One worker thread per request; the app polls `try_recv` from its event
/// loop and applies the stale-result guard before accepting an envelope.
pub struct EnvelopeLoader {
    tx: mpsc::Sender<EnvelopeResult>,
    rx: mpsc::Receiver<EnvelopeResult>,
}

impl EnvelopeLoader {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    /// Start extracting the envelope for `path` off the UI thread.
    pub fn request(&self, path: PathBuf) {
        let tx = self.tx.clone();
        thread::spawn(move || {
            let result = decode::decode(&path)
                .map(|audio| extract(audio.samples.iter().copied(), audio.sample_rate, audio.channels));
            // Receiver may be gone if the app is shutting down
            let _ = tx.send(EnvelopeResult { path, result });
        });
    }

    /// Non-blocking check for a finished extraction.
    pub fn try_recv(&self) -> Option<EnvelopeResult> {
        self.rx.try_recv().ok()
    }

    /// Blocking receive with a deadline. Used by tests.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<EnvelopeResult> {
        self.rx.recv_timeout(timeout).ok()
    }
}

impl Default for EnvelopeLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    #[test]
    fn test_extract_empty_stream() {
        let envelope = extract(std::iter::empty(), 44100, 2);
        assert!(envelope.is_empty());
    }

    #[test]
    fn test_extract_mono_takes_absolute_value() {
        let samples = [0.5f32, -0.5, 1.0, -1.0];
        let envelope = extract(samples.iter().copied(), 44100, 1);
        assert_eq!(envelope, vec![0.5, 0.5, 1.0, 1.0]);
    }

    #[test]
    fn test_extract_stereo_averages_channels() {
        // Out-of-phase frames must not cancel
        let samples = [0.8f32, -0.8, 0.2, 0.4];
        let envelope = extract(samples.iter().copied(), 44100, 2);
        assert_eq!(envelope.len(), 2);
        assert!((envelope[0] - 0.8).abs() < 1e-6);
        assert!((envelope[1] - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_extract_spans_chunk_boundaries() {
        // sample_rate 2, mono: chunk length 2, stream of 5 samples crosses
        // two full chunks plus a partial one
        let samples = [0.1f32, 0.2, 0.3, 0.4, 0.5];
        let envelope = extract(samples.iter().copied(), 2, 1);
        assert_eq!(envelope.len(), 5);
        assert!((envelope[4] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_extract_partial_trailing_frame() {
        // Stereo stream with a dangling left-only sample
        let samples = [0.6f32, 0.2, 1.0];
        let envelope = extract(samples.iter().copied(), 44100, 2);
        assert_eq!(envelope.len(), 2);
        assert!((envelope[0] - 0.4).abs() < 1e-6);
        assert!((envelope[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_extract_zero_channels_treated_as_mono() {
        let samples = [0.5f32, -0.25];
        let envelope = extract(samples.iter().copied(), 44100, 0);
        assert_eq!(envelope, vec![0.5, 0.25]);
    }

    fn write_test_wav(path: &Path, samples: &[i16]) {
        let spec = hound::WavSpec {
            channels: 1,
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
    fn test_loader_tags_result_with_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tone.wav");
        write_test_wav(&path, &[0, 16384, -16384, 0]);

        let loader = EnvelopeLoader::new();
        loader.request(path.clone());

        let result = loader
            .recv_timeout(Duration::from_secs(5))
            .expect("extraction should complete");
        assert_eq!(result.path, path);
        let envelope = result.result.unwrap();
        assert_eq!(envelope.len(), 4);
        assert!((envelope[1] - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_loader_reports_decode_failure() {
        let loader = EnvelopeLoader::new();
        let path = PathBuf::from("/nonexistent/missing.flac");
        loader.request(path.clone());

        let result = loader
            .recv_timeout(Duration::from_secs(5))
            .expect("failure should still be delivered");
        assert_eq!(result.path, path);
        assert!(result.result.is_err());
    }
}
