//! Audio playback engine.
//!
//! Wraps a rodio sink around the decoded sample buffer and tracks how many
//! samples have been handed to the output, which is what the progress
//! fraction and the waveform overlay are derived from. rodio sinks cannot
//! seek, so both relative and absolute seeks rebuild the sink with a source
//! that starts at the target offset; the decoded buffer is kept in memory so
//! seeking never re-decodes the file.

use rodio::{OutputStream, OutputStreamBuilder, Sink, Source};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;

use super::decode::{self, DecodedAudio};
use super::waveform;

pub struct AudioInfo {
    pub channels: u16,
    pub sample_rate: u32,
}

pub struct AudioEngine {
    // Dropping the stream kills the output, so it must outlive the sink
    _stream: OutputStream,
    sink: Sink,
    pub info: Option<AudioInfo>,
    pub duration: Option<Duration>,
    samples_played: Arc<AtomicUsize>,
    total_samples: usize,
    volume: f32,
    current_path: Option<PathBuf>,
    decoded: Option<Arc<DecodedAudio>>,
}

impl AudioEngine {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        let stream = OutputStreamBuilder::open_default_stream()?;
        let sink = Sink::connect_new(stream.mixer());

        Ok(Self {
            _stream: stream,
            sink,
            info: None,
            duration: None,
            samples_played: Arc::new(AtomicUsize::new(0)),
            total_samples: 0,
            volume: 1.0,
            current_path: None,
            decoded: None,
        })
    }

    pub fn load_file(&mut self, path: &Path) -> Result<(), Box<dyn Error>> {
        let audio = Arc::new(decode::decode(path)?);

        self.info = Some(AudioInfo {
            channels: audio.channels,
            sample_rate: audio.sample_rate,
        });
        self.duration = Some(audio.duration());
        self.total_samples = audio.samples.len();
        self.current_path = Some(path.to_path_buf());
        self.decoded = Some(audio);

        log::info!(
            "Loaded {}: {} samples, duration {:?}",
            path.display(),
            self.total_samples,
            self.duration
        );

        self.restart_at(0, false);
        Ok(())
    }

    fn restart_at(&mut self, sample_offset: usize, resume: bool) {
        let Some(audio) = self.decoded.clone() else {
            return;
        };

        self.sink.stop();
        self.sink = Sink::connect_new(self._stream.mixer());
        self.sink.set_volume(self.volume);

        let offset = sample_offset.min(audio.samples.len());
        self.samples_played.store(offset, Ordering::Relaxed);
        self.sink.append(TrackSource::new(
            audio,
            offset,
            self.samples_played.clone(),
        ));

        if !resume {
            self.sink.pause();
        }
    }

    pub fn play(&self) {
        self.sink.play();
    }

    pub fn pause(&self) {
        self.sink.pause();
    }

    pub fn is_paused(&self) -> bool {
        self.sink.is_paused()
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 2.0);
        self.sink.set_volume(self.volume);
    }

    /// Playback position as a fraction of the track, in [0.0, 1.0].
    pub fn get_progress(&self) -> f32 {
        if self.total_samples > 0 {
            let played = self.samples_played.load(Ordering::Relaxed);
            (played as f32 / self.total_samples as f32).min(1.0)
        } else {
            0.0
        }
    }

    /// Track length in frames, the unit absolute seeks are expressed in.
    pub fn total_frames(&self) -> usize {
        self.decoded
            .as_ref()
            .map(|audio| audio.frame_count())
            .unwrap_or(0)
    }

    /// Seek to an absolute position given as a fraction of the track.
    pub fn seek_to_fraction(&mut self, fraction: f32) {
        let Some(info) = &self.info else {
            return;
        };
        let channels = info.channels.max(1) as usize;

        let frame = waveform::seek_frame(self.total_frames(), fraction);
        let offset = frame * channels;

        let was_playing = !self.sink.is_paused();
        self.restart_at(offset, was_playing);

        log::info!(
            "Seek to frame {frame} ({}%)",
            (fraction.clamp(0.0, 1.0) * 100.0) as u32
        );
    }

    /// Seek forward or backward by a number of seconds.
    pub fn seek_relative(&mut self, seconds: f32) {
        let Some(info) = &self.info else {
            return;
        };
        let channels = info.channels.max(1) as usize;
        let samples_per_second = info.sample_rate as f32 * channels as f32;
        let sample_offset = (seconds * samples_per_second) as isize;

        let current = self.samples_played.load(Ordering::Relaxed) as isize;
        let mut new_position = (current + sample_offset).max(0) as usize;
        new_position = new_position.min(self.total_samples);
        // Keep the offset frame-aligned so channels never swap
        new_position -= new_position % channels;

        let was_playing = !self.sink.is_paused();
        self.restart_at(new_position, was_playing);
    }
}

// Source over the shared decoded buffer, counting samples as they play
struct TrackSource {
    audio: Arc<DecodedAudio>,
    position: usize,
    samples_played: Arc<AtomicUsize>,
}

impl TrackSource {
    fn new(audio: Arc<DecodedAudio>, position: usize, samples_played: Arc<AtomicUsize>) -> Self {
        Self {
            audio,
            position,
            samples_played,
        }
    }
}

impl Iterator for TrackSource {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.audio.samples.len() {
            return None;
        }

        let sample = self.audio.samples[self.position];
        self.position += 1;
        self.samples_played.fetch_add(1, Ordering::Relaxed);

        Some(sample)
    }
}

impl Source for TrackSource {
    fn current_span_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        self.audio.channels.max(1)
    }

    fn sample_rate(&self) -> u32 {
        self.audio.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(self.audio.duration())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_ci_environment() -> bool {
        std::env::var("CI").is_ok()
            || std::env::var("GITHUB_ACTIONS").is_ok()
            || std::env::var("TRAVIS").is_ok()
            || std::env::var("CIRCLECI").is_ok()
    }

    fn skip_if_no_audio() -> bool {
        if is_ci_environment() {
            eprintln!("Skipping audio test in CI environment");
            return true;
        }
        false
    }

    #[test]
    fn test_track_source_counts_samples() {
        let audio = Arc::new(DecodedAudio {
            samples: vec![0.1, 0.2, 0.3, 0.4],
            sample_rate: 8000,
            channels: 2,
        });
        let counter = Arc::new(AtomicUsize::new(0));
        let source = TrackSource::new(audio, 0, counter.clone());

        let collected: Vec<f32> = source.collect();
        assert_eq!(collected.len(), 4);
        assert_eq!(counter.load(Ordering::Relaxed), 4);
    }

    #[test]
    fn test_track_source_starts_at_offset() {
        let audio = Arc::new(DecodedAudio {
            samples: vec![0.1, 0.2, 0.3, 0.4],
            sample_rate: 8000,
            channels: 1,
        });
        let counter = Arc::new(AtomicUsize::new(2));
        let mut source = TrackSource::new(audio, 2, counter);

        assert_eq!(source.next(), Some(0.3));
        assert_eq!(source.next(), Some(0.4));
        assert_eq!(source.next(), None);
    }

    #[test]
    fn test_new_audio_engine() {
        if skip_if_no_audio() {
            return;
        }

        let engine = AudioEngine::new().unwrap();
        assert!(engine.info.is_none());
        assert!(engine.duration.is_none());
        assert_eq!(engine.total_samples, 0);
        assert_eq!(engine.get_progress(), 0.0);
        assert_eq!(engine.total_frames(), 0);
    }

    #[test]
    fn test_load_nonexistent_file() {
        if skip_if_no_audio() {
            return;
        }

        let mut engine = AudioEngine::new().unwrap();
        assert!(engine.load_file(Path::new("/nonexistent/file.wav")).is_err());
    }

    #[test]
    fn test_volume_control() {
        if skip_if_no_audio() {
            return;
        }

        let mut engine = AudioEngine::new().unwrap();
        assert_eq!(engine.volume(), 1.0);

        engine.set_volume(0.5);
        assert_eq!(engine.volume(), 0.5);

        // Out-of-range volumes are clamped
        engine.set_volume(5.0);
        assert_eq!(engine.volume(), 2.0);
        engine.set_volume(-1.0);
        assert_eq!(engine.volume(), 0.0);
    }

    #[test]
    fn test_seek_without_file_is_noop() {
        if skip_if_no_audio() {
            return;
        }

        let mut engine = AudioEngine::new().unwrap();
        engine.seek_relative(5.0);
        engine.seek_to_fraction(0.5);
        assert_eq!(engine.get_progress(), 0.0);
    }
}
