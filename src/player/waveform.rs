//! Waveform downsampling and progress geometry.
//!
//! Turns a cached amplitude envelope into one vertical line segment per
//! horizontal pixel column: each column covers a contiguous slice of the
//! envelope and draws from the slice minimum to the slice maximum around the
//! vertical center. Columns left of the playback position are flagged so the
//! caller can draw them in the progress color.
//!
//! Also owns both directions of the position mapping: pointer x to progress
//! fraction, and progress fraction to an absolute frame offset for seeking.
//! Everything here is a pure function of its inputs; the envelope is never
//! mutated and identical inputs always yield identical output.

/// One vertical line for a single pixel column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub x: f32,
    pub y_top: f32,
    pub y_bottom: f32,
    /// Whether this column falls within the already-played region.
    pub played: bool,
}

/// Downsample `envelope` to `width` columns of `height` pixels.
///
/// Column `i` covers envelope indices `[i*n/width, (i+1)*n/width)`, so the
/// columns partition the envelope with no gaps regardless of whether `n` is a
/// multiple of `width`. Amplitudes are assumed normalized to [-1.0, 1.0] and
/// are drawn on a flipped y-axis (y grows downward, 0 at the top).
///
/// An empty envelope or zero width yields an empty output. When `width`
/// exceeds the envelope length some slices are empty; those columns are
/// skipped rather than drawn.
pub fn render(envelope: &[f32], width: usize, height: f32, progress: f32) -> Vec<Segment> {
    let n = envelope.len();
    if n == 0 || width == 0 {
        return Vec::new();
    }

    let progress = progress.clamp(0.0, 1.0);
    let center_y = height / 2.0;
    let progress_boundary = width as f32 * progress;

    let mut segments = Vec::with_capacity(width);
    for i in 0..width {
        let start = i * n / width;
        let end = (((i + 1) * n) / width).min(n);
        if start >= end {
            continue;
        }

        let slice = &envelope[start..end];
        let max = slice.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let min = slice.iter().copied().fold(f32::INFINITY, f32::min);

        segments.push(Segment {
            x: i as f32,
            y_top: center_y - max * center_y,
            y_bottom: center_y - min * center_y,
            // A column exactly on the boundary counts as played, except at
            // zero progress where nothing has been played yet
            played: progress > 0.0 && i as f32 <= progress_boundary,
        });
    }

    segments
}

/// Map a pointer x-coordinate to a progress fraction.
///
/// Pointer coordinates can legitimately land outside the control during a
/// drag, so out-of-range values are clamped instead of rejected.
pub fn progress_at(x: f32, width: f32) -> f32 {
    if width <= 0.0 {
        return 0.0;
    }
    (x / width).clamp(0.0, 1.0)
}

/// Map a progress fraction to an absolute frame offset for seeking.
pub fn seek_frame(total_frames: usize, fraction: f32) -> usize {
    let fraction = fraction.clamp(0.0, 1.0) as f64;
    let frame = (total_frames as f64 * fraction).floor() as usize;
    frame.min(total_frames)
}
