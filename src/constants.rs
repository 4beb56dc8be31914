//! Project-wide constants used across multiple modules.
//!
//! This module centralizes constant definitions to avoid duplication and ensure
//! consistency across the codebase.

/// Supported audio file extensions
pub const AUDIO_EXTENSIONS: &[&str] = &["wav", "flac"];

/// Default interval between playback position refreshes, in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Default relative seek step for the arrow keys, in seconds
pub const DEFAULT_SEEK_STEP_SECS: f32 = 5.0;
