pub mod app;
pub mod audio;
pub mod decode;
pub mod envelope;
pub mod playlist;
pub mod ui;
pub mod waveform;

use std::error::Error;
use std::path::Path;

use crate::config::Config;

pub fn run(
    file: Option<&Path>,
    scan_dir: Option<&Path>,
    config: Config,
) -> Result<(), Box<dyn Error>> {
    app::run(file, scan_dir, config)
}
