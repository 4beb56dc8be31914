//! Main application state and control flow for the player.
//!
//! This module coordinates the audio engine, envelope extraction, playlist,
//! and terminal UI. It owns the event loop: keyboard input, mouse clicks on
//! the waveform timeline, and the fixed-interval playback position poll that
//! keeps the progress overlay in sync with the engine.

use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, MouseButton, MouseEvent,
        MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::info;
use ratatui::{Terminal, backend::CrosstermBackend, layout::Rect};
use std::error::Error;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use super::audio::AudioEngine;
use super::envelope::{AmplitudeEnvelope, EnvelopeLoader};
use super::playlist::Playlist;
use super::ui;
use super::waveform;
use crate::config::Config;

const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(3);
const VOLUME_STEP: f32 = 0.1;
const PERCENT_JUMP: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewMode {
    Player,
    Playlist,
}

/// Explicit playback state, written by the position poll and by seeks,
/// read by the renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaybackSession {
    /// Playback position as a fraction of total duration, in [0.0, 1.0]
    pub position: f32,
    pub is_playing: bool,
}

pub struct App {
    pub should_quit: bool,
    pub current_file: Option<PathBuf>,
    pub session: PlaybackSession,
    pub audio_engine: Option<AudioEngine>,
    pub envelope: Option<AmplitudeEnvelope>,
    loader: EnvelopeLoader,
    pub playlist: Playlist,
    pub duration: Option<Duration>,
    pub view_mode: ViewMode,
    pub filter_active: bool,
    pub status_message: Option<String>,
    status_timer: Option<Instant>,
    config: Config,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self {
            should_quit: false,
            current_file: None,
            session: PlaybackSession::default(),
            audio_engine: None,
            envelope: None,
            loader: EnvelopeLoader::new(),
            playlist: Playlist::new(),
            duration: None,
            view_mode: ViewMode::Player,
            filter_active: false,
            status_message: None,
            status_timer: None,
            config,
        }
    }

    pub fn load_file(&mut self, path: &Path) -> Result<(), Box<dyn Error>> {
        if self.audio_engine.is_none() {
            let mut engine = AudioEngine::new()?;
            engine.set_volume(self.config.volume);
            self.audio_engine = Some(engine);
        }

        if let Some(engine) = &mut self.audio_engine {
            engine.load_file(path)?;
            self.duration = engine.duration;
            self.current_file = Some(path.to_path_buf());
            self.session.position = 0.0;

            // The previous track's envelope stays on screen until the new
            // one arrives; the loader result is matched against
            // current_file before being accepted.
            self.loader.request(path.to_path_buf());

            if self.config.autoplay {
                self.session.is_playing = true;
                engine.play();
            } else {
                self.session.is_playing = false;
            }
        }

        Ok(())
    }

    pub fn toggle_playback(&mut self) {
        if let Some(engine) = &mut self.audio_engine {
            if self.session.is_playing {
                engine.pause();
                self.session.is_playing = false;
            } else {
                // If at the end, restart from the beginning
                if self.session.position >= 0.99 {
                    engine.seek_to_fraction(0.0);
                    self.session.position = 0.0;
                }
                engine.play();
                self.session.is_playing = true;
            }
        }
    }

    /// Absolute seek: write the fraction into the session and forward it to
    /// the engine, which converts it to a frame offset.
    pub fn seek_to_fraction(&mut self, fraction: f32) {
        if let Some(engine) = &mut self.audio_engine {
            let fraction = fraction.clamp(0.0, 1.0);
            engine.seek_to_fraction(fraction);
            self.session.position = fraction;
        }
    }

    pub fn seek_relative(&mut self, seconds: f32) {
        if let Some(engine) = &mut self.audio_engine {
            engine.seek_relative(seconds);
            self.session.position = engine.get_progress();
        }
    }

    fn seek_percentage(&mut self, percentage: f32) {
        if let Some(duration) = self.duration {
            self.seek_relative(duration.as_secs_f32() * percentage);
        }
    }

    pub fn adjust_volume(&mut self, delta: f32) {
        if let Some(engine) = &mut self.audio_engine {
            let volume = engine.volume() + delta;
            engine.set_volume(volume);
        } else {
            self.config.volume = (self.config.volume + delta).clamp(0.0, 2.0);
        }
    }

    pub fn volume(&self) -> f32 {
        self.audio_engine
            .as_ref()
            .map(|e| e.volume())
            .unwrap_or(self.config.volume)
    }

    /// Per-tick housekeeping: envelope handoff, position refresh, status expiry.
    pub fn update(&mut self) {
        self.poll_envelope();
        self.refresh_position();

        if let Some(timer) = self.status_timer
            && timer.elapsed() > STATUS_MESSAGE_TTL
        {
            self.status_message = None;
            self.status_timer = None;
        }
    }

    fn poll_envelope(&mut self) {
        while let Some(done) = self.loader.try_recv() {
            if Some(done.path.as_path()) != self.current_file.as_deref() {
                log::debug!("Discarding stale envelope for {:?}", done.path);
                continue;
            }
            match done.result {
                Ok(envelope) => {
                    info!("Envelope ready: {} frames", envelope.len());
                    self.envelope = Some(envelope);
                }
                Err(e) => {
                    // Keep whatever envelope is currently displayed
                    log::error!("Envelope extraction failed: {e}");
                    self.set_status(format!("Waveform unavailable: {e}"));
                }
            }
        }
    }

    fn refresh_position(&mut self) {
        if let Some(engine) = &self.audio_engine {
            self.session.position = engine.get_progress();

            if self.session.is_playing && self.session.position >= 1.0 {
                engine.pause();
                self.session.is_playing = false;
            }
        }
    }

    fn set_status(&mut self, message: String) {
        self.status_message = Some(message);
        self.status_timer = Some(Instant::now());
    }
}

pub fn run(
    file_path: Option<&Path>,
    scan_dir: Option<&Path>,
    config: Config,
) -> Result<(), Box<dyn Error>> {
    init_logging()?;
    info!("Starting wavedeck");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config);

    // Populate the playlist from the scan root: --dir, the file's parent,
    // or the current directory
    let root = scan_dir
        .map(Path::to_path_buf)
        .or_else(|| file_path.and_then(|p| p.parent().map(Path::to_path_buf)))
        .unwrap_or_else(|| PathBuf::from("."));
    if let Err(e) = app.playlist.scan_directory(&root) {
        log::error!("Could not scan {root:?}: {e}");
    }

    if let Some(path) = file_path
        && let Err(e) = app.load_file(path)
    {
        // Clean up terminal before showing the error
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;
        return Err(e);
    }

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = res {
        eprintln!("Error: {e}");
        return Err(e);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<(), Box<dyn Error>> {
    let poll_interval = Duration::from_millis(app.config.poll_interval_ms.max(1));

    loop {
        app.update();

        terminal.draw(|f| ui::draw(f, app))?;

        // The poll timeout doubles as the position refresh interval
        if event::poll(poll_interval)? {
            let size = terminal.size()?;
            let frame_area = Rect::new(0, 0, size.width, size.height);
            match event::read()? {
                Event::Key(key) => handle_key_event(app, key)?,
                Event::Mouse(mouse) => handle_mouse_event(app, mouse, frame_area),
                _ => {}
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_mouse_event(app: &mut App, mouse: MouseEvent, frame_area: Rect) {
    if app.view_mode != ViewMode::Player {
        return;
    }

    let pressed = matches!(
        mouse.kind,
        MouseEventKind::Down(MouseButton::Left) | MouseEventKind::Drag(MouseButton::Left)
    );
    if !pressed {
        return;
    }

    let inner = ui::waveform_inner_area(frame_area);
    if inner.width == 0 {
        return;
    }

    // Accept any press on the timeline's rows; the x-coordinate is clamped
    // so drags past the edges still seek to the ends
    if mouse.row >= inner.y && mouse.row < inner.y + inner.height {
        let x = mouse.column as f32 - inner.x as f32;
        let fraction = waveform::progress_at(x, inner.width as f32);
        app.seek_to_fraction(fraction);
    }
}

fn handle_key_event(app: &mut App, key: event::KeyEvent) -> Result<(), Box<dyn Error>> {
    match app.view_mode {
        ViewMode::Player => handle_player_keys(app, key),
        ViewMode::Playlist => handle_playlist_keys(app, key),
    }
}

fn handle_player_keys(app: &mut App, key: event::KeyEvent) -> Result<(), Box<dyn Error>> {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char(' ') => app.toggle_playback(),
        KeyCode::Char('p') | KeyCode::Char('/') => {
            app.view_mode = ViewMode::Playlist;
            app.filter_active = false;
        }
        KeyCode::Left => {
            if key.modifiers.contains(event::KeyModifiers::SHIFT) {
                app.seek_percentage(-PERCENT_JUMP);
            } else {
                app.seek_relative(-app.config.seek_step_secs);
            }
        }
        KeyCode::Right => {
            if key.modifiers.contains(event::KeyModifiers::SHIFT) {
                app.seek_percentage(PERCENT_JUMP);
            } else {
                app.seek_relative(app.config.seek_step_secs);
            }
        }
        KeyCode::Char('+') | KeyCode::Char('=') => app.adjust_volume(VOLUME_STEP),
        KeyCode::Char('-') => app.adjust_volume(-VOLUME_STEP),
        _ => {}
    }
    Ok(())
}

fn handle_playlist_keys(app: &mut App, key: event::KeyEvent) -> Result<(), Box<dyn Error>> {
    if app.filter_active {
        match key.code {
            KeyCode::Esc | KeyCode::Enter => app.filter_active = false,
            KeyCode::Backspace => app.playlist.pop_char(),
            KeyCode::Char('u') if key.modifiers.contains(event::KeyModifiers::CONTROL) => {
                app.playlist.clear_filter();
            }
            KeyCode::Char(c) => app.playlist.push_char(c),
            _ => {}
        }
        return Ok(());
    }

    match key.code {
        KeyCode::Esc => app.view_mode = ViewMode::Player,
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('/') => app.filter_active = true,
        KeyCode::Up | KeyCode::Char('k') => app.playlist.select_previous(),
        KeyCode::Down | KeyCode::Char('j') => app.playlist.select_next(),
        KeyCode::Enter => {
            if let Some(path) = app.playlist.selected_path().map(Path::to_path_buf) {
                if let Err(e) = app.load_file(&path) {
                    log::error!("Could not load {path:?}: {e}");
                    app.set_status(format!("Could not load file: {e}"));
                }
                app.view_mode = ViewMode::Player;
            }
        }
        _ => {}
    }
    Ok(())
}

fn init_logging() -> Result<(), Box<dyn Error>> {
    use simplelog::{CombinedLogger, Config as LogConfig, LevelFilter, WriteLogger};
    use std::fs::File;

    let log_file = std::env::temp_dir().join("wavedeck.log");
    CombinedLogger::init(vec![WriteLogger::new(
        LevelFilter::Info,
        LogConfig::default(),
        File::create(log_file)?,
    )])?;

    Ok(())
}
