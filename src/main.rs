//! wavedeck - terminal audio player with a waveform timeline.
//!
//! Point it at a WAV or FLAC file (or a directory of them) and it plays the
//! audio while drawing the full track's amplitude envelope, with the played
//! portion highlighted. Click the waveform or use the arrow keys to seek;
//! a playlist pane lists every audio file found under the scan root.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Generator, Shell, generate};
use std::error::Error;
use std::io;
use std::path::PathBuf;

use wavedeck::config::Config;
use wavedeck::player;

#[derive(Parser)]
#[command(name = "wavedeck")]
#[command(about = "Terminal audio player with a waveform timeline")]
#[command(version)]
struct Cli {
    /// Audio file to play (WAV or FLAC)
    file: Option<PathBuf>,

    /// Directory to scan for the playlist (defaults to the file's parent,
    /// or the current directory)
    #[arg(short, long)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Generate shell completions
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// View current configuration
    View,
    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },
}

fn print_completions<G: Generator>(generator: G, cmd: &mut clap::Command) {
    generate(
        generator,
        cmd,
        cmd.get_name().to_string(),
        &mut io::stdout(),
    );
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            print_completions(shell, &mut cmd);
            Ok(())
        }
        Some(Commands::Config { action }) => match action {
            ConfigAction::View => {
                let config = Config::load()?;
                println!("{}", toml::to_string_pretty(&config)?);
                Ok(())
            }
            ConfigAction::Set { key, value } => {
                let mut config = Config::load()?;
                config.set_value(&key, &value)?;
                config.save()?;
                println!("{key} = {value}");
                Ok(())
            }
        },
        None => {
            let config = Config::load()?;
            player::run(cli.file.as_deref(), cli.dir.as_deref(), config)
        }
    }
}
