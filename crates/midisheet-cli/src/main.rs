//! midisheet - inspect MIDI files as sheet music and rewrite them for playback
//!
//! Subcommands:
//! - `midisheet info <file>` - Header, time signature and tracks
//! - `midisheet notes <file>` - Notes as they would be drawn
//! - `midisheet measures <file>` - Guessed measure lengths
//! - `midisheet rewrite <file> <out>` - Write a retuned copy for playback

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use sheetconf::SheetConfig;

mod commands;
mod telemetry;

#[derive(Parser)]
#[command(name = "midisheet")]
#[command(about = "Inspect MIDI files as sheet music and rewrite them for playback")]
#[command(version)]
struct Cli {
    /// Config file to use instead of ./midisheet.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the header, time signature and tracks of a file
    Info {
        file: PathBuf,
    },

    /// Print the notes after chord alignment and staff layout
    Notes {
        file: PathBuf,

        /// Print tracks as JSON
        #[arg(long)]
        json: bool,

        /// Merge all tracks into treble and bass staves
        #[arg(long, conflicts_with = "one_staff")]
        two_staffs: bool,

        /// Keep one staff per track
        #[arg(long)]
        one_staff: bool,

        /// Semitones to transpose by
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        transpose: i32,

        /// Pulses to shift every note by
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        shift: i64,

        /// Notes starting this close together (ms) form one chord
        #[arg(long)]
        combine_ms: Option<u32>,

        /// Track index to hide (repeatable)
        #[arg(long)]
        hide: Vec<usize>,
    },

    /// Print the measure length of the time signature and guessed alternatives
    Measures {
        file: PathBuf,
    },

    /// Write a copy of the file with playback options applied
    Rewrite {
        file: PathBuf,

        out: PathBuf,

        /// Tempo in microseconds per quarter note
        #[arg(long)]
        tempo: Option<u32>,

        /// Semitones to transpose by
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        transpose: i32,

        /// Start playback at this pulse
        #[arg(long, default_value_t = 0)]
        pause: u64,

        /// Track index to mute (repeatable)
        #[arg(long)]
        mute: Vec<usize>,

        /// Track index to hide (repeatable)
        #[arg(long)]
        hide: Vec<usize>,

        /// Replace a track's instrument, as TRACK=PROGRAM (repeatable)
        #[arg(long, value_parser = commands::parse_instrument)]
        instrument: Vec<(usize, u8)>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = SheetConfig::load_from(cli.config.as_deref())?;
    telemetry::init(&config.logging.log_level)?;

    match cli.command {
        Commands::Info { file } => commands::info(&file),
        Commands::Notes {
            file,
            json,
            two_staffs,
            one_staff,
            transpose,
            shift,
            combine_ms,
            hide,
        } => {
            let staffs = match (two_staffs, one_staff) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            commands::notes(
                &file,
                &config,
                &commands::NotesArgs {
                    json,
                    two_staffs: staffs,
                    transpose,
                    shift,
                    combine_ms,
                    hide,
                },
            )
        }
        Commands::Measures { file } => commands::measures(&file),
        Commands::Rewrite {
            file,
            out,
            tempo,
            transpose,
            pause,
            mute,
            hide,
            instrument,
        } => commands::rewrite(
            &file,
            &out,
            &config,
            &commands::RewriteArgs {
                tempo,
                transpose,
                pause,
                mute,
                hide,
                instruments: instrument,
            },
        ),
    }
}
