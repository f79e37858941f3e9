//! CLI command implementations

use std::path::Path;

use anyhow::{bail, Context, Result};
use midisheet::{instruments, MidiFile, Options};
use sheetconf::SheetConfig;

/// Flags of the `notes` command.
pub struct NotesArgs {
    pub json: bool,
    /// None leaves the choice to the config.
    pub two_staffs: Option<bool>,
    pub transpose: i32,
    pub shift: i64,
    pub combine_ms: Option<u32>,
    pub hide: Vec<usize>,
}

/// Flags of the `rewrite` command.
pub struct RewriteArgs {
    pub tempo: Option<u32>,
    pub transpose: i32,
    pub pause: u64,
    pub mute: Vec<usize>,
    pub hide: Vec<usize>,
    pub instruments: Vec<(usize, u8)>,
}

/// Parse a `TRACK=PROGRAM` pair. Program 128 selects percussion.
pub fn parse_instrument(s: &str) -> Result<(usize, u8), String> {
    let (track, program) = s
        .split_once('=')
        .ok_or_else(|| format!("expected TRACK=PROGRAM, got '{s}'"))?;
    let track = track
        .trim()
        .parse()
        .map_err(|e| format!("invalid track index '{track}': {e}"))?;
    let program: u8 = program
        .trim()
        .parse()
        .map_err(|e| format!("invalid program '{program}': {e}"))?;
    if program > instruments::PERCUSSION {
        return Err(format!("program {program} is out of range 0-128"));
    }
    Ok((track, program))
}

fn open(file: &Path) -> Result<MidiFile> {
    let midi = MidiFile::open(file).with_context(|| format!("Failed to load {}", file.display()))?;
    tracing::debug!(
        tracks = midi.tracks().len(),
        channel_split = midi.is_channel_split(),
        "loaded {}",
        file.display()
    );
    Ok(midi)
}

fn check_track(midi: &MidiFile, track: usize) -> Result<()> {
    let count = midi.tracks().len();
    if track >= count {
        bail!("Track {} does not exist (file has {} tracks)", track, count);
    }
    Ok(())
}

/// Options for `midi` with the config's notation and playback settings applied.
pub fn configured_options(midi: &MidiFile, config: &SheetConfig) -> Options {
    let mut options = Options::for_file(midi);
    options.combine_interval = config.notation.combine_interval_ms;
    options.two_staffs = config.notation.two_staffs.two_staffs(midi.tracks().len());
    options.use_default_instruments = config.playback.use_default_instruments;
    options.tempo = config.playback.scale_tempo(options.tempo);
    options
}

/// Print header, time signature and track summary
pub fn info(file: &Path) -> Result<()> {
    let midi = open(file)?;

    println!("{}", file.display());
    println!(
        "  format {}, {} pulses per quarter, {} raw tracks",
        midi.format(),
        midi.pulses_per_quarter(),
        midi.events().len()
    );
    println!("  time: {}", midi.time());
    println!("  length: {} pulses", midi.total_pulses());
    if midi.is_channel_split() {
        println!("  one track split by channel");
    }

    for (index, track) in midi.tracks().iter().enumerate() {
        let mut line = format!(
            "  [{}] track {}: {} ({}), {} notes",
            index,
            track.number,
            track.instrument_name(),
            track.instrument,
            track.notes.len()
        );
        if track.has_lyrics() {
            line.push_str(&format!(", {} lyrics", track.lyrics.len()));
        }
        println!("{}", line);
    }

    Ok(())
}

/// Print notes as the notation view lays them out
pub fn notes(file: &Path, config: &SheetConfig, args: &NotesArgs) -> Result<()> {
    let midi = open(file)?;
    let mut options = configured_options(&midi, config);

    if let Some(two_staffs) = args.two_staffs {
        options.two_staffs = two_staffs;
    }
    if let Some(ms) = args.combine_ms {
        options.combine_interval = ms;
    }
    options.transpose = args.transpose;
    options.shift_time = args.shift;
    for &track in &args.hide {
        check_track(&midi, track)?;
        options.tracks[track] = false;
    }

    let tracks = midi.change_notes(&options);

    if args.json {
        let output = serde_json::to_string_pretty(&tracks)?;
        println!("{}", output);
        return Ok(());
    }

    for track in &tracks {
        println!(
            "track {} ({}): {} notes",
            track.number,
            track.instrument_name(),
            track.notes.len()
        );
        for note in &track.notes {
            println!(
                "  {:>8} ch{:<2} pitch {:>3} dur {}",
                note.start_time, note.channel, note.pitch, note.duration
            );
        }
        for lyric in &track.lyrics {
            println!("  {:>8} lyric {:?}", lyric.start_time, lyric.text);
        }
    }

    Ok(())
}

/// Print the time signature's measure and guessed measure lengths
pub fn measures(file: &Path) -> Result<()> {
    let midi = open(file)?;

    println!("time signature measure: {} pulses", midi.time().measure());
    let guesses = midi.guess_measure_length();
    if guesses.is_empty() {
        println!("no measure guesses");
    }
    for guess in guesses {
        println!("{}", guess);
    }

    Ok(())
}

/// Write a retuned copy of the file
pub fn rewrite(file: &Path, out: &Path, config: &SheetConfig, args: &RewriteArgs) -> Result<()> {
    let midi = open(file)?;
    let mut options = configured_options(&midi, config);

    if let Some(tempo) = args.tempo {
        if tempo == 0 || tempo > 0xFF_FFFF {
            bail!("Tempo {} is out of range 1-16777215", tempo);
        }
        options.tempo = tempo;
    }
    options.transpose = args.transpose;
    options.pause_time = args.pause;
    for &track in &args.mute {
        check_track(&midi, track)?;
        options.mute[track] = true;
    }
    for &track in &args.hide {
        check_track(&midi, track)?;
        options.tracks[track] = false;
    }
    for &(track, program) in &args.instruments {
        check_track(&midi, track)?;
        options.instruments[track] = program;
        options.use_default_instruments = false;
    }

    midi.write(out, Some(&options))
        .with_context(|| format!("Failed to write {}", out.display()))?;

    tracing::info!(
        tempo = options.tempo,
        transpose = options.transpose,
        pause = options.pause_time,
        "wrote {}",
        out.display()
    );
    println!("wrote {}", out.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_instrument() {
        assert_eq!(parse_instrument("2=40"), Ok((2, 40)));
        assert_eq!(parse_instrument("0=128"), Ok((0, 128)));
        assert!(parse_instrument("0=129").is_err());
        assert!(parse_instrument("40").is_err());
        assert!(parse_instrument("x=1").is_err());
    }
}
