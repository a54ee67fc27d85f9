//! Fire-and-forget sound playback.
//!
//! Clips are decoded once at startup; a dedicated mixer thread owns the
//! output device and receives cues over a channel.  Playback overlaps
//! freely (each cue gets its own detached sink) and degrades to silence
//! when no audio device is available.

use anyhow::{Context, Result};
use rodio::buffer::SamplesBuffer;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

// ════════════════════════════════════════════════════════════════════════════
// Clip — a decoded sound effect
// ════════════════════════════════════════════════════════════════════════════

/// PCM samples held in memory so cues replay without touching the disk.
#[derive(Clone, Debug)]
pub struct Clip {
    pub channels:    u16,
    pub sample_rate: u32,
    pub samples:     Vec<i16>,
}

impl Clip {
    /// Decode an audio asset.  Missing files are fatal at startup.
    pub fn load(path: &Path) -> Result<Clip> {
        let file = File::open(path)
            .with_context(|| format!("failed to open sound asset {:?}", path))?;
        let decoder = Decoder::new(BufReader::new(file))
            .with_context(|| format!("failed to decode sound asset {:?}", path))?;
        let channels = decoder.channels();
        let sample_rate = decoder.sample_rate();
        let samples: Vec<i16> = decoder.collect();
        Ok(Clip {
            channels,
            sample_rate,
            samples,
        })
    }
}

/// The game's two sound effects.
pub struct ClipBank {
    pub explosion: Clip,
    pub game_over: Clip,
}

impl ClipBank {
    pub fn load(explosion: &Path, game_over: &Path) -> Result<ClipBank> {
        Ok(ClipBank {
            explosion: Clip::load(explosion)?,
            game_over: Clip::load(game_over)?,
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SoundOut — abstraction over rodio / null (when no device exists)
// ════════════════════════════════════════════════════════════════════════════

trait SoundOut {
    fn play(&mut self, clip: &Clip);
}

// ── rodio backend ─────────────────────────────────────────────────────────

struct RodioOut {
    _stream: OutputStream,
    handle:  OutputStreamHandle,
}

impl SoundOut for RodioOut {
    fn play(&mut self, clip: &Clip) {
        let buf = SamplesBuffer::new(clip.channels, clip.sample_rate, clip.samples.clone());
        match Sink::try_new(&self.handle) {
            Ok(sink) => {
                sink.append(buf);
                sink.detach();
            }
            Err(e) => eprintln!("[audio] playback failed: {}", e),
        }
    }
}

// ── null backend ──────────────────────────────────────────────────────────

struct NullOut;
impl SoundOut for NullOut {
    fn play(&mut self, _clip: &Clip) {}
}

/// Open the default output device, falling back to silence with a warning.
/// The stream must live on the mixer thread; it is not `Send`.
fn open_sound_output() -> Box<dyn SoundOut> {
    match OutputStream::try_default() {
        Ok((stream, handle)) => Box::new(RodioOut {
            _stream: stream,
            handle,
        }),
        Err(e) => {
            eprintln!("[audio] no output device ({}) — running silent", e);
            Box::new(NullOut)
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Mixer — the playback thread
// ════════════════════════════════════════════════════════════════════════════

/// Sound cues the game can fire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cue {
    Explosion,
    GameOver,
}

enum MixerCommand {
    Play(Cue),
    Quit,
}

/// Handle to the mixer thread.
pub struct Mixer {
    cmd_tx: Sender<MixerCommand>,
}

impl Mixer {
    /// Spawn the mixer thread with a bank of decoded clips.
    pub fn spawn(bank: ClipBank) -> Mixer {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        thread::spawn(move || mixer_thread(bank, cmd_rx));
        Mixer { cmd_tx }
    }

    pub fn explosion(&self) {
        let _ = self.cmd_tx.send(MixerCommand::Play(Cue::Explosion));
    }

    pub fn game_over(&self) {
        let _ = self.cmd_tx.send(MixerCommand::Play(Cue::GameOver));
    }

    pub fn quit(&self) {
        let _ = self.cmd_tx.send(MixerCommand::Quit);
    }
}

fn mixer_thread(bank: ClipBank, cmd_rx: Receiver<MixerCommand>) {
    let mut out = open_sound_output();
    for cmd in cmd_rx {
        match cmd {
            MixerCommand::Play(Cue::Explosion) => out.play(&bank.explosion),
            MixerCommand::Play(Cue::GameOver)  => out.play(&bank.game_over),
            MixerCommand::Quit                 => return,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
