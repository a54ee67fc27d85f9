//! Hand tracking — real webcam + MediaPipe sidecar, or mouse simulation.
//!
//! The public interface is [`HandFrame`] delivered over an `mpsc` channel.
//! Consumers don't need to know whether frames came from real hardware or
//! the simulator; both deliver normalized landmarks already in the mirrored
//! ("front-facing camera") orientation the screen uses.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

// ════════════════════════════════════════════════════════════════════════════
// Landmark topology (MediaPipe hand model, 21 points)
// ════════════════════════════════════════════════════════════════════════════

pub const LANDMARK_COUNT: usize = 21;

/// The index fingertip — the sole interactive point of the game.
pub const INDEX_FINGER_TIP: usize = 8;

/// Skeletal edges between landmark indices, drawn by the overlay.
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    (0, 1), (1, 2), (2, 3), (3, 4),             // thumb
    (0, 5), (5, 6), (6, 7), (7, 8),             // index
    (5, 9), (9, 10), (10, 11), (11, 12),        // middle
    (9, 13), (13, 14), (14, 15), (15, 16),      // ring
    (13, 17), (17, 18), (18, 19), (19, 20),     // pinky
    (0, 17),                                    // palm base
];

// ════════════════════════════════════════════════════════════════════════════
// HandFrame — one detection result
// ════════════════════════════════════════════════════════════════════════════

/// A single keypoint, normalized to [0, 1] in both axes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
}

/// One detected hand: a fixed-length ordered landmark sequence.
#[derive(Clone, Debug)]
pub struct Hand {
    pub landmarks: [Landmark; LANDMARK_COUNT],
}

impl Hand {
    /// All landmarks mapped into screen pixel space.
    pub fn to_pixels(&self, width: usize, height: usize) -> [(i32, i32); LANDMARK_COUNT] {
        let mut out = [(0, 0); LANDMARK_COUNT];
        for (i, lm) in self.landmarks.iter().enumerate() {
            out[i] = (
                (lm.x * width as f32) as i32,
                (lm.y * height as f32) as i32,
            );
        }
        out
    }

    /// The index fingertip in screen pixel space.
    pub fn fingertip(&self, width: usize, height: usize) -> (i32, i32) {
        let tip = self.landmarks[INDEX_FINGER_TIP];
        ((tip.x * width as f32) as i32, (tip.y * height as f32) as i32)
    }
}

/// Zero or more hands seen in one capture frame.
#[derive(Clone, Debug, Default)]
pub struct HandFrame {
    pub hands: Vec<Hand>,
}

// ════════════════════════════════════════════════════════════════════════════
// HandSource trait — unified interface for hw and sim
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver [`HandFrame`]s over a channel.
pub trait HandSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<HandFrame>);
}

/// Spawn a hand source on its own thread and return the receiving end.
///
/// The game loop never blocks on capture or inference; it consumes the most
/// recent frame the source has delivered.
pub fn spawn_hand_source<H: HandSource>(source: H) -> Receiver<HandFrame> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || Box::new(source).run(tx));
    rx
}

// ════════════════════════════════════════════════════════════════════════════
// SimHandSource — mouse-driven simulation (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Raw pointer event from the simulation window.
#[derive(Clone, Copy, Debug)]
pub enum SimInput {
    /// Cursor position, normalized to the window.
    Pointer { x: f32, y: f32 },
    /// Cursor left the window — no hands this frame.
    PointerGone,
}

/// Hand source driven by [`SimInput`] events from the visualizer's window.
///
/// The cursor stands in for the index fingertip; the remaining 20 landmarks
/// are synthesized around it so the skeleton overlay renders the same as in
/// hardware mode.
pub struct SimHandSource {
    pub rx: Receiver<SimInput>,
}

impl HandSource for SimHandSource {
    fn run(self: Box<Self>, tx: Sender<HandFrame>) {
        for input in self.rx {
            let frame = match input {
                SimInput::Pointer { x, y } => HandFrame {
                    hands: vec![synthetic_hand(x, y)],
                },
                SimInput::PointerGone => HandFrame::default(),
            };
            if tx.send(frame).is_err() {
                return;
            }
        }
    }
}

/// Normalized offsets of each landmark relative to the index fingertip,
/// sketching a right hand pointing up.
const SYNTH_OFFSETS: [(f32, f32); LANDMARK_COUNT] = [
    (0.030, 0.300),                                                     // wrist
    (-0.050, 0.260), (-0.080, 0.210), (-0.100, 0.170), (-0.110, 0.130), // thumb
    (0.000, 0.180), (0.000, 0.120), (0.000, 0.060), (0.000, 0.000),     // index
    (0.030, 0.190), (0.035, 0.120), (0.040, 0.070), (0.045, 0.030),     // middle
    (0.060, 0.200), (0.070, 0.140), (0.075, 0.090), (0.080, 0.060),     // ring
    (0.090, 0.220), (0.100, 0.170), (0.110, 0.130), (0.115, 0.100),     // pinky
];

/// Build a plausible 21-landmark hand with the index fingertip at `(x, y)`.
pub fn synthetic_hand(x: f32, y: f32) -> Hand {
    let mut landmarks = [Landmark::default(); LANDMARK_COUNT];
    for (i, (dx, dy)) in SYNTH_OFFSETS.iter().enumerate() {
        landmarks[i] = Landmark {
            x: (x + dx).clamp(0.0, 1.0),
            y: (y + dy).clamp(0.0, 1.0),
        };
    }
    landmarks[INDEX_FINGER_TIP] = Landmark {
        x: x.clamp(0.0, 1.0),
        y: y.clamp(0.0, 1.0),
    };
    Hand { landmarks }
}

// ════════════════════════════════════════════════════════════════════════════
// CameraHandSource — webcam + MediaPipe sidecar (feature = "camera")
// ════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "camera")]
pub use camera::CameraHandSource;

#[cfg(feature = "camera")]
mod camera {
    use super::{Hand, HandFrame, HandSource, Landmark, LANDMARK_COUNT};
    use anyhow::{bail, Context, Result};
    use opencv::core::Mat;
    use opencv::prelude::*;
    use opencv::videoio::{self, VideoCapture};
    use serde::Deserialize;
    use std::io::{BufRead, BufReader, Write};
    use std::path::Path;
    use std::process::{Child, Command, Stdio};
    use std::sync::mpsc::Sender;

    const MIN_CONFIDENCE: f32 = 0.5;

    // ── Sidecar wire format ───────────────────────────────────────────────
    // Request: width/height/channels as u32 LE, then raw BGR bytes.
    // Response: one JSON line per frame.

    #[derive(Deserialize, Debug)]
    struct LandmarkJson {
        x: f32,
        y: f32,
        #[allow(dead_code)]
        z: f32,
    }

    #[derive(Deserialize, Debug)]
    struct HandJson {
        score:     f32,
        landmarks: Vec<LandmarkJson>,
    }

    #[derive(Deserialize, Debug)]
    struct DetectionJson {
        hands: Vec<HandJson>,
        #[serde(default)]
        error: Option<String>,
    }

    /// MediaPipe hand-landmark inference in a Python subprocess.
    struct Sidecar {
        process: Child,
        stdout:  BufReader<std::process::ChildStdout>,
    }

    impl Sidecar {
        fn start(script: &Path) -> Result<Self> {
            if !script.exists() {
                bail!("hand detection sidecar script not found at {:?}", script);
            }
            let mut process = Command::new("python3")
                .arg(script)
                .stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .stderr(Stdio::inherit())
                .spawn()
                .context("failed to start hand detection sidecar")?;

            let stdout = process.stdout.take().context("sidecar has no stdout")?;
            let mut stdout = BufReader::new(stdout);

            let mut ready = String::new();
            stdout.read_line(&mut ready)?;
            if ready.trim() != "READY" {
                bail!("sidecar did not signal READY, got: {}", ready.trim());
            }
            eprintln!("[hand] MediaPipe sidecar ready");

            Ok(Sidecar { process, stdout })
        }

        /// Run inference on one BGR frame.
        fn detect(&mut self, frame: &Mat) -> Result<Vec<Hand>> {
            let width = frame.cols() as u32;
            let height = frame.rows() as u32;
            let channels = frame.channels() as u32;
            let data = frame.data_bytes()?;

            let stdin = self.process.stdin.as_mut().context("sidecar stdin closed")?;
            stdin.write_all(&width.to_le_bytes())?;
            stdin.write_all(&height.to_le_bytes())?;
            stdin.write_all(&channels.to_le_bytes())?;
            stdin.write_all(data)?;
            stdin.flush()?;

            let mut line = String::new();
            self.stdout.read_line(&mut line)?;
            let result: DetectionJson = serde_json::from_str(&line)
                .with_context(|| format!("bad sidecar response: {}", line.trim()))?;

            if let Some(err) = result.error {
                eprintln!("[hand] sidecar error: {}", err);
                return Ok(Vec::new());
            }

            let mut hands = Vec::new();
            for hand in result.hands {
                if hand.score < MIN_CONFIDENCE || hand.landmarks.len() != LANDMARK_COUNT {
                    continue;
                }
                let mut landmarks = [Landmark::default(); LANDMARK_COUNT];
                for (i, lm) in hand.landmarks.iter().enumerate() {
                    // Mirror x so on-screen motion matches the player's own,
                    // front-facing-camera style.
                    landmarks[i] = Landmark {
                        x: 1.0 - lm.x,
                        y: lm.y,
                    };
                }
                hands.push(Hand { landmarks });
            }
            Ok(hands)
        }
    }

    impl Drop for Sidecar {
        fn drop(&mut self) {
            let _ = self.process.kill();
        }
    }

    /// Hand source backed by a real webcam.
    ///
    /// Capture and inference block on this source's own thread; the game
    /// loop only ever sees completed [`HandFrame`]s.
    pub struct CameraHandSource {
        cap:     VideoCapture,
        sidecar: Sidecar,
    }

    impl CameraHandSource {
        /// Open camera `device` and start the sidecar.  Returns the source
        /// plus the capture resolution, which sizes the game window.
        ///
        /// Fails fast if the camera can't be opened or yields no first
        /// frame.
        pub fn open(device: i32, script: &Path) -> Result<(Self, (usize, usize))> {
            let mut cap = VideoCapture::new(device, videoio::CAP_ANY)
                .with_context(|| format!("failed to open camera {}", device))?;
            if !cap.is_opened()? {
                bail!("camera {} is not available", device);
            }

            let mut probe = Mat::default();
            cap.read(&mut probe)?;
            if probe.empty() {
                bail!("camera {} produced an empty first frame", device);
            }
            let size = (probe.cols() as usize, probe.rows() as usize);

            let sidecar = Sidecar::start(script)?;
            Ok((CameraHandSource { cap, sidecar }, size))
        }
    }

    impl HandSource for CameraHandSource {
        fn run(mut self: Box<Self>, tx: Sender<HandFrame>) {
            let mut frame = Mat::default();
            loop {
                match self.cap.read(&mut frame) {
                    Ok(true) if !frame.empty() => {}
                    // A dead capture stream ends the source; the game loop
                    // observes the disconnect and shuts down.
                    _ => {
                        eprintln!("[hand] camera read failed, stopping capture");
                        return;
                    }
                }

                let hands = match self.sidecar.detect(&frame) {
                    Ok(h) => h,
                    Err(e) => {
                        eprintln!("[hand] sidecar failed: {}", e);
                        return;
                    }
                };

                if tx.send(HandFrame { hands }).is_err() {
                    return;
                }
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
