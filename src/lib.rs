//! # bitburst
//!
//! A hand-tracked "debugging" game: bug sprites rise from the bottom of the
//! screen and the player pops them by touching them with their index
//! fingertip.  A popped bug bursts into fifty `0` and `1` glyphs and scores
//! a point; a bug that escapes off the top is a miss, and three misses end
//! the session with an error overlay and a game-over sound.
//!
//! ## Gameplay
//!
//! | Event | Effect |
//! |---|---|
//! | Fingertip touches a rising bug | Bug bursts into 50 binary glyphs, +1 score, explosion sound |
//! | Bug exits the top untouched | +1 miss |
//! | Third miss | Game over (one-way), error overlay, game-over sound once |
//! | Elapsed spawn interval | New bug; interval shrinks 5 ms per spawn, floor 50 ms |
//!
//! ## Feature flags
//!
//! * (default) — **Simulation mode**: the mouse cursor stands in for the
//!   index fingertip; a synthetic 21-landmark hand is drawn around it.
//!   No hardware needed.
//! * `camera` — **Hardware mode**: captures a webcam via OpenCV and runs
//!   hand-landmark inference in a MediaPipe Python sidecar.  The window is
//!   sized to the camera frame and the x-axis is mirrored so on-screen
//!   motion matches the player's own.
//!
//! ## Assets
//!
//! Four files are required at startup (paths configurable via
//! [`app::AppConfig`]): `assets/bug.png`, `assets/error.png`,
//! `assets/explosion.wav`, `assets/game_over.wav`.  Startup fails fast if
//! any is missing.  Supply your own, or generate placeholder versions with
//! `python3 scripts/gen_assets.py` (stdlib-only, no pip installs).
//!
//! Hardware mode additionally needs the MediaPipe sidecar shipped at the
//! repo root (`hand_detect.py`) plus
//! `pip install mediapipe opencv-python numpy`.
//!
//! ## Reproducibility
//!
//! All randomized entity construction flows through one seedable RNG owned
//! by [`app::World`]; pass `--seed N` to replay a run.

pub mod app;
pub mod audio;
pub mod game;
pub mod hand;
pub mod sprite;
pub mod visualizer;
