//! Game entities and session rules.
//!
//! Everything here is pure data + logic: bugs, their burst particles, the
//! spawn scheduler and the score/miss session state.  No I/O, no clocks —
//! time arrives as `Duration`-since-start and randomness as a caller-owned
//! `fastrand::Rng`, so every rule is reproducible under test.

use std::f32::consts::TAU;
use std::time::Duration;

// ════════════════════════════════════════════════════════════════════════════
// Tuning constants
// ════════════════════════════════════════════════════════════════════════════

/// Particles emitted when a bug bursts.
pub const BURST_COUNT: usize = 50;

/// Escaped bugs that end the session.
pub const MISS_LIMIT: u32 = 3;

/// Side length of the square hit region centred on the fingertip (pixels).
pub const FINGERTIP_BOX: i32 = 50;

/// Spawn cadence: start, per-spawn decrement, hard floor.
pub const SPAWN_INTERVAL_START: Duration = Duration::from_millis(1000);
pub const SPAWN_INTERVAL_STEP:  Duration = Duration::from_millis(5);
pub const SPAWN_INTERVAL_FLOOR: Duration = Duration::from_millis(50);

/// Pack an opaque ARGB color.
pub fn argb(r: u8, g: u8, b: u8) -> u32 {
    0xFF00_0000 | (r as u32) << 16 | (g as u32) << 8 | b as u32
}

// ════════════════════════════════════════════════════════════════════════════
// Particle — a single glyph flung out of a burst bug
// ════════════════════════════════════════════════════════════════════════════

/// A `0` or `1` glyph emitted at burst time.  Horizontal motion is scaled by
/// the particle's own speed, vertical motion by the parent bug's speed.
#[derive(Clone, Debug)]
pub struct Particle {
    pub x:     f32,
    pub y:     f32,
    pub glyph: char,
    pub color: u32,
    /// Horizontal motion magnitude, uniform in [1, 5).
    pub speed: f32,
    /// Motion direction, uniform in [0, 2π).
    pub angle: f32,
}

impl Particle {
    fn spawn(rng: &mut fastrand::Rng, x: f32, y: f32) -> Self {
        Particle {
            x,
            y,
            glyph: if rng.bool() { '0' } else { '1' },
            color: argb(0, rng.u8(180..=255), 0),
            speed: 1.0 + rng.f32() * 4.0,
            angle: rng.f32() * TAU,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Bug — the ascending collectible
// ════════════════════════════════════════════════════════════════════════════

/// Explicit lifecycle.  A bug is culled as a miss only from `Rising`, and as
/// finished only from `Spent` — `Spent` requires that the burst happened and
/// that the viewport filter has since drained every particle.  An emptiness
/// check alone can't distinguish "not yet burst" from "burst and dispersed".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BugPhase {
    /// Ascending, touchable.
    Rising,
    /// Touched; particles in flight.
    Burst,
    /// Burst and fully dispersed — remove.
    Spent,
}

/// One ascending bug.  `radius`, `speed` and `color` are fixed at spawn;
/// `speed` doubles as the ascent rate and the burst vertical scale factor.
#[derive(Clone, Debug)]
pub struct Bug {
    pub x:         f32,
    pub y:         f32,
    pub radius:    i32,
    pub speed:     i32,
    pub color:     u32,
    pub phase:     BugPhase,
    pub particles: Vec<Particle>,
}

impl Bug {
    /// Create a bug at a random x along the bottom edge.
    pub fn spawn(rng: &mut fastrand::Rng, width: usize, height: usize) -> Self {
        Bug {
            x:         rng.i32(0..width.max(1) as i32) as f32,
            y:         height as f32,
            radius:    rng.i32(10..=30),
            speed:     rng.i32(5..=10),
            color:     argb(rng.u8(..), 255, rng.u8(..)),
            phase:     BugPhase::Rising,
            particles: Vec::new(),
        }
    }

    /// Square hit region test: fingertip box vs the bug's bounding square.
    /// Only a `Rising` bug is touchable.
    pub fn hit_test(&self, cx: i32, cy: i32) -> bool {
        if self.phase != BugPhase::Rising {
            return false;
        }
        let half = FINGERTIP_BOX / 2;
        rects_intersect(
            (cx - half, cy - half, FINGERTIP_BOX, FINGERTIP_BOX),
            (
                self.x as i32 - self.radius,
                self.y as i32 - self.radius,
                2 * self.radius,
                2 * self.radius,
            ),
        )
    }

    /// Pop the bug: emit exactly [`BURST_COUNT`] particles at its position.
    /// No effect unless the bug is `Rising`, which makes scoring idempotent
    /// across frames and across overlapping hands.
    pub fn burst(&mut self, rng: &mut fastrand::Rng) -> bool {
        if self.phase != BugPhase::Rising {
            return false;
        }
        self.particles = (0..BURST_COUNT)
            .map(|_| Particle::spawn(rng, self.x, self.y))
            .collect();
        self.phase = BugPhase::Burst;
        true
    }

    /// Advance one frame: constant-velocity ascent while rising, particle
    /// integration and viewport culling after the burst.
    pub fn step(&mut self, width: usize, height: usize) {
        if self.phase == BugPhase::Rising {
            self.y -= self.speed as f32;
        }

        let vscale = self.speed as f32;
        for p in &mut self.particles {
            p.x += p.speed * p.angle.cos();
            p.y += vscale * p.angle.sin();
        }

        let (w, h) = (width as f32, height as f32);
        self.particles
            .retain(|p| p.x >= 0.0 && p.x <= w && p.y >= 0.0 && p.y <= h);

        if self.phase == BugPhase::Burst && self.particles.is_empty() {
            self.phase = BugPhase::Spent;
        }
    }

    /// True once a rising bug has crossed the top edge.
    pub fn escaped(&self) -> bool {
        self.phase == BugPhase::Rising && self.y <= 0.0
    }

    pub fn is_spent(&self) -> bool {
        self.phase == BugPhase::Spent
    }
}

/// Axis-aligned intersection of two `(x, y, w, h)` rects, strict overlap.
fn rects_intersect(a: (i32, i32, i32, i32), b: (i32, i32, i32, i32)) -> bool {
    a.0 < b.0 + b.2 && b.0 < a.0 + a.2 && a.1 < b.1 + b.3 && b.1 < a.1 + a.3
}

// ════════════════════════════════════════════════════════════════════════════
// SpawnScheduler — timed bug creation with a decaying interval
// ════════════════════════════════════════════════════════════════════════════

/// Decides when to emit a new bug.  Operates on elapsed time rather than
/// wall-clock instants so runs can be replayed in tests.
#[derive(Clone, Debug)]
pub struct SpawnScheduler {
    interval:   Duration,
    last_spawn: Duration,
}

impl SpawnScheduler {
    pub fn new() -> Self {
        SpawnScheduler {
            interval:   SPAWN_INTERVAL_START,
            last_spawn: Duration::ZERO,
        }
    }

    /// Spawn once `interval` has elapsed since the last spawn, then shrink
    /// the interval toward its floor.  The floor keeps the ramp finite.
    pub fn should_spawn(&mut self, now: Duration) -> bool {
        if now.saturating_sub(self.last_spawn) < self.interval {
            return false;
        }
        self.last_spawn = now;
        self.interval = self
            .interval
            .saturating_sub(SPAWN_INTERVAL_STEP)
            .max(SPAWN_INTERVAL_FLOOR);
        true
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for SpawnScheduler {
    fn default() -> Self {
        Self::new()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Session — score, misses, and the one-way game-over transition
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayState {
    Playing,
    GameOver,
}

/// Per-run tallies.  `score` and `missed` are monotone; `Playing → GameOver`
/// never reverts.
#[derive(Clone, Debug)]
pub struct Session {
    pub score:  u32,
    pub missed: u32,
    pub state:  PlayState,
}

impl Session {
    pub fn new() -> Self {
        Session {
            score:  0,
            missed: 0,
            state:  PlayState::Playing,
        }
    }

    pub fn record_hit(&mut self) {
        self.score += 1;
    }

    /// Count an escaped bug.  Returns true on the exact miss that ends the
    /// session, so the caller can fire the game-over cue exactly once.
    pub fn record_miss(&mut self) -> bool {
        self.missed += 1;
        if self.state == PlayState::Playing && self.missed >= MISS_LIMIT {
            self.state = PlayState::GameOver;
            return true;
        }
        false
    }

    pub fn is_over(&self) -> bool {
        self.state == PlayState::GameOver
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn rng() -> fastrand::Rng {
        fastrand::Rng::with_seed(7)
    }

    #[test]
    fn spawn_within_screen() {
        let mut r = rng();
        for _ in 0..100 {
            let b = Bug::spawn(&mut r, 640, 480);
            assert!(b.x >= 0.0 && b.x < 640.0);
            assert_eq!(b.y, 480.0);
            assert!((10..=30).contains(&b.radius));
            assert!((5..=10).contains(&b.speed));
            assert_eq!(b.phase, BugPhase::Rising);
        }
    }

    #[test]
    fn spawn_is_reproducible_under_seed() {
        let mut a = fastrand::Rng::with_seed(42);
        let mut b = fastrand::Rng::with_seed(42);
        let x = Bug::spawn(&mut a, 640, 480);
        let y = Bug::spawn(&mut b, 640, 480);
        assert_eq!(x.x, y.x);
        assert_eq!(x.radius, y.radius);
        assert_eq!(x.speed, y.speed);
        assert_eq!(x.color, y.color);
    }

    #[test]
    fn bug_color_green_channel_full() {
        let mut r = rng();
        let b = Bug::spawn(&mut r, 640, 480);
        assert_eq!((b.color >> 8) & 0xFF, 255);
        assert_eq!(b.color >> 24, 0xFF);
    }

    #[test]
    fn burst_emits_exact_count_at_position() {
        let mut r = rng();
        let mut b = Bug::spawn(&mut r, 640, 480);
        b.x = 100.0;
        b.y = 300.0;
        assert!(b.burst(&mut r));
        assert_eq!(b.particles.len(), BURST_COUNT);
        assert_eq!(b.phase, BugPhase::Burst);
        for p in &b.particles {
            assert_eq!(p.x, 100.0);
            assert_eq!(p.y, 300.0);
            assert!(p.glyph == '0' || p.glyph == '1');
            assert!(p.speed >= 1.0 && p.speed < 5.0);
            assert!(p.angle >= 0.0 && p.angle < TAU);
        }
    }

    #[test]
    fn burst_is_idempotent() {
        let mut r = rng();
        let mut b = Bug::spawn(&mut r, 640, 480);
        assert!(b.burst(&mut r));
        assert!(!b.burst(&mut r));
        assert_eq!(b.particles.len(), BURST_COUNT);
    }

    #[test]
    fn hit_test_square_regions() {
        let mut r = rng();
        let mut b = Bug::spawn(&mut r, 640, 480);
        b.x = 100.0;
        b.y = 400.0;
        b.radius = 20;
        assert!(b.hit_test(100, 400));
        // 25 (fingertip half) + 20 (radius) = 45; just inside vs clear miss
        assert!(b.hit_test(100 + 44, 400));
        assert!(!b.hit_test(100 + 45, 400));
        assert!(!b.hit_test(300, 400));
    }

    #[test]
    fn burst_bug_is_not_touchable() {
        let mut r = rng();
        let mut b = Bug::spawn(&mut r, 640, 480);
        b.x = 100.0;
        b.y = 400.0;
        b.burst(&mut r);
        assert!(!b.hit_test(100, 400));
    }

    #[test]
    fn rising_bug_ascends_at_speed() {
        let mut r = rng();
        let mut b = Bug::spawn(&mut r, 640, 480);
        let y0 = b.y;
        b.step(640, 480);
        assert_eq!(b.y, y0 - b.speed as f32);
    }

    #[test]
    fn frames_to_escape_matches_ceil() {
        let mut r = rng();
        let mut b = Bug::spawn(&mut r, 640, 480);
        b.speed = 7;
        let expected = (480 + 7 - 1) / 7; // ceil(height / speed)
        let mut frames = 0;
        while !b.escaped() {
            b.step(640, 480);
            frames += 1;
        }
        assert_eq!(frames, expected);
    }

    #[test]
    fn particle_motion_split_by_angle() {
        let mut b = Bug {
            x: 50.0,
            y: 50.0,
            radius: 10,
            speed: 5,
            color: argb(0, 255, 0),
            phase: BugPhase::Burst,
            particles: vec![Particle {
                x: 50.0,
                y: 50.0,
                glyph: '1',
                color: argb(0, 200, 0),
                speed: 2.0,
                angle: 0.0,
            }],
        };
        b.step(640, 480);
        // cos(0) = 1 drives x by the particle speed; sin(0) = 0 leaves y alone
        assert_eq!(b.particles[0].x, 52.0);
        assert_eq!(b.particles[0].y, 50.0);
    }

    #[test]
    fn particles_culled_outside_viewport() {
        let mut b = Bug {
            x: 5.0,
            y: 5.0,
            radius: 10,
            speed: 10,
            color: argb(0, 255, 0),
            phase: BugPhase::Burst,
            particles: vec![Particle {
                x: 5.0,
                y: 5.0,
                glyph: '0',
                color: argb(0, 200, 0),
                speed: 4.0,
                angle: std::f32::consts::PI, // heading left, off the x=0 edge
            }],
        };
        for _ in 0..5 {
            b.step(640, 480);
        }
        assert!(b.particles.is_empty());
        assert_eq!(b.phase, BugPhase::Spent);
    }

    #[test]
    fn sideways_exit_still_drains_the_bug() {
        // Particles leave through whichever edge they reach first; the bug
        // must end Spent even when exits are lateral or below, not just
        // above the top edge.
        let mut r = rng();
        let mut b = Bug::spawn(&mut r, 640, 480);
        b.x = 630.0;
        b.y = 240.0;
        b.burst(&mut r);
        for _ in 0..2000 {
            b.step(640, 480);
            if b.is_spent() {
                break;
            }
        }
        assert!(b.is_spent());
    }

    #[test]
    fn scheduler_first_spawn_after_full_interval() {
        let mut s = SpawnScheduler::new();
        assert!(!s.should_spawn(Duration::from_millis(999)));
        assert!(s.should_spawn(Duration::from_millis(1000)));
    }

    #[test]
    fn scheduler_interval_shrinks_per_spawn() {
        let mut s = SpawnScheduler::new();
        assert!(s.should_spawn(Duration::from_millis(1000)));
        assert_eq!(s.interval(), Duration::from_millis(995));
    }

    #[test]
    fn scheduler_interval_never_below_floor() {
        let mut s = SpawnScheduler::new();
        let mut now = Duration::ZERO;
        for _ in 0..1000 {
            now += Duration::from_millis(2000);
            assert!(s.should_spawn(now));
            assert!(s.interval() >= SPAWN_INTERVAL_FLOOR);
        }
        assert_eq!(s.interval(), SPAWN_INTERVAL_FLOOR);
    }

    #[test]
    fn session_game_over_on_third_miss_exactly_once() {
        let mut s = Session::new();
        assert!(!s.record_miss());
        assert!(!s.record_miss());
        assert!(!s.is_over());
        assert!(s.record_miss());
        assert!(s.is_over());
        // Further misses keep counting but never re-trigger the transition
        assert!(!s.record_miss());
        assert_eq!(s.missed, 4);
        assert!(s.is_over());
    }

    #[test]
    fn session_score_counts_hits() {
        let mut s = Session::new();
        s.record_hit();
        s.record_hit();
        assert_eq!(s.score, 2);
    }
}
