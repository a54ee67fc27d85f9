//! Software-rendered game window using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ missed bugs: 1                              │
//! │ score: 4            o  ← hand skeleton      │
//! │                    /|\   overlay            │
//! │      10 01                                  │
//! │     0 [burst] 1      (bug)  ↑               │
//! │      01  10          (bug)  ↑ rising        │
//! │                                             │
//! │        [error overlay + score on game over] │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! The window doubles as the simulation input device: the mouse cursor is
//! forwarded to the sim hand source as a normalized pointer position.

use minifb::{Key, KeyRepeat, MouseMode, Window, WindowOptions};

use crate::game::{Bug, BugPhase, Session};
use crate::hand::{SimInput, HAND_CONNECTIONS, INDEX_FINGER_TIP, LANDMARK_COUNT};
use crate::sprite::Sprite;

use std::sync::mpsc::Sender;

// ════════════════════════════════════════════════════════════════════════════
// Colors and layout constants
// ════════════════════════════════════════════════════════════════════════════

const BG_COLOR:       u32 = 0xFF000080; // navy
const HUD_COLOR:      u32 = 0xFFFFFFFF;
// The error dialog's score line is navy, like the original artwork expects.
const GAME_OVER_TEXT_COLOR: u32 = 0xFF000080;
const HAND_COLOR:     u32 = 0xFFFFFFFF;
#[cfg(not(feature = "camera"))]
const LEGEND_COLOR:   u32 = 0xFF888888;

const HAND_POINT_ALPHA:   f32 = 0.5;
const HAND_LINE_ALPHA:    f32 = 0.4;
const FINGERTIP_RADIUS:   i32 = 10;
const LANDMARK_RADIUS:    i32 = 5;

const HUD_SCALE:      usize = 3;
const PARTICLE_SCALE: usize = 2;
const SCORE_SCALE:    usize = 4;

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window: Window,
    buf:    Vec<u32>,
    width:  usize,
    height: usize,
    sim_tx: Sender<SimInput>,
}

impl Visualizer {
    pub fn new(width: usize, height: usize, sim_tx: Sender<SimInput>) -> anyhow::Result<Self> {
        let mut window = Window::new(
            "bitburst — pop the bugs",
            width,
            height,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )
        .map_err(|e| anyhow::anyhow!("failed to create window: {}", e))?;

        window.limit_update_rate(Some(std::time::Duration::from_millis(16))); // ~60fps

        Ok(Visualizer {
            window,
            buf: vec![BG_COLOR; width * height],
            width,
            height,
            sim_tx,
        })
    }

    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    /// Poll the window: forward the mouse pointer to the sim hand source and
    /// watch for the quit key.  Returns false when the loop should end.
    pub fn poll_input(&mut self) -> bool {
        if !self.window.is_open() {
            return false;
        }
        if self.window.is_key_pressed(Key::Q, KeyRepeat::No) {
            return false;
        }

        match self.window.get_mouse_pos(MouseMode::Discard) {
            Some((mx, my)) => {
                let _ = self.sim_tx.send(SimInput::Pointer {
                    x: mx / self.width as f32,
                    y: my / self.height as f32,
                });
            }
            None => {
                let _ = self.sim_tx.send(SimInput::PointerGone);
            }
        }
        true
    }

    /// Render one frame.
    pub fn render(
        &mut self,
        bugs:         &[Bug],
        session:      &Session,
        hands:        &[[(i32, i32); LANDMARK_COUNT]],
        bug_sprite:   &Sprite,
        error_sprite: &Sprite,
    ) {
        self.buf.fill(BG_COLOR);

        // ── Hand skeleton overlay (cosmetic, translucent) ─────────────────
        for hand in hands {
            for &(a, b) in HAND_CONNECTIONS.iter() {
                let (x0, y0) = hand[a];
                let (x1, y1) = hand[b];
                self.draw_line(x0, y0, x1, y1, HAND_COLOR, HAND_LINE_ALPHA);
            }
            for &(x, y) in hand.iter() {
                self.draw_circle(x, y, LANDMARK_RADIUS, HAND_COLOR, HAND_POINT_ALPHA);
            }
            let (fx, fy) = hand[INDEX_FINGER_TIP];
            self.draw_circle(fx, fy, FINGERTIP_RADIUS, HAND_COLOR, HAND_POINT_ALPHA);
        }

        // ── Bugs and burst particles ──────────────────────────────────────
        for bug in bugs {
            if bug.phase == BugPhase::Rising {
                let d = (2 * bug.radius) as usize;
                let scaled = bug_sprite.scaled(d, d);
                self.draw_sprite(
                    &scaled,
                    bug.x as i32 - bug.radius,
                    bug.y as i32 - bug.radius,
                );
            }
            for p in &bug.particles {
                self.draw_text(
                    &p.glyph.to_string(),
                    p.x as i32,
                    p.y as i32,
                    PARTICLE_SCALE,
                    p.color,
                );
            }
        }

        // ── HUD ───────────────────────────────────────────────────────────
        self.draw_text(
            &format!("missed bugs: {}", session.missed),
            10,
            10,
            HUD_SCALE,
            HUD_COLOR,
        );
        self.draw_text(
            &format!("score: {}", session.score),
            10,
            50,
            HUD_SCALE,
            HUD_COLOR,
        );

        // ── Game-over overlay ─────────────────────────────────────────────
        if session.is_over() {
            let ex = (self.width as i32 - error_sprite.width as i32) / 2;
            let ey = (self.height as i32 - error_sprite.height as i32) / 2;
            self.draw_sprite(error_sprite, ex, ey);

            let line = format!("score: {}", session.score);
            let line_w = (text_width(&line, SCORE_SCALE)) as i32;
            self.draw_text(
                &line,
                (self.width as i32 - line_w) / 2,
                ey + error_sprite.height as i32 + 10,
                SCORE_SCALE,
                GAME_OVER_TEXT_COLOR,
            );
        }

        // ── Key legend (simulation mode only) ─────────────────────────────
        #[cfg(not(feature = "camera"))]
        self.draw_text(
            "mouse=fingertip  q=quit",
            10,
            self.height as i32 - 16,
            2,
            LEGEND_COLOR,
        );

        self.window
            .update_with_buffer(&self.buf, self.width, self.height)
            .ok();
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn blend_pixel(&mut self, x: i32, y: i32, color: u32, alpha: f32) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let idx = y as usize * self.width + x as usize;
        self.buf[idx] = blend(self.buf[idx], color, alpha);
    }

    fn draw_circle(&mut self, cx: i32, cy: i32, r: i32, color: u32, alpha: f32) {
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy <= r * r {
                    self.blend_pixel(cx + dx, cy + dy, color, alpha);
                }
            }
        }
    }

    fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: u32, alpha: f32) {
        // Bresenham
        let (mut x, mut y) = (x0, y0);
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.blend_pixel(x, y, color, alpha);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Blit a sprite with per-pixel alpha.
    fn draw_sprite(&mut self, sprite: &Sprite, x: i32, y: i32) {
        for sy in 0..sprite.height {
            for sx in 0..sprite.width {
                let p = sprite.pixel(sx, sy);
                let a = (p >> 24) as f32 / 255.0;
                if a > 0.0 {
                    self.blend_pixel(x + sx as i32, y + sy as i32, p | 0xFF00_0000, a);
                }
            }
        }
    }

    /// Scaled 3×5 bitmap font.
    fn draw_text(&mut self, text: &str, x: i32, y: i32, scale: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        for py in 0..scale {
                            for px in 0..scale {
                                self.blend_pixel(
                                    cx + (col * scale + px) as i32,
                                    y + (row * scale + py) as i32,
                                    color,
                                    1.0,
                                );
                            }
                        }
                    }
                }
            }
            cx += (4 * scale) as i32; // 3 wide + 1 gap
        }
    }
}

/// Pixel width of a string in the scaled bitmap font.
pub fn text_width(text: &str, scale: usize) -> usize {
    text.chars().count() * 4 * scale
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' | 'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' | 'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' | 'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

/// Alpha-blend two ARGB colors. `t` = 0.0 → all `a`, `t` = 1.0 → all `b`.
fn blend(a: u32, b: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    let lerp = |ca: u32, cb: u32| (ca as f32 * (1.0 - t) + cb as f32 * t) as u32;
    let ar = (a >> 16) & 0xFF;
    let br = (b >> 16) & 0xFF;
    let ag = (a >> 8) & 0xFF;
    let bg = (b >> 8) & 0xFF;
    let ab = a & 0xFF;
    let bb = b & 0xFF;
    0xFF000000 | (lerp(ar, br) << 16) | (lerp(ag, bg) << 8) | lerp(ab, bb)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_endpoints() {
        assert_eq!(blend(0xFF000000, 0xFFFFFFFF, 0.0), 0xFF000000);
        assert_eq!(blend(0xFF000000, 0xFFFFFFFF, 1.0), 0xFFFFFFFF);
    }

    #[test]
    fn blend_midpoint_is_grey() {
        let mid = blend(0xFF000000, 0xFFFFFFFF, 0.5);
        let r = (mid >> 16) & 0xFF;
        assert!(r > 100 && r < 155);
    }

    #[test]
    fn glyphs_for_hud_digits_are_distinct() {
        assert_ne!(char_glyph('0'), char_glyph('1'));
        assert_ne!(char_glyph('8'), char_glyph('9'));
    }

    #[test]
    fn space_glyph_is_blank() {
        assert_eq!(char_glyph(' '), [0; 5]);
    }

    #[test]
    fn game_over_score_line_is_navy_not_hud_white() {
        assert_eq!(GAME_OVER_TEXT_COLOR, 0xFF000080);
        assert_ne!(GAME_OVER_TEXT_COLOR, HUD_COLOR);
    }

    #[test]
    fn text_width_scales() {
        assert_eq!(text_width("score", 1), 20);
        assert_eq!(text_width("score", 3), 60);
    }
}
