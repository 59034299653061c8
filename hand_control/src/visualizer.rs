//! Software-rendered overlay using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │ FPS: 30   ACTIVE BOX: NONE   PINCH THRESHOLD: 35   MODE: BOTH      │
//! │                                                                    │
//! │  ┌──┐     [box]        [box]        [box]                          │
//! │  │  │                                                              │
//! │  │▓▓│  volume bar          hand skeleton + bounding box            │
//! │  │▓▓│            [box]        [box]                                │
//! │  └──┘                                                              │
//! │  50%                                                               │
//! │ legend                                                             │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Drawing goes through [`Canvas`], a plain ARGB framebuffer with clipped
//! primitives; [`Visualizer`] owns the window and hands the buffer to it.

use std::sync::mpsc::Sender;
use std::time::Duration;

use hand_geometry::{landmarks, BoundingBox, HandFrame, Point};
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use crate::app::{AppState, FrameOutput};
use crate::source::PointerSample;

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

const BG_COLOR:        u32 = 0xFF1A1A2E;
const BOX_IDLE:        u32 = 0xFFFF00FF;  // purple
const BOX_DRAGGING:    u32 = 0xFF00FF00;  // green
const BOX_ALPHA:       f32 = 80.0 / 255.0;
const HAND_BOX_COLOR:  u32 = 0xFF00FF00;
const HAND_BOX_MARGIN: i32 = 20;
const BONE_COLOR:      u32 = 0xFFEEEEEE;
const JOINT_COLOR:     u32 = 0xFFFF3030;
const PINCH_COLOR:     u32 = 0xFF00FFFF;
const TIP_COLOR:       u32 = 0xFFFF00FF;
const FLOOR_COLOR:     u32 = 0xFF00FF00;
const BAR_COLOR:       u32 = 0xFF00C8FF;
const TEXT_COLOR:      u32 = 0xFFEEEEEE;
const LEGEND_COLOR:    u32 = 0xFF888888;

/// Volume bar outline, `(x0, y0)`–`(x1, y1)`; filled from the mapped row
/// down to `y1`.
const BAR_RECT: BoundingBox = BoundingBox { x_min: 50, y_min: 150, x_max: 85, y_max: 400 };

/// Thumb–index gap change per arrow key press or scroll notch.
const GAP_STEP: f32 = 10.0;
const GAP_MAX:  f32 = 400.0;

// ════════════════════════════════════════════════════════════════════════════
// Canvas: framebuffer plus clipped drawing primitives
// ════════════════════════════════════════════════════════════════════════════

pub struct Canvas {
    buf:    Vec<u32>,
    width:  usize,
    height: usize,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Canvas { buf: vec![BG_COLOR; width * height], width, height }
    }

    pub fn width(&self)  -> usize  { self.width }
    pub fn height(&self) -> usize  { self.height }
    pub fn pixels(&self) -> &[u32] { &self.buf }

    pub fn pixel(&self, x: i32, y: i32) -> Option<u32> {
        self.index(x, y).map(|i| self.buf[i])
    }

    pub fn clear(&mut self, color: u32) { self.buf.fill(color); }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 { return None; }
        let (x, y) = (x as usize, y as usize);
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, color: u32) {
        if let Some(i) = self.index(x, y) {
            self.buf[i] = color;
        }
    }

    /// Fill the inclusive rectangle `r`.
    pub fn fill_rect(&mut self, r: BoundingBox, color: u32) {
        for y in r.y_min..=r.y_max {
            for x in r.x_min..=r.x_max {
                self.set_pixel(x, y, color);
            }
        }
    }

    /// Blend `color` over the inclusive rectangle `r` with opacity `alpha`.
    pub fn blend_rect(&mut self, r: BoundingBox, color: u32, alpha: f32) {
        for y in r.y_min..=r.y_max {
            for x in r.x_min..=r.x_max {
                if let Some(i) = self.index(x, y) {
                    self.buf[i] = blend(self.buf[i], color, alpha);
                }
            }
        }
    }

    /// Outline `r` with a border `thickness` px wide, drawn inward.
    pub fn draw_border(&mut self, r: BoundingBox, thickness: i32, color: u32) {
        for t in 0..thickness.max(1) {
            let (x0, y0, x1, y1) = (r.x_min + t, r.y_min + t, r.x_max - t, r.y_max - t);
            if x0 > x1 || y0 > y1 { break; }
            for x in x0..=x1 {
                self.set_pixel(x, y0, color);
                self.set_pixel(x, y1, color);
            }
            for y in y0..=y1 {
                self.set_pixel(x0, y, color);
                self.set_pixel(x1, y, color);
            }
        }
    }

    pub fn fill_circle(&mut self, c: Point, radius: i32, color: u32) {
        let r2 = radius * radius;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy <= r2 {
                    self.set_pixel(c.x + dx, c.y + dy, color);
                }
            }
        }
    }

    /// Bresenham line, `width` px square brush.
    pub fn draw_line(&mut self, a: Point, b: Point, width: i32, color: u32) {
        let (dx, dy) = ((b.x - a.x).abs(), -(b.y - a.y).abs());
        let (sx, sy) = (if a.x < b.x { 1 } else { -1 }, if a.y < b.y { 1 } else { -1 });
        let (mut x, mut y, mut err) = (a.x, a.y, dx + dy);
        let half = width.max(1) / 2;
        loop {
            for oy in -half..=(width.max(1) - 1 - half) {
                for ox in -half..=(width.max(1) - 1 - half) {
                    self.set_pixel(x + ox, y + oy, color);
                }
            }
            if x == b.x && y == b.y { break; }
            let e2 = 2 * err;
            if e2 >= dy { err += dy; x += sx; }
            if e2 <= dx { err += dx; y += sy; }
        }
    }

    /// 3×5 bitmap text, each font pixel drawn as a `scale`×`scale` block.
    pub fn draw_label(&mut self, text: &str, x: i32, y: i32, scale: i32, color: u32) {
        let scale = scale.max(1);
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3 {
                    if bits & (1 << (2 - col)) != 0 {
                        let px = cx + col * scale;
                        let py = y + row as i32 * scale;
                        self.fill_rect(
                            BoundingBox { x_min: px, y_min: py, x_max: px + scale - 1, y_max: py + scale - 1 },
                            color,
                        );
                    }
                }
            }
            cx += 4 * scale; // 3 wide + 1 gap
            if cx >= self.width as i32 { break; }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window:    Window,
    canvas:    Canvas,
    pointer:   Sender<PointerSample>,
    thumb_gap: f32,
}

impl Visualizer {
    pub fn new((width, height): (usize, usize), pointer: Sender<PointerSample>) -> Result<Self, minifb::Error> {
        let mut window = Window::new(
            "Hand Control — Pinch & Volume Overlay",
            width, height,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )?;

        window.limit_update_rate(Some(Duration::from_millis(16))); // ~60fps

        Ok(Visualizer {
            window,
            canvas: Canvas::new(width, height),
            pointer,
            thumb_gap: 175.0,
        })
    }

    /// Poll keyboard and mouse, forward a [`PointerSample`] for the
    /// simulated hand.  Returns false when the user asked to quit.
    pub fn poll_input(&mut self) -> bool {
        if !self.window.is_open() { return false; }

        if self.window.is_key_pressed(Key::Q, KeyRepeat::No)
            || self.window.is_key_pressed(Key::Escape, KeyRepeat::No)
        {
            return false;
        }

        if self.window.is_key_pressed(Key::Up, KeyRepeat::Yes) {
            self.thumb_gap += GAP_STEP;
        }
        if self.window.is_key_pressed(Key::Down, KeyRepeat::Yes) {
            self.thumb_gap -= GAP_STEP;
        }
        if let Some((_, scroll)) = self.window.get_scroll_wheel() {
            self.thumb_gap += scroll.signum() * GAP_STEP;
        }
        self.thumb_gap = self.thumb_gap.clamp(0.0, GAP_MAX);

        let sample = PointerSample {
            pos:       self.window.get_mouse_pos(MouseMode::Discard),
            pinching:  self.window.get_mouse_down(MouseButton::Left),
            thumb_gap: self.thumb_gap,
        };
        // Receiver is gone when a hardware source is in use.
        let _ = self.pointer.send(sample);
        true
    }

    /// Render one frame.
    pub fn render(&mut self, state: &AppState, frame: &FrameOutput) {
        draw_overlay(&mut self.canvas, state, frame);
        let (w, h) = (self.canvas.width(), self.canvas.height());
        if let Err(e) = self.window.update_with_buffer(self.canvas.pixels(), w, h) {
            log::warn!("overlay update failed: {}", e);
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Overlay composition
// ════════════════════════════════════════════════════════════════════════════

/// Paint the full overlay for one processed frame.
pub fn draw_overlay(canvas: &mut Canvas, state: &AppState, frame: &FrameOutput) {
    canvas.clear(BG_COLOR);

    // ── Targets ───────────────────────────────────────────────────────────
    if state.mode().drags() {
        for target in state.resolver().targets() {
            let color = if target.is_dragging() { BOX_DRAGGING } else { BOX_IDLE };
            canvas.blend_rect(target.rect(), color, BOX_ALPHA);
            canvas.draw_border(target.rect(), 2, color);
        }
    }

    // ── Hands ─────────────────────────────────────────────────────────────
    for hand in &frame.hands {
        draw_hand(canvas, hand);
    }

    // ── Pinch indicator ───────────────────────────────────────────────────
    if let (Some(_), Some(grip)) = (frame.drag.lock, frame.drag.grip) {
        canvas.fill_circle(grip, 10, PINCH_COLOR);
    }

    // ── Volume ────────────────────────────────────────────────────────────
    if state.mode().controls_volume() {
        if let Some((thumb, index)) = frame.volume_tips {
            canvas.fill_circle(thumb, 10, TIP_COLOR);
            canvas.fill_circle(index, 10, TIP_COLOR);
            canvas.draw_line(thumb, index, 3, TIP_COLOR);
            let mid = thumb.midpoint(index);
            let at_floor = frame.volume.map_or(false, |v| v.is_at_floor());
            canvas.fill_circle(mid, 10, if at_floor { FLOOR_COLOR } else { TIP_COLOR });
        }

        canvas.draw_border(BAR_RECT, 3, BAR_COLOR);
        if let Some(v) = state.last_volume() {
            let top = (v.bar_top.round() as i32).clamp(BAR_RECT.y_min, BAR_RECT.y_max);
            canvas.fill_rect(BoundingBox { y_min: top, ..BAR_RECT }, BAR_COLOR);
            canvas.draw_label(&format!("{:.0}%", v.percent), 40, 450, 4, BAR_COLOR);
        }
    }

    // ── Status labels ─────────────────────────────────────────────────────
    let active = if state.resolver().is_locked() { "MOVING" } else { "NONE" };
    canvas.draw_label(&format!("FPS: {:.0}", frame.fps), 10, 10, 3, TEXT_COLOR);
    canvas.draw_label(&format!("ACTIVE BOX: {}", active), 180, 10, 3, TEXT_COLOR);
    canvas.draw_label(
        &format!("PINCH THRESHOLD: {:.0}", state.resolver().detector().pinch_threshold()),
        520, 10, 3, TEXT_COLOR,
    );
    canvas.draw_label(&format!("MODE: {}", state.mode().as_str()), 920, 10, 3, TEXT_COLOR);

    // ── Key legend ────────────────────────────────────────────────────────
    let legend_y = canvas.height() as i32 - 16;
    canvas.draw_label(
        "mouse=move  left button=pinch  up/down or wheel=thumb gap  q/esc=quit",
        10, legend_y, 2, LEGEND_COLOR,
    );
}

fn draw_hand(canvas: &mut Canvas, hand: &HandFrame) {
    for &(a, b) in landmarks::CONNECTIONS.iter() {
        if let Some((pa, pb)) = hand.pair(a, b) {
            canvas.draw_line(pa, pb, 2, BONE_COLOR);
        }
    }
    for lm in hand.landmarks() {
        canvas.fill_circle(lm.pos, 4, JOINT_COLOR);
    }
    if let Ok(bbox) = hand.bounding_box() {
        canvas.draw_border(bbox.expanded(HAND_BOX_MARGIN), 2, HAND_BOX_COLOR);
    }
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
        'q' | 'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '%' => [0b101, 0b001, 0b010, 0b100, 0b101],
        '(' => [0b001, 0b010, 0b010, 0b010, 0b001],
        ')' => [0b100, 0b010, 0b010, 0b010, 0b100],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

/// Alpha-blend two ARGB colors. `t` = 0.0 → all `a`, `t` = 1.0 → all `b`.
fn blend(a: u32, b: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    let lerp = |ca: u32, cb: u32| (ca as f32 * (1.0-t) + cb as f32 * t).round() as u32;
    let ar = (a >> 16) & 0xFF; let br = (b >> 16) & 0xFF;
    let ag = (a >>  8) & 0xFF; let bg = (b >>  8) & 0xFF;
    let ab =  a        & 0xFF; let bb =  b        & 0xFF;
    0xFF000000 | (lerp(ar,br) << 16) | (lerp(ag,bg) << 8) | lerp(ab,bb)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    const RED:   u32 = 0xFFFF0000;
    const BLACK: u32 = 0xFF000000;

    #[test]
    fn blend_endpoints_and_midpoint() {
        assert_eq!(blend(BLACK, RED, 0.0), BLACK);
        assert_eq!(blend(BLACK, RED, 1.0), RED);
        assert_eq!(blend(BLACK, 0xFFC8C8C8, 0.5), 0xFF646464);
    }

    #[test]
    fn primitives_clip_to_canvas() {
        let mut c = Canvas::new(20, 10);
        c.clear(BLACK);
        c.fill_rect(BoundingBox { x_min: -5, y_min: -5, x_max: 2, y_max: 2 }, RED);
        assert_eq!(c.pixel(0, 0), Some(RED));
        assert_eq!(c.pixel(2, 2), Some(RED));
        assert_eq!(c.pixel(3, 3), Some(BLACK));
        assert_eq!(c.pixel(-1, 0), None);

        c.fill_circle(Point::new(19, 9), 30, RED);
        c.draw_line(Point::new(-100, 5), Point::new(100, 5), 1, RED);
        assert_eq!(c.pixels().len(), 200);
    }

    #[test]
    fn line_reaches_both_endpoints() {
        let mut c = Canvas::new(40, 40);
        c.clear(BLACK);
        c.draw_line(Point::new(3, 30), Point::new(35, 4), 1, RED);
        assert_eq!(c.pixel(3, 30), Some(RED));
        assert_eq!(c.pixel(35, 4), Some(RED));
    }

    #[test]
    fn border_leaves_interior() {
        let mut c = Canvas::new(30, 30);
        c.clear(BLACK);
        c.draw_border(BoundingBox { x_min: 5, y_min: 5, x_max: 20, y_max: 20 }, 2, RED);
        assert_eq!(c.pixel(5, 12), Some(RED));
        assert_eq!(c.pixel(6, 12), Some(RED));
        assert_eq!(c.pixel(7, 12), Some(BLACK));
        assert_eq!(c.pixel(20, 20), Some(RED));
    }

    #[test]
    fn blended_box_keeps_background_visible() {
        let mut c = Canvas::new(10, 10);
        c.clear(BLACK);
        c.blend_rect(BoundingBox { x_min: 0, y_min: 0, x_max: 9, y_max: 9 }, BOX_DRAGGING, BOX_ALPHA);
        assert_eq!(c.pixel(4, 4), Some(0xFF005000));
    }

    #[test]
    fn scaled_label_occupies_blocks() {
        let mut c = Canvas::new(40, 20);
        c.clear(BLACK);
        c.draw_label("1", 0, 0, 2, RED);
        // '1' top row is 0b010: middle column only, 2×2 block at x 2..=3.
        assert_eq!(c.pixel(2, 0), Some(RED));
        assert_eq!(c.pixel(3, 1), Some(RED));
        assert_eq!(c.pixel(0, 0), Some(BLACK));
    }
}
