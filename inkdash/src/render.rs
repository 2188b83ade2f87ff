use std::f32::consts::PI;

use itertools::Itertools;
use ringbuffer::RingBuffer;

use crate::{
    canvas::{Canvas, Color},
    dashboard::DashboardState,
    geometry::Rect,
    layout::{Button, BODY_TOP, GAUGE_REACH, HEADER_BOTTOM},
};

const BAR_HEIGHT: u32 = 12;
const GAUGE_RADIUS: i32 = GAUGE_REACH as i32 - 1;

fn clamp_pct(pct: f32) -> f32 {
    if pct.is_nan() {
        0.0
    } else {
        pct.clamp(0.0, 100.0)
    }
}

fn bar(canvas: &mut Canvas, x: u32, y: u32, w: u32, pct: f32) {
    let outline = Rect::new(x, y, x + w, y + BAR_HEIGHT);
    canvas.fill_rect(&outline, Color::White);
    canvas.rect(&outline, Color::Black);
    let filled = (clamp_pct(pct) * w as f32 / 100.0) as u32;
    if filled > 1 {
        canvas.fill_rect(&Rect::new(x + 1, y + 1, x + filled - 1, y + BAR_HEIGHT - 1), Color::Black);
    }
}

fn sparkline(canvas: &mut Canvas, values: &[f32], area: Rect) {
    canvas.fill_rect(&area, Color::White);
    canvas.rect(&area, Color::Black);
    let n = values.len();
    if n < 2 {
        return;
    }
    let (w, h) = (area.width() as i32 - 1, area.height() as i32 - 1);
    let px = |i: usize| area.x0 as i32 + (i as i32 * (w - 2)) / (n as i32 - 1) + 1;
    let py = |v: f32| area.y1 as i32 - 2 - (clamp_pct(v) * (h - 3) as f32 / 100.0) as i32;
    for (i, (a, b)) in values.iter().tuple_windows().enumerate() {
        canvas.line((px(i), py(*a)), (px(i + 1), py(*b)), Color::Black);
    }
}

fn gauge(canvas: &mut Canvas, (cx, cy): (i32, i32), pct: f32) {
    let r = GAUGE_RADIUS;
    canvas.fill_circle((cx, cy), r, Color::White);
    canvas.circle((cx, cy), r, Color::Black);
    // 270 degree scale, open at the bottom.
    let polar = |deg: f32, len: i32| {
        let rad = deg * PI / 180.0;
        (cx + (len as f32 * rad.cos()).round() as i32, cy - (len as f32 * rad.sin()).round() as i32)
    };
    for step in 0..=54 {
        let (x, y) = polar(225.0 - 5.0 * step as f32, r - 2);
        canvas.set(x, y, Color::Black);
    }
    let needle = polar(225.0 - 270.0 * clamp_pct(pct) / 100.0, r - 6);
    canvas.line((cx, cy), needle, Color::Black);
    canvas.fill_circle((cx, cy), 2, Color::Black);
}

/// Segments `abcdefg` of each digit, `a` in the top bit.
const SEGMENTS: [u8; 10] = [
    0b111_1110, 0b011_0000, 0b110_1101, 0b111_1001, 0b011_0011,
    0b101_1011, 0b101_1111, 0b111_0000, 0b111_1111, 0b111_1011,
];
const DIGIT_W: i32 = 6;
const DIGIT_H: i32 = 11;

fn digit(canvas: &mut Canvas, (x, y): (i32, i32), d: usize, ink: Color) {
    let (r, m, b) = (x + DIGIT_W - 1, y + DIGIT_H / 2, y + DIGIT_H - 1);
    let strokes = [
        ((x, y), (r, y)),
        ((r, y), (r, m)),
        ((r, m), (r, b)),
        ((x, b), (r, b)),
        ((x, m), (x, b)),
        ((x, y), (x, m)),
        ((x, m), (r, m)),
    ];
    for (i, (from, to)) in strokes.into_iter().enumerate() {
        if SEGMENTS[d] & (0x40 >> i) != 0 {
            canvas.line(from, to, ink);
        }
    }
}

/// Draws `HH:MM` centred on `(cx, cy)`. Anything but digits and `:` is skipped.
fn clock(canvas: &mut Canvas, (cx, cy): (i32, i32), label: &str, ink: Color) {
    let advance = |c: char| if c == ':' { 4 } else { DIGIT_W + 2 };
    let width: i32 = label.chars().map(advance).sum::<i32>() - 2;
    let (mut x, y) = (cx - width / 2, cy - DIGIT_H / 2);
    for c in label.chars() {
        if c == ':' {
            canvas.set(x, y + 3, ink);
            canvas.set(x, y + DIGIT_H - 4, ink);
        } else if let Some(d) = c.to_digit(10) {
            digit(canvas, (x, y), d as usize, ink);
        }
        x += advance(c);
    }
}

fn button(canvas: &mut Canvas, b: Button, active: bool, label: &str) {
    let area = b.area();
    let fill = if active { Color::Black } else { Color::White };
    let ink = fill.invert();
    canvas.fill_rect(&area, fill);
    canvas.rect(&area, Color::Black);
    // Knock the corners off.
    for (x, y) in [(area.x0, area.y0), (area.x1, area.y0), (area.x0, area.y1), (area.x1, area.y1)] {
        canvas.set(x as i32, y as i32, Color::White);
    }
    let cy = (area.y0 + area.y1) / 2;
    // The fun button sits in the clock area and carries the time.
    if b == Button::Fun {
        clock(canvas, (((area.x0 + area.x1) / 2) as i32, cy as i32), label, ink);
        return;
    }
    // Labels need a font; a pip tells the buttons apart instead.
    let pips = Button::ALL.iter().position(|x| *x == b).unwrap_or(0) as u32 + 1;
    let x0 = (area.x0 + area.x1) / 2 - 3 * pips;
    for i in 0..pips {
        canvas.fill_rect(&Rect::new(x0 + 6 * i, cy - 1, x0 + 6 * i + 2, cy + 1), ink);
    }
}

/// Paints the whole dashboard from `state`. Callers pick what part of the
/// result reaches the panel.
pub fn render(state: &DashboardState, canvas: &mut Canvas) {
    let l = state.layout();
    let (r, b) = (l.full.x1, l.full.y1);
    let split = l.split;
    let (cpu, mem) = state.shown.as_ref().map_or((0.0, 0.0), |s| (s.cpu_pct, s.mem_pct));

    canvas.clear(Color::White);
    canvas.rect(&l.full, Color::Black);
    canvas.line((0, HEADER_BOTTOM as i32), (r as i32, HEADER_BOTTOM as i32), Color::Black);
    canvas.line((split as i32, BODY_TOP as i32), (split as i32, b as i32), Color::Black);

    for btn in Button::ALL {
        let active = match btn {
            Button::Theme => state.theme_mode,
            Button::Pause => state.paused,
            Button::Refresh => false,
            Button::Fun => state.fun_mode,
        };
        button(canvas, btn, active, &state.minute_label);
    }

    let bar_w = split - 17;
    bar(canvas, 8, 46, bar_w, cpu);
    let history: Vec<f32> = state.cpu_history.iter().copied().collect();
    sparkline(canvas, &history, Rect::new(8, 64, 8 + bar_w, b - 11));

    bar(canvas, split + 9, 64, bar_w, mem);
    let g = l.cpu_gauge;
    let (gx, gy) = (((g.x0 + g.x1) / 2) as i32, ((g.y0 + g.y1) / 2) as i32);
    gauge(canvas, (gx, gy), cpu);
    gauge(canvas, (gx + 55, gy), mem);

    if state.theme_mode {
        for x in (split + 1..=r).step_by(8) {
            canvas.line((x as i32, BODY_TOP as i32 + 1), (x as i32, b as i32 - 1), Color::Black);
        }
    }

    if state.fun_mode {
        for m in state.touch_marks.iter().filter(|m| m.ttl > 0) {
            let (mx, my) = (m.at.x as i32, m.at.y as i32);
            let rad = 2 + i32::from(m.ttl.min(4));
            canvas.fill_circle((mx, my), rad, Color::White);
            canvas.circle((mx, my), rad, Color::Black);
            canvas.line((mx - rad - 2, my), (mx + rad + 2, my), Color::Black);
            canvas.line((mx, my - rad - 2), (mx, my + rad + 2), Color::Black);
        }
    }

    if state.paused {
        let boxed = Rect::new(split - 37, 46, split + 37, 76);
        canvas.fill_rect(&boxed, Color::White);
        canvas.rect(&boxed, Color::Black);
        let (cx, cy) = (split, 61);
        canvas.fill_rect(&Rect::new(cx - 7, cy - 8, cx - 3, cy + 8), Color::Black);
        canvas.fill_rect(&Rect::new(cx + 3, cy - 8, cx + 7, cy + 8), Color::Black);
    }
}
