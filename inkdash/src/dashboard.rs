//! UI state of the dashboard and what each tick invalidates on screen.

use std::time::Instant;

use chrono::{DateTime, Local};
use log::{debug, info};
use ringbuffer::{AllocRingBuffer, RingBuffer};

use crate::{
    config::Policy,
    geometry::{LogicalPoint, Rect},
    layout::{Button, Layout},
    sampler::Sample,
};

pub const HISTORY_LEN: usize = 32;

/// Half-side of the square a touch mark may paint into. Covers the widest
/// crosshair the renderer draws.
pub const MARK_REACH: u32 = 10;

/// Transient crosshair left where a fun-mode tap landed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TouchMark {
    pub at: LogicalPoint,
    pub ttl: u8,
}

pub struct DashboardState {
    pub paused: bool,
    pub fun_mode: bool,
    pub theme_mode: bool,
    pub cpu_history: AllocRingBuffer<f32>,
    pub touch_marks: Vec<TouchMark>,
    /// Values currently on (or about to be put on) the panel.
    pub shown: Option<Sample>,
    pub minute_label: String,
    pub last_drawn_cpu: Option<f32>,
    pub last_drawn_mem: Option<f32>,
    pub last_minute_label: Option<String>,
    pub last_draw_time: Option<Instant>,
    pub force_full: bool,

    layout: Layout,
    cpu_threshold: f32,
    mem_threshold: f32,
    mark_ttl: u8,
    ticks: u64,
    pending: Vec<Rect>,
}

impl DashboardState {
    #[must_use]
    pub fn new(layout: Layout, policy: &Policy) -> Self {
        Self {
            paused: false,
            fun_mode: true,
            theme_mode: false,
            cpu_history: AllocRingBuffer::new(HISTORY_LEN),
            touch_marks: Vec::new(),
            shown: None,
            minute_label: String::new(),
            last_drawn_cpu: None,
            last_drawn_mem: None,
            last_minute_label: None,
            last_draw_time: None,
            force_full: false,
            layout,
            cpu_threshold: policy.cpu_threshold,
            mem_threshold: policy.mem_threshold,
            mark_ttl: policy.mark_ttl,
            ticks: 0,
            pending: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Regions invalidated since the last successful draw.
    #[inline]
    #[must_use]
    pub fn pending(&self) -> &[Rect] {
        &self.pending
    }

    fn mark(&mut self, r: Rect) {
        if !self.pending.contains(&r) {
            self.pending.push(r);
        }
    }

    /// Folds one tick's inputs into the state and returns every region that
    /// needs redrawing. Regions stay pending until [`Self::commit`].
    pub fn advance(
        &mut self,
        sample: Option<Sample>,
        touch: Option<LogicalPoint>,
        now: DateTime<Local>,
    ) -> Vec<Rect> {
        self.ticks += 1;

        if let Some(p) = touch {
            self.on_touch(p);
        }
        self.decay_marks();

        match sample {
            Some(s) if !self.paused => {
                self.cpu_history.push(s.cpu_pct);
                self.shown = Some(s);
            }
            // Something has to be on screen, even when starting paused.
            Some(s) if self.shown.is_none() => self.shown = Some(s),
            _ => {}
        }
        self.minute_label = now.format("%H:%M").to_string();

        if self.ticks == 1 {
            self.mark(self.layout.full);
        } else {
            self.detect_changes();
        }
        self.pending.clone()
    }

    fn detect_changes(&mut self) {
        if let Some((cpu, mem)) = self.shown.as_ref().map(|s| (s.cpu_pct, s.mem_pct)) {
            if self.last_drawn_cpu.map_or(true, |last| (cpu - last).abs() >= self.cpu_threshold) {
                self.mark(self.layout.cpu_panel);
                self.mark(self.layout.cpu_gauge);
            }
            if self.last_drawn_mem.map_or(true, |last| (mem - last).abs() >= self.mem_threshold) {
                self.mark(self.layout.right_panel);
            }
        }
        if self.last_minute_label.as_deref() != Some(self.minute_label.as_str()) {
            self.mark(self.layout.clock);
        }
    }

    fn on_touch(&mut self, p: LogicalPoint) {
        let l = self.layout;
        match l.button_at(&p) {
            Some(Button::Theme) => {
                self.theme_mode = !self.theme_mode;
                info!("touch: theme={}", self.theme_mode);
                self.mark(l.right_panel);
                self.mark(l.header_left);
            }
            Some(Button::Pause) => {
                self.paused = !self.paused;
                info!("touch: paused={}", self.paused);
                self.mark(l.header_left);
                self.mark(l.body);
            }
            Some(Button::Refresh) => {
                self.force_full = true;
                info!("touch: force full refresh");
                self.mark(l.full);
            }
            Some(Button::Fun) => {
                self.fun_mode = !self.fun_mode;
                info!("touch: fun={}", self.fun_mode);
                self.mark(l.right_panel);
                self.mark(l.header_right);
                for m in self.touch_marks.clone() {
                    self.mark(Rect::around(m.at, MARK_REACH, &l.full));
                }
            }
            None if self.fun_mode => {
                info!("touch: mark at ({},{})", p.x, p.y);
                self.touch_marks.push(TouchMark { at: p, ttl: self.mark_ttl });
                self.mark(Rect::around(p, MARK_REACH, &l.full));
            }
            None => debug!("touch at ({},{}) hits nothing", p.x, p.y),
        }
    }

    fn decay_marks(&mut self) {
        if self.touch_marks.is_empty() {
            return;
        }
        let touched: Vec<Rect> =
            self.touch_marks.iter().map(|m| Rect::around(m.at, MARK_REACH, &self.layout.full)).collect();
        for m in &mut self.touch_marks {
            m.ttl = m.ttl.saturating_sub(1);
        }
        self.touch_marks.retain(|m| m.ttl > 0);
        if self.fun_mode {
            for r in touched {
                self.mark(r);
            }
        }
    }

    /// Records that `drawn` on the panel now shows the current state.
    ///
    /// Baselines only move for the areas that were actually repainted, so a
    /// clock-only refresh does not hide a slow CPU or memory drift.
    pub fn commit(&mut self, now: Instant, drawn: Rect, full: bool) {
        let l = self.layout;
        let covers = |r: &Rect| full || drawn.contains_rect(r);
        if let Some(s) = &self.shown {
            if covers(&l.cpu_panel) && covers(&l.cpu_gauge) {
                self.last_drawn_cpu = Some(s.cpu_pct);
            }
            if covers(&l.right_panel) {
                self.last_drawn_mem = Some(s.mem_pct);
            }
        }
        if covers(&l.clock) {
            self.last_minute_label = Some(self.minute_label.clone());
        }
        self.last_draw_time = Some(now);
        self.pending.clear();
        if full {
            self.force_full = false;
        }
    }
}
