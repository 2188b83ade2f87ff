//! Touch sources that need no hardware.

use std::collections::VecDeque;

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    error::Result,
    geometry::{DevicePoint, LogicalPoint},
    layout::{Button, BODY_TOP},
    panel::Panel,
    touch::{TouchSample, TouchSource, NO_TOUCH},
};

/// Random taps mixed with the junk real controllers produce: the no-touch
/// sentinel, off-panel readings and the same point reported several times.
pub struct RandomTaps {
    panel: Panel,
    rng: StdRng,
    /// Chance that a scan carries a tap at all.
    tap_chance: f64,
}

impl RandomTaps {
    #[must_use]
    pub fn new(panel: Panel, tap_chance: f64) -> Self {
        Self { panel, rng: StdRng::from_entropy(), tap_chance }
    }

    #[must_use]
    pub fn seeded(panel: Panel, tap_chance: f64, seed: u64) -> Self {
        Self { panel, rng: StdRng::seed_from_u64(seed), tap_chance }
    }

    fn target(&mut self) -> LogicalPoint {
        if self.rng.gen_bool(0.3) {
            let b = Button::ALL[self.rng.gen_range(0..Button::ALL.len())];
            let a = b.area();
            return (self.rng.gen_range(a.x0..=a.x1), self.rng.gen_range(a.y0..=a.y1)).into();
        }
        let x = self.rng.gen_range(1..self.panel.logical_width());
        let y = self.rng.gen_range(BODY_TOP..self.panel.logical_height());
        (x, y).into()
    }
}

impl TouchSource for RandomTaps {
    fn scan(&mut self) -> Vec<Result<TouchSample>> {
        if !self.rng.gen_bool(self.tap_chance) {
            return Vec::new();
        }
        let mut scan = Vec::new();
        if self.rng.gen_bool(0.2) {
            scan.push(Ok(TouchSample { point: NO_TOUCH, pressed: true }));
        }
        if self.rng.gen_bool(0.1) {
            let off = DevicePoint { x: self.panel.width() + 5, y: self.rng.gen_range(0..self.panel.height()) };
            scan.push(Ok(TouchSample { point: off, pressed: true }));
        }
        let target = self.target();
        let point = self.panel.logical_to_device(target);
        for _ in 0..self.rng.gen_range(1..=3) {
            scan.push(Ok(TouchSample { point, pressed: true }));
        }
        scan.push(Ok(TouchSample { point, pressed: false }));
        scan
    }
}

/// Replays prepared scans, then reports nothing.
#[derive(Default)]
pub struct ScriptedTouches {
    scans: VecDeque<Vec<Result<TouchSample>>>,
}

impl ScriptedTouches {
    pub fn push_scan(&mut self, scan: Vec<Result<TouchSample>>) {
        self.scans.push_back(scan);
    }

    /// A scan holding a single press at a logical point.
    pub fn push_tap(&mut self, panel: &Panel, at: LogicalPoint) {
        let point = panel.logical_to_device(at);
        self.push_scan(vec![Ok(TouchSample { point, pressed: true })]);
    }
}

impl TouchSource for ScriptedTouches {
    fn scan(&mut self) -> Vec<Result<TouchSample>> {
        self.scans.pop_front().unwrap_or_default()
    }
}
