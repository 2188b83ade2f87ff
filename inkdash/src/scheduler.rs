//! Decides when to touch the panel, and how.
//!
//! Every refresh is visible, slow and wears the panel, so the scheduler
//! prefers doing nothing, then a single partial window, and only goes for a
//! full refresh when asked to or when ghosting has had time to build up.

use std::{fmt, time::Instant};

use log::{debug, warn};

use crate::{
    config::Policy,
    geometry::Rect,
    panel::{DeviceWindow, Panel},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RefreshDecision {
    Skip,
    FullRefresh,
    /// One window covering every dirty region.
    PartialRefresh { region: Rect, window: DeviceWindow },
}

impl fmt::Display for RefreshDecision {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RefreshDecision::Skip => write!(f, "SKIP"),
            RefreshDecision::FullRefresh => write!(f, "FULL"),
            RefreshDecision::PartialRefresh { region, window } => {
                write!(f, "PART-REGION {region} dev {window}")
            }
        }
    }
}

pub struct Scheduler {
    panel: Panel,
    policy: Policy,
    partials_since_full: u32,
}

impl Scheduler {
    #[must_use]
    pub fn new(panel: Panel, policy: Policy) -> Self {
        Self { panel, policy, partials_since_full: 0 }
    }

    #[inline]
    #[must_use]
    pub fn partials_since_full(&self) -> u32 {
        self.partials_since_full
    }

    /// Picks the refresh for this tick. `last_draw_time` is `None` until the
    /// panel has been painted once.
    #[must_use]
    pub fn decide(
        &self,
        dirty: &[Rect],
        force_full: bool,
        now: Instant,
        last_draw_time: Option<Instant>,
    ) -> RefreshDecision {
        if force_full {
            return RefreshDecision::FullRefresh;
        }
        let Some(last) = last_draw_time else {
            return RefreshDecision::FullRefresh;
        };
        let Some(region) = Rect::union(dirty) else {
            return RefreshDecision::Skip;
        };
        let elapsed = now.saturating_duration_since(last);
        if elapsed < self.policy.min_draw_interval {
            debug!("throttled: {elapsed:?} since last draw, {region} waiting");
            return RefreshDecision::Skip;
        }
        if self.policy.full_every > 0 && self.partials_since_full >= self.policy.full_every {
            return RefreshDecision::FullRefresh;
        }
        match self.panel.map_region(&region) {
            Ok(window) => RefreshDecision::PartialRefresh { region, window },
            Err(e) => {
                warn!("{e}, skipping");
                RefreshDecision::Skip
            }
        }
    }

    /// Accounts for a refresh that actually reached the panel.
    pub fn record(&mut self, done: &RefreshDecision) {
        match done {
            RefreshDecision::Skip => {}
            RefreshDecision::FullRefresh => self.partials_since_full = 0,
            RefreshDecision::PartialRefresh { .. } => self.partials_since_full += 1,
        }
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::*;
    use crate::panel::PanelKind;

    const CPU: Rect = Rect::new(0, 23, 124, 121);
    const CLOCK: Rect = Rect::new(160, 0, 249, 22);

    fn scheduler(full_every: u32) -> Scheduler {
        let policy = Policy { full_every, ..Policy::default() };
        Scheduler::new(Panel::from(PanelKind::Epd2in13V4), policy)
    }

    fn later(t: Instant, secs: u64) -> Instant {
        t + Duration::from_secs(secs)
    }

    #[test]
    fn first_draw_is_full() {
        let s = scheduler(0);
        let t0 = Instant::now();
        assert_eq!(s.decide(&[], false, t0, None), RefreshDecision::FullRefresh);
        assert_eq!(s.decide(&[CPU], false, t0, None), RefreshDecision::FullRefresh);
    }

    #[test]
    fn forced_full_beats_skip() {
        let s = scheduler(0);
        let t0 = Instant::now();
        assert_eq!(s.decide(&[], false, t0, Some(t0)), RefreshDecision::Skip);
        assert_eq!(s.decide(&[], true, t0, Some(t0)), RefreshDecision::FullRefresh);
    }

    #[test]
    fn throttles_then_merges() {
        let s = scheduler(0);
        let t0 = Instant::now();
        assert_eq!(s.decide(&[CPU, CLOCK], false, later(t0, 11), Some(t0)), RefreshDecision::Skip);
        assert_eq!(s.decide(&[], false, later(t0, 60), Some(t0)), RefreshDecision::Skip);

        let RefreshDecision::PartialRefresh { region, window } =
            s.decide(&[CPU, CLOCK], false, later(t0, 12), Some(t0))
        else {
            panic!("expected a partial refresh");
        };
        assert_eq!(region, Rect::new(0, 0, 249, 121));
        assert_eq!(window, DeviceWindow { x0: 0, y0: 0, x1: 121, y1: 249 });
    }

    #[test]
    fn cpu_panel_window() {
        let s = scheduler(0);
        let t0 = Instant::now();
        assert_eq!(
            s.decide(&[CPU], false, later(t0, 20), Some(t0)),
            RefreshDecision::PartialRefresh {
                region: CPU,
                window: DeviceWindow { x0: 0, y0: 0, x1: 103, y1: 124 }
            }
        );
    }

    #[test]
    fn periodic_full_refresh() {
        let mut s = scheduler(3);
        let t0 = Instant::now();
        for _ in 0..3 {
            let d = s.decide(&[CPU], false, later(t0, 20), Some(t0));
            assert!(matches!(d, RefreshDecision::PartialRefresh { .. }));
            s.record(&d);
        }
        let d = s.decide(&[CPU], false, later(t0, 20), Some(t0));
        assert_eq!(d, RefreshDecision::FullRefresh);
        s.record(&d);
        assert_eq!(s.partials_since_full(), 0);
        // Still nothing to do when nothing is dirty.
        assert_eq!(s.decide(&[], false, later(t0, 20), Some(t0)), RefreshDecision::Skip);
    }

    #[test]
    fn unmappable_region_is_skipped() {
        let s = scheduler(0);
        let t0 = Instant::now();
        let bad = Rect { x0: 30, y0: 0, x1: 20, y1: 0 };
        assert_eq!(s.decide(&[bad], false, later(t0, 20), Some(t0)), RefreshDecision::Skip);
    }
}
