use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use log::debug;

use crate::{
    error::{Error, Result},
    geometry::{DevicePoint, LogicalPoint},
    panel::Panel,
};

/// Hardware reports this position when no finger is down.
pub const NO_TOUCH: DevicePoint = DevicePoint { x: 0, y: 0 };

/// A raw reading from the touch controller, in device coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TouchSample {
    pub point: DevicePoint,
    pub pressed: bool,
}

impl TouchSample {
    /// Controllers hand out signed registers; negative positions are garbage.
    pub fn decode(x: i32, y: i32, pressed: bool) -> Result<Self> {
        let (Ok(ux), Ok(uy)) = (u32::try_from(x), u32::try_from(y)) else {
            return Err(Error::TouchDecode { x, y, reason: "negative coordinate" });
        };
        Ok(Self { point: DevicePoint { x: ux, y: uy }, pressed })
    }
}

/// Where raw samples come from. Each scan yields whatever the controller
/// buffered since the previous one.
pub trait TouchSource {
    fn scan(&mut self) -> Vec<Result<TouchSample>>;
}

/// Filters noisy controller output down to at most one tap per scan.
pub struct TouchNormalizer {
    panel: Panel,
    debounce: Duration,
    last_accepted: Option<(DevicePoint, Instant)>,
}

impl TouchNormalizer {
    #[must_use]
    pub fn new(panel: Panel, debounce: Duration) -> Self {
        Self { panel, debounce, last_accepted: None }
    }

    /// Accepts `raw` unless it is the no-touch sentinel, off the panel, or a
    /// repeat of the last accepted point within the debounce window.
    pub fn normalize(&mut self, raw: &TouchSample, now: Instant) -> Option<LogicalPoint> {
        let p = raw.point;
        if p == NO_TOUCH {
            return None;
        }
        if !self.panel.contains_device(&p) {
            debug!("touch {p:?} off panel");
            return None;
        }
        if let Some((last, at)) = self.last_accepted {
            if last == p && now.saturating_duration_since(at) < self.debounce {
                debug!("touch {p:?} debounced");
                return None;
            }
        }
        self.last_accepted = Some((p, now));
        Some(self.panel.device_to_logical(p))
    }

    /// First accepted press out of one scan. Decode errors are dropped.
    pub fn first_tap(
        &mut self,
        scan: impl IntoIterator<Item = Result<TouchSample>>,
        now: Instant,
    ) -> Option<LogicalPoint> {
        scan.into_iter()
            .filter_map(|s| s.map_err(|e| debug!("dropping touch sample: {e}")).ok())
            .filter(|s| s.pressed)
            .find_map(|s| self.normalize(&s, now))
    }
}

/// Latest pending tap, handed from the touch poller to the tick loop.
/// A newer tap overwrites one that was not consumed yet.
#[derive(Clone, Default)]
pub struct TouchSlot {
    inner: Arc<Mutex<Option<LogicalPoint>>>,
}

impl TouchSlot {
    pub fn offer(&self, p: LogicalPoint) {
        let mut slot = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(old) = slot.replace(p) {
            debug!("touch at ({},{}) superseded by ({},{})", old.x, old.y, p.x, p.y);
        }
    }

    pub fn take(&self) -> Option<LogicalPoint> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).take()
    }
}
