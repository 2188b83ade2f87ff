//! Panel geometry: native sizes, the landscape rotation and byte-aligned
//! partial-refresh windows.
//!
//! Panels are addressed in portrait, `W` columns by `H` rows, eight
//! horizontally-adjacent pixels per byte. The dashboard draws in landscape,
//! `H` by `W`, and every coordinate crossing that boundary goes through here.

use std::fmt;

use clap::ValueEnum;

use crate::{
    error::{Error, Result},
    geometry::{DevicePoint, LogicalPoint, Rect},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum PanelKind {
    /// 2.13" V4, 122x250, GT1151 touch
    #[value(name = "2in13")]
    Epd2in13V4,
    /// 2.9" V2, 128x296, ICNT86X touch
    #[value(name = "2in9")]
    Epd2in9V2,
}

impl fmt::Display for PanelKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PanelKind::Epd2in13V4 => write!(f, "2.13\" V4 (GT1151)"),
            PanelKind::Epd2in9V2 => write!(f, "2.9\" V2 (ICNT86X)"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Panel {
    kind: PanelKind,
}

impl From<PanelKind> for Panel {
    fn from(kind: PanelKind) -> Self {
        Self { kind }
    }
}

/// A byte-aligned window in device space, inclusive bounds.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DeviceWindow {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl fmt::Display for DeviceWindow {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{},{}]-[{},{}]", self.x0, self.y0, self.x1, self.y1)
    }
}

impl DeviceWindow {
    #[inline]
    #[must_use]
    pub fn byte_start(&self) -> usize {
        (self.x0 >> 3) as usize
    }

    #[inline]
    #[must_use]
    pub fn bytes_per_line(&self) -> usize {
        ((self.x1 >> 3) - (self.x0 >> 3) + 1) as usize
    }

    #[inline]
    #[must_use]
    pub fn rows(&self) -> usize {
        (self.y1 - self.y0 + 1) as usize
    }

    #[must_use]
    pub fn span_len(&self) -> usize {
        self.bytes_per_line() * self.rows()
    }
}

impl Panel {
    #[inline]
    #[must_use]
    pub fn kind(&self) -> PanelKind {
        self.kind
    }

    /// Native width `W`, in device columns.
    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        match self.kind {
            PanelKind::Epd2in13V4 => 122,
            PanelKind::Epd2in9V2 => 128,
        }
    }

    /// Native height `H`, in device rows.
    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        match self.kind {
            PanelKind::Epd2in13V4 => 250,
            PanelKind::Epd2in9V2 => 296,
        }
    }

    #[inline]
    #[must_use]
    pub fn logical_width(&self) -> u32 {
        self.height()
    }

    #[inline]
    #[must_use]
    pub fn logical_height(&self) -> u32 {
        self.width()
    }

    #[inline]
    #[must_use]
    pub fn logical_bounds(&self) -> Rect {
        Rect::new(0, 0, self.logical_width() - 1, self.logical_height() - 1)
    }

    #[inline]
    #[must_use]
    pub fn line_bytes(&self) -> usize {
        self.width().div_ceil(8) as usize
    }

    #[inline]
    #[must_use]
    pub fn buffer_len(&self) -> usize {
        self.line_bytes() * self.height() as usize
    }

    #[inline]
    #[must_use]
    pub fn contains_device(&self, p: &DevicePoint) -> bool {
        p.x < self.width() && p.y < self.height()
    }

    #[inline]
    #[must_use]
    pub fn logical_to_device(&self, p: LogicalPoint) -> DevicePoint {
        DevicePoint { x: self.width() - 1 - p.y, y: p.x }
    }

    #[inline]
    #[must_use]
    pub fn device_to_logical(&self, p: DevicePoint) -> LogicalPoint {
        LogicalPoint { x: p.y, y: self.width() - 1 - p.x }
    }

    /// Maps a logical rect to the device window a partial write must cover.
    ///
    /// The rect is first clipped to the canvas. Columns are widened to whole
    /// bytes: the window always contains the requested area.
    pub fn map_region(&self, rect: &Rect) -> Result<DeviceWindow> {
        let bounds = self.logical_bounds();
        let (x0, x1) = (rect.x0.min(bounds.x1), rect.x1.min(bounds.x1));
        let (y0, y1) = (rect.y0.min(bounds.y1), rect.y1.min(bounds.y1));
        if x0 > x1 || y0 > y1 {
            return Err(Error::RegionMapping { rect: *rect, reason: "inverted rectangle" });
        }

        // Rotation swaps the axes: logical rows become device columns.
        let a = self.logical_to_device((x0, y1).into());
        let b = self.logical_to_device((x1, y0).into());
        let (dx0, dx1) = (a.x.min(b.x), a.x.max(b.x));
        let (dy0, dy1) = (a.y.min(b.y), a.y.max(b.y));

        let dx0 = dx0 & !0x7;
        let dx1 = (dx1 | 0x7).min(self.width() - 1);
        if dx0 > dx1 || dy0 > dy1 || dy1 >= self.height() {
            return Err(Error::RegionMapping { rect: *rect, reason: "empty after byte alignment" });
        }
        Ok(DeviceWindow { x0: dx0, y0: dy0, x1: dx1, y1: dy1 })
    }

    /// Copies the bytes covering `window` out of a packed full frame, row by row.
    pub fn extract(&self, frame: &[u8], window: &DeviceWindow) -> Result<Vec<u8>> {
        if frame.len() < self.buffer_len() {
            return Err(Error::Transport {
                op: "extract",
                reason: format!("frame is {} bytes, panel needs {}", frame.len(), self.buffer_len()),
            });
        }
        if window.x0 > window.x1 || window.y0 > window.y1 || !self.contains_device(&(window.x1, window.y1).into()) {
            return Err(Error::Transport { op: "extract", reason: format!("window {window} is off the panel") });
        }
        let stride = self.line_bytes();
        let (start, len) = (window.byte_start(), window.bytes_per_line());
        let mut span = Vec::with_capacity(window.span_len());
        for row in window.y0..=window.y1 {
            let base = row as usize * stride + start;
            span.extend_from_slice(&frame[base..base + len]);
        }
        Ok(span)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const KINDS: [PanelKind; 2] = [PanelKind::Epd2in13V4, PanelKind::Epd2in9V2];

    #[test]
    fn rotation_round_trips() {
        for kind in KINDS {
            let panel = Panel::from(kind);
            for x in 0..panel.logical_width() {
                for y in 0..panel.logical_height() {
                    let p = LogicalPoint { x, y };
                    let d = panel.logical_to_device(p);
                    assert!(panel.contains_device(&d), "{p:?} -> {d:?}");
                    assert_eq!(panel.device_to_logical(d), p);
                }
            }
        }
    }

    #[test]
    fn maps_cpu_panel_on_2in13() {
        let panel = Panel::from(PanelKind::Epd2in13V4);
        assert_eq!(panel.logical_to_device((0, 121).into()), (0, 0).into());
        assert_eq!(panel.logical_to_device((124, 23).into()), (98, 124).into());

        let w = panel.map_region(&Rect::new(0, 23, 124, 121)).unwrap();
        assert_eq!(w, DeviceWindow { x0: 0, y0: 0, x1: 103, y1: 124 });
        assert_eq!(w.bytes_per_line(), 13);
        assert_eq!(w.rows(), 125);
    }

    #[test]
    fn alignment_contains_request_and_stays_on_panel() {
        for kind in KINDS {
            let panel = Panel::from(kind);
            let (lw, lh) = (panel.logical_width(), panel.logical_height());
            for (x0, x1) in [(0, 0), (3, 17), (100, lw - 1), (lw - 1, lw - 1)] {
                for y0 in 0..lh {
                    for y1 in (y0..lh).step_by(7) {
                        let rect = Rect::new(x0, y0, x1, y1);
                        let w = panel.map_region(&rect).unwrap();
                        assert_eq!(w.x0 % 8, 0);
                        assert!(w.x1 % 8 == 7 || w.x1 == panel.width() - 1);
                        assert!(w.x1 < panel.width() && w.y1 < panel.height());
                        for corner in [(x0, y0), (x1, y1)] {
                            let d = panel.logical_to_device(corner.into());
                            assert!((w.x0..=w.x1).contains(&d.x), "{rect} -> {w}");
                            assert!((w.y0..=w.y1).contains(&d.y), "{rect} -> {w}");
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn out_of_canvas_rect_is_clipped() {
        let panel = Panel::from(PanelKind::Epd2in13V4);
        let w = panel.map_region(&Rect::new(200, 100, 400, 400)).unwrap();
        assert_eq!(w, DeviceWindow { x0: 0, y0: 200, x1: 23, y1: 249 });
    }

    #[test]
    fn inverted_rect_is_refused() {
        let panel = Panel::from(PanelKind::Epd2in13V4);
        let err = panel.map_region(&Rect { x0: 10, y0: 5, x1: 9, y1: 5 }).unwrap_err();
        assert!(matches!(err, Error::RegionMapping { .. }));
    }

    #[test]
    fn extracts_window_bytes_row_by_row() {
        let panel = Panel::from(PanelKind::Epd2in13V4);
        let stride = panel.line_bytes();
        assert_eq!(stride, 16);
        let frame: Vec<u8> = (0..panel.buffer_len()).map(|i| (i % 251) as u8).collect();

        let w = DeviceWindow { x0: 8, y0: 2, x1: 23, y1: 3 };
        let span = panel.extract(&frame, &w).unwrap();
        assert_eq!(span, [&frame[2 * stride + 1..2 * stride + 3], &frame[3 * stride + 1..3 * stride + 3]].concat());
        assert_eq!(span.len(), w.span_len());

        assert!(panel.extract(&frame[..10], &w).is_err());
        assert!(panel.extract(&frame, &DeviceWindow { x0: 0, y0: 0, x1: 7, y1: 250 }).is_err());
    }
}
