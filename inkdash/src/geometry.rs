use std::fmt;

/// A point on the landscape canvas the dashboard is drawn on.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct LogicalPoint {
    pub x: u32,
    pub y: u32,
}

/// A point in the panel's native (portrait) addressing.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct DevicePoint {
    pub x: u32,
    pub y: u32,
}

impl From<(u32, u32)> for LogicalPoint {
    fn from((x, y): (u32, u32)) -> Self {
        Self { x, y }
    }
}

impl From<(u32, u32)> for DevicePoint {
    fn from((x, y): (u32, u32)) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle with inclusive bounds, `x0 <= x1` and `y0 <= y1`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({},{})-({},{})", self.x0, self.y0, self.x1, self.y1)
    }
}

impl Rect {
    #[inline]
    #[must_use]
    pub const fn new(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.x1 - self.x0 + 1
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.y1 - self.y0 + 1
    }

    #[inline]
    #[must_use]
    pub fn contains_point(&self, p: &LogicalPoint) -> bool {
        (self.x0..=self.x1).contains(&p.x) && (self.y0..=self.y1).contains(&p.y)
    }

    #[inline]
    #[must_use]
    pub fn contains_rect(&self, other: &Rect) -> bool {
        self.x0 <= other.x0 && self.y0 <= other.y0 && other.x1 <= self.x1 && other.y1 <= self.y1
    }

    #[must_use]
    pub fn merge_rect(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Bounding box of every rect, `None` when there are none.
    pub fn union<'a>(rects: impl IntoIterator<Item = &'a Rect>) -> Option<Rect> {
        rects.into_iter().fold(None, |acc, r| Some(acc.map_or(*r, |a| a.merge_rect(r))))
    }

    /// Square of half-side `radius` around `center`, clipped to `bounds`.
    #[must_use]
    pub fn around(center: LogicalPoint, radius: u32, bounds: &Rect) -> Rect {
        Rect {
            x0: center.x.saturating_sub(radius).max(bounds.x0),
            y0: center.y.saturating_sub(radius).max(bounds.y0),
            x1: (center.x + radius).min(bounds.x1),
            y1: (center.y + radius).min(bounds.y1),
        }
    }
}
