use crate::{
    geometry::{LogicalPoint, Rect},
    panel::Panel,
};

pub const HEADER_BOTTOM: u32 = 22;
pub const BODY_TOP: u32 = HEADER_BOTTOM + 1;
/// Gauge radius plus one pixel of outline.
pub const GAUGE_REACH: u32 = 17;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Button {
    Theme,
    Pause,
    Refresh,
    Fun,
}

impl Button {
    pub const ALL: [Button; 4] = [Button::Theme, Button::Pause, Button::Refresh, Button::Fun];

    #[must_use]
    pub const fn area(self) -> Rect {
        match self {
            Button::Theme => Rect::new(4, 2, 52, 20),
            Button::Pause => Rect::new(56, 2, 104, 20),
            Button::Refresh => Rect::new(108, 2, 166, 20),
            Button::Fun => Rect::new(170, 2, 246, 20),
        }
    }
}

/// Fixed screen areas of the landscape dashboard. Redraw requests are
/// expressed as unions of these.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    pub full: Rect,
    pub header_left: Rect,
    pub header_right: Rect,
    pub clock: Rect,
    pub body: Rect,
    pub cpu_panel: Rect,
    pub right_panel: Rect,
    /// The CPU needle gauge. It sits in the right panel but follows the CPU.
    pub cpu_gauge: Rect,
    /// Column of the vertical rule between the two panels.
    pub split: u32,
}

impl Layout {
    #[must_use]
    pub fn new(panel: &Panel) -> Self {
        let (r, b) = (panel.logical_width() - 1, panel.logical_height() - 1);
        let split = panel.logical_width() / 2;
        let (gx, gy) = (split + 35, b - 23);
        Self {
            full: Rect::new(0, 0, r, b),
            header_left: Rect::new(0, 0, split - 1, HEADER_BOTTOM),
            header_right: Rect::new(split, 0, r, HEADER_BOTTOM),
            clock: Rect::new(r - 89, 0, r, HEADER_BOTTOM),
            body: Rect::new(0, BODY_TOP, r, b),
            cpu_panel: Rect::new(0, BODY_TOP, split - 1, b),
            right_panel: Rect::new(split + 1, BODY_TOP, r, b),
            cpu_gauge: Rect::new(gx - GAUGE_REACH, gy - GAUGE_REACH, gx + GAUGE_REACH, gy + GAUGE_REACH),
            split,
        }
    }

    #[must_use]
    pub fn button_at(&self, p: &LogicalPoint) -> Option<Button> {
        Button::ALL.into_iter().find(|b| b.area().contains_point(p))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::panel::PanelKind;

    #[test]
    fn regions_of_2in13() {
        let l = Layout::new(&Panel::from(PanelKind::Epd2in13V4));
        assert_eq!(l.full, Rect::new(0, 0, 249, 121));
        assert_eq!(l.header_left, Rect::new(0, 0, 124, 22));
        assert_eq!(l.header_right, Rect::new(125, 0, 249, 22));
        assert_eq!(l.clock, Rect::new(160, 0, 249, 22));
        assert_eq!(l.cpu_panel, Rect::new(0, 23, 124, 121));
        assert_eq!(l.right_panel, Rect::new(126, 23, 249, 121));
        assert_eq!(l.cpu_gauge, Rect::new(143, 81, 177, 115));
    }

    #[test]
    fn everything_fits_every_panel() {
        for kind in [PanelKind::Epd2in13V4, PanelKind::Epd2in9V2] {
            let panel = Panel::from(kind);
            let l = Layout::new(&panel);
            for r in [l.header_left, l.header_right, l.clock, l.body, l.cpu_panel, l.right_panel, l.cpu_gauge] {
                assert!(panel.logical_bounds().contains_rect(&r), "{kind:?} {r}");
            }
            for b in Button::ALL {
                assert!(l.header_left.merge_rect(&l.header_right).contains_rect(&b.area()));
            }
        }
    }

    #[test]
    fn hit_testing() {
        let l = Layout::new(&Panel::from(PanelKind::Epd2in13V4));
        assert_eq!(l.button_at(&(4, 2).into()), Some(Button::Theme));
        assert_eq!(l.button_at(&(104, 20).into()), Some(Button::Pause));
        assert_eq!(l.button_at(&(130, 10).into()), Some(Button::Refresh));
        assert_eq!(l.button_at(&(246, 2).into()), Some(Button::Fun));
        assert_eq!(l.button_at(&(54, 10).into()), None);
        assert_eq!(l.button_at(&(100, 60).into()), None);
    }
}
