use crate::{geometry::Rect, panel::Panel};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Color {
    Black,
    #[default]
    White,
}

impl Color {
    #[must_use]
    pub fn invert(self) -> Self {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }
}

/// 1-bit landscape raster, packed MSB-first with a set bit meaning white.
pub struct Canvas {
    width: u32,
    height: u32,
    stride: usize,
    bits: Vec<u8>,
}

impl Canvas {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let stride = width.div_ceil(8) as usize;
        Self { width, height, stride, bits: vec![0xFF; stride * height as usize] }
    }

    /// A blank canvas covering the panel's landscape area.
    #[must_use]
    pub fn for_panel(panel: &Panel) -> Self {
        Self::new(panel.logical_width(), panel.logical_height())
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major packed bits, `ceil(width / 8)` bytes per row.
    #[inline]
    #[must_use]
    pub fn packed(&self) -> &[u8] {
        &self.bits
    }

    pub fn clear(&mut self, color: Color) {
        let byte = match color {
            Color::White => 0xFF,
            Color::Black => 0x00,
        };
        self.bits.fill(byte);
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<(usize, u8)> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        Some((y * self.stride + x / 8, 0x80u8 >> (x % 8)))
    }

    /// Out of bounds writes are dropped.
    #[inline]
    pub fn set(&mut self, x: i32, y: i32, color: Color) {
        if let Some((i, mask)) = self.index(x, y) {
            match color {
                Color::White => self.bits[i] |= mask,
                Color::Black => self.bits[i] &= !mask,
            }
        }
    }

    /// Out of bounds reads are white.
    #[inline]
    #[must_use]
    pub fn get(&self, x: i32, y: i32) -> Color {
        match self.index(x, y) {
            Some((i, mask)) if self.bits[i] & mask == 0 => Color::Black,
            _ => Color::White,
        }
    }

    pub fn fill_rect(&mut self, r: &Rect, color: Color) {
        for y in r.y0..=r.y1 {
            for x in r.x0..=r.x1 {
                self.set(x as i32, y as i32, color);
            }
        }
    }

    pub fn rect(&mut self, r: &Rect, color: Color) {
        let (x0, y0, x1, y1) = (r.x0 as i32, r.y0 as i32, r.x1 as i32, r.y1 as i32);
        self.line((x0, y0), (x1, y0), color);
        self.line((x0, y1), (x1, y1), color);
        self.line((x0, y0), (x0, y1), color);
        self.line((x1, y0), (x1, y1), color);
    }

    /// Bresenham, both ends included.
    pub fn line(&mut self, (mut x0, mut y0): (i32, i32), (x1, y1): (i32, i32), color: Color) {
        let (dx, dy) = ((x1 - x0).abs(), -(y1 - y0).abs());
        let (sx, sy) = (if x0 < x1 { 1 } else { -1 }, if y0 < y1 { 1 } else { -1 });
        let mut err = dx + dy;
        loop {
            self.set(x0, y0, color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    /// Midpoint circle outline.
    pub fn circle(&mut self, (cx, cy): (i32, i32), r: i32, color: Color) {
        let (mut x, mut y, mut err) = (r, 0, 1 - r);
        while x >= y {
            for (px, py) in [(x, y), (y, x), (-y, x), (-x, y), (-x, -y), (-y, -x), (y, -x), (x, -y)] {
                self.set(cx + px, cy + py, color);
            }
            y += 1;
            if err < 0 {
                err += 2 * y + 1;
            } else {
                x -= 1;
                err += 2 * (y - x) + 1;
            }
        }
    }

    pub fn fill_circle(&mut self, (cx, cy): (i32, i32), r: i32, color: Color) {
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy <= r * r {
                    self.set(cx + dx, cy + dy, color);
                }
            }
        }
    }

    /// Rotates the landscape canvas into the panel's native packed layout.
    #[must_use]
    pub fn to_device_buffer(&self, panel: &Panel) -> Vec<u8> {
        let stride = panel.line_bytes();
        let mut buf = vec![0xFF; panel.buffer_len()];
        let (w, h) = (self.width.min(panel.logical_width()), self.height.min(panel.logical_height()));
        for y in 0..h {
            for x in 0..w {
                if self.get(x as i32, y as i32) == Color::Black {
                    let d = panel.logical_to_device((x, y).into());
                    buf[d.y as usize * stride + (d.x / 8) as usize] &= !(0x80u8 >> (d.x % 8));
                }
            }
        }
        buf
    }
}
