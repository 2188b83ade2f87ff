use std::{
    fmt, fs,
    io::Write,
    path::{Path, PathBuf},
};

use log::{debug, info};

use crate::{
    error::{Error, Result},
    panel::{DeviceWindow, Panel},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PowerMode {
    /// Slow, flashing, ghost-free waveform.
    Full,
    /// Fast waveform limited to a window.
    Partial,
    /// Deep sleep. The image stays on the panel.
    Sleep,
}

impl fmt::Display for PowerMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PowerMode::Full => write!(f, "full"),
            PowerMode::Partial => write!(f, "partial"),
            PowerMode::Sleep => write!(f, "sleep"),
        }
    }
}

/// The bus side of the panel. Calls return once the controller reports
/// the write as done.
pub trait Transport {
    fn write_full(&mut self, frame: &[u8]) -> Result<()>;
    fn write_partial(&mut self, window: &DeviceWindow, span: &[u8]) -> Result<()>;
    fn set_power_mode(&mut self, mode: PowerMode) -> Result<()>;
}

/// A panel living in memory: writes land in a device-space framebuffer.
/// Stands in for the hardware when there is none attached.
pub struct MemoryPanel {
    panel: Panel,
    frame: Vec<u8>,
    mode: PowerMode,
    full_writes: u64,
    partial_writes: u64,
    save_to: Option<PathBuf>,
}

impl MemoryPanel {
    #[must_use]
    pub fn new(panel: Panel) -> Self {
        Self {
            panel,
            frame: vec![0xFF; panel.buffer_len()],
            mode: PowerMode::Sleep,
            full_writes: 0,
            partial_writes: 0,
            save_to: None,
        }
    }

    /// Dump the panel as a PBM image after every refresh.
    #[must_use]
    pub fn saving_to(mut self, path: impl AsRef<Path>) -> Self {
        self.save_to = Some(path.as_ref().to_owned());
        self
    }

    #[inline]
    #[must_use]
    pub fn frame(&self) -> &[u8] {
        &self.frame
    }

    #[inline]
    #[must_use]
    pub fn mode(&self) -> PowerMode {
        self.mode
    }

    /// `(full, partial)` refreshes so far.
    #[inline]
    #[must_use]
    pub fn writes(&self) -> (u64, u64) {
        (self.full_writes, self.partial_writes)
    }

    fn awake(&self, op: &'static str) -> Result<()> {
        if self.mode == PowerMode::Sleep {
            return Err(Error::Transport { op, reason: "panel is asleep".to_owned() });
        }
        Ok(())
    }

    fn save(&self) -> Result<()> {
        let Some(path) = &self.save_to else { return Ok(()) };
        let err = |e: std::io::Error| Error::Transport {
            op: "save image",
            reason: format!("{}: {e}", path.display()),
        };
        let mut out = Vec::with_capacity(self.frame.len() + 16);
        write!(out, "P4\n{} {}\n", self.panel.width(), self.panel.height()).map_err(err)?;
        // PBM wants 1 for black, the panel wants 1 for white.
        out.extend(self.frame.iter().map(|b| !b));
        fs::write(path, out).map_err(err)
    }
}

impl Transport for MemoryPanel {
    fn write_full(&mut self, frame: &[u8]) -> Result<()> {
        self.awake("write_full")?;
        if frame.len() != self.frame.len() {
            return Err(Error::Transport {
                op: "write_full",
                reason: format!("frame is {} bytes, panel takes {}", frame.len(), self.frame.len()),
            });
        }
        self.frame.copy_from_slice(frame);
        self.full_writes += 1;
        debug!("full write #{}", self.full_writes);
        self.save()
    }

    fn write_partial(&mut self, window: &DeviceWindow, span: &[u8]) -> Result<()> {
        self.awake("write_partial")?;
        let in_bounds = window.x0 <= window.x1
            && window.y0 <= window.y1
            && window.x1 < self.panel.width()
            && window.y1 < self.panel.height();
        if !in_bounds || span.len() != window.span_len() {
            return Err(Error::Transport {
                op: "write_partial",
                reason: format!("{} bytes do not fit window {window}", span.len()),
            });
        }
        let stride = self.panel.line_bytes();
        let (start, len) = (window.byte_start(), window.bytes_per_line());
        for (row, chunk) in (window.y0..=window.y1).zip(span.chunks_exact(len)) {
            let base = row as usize * stride + start;
            self.frame[base..base + len].copy_from_slice(chunk);
        }
        self.partial_writes += 1;
        debug!("partial write #{} on {window}", self.partial_writes);
        self.save()
    }

    fn set_power_mode(&mut self, mode: PowerMode) -> Result<()> {
        if mode != self.mode {
            info!("panel: {} -> {mode}", self.mode);
            self.mode = mode;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::panel::PanelKind;

    fn awake() -> MemoryPanel {
        let mut p = MemoryPanel::new(Panel::from(PanelKind::Epd2in13V4));
        p.set_power_mode(PowerMode::Partial).unwrap();
        p
    }

    #[test]
    fn refuses_writes_while_asleep() {
        let mut p = MemoryPanel::new(Panel::from(PanelKind::Epd2in13V4));
        let frame = vec![0; p.frame().len()];
        assert!(matches!(p.write_full(&frame), Err(Error::Transport { .. })));
        p.set_power_mode(PowerMode::Full).unwrap();
        p.write_full(&frame).unwrap();
        assert_eq!(p.writes(), (1, 0));
    }

    #[test]
    fn partial_write_lands_in_window() {
        let mut p = awake();
        let w = DeviceWindow { x0: 8, y0: 10, x1: 23, y1: 12 };
        p.write_partial(&w, &[0x00; 6]).unwrap();
        let stride = 16;
        for row in 0..250 {
            for col in 0..stride {
                let expect = if (10..=12).contains(&row) && (1..=2).contains(&col) { 0x00 } else { 0xFF };
                assert_eq!(p.frame()[row * stride + col], expect, "row {row} col {col}");
            }
        }
        assert_eq!(p.writes(), (0, 1));
    }

    #[test]
    fn rejects_malformed_writes() {
        let mut p = awake();
        let w = DeviceWindow { x0: 8, y0: 10, x1: 23, y1: 12 };
        assert!(p.write_partial(&w, &[0x00; 5]).is_err());
        let off = DeviceWindow { x0: 120, y0: 10, x1: 127, y1: 12 };
        assert!(p.write_partial(&off, &[0x00; 3]).is_err());
        assert!(p.write_full(&[0x00; 3]).is_err());
        assert_eq!(p.writes(), (0, 0));
    }

    #[test]
    fn saves_pbm() {
        let path = std::env::temp_dir().join(format!("inkdash-{}.pbm", std::process::id()));
        let mut p = awake().saving_to(&path);
        let mut frame = vec![0xFF; p.frame().len()];
        frame[0] = 0x7F;
        p.write_full(&frame).unwrap();
        let pbm = fs::read(&path).unwrap();
        fs::remove_file(&path).unwrap();
        let header = b"P4\n122 250\n";
        assert_eq!(&pbm[..header.len()], header);
        assert_eq!(pbm[header.len()], 0x80);
        assert_eq!(pbm.len(), header.len() + 16 * 250);
    }
}
