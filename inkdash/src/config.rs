use std::{path::PathBuf, time::Duration};

use clap::Parser;

use crate::panel::PanelKind;

/// Hand-tuned knobs. None of these come from the panel datasheets.
#[derive(Clone, Debug, PartialEq)]
pub struct Policy {
    /// Identical taps closer together than this count once.
    pub debounce: Duration,
    /// Smallest CPU change (percentage points) worth a redraw.
    pub cpu_threshold: f32,
    /// Smallest memory change (percentage points) worth a redraw.
    pub mem_threshold: f32,
    /// No two draws closer together than this, unless forced.
    pub min_draw_interval: Duration,
    /// Full refresh after this many partial ones. 0 disables.
    pub full_every: u32,
    pub tick: Duration,
    pub touch_poll: Duration,
    /// Ticks a fun-mode touch mark stays on screen.
    pub mark_ttl: u8,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(700),
            cpu_threshold: 5.0,
            mem_threshold: 2.0,
            min_draw_interval: Duration::from_secs(12),
            full_every: 0,
            tick: Duration::from_millis(1500),
            touch_poll: Duration::from_millis(20),
            mark_ttl: 6,
        }
    }
}

/// System stats on a touch e-paper HAT.
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct Args {
    /// Attached panel
    #[arg(long, env = "INKDASH_PANEL", value_enum, default_value = "2in13")]
    pub panel: PanelKind,

    /// Milliseconds between dashboard ticks
    #[arg(long, env = "INKDASH_TICK_MS", default_value_t = 1500)]
    pub tick_ms: u64,

    /// Milliseconds between touch controller scans
    #[arg(long, env = "INKDASH_TOUCH_POLL_MS", default_value_t = 20)]
    pub touch_poll_ms: u64,

    /// Seconds that must pass between two non-forced draws
    #[arg(long, env = "INKDASH_MIN_DRAW_INTERVAL_S", default_value_t = 12)]
    pub min_draw_interval_s: u64,

    /// CPU change (percentage points) that triggers a redraw
    #[arg(long, env = "INKDASH_CPU_THRESHOLD", default_value_t = 5.0)]
    pub cpu_threshold: f32,

    /// Memory change (percentage points) that triggers a redraw
    #[arg(long, env = "INKDASH_MEM_THRESHOLD", default_value_t = 2.0)]
    pub mem_threshold: f32,

    /// Force a full refresh after this many partial ones (0: never)
    #[arg(long, env = "INKDASH_FULL_EVERY", default_value_t = 0)]
    pub full_every: u32,

    /// Milliseconds during which a repeated identical tap is ignored
    #[arg(long, env = "INKDASH_DEBOUNCE_MS", default_value_t = 700)]
    pub debounce_ms: u64,

    /// Stop after this many ticks (runs until Ctrl-C otherwise)
    #[arg(long, env = "INKDASH_TICKS")]
    pub ticks: Option<u64>,

    /// Where procfs is mounted
    #[arg(long, env = "INKDASH_PROC_ROOT", default_value = "/proc")]
    pub proc_root: PathBuf,

    /// Write the simulated panel to this PBM file after every refresh
    #[arg(long, env = "INKDASH_SAVE_IMAGE")]
    pub save_image: Option<PathBuf>,

    /// Do not simulate taps
    #[arg(long, env = "INKDASH_NO_TOUCH")]
    pub no_touch: bool,
}

impl Args {
    #[must_use]
    pub fn policy(&self) -> Policy {
        Policy {
            debounce: Duration::from_millis(self.debounce_ms),
            cpu_threshold: self.cpu_threshold,
            mem_threshold: self.mem_threshold,
            min_draw_interval: Duration::from_secs(self.min_draw_interval_s),
            full_every: self.full_every,
            tick: Duration::from_millis(self.tick_ms),
            touch_poll: Duration::from_millis(self.touch_poll_ms),
            ..Policy::default()
        }
    }
}
