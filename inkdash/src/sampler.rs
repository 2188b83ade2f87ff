use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Local};
use log::debug;

use crate::error::{Error, Result};

/// One tick's worth of telemetry.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    pub cpu_pct: f32,
    pub mem_pct: f32,
    pub mem_used_mb: u64,
    pub mem_total_mb: u64,
    pub timestamp: DateTime<Local>,
}

/// Cumulative jiffies from the aggregate `cpu` line of `/proc/stat`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CpuCounters {
    pub total: u64,
    pub idle: u64,
}

pub trait SampleSource {
    fn next_sample(&mut self) -> Result<Sample>;
}

/// Busy share between two snapshots, in `[0, 100]`.
///
/// Without a previous snapshot, or when the counters went backwards, there
/// is no usable delta and the result is `0.0`.
#[must_use]
pub fn cpu_percent(prev: Option<CpuCounters>, next: CpuCounters) -> f32 {
    let Some(prev) = prev else { return 0.0 };
    let total = next.total as f64 - prev.total as f64;
    if total <= 0.0 {
        return 0.0;
    }
    let idle = next.idle as f64 - prev.idle as f64;
    (100.0 * (total - idle) / total).clamp(0.0, 100.0) as f32
}

/// Parses the first line of `/proc/stat`.
pub fn parse_cpu_counters(stat: &str) -> Result<CpuCounters> {
    let unavailable = |reason: &str| Error::SampleUnavailable { reason: reason.to_owned() };
    let line = stat.lines().next().ok_or_else(|| unavailable("empty /proc/stat"))?;
    let mut fields = line.split_whitespace();
    if fields.next() != Some("cpu") {
        return Err(unavailable("/proc/stat does not start with the cpu line"));
    }
    let vals = fields
        .take(8)
        .map(str::parse::<u64>)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| unavailable(&format!("bad /proc/stat counter: {e}")))?;
    let [user, nice, system, idle, iowait, irq, softirq, steal] = vals[..] else {
        return Err(unavailable("/proc/stat cpu line is too short"));
    };
    let idle_all = idle + iowait;
    let busy = user + nice + system + irq + softirq + steal;
    Ok(CpuCounters { total: idle_all + busy, idle: idle_all })
}

/// Returns `(pct, used_mb, total_mb)` from `/proc/meminfo` contents.
pub fn parse_memory(meminfo: &str) -> Result<(f32, u64, u64)> {
    let field = |name: &str| -> Result<u64> {
        meminfo
            .lines()
            .find_map(|line| line.strip_prefix(name)?.split_whitespace().next()?.parse().ok())
            .ok_or_else(|| Error::SampleUnavailable { reason: format!("no {name} in /proc/meminfo") })
    };
    let total_mb = field("MemTotal:")? / 1024;
    let avail_mb = field("MemAvailable:")? / 1024;
    if total_mb == 0 {
        return Ok((0.0, 0, 0));
    }
    let used_mb = total_mb.saturating_sub(avail_mb);
    Ok((used_mb as f32 * 100.0 / total_mb as f32, used_mb, total_mb))
}

/// Reads telemetry from a procfs mount.
pub struct ProcSampler {
    root: PathBuf,
    prev: Option<CpuCounters>,
}

impl Default for ProcSampler {
    fn default() -> Self {
        Self::new("/proc")
    }
}

impl ProcSampler {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self { root: root.as_ref().to_owned(), prev: None }
    }

    fn read(&self, name: &str) -> Result<String> {
        let path = self.root.join(name);
        fs::read_to_string(&path).map_err(|e| Error::SampleUnavailable {
            reason: format!("reading {}: {e}", path.display()),
        })
    }

    /// The first call only seeds the counters and reports `0.0`.
    pub fn sample_cpu(&mut self) -> Result<f32> {
        let next = parse_cpu_counters(&self.read("stat")?)?;
        let pct = cpu_percent(self.prev, next);
        self.prev = Some(next);
        Ok(pct)
    }

    pub fn sample_memory(&self) -> Result<(f32, u64, u64)> {
        parse_memory(&self.read("meminfo")?)
    }
}

impl SampleSource for ProcSampler {
    fn next_sample(&mut self) -> Result<Sample> {
        let cpu_pct = self.sample_cpu()?;
        let (mem_pct, mem_used_mb, mem_total_mb) = self.sample_memory()?;
        debug!("sampled cpu={cpu_pct:.1}% mem={mem_pct:.1}% ({mem_used_mb}MB/{mem_total_mb}MB)");
        Ok(Sample { cpu_pct, mem_pct, mem_used_mb, mem_total_mb, timestamp: Local::now() })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const STAT: &str = "cpu  4705 356 584 3699 23 0 23 0 0 0\ncpu0 1393 280 307 1709 8 0 12 0 0 0\n";
    const MEMINFO: &str =
        "MemTotal:         438492 kB\nMemFree:           61236 kB\nMemAvailable:     279060 kB\n";

    #[test]
    fn parses_aggregate_cpu_line() {
        let c = parse_cpu_counters(STAT).unwrap();
        assert_eq!(c, CpuCounters { total: 4705 + 356 + 584 + 3699 + 23 + 23, idle: 3699 + 23 });
        assert!(parse_cpu_counters("intr 1 2 3").is_err());
        assert!(parse_cpu_counters("cpu 1 2 3").is_err());
        assert!(parse_cpu_counters("").is_err());
    }

    #[test]
    fn cpu_percent_is_bounded() {
        let prev = CpuCounters { total: 1_000, idle: 800 };
        for (dt, di) in [(1, 0), (1, 1), (100, 25), (100, 0), (100, 100), (7, 300)] {
            let pct = cpu_percent(Some(prev), CpuCounters { total: 1_000 + dt, idle: 800 + di });
            assert!((0.0..=100.0).contains(&pct), "{dt} {di} -> {pct}");
        }
        let pct = cpu_percent(Some(prev), CpuCounters { total: 1_100, idle: 825 });
        assert!((pct - 75.0).abs() < 1e-4);
    }

    #[test]
    fn cpu_percent_without_delta_is_zero() {
        let c = CpuCounters { total: 1_000, idle: 800 };
        assert_eq!(cpu_percent(None, c), 0.0);
        assert_eq!(cpu_percent(Some(c), c), 0.0);
        assert_eq!(cpu_percent(Some(c), CpuCounters { total: 10, idle: 5 }), 0.0);
    }

    #[test]
    fn parses_meminfo() {
        let (pct, used, total) = parse_memory(MEMINFO).unwrap();
        assert_eq!((used, total), (428 - 272, 428));
        assert!((pct - 156.0 * 100.0 / 428.0).abs() < 1e-3);
        assert_eq!(parse_memory("MemTotal: 0 kB\nMemAvailable: 0 kB\n").unwrap(), (0.0, 0, 0));
        assert!(parse_memory("MemFree: 1 kB\n").is_err());
    }

    #[test]
    fn missing_procfs_is_unavailable() {
        let mut s = ProcSampler::new("/nonexistent/inkdash");
        assert!(matches!(s.next_sample(), Err(Error::SampleUnavailable { .. })));
    }
}
