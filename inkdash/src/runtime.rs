//! Tick loop and touch poller.
//!
//! Idle -> Sampling -> Deciding -> {Skipped, FullDrawing, PartialDrawing} -> Idle
//!
//! The tick loop owns the dashboard state and the transport. The poller only
//! hands taps over through a [`TouchSlot`].

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::sleep,
    time::Instant,
};

use chrono::{DateTime, Local};
use log::{debug, error, info, warn};

use crate::{
    canvas::Canvas,
    config::Policy,
    dashboard::DashboardState,
    error::Result,
    geometry::LogicalPoint,
    layout::Layout,
    panel::Panel,
    render::render,
    sampler::SampleSource,
    scheduler::{RefreshDecision, Scheduler},
    touch::{TouchNormalizer, TouchSlot, TouchSource},
    transport::{PowerMode, Transport},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Skipped,
    FullDrawn,
    PartialDrawn,
    /// The transport gave up twice; state is left as it was.
    Failed,
}

pub struct Pipeline<S, T> {
    panel: Panel,
    state: DashboardState,
    scheduler: Scheduler,
    sampler: S,
    transport: T,
    canvas: Canvas,
}

impl<S: SampleSource, T: Transport> Pipeline<S, T> {
    pub fn new(panel: Panel, policy: &Policy, sampler: S, transport: T) -> Self {
        Self {
            panel,
            state: DashboardState::new(Layout::new(&panel), policy),
            scheduler: Scheduler::new(panel, policy.clone()),
            sampler,
            transport,
            canvas: Canvas::for_panel(&panel),
        }
    }

    #[inline]
    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    #[inline]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Wakes the panel and wipes it. Failing here is fatal.
    pub fn start(&mut self) -> Result<()> {
        self.transport.set_power_mode(PowerMode::Full)?;
        self.transport.write_full(&vec![0xFF; self.panel.buffer_len()])?;
        self.transport.set_power_mode(PowerMode::Partial)?;
        info!("panel {} ready", self.panel.kind());
        Ok(())
    }

    pub fn shutdown(&mut self) -> Result<()> {
        info!("putting panel to sleep");
        self.transport.set_power_mode(PowerMode::Sleep)
    }

    pub fn tick(
        &mut self,
        touch: Option<LogicalPoint>,
        now: Instant,
        wall: DateTime<Local>,
    ) -> TickOutcome {
        let sample = match self.sampler.next_sample() {
            Ok(s) => Some(s),
            Err(e) => {
                warn!("{e}, keeping previous values");
                None
            }
        };

        let dirty = self.state.advance(sample, touch, wall);
        let decision =
            self.scheduler.decide(&dirty, self.state.force_full, now, self.state.last_draw_time);
        let (cpu, mem) = self.state.shown.as_ref().map_or((0.0, 0.0), |s| (s.cpu_pct, s.mem_pct));
        if decision == RefreshDecision::Skip {
            debug!("SKIP: cpu={cpu:.1}% mem={mem:.1}% pending={}", dirty.len());
            return TickOutcome::Skipped;
        }

        render(&self.state, &mut self.canvas);
        let frame = self.canvas.to_device_buffer(&self.panel);
        let mut res = self.draw(&decision, &frame);
        if let Err(e) = &res {
            warn!("{decision} failed: {e}, retrying once");
            res = self.draw(&decision, &frame);
        }
        if let Err(e) = res {
            error!("{decision} failed again: {e}");
            return TickOutcome::Failed;
        }

        let (drawn, full) = match decision {
            RefreshDecision::PartialRefresh { region, .. } => (region, false),
            _ => (self.state.layout().full, true),
        };
        self.state.commit(now, drawn, full);
        self.scheduler.record(&decision);
        info!("{decision}: cpu={cpu:.1}% mem={mem:.1}%");
        if full {
            TickOutcome::FullDrawn
        } else {
            TickOutcome::PartialDrawn
        }
    }

    fn draw(&mut self, decision: &RefreshDecision, frame: &[u8]) -> Result<()> {
        match decision {
            RefreshDecision::Skip => Ok(()),
            RefreshDecision::FullRefresh => {
                self.transport.set_power_mode(PowerMode::Full)?;
                self.transport.write_full(frame)?;
                self.transport.set_power_mode(PowerMode::Partial)
            }
            RefreshDecision::PartialRefresh { window, .. } => {
                let span = self.panel.extract(frame, window)?;
                self.transport.write_partial(window, &span)
            }
        }
    }

    /// Ticks until `stop` is raised or `limit` ticks have run.
    pub fn run_ticks(
        &mut self,
        policy: &Policy,
        slot: &TouchSlot,
        stop: &AtomicBool,
        limit: Option<u64>,
    ) {
        let mut n = 0;
        while !stop.load(Ordering::Relaxed) && limit.map_or(true, |l| n < l) {
            n += 1;
            let outcome = self.tick(slot.take(), Instant::now(), Local::now());
            debug!("tick {n}: {outcome:?}");
            sleep(policy.tick);
        }
    }
}

/// Scans `source` until `stop` is raised, offering at most one tap per scan.
pub fn poll_touches(
    source: &mut impl TouchSource,
    panel: Panel,
    policy: &Policy,
    slot: &TouchSlot,
    stop: &AtomicBool,
) {
    let mut normalizer = TouchNormalizer::new(panel, policy.debounce);
    while !stop.load(Ordering::Relaxed) {
        if let Some(p) = normalizer.first_tap(source.scan(), Instant::now()) {
            debug!("tap at ({},{})", p.x, p.y);
            slot.offer(p);
        }
        sleep(policy.touch_poll);
    }
}

/// Runs both loops on blocking threads until Ctrl-C or the tick limit, then
/// puts the panel to sleep.
pub async fn run<S, T, U>(
    mut pipeline: Pipeline<S, T>,
    touches: Option<U>,
    policy: Policy,
    limit: Option<u64>,
) -> anyhow::Result<Pipeline<S, T>>
where
    S: SampleSource + Send + 'static,
    T: Transport + Send + 'static,
    U: TouchSource + Send + 'static,
{
    let slot = TouchSlot::default();
    let stop = Arc::new(AtomicBool::new(false));
    let panel = pipeline.panel;

    let poller = touches.map(|mut source| {
        let (slot, stop, policy) = (slot.clone(), stop.clone(), policy.clone());
        tokio::task::spawn_blocking(move || poll_touches(&mut source, panel, &policy, &slot, &stop))
    });

    let mut ticker = {
        let stop = stop.clone();
        tokio::task::spawn_blocking(move || {
            pipeline.run_ticks(&policy, &slot, &stop, limit);
            pipeline
        })
    };

    let mut pipeline = tokio::select! {
        done = &mut ticker => done?,
        sig = tokio::signal::ctrl_c() => {
            sig?;
            info!("interrupted, stopping");
            stop.store(true, Ordering::Relaxed);
            ticker.await?
        }
    };
    stop.store(true, Ordering::Relaxed);
    if let Some(poller) = poller {
        poller.await?;
    }

    pipeline.shutdown()?;
    Ok(pipeline)
}
