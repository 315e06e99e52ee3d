mod clock;
mod usage;

use std::io::Write;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::select;
use tokio_util::sync::CancellationToken;

use crate::config::SamplerConfig;
use crate::error::SamplerError;
use crate::process::{ProcessHandle, ResourceCounters, TrackedChildSet};
use crate::record::{LogWriter, Sample};

pub use clock::{Clock, StartEpoch};
pub use usage::rate;
use usage::TickUsage;

/// Called with the target's PID when a run is cancelled.
pub type InterruptHook = Box<dyn FnOnce(u32) + Send>;

#[derive(Debug, PartialEq)]
pub enum Tick {
    Sample(Sample),
    /// No time passed since the previous tick; nothing was measured.
    Skipped,
    /// The target exited or became unreadable.
    TargetGone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEnd {
    Terminated,
    Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub end: RunEnd,
    pub rows: usize,
    pub skipped_ticks: usize,
}

pub struct Sampler<P: ProcessHandle, C: Clock> {
    target: P,
    baseline: ResourceCounters,
    children: TrackedChildSet<P>,
    clock: C,
    config: SamplerConfig,
    last_tick: f64,
    on_interrupt: Option<InterruptHook>,
}

impl<P: ProcessHandle, C: Clock> Sampler<P, C> {
    /// Fails with [`SamplerError::NoSuchProcess`] when the target is already
    /// gone.
    pub fn start(target: P, config: SamplerConfig, mut clock: C) -> Result<Self, SamplerError> {
        let baseline = target.counters().map_err(SamplerError::at_start)?;
        let mut children = TrackedChildSet::new();
        children.reconcile(target.children());
        let last_tick = clock.elapsed();

        info!(
            "{:?} sampler attached to {} ({} children, interval {:?})",
            config.kind,
            target.pid(),
            children.len(),
            config.interval
        );

        Ok(Sampler {
            target,
            baseline,
            children,
            clock,
            config,
            last_tick,
            on_interrupt: None,
        })
    }

    pub fn with_interrupt_hook(mut self, hook: impl FnOnce(u32) + Send + 'static) -> Self {
        self.on_interrupt = Some(Box::new(hook));
        self
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    pub fn start_time(&self) -> f64 {
        self.clock.start_time()
    }

    pub fn children(&self) -> &TrackedChildSet<P> {
        &self.children
    }

    pub fn tick(&mut self) -> Result<Tick, SamplerError> {
        let now = self.clock.elapsed();
        let delta_t = now - self.last_tick;
        if !(delta_t > 0.0) {
            debug!("skipping tick, non-positive interval {}", delta_t);
            return Ok(Tick::Skipped);
        }

        let current = match self.target.counters() {
            Ok(counters) => counters,
            Err(err) if err.is_terminal() => {
                info!("stopped sampling: {}", err);
                return Ok(Tick::TargetGone);
            }
            Err(err) => return Err(err.into()),
        };

        let change = self.children.reconcile(self.target.children());

        let mut usage = TickUsage::default();
        usage.add_delta(&self.baseline, &current);
        usage.add_current(&current);

        for (pid, child) in self.children.iter_mut() {
            if change.added.contains(pid) {
                usage.add_current(&child.baseline);
                continue;
            }
            match child.handle.counters() {
                Ok(after) => {
                    usage.add_delta(&child.baseline, &after);
                    usage.add_current(&after);
                    child.baseline = after;
                }
                Err(err) => debug!("child {} skipped this tick: {}", pid, err),
            }
        }

        self.baseline = current;
        self.last_tick = now;

        let timestamp = self.clock.start_time() + now;
        Ok(Tick::Sample(usage.into_sample(
            self.config.kind,
            self.config.unit,
            timestamp,
            delta_t,
        )))
    }

    /// The writer is flushed and closed on every exit path.
    pub async fn run<W: Write>(
        mut self,
        mut writer: LogWriter<W>,
        cancel: CancellationToken,
    ) -> Result<RunSummary, SamplerError> {
        let interval = self.config.interval;
        let mut skipped_ticks = 0;

        let end = loop {
            if cancel.is_cancelled() {
                break self.interrupt();
            }

            let tick = match self.tick() {
                Ok(tick) => tick,
                Err(err) => {
                    let _ = writer.finish();
                    return Err(err);
                }
            };
            match tick {
                Tick::Sample(sample) => writer.append(&sample)?,
                Tick::Skipped => skipped_ticks += 1,
                Tick::TargetGone => break RunEnd::Terminated,
            }

            let interrupted = select! {
                _ = cancel.cancelled() => true,
                _ = pause(interval) => false,
            };
            if interrupted {
                break self.interrupt();
            }
        };

        let rows = writer.rows();
        writer.finish()?;
        Ok(RunSummary {
            end,
            rows,
            skipped_ticks,
        })
    }

    fn interrupt(&mut self) -> RunEnd {
        let pid = self.target.pid();
        warn!("{:?} sampler interrupted", self.config.kind);
        if let Some(hook) = self.on_interrupt.take() {
            hook(pid);
        }
        RunEnd::Interrupted
    }
}

async fn pause(interval: Duration) {
    if interval.is_zero() {
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(interval).await;
    }
}
