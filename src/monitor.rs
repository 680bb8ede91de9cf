//! The tick: sample, compute, transmit. Plus the interval loop that drives it.

use std::future::Future;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;
use tracing::{Level, debug, info, warn};

use crate::error::TickError;
use crate::format::format_rate;
use crate::metrics::{Baseline, Calibration, MetricsRecord, compute, measure};
use crate::system::collector::TelemetrySource;
use crate::transport::{LineSink, send};

/// Milliseconds since the Unix epoch; 0 if the clock is before it.
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub record: MetricsRecord,
    /// The exact bytes written, newline included.
    pub line: String,
}

pub struct Monitor<S, L> {
    source: S,
    sink: L,
    baseline: Baseline,
    calibration: Calibration,
    tick_timeout: Option<Duration>,
}

impl<S: TelemetrySource, L: LineSink> Monitor<S, L> {
    pub fn new(source: S, sink: L, calibration: Calibration) -> Self {
        Monitor {
            source,
            sink,
            baseline: Baseline::starting_at(unix_millis()),
            calibration,
            tick_timeout: None,
        }
    }

    pub fn with_baseline(mut self, baseline: Baseline) -> Self {
        self.baseline = baseline;
        self
    }

    /// Records whose sample finished after `limit` are dropped instead of sent.
    /// [`run`] also stops waiting on a tick after `limit`.
    pub fn with_tick_timeout(mut self, limit: Duration) -> Self {
        self.tick_timeout = Some(limit);
        self
    }

    pub fn baseline(&self) -> &Baseline {
        &self.baseline
    }

    pub fn tick_timeout(&self) -> Option<Duration> {
        self.tick_timeout
    }

    pub fn tick(&mut self) -> Result<TickReport, TickError> {
        self.tick_with(unix_millis)
    }

    /// One tick with an injected clock, read once after the sample completes.
    ///
    /// The baseline advances whenever the sample succeeds, even if the record
    /// is then dropped or the write fails.
    pub fn tick_with(&mut self, clock: impl FnOnce() -> u64) -> Result<TickReport, TickError> {
        let started = Instant::now();
        let snapshot = self.source.sample()?;
        let now_ms = clock();

        if tracing::enabled!(Level::DEBUG)
            && let Some(rates) = measure(&snapshot, &self.baseline, now_ms)
        {
            debug!(
                interface = %snapshot.network.interface,
                upload = %format_rate(rates.upload_kbs * 1024.0),
                download = %format_rate(rates.download_kbs * 1024.0),
                disk = %format_rate(rates.disk_mbs * 1024.0 * 1024.0),
                "rates"
            );
        }

        let (record, next) = compute(&snapshot, &self.baseline, now_ms, &self.calibration);
        self.baseline = next;

        if let Some(limit) = self.tick_timeout {
            let elapsed = started.elapsed();
            if elapsed > limit {
                return Err(TickError::DeadlineExceeded { elapsed, limit });
            }
        }

        let line = send(&mut self.sink, &record)?;
        Ok(TickReport { record, line })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub interval: Duration,
    /// Stop after this many ticks. `None` runs until shutdown.
    pub max_ticks: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub sent: u64,
    pub sample_failures: u64,
    pub write_failures: u64,
    pub deadline_misses: u64,
}

impl RunSummary {
    fn record(&mut self, outcome: &Result<TickReport, TickError>) {
        self.ticks += 1;
        match outcome {
            Ok(_) => self.sent += 1,
            Err(TickError::Sample(_)) => self.sample_failures += 1,
            Err(TickError::Transport(_)) => self.write_failures += 1,
            Err(TickError::DeadlineExceeded { .. }) => self.deadline_misses += 1,
        }
    }
}

fn log_outcome(outcome: &Result<TickReport, TickError>) {
    match outcome {
        Ok(report) => info!(line = report.line.trim_end(), "sent"),
        Err(TickError::Sample(err)) => warn!(error = %err, "sample failed, skipping tick"),
        Err(TickError::Transport(err)) => warn!(error = %err, "record dropped"),
        Err(err @ TickError::DeadlineExceeded { .. }) => {
            warn!(error = %err, "stale record dropped")
        }
    }
}

type TickTask<S, L> = JoinHandle<(Monitor<S, L>, Result<TickReport, TickError>)>;

/// Drives `monitor` once per interval until `shutdown` resolves or `max_ticks` is reached.
///
/// Ticks never overlap: each one runs on the blocking pool with the monitor
/// moved in. With a tick timeout set, the loop waits at most that long; a tick
/// still running past it counts as a deadline miss and keeps the monitor until
/// it returns, so fires in the meantime are skipped. Fires missed while a tick
/// is in flight are dropped rather than queued.
pub async fn run<S, L>(
    monitor: Monitor<S, L>,
    options: RunOptions,
    shutdown: impl Future<Output = ()>,
) -> Result<RunSummary, JoinError>
where
    S: TelemetrySource + 'static,
    L: LineSink + 'static,
{
    let start = tokio::time::Instant::now() + options.interval;
    let mut interval = tokio::time::interval_at(start, options.interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    let limit = monitor.tick_timeout();
    let mut idle = Some(monitor);
    let mut straggler: Option<TickTask<S, L>> = None;
    let mut summary = RunSummary::default();

    loop {
        if options.max_ticks.is_some_and(|max| summary.ticks >= max) {
            break;
        }
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown requested");
                break;
            }
            _ = interval.tick() => {}
        }

        if let Some(task) = straggler.take() {
            if !task.is_finished() {
                warn!("abandoned tick still running, skipping fire");
                straggler = Some(task);
                continue;
            }
            let (returned, late) = task.await?;
            debug!(ok = late.is_ok(), "abandoned tick returned");
            idle = Some(returned);
        }
        let Some(monitor) = idle.take() else {
            continue;
        };

        let started = Instant::now();
        let mut task: TickTask<S, L> = tokio::task::spawn_blocking(move || {
            let mut monitor = monitor;
            let outcome = monitor.tick();
            (monitor, outcome)
        });

        let outcome = match limit {
            None => {
                let (returned, outcome) = (&mut task).await?;
                idle = Some(returned);
                outcome
            }
            Some(limit) => match tokio::time::timeout(limit, &mut task).await {
                Ok(joined) => {
                    let (returned, outcome) = joined?;
                    idle = Some(returned);
                    outcome
                }
                Err(_) => {
                    straggler = Some(task);
                    Err(TickError::DeadlineExceeded {
                        elapsed: started.elapsed(),
                        limit,
                    })
                }
            },
        };

        let took = started.elapsed();
        if took > options.interval {
            interval.reset();
            warn!(
                ?took,
                interval = ?options.interval,
                "tick overran its interval, next fire one interval from now"
            );
        }

        log_outcome(&outcome);
        summary.record(&outcome);
    }

    if straggler.is_some() {
        debug!("leaving an abandoned tick running on the blocking pool");
    }
    Ok(summary)
}
