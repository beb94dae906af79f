//! Alert Engine
//!
//! Owns the refresh timer, the acknowledgement store and the last published
//! alert list. A pass fetches the three snapshot sources concurrently,
//! evaluates the rules over whatever arrived and publishes the filtered result
//! in one step. Passes never overlap.

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    ack::AcknowledgementStore,
    aggregator,
    alert::{Alert, AlertCounts},
    clock::{Clock, SystemClock},
    config::EngineConfig,
    metrics,
    snapshot::Snapshots,
    sources::{SnapshotSource, SourceError, SourceKind, Sources},
    Error, Result,
};

type Listener = Arc<dyn Fn(&[Alert]) + Send + Sync>;
type Evaluator = fn(&Snapshots, DateTime<Utc>) -> Vec<Alert>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceOutcome {
    Ok { records: usize },
    Failed { reason: String },
    TimedOut { after_secs: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PassOutcome {
    /// Every source answered.
    Complete,
    /// At least one source failed; its rules were skipped.
    Partial,
    /// Nothing could be evaluated; the system error alert was produced.
    Failed,
}

/// What happened during one pass.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassReport {
    pub pass_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcome: PassOutcome,
    pub sources: BTreeMap<SourceKind, SourceOutcome>,
    /// Alerts produced before acknowledgement filtering.
    pub alerts: usize,
    pub published: bool,
}

pub struct AlertEngine {
    sources: Sources,
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    evaluate: Evaluator,
    acks: AcknowledgementStore,
    /// Output of the last published pass, before acknowledgement filtering.
    unfiltered: Mutex<Vec<Alert>>,
    published: watch::Sender<Vec<Alert>>,
    listeners: Mutex<Vec<Listener>>,
    last_report: Mutex<Option<PassReport>>,
    pass_lock: tokio::sync::Mutex<()>,
    refreshing: AtomicBool,
    stopped: AtomicBool,
    timer_reset: Notify,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl AlertEngine {
    pub fn new(sources: Sources, config: EngineConfig) -> Self {
        let (published, _) = watch::channel(Vec::new());

        Self {
            sources,
            config,
            clock: Arc::new(SystemClock),
            evaluate: aggregator::aggregate,
            acks: AcknowledgementStore::new(),
            unfiltered: Mutex::new(Vec::new()),
            published,
            listeners: Mutex::new(Vec::new()),
            last_report: Mutex::new(None),
            pass_lock: tokio::sync::Mutex::new(()),
            refreshing: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            timer_reset: Notify::new(),
            timer: Mutex::new(None),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[cfg(test)]
    fn with_evaluator(mut self, evaluate: Evaluator) -> Self {
        self.evaluate = evaluate;
        self
    }

    /// Starts the refresh timer. The first pass runs immediately.
    pub fn start(self: &Arc<Self>) -> Result<()> {
        if self.is_stopped() {
            return Err(Error::Stopped);
        }

        let mut timer = lock(&self.timer);
        if timer.is_some() {
            warn!("Alert engine already started");
            return Ok(());
        }

        info!(
            "Starting alert engine (refresh every {:?}, fetch timeout {:?})",
            self.config.refresh_interval(),
            self.config.fetch_timeout()
        );
        let engine = Arc::clone(self);
        *timer = Some(tokio::spawn(async move {
            engine.run_timer().await;
        }));
        Ok(())
    }

    /// Cancels the refresh timer. Results of passes still in flight are
    /// discarded.
    pub fn stop(&self) {
        // Raised under the publication lock so no pass publishes after this
        // returns.
        let stopped = {
            let _published = lock(&self.unfiltered);
            self.stopped.swap(true, Ordering::SeqCst)
        };
        if stopped {
            return;
        }
        if let Some(handle) = lock(&self.timer).take() {
            handle.abort();
        }
        info!("Alert engine stopped");
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Runs a pass now, waiting for any pass already in flight first. The
    /// next automatic pass is rescheduled a full interval from now.
    pub async fn refresh_now(&self) -> Result<()> {
        if self.is_stopped() {
            return Err(Error::Stopped);
        }

        {
            let _guard = self.pass_lock.lock().await;
            if self.config.reset_acks_on_refresh {
                debug!("Clearing acknowledgements before manual refresh");
                self.acks.reset();
            }
            self.run_pass().await;
        }

        if lock(&self.timer).is_some() {
            self.timer_reset.notify_one();
        }

        if self.is_stopped() {
            return Err(Error::Stopped);
        }
        Ok(())
    }

    /// The last published, acknowledgement-filtered list.
    pub fn get_alerts(&self) -> Vec<Alert> {
        self.published.borrow().clone()
    }

    pub fn get_counts(&self) -> AlertCounts {
        AlertCounts::from_alerts(&self.published.borrow())
    }

    /// Receives every new published list.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Alert>> {
        self.published.subscribe()
    }

    /// Registers a callback invoked with the published list whenever it
    /// changes: after each completed pass and after an acknowledgement.
    pub fn on_alerts_changed<F>(&self, callback: F)
    where
        F: Fn(&[Alert]) + Send + Sync + 'static,
    {
        lock(&self.listeners).push(Arc::new(callback));
    }

    /// Dismisses an alert category for the rest of the engine's lifetime.
    /// Returns whether the id was newly dismissed.
    pub fn acknowledge(&self, alert_id: &str) -> bool {
        let added = self.acks.acknowledge(alert_id);
        if added {
            info!("Alert {} acknowledged", alert_id);
            let visible = {
                let unfiltered = lock(&self.unfiltered);
                let visible = self.acks.filter(&unfiltered);
                self.published.send_replace(visible.clone());
                visible
            };
            metrics::PUBLISHED_ALERTS.set(visible.len() as i64);
            self.notify_listeners(&visible);
        }
        added
    }

    pub fn acknowledged(&self) -> Vec<String> {
        self.acks.acknowledged()
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::SeqCst)
    }

    pub fn last_report(&self) -> Option<PassReport> {
        lock(&self.last_report).clone()
    }

    async fn run_timer(self: Arc<Self>) {
        let interval = self.config.refresh_interval();
        let mut next = Instant::now();

        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(next) => {
                    match self.pass_lock.try_lock() {
                        Ok(_guard) => {
                            self.run_pass().await;
                        }
                        Err(_) => debug!("Skipping scheduled pass, another pass is in flight"),
                    }
                    next = Instant::now() + interval;
                }
                _ = self.timer_reset.notified() => {
                    next = Instant::now() + interval;
                }
            }
        }
    }

    /// Callers must hold `pass_lock`.
    async fn run_pass(&self) -> PassReport {
        let _refreshing = RefreshingFlag::raise(&self.refreshing);
        let pass_id = Uuid::new_v4();
        let now = self.clock.now();
        let timeout = self.config.fetch_timeout();
        info!(%pass_id, "Starting evaluation pass");

        let (orders, drivers, trucks) = futures::join!(
            fetch(self.sources.orders.as_ref(), timeout),
            fetch(self.sources.drivers.as_ref(), timeout),
            fetch(self.sources.trucks.as_ref(), timeout),
        );

        let mut outcomes = BTreeMap::new();
        let snapshots = Snapshots {
            orders: settle(SourceKind::Orders, orders, &mut outcomes),
            drivers: settle(SourceKind::Drivers, drivers, &mut outcomes),
            trucks: settle(SourceKind::Trucks, trucks, &mut outcomes),
        };

        let (alerts, outcome) = if snapshots.is_empty() {
            error!(%pass_id, "All snapshot sources failed");
            (vec![Alert::system_error(now)], PassOutcome::Failed)
        } else {
            let evaluate = self.evaluate;
            match panic::catch_unwind(AssertUnwindSafe(|| evaluate(&snapshots, now))) {
                Ok(alerts) if outcomes.values().all(|o| matches!(o, SourceOutcome::Ok { .. })) => {
                    (alerts, PassOutcome::Complete)
                }
                Ok(alerts) => (alerts, PassOutcome::Partial),
                Err(_) => {
                    error!(%pass_id, "Alert evaluation panicked");
                    (vec![Alert::system_error(now)], PassOutcome::Failed)
                }
            }
        };

        let produced = alerts.len();
        let published = self.publish(alerts);
        if !published {
            warn!(%pass_id, "Engine stopped during pass, discarding results");
        }

        let report = PassReport {
            pass_id,
            started_at: now,
            finished_at: self.clock.now(),
            outcome,
            sources: outcomes,
            alerts: produced,
            published,
        };
        info!(
            %pass_id,
            outcome = ?report.outcome,
            alerts = produced,
            "Evaluation pass finished"
        );
        metrics::PASSES_TOTAL
            .with_label_values(&[outcome_label(outcome)])
            .inc();
        if published {
            *lock(&self.last_report) = Some(report.clone());
        }
        report
    }

    /// Replaces the published list unless the engine has been stopped.
    fn publish(&self, alerts: Vec<Alert>) -> bool {
        let visible = {
            let mut unfiltered = lock(&self.unfiltered);
            if self.is_stopped() {
                return false;
            }
            let visible = self.acks.filter(&alerts);
            *unfiltered = alerts;
            self.published.send_replace(visible.clone());
            visible
        };
        metrics::PUBLISHED_ALERTS.set(visible.len() as i64);
        self.notify_listeners(&visible);
        true
    }

    /// A panicking listener is logged and skipped; it never takes the timer
    /// task down with it.
    fn notify_listeners(&self, alerts: &[Alert]) {
        let listeners: Vec<Listener> = lock(&self.listeners).clone();
        for listener in listeners {
            if panic::catch_unwind(AssertUnwindSafe(|| listener(alerts))).is_err() {
                error!("Alert listener panicked");
            }
        }
    }
}

async fn fetch<T: Send + Sync + 'static>(
    source: &dyn SnapshotSource<T>,
    timeout: Duration,
) -> std::result::Result<Vec<T>, SourceError> {
    match tokio::time::timeout(timeout, source.fetch()).await {
        Ok(result) => result,
        Err(_) => Err(SourceError::Timeout(timeout)),
    }
}

fn settle<T>(
    kind: SourceKind,
    result: std::result::Result<Vec<T>, SourceError>,
    outcomes: &mut BTreeMap<SourceKind, SourceOutcome>,
) -> Option<Vec<T>> {
    match result {
        Ok(records) => {
            debug!(source = %kind, records = records.len(), "Snapshot fetched");
            outcomes.insert(kind, SourceOutcome::Ok { records: records.len() });
            Some(records)
        }
        Err(e) => {
            warn!(source = %kind, error = %e, "Snapshot source failed, skipping its rules");
            metrics::SOURCE_FAILURES_TOTAL
                .with_label_values(&[kind.as_str()])
                .inc();
            let outcome = match e {
                SourceError::Timeout(after) => SourceOutcome::TimedOut {
                    after_secs: after.as_secs(),
                },
                other => SourceOutcome::Failed {
                    reason: other.to_string(),
                },
            };
            outcomes.insert(kind, outcome);
            None
        }
    }
}

fn outcome_label(outcome: PassOutcome) -> &'static str {
    match outcome {
        PassOutcome::Complete => "ok",
        PassOutcome::Partial => "partial",
        PassOutcome::Failed => "failed",
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Clears the refreshing flag when the pass ends, including when the pass
/// future is dropped by `stop`.
struct RefreshingFlag<'a>(&'a AtomicBool);

impl<'a> RefreshingFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for RefreshingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
