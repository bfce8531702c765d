//! Fixed-period tick driver
//!
//! Each timer fire hands one tick to the blocking pool. If the previous tick
//! is still running the fire is dropped, never queued.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::{SchedulerState, TickOutcome, TwinEngine};

/// Called on the blocking pool after every tick that was started
pub type TickObserver = Arc<dyn Fn(&TwinEngine, &TickOutcome) + Send + Sync>;

pub struct Scheduler {
    engine: Arc<TwinEngine>,
    period: Duration,
    observer: Option<TickObserver>,
}

impl Scheduler {
    pub fn new(engine: Arc<TwinEngine>, period: Duration) -> Self {
        Self {
            engine,
            period,
            observer: None,
        }
    }

    /// Scheduler using the engine's configured tick period
    pub fn from_config(engine: Arc<TwinEngine>) -> Self {
        let period = engine.config().tick_period();
        Self::new(engine, period)
    }

    pub fn with_observer(
        mut self,
        observer: impl Fn(&TwinEngine, &TickOutcome) + Send + Sync + 'static,
    ) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Run the timer loop on the current tokio runtime
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Timer loop; never returns
    pub async fn run(self) {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately; the first step runs one period after start.
        interval.tick().await;

        tracing::info!("Scheduler started (period {:?})", self.period);

        loop {
            interval.tick().await;
            self.fire();
        }
    }

    /// Handle one timer fire
    ///
    /// Returns the spawned tick, or `None` when the fire was dropped because
    /// a tick is already in flight.
    pub fn fire(&self) -> Option<JoinHandle<TickOutcome>> {
        if self.engine.scheduler_state() == SchedulerState::Ticking {
            tracing::debug!("Timer fired while ticking; fire dropped");
            return None;
        }

        let engine = Arc::clone(&self.engine);
        let observer = self.observer.clone();
        Some(tokio::task::spawn_blocking(move || {
            let outcome = engine.tick();
            if let Some(observer) = observer {
                observer(engine.as_ref(), &outcome);
            }
            outcome
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::TwinConfig;
    use crate::model::{ModelStore, Room};
    use crate::telemetry::TelemetrySample;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn engine() -> Arc<TwinEngine> {
        let engine = TwinEngine::new(TwinConfig::default()).unwrap();
        let store = ModelStore::from_rooms("Office", vec![Room::new("R1", "Meeting Room", 26.0)])
            .unwrap();
        let samples = vec![TelemetrySample {
            date: "2024-06-01 08:00".into(),
            power_kw: 30.0,
            outdoor_temp_c: 30.0,
            occupancy: 1,
        }];
        engine.load(store, samples).unwrap();
        Arc::new(engine)
    }

    #[tokio::test]
    async fn test_fire_runs_one_tick() {
        let scheduler = Scheduler::new(engine(), Duration::from_millis(10));
        let outcome = scheduler.fire().unwrap().await.unwrap();
        assert!(outcome.is_completed());
        assert_eq!(scheduler.engine.ticks(), 1);
    }

    #[tokio::test]
    async fn test_observer_sees_every_started_tick() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let scheduler = Scheduler::new(engine(), Duration::from_millis(10)).with_observer(
            move |_, outcome| {
                assert!(outcome.is_completed());
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );

        scheduler.fire().unwrap().await.unwrap();
        scheduler.fire().unwrap().await.unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_spawned_loop_keeps_ticking() {
        let engine = engine();
        let handle = Scheduler::new(Arc::clone(&engine), Duration::from_millis(10)).spawn();
        tokio::time::sleep(Duration::from_millis(150)).await;
        handle.abort();
        assert!(engine.ticks() >= 2);
    }
}
