//! Async tick driver for a shared session.
//!
//! The session itself has no clock; this driver ticks it once per interval
//! on the tokio runtime. Embedders that already own a cadence (a UI timer, a
//! test harness) can call [`AssessmentSession::tick_second`] themselves and
//! skip the driver entirely.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::AssessmentSession;

/// Driver configuration.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Milliseconds between ticks. One second in production; tests shorten
    /// it to run phase flows quickly.
    pub tick_interval_ms: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
        }
    }
}

/// Handle to a running driver task.
pub struct DriverHandle {
    stop_flag: Arc<AtomicBool>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl DriverHandle {
    /// Request the driver to stop after its current tick.
    pub fn stop(&self) {
        debug!("Requesting session driver stop");
        self.stop_flag.store(true, Ordering::SeqCst);
    }

    /// Wait for the driver task to finish.
    pub async fn join(mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    pub fn is_running(&self) -> bool {
        !self.stop_flag.load(Ordering::Relaxed)
    }
}

/// Spawn the tick loop for `session`. Must be called from within a tokio
/// runtime.
pub fn start_session_driver(
    session: Arc<Mutex<AssessmentSession>>,
    config: DriverConfig,
) -> DriverHandle {
    info!(
        "Starting session driver ({}ms tick)",
        config.tick_interval_ms
    );
    let stop_flag = Arc::new(AtomicBool::new(false));
    let flag = stop_flag.clone();

    let task = tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(Duration::from_millis(config.tick_interval_ms.max(1)));
        // The first tick of a tokio interval completes immediately; skip it
        // so the first countdown second is a full one.
        interval.tick().await;
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            if flag.load(Ordering::Relaxed) {
                break;
            }
            match session.lock() {
                Ok(mut session) => session.tick_second(),
                Err(_) => {
                    warn!("Session lock poisoned; driver exiting");
                    break;
                }
            }
        }
        debug!("Session driver stopped");
    });

    DriverHandle {
        stop_flag,
        task: Some(task),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScreeningConfig;
    use crate::session::{AssessmentPhase, NullCaptureSink};

    fn init_test_logging() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    }

    fn short_session() -> Arc<Mutex<AssessmentSession>> {
        let config = ScreeningConfig {
            face_phase_secs: 2,
            pose_phase_secs: 2,
            ..ScreeningConfig::default()
        };
        Arc::new(Mutex::new(AssessmentSession::new(
            config,
            Box::new(NullCaptureSink),
        )))
    }

    #[tokio::test]
    async fn test_driver_advances_timed_phases() {
        init_test_logging();
        let session = short_session();
        session.lock().unwrap().start();

        let handle = start_session_driver(
            session.clone(),
            DriverConfig {
                tick_interval_ms: 5,
            },
        );

        // 2 ticks end the face phase, 2 more end pose; allow generous slack.
        tokio::time::sleep(Duration::from_millis(200)).await;
        let phase = session.lock().unwrap().phase();
        assert_eq!(phase, AssessmentPhase::Speech);

        handle.stop();
        handle.join().await;
    }

    #[tokio::test]
    async fn test_driver_stop_halts_ticking() {
        let session = short_session();
        let handle = start_session_driver(
            session.clone(),
            DriverConfig {
                tick_interval_ms: 5,
            },
        );
        assert!(handle.is_running());
        handle.stop();
        handle.join().await;

        // Starting after the driver stopped: nothing ticks the countdown.
        session.lock().unwrap().start();
        tokio::time::sleep(Duration::from_millis(50)).await;
        let state = session.lock().unwrap().state();
        assert_eq!(state.phase, AssessmentPhase::Face);
        assert_eq!(
            state.timer_remaining_secs,
            Some(2),
        );
    }
}
