//! Cancellable per-phase countdown.
//!
//! The timer holds no clock of its own: the owner ticks it once per elapsed
//! second. `cancel` disarms synchronously, and the zero-crossing disarms the
//! timer before reporting it, so a fire can be observed at most once per
//! `start`. Both invariants are plain state transitions and mechanically
//! testable without real time.

use tracing::debug;

/// Countdown over whole seconds, driven by an external tick source.
#[derive(Debug, Default)]
pub struct PhaseTimer {
    remaining_secs: Option<u32>,
    /// Bumped on every start/cancel; lets the owner attribute a fire to the
    /// arming that produced it.
    generation: u64,
}

impl PhaseTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the countdown for `secs` seconds, replacing any previous arming.
    pub fn start(&mut self, secs: u32) {
        self.generation += 1;
        self.remaining_secs = Some(secs);
        debug!("Phase timer armed: {}s (generation {})", secs, self.generation);
    }

    /// Disarm immediately. After return, no tick can report a fire until the
    /// next `start`.
    pub fn cancel(&mut self) {
        if self.remaining_secs.take().is_some() {
            self.generation += 1;
            debug!("Phase timer cancelled (generation {})", self.generation);
        }
    }

    /// Advance by one second. Returns `true` exactly once per arming, on the
    /// tick that crosses zero; ticks on a disarmed timer are no-ops.
    pub fn tick(&mut self) -> bool {
        match self.remaining_secs {
            Some(remaining) => {
                let remaining = remaining.saturating_sub(1);
                if remaining == 0 {
                    // Disarm before reporting: a duplicate zero-tick that
                    // arrives before the owner reacts cannot re-fire.
                    self.remaining_secs = None;
                    true
                } else {
                    self.remaining_secs = Some(remaining);
                    false
                }
            }
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.remaining_secs.is_some()
    }

    /// Seconds left, or `None` when disarmed.
    pub fn remaining_secs(&self) -> Option<u32> {
        self.remaining_secs
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
