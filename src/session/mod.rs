//! Guided assessment session.
//!
//! `AssessmentSession` owns every piece of mutable screening state: the
//! phase machine, the phase timer, the latest analyzer results, and the
//! capture lifecycle signaling. All mutation goes through `&mut self` on a
//! single owner: there are no process-wide singletons, and the
//! cancel-before-transition timer invariant holds structurally because the
//! timer and the phase are fields of the same exclusively borrowed value.
//!
//! Frame intake uses a caller-supplied monotonic clock (`now_ms`): the
//! session throttles analysis to a minimum interval and drops frames whose
//! modality does not match the active phase, so a slow detector callback for
//! an already-ended phase can never corrupt the final summary.

pub mod driver;
pub mod timer;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::analysis::face::{AsymmetryMetrics, FacialAsymmetryAnalyzer};
use crate::analysis::posture::{PostureAnalyzer, PostureMetrics};
use crate::config::ScreeningConfig;
use crate::landmarks::LandmarkFrame;
use crate::risk::{aggregate, RiskAssessment};
use crate::snapshot::AssessmentSnapshot;
use crate::speech::SpeechMetrics;

use timer::PhaseTimer;

/// One stage of the guided session, in strict order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AssessmentPhase {
    Instruction,
    Face,
    Pose,
    Speech,
    Results,
}

impl AssessmentPhase {
    /// The following phase, or `None` from the terminal phase.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Instruction => Some(Self::Face),
            Self::Face => Some(Self::Pose),
            Self::Pose => Some(Self::Speech),
            Self::Speech => Some(Self::Results),
            Self::Results => None,
        }
    }

    /// Whether the phase runs on a countdown.
    pub fn is_timed(self) -> bool {
        matches!(self, Self::Face | Self::Pose)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Instruction => "instruction",
            Self::Face => "face",
            Self::Pose => "pose",
            Self::Speech => "speech",
            Self::Results => "results",
        }
    }
}

/// Capture lifecycle signal emitted by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureCommand {
    Start(AssessmentPhase),
    Stop(AssessmentPhase),
}

/// Sink for capture lifecycle signals.
///
/// The session is the single owner of session-scoped camera/microphone
/// lifetime: it signals start on entering a timed phase and stop on leaving
/// it (including reset). The sink implementation is the external capture
/// subsystem's adapter.
pub trait CaptureSink: Send {
    fn start_capture(&mut self, phase: AssessmentPhase);
    fn stop_capture(&mut self, phase: AssessmentPhase);
}

/// Sink that discards all signals; useful for headless analysis.
#[derive(Debug, Default)]
pub struct NullCaptureSink;

impl CaptureSink for NullCaptureSink {
    fn start_capture(&mut self, _phase: AssessmentPhase) {}
    fn stop_capture(&mut self, _phase: AssessmentPhase) {}
}

/// Sink forwarding signals over an unbounded channel to the capture
/// subsystem's own task.
#[derive(Debug)]
pub struct ChannelCaptureSink {
    tx: mpsc::UnboundedSender<CaptureCommand>,
}

impl ChannelCaptureSink {
    /// Returns the sink and the receiving end for the capture subsystem.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<CaptureCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl CaptureSink for ChannelCaptureSink {
    fn start_capture(&mut self, phase: AssessmentPhase) {
        if self.tx.send(CaptureCommand::Start(phase)).is_err() {
            warn!("Capture subsystem gone; start signal for {} dropped", phase.as_str());
        }
    }

    fn stop_capture(&mut self, phase: AssessmentPhase) {
        if self.tx.send(CaptureCommand::Stop(phase)).is_err() {
            warn!("Capture subsystem gone; stop signal for {} dropped", phase.as_str());
        }
    }
}

/// Disposition of a submitted landmark frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Frame was analyzed and the metrics slot updated.
    Analyzed,
    /// Frame arrived inside the minimum analysis interval and was dropped.
    Throttled,
    /// Frame's modality does not match the active phase; dropped.
    PhaseMismatch,
}

/// Progress snapshot for presentation collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentState {
    pub phase: AssessmentPhase,
    pub completed_phases: BTreeSet<AssessmentPhase>,
    pub timer_remaining_secs: Option<u32>,
    pub asymmetry: AsymmetryMetrics,
    pub posture: PostureMetrics,
    pub speech: Option<SpeechMetrics>,
    pub risk: RiskAssessment,
}

/// The session state machine and metric owner.
pub struct AssessmentSession {
    config: ScreeningConfig,
    session_id: Uuid,
    phase: AssessmentPhase,
    completed: BTreeSet<AssessmentPhase>,
    timer: PhaseTimer,
    face_analyzer: FacialAsymmetryAnalyzer,
    posture_analyzer: PostureAnalyzer,
    capture: Box<dyn CaptureSink>,
    asymmetry: AsymmetryMetrics,
    posture: PostureMetrics,
    speech: Option<SpeechMetrics>,
    risk: RiskAssessment,
    last_face_analysis_ms: Option<u64>,
    last_pose_analysis_ms: Option<u64>,
    phase_tx: watch::Sender<AssessmentPhase>,
    asymmetry_tx: watch::Sender<AsymmetryMetrics>,
    posture_tx: watch::Sender<PostureMetrics>,
    risk_tx: watch::Sender<RiskAssessment>,
}

impl AssessmentSession {
    pub fn new(config: ScreeningConfig, capture: Box<dyn CaptureSink>) -> Self {
        let (phase_tx, _) = watch::channel(AssessmentPhase::Instruction);
        let (asymmetry_tx, _) = watch::channel(AsymmetryMetrics::empty());
        let (posture_tx, _) = watch::channel(PostureMetrics::empty());
        let (risk_tx, _) = watch::channel(RiskAssessment::default());
        let session_id = Uuid::new_v4();
        info!("Assessment session created: {}", session_id);
        Self {
            config,
            session_id,
            phase: AssessmentPhase::Instruction,
            completed: BTreeSet::new(),
            timer: PhaseTimer::new(),
            face_analyzer: FacialAsymmetryAnalyzer::new(),
            posture_analyzer: PostureAnalyzer::new(),
            capture,
            asymmetry: AsymmetryMetrics::empty(),
            posture: PostureMetrics::empty(),
            speech: None,
            risk: RiskAssessment::default(),
            last_face_analysis_ms: None,
            last_pose_analysis_ms: None,
            phase_tx,
            asymmetry_tx,
            posture_tx,
            risk_tx,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn phase(&self) -> AssessmentPhase {
        self.phase
    }

    /// Current progress snapshot.
    pub fn state(&self) -> AssessmentState {
        AssessmentState {
            phase: self.phase,
            completed_phases: self.completed.clone(),
            timer_remaining_secs: self.timer.remaining_secs(),
            asymmetry: self.asymmetry.clone(),
            posture: self.posture.clone(),
            speech: self.speech.clone(),
            risk: self.risk.clone(),
        }
    }

    // Latest-value subscriptions for presentation collaborators.

    pub fn subscribe_phase(&self) -> watch::Receiver<AssessmentPhase> {
        self.phase_tx.subscribe()
    }

    pub fn subscribe_asymmetry(&self) -> watch::Receiver<AsymmetryMetrics> {
        self.asymmetry_tx.subscribe()
    }

    pub fn subscribe_posture(&self) -> watch::Receiver<PostureMetrics> {
        self.posture_tx.subscribe()
    }

    pub fn subscribe_risk(&self) -> watch::Receiver<RiskAssessment> {
        self.risk_tx.subscribe()
    }

    /// Begin the screening: instruction → face.
    pub fn start(&mut self) {
        if self.phase != AssessmentPhase::Instruction {
            warn!("start ignored in phase {}", self.phase.as_str());
            return;
        }
        self.completed.insert(AssessmentPhase::Instruction);
        self.enter(AssessmentPhase::Face);
    }

    /// Skip the rest of the current timed phase.
    ///
    /// The pending timer is cancelled before the transition, so a tick that
    /// was already due cannot fire afterwards.
    pub fn skip(&mut self) {
        if !self.phase.is_timed() {
            debug!("skip ignored in phase {}", self.phase.as_str());
            return;
        }
        self.timer.cancel();
        self.leave_and_advance();
    }

    /// Advance the phase countdown by one second.
    pub fn tick_second(&mut self) {
        if self.timer.tick() {
            debug!("Phase timer expired in {}", self.phase.as_str());
            self.leave_and_advance();
        }
    }

    /// Finish the speech phase with the externally produced result (or none,
    /// when the user could not complete the task).
    pub fn complete_speech(&mut self, metrics: Option<SpeechMetrics>) {
        if self.phase != AssessmentPhase::Speech {
            warn!("speech completion ignored in phase {}", self.phase.as_str());
            return;
        }
        self.speech = metrics;
        self.completed.insert(AssessmentPhase::Speech);
        self.enter(AssessmentPhase::Results);
    }

    /// Full reset: back to instruction with all accumulated state wiped and
    /// a fresh session identity.
    pub fn reset(&mut self) {
        if self.phase.is_timed() {
            self.capture.stop_capture(self.phase);
        }
        self.timer.cancel();
        self.phase = AssessmentPhase::Instruction;
        self.completed.clear();
        self.asymmetry = AsymmetryMetrics::empty();
        self.posture = PostureMetrics::empty();
        self.speech = None;
        self.risk = RiskAssessment::default();
        self.last_face_analysis_ms = None;
        self.last_pose_analysis_ms = None;
        self.session_id = Uuid::new_v4();
        info!("Session reset; new session {}", self.session_id);
        self.phase_tx.send_replace(self.phase);
        self.asymmetry_tx.send_replace(self.asymmetry.clone());
        self.posture_tx.send_replace(self.posture.clone());
        self.risk_tx.send_replace(self.risk.clone());
    }

    /// Submit one facial landmark frame captured at `now_ms` (caller's
    /// monotonic clock).
    pub fn submit_face_frame(&mut self, frame: &LandmarkFrame, now_ms: u64) -> SubmitOutcome {
        if self.phase != AssessmentPhase::Face {
            debug!(
                "Facial frame dropped: captured for phase face, session in {}",
                self.phase.as_str()
            );
            return SubmitOutcome::PhaseMismatch;
        }
        if !Self::interval_elapsed(
            self.last_face_analysis_ms,
            now_ms,
            self.config.min_analysis_interval_ms,
        ) {
            return SubmitOutcome::Throttled;
        }
        self.last_face_analysis_ms = Some(now_ms);
        let metrics = self.face_analyzer.analyze(frame);
        self.asymmetry = metrics.clone();
        self.asymmetry_tx.send_replace(metrics);
        self.recompute_risk();
        SubmitOutcome::Analyzed
    }

    /// Submit one pose landmark frame captured at `now_ms`.
    pub fn submit_pose_frame(&mut self, frame: &LandmarkFrame, now_ms: u64) -> SubmitOutcome {
        if self.phase != AssessmentPhase::Pose {
            debug!(
                "Pose frame dropped: captured for phase pose, session in {}",
                self.phase.as_str()
            );
            return SubmitOutcome::PhaseMismatch;
        }
        if !Self::interval_elapsed(
            self.last_pose_analysis_ms,
            now_ms,
            self.config.min_analysis_interval_ms,
        ) {
            return SubmitOutcome::Throttled;
        }
        self.last_pose_analysis_ms = Some(now_ms);
        let metrics = self.posture_analyzer.analyze(frame);
        self.posture = metrics.clone();
        self.posture_tx.send_replace(metrics);
        self.recompute_risk();
        SubmitOutcome::Analyzed
    }

    /// Persistence handoff value for the external save operation.
    pub fn snapshot(&self) -> AssessmentSnapshot {
        AssessmentSnapshot::capture(
            self.session_id,
            self.asymmetry.clone(),
            self.posture.clone(),
            self.speech.clone(),
            self.risk.clone(),
            &self.completed,
        )
    }

    fn interval_elapsed(last_ms: Option<u64>, now_ms: u64, min_interval_ms: u64) -> bool {
        match last_ms {
            Some(last) => now_ms.saturating_sub(last) >= min_interval_ms,
            None => true,
        }
    }

    /// Leave the current timed phase and enter the next one.
    fn leave_and_advance(&mut self) {
        let from = self.phase;
        let Some(next) = from.next() else {
            return;
        };
        if from.is_timed() {
            self.capture.stop_capture(from);
        }
        self.completed.insert(from);
        self.enter(next);
    }

    fn enter(&mut self, next: AssessmentPhase) {
        info!("Phase transition: {} -> {}", self.phase.as_str(), next.as_str());
        self.phase = next;
        if next.is_timed() {
            let secs = match next {
                AssessmentPhase::Face => self.config.face_phase_secs,
                AssessmentPhase::Pose => self.config.pose_phase_secs,
                _ => unreachable!("only face and pose are timed"),
            };
            self.timer.start(secs);
            self.capture.start_capture(next);
        }
        if next == AssessmentPhase::Results {
            // Final recomputation; the assessment is frozen from here because
            // no frame or speech input is accepted in the results phase.
            self.recompute_risk();
        }
        self.phase_tx.send_replace(next);
    }

    fn recompute_risk(&mut self) {
        let assessment = aggregate(&self.asymmetry, &self.posture, self.speech.as_ref());
        self.risk = assessment.clone();
        self.risk_tx.send_replace(assessment);
    }
}
