//! Analysis and session-orchestration core for guided neurological
//! self-screening.
//!
//! The crate consumes per-frame landmark data from external detectors
//! (468-point face mesh, 33-point body pose) plus an externally produced
//! speech analysis result, and exposes:
//!
//! 1. Per-frame facial asymmetry and posture metrics with confidence and
//!    data-quality grading ([`analysis`]).
//! 2. A multimodal risk aggregation over the three modalities ([`risk`]).
//! 3. A phase-driven session state machine with timed capture phases and
//!    capture start/stop signaling ([`session`]).
//!
//! Architecture:
//!   detector callback → AssessmentSession::submit_*_frame → analyzers
//!                                 ↓
//!                       latest-metric slots (watch)
//!                                 ↓
//!               risk aggregation → frozen on results phase
//!
//! The core performs no I/O beyond tracing events, retains no frame history,
//! and hands persistence off as an [`snapshot::AssessmentSnapshot`] value.
//! It is a screening aid, not a diagnostic device.

pub mod analysis;
pub mod config;
pub mod geometry;
pub mod landmarks;
pub mod risk;
pub mod session;
pub mod snapshot;
pub mod speech;

pub use analysis::face::{AsymmetryMetrics, FacialAsymmetryAnalyzer};
pub use analysis::posture::{PostureAnalyzer, PostureMetrics};
pub use analysis::{AnalysisError, DataQuality};
pub use config::ScreeningConfig;
pub use landmarks::{LandmarkFrame, LandmarkPoint};
pub use risk::{aggregate, RiskAssessment, RiskLevel};
pub use session::driver::{start_session_driver, DriverConfig, DriverHandle};
pub use session::timer::PhaseTimer;
pub use session::{
    AssessmentPhase, AssessmentSession, AssessmentState, CaptureCommand, CaptureSink,
    ChannelCaptureSink, NullCaptureSink, SubmitOutcome,
};
pub use snapshot::AssessmentSnapshot;
pub use speech::SpeechMetrics;
