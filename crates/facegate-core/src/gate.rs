//! Alignment gate: the per-session capture state machine.
//!
//! ```text
//! Idle ──aligned──▶ Tracking ──window──▶ Countdown ──deadline──▶ Capturing
//!  ▲                  │  ▲                   │                      │
//!  │◀──lost alignment─┘  └───────────────────┘               complete_capture
//!  │                                                                ▼
//!  └──────────────────────────── expiry ─────────────────────── Cooldown
//! ```
//!
//! Capture fires exactly when continuous alignment reaches the stability
//! duration. The countdown is the last `countdown_ms` of that window; its
//! deadline is fixed once on entry and every evaluation compares the clock
//! against it, so frames and timer ticks in any order reach the same phase.
//!
//! All time is passed in by the caller, which keeps the gate deterministic.

use crate::alignment::{self, AlignmentCheck};
use crate::config::AlignmentConfig;
use crate::error::{remaining_secs, CaptureError, ConfigError, GateError};
use crate::readiness::DetectorReadiness;
use crate::region::TargetRegion;
use crate::types::DetectionFrame;
use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Tracking,
    Countdown,
    Capturing,
    Cooldown,
    Stopped,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Tracking => "tracking",
            Phase::Countdown => "countdown",
            Phase::Capturing => "capturing",
            Phase::Cooldown => "cooldown",
            Phase::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureTrigger {
    Automatic,
    Manual,
}

/// Recorded result of the most recent capture attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    Captured(CaptureTrigger),
    Failed(CaptureError),
}

/// Mutable state of one camera session.
#[derive(Debug, Clone, PartialEq)]
pub struct GateState {
    pub phase: Phase,
    /// Start of the current continuous-alignment run.
    pub stable_since: Option<Instant>,
    /// Capture deadline, fixed when the countdown starts.
    pub capture_deadline: Option<Instant>,
    pub cooldown_until: Option<Instant>,
    /// Bumped on every stop/restart; tickets from older generations are stale.
    pub generation: u64,
    pub last_outcome: Option<CaptureOutcome>,
}

impl GateState {
    fn idle(generation: u64) -> Self {
        Self {
            phase: Phase::Idle,
            stable_since: None,
            capture_deadline: None,
            cooldown_until: None,
            generation,
            last_outcome: None,
        }
    }

    pub fn countdown_remaining(&self, now: Instant) -> Option<Duration> {
        match self.phase {
            Phase::Countdown => self
                .capture_deadline
                .map(|deadline| deadline.saturating_duration_since(now)),
            _ => None,
        }
    }

    pub fn cooldown_remaining(&self, now: Instant) -> Option<Duration> {
        match self.phase {
            Phase::Cooldown => self
                .cooldown_until
                .map(|until| until.saturating_duration_since(now)),
            _ => None,
        }
    }
}

/// Permission to run exactly one capture.
///
/// The gate is already in `Capturing` when a ticket exists; hand it back
/// through [`AlignmentGate::complete_capture`] once the capture finished.
#[derive(Debug)]
#[must_use = "an outstanding ticket keeps the gate in Capturing until completed"]
pub struct CaptureTicket {
    generation: u64,
    trigger: CaptureTrigger,
    issued_at: Instant,
}

impl CaptureTicket {
    pub fn trigger(&self) -> CaptureTrigger {
        self.trigger
    }

    pub fn issued_at(&self) -> Instant {
        self.issued_at
    }
}

/// Result of one frame evaluation or timer tick.
#[derive(Debug)]
pub struct GateUpdate {
    pub phase: Phase,
    /// Whether the last evaluated frame held at least one valid face.
    pub aligned: bool,
    pub valid_faces: usize,
    pub hint: Option<&'static str>,
    pub countdown_remaining: Option<Duration>,
    pub cooldown_remaining: Option<Duration>,
    /// Set when the frame was not evaluated.
    pub skipped: Option<GateError>,
    /// Present when this step started a capture.
    pub capture: Option<CaptureTicket>,
}

impl GateUpdate {
    pub fn take_capture(&mut self) -> Option<CaptureTicket> {
        self.capture.take()
    }
}

pub struct AlignmentGate {
    config: AlignmentConfig,
    region: TargetRegion,
    readiness: DetectorReadiness,
    state: GateState,
    last_check: AlignmentCheck,
}

impl AlignmentGate {
    pub fn new(
        config: AlignmentConfig,
        region: TargetRegion,
        readiness: DetectorReadiness,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            region,
            readiness,
            state: GateState::idle(0),
            last_check: AlignmentCheck::default(),
        })
    }

    pub fn config(&self) -> &AlignmentConfig {
        &self.config
    }

    pub fn region(&self) -> &TargetRegion {
        &self.region
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    /// Replace the config. A running countdown keeps its deadline.
    pub fn update_config(&mut self, config: AlignmentConfig) -> Result<(), ConfigError> {
        config.validate()?;
        tracing::info!(
            stability_ms = config.stability_ms,
            cooldown_ms = config.cooldown_ms,
            "alignment config updated"
        );
        self.config = config;
        Ok(())
    }

    /// Evaluate one detection frame and advance the state machine.
    pub fn on_frame(&mut self, frame: &DetectionFrame, now: Instant) -> GateUpdate {
        if self.state.phase == Phase::Stopped {
            return self.update(now, Some(GateError::Stopped), None);
        }
        if !self.readiness.is_ready() {
            tracing::debug!("detector not ready, frame skipped");
            self.end_unconfirmed_run();
            return self.update(now, Some(GateError::DetectorUnavailable), None);
        }

        self.last_check = alignment::evaluate(frame, &self.region, &self.config);
        self.expire_cooldown(now);

        let capture = match self.state.phase {
            Phase::Idle | Phase::Tracking | Phase::Countdown => {
                self.apply_alignment(self.last_check.aligned, now)
            }
            // Evaluated for feedback only.
            Phase::Capturing | Phase::Cooldown | Phase::Stopped => None,
        };
        self.update(now, None, capture)
    }

    /// Timer callback. Shares the deadline logic with [`on_frame`](Self::on_frame).
    pub fn tick(&mut self, now: Instant) -> GateUpdate {
        if self.state.phase == Phase::Stopped {
            return self.update(now, Some(GateError::Stopped), None);
        }
        self.expire_cooldown(now);
        if !self.readiness.is_ready() {
            self.end_unconfirmed_run();
            return self.update(now, None, None);
        }
        let capture = self.advance(now);
        self.update(now, None, capture)
    }

    /// Capture now, skipping whatever stability time is left.
    pub fn request_manual_capture(&mut self, now: Instant) -> Result<CaptureTicket, GateError> {
        self.expire_cooldown(now);
        match self.state.phase {
            Phase::Stopped => return Err(GateError::Stopped),
            Phase::Capturing => {
                tracing::debug!("manual capture rejected: capture in progress");
                return Err(GateError::ReentrantCaptureRejected);
            }
            Phase::Cooldown => {
                let remaining = self.state.cooldown_remaining(now).unwrap_or_default();
                tracing::debug!(
                    remaining_ms = remaining.as_millis() as u64,
                    "manual capture rejected: cooling down"
                );
                return Err(GateError::CoolingDown { remaining });
            }
            Phase::Idle | Phase::Tracking | Phase::Countdown => {}
        }
        if !self.config.allow_manual_capture {
            return Err(GateError::ManualCaptureDisabled);
        }
        Ok(self.begin_capture(CaptureTrigger::Manual, now))
    }

    /// Hand back a ticket. Success or failure, the gate enters cooldown.
    pub fn complete_capture(
        &mut self,
        ticket: CaptureTicket,
        result: Result<(), CaptureError>,
        now: Instant,
    ) -> Result<(), GateError> {
        if ticket.generation != self.state.generation || self.state.phase != Phase::Capturing {
            tracing::warn!(
                ticket_generation = ticket.generation,
                generation = self.state.generation,
                phase = %self.state.phase,
                "stale capture ticket ignored"
            );
            return Err(GateError::StaleTicket);
        }

        let outcome = match result {
            Ok(()) => {
                tracing::info!(trigger = ?ticket.trigger, "capture completed");
                CaptureOutcome::Captured(ticket.trigger)
            }
            Err(e) => {
                tracing::warn!(trigger = ?ticket.trigger, error = %e, "capture failed");
                CaptureOutcome::Failed(e)
            }
        };

        self.state.phase = Phase::Cooldown;
        self.state.cooldown_until = Some(now + self.config.cooldown());
        self.state.last_outcome = Some(outcome);
        tracing::info!(cooldown_ms = self.config.cooldown_ms, "cooldown started");
        Ok(())
    }

    /// End the session. Every timer is cleared and nothing fires afterwards.
    pub fn stop(&mut self) {
        let generation = self.state.generation + 1;
        self.state = GateState {
            phase: Phase::Stopped,
            ..GateState::idle(generation)
        };
        self.last_check = AlignmentCheck::default();
        tracing::info!(generation, "gate stopped");
    }

    /// Start a fresh session.
    pub fn restart(&mut self) {
        let generation = self.state.generation + 1;
        self.state = GateState::idle(generation);
        self.last_check = AlignmentCheck::default();
        tracing::info!(generation, "gate restarted");
    }

    /// User-visible status line.
    pub fn status_message(&self, now: Instant) -> String {
        match self.state.phase {
            Phase::Idle => match self.last_check.hint() {
                Some(hint) => hint.to_string(),
                None if !self.readiness.is_ready() => "Loading face detector...".to_string(),
                None => "Position your face inside the frame".to_string(),
            },
            Phase::Tracking => "Hold still...".to_string(),
            Phase::Countdown => {
                let remaining = self.state.countdown_remaining(now).unwrap_or_default();
                format!("Capturing in {}", remaining_secs(&remaining))
            }
            Phase::Capturing => "Capturing...".to_string(),
            Phase::Cooldown => {
                let remaining = self.state.cooldown_remaining(now).unwrap_or_default();
                let wait = GateError::CoolingDown { remaining }.to_string();
                match &self.state.last_outcome {
                    Some(CaptureOutcome::Failed(e)) => format!("Capture failed ({e}); {wait}"),
                    _ => format!("Captured; {wait}"),
                }
            }
            Phase::Stopped => "Camera stopped".to_string(),
        }
    }

    fn apply_alignment(&mut self, aligned: bool, now: Instant) -> Option<CaptureTicket> {
        if !aligned {
            if matches!(self.state.phase, Phase::Tracking | Phase::Countdown) {
                tracing::info!(phase = %self.state.phase, "alignment lost, back to idle");
                self.reset_to_idle();
            }
            return None;
        }

        if self.state.phase == Phase::Idle {
            self.state.phase = Phase::Tracking;
            self.state.stable_since = Some(now);
            tracing::info!("aligned face found, tracking");
        }
        self.advance(now)
    }

    /// Move Tracking → Countdown → Capturing as the clock allows.
    fn advance(&mut self, now: Instant) -> Option<CaptureTicket> {
        let since = self.state.stable_since?;
        match self.state.phase {
            Phase::Tracking => {
                let deadline = since + self.config.stability();
                if now >= deadline {
                    return Some(self.begin_capture(CaptureTrigger::Automatic, now));
                }
                let in_window = deadline.saturating_duration_since(now) <= self.config.countdown();
                if now > since && in_window {
                    self.state.phase = Phase::Countdown;
                    self.state.capture_deadline = Some(deadline);
                    tracing::info!(
                        remaining_ms = deadline.saturating_duration_since(now).as_millis() as u64,
                        "countdown started"
                    );
                }
                None
            }
            Phase::Countdown => {
                let deadline = self.state.capture_deadline?;
                (now >= deadline).then(|| self.begin_capture(CaptureTrigger::Automatic, now))
            }
            _ => None,
        }
    }

    fn begin_capture(&mut self, trigger: CaptureTrigger, now: Instant) -> CaptureTicket {
        self.state.phase = Phase::Capturing;
        self.state.stable_since = None;
        self.state.capture_deadline = None;
        tracing::info!(?trigger, "capture started");
        CaptureTicket {
            generation: self.state.generation,
            trigger,
            issued_at: now,
        }
    }

    fn expire_cooldown(&mut self, now: Instant) {
        if self.state.phase != Phase::Cooldown {
            return;
        }
        if self.state.cooldown_until.is_some_and(|until| now >= until) {
            tracing::info!("cooldown finished");
            self.reset_to_idle();
        }
    }

    /// A stability run needs every frame in it evaluated; without a detector
    /// the run cannot be confirmed, so it ends.
    fn end_unconfirmed_run(&mut self) {
        if matches!(self.state.phase, Phase::Tracking | Phase::Countdown) {
            tracing::info!(phase = %self.state.phase, "detector unavailable, back to idle");
            self.reset_to_idle();
            self.last_check = AlignmentCheck::default();
        }
    }

    fn reset_to_idle(&mut self) {
        self.state.phase = Phase::Idle;
        self.state.stable_since = None;
        self.state.capture_deadline = None;
        self.state.cooldown_until = None;
    }

    fn update(
        &self,
        now: Instant,
        skipped: Option<GateError>,
        capture: Option<CaptureTicket>,
    ) -> GateUpdate {
        GateUpdate {
            phase: self.state.phase,
            aligned: self.last_check.aligned,
            valid_faces: self.last_check.valid_faces,
            hint: self.last_check.hint(),
            countdown_remaining: self.state.countdown_remaining(now),
            cooldown_remaining: self.state.cooldown_remaining(now),
            skipped,
            capture,
        }
    }
}
