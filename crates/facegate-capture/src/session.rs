//! Capture session: one gate, one frame source, one sink.
//!
//! Every ticket the gate issues is turned into a capture from the source's
//! current raw frame, handed back to the gate, and the image (if any) is
//! submitted downstream. Sink failures are logged and never reach the gate.

use crate::capture::{capture_target, CapturedImage, EncodeFormat};
use crate::overlay::OverlayCanvas;
use crate::sink::CaptureSink;
use crate::source::{FrameSource, SourceError};
use facegate_core::{
    AlignmentGate, CaptureError, CaptureOutcome, CaptureTicket, DetectionFrame, GateError,
    GateUpdate, Phase,
};
use std::time::{Duration, Instant};

/// What one session step did, after any capture it triggered has completed.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    pub phase: Phase,
    pub aligned: bool,
    pub valid_faces: usize,
    pub hint: Option<&'static str>,
    pub countdown_remaining: Option<Duration>,
    pub cooldown_remaining: Option<Duration>,
    pub skipped: Option<GateError>,
    pub capture: Option<CaptureOutcome>,
    pub status: String,
}

pub struct CaptureSession<S, K> {
    gate: AlignmentGate,
    source: S,
    sink: K,
    format: EncodeFormat,
    captures: u64,
}

impl<S: FrameSource, K: CaptureSink> CaptureSession<S, K> {
    pub fn new(gate: AlignmentGate, source: S, sink: K, format: EncodeFormat) -> Self {
        Self {
            gate,
            source,
            sink,
            format,
            captures: 0,
        }
    }

    pub fn gate(&self) -> &AlignmentGate {
        &self.gate
    }

    pub fn gate_mut(&mut self) -> &mut AlignmentGate {
        &mut self.gate
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Number of images handed to the sink so far.
    pub fn captures(&self) -> u64 {
        self.captures
    }

    /// Detector output for the latest video frame.
    pub fn on_detections(&mut self, detections: &DetectionFrame, now: Instant) -> StepReport {
        let update = self.gate.on_frame(detections, now);
        self.finish(update, now)
    }

    /// Timer callback.
    pub fn tick(&mut self, now: Instant) -> StepReport {
        let update = self.gate.tick(now);
        self.finish(update, now)
    }

    /// User-initiated capture.
    pub fn manual_capture(&mut self, now: Instant) -> Result<StepReport, GateError> {
        let ticket = self.gate.request_manual_capture(now)?;
        let outcome = self.run_capture(ticket, now);
        let update = self.gate.tick(now);
        let mut report = self.report(update, now);
        report.capture = Some(outcome);
        Ok(report)
    }

    pub fn stop(&mut self) {
        self.gate.stop();
    }

    pub fn restart(&mut self) {
        self.gate.restart();
    }

    pub fn status_message(&self, now: Instant) -> String {
        self.gate.status_message(now)
    }

    /// Preview of the current raw frame with region and face boxes drawn on a copy.
    pub fn overlay(
        &self,
        detections: &DetectionFrame,
        aligned: bool,
    ) -> Result<OverlayCanvas, SourceError> {
        let frame = self.source.current_frame()?;
        Ok(OverlayCanvas::compose(frame, self.gate.region(), detections, aligned))
    }

    pub fn into_parts(self) -> (AlignmentGate, S, K) {
        (self.gate, self.source, self.sink)
    }

    fn finish(&mut self, mut update: GateUpdate, now: Instant) -> StepReport {
        let outcome = update.take_capture().map(|ticket| self.run_capture(ticket, now));
        let mut report = self.report(update, now);
        report.capture = outcome;
        report
    }

    fn run_capture(&mut self, ticket: CaptureTicket, now: Instant) -> CaptureOutcome {
        let trigger = ticket.trigger();
        let result: Result<CapturedImage, CaptureError> = match self.source.current_frame() {
            Ok(frame) => capture_target(frame, self.gate.region(), self.format, trigger),
            Err(e) => Err(CaptureError::CaptureUnavailable(e.to_string())),
        };

        let (gate_result, image) = match result {
            Ok(image) => (Ok(()), Some(image)),
            Err(e) => (Err(e), None),
        };
        let outcome = match &gate_result {
            Ok(()) => CaptureOutcome::Captured(trigger),
            Err(e) => CaptureOutcome::Failed(e.clone()),
        };

        if let Err(e) = self.gate.complete_capture(ticket, gate_result, now) {
            tracing::warn!(error = %e, "capture completion rejected");
        }

        if let Some(image) = image {
            let bytes = image.data.len();
            match self.sink.submit(image) {
                Ok(()) => {
                    self.captures += 1;
                    tracing::info!(?trigger, bytes, count = self.captures, "capture submitted");
                }
                Err(e) => tracing::warn!(error = %e, "capture sink failed; image dropped"),
            }
        }
        outcome
    }

    fn report(&self, update: GateUpdate, now: Instant) -> StepReport {
        StepReport {
            // The gate may have moved on if a capture completed in this step.
            phase: self.gate.phase(),
            aligned: update.aligned,
            valid_faces: update.valid_faces,
            hint: update.hint,
            countdown_remaining: self.gate.state().countdown_remaining(now),
            cooldown_remaining: self.gate.state().cooldown_remaining(now),
            skipped: update.skipped,
            capture: None,
            status: self.gate.status_message(now),
        }
    }
}
