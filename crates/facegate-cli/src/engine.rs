use facegate_capture::{
    CaptureSession, CapturedImage, EncodeFormat, LatestFrame, OverlayCanvas, StepReport,
    VideoFrame,
};
use facegate_core::{
    AlignmentConfig, AlignmentGate, ConfigError, DetectionFrame, DetectorReadiness, GateError,
    TargetRegion,
};
use std::time::Instant;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

// --- Named constants (no magic numbers) ---
const REQUEST_QUEUE_DEPTH: usize = 16;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid alignment config: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Gate(#[from] GateError),
    #[error("no raw frame available: {0}")]
    Source(#[from] facegate_capture::SourceError),
    #[error("failed to spawn engine thread: {0}")]
    Spawn(std::io::Error),
    #[error("engine thread exited")]
    ChannelClosed,
}

type SessionImpl = CaptureSession<LatestFrame, mpsc::UnboundedSender<CapturedImage>>;

/// Messages sent to the engine thread.
enum EngineRequest {
    Frame {
        detections: DetectionFrame,
        at: Instant,
        reply: oneshot::Sender<StepReport>,
    },
    Tick {
        at: Instant,
        reply: oneshot::Sender<StepReport>,
    },
    Manual {
        at: Instant,
        reply: oneshot::Sender<Result<StepReport, EngineError>>,
    },
    Overlay {
        detections: DetectionFrame,
        aligned: bool,
        reply: oneshot::Sender<Result<OverlayCanvas, EngineError>>,
    },
    Stop {
        reply: oneshot::Sender<u64>,
    },
}

/// Clone-safe handle to the engine thread.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
}

impl EngineHandle {
    /// Feed detector output for the current video frame.
    pub async fn frame(
        &self,
        detections: DetectionFrame,
        at: Instant,
    ) -> Result<StepReport, EngineError> {
        self.request(|reply| EngineRequest::Frame {
            detections,
            at,
            reply,
        })
        .await
    }

    /// Timer tick.
    pub async fn tick(&self, at: Instant) -> Result<StepReport, EngineError> {
        self.request(|reply| EngineRequest::Tick { at, reply }).await
    }

    /// Manual capture request.
    pub async fn manual(&self, at: Instant) -> Result<StepReport, EngineError> {
        self.request(|reply| EngineRequest::Manual { at, reply }).await?
    }

    /// Render a preview of the current raw frame.
    pub async fn overlay(
        &self,
        detections: DetectionFrame,
        aligned: bool,
    ) -> Result<OverlayCanvas, EngineError> {
        self.request(|reply| EngineRequest::Overlay {
            detections,
            aligned,
            reply,
        })
        .await?
    }

    /// Stop the session and shut the engine down. Returns the number of
    /// captures handed to the queue.
    pub async fn stop(&self) -> Result<u64, EngineError> {
        self.request(|reply| EngineRequest::Stop { reply }).await
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> EngineRequest,
    ) -> Result<T, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)
    }
}

/// Spawn the engine on a dedicated OS thread.
///
/// Builds the gate synchronously so a bad config fails before the thread
/// starts. The session owns `sink`; it is dropped when the engine stops,
/// which closes the capture queue.
pub fn spawn_engine(
    config: AlignmentConfig,
    region: TargetRegion,
    readiness: DetectorReadiness,
    frame: VideoFrame,
    format: EncodeFormat,
    sink: mpsc::UnboundedSender<CapturedImage>,
) -> Result<EngineHandle, EngineError> {
    let gate = AlignmentGate::new(config, region, readiness)?;
    tracing::info!(
        width = frame.width(),
        height = frame.height(),
        %format,
        "capture session ready"
    );
    let mut session: SessionImpl =
        CaptureSession::new(gate, LatestFrame::still(frame), sink, format);

    let (tx, mut rx) = mpsc::channel::<EngineRequest>(REQUEST_QUEUE_DEPTH);

    std::thread::Builder::new()
        .name("facegate-engine".into())
        .spawn(move || {
            tracing::info!("engine thread started");
            while let Some(req) = rx.blocking_recv() {
                match req {
                    EngineRequest::Frame {
                        detections,
                        at,
                        reply,
                    } => {
                        let _ = reply.send(session.on_detections(&detections, at));
                    }
                    EngineRequest::Tick { at, reply } => {
                        let _ = reply.send(session.tick(at));
                    }
                    EngineRequest::Manual { at, reply } => {
                        let result = session.manual_capture(at).map_err(EngineError::from);
                        if let Err(e) = &result {
                            tracing::info!(error = %e, "manual capture refused");
                        }
                        let _ = reply.send(result);
                    }
                    EngineRequest::Overlay {
                        detections,
                        aligned,
                        reply,
                    } => {
                        let result = session
                            .overlay(&detections, aligned)
                            .map_err(EngineError::from);
                        let _ = reply.send(result);
                    }
                    EngineRequest::Stop { reply } => {
                        session.stop();
                        let _ = reply.send(session.captures());
                        break;
                    }
                }
            }
            tracing::info!("engine thread exiting");
        })
        .map_err(EngineError::Spawn)?;

    Ok(EngineHandle { tx })
}
