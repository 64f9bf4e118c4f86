//! Detection traces: JSON lines recorded from an upstream detector.
//!
//! ```text
//! {"kind":"frame","t_ms":0,"width":640,"height":480,"detections":[...]}
//! {"kind":"tick","t_ms":16}
//! {"kind":"manual","t_ms":5000}
//! {"kind":"detector","t_ms":6000,"ready":false}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use facegate_core::{DetectionFrame, RawDetection};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TraceEvent {
    Frame {
        t_ms: u64,
        width: u32,
        height: u32,
        #[serde(default)]
        detections: Vec<RawDetection>,
    },
    Tick {
        t_ms: u64,
    },
    Manual {
        t_ms: u64,
    },
    /// Detector availability changed.
    Detector {
        t_ms: u64,
        ready: bool,
    },
}

impl TraceEvent {
    /// Offset from the start of the trace.
    pub fn t_ms(&self) -> u64 {
        match self {
            Self::Frame { t_ms, .. }
            | Self::Tick { t_ms }
            | Self::Manual { t_ms }
            | Self::Detector { t_ms, .. } => *t_ms,
        }
    }

    /// Detector output with pose derived from landmarks, for frame events.
    pub fn detection_frame(&self) -> Option<DetectionFrame> {
        match self {
            Self::Frame {
                width,
                height,
                detections,
                ..
            } => Some(DetectionFrame::from_raw(*width, *height, detections)),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum TraceError {
    #[error("failed to read trace {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("trace line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("trace line {line}: t_ms {t_ms} goes backwards (previous {previous})")]
    OutOfOrder { line: usize, t_ms: u64, previous: u64 },
}

/// Parse a JSONL trace. Timestamps must be non-decreasing.
pub fn parse_trace(src: &str) -> Result<Vec<TraceEvent>, TraceError> {
    let mut events = Vec::new();
    let mut previous = 0u64;
    for (idx, raw) in src.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let event: TraceEvent = serde_json::from_str(line).map_err(|source| TraceError::Parse {
            line: idx + 1,
            source,
        })?;
        if event.t_ms() < previous {
            return Err(TraceError::OutOfOrder {
                line: idx + 1,
                t_ms: event.t_ms(),
                previous,
            });
        }
        previous = event.t_ms();
        events.push(event);
    }
    Ok(events)
}

pub fn read_trace(path: &Path) -> Result<Vec<TraceEvent>, TraceError> {
    let src = std::fs::read_to_string(path).map_err(|source| TraceError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let events = parse_trace(&src)?;
    tracing::debug!(path = %path.display(), events = events.len(), "trace loaded");
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
# recorded at 30 fps
{"kind":"frame","t_ms":0,"width":640,"height":480,"detections":[{"bbox":{"x":220,"y":120,"width":200,"height":240},"confidence":0.93,"landmarks":{"left_eye":[[280,200]],"right_eye":[[360,200]],"nose":[[320,240]],"mouth":[[320,290]]}}]}
{"kind":"tick","t_ms":16}
{"kind":"frame","t_ms":33,"width":640,"height":480}
{"kind":"manual","t_ms":40}
{"kind":"detector","t_ms":41,"ready":false}
"#;

    #[test]
    fn test_parse_sample() {
        let events = parse_trace(SAMPLE).unwrap();
        assert_eq!(events.len(), 5);
        assert_eq!(
            events[4],
            TraceEvent::Detector {
                t_ms: 41,
                ready: false
            }
        );
        assert_eq!(events[1], TraceEvent::Tick { t_ms: 16 });
        assert_eq!(events[3], TraceEvent::Manual { t_ms: 40 });

        let frame = events[0].detection_frame().unwrap();
        assert_eq!(frame.faces.len(), 1);
        assert!(frame.faces[0].is_facing_camera);

        let empty = events[2].detection_frame().unwrap();
        assert!(empty.is_empty());
        assert!(events[1].detection_frame().is_none());
    }

    #[test]
    fn test_parse_error_reports_line() {
        let src = "{\"kind\":\"tick\",\"t_ms\":0}\n{\"kind\":\"blink\"}\n";
        let err = parse_trace(src).unwrap_err();
        assert!(matches!(err, TraceError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_out_of_order() {
        let err = parse_trace("{\"kind\":\"tick\",\"t_ms\":50}\n{\"kind\":\"tick\",\"t_ms\":10}\n")
            .unwrap_err();
        assert!(matches!(
            err,
            TraceError::OutOfOrder {
                line: 2,
                t_ms: 10,
                previous: 50
            }
        ));
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_trace(Path::new("/nonexistent/trace.jsonl")).unwrap_err();
        assert!(matches!(err, TraceError::Io { .. }));
    }
}
