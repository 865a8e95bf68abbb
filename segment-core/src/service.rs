//! External service boundary
//!
//! The engine never performs I/O. Each asynchronous round trip is modeled
//! as a typed request value handed to the host, which later feeds the
//! typed response (or a transport error) back through the session's
//! `apply_*` entry points. Every request snapshots the target it was
//! issued for; responses echo the target id, and the session discards any
//! response whose target no longer matches.

use crate::geojson::{Geometry, Position};
use crate::label::LabelType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of the annotation target a session is editing.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(pub String);

impl TargetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Transport-level failure of a round trip.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServiceError {
    /// The request timed out. Soft for lasso steps, hard elsewhere.
    Timeout,
    /// Any other transport or server failure.
    Failed(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Timeout => write!(f, "request timed out"),
            ServiceError::Failed(message) => write!(f, "request failed: {message}"),
        }
    }
}

impl std::error::Error for ServiceError {}

/// Asks the service to confirm a lasso session may begin near the
/// coordinate.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LassoStartRequest {
    pub coordinate: Position,
    pub crop_size: f64,
    pub target_id: TargetId,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LassoStartResponse {
    pub target_id: TargetId,
}

/// Asks for a snapped edge geometry toward the coordinate (magnetic
/// mode).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LassoStepRequest {
    pub coordinate: Position,
    pub target_id: TargetId,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LassoStepResponse {
    /// A `LineString` tracing the suggested edge.
    pub geometry: Geometry,
    pub target_id: TargetId,
}

/// One label point on the wire.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LabelPointDto {
    pub coordinate: Position,
    #[serde(rename = "type")]
    pub label_type: LabelType,
}

/// Submits the collected label points for full-region inference.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LabelsRequest {
    pub points: Vec<LabelPointDto>,
    pub target_id: TargetId,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LabelsResponse {
    /// A `MultiPolygon` covering the inferred region.
    pub geometry: Geometry,
    pub target_id: TargetId,
}

/// Asks for the mean color under the composite. Cosmetic only.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MeanColorRequest {
    pub geometry: Geometry,
    pub target_id: TargetId,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MeanColorResponse {
    /// Hue, saturation, lightness.
    pub color: [f64; 3],
    pub target_id: TargetId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_shape() {
        let request = LassoStartRequest {
            coordinate: [10.0, 20.0],
            crop_size: 1024.0,
            target_id: TargetId::new("42"),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["coordinate"][0], 10.0);
        assert_eq!(json["crop_size"], 1024.0);
        assert_eq!(json["target_id"], "42");
    }

    #[test]
    fn test_label_point_type_serializes_lowercase() {
        let dto = LabelPointDto {
            coordinate: [0.0, 0.0],
            label_type: LabelType::Negative,
        };
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["type"], "negative");
    }

    #[test]
    fn test_response_parses() {
        let json = r#"{"geometry":{"type":"MultiPolygon","coordinates":[]},"target_id":"7"}"#;
        let response: LabelsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.target_id, TargetId::new("7"));
    }

    #[test]
    fn test_service_error_display() {
        assert_eq!(ServiceError::Timeout.to_string(), "request timed out");
        assert!(ServiceError::Failed("boom".into())
            .to_string()
            .contains("boom"));
    }
}
