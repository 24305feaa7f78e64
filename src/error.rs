// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Delivery Economics Engine - Error Taxonomy

use std::fmt;

use crate::validation::ValidationError;

/// Errors surfaced to callers of the engine's boundary operations.
///
/// Validation problems never reach the aggregation stage and per-order save
/// failures are absorbed inside the simulator, so anything else arriving
/// here is reported as `Internal` with its message.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl EngineError {
    /// HTTP-style status class for outer surfaces.
    pub fn status(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::NotFound(_) => 404,
            Self::Internal(_) => 500,
        }
    }

    /// Internal failure of a simulate call, rolled back before it surfaces.
    pub fn simulation_failed(cause: impl fmt::Display) -> Self {
        Self::Internal(format!("Simulation failed: {cause}"))
    }
}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;

    #[test]
    fn status_classes() {
        assert_eq!(EngineError::BadRequest("x".into()).status(), 400);
        assert_eq!(EngineError::NotFound("x".into()).status(), 404);
        assert_eq!(EngineError::Internal("x".into()).status(), 500);
    }

    #[test]
    fn simulation_failures_carry_cause() {
        let err = EngineError::simulation_failed(StoreError::NoTransaction);
        assert_eq!(err.status(), 500);
        assert_eq!(err.to_string(), "Simulation failed: no open transaction");
    }

    #[test]
    fn validation_maps_to_bad_request() {
        let err: EngineError = ValidationError::MissingParameter("num_drivers").into();
        assert_eq!(err.status(), 400);
    }
}
