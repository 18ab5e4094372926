use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use shared::ReadinessState;
use thiserror::Error;

/// Refusals and failures of the query endpoint.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Database is in broken state, try restart app")]
    Broken,

    #[error("Database is not ready, try later")]
    NotReady,

    #[error("Database is filling, try later")]
    Filling,

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl ApiError {
    /// The refusal for a readiness other than `ready`.
    pub fn from_readiness(state: ReadinessState) -> Option<Self> {
        match state {
            ReadinessState::Ready => None,
            ReadinessState::Unknown => Some(Self::NotReady),
            ReadinessState::Filling => Some(Self::Filling),
            ReadinessState::Error => Some(Self::Broken),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Broken | Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotReady | Self::Filling => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Database(e) = &self {
            tracing::error!("Query failed: {}", e);
        }
        let body = json!({ "error": self.to_string() });
        (self.status(), axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readiness_mapping() {
        assert!(ApiError::from_readiness(ReadinessState::Ready).is_none());
        assert!(matches!(
            ApiError::from_readiness(ReadinessState::Unknown),
            Some(ApiError::NotReady)
        ));
        assert!(matches!(
            ApiError::from_readiness(ReadinessState::Filling),
            Some(ApiError::Filling)
        ));
        assert!(matches!(
            ApiError::from_readiness(ReadinessState::Error),
            Some(ApiError::Broken)
        ));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::Broken.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ApiError::NotReady.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(ApiError::Filling.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            ApiError::Database(sea_orm::DbErr::Custom("x".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
