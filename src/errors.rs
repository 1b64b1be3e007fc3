use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use utoipa::ToSchema;

/// JSON body returned for every error response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Bad Request")
    pub error: String,
    /// Human-readable error description
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// ISO 8601 timestamp when the error occurred
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::error::DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Expected business outcome, not a fault: the pincode is outside the
    /// delivery area (or the lookup failed and we fail closed).
    #[error("Delivery is not available for pincode {0}")]
    NotServiceable(String),

    /// Missing or invalid server-side configuration (e.g. gateway
    /// credentials). Never retried and never shown verbatim to end users.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Payment gateway error: {0}")]
    PaymentGateway(String),

    /// The gateway-supplied signature did not match the recomputed HMAC.
    #[error("Payment signature verification failed")]
    SignatureMismatch,

    /// Payment was captured but the order rows could not be written. Carries
    /// the gateway ids so the payment can be reconciled manually.
    #[error("Order commit failed after captured payment (gateway order {gateway_order_id}, payment {gateway_payment_id}): {detail}")]
    OrderCommit {
        gateway_order_id: String,
        gateway_payment_id: String,
        detail: String,
    },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(errors.to_string())
    }
}

impl ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::ValidationError(_) | ServiceError::InvalidOperation(_) => {
                StatusCode::BAD_REQUEST
            }
            ServiceError::NotServiceable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::SignatureMismatch => StatusCode::UNAUTHORIZED,
            ServiceError::PaymentGateway(_) => StatusCode::BAD_GATEWAY,
            ServiceError::DatabaseError(_)
            | ServiceError::ConfigurationError(_)
            | ServiceError::OrderCommit { .. }
            | ServiceError::SerializationError(_)
            | ServiceError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show end users. Operator-facing detail stays in logs.
    fn user_message(&self) -> String {
        match self {
            ServiceError::ConfigurationError(_) => {
                "The service is misconfigured; please contact support".to_string()
            }
            ServiceError::DatabaseError(_) | ServiceError::InternalError(_) => {
                "An unexpected error occurred".to_string()
            }
            ServiceError::PaymentGateway(_) => {
                "The payment could not be initiated; please try again".to_string()
            }
            ServiceError::OrderCommit { .. } => {
                "Your payment was received but the order could not be recorded; please contact support"
                    .to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            ServiceError::SignatureMismatch => {
                // Candidate fraud/tampering signal, kept distinct from
                // ordinary request failures.
                warn!(target: "kirana_api::payments", "payment signature verification failed");
            }
            ServiceError::OrderCommit {
                gateway_order_id,
                gateway_payment_id,
                detail,
            } => {
                error!(
                    %gateway_order_id,
                    %gateway_payment_id,
                    %detail,
                    "order commit failed after captured payment; manual reconciliation required"
                );
            }
            ServiceError::ConfigurationError(detail) => {
                error!(%detail, "fatal configuration error");
            }
            _ if status.is_server_error() => {
                error!(error = %self, "request failed");
            }
            _ => {}
        }

        let body = ErrorResponse {
            error: status
                .canonical_reason()
                .unwrap_or("Internal Server Error")
                .to_string(),
            message: self.user_message(),
            details: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ServiceError::NotFound("order".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::SignatureMismatch.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ServiceError::NotServiceable("110001".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ServiceError::PaymentGateway("boom".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_operator_detail_not_leaked_to_users() {
        let err = ServiceError::ConfigurationError("GATEWAY_KEY_SECRET unset".into());
        assert!(!err.user_message().contains("GATEWAY_KEY_SECRET"));

        let err = ServiceError::DatabaseError(sea_orm::DbErr::Custom("secret dsn".into()));
        assert!(!err.user_message().contains("secret dsn"));
    }
}
