//! HTTP error mapping for the API layer.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{OrderError, PaymentError};
use engine::EngineError;
use serde_json::json;

/// API error wrapping engine failures with an HTTP status.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        let status = match &err {
            EngineError::Validation(_) | EngineError::ProductUnavailable(_) => {
                StatusCode::BAD_REQUEST
            }
            EngineError::OrderNotFound(_)
            | EngineError::ItemNotFound(_)
            | EngineError::PaymentNotFound(_) => StatusCode::NOT_FOUND,
            EngineError::Unauthorized(_) => StatusCode::FORBIDDEN,
            EngineError::Dependency(_) => StatusCode::SERVICE_UNAVAILABLE,
            EngineError::Gateway(_) => StatusCode::BAD_GATEWAY,
            EngineError::Order(order_err) => match order_err {
                OrderError::ItemNotFound { .. } => StatusCode::NOT_FOUND,
                OrderError::InvalidQuantity { .. }
                | OrderError::NoItems
                | OrderError::DiscountExceedsTotal { .. } => StatusCode::BAD_REQUEST,
                _ => StatusCode::CONFLICT,
            },
            EngineError::Payment(payment_err) => match payment_err {
                PaymentError::InvalidRefundAmount { .. }
                | PaymentError::RefundExceedsPayment { .. } => StatusCode::BAD_REQUEST,
                _ => StatusCode::CONFLICT,
            },
            EngineError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, message = %self.message, "request failed");
        }
        let body = json!({
            "success": false,
            "error": { "message": self.message },
        });
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{ItemId, Money, OrderId};
    use domain::OrderStatus;

    #[test]
    fn engine_errors_map_to_statuses() {
        let cases: Vec<(EngineError, StatusCode)> = vec![
            (
                EngineError::Validation("empty items".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                EngineError::ProductUnavailable("SKU-001: requested 5, available 2".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                EngineError::OrderNotFound(OrderId::new()),
                StatusCode::NOT_FOUND,
            ),
            (
                EngineError::Unauthorized("not the owner".into()),
                StatusCode::FORBIDDEN,
            ),
            (
                EngineError::Dependency("inventory offline".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                EngineError::Gateway("provider timeout".into()),
                StatusCode::BAD_GATEWAY,
            ),
            (
                EngineError::Order(OrderError::InvalidTransition {
                    from: OrderStatus::Delivered,
                    to: OrderStatus::Pending,
                }),
                StatusCode::CONFLICT,
            ),
            (
                EngineError::Order(OrderError::ItemNotFound {
                    item_id: ItemId::new(),
                }),
                StatusCode::NOT_FOUND,
            ),
            (
                EngineError::Order(OrderError::InvalidQuantity { quantity: 0 }),
                StatusCode::BAD_REQUEST,
            ),
            (
                EngineError::Payment(PaymentError::InvalidRefundAmount {
                    amount: Money::zero(),
                }),
                StatusCode::BAD_REQUEST,
            ),
            (
                EngineError::Payment(PaymentError::CannotRefund {
                    status: domain::PaymentStatus::Pending,
                }),
                StatusCode::CONFLICT,
            ),
        ];

        for (err, expected) in cases {
            let api_err = ApiError::from(err);
            assert_eq!(api_err.status, expected, "{}", api_err.message);
        }
    }
}
