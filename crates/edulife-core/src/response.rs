//! The `{success, data, message}` response envelope.
//!
//! Every API response uses this shape. The transport layer wraps service
//! results with [`ApiResponse::ok`] and converts an
//! [`AppError`](crate::AppError) with [`ApiResponse::error`], pairing it
//! with the error's HTTP status.

use serde::Serialize;

use crate::AppError;

#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(err: &AppError) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(err.public_message()),
        }
    }
}
