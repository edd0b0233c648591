//! JSON error responses.
//!
//! Every handler error is rendered as `{"error": CODE, "message": ...}`.
//! Server-side failures are logged with their detail and answered with a
//! generic message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, SqlErr};
use serde_json::json;
use tracing::error;

use rimba_core::access::AccessError;
use rimba_core::audit::ConfirmationError;
use rimba_core::console::ConsoleError;
use rimba_core::payee::PayeeError;
use rimba_core::spending::SpendingError;
use rimba_core::workflow::WorkflowError;
use rimba_db::repositories::{
    approval_request::ApprovalRequestError, approval_workflow::ApprovalWorkflowError,
    bank_account::BankAccountError, spending_limit::SpendingLimitError,
    transaction::TransactionError,
};
use rimba_shared::AppError;

/// An error ready to be sent to the client.
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    /// Creates an error from a numeric status.
    #[must_use]
    pub fn new(status: u16, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            code,
            message: message.into(),
        }
    }

    /// 400 with a validation code.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(400, "VALIDATION_ERROR", message)
    }

    /// 404 for a missing resource.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(404, "NOT_FOUND", message)
    }

    /// 500 with detail kept for the logs only.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(500, "INTERNAL_ERROR", message)
    }

    /// The HTTP status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// The machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = if self.status.is_server_error() {
            error!(code = self.code, error = %self.message, "Request failed");
            "An internal error occurred".to_string()
        } else {
            self.message
        };

        (
            self.status,
            Json(json!({ "error": self.code, "message": message })),
        )
            .into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        Self::new(e.status_code(), e.error_code(), e.to_string())
    }
}

macro_rules! impl_from_domain_error {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for ApiError {
                fn from(e: $ty) -> Self {
                    Self::new(e.status_code(), e.error_code(), e.to_string())
                }
            }
        )+
    };
}

impl_from_domain_error!(
    AccessError,
    SpendingError,
    WorkflowError,
    PayeeError,
    ConsoleError,
    ConfirmationError,
);

impl From<DbErr> for ApiError {
    fn from(e: DbErr) -> Self {
        match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                Self::new(409, "CONFLICT", format!("Duplicate entry: {detail}"))
            }
            Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
                Self::new(409, "CONFLICT", format!("Row is still referenced: {detail}"))
            }
            _ => Self::new(500, "DATABASE_ERROR", e.to_string()),
        }
    }
}

impl From<SpendingLimitError> for ApiError {
    fn from(e: SpendingLimitError) -> Self {
        match e {
            SpendingLimitError::NotFound(_) => Self::not_found(e.to_string()),
            SpendingLimitError::Database(db) => db.into(),
            SpendingLimitError::Invalid(inner) => inner.into(),
            SpendingLimitError::Corrupt { .. } => Self::internal(e.to_string()),
        }
    }
}

impl From<ApprovalWorkflowError> for ApiError {
    fn from(e: ApprovalWorkflowError) -> Self {
        match e {
            ApprovalWorkflowError::NotFound(_) => Self::not_found(e.to_string()),
            ApprovalWorkflowError::Database(db) => db.into(),
            ApprovalWorkflowError::Invalid(inner) => inner.into(),
            ApprovalWorkflowError::Corrupt { .. } => Self::internal(e.to_string()),
        }
    }
}

impl From<BankAccountError> for ApiError {
    fn from(e: BankAccountError) -> Self {
        match e {
            BankAccountError::NotFound(_) => Self::not_found(e.to_string()),
            BankAccountError::Database(db) => db.into(),
            BankAccountError::Invalid(inner) => inner.into(),
            BankAccountError::Corrupt { .. } => Self::internal(e.to_string()),
        }
    }
}

impl From<ApprovalRequestError> for ApiError {
    fn from(e: ApprovalRequestError) -> Self {
        match e {
            ApprovalRequestError::NotFound(_) => Self::not_found(e.to_string()),
            ApprovalRequestError::Conflict(_) => Self::new(409, "CONFLICT", e.to_string()),
            ApprovalRequestError::Database(db) => db.into(),
            ApprovalRequestError::Corrupt { .. } => Self::internal(e.to_string()),
        }
    }
}

impl From<TransactionError> for ApiError {
    fn from(e: TransactionError) -> Self {
        match e {
            TransactionError::NotFound(_) => Self::not_found(e.to_string()),
            TransactionError::Database(db) => db.into(),
            TransactionError::SubjectMismatch { .. } | TransactionError::Corrupt { .. } => {
                Self::internal(e.to_string())
            }
        }
    }
}
