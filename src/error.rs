use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

/// Failures reported by a record store.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[display(fmt = "record not found")]
    NotFound,
    /// Uniqueness violation, e.g. a second record for the same user and day.
    #[display(fmt = "record already exists")]
    Conflict,
    #[display(fmt = "store unavailable: {}", _0)]
    Unavailable(String),
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            // MySQL reports duplicate keys as SQLSTATE 23000
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23000") => {
                StoreError::Conflict
            }
            _ => StoreError::Unavailable(e.to_string()),
        }
    }
}

#[derive(Debug, Display)]
pub enum AppError {
    #[display(fmt = "{}", _0)]
    Validation(String),
    #[display(fmt = "{}", _0)]
    NotFound(String),
    #[display(fmt = "{}", _0)]
    Forbidden(String),
    #[display(fmt = "{}", _0)]
    Unauthorized(String),
    #[display(fmt = "Service temporarily unavailable, please try again")]
    Store(StoreError),
}

impl std::error::Error for AppError {}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        AppError::Forbidden(message.into())
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => AppError::NotFound("Record not found".to_string()),
            other => AppError::Store(other),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let AppError::Store(e) = self {
            tracing::error!(error = %e, "Record store failure");
        }

        HttpResponse::build(self.status_code()).json(json!({
            "message": self.to_string()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let e: AppError = StoreError::NotFound.into();
        assert_eq!(e.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn store_failure_is_retryable_and_hides_details() {
        let e: AppError = StoreError::Unavailable("connection reset".into()).into();
        assert_eq!(e.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(!e.to_string().contains("connection reset"));
    }

    #[test]
    fn validation_is_bad_request() {
        let e = AppError::validation("No active check-in found for today");
        assert_eq!(e.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(e.to_string(), "No active check-in found for today");
    }

    #[test]
    fn row_not_found_becomes_not_found() {
        assert_eq!(StoreError::from(sqlx::Error::RowNotFound), StoreError::NotFound);
    }
}
