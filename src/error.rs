use crate::gacha::RandomError;
use crate::models::ApiError;
use actix_web::{HttpResponse, ResponseError};
use sea_orm::DbErr;
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Banner not found: {0}")]
    BannerNotFound(String),

    #[error("Banner has not started yet: {0}")]
    BannerNotStarted(String),

    #[error("Banner has expired: {0}")]
    BannerExpired(String),

    #[error("Banner is inactive: {0}")]
    BannerInactive(String),

    #[error("Insufficient balance: need {required}, have {available}")]
    InsufficientBalance { required: i64, available: i64 },

    #[error("Insufficient stardust: need {required}, have {available}")]
    InsufficientStardust { required: i64, available: i64 },

    #[error("Purchase limit reached for {0}")]
    PurchaseLimitReached(String),

    #[error("Request with this idempotency key is already in flight")]
    AlreadyInFlight,

    #[error("Pool is empty: {0}")]
    PoolEmpty(String),

    #[error("Delivery conflict: {0}")]
    DeliveryConflict(String),

    #[error("Randomness error: {0}")]
    RandomError(#[from] RandomError),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl AppError {
    /// 稳定的错误码, 供客户端区分错误种类
    pub fn code(&self) -> &'static str {
        match self {
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Forbidden => "FORBIDDEN",
            AppError::BannerNotFound(_) => "BANNER_NOT_FOUND",
            AppError::BannerNotStarted(_) => "BANNER_NOT_STARTED",
            AppError::BannerExpired(_) => "BANNER_EXPIRED",
            AppError::BannerInactive(_) => "BANNER_INACTIVE",
            AppError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            AppError::InsufficientStardust { .. } => "INSUFFICIENT_STARDUST",
            AppError::PurchaseLimitReached(_) => "PURCHASE_LIMIT_REACHED",
            AppError::AlreadyInFlight => "ALREADY_IN_FLIGHT",
            AppError::PoolEmpty(_) => "POOL_EMPTY",
            AppError::DeliveryConflict(_) => "DELIVERY_CONFLICT",
            AppError::RandomError(_)
            | AppError::ConfigError(_)
            | AppError::InternalError(_)
            | AppError::SerdeJsonError(_) => "INTERNAL_ERROR",
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        use actix_web::http::StatusCode;

        let (status_code, message) = match self {
            AppError::ValidationError(msg) => {
                log::warn!("Validation error: {msg}");
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            AppError::NotFound(msg) | AppError::BannerNotFound(msg) => {
                (StatusCode::NOT_FOUND, msg.clone())
            }
            AppError::Forbidden => {
                log::warn!("Forbidden access");
                (StatusCode::FORBIDDEN, "Forbidden".to_string())
            }
            AppError::BannerNotStarted(_)
            | AppError::BannerExpired(_)
            | AppError::BannerInactive(_)
            | AppError::InsufficientBalance { .. }
            | AppError::InsufficientStardust { .. }
            | AppError::PurchaseLimitReached(_)
            | AppError::AlreadyInFlight
            | AppError::DeliveryConflict(_) => {
                log::warn!("Request conflict: {self}");
                (StatusCode::CONFLICT, self.to_string())
            }
            AppError::PoolEmpty(msg) => {
                log::error!("Pool empty: {msg}");
                (StatusCode::SERVICE_UNAVAILABLE, self.to_string())
            }
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            _ => {
                log::error!("Internal error: {self}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let error = ApiError {
            code: self.code().to_string(),
            message,
        };
        HttpResponse::build(status_code).json(json!({
            "success": false,
            "error": error
        }))
    }
}
