use thiserror::Error;
use uuid::Uuid;

use crate::models::pointsmodel::RedemptionStatus;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Insufficient points: required {required}, available {available}")]
    InsufficientBalance { required: i64, available: i64 },

    #[error("Invalid referral code: {0}")]
    InvalidReferralCode(String),

    #[error("Invalid redemption state transition: {from:?} -> {to:?}")]
    InvalidStateTransition {
        from: RedemptionStatus,
        to: RedemptionStatus,
    },

    #[error("User {0} not found")]
    UserNotFound(Uuid),

    #[error("Item {0} not found")]
    ItemNotFound(Uuid),

    #[error("Item {0} is not available for redemption")]
    ItemNotRedeemable(Uuid),

    #[error("Redemption {0} not found")]
    RedemptionNotFound(Uuid),

    #[error("Transaction {0} not found")]
    TransactionNotFound(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<String> for ServiceError {
    fn from(err: String) -> Self {
        ServiceError::Validation(err)
    }
}

impl ServiceError {
    /// Serialization failures and deadlocks are infrastructure noise from
    /// concurrent balance mutations; everything else reaches the caller as-is.
    pub fn is_retryable(&self) -> bool {
        match self {
            ServiceError::Database(sqlx::Error::Database(db_err)) => {
                matches!(db_err.code().as_deref(), Some("40001") | Some("40P01"))
            }
            ServiceError::Database(sqlx::Error::PoolTimedOut) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_errors_are_not_retryable() {
        assert!(!ServiceError::InsufficientBalance {
            required: 60,
            available: 40
        }
        .is_retryable());
        assert!(!ServiceError::InvalidReferralCode("expired".to_string()).is_retryable());
        assert!(!ServiceError::InvalidStateTransition {
            from: RedemptionStatus::Fulfilled,
            to: RedemptionStatus::Pending,
        }
        .is_retryable());
        assert!(!ServiceError::UserNotFound(Uuid::nil()).is_retryable());
    }

    #[test]
    fn pool_timeout_is_retryable() {
        assert!(ServiceError::Database(sqlx::Error::PoolTimedOut).is_retryable());
    }

    #[test]
    fn row_not_found_is_not_retryable() {
        assert!(!ServiceError::Database(sqlx::Error::RowNotFound).is_retryable());
    }
}
