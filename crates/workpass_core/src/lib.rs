pub mod categorize;
pub mod chunking;
pub mod config;
pub mod domain;
pub mod error;
pub mod ingest;
pub mod metadata;
pub mod normalize;
pub mod process;

#[cfg(test)]
mod tests {
    use super::error::{codes, AppError};

    #[test]
    fn app_error_is_structured() {
        let err = AppError::new(codes::AI_RATE_LIMITED, "slow down")
            .with_details("status=429")
            .with_retryable(true);
        assert_eq!(err.code, "AI_RATE_LIMITED");
        assert_eq!(err.message, "slow down");
        assert!(err.retryable);
        assert!(err.is(codes::AI_RATE_LIMITED));
        assert_eq!(err.to_string(), "[AI_RATE_LIMITED] slow down (status=429)");
    }
}
