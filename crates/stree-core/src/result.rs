//! Result type alias for driver operations

use crate::error::StreeError;

/// Standard Result type for driver operations
pub type Result<T> = std::result::Result<T, StreeError>;

/// Extension trait for Result to provide additional convenience methods
pub trait ResultExt<T> {
    /// Convert an error to `Ok(None)` if a batch run can continue past it
    fn recoverable(self) -> Result<Option<T>>;

    /// Log the error and continue with None
    fn log_and_continue(self) -> Option<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn recoverable(self) -> Result<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_recoverable() => {
                tracing::warn!("Recoverable error: {}", err);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn log_and_continue(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                if err.is_recoverable() {
                    tracing::warn!("Continuing after error: {}", err);
                } else {
                    tracing::error!("Fatal error: {}", err);
                }
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;

    #[test]
    fn parse_failures_are_skipped() {
        let result: Result<u32> = Err(ParseError::new("bad", 1, 0).into());
        assert!(matches!(result.recoverable(), Ok(None)));
    }

    #[test]
    fn config_failures_propagate() {
        let result: Result<u32> = Err(StreeError::config_error("nope"));
        assert!(result.recoverable().is_err());
    }
}
