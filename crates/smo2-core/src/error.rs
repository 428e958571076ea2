//! Error types for SmO2 threshold analysis
//!
//! Provides a unified error type for all smo2 crates. Every variant is
//! terminal for an analysis call: nothing is retried and no partial result is
//! returned.

use thiserror::Error;

/// Core error type for threshold analysis
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Series is shorter than the operation requires (e.g. smoothing window)
    #[error("Insufficient data: expected at least {expected} samples, got {actual}")]
    InsufficientData { expected: usize, actual: usize },

    /// A slope-based policy found no qualifying index
    #[error("No threshold found for {label}: {reason}")]
    NoThresholdFound { label: String, reason: String },

    /// Change-point detection produced fewer breakpoints than requested
    #[error(
        "Insufficient breakpoints: expected {expected}, detected {detected}; \
         lower the penalty or the minimum segment length"
    )]
    InsufficientBreakpoints { expected: usize, detected: usize },

    /// A required input channel was not supplied
    #[error("Missing channel: {0}")]
    MissingChannel(String),

    /// Invalid parameter provided to a function
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Numerical computation error
    #[error("Computation error: {0}")]
    Computation(String),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an error for a threshold that could not be located
    pub fn no_threshold(label: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NoThresholdFound {
            label: label.into(),
            reason: reason.into(),
        }
    }

    /// Create an error for a channel the caller did not provide
    pub fn missing_channel(name: &str) -> Self {
        Self::MissingChannel(format!("required channel '{name}' was not provided"))
    }

    /// Create an error for size mismatch
    pub fn size_mismatch(expected: usize, actual: usize, context: &str) -> Self {
        Self::InvalidInput(format!(
            "Size mismatch in {context}: expected {expected}, got {actual}"
        ))
    }

    /// Create an error for NaN/Inf values
    pub fn non_finite(context: &str) -> Self {
        Self::Computation(format!("{context} contains NaN or infinite values"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InsufficientData { expected: 11, actual: 5 };
        assert_eq!(
            err.to_string(),
            "Insufficient data: expected at least 11 samples, got 5"
        );

        let err = Error::no_threshold("S1", "slope never drops below -0.03");
        assert_eq!(
            err.to_string(),
            "No threshold found for S1: slope never drops below -0.03"
        );

        let err = Error::InsufficientBreakpoints { expected: 3, detected: 1 };
        assert!(err.to_string().contains("expected 3, detected 1"));
        assert!(err.to_string().contains("lower the penalty"));

        let err = Error::missing_channel("heart_rate");
        assert_eq!(
            err.to_string(),
            "Missing channel: required channel 'heart_rate' was not provided"
        );
    }

    #[test]
    fn test_error_helper_functions() {
        let err = Error::size_mismatch(100, 50, "heart rate channel");
        assert_eq!(
            err.to_string(),
            "Invalid input: Size mismatch in heart rate channel: expected 100, got 50"
        );

        let err = Error::non_finite("smoothed curve");
        assert_eq!(
            err.to_string(),
            "Computation error: smoothed curve contains NaN or infinite values"
        );
    }

    #[test]
    fn test_error_patterns() {
        fn check_window(data: &[f64], window: usize) -> Result<()> {
            if data.len() < window {
                return Err(Error::InsufficientData {
                    expected: window,
                    actual: data.len(),
                });
            }
            Ok(())
        }

        assert!(check_window(&[1.0; 5], 11).is_err());
        assert!(check_window(&[1.0; 11], 11).is_ok());
    }
}
