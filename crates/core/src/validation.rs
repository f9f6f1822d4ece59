//! Settings validation
//!
//! A small fluent validator that collects every violation instead of
//! stopping at the first, so a bad settings file is reported in one go.
//!
//! # Example
//!
//! ```rust
//! use webpopt_core::validation::Validator;
//!
//! let result = Validator::new()
//!     .range("conversion.quality", 150, 1, 100)
//!     .one_of("logging.level", "loud", &["error", "warn", "info", "debug", "trace"])
//!     .validate();
//!
//! assert_eq!(result.errors().len(), 2);
//! ```

use crate::error::{Error, ErrorCode, Result};
use serde::{Deserialize, Serialize};

/// Validation error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    /// Field that failed validation
    pub field: String,
    /// Error message
    pub message: String,
    /// Error code
    pub code: String,
    /// Expected value (if applicable)
    pub expected: Option<String>,
    /// Actual value (if applicable)
    pub actual: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    errors: Vec<ValidationError>,
    warnings: Vec<ValidationError>,
}

impl ValidationResult {
    /// Create a new empty result
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get all errors
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Get all warnings
    pub fn warnings(&self) -> &[ValidationError] {
        &self.warnings
    }

    /// Add an error
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Add a warning
    pub fn add_warning(&mut self, warning: ValidationError) {
        self.warnings.push(warning);
    }

    /// Merge another result into this one
    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// Convert to Result type
    pub fn to_result(self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            let messages: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
            Err(Error::new(
                ErrorCode::ConfigValidationError,
                format!("Validation failed: {}", messages.join("; ")),
            ))
        }
    }
}

/// Fluent validator builder
pub struct Validator {
    result: ValidationResult,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    /// Create a new validator
    pub fn new() -> Self {
        Self {
            result: ValidationResult::new(),
        }
    }

    /// Validate that a field is not empty
    #[must_use]
    pub fn required(mut self, field: &str, value: &str) -> Self {
        if value.trim().is_empty() {
            self.result.add_error(ValidationError {
                field: field.to_string(),
                message: "Field is required".to_string(),
                code: "REQUIRED".to_string(),
                expected: Some("non-empty value".to_string()),
                actual: Some("empty".to_string()),
            });
        }
        self
    }

    /// Validate that a value is in a list of allowed values
    #[must_use]
    pub fn one_of(mut self, field: &str, value: &str, allowed: &[&str]) -> Self {
        if !allowed.contains(&value) {
            self.result.add_error(ValidationError {
                field: field.to_string(),
                message: format!("Must be one of: {}", allowed.join(", ")),
                code: "ONE_OF".to_string(),
                expected: Some(allowed.join(", ")),
                actual: Some(value.to_string()),
            });
        }
        self
    }

    /// Validate a numeric range
    #[must_use]
    pub fn range<T: PartialOrd + std::fmt::Display>(
        mut self,
        field: &str,
        value: T,
        min: T,
        max: T,
    ) -> Self {
        if value < min || value > max {
            self.result.add_error(ValidationError {
                field: field.to_string(),
                message: format!("Must be between {min} and {max}"),
                code: "RANGE".to_string(),
                expected: Some(format!("{min} - {max}")),
                actual: Some(value.to_string()),
            });
        }
        self
    }

    /// Validate that a value is strictly positive
    #[must_use]
    pub fn positive(mut self, field: &str, value: u64) -> Self {
        if value == 0 {
            self.result.add_error(ValidationError {
                field: field.to_string(),
                message: "Must be greater than zero".to_string(),
                code: "POSITIVE".to_string(),
                expected: Some("> 0".to_string()),
                actual: Some("0".to_string()),
            });
        }
        self
    }

    /// Add a warning (non-blocking)
    #[must_use]
    pub fn warn_if(mut self, field: &str, condition: bool, message: &str) -> Self {
        if condition {
            self.result.add_warning(ValidationError {
                field: field.to_string(),
                message: message.to_string(),
                code: "WARNING".to_string(),
                expected: None,
                actual: None,
            });
        }
        self
    }

    /// Complete validation and return result
    pub fn validate(self) -> ValidationResult {
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_required_validation() {
        let result = Validator::new().required("store.path", "  ").validate();
        assert!(!result.is_valid());
        assert_eq!(result.errors()[0].code, "REQUIRED");
    }

    #[test]
    fn test_one_of_validation() {
        let result = Validator::new()
            .one_of("logging.level", "verbose", &["info", "debug"])
            .validate();
        assert!(!result.is_valid());
        assert_eq!(result.errors()[0].code, "ONE_OF");
    }

    #[test]
    fn test_range_validation() {
        let result = Validator::new().range("quality", 150, 1, 100).validate();
        assert!(!result.is_valid());
        assert_eq!(result.errors()[0].code, "RANGE");
        assert_eq!(result.errors()[0].actual.as_deref(), Some("150"));
    }

    #[test]
    fn test_range_inclusive_bounds() {
        let result = Validator::new()
            .range("quality", 1, 1, 100)
            .range("quality", 100, 1, 100)
            .validate();
        assert!(result.is_valid());
    }

    #[test]
    fn test_positive_validation() {
        let result = Validator::new().positive("max_width", 0).validate();
        assert_eq!(result.errors()[0].code, "POSITIVE");
        assert!(Validator::new().positive("max_width", 1).validate().is_valid());
    }

    #[test]
    fn test_warnings_do_not_fail() {
        let result = Validator::new()
            .warn_if("security.nonce_secret", true, "Using a generated secret")
            .validate();
        assert!(result.is_valid());
        assert_eq!(result.warnings().len(), 1);
    }

    #[test]
    fn test_to_result_joins_messages() {
        let err = Validator::new()
            .range("quality", 0, 1, 100)
            .positive("max_width", 0)
            .validate()
            .to_result()
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigValidationError);
        assert!(err.message.contains("quality"));
        assert!(err.message.contains("max_width"));
    }

    proptest! {
        #[test]
        fn prop_range_accepts_exactly_the_bounds(value in -50i64..200) {
            let result = Validator::new().range("quality", value, 1, 100).validate();
            prop_assert_eq!(result.is_valid(), (1..=100).contains(&value));
        }

        #[test]
        fn prop_positive_rejects_only_zero(value in 0u64..1_000) {
            let result = Validator::new().positive("max_width", value).validate();
            prop_assert_eq!(result.is_valid(), value > 0);
        }
    }
}
