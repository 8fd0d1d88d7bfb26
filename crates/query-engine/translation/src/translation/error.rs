//! Errors for plan validation and translation.

use thiserror::Error;

/// A type for translation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("resource '{got}' is not allowed, expected one of: {}", allowed.join("|"))]
    ResourceNotAllowed { got: String, allowed: Vec<String> },
    #[error("no valid fields to select")]
    EmptySelection,
    #[error("invalid plan: {0}")]
    InvalidPlan(String),
}

impl Error {
    /// Whether the caller should be asked to rephrase rather than be shown a failure.
    pub fn needs_clarification(&self) -> bool {
        match self {
            Error::ResourceNotAllowed { .. } | Error::EmptySelection => true,
            Error::InvalidPlan(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_not_allowed_lists_allowed_resources() {
        let err = Error::ResourceNotAllowed {
            got: "orders".to_string(),
            allowed: vec!["Product".to_string(), "Coupon".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "resource 'orders' is not allowed, expected one of: Product|Coupon"
        );
        assert!(err.needs_clarification());
        assert!(!Error::InvalidPlan("not an object".to_string()).needs_clarification());
    }
}
