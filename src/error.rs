use thiserror::Error;

/// Root error type for every operation that talks to an upstream source or
/// runs a pass prediction.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransitError {
    /// A required setting or secret is missing. Raised before any network call.
    #[error("ConfigurationError: {0}")]
    Configuration(String),
    /// Upstream answered with a non-success status, or could not be reached.
    #[error("APIError: {0}")]
    Api(String),
    /// Upstream answered successfully but the answer is empty.
    #[error("NoDataFoundError: {0}")]
    NoDataFound(String),
    /// The element set could not be parsed or propagated.
    #[error("PropagationError: {0}")]
    Propagation(String),
}

impl TransitError {
    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            TransitError::Configuration(_) => "configuration_error",
            TransitError::Api(_) => "api_error",
            TransitError::NoDataFound(_) => "no_data_found",
            TransitError::Propagation(_) => "propagation_error",
        }
    }
}

pub type TransitResult<T> = Result<T, TransitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_kind_prefix() {
        let err = TransitError::NoDataFound("No satellite found for NORAD ID 99999".into());
        assert_eq!(
            err.to_string(),
            "NoDataFoundError: No satellite found for NORAD ID 99999"
        );
        assert_eq!(err.kind(), "no_data_found");
    }
}
