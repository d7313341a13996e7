use std::fmt;

/// Represents the different types of errors that can occur in the email classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifierError {
    /// The statistical fallback was needed but no transformer/predictor pair was loaded
    ArtifactUnavailable,
    /// Error occurred during the build phase
    BuildError(String),
    /// Error occurred while making predictions
    PredictionError(String),
    /// Error occurred due to invalid input parameters or malformed artifacts
    ValidationError(String),
}

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ArtifactUnavailable => write!(f, "Classifier unavailable: model artifacts not loaded"),
            Self::BuildError(msg) => write!(f, "Build error: {}", msg),
            Self::PredictionError(msg) => write!(f, "Prediction error: {}", msg),
            Self::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for ClassifierError {}
