use serde::Serialize;

use crate::Category;

mod error;
mod features;
mod keywords;
mod pipeline;
mod predictor;
pub mod builder;
mod utils;

pub use error::ClassifierError;
pub use features::{FeatureTransformer, Norm, TfidfVectorizer};
pub use keywords::{classify_heuristic, KeywordRule, KeywordSet};
pub use pipeline::{classify_model, ClassificationResult, Classifier, Decision, DecisionSource, ModelArtifacts};
pub use predictor::{LinearModel, Predictor};
pub use builder::ClassifierBuilder;

/// Information about the current state and configuration of a classifier
#[derive(Debug, Clone, Serialize)]
pub struct ClassifierInfo {
    /// Keyword rule categories, highest priority first
    pub priority: Vec<Category>,
    /// Number of keywords per rule, in priority order
    pub keyword_counts: Vec<(Category, usize)>,
    /// Whether the statistical fallback is available
    pub artifacts_loaded: bool,
    /// Width of the model's feature vectors
    pub num_features: Option<usize>,
    /// Categories the model can predict
    pub model_classes: Vec<Category>,
}
