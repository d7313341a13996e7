//! A thread-safe hybrid email triage classifier.
//!
//! Emails are sorted into [`Category::Urgent`], [`Category::Financial`],
//! [`Category::Hr`] or [`Category::General`]. Keyword rules are checked first,
//! in priority order (Urgent, then Financial, then HR); the first rule with a
//! matching keyword decides. When no rule matches, a TF-IDF vectorizer and
//! linear model trained offline make the call. If those artifacts could not be
//! loaded, inconclusive emails yield [`ClassifierError::ArtifactUnavailable`]
//! instead of a guessed category.
//!
//! # Basic Usage
//!
//! ```rust
//! use email_triage::{Category, Classifier, ClassifierError};
//!
//! let classifier = Classifier::builder().build();
//!
//! assert_eq!(classifier.classify("Please review the invoice"), Ok(Category::Financial));
//! assert_eq!(classifier.classify("Updated leave policies"), Ok(Category::Hr));
//! assert_eq!(classifier.classify("let's grab lunch"), Err(ClassifierError::ArtifactUnavailable));
//! ```
//!
//! # Loading a model
//!
//! ```rust,no_run
//! use email_triage::{ArtifactStore, Classifier};
//!
//! let store = ArtifactStore::new_default();
//! let classifier = Classifier::builder()
//!     .with_optional_artifacts(store.load_or_absent())
//!     .build();
//!
//! match classifier.classify("let's grab lunch") {
//!     Ok(category) => println!("Category: {}", category),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

pub mod artifact_store;
pub mod category;
pub mod classifier;
pub mod triage;

pub use artifact_store::{ArtifactError, ArtifactManifest, ArtifactStore, ARTIFACTS_ENV_VAR};
pub use category::Category;
pub use classifier::{
    classify_heuristic, classify_model, ClassificationResult, Classifier, ClassifierBuilder, ClassifierError,
    ClassifierInfo, Decision, DecisionSource, FeatureTransformer, KeywordRule, KeywordSet, LinearModel,
    ModelArtifacts, Norm, Predictor, TfidfVectorizer,
};
pub use triage::Triage;

pub fn init_logger() {
    env_logger::init();
}
