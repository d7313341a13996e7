use log::info;

use super::error::ClassifierError;
use super::keywords::KeywordSet;
use super::pipeline::{Classifier, ModelArtifacts};
use crate::Category;

/// A builder for constructing a Classifier with a fluent interface.
#[derive(Default, Debug)]
pub struct ClassifierBuilder {
    keywords: Option<KeywordSet>,
    artifacts: Option<ModelArtifacts>,
}

impl ClassifierBuilder {
    /// Creates a new builder using the built-in keyword rules and no model
    ///
    /// # Example
    /// ```
    /// use email_triage::ClassifierBuilder;
    ///
    /// let classifier = ClassifierBuilder::new().build();
    /// assert!(!classifier.has_artifacts());
    /// ```
    pub fn new() -> Self {
        Self {
            keywords: None,
            artifacts: None,
        }
    }

    /// Replaces the built-in keyword rules
    pub fn with_keywords(mut self, keywords: KeywordSet) -> Self {
        self.keywords = Some(keywords);
        self
    }

    /// Replaces the built-in keyword rules with `(category, keywords)` pairs
    /// listed in priority order.
    ///
    /// # Returns
    /// * `Result<Self, ClassifierError>` - The builder instance if successful, or an error if:
    ///   - `General` is used as a rule
    ///   - A category appears more than once
    ///   - A rule has no keywords, or a keyword is empty
    ///
    /// # Example
    /// ```
    /// use email_triage::{Category, ClassifierBuilder};
    ///
    /// let classifier = ClassifierBuilder::new()
    ///     .with_keyword_rules(vec![
    ///         (Category::Urgent, vec!["outage", "sev1"]),
    ///         (Category::Financial, vec!["payroll"]),
    ///     ])
    ///     .unwrap()
    ///     .build();
    ///
    /// assert_eq!(classifier.classify("SEV1 during payroll run"), Ok(Category::Urgent));
    /// ```
    pub fn with_keyword_rules<S: AsRef<str>>(
        self,
        rules: Vec<(Category, Vec<S>)>,
    ) -> Result<Self, ClassifierError> {
        Ok(self.with_keywords(KeywordSet::new(rules)?))
    }

    /// Attaches the statistical fallback model
    pub fn with_artifacts(mut self, artifacts: ModelArtifacts) -> Self {
        self.artifacts = Some(artifacts);
        self
    }

    /// Attaches the fallback model if one was loaded; `None` leaves the
    /// classifier in heuristic-only mode.
    pub fn with_optional_artifacts(mut self, artifacts: Option<ModelArtifacts>) -> Self {
        self.artifacts = artifacts;
        self
    }

    /// Builds and returns the final Classifier instance
    pub fn build(self) -> Classifier {
        let keywords = self.keywords.unwrap_or_default();
        match &self.artifacts {
            Some(artifacts) => info!(
                "Classifier ready: {} keyword rules, model with {} features",
                keywords.rules().len(),
                artifacts.num_features()
            ),
            None => info!(
                "Classifier ready: {} keyword rules, heuristic-only mode",
                keywords.rules().len()
            ),
        }

        Classifier {
            keywords,
            artifacts: self.artifacts,
        }
    }
}
