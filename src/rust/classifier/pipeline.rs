use std::fmt;
use std::sync::Arc;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::features::FeatureTransformer;
use super::keywords::KeywordSet;
use super::predictor::Predictor;
use crate::Category;

/// Outcome of one classification: a category or `ArtifactUnavailable`.
pub type ClassificationResult = Result<Category, ClassifierError>;

/// The fitted feature transformer and predictor, held as one unit so that
/// one can never be present without the other.
#[derive(Clone)]
pub struct ModelArtifacts {
    transformer: Arc<dyn FeatureTransformer>,
    predictor: Arc<dyn Predictor>,
}

impl fmt::Debug for ModelArtifacts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelArtifacts")
            .field("num_features", &self.transformer.num_features())
            .field("classes", &self.predictor.classes())
            .finish()
    }
}

impl ModelArtifacts {
    /// Pairs a transformer with a predictor.
    ///
    /// # Errors
    /// - `ValidationError` if the transformer's output width differs from the
    ///   width the predictor expects
    pub fn new<T, P>(transformer: T, predictor: P) -> Result<Self, ClassifierError>
    where
        T: FeatureTransformer + 'static,
        P: Predictor + 'static,
    {
        if transformer.num_features() != predictor.num_features() {
            return Err(ClassifierError::ValidationError(format!(
                "Transformer produces {} features but predictor expects {}",
                transformer.num_features(),
                predictor.num_features()
            )));
        }
        Ok(Self {
            transformer: Arc::new(transformer),
            predictor: Arc::new(predictor),
        })
    }

    pub fn transformer(&self) -> &dyn FeatureTransformer {
        self.transformer.as_ref()
    }

    pub fn predictor(&self) -> &dyn Predictor {
        self.predictor.as_ref()
    }

    pub fn num_features(&self) -> usize {
        self.transformer.num_features()
    }

    /// Runs the statistical classifier on raw text
    pub fn classify(&self, text: &str) -> Result<Category, ClassifierError> {
        classify_model(text, self.transformer(), self.predictor())
    }
}

/// Classifies raw text with the statistical model: transform, then predict.
///
/// # Errors
/// - `PredictionError` if the transformer's vector is not as wide as the
///   predictor expects
/// - Any error returned by the predictor
pub fn classify_model(
    text: &str,
    transformer: &dyn FeatureTransformer,
    predictor: &dyn Predictor,
) -> Result<Category, ClassifierError> {
    let features = transformer.transform(text);
    if features.len() != predictor.num_features() {
        return Err(ClassifierError::PredictionError(format!(
            "Transformer produced {} features but predictor expects {}",
            features.len(),
            predictor.num_features()
        )));
    }
    predictor.predict(&features)
}

/// Which stage of the pipeline produced a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionSource {
    /// A keyword rule matched
    Heuristic,
    /// The heuristic was inconclusive and the statistical model decided
    Model,
}

impl fmt::Display for DecisionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Heuristic => write!(f, "heuristic"),
            Self::Model => write!(f, "model"),
        }
    }
}

/// A category together with the stage that decided it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub category: Category,
    pub source: DecisionSource,
}

/// The hybrid email classifier.
///
/// Keyword rules run first; any specific category they find is final. When
/// they find nothing the statistical model decides, and if no model
/// artifacts were loaded the call returns `ClassifierError::ArtifactUnavailable`
/// rather than guessing `General`.
///
/// The classifier is immutable after `build()`, so a single instance can be
/// shared across threads with `Arc`:
///
/// ```rust
/// use email_triage::{Category, Classifier, ClassifierError};
/// use std::sync::Arc;
/// use std::thread;
///
/// let classifier = Arc::new(Classifier::builder().build());
///
/// let handles: Vec<_> = (0..3)
///     .map(|_| {
///         let classifier = Arc::clone(&classifier);
///         thread::spawn(move || classifier.classify("Server breach detected"))
///     })
///     .collect();
///
/// for handle in handles {
///     assert_eq!(handle.join().unwrap(), Ok(Category::Urgent));
/// }
///
/// assert_eq!(classifier.classify("let's grab lunch"), Err(ClassifierError::ArtifactUnavailable));
/// ```
#[derive(Debug, Clone)]
pub struct Classifier {
    pub(crate) keywords: KeywordSet,
    pub(crate) artifacts: Option<ModelArtifacts>,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Classifier>();
    }
};

impl Classifier {
    /// Creates a new ClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::ClassifierBuilder {
        super::builder::ClassifierBuilder::new()
    }

    pub fn keywords(&self) -> &KeywordSet {
        &self.keywords
    }

    pub fn artifacts(&self) -> Option<&ModelArtifacts> {
        self.artifacts.as_ref()
    }

    pub fn has_artifacts(&self) -> bool {
        self.artifacts.is_some()
    }

    /// Returns information about the classifier's current state
    pub fn info(&self) -> super::ClassifierInfo {
        super::ClassifierInfo {
            priority: self.keywords.priority(),
            keyword_counts: self
                .keywords
                .rules()
                .iter()
                .map(|rule| (rule.category(), rule.keywords().len()))
                .collect(),
            artifacts_loaded: self.has_artifacts(),
            num_features: self.artifacts.as_ref().map(ModelArtifacts::num_features),
            model_classes: self
                .artifacts
                .as_ref()
                .map(|a| a.predictor().classes())
                .unwrap_or_default(),
        }
    }

    /// Classifies an email body.
    ///
    /// # Returns
    /// * `Ok(category)` from the keyword rules, or from the model when the
    ///   rules are inconclusive
    /// * `Err(ClassifierError::ArtifactUnavailable)` when the rules are
    ///   inconclusive and no model is loaded
    /// * `Err(ClassifierError::PredictionError)` when the model misbehaves
    ///   (e.g. returns a feature vector of the wrong width)
    pub fn classify(&self, text: &str) -> ClassificationResult {
        self.classify_decision(text).map(|decision| decision.category)
    }

    /// Like `classify`, but also reports which stage decided.
    pub fn classify_decision(&self, text: &str) -> Result<Decision, ClassifierError> {
        let heuristic = self.keywords.classify(text);
        if heuristic.is_specific() {
            debug!("Heuristic prediction: {}", heuristic);
            return Ok(Decision {
                category: heuristic,
                source: DecisionSource::Heuristic,
            });
        }

        match &self.artifacts {
            Some(artifacts) => {
                trace!("No keyword matched, falling back to model");
                let category = artifacts.classify(text)?;
                debug!("Model prediction: {}", category);
                Ok(Decision {
                    category,
                    source: DecisionSource::Model,
                })
            }
            None => {
                debug!("No keyword matched and no model loaded");
                Err(ClassifierError::ArtifactUnavailable)
            }
        }
    }

    /// Classifies each text independently, preserving input order.
    pub fn classify_batch<S: AsRef<str>>(&self, texts: &[S]) -> Vec<ClassificationResult> {
        texts.iter().map(|text| self.classify(text.as_ref())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedPredictor(Category);

    impl Predictor for FixedPredictor {
        fn num_features(&self) -> usize {
            1
        }

        fn predict(&self, _features: &Array1<f32>) -> Result<Category, ClassifierError> {
            Ok(self.0)
        }

        fn classes(&self) -> Vec<Category> {
            vec![self.0]
        }
    }

    struct CountingTransformer(Arc<AtomicUsize>);

    impl FeatureTransformer for CountingTransformer {
        fn num_features(&self) -> usize {
            1
        }

        fn transform(&self, _text: &str) -> Array1<f32> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Array1::zeros(1)
        }
    }

    fn setup_classifier(prediction: Category) -> (Classifier, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let artifacts =
            ModelArtifacts::new(CountingTransformer(Arc::clone(&calls)), FixedPredictor(prediction)).unwrap();
        let classifier = Classifier::builder().with_artifacts(artifacts).build();
        (classifier, calls)
    }

    #[test]
    fn test_heuristic_wins_without_model_call() {
        let (classifier, calls) = setup_classifier(Category::General);
        let decision = classifier.classify_decision("Quarterly budget report is urgent").unwrap();
        assert_eq!(decision.category, Category::Urgent);
        assert_eq!(decision.source, DecisionSource::Heuristic);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_fallback_uses_model() {
        let (classifier, calls) = setup_classifier(Category::Hr);
        let decision = classifier.classify_decision("let's grab lunch").unwrap();
        assert_eq!(decision.category, Category::Hr);
        assert_eq!(decision.source, DecisionSource::Model);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_model_may_answer_general() {
        let (classifier, _) = setup_classifier(Category::General);
        assert_eq!(classifier.classify("let's grab lunch"), Ok(Category::General));
    }

    #[test]
    fn test_missing_artifacts_is_an_error_not_general() {
        let classifier = Classifier::builder().build();
        assert_eq!(classifier.classify("let's grab lunch"), Err(ClassifierError::ArtifactUnavailable));
        assert_eq!(classifier.classify(""), Err(ClassifierError::ArtifactUnavailable));
        assert_eq!(classifier.classify("Updated leave policies"), Ok(Category::Hr));
    }

    #[test]
    fn test_empty_text_falls_through() {
        let (classifier, calls) = setup_classifier(Category::Financial);
        assert_eq!(classifier.classify(""), Ok(Category::Financial));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_width_mismatch_rejected() {
        struct WideTransformer;
        impl FeatureTransformer for WideTransformer {
            fn num_features(&self) -> usize {
                4
            }
            fn transform(&self, _text: &str) -> Array1<f32> {
                Array1::zeros(4)
            }
        }
        let result = ModelArtifacts::new(WideTransformer, FixedPredictor(Category::General));
        assert!(matches!(result, Err(ClassifierError::ValidationError(_))));
    }

    #[test]
    fn test_classify_model_width_mismatch_is_an_error() {
        struct WideTransformer;
        impl FeatureTransformer for WideTransformer {
            fn num_features(&self) -> usize {
                3
            }
            fn transform(&self, _text: &str) -> Array1<f32> {
                Array1::zeros(3)
            }
        }
        let result = classify_model("team lunch", &WideTransformer, &FixedPredictor(Category::General));
        assert!(matches!(result, Err(ClassifierError::PredictionError(_))));
    }

    #[test]
    fn test_transformer_lying_about_width_does_not_panic() {
        // declares one feature, returns three
        struct MisreportingTransformer;
        impl FeatureTransformer for MisreportingTransformer {
            fn num_features(&self) -> usize {
                1
            }
            fn transform(&self, _text: &str) -> Array1<f32> {
                Array1::zeros(3)
            }
        }
        let artifacts = ModelArtifacts::new(MisreportingTransformer, FixedPredictor(Category::General)).unwrap();
        let classifier = Classifier::builder().with_artifacts(artifacts).build();

        assert!(matches!(
            classifier.classify("let's grab lunch"),
            Err(ClassifierError::PredictionError(_))
        ));
        // keyword decisions never touch the model
        assert_eq!(classifier.classify("ASAP"), Ok(Category::Urgent));
    }

    #[test]
    fn test_batch_preserves_order() {
        let classifier = Classifier::builder().build();
        let results = classifier.classify_batch(&["ASAP please", "hello there", "new invoice"]);
        assert_eq!(
            results,
            vec![
                Ok(Category::Urgent),
                Err(ClassifierError::ArtifactUnavailable),
                Ok(Category::Financial),
            ]
        );
    }

    #[test]
    fn test_info_reports_state() {
        let (classifier, _) = setup_classifier(Category::General);
        let info = classifier.info();
        assert_eq!(info.priority, vec![Category::Urgent, Category::Financial, Category::Hr]);
        assert!(info.artifacts_loaded);
        assert_eq!(info.num_features, Some(1));
        assert_eq!(info.model_classes, vec![Category::General]);

        let info = Classifier::builder().build().info();
        assert!(!info.artifacts_loaded);
        assert_eq!(info.num_features, None);
        assert!(info.model_classes.is_empty());
    }
}
