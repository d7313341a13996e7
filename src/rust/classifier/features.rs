use std::borrow::Cow;
use std::collections::HashMap;

use lazy_static::lazy_static;
use ndarray::Array1;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::utils::normalize_vector;

lazy_static! {
    /// Runs of two or more word characters
    static ref TOKEN_PATTERN: Regex = Regex::new(r"\b\w\w+\b").expect("token pattern is valid");
}

/// Maps raw text to a fixed-width numeric feature vector.
///
/// Implementations must be deterministic for their whole lifetime: the same
/// text always yields the same vector, and every vector has exactly
/// `num_features()` entries. Any normalization of the text (case folding,
/// tokenization) happens inside the transformer; callers pass raw text.
pub trait FeatureTransformer: Send + Sync {
    /// Width of every vector returned by `transform`
    fn num_features(&self) -> usize;

    /// Converts text into its feature representation
    fn transform(&self, text: &str) -> Array1<f32>;
}

/// Row normalization applied after TF-IDF weighting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Norm {
    #[default]
    #[serde(rename = "l2")]
    L2,
    #[serde(rename = "none")]
    Unnormalized,
}

/// On-disk layout of a TF-IDF vectorizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct VectorizerFile {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
    #[serde(default = "default_lowercase")]
    lowercase: bool,
    #[serde(default)]
    sublinear_tf: bool,
    #[serde(default)]
    norm: Norm,
}

fn default_lowercase() -> bool {
    true
}

/// A fitted TF-IDF vectorizer.
///
/// Text is optionally lower-cased, split into tokens of two or more word
/// characters, and counted against a fixed vocabulary. Each count is weighted
/// by the term's inverse document frequency and the row is L2-normalized.
/// Tokens outside the vocabulary are ignored.
///
/// # Example
/// ```
/// use std::collections::HashMap;
/// use email_triage::{FeatureTransformer, TfidfVectorizer};
///
/// let vocabulary = HashMap::from([("lunch".to_string(), 0), ("team".to_string(), 1)]);
/// let vectorizer = TfidfVectorizer::new(vocabulary, vec![1.0, 2.0]).unwrap();
///
/// let features = vectorizer.transform("Team lunch on Friday");
/// assert_eq!(features.len(), 2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "VectorizerFile", into = "VectorizerFile")]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
    lowercase: bool,
    sublinear_tf: bool,
    norm: Norm,
}

impl TfidfVectorizer {
    /// Creates a vectorizer from a vocabulary (term to column) and per-column
    /// IDF weights, with lower-casing on, raw term frequencies and L2 norm.
    ///
    /// # Errors
    /// - `ValidationError` if the vocabulary is empty
    /// - `ValidationError` if the vocabulary and IDF lengths differ
    /// - `ValidationError` if a column index is out of range or used twice
    /// - `ValidationError` if an IDF weight is not finite
    pub fn new(vocabulary: HashMap<String, usize>, idf: Vec<f32>) -> Result<Self, ClassifierError> {
        Self::validate(&vocabulary, &idf)?;
        Ok(Self {
            vocabulary,
            idf,
            lowercase: true,
            sublinear_tf: false,
            norm: Norm::L2,
        })
    }

    pub fn with_lowercase(mut self, lowercase: bool) -> Self {
        self.lowercase = lowercase;
        self
    }

    /// Use `1 + ln(count)` instead of the raw count
    pub fn with_sublinear_tf(mut self, sublinear_tf: bool) -> Self {
        self.sublinear_tf = sublinear_tf;
        self
    }

    pub fn with_norm(mut self, norm: Norm) -> Self {
        self.norm = norm;
        self
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    fn validate(vocabulary: &HashMap<String, usize>, idf: &[f32]) -> Result<(), ClassifierError> {
        if vocabulary.is_empty() {
            return Err(ClassifierError::ValidationError("Vocabulary cannot be empty".into()));
        }
        if vocabulary.len() != idf.len() {
            return Err(ClassifierError::ValidationError(format!(
                "Vocabulary has {} terms but {} IDF weights were given",
                vocabulary.len(),
                idf.len()
            )));
        }

        let mut seen = vec![false; idf.len()];
        for (term, &col) in vocabulary {
            match seen.get_mut(col) {
                None => {
                    return Err(ClassifierError::ValidationError(format!(
                        "Column {} for term '{}' is out of range (width {})",
                        col,
                        term,
                        idf.len()
                    )));
                }
                Some(true) => {
                    return Err(ClassifierError::ValidationError(format!(
                        "Column {} is assigned to more than one term",
                        col
                    )));
                }
                Some(slot) => *slot = true,
            }
        }

        if let Some(pos) = idf.iter().position(|w| !w.is_finite()) {
            return Err(ClassifierError::ValidationError(format!(
                "IDF weight for column {} is not finite",
                pos
            )));
        }
        Ok(())
    }
}

impl TryFrom<VectorizerFile> for TfidfVectorizer {
    type Error = ClassifierError;

    fn try_from(file: VectorizerFile) -> Result<Self, Self::Error> {
        Ok(Self::new(file.vocabulary, file.idf)?
            .with_lowercase(file.lowercase)
            .with_sublinear_tf(file.sublinear_tf)
            .with_norm(file.norm))
    }
}

impl From<TfidfVectorizer> for VectorizerFile {
    fn from(vectorizer: TfidfVectorizer) -> Self {
        Self {
            vocabulary: vectorizer.vocabulary,
            idf: vectorizer.idf,
            lowercase: vectorizer.lowercase,
            sublinear_tf: vectorizer.sublinear_tf,
            norm: vectorizer.norm,
        }
    }
}

impl FeatureTransformer for TfidfVectorizer {
    fn num_features(&self) -> usize {
        self.idf.len()
    }

    fn transform(&self, text: &str) -> Array1<f32> {
        let text = if self.lowercase {
            Cow::Owned(text.to_lowercase())
        } else {
            Cow::Borrowed(text)
        };

        let mut counts: HashMap<usize, f32> = HashMap::new();
        for token in TOKEN_PATTERN.find_iter(&text) {
            if let Some(&col) = self.vocabulary.get(token.as_str()) {
                *counts.entry(col).or_insert(0.0) += 1.0;
            }
        }

        let mut features = Array1::zeros(self.idf.len());
        for (col, count) in counts {
            let tf = if self.sublinear_tf { 1.0 + count.ln() } else { count };
            features[col] = tf * self.idf[col];
        }

        match self.norm {
            Norm::L2 => normalize_vector(&features),
            Norm::Unnormalized => features,
        }
    }
}
