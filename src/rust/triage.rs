use std::fmt;

use serde::Serialize;

use crate::classifier::{Classifier, ClassifierError, Decision, DecisionSource};
use crate::Category;

/// What gets handed to the presentation layer: the original email text and
/// either the decided category or the reason it could not be classified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Triage {
    pub email_text: String,
    pub category: Option<Category>,
    pub source: Option<DecisionSource>,
    pub error: Option<String>,
}

impl Triage {
    pub fn new(email_text: impl Into<String>, outcome: Result<Decision, ClassifierError>) -> Self {
        let email_text = email_text.into();
        match outcome {
            Ok(decision) => Self {
                email_text,
                category: Some(decision.category),
                source: Some(decision.source),
                error: None,
            },
            Err(e) => Self {
                email_text,
                category: None,
                source: None,
                error: Some(e.to_string()),
            },
        }
    }

    pub fn is_classified(&self) -> bool {
        self.category.is_some()
    }
}

impl fmt::Display for Triage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.category, &self.error) {
            (Some(category), _) => write!(f, "Category: {}", category),
            (None, Some(error)) => write!(f, "Error: {}", error),
            (None, None) => write!(f, "Error: not classified"),
        }
    }
}

impl Classifier {
    /// Classifies `text` and packages the outcome with the original text.
    pub fn triage(&self, text: &str) -> Triage {
        Triage::new(text, self.classify_decision(text))
    }
}
