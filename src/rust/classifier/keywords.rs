use aho_corasick::AhoCorasick;
use lazy_static::lazy_static;

use super::error::ClassifierError;
use crate::Category;

const URGENT_KEYWORDS: &[&str] = &[
    "urgent", "immediate", "emergency", "deadline", "breach", "asap", "critical", "alert", "warning",
];

const FINANCIAL_KEYWORDS: &[&str] = &[
    "budget", "invoice", "purchase", "financial", "report", "quarterly", "bank", "money", "expense", "cost",
];

const HR_KEYWORDS: &[&str] = &[
    "hr", "policies", "performance", "review", "insurance", "promotion", "holiday", "leave", "benefits",
    "hiring", "salary",
];

lazy_static! {
    static ref BUILTIN_KEYWORDS: KeywordSet = KeywordSet::default();
}

/// One category's keywords together with a prebuilt substring matcher.
#[derive(Debug, Clone)]
pub struct KeywordRule {
    category: Category,
    keywords: Vec<String>,
    matcher: AhoCorasick,
}

impl KeywordRule {
    pub fn category(&self) -> Category {
        self.category
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// `text` must already be lower-cased.
    fn matches(&self, text: &str) -> bool {
        self.matcher.is_match(text)
    }
}

/// An ordered list of keyword rules. Earlier rules take priority: the first
/// rule with any keyword occurring in the text decides the category.
///
/// Matching is plain substring search on the lower-cased text, so a keyword
/// also fires inside longer words ("hr" matches "three").
///
/// # Example
/// ```
/// use email_triage::{Category, KeywordSet};
///
/// let keywords = KeywordSet::default();
/// assert_eq!(keywords.classify("Quarterly budget report is urgent"), Category::Urgent);
/// assert_eq!(keywords.classify("let's grab lunch"), Category::General);
/// ```
#[derive(Debug, Clone)]
pub struct KeywordSet {
    rules: Vec<KeywordRule>,
}

impl Default for KeywordSet {
    /// Urgent, then Financial, then HR.
    fn default() -> Self {
        Self::new(vec![
            (Category::Urgent, URGENT_KEYWORDS.to_vec()),
            (Category::Financial, FINANCIAL_KEYWORDS.to_vec()),
            (Category::Hr, HR_KEYWORDS.to_vec()),
        ])
        .expect("built-in keyword set is valid")
    }
}

impl KeywordSet {
    /// Builds a keyword set from `(category, keywords)` pairs in priority order.
    ///
    /// Keywords are lower-cased. Fails if a keyword is empty, a rule has no
    /// keywords, a category appears twice, or `General` is used as a rule
    /// (it is the implicit result when nothing matches).
    pub fn new<S: AsRef<str>>(rules: Vec<(Category, Vec<S>)>) -> Result<Self, ClassifierError> {
        let mut built: Vec<KeywordRule> = Vec::with_capacity(rules.len());

        for (category, keywords) in rules {
            if !category.is_specific() {
                return Err(ClassifierError::ValidationError(
                    "General cannot be used as a keyword rule".into(),
                ));
            }
            if built.iter().any(|rule| rule.category == category) {
                return Err(ClassifierError::ValidationError(format!(
                    "Category '{}' appears more than once in the keyword set",
                    category
                )));
            }
            if keywords.is_empty() {
                return Err(ClassifierError::ValidationError(format!(
                    "Category '{}' must have at least one keyword",
                    category
                )));
            }

            let keywords: Vec<String> = keywords.iter().map(|k| k.as_ref().to_lowercase()).collect();
            if let Some(pos) = keywords.iter().position(|k| k.is_empty()) {
                return Err(ClassifierError::ValidationError(format!(
                    "Keyword {} for category '{}' cannot be empty",
                    pos + 1,
                    category
                )));
            }

            let matcher = AhoCorasick::new(&keywords).map_err(|e| {
                ClassifierError::BuildError(format!("Failed to build matcher for '{}': {}", category, e))
            })?;

            built.push(KeywordRule { category, keywords, matcher });
        }

        Ok(Self { rules: built })
    }

    /// Rules in priority order
    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }

    /// Categories in priority order
    pub fn priority(&self) -> Vec<Category> {
        self.rules.iter().map(|rule| rule.category).collect()
    }

    /// Returns the first category (in priority order) with a keyword occurring
    /// in `text`, or `General` when none match.
    pub fn classify(&self, text: &str) -> Category {
        let text = text.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&text))
            .map(|rule| rule.category)
            .unwrap_or(Category::General)
    }
}

/// Classifies `text` with the built-in keyword set.
pub fn classify_heuristic(text: &str) -> Category {
    BUILTIN_KEYWORDS.classify(text)
}
