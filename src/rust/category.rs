use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::classifier::ClassifierError;

/// The closed set of triage categories produced by both the keyword heuristic
/// and the statistical model.
///
/// `General` doubles as the heuristic's "no specific signal" value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    /// Time-sensitive mail: deadlines, incidents, alerts
    Urgent,
    /// Budgets, invoices, purchases and other money matters
    Financial,
    /// Policies, reviews, leave, hiring and compensation
    #[serde(rename = "HR")]
    Hr,
    /// Anything without a more specific signal
    General,
}

impl Category {
    /// All categories, in declaration order
    pub const ALL: [Category; 4] = [
        Category::Urgent,
        Category::Financial,
        Category::Hr,
        Category::General,
    ];

    /// Canonical label as used in persisted models and user-facing output
    pub fn label(&self) -> &'static str {
        match self {
            Self::Urgent => "Urgent",
            Self::Financial => "Financial",
            Self::Hr => "HR",
            Self::General => "General",
        }
    }

    /// Whether this category carries a specific signal (anything but General)
    pub fn is_specific(&self) -> bool {
        !matches!(self, Self::General)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = ClassifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .copied()
            .find(|category| category.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ClassifierError::ValidationError(format!("Unknown category label: '{}'", s)))
    }
}
