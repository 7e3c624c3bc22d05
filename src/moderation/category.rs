// Harm categories scored by the remote API.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ContentSafetyError;

/// A harm dimension the remote API scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Hate,
    SelfHarm,
    Sexual,
    Violence,
}

impl Category {
    /// Every category, in the order requests list them when the caller
    /// doesn't choose.
    pub const ALL: [Category; 4] = [
        Category::Hate,
        Category::SelfHarm,
        Category::Sexual,
        Category::Violence,
    ];

    pub fn default_set() -> Vec<Category> {
        Self::ALL.to_vec()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Hate => "Hate",
            Category::SelfHarm => "SelfHarm",
            Category::Sexual => "Sexual",
            Category::Violence => "Violence",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = ContentSafetyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ContentSafetyError::invalid(format!("unknown category {s:?}")))
    }
}

/// Severity (0-7) the remote assigned to one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: Category,
    pub severity: u8,
}

impl CategoryScore {
    pub fn new(category: Category, severity: u8) -> Self {
        Self { category, severity }
    }
}
