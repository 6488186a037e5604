//! Fixed ESG keyword vocabularies used to bucket news articles.
//!
//! Matching is a case-insensitive substring test, so "emissions" also hits
//! "low-emissions" and "fine" also hits "refined".

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EsgTheme {
    Environmental,
    Social,
    Governance,
}

const ENVIRONMENTAL: &[&str] = &[
    "carbon",
    "emissions",
    "climate",
    "renewable",
    "pollution",
    "waste",
];

const SOCIAL: &[&str] = &[
    "diversity",
    "labor",
    "community",
    "safety",
    "human rights",
    "employee",
];

const GOVERNANCE: &[&str] = &[
    "board",
    "ethics",
    "compliance",
    "transparency",
    "corruption",
    "audit",
];

pub const CONTROVERSY_KEYWORDS: &[&str] = &[
    "lawsuit",
    "scandal",
    "investigation",
    "violation",
    "fine",
    "penalty",
];

impl EsgTheme {
    /// Reporting order
    pub const ALL: [EsgTheme; 3] = [
        EsgTheme::Environmental,
        EsgTheme::Social,
        EsgTheme::Governance,
    ];

    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            EsgTheme::Environmental => ENVIRONMENTAL,
            EsgTheme::Social => SOCIAL,
            EsgTheme::Governance => GOVERNANCE,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EsgTheme::Environmental => "Environmental",
            EsgTheme::Social => "Social",
            EsgTheme::Governance => "Governance",
        }
    }

    /// `text` must already be lowercased
    pub fn matches(self, text: &str) -> bool {
        contains_any(text, self.keywords())
    }
}

impl fmt::Display for EsgTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `text` must already be lowercased
pub fn is_controversial(text: &str) -> bool {
    contains_any(text, CONTROVERSY_KEYWORDS)
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| text.contains(kw))
}
