use serde::{Deserialize, Serialize};
use std::fmt;

/// Letter grade assigned to a page.  Grades outside `A`..`F` are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
    /// A grade this client does not recognize.
    Other(String),
}

impl From<String> for Grade {
    fn from(s: String) -> Self {
        match s.as_str() {
            "A" => Grade::A,
            "B" => Grade::B,
            "C" => Grade::C,
            "D" => Grade::D,
            "F" => Grade::F,
            _ => Grade::Other(s),
        }
    }
}

impl From<Grade> for String {
    fn from(grade: Grade) -> Self {
        grade.to_string()
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grade::A => write!(f, "A"),
            Grade::B => write!(f, "B"),
            Grade::C => write!(f, "C"),
            Grade::D => write!(f, "D"),
            Grade::F => write!(f, "F"),
            Grade::Other(s) => write!(f, "{s}"),
        }
    }
}

/// A single pass/fail check inside a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceCheck {
    pub name: String,
    pub passed: bool,
    #[serde(default)]
    pub issues: Vec<String>,
}

/// A scored group of checks, e.g. accessibility or SEO.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceCategory {
    pub name: String,
    pub score: f64,
    #[serde(default)]
    pub checks: Vec<ComplianceCheck>,
}

/// Structured scoring output for one analyzed page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceResult {
    pub page_path: String,
    #[serde(default)]
    pub page_title: String,
    pub grade: Grade,
    pub overall_score: f64,
    #[serde(default)]
    pub total_issues: u32,
    #[serde(default)]
    pub high_priority_issues: u32,
    #[serde(default)]
    pub medium_priority_issues: u32,
    #[serde(default)]
    pub low_priority_issues: u32,
    #[serde(default)]
    pub categories: Vec<ComplianceCategory>,
}

impl ComplianceResult {
    /// Iterates over the checks that did not pass, with their category name.
    pub fn failed_checks(&self) -> impl Iterator<Item = (&str, &ComplianceCheck)> {
        self.categories.iter().flat_map(|category| {
            category
                .checks
                .iter()
                .filter(|check| !check.passed)
                .map(move |check| (category.name.as_str(), check))
        })
    }
}

/// A compliance category the backend knows how to score.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CategoryInfo {
    /// Identifier sent in the `categories` field of a check request.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
}

/// Categories offered by the compliance checker.
pub const COMPLIANCE_CATEGORIES: [CategoryInfo; 6] = [
    CategoryInfo {
        id: "accessibility",
        name: "Accessibility",
    },
    CategoryInfo {
        id: "seo",
        name: "SEO",
    },
    CategoryInfo {
        id: "performance",
        name: "Performance",
    },
    CategoryInfo {
        id: "security",
        name: "Security",
    },
    CategoryInfo {
        id: "content_quality",
        name: "Content Quality",
    },
    CategoryInfo {
        id: "aem_specific",
        name: "AEM Best Practices",
    },
];

/// Aggregate numbers shown above a compliance report.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OverallStats {
    /// Mean overall score, rounded to two decimals.
    pub average_score: f64,
    pub total_issues: u64,
    pub high_priority: u64,
    pub medium_priority: u64,
    pub low_priority: u64,
}

impl OverallStats {
    /// Summarizes a result set.  An empty set yields all zeros.
    pub fn from_results(results: &[ComplianceResult]) -> Self {
        if results.is_empty() {
            return Self::default();
        }
        let total_score: f64 = results.iter().map(|r| r.overall_score).sum();
        let sum = |f: fn(&ComplianceResult) -> u32| -> u64 {
            results.iter().map(|r| u64::from(f(r))).sum()
        };
        Self {
            average_score: (total_score / results.len() as f64 * 100.0).round() / 100.0,
            total_issues: sum(|r| r.total_issues),
            high_priority: sum(|r| r.high_priority_issues),
            medium_priority: sum(|r| r.medium_priority_issues),
            low_priority: sum(|r| r.low_priority_issues),
        }
    }
}
