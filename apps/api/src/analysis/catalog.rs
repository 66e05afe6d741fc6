//! Analysis catalogs: the keyword and required-section reference lists.
//!
//! Built once at process start (built-in default or a JSON file named by
//! `ATS_CATALOG_PATH`) and shared read-only through `Arc<AnalysisCatalog>`.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

const DEFAULT_TECHNICAL: &[&str] = &[
    "javascript",
    "typescript",
    "python",
    "react",
    "node.js",
    "sql",
    "html",
    "css",
    "docker",
    "kubernetes",
    "rest api",
    "graphql",
    "mongodb",
    "postgresql",
    "ci/cd",
    "machine learning",
];

const DEFAULT_SOFT_SKILLS: &[&str] = &[
    "teamwork",
    "leadership",
    "communication",
    "problem-solving",
    "collaboration",
    "time management",
    "adaptability",
    "critical thinking",
];

const DEFAULT_CERTIFICATIONS: &[&str] = &[
    "aws certified",
    "pmp",
    "scrum master",
    "cissp",
    "comptia",
    "google cloud certified",
];

const DEFAULT_SECTIONS: &[&str] = &["summary", "experience", "education", "skills", "contact"];

/// One named category with its ordered, lower-cased, de-duplicated keywords.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordCategory {
    pub category: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordCatalog {
    pub categories: Vec<KeywordCategory>,
}

impl KeywordCatalog {
    pub fn total_keywords(&self) -> usize {
        self.categories.iter().map(|c| c.keywords.len()).sum()
    }

    /// Iterates `(category, keyword)` pairs in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.categories.iter().flat_map(|c| {
            c.keywords
                .iter()
                .map(move |k| (c.category.as_str(), k.as_str()))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionCatalog {
    pub sections: Vec<String>,
}

/// On-disk catalog layout. Category order is preserved, which a JSON object would not.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    keywords: Vec<KeywordCategory>,
    sections: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisCatalog {
    pub keywords: KeywordCatalog,
    pub sections: SectionCatalog,
}

impl AnalysisCatalog {
    pub fn new(categories: Vec<KeywordCategory>, sections: Vec<String>) -> Result<Self> {
        let categories: Vec<KeywordCategory> = categories
            .into_iter()
            .map(|c| KeywordCategory {
                category: c.category.trim().to_string(),
                keywords: normalize_terms(c.keywords),
            })
            .filter(|c| !c.keywords.is_empty())
            .collect();
        let sections = normalize_terms(sections);

        if categories.is_empty() {
            bail!("keyword catalog must contain at least one non-empty category");
        }
        if sections.is_empty() {
            bail!("section catalog must contain at least one section");
        }

        Ok(Self {
            keywords: KeywordCatalog { categories },
            sections: SectionCatalog { sections },
        })
    }

    /// Loads the catalog from `path`, or returns the built-in default when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            None => Ok(Self::default()),
            Some(p) => {
                let raw = std::fs::read_to_string(p)
                    .with_context(|| format!("reading catalog file {}", p.display()))?;
                let file: CatalogFile = serde_json::from_str(&raw)
                    .with_context(|| format!("parsing catalog file {}", p.display()))?;
                Self::new(file.keywords, file.sections)
            }
        }
    }
}

impl Default for AnalysisCatalog {
    fn default() -> Self {
        let category = |name: &str, words: &[&str]| KeywordCategory {
            category: name.to_string(),
            keywords: words.iter().map(|w| w.to_string()).collect(),
        };
        Self {
            keywords: KeywordCatalog {
                categories: vec![
                    category("technical", DEFAULT_TECHNICAL),
                    category("soft_skills", DEFAULT_SOFT_SKILLS),
                    category("certifications", DEFAULT_CERTIFICATIONS),
                ],
            },
            sections: SectionCatalog {
                sections: DEFAULT_SECTIONS.iter().map(|s| s.to_string()).collect(),
            },
        }
    }
}

/// Trims, lower-cases, drops empties and de-duplicates while keeping first-seen order.
fn normalize_terms(terms: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(terms.len());
    for term in terms {
        let term = term.trim().to_lowercase();
        if !term.is_empty() && !out.contains(&term) {
            out.push(term);
        }
    }
    out
}
