use crate::errors::Result;
use crate::grammar;
use crate::point::Point;
use crate::query::Query;
use ast_grep_language::SupportLang;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::ops::Range;
use thiserror::Error;

/// A named collection of query patterns for one grammar.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct QuerySet {
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub queries: Vec<QueryDefinition>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct QueryDefinition {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub pattern: String,
    /// Optional `[row, column]` lower bound.
    #[serde(default)]
    pub start: Option<[usize; 2]>,
    /// Optional `[row, column]` upper bound.
    #[serde(default)]
    pub end: Option<[usize; 2]>,
}

impl QueryDefinition {
    /// The point range this query is restricted to, if any.
    pub fn range(&self) -> Option<Range<Point>> {
        let start = self.start.map(|[row, column]| Point::new(row, column));
        let end = self.end.map(|[row, column]| Point::new(row, column));
        match (start, end) {
            (None, None) => None,
            (start, end) => Some(start.unwrap_or(Point::ZERO)..end.unwrap_or(Point::MAX)),
        }
    }
}

/// A query definition compiled against its set's grammar.
#[derive(Debug)]
pub struct CompiledQuery {
    pub name: String,
    pub query: Query,
    pub range: Option<Range<Point>>,
}

impl QuerySet {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.language.trim().is_empty() {
            issues.push(ValidationIssue::MissingField {
                query: None,
                field: "language",
            });
        } else if grammar::lookup(&self.language).is_err() {
            issues.push(ValidationIssue::UnknownLanguage {
                name: self.language.clone(),
            });
        }

        if self.queries.is_empty() {
            issues.push(ValidationIssue::EmptyQueryList);
        }

        let mut seen = HashSet::new();
        for query in &self.queries {
            let label = (!query.name.trim().is_empty()).then(|| query.name.clone());
            if label.is_none() {
                issues.push(ValidationIssue::MissingField {
                    query: None,
                    field: "name",
                });
            } else if !seen.insert(query.name.as_str()) {
                issues.push(ValidationIssue::DuplicateName {
                    name: query.name.clone(),
                });
            }

            if query.pattern.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    query: label.clone(),
                    field: "pattern",
                });
            }

            if let (Some(start), Some(end)) = (query.start, query.end) {
                if start > end {
                    issues.push(ValidationIssue::InvertedRange { query: label });
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// The grammar named by `language`.
    pub fn grammar(&self) -> Result<SupportLang> {
        grammar::lookup(&self.language)
    }

    /// Compile every query, stopping at the first pattern error.
    pub fn compile(&self) -> Result<Vec<CompiledQuery>> {
        let lang = self.grammar()?;
        self.queries
            .iter()
            .map(|definition| {
                Ok(CompiledQuery {
                    name: definition.name.clone(),
                    query: Query::new(&lang, &definition.pattern)?,
                    range: definition.range(),
                })
            })
            .collect()
    }
}

/// Every problem found in a query set, one per line when displayed.
#[derive(Debug, Clone, Error)]
#[error("{}", join_lines(issues))]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

fn join_lines(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyQueryList,
    MissingField {
        query: Option<String>,
        field: &'static str,
    },
    DuplicateName {
        name: String,
    },
    UnknownLanguage {
        name: String,
    },
    InvertedRange {
        query: Option<String>,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyQueryList => write!(f, "query set contains no queries"),
            ValidationIssue::MissingField { query, field } => match query {
                Some(name) => write!(f, "query '{name}' missing required field '{field}'"),
                None => write!(f, "missing required field '{field}'"),
            },
            ValidationIssue::DuplicateName { name } => {
                write!(f, "query name '{name}' is defined more than once")
            }
            ValidationIssue::UnknownLanguage { name } => write!(f, "unknown language '{name}'"),
            ValidationIssue::InvertedRange { query } => match query {
                Some(name) => write!(f, "query '{name}' has start after end"),
                None => write!(f, "query has start after end"),
            },
        }
    }
}
