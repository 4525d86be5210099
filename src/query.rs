use crate::errors::{CanopyError, Result};
use crate::grammar::{Grammar, GrammarHandle};
use crate::node::Node;
use crate::point::Point;
use crate::pool::with_match_cursor;
use std::cell::Cell;
use std::fmt;
use std::ops::Range;
use tracing::{debug, trace};
use tree_sitter::{QueryCursor, QueryErrorKind, StreamingIterator};

/// A single capture: a node and the name it was captured under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture<'q> {
    pub node: Node,
    pub name: &'q str,
    /// Dense capture id; `name` is `query.capture_names()[index]`.
    pub index: u32,
    pub pattern_index: usize,
}

/// All captures produced by one match occurrence of one pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryMatch<'q> {
    pub pattern_index: usize,
    pub captures: Vec<Capture<'q>>,
}

impl<'q> QueryMatch<'q> {
    /// First capture in this match named `name`.
    pub fn capture(&self, name: &str) -> Option<&Capture<'q>> {
        self.captures.iter().find(|capture| capture.name == name)
    }
}

/// A compiled set of patterns.
///
/// Capture names are fixed at compile time; capture ids index into
/// [`Query::capture_names`].
pub struct Query {
    raw: tree_sitter::Query,
    grammar: GrammarHandle,
    capture_names: Vec<String>,
}

impl Query {
    /// Compile `source` against `grammar`.
    ///
    /// # Query Syntax
    ///
    /// Tree-sitter queries use S-expression syntax:
    /// ```text
    /// (binary_operator
    ///   left: (_) @left
    ///   right: (_) @right) @expr
    /// ```
    ///
    /// Errors name the offending node type, field, or capture when the
    /// pattern references one that does not exist, and carry the byte
    /// offset for plain syntax errors.
    pub fn new(grammar: &impl Grammar, source: &str) -> Result<Self> {
        let grammar = GrammarHandle::bind(grammar)?;
        let raw = tree_sitter::Query::new(grammar.raw(), source)
            .map_err(|error| classify(source, &error))?;

        let capture_names: Vec<String> = raw
            .capture_names()
            .iter()
            .map(|name| name.to_string())
            .collect();

        debug!(
            language = grammar.name_str(),
            patterns = raw.pattern_count(),
            captures = capture_names.len(),
            "compiled query"
        );

        Ok(Self {
            raw,
            grammar,
            capture_names,
        })
    }

    pub fn capture_names(&self) -> &[String] {
        &self.capture_names
    }

    pub fn capture_count(&self) -> usize {
        self.capture_names.len()
    }

    pub fn capture_index_for_name(&self, name: &str) -> Option<u32> {
        self.capture_names
            .iter()
            .position(|candidate| candidate == name)
            .map(|index| index as u32)
    }

    pub fn pattern_count(&self) -> usize {
        self.raw.pattern_count()
    }

    pub fn language(&self) -> &GrammarHandle {
        &self.grammar
    }

    /// Every capture within `node`, in the order the engine emits them.
    ///
    /// `range` restricts matching to a point range; `None`, or an empty
    /// range at the origin, means unbounded. Patterns with text predicates
    /// (`#eq?`, `#match?`, ...) need the tree's source, so on an edited tree
    /// they fail with [`CanopyError::TextUnavailable`].
    pub fn captures(&self, node: &Node, range: Option<Range<Point>>) -> Result<Vec<Capture<'_>>> {
        self.check_language(node)?;
        let text = SourceText::new(node.source());

        let captures = node.with_raw(|raw| {
            with_match_cursor(|cursor| {
                restrict(cursor, range);
                let mut out = Vec::new();
                let mut captures = cursor.captures(&self.raw, raw, text.provider());
                while let Some((m, capture_index)) = captures.next() {
                    let capture = m.captures[*capture_index];
                    out.push(self.translate(node, m.pattern_index, capture)?);
                }
                Ok::<_, CanopyError>(out)
            })
        })??;
        text.check()?;

        trace!(count = captures.len(), "query captures");
        Ok(captures)
    }

    /// Captures grouped by match occurrence, in the order the engine emits
    /// matches. Within a match, captures follow pattern order.
    pub fn matches(&self, node: &Node, range: Option<Range<Point>>) -> Result<Vec<QueryMatch<'_>>> {
        self.check_language(node)?;
        let text = SourceText::new(node.source());

        let matches = node.with_raw(|raw| {
            with_match_cursor(|cursor| {
                restrict(cursor, range);
                let mut out = Vec::new();
                let mut matches = cursor.matches(&self.raw, raw, text.provider());
                while let Some(m) = matches.next() {
                    let captures = m
                        .captures
                        .iter()
                        .map(|capture| self.translate(node, m.pattern_index, *capture))
                        .collect::<Result<Vec<_>>>()?;
                    out.push(QueryMatch {
                        pattern_index: m.pattern_index,
                        captures,
                    });
                }
                Ok::<_, CanopyError>(out)
            })
        })??;
        text.check()?;

        trace!(count = matches.len(), "query matches");
        Ok(matches)
    }

    fn check_language(&self, node: &Node) -> Result<()> {
        if node.language() != &self.grammar {
            return Err(CanopyError::LanguageMismatch {
                expected: self.grammar.name_str().to_string(),
                found: node.language().name_str().to_string(),
            });
        }
        Ok(())
    }

    fn translate(
        &self,
        anchor: &Node,
        pattern_index: usize,
        capture: tree_sitter::QueryCapture<'_>,
    ) -> Result<Capture<'_>> {
        Ok(Capture {
            node: anchor.materialize(capture.node)?,
            name: &self.capture_names[capture.index as usize],
            index: capture.index,
            pattern_index,
        })
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("language", &self.grammar.name_str())
            .field("patterns", &self.raw.pattern_count())
            .field("capture_names", &self.capture_names)
            .finish()
    }
}

/// Source text handed to the engine for text predicates.
///
/// Records the first node whose text could not be served, so the caller
/// reports it instead of the engine seeing a truncated slice.
struct SourceText<'a> {
    source: Option<&'a [u8]>,
    missing: Cell<Option<Range<usize>>>,
}

impl<'a> SourceText<'a> {
    fn new(source: Option<&'a [u8]>) -> Self {
        Self {
            source,
            missing: Cell::new(None),
        }
    }

    fn provider(&self) -> impl FnMut(tree_sitter::Node<'_>) -> std::iter::Once<&'a [u8]> + '_ {
        move |node| {
            let range = node.byte_range();
            let chunk = self.source.and_then(|source| source.get(range.clone()));
            if chunk.is_none() {
                let first = self.missing.take().unwrap_or(range);
                self.missing.set(Some(first));
            }
            std::iter::once(chunk.unwrap_or_default())
        }
    }

    fn check(&self) -> Result<()> {
        match self.missing.take() {
            Some(range) => Err(CanopyError::TextUnavailable {
                start_byte: range.start,
                end_byte: range.end,
            }),
            None => Ok(()),
        }
    }
}

fn restrict(cursor: &mut QueryCursor, range: Option<Range<Point>>) {
    let range = match range {
        Some(range) if range != (Point::ZERO..Point::ZERO) => range,
        _ => Point::ZERO..Point::MAX,
    };
    cursor.set_point_range(range.start.into()..range.end.into());
}

/// Map an engine compile error onto a [`CanopyError`], naming the token at
/// the error offset for unknown-reference errors.
fn classify(source: &str, error: &tree_sitter::QueryError) -> CanopyError {
    let name = || token_at(source, error.offset);
    match error.kind {
        QueryErrorKind::NodeType => CanopyError::UnknownNodeType { name: name() },
        QueryErrorKind::Field => CanopyError::UnknownField { name: name() },
        QueryErrorKind::Capture => CanopyError::UnknownCapture { name: name() },
        _ => CanopyError::PatternSyntax {
            offset: error.offset,
            row: error.row,
            column: error.column,
        },
    }
}

/// The identifier-like run starting at `offset`: alphanumerics plus `-_?.`.
fn token_at(source: &str, offset: usize) -> String {
    source
        .get(offset..)
        .unwrap_or_default()
        .chars()
        .take_while(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '?' | '.'))
        .collect()
}
