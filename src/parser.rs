use crate::errors::{CanopyError, Result};
use crate::grammar::{Grammar, GrammarHandle};
use crate::tree::Tree;
use std::fmt;
use std::rc::Rc;
use tracing::debug;

/// Parses source into [`Tree`]s using the selected grammar.
///
/// A parser is reusable across unrelated parses, but must not be driven
/// from two places at once; `&mut self` on [`Parser::parse`] enforces that.
pub struct Parser {
    raw: tree_sitter::Parser,
    grammar: Option<GrammarHandle>,
}

impl Parser {
    /// Create a parser with no grammar selected.
    pub fn new() -> Self {
        Self {
            raw: tree_sitter::Parser::new(),
            grammar: None,
        }
    }

    /// Create a parser and select `grammar`.
    pub fn with_grammar(grammar: &impl Grammar) -> Result<Self> {
        let mut parser = Self::new();
        parser.set_language(grammar)?;
        Ok(parser)
    }

    /// Select the grammar for subsequent parses.
    ///
    /// Fails when the grammar's ABI version is outside the supported window.
    pub fn set_language(&mut self, grammar: &impl Grammar) -> Result<()> {
        let handle = GrammarHandle::bind(grammar)?;
        self.raw
            .set_language(handle.raw())
            .map_err(|_| CanopyError::InvalidLanguage {
                name: handle.name_str().to_string(),
                version: handle.abi_version(),
            })?;
        debug!(language = handle.name_str(), "parser language set");
        self.grammar = Some(handle);
        Ok(())
    }

    pub fn language(&self) -> Option<&GrammarHandle> {
        self.grammar.as_ref()
    }

    /// Parse `source` into a new tree.
    ///
    /// With `old_tree`, the parse is incremental: subtrees that
    /// [`Tree::edit`] left untouched are reused. The old tree must have been
    /// produced with the same grammar.
    pub fn parse(&mut self, source: impl Into<Rc<[u8]>>, old_tree: Option<&Tree>) -> Result<Tree> {
        let grammar = self.grammar.clone().ok_or(CanopyError::NoLanguage)?;
        let source: Rc<[u8]> = source.into();

        if let Some(old) = old_tree {
            if old.language() != &grammar {
                return Err(CanopyError::LanguageMismatch {
                    expected: grammar.name_str().to_string(),
                    found: old.language().name_str().to_string(),
                });
            }
        }

        let old_raw = old_tree.map(Tree::raw);
        let raw = self
            .raw
            .parse(&*source, old_raw.as_deref())
            .ok_or(CanopyError::ParseFailed)?;

        debug!(
            language = grammar.name_str(),
            bytes = source.len(),
            incremental = old_tree.is_some(),
            "parsed source"
        );
        Ok(Tree::new(raw, source, grammar))
    }

    /// Parse UTF-8 text.
    pub fn parse_str(&mut self, source: &str, old_tree: Option<&Tree>) -> Result<Tree> {
        self.parse(source.as_bytes(), old_tree)
    }

    /// Discard any state left over from an interrupted parse.
    pub fn reset(&mut self) {
        self.raw.reset();
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("language", &self.grammar)
            .finish()
    }
}
