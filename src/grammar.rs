//! Grammar selection.
//!
//! Anything that can hand out a tree-sitter [`Language`] implements
//! [`Grammar`]. Version compatibility is checked once, when a grammar is
//! bound into a [`GrammarHandle`]; parsers, trees, and queries only ever
//! hold handles that already passed the check.

use crate::errors::{CanopyError, Result};
use ast_grep_language::{LanguageExt, SupportLang};
use std::fmt;
use std::rc::Rc;
use tree_sitter::Language;

/// Newest grammar ABI version the engine understands.
pub const CURRENT_VERSION: usize = tree_sitter::LANGUAGE_VERSION;

/// Oldest grammar ABI version the engine still accepts.
pub const MIN_COMPATIBLE_VERSION: usize = tree_sitter::MIN_COMPATIBLE_LANGUAGE_VERSION;

/// A source of a tree-sitter language with a stable name.
pub trait Grammar {
    /// The engine language this grammar parses with.
    fn language(&self) -> Language;

    /// Human-readable name used in diagnostics.
    fn name(&self) -> String;

    fn abi_version(&self) -> usize {
        self.language().abi_version()
    }

    /// Numeric id of the field called `name`, if the grammar defines one.
    fn field_id_for_name(&self, name: &str) -> Option<u16> {
        self.language().field_id_for_name(name).map(|id| id.get())
    }

    fn field_name_for_id(&self, id: u16) -> Option<&'static str> {
        self.language().field_name_for_id(id)
    }
}

impl Grammar for SupportLang {
    fn language(&self) -> Language {
        self.get_ts_language()
    }

    fn name(&self) -> String {
        self.to_string().to_lowercase()
    }
}

impl Grammar for Language {
    fn language(&self) -> Language {
        self.clone()
    }

    fn name(&self) -> String {
        "unnamed".to_string()
    }
}

impl<G: Grammar + ?Sized> Grammar for &G {
    fn language(&self) -> Language {
        (**self).language()
    }

    fn name(&self) -> String {
        (**self).name()
    }
}

/// A raw language paired with an explicit name.
#[derive(Debug, Clone)]
pub struct NamedLanguage {
    name: String,
    language: Language,
}

impl NamedLanguage {
    pub fn new(name: impl Into<String>, language: Language) -> Self {
        Self {
            name: name.into(),
            language,
        }
    }
}

impl Grammar for NamedLanguage {
    fn language(&self) -> Language {
        self.language.clone()
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

/// A grammar that passed the version check.
///
/// Handles compare equal when they wrap the same underlying language,
/// regardless of the name they were bound under.
#[derive(Clone)]
pub struct GrammarHandle {
    name: Rc<str>,
    language: Language,
}

impl GrammarHandle {
    /// Bind `grammar`, rejecting it if its ABI version is outside
    /// [`MIN_COMPATIBLE_VERSION`]..=[`CURRENT_VERSION`].
    pub fn bind(grammar: &impl Grammar) -> Result<Self> {
        let language = grammar.language();
        check_version(&grammar.name(), language.abi_version())?;
        Ok(Self {
            name: grammar.name().into(),
            language,
        })
    }

    pub fn raw(&self) -> &Language {
        &self.language
    }

    pub fn name_str(&self) -> &str {
        &self.name
    }
}

impl Grammar for GrammarHandle {
    fn language(&self) -> Language {
        self.language.clone()
    }

    fn name(&self) -> String {
        self.name.to_string()
    }
}

impl PartialEq for GrammarHandle {
    fn eq(&self, other: &Self) -> bool {
        self.language == other.language
    }
}

impl Eq for GrammarHandle {}

impl fmt::Debug for GrammarHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrammarHandle")
            .field("name", &self.name)
            .field("abi_version", &self.language.abi_version())
            .finish()
    }
}

fn check_version(name: &str, version: usize) -> Result<()> {
    if version == 0 {
        return Err(CanopyError::InvalidLanguage {
            name: name.to_string(),
            version,
        });
    }
    if !(MIN_COMPATIBLE_VERSION..=CURRENT_VERSION).contains(&version) {
        return Err(CanopyError::IncompatibleLanguage {
            version,
            min: MIN_COMPATIBLE_VERSION,
            max: CURRENT_VERSION,
        });
    }
    Ok(())
}

/// Resolve a grammar by name (`"python"`, `"rust"`, `"ts"`, ...).
pub fn lookup(name: &str) -> Result<SupportLang> {
    name.parse::<SupportLang>()
        .map_err(|_| CanopyError::UnknownLanguage {
            name: name.to_string(),
        })
}

/// Names of every bundled grammar, sorted.
pub fn supported_names() -> Vec<String> {
    let mut names: Vec<String> = SupportLang::all_langs()
        .iter()
        .map(Grammar::name)
        .collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn bundled_grammars_are_compatible() {
        for lang in SupportLang::all_langs() {
            let handle = GrammarHandle::bind(lang).unwrap();
            let version = handle.abi_version();
            assert!(
                (MIN_COMPATIBLE_VERSION..=CURRENT_VERSION).contains(&version),
                "{} reports version {version}",
                handle.name_str()
            );
        }
    }

    #[test]
    fn version_window_is_enforced() {
        assert!(check_version("x", CURRENT_VERSION).is_ok());
        assert!(check_version("x", MIN_COMPATIBLE_VERSION).is_ok());

        let err = check_version("x", CURRENT_VERSION + 1).unwrap_err();
        assert!(matches!(err, CanopyError::IncompatibleLanguage { .. }));
        assert_eq!(err.kind(), ErrorKind::InvalidValue);

        let err = check_version("x", 0).unwrap_err();
        assert!(matches!(err, CanopyError::InvalidLanguage { .. }));
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(lookup("python").unwrap(), SupportLang::Python);
        assert_eq!(lookup("rust").unwrap(), SupportLang::Rust);
        assert!(matches!(
            lookup("klingon"),
            Err(CanopyError::UnknownLanguage { .. })
        ));
    }

    #[test]
    fn handles_compare_by_language() {
        let a = GrammarHandle::bind(&SupportLang::Python).unwrap();
        let b = GrammarHandle::bind(&NamedLanguage::new(
            "py",
            SupportLang::Python.get_ts_language(),
        ))
        .unwrap();
        let c = GrammarHandle::bind(&SupportLang::Rust).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn field_lookup_round_trips() {
        let python = SupportLang::Python;
        let id = python.field_id_for_name("left").unwrap();
        assert_eq!(python.field_name_for_id(id), Some("left"));
        assert_eq!(python.field_id_for_name("no_such_field"), None);
    }
}
