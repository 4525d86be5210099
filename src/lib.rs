//! Canopy: owned, incremental syntax trees over tree-sitter
//!
//! Canopy wraps the tree-sitter engine in handles that carry no borrow
//! lifetimes. Nodes and cursors share ownership of the tree they came from,
//! so they can be stored, cloned, and passed around freely.
//!
//! # Architecture
//!
//! - [`Parser`] binds a [`Grammar`] and produces [`Tree`]s, either from
//!   scratch or incrementally from an edited tree.
//! - [`Tree`] keeps the engine tree and the source it was parsed from.
//!   [`Tree::edit`] records a [`TextEdit`] and retires the source text.
//! - [`Node`] is a cheap, clonable handle naming one position in a tree. Its
//!   children list is built once and cached.
//! - [`TreeCursor`] walks the nodes below a starting node.
//! - [`Query`] compiles patterns once and translates engine captures into
//!   `(Node, name)` pairs.
//!
//! All handles are `Rc`-based and stay on the thread that created them.
//!
//! # Example
//!
//! ```no_run
//! use canopy::{Parser, Query, SupportLang};
//!
//! # fn main() -> canopy::Result<()> {
//! let mut parser = Parser::with_grammar(&SupportLang::Python)?;
//! let tree = parser.parse_str("1 + 2", None)?;
//!
//! let query = Query::new(&SupportLang::Python, "(integer) @int")?;
//! for capture in query.captures(&tree.root_node(), None)? {
//!     println!("{} {:?}", capture.name, capture.node.utf8_text()?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod cursor;
pub mod edit;
pub mod errors;
pub mod grammar;
pub mod node;
pub mod parser;
mod pool;
pub mod point;
pub mod query;
pub mod tree;

// Re-exports
pub use ast_grep_language::SupportLang;
pub use config::{load_from_path, load_from_str, ConfigError, QuerySet};
pub use cursor::TreeCursor;
pub use edit::TextEdit;
pub use errors::{CanopyError, ErrorKind, Result};
pub use grammar::{
    Grammar, GrammarHandle, NamedLanguage, CURRENT_VERSION, MIN_COMPATIBLE_VERSION,
};
pub use node::Node;
pub use parser::Parser;
pub use point::Point;
pub use query::{Capture, Query, QueryMatch};
pub use tree::Tree;
