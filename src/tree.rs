use crate::cursor::TreeCursor;
use crate::edit::TextEdit;
use crate::errors::Result;
use crate::grammar::GrammarHandle;
use crate::node::Node;
use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::Rc;
use tracing::debug;

/// State shared between a [`Tree`] and every [`Node`] or [`TreeCursor`]
/// created from it.
pub(crate) struct TreeState {
    /// The engine tree. Edits mutate it in place; they never change its
    /// shape, so descendant indices held by nodes stay valid.
    raw: RefCell<tree_sitter::Tree>,
    source: Rc<[u8]>,
    edited: Cell<bool>,
    /// Bumped by every edit so nodes know to re-read their positions.
    generation: Cell<u64>,
    grammar: GrammarHandle,
}

impl TreeState {
    pub(crate) fn raw(&self) -> Ref<'_, tree_sitter::Tree> {
        self.raw.borrow()
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation.get()
    }

    /// The retained source, unless an edit has made it stale.
    pub(crate) fn text(&self) -> Option<&[u8]> {
        if self.edited.get() {
            None
        } else {
            Some(&*self.source)
        }
    }

    pub(crate) fn grammar(&self) -> &GrammarHandle {
        &self.grammar
    }
}

/// A parsed syntax tree together with the source it was parsed from.
///
/// Nodes and cursors share ownership of the tree's state, so they remain
/// usable after the `Tree` value itself is dropped.
pub struct Tree {
    state: Rc<TreeState>,
}

impl Tree {
    pub(crate) fn new(raw: tree_sitter::Tree, source: Rc<[u8]>, grammar: GrammarHandle) -> Self {
        Self {
            state: Rc::new(TreeState {
                raw: RefCell::new(raw),
                source,
                edited: Cell::new(false),
                generation: Cell::new(0),
                grammar,
            }),
        }
    }

    pub fn root_node(&self) -> Node {
        Node::root(Rc::clone(&self.state))
    }

    /// The source this tree was parsed from, or `None` once it has been
    /// edited.
    pub fn text(&self) -> Option<&[u8]> {
        self.state.text()
    }

    /// A cursor positioned at the root node.
    pub fn walk(&self) -> TreeCursor {
        TreeCursor::new(self.root_node())
    }

    /// Record a source rewrite so the next parse can reuse untouched subtrees.
    ///
    /// The tree is edited in place: every node handle of this tree, old or
    /// new, observes the shifted positions and `has_changes`. Marks the tree
    /// as edited, which permanently disables [`Tree::text`] and
    /// [`Node::text`] for nodes of this tree. Several edits may be applied
    /// before reparsing.
    pub fn edit(&mut self, edit: &TextEdit) -> Result<()> {
        edit.validate()?;

        self.state.raw.borrow_mut().edit(&edit.to_input_edit());
        self.state.edited.set(true);
        self.state.generation.set(self.state.generation.get() + 1);

        debug!(
            start = edit.start_byte,
            old_end = edit.old_end_byte,
            new_end = edit.new_end_byte,
            "applied tree edit"
        );
        Ok(())
    }

    pub fn is_edited(&self) -> bool {
        self.state.edited.get()
    }

    pub fn language(&self) -> &GrammarHandle {
        &self.state.grammar
    }

    /// Length of the retained source in bytes.
    pub fn source_len(&self) -> usize {
        self.state.source.len()
    }

    pub(crate) fn raw(&self) -> Ref<'_, tree_sitter::Tree> {
        self.state.raw()
    }
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("language", &self.state.grammar.name_str())
            .field("source_len", &self.state.source.len())
            .field("edited", &self.state.edited.get())
            .finish()
    }
}
