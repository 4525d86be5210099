//! Owned node handles.
//!
//! A [`Node`] names a position in a tree by its preorder descendant index.
//! Edits only move nodes, never restructure them, so the index stays valid
//! for the life of the tree. Structural properties are read once when the
//! handle is created; positions are re-read after each edit. Navigation
//! re-enters the engine through a cursor that jumps straight to the stored
//! index.

use crate::cursor::TreeCursor;
use crate::errors::{CanopyError, Result};
use crate::grammar::GrammarHandle;
use crate::point::Point;
use crate::tree::TreeState;
use std::cell::{Cell, OnceCell};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Range;
use std::rc::Rc;

/// A node in a syntax tree.
///
/// Cloning is cheap and clones share the cached children list. Two nodes
/// compare equal when they denote the same position in the same tree,
/// however they were obtained, including across edits of that tree.
#[derive(Clone)]
pub struct Node {
    inner: Rc<NodeInner>,
}

struct NodeInner {
    tree: Rc<TreeState>,
    index: usize,
    facts: Facts,
    span: Cell<Span>,
    children: OnceCell<Vec<Node>>,
}

/// Properties an edit cannot change.
#[derive(Clone, Copy)]
struct Facts {
    kind: &'static str,
    kind_id: u16,
    is_named: bool,
    is_missing: bool,
    is_extra: bool,
    is_error: bool,
    has_error: bool,
    child_count: usize,
    named_child_count: usize,
}

impl Facts {
    fn read(node: tree_sitter::Node<'_>) -> Self {
        Self {
            kind: node.kind(),
            kind_id: node.kind_id(),
            is_named: node.is_named(),
            is_missing: node.is_missing(),
            is_extra: node.is_extra(),
            is_error: node.is_error(),
            has_error: node.has_error(),
            child_count: node.child_count(),
            named_child_count: node.named_child_count(),
        }
    }
}

/// Properties an edit may change, tagged with the tree generation they
/// were read at.
#[derive(Clone, Copy)]
struct Span {
    generation: u64,
    id: usize,
    has_changes: bool,
    start_byte: usize,
    end_byte: usize,
    start_point: Point,
    end_point: Point,
}

impl Span {
    fn read(node: tree_sitter::Node<'_>, generation: u64) -> Self {
        Self {
            generation,
            id: node.id(),
            has_changes: node.has_changes(),
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
            start_point: node.start_position().into(),
            end_point: node.end_position().into(),
        }
    }
}

impl Node {
    pub(crate) fn root(tree: Rc<TreeState>) -> Self {
        let (facts, span) = {
            let raw = tree.raw();
            let root = raw.root_node();
            (Facts::read(root), Span::read(root, tree.generation()))
        };
        Self::from_parts(tree, 0, facts, span)
    }

    fn from_parts(tree: Rc<TreeState>, index: usize, facts: Facts, span: Span) -> Self {
        Self {
            inner: Rc::new(NodeInner {
                tree,
                index,
                facts,
                span: Cell::new(span),
                children: OnceCell::new(),
            }),
        }
    }

    /// Run `f` with an engine cursor positioned at descendant `index` of
    /// this node's tree. The cursor is rooted at the tree root, so its
    /// descendant indices are absolute.
    pub(crate) fn with_cursor_at<R>(
        &self,
        index: usize,
        f: impl FnOnce(&mut tree_sitter::TreeCursor<'_>) -> R,
    ) -> R {
        let raw = self.inner.tree.raw();
        let mut cursor = raw.root_node().walk();
        cursor.goto_descendant(index);
        f(&mut cursor)
    }

    fn with_cursor<R>(&self, f: impl FnOnce(&mut tree_sitter::TreeCursor<'_>) -> R) -> R {
        self.with_cursor_at(self.inner.index, f)
    }

    /// Run `f` with the engine node this handle denotes.
    pub(crate) fn with_raw<R>(&self, f: impl FnOnce(tree_sitter::Node<'_>) -> R) -> R {
        self.with_cursor(|cursor| f(cursor.node()))
    }

    /// A handle for whatever `cursor` currently points at.
    pub(crate) fn sibling_handle(&self, cursor: &tree_sitter::TreeCursor<'_>) -> Node {
        let node = cursor.node();
        Self::from_parts(
            Rc::clone(&self.inner.tree),
            cursor.descendant_index(),
            Facts::read(node),
            Span::read(node, self.inner.tree.generation()),
        )
    }

    /// A handle for descendant `index` of the same tree.
    pub(crate) fn resolve(&self, index: usize) -> Node {
        if index == self.inner.index {
            return self.clone();
        }
        self.with_cursor_at(index, |cursor| self.sibling_handle(cursor))
    }

    /// Find the handle for `target`, which must be this node or one of its
    /// descendants in the same tree.
    pub(crate) fn locate(&self, target: tree_sitter::Node<'_>) -> Option<Node> {
        let anchor = self.id();
        let mut chain = Vec::new();
        let mut current = Some(target);
        while let Some(node) = current {
            chain.push(node.id());
            if node.id() == anchor {
                break;
            }
            current = node.parent();
        }
        if chain.pop() != Some(anchor) {
            return None;
        }

        self.with_cursor(|cursor| {
            while let Some(next) = chain.pop() {
                if !cursor.goto_first_child() {
                    return None;
                }
                while cursor.node().id() != next {
                    if !cursor.goto_next_sibling() {
                        return None;
                    }
                }
            }
            Some(self.sibling_handle(cursor))
        })
    }

    /// Like [`Node::locate`], failing with a materialization error.
    pub(crate) fn materialize(&self, target: tree_sitter::Node<'_>) -> Result<Node> {
        self.locate(target).ok_or(CanopyError::Materialize {
            kind: target.kind().to_string(),
            start_byte: target.start_byte(),
        })
    }

    pub(crate) fn index(&self) -> usize {
        self.inner.index
    }

    pub(crate) fn same_tree(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.inner.tree, &other.inner.tree)
    }

    /// The tree's retained source, or `None` once it has been edited.
    pub(crate) fn source(&self) -> Option<&[u8]> {
        self.inner.tree.text()
    }

    fn span(&self) -> Span {
        let generation = self.inner.tree.generation();
        let span = self.inner.span.get();
        if span.generation == generation {
            return span;
        }
        let span = self.with_raw(|raw| Span::read(raw, generation));
        self.inner.span.set(span);
        span
    }

    /// The engine's identifier for this node.
    ///
    /// Subtrees reused by an incremental parse keep their id, so this can be
    /// compared across trees; [`PartialEq`] cannot.
    pub fn id(&self) -> usize {
        self.span().id
    }

    pub fn kind(&self) -> &'static str {
        self.inner.facts.kind
    }

    pub fn kind_id(&self) -> u16 {
        self.inner.facts.kind_id
    }

    pub fn is_named(&self) -> bool {
        self.inner.facts.is_named
    }

    /// Whether the parser inserted this node to recover from an error.
    pub fn is_missing(&self) -> bool {
        self.inner.facts.is_missing
    }

    pub fn is_extra(&self) -> bool {
        self.inner.facts.is_extra
    }

    pub fn is_error(&self) -> bool {
        self.inner.facts.is_error
    }

    /// Whether an edit touched this node since it was parsed.
    pub fn has_changes(&self) -> bool {
        self.span().has_changes
    }

    /// Whether this node or any descendant is an error or missing node.
    pub fn has_error(&self) -> bool {
        self.inner.facts.has_error
    }

    pub fn start_byte(&self) -> usize {
        self.span().start_byte
    }

    pub fn end_byte(&self) -> usize {
        self.span().end_byte
    }

    pub fn byte_range(&self) -> Range<usize> {
        self.start_byte()..self.end_byte()
    }

    pub fn start_point(&self) -> Point {
        self.span().start_point
    }

    pub fn end_point(&self) -> Point {
        self.span().end_point
    }

    pub fn child_count(&self) -> usize {
        self.inner.facts.child_count
    }

    pub fn named_child_count(&self) -> usize {
        self.inner.facts.named_child_count
    }

    pub fn language(&self) -> &GrammarHandle {
        self.inner.tree.grammar()
    }

    /// All children in order, named and anonymous.
    ///
    /// Computed on first access and cached; later calls return the same
    /// slice.
    pub fn children(&self) -> &[Node] {
        self.inner.children.get_or_init(|| {
            self.with_cursor(|cursor| {
                let mut children = Vec::with_capacity(self.child_count());
                if cursor.goto_first_child() {
                    loop {
                        children.push(self.sibling_handle(cursor));
                        if !cursor.goto_next_sibling() {
                            break;
                        }
                    }
                }
                children
            })
        })
    }

    pub fn child(&self, i: usize) -> Option<&Node> {
        self.children().get(i)
    }

    pub fn named_children(&self) -> impl Iterator<Item = &Node> + '_ {
        self.children().iter().filter(|child| child.is_named())
    }

    pub fn parent(&self) -> Option<Node> {
        self.with_cursor(|cursor| cursor.goto_parent().then(|| self.sibling_handle(cursor)))
    }

    pub fn next_sibling(&self) -> Option<Node> {
        self.with_cursor(|cursor| {
            cursor
                .goto_next_sibling()
                .then(|| self.sibling_handle(cursor))
        })
    }

    pub fn prev_sibling(&self) -> Option<Node> {
        self.with_cursor(|cursor| {
            cursor
                .goto_previous_sibling()
                .then(|| self.sibling_handle(cursor))
        })
    }

    pub fn next_named_sibling(&self) -> Option<Node> {
        self.with_cursor(|cursor| {
            while cursor.goto_next_sibling() {
                if cursor.node().is_named() {
                    return Some(self.sibling_handle(cursor));
                }
            }
            None
        })
    }

    pub fn prev_named_sibling(&self) -> Option<Node> {
        self.with_cursor(|cursor| {
            while cursor.goto_previous_sibling() {
                if cursor.node().is_named() {
                    return Some(self.sibling_handle(cursor));
                }
            }
            None
        })
    }

    /// The child attached through the field with numeric `field_id`.
    pub fn child_by_field_id(&self, field_id: u16) -> Option<Node> {
        self.with_raw(|raw| self.locate(raw.child_by_field_id(field_id)?))
    }

    /// The child attached through the field called `name`.
    pub fn child_by_field_name(&self, name: &str) -> Option<Node> {
        self.with_raw(|raw| self.locate(raw.child_by_field_name(name)?))
    }

    /// S-expression rendering of the subtree rooted here.
    pub fn to_sexp(&self) -> String {
        self.with_raw(|raw| raw.to_sexp())
    }

    /// A cursor whose root is this node.
    pub fn walk(&self) -> TreeCursor {
        TreeCursor::new(self.clone())
    }

    /// The source bytes this node spans, or `None` if the owning tree has
    /// been edited since it was parsed.
    pub fn text(&self) -> Option<&[u8]> {
        self.inner.tree.text()?.get(self.byte_range())
    }

    /// The node's text as UTF-8.
    pub fn utf8_text(&self) -> Result<&str> {
        let bytes = self.text().ok_or(CanopyError::TextUnavailable {
            start_byte: self.start_byte(),
            end_byte: self.end_byte(),
        })?;
        Ok(std::str::from_utf8(bytes)?)
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.same_tree(other) && self.inner.index == other.inner.index
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Rc::as_ptr(&self.inner.tree).hash(state);
        self.inner.index.hash(state);
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (start, end) = (self.start_point(), self.end_point());
        if self.is_named() {
            write!(f, "<Node kind={}", self.kind())?;
        } else {
            write!(f, "<Node kind={:?}", self.kind())?;
        }
        write!(
            f,
            ", start_point=({}, {}), end_point=({}, {})>",
            start.row, start.column, end.row, end.column
        )
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("kind", &self.kind())
            .field("range", &self.byte_range())
            .field("index", &self.inner.index)
            .finish()
    }
}
