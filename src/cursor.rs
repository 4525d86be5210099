use crate::node::Node;
use std::cell::OnceCell;
use std::fmt;

/// A stateful navigator over the nodes below an anchor node.
///
/// The cursor stores only its anchor and current descendant index. Each move
/// replays that index on a fresh engine cursor, so independent cursors over
/// the same tree never observe each other.
pub struct TreeCursor {
    anchor: Node,
    current: usize,
    base_depth: u32,
    node: OnceCell<Node>,
}

impl TreeCursor {
    pub(crate) fn new(anchor: Node) -> Self {
        let current = anchor.index();
        let base_depth = anchor.with_cursor_at(current, |cursor| cursor.depth());
        Self {
            anchor,
            current,
            base_depth,
            node: OnceCell::new(),
        }
    }

    fn at_anchor(&self) -> bool {
        self.current == self.anchor.index()
    }

    fn with_raw<R>(&self, f: impl FnOnce(&mut tree_sitter::TreeCursor<'_>) -> R) -> R {
        self.anchor.with_cursor_at(self.current, f)
    }

    fn move_to(&mut self, target: Option<usize>) -> bool {
        match target {
            Some(index) => {
                self.current = index;
                self.node.take();
                true
            }
            None => false,
        }
    }

    /// The node at the current position.
    pub fn node(&self) -> &Node {
        self.node.get_or_init(|| self.anchor.resolve(self.current))
    }

    /// Name of the field linking the current node to its parent.
    ///
    /// Always `None` at the cursor's starting node.
    pub fn current_field_name(&self) -> Option<&'static str> {
        if self.at_anchor() {
            return None;
        }
        self.with_raw(|cursor| cursor.field_name())
    }

    pub fn current_field_id(&self) -> Option<u16> {
        if self.at_anchor() {
            return None;
        }
        self.with_raw(|cursor| cursor.field_id().map(|id| id.get()))
    }

    /// Depth below the node the cursor started from.
    pub fn depth(&self) -> u32 {
        self.with_raw(|cursor| cursor.depth()) - self.base_depth
    }

    pub fn goto_parent(&mut self) -> bool {
        if self.at_anchor() {
            return false;
        }
        let target = self.with_raw(|cursor| {
            cursor
                .goto_parent()
                .then(|| cursor.descendant_index())
        });
        self.move_to(target)
    }

    pub fn goto_first_child(&mut self) -> bool {
        let target = self.with_raw(|cursor| {
            cursor
                .goto_first_child()
                .then(|| cursor.descendant_index())
        });
        self.move_to(target)
    }

    pub fn goto_next_sibling(&mut self) -> bool {
        if self.at_anchor() {
            return false;
        }
        let target = self.with_raw(|cursor| {
            cursor
                .goto_next_sibling()
                .then(|| cursor.descendant_index())
        });
        self.move_to(target)
    }

    /// Restart the cursor at `node`, which becomes its new root.
    pub fn reset(&mut self, node: &Node) {
        *self = TreeCursor::new(node.clone());
    }
}

impl fmt::Debug for TreeCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeCursor")
            .field("anchor", &self.anchor)
            .field("current", &self.current)
            .finish()
    }
}
