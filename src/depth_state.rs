//! Reader-side depth tracking: one frame per currently-open ancestor node.
//!
//! Frames are pushed on `move_down`, populated while the underlying token
//! or event stream is consumed, and popped on `move_up`. A frame is owned
//! exclusively by its reader and never shared.
//!
//! Attribute lookup is a linear scan over an ordered `Vec` of pairs.
//! Attribute counts are small in practice; the scan beats hashing the same
//! way small string-table partitions do. Names need not be unique here;
//! uniqueness is a writer-side invariant.

use std::rc::Rc;

use crate::{Error, Result};

/// State for one open node: name, accumulated text value, ordered
/// attributes, and whether unread children remain.
#[derive(Debug, Clone)]
pub struct DepthFrame {
    name: Rc<str>,
    value: Option<Rc<str>>,
    attributes: Vec<(Rc<str>, Rc<str>)>,
    has_more_children: bool,
}

impl DepthFrame {
    /// Creates a frame for a freshly entered node.
    pub fn new(name: Rc<str>) -> Self {
        Self {
            name,
            value: None,
            attributes: Vec::new(),
            has_more_children: false,
        }
    }

    /// The node name.
    pub fn name(&self) -> Rc<str> {
        Rc::clone(&self.name)
    }

    /// The accumulated text value; empty string when none was seen.
    pub fn value(&self) -> Rc<str> {
        match &self.value {
            Some(value) => Rc::clone(value),
            None => Rc::from(""),
        }
    }

    /// Appends a text run. Repeated runs concatenate (text interrupted by
    /// ignorable content, or repeated value tokens from a foreign writer).
    pub fn append_value(&mut self, text: &str) {
        self.value = Some(match self.value.take() {
            None => Rc::from(text),
            Some(existing) => {
                let mut combined = String::with_capacity(existing.len() + text.len());
                combined.push_str(&existing);
                combined.push_str(text);
                Rc::from(combined.as_str())
            }
        });
    }

    /// Records an attribute, preserving document order.
    pub fn add_attribute(&mut self, name: Rc<str>, value: Rc<str>) {
        self.attributes.push((name, value));
    }

    /// Anzahl Attribute.
    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    /// Attributwert per Name (lineare Suche, erste Belegung gewinnt).
    pub fn attribute(&self, name: &str) -> Option<Rc<str>> {
        self.attributes
            .iter()
            .find(|(n, _)| &**n == name)
            .map(|(_, v)| Rc::clone(v))
    }

    /// Attributwert per Position.
    pub fn attribute_at(&self, index: usize) -> Option<Rc<str>> {
        self.attributes.get(index).map(|(_, v)| Rc::clone(v))
    }

    /// Attributname per Position.
    pub fn attribute_name(&self, index: usize) -> Option<Rc<str>> {
        self.attributes.get(index).map(|(n, _)| Rc::clone(n))
    }

    /// Whether unread children remain under this node.
    pub fn has_more_children(&self) -> bool {
        self.has_more_children
    }

    /// Updates the remaining-children flag from lookahead.
    pub fn set_has_more_children(&mut self, more: bool) {
        self.has_more_children = more;
    }
}

/// Stack of [`DepthFrame`]s, top = current node.
#[derive(Debug, Default)]
pub struct DepthState {
    frames: Vec<DepthFrame>,
}

impl DepthState {
    /// Leerer Stack.
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Aktuelle Tiefe (Anzahl offener Knoten).
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Pushes the frame of a freshly entered node.
    pub fn push(&mut self, frame: DepthFrame) {
        self.frames.push(frame);
    }

    /// Pops the current frame; [`Error::UnbalancedNode`] when the stack is
    /// already empty (more `move_up`s than `move_down`s).
    pub fn pop(&mut self) -> Result<DepthFrame> {
        self.frames.pop().ok_or(Error::UnbalancedNode)
    }

    /// The current node's frame, `None` before the root is entered.
    pub fn current(&self) -> Option<&DepthFrame> {
        self.frames.last()
    }

    /// Mutable Sicht auf den aktuellen Frame.
    pub fn current_mut(&mut self) -> Option<&mut DepthFrame> {
        self.frames.last_mut()
    }
}
