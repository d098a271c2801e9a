//! The push-side contract: an emitter for hierarchical documents.
//!
//! Calls must follow the structural grammar: attributes only directly after
//! [`start_node`](HierarchicalWriter::start_node), at most one value per
//! node before any child, every opened node closed exactly once. Concrete
//! writers check what falls out of their own bookkeeping; wrap a writer in
//! [`StatefulWriter`](crate::StatefulWriter) for full enforcement.
//!
//! Decorators expose the writer they wrap through `inner()` / `inner_mut()` /
//! `into_inner()` on their concrete type rather than a dynamic unwrap.

use crate::Result;

/// Push-style emitter for hierarchical documents.
pub trait HierarchicalWriter {
    /// Opens a new child of the current node, or a new root if none is open.
    fn start_node(&mut self, name: &str) -> Result<()>;

    /// Like [`start_node`](Self::start_node), additionally carrying a type
    /// hint for format variants that record one. Formats without type
    /// metadata ignore the hint; the default does exactly that.
    fn start_node_with_hint(&mut self, name: &str, hint: Option<&str>) -> Result<()> {
        let _ = hint;
        self.start_node(name)
    }

    /// Adds an attribute to the most recently opened node. Legal only
    /// directly after `start_node`, before any value or child.
    fn add_attribute(&mut self, name: &str, value: &str) -> Result<()>;

    /// Sets the text value of the most recently opened node. Legal at most
    /// once per node, before any child.
    fn set_value(&mut self, text: &str) -> Result<()>;

    /// Closes the most recently opened unclosed node.
    fn end_node(&mut self) -> Result<()>;

    /// Flushes buffered output to the underlying sink.
    fn flush(&mut self) -> Result<()>;

    /// Flushes and releases the underlying sink. Writing afterwards fails
    /// with [`Error::WriteAfterClose`](crate::Error::WriteAfterClose).
    fn close(&mut self) -> Result<()>;
}
