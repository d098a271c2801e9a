//! Writer decoration enforcing the structural state machine.
//!
//! Tracks a finite state machine over writer calls and rejects illegal
//! sequences before they reach the wrapped writer: attribute after value,
//! duplicate attribute names on one node, more closes than opens, any write
//! after close. Valid calls forward to the inner writer unchanged.
//!
//! `close()` is the one call that never fails, so that cleanup in a
//! failure path cannot mask the original error. An inner close failure is
//! reported via `log::warn` instead.

use std::rc::Rc;

use crate::writer::HierarchicalWriter;
use crate::{Error, FastHashSet, Result};

/// Zustaende: Open → NodeStart → {Value, NodeStart, NodeEnd} → … → Closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Initial; no node opened yet (or all nodes closed again).
    Open,
    /// Directly after `start_node`; attributes are still legal.
    NodeStart,
    /// After `set_value`; only `end_node` may follow.
    Value,
    /// After `end_node`; a sibling may open or the parent may close.
    NodeEnd,
    /// Terminal.
    Closed,
}

/// Decorating writer that validates call sequences for the writer it wraps.
///
/// The balance counter never goes negative and an attribute name is never
/// accepted twice for the same node; violations surface as synchronous
/// errors at the offending call and nothing is forwarded for them.
pub struct StatefulWriter<W: HierarchicalWriter> {
    inner: W,
    state: State,
    balance: usize,
    /// Pro offenem Knoten die bereits gesehenen Attributnamen.
    attributes: Vec<FastHashSet<Rc<str>>>,
}

impl<W: HierarchicalWriter> StatefulWriter<W> {
    /// Wraps `inner`, starting in the initial state.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            state: State::Open,
            balance: 0,
            attributes: Vec::new(),
        }
    }

    /// The wrapped writer.
    pub fn inner(&self) -> &W {
        &self.inner
    }

    /// Mutable Sicht auf den inneren Writer.
    pub fn inner_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Unwraps into the inner writer, discarding the state machine.
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Anzahl aktuell offener Knoten.
    pub fn balance(&self) -> usize {
        self.balance
    }

    fn ensure_open(&self) -> Result<()> {
        if self.state == State::Closed {
            return Err(Error::WriteAfterClose);
        }
        Ok(())
    }

    fn do_start_node(&mut self, name: &str, hint: Option<&str>) -> Result<()> {
        self.ensure_open()?;
        if self.state == State::Value {
            return Err(Error::NodeAfterValue(name.into()));
        }
        self.state = State::NodeStart;
        self.balance += 1;
        self.attributes.push(FastHashSet::default());
        match hint {
            Some(hint) => self.inner.start_node_with_hint(name, Some(hint)),
            None => self.inner.start_node(name),
        }
    }
}

impl<W: HierarchicalWriter> HierarchicalWriter for StatefulWriter<W> {
    fn start_node(&mut self, name: &str) -> Result<()> {
        self.do_start_node(name, None)
    }

    fn start_node_with_hint(&mut self, name: &str, hint: Option<&str>) -> Result<()> {
        self.do_start_node(name, hint)
    }

    fn add_attribute(&mut self, name: &str, value: &str) -> Result<()> {
        self.ensure_open()?;
        if self.state != State::NodeStart {
            return Err(Error::AttributeWithoutNode(name.into()));
        }
        // self.state == NodeStart garantiert einen offenen Knoten.
        let seen = self
            .attributes
            .last_mut()
            .ok_or_else(|| Error::AttributeWithoutNode(name.into()))?;
        if !seen.insert(Rc::from(name)) {
            return Err(Error::duplicate_attribute(name));
        }
        self.inner.add_attribute(name, value)
    }

    fn set_value(&mut self, text: &str) -> Result<()> {
        self.ensure_open()?;
        if self.state != State::NodeStart {
            return Err(Error::ValueWithoutNode);
        }
        self.state = State::Value;
        self.inner.set_value(text)
    }

    fn end_node(&mut self) -> Result<()> {
        self.ensure_open()?;
        if self.balance == 0 {
            return Err(Error::UnbalancedNode);
        }
        self.balance -= 1;
        self.attributes.pop();
        self.state = State::NodeEnd;
        self.inner.end_node()
    }

    fn flush(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.inner.flush()
    }

    /// Idempotent and infallible, accepted from any state, including an
    /// unbalanced writer in a cleanup path.
    fn close(&mut self) -> Result<()> {
        if self.state == State::Closed {
            return Ok(());
        }
        self.state = State::Closed;
        if let Err(e) = self.inner.close() {
            log::warn!("suppressed close failure on wrapped writer: {e}");
        }
        Ok(())
    }
}
