//! Pull-side of the binary codec: token stream → reader cursor.
//!
//! The reader keeps exactly one token of pushback. Entering a node drains
//! its attribute and value tokens, then reads one token ahead: a start
//! token means children remain, an end token means none do; either way the
//! token is pushed back for the next structural move. `MapIdToValue`
//! tokens are consumed transparently below the event level.

use std::io::Read;
use std::rc::Rc;

use crate::depth_state::{DepthFrame, DepthState};
use crate::id_registry::IdRegistry;
use crate::reader::HierarchicalReader;
use crate::token::{self, Token};
use crate::{Error, Result};

/// Hierarchical reader over the binary token protocol.
///
/// Positioned on the root node after construction. The byte source is
/// consumed token by token; hand in a `BufReader` for file or socket
/// sources.
pub struct BinaryReader<R: Read> {
    source: R,
    registry: IdRegistry,
    depth: DepthState,
    /// Genau ein Token Pushback (Lookahead fuer has_more_children/peek).
    pushback: Option<Token>,
    closed: bool,
}

impl<R: Read> BinaryReader<R> {
    /// Reads the root node's start token, attributes and value, leaving the
    /// reader positioned on the root.
    pub fn new(source: R) -> Result<Self> {
        let mut reader = Self {
            source,
            registry: IdRegistry::new(),
            depth: DepthState::new(),
            pushback: None,
            closed: false,
        };
        match reader.next_token()? {
            Some(Token::StartNode { id }) => reader.enter_node(id)?,
            Some(other) => {
                return Err(Error::unexpected_token("start of node", other.kind_name()));
            }
            None => return Err(Error::PrematureEndOfStream),
        }
        Ok(reader)
    }

    /// Naechstes sichtbares Token; `MapIdToValue` wird hier verarbeitet und
    /// nie nach oben gereicht. `None` am sauberen Stream-Ende.
    fn next_token(&mut self) -> Result<Option<Token>> {
        if let Some(t) = self.pushback.take() {
            return Ok(Some(t));
        }
        loop {
            match token::read_token(&mut self.source)? {
                Some(Token::MapIdToValue { id, value }) => self.registry.define(id, value),
                other => return Ok(other),
            }
        }
    }

    /// Betritt den Knoten mit Namens-ID `id`: Frame aufbauen, Attribute und
    /// Wert einlesen, Folge-Token als Lookahead zuruecklegen.
    fn enter_node(&mut self, id: u64) -> Result<()> {
        let name = self.registry.resolve(id)?;
        let mut frame = DepthFrame::new(name);
        loop {
            match self.next_token()? {
                Some(Token::Attribute { id, value }) => {
                    frame.add_attribute(self.registry.resolve(id)?, value);
                }
                Some(Token::Value { text }) => frame.append_value(&text),
                Some(structural) => {
                    frame.set_has_more_children(matches!(structural, Token::StartNode { .. }));
                    self.pushback = Some(structural);
                    break;
                }
                None => return Err(Error::PrematureEndOfStream),
            }
        }
        self.depth.push(frame);
        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::ReadAfterClose);
        }
        Ok(())
    }
}

impl<R: Read> HierarchicalReader for BinaryReader<R> {
    fn node_name(&self) -> Rc<str> {
        match self.depth.current() {
            Some(frame) => frame.name(),
            None => Rc::from(""),
        }
    }

    fn value(&mut self) -> Result<Rc<str>> {
        self.ensure_open()?;
        match self.depth.current() {
            Some(frame) => Ok(frame.value()),
            None => Ok(Rc::from("")),
        }
    }

    fn attribute_count(&self) -> usize {
        self.depth.current().map_or(0, DepthFrame::attribute_count)
    }

    fn attribute(&self, name: &str) -> Option<Rc<str>> {
        self.depth.current()?.attribute(name)
    }

    fn attribute_at(&self, index: usize) -> Option<Rc<str>> {
        self.depth.current()?.attribute_at(index)
    }

    fn attribute_name(&self, index: usize) -> Option<Rc<str>> {
        self.depth.current()?.attribute_name(index)
    }

    fn has_more_children(&mut self) -> Result<bool> {
        self.ensure_open()?;
        Ok(self.depth.current().is_some_and(DepthFrame::has_more_children))
    }

    fn move_down(&mut self) -> Result<()> {
        self.ensure_open()?;
        if !self.depth.current().is_some_and(DepthFrame::has_more_children) {
            return Err(Error::NoMoreChildren);
        }
        match self.next_token()? {
            Some(Token::StartNode { id }) => self.enter_node(id),
            Some(other) => Err(Error::unexpected_token("start of child node", other.kind_name())),
            None => Err(Error::PrematureEndOfStream),
        }
    }

    fn move_up(&mut self) -> Result<()> {
        self.ensure_open()?;
        if self.depth.depth() < 2 {
            return Err(Error::UnbalancedNode);
        }
        // Restliche Nachkommen des aktuellen Knotens vollstaendig
        // ueberspringen, verschachtelte Start/End-Paare mitzaehlen.
        let mut nested = 0usize;
        loop {
            match self.next_token()? {
                Some(Token::StartNode { .. }) => nested += 1,
                Some(Token::EndNode) => {
                    if nested == 0 {
                        break;
                    }
                    nested -= 1;
                }
                Some(_) => {}
                None => return Err(Error::PrematureEndOfStream),
            }
        }
        self.depth.pop()?;
        // Ein Token Lookahead entscheidet den Kinder-Status des Elters.
        let more = match self.next_token()? {
            Some(t) => {
                let more = matches!(t, Token::StartNode { .. });
                self.pushback = Some(t);
                more
            }
            None => false,
        };
        if let Some(parent) = self.depth.current_mut() {
            parent.set_has_more_children(more);
        }
        Ok(())
    }

    fn peek_next_child(&mut self) -> Result<Option<Rc<str>>> {
        self.ensure_open()?;
        if !self.depth.current().is_some_and(DepthFrame::has_more_children) {
            return Ok(None);
        }
        // has_more_children garantiert einen StartNode im Pushback.
        match &self.pushback {
            Some(Token::StartNode { id }) => self.registry.resolve(*id).map(Some),
            _ => Ok(None),
        }
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        self.pushback = None;
        Ok(())
    }
}
