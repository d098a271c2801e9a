//! Per-stream interning of node and attribute names to small integer IDs.
//!
//! The writer assigns the next unused ID the first time a name occurs and
//! emits the mapping before the first referencing token; the reader
//! populates its own table from those mapping tokens. One registry per
//! stream, never shared and never reused across streams.

use std::rc::Rc;

use crate::{Error, FastHashMap, Result};

/// Bidirectional name⇄ID table, built incrementally.
///
/// Writer side uses [`intern`](Self::intern), reader side
/// [`define`](Self::define) and [`resolve`](Self::resolve); one instance
/// only ever exercises one side.
#[derive(Debug, Default)]
pub struct IdRegistry {
    /// Name → ID (Writer-Richtung).
    ids: FastHashMap<Rc<str>, u64>,
    /// ID → Name, direkt integer-indiziert (Reader-Richtung).
    values: FastHashMap<u64, Rc<str>>,
    next_id: u64,
}

impl IdRegistry {
    /// Empty registry; the first interned name gets ID 1.
    pub fn new() -> Self {
        Self {
            ids: FastHashMap::default(),
            values: FastHashMap::default(),
            next_id: 1,
        }
    }

    /// Returns the ID for `name`, assigning the next unused one on first
    /// sight. `Some(name)` in the second slot signals a fresh assignment
    /// the writer must announce with a mapping token before use.
    pub fn intern(&mut self, name: &str) -> (u64, Option<Rc<str>>) {
        if let Some(&id) = self.ids.get(name) {
            return (id, None);
        }
        let id = self.next_id;
        self.next_id += 1;
        let rc: Rc<str> = Rc::from(name);
        self.ids.insert(Rc::clone(&rc), id);
        self.values.insert(id, Rc::clone(&rc));
        (id, Some(rc))
    }

    /// Records a mapping seen on the wire (reader side). Idempotent for
    /// identical redefinitions; a conforming writer never redefines.
    pub fn define(&mut self, id: u64, value: Rc<str>) {
        self.ids.insert(Rc::clone(&value), id);
        self.values.insert(id, value);
    }

    /// Looks up the name behind `id`; [`Error::UnknownId`] when no mapping
    /// token defined it.
    pub fn resolve(&self, id: u64) -> Result<Rc<str>> {
        self.values.get(&id).cloned().ok_or(Error::UnknownId(id))
    }

    /// Anzahl bekannter Zuordnungen.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True solange keine Namen interniert wurden.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
