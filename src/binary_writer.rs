//! Push-side of the binary codec: writer calls → token stream.
//!
//! Every node and attribute *name* is interned: the first occurrence emits
//! a `MapIdToValue` token immediately followed by the referencing token;
//! later occurrences reference the existing ID. Values travel literally.
//!
//! The writer performs no structural validation of its own; compose it
//! with [`StatefulWriter`](crate::StatefulWriter) for full call-sequence
//! enforcement, which is how the CLI and the tests build their pipelines.
//! Names are stored verbatim on the wire, so no name coder is involved.

use std::io::Write;

use crate::error::io_err;
use crate::id_registry::IdRegistry;
use crate::token;
use crate::writer::HierarchicalWriter;
use crate::{Error, Result};

/// Hierarchical writer emitting the binary token protocol.
pub struct BinaryWriter<W: Write> {
    sink: W,
    registry: IdRegistry,
    closed: bool,
}

impl<W: Write> BinaryWriter<W> {
    /// Writer over `sink`. The sink is used unbuffered; hand in a
    /// `BufWriter` when writing to a file or socket.
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            registry: IdRegistry::new(),
            closed: false,
        }
    }

    /// The underlying sink.
    pub fn inner(&self) -> &W {
        &self.sink
    }

    /// Unwraps into the underlying sink without flushing.
    pub fn into_inner(self) -> W {
        self.sink
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::WriteAfterClose);
        }
        Ok(())
    }

    /// Interniert einen Namen; beim ersten Auftreten geht das Mapping-Token
    /// direkt vor dem referenzierenden Token auf die Leitung.
    fn intern(&mut self, name: &str) -> Result<u64> {
        let (id, fresh) = self.registry.intern(name);
        if let Some(value) = fresh {
            token::write_map_id_to_value(&mut self.sink, id, &value)?;
        }
        Ok(id)
    }
}

impl<W: Write> HierarchicalWriter for BinaryWriter<W> {
    fn start_node(&mut self, name: &str) -> Result<()> {
        self.ensure_open()?;
        let id = self.intern(name)?;
        token::write_start_node(&mut self.sink, id)
    }

    fn add_attribute(&mut self, name: &str, value: &str) -> Result<()> {
        self.ensure_open()?;
        let id = self.intern(name)?;
        token::write_attribute(&mut self.sink, id, value)
    }

    fn set_value(&mut self, text: &str) -> Result<()> {
        self.ensure_open()?;
        token::write_value(&mut self.sink, text)
    }

    fn end_node(&mut self) -> Result<()> {
        self.ensure_open()?;
        token::write_end_node(&mut self.sink)
    }

    fn flush(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.sink.flush().map_err(io_err)
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.sink.flush().map_err(io_err)?;
        self.closed = true;
        Ok(())
    }
}
