//! Draining a reader into a writer, the canonical consumer of both
//! contracts.
//!
//! Copies the node the reader is positioned on, including attributes and
//! the whole subtree beneath it, in document order. A node with children
//! copies its children; only a childless node copies its text value.
//! Mixed content does not occur in object-graph-shaped documents.

use crate::reader::HierarchicalReader;
use crate::writer::HierarchicalWriter;
use crate::Result;

/// Recursively copies the current node of `source` into `destination`.
///
/// The reader position is back on the same node afterwards (children are
/// consumed); the writer has received one complete balanced subtree.
///
/// ```
/// use hiero::{copy, BinaryReader, BinaryWriter, HierarchicalWriter, XmlWriter};
///
/// let mut w = BinaryWriter::new(Vec::new());
/// w.start_node("doc").unwrap();
/// w.set_value("hi").unwrap();
/// w.end_node().unwrap();
/// let bytes = w.into_inner();
///
/// let mut reader = BinaryReader::new(bytes.as_slice()).unwrap();
/// let mut writer = XmlWriter::compact(Vec::new());
/// copy(&mut reader, &mut writer).unwrap();
/// assert_eq!(writer.into_inner(), b"<doc>hi</doc>");
/// ```
pub fn copy<R, W>(source: &mut R, destination: &mut W) -> Result<()>
where
    R: HierarchicalReader,
    W: HierarchicalWriter,
{
    destination.start_node(&source.node_name())?;
    for index in 0..source.attribute_count() {
        let (Some(name), Some(value)) = (source.attribute_name(index), source.attribute_at(index))
        else {
            break;
        };
        destination.add_attribute(&name, &value)?;
    }
    if source.has_more_children()? {
        while source.has_more_children()? {
            source.move_down()?;
            copy(source, destination)?;
            source.move_up()?;
        }
    } else {
        let text = source.value()?;
        if !text.is_empty() {
            destination.set_value(&text)?;
        }
    }
    destination.end_node()
}
