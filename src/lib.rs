//! hiero – hierarchical event-stream serialization.
//!
//! A pull-style reader and push-style writer abstraction over hierarchical
//! documents (named nodes carrying attributes, an optional text value and
//! child nodes), with two concrete codecs: a compact binary format that
//! interns repeated names into small integer IDs, and a pretty-printing
//! XML format. Any reader can be drained into any writer through the
//! [`copier`], so formats convert into each other without an intermediate
//! document tree.
//!
//! # Beispiel
//!
//! ```
//! use hiero::{BinaryReader, BinaryWriter, HierarchicalReader, HierarchicalWriter, StatefulWriter};
//!
//! // Write
//! let mut writer = StatefulWriter::new(BinaryWriter::new(Vec::new()));
//! writer.start_node("greeting").unwrap();
//! writer.add_attribute("lang", "en").unwrap();
//! writer.set_value("Hello").unwrap();
//! writer.end_node().unwrap();
//! writer.close().unwrap();
//! let bytes = writer.into_inner().into_inner();
//!
//! // Read back; the reader is positioned on the root node.
//! let mut reader = BinaryReader::new(bytes.as_slice()).unwrap();
//! assert_eq!(&*reader.node_name(), "greeting");
//! assert_eq!(reader.attribute("lang").as_deref(), Some("en"));
//! assert_eq!(&*reader.value().unwrap(), "Hello");
//! ```

pub mod binary_reader;
pub mod binary_writer;
pub mod copier;
pub mod depth_state;
pub mod error;
pub mod id_registry;
pub mod name_coder;
pub mod reader;
pub mod stateful;
pub mod token;
pub mod writer;
pub mod xml_reader;
pub mod xml_writer;

pub use error::{Error, Result};

/// HashMap mit ahash (schneller, nicht DoS-resistent — für interne Datenstrukturen).
pub(crate) type FastHashMap<K, V> = hashbrown::HashMap<K, V, ahash::RandomState>;

/// HashSet mit ahash.
pub(crate) type FastHashSet<K> = hashbrown::HashSet<K, ahash::RandomState>;

// Public API: contracts
pub use reader::{AttributeNames, HierarchicalReader};
pub use writer::HierarchicalWriter;

// Public API: name coding
pub use name_coder::{NameCoder, NoNameCoder, XmlFriendlyNameCoder};

// Public API: writer state validation
pub use stateful::StatefulWriter;

// Public API: binary codec
pub use binary_reader::BinaryReader;
pub use binary_writer::BinaryWriter;
pub use token::Token;

// Public API: XML codec
pub use xml_reader::XmlReader;
pub use xml_writer::{CharMode, XmlWriter, XmlWriterConfig};

// Public API: copier
pub use copier::copy;
