//! Central error types for the hierarchical stream core.
//!
//! All failure sources share one enum: structural misuse of a reader or
//! writer, wire-format violations in the binary codec, character-validity
//! violations in the XML codec, and wrapped I/O failures. Callers get a
//! single error channel regardless of cause; nothing in this crate retries.

use core::fmt;

/// All error conditions raised by readers, writers and codecs.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// A node was closed that was never opened, or a reader was moved up
    /// past its root.
    UnbalancedNode,
    /// The same attribute name was written twice on one node.
    DuplicateAttribute(String),
    /// An attribute was written while no start tag was open.
    AttributeWithoutNode(String),
    /// A text value was written while no start tag was open, or after the
    /// node already received a value.
    ValueWithoutNode,
    /// A child node was opened after the parent already received a text value.
    NodeAfterValue(String),
    /// A writer call arrived after `close()`.
    WriteAfterClose,
    /// A reader call arrived after `close()`.
    ReadAfterClose,
    /// `move_down()` was called although the current node has no unread child.
    NoMoreChildren,
    /// A binary token referenced an ID that was never mapped to a name.
    UnknownId(u64),
    /// An unknown token discriminator byte in the binary stream.
    InvalidTokenKind(u8),
    /// A structurally valid token appeared where a different kind was required.
    UnexpectedToken {
        /// Was erwartet wurde.
        expected: &'static str,
        /// Was gefunden wurde.
        found: &'static str,
    },
    /// The byte stream ended in the middle of a token or an open node.
    PrematureEndOfStream,
    /// A token payload violates the wire format (e.g. non-UTF-8 string bytes).
    MalformedToken(&'static str),
    /// A varint exceeds the 64-bit value range.
    IntegerOverflow,
    /// A character is not representable under the selected validity mode.
    DisallowedCharacter {
        /// The offending code point.
        code_point: u32,
        /// The active validity mode, for diagnostics.
        mode: &'static str,
    },
    /// An optional reader capability is not provided by this implementation.
    Unsupported(&'static str),
    /// XML parsing failed.
    XmlParseError(String),
    /// An I/O failure on the underlying byte stream, carrying the original
    /// message.
    IoError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnbalancedNode => write!(f, "unbalanced node"),
            Self::DuplicateAttribute(name) => {
                write!(f, "writing attribute '{name}' twice")
            }
            Self::AttributeWithoutNode(name) => {
                write!(f, "writing attribute '{name}' without an opened node")
            }
            Self::ValueWithoutNode => write!(f, "writing text without an opened node"),
            Self::NodeAfterValue(name) => {
                write!(f, "opening node '{name}' after writing text")
            }
            Self::WriteAfterClose => write!(f, "writing on a closed stream"),
            Self::ReadAfterClose => write!(f, "reading on a closed stream"),
            Self::NoMoreChildren => write!(f, "current node has no more children to read"),
            Self::UnknownId(id) => write!(f, "token references unknown name id {id}"),
            Self::InvalidTokenKind(kind) => {
                write!(f, "invalid token discriminator 0x{kind:02x}")
            }
            Self::UnexpectedToken { expected, found } => {
                write!(f, "unexpected token: expected {expected}, found {found}")
            }
            Self::PrematureEndOfStream => write!(f, "premature end of stream"),
            Self::MalformedToken(msg) => write!(f, "malformed token: {msg}"),
            Self::IntegerOverflow => write!(f, "varint exceeds 64-bit range"),
            Self::DisallowedCharacter { code_point, mode } => {
                write!(f, "invalid character 0x{code_point:x} for {mode} output")
            }
            Self::Unsupported(op) => write!(f, "operation '{op}' not supported by this reader"),
            Self::XmlParseError(msg) => write!(f, "XML parse error: {msg}"),
            Self::IoError(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Erstellt einen `DuplicateAttribute` Fehler.
    pub fn duplicate_attribute(name: impl Into<String>) -> Self {
        Self::DuplicateAttribute(name.into())
    }

    /// Erstellt einen `UnexpectedToken` Fehler mit Kontext.
    pub fn unexpected_token(expected: &'static str, found: &'static str) -> Self {
        Self::UnexpectedToken { expected, found }
    }
}

/// io::Error → Error Konvertierung (eine Fehlerschiene fuer alle Ursachen).
pub(crate) fn io_err(e: std::io::Error) -> Error {
    Error::IoError(e.to_string())
}

/// A convenience `Result` type alias using [`Error`].
pub type Result<T> = core::result::Result<T, Error>;
