//! Pluggable mapping between in-memory identifier names and format-safe names.
//!
//! Node names and attribute names are two independent channels; a coder may
//! treat them differently. Encode and decode must be pure inverses:
//! `decode(encode(x)) == x` for every supported name.

use std::borrow::Cow;

use memchr::{memchr, memchr2};

/// Bidirectional name mapping consumed by readers (decode) and writers (encode).
///
/// Implementations are stateless; the same input always yields the same
/// output. The identity mapping [`NoNameCoder`] is the default everywhere.
pub trait NameCoder {
    /// Maps a node name to its format-safe representation.
    fn encode_node<'a>(&self, name: &'a str) -> Cow<'a, str>;

    /// Inverse of [`encode_node`](Self::encode_node).
    fn decode_node<'a>(&self, name: &'a str) -> Cow<'a, str>;

    /// Maps an attribute name to its format-safe representation.
    fn encode_attribute<'a>(&self, name: &'a str) -> Cow<'a, str>;

    /// Inverse of [`encode_attribute`](Self::encode_attribute).
    fn decode_attribute<'a>(&self, name: &'a str) -> Cow<'a, str>;
}

/// Identity coder: names pass through unchanged in both channels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoNameCoder;

impl NameCoder for NoNameCoder {
    fn encode_node<'a>(&self, name: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(name)
    }

    fn decode_node<'a>(&self, name: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(name)
    }

    fn encode_attribute<'a>(&self, name: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(name)
    }

    fn decode_attribute<'a>(&self, name: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(name)
    }
}

/// Substitution coder making arbitrary identifier names XML-safe.
///
/// `$` ist in XML-Namen nicht erlaubt, kommt aber in generierten
/// Bezeichnern vor (inner classes, Codegeneratoren). Encoding ersetzt
/// `$` → `_-` und maskiert vorhandene `_` als `__`; Decoding kehrt beides
/// um. Beide Kanaele (Node/Attribut) verwenden dieselbe Ersetzung.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct XmlFriendlyNameCoder;

impl XmlFriendlyNameCoder {
    fn encode<'a>(name: &'a str) -> Cow<'a, str> {
        // Fast-Path: Namen ohne '$' und '_' bleiben unveraendert.
        if memchr2(b'$', b'_', name.as_bytes()).is_none() {
            return Cow::Borrowed(name);
        }
        let mut out = String::with_capacity(name.len() + 4);
        for c in name.chars() {
            match c {
                '$' => out.push_str("_-"),
                '_' => out.push_str("__"),
                other => out.push(other),
            }
        }
        Cow::Owned(out)
    }

    fn decode<'a>(name: &'a str) -> Cow<'a, str> {
        if memchr(b'_', name.as_bytes()).is_none() {
            return Cow::Borrowed(name);
        }
        let mut out = String::with_capacity(name.len());
        let mut chars = name.chars();
        while let Some(c) = chars.next() {
            if c != '_' {
                out.push(c);
                continue;
            }
            match chars.next() {
                Some('-') => out.push('$'),
                Some('_') => out.push('_'),
                // Einzelnes '_' ohne Maskierung: unveraendert uebernehmen
                // (Namen aus fremden Quellen).
                Some(other) => {
                    out.push('_');
                    out.push(other);
                }
                None => out.push('_'),
            }
        }
        Cow::Owned(out)
    }
}

impl NameCoder for XmlFriendlyNameCoder {
    fn encode_node<'a>(&self, name: &'a str) -> Cow<'a, str> {
        Self::encode(name)
    }

    fn decode_node<'a>(&self, name: &'a str) -> Cow<'a, str> {
        Self::decode(name)
    }

    fn encode_attribute<'a>(&self, name: &'a str) -> Cow<'a, str> {
        Self::encode(name)
    }

    fn decode_attribute<'a>(&self, name: &'a str) -> Cow<'a, str> {
        Self::decode(name)
    }
}
