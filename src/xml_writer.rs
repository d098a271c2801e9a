//! Push-side XML codec: writer calls → pretty-printed (or compact) text.
//!
//! A node becomes `<name attr="value">text</name>`, or `<name/>` when it
//! received neither value nor children. Indentation is a configurable
//! repeated sequence per depth level (default two spaces), the line
//! terminator defaults to `\n`; the compact constructor suppresses both
//! while keeping identical escaping.
//!
//! Text content and attribute values escape differently: tab and newline
//! pass through literally in text but fall through to the per-mode
//! control-character handling inside attribute values. The two contexts
//! are two separate functions on purpose.

use std::io::Write;
use std::rc::Rc;

use crate::error::io_err;
use crate::name_coder::{NameCoder, NoNameCoder};
use crate::writer::HierarchicalWriter;
use crate::{Error, Result};

/// Statischer Spaces-Buffer fuer die Einrueckung — deckt tiefe
/// Verschachtelung in Stuecken ab.
const SPACES: &[u8; 128] = &[b' '; 128];

/// Character-validity mode for emitted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CharMode {
    /// Anything goes: undefined and control characters become numeric
    /// character references, NUL included (`&#x0;`).
    #[default]
    Quirks,
    /// Rejects characters the XML 1.0 control-character rules disallow
    /// (NUL, VT, FF, 0x0E–0x1F).
    Xml10,
    /// Permissive: controls become numeric references; only the
    /// noncharacters U+FFFE and U+FFFF are rejected.
    Xml11,
}

impl CharMode {
    fn label(self) -> &'static str {
        match self {
            Self::Quirks => "quirks",
            Self::Xml10 => "XML 1.0",
            Self::Xml11 => "XML 1.1",
        }
    }
}

/// Layout configuration for [`XmlWriter`].
#[derive(Debug, Clone)]
pub struct XmlWriterConfig {
    /// Repeated once per depth level. Empty suppresses indentation.
    pub indent: String,
    /// Line terminator. Empty suppresses line breaks.
    pub new_line: String,
    /// Character-validity mode.
    pub mode: CharMode,
}

impl Default for XmlWriterConfig {
    fn default() -> Self {
        Self {
            indent: "  ".into(),
            new_line: "\n".into(),
            mode: CharMode::Quirks,
        }
    }
}

impl XmlWriterConfig {
    /// Keine Einrueckung, keine Zeilenumbrueche — Escaping unveraendert.
    pub fn compact() -> Self {
        Self {
            indent: String::new(),
            new_line: String::new(),
            ..Self::default()
        }
    }

    /// Dieselbe Konfiguration mit anderem Validity-Mode.
    pub fn with_mode(mut self, mode: CharMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Hierarchical writer emitting indented, escaped XML-like text.
///
/// Node and attribute names run through the name coder's encode channels;
/// the default coder is the identity.
pub struct XmlWriter<W: Write, C: NameCoder = NoNameCoder> {
    sink: W,
    coder: C,
    config: XmlWriterConfig,
    /// Encodierte Namen fuer die passenden Schliess-Tags.
    element_stack: Vec<Rc<str>>,
    /// Start-Tag noch offen (Attribute noch erlaubt)?
    tag_in_progress: bool,
    /// Juengster Knoten noch ohne Wert und Kinder (→ `/>`)?
    tag_is_empty: bool,
    /// Zeilenumbruch + Einrueckung vor dem naechsten Strukturereignis?
    ready_for_newline: bool,
    closed: bool,
}

impl<W: Write> XmlWriter<W, NoNameCoder> {
    /// Pretty-printing writer with the default configuration (two-space
    /// indent, `\n`, quirks mode).
    pub fn pretty(sink: W) -> Self {
        Self::with_config(sink, XmlWriterConfig::default())
    }

    /// Writer with all whitespace suppressed.
    pub fn compact(sink: W) -> Self {
        Self::with_config(sink, XmlWriterConfig::compact())
    }

    /// Writer with an explicit layout configuration.
    pub fn with_config(sink: W, config: XmlWriterConfig) -> Self {
        Self::with_coder(sink, config, NoNameCoder)
    }
}

impl<W: Write, C: NameCoder> XmlWriter<W, C> {
    /// Writer with an explicit configuration and name coder.
    pub fn with_coder(sink: W, config: XmlWriterConfig, coder: C) -> Self {
        Self {
            sink,
            coder,
            config,
            element_stack: Vec::new(),
            tag_in_progress: false,
            tag_is_empty: false,
            ready_for_newline: false,
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

    fn write_raw(&mut self, s: &str) -> Result<()> {
        self.sink.write_all(s.as_bytes()).map_err(io_err)
    }

    /// Schliesst einen offenen Start-Tag mit `>` und schreibt den
    /// ausstehenden Zeilenumbruch samt Einrueckung.
    fn finish_tag(&mut self) -> Result<()> {
        if self.tag_in_progress {
            self.write_raw(">")?;
        }
        self.tag_in_progress = false;
        if self.ready_for_newline {
            self.end_of_line()?;
        }
        self.ready_for_newline = false;
        Ok(())
    }

    fn end_of_line(&mut self) -> Result<()> {
        if !self.config.new_line.is_empty() {
            self.sink.write_all(self.config.new_line.as_bytes()).map_err(io_err)?;
        }
        if self.config.indent.is_empty() {
            return Ok(());
        }
        let depth = self.element_stack.len();
        if self.config.indent.as_bytes().iter().all(|&b| b == b' ') {
            // Spaces in Bloecken schreiben statt pro Level.
            let mut remaining = self.config.indent.len() * depth;
            while remaining > 0 {
                let chunk = remaining.min(SPACES.len());
                self.sink.write_all(&SPACES[..chunk]).map_err(io_err)?;
                remaining -= chunk;
            }
        } else {
            for _ in 0..depth {
                self.sink.write_all(self.config.indent.as_bytes()).map_err(io_err)?;
            }
        }
        Ok(())
    }
}

impl<W: Write, C: NameCoder> HierarchicalWriter for XmlWriter<W, C> {
    fn start_node(&mut self, name: &str) -> Result<()> {
        self.ensure_open()?;
        let encoded: Rc<str> = Rc::from(self.coder.encode_node(name).as_ref());
        self.tag_is_empty = false;
        self.finish_tag()?;
        self.write_raw("<")?;
        self.write_raw(&encoded)?;
        self.element_stack.push(encoded);
        self.tag_in_progress = true;
        self.ready_for_newline = true;
        self.tag_is_empty = true;
        Ok(())
    }

    fn add_attribute(&mut self, name: &str, value: &str) -> Result<()> {
        self.ensure_open()?;
        if !self.tag_in_progress {
            return Err(Error::AttributeWithoutNode(name.into()));
        }
        let encoded = self.coder.encode_attribute(name).into_owned();
        self.write_raw(" ")?;
        self.write_raw(&encoded)?;
        self.write_raw("=\"")?;
        write_attr_escaped(&mut self.sink, value, self.config.mode)?;
        self.write_raw("\"")
    }

    fn set_value(&mut self, text: &str) -> Result<()> {
        self.ensure_open()?;
        if self.element_stack.is_empty() {
            return Err(Error::ValueWithoutNode);
        }
        self.ready_for_newline = false;
        self.tag_is_empty = false;
        self.finish_tag()?;
        write_text_escaped(&mut self.sink, text, self.config.mode)
    }

    fn end_node(&mut self) -> Result<()> {
        self.ensure_open()?;
        let name = self.element_stack.pop().ok_or(Error::UnbalancedNode)?;
        if self.tag_is_empty {
            // Weder Wert noch Kinder: selbstschliessend, kein Schliess-Tag.
            self.write_raw("/>")?;
            self.tag_in_progress = false;
            self.ready_for_newline = false;
        } else {
            self.finish_tag()?;
            self.write_raw("</")?;
            self.write_raw(&name)?;
            self.write_raw(">")?;
        }
        self.tag_is_empty = false;
        self.ready_for_newline = true;
        if self.element_stack.is_empty() {
            self.sink.flush().map_err(io_err)?;
        }
        Ok(())
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

// ============================================================================
// Escaping — Text-Inhalt und Attributwerte sind zwei getrennte Funktionen
// ============================================================================

/// Bytes die im Text-Kontext ohne Pruefung durchlaufen:
/// druckbares ASCII ohne `&` `<` `>`, plus Tab und Newline.
const fn text_clean_table() -> [bool; 256] {
    let mut table = [false; 256];
    let mut b = 0x20;
    while b < 0x7F {
        table[b] = true;
        b += 1;
    }
    table[b'&' as usize] = false;
    table[b'<' as usize] = false;
    table[b'>' as usize] = false;
    table[b'\t' as usize] = true;
    table[b'\n' as usize] = true;
    table
}

/// Bytes die im Attribut-Kontext ohne Pruefung durchlaufen:
/// druckbares ASCII ohne `&` `<` `>` `"` `'`. Tab/Newline NICHT —
/// sie laufen in die Control-Character-Behandlung des Modus.
const fn attr_clean_table() -> [bool; 256] {
    let mut table = [false; 256];
    let mut b = 0x20;
    while b < 0x7F {
        table[b] = true;
        b += 1;
    }
    table[b'&' as usize] = false;
    table[b'<' as usize] = false;
    table[b'>' as usize] = false;
    table[b'"' as usize] = false;
    table[b'\'' as usize] = false;
    table
}

const TEXT_CLEAN: [bool; 256] = text_clean_table();
const ATTR_CLEAN: [bool; 256] = attr_clean_table();

/// Escapes text content: `&` `<` `>` structurally, `\r` → `&#xd;`,
/// tab/newline literal, everything else per mode.
pub(crate) fn write_text_escaped(w: &mut impl Write, s: &str, mode: CharMode) -> Result<()> {
    write_escaped(w, s, &TEXT_CLEAN, false, mode)
}

/// Escapes an attribute value: additionally `"` → `&quot;`, `'` → `&apos;`;
/// tab/newline take the control-character path.
pub(crate) fn write_attr_escaped(w: &mut impl Write, s: &str, mode: CharMode) -> Result<()> {
    write_escaped(w, s, &ATTR_CLEAN, true, mode)
}

fn write_escaped(
    w: &mut impl Write,
    s: &str,
    clean: &[bool; 256],
    in_attribute: bool,
    mode: CharMode,
) -> Result<()> {
    let bytes = s.as_bytes();
    let mut start = 0;
    for (i, c) in s.char_indices() {
        if c.is_ascii() && clean[c as usize] {
            continue;
        }
        // Sauberen Block in einem Stueck schreiben.
        if start < i {
            w.write_all(&bytes[start..i]).map_err(io_err)?;
        }
        escape_char(w, c, in_attribute, mode)?;
        start = i + c.len_utf8();
    }
    if start < bytes.len() {
        w.write_all(&bytes[start..]).map_err(io_err)?;
    }
    Ok(())
}

fn escape_char(w: &mut impl Write, c: char, in_attribute: bool, mode: CharMode) -> Result<()> {
    let replacement: &str = match c {
        '&' => "&amp;",
        '<' => "&lt;",
        '>' => "&gt;",
        '"' if in_attribute => "&quot;",
        '\'' if in_attribute => "&apos;",
        '\r' => "&#xd;",
        // Tab/Newline erreichen diesen Pfad nur im Attribut-Kontext
        // (Text-Tabelle laesst sie durch) und fallen dort in die
        // Control-Behandlung.
        other => return escape_fallback(w, other, mode),
    };
    w.write_all(replacement.as_bytes()).map_err(io_err)
}

/// Behandlung ausserhalb der festen Ersetzungen: definierte
/// Nicht-Control-Zeichen laufen durch, der Rest wird je nach Modus
/// numerisch referenziert oder abgewiesen.
fn escape_fallback(w: &mut impl Write, c: char, mode: CharMode) -> Result<()> {
    if !c.is_control() && !is_noncharacter(c) {
        let mut buf = [0u8; 4];
        return w.write_all(c.encode_utf8(&mut buf).as_bytes()).map_err(io_err);
    }
    let cp = c as u32;
    match mode {
        CharMode::Xml10 => {
            if cp < 0x9 || cp == 0xB || cp == 0xC || (0xE..=0x1F).contains(&cp) {
                return Err(Error::DisallowedCharacter { code_point: cp, mode: mode.label() });
            }
        }
        CharMode::Xml11 => {
            if cp == 0xFFFE || cp == 0xFFFF {
                return Err(Error::DisallowedCharacter { code_point: cp, mode: mode.label() });
            }
        }
        CharMode::Quirks => {}
    }
    write!(w, "&#x{cp:x};").map_err(io_err)
}

/// Unicode-Noncharacters: U+FDD0..=U+FDEF und Codepoints auf ...FFFE/...FFFF.
fn is_noncharacter(c: char) -> bool {
    let cp = c as u32;
    (0xFDD0..=0xFDEF).contains(&cp) || (cp & 0xFFFE) == 0xFFFE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pretty_output(build: impl FnOnce(&mut XmlWriter<Vec<u8>>)) -> String {
        let mut w = XmlWriter::pretty(Vec::new());
        build(&mut w);
        String::from_utf8(w.into_inner()).unwrap()
    }

    fn compact_output(build: impl FnOnce(&mut XmlWriter<Vec<u8>>)) -> String {
        let mut w = XmlWriter::compact(Vec::new());
        build(&mut w);
        String::from_utf8(w.into_inner()).unwrap()
    }

    fn text_escaped(s: &str, mode: CharMode) -> Result<String> {
        let mut out = Vec::new();
        write_text_escaped(&mut out, s, mode)?;
        Ok(String::from_utf8(out).unwrap())
    }

    fn attr_escaped(s: &str, mode: CharMode) -> Result<String> {
        let mut out = Vec::new();
        write_attr_escaped(&mut out, s, mode)?;
        Ok(String::from_utf8(out).unwrap())
    }

    // ==================== Struktur ====================

    #[test]
    fn empty_node_self_closes() {
        let out = pretty_output(|w| {
            w.start_node("root").unwrap();
            w.end_node().unwrap();
        });
        assert_eq!(out, "<root/>");
    }

    #[test]
    fn nested_nodes_are_indented() {
        let out = pretty_output(|w| {
            w.start_node("a").unwrap();
            w.start_node("b").unwrap();
            w.end_node().unwrap();
            w.end_node().unwrap();
        });
        assert_eq!(out, "<a>\n  <b/>\n</a>");
    }

    #[test]
    fn value_stays_on_one_line() {
        let out = pretty_output(|w| {
            w.start_node("a").unwrap();
            w.start_node("b").unwrap();
            w.set_value("hi").unwrap();
            w.end_node().unwrap();
            w.end_node().unwrap();
        });
        assert_eq!(out, "<a>\n  <b>hi</b>\n</a>");
    }

    #[test]
    fn attributes_attach_to_open_tag() {
        let out = compact_output(|w| {
            w.start_node("a").unwrap();
            w.add_attribute("x", "1").unwrap();
            w.start_node("b").unwrap();
            w.set_value("hi").unwrap();
            w.end_node().unwrap();
            w.end_node().unwrap();
        });
        assert_eq!(out, r#"<a x="1"><b>hi</b></a>"#);
    }

    #[test]
    fn compact_mode_suppresses_all_whitespace() {
        let out = compact_output(|w| {
            w.start_node("a").unwrap();
            w.start_node("b").unwrap();
            w.end_node().unwrap();
            w.start_node("c").unwrap();
            w.set_value("x").unwrap();
            w.end_node().unwrap();
            w.end_node().unwrap();
        });
        assert_eq!(out, "<a><b/><c>x</c></a>");
    }

    #[test]
    fn deep_nesting_indents_per_level() {
        let out = pretty_output(|w| {
            w.start_node("a").unwrap();
            w.start_node("b").unwrap();
            w.start_node("c").unwrap();
            w.set_value("v").unwrap();
            w.end_node().unwrap();
            w.end_node().unwrap();
            w.end_node().unwrap();
        });
        assert_eq!(out, "<a>\n  <b>\n    <c>v</c>\n  </b>\n</a>");
    }

    #[test]
    fn attribute_after_child_rejected() {
        let mut w = XmlWriter::pretty(Vec::new());
        w.start_node("a").unwrap();
        w.start_node("b").unwrap();
        w.end_node().unwrap();
        let err = w.add_attribute("x", "1").unwrap_err();
        assert_eq!(err, Error::AttributeWithoutNode("x".into()));
    }

    #[test]
    fn end_without_start_is_unbalanced() {
        let mut w = XmlWriter::pretty(Vec::new());
        assert_eq!(w.end_node().unwrap_err(), Error::UnbalancedNode);
    }

    #[test]
    fn write_after_close_rejected() {
        let mut w = XmlWriter::pretty(Vec::new());
        w.start_node("a").unwrap();
        w.end_node().unwrap();
        w.close().unwrap();
        assert_eq!(w.start_node("b").unwrap_err(), Error::WriteAfterClose);
    }

    #[test]
    fn name_coder_encodes_names() {
        let mut w = XmlWriter::with_coder(
            Vec::new(),
            XmlWriterConfig::compact(),
            crate::name_coder::XmlFriendlyNameCoder,
        );
        w.start_node("Outer$Inner").unwrap();
        w.add_attribute("first_name", "x").unwrap();
        w.end_node().unwrap();
        let out = String::from_utf8(w.into_inner()).unwrap();
        assert_eq!(out, r#"<Outer_-Inner first__name="x"/>"#);
    }

    #[test]
    fn custom_indent_and_newline() {
        let mut w = XmlWriter::with_config(
            Vec::new(),
            XmlWriterConfig { indent: "\t".into(), new_line: "\r\n".into(), mode: CharMode::Quirks },
        );
        w.start_node("a").unwrap();
        w.start_node("b").unwrap();
        w.end_node().unwrap();
        w.end_node().unwrap();
        let out = String::from_utf8(w.into_inner()).unwrap();
        assert_eq!(out, "<a>\r\n\t<b/>\r\n</a>");
    }

    // ==================== Escaping: Text-Kontext ====================

    #[test]
    fn text_escapes_structural_characters() {
        let out = text_escaped("a < b & c > d", CharMode::Quirks).unwrap();
        assert_eq!(out, "a &lt; b &amp; c &gt; d");
    }

    /// Tab und Newline laufen im Text-Inhalt woertlich durch.
    #[test]
    fn text_passes_tab_and_newline_literally() {
        for mode in [CharMode::Quirks, CharMode::Xml10, CharMode::Xml11] {
            let out = text_escaped("a\tb\nc", mode).unwrap();
            assert_eq!(out, "a\tb\nc", "{mode:?}");
        }
    }

    #[test]
    fn text_escapes_carriage_return() {
        let out = text_escaped("a\rb", CharMode::Quirks).unwrap();
        assert_eq!(out, "a&#xd;b");
    }

    #[test]
    fn text_quotes_pass_literally() {
        let out = text_escaped(r#"it's "quoted""#, CharMode::Quirks).unwrap();
        assert_eq!(out, r#"it's "quoted""#);
    }

    #[test]
    fn quirks_escapes_nul_as_reference() {
        let out = text_escaped("a\0b", CharMode::Quirks).unwrap();
        assert_eq!(out, "a&#x0;b");
    }

    #[test]
    fn xml10_rejects_nul() {
        let err = text_escaped("a\0b", CharMode::Xml10).unwrap_err();
        assert_eq!(err, Error::DisallowedCharacter { code_point: 0, mode: "XML 1.0" });
    }

    #[test]
    fn xml10_rejects_low_controls() {
        for c in ['\u{1}', '\u{b}', '\u{c}', '\u{e}', '\u{1f}'] {
            let err = text_escaped(&format!("x{c}"), CharMode::Xml10).unwrap_err();
            assert!(matches!(err, Error::DisallowedCharacter { .. }), "{c:?}");
        }
    }

    /// 0x7F–0x9F sind Controls, aber von der 1.0-Regel nicht verboten →
    /// numerische Referenz.
    #[test]
    fn xml10_references_high_controls() {
        let out = text_escaped("a\u{7f}b\u{85}c", CharMode::Xml10).unwrap();
        assert_eq!(out, "a&#x7f;b&#x85;c");
    }

    #[test]
    fn xml11_references_nul_and_controls() {
        let out = text_escaped("a\0b\u{1}c", CharMode::Xml11).unwrap();
        assert_eq!(out, "a&#x0;b&#x1;c");
    }

    #[test]
    fn xml11_rejects_the_two_noncharacters() {
        for c in ['\u{fffe}', '\u{ffff}'] {
            let err = text_escaped(&format!("x{c}"), CharMode::Xml11).unwrap_err();
            assert_eq!(
                err,
                Error::DisallowedCharacter { code_point: c as u32, mode: "XML 1.1" },
            );
        }
    }

    #[test]
    fn quirks_references_noncharacters() {
        let out = text_escaped("x\u{fffe}", CharMode::Quirks).unwrap();
        assert_eq!(out, "x&#xfffe;");
    }

    #[test]
    fn multibyte_text_passes_through() {
        let out = text_escaped("Grüße 🌍 <tag>", CharMode::Xml10).unwrap();
        assert_eq!(out, "Grüße 🌍 &lt;tag&gt;");
    }

    // ==================== Escaping: Attribut-Kontext ====================

    #[test]
    fn attr_escapes_quotes() {
        let out = attr_escaped(r#"say "hi" & 'bye'"#, CharMode::Quirks).unwrap();
        assert_eq!(out, "say &quot;hi&quot; &amp; &apos;bye&apos;");
    }

    /// Tab und Newline werden im Attributwert numerisch referenziert
    /// (Quirks) — nicht woertlich uebernommen.
    #[test]
    fn attr_references_tab_and_newline_in_quirks() {
        let out = attr_escaped("a\tb\nc", CharMode::Quirks).unwrap();
        assert_eq!(out, "a&#x9;b&#xa;c");
    }

    /// XML 1.0 erlaubt Tab/Newline — auch im Attribut nur referenziert.
    #[test]
    fn attr_references_tab_and_newline_in_xml10() {
        let out = attr_escaped("a\tb\nc", CharMode::Xml10).unwrap();
        assert_eq!(out, "a&#x9;b&#xa;c");
    }

    #[test]
    fn attr_escapes_carriage_return() {
        let out = attr_escaped("a\rb", CharMode::Xml10).unwrap();
        assert_eq!(out, "a&#xd;b");
    }

    #[test]
    fn attr_rejects_nul_in_xml10() {
        let err = attr_escaped("\0", CharMode::Xml10).unwrap_err();
        assert!(matches!(err, Error::DisallowedCharacter { code_point: 0, .. }));
    }

    // ==================== Flush-Verhalten ====================

    /// Nach dem aeussersten end_node ist der Sink geflusht (hier: BufWriter
    /// haette geschrieben; Vec ist immer sichtbar — geprueft wird, dass kein
    /// Fehler auftritt und das Dokument vollstaendig ist).
    #[test]
    fn outermost_end_node_flushes() {
        let mut w = XmlWriter::pretty(std::io::BufWriter::new(Vec::new()));
        w.start_node("a").unwrap();
        w.set_value("x").unwrap();
        w.end_node().unwrap();
        let buffered = w.into_inner();
        assert_eq!(buffered.get_ref(), b"<a>x</a>");
    }
}
