//! Pull-side XML codec: quick-xml token stream → reader cursor.
//!
//! Wraps a streaming parser and answers the reader contract through a
//! buffered event window with mark/reset lookahead: `value()`,
//! `has_more_children()` and `peek_next_child()` scan ahead and rewind, so
//! the read position only moves on `move_down`/`move_up`. Text runs are
//! coalesced at read time (comments dropped, text concatenated); empty
//! elements are synthesized as start + end; declarations, processing
//! instructions and doctypes are skipped transparently.

use std::borrow::Cow;
use std::io::{BufReader, Read};
use std::rc::Rc;

use memchr::memchr;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::depth_state::{DepthFrame, DepthState};
use crate::name_coder::{NameCoder, NoNameCoder};
use crate::reader::HierarchicalReader;
use crate::{Error, Result};

/// Ohne aktive Markierung werden konsumierte Events ab dieser Fenstergroesse
/// verworfen.
const COMPACT_AT: usize = 32;

/// Ein Ereignis im Lookahead-Fenster. `Rc`-Payloads machen das Wiederholen
/// nach `reset` zu einer billigen Referenzzaehlung.
#[derive(Debug, Clone)]
enum PullEvent {
    StartNode {
        name: Rc<str>,
        attributes: Rc<[(Rc<str>, Rc<str>)]>,
    },
    EndNode,
    Text(Rc<str>),
    Comment,
    /// Deklarationen, PIs, DOCTYPE — strukturell unsichtbar.
    Other,
    EndOfDocument,
}

/// Hierarchical reader over an XML byte stream.
///
/// Positioned on the root node after construction. Node and attribute
/// names run through the name coder's decode channels; the default coder
/// is the identity.
pub struct XmlReader<R: Read, C: NameCoder = NoNameCoder> {
    parser: Reader<BufReader<R>>,
    parse_buf: Vec<u8>,
    coder: C,
    /// Gepuffertes Event-Fenster; `cursor` zeigt auf das naechste Event.
    events: Vec<PullEvent>,
    cursor: usize,
    marked: Option<usize>,
    frames: DepthState,
    closed: bool,
}

impl<R: Read> XmlReader<R, NoNameCoder> {
    /// Reader with the identity name coder, positioned on the root node.
    pub fn new(source: R) -> Result<Self> {
        Self::with_coder(source, NoNameCoder)
    }
}

impl<R: Read, C: NameCoder> XmlReader<R, C> {
    /// Reader with an explicit name coder, positioned on the root node.
    pub fn with_coder(source: R, coder: C) -> Result<Self> {
        let mut parser = Reader::from_reader(BufReader::new(source));
        parser.config_mut().trim_text(false);
        let mut reader = Self {
            parser,
            parse_buf: Vec::new(),
            coder,
            events: Vec::new(),
            cursor: 0,
            marked: None,
            frames: DepthState::new(),
            closed: false,
        };
        // Prolog (Decl, Kommentare, DOCTYPE, Whitespace) ueberspringen und
        // auf dem Root-Knoten positionieren.
        loop {
            match reader.advance()? {
                PullEvent::StartNode { .. } => break,
                PullEvent::EndOfDocument => {
                    return Err(Error::XmlParseError("document contains no root node".into()));
                }
                _ => {}
            }
        }
        Ok(reader)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::ReadAfterClose);
        }
        Ok(())
    }

    /// Naechstes Event aus dem Fenster; zieht bei Bedarf vom Parser nach.
    fn read_event(&mut self) -> Result<PullEvent> {
        while self.cursor >= self.events.len() {
            self.fetch()?;
        }
        let event = self.events[self.cursor].clone();
        self.cursor += 1;
        if self.marked.is_none() && self.cursor >= COMPACT_AT {
            self.events.drain(..self.cursor);
            self.cursor = 0;
        }
        Ok(event)
    }

    /// Liest ein Parser-Event und haengt 0–2 Pull-Events ans Fenster an.
    fn fetch(&mut self) -> Result<()> {
        self.parse_buf.clear();
        match self.parser.read_event_into(&mut self.parse_buf) {
            Ok(Event::Start(e)) => {
                let event = start_event(&self.coder, &e)?;
                self.events.push(event);
            }
            Ok(Event::Empty(e)) => {
                // Leeres Element: Start + End synthetisieren.
                let event = start_event(&self.coder, &e)?;
                self.events.push(event);
                self.events.push(PullEvent::EndNode);
            }
            Ok(Event::End(_)) => self.events.push(PullEvent::EndNode),
            Ok(Event::Text(e)) => {
                let raw = utf8(&e)?;
                let text = quick_xml::escape::unescape(raw)
                    .map_err(|er| Error::XmlParseError(er.to_string()))?;
                if !text.is_empty() {
                    let text = normalize_line_endings(&text);
                    self.events.push(PullEvent::Text(Rc::from(text.as_ref())));
                }
            }
            Ok(Event::CData(e)) => {
                // CDATA: kein Unescaping.
                let text = utf8(e.into_inner().as_ref())?.to_owned();
                if !text.is_empty() {
                    let text = normalize_line_endings(&text);
                    self.events.push(PullEvent::Text(Rc::from(text.as_ref())));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                let name = utf8(e.as_ref())?;
                if let Some(c) = resolve_char_reference(name) {
                    self.events.push(PullEvent::Text(Rc::from(c.to_string().as_str())));
                } else if let Some(predef) = resolve_predefined_entity(name) {
                    self.events.push(PullEvent::Text(Rc::from(predef)));
                } else {
                    return Err(Error::XmlParseError(format!("unresolved entity '&{name};'")));
                }
            }
            Ok(Event::Comment(_)) => self.events.push(PullEvent::Comment),
            Ok(Event::PI(_) | Event::Decl(_) | Event::DocType(_)) => {
                self.events.push(PullEvent::Other);
            }
            Ok(Event::Eof) => self.events.push(PullEvent::EndOfDocument),
            Err(e) => {
                return Err(Error::XmlParseError(format!(
                    "parse XML error at {:?}: {e}",
                    self.parser.buffer_position()
                )));
            }
        }
        Ok(())
    }

    /// Konsumiert ein Event und pflegt den Element-Stack — der einzige Pfad,
    /// der die Leseposition wirklich bewegt.
    fn advance(&mut self) -> Result<PullEvent> {
        let event = self.read_event()?;
        match &event {
            PullEvent::StartNode { name, attributes } => {
                let mut frame = DepthFrame::new(Rc::clone(name));
                for (n, v) in attributes.iter() {
                    frame.add_attribute(Rc::clone(n), Rc::clone(v));
                }
                self.frames.push(frame);
            }
            PullEvent::EndNode => {
                self.frames.pop()?;
            }
            _ => {}
        }
        Ok(event)
    }

    /// Scannt bis zum naechsten Strukturereignis: `Some(name)` wenn ein
    /// Kind-Start folgt, `None` bei Ende. Leseposition bleibt unveraendert.
    fn peek_structural(&mut self) -> Result<Option<Rc<str>>> {
        self.marked = Some(self.cursor);
        let result = loop {
            match self.read_event() {
                Ok(PullEvent::StartNode { name, .. }) => break Ok(Some(name)),
                Ok(PullEvent::EndNode | PullEvent::EndOfDocument) => break Ok(None),
                Ok(_) => {}
                Err(e) => break Err(e),
            }
        };
        if let Some(m) = self.marked.take() {
            self.cursor = m;
        }
        result
    }
}

impl<R: Read, C: NameCoder> HierarchicalReader for XmlReader<R, C> {
    fn node_name(&self) -> Rc<str> {
        match self.frames.current() {
            Some(frame) => frame.name(),
            None => Rc::from(""),
        }
    }

    fn value(&mut self) -> Result<Rc<str>> {
        self.ensure_open()?;
        self.marked = Some(self.cursor);
        let mut text = String::new();
        let scan = loop {
            match self.read_event() {
                Ok(PullEvent::Text(t)) => text.push_str(&t),
                Ok(PullEvent::Comment) => {}
                Ok(_) => break Ok(()),
                Err(e) => break Err(e),
            }
        };
        if let Some(m) = self.marked.take() {
            self.cursor = m;
        }
        scan?;
        Ok(Rc::from(text.as_str()))
    }

    fn attribute_count(&self) -> usize {
        self.frames.current().map_or(0, DepthFrame::attribute_count)
    }

    fn attribute(&self, name: &str) -> Option<Rc<str>> {
        self.frames.current()?.attribute(name)
    }

    fn attribute_at(&self, index: usize) -> Option<Rc<str>> {
        self.frames.current()?.attribute_at(index)
    }

    fn attribute_name(&self, index: usize) -> Option<Rc<str>> {
        self.frames.current()?.attribute_name(index)
    }

    fn has_more_children(&mut self) -> Result<bool> {
        self.ensure_open()?;
        Ok(self.peek_structural()?.is_some())
    }

    fn move_down(&mut self) -> Result<()> {
        self.ensure_open()?;
        if self.peek_structural()?.is_none() {
            return Err(Error::NoMoreChildren);
        }
        let target = self.frames.depth() + 1;
        while self.frames.depth() < target {
            if let PullEvent::EndOfDocument = self.advance()? {
                return Err(Error::PrematureEndOfStream);
            }
        }
        Ok(())
    }

    fn move_up(&mut self) -> Result<()> {
        self.ensure_open()?;
        if self.frames.depth() < 2 {
            return Err(Error::UnbalancedNode);
        }
        let target = self.frames.depth() - 1;
        while self.frames.depth() > target {
            if let PullEvent::EndOfDocument = self.advance()? {
                return Err(Error::PrematureEndOfStream);
            }
        }
        Ok(())
    }

    fn peek_next_child(&mut self) -> Result<Option<Rc<str>>> {
        self.ensure_open()?;
        self.peek_structural()
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        self.events.clear();
        self.cursor = 0;
        self.marked = None;
        Ok(())
    }
}

/// StartNode-Event aus einem Start-/Empty-Tag bauen: Name und Attributnamen
/// laufen durch den Decoder, Attributwerte werden unescaped.
fn start_event<C: NameCoder>(coder: &C, e: &BytesStart<'_>) -> Result<PullEvent> {
    let name_binding = e.name();
    let name = utf8(name_binding.as_ref())?;
    let name: Rc<str> = Rc::from(coder.decode_node(name).as_ref());
    let mut attributes = Vec::new();
    for attr in e.attributes().with_checks(false) {
        let attr = attr.map_err(|er| Error::XmlParseError(er.to_string()))?;
        let key = utf8(attr.key.as_ref())?;
        let value = attr
            .unescape_value()
            .map_err(|er| Error::XmlParseError(er.to_string()))?;
        let value = normalize_line_endings(&value);
        attributes.push((
            Rc::from(coder.decode_attribute(key).as_ref()),
            Rc::from(value.as_ref()),
        ));
    }
    Ok(PullEvent::StartNode { name, attributes: attributes.into() })
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes)
        .map_err(|er| Error::XmlParseError(format!("input is not valid UTF-8: {er}")))
}

/// Zeilenenden normalisieren: \r\n → \n, alleinstehende \r → \n.
fn normalize_line_endings(s: &str) -> Cow<'_, str> {
    if memchr(b'\r', s.as_bytes()).is_none() {
        return Cow::Borrowed(s);
    }
    Cow::Owned(s.replace("\r\n", "\n").replace('\r', "\n"))
}

/// Loest eine Zeichenreferenz auf: `#49` (dezimal) oder `#x31` (hex),
/// ohne `&` und `;`.
fn resolve_char_reference(ref_name: &str) -> Option<char> {
    let digits = ref_name.strip_prefix('#')?;
    let code_point = if let Some(hex) = digits.strip_prefix('x') {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        digits.parse::<u32>().ok()?
    };
    char::from_u32(code_point)
}
