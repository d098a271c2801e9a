//! Round-trip tests for the binary codec: Writer → Reader → Copier → Writer.

use hiero::token::{self, Token};
use hiero::{copy, BinaryReader, BinaryWriter, HierarchicalReader, HierarchicalWriter, StatefulWriter};

// ============================================================================
// Hilfsfunktionen
// ============================================================================

/// Spielt eine Hierarchie in einen Writer.
fn build(writer: &mut impl HierarchicalWriter, doc: &Doc) -> hiero::Result<()> {
    fn node(writer: &mut impl HierarchicalWriter, n: &Node) -> hiero::Result<()> {
        writer.start_node(n.name)?;
        for (k, v) in &n.attributes {
            writer.add_attribute(k, v)?;
        }
        if let Some(text) = n.value {
            writer.set_value(text)?;
        }
        for child in &n.children {
            node(writer, child)?;
        }
        writer.end_node()
    }
    node(writer, &doc.root)
}

struct Doc {
    root: Node,
}

struct Node {
    name: &'static str,
    attributes: Vec<(&'static str, &'static str)>,
    value: Option<&'static str>,
    children: Vec<Node>,
}

fn node(name: &'static str) -> Node {
    Node { name, attributes: Vec::new(), value: None, children: Vec::new() }
}

fn encode(doc: &Doc) -> Vec<u8> {
    let mut writer = StatefulWriter::new(BinaryWriter::new(Vec::new()));
    build(&mut writer, doc).unwrap();
    writer.close().unwrap();
    writer.into_inner().into_inner()
}

/// Binary → Reader → Copier → Binary; liefert die zweiten Bytes.
fn recode(bytes: &[u8]) -> Vec<u8> {
    let mut reader = BinaryReader::new(bytes).unwrap();
    let mut writer = StatefulWriter::new(BinaryWriter::new(Vec::new()));
    copy(&mut reader, &mut writer).unwrap();
    writer.close().unwrap();
    writer.into_inner().into_inner()
}

fn sample_docs() -> Vec<Doc> {
    vec![
        // Einzelner leerer Knoten
        Doc { root: node("leaf") },
        // Wurzel mit Attribut und Text-Kind
        Doc {
            root: Node {
                children: vec![Node { value: Some("hi"), ..node("b") }],
                attributes: vec![("x", "1")],
                ..node("a")
            },
        },
        // Wiederholte Namen auf mehreren Ebenen
        Doc {
            root: Node {
                children: vec![
                    Node {
                        attributes: vec![("id", "1"), ("name", "erster")],
                        children: vec![Node { value: Some("tief"), ..node("item") }],
                        ..node("item")
                    },
                    Node { attributes: vec![("id", "2")], ..node("item") },
                    Node { value: Some("a & b < c"), ..node("notes") },
                ],
                ..node("list")
            },
        },
        // Unicode in Namen und Werten
        Doc {
            root: Node {
                children: vec![Node { value: Some("Grüße 🌍"), ..node("text") }],
                attributes: vec![("straße", "Hauptstraße 1")],
                ..node("adresse")
            },
        },
    ]
}

// ============================================================================
// Round-Trip-Identitaet
// ============================================================================

/// Schreiben, Zurücklesen, erneut Schreiben muss byte-identische Ausgabe
/// liefern — fuer jede Beispiel-Hierarchie.
#[test]
fn round_trip_is_byte_identical() {
    for (i, doc) in sample_docs().iter().enumerate() {
        let first = encode(doc);
        let second = recode(&first);
        assert_eq!(first, second, "doc #{i}");
    }
}

/// Auch der zweite Umlauf bleibt stabil (Fixpunkt).
#[test]
fn recode_is_idempotent() {
    for doc in sample_docs() {
        let first = encode(&doc);
        let second = recode(&first);
        let third = recode(&second);
        assert_eq!(second, third);
    }
}

// ============================================================================
// ID-Registry-Determinismus
// ============================================================================

/// Zwei Knoten mit demselben Namen: genau ein Mapping-Token, dieselbe ID
/// bei beiden Vorkommen, identische Aufloesung beim Decodieren.
#[test]
fn same_name_maps_exactly_once() {
    let mut writer = StatefulWriter::new(BinaryWriter::new(Vec::new()));
    writer.start_node("root").unwrap();
    writer.start_node("twin").unwrap();
    writer.end_node().unwrap();
    writer.start_node("twin").unwrap();
    writer.end_node().unwrap();
    writer.end_node().unwrap();
    writer.close().unwrap();
    let bytes = writer.into_inner().into_inner();

    let mut cursor = bytes.as_slice();
    let mut mappings = Vec::new();
    let mut starts = Vec::new();
    while let Some(t) = token::read_token(&mut cursor).unwrap() {
        match t {
            Token::MapIdToValue { id, value } => mappings.push((id, value.to_string())),
            Token::StartNode { id } => starts.push(id),
            _ => {}
        }
    }
    assert_eq!(
        mappings,
        [(1, "root".to_string()), (2, "twin".to_string())],
        "ein Mapping pro Name, dicht ab 1"
    );
    assert_eq!(starts, [1, 2, 2], "zweites Vorkommen nutzt dieselbe ID");

    // Decoder loest beide Vorkommen auf denselben Namen auf.
    let mut reader = BinaryReader::new(bytes.as_slice()).unwrap();
    reader.move_down().unwrap();
    assert_eq!(&*reader.node_name(), "twin");
    reader.move_up().unwrap();
    reader.move_down().unwrap();
    assert_eq!(&*reader.node_name(), "twin");
}

// ============================================================================
// hasMoreChildren / peekNextChild Konsistenz
// ============================================================================

/// peek liefert genau den Namen, den das naechste move_down freilegt, und
/// veraendert die Position nicht.
#[test]
fn peek_is_consistent_with_move_down() {
    let doc = Doc {
        root: Node {
            children: vec![node("first"), node("second")],
            ..node("root")
        },
    };
    let bytes = encode(&doc);
    let mut reader = BinaryReader::new(bytes.as_slice()).unwrap();

    while reader.has_more_children().unwrap() {
        let peeked = reader.peek_next_child().unwrap().expect("peek bei has_more=true");
        let again = reader.peek_next_child().unwrap().expect("peek wiederholbar");
        assert_eq!(peeked, again);
        reader.move_down().unwrap();
        assert_eq!(reader.node_name(), peeked);
        reader.move_up().unwrap();
    }
    assert_eq!(reader.peek_next_child().unwrap(), None, "kein Kind mehr → None");
}

// ============================================================================
// Szenario aus dem Writer-Kontrakt
// ============================================================================

/// root "a" mit x="1", Kind "b" mit Text "hi" — vollstaendige Struktur
/// uebersteht den Binary-Umlauf.
#[test]
fn contract_scenario_survives_round_trip() {
    let mut writer = StatefulWriter::new(BinaryWriter::new(Vec::new()));
    writer.start_node("a").unwrap();
    writer.add_attribute("x", "1").unwrap();
    writer.start_node("b").unwrap();
    writer.set_value("hi").unwrap();
    writer.end_node().unwrap();
    writer.end_node().unwrap();
    writer.close().unwrap();
    let bytes = writer.into_inner().into_inner();

    let mut reader = BinaryReader::new(bytes.as_slice()).unwrap();
    assert_eq!(&*reader.node_name(), "a");
    assert_eq!(reader.attribute("x").as_deref(), Some("1"));
    assert_eq!(reader.attribute_count(), 1);
    reader.move_down().unwrap();
    assert_eq!(&*reader.node_name(), "b");
    assert_eq!(&*reader.value().unwrap(), "hi");
    assert!(!reader.has_more_children().unwrap());
    reader.move_up().unwrap();
    assert!(!reader.has_more_children().unwrap());
}

/// Ein grosses, breites Dokument bleibt byte-stabil (Registry waechst ueber
/// den Single-Byte-Varint-Bereich hinaus).
#[test]
fn many_distinct_names_round_trip() {
    let mut writer = StatefulWriter::new(BinaryWriter::new(Vec::new()));
    writer.start_node("root").unwrap();
    let names: Vec<String> = (0..200).map(|i| format!("n{i}")).collect();
    for name in &names {
        writer.start_node(name).unwrap();
        writer.end_node().unwrap();
    }
    writer.end_node().unwrap();
    writer.close().unwrap();
    let first = writer.into_inner().into_inner();

    let second = recode(&first);
    assert_eq!(first, second);
}
