#![no_main]
use libfuzzer_sys::fuzz_target;

use hiero::{copy, BinaryReader, BinaryWriter, HierarchicalWriter, StatefulWriter, XmlReader};

// XML → binary → binary: das zweite Encoding muss byte-identisch sein.
fuzz_target!(|data: &[u8]| {
    let Ok(xml) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(mut reader) = XmlReader::new(xml.as_bytes()) else {
        return;
    };
    let mut writer = StatefulWriter::new(BinaryWriter::new(Vec::new()));
    if copy(&mut reader, &mut writer).is_err() {
        return;
    }
    let first = writer.into_inner().into_inner();

    let Ok(mut reader) = BinaryReader::new(first.as_slice()) else {
        unreachable!("own output must decode");
    };
    let mut writer = StatefulWriter::new(BinaryWriter::new(Vec::new()));
    copy(&mut reader, &mut writer).expect("own output must copy");
    let second = writer.into_inner().into_inner();
    assert_eq!(first, second);
});
