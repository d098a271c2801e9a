#![no_main]
use libfuzzer_sys::fuzz_target;

use hiero::{BinaryReader, HierarchicalReader};

// Beliebige Bytes duerfen den Binary-Reader nie panicken lassen — nur
// saubere Fehler produzieren.
fuzz_target!(|data: &[u8]| {
    let Ok(mut reader) = BinaryReader::new(data) else {
        return;
    };
    // Vollstaendige Tiefentraversierung, bricht bei jedem Fehler ab.
    let mut depth = 0usize;
    loop {
        match reader.has_more_children() {
            Ok(true) => {
                if reader.move_down().is_err() {
                    return;
                }
                depth += 1;
                let _ = reader.value();
                let _ = reader.peek_next_child();
            }
            Ok(false) => {
                if depth == 0 {
                    return;
                }
                if reader.move_up().is_err() {
                    return;
                }
                depth -= 1;
            }
            Err(_) => return,
        }
    }
});
