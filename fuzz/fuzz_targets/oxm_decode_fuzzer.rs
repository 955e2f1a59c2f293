//! Fuzz target for the OXM match decoder.
//!
//! # Invariants
//!
//! - Match decoding never panics and never reads past a declared length
//! - The mask law holds on everything that decodes
//! - Accepted matches survive an encode/decode round trip unchanged

#![no_main]

use libfuzzer_sys::fuzz_target;

use flowlink_wire::oxm::Match;
use flowlink_wire::{Codec, Cursor, Writer};

fuzz_target!(|data: &[u8]| {
    let mut cur = Cursor::new(data);
    if let Ok(m) = Match::decode(&mut cur) {
        for field in &m.fields {
            let expected = field.value().len() * if field.has_mask() { 2 } else { 1 };
            assert_eq!(field.payload_len(), expected, "mask law");
        }

        let mut w = Writer::new();
        m.encode(&mut w).expect("decoded match must re-encode");
        assert_eq!(w.len(), m.wire_len());
        assert_eq!(w.len() % 8, 0, "padding invariant");

        let mut again = Cursor::new(w.as_slice());
        assert_eq!(Match::decode(&mut again).expect("re-encoding must decode"), m);
    }
});
