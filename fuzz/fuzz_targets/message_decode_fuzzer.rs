//! Fuzz target for the version-demuxing message parser.
//!
//! # Strategy
//!
//! - Raw bytes: arbitrary input through the full decode path
//! - Framed bytes: a valid common header stapled onto arbitrary bodies, so
//!   the body decoders actually run instead of dying on the length check
//!
//! # Invariants
//!
//! - Decoding NEVER panics, loops, or overflows the stack (nested bundles
//!   and conntrack are depth-capped)
//! - Anything accepted re-encodes, and the re-encoding decodes back to the
//!   same value (padding is canonicalized to zeros, so raw input bytes with
//!   dirty padding may legally differ from the re-encoding)

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use flowlink_controller::parse_message;

#[derive(Debug, Arbitrary)]
enum Input {
    Raw(Vec<u8>),
    Framed { v15: bool, msg_type: u8, xid: u32, body: Vec<u8> },
}

fuzz_target!(|input: Input| {
    let frame = match input {
        Input::Raw(bytes) => bytes,
        Input::Framed { v15, msg_type, xid, body } => {
            let version = if v15 { 6 } else { 4 };
            let length = (8 + body.len()).min(usize::from(u16::MAX)) as u16;
            let mut frame = Vec::with_capacity(8 + body.len());
            frame.push(version);
            frame.push(msg_type);
            frame.extend_from_slice(&length.to_be_bytes());
            frame.extend_from_slice(&xid.to_be_bytes());
            frame.extend_from_slice(&body);
            frame.truncate(usize::from(length));
            frame
        },
    };

    if let Ok(message) = parse_message(&frame) {
        let encoded = message.encode_to_bytes().expect("decoded message must re-encode");
        let again = parse_message(&encoded).expect("re-encoding must decode");
        assert_eq!(again, message, "decode must be stable across a round trip");
    }
});
