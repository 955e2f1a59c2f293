//! Version demultiplexing.
//!
//! Every frame names its catalog in byte 0: 4 routes to the 1.3 decoder, 6
//! to the 1.5 decoder, anything else is `UnsupportedVersion`. The dispatcher
//! does no validation of its own; the catalogs enforce their layouts.

use bytes::Bytes;
use flowlink_wire::{Version, WireError};

/// A decoded message from either supported catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnedMessage {
    /// An OpenFlow 1.3 message.
    V13(flowlink_of13::Message),
    /// An OpenFlow 1.5 message.
    V15(flowlink_of15::Message),
}

impl OwnedMessage {
    /// Which catalog the message belongs to.
    #[must_use]
    pub fn version(&self) -> Version {
        match self {
            Self::V13(_) => Version::OpenFlow13,
            Self::V15(_) => Version::OpenFlow15,
        }
    }

    /// The transaction id.
    #[must_use]
    pub fn xid(&self) -> u32 {
        match self {
            Self::V13(msg) => msg.xid,
            Self::V15(msg) => msg.xid,
        }
    }

    /// Marshal into a complete frame.
    pub fn encode_to_bytes(&self) -> flowlink_wire::Result<Bytes> {
        match self {
            Self::V13(msg) => msg.encode_to_bytes(),
            Self::V15(msg) => msg.encode_to_bytes(),
        }
    }
}

/// A packet-in from either catalog, as handed to the consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketInEvent {
    /// An OpenFlow 1.3 packet-in.
    V13(flowlink_of13::PacketIn),
    /// An OpenFlow 1.5 packet-in.
    V15(flowlink_of15::PacketIn),
}

impl PacketInEvent {
    /// The packet bytes, whichever catalog they came from.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        match self {
            Self::V13(pi) => &pi.data,
            Self::V15(pi) => &pi.data,
        }
    }
}

/// A multipart reply from either catalog, as handed to the consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultipartReplyEvent {
    /// An OpenFlow 1.3 multipart reply.
    V13(flowlink_of13::MultipartReply),
    /// An OpenFlow 1.5 multipart reply.
    V15(flowlink_of15::MultipartReply),
}

impl MultipartReplyEvent {
    /// Whether more frames follow in this reply set (flag bit 0).
    #[must_use]
    pub fn has_more(&self) -> bool {
        match self {
            Self::V13(reply) => reply.has_more(),
            Self::V15(reply) => reply.has_more(),
        }
    }
}

/// Decode one complete, length-validated frame.
pub fn parse_message(frame: &[u8]) -> flowlink_wire::Result<OwnedMessage> {
    match frame.first() {
        Some(&byte) => match Version::from_wire(byte)? {
            Version::OpenFlow13 => Ok(OwnedMessage::V13(flowlink_of13::Message::decode(frame)?)),
            Version::OpenFlow15 => Ok(OwnedMessage::V15(flowlink_of15::Message::decode(frame)?)),
        },
        None => Err(WireError::Truncated { needed: 1, remaining: 0 }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_on_version_byte() {
        let v13 = flowlink_of13::Message::new(1, flowlink_of13::Payload::BarrierRequest);
        let parsed = parse_message(&v13.encode_to_bytes().unwrap()).unwrap();
        assert_eq!(parsed.version(), Version::OpenFlow13);
        assert_eq!(parsed.xid(), 1);

        let v15 = flowlink_of15::Message::new(2, flowlink_of15::Payload::BarrierRequest);
        let parsed = parse_message(&v15.encode_to_bytes().unwrap()).unwrap();
        assert_eq!(parsed.version(), Version::OpenFlow15);
    }

    #[test]
    fn rejects_other_versions() {
        let frame = [0x01, 0, 0, 8, 0, 0, 0, 0];
        assert_eq!(parse_message(&frame).unwrap_err(), WireError::UnsupportedVersion(1));
        assert_eq!(
            parse_message(&[]).unwrap_err(),
            WireError::Truncated { needed: 1, remaining: 0 },
        );
    }

    #[test]
    fn round_trips_through_owned() {
        let msg = OwnedMessage::V13(flowlink_of13::Message::new(
            7,
            flowlink_of13::Payload::EchoRequest(vec![1, 2, 3]),
        ));
        let bytes = msg.encode_to_bytes().unwrap();
        assert_eq!(parse_message(&bytes).unwrap(), msg);
    }
}
