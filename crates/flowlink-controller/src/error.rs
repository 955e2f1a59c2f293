//! Controller-side errors.
//!
//! Codec failures ([`flowlink_wire::WireError`]) surface through decode
//! results and are mostly absorbed by the parser workers (a bad frame is
//! logged and dropped); what reaches this enum is fatal to its session.
//! Vendor errors arrive as data, not errors: an OpenFlow error message with
//! type `EXPERIMENTER` decodes to the catalogs' `ErrorMsg::Vendor` variant.

use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by streams, sessions, and the controller.
#[derive(Debug, Error)]
pub enum Error {
    /// A codec failure that is fatal in context (unsupported version on the
    /// wire, unencodable outbound message).
    #[error("codec error: {0}")]
    Wire(#[from] flowlink_wire::WireError),

    /// Socket read/write failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer's hello cannot agree on a version with ours.
    #[error("peer speaks version {advertised:#04x}, this controller wants {wanted:#04x}")]
    VersionMismatch {
        /// Version byte the peer advertised.
        advertised: u8,
        /// Version this controller is configured for.
        wanted: u8,
    },

    /// Hello/features negotiation made no progress in time.
    #[error("negotiation made no progress for {0:?}")]
    NegotiationTimeout(Duration),

    /// The peer answered negotiation with an error message.
    #[error("peer rejected negotiation: type {err_type} code {code}")]
    NegotiationRejected {
        /// Error type from the peer.
        err_type: u16,
        /// Type-specific code.
        code: u16,
    },

    /// The stream's channels closed underneath the caller.
    #[error("stream closed")]
    StreamClosed,
}

/// Result alias for controller operations.
pub type Result<T> = std::result::Result<T, Error>;
