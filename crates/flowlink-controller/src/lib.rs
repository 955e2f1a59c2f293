//! OpenFlow controller runtime.
//!
//! Listens for switches over TCP, negotiates hello/features per connection,
//! and runs one session per switch: a framed [`stream::MessageStream`] with
//! xid-sharded parser workers underneath, echo keepalives, and typed
//! dispatch into the consumer's [`AppInterface`] callbacks.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use flowlink_controller::{
//!     AppInterface, Controller, MultipartReplyEvent, PacketInEvent, Switch,
//! };
//!
//! struct LoggingApp;
//!
//! impl AppInterface for LoggingApp {
//!     fn switch_connected(&self, switch: &Arc<Switch>) {
//!         tracing::info!(dpid = switch.datapath_id(), "up");
//!     }
//!     fn switch_disconnected(&self, switch: &Arc<Switch>) {
//!         tracing::info!(dpid = switch.datapath_id(), "down");
//!     }
//!     fn packet_in(&self, _switch: &Arc<Switch>, packet_in: PacketInEvent) {
//!         tracing::info!(bytes = packet_in.data().len(), "packet-in");
//!     }
//!     fn multipart_reply(&self, _switch: &Arc<Switch>, _reply: MultipartReplyEvent) {}
//! }
//!
//! # async fn run() -> flowlink_controller::Result<()> {
//! let controller = Controller::new(LoggingApp);
//! controller.listen("0.0.0.0:6653").await
//! # }
//! ```

pub mod controller;
pub mod error;
pub mod flow;
pub mod message;
pub mod stream;
pub mod switch;

pub use controller::{AppInterface, Controller, ControllerConfig};
pub use error::{Error, Result};
pub use flow::Flow;
pub use message::{MultipartReplyEvent, OwnedMessage, PacketInEvent, parse_message};
pub use stream::{MessageStream, StreamConfig};
pub use switch::{Switch, SwitchInfo};
