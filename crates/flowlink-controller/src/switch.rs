//! The per-switch session.
//!
//! Created once hello/features negotiation succeeds. Owns the dispatch loop
//! (typed messages to consumer callbacks), the echo keepalive, and the
//! session-local flow table. Consumer callbacks run under `catch_unwind`, so
//! a panicking consumer takes down at most its own dispatch turn, never
//! another session.
//!
//! Keepalive runs on a periodic timer with a liveness deadline. A missed
//! echo reply is logged once per deadline but does not tear the session
//! down; only socket-level errors do. (The original behavior this replaces
//! scheduled each echo off the previous reply, drifting and never noticing
//! silence at all.)

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

use flowlink_wire::Version;

use crate::controller::{AppInterface, ControllerConfig};
use crate::error::{Error, Result};
use crate::flow::Flow;
use crate::message::{MultipartReplyEvent, OwnedMessage, PacketInEvent};
use crate::stream::MessageStream;

/// What negotiation learned about the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchInfo {
    /// Datapath unique id.
    pub datapath_id: u64,
    /// Packets the switch can buffer for packet-in.
    pub n_buffers: u32,
    /// Number of flow tables.
    pub n_tables: u8,
    /// Auxiliary connection id; 0 for the main connection.
    pub auxiliary_id: u8,
    /// Capability bits.
    pub capabilities: u32,
}

/// A connected switch, as exposed to the consumer.
pub struct Switch {
    info: SwitchInfo,
    version: Version,
    outbound: mpsc::UnboundedSender<OwnedMessage>,
    connected: AtomicBool,
    next_xid: AtomicU32,
    flow_table: Mutex<HashMap<Vec<u8>, Flow>>,
    session_shutdown: watch::Sender<bool>,
}

impl Switch {
    pub(crate) fn new(
        info: SwitchInfo,
        version: Version,
        outbound: mpsc::UnboundedSender<OwnedMessage>,
    ) -> Self {
        let (session_shutdown, _) = watch::channel(false);
        Self {
            info,
            version,
            outbound,
            connected: AtomicBool::new(true),
            next_xid: AtomicU32::new(1),
            flow_table: Mutex::new(HashMap::new()),
            session_shutdown,
        }
    }

    /// The switch's 8-byte datapath identifier.
    #[must_use]
    pub fn datapath_id(&self) -> u64 {
        self.info.datapath_id
    }

    /// Everything negotiation learned about the switch.
    #[must_use]
    pub fn info(&self) -> SwitchInfo {
        self.info
    }

    /// The version this session speaks.
    #[must_use]
    pub fn version(&self) -> Version {
        self.version
    }

    /// Whether the session is still up.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// A fresh transaction id.
    pub fn next_xid(&self) -> u32 {
        self.next_xid.fetch_add(1, Ordering::Relaxed)
    }

    /// Queue a message for the switch, preserving submission order.
    pub fn send(&self, message: OwnedMessage) -> Result<()> {
        self.outbound.send(message).map_err(|_| Error::StreamClosed)
    }

    /// Install a flow: record it in the session flow table and send the
    /// add flow-mod. Serializes with [`Switch::delete_flow`] through the
    /// table lock.
    pub fn install_flow(&self, flow: &Flow) -> Result<()> {
        let message = flow.to_add(self.version, self.next_xid());
        let mut table = self.flow_table.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        table.insert(flow.key(), flow.clone());
        self.send(message)
    }

    /// Delete a flow: drop it from the session flow table and send the
    /// strict-delete flow-mod.
    pub fn delete_flow(&self, flow: &Flow) -> Result<()> {
        let message = flow.to_delete(self.version, self.next_xid());
        let mut table = self.flow_table.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        table.remove(&flow.key());
        self.send(message)
    }

    /// The flow currently recorded under this descriptor's match, if any.
    #[must_use]
    pub fn installed_flow(&self, flow: &Flow) -> Option<Flow> {
        let table = self.flow_table.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        table.get(&flow.key()).cloned()
    }

    /// Number of flows recorded in the session flow table.
    #[must_use]
    pub fn flow_count(&self) -> usize {
        self.flow_table.lock().unwrap_or_else(std::sync::PoisonError::into_inner).len()
    }

    /// Tear the session down. Idempotent.
    pub fn disconnect(&self) {
        let _ = self.session_shutdown.send(true);
    }

    fn mark_disconnected(&self) {
        self.connected.store(false, Ordering::Release);
    }

    fn echo_request(&self) -> OwnedMessage {
        let xid = self.next_xid();
        match self.version {
            Version::OpenFlow13 => OwnedMessage::V13(flowlink_of13::Message::new(
                xid,
                flowlink_of13::Payload::EchoRequest(Vec::new()),
            )),
            Version::OpenFlow15 => OwnedMessage::V15(flowlink_of15::Message::new(
                xid,
                flowlink_of15::Payload::EchoRequest(Vec::new()),
            )),
        }
    }
}

impl std::fmt::Debug for Switch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Switch")
            .field("datapath_id", &format_args!("{:#018x}", self.info.datapath_id))
            .field("version", &self.version)
            .field("connected", &self.is_connected())
            .field("flows", &self.flow_count())
            .finish()
    }
}

fn invoke_callback(name: &str, f: impl FnOnce()) {
    if std::panic::catch_unwind(AssertUnwindSafe(f)).is_err() {
        tracing::error!(callback = name, "consumer callback panicked; session continues");
    }
}

/// Run the established-session loop until error or shutdown.
pub(crate) async fn run_session(
    switch: Arc<Switch>,
    mut stream: MessageStream,
    app: Arc<dyn AppInterface>,
    config: ControllerConfig,
    switches: Arc<Mutex<HashMap<u64, Arc<Switch>>>>,
) {
    let dpid = switch.datapath_id();
    let mut session_rx = switch.session_shutdown.subscribe();
    // First echo one period in; an interval's immediate first tick would
    // probe a switch that just finished negotiating.
    let mut echo =
        tokio::time::interval_at(Instant::now() + config.echo_interval, config.echo_interval);
    echo.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut last_reply = Instant::now();
    let mut silence_logged = false;

    loop {
        tokio::select! {
            maybe = stream.inbound.recv() => match maybe {
                Some(message) => {
                    dispatch(&switch, &app, message, &mut last_reply);
                    silence_logged = false;
                },
                None => break,
            },
            maybe = stream.errors.recv() => {
                if let Some(error) = maybe {
                    tracing::warn!(dpid, error = %error, "session stream error");
                }
                break;
            },
            _ = echo.tick() => {
                if last_reply.elapsed() > config.liveness_deadline && !silence_logged {
                    // Logged, not fatal: only socket errors tear down.
                    tracing::warn!(
                        dpid,
                        silent_for = ?last_reply.elapsed(),
                        "no echo reply within the liveness deadline",
                    );
                    silence_logged = true;
                }
                if switch.send(switch.echo_request()).is_err() {
                    break;
                }
            },
            _ = session_rx.changed() => break,
        }
    }

    switch.mark_disconnected();
    stream.shutdown();
    {
        let mut map = switches.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if map.get(&dpid).is_some_and(|current| Arc::ptr_eq(current, &switch)) {
            map.remove(&dpid);
        }
    }
    invoke_callback("switch_disconnected", || app.switch_disconnected(&switch));
    tracing::info!(dpid, "switch session closed");
}

fn dispatch(
    switch: &Arc<Switch>,
    app: &Arc<dyn AppInterface>,
    message: OwnedMessage,
    last_reply: &mut Instant,
) {
    match message {
        OwnedMessage::V13(msg) => {
            let xid = msg.xid;
            match msg.payload {
                flowlink_of13::Payload::EchoRequest(data) => {
                    let reply = OwnedMessage::V13(flowlink_of13::Message::new(
                        xid,
                        flowlink_of13::Payload::EchoReply(data),
                    ));
                    let _ = switch.send(reply);
                },
                flowlink_of13::Payload::EchoReply(_) => *last_reply = Instant::now(),
                flowlink_of13::Payload::PacketIn(pi) => {
                    invoke_callback("packet_in", || app.packet_in(switch, PacketInEvent::V13(pi)));
                },
                flowlink_of13::Payload::MultipartReply(reply) => {
                    invoke_callback("multipart_reply", || {
                        app.multipart_reply(switch, MultipartReplyEvent::V13(reply));
                    });
                },
                flowlink_of13::Payload::Error(err) => {
                    tracing::warn!(xid, error = ?err, "switch reported an error");
                },
                other => {
                    tracing::trace!(xid, kind = ?other.kind(), "ignoring unhandled message");
                },
            }
        },
        OwnedMessage::V15(msg) => {
            let xid = msg.xid;
            match msg.payload {
                flowlink_of15::Payload::EchoRequest(data) => {
                    let reply = OwnedMessage::V15(flowlink_of15::Message::new(
                        xid,
                        flowlink_of15::Payload::EchoReply(data),
                    ));
                    let _ = switch.send(reply);
                },
                flowlink_of15::Payload::EchoReply(_) => *last_reply = Instant::now(),
                flowlink_of15::Payload::PacketIn(pi) => {
                    invoke_callback("packet_in", || app.packet_in(switch, PacketInEvent::V15(pi)));
                },
                flowlink_of15::Payload::MultipartReply(reply) => {
                    invoke_callback("multipart_reply", || {
                        app.multipart_reply(switch, MultipartReplyEvent::V15(reply));
                    });
                },
                flowlink_of15::Payload::Error(err) => {
                    tracing::warn!(xid, error = ?err, "switch reported an error");
                },
                other => {
                    tracing::trace!(xid, kind = ?other.kind(), "ignoring unhandled message");
                },
            }
        },
    }
}
