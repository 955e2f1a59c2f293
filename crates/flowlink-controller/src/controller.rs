//! The controller: accept loop, negotiation, and session registry.
//!
//! # Negotiation
//!
//! ```text
//! ┌───────┐ send Hello ┌────────────┐ Hello(ok)  ┌───────────────┐
//! │ Start │───────────>│ AwaitHello │───────────>│ AwaitFeatures │
//! └───────┘            └────────────┘            └───────────────┘
//!                        │ mismatch / error        │ SwitchFeatures
//!                        │ / 3s silence            ↓
//!                        ↓                    ┌─────────────┐
//!                   ┌────────┐               │ Established │──> session
//!                   │ Closed │<──────────────└─────────────┘  (switch.rs)
//!                   └────────┘    socket error / shutdown
//! ```
//!
//! A reconnecting datapath id replaces a session that never reached
//! Established; a live session is never displaced by a newcomer.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::time::timeout;

use flowlink_wire::Version;

use crate::error::{Error, Result};
use crate::message::OwnedMessage;
use crate::stream::{MessageStream, StreamConfig};
use crate::switch::{Switch, SwitchInfo, run_session};

/// The four consumer callbacks. All run on session tasks under
/// `catch_unwind`; a panic is logged and contained.
pub trait AppInterface: Send + Sync + 'static {
    /// A switch completed negotiation.
    fn switch_connected(&self, switch: &Arc<Switch>);

    /// A switch session ended.
    fn switch_disconnected(&self, switch: &Arc<Switch>);

    /// A packet-in arrived on an established session.
    fn packet_in(&self, switch: &Arc<Switch>, packet_in: crate::message::PacketInEvent);

    /// A multipart reply arrived on an established session.
    fn multipart_reply(&self, switch: &Arc<Switch>, reply: crate::message::MultipartReplyEvent);
}

impl<A: AppInterface + ?Sized> AppInterface for Arc<A> {
    fn switch_connected(&self, switch: &Arc<Switch>) {
        (**self).switch_connected(switch);
    }

    fn switch_disconnected(&self, switch: &Arc<Switch>) {
        (**self).switch_disconnected(switch);
    }

    fn packet_in(&self, switch: &Arc<Switch>, packet_in: crate::message::PacketInEvent) {
        (**self).packet_in(switch, packet_in);
    }

    fn multipart_reply(&self, switch: &Arc<Switch>, reply: crate::message::MultipartReplyEvent) {
        (**self).multipart_reply(switch, reply);
    }
}

/// Controller tuning knobs.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Version negotiated with peers.
    pub version: Version,
    /// Hello/features deadline; silence beyond it abandons the session.
    pub negotiation_timeout: Duration,
    /// Echo keepalive period on established sessions.
    pub echo_interval: Duration,
    /// Silence beyond this is logged (never fatal by itself).
    pub liveness_deadline: Duration,
    /// Per-connection stream tuning.
    pub stream: StreamConfig,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            version: Version::OpenFlow13,
            negotiation_timeout: Duration::from_secs(3),
            echo_interval: Duration::from_secs(3),
            liveness_deadline: Duration::from_secs(9),
            stream: StreamConfig::default(),
        }
    }
}

/// The process-wide controller: one listener, many switch sessions.
pub struct Controller {
    app: Arc<dyn AppInterface>,
    config: ControllerConfig,
    switches: Arc<Mutex<HashMap<u64, Arc<Switch>>>>,
    shutdown: watch::Sender<bool>,
}

impl Controller {
    /// Controller with default configuration.
    #[must_use]
    pub fn new(app: impl AppInterface) -> Self {
        Self::with_config(app, ControllerConfig::default())
    }

    /// Controller with explicit configuration.
    #[must_use]
    pub fn with_config(app: impl AppInterface, config: ControllerConfig) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self { app: Arc::new(app), config, switches: Arc::new(Mutex::new(HashMap::new())), shutdown }
    }

    /// Bind `addr` and run the accept loop until [`Controller::shutdown`].
    pub async fn listen(&self, addr: &str) -> Result<()> {
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(addr = %listener.local_addr()?, "controller listening");
        self.serve(listener).await
    }

    /// Run the accept loop on an already-bound listener.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let mut shutdown_rx = self.shutdown.subscribe();
        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    tracing::info!("controller accept loop stopping");
                    return Ok(());
                },
                accepted = listener.accept() => {
                    let (socket, peer) = accepted?;
                    tracing::debug!(%peer, "connection accepted");
                    let app = Arc::clone(&self.app);
                    let config = self.config.clone();
                    let switches = Arc::clone(&self.switches);
                    tokio::spawn(async move {
                        handle_connection(socket, app, config, switches).await;
                    });
                },
            }
        }
    }

    /// Close the listener and tear down every session.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
        for switch in self.switches_snapshot() {
            switch.disconnect();
        }
    }

    /// Snapshot of the live sessions.
    #[must_use]
    pub fn switches_snapshot(&self) -> Vec<Arc<Switch>> {
        self.switches.lock().unwrap_or_else(std::sync::PoisonError::into_inner).values().cloned().collect()
    }

    /// The session for a datapath id, if one is live.
    #[must_use]
    pub fn switch(&self, datapath_id: u64) -> Option<Arc<Switch>> {
        self.switches.lock().unwrap_or_else(std::sync::PoisonError::into_inner).get(&datapath_id).cloned()
    }
}

async fn handle_connection(
    socket: TcpStream,
    app: Arc<dyn AppInterface>,
    config: ControllerConfig,
    switches: Arc<Mutex<HashMap<u64, Arc<Switch>>>>,
) {
    let _ = socket.set_nodelay(true);
    let mut stream = MessageStream::new(socket, &config.stream);

    let info = match negotiate(&mut stream, &config).await {
        Ok(info) => info,
        Err(error) => {
            tracing::warn!(%error, "negotiation failed");
            stream.shutdown();
            return;
        },
    };

    let switch = Arc::new(Switch::new(info, config.version, stream.outbound.clone()));

    // A datapath reconnecting before its old session noticed the loss
    // replaces the stale entry; a genuinely live session wins over the
    // newcomer.
    {
        let mut map = switches.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        match map.get(&info.datapath_id) {
            Some(existing) if existing.is_connected() => {
                tracing::warn!(
                    dpid = info.datapath_id,
                    "datapath already has a live session; dropping new connection",
                );
                stream.shutdown();
                return;
            },
            _ => {
                map.insert(info.datapath_id, Arc::clone(&switch));
            },
        }
    }

    tracing::info!(
        dpid = info.datapath_id,
        version = %config.version,
        "switch connected",
    );

    if std::panic::catch_unwind(AssertUnwindSafe(|| app.switch_connected(&switch))).is_err() {
        tracing::error!(callback = "switch_connected", "consumer callback panicked; session continues");
    }

    run_session(switch, stream, app, config, switches).await;
}

/// Drive hello/features to completion or failure.
async fn negotiate(stream: &mut MessageStream, config: &ControllerConfig) -> Result<SwitchInfo> {
    let wanted = config.version;
    stream.send(hello_message(wanted))?;

    let negotiation = async {
        await_hello(stream, wanted).await?;
        stream.send(features_request(wanted, 0))?;
        await_features(stream).await
    };

    match timeout(config.negotiation_timeout, negotiation).await {
        Ok(result) => result,
        Err(_) => Err(Error::NegotiationTimeout(config.negotiation_timeout)),
    }
}

async fn await_hello(stream: &mut MessageStream, wanted: Version) -> Result<()> {
    loop {
        tokio::select! {
            maybe = stream.inbound.recv() => {
                let Some(message) = maybe else { return Err(Error::StreamClosed) };
                match &message {
                    OwnedMessage::V13(msg) => match &msg.payload {
                        flowlink_of13::Payload::Hello(hello) => {
                            return check_hello(Version::OpenFlow13, hello.supports_version(wanted.wire()), wanted);
                        },
                        flowlink_of13::Payload::Error(err) => return Err(rejected(err)),
                        _ => tracing::debug!("ignoring pre-hello message"),
                    },
                    OwnedMessage::V15(msg) => match &msg.payload {
                        flowlink_of15::Payload::Hello(hello) => {
                            return check_hello(Version::OpenFlow15, hello.supports_version(wanted.wire()), wanted);
                        },
                        flowlink_of15::Payload::Error(err) => return Err(rejected15(err)),
                        _ => tracing::debug!("ignoring pre-hello message"),
                    },
                }
            },
            maybe = stream.errors.recv() => {
                return Err(match maybe {
                    Some(Error::Wire(flowlink_wire::WireError::UnsupportedVersion(advertised))) => {
                        Error::VersionMismatch { advertised, wanted: wanted.wire() }
                    },
                    Some(error) => error,
                    None => Error::StreamClosed,
                });
            },
        }
    }
}

fn check_hello(header_version: Version, bitmap: Option<bool>, wanted: Version) -> Result<()> {
    // Either the header version matches outright, or a version bitmap
    // admits ours.
    if header_version == wanted || bitmap == Some(true) {
        Ok(())
    } else {
        Err(Error::VersionMismatch { advertised: header_version.wire(), wanted: wanted.wire() })
    }
}

async fn await_features(stream: &mut MessageStream) -> Result<SwitchInfo> {
    loop {
        tokio::select! {
            maybe = stream.inbound.recv() => {
                let Some(message) = maybe else { return Err(Error::StreamClosed) };
                match message {
                    OwnedMessage::V13(msg) => match msg.payload {
                        flowlink_of13::Payload::FeaturesReply(features) => {
                            return Ok(SwitchInfo {
                                datapath_id: features.datapath_id,
                                n_buffers: features.n_buffers,
                                n_tables: features.n_tables,
                                auxiliary_id: features.auxiliary_id,
                                capabilities: features.capabilities,
                            });
                        },
                        flowlink_of13::Payload::Error(err) => return Err(rejected(&err)),
                        _ => tracing::debug!("ignoring pre-features message"),
                    },
                    OwnedMessage::V15(msg) => match msg.payload {
                        flowlink_of15::Payload::FeaturesReply(features) => {
                            return Ok(SwitchInfo {
                                datapath_id: features.datapath_id,
                                n_buffers: features.n_buffers,
                                n_tables: features.n_tables,
                                auxiliary_id: features.auxiliary_id,
                                capabilities: features.capabilities,
                            });
                        },
                        flowlink_of15::Payload::Error(err) => return Err(rejected15(&err)),
                        _ => tracing::debug!("ignoring pre-features message"),
                    },
                }
            },
            maybe = stream.errors.recv() => {
                return Err(maybe.unwrap_or(Error::StreamClosed));
            },
        }
    }
}

fn rejected(err: &flowlink_of13::ErrorMsg) -> Error {
    match err {
        flowlink_of13::ErrorMsg::Standard { err_type, code, .. } => {
            Error::NegotiationRejected { err_type: *err_type, code: *code }
        },
        flowlink_of13::ErrorMsg::Vendor { exp_type, .. } => {
            Error::NegotiationRejected { err_type: 0xFFFF, code: *exp_type }
        },
    }
}

fn rejected15(err: &flowlink_of15::ErrorMsg) -> Error {
    match err {
        flowlink_of15::ErrorMsg::Standard { err_type, code, .. } => {
            Error::NegotiationRejected { err_type: *err_type, code: *code }
        },
        flowlink_of15::ErrorMsg::Vendor { exp_type, .. } => {
            Error::NegotiationRejected { err_type: 0xFFFF, code: *exp_type }
        },
    }
}

fn hello_message(version: Version) -> OwnedMessage {
    match version {
        Version::OpenFlow13 => OwnedMessage::V13(flowlink_of13::Message::new(
            0,
            flowlink_of13::Payload::Hello(flowlink_of13::Hello::with_versions(&[version.wire()])),
        )),
        Version::OpenFlow15 => OwnedMessage::V15(flowlink_of15::Message::new(
            0,
            flowlink_of15::Payload::Hello(flowlink_of15::Hello::with_versions(&[version.wire()])),
        )),
    }
}

fn features_request(version: Version, xid: u32) -> OwnedMessage {
    match version {
        Version::OpenFlow13 => OwnedMessage::V13(flowlink_of13::Message::new(
            xid,
            flowlink_of13::Payload::FeaturesRequest,
        )),
        Version::OpenFlow15 => OwnedMessage::V15(flowlink_of15::Message::new(
            xid,
            flowlink_of15::Payload::FeaturesRequest,
        )),
    }
}
