//! End-to-end controller tests against a scripted switch on localhost TCP.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;

use flowlink_controller::{
    AppInterface, Controller, ControllerConfig, MultipartReplyEvent, PacketInEvent, Switch,
};
use flowlink_of13::{Hello, Message, Payload, SwitchFeatures};

const DPID: u64 = 0x0011_2233_4455_6677;

/// Opt-in logging for debugging a failing run: `RUST_LOG=trace cargo test`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// A consumer that records everything it sees.
#[derive(Default)]
struct RecordingApp {
    connected: AtomicUsize,
    disconnected: AtomicUsize,
    packet_ins: Mutex<Vec<(u64, PacketInEvent)>>,
    replies: AtomicUsize,
    notify: Mutex<Option<mpsc::UnboundedSender<&'static str>>>,
    panic_in_packet_in: AtomicBool,
}

impl RecordingApp {
    fn with_notify() -> (Arc<Self>, mpsc::UnboundedReceiver<&'static str>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let app = Arc::new(Self::default());
        *app.notify.lock().unwrap() = Some(tx);
        (app, rx)
    }

    fn emit(&self, event: &'static str) {
        if let Some(tx) = self.notify.lock().unwrap().as_ref() {
            let _ = tx.send(event);
        }
    }
}

impl AppInterface for RecordingApp {
    fn switch_connected(&self, switch: &Arc<Switch>) {
        assert!(switch.is_connected());
        self.connected.fetch_add(1, Ordering::SeqCst);
        self.emit("connected");
    }

    fn switch_disconnected(&self, _switch: &Arc<Switch>) {
        self.disconnected.fetch_add(1, Ordering::SeqCst);
        self.emit("disconnected");
    }

    fn packet_in(&self, switch: &Arc<Switch>, packet_in: PacketInEvent) {
        if self.panic_in_packet_in.load(Ordering::SeqCst) {
            self.emit("packet_in_panicking");
            panic!("consumer bug");
        }
        self.packet_ins.lock().unwrap().push((switch.datapath_id(), packet_in));
        self.emit("packet_in");
    }

    fn multipart_reply(&self, _switch: &Arc<Switch>, _reply: MultipartReplyEvent) {
        self.replies.fetch_add(1, Ordering::SeqCst);
        self.emit("multipart_reply");
    }
}

/// Scripted switch half: a raw socket plus frame-level read/write.
struct FakeSwitch {
    socket: TcpStream,
}

impl FakeSwitch {
    async fn connect(addr: std::net::SocketAddr) -> Self {
        Self { socket: TcpStream::connect(addr).await.unwrap() }
    }

    async fn send(&mut self, message: &Message) {
        self.socket.write_all(&message.encode_to_bytes().unwrap()).await.unwrap();
    }

    async fn recv(&mut self) -> Message {
        let mut header = [0u8; 8];
        self.socket.read_exact(&mut header).await.unwrap();
        let length = usize::from(u16::from_be_bytes([header[2], header[3]]));
        let mut frame = header.to_vec();
        frame.resize(length, 0);
        self.socket.read_exact(&mut frame[8..]).await.unwrap();
        Message::decode(&frame).unwrap()
    }

    async fn complete_handshake(&mut self) {
        self.send(&Message::new(0, Payload::Hello(Hello::with_versions(&[4])))).await;

        // Controller sends its hello then a features request.
        let hello = self.recv().await;
        assert!(matches!(hello.payload, Payload::Hello(_)));
        let features_request = self.recv().await;
        assert!(matches!(features_request.payload, Payload::FeaturesRequest));

        self.send(&Message::new(
            features_request.xid,
            Payload::FeaturesReply(SwitchFeatures {
                datapath_id: DPID,
                n_buffers: 256,
                n_tables: 254,
                ..SwitchFeatures::default()
            }),
        ))
        .await;
    }
}

async fn start_controller(app: Arc<RecordingApp>) -> (Arc<Controller>, std::net::SocketAddr) {
    init_tracing();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let controller = Arc::new(Controller::with_config(app, ControllerConfig {
        echo_interval: Duration::from_secs(60),
        ..ControllerConfig::default()
    }));
    let serving = Arc::clone(&controller);
    tokio::spawn(async move {
        let _ = serving.serve(listener).await;
    });
    (controller, addr)
}

#[tokio::test]
async fn hello_negotiation_success() {
    let (app, mut events) = RecordingApp::with_notify();
    let (controller, addr) = start_controller(Arc::clone(&app)).await;

    let mut switch = FakeSwitch::connect(addr).await;
    switch.complete_handshake().await;

    assert_eq!(timeout(Duration::from_secs(1), events.recv()).await.unwrap(), Some("connected"));
    assert_eq!(app.connected.load(Ordering::SeqCst), 1);

    let session = controller.switch(DPID).expect("session registered");
    assert_eq!(session.datapath_id(), DPID);
    assert!(session.is_connected());

    controller.shutdown();
}

#[tokio::test]
async fn hello_negotiation_failure_is_fast() {
    let (app, _events) = RecordingApp::with_notify();
    let (controller, addr) = start_controller(Arc::clone(&app)).await;

    let mut switch = FakeSwitch::connect(addr).await;
    // An OpenFlow 1.2 hello: unsupported version byte 3.
    switch.socket.write_all(&[3, 0, 0, 8, 0, 0, 0, 0]).await.unwrap();

    // The controller abandons the connection well inside 100ms: the socket
    // reaches EOF rather than a features request.
    let started = std::time::Instant::now();
    let mut rest = Vec::new();
    let n = timeout(Duration::from_millis(100), switch.socket.read_to_end(&mut rest))
        .await
        .expect("controller should close the socket quickly")
        .unwrap();
    // Whatever arrived before the close is at most the controller's hello.
    assert!(n <= 16, "unexpected bytes after failed negotiation");
    assert!(started.elapsed() < Duration::from_millis(100));
    assert_eq!(app.connected.load(Ordering::SeqCst), 0);

    controller.shutdown();
}

#[tokio::test]
async fn packet_in_reaches_the_consumer() {
    let (app, mut events) = RecordingApp::with_notify();
    let (controller, addr) = start_controller(Arc::clone(&app)).await;

    let mut switch = FakeSwitch::connect(addr).await;
    switch.complete_handshake().await;
    assert_eq!(timeout(Duration::from_secs(1), events.recv()).await.unwrap(), Some("connected"));

    let mut match_ = flowlink_wire::oxm::Match::new();
    match_.push(flowlink_wire::oxm::MatchField::in_port(1));
    let packet_in = flowlink_of13::PacketIn {
        buffer_id: flowlink_of13::packet::NO_BUFFER,
        total_len: 4,
        reason: flowlink_of13::packet::OFPR_NO_MATCH,
        table_id: 0,
        cookie: u64::MAX,
        match_,
        data: vec![0xDE, 0xAD, 0xBE, 0xEF],
    };
    switch.send(&Message::new(0x1234, Payload::PacketIn(packet_in.clone()))).await;

    assert_eq!(timeout(Duration::from_secs(1), events.recv()).await.unwrap(), Some("packet_in"));
    let seen = app.packet_ins.lock().unwrap();
    let (dpid, event) = &seen[0];
    assert_eq!(*dpid, DPID);
    match event {
        PacketInEvent::V13(pi) => assert_eq!(pi, &packet_in),
        PacketInEvent::V15(_) => panic!("wrong version"),
    }
    drop(seen);

    controller.shutdown();
}

#[tokio::test]
async fn echo_requests_are_answered() {
    let (app, mut events) = RecordingApp::with_notify();
    let (controller, addr) = start_controller(Arc::clone(&app)).await;

    let mut switch = FakeSwitch::connect(addr).await;
    switch.complete_handshake().await;
    assert_eq!(timeout(Duration::from_secs(1), events.recv()).await.unwrap(), Some("connected"));

    switch.send(&Message::new(0x77, Payload::EchoRequest(vec![9, 9]))).await;
    let reply = timeout(Duration::from_secs(1), switch.recv()).await.unwrap();
    assert_eq!(reply.xid, 0x77);
    assert!(matches!(reply.payload, Payload::EchoReply(data) if data == vec![9, 9]));

    controller.shutdown();
}

#[tokio::test]
async fn multipart_reply_reaches_the_consumer() {
    let (app, mut events) = RecordingApp::with_notify();
    let (controller, addr) = start_controller(Arc::clone(&app)).await;

    let mut switch = FakeSwitch::connect(addr).await;
    switch.complete_handshake().await;
    assert_eq!(timeout(Duration::from_secs(1), events.recv()).await.unwrap(), Some("connected"));

    let reply = flowlink_of13::MultipartReply {
        flags: 0,
        body: flowlink_of13::MultipartReplyBody::Table(vec![flowlink_of13::multipart::TableStats {
            table_id: 0,
            active_count: 10,
            lookup_count: 100,
            matched_count: 90,
        }]),
    };
    switch.send(&Message::new(5, Payload::MultipartReply(reply))).await;

    assert_eq!(
        timeout(Duration::from_secs(1), events.recv()).await.unwrap(),
        Some("multipart_reply"),
    );
    assert_eq!(app.replies.load(Ordering::SeqCst), 1);

    controller.shutdown();
}

#[tokio::test]
async fn install_flow_sends_a_flow_mod() {
    let (app, mut events) = RecordingApp::with_notify();
    let (controller, addr) = start_controller(Arc::clone(&app)).await;

    let mut switch = FakeSwitch::connect(addr).await;
    switch.complete_handshake().await;
    assert_eq!(timeout(Duration::from_secs(1), events.recv()).await.unwrap(), Some("connected"));

    let session = controller.switch(DPID).unwrap();
    let mut match_ = flowlink_wire::oxm::Match::new();
    match_.push(flowlink_wire::oxm::MatchField::eth_type(0x0806));
    let flow = flowlink_controller::Flow {
        match_,
        priority: 10,
        instructions: vec![flowlink_wire::instruction::Instruction::ApplyActions(vec![
            flowlink_wire::action::Action::Output { port: 2, max_len: 0 },
        ])],
        ..flowlink_controller::Flow::default()
    };
    session.install_flow(&flow).unwrap();
    assert_eq!(session.flow_count(), 1);

    let message = timeout(Duration::from_secs(1), switch.recv()).await.unwrap();
    match message.payload {
        Payload::FlowMod(fm) => {
            assert_eq!(fm.command, flowlink_of13::FlowModCommand::Add);
            assert_eq!(fm.priority, 10);
            assert_eq!(fm.instructions.len(), 1);
        },
        other => panic!("expected flow-mod, got {other:?}"),
    }

    session.delete_flow(&flow).unwrap();
    assert_eq!(session.flow_count(), 0);
    let message = timeout(Duration::from_secs(1), switch.recv()).await.unwrap();
    match message.payload {
        Payload::FlowMod(fm) => {
            assert_eq!(fm.command, flowlink_of13::FlowModCommand::DeleteStrict);
            assert!(fm.instructions.is_empty());
        },
        other => panic!("expected flow-mod, got {other:?}"),
    }

    controller.shutdown();
}

#[tokio::test]
async fn callback_panic_does_not_kill_the_session() {
    let (app, mut events) = RecordingApp::with_notify();
    let (controller, addr) = start_controller(Arc::clone(&app)).await;

    let mut switch = FakeSwitch::connect(addr).await;
    switch.complete_handshake().await;
    assert_eq!(timeout(Duration::from_secs(1), events.recv()).await.unwrap(), Some("connected"));

    app.panic_in_packet_in.store(true, Ordering::SeqCst);
    switch
        .send(&Message::new(1, Payload::PacketIn(flowlink_of13::PacketIn::default())))
        .await;
    assert_eq!(
        timeout(Duration::from_secs(1), events.recv()).await.unwrap(),
        Some("packet_in_panicking"),
    );

    // The session survives: an echo request still gets its reply.
    switch.send(&Message::new(2, Payload::EchoRequest(vec![]))).await;
    let reply = timeout(Duration::from_secs(1), switch.recv()).await.unwrap();
    assert_eq!(reply.xid, 2);
    assert!(matches!(reply.payload, Payload::EchoReply(_)));

    controller.shutdown();
}

#[tokio::test]
async fn keepalive_probes_periodically() {
    let (app, mut events) = RecordingApp::with_notify();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let controller = Arc::new(Controller::with_config(Arc::clone(&app), ControllerConfig {
        echo_interval: Duration::from_millis(100),
        ..ControllerConfig::default()
    }));
    let serving = Arc::clone(&controller);
    tokio::spawn(async move {
        let _ = serving.serve(listener).await;
    });

    let mut switch = FakeSwitch::connect(addr).await;
    switch.complete_handshake().await;
    assert_eq!(timeout(Duration::from_secs(1), events.recv()).await.unwrap(), Some("connected"));

    // Two consecutive probes prove the timer is periodic, not one-shot.
    for _ in 0..2 {
        let probe = timeout(Duration::from_secs(1), switch.recv()).await.unwrap();
        assert!(matches!(probe.payload, Payload::EchoRequest(_)));
        switch.send(&Message::new(probe.xid, Payload::EchoReply(vec![]))).await;
    }

    let session = controller.switch(DPID).unwrap();
    assert!(session.is_connected());

    controller.shutdown();
}

#[tokio::test]
async fn disconnect_notifies_the_consumer() {
    let (app, mut events) = RecordingApp::with_notify();
    let (controller, addr) = start_controller(Arc::clone(&app)).await;

    let mut switch = FakeSwitch::connect(addr).await;
    switch.complete_handshake().await;
    assert_eq!(timeout(Duration::from_secs(1), events.recv()).await.unwrap(), Some("connected"));

    drop(switch);

    assert_eq!(
        timeout(Duration::from_secs(1), events.recv()).await.unwrap(),
        Some("disconnected"),
    );
    assert_eq!(app.disconnected.load(Ordering::SeqCst), 1);
    assert!(controller.switch(DPID).is_none());

    controller.shutdown();
}
