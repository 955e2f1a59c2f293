//! Per-connection message stream.
//!
//! Bridges a TCP socket and two channels. Inbound: a framing reader
//! accumulates complete messages by the header's length field (never
//! trusting the socket's segmentation), hands each frame to one of N parser
//! workers selected by `xid % N`, and the workers publish typed messages on
//! a bounded channel. Outbound: a single writer task marshals and writes in
//! submission order.
//!
//! Frames with equal xids always land on the same worker, so a request and
//! its reply decode in FIFO order relative to one another; no ordering holds
//! across xids. The inbound channel's capacity of 1 is the flow-control
//! scheme: a slow consumer backpressures the workers, full worker queues
//! backpressure the reader, and nothing is dropped.
//!
//! Parse failures are logged and the frame discarded; only socket errors
//! and an unsupported version byte (which makes the peer unintelligible)
//! reach the error channel. Shutdown is cooperative and one-shot.

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{mpsc, watch};

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use flowlink_wire::WireError;

use crate::error::Error;
use crate::message::{OwnedMessage, parse_message};

/// Tuning knobs for a [`MessageStream`].
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Parser workers per connection; xids shard across them.
    pub parser_workers: usize,
    /// Frame buffers in the pool. Must be at least `parser_workers + 1` so
    /// releases never block.
    pub pool_buffers: usize,
    /// Inbound channel capacity; 1 gives lock-step backpressure.
    pub inbound_capacity: usize,
    /// Socket read chunk size.
    pub read_chunk: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self { parser_workers: 25, pool_buffers: 32, inbound_capacity: 1, read_chunk: 4096 }
    }
}

/// A bounded pool of reusable frame buffers.
///
/// Acquisition blocks when the pool is empty; release never blocks because
/// the channel's capacity covers every buffer ever handed out.
struct BufferPool {
    acquire: mpsc::Receiver<BytesMut>,
    release: mpsc::Sender<BytesMut>,
}

impl BufferPool {
    fn new(buffers: usize) -> Self {
        let (release, acquire) = mpsc::channel(buffers);
        for _ in 0..buffers {
            // Capacity equals the number of buffers outstanding.
            let _ = release.try_send(BytesMut::with_capacity(2048));
        }
        Self { acquire, release }
    }

    async fn acquire(&mut self) -> BytesMut {
        // The pool never closes while the stream lives; a closed channel
        // only happens at teardown, when a fresh buffer is as good.
        self.acquire.recv().await.unwrap_or_default()
    }

    fn releaser(&self) -> mpsc::Sender<BytesMut> {
        self.release.clone()
    }
}

/// Per-connection framed reader/writer over a TCP socket.
///
/// Channel fields are public in the style of a transport handle: a session
/// selects over `inbound` and `errors` while keeping `outbound` clonable.
pub struct MessageStream {
    /// Typed messages decoded from the socket.
    pub inbound: mpsc::Receiver<OwnedMessage>,
    /// Messages to marshal and write, in submission order.
    pub outbound: mpsc::UnboundedSender<OwnedMessage>,
    /// Fatal errors; any recipient must signal shutdown.
    pub errors: mpsc::Receiver<Error>,
    shutdown: watch::Sender<bool>,
    frames_per_worker: Arc<Vec<AtomicU64>>,
}

impl MessageStream {
    /// Take ownership of a socket and spawn the reader, writer, and parser
    /// worker tasks.
    #[must_use]
    pub fn new(socket: TcpStream, config: &StreamConfig) -> Self {
        let workers = config.parser_workers.max(1);
        let (read_half, write_half) = socket.into_split();
        let (shutdown, _) = watch::channel(false);
        let (inbound_tx, inbound_rx) = mpsc::channel(config.inbound_capacity.max(1));
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (error_tx, error_rx) = mpsc::channel(4);

        let frames_per_worker: Arc<Vec<AtomicU64>> =
            Arc::new((0..workers).map(|_| AtomicU64::new(0)).collect());

        let pool = BufferPool::new(config.pool_buffers.max(workers + 1));

        let mut worker_txs = Vec::with_capacity(workers);
        for id in 0..workers {
            let (tx, rx) = mpsc::channel::<BytesMut>(1);
            worker_txs.push(tx);
            tokio::spawn(parser_worker(
                id,
                rx,
                inbound_tx.clone(),
                error_tx.clone(),
                pool.releaser(),
                Arc::clone(&frames_per_worker),
            ));
        }
        drop(inbound_tx);

        tokio::spawn(read_loop(
            read_half,
            pool,
            worker_txs,
            error_tx.clone(),
            config.read_chunk.max(64),
            shutdown.clone(),
        ));
        tokio::spawn(write_loop(write_half, outbound_rx, error_tx, shutdown.clone()));

        Self {
            inbound: inbound_rx,
            outbound: outbound_tx,
            errors: error_rx,
            shutdown,
            frames_per_worker,
        }
    }

    /// Queue a message for the writer task.
    pub fn send(&self, message: OwnedMessage) -> crate::error::Result<()> {
        self.outbound.send(message).map_err(|_| Error::StreamClosed)
    }

    /// Signal both loops to exit. Idempotent; further sends are discarded.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    /// A receiver that resolves when shutdown has been signaled.
    #[must_use]
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Frames decoded per parser worker since the stream started. Frames
    /// with equal xids only ever increment one slot.
    #[must_use]
    pub fn frames_per_worker(&self) -> Vec<u64> {
        self.frames_per_worker.iter().map(|c| c.load(Ordering::Relaxed)).collect()
    }
}

impl Drop for MessageStream {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

/// Framing reader: byte-at-a-time header/remaining accounting, per the
/// wire protocol's authoritative length field.
async fn read_loop(
    mut socket: OwnedReadHalf,
    mut pool: BufferPool,
    workers: Vec<mpsc::Sender<BytesMut>>,
    errors: mpsc::Sender<Error>,
    read_chunk: usize,
    shutdown: watch::Sender<bool>,
) {
    let mut shutdown_rx = shutdown.subscribe();
    let mut tmp = vec![0u8; read_chunk];
    let mut frame = pool.acquire().await;
    let mut header_scratch = [0u8; 4];
    let mut header_filled = 0usize;
    let mut remaining = 0usize;

    'outer: loop {
        let n = tokio::select! {
            _ = shutdown_rx.changed() => break,
            result = socket.read(&mut tmp) => match result {
                // A zero-length read after our own shutdown is the socket
                // closing under us on purpose; stay quiet then.
                Ok(0) => {
                    if !*shutdown_rx.borrow() {
                        let _ = errors.send(Error::StreamClosed).await;
                        let _ = shutdown.send(true);
                    }
                    break;
                },
                Ok(n) => n,
                Err(e) => {
                    if !*shutdown_rx.borrow() {
                        let _ = errors.send(Error::Io(e)).await;
                        let _ = shutdown.send(true);
                    }
                    break;
                },
            },
        };

        for &byte in &tmp[..n] {
            if header_filled < 4 {
                header_scratch[header_filled] = byte;
                frame.extend_from_slice(&[byte]);
                header_filled += 1;
                if header_filled == 4 {
                    let length =
                        usize::from(u16::from_be_bytes([header_scratch[2], header_scratch[3]]));
                    if length < 8 {
                        // The stream cannot be resynchronized past a bogus
                        // length header.
                        let _ = errors
                            .send(Error::Wire(WireError::Invariant(
                                "frame length shorter than the common header",
                            )))
                            .await;
                        let _ = shutdown.send(true);
                        break 'outer;
                    }
                    remaining = length - 4;
                }
            } else {
                frame.extend_from_slice(&[byte]);
                remaining -= 1;
            }

            if header_filled == 4 && remaining == 0 {
                let xid = u32::from_be_bytes([frame[4], frame[5], frame[6], frame[7]]);
                let worker = (xid as usize) % workers.len();
                let full = std::mem::replace(&mut frame, BytesMut::new());
                if workers[worker].send(full).await.is_err() {
                    break 'outer;
                }
                frame = pool.acquire().await;
                header_filled = 0;
            }
        }
    }
}

/// One parser worker: frames in, typed messages out, buffers back to the
/// pool.
async fn parser_worker(
    id: usize,
    mut frames: mpsc::Receiver<BytesMut>,
    inbound: mpsc::Sender<OwnedMessage>,
    errors: mpsc::Sender<Error>,
    release: mpsc::Sender<BytesMut>,
    counters: Arc<Vec<AtomicU64>>,
) {
    while let Some(mut frame) = frames.recv().await {
        counters[id].fetch_add(1, Ordering::Relaxed);
        match parse_message(&frame) {
            Ok(message) => {
                if inbound.send(message).await.is_err() {
                    break;
                }
            },
            // An unintelligible version byte means every subsequent frame
            // from this peer is too; that one is fatal.
            Err(WireError::UnsupportedVersion(version)) => {
                let _ = errors.send(Error::Wire(WireError::UnsupportedVersion(version))).await;
            },
            Err(e) => {
                tracing::warn!(worker = id, error = %e, "dropping undecodable frame");
            },
        }
        frame.clear();
        // Never blocks: pool capacity covers all outstanding buffers.
        let _ = release.try_send(frame);
    }
}

/// Outbound loop: marshal and write in submission order; close the socket
/// on the way out.
async fn write_loop(
    mut socket: OwnedWriteHalf,
    mut outbound: mpsc::UnboundedReceiver<OwnedMessage>,
    errors: mpsc::Sender<Error>,
    shutdown: watch::Sender<bool>,
) {
    let mut shutdown_rx = shutdown.subscribe();
    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => break,
            maybe = outbound.recv() => {
                let Some(message) = maybe else { break };
                let bytes = match message.encode_to_bytes() {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        tracing::error!(error = %e, "failed to marshal outbound message");
                        continue;
                    },
                };
                if let Err(e) = socket.write_all(&bytes).await {
                    if !*shutdown_rx.borrow() {
                        let _ = errors.send(Error::Io(e)).await;
                        let _ = shutdown.send(true);
                    }
                    break;
                }
            },
        }
    }
    let _ = socket.shutdown().await;
}
